use chrono::Utc;
use tracing::{info, warn};

use super::params::{CreateTodo, GetTodos, SearchTodos, TodoRef, UpdateTodo};
use super::{CalendarTools, listing_text, search_text};
use crate::calendar::{Calendar, ComponentKind};
use crate::date_range::parse_date;
use crate::error::ToolResult;
use crate::fields::{TodoFields, TodoStatus, TodoUpdate, check_priority};
use crate::filter::{Limit, matches_query, status_matches, truncate_description};
use crate::gateway::{CalendarGateway, NewItem, RawItem};
use crate::ics::{NewTodo, generate_todo, read_todo, write_todo_fields};
use crate::resolve::{resolve_calendar, resolve_item_by_summary};

impl<G: CalendarGateway> CalendarTools<G> {
    pub fn get_todos(&self, params: GetTodos) -> String {
        self.run("retrieving todos", || {
            let limit = Limit::from_arg(params.limit);
            let status = params.status.as_deref();

            let calendars = match params.calendar_name.as_deref() {
                Some(name) => vec![resolve_calendar(&self.gateway, name)?],
                None => self.gateway.list_calendars()?,
            };

            let mut lines = Vec::new();
            'calendars: for calendar in &calendars {
                for item in self.gateway.list_todos(calendar)? {
                    if limit.reached(lines.len()) {
                        break 'calendars;
                    }
                    match read_todo(&item.data) {
                        Ok(todo) if status_matches(status, &todo) => {
                            lines.push(todo_line(&todo, calendar))
                        }
                        Ok(_) => {}
                        Err(e) => {
                            lines.push(format!("Error parsing todo from {}: {}", calendar.name, e))
                        }
                    }
                }
            }

            Ok(listing_text("todos", params.calendar_name.as_deref(), &lines))
        })
    }

    pub fn create_todo(&self, params: CreateTodo) -> String {
        self.run("creating todo", || {
            let calendar = resolve_calendar(&self.gateway, &params.calendar_name)?;
            let due = params.due_date.as_deref().map(parse_date).transpose()?;
            let priority = params.priority.map(check_priority).transpose()?;
            let status = params
                .status
                .as_deref()
                .map(str::parse::<TodoStatus>)
                .transpose()?
                .unwrap_or(TodoStatus::NeedsAction);

            let uid = uuid::Uuid::new_v4().to_string();
            let data = generate_todo(
                &NewTodo {
                    uid: &uid,
                    summary: &params.summary,
                    status,
                    description: params.description.as_deref(),
                    due,
                    priority,
                },
                Utc::now(),
            );

            let item = self.gateway.create(&calendar, &NewItem { uid, data })?;
            info!(calendar = %calendar.name, href = %item.href, "created todo");

            Ok(format!(
                "Todo '{}' created successfully in calendar '{}'",
                params.summary, calendar.name
            ))
        })
    }

    pub fn update_todo(&self, params: UpdateTodo) -> String {
        self.run("updating todo", || {
            let calendar = resolve_calendar(&self.gateway, &params.calendar_name)?;
            let (item, current) = self.find_todo(&calendar, &params.todo_summary)?;

            let update = TodoUpdate {
                summary: params.new_summary.clone(),
                description: params.new_description.clone(),
                due: params.new_due_date.as_deref().map(parse_date).transpose()?,
                priority: params.new_priority.map(check_priority).transpose()?,
                status: params
                    .new_status
                    .as_deref()
                    .map(str::parse::<TodoStatus>)
                    .transpose()?,
            };

            self.save_todo(item, &current, &update)?;

            Ok(format!(
                "Todo '{}' updated successfully in calendar '{}'",
                params.todo_summary, calendar.name
            ))
        })
    }

    pub fn delete_todo(&self, params: TodoRef) -> String {
        self.run("deleting todo", || {
            let calendar = resolve_calendar(&self.gateway, &params.calendar_name)?;
            let (item, _) = self.find_todo(&calendar, &params.todo_summary)?;

            self.gateway.delete(&item)?;
            info!(calendar = %calendar.name, href = %item.href, "deleted todo");

            Ok(format!(
                "Todo '{}' deleted successfully from calendar '{}'",
                params.todo_summary, calendar.name
            ))
        })
    }

    pub fn complete_todo(&self, params: TodoRef) -> String {
        self.run("completing todo", || {
            let calendar = resolve_calendar(&self.gateway, &params.calendar_name)?;
            let (item, current) = self.find_todo(&calendar, &params.todo_summary)?;

            self.save_todo(item, &current, &TodoUpdate::complete())?;

            Ok(format!(
                "Todo '{}' marked as completed in calendar '{}'",
                params.todo_summary, calendar.name
            ))
        })
    }

    pub fn search_todos(&self, params: SearchTodos) -> String {
        self.run("searching todos", || {
            let limit = Limit::from_arg(params.limit);
            let status = params.status.as_deref();

            let calendars = self.gateway.list_calendars()?;
            if calendars.is_empty() {
                return Ok("No calendars found.".to_string());
            }

            let mut lines = Vec::new();
            'calendars: for calendar in &calendars {
                let items = match self.gateway.list_todos(calendar) {
                    Ok(items) => items,
                    Err(e) => {
                        warn!(calendar = %calendar.name, error = %e, "skipping calendar in search");
                        continue;
                    }
                };

                for item in items {
                    let Ok(todo) = read_todo(&item.data) else {
                        continue;
                    };
                    if !status_matches(status, &todo)
                        || !matches_query(
                            &params.query,
                            todo.summary.as_deref(),
                            todo.description.as_deref(),
                        )
                    {
                        continue;
                    }

                    let mut line = format!(
                        "- {} {} in {} (Due: {}, Status: {})",
                        todo.indicator(),
                        todo.title(),
                        calendar.name,
                        todo.due_label(),
                        todo.status()
                    );
                    if let Some(ref description) = todo.description {
                        line.push_str(": ");
                        line.push_str(&truncate_description(description));
                    }
                    lines.push(line);

                    if limit.reached(lines.len()) {
                        break 'calendars;
                    }
                }
            }

            Ok(search_text("todos", &params.query, &lines))
        })
    }

    fn find_todo(&self, calendar: &Calendar, summary: &str) -> ToolResult<(RawItem, TodoFields)> {
        let items = self.gateway.list_todos(calendar)?;
        resolve_item_by_summary::<TodoFields>(items, summary).into_target(
            ComponentKind::Todo,
            summary,
            &calendar.name,
        )
    }

    fn save_todo(
        &self,
        mut item: RawItem,
        current: &TodoFields,
        update: &TodoUpdate,
    ) -> ToolResult<()> {
        item.data = write_todo_fields(&item.data, current, update, Utc::now())?;
        self.gateway.save(&item)?;
        info!(href = %item.href, "saved todo");
        Ok(())
    }
}

fn todo_line(todo: &TodoFields, calendar: &Calendar) -> String {
    format!(
        "{} {} (from: {}, Due: {}, Status: {})",
        todo.indicator(),
        todo.title(),
        calendar.name,
        todo.due_label(),
        todo.status()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::ItemTime;
    use crate::memory::{MemoryGateway, todo_ics};

    fn tools() -> CalendarTools<MemoryGateway> {
        let gateway = MemoryGateway::new().with_calendar("Work").with_calendar("Home");
        gateway.add_item("Work", todo_ics("t1", "Email Bob", None, None));
        gateway.add_item("Work", todo_ics("t2", "Email Bob", Some("IN-PROCESS"), None));
        gateway.add_item("Work", todo_ics("t3", "Ship release", Some("COMPLETED"), None));
        gateway.add_item(
            "Home",
            todo_ics("t4", "Water plants", None, Some("Ferns need extra water")),
        );
        CalendarTools::new(gateway)
    }

    fn todo_ref(calendar: &str, summary: &str) -> TodoRef {
        TodoRef {
            calendar_name: calendar.into(),
            todo_summary: summary.into(),
        }
    }

    fn create(summary: &str) -> CreateTodo {
        CreateTodo {
            calendar_name: "Home".into(),
            summary: summary.into(),
            description: None,
            due_date: None,
            priority: None,
            status: None,
        }
    }

    #[test]
    fn test_get_todos_with_status_filter() {
        let tools = tools();

        let text = tools.get_todos(GetTodos {
            calendar_name: Some("Work".into()),
            status: Some("completed".into()),
            limit: None,
        });

        assert_eq!(
            text,
            "Todos in 'Work' (1 found): ✓ Ship release (from: Work, Due: No due date, Status: COMPLETED)"
        );
    }

    #[test]
    fn test_filtered_out_todos_do_not_consume_limit() {
        let tools = tools();

        let text = tools.get_todos(GetTodos {
            calendar_name: None,
            status: Some("NEEDS-ACTION".into()),
            limit: Some(2),
        });

        assert_eq!(
            text,
            "Todos from all calendars (2 found): \
             ○ Email Bob (from: Work, Due: No due date, Status: NEEDS-ACTION); \
             ○ Water plants (from: Home, Due: No due date, Status: NEEDS-ACTION)"
        );
    }

    #[test]
    fn test_no_todos_in_calendar() {
        let tools = CalendarTools::new(MemoryGateway::new().with_calendar("Empty"));
        assert_eq!(
            tools.get_todos(GetTodos {
                calendar_name: Some("Empty".into()),
                ..Default::default()
            }),
            "No todos found in calendar 'Empty'."
        );
    }

    #[test]
    fn test_create_todo_defaults_and_fresh_uids() {
        let tools = tools();

        assert_eq!(
            tools.create_todo(create("Buy milk")),
            "Todo 'Buy milk' created successfully in calendar 'Home'"
        );
        tools.create_todo(create("Buy milk"));

        let items = tools.gateway().items("Home");
        let created: Vec<TodoFields> = items
            .iter()
            .skip(1)
            .map(|item| read_todo(&item.data).unwrap())
            .collect();

        assert_eq!(created.len(), 2);
        for (todo, item) in created.iter().zip(items.iter().skip(1)) {
            assert_eq!(todo.status.as_deref(), Some("NEEDS-ACTION"));
            assert!(item.data.contains("\r\nCREATED:"), "ICS:\n{}", item.data);
            assert!(todo.uid.is_some());
        }
        assert_ne!(created[0].uid, created[1].uid);
    }

    #[test]
    fn test_create_todo_validates_arguments() {
        let tools = tools();

        let mut bad_priority = create("Buy milk");
        bad_priority.priority = Some(12);
        assert_eq!(
            tools.create_todo(bad_priority),
            "Invalid priority '12': must be between 1 (highest) and 9 (lowest)"
        );

        let mut bad_due = create("Buy milk");
        bad_due.due_date = Some("next week".into());
        assert!(tools.create_todo(bad_due).starts_with("Error parsing date format:"));

        let mut bad_status = create("Buy milk");
        bad_status.status = Some("done".into());
        assert!(tools.create_todo(bad_status).starts_with("Invalid status 'done'"));

        assert_eq!(tools.gateway().mutation_count(), 0);
    }

    #[test]
    fn test_create_todo_with_all_fields() {
        let tools = tools();

        let text = tools.create_todo(CreateTodo {
            calendar_name: "Home".into(),
            summary: "Renew passport".into(),
            description: Some("Photos first".into()),
            due_date: Some("2025-06-01".into()),
            priority: Some(2),
            status: Some("in-process".into()),
        });
        assert_eq!(text, "Todo 'Renew passport' created successfully in calendar 'Home'");

        let items = tools.gateway().items("Home");
        let todo = read_todo(&items[1].data).unwrap();
        assert_eq!(todo.status(), "IN-PROCESS");
        assert_eq!(todo.due_label(), "2025-06-01");
        assert_eq!(todo.priority, Some(2));
        assert_eq!(todo.description.as_deref(), Some("Photos first"));
    }

    #[test]
    fn test_update_with_duplicate_summaries_mutates_nothing() {
        let tools = tools();
        let before = tools.gateway().items("Work");

        let text = tools.update_todo(UpdateTodo {
            calendar_name: "Work".into(),
            todo_summary: "Email Bob".into(),
            new_summary: Some("Email Robert".into()),
            new_description: None,
            new_due_date: None,
            new_priority: None,
            new_status: None,
        });

        assert_eq!(
            text,
            "Multiple todos found with summary 'Email Bob'. Please be more specific."
        );
        assert_eq!(tools.gateway().mutation_count(), 0);
        assert_eq!(tools.gateway().items("Work"), before);
    }

    #[test]
    fn test_update_todo_fields() {
        let tools = tools();

        let text = tools.update_todo(UpdateTodo {
            calendar_name: "Home".into(),
            todo_summary: "Water plants".into(),
            new_summary: None,
            new_description: None,
            new_due_date: Some("2025-04-02".into()),
            new_priority: Some(3),
            new_status: Some("in-process".into()),
        });
        assert_eq!(text, "Todo 'Water plants' updated successfully in calendar 'Home'");

        let todo = read_todo(&tools.gateway().items("Home")[0].data).unwrap();
        assert_eq!(todo.title(), "Water plants");
        assert_eq!(todo.status(), "IN-PROCESS");
        assert_eq!(todo.priority, Some(3));
        assert_eq!(todo.due_label(), "2025-04-02");
        assert_eq!(todo.description.as_deref(), Some("Ferns need extra water"));
        assert_eq!(todo.completed, None);
    }

    #[test]
    fn test_complete_todo_stamps_completion_in_one_save() {
        let tools = tools();

        let text = tools.complete_todo(todo_ref("Home", "Water plants"));
        assert_eq!(text, "Todo 'Water plants' marked as completed in calendar 'Home'");
        assert_eq!(tools.gateway().mutation_count(), 1);

        let todo = read_todo(&tools.gateway().items("Home")[0].data).unwrap();
        assert!(todo.is_completed());
        assert!(matches!(todo.completed, Some(ItemTime::DateTimeUtc(_))));
    }

    #[test]
    fn test_delete_todo() {
        let tools = tools();

        assert_eq!(
            tools.delete_todo(todo_ref("Work", "Ship release")),
            "Todo 'Ship release' deleted successfully from calendar 'Work'"
        );
        assert_eq!(tools.gateway().items("Work").len(), 2);

        assert_eq!(
            tools.delete_todo(todo_ref("Work", "Ship release")),
            "No todo found with summary 'Ship release' in calendar 'Work'"
        );
        assert_eq!(
            tools.delete_todo(todo_ref("Office", "Ship release")),
            "Calendar 'Office' not found."
        );
    }

    #[test]
    fn test_search_todos_by_description_with_status() {
        let tools = tools();

        let text = tools.search_todos(SearchTodos {
            query: "FERNS".into(),
            status: Some("needs-action".into()),
            limit: None,
        });
        assert_eq!(
            text,
            "Found 1 todos matching 'FERNS':\n\
             - ○ Water plants in Home (Due: No due date, Status: NEEDS-ACTION): Ferns need extra water"
        );

        let text = tools.search_todos(SearchTodos {
            query: "ferns".into(),
            status: Some("completed".into()),
            limit: None,
        });
        assert_eq!(text, "No todos found matching 'ferns'");
    }

    #[test]
    fn test_gateway_failure_renders_with_action() {
        let tools = tools();
        tools.gateway().fail_listing("Work");

        assert_eq!(
            tools.complete_todo(todo_ref("Work", "Ship release")),
            "Error completing todo: server returned 500: listing Work failed"
        );
    }
}
