//! iCalendar reading and writing.

mod generate;
mod parse;

pub use generate::{
    NewEvent, NewTodo, generate_event, generate_todo, write_event_fields, write_todo_fields,
};
pub use parse::{read_event, read_todo};
