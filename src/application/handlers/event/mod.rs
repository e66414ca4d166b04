//! Event management handlers.

mod create_event;

pub use create_event::{CreateEventCommand, CreateEventHandler, CreateEventResult};
