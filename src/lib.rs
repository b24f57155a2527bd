pub mod error;
pub mod config;
pub mod schedule;
pub mod parser;
pub mod store;
pub mod session;
pub mod display;
pub mod web;

pub use error::{Result, SchedulerError};
pub use session::{EditToggle, Mode, Role, Session, SessionSettings};
pub use store::{JsonFileStore, MemoryStore, ScheduleStore};
