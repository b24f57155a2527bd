use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Invalid month {month}/{year}")]
    InvalidMonth { month: u32, year: i32 },
    #[error("No schedule exists yet for {month}/{year}; save it first")]
    ScheduleMissing { month: u32, year: i32 },
    #[error("Schedule for {month}/{year} is not published")]
    NotPublished { month: u32, year: i32 },
    #[error("Only administrators can edit schedules")]
    NotAuthorized,
    #[error("Edit mode is not active")]
    NotEditing,
    #[error("There are unsaved changes; save or discard them first")]
    UnsavedChanges,
    #[error("Invalid day {0}")]
    InvalidDay(u32),
    #[error("Copy plan was made for {month}/{year}, which is no longer open")]
    StalePlan { month: u32, year: i32 },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
