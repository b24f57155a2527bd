use std::path::PathBuf;

use crate::error::{Result, SchedulerError};
use crate::schedule::MonthKey;
use crate::session::SessionSettings;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "data";

/// What the binary was asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Web { port: u16 },
    Show { month: MonthKey, output: Option<String> },
}

/// Runtime configuration, from command-line arguments and environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub command: Command,
    pub admin_password: String,
    pub data_dir: PathBuf,
    pub staff_csv: Option<PathBuf>,
    pub special_labels: Vec<String>,
    pub editor: String,
}

impl AppConfig {
    pub fn from_env(args: &[String]) -> Result<AppConfig> {
        Self::from_parts(args, |key| std::env::var(key).ok())
    }

    /// Builds the configuration from `args` (program name first) and a variable lookup
    pub fn from_parts<F>(args: &[String], var: F) -> Result<AppConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let command = match args.get(1).map(|s| s.as_str()) {
            Some("web") => {
                let port = match args.get(2) {
                    Some(p) => p
                        .parse::<u16>()
                        .map_err(|_| SchedulerError::ConfigError(format!("Invalid port: {}", p)))?,
                    None => DEFAULT_PORT,
                };
                Command::Web { port }
            }
            Some("show") => {
                let month = match (args.get(2), args.get(3)) {
                    (Some(year), Some(month)) => {
                        let year: i32 = year
                            .parse()
                            .map_err(|_| SchedulerError::ConfigError(format!("Invalid year: {}", year)))?;
                        let month: u32 = month
                            .parse()
                            .map_err(|_| SchedulerError::ConfigError(format!("Invalid month: {}", month)))?;
                        MonthKey::new(month, year)?
                    }
                    _ => MonthKey::current(),
                };
                Command::Show { month, output: args.get(4).cloned() }
            }
            Some(other) => {
                return Err(SchedulerError::ConfigError(format!(
                    "Unknown command '{}'; expected 'web [port]' or 'show <year> <month> [file]'",
                    other
                )))
            }
            None => Command::Show { month: MonthKey::current(), output: None },
        };

        let special_labels = var("SCHEDULER_SPECIAL_LABELS")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
            .unwrap_or_else(|| SessionSettings::default().special_labels);

        Ok(AppConfig {
            command,
            admin_password: var("ADMIN_PASSWORD").unwrap_or_else(|| "admin123".to_string()),
            data_dir: var("SCHEDULER_DATA_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            staff_csv: var("SCHEDULER_STAFF_CSV").map(PathBuf::from),
            special_labels,
            editor: var("SCHEDULER_EDITOR").unwrap_or_else(|| "admin".to_string()),
        })
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            special_labels: self.special_labels.clone(),
            editor: self.editor.clone(),
            ..SessionSettings::default()
        }
    }
}
