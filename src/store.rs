use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::{Result, SchedulerError};
use crate::parser::load_staff_directory;
use crate::schedule::{ContainerMap, MonthKey, SalesStaff, Schedule};

/// Persistence collaborator for schedules and the staff directory
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// The stored schedule, or None when the month has none yet
    async fn get_schedule(&self, month: MonthKey) -> Result<Option<Schedule>>;

    /// Creates the month's schedule; returns its id
    async fn create_schedule(&self, month: MonthKey, containers: ContainerMap, updated_by: &str) -> Result<String>;

    /// Replaces the month's containers, creating the schedule if absent
    async fn update_schedule(&self, month: MonthKey, containers: ContainerMap, updated_by: &str) -> Result<()>;

    async fn toggle_publish_schedule(&self, month: MonthKey, published: bool) -> Result<()>;

    async fn get_sales_staff(&self) -> Result<Vec<SalesStaff>>;
}

fn schedule_id(month: MonthKey) -> String {
    format!("{:04}-{:02}", month.year(), month.month())
}

fn new_schedule(month: MonthKey, containers: ContainerMap, updated_by: &str) -> Schedule {
    Schedule {
        month: month.month(),
        year: month.year(),
        containers,
        updated_at: Utc::now(),
        updated_by: updated_by.to_string(),
        published: false,
    }
}

/// Schedules held in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    schedules: Mutex<HashMap<String, Schedule>>,
    staff: Mutex<Vec<SalesStaff>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn with_staff(staff: Vec<SalesStaff>) -> Self {
        MemoryStore {
            schedules: Mutex::new(HashMap::new()),
            staff: Mutex::new(staff),
        }
    }

    pub async fn set_staff(&self, staff: Vec<SalesStaff>) {
        *self.staff.lock().await = staff;
    }
}

#[async_trait]
impl ScheduleStore for MemoryStore {
    async fn get_schedule(&self, month: MonthKey) -> Result<Option<Schedule>> {
        Ok(self.schedules.lock().await.get(&schedule_id(month)).cloned())
    }

    async fn create_schedule(&self, month: MonthKey, containers: ContainerMap, updated_by: &str) -> Result<String> {
        let id = schedule_id(month);
        let mut schedules = self.schedules.lock().await;
        if schedules.contains_key(&id) {
            return Err(SchedulerError::StorageError(format!("Schedule {} already exists", id)));
        }
        schedules.insert(id.clone(), new_schedule(month, containers, updated_by));
        Ok(id)
    }

    async fn update_schedule(&self, month: MonthKey, containers: ContainerMap, updated_by: &str) -> Result<()> {
        let mut schedules = self.schedules.lock().await;
        match schedules.get_mut(&schedule_id(month)) {
            Some(existing) => {
                existing.containers = containers;
                existing.updated_at = Utc::now();
                existing.updated_by = updated_by.to_string();
            }
            None => {
                schedules.insert(schedule_id(month), new_schedule(month, containers, updated_by));
            }
        }
        Ok(())
    }

    async fn toggle_publish_schedule(&self, month: MonthKey, published: bool) -> Result<()> {
        let mut schedules = self.schedules.lock().await;
        let schedule = schedules
            .get_mut(&schedule_id(month))
            .ok_or(SchedulerError::ScheduleMissing { month: month.month(), year: month.year() })?;
        schedule.published = published;
        Ok(())
    }

    async fn get_sales_staff(&self) -> Result<Vec<SalesStaff>> {
        Ok(self.staff.lock().await.clone())
    }
}

/// One JSON document per month under `data_dir`; staff from an optional CSV file
#[derive(Debug)]
pub struct JsonFileStore {
    data_dir: PathBuf,
    staff_csv: Option<PathBuf>,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(data_dir: P, staff_csv: Option<PathBuf>) -> Result<Self> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        Ok(JsonFileStore {
            data_dir: data_dir.as_ref().to_path_buf(),
            staff_csv,
            write_lock: Mutex::new(()),
        })
    }

    fn path_for(&self, month: MonthKey) -> PathBuf {
        self.data_dir.join(format!("schedule-{}.json", schedule_id(month)))
    }

    async fn read(&self, month: MonthKey) -> Result<Option<Schedule>> {
        let path = self.path_for(month);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes to a temporary file, then renames it over the month's document
    async fn write(&self, schedule: &Schedule) -> Result<()> {
        let month = MonthKey::new(schedule.month, schedule.year)?;
        let path = self.path_for(month);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(schedule)?;
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl ScheduleStore for JsonFileStore {
    async fn get_schedule(&self, month: MonthKey) -> Result<Option<Schedule>> {
        self.read(month).await
    }

    async fn create_schedule(&self, month: MonthKey, containers: ContainerMap, updated_by: &str) -> Result<String> {
        let _guard = self.write_lock.lock().await;
        if self.read(month).await?.is_some() {
            return Err(SchedulerError::StorageError(format!("Schedule {} already exists", schedule_id(month))));
        }
        self.write(&new_schedule(month, containers, updated_by)).await?;
        info!("Created schedule {}", schedule_id(month));
        Ok(schedule_id(month))
    }

    async fn update_schedule(&self, month: MonthKey, containers: ContainerMap, updated_by: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let schedule = match self.read(month).await? {
            Some(mut existing) => {
                existing.containers = containers;
                existing.updated_at = Utc::now();
                existing.updated_by = updated_by.to_string();
                existing
            }
            None => new_schedule(month, containers, updated_by),
        };
        self.write(&schedule).await
    }

    async fn toggle_publish_schedule(&self, month: MonthKey, published: bool) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut schedule = self
            .read(month)
            .await?
            .ok_or(SchedulerError::ScheduleMissing { month: month.month(), year: month.year() })?;
        schedule.published = published;
        self.write(&schedule).await
    }

    async fn get_sales_staff(&self) -> Result<Vec<SalesStaff>> {
        match &self.staff_csv {
            Some(path) => match load_staff_directory(path).await {
                Err(SchedulerError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
                result => result,
            },
            None => Ok(Vec::new()),
        }
    }
}
