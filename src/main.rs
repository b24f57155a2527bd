use std::sync::Arc;
use log::info;

use shift_scheduler::config::{AppConfig, Command};
use shift_scheduler::display::{print_month_schedule, write_schedule_to_file};
use shift_scheduler::web;
use shift_scheduler::{JsonFileStore, Role, ScheduleStore, Session};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let config = AppConfig::from_env(&args)?;
    let store: Arc<dyn ScheduleStore> = Arc::new(JsonFileStore::new(&config.data_dir, config.staff_csv.clone())?);

    match &config.command {
        Command::Web { port } => {
            println!("Starting web server on port {}...", port);
            println!("Access the site at http://localhost:{}", port);
            let state = web::build_state(
                store,
                config.session_settings(),
                shift_scheduler::schedule::MonthKey::current(),
                config.admin_password.clone(),
            )
            .await?;
            web::start_server(*port, state).await?;
        }
        Command::Show { month, output } => {
            info!("Loading schedule for {}", month.label());
            let session = Session::open(store, Role::Admin, *month, config.session_settings()).await?;
            if !session.schedule_exists() {
                println!("No schedule saved for {} yet.", month.label());
            }
            print_month_schedule(month, session.containers(), session.template(), session.published());

            if let Some(path) = output {
                write_schedule_to_file(month, session.containers(), session.template(), path)?;
                println!("Schedule saved to: {}", path);
            }
        }
    }

    Ok(())
}
