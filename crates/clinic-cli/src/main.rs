use clap::Parser;
use clinic_core::db;
use clinic_core::error::CoreError;
use clinic_core::repository::SqliteRepository;
use clinic_core::schedule::ScheduleService;
use owo_colors::{OwoColorize, Style};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod config;
mod parser;
mod util;
mod views;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = cli::Cli::parse();

    if let Err(e) = run(cli).await {
        handle_error(e);
        std::process::exit(1);
    }
}

async fn run(cli: cli::Cli) -> anyhow::Result<()> {
    let config = config::Config::new()?;
    tracing::debug!(?config, "loaded configuration");

    let pool = db::establish_connection(&config.database_path).await?;
    let service = ScheduleService::new(SqliteRepository::new(pool), &config.schedule);
    let now = service.now();

    match cli.command {
        cli::Commands::Patient(command) => {
            commands::patient::patient_command(&service, command).await
        }
        cli::Commands::Appointment(command) => {
            commands::appointment::appointment_command(service.store(), command, now).await
        }
        cli::Commands::Prescription(command) => {
            commands::prescription::prescription_command(service.store(), command, now).await
        }
        cli::Commands::Portal(command) => commands::schedule::portal(&service, command).await,
        cli::Commands::Upcoming(command) => {
            commands::schedule::upcoming(&service, now, command).await
        }
    }
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    if let Some(core_error) = err.downcast_ref::<CoreError>() {
        match core_error {
            CoreError::NotFound(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s);
            }
            CoreError::InvalidInput(s) => {
                eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
            }
            CoreError::InvalidRule(s) => {
                eprintln!(
                    "{} A stored schedule is malformed: {}",
                    "Error:".style(error_style),
                    s.yellow()
                );
            }
            CoreError::InvalidWindow { lower, upper } => {
                eprintln!(
                    "{} Schedule window is inverted ({} is after {}); check the [schedule] configuration",
                    "Error:".style(error_style),
                    lower,
                    upper
                );
            }
            CoreError::StorageUnavailable(e) => {
                eprintln!("{} Storage unavailable: {}", "Error:".style(error_style), e);
            }
            _ => eprintln!("{} {}", "Error:".style(error_style), err),
        }
    } else {
        eprintln!("{} {:#}", "Error:".style(error_style), err);
    }
}
