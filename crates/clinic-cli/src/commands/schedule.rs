use anyhow::Result;
use chrono::NaiveDateTime;
use clinic_core::error::CoreError;
use clinic_core::models::ScheduleKind;
use clinic_core::repository::Repository;
use clinic_core::schedule::{sort_occurrences, ScheduleService};
use clinic_core::window::{Clock, ScheduleView};
use owo_colors::OwoColorize;

use crate::cli::{PortalCommand, UpcomingCommand};
use crate::views::table;

/// Portal home for one patient.
pub async fn portal<S: Repository, C: Clock>(
    service: &ScheduleService<S, C>,
    command: PortalCommand,
) -> Result<()> {
    let overview = service.patient_overview(command.patient_id).await?;
    if command.json {
        println!("{}", serde_json::to_string_pretty(&overview)?);
        return Ok(());
    }

    println!("Welcome back, {}", overview.patient.name.bright_white().bold());
    println!(
        "\n{} (through {})",
        "Appointments this week".underline(),
        overview.window.upper.format("%a %Y-%m-%d")
    );
    table::display_occurrences(&overview.upcoming_appointments, overview.window.now);
    println!("\n{}", "Refills due".underline());
    table::display_occurrences(&overview.upcoming_refills, overview.window.now);
    Ok(())
}

/// Full-list schedule, optionally narrowed to one kind.
pub async fn upcoming<S: Repository, C: Clock>(
    service: &ScheduleService<S, C>,
    now: NaiveDateTime,
    command: UpcomingCommand,
) -> Result<()> {
    if service.store().find_patient_by_id(command.patient_id).await?.is_none() {
        return Err(CoreError::NotFound(format!(
            "Patient with id {} not found",
            command.patient_id
        ))
        .into());
    }

    let kinds: Vec<ScheduleKind> = match command.kind {
        Some(kind) => vec![kind.into()],
        None => ScheduleKind::ALL.to_vec(),
    };

    let mut occurrences = Vec::new();
    for kind in kinds {
        occurrences.extend(
            service
                .view_occurrences_at(command.patient_id, kind, ScheduleView::FullList, now)
                .await?,
        );
    }
    sort_occurrences(&mut occurrences);

    if command.json {
        println!("{}", serde_json::to_string_pretty(&occurrences)?);
    } else {
        table::display_occurrences(&occurrences, now);
    }
    Ok(())
}
