use anyhow::Result;
use chrono::NaiveDateTime;
use clinic_core::error::CoreError;
use clinic_core::models::{Frequency, NewAppointmentData, OccurrenceRule, UpdateAppointmentData};
use clinic_core::recurrence::next_occurrence_after;
use clinic_core::repository::Repository;

use crate::cli::{AddAppointmentCommand, AppointmentCommand, EditAppointmentCommand};
use crate::parser::parse_when;
use crate::util::{confirm_deletion, print_hint, print_success};

pub async fn appointment_command(
    repo: &impl Repository,
    command: AppointmentCommand,
    now: NaiveDateTime,
) -> Result<()> {
    match command {
        AppointmentCommand::Add(command) => add_appointment(repo, command, now).await,
        AppointmentCommand::Edit(command) => edit_appointment(repo, command, now).await,
        AppointmentCommand::Delete { id, force } => {
            let appointment = repo
                .find_appointment_by_id(id)
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("Appointment with id {} not found", id)))?;

            let prompt = format!(
                "Cancel the appointment with {} on {}?",
                appointment.provider,
                appointment.start.format("%Y-%m-%d %H:%M")
            );
            if confirm_deletion(&prompt, force) {
                repo.delete_appointment(id).await?;
                print_success("Cancelled appointment", id);
            }
            Ok(())
        }
    }
}

async fn add_appointment(
    repo: &impl Repository,
    command: AddAppointmentCommand,
    now: NaiveDateTime,
) -> Result<()> {
    let start = parse_when(&command.start, now)?;
    let repeat_until = command.until.as_deref().map(|u| parse_when(u, now)).transpose()?;
    let repeat = command.repeat.map(Frequency::from);

    let appointment = repo
        .add_appointment(NewAppointmentData {
            patient_id: command.patient_id,
            provider: command.provider,
            start,
            repeat,
            repeat_until,
        })
        .await?;

    print_success(
        &format!(
            "Booked {} with {}",
            appointment.start.format("%Y-%m-%d %H:%M"),
            appointment.provider
        ),
        appointment.id,
    );

    let mut rule = OccurrenceRule::new(appointment.start, repeat.unwrap_or(Frequency::None));
    if let Some(until) = appointment.repeat_until {
        rule = rule.until(until);
    }
    if rule.frequency.is_recurring() {
        if let Some(next) = next_occurrence_after(&rule, appointment.start) {
            print_hint(&format!("Repeats {}; next visit {}", rule.frequency, next.format("%Y-%m-%d %H:%M")));
        }
    }
    Ok(())
}

async fn edit_appointment(
    repo: &impl Repository,
    command: EditAppointmentCommand,
    now: NaiveDateTime,
) -> Result<()> {
    let repeat_until = if command.until_clear {
        Some(None)
    } else {
        command
            .until
            .as_deref()
            .map(|u| parse_when(u, now))
            .transpose()?
            .map(Some)
    };

    let data = UpdateAppointmentData {
        provider: command.provider,
        start: command.start.as_deref().map(|s| parse_when(s, now)).transpose()?,
        repeat: command.repeat.map(Frequency::from),
        repeat_until,
    };

    let appointment = repo.update_appointment(command.id, data).await?;
    print_success(
        &format!(
            "Updated appointment with {} ({}, {})",
            appointment.provider,
            appointment.start.format("%Y-%m-%d %H:%M"),
            appointment.repeat
        ),
        appointment.id,
    );
    Ok(())
}
