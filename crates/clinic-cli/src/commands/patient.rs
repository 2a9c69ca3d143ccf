use anyhow::Result;
use clinic_core::error::CoreError;
use clinic_core::models::{NewPatientData, UpdatePatientData};
use clinic_core::repository::Repository;
use clinic_core::schedule::ScheduleService;
use clinic_core::window::Clock;
use owo_colors::OwoColorize;

use crate::cli::PatientCommand;
use crate::util::{confirm_deletion, print_hint, print_success};
use crate::views::table;

pub async fn patient_command<S: Repository, C: Clock>(
    service: &ScheduleService<S, C>,
    command: PatientCommand,
) -> Result<()> {
    let repo = service.store();
    match command {
        PatientCommand::Add { name, email } => {
            let patient = repo.add_patient(NewPatientData { name, email }).await?;
            print_success(&format!("Registered patient: {}", patient.name), patient.id);
            print_hint(&format!(
                "Book a visit: clinic appointment add {} --provider <name> --start <when>",
                patient.id
            ));
        }
        PatientCommand::List => {
            let patients = repo.find_patients().await?;
            table::display_patients(&patients);
        }
        PatientCommand::Show { id, json } => {
            let detail = service.patient_detail(id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&detail)?);
                return Ok(());
            }

            println!(
                "{} <{}>",
                detail.patient.name.bright_white().bold(),
                detail.patient.email
            );
            println!("\n{}", "Appointments".underline());
            table::display_appointments(&detail.appointments, detail.window.now);
            println!("\n{}", "Prescriptions".underline());
            table::display_prescriptions(&detail.prescriptions, detail.window.now);
            println!(
                "\n{} {} .. {}",
                "Upcoming".underline(),
                detail.window.lower.format("%Y-%m-%d"),
                detail.window.upper.format("%Y-%m-%d")
            );
            let mut upcoming = detail.upcoming_appointments;
            upcoming.extend(detail.upcoming_refills);
            clinic_core::schedule::sort_occurrences(&mut upcoming);
            table::display_occurrences(&upcoming, detail.window.now);
        }
        PatientCommand::Edit { id, name, email } => {
            if name.is_none() && email.is_none() {
                return Err(CoreError::InvalidInput(
                    "Nothing to change: pass --name and/or --email".to_string(),
                )
                .into());
            }
            let patient = repo.update_patient(id, UpdatePatientData { name, email }).await?;
            print_success(&format!("Updated patient: {}", patient.name), patient.id);
        }
        PatientCommand::Delete { id, force } => {
            let patient = repo
                .find_patient_by_id(id)
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("Patient with id {} not found", id)))?;

            let prompt = format!(
                "Delete patient '{}' and all of their appointments and prescriptions?",
                patient.name
            );
            if confirm_deletion(&prompt, force) {
                repo.delete_patient(id).await?;
                print_success(&format!("Deleted patient: {}", patient.name), id);
            }
        }
    }
    Ok(())
}
