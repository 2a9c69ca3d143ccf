use anyhow::Result;
use chrono::NaiveDateTime;
use clinic_core::error::CoreError;
use clinic_core::models::{Frequency, NewPrescriptionData};
use clinic_core::repository::Repository;

use crate::cli::{AddPrescriptionCommand, PrescriptionCommand};
use crate::parser::parse_when;
use crate::util::{confirm_deletion, print_success};

pub async fn prescription_command(
    repo: &impl Repository,
    command: PrescriptionCommand,
    now: NaiveDateTime,
) -> Result<()> {
    match command {
        PrescriptionCommand::Add(command) => add_prescription(repo, command, now).await,
        PrescriptionCommand::Delete { id, force } => {
            let prescription = repo
                .find_prescription_by_id(id)
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("Prescription with id {} not found", id)))?;

            let prompt = format!(
                "Delete prescription for {} {}?",
                prescription.medication, prescription.dosage
            );
            if confirm_deletion(&prompt, force) {
                repo.delete_prescription(id).await?;
                print_success(&format!("Deleted prescription: {}", prescription.medication), id);
            }
            Ok(())
        }
    }
}

async fn add_prescription(
    repo: &impl Repository,
    command: AddPrescriptionCommand,
    now: NaiveDateTime,
) -> Result<()> {
    let refill_on = parse_when(&command.refill_on, now)?;

    let prescription = repo
        .add_prescription(NewPrescriptionData {
            patient_id: command.patient_id,
            medication: command.medication,
            dosage: command.dosage,
            quantity: command.quantity,
            refill_on,
            refill_schedule: command.schedule.map(Frequency::from),
        })
        .await?;

    print_success(
        &format!(
            "Prescribed {} {} ({} refills from {})",
            prescription.medication,
            prescription.dosage,
            prescription.refill_schedule,
            prescription.refill_on.format("%Y-%m-%d")
        ),
        prescription.id,
    );
    Ok(())
}
