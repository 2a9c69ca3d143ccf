use chrono::NaiveDateTime;
use chrono_humanize::HumanTime;
use clinic_core::models::{
    Appointment, DisplayFields, Frequency, OccurrenceRule, Patient, Prescription, RuleRecord,
    ScheduledOccurrence,
};
use clinic_core::recurrence::next_occurrence_after;
use clinic_core::schedule::schedule_label;
use comfy_table::{Attribute, Cell, Color, Table};

const DATETIME_DISPLAY: &str = "%a %Y-%m-%d %H:%M";

/// "in 3 days" style text relative to the view's `now`.
fn relative(at: NaiveDateTime, now: NaiveDateTime) -> String {
    HumanTime::from(at - now).to_string()
}

fn next_cell(record: RuleRecord, now: NaiveDateTime) -> Cell {
    match OccurrenceRule::try_from(&record) {
        Ok(rule) => match next_occurrence_after(&rule, now) {
            Some(next) => Cell::new(next.format(DATETIME_DISPLAY)),
            None => Cell::new("-").fg(Color::DarkGrey),
        },
        Err(_) => Cell::new("invalid").fg(Color::Red),
    }
}

fn frequency_cell(label: &str) -> Cell {
    match label.parse::<Frequency>() {
        Ok(Frequency::None) => Cell::new("once").fg(Color::DarkGrey),
        Ok(frequency) => Cell::new(frequency.as_str()).fg(Color::Cyan),
        Err(_) => Cell::new(label).fg(Color::Red),
    }
}

pub fn display_patients(patients: &[Patient]) {
    if patients.is_empty() {
        println!("No patients found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Email", "Registered"]);
    for patient in patients {
        table.add_row(vec![
            Cell::new(patient.id),
            Cell::new(&patient.name).add_attribute(Attribute::Bold),
            Cell::new(&patient.email),
            Cell::new(patient.created_at.format("%Y-%m-%d")),
        ]);
    }
    println!("{table}");
}

pub fn display_appointments(appointments: &[Appointment], now: NaiveDateTime) {
    if appointments.is_empty() {
        println!("No appointments on record.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Provider", "Start", "Repeat", "Until", "Next"]);
    for appointment in appointments {
        table.add_row(vec![
            Cell::new(appointment.id),
            Cell::new(&appointment.provider),
            Cell::new(appointment.start.format(DATETIME_DISPLAY)),
            frequency_cell(&appointment.repeat),
            Cell::new(
                appointment
                    .repeat_until
                    .map(|until| until.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            next_cell(RuleRecord::from(appointment.clone()), now),
        ]);
    }
    println!("{table}");
}

pub fn display_prescriptions(prescriptions: &[Prescription], now: NaiveDateTime) {
    if prescriptions.is_empty() {
        println!("No prescriptions on record.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Medication", "Dosage", "Qty", "First refill", "Schedule", "Next"]);
    for prescription in prescriptions {
        table.add_row(vec![
            Cell::new(prescription.id),
            Cell::new(&prescription.medication).add_attribute(Attribute::Bold),
            Cell::new(&prescription.dosage),
            Cell::new(prescription.quantity),
            Cell::new(prescription.refill_on.format("%Y-%m-%d")),
            frequency_cell(&prescription.refill_schedule),
            next_cell(RuleRecord::from(prescription.clone()), now),
        ]);
    }
    println!("{table}");
}

/// Expanded occurrences, one row per instant.
pub fn display_occurrences(occurrences: &[ScheduledOccurrence], now: NaiveDateTime) {
    if occurrences.is_empty() {
        println!("Nothing scheduled.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["When", "", "Details", "Source", "Repeats"]);
    for occurrence in occurrences {
        let mut when = Cell::new(occurrence.at.format(DATETIME_DISPLAY));
        if occurrence.at.date() == now.date() {
            when = when.fg(Color::Yellow).add_attribute(Attribute::Bold);
        }

        let details = match &occurrence.details {
            DisplayFields::Appointment { provider } => provider.clone(),
            DisplayFields::Refill {
                medication,
                dosage,
                quantity,
            } => format!("{} {} x{}", medication, dosage, quantity),
        };

        table.add_row(vec![
            when,
            Cell::new(relative(occurrence.at, now)).fg(Color::DarkGrey),
            Cell::new(details),
            Cell::new(format!("{} #{}", occurrence.kind, occurrence.source_id)),
            Cell::new(schedule_label(occurrence.kind, occurrence.frequency)),
        ]);
    }
    println!("{table}");
}
