use clap::{Parser, Subcommand, ValueEnum};
use clinic_core::models::{Frequency, ScheduleKind};

/// Clinic records: patients, appointments, prescriptions and their schedules
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Manage patients
    #[command(subcommand)]
    Patient(PatientCommand),
    /// Manage appointments
    #[command(subcommand)]
    Appointment(AppointmentCommand),
    /// Manage prescriptions
    #[command(subcommand)]
    Prescription(PrescriptionCommand),
    /// Patient portal home: this week's appointments and refills
    Portal(PortalCommand),
    /// Full upcoming schedule for a patient
    Upcoming(UpcomingCommand),
}

#[derive(Subcommand, Debug, Clone)]
pub enum PatientCommand {
    /// Register a new patient
    Add {
        name: String,
        #[arg(long)]
        email: String,
    },
    /// List all patients
    List,
    /// Show a patient with their records and upcoming schedule
    Show {
        id: i64,
        #[arg(long)]
        json: bool,
    },
    /// Change a patient's name or email
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Delete a patient together with their appointments and prescriptions
    Delete {
        id: i64,
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum AppointmentCommand {
    /// Book an appointment
    Add(AddAppointmentCommand),
    /// Edit an appointment
    Edit(EditAppointmentCommand),
    /// Cancel an appointment and every future repeat
    Delete {
        id: i64,
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Parser, Debug, Clone)]
pub struct AddAppointmentCommand {
    pub patient_id: i64,
    #[arg(long)]
    pub provider: String,
    /// First visit, e.g. '2025-03-01 09:30' or 'next monday 9am'
    #[arg(long)]
    pub start: String,
    #[arg(long, value_enum)]
    pub repeat: Option<FrequencyArg>,
    /// Last day the appointment repeats
    #[arg(long)]
    pub until: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct EditAppointmentCommand {
    pub id: i64,
    #[arg(long)]
    pub provider: Option<String>,
    #[arg(long)]
    pub start: Option<String>,
    #[arg(long, value_enum)]
    pub repeat: Option<FrequencyArg>,
    #[arg(long)]
    pub until: Option<String>,
    #[arg(long, conflicts_with = "until")]
    pub until_clear: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PrescriptionCommand {
    /// Record a prescription and its refill schedule
    Add(AddPrescriptionCommand),
    /// Delete a prescription
    Delete {
        id: i64,
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Parser, Debug, Clone)]
pub struct AddPrescriptionCommand {
    pub patient_id: i64,
    #[arg(long)]
    pub medication: String,
    #[arg(long)]
    pub dosage: String,
    #[arg(long)]
    pub quantity: i64,
    /// First refill date
    #[arg(long)]
    pub refill_on: String,
    #[arg(long, value_enum)]
    pub schedule: Option<FrequencyArg>,
}

#[derive(Parser, Debug, Clone)]
pub struct PortalCommand {
    pub patient_id: i64,
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct UpcomingCommand {
    pub patient_id: i64,
    /// Restrict to one kind; both are shown otherwise
    #[arg(long, value_enum)]
    pub kind: Option<KindArg>,
    #[arg(long)]
    pub json: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyArg {
    None,
    Weekly,
    Monthly,
}

impl From<FrequencyArg> for Frequency {
    fn from(arg: FrequencyArg) -> Self {
        match arg {
            FrequencyArg::None => Frequency::None,
            FrequencyArg::Weekly => Frequency::Weekly,
            FrequencyArg::Monthly => Frequency::Monthly,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    Appointment,
    Refill,
}

impl From<KindArg> for ScheduleKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Appointment => ScheduleKind::Appointment,
            KindArg::Refill => ScheduleKind::Refill,
        }
    }
}
