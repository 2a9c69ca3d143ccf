use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{
    Appointment, NewAppointmentData, NewPatientData, NewPrescriptionData, Patient, Prescription,
    RuleRecord, ScheduleKind, UpdateAppointmentData, UpdatePatientData,
};
use async_trait::async_trait;

pub mod appointments;
pub mod patients;
pub mod prescriptions;
pub mod rules;

/// Read access to the recurrence rules owned by a subject.
///
/// Only ownership is filtered here; windowing belongs to the expander.
#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn load_rules(&self, subject_id: i64, kind: ScheduleKind) -> Result<Vec<RuleRecord>, CoreError>;
}

#[async_trait]
impl<T: RuleStore + ?Sized> RuleStore for &T {
    async fn load_rules(&self, subject_id: i64, kind: ScheduleKind) -> Result<Vec<RuleRecord>, CoreError> {
        (**self).load_rules(subject_id, kind).await
    }
}

/// Domain-specific trait for patient operations
#[async_trait]
pub trait PatientRepository {
    async fn add_patient(&self, data: NewPatientData) -> Result<Patient, CoreError>;
    async fn find_patient_by_id(&self, id: i64) -> Result<Option<Patient>, CoreError>;
    async fn find_patients(&self) -> Result<Vec<Patient>, CoreError>;
    async fn update_patient(&self, id: i64, data: UpdatePatientData) -> Result<Patient, CoreError>;
    async fn delete_patient(&self, id: i64) -> Result<(), CoreError>;
}

/// Domain-specific trait for appointment operations
#[async_trait]
pub trait AppointmentRepository {
    async fn add_appointment(&self, data: NewAppointmentData) -> Result<Appointment, CoreError>;
    async fn find_appointment_by_id(&self, id: i64) -> Result<Option<Appointment>, CoreError>;
    async fn find_appointments_for_patient(&self, patient_id: i64) -> Result<Vec<Appointment>, CoreError>;
    async fn update_appointment(&self, id: i64, data: UpdateAppointmentData) -> Result<Appointment, CoreError>;
    async fn delete_appointment(&self, id: i64) -> Result<(), CoreError>;
}

/// Domain-specific trait for prescription operations
#[async_trait]
pub trait PrescriptionRepository {
    async fn add_prescription(&self, data: NewPrescriptionData) -> Result<Prescription, CoreError>;
    async fn find_prescription_by_id(&self, id: i64) -> Result<Option<Prescription>, CoreError>;
    async fn find_prescriptions_for_patient(&self, patient_id: i64) -> Result<Vec<Prescription>, CoreError>;
    async fn delete_prescription(&self, id: i64) -> Result<(), CoreError>;
}

/// Main repository trait that composes all domain traits
pub trait Repository:
    PatientRepository + AppointmentRepository + PrescriptionRepository + RuleStore
{
}

impl<T> Repository for T where
    T: PatientRepository + AppointmentRepository + PrescriptionRepository + RuleStore
{
}

/// SQLite implementation of the repository pattern
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the database pool for internal use across modules
    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Rejects blank required text fields.
pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}
