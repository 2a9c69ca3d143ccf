//! # Clinic Core Library
//!
//! Recurrence expansion and windowed scheduling for a clinic's appointments
//! and prescription refills.
//!
//! Stored records carry an anchor instant and a frequency label; concrete
//! occurrences are never persisted. Every query expands the rules it needs on
//! the fly, inside a window derived from a single captured "now".
//!
//! ## Core Modules
//!
//! - [`db`]: Database connection and migration management
//! - [`models`]: Records, rules and transfer objects
//! - [`repository`]: Data access layer with Repository pattern
//! - [`recurrence`]: The occurrence expander
//! - [`window`]: Dashboard and full-list window policy plus the clock seam
//! - [`schedule`]: Per-patient schedule queries for portal and admin views
//! - [`error`]: Error types shared by all of the above
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use clinic_core::{
//!     db,
//!     models::{Frequency, NewAppointmentData, NewPatientData, ScheduleConfig, ScheduleKind},
//!     repository::{AppointmentRepository, PatientRepository, SqliteRepository},
//!     schedule::ScheduleService,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = db::establish_connection("clinic.db").await?;
//!     let repo = SqliteRepository::new(pool);
//!
//!     let patient = repo
//!         .add_patient(NewPatientData {
//!             name: "Ada Lovelace".to_string(),
//!             email: "ada@example.com".to_string(),
//!         })
//!         .await?;
//!
//!     repo.add_appointment(NewAppointmentData {
//!         patient_id: patient.id,
//!         provider: "Dr. Babbage".to_string(),
//!         start: chrono::Local::now().naive_local(),
//!         repeat: Some(Frequency::Weekly),
//!         repeat_until: None,
//!     })
//!     .await?;
//!
//!     let service = ScheduleService::new(repo, &ScheduleConfig::default());
//!     for occurrence in service.dashboard_occurrences(patient.id, ScheduleKind::Appointment).await? {
//!         println!("{}", occurrence.at);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
pub mod models;
pub mod recurrence;
pub mod repository;
pub mod schedule;
pub mod window;
