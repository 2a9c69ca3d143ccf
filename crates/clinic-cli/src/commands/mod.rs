pub mod appointment;
pub mod patient;
pub mod prescription;
pub mod schedule;
