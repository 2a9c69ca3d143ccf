use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use thiserror::Error;

use crate::error::CoreError;

/// Step applied between consecutive occurrences of a rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    None,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::None => "none",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self, Frequency::None)
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid frequency: {0}")]
pub struct ParseFrequencyError(String);

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Frequency::None),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            _ => Err(ParseFrequencyError(s.to_string())),
        }
    }
}

/// The two entity kinds that carry recurrence rules.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleKind {
    Appointment,
    Refill,
}

impl ScheduleKind {
    pub const ALL: [ScheduleKind; 2] = [ScheduleKind::Appointment, ScheduleKind::Refill];
}

impl std::fmt::Display for ScheduleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleKind::Appointment => write!(f, "appointment"),
            ScheduleKind::Refill => write!(f, "refill"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid schedule kind: {0}")]
pub struct ParseScheduleKindError(String);

impl FromStr for ScheduleKind {
    type Err = ParseScheduleKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "appointment" | "appointments" => Ok(ScheduleKind::Appointment),
            "refill" | "refills" | "prescription" | "prescriptions" => Ok(ScheduleKind::Refill),
            _ => Err(ParseScheduleKindError(s.to_string())),
        }
    }
}

// ============================================================================
// Persisted records
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct NewPatientData {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdatePatientData {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub provider: String,
    /// First scheduled visit; anchor of the recurrence rule
    pub start: NaiveDateTime,
    /// Raw repeat label as stored (`none`, `weekly`, `monthly`)
    pub repeat: String,
    /// Optional last day the appointment repeats
    pub repeat_until: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewAppointmentData {
    pub patient_id: i64,
    pub provider: String,
    pub start: NaiveDateTime,
    /// Defaults to `Frequency::None` when absent
    pub repeat: Option<Frequency>,
    pub repeat_until: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateAppointmentData {
    pub provider: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub repeat: Option<Frequency>,
    pub repeat_until: Option<Option<NaiveDateTime>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Prescription {
    pub id: i64,
    pub patient_id: i64,
    pub medication: String,
    pub dosage: String,
    pub quantity: i64,
    /// First refill date; anchor of the recurrence rule
    pub refill_on: NaiveDateTime,
    /// Raw refill schedule label as stored
    pub refill_schedule: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewPrescriptionData {
    pub patient_id: i64,
    pub medication: String,
    pub dosage: String,
    pub quantity: i64,
    pub refill_on: NaiveDateTime,
    /// Defaults to `Frequency::Monthly` when absent
    pub refill_schedule: Option<Frequency>,
}

// ============================================================================
// Recurrence rules
// ============================================================================

/// Kind-specific fields carried alongside each expanded occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DisplayFields {
    Appointment {
        provider: String,
    },
    Refill {
        medication: String,
        dosage: String,
        quantity: i64,
    },
}

/// A rule row as handed over by a `RuleStore`, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleRecord {
    pub id: i64,
    pub anchor: Option<NaiveDateTime>,
    pub frequency: String,
    pub explicit_end: Option<NaiveDateTime>,
    pub display: DisplayFields,
}

impl From<Appointment> for RuleRecord {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            anchor: Some(appointment.start),
            frequency: appointment.repeat,
            explicit_end: appointment.repeat_until,
            display: DisplayFields::Appointment {
                provider: appointment.provider,
            },
        }
    }
}

impl From<Prescription> for RuleRecord {
    fn from(prescription: Prescription) -> Self {
        Self {
            id: prescription.id,
            anchor: Some(prescription.refill_on),
            frequency: prescription.refill_schedule,
            explicit_end: None,
            display: DisplayFields::Refill {
                medication: prescription.medication,
                dosage: prescription.dosage,
                quantity: prescription.quantity,
            },
        }
    }
}

/// Immutable description of a recurring event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccurrenceRule {
    /// First scheduled occurrence, always generated as a candidate
    pub anchor: NaiveDateTime,
    pub frequency: Frequency,
    /// Upper bound on generation; the window's upper bound applies when absent
    pub explicit_end: Option<NaiveDateTime>,
}

impl OccurrenceRule {
    pub fn new(anchor: NaiveDateTime, frequency: Frequency) -> Self {
        Self {
            anchor,
            frequency,
            explicit_end: None,
        }
    }

    pub fn until(mut self, explicit_end: NaiveDateTime) -> Self {
        self.explicit_end = Some(explicit_end);
        self
    }
}

impl TryFrom<&RuleRecord> for OccurrenceRule {
    type Error = CoreError;

    fn try_from(record: &RuleRecord) -> Result<Self, Self::Error> {
        let anchor = record
            .anchor
            .ok_or_else(|| CoreError::InvalidRule(format!("rule {} has no anchor", record.id)))?;
        let frequency = record.frequency.parse::<Frequency>().map_err(|e| {
            CoreError::InvalidRule(format!("rule {}: {}", record.id, e))
        })?;

        Ok(Self {
            anchor,
            frequency,
            explicit_end: record.explicit_end,
        })
    }
}

/// One expanded occurrence merged with its owning record's display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledOccurrence {
    /// Id of the appointment or prescription the occurrence came from
    pub source_id: i64,
    pub kind: ScheduleKind,
    pub at: NaiveDateTime,
    pub frequency: Frequency,
    #[serde(flatten)]
    pub details: DisplayFields,
}

/// Window lengths and the per-rule cap used by the standard views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Length of the portal home window in days
    pub dashboard_days: i64,
    /// Length of the full-list window in days
    pub full_list_days: i64,
    /// Maximum occurrences produced per rule per query
    pub occurrence_cap: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            dashboard_days: 7,
            full_list_days: 90,
            occurrence_cap: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_scheduled_occurrence_json_shape() {
        let refill = ScheduledOccurrence {
            source_id: 4,
            kind: ScheduleKind::Refill,
            at: at(2025, 1, 31),
            frequency: Frequency::Monthly,
            details: DisplayFields::Refill {
                medication: "Metformin".to_string(),
                dosage: "500mg".to_string(),
                quantity: 60,
            },
        };

        let value = serde_json::to_value(&refill).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "source_id": 4,
                "kind": "refill",
                "at": "2025-01-31T09:00:00",
                "frequency": "monthly",
                "medication": "Metformin",
                "dosage": "500mg",
                "quantity": 60,
            })
        );
        let back: ScheduledOccurrence = serde_json::from_value(value).unwrap();
        assert_eq!(back, refill);

        let visit = ScheduledOccurrence {
            source_id: 2,
            kind: ScheduleKind::Appointment,
            at: at(2025, 2, 3),
            frequency: Frequency::None,
            details: DisplayFields::Appointment {
                provider: "Dr. Rivera".to_string(),
            },
        };
        let json = serde_json::to_string(&visit).unwrap();
        assert!(json.contains(r#""provider":"Dr. Rivera""#));
        assert_eq!(serde_json::from_str::<ScheduledOccurrence>(&json).unwrap(), visit);
    }

    #[test]
    fn test_frequency_from_str() {
        assert_eq!("none".parse::<Frequency>(), Ok(Frequency::None));
        assert_eq!("Weekly".parse::<Frequency>(), Ok(Frequency::Weekly));
        assert_eq!(" MONTHLY ".parse::<Frequency>(), Ok(Frequency::Monthly));
        assert!("daily".parse::<Frequency>().is_err());
        assert!("".parse::<Frequency>().is_err());
    }

    #[test]
    fn test_frequency_display_matches_stored_label() {
        for frequency in [Frequency::None, Frequency::Weekly, Frequency::Monthly] {
            assert_eq!(frequency.to_string().parse::<Frequency>(), Ok(frequency));
        }
    }

    #[test]
    fn test_schedule_kind_from_str() {
        assert_eq!("appointments".parse::<ScheduleKind>(), Ok(ScheduleKind::Appointment));
        assert_eq!("refill".parse::<ScheduleKind>(), Ok(ScheduleKind::Refill));
        assert_eq!("prescriptions".parse::<ScheduleKind>(), Ok(ScheduleKind::Refill));
        assert!("visits".parse::<ScheduleKind>().is_err());
    }

    #[test]
    fn test_rule_from_appointment_record() {
        let appointment = Appointment {
            id: 4,
            patient_id: 1,
            provider: "Dr. Kim".to_string(),
            start: at(2025, 1, 1),
            repeat: "weekly".to_string(),
            repeat_until: Some(at(2025, 3, 1)),
            created_at: at(2024, 12, 1),
        };

        let record = RuleRecord::from(appointment);
        let rule = OccurrenceRule::try_from(&record).unwrap();

        assert_eq!(rule.anchor, at(2025, 1, 1));
        assert_eq!(rule.frequency, Frequency::Weekly);
        assert_eq!(rule.explicit_end, Some(at(2025, 3, 1)));
        assert_eq!(
            record.display,
            DisplayFields::Appointment { provider: "Dr. Kim".to_string() }
        );
    }

    #[test]
    fn test_rule_from_prescription_record_has_no_end() {
        let prescription = Prescription {
            id: 2,
            patient_id: 1,
            medication: "Lisinopril".to_string(),
            dosage: "10mg".to_string(),
            quantity: 30,
            refill_on: at(2025, 2, 1),
            refill_schedule: "monthly".to_string(),
            created_at: at(2025, 1, 1),
        };

        let rule = OccurrenceRule::try_from(&RuleRecord::from(prescription)).unwrap();
        assert_eq!(rule.frequency, Frequency::Monthly);
        assert_eq!(rule.explicit_end, None);
    }

    #[test]
    fn test_rule_rejects_unknown_frequency() {
        let record = RuleRecord {
            id: 9,
            anchor: Some(at(2025, 1, 1)),
            frequency: "fortnightly".to_string(),
            explicit_end: None,
            display: DisplayFields::Appointment { provider: "Dr. Kim".to_string() },
        };

        let result = OccurrenceRule::try_from(&record);
        assert!(matches!(result, Err(CoreError::InvalidRule(_))));
    }

    #[test]
    fn test_rule_rejects_missing_anchor() {
        let record = RuleRecord {
            id: 9,
            anchor: None,
            frequency: "none".to_string(),
            explicit_end: None,
            display: DisplayFields::Appointment { provider: "Dr. Kim".to_string() },
        };

        let result = OccurrenceRule::try_from(&record);
        assert!(matches!(result, Err(CoreError::InvalidRule(_))));
    }

    #[test]
    fn test_schedule_config_defaults() {
        let config = ScheduleConfig::default();
        assert_eq!(config.dashboard_days, 7);
        assert_eq!(config.full_list_days, 90);
        assert_eq!(config.occurrence_cap, 50);
    }
}
