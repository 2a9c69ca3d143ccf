use crate::error::CoreError;
use crate::models::{DisplayFields, RuleRecord, ScheduleKind};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// An undecodable or absent anchor becomes `None` so validation reports it as a bad rule.
fn anchor_column(row: &SqliteRow, column: &str) -> Option<NaiveDateTime> {
    row.try_get::<Option<NaiveDateTime>, _>(column).ok().flatten()
}

fn end_column(row: &SqliteRow, id: i64) -> Result<Option<NaiveDateTime>, CoreError> {
    row.try_get::<Option<NaiveDateTime>, _>("repeat_until")
        .map_err(|e| CoreError::InvalidRule(format!("rule {} has an unreadable end: {}", id, e)))
}

fn appointment_rule(row: &SqliteRow) -> Result<RuleRecord, CoreError> {
    let id: i64 = row.try_get("id")?;
    Ok(RuleRecord {
        id,
        anchor: anchor_column(row, "start"),
        frequency: row.try_get("repeat")?,
        explicit_end: end_column(row, id)?,
        display: DisplayFields::Appointment {
            provider: row.try_get("provider")?,
        },
    })
}

fn refill_rule(row: &SqliteRow) -> Result<RuleRecord, CoreError> {
    Ok(RuleRecord {
        id: row.try_get("id")?,
        anchor: anchor_column(row, "refill_on"),
        frequency: row.try_get("refill_schedule")?,
        explicit_end: None,
        display: DisplayFields::Refill {
            medication: row.try_get("medication")?,
            dosage: row.try_get("dosage")?,
            quantity: row.try_get("quantity")?,
        },
    })
}

#[async_trait]
impl super::RuleStore for SqliteRepository {
    async fn load_rules(&self, subject_id: i64, kind: ScheduleKind) -> Result<Vec<RuleRecord>, CoreError> {
        match kind {
            ScheduleKind::Appointment => {
                let rows = sqlx::query(
                    "SELECT id, provider, start, repeat, repeat_until FROM appointments WHERE patient_id = $1",
                )
                .bind(subject_id)
                .fetch_all(self.pool())
                .await?;
                rows.iter().map(appointment_rule).collect()
            }
            ScheduleKind::Refill => {
                let rows = sqlx::query(
                    "SELECT id, medication, dosage, quantity, refill_on, refill_schedule FROM prescriptions WHERE patient_id = $1",
                )
                .bind(subject_id)
                .fetch_all(self.pool())
                .await?;
                rows.iter().map(refill_rule).collect()
            }
        }
    }
}
