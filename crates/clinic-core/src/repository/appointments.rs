use crate::error::CoreError;
use crate::models::{Appointment, Frequency, NewAppointmentData, UpdateAppointmentData};
use crate::repository::{require_non_empty, SqliteRepository};
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use sqlx::{QueryBuilder, Sqlite};

fn check_repeat_until(
    start: NaiveDateTime,
    repeat_until: Option<NaiveDateTime>,
) -> Result<(), CoreError> {
    match repeat_until {
        Some(until) if until < start => Err(CoreError::InvalidInput(format!(
            "repeat_until {} is before start {}",
            until, start
        ))),
        _ => Ok(()),
    }
}

#[async_trait]
impl super::AppointmentRepository for SqliteRepository {
    async fn add_appointment(&self, data: NewAppointmentData) -> Result<Appointment, CoreError> {
        require_non_empty("provider", &data.provider)?;
        check_repeat_until(data.start, data.repeat_until)?;

        let mut tx = self.pool().begin().await?;

        let patient_exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM patients WHERE id = $1")
            .bind(data.patient_id)
            .fetch_optional(&mut *tx)
            .await?;
        if patient_exists.is_none() {
            return Err(CoreError::NotFound(format!(
                "Patient with id {} not found",
                data.patient_id
            )));
        }

        let repeat = data.repeat.unwrap_or(Frequency::None);
        let appointment = sqlx::query_as(
            r#"INSERT INTO appointments (patient_id, provider, start, repeat, repeat_until, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, patient_id, provider, start, repeat, repeat_until, created_at
            "#,
        )
        .bind(data.patient_id)
        .bind(data.provider.trim())
        .bind(data.start)
        .bind(repeat.as_str())
        .bind(data.repeat_until)
        .bind(Local::now().naive_local())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(appointment)
    }

    async fn find_appointment_by_id(&self, id: i64) -> Result<Option<Appointment>, CoreError> {
        let appointment = sqlx::query_as("SELECT * FROM appointments WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(appointment)
    }

    async fn find_appointments_for_patient(&self, patient_id: i64) -> Result<Vec<Appointment>, CoreError> {
        let appointments = sqlx::query_as(
            "SELECT * FROM appointments WHERE patient_id = $1 ORDER BY start, id",
        )
        .bind(patient_id)
        .fetch_all(self.pool())
        .await?;
        Ok(appointments)
    }

    async fn update_appointment(&self, id: i64, data: UpdateAppointmentData) -> Result<Appointment, CoreError> {
        let mut tx = self.pool().begin().await?;

        let current: Appointment = sqlx::query_as("SELECT * FROM appointments WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Appointment with id {} not found", id)))?;

        let start = data.start.unwrap_or(current.start);
        let repeat_until = data.repeat_until.unwrap_or(current.repeat_until);
        check_repeat_until(start, repeat_until)?;

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE appointments SET ");
        let mut updated = false;

        if let Some(provider) = &data.provider {
            require_non_empty("provider", provider)?;
            qb.push("provider = ");
            qb.push_bind(provider.trim().to_string());
            updated = true;
        }

        if let Some(start) = data.start {
            if updated {
                qb.push(", ");
            }
            qb.push("start = ");
            qb.push_bind(start);
            updated = true;
        }

        if let Some(repeat) = data.repeat {
            if updated {
                qb.push(", ");
            }
            qb.push("repeat = ");
            qb.push_bind(repeat.as_str());
            updated = true;
        }

        if let Some(repeat_until) = data.repeat_until {
            if updated {
                qb.push(", ");
            }
            qb.push("repeat_until = ");
            qb.push_bind(repeat_until);
            updated = true;
        }

        if updated {
            qb.push(" WHERE id = ");
            qb.push_bind(id);
            qb.build().execute(&mut *tx).await?;
        }

        let appointment: Appointment = sqlx::query_as("SELECT * FROM appointments WHERE id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(appointment)
    }

    async fn delete_appointment(&self, id: i64) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Appointment with id {} not found", id)));
        }
        Ok(())
    }
}
