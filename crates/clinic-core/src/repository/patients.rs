use crate::error::CoreError;
use crate::models::{NewPatientData, Patient, UpdatePatientData};
use crate::repository::{require_non_empty, SqliteRepository};
use async_trait::async_trait;
use chrono::Local;
use sqlx::{QueryBuilder, Sqlite};

/// Maps a unique-email violation to a user-facing input error.
fn map_duplicate_email(err: sqlx::Error, email: &str) -> CoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            CoreError::InvalidInput(format!("A patient with email '{}' already exists", email))
        }
        _ => CoreError::StorageUnavailable(err),
    }
}

#[async_trait]
impl super::PatientRepository for SqliteRepository {
    async fn add_patient(&self, data: NewPatientData) -> Result<Patient, CoreError> {
        require_non_empty("name", &data.name)?;
        require_non_empty("email", &data.email)?;

        let patient = sqlx::query_as(
            r#"INSERT INTO patients (name, email, created_at)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, created_at
            "#,
        )
        .bind(data.name.trim())
        .bind(data.email.trim())
        .bind(Local::now().naive_local())
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_duplicate_email(e, &data.email))?;

        Ok(patient)
    }

    async fn find_patient_by_id(&self, id: i64) -> Result<Option<Patient>, CoreError> {
        let patient = sqlx::query_as("SELECT * FROM patients WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(patient)
    }

    async fn find_patients(&self) -> Result<Vec<Patient>, CoreError> {
        let patients = sqlx::query_as("SELECT id, name, email, created_at FROM patients ORDER BY id")
            .fetch_all(self.pool())
            .await?;
        Ok(patients)
    }

    async fn update_patient(&self, id: i64, data: UpdatePatientData) -> Result<Patient, CoreError> {
        let mut tx = self.pool().begin().await?;

        let _current: Patient = sqlx::query_as("SELECT * FROM patients WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Patient with id {} not found", id)))?;

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE patients SET ");
        let mut updated = false;

        if let Some(name) = &data.name {
            require_non_empty("name", name)?;
            qb.push("name = ");
            qb.push_bind(name.trim().to_string());
            updated = true;
        }

        if let Some(email) = &data.email {
            require_non_empty("email", email)?;
            if updated {
                qb.push(", ");
            }
            qb.push("email = ");
            qb.push_bind(email.trim().to_string());
            updated = true;
        }

        if updated {
            qb.push(" WHERE id = ");
            qb.push_bind(id);
            qb.build()
                .execute(&mut *tx)
                .await
                .map_err(|e| map_duplicate_email(e, data.email.as_deref().unwrap_or_default()))?;
        }

        let patient: Patient = sqlx::query_as("SELECT * FROM patients WHERE id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(patient)
    }

    async fn delete_patient(&self, id: i64) -> Result<(), CoreError> {
        // Appointments and prescriptions go with the patient (ON DELETE CASCADE).
        let result = sqlx::query("DELETE FROM patients WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Patient with id {} not found", id)));
        }
        Ok(())
    }
}
