use crate::error::CoreError;
use crate::models::{Frequency, NewPrescriptionData, Prescription};
use crate::repository::{require_non_empty, SqliteRepository};
use async_trait::async_trait;
use chrono::Local;

#[async_trait]
impl super::PrescriptionRepository for SqliteRepository {
    async fn add_prescription(&self, data: NewPrescriptionData) -> Result<Prescription, CoreError> {
        require_non_empty("medication", &data.medication)?;
        require_non_empty("dosage", &data.dosage)?;
        if data.quantity < 1 {
            return Err(CoreError::InvalidInput(format!(
                "quantity must be at least 1, got {}",
                data.quantity
            )));
        }

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

        let schedule = data.refill_schedule.unwrap_or(Frequency::Monthly);
        let prescription = sqlx::query_as(
            r#"INSERT INTO prescriptions (patient_id, medication, dosage, quantity, refill_on, refill_schedule, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, patient_id, medication, dosage, quantity, refill_on, refill_schedule, created_at
            "#,
        )
        .bind(data.patient_id)
        .bind(data.medication.trim())
        .bind(data.dosage.trim())
        .bind(data.quantity)
        .bind(data.refill_on)
        .bind(schedule.as_str())
        .bind(Local::now().naive_local())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(prescription)
    }

    async fn find_prescription_by_id(&self, id: i64) -> Result<Option<Prescription>, CoreError> {
        let prescription = sqlx::query_as("SELECT * FROM prescriptions WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(prescription)
    }

    async fn find_prescriptions_for_patient(&self, patient_id: i64) -> Result<Vec<Prescription>, CoreError> {
        let prescriptions = sqlx::query_as(
            "SELECT * FROM prescriptions WHERE patient_id = $1 ORDER BY refill_on, id",
        )
        .bind(patient_id)
        .fetch_all(self.pool())
        .await?;
        Ok(prescriptions)
    }

    async fn delete_prescription(&self, id: i64) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM prescriptions WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Prescription with id {} not found", id)));
        }
        Ok(())
    }
}
