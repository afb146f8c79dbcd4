use async_trait::async_trait;
use sqlx::QueryBuilder;

use super::PgRepository;
use crate::database::{ErrorExt, Result};
use crate::repo::{ConsultationRepository, Crud};
use crate::schema::{Consultation, ConsultationDraft, ConsultationFilter};
use crate::types::id::ConsultationId;

#[async_trait]
impl Crud<Consultation> for PgRepository {
    #[tracing::instrument(name = "db.consultations.create", skip_all)]
    async fn create(&self, new: ConsultationDraft) -> Result<Consultation> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, Consultation>(
            r#"INSERT INTO consultations
                   (patient, doctor_id, center_id, scheduled_at, notes, status)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING *"#,
        )
        .bind(new.patient)
        .bind(new.doctor_id)
        .bind(new.center_id)
        .bind(new.scheduled_at)
        .bind(new.notes)
        .bind(new.status)
        .fetch_one(&mut *conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(name = "db.consultations.find_all", skip_all)]
    async fn find_all(&self) -> Result<Vec<Consultation>> {
        self.find_matching(&ConsultationFilter::default()).await
    }

    #[tracing::instrument(name = "db.consultations.find", skip(self))]
    async fn find(&self, id: ConsultationId) -> Result<Option<Consultation>> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, Consultation>("SELECT * FROM consultations WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .into_db_error()
    }

    #[tracing::instrument(name = "db.consultations.update", skip_all, fields(id = %row.id))]
    async fn update(&self, row: &Consultation) -> Result<Option<Consultation>> {
        let mut conn = self.conn().await?;
        sqlx::query_as::<_, Consultation>(
            r#"UPDATE consultations
               SET patient = $2, doctor_id = $3, center_id = $4,
                   scheduled_at = $5, notes = $6, status = $7
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(row.id)
        .bind(&row.patient)
        .bind(row.doctor_id)
        .bind(row.center_id)
        .bind(row.scheduled_at)
        .bind(&row.notes)
        .bind(row.status)
        .fetch_optional(&mut *conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(name = "db.consultations.delete", skip(self))]
    async fn delete(&self, id: ConsultationId) -> Result<bool> {
        let mut conn = self.conn().await?;
        let result = sqlx::query("DELETE FROM consultations WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await
            .into_db_error()?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ConsultationRepository for PgRepository {
    #[tracing::instrument(name = "db.consultations.find_matching", skip(self))]
    async fn find_matching(&self, filter: &ConsultationFilter) -> Result<Vec<Consultation>> {
        let mut query = QueryBuilder::new("SELECT * FROM consultations WHERE TRUE");
        if let Some(doctor_id) = filter.doctor_id {
            query.push(" AND doctor_id = ").push_bind(doctor_id);
        }
        if let Some(center_id) = filter.center_id {
            query.push(" AND center_id = ").push_bind(center_id);
        }
        if let Some(from) = filter.from {
            query.push(" AND scheduled_at >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            query.push(" AND scheduled_at <= ").push_bind(to);
        }
        query.push(" ORDER BY id");

        let mut conn = self.conn().await?;
        query
            .build_query_as::<Consultation>()
            .fetch_all(&mut *conn)
            .await
            .into_db_error()
    }
}
