use async_trait::async_trait;
use mydms_core::{models::UploadItem, AppError};
use sqlx::{Connection, PgConnection, PgPool, Postgres};

use super::unit_of_work::{finish, participate, UnitOfWork};

/// Staging rows consumed by the document write path
#[async_trait]
pub trait UploadStore<U: Send>: Send + Sync {
    async fn read(&self, id: &str) -> Result<UploadItem, AppError>;

    async fn delete(&self, id: &str, unit: &mut U) -> Result<(), AppError>;
}

/// Repository for staged uploads. The payload lives on disk and is handled by the caller.
#[derive(Clone)]
pub struct UploadRepository {
    pool: PgPool,
}

impl UploadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, unit), fields(db.system = "postgresql", db.table = "uploads", db.operation = "insert", db.record_id = %item.id))]
    pub async fn write(
        &self,
        item: &UploadItem,
        unit: Option<&mut UnitOfWork>,
    ) -> Result<(), AppError> {
        let mut participation = participate(&self.pool, unit).await?;
        let result: Result<(), AppError> = async {
            let affected = sqlx::query(
                r#"
                INSERT INTO uploads (id, file_name, mime_type, created)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(&item.id)
            .bind(&item.file_name)
            .bind(&item.mime_type)
            .bind(item.created)
            .execute(participation.unit().conn()?)
            .await?
            .rows_affected();

            if affected != 1 {
                return Err(AppError::Internal(format!(
                    "invalid number of rows affected for upload '{}', got {}",
                    item.id, affected
                )));
            }
            Ok(())
        }
        .await;
        finish(participation, result).await
    }

    #[tracing::instrument(skip(self), fields(db.system = "postgresql", db.table = "uploads", db.operation = "select"))]
    pub async fn read(&self, id: &str) -> Result<UploadItem, AppError> {
        let item = sqlx::query_as::<Postgres, UploadItem>(
            "SELECT id, file_name, mime_type, created FROM uploads WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        item.ok_or_else(|| AppError::NotFound(format!("no upload with token '{}'", id)))
    }

    async fn delete_in(conn: &mut PgConnection, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM uploads WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UploadStore<UnitOfWork> for UploadRepository {
    async fn read(&self, id: &str) -> Result<UploadItem, AppError> {
        UploadRepository::read(self, id).await
    }

    /// Runs inside a savepoint so a failure leaves the surrounding unit usable
    #[tracing::instrument(skip(self, unit), fields(db.system = "postgresql", db.table = "uploads", db.operation = "delete"))]
    async fn delete(&self, id: &str, unit: &mut UnitOfWork) -> Result<(), AppError> {
        let mut savepoint = unit.conn()?.begin().await?;
        match Self::delete_in(&mut savepoint, id).await {
            Ok(()) => {
                savepoint.commit().await?;
                Ok(())
            }
            Err(err) => {
                if let Err(rollback_err) = savepoint.rollback().await {
                    tracing::warn!(error = %rollback_err, "Failed to roll back upload savepoint");
                }
                Err(err)
            }
        }
    }
}
