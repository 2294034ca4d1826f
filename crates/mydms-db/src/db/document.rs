use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use mydms_core::{
    ids::{new_alt_id, new_id},
    models::{DictionaryKind, Document, DocumentFilter, OrderBy},
    AppError,
};
use sqlx::{PgConnection, PgPool, Postgres};

use super::unit_of_work::UnitOfWork;

const DOCUMENT_COLUMNS: &str =
    "id, alt_id, title, file_name, preview_link, amount, tag_list, sender_list, created, modified";

/// Document operations used by the write path, always inside a unit of work
#[async_trait]
pub trait DocumentStore<U: Send>: Send + Sync {
    /// The document with `id`, `NotFound` when absent
    async fn get(&self, id: &str, unit: &mut U) -> Result<Document, AppError>;

    /// The current file name of document `id`, `NotFound` when absent
    async fn exists(&self, id: &str, unit: &mut U) -> Result<String, AppError>;

    /// Insert or update; returns the persisted row
    async fn save(&self, doc: Document, unit: &mut U) -> Result<Document, AppError>;

    async fn delete(&self, id: &str, unit: &mut U) -> Result<(), AppError>;

    /// Replace the tag and sender links of document `id`
    async fn save_references(
        &self,
        id: &str,
        tag_ids: &[i32],
        sender_ids: &[i32],
        unit: &mut U,
    ) -> Result<(), AppError>;
}

enum SearchParam {
    Text(String),
    Timestamp(DateTime<Utc>),
}

/// Repository for the `documents` table and its link tables
#[derive(Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.system = "postgresql", db.table = "documents", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: &str) -> Result<Document, AppError> {
        let mut conn = self.pool.acquire().await?;
        Self::get_in(&mut *conn, id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn get_in(conn: &mut PgConnection, id: &str) -> Result<Option<Document>, AppError> {
        let query = format!("SELECT {} FROM documents WHERE id = $1", DOCUMENT_COLUMNS);
        let doc = sqlx::query_as::<Postgres, Document>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(doc)
    }

    async fn exists_in(conn: &mut PgConnection, id: &str) -> Result<String, AppError> {
        let file_name =
            sqlx::query_scalar::<Postgres, String>("SELECT file_name FROM documents WHERE id = $1")
                .bind(id)
                .fetch_optional(conn)
                .await?;
        file_name.ok_or_else(|| not_found(id))
    }

    async fn save_in(conn: &mut PgConnection, doc: Document) -> Result<Document, AppError> {
        let existing = if doc.id.is_empty() {
            None
        } else {
            Self::get_in(&mut *conn, &doc.id).await?
        };

        // postgres keeps microseconds
        let now = Utc::now().trunc_subsecs(6);

        match existing {
            None => {
                let entity = Document {
                    id: new_id(),
                    alt_id: new_alt_id(),
                    created: now,
                    modified: None,
                    ..doc
                };
                let affected = sqlx::query(
                    r#"
                    INSERT INTO documents (id, alt_id, title, file_name, preview_link, amount, tag_list, sender_list, created)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    "#,
                )
                .bind(&entity.id)
                .bind(&entity.alt_id)
                .bind(&entity.title)
                .bind(&entity.file_name)
                .bind(&entity.preview_link)
                .bind(entity.amount)
                .bind(&entity.tag_list)
                .bind(&entity.sender_list)
                .bind(entity.created)
                .execute(conn)
                .await?
                .rows_affected();

                check_affected(affected, &entity.id)?;
                tracing::debug!(document_id = %entity.id, "Inserted document");
                Ok(entity)
            }
            Some(current) => {
                let entity = Document {
                    id: current.id,
                    alt_id: current.alt_id,
                    created: current.created,
                    modified: Some(now),
                    ..doc
                };
                let affected = sqlx::query(
                    r#"
                    UPDATE documents
                    SET title = $2, file_name = $3, preview_link = $4, amount = $5,
                        tag_list = $6, sender_list = $7, modified = $8
                    WHERE id = $1
                    "#,
                )
                .bind(&entity.id)
                .bind(&entity.title)
                .bind(&entity.file_name)
                .bind(&entity.preview_link)
                .bind(entity.amount)
                .bind(&entity.tag_list)
                .bind(&entity.sender_list)
                .bind(entity.modified)
                .execute(conn)
                .await?
                .rows_affected();

                check_affected(affected, &entity.id)?;
                tracing::debug!(document_id = %entity.id, "Updated document");
                Ok(entity)
            }
        }
    }

    async fn delete_in(conn: &mut PgConnection, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    async fn save_references_in(
        conn: &mut PgConnection,
        id: &str,
        tag_ids: &[i32],
        sender_ids: &[i32],
    ) -> Result<(), AppError> {
        Self::replace_links_in(&mut *conn, DictionaryKind::Tag, id, tag_ids).await?;
        Self::replace_links_in(&mut *conn, DictionaryKind::Sender, id, sender_ids).await?;
        Ok(())
    }

    async fn replace_links_in(
        conn: &mut PgConnection,
        kind: DictionaryKind,
        id: &str,
        entry_ids: &[i32],
    ) -> Result<(), AppError> {
        let delete = format!("DELETE FROM {} WHERE document_id = $1", kind.link_table());
        sqlx::query(&delete).bind(id).execute(&mut *conn).await?;

        let insert = format!(
            "INSERT INTO {} (document_id, {}) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            kind.link_table(),
            kind.link_column()
        );
        for entry_id in entry_ids {
            sqlx::query(&insert)
                .bind(id)
                .bind(*entry_id)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore<UnitOfWork> for DocumentRepository {
    #[tracing::instrument(skip(self, unit), fields(db.system = "postgresql", db.table = "documents", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: &str, unit: &mut UnitOfWork) -> Result<Document, AppError> {
        Self::get_in(unit.conn()?, id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    #[tracing::instrument(skip(self, unit), fields(db.system = "postgresql", db.table = "documents", db.operation = "select", db.record_id = %id))]
    async fn exists(&self, id: &str, unit: &mut UnitOfWork) -> Result<String, AppError> {
        Self::exists_in(unit.conn()?, id).await
    }

    #[tracing::instrument(skip(self, doc, unit), fields(db.system = "postgresql", db.table = "documents", db.operation = "upsert"))]
    async fn save(&self, doc: Document, unit: &mut UnitOfWork) -> Result<Document, AppError> {
        Self::save_in(unit.conn()?, doc).await
    }

    #[tracing::instrument(skip(self, unit), fields(db.system = "postgresql", db.table = "documents", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: &str, unit: &mut UnitOfWork) -> Result<(), AppError> {
        Self::delete_in(unit.conn()?, id).await
    }

    #[tracing::instrument(skip(self, tag_ids, sender_ids, unit), fields(db.system = "postgresql", db.table = "document_tags", db.operation = "replace", db.record_id = %id))]
    async fn save_references(
        &self,
        id: &str,
        tag_ids: &[i32],
        sender_ids: &[i32],
        unit: &mut UnitOfWork,
    ) -> Result<(), AppError> {
        Self::save_references_in(unit.conn()?, id, tag_ids, sender_ids).await
    }
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("no document with id '{}'", id))
}

/// Writes must touch exactly one row
fn check_affected(affected: u64, id: &str) -> Result<(), AppError> {
    if affected != 1 {
        return Err(AppError::Internal(format!(
            "invalid number of rows affected for document '{}', got {}",
            id, affected
        )));
    }
    Ok(())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn like_pattern(value: &str) -> String {
    format!("%{}%", value.to_lowercase())
}

fn order_clause(order: &[OrderBy]) -> String {
    let order = if order.is_empty() {
        OrderBy::default_order()
    } else {
        order.to_vec()
    };
    order
        .iter()
        .map(|o| format!("{} {}", o.field.column(), o.direction.sql()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mydms_core::models::{OrderField, SortDirection};

    #[test]
    fn test_order_clause_default() {
        assert_eq!(order_clause(&[]), "created DESC, title ASC");
    }

    #[test]
    fn test_order_clause_custom() {
        let order = vec![OrderBy::new(OrderField::Modified, SortDirection::Asc)];
        assert_eq!(order_clause(&order), "modified ASC");
    }

    #[test]
    fn test_check_affected() {
        assert!(check_affected(1, "D1").is_ok());
        let err = check_affected(0, "D1").unwrap_err();
        assert!(err.to_string().contains("got 0"));
        assert!(check_affected(2, "D1").is_err());
    }

    #[test]
    fn test_like_pattern_lowercases() {
        assert_eq!(like_pattern("ACME"), "%acme%");
        assert_eq!(non_empty(&Some("  ".to_string())), None);
        assert_eq!(non_empty(&Some("x".to_string())), Some("x"));
    }
}
