//! Tag and sender dictionaries
//!
//! Both dictionaries share one table layout (`id`, `name`) so a single repository
//! serves either of them, selected by [`DictionaryKind`].

use std::sync::Arc;

use async_trait::async_trait;
use mydms_core::{
    models::{join_list, DictionaryEntry, DictionaryKind, ResolvedNames},
    AppError,
};
use sqlx::{PgConnection, PgPool, Postgres};

use super::unit_of_work::{finish, participate, UnitOfWork};

/// Name lookup and creation used while resolving names inside a unit of work
#[async_trait]
pub trait DictionaryStore<U: Send>: Send + Sync {
    fn kind(&self) -> DictionaryKind;

    /// Case-insensitive lookup by name
    async fn find_by_name(&self, name: &str, unit: &mut U)
        -> Result<Option<DictionaryEntry>, AppError>;

    async fn insert(&self, name: &str, unit: &mut U) -> Result<DictionaryEntry, AppError>;
}

/// Maps names to dictionary ids, creating the entries that do not exist yet
pub struct DictionaryResolver<U: Send> {
    store: Arc<dyn DictionaryStore<U>>,
}

impl<U: Send> Clone for DictionaryResolver<U> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<U: Send> DictionaryResolver<U> {
    pub fn new(store: Arc<dyn DictionaryStore<U>>) -> Self {
        Self { store }
    }

    /// Resolve `names` in order; known entries keep their stored spelling in the display string
    pub async fn resolve(&self, names: &[String], unit: &mut U) -> Result<ResolvedNames, AppError> {
        let kind = self.store.kind();
        let mut ids = Vec::with_capacity(names.len());
        let mut display = Vec::with_capacity(names.len());

        for name in names {
            let found = self
                .store
                .find_by_name(name, unit)
                .await
                .map_err(|e| e.context(format!("could not lookup {} '{}'", kind.label(), name)))?;

            let entry = match found {
                Some(entry) => entry,
                None => {
                    let entry = self.store.insert(name, unit).await.map_err(|e| {
                        e.context(format!("could not create {} '{}'", kind.label(), name))
                    })?;
                    tracing::debug!(
                        dictionary = kind.table(),
                        id = entry.id,
                        name = %entry.name,
                        "Created dictionary entry"
                    );
                    entry
                }
            };

            ids.push(entry.id);
            display.push(entry.name);
        }

        Ok(ResolvedNames {
            ids,
            display: join_list(&display),
        })
    }
}

/// Repository for the `tags` or `senders` table
#[derive(Clone)]
pub struct DictionaryRepository {
    pool: PgPool,
    kind: DictionaryKind,
}

impl DictionaryRepository {
    pub fn new(pool: PgPool, kind: DictionaryKind) -> Self {
        Self { pool, kind }
    }

    pub fn tags(pool: PgPool) -> Self {
        Self::new(pool, DictionaryKind::Tag)
    }

    pub fn senders(pool: PgPool) -> Self {
        Self::new(pool, DictionaryKind::Sender)
    }

    /// All entries ordered by name
    #[tracing::instrument(skip(self), fields(db.system = "postgresql", db.table = self.kind.table(), db.operation = "select"))]
    pub async fn get_all(&self) -> Result<Vec<DictionaryEntry>, AppError> {
        let query = format!(
            "SELECT id, name FROM {} ORDER BY name ASC",
            self.kind.table()
        );
        let entries = sqlx::query_as::<Postgres, DictionaryEntry>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    /// Entries whose name contains `name`, ignoring case
    #[tracing::instrument(skip(self), fields(db.system = "postgresql", db.table = self.kind.table(), db.operation = "select"))]
    pub async fn search(&self, name: &str) -> Result<Vec<DictionaryEntry>, AppError> {
        let query = format!(
            "SELECT id, name FROM {} WHERE lower(name) LIKE $1 ORDER BY name ASC",
            self.kind.table()
        );
        let entries = sqlx::query_as::<Postgres, DictionaryEntry>(&query)
            .bind(format!("%{}%", name.to_lowercase()))
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    #[tracing::instrument(skip(self, unit), fields(db.system = "postgresql", db.table = self.kind.table(), db.operation = "select"))]
    pub async fn get_by_name(
        &self,
        name: &str,
        unit: Option<&mut UnitOfWork>,
    ) -> Result<DictionaryEntry, AppError> {
        let found = match unit {
            Some(unit) => self.find_in(unit.conn()?, name).await?,
            None => {
                let mut conn = self.pool.acquire().await?;
                self.find_in(&mut *conn, name).await?
            }
        };

        found.ok_or_else(|| AppError::NotFound(format!("no {} with name '{}'", self.kind.label(), name)))
    }

    /// Return the entry called `name`, inserting it when it does not exist
    #[tracing::instrument(skip(self, unit), fields(db.system = "postgresql", db.table = self.kind.table(), db.operation = "insert"))]
    pub async fn create(
        &self,
        name: &str,
        unit: Option<&mut UnitOfWork>,
    ) -> Result<DictionaryEntry, AppError> {
        let mut participation = participate(&self.pool, unit).await?;
        let result: Result<DictionaryEntry, AppError> = async {
            let conn = participation.unit().conn()?;
            match self.find_in(conn, name).await? {
                Some(entry) => Ok(entry),
                None => self.insert_in(conn, name).await,
            }
        }
        .await;
        finish(participation, result).await
    }

    async fn find_in(
        &self,
        conn: &mut PgConnection,
        name: &str,
    ) -> Result<Option<DictionaryEntry>, AppError> {
        let query = format!(
            "SELECT id, name FROM {} WHERE lower(name) = lower($1) ORDER BY id ASC LIMIT 1",
            self.kind.table()
        );
        let entry = sqlx::query_as::<Postgres, DictionaryEntry>(&query)
            .bind(name)
            .fetch_optional(conn)
            .await?;

        Ok(entry)
    }

    async fn insert_in(
        &self,
        conn: &mut PgConnection,
        name: &str,
    ) -> Result<DictionaryEntry, AppError> {
        let query = format!(
            "INSERT INTO {} (name) VALUES ($1) RETURNING id, name",
            self.kind.table()
        );
        let entry = sqlx::query_as::<Postgres, DictionaryEntry>(&query)
            .bind(name)
            .fetch_one(conn)
            .await?;

        Ok(entry)
    }
}

#[async_trait]
impl DictionaryStore<UnitOfWork> for DictionaryRepository {
    fn kind(&self) -> DictionaryKind {
        self.kind
    }

    async fn find_by_name(
        &self,
        name: &str,
        unit: &mut UnitOfWork,
    ) -> Result<Option<DictionaryEntry>, AppError> {
        self.find_in(unit.conn()?, name).await
    }

    async fn insert(&self, name: &str, unit: &mut UnitOfWork) -> Result<DictionaryEntry, AppError> {
        self.insert_in(unit.conn()?, name).await
    }
}
