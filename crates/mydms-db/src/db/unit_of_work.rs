//! Unit-of-work over a single database transaction
//!
//! Repository operations that mutate data accept an optional outer unit. When one is
//! handed in they join it and leave commit/rollback to its owner; otherwise they open
//! and finish their own.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use mydms_core::AppError;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

/// A live database transaction
///
/// # Example
///
/// ```ignore
/// use mydms_db::db::unit_of_work::UnitOfWork;
///
/// async fn example(pool: &sqlx::PgPool) -> Result<(), mydms_core::AppError> {
///     let mut unit = UnitOfWork::begin(pool).await?;
///     sqlx::query("DELETE FROM uploads").execute(unit.conn()?).await?;
///     unit.commit().await
/// }
/// ```
pub struct UnitOfWork {
    transaction: Option<Transaction<'static, Postgres>>,
}

impl UnitOfWork {
    pub async fn begin(pool: &PgPool) -> Result<Self, AppError> {
        let transaction = pool
            .begin()
            .await
            .map_err(|e| AppError::Database(e).context("could not begin transaction"))?;

        Ok(Self {
            transaction: Some(transaction),
        })
    }

    pub fn is_active(&self) -> bool {
        self.transaction.is_some()
    }

    /// The connection the transaction runs on
    pub fn conn(&mut self) -> Result<&mut PgConnection, AppError> {
        self.transaction
            .as_deref_mut()
            .ok_or_else(|| AppError::Internal("the unit of work is no longer active".to_string()))
    }

    pub async fn commit(&mut self) -> Result<(), AppError> {
        if let Some(tx) = self.transaction.take() {
            tx.commit()
                .await
                .map_err(|e| AppError::Database(e).context("could not commit transaction"))?;
        }
        Ok(())
    }

    pub async fn rollback(&mut self) -> Result<(), AppError> {
        if let Some(tx) = self.transaction.take() {
            tx.rollback()
                .await
                .map_err(|e| AppError::Database(e).context("could not rollback transaction"))?;
        }
        Ok(())
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        // sqlx rolls the transaction back when it is dropped
        if self.transaction.is_some() {
            tracing::warn!("Unit of work was dropped without commit or rollback - rolling back");
        }
    }
}

/// How an operation takes part in a unit of work
pub enum Participation<'u> {
    /// An active unit owned by the caller; it decides about commit and rollback
    Joined(&'u mut UnitOfWork),
    /// A unit opened for this operation alone
    Owned(UnitOfWork),
}

impl<'u> Participation<'u> {
    pub fn owned(&self) -> bool {
        matches!(self, Participation::Owned(_))
    }

    pub fn unit(&mut self) -> &mut UnitOfWork {
        match self {
            Participation::Joined(unit) => unit,
            Participation::Owned(unit) => unit,
        }
    }
}

/// Join `outer` when it is active, otherwise open a new unit on `pool`
pub async fn participate<'u>(
    pool: &PgPool,
    outer: Option<&'u mut UnitOfWork>,
) -> Result<Participation<'u>, AppError> {
    match outer {
        Some(unit) if unit.is_active() => Ok(Participation::Joined(unit)),
        _ => Ok(Participation::Owned(UnitOfWork::begin(pool).await?)),
    }
}

/// Commit on success and roll back on failure, but only for an owned unit
pub async fn finish<T>(
    participation: Participation<'_>,
    result: Result<T, AppError>,
) -> Result<T, AppError> {
    match participation {
        Participation::Joined(_) => result,
        Participation::Owned(mut unit) => match result {
            Ok(value) => {
                unit.commit().await?;
                Ok(value)
            }
            Err(err) => match unit.rollback().await {
                Ok(()) => Err(err),
                Err(rollback_err) => Err(rollback_failed(err, rollback_err)),
            },
        },
    }
}

/// Combine the original failure with the failure to roll back
pub fn rollback_failed(err: AppError, rollback_err: AppError) -> AppError {
    AppError::InternalWithSource {
        message: format!("{}; additionally the rollback failed: {}", err, rollback_err),
        source: anyhow::Error::new(err),
    }
}

/// Run `f` inside a fresh unit of work that is committed when `f` succeeds
///
/// # Example
///
/// ```ignore
/// with_unit_of_work(&pool, |unit| Box::pin(async move {
///     tags.create("work", Some(unit)).await
/// })).await?;
/// ```
pub async fn with_unit_of_work<F, R>(pool: &PgPool, f: F) -> Result<R, AppError>
where
    F: for<'a> FnOnce(
        &'a mut UnitOfWork,
    ) -> Pin<Box<dyn Future<Output = Result<R, AppError>> + Send + 'a>>,
{
    let mut participation = Participation::Owned(UnitOfWork::begin(pool).await?);
    let result = f(participation.unit()).await;
    finish(participation, result).await
}

/// Source of units of work for code that composes several repositories
///
/// The orchestration layer is written against this trait so it can run on a real
/// transaction or on an in-memory fake.
#[async_trait]
pub trait UnitOfWorkProvider: Send + Sync {
    type Unit: Send;

    async fn begin(&self) -> Result<Self::Unit, AppError>;

    async fn commit(&self, unit: Self::Unit) -> Result<(), AppError>;

    async fn rollback(&self, unit: Self::Unit) -> Result<(), AppError>;

    /// Commit on `Ok`, roll back on `Err`; a failing rollback is folded into the error
    async fn finish<T: Send>(
        &self,
        unit: Self::Unit,
        result: Result<T, AppError>,
    ) -> Result<T, AppError> {
        match result {
            Ok(value) => {
                self.commit(unit).await?;
                Ok(value)
            }
            Err(err) => match self.rollback(unit).await {
                Ok(()) => Err(err),
                Err(rollback_err) => Err(rollback_failed(err, rollback_err)),
            },
        }
    }
}

/// Units of work backed by PostgreSQL transactions
#[derive(Clone)]
pub struct PgUnitOfWorkProvider {
    pool: PgPool,
}

impl PgUnitOfWorkProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWorkProvider for PgUnitOfWorkProvider {
    type Unit = UnitOfWork;

    async fn begin(&self) -> Result<UnitOfWork, AppError> {
        UnitOfWork::begin(&self.pool).await
    }

    async fn commit(&self, mut unit: UnitOfWork) -> Result<(), AppError> {
        unit.commit().await
    }

    async fn rollback(&self, mut unit: UnitOfWork) -> Result<(), AppError> {
        unit.rollback().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingProvider {
        commits: AtomicUsize,
        rollbacks: AtomicUsize,
        fail_rollback: bool,
    }

    #[async_trait]
    impl UnitOfWorkProvider for CountingProvider {
        type Unit = ();

        async fn begin(&self) -> Result<(), AppError> {
            Ok(())
        }

        async fn commit(&self, _unit: ()) -> Result<(), AppError> {
            self.commits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn rollback(&self, _unit: ()) -> Result<(), AppError> {
            self.rollbacks.fetch_add(1, Ordering::SeqCst);
            if self.fail_rollback {
                return Err(AppError::Internal("connection lost".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_finish_commits_on_success() {
        let provider = CountingProvider::default();
        let unit = provider.begin().await.unwrap();
        let value = provider.finish(unit, Ok::<_, AppError>(7)).await.unwrap();
        assert_eq!(value, 7);
        assert_eq!(provider.commits.load(Ordering::SeqCst), 1);
        assert_eq!(provider.rollbacks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_finish_rolls_back_on_error() {
        let provider = CountingProvider::default();
        let unit = provider.begin().await.unwrap();
        let err = provider
            .finish::<()>(unit, Err(AppError::NotFound("missing".to_string())))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(provider.commits.load(Ordering::SeqCst), 0);
        assert_eq!(provider.rollbacks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_finish_aggregates_rollback_failure() {
        let provider = CountingProvider {
            fail_rollback: true,
            ..Default::default()
        };
        let unit = provider.begin().await.unwrap();
        let err = provider
            .finish::<()>(unit, Err(AppError::BadRequest("broken".to_string())))
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("broken"));
        assert!(message.contains("connection lost"));
    }
}
