use std::sync::Arc;

use crate::error::EngineError;
use crate::logger::QueryLogger;
use crate::pool::PooledSession;
use crate::results::ResultSet;
use crate::sql::Statement;

use super::{traced_dml, traced_select};

/// A transaction pinned to one pooled connection.
///
/// Ends through [`Tx::finish`]. A `Tx` dropped before that (its task was cancelled) rolls back
/// in the background so the connection goes back to the pool clean.
pub(crate) struct Tx {
    session: Option<PooledSession>,
    logger: Arc<dyn QueryLogger>,
}

impl Tx {
    pub(crate) async fn begin(
        session: PooledSession,
        logger: Arc<dyn QueryLogger>,
    ) -> Result<Self, EngineError> {
        session.begin().await?;
        Ok(Self {
            session: Some(session),
            logger,
        })
    }

    fn session(&self) -> Result<&PooledSession, EngineError> {
        self.session
            .as_ref()
            .ok_or_else(|| EngineError::ExecutionError("transaction already finished".into()))
    }

    pub(crate) async fn select(&self, stmt: &Statement) -> Result<ResultSet, EngineError> {
        traced_select(&*self.logger, self.session()?, stmt).await
    }

    pub(crate) async fn dml(&self, stmt: &Statement) -> Result<u64, EngineError> {
        traced_dml(&*self.logger, self.session()?, stmt).await
    }

    /// Commit on `Ok`, roll back on `Err`.
    ///
    /// The caller always gets the first error: the statement error if there was one,
    /// otherwise the commit error. Rollback failures only go to the logger.
    pub(crate) async fn finish<T>(
        mut self,
        outcome: Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let Some(session) = self.session.take() else {
            return Err(EngineError::ExecutionError(
                "transaction already finished".into(),
            ));
        };
        match outcome {
            Ok(value) => match session.commit().await {
                Ok(()) => Ok(value),
                Err(commit_err) => {
                    self.logger.error(&format!("commit failed: {commit_err}"));
                    rollback(&session, &*self.logger).await;
                    Err(commit_err)
                }
            },
            Err(err) => {
                rollback(&session, &*self.logger).await;
                Err(err)
            }
        }
    }
}

async fn rollback(session: &PooledSession, logger: &dyn QueryLogger) {
    match session.rollback().await {
        Ok(()) => logger.warn("transaction rolled back"),
        Err(e) => logger.error(&format!("rollback failed, connection discarded: {e}")),
    }
}

impl Drop for Tx {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let logger = Arc::clone(&self.logger);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { rollback(&session, &*logger).await });
            }
            Err(_) => logger.error("transaction dropped outside a runtime; not rolled back"),
        }
    }
}
