//! Scripted executor for exercising queries and relations without a database.

use crate::executor::{LifeError, LifeExecutor};
use crate::model::Record;
use sea_query::{Value, Values};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A query seen by [`MockExecutor`]
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedQuery {
    pub sql: String,
    pub values: Vec<Value>,
}

/// `LifeExecutor` that replays queued responses in order and records every query.
///
/// When the queue is empty, queries return no rows.
///
/// ```
/// use belongs_to_dynamic::test_helpers::MockExecutor;
/// use belongs_to_dynamic::{Record, SelectQuery};
///
/// let executor = MockExecutor::new();
/// executor.push_rows(vec![Record::new().with_attribute("id", 1)]);
///
/// let rows = SelectQuery::new("authors").all(&executor).unwrap();
/// assert_eq!(rows.len(), 1);
/// assert_eq!(executor.query_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockExecutor {
    responses: Mutex<VecDeque<Result<Vec<Record>, LifeError>>>,
    captured: Mutex<Vec<CapturedQuery>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the rows returned by the next unanswered query
    pub fn push_rows(&self, rows: Vec<Record>) {
        self.lock_responses().push_back(Ok(rows));
    }

    /// Queue an error for the next unanswered query
    pub fn push_error(&self, error: LifeError) {
        self.lock_responses().push_back(Err(error));
    }

    /// Every query executed so far
    pub fn captured(&self) -> Vec<CapturedQuery> {
        self.lock_captured().clone()
    }

    /// SQL of every query executed so far
    pub fn captured_sql(&self) -> Vec<String> {
        self.lock_captured().iter().map(|q| q.sql.clone()).collect()
    }

    pub fn query_count(&self) -> usize {
        self.lock_captured().len()
    }

    pub fn clear(&self) {
        self.lock_captured().clear();
        self.lock_responses().clear();
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<Vec<Record>, LifeError>>> {
        self.responses.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_captured(&self) -> std::sync::MutexGuard<'_, Vec<CapturedQuery>> {
        self.captured.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LifeExecutor for MockExecutor {
    fn query_all(&self, query: &str, values: &Values) -> Result<Vec<Record>, LifeError> {
        self.lock_captured().push(CapturedQuery {
            sql: query.to_string(),
            values: values.0.clone(),
        });
        self.lock_responses().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}
