//! Query execution methods for `SelectQuery`.

use crate::executor::{LifeError, LifeExecutor};
use crate::model::Record;
use crate::query::select::SelectQuery;

impl SelectQuery {
    /// Execute the query and return all results
    ///
    /// Returned records carry this query's primary key column name.
    ///
    /// # Errors
    ///
    /// Propagates the executor's error unchanged.
    pub fn all<Ex: LifeExecutor + ?Sized>(&self, executor: &Ex) -> Result<Vec<Record>, LifeError> {
        let (sql, values) = self.build();
        let rows = executor.query_all(&sql, &values)?;
        Ok(rows
            .into_iter()
            .map(|row| row.with_primary_key(self.primary_key_name()))
            .collect())
    }

    /// Execute the query with `LIMIT 1` and return the first result, or `None`
    ///
    /// # Errors
    ///
    /// Propagates the executor's error unchanged.
    pub fn first<Ex: LifeExecutor + ?Sized>(&self, executor: &Ex) -> Result<Option<Record>, LifeError> {
        let rows = self.clone().limit(1).all(executor)?;
        Ok(rows.into_iter().next())
    }
}
