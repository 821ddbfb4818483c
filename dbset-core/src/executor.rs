use crate::{
    Driver, Query, QueryResult, Result, RowLabeled, RowsAffected, TableDescriptor,
    stream::{Stream, StreamExt, TryStreamExt},
};
use std::future::Future;

pub trait Executor: Send + Sized {
    type Driver: Driver;

    fn driver(&self) -> &Self::Driver;

    /// General method to send any query and return any result type (either row or count)
    fn run(&mut self, query: Query) -> impl Stream<Item = Result<QueryResult>> + Send;

    /// Execute the query and returns the rows.
    fn fetch(&mut self, query: Query) -> impl Stream<Item = Result<RowLabeled>> + Send {
        self.run(query).filter_map(|v| async move {
            match v {
                Ok(QueryResult::Row(v)) => Some(Ok(v)),
                Err(e) => Some(Err(e)),
                _ => None,
            }
        })
    }

    /// Execute the query and return the total number of rows affected.
    fn execute(&mut self, query: Query) -> impl Future<Output = Result<RowsAffected>> + Send {
        self.run(query)
            .filter_map(|v| async move {
                match v {
                    Ok(QueryResult::Affected(v)) => Some(Ok(v)),
                    Err(e) => Some(Err(e)),
                    _ => None,
                }
            })
            .try_collect()
    }

    /// Read the live schema of `table` from the engine catalog, `None` when it does not exist.
    fn describe_table(
        &mut self,
        table: &str,
    ) -> impl Future<Output = Result<Option<TableDescriptor>>> + Send;

    /// Names of the user tables, sorted.
    fn table_names(&mut self) -> impl Future<Output = Result<Vec<String>>> + Send;
}
