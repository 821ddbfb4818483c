use crate::{SqliteConnection, SqliteSqlWriter};
use dbset_core::{Dialect, Driver};

#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDriver {}

impl SqliteDriver {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Driver for SqliteDriver {
    type Connection = SqliteConnection;
    type SqlWriter = SqliteSqlWriter;

    const NAME: &'static str = "sqlite";

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn sql_writer(&self) -> SqliteSqlWriter {
        SqliteSqlWriter {}
    }
}
