use crate::{Connection, Dialect, SqlWriter};

pub trait Driver: Send + Sync + Clone + 'static {
    type Connection: Connection<Driver = Self>;
    type SqlWriter: SqlWriter + 'static;

    const NAME: &'static str;

    fn dialect(&self) -> Dialect;
    fn sql_writer(&self) -> Self::SqlWriter;
}
