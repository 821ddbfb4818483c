mod as_value;
pub mod blocking;
mod column_type;
mod config;
mod connection;
mod database;
mod descriptor;
mod driver;
mod error;
mod executor;
mod expression;
mod filter;
mod index;
mod inference;
mod pool;
mod query;
mod read_only;
mod row;
mod schema;
mod session;
mod table;
mod transaction;
mod util;
mod value;
mod writer;

pub use as_value::*;
pub use column_type::*;
pub use config::*;
pub use connection::*;
pub use database::*;
pub use descriptor::*;
pub use driver::*;
pub use error::*;
pub use executor::*;
pub use expression::*;
pub use filter::*;
pub use index::*;
pub use inference::*;
pub use pool::*;
pub use query::*;
pub use read_only::*;
pub use row::*;
pub use schema::*;
pub use table::*;
pub use transaction::*;
pub use util::*;
pub use value::*;
pub use writer::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
