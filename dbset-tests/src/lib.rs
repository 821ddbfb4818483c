mod crud;
mod errors;
mod filters;
mod indexes;
mod primary_keys;
mod read_only;
mod transactions;
mod upsert;
mod values;
mod widening;

use crate::{
    crud::crud,
    errors::errors,
    filters::filters,
    indexes::indexes,
    primary_keys::primary_keys,
    read_only::read_only,
    upsert::upsert,
    values::values,
};
use dbset::{Config, Database, Driver, async_connect};
use log::LevelFilter;
use std::env;

#[cfg(not(feature = "disable-transactions"))]
use transactions::transactions;
#[cfg(not(feature = "disable-widening"))]
use widening::widening;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Run every behavioural scenario against the database at `url`.
///
/// The url must point to storage shared by every connection of the pool.
pub async fn execute_tests<D: Driver>(driver: D, url: &str) {
    let db = async_connect(driver.clone(), url, Config::default())
        .await
        .expect("Could not connect to the database");
    crud(&db).await;
    filters(&db).await;
    indexes(&db).await;
    upsert(&db).await;
    values(&db).await;
    errors(&db).await;
    #[cfg(not(feature = "disable-widening"))]
    widening(&db).await;
    #[cfg(not(feature = "disable-transactions"))]
    transactions(&db).await;
    primary_keys(driver.clone(), url).await;
    read_only(&db, driver, url).await;
    db.close().await;
}

/// Drop `table` when it exists, so that each scenario starts from scratch.
pub(crate) async fn fresh<D: Driver>(db: &Database<D>, table: &str) {
    if db
        .has_table(table)
        .await
        .expect("Failed to check whether the table exists")
    {
        db.drop_table(table)
            .await
            .expect("Failed to drop the table");
    }
}

/// Evaluate the block with logging turned off, for failures that are expected.
#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        let result = { $($code)+ };
        log::set_max_level(level);
        result
    }};
}
