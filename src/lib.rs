//! Dict-style CRUD over SQL engines.
//!
//! Rows are ordered maps from column name to [`Value`]. Writing a row to a
//! [`Table`] creates the table, adds the missing columns and widens the ones
//! too narrow for the new values. Engines plug in through a [`Driver`], see
//! the `dbset-sqlite` crate.
pub use dbset_core::*;
