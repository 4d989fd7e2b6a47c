//! Persistence module split across logical submodules.

mod connection;
mod rows;

pub use connection::open_database;
pub use rows::{fetch_rows, query_rows};
