//! SQLite storage layer.
//!
//! Every thread is its own database file holding a single `messages` table.
//! Users and thread ownership live in one shared database with split
//! read/write connection pools.

pub mod ownership;
pub mod pool;
pub mod schema;
pub mod thread;
pub mod unit_factory;
