//! Destination database management.

pub mod migration;

pub use migration::{MIGRATOR, run_migrations};
