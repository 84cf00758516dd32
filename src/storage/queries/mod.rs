//! Database queries, one module per table.
//!
//! Each function takes the namespace explicitly and runs on the database's
//! blocking pool.

pub mod emails;
pub mod extras;
pub mod tables;
