//! Prepare execution plans for a database driver, and fold the rows it returns back
//! into entities.

pub mod cursor;
pub mod error;
pub mod materializer;
pub mod metrics;
pub mod query;
