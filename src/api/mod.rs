//! Data-access functions.
//!
//! One store request per call. Results come back in canonical form; store
//! errors pass through unchanged.

pub mod categories;
pub mod tasks;
