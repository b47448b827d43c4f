//! linquiz-core — question banks, grading, sessions, and remediation.
//!
//! This crate holds everything the quiz needs except the HTTP client and
//! the terminal front end: the data model, answer normalization, the
//! session state machine, summaries, persistence, and the pipeline that
//! turns missed questions into generated study material.

pub mod error;
pub mod grading;
pub mod model;
pub mod parser;
pub mod remediation;
pub mod report;
pub mod results;
pub mod session;
pub mod summary;
pub mod traits;
