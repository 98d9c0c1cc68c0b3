//! bkjob: runs named backup jobs and mails the operator when one fails.
//!
//! This crate provides the configuration, copy, logging and alerting logic
//! behind the `bkjob` command-line tool.

pub mod alert;
pub mod application;
pub mod error;
pub mod executor;
pub mod job;
pub mod logger;
pub mod logging;
pub mod path;
pub mod runner;
