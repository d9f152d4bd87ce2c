//! lastpatch library
//!
//! Job lifecycle client for Satellite remote execution: launch or resume an
//! `rpm -qa --last` job, wait for it, harvest per-host output and write a
//! CSV report.

pub mod app;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod jobs;
pub mod logs;
pub mod models;
pub mod report;
pub mod settings;
pub mod utils;
