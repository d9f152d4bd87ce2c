//! Satellite remote execution API models
//!
//! Serde representations of the JSON payloads exchanged with the Satellite
//! (Foreman) REST API. This crate performs no I/O.

pub mod models;
