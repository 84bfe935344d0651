//! API endpoint handlers.
//!
//! Handlers stay thin: parse the request, call into `records`,
//! `analytics` or `CoreState`, shape the JSON response.

pub mod analytics;
pub mod appointments;
pub mod auth;
pub mod health;
pub mod patients;
