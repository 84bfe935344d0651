//! Appointment analytics: per-day appointment counts over a date window.
//!
//! The engine builds a gap-free window of calendar dates starting at a
//! caller-supplied "today", asks a [`CountSource`] for the counts inside it,
//! zero-fills missing days, and labels each day for display. A failing
//! source never surfaces as an error: the caller gets a fixed seven-day
//! all-zero result flagged `is_fallback`.
//!
//! Chart formatting and rendering sit on top of the engine output and
//! know nothing about where the counts came from.

mod chart;
mod engine;
mod labels;
mod render;
mod source;
mod types;

pub use chart::*;
pub use engine::*;
pub use labels::*;
pub use render::*;
pub use source::*;
pub use types::*;
