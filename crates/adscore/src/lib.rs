//! Advertising content effect scoring.
//!
//! [`taxonomy`] fixes which dimensions and tags each ad type offers,
//! [`sources`] loads the population preference and content expression tables,
//! and [`scoring`] turns a weighted tag selection into a final score with a
//! full derivation trace.

pub mod config;
pub mod error;
pub mod scoring;
pub mod sources;
pub mod taxonomy;
pub mod telemetry;
