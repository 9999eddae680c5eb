//! Module for the seams between the pipeline core and its host

pub mod process_runner;
pub mod sinks;
