//! Module for the main pipeline functionality

pub mod download;
pub mod encode;
pub mod hwaccel;
pub mod options;
pub mod orchestrator;
pub mod probe;
