//! Module for the shared synchronization primitives of a download session

pub mod cancel;
pub mod dirty;
pub mod stall;

pub use cancel::CancelToken;
pub use dirty::DirtyFlag;
pub use stall::StallDetector;
