//! Request handler module
//!
//! Routes incoming HTTP requests to the probes or to the data source.

pub mod router;

// Re-export main entry point
pub use router::{
    handle_request, DISPATCH_METHODS, DISPATCH_PATH, LIVENESS_PATH, PROBE_METHODS, READINESS_PATH,
};
