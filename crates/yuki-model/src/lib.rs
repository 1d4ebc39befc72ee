//! Data model shared by the yuki daemon crates.
//!
//! Everything here is plain data: containers as the runtime reports them, repository records as the
//! configuration store hands them out, per-call options and the lifecycle event payload.

mod domain;
pub use domain::*;

mod event;
pub use event::{EventKind, Payload};

mod error;
pub use error::ModelError;
