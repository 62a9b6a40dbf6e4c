//! Shared building blocks for the Well Data Gateway services
//!
//! Holds everything both services agree on: the SRN grammar, the request
//! header contract, the upstream error taxonomy with its retry policy, and
//! configuration loading.

pub mod config;
pub mod error;
pub mod headers;
pub mod srn;
pub mod upstream;

pub use error::{Error, Result};
