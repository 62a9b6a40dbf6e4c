//! HTTP API for wdg-ingest

mod health;
mod jobs;
mod submit;

pub use health::health_check;
pub use jobs::poll_jobs;
pub use submit::submit_file;
