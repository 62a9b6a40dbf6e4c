//! HTTP API for wdg-delivery

mod delivery;
mod health;

pub use delivery::deliver;
pub use health::health_check;
