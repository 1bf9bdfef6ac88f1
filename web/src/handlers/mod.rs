//! HTTP request handlers, one module per area.

pub mod auth;
pub mod booking;
pub mod health;
pub mod navigation;
pub mod profile;

pub use health::health_check;
