pub mod api;
pub mod chart;
pub mod config;
pub mod core;
pub mod error;
