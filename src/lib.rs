pub mod batch;
pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod events;
pub mod exit;
pub mod gate;
pub mod metrics;
pub mod processors;
pub mod reporting;
pub mod transaction;
pub mod types;
pub mod utils;
