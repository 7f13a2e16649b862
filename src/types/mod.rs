pub mod config;
pub mod metrics;
pub mod report;
pub mod rules;
pub mod team;
