pub mod combine;
pub mod conditions;
pub mod config;
pub mod error;
pub mod fetch;
pub mod history;
pub mod pipeline;
pub mod prompt;
pub mod report;
pub mod types;
