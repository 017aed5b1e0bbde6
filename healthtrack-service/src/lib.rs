//! healthtrack-service: free-text symptom logging with LLM summaries.
pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod parsing;
pub mod services;
pub mod startup;
