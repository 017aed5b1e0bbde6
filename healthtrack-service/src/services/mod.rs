pub mod database;
pub mod metrics;
pub mod providers;
pub mod retrieval;
pub mod summarizer;

pub use database::Database;
pub use summarizer::{Summarizer, Summary};
