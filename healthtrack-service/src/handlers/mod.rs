pub mod health;
pub mod logs;
pub mod metrics;
pub mod summary;
pub mod ui;

pub use health::{health_check, readiness_check};
pub use logs::{create_log, get_entry, list_entries};
pub use metrics::metrics_handler;
pub use summary::get_summary;
pub use ui::ui_page;
