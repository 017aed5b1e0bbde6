pub mod severity;
pub mod symptom_log;

pub use severity::Severity;
pub use symptom_log::{NewSymptomLog, SymptomLog};
