//! Shared domain primitives: errors, the step state-machine trait, and the
//! text-normalization algorithms every scene relies on.

pub mod datetime;
pub mod errors;
pub mod fuzzy;
pub mod phone;
pub mod state_machine;

pub use datetime::{validate_date, validate_time, MAX_MONTHS_AHEAD, WORK_TIME_END, WORK_TIME_START};
pub use errors::{DialogError, ErrorCode, ValidationError};
pub use fuzzy::{best_match, similarity};
pub use phone::normalize_phone;
pub use state_machine::StateMachine;
