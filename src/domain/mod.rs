//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (errors, state machine trait,
//!   phone/date/fuzzy algorithms)
//! - `scenes` - Conversational scene state machines (create, move, cancel,
//!   show, confirm) and the per-user session record
//! - `slots` - Slot availability engine and clinic rules types

pub mod foundation;
pub mod scenes;
pub mod slots;
