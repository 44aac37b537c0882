//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `SessionStore` - per-user session and history persistence with TTL
//! - `StepInterpreter` - natural-language classification of step replies
//! - `BookingClient` - clinic booking system (CRM) operations
//! - `ClinicRulesProvider` - latest clinic rules document
//! - `ModeratorNotifier` - human follow-up channel

mod booking_client;
mod moderator_notifier;
mod rules_provider;
mod session_store;
mod step_interpreter;

pub use booking_client::{Appointment, BookingClient, CreateAppointment, CrmClient, Doctor};
pub use moderator_notifier::ModeratorNotifier;
pub use rules_provider::ClinicRulesProvider;
pub use session_store::SessionStore;
pub use step_interpreter::{InterpretRequest, Interpretation, StepInterpreter, StepIntent};
