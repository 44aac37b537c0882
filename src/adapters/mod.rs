//! Adapters - concrete implementations of the ports.
//!
//! Each adapter talks to one external system (CRM, Redis, an LLM API, the
//! filesystem) and is swappable behind its port.

pub mod crm;
pub mod http;
pub mod interpreter;
pub mod notifier;
pub mod rules;
pub mod session;

pub use crm::{HttpBookingClient, HttpBookingConfig};
pub use http::{dialog_router, DialogAppState};
pub use interpreter::{OpenAiInterpreter, OpenAiInterpreterConfig};
pub use notifier::TracingModeratorNotifier;
pub use rules::FileRulesProvider;
pub use session::{InMemorySessionStore, RedisSessionStore};
