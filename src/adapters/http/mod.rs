//! HTTP adapter - REST surface for the dialog engine.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::DialogAppState;
pub use routes::dialog_router;
