//! Booking CRM adapter.

mod client;

pub use client::{HttpBookingClient, HttpBookingConfig};
