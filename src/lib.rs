//! Clinic Dialog - Conversational Appointment Management
//!
//! This crate implements multi-turn appointment dialogues (create, move,
//! cancel, show, confirm) as finite-state scenes, together with the slot
//! availability engine that computes bookable times per doctor and date.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
