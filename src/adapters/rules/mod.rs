//! Clinic rules adapters.

mod file;

pub use file::FileRulesProvider;
