//! Domain types and pure logic for listing-reel generation.
//!
//! This crate has no I/O of its own beyond font loading: capability traits
//! describe the external services, and everything else (validation,
//! composition building, caption parsing and rendering) is deterministic.

pub mod capabilities;
pub mod captions;
pub mod composition;
pub mod error;
pub mod generation;
pub mod motion;
pub mod music;
pub mod polling;
pub mod property;
pub mod script;
pub mod settings;
pub mod types;
