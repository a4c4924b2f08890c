//! Asynchronous video generation: admission, the staged pipeline, and the
//! background loops that drive it.
//!
//! A run goes clips → audio → assembly → captions. Each stage talks to the
//! outside world only through the capability traits in
//! `reel_core::capabilities`, bundled here as [`Capabilities`].

pub mod admission;
pub mod capabilities;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod orchestrator;
pub mod request;
pub mod stages;
pub mod store;
pub mod watchdog;

pub use capabilities::Capabilities;
pub use config::PipelineConfig;
pub use error::{PipelineError, Stage};
pub use orchestrator::{Orchestrator, RunOutcome};
pub use store::{MemoryStatusStore, MusicCatalog, PgStatusStore, StatusStore, StoreError};
