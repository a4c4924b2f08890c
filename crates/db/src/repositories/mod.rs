//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` (or an open transaction) as the first argument.

pub mod admission_repo;
pub mod credit_repo;
pub mod generation_detail_repo;
pub mod generation_task_repo;
pub mod music_repo;
pub mod owner_settings_repo;
pub mod video_repo;

pub use admission_repo::{AdmissionOutcome, AdmissionRepo};
pub use credit_repo::CreditRepo;
pub use generation_detail_repo::GenerationDetailRepo;
pub use generation_task_repo::GenerationTaskRepo;
pub use music_repo::MusicRepo;
pub use owner_settings_repo::OwnerSettingsRepo;
pub use video_repo::VideoRepo;
