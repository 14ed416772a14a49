pub mod config;
pub mod models;
pub mod orchestration;
pub mod services;

// Re-export commonly used types for convenience.
pub use config::GatherSettings;
pub use models::reference::{CandidateReference, GatherOptions, ReferenceType, SourceKind};
pub use orchestration::ReferenceGatherer;
