pub mod reference;

pub use reference::{CandidateReference, GatherOptions, ReferenceType, SourceKind};
