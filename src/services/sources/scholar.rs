//! Google Scholar placeholder.
//!
//! Scholar exposes no public JSON API. The fetcher exists so callers can
//! list the source without special-casing it; it honors the contract by
//! returning an empty batch, never an error.

use async_trait::async_trait;

use super::{SearchFilters, SourceError, SourceFetcher};
use crate::models::reference::{CandidateReference, SourceKind};

pub struct ScholarFetcher;

#[async_trait]
impl SourceFetcher for ScholarFetcher {
    fn kind(&self) -> SourceKind {
        SourceKind::Scholar
    }

    async fn search(
        &self,
        _query: &str,
        _limit: usize,
        _filters: &SearchFilters,
    ) -> Result<Vec<CandidateReference>, SourceError> {
        Ok(Vec::new())
    }
}
