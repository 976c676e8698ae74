//! The seam between similarity ranking and per-request constraints.

use crate::types::RetrievalContext;
use anyhow::Result;
use catalog::Candidate;

/// Removes candidates that do not fit one request's constraints.
///
/// Filters take ownership of the ranked candidates and must keep the
/// survivors in ranked order.
pub trait Filter: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        context: &RetrievalContext,
    ) -> Result<Vec<Candidate>>;
}
