//! Ordered fallback ladder shared by the retrieval agents.
//!
//! Variants that can serve a query more than one way list their methods
//! as ordered tiers; [`first_success`] tries each in turn and stops at
//! the first that succeeds. This replaces per-variant nested
//! try/fallback ladders with one combinator, and keeps the record of
//! what failed so agents can surface it in their metadata.

use crate::error::Result;
use crate::types::Context;
use futures_util::future::BoxFuture;
use tracing::debug;

/// A lazily-evaluated tier: the future does not run unless the previous
/// tiers failed.
pub type TierFuture<'a> = BoxFuture<'a, Result<Vec<Context>>>;

/// The result of walking a tier ladder.
#[derive(Debug, Default)]
pub struct TierOutcome {
    /// The tier that served the request, when any succeeded.
    pub served_by: Option<&'static str>,
    /// Contexts from the serving tier; empty when every tier failed.
    pub contexts: Vec<Context>,
    /// `(tier, error)` pairs for the tiers that failed before one
    /// succeeded (or all of them).
    pub failures: Vec<(&'static str, String)>,
}

/// Try `tiers` in order and stop at the first success.
///
/// A tier that returns `Ok` ends the walk even when its context list is
/// empty — "no results" is an answer, not a failure. When every tier
/// fails the outcome carries no contexts and every failure is recorded.
pub async fn first_success(agent: &str, tiers: Vec<(&'static str, TierFuture<'_>)>) -> TierOutcome {
    let mut outcome = TierOutcome::default();

    for (tier, future) in tiers {
        match future.await {
            Ok(contexts) => {
                debug!(agent, tier, count = contexts.len(), "tier served request");
                outcome.served_by = Some(tier);
                outcome.contexts = contexts;
                return outcome;
            }
            Err(err) => {
                debug!(agent, tier, error = %err, "tier failed, trying next");
                outcome.failures.push((tier, err.to_string()));
            }
        }
    }

    outcome
}
