//! Promotion along the strategy's forward edges.

use super::merge::{HistorySanitizer, MergeOp, MergeOutcome};
use super::rules::MergeMode;
use crate::error::{RepokitError, Result};
use crate::strategy::Edge;
use tracing::{info, warn};

/// A cascade step that went through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedStep {
    pub op: MergeOp,
    pub outcome: MergeOutcome,
}

/// The step that stopped a cascade.
#[derive(Debug)]
pub struct FailedStep {
    pub edge: Edge,
    pub error: RepokitError,
}

/// Result of promoting the private branch up to a target.
#[derive(Debug)]
pub struct CascadeReport {
    pub target: String,
    pub path: Vec<Edge>,
    pub applied: Vec<AppliedStep>,
    pub failed: Option<FailedStep>,
}

impl CascadeReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }

    /// The error of the failed step, if any.
    pub fn into_result(self) -> Result<Vec<AppliedStep>> {
        match self.failed {
            Some(failed) => Err(failed.error),
            None => Ok(self.applied),
        }
    }
}

impl HistorySanitizer<'_> {
    /// Promote the private branch to `target`, one merge per forward edge.
    ///
    /// `fallback` is used only for steps the rules classify as interactive.
    /// The first failing step stops the cascade; the steps before it stay
    /// applied and are listed in the report.
    pub fn cascade(&self, target: &str, fallback: Option<MergeMode>) -> Result<CascadeReport> {
        let path = self.guard().graph().promotion_path(target)?;
        let mut report = CascadeReport {
            target: target.to_string(),
            path: path.clone(),
            applied: Vec::new(),
            failed: None,
        };

        for edge in path {
            let step = self.rules().resolve(&edge.from, None).or_else(|err| match fallback {
                Some(mode) if mode != MergeMode::Interactive => Ok(mode),
                _ => Err(err),
            });
            let result = step
                .and_then(|mode| self.plan_with_mode(&edge.from, &edge.to, mode))
                .and_then(|op| self.apply(&op).map(|outcome| AppliedStep { op, outcome }));

            match result {
                Ok(applied) => {
                    info!(step = %edge, "{}", applied.outcome.describe());
                    report.applied.push(applied);
                }
                Err(error) => {
                    warn!(step = %edge, %error, "cascade stopped");
                    report.failed = Some(FailedStep { edge, error });
                    break;
                }
            }
        }

        Ok(report)
    }
}
