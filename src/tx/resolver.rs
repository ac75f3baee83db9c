use async_trait::async_trait;
use futures::future::join_all;

use crate::error::{DexError, DexResult};
use crate::utils::constants::{BIPS_BASE, DEFAULT_GAS_MARGIN_BPS};

/// A contract call identified by method name and rendered arguments
pub trait MethodCall: Send + Sync {
    /// Contract method, e.g. `removeLiquidityETH`
    fn method_name(&self) -> &str;

    /// Arguments in call order, as exact decimal (or hex) strings
    fn args(&self) -> Vec<String>;
}

/// Estimates the gas a call would use, or says why it would fail
#[async_trait]
pub trait GasEstimator<C: Sync>: Send + Sync {
    /// Gas units `call` would consume
    async fn estimate_gas(&self, call: &C) -> eyre::Result<u64>;
}

/// Outcome of estimating one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasEstimateAttempt {
    /// Method of the candidate
    pub method: String,
    /// Its arguments
    pub args: Vec<String>,
    /// Estimated gas, or the failure reason
    pub outcome: Result<u64, String>,
}

/// The candidate picked for submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCall<C> {
    /// The call
    pub call: C,
    /// Raw estimate
    pub estimated: u64,
    /// Estimate plus the safety margin
    pub gas_limit: u64,
}

/// Picks the first candidate that estimates successfully
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodResolver {
    /// Margin added to the estimate, in basis points
    margin_bps: u64,
}

impl Default for MethodResolver {
    fn default() -> Self {
        Self::new(DEFAULT_GAS_MARGIN_BPS)
    }
}

impl MethodResolver {
    /// Creates a resolver adding `margin_bps` on top of each estimate
    #[must_use]
    pub const fn new(margin_bps: u64) -> Self {
        Self { margin_bps }
    }

    /// `floor(estimate * (10000 + margin) / 10000)`
    ///
    /// # Errors
    ///
    /// `Overflow` if the limit does not fit 64 bits
    pub fn gas_limit(&self, estimate: u64) -> DexResult<u64> {
        let scaled = u128::from(estimate) * u128::from(BIPS_BASE + self.margin_bps) / u128::from(BIPS_BASE);
        u64::try_from(scaled).map_err(|_| DexError::Overflow)
    }

    /// Estimate every candidate at once and wait for all of them
    pub async fn probe<C, E>(&self, estimator: &E, candidates: &[C]) -> Vec<GasEstimateAttempt>
    where
        C: MethodCall,
        E: GasEstimator<C> + ?Sized,
    {
        let estimates = join_all(candidates.iter().map(|call| estimator.estimate_gas(call))).await;

        candidates
            .iter()
            .zip(estimates)
            .map(|(call, estimate)| {
                let outcome = estimate.map_err(|e| e.to_string());
                if let Err(reason) = &outcome {
                    log::warn!(
                        "tx::resolver: estimate of {} ({}) failed: {reason}",
                        call.method_name(),
                        call.args().join(", ")
                    );
                }
                GasEstimateAttempt {
                    method: call.method_name().to_string(),
                    args: call.args(),
                    outcome,
                }
            })
            .collect()
    }

    /// Resolve the candidates to the first one in list order that estimates.
    ///
    /// A later candidate finishing first does not win.
    ///
    /// # Errors
    ///
    /// * `MissingDependency` for an empty candidate list
    /// * `AllEstimatesFailed` with every method and reason when nothing estimates
    /// * `Overflow` if the margin pushes the limit past 64 bits
    pub async fn resolve<C, E>(&self, estimator: &E, candidates: Vec<C>) -> DexResult<ResolvedCall<C>>
    where
        C: MethodCall,
        E: GasEstimator<C> + ?Sized,
    {
        if candidates.is_empty() {
            return Err(DexError::MissingDependency("candidate calls"));
        }
        let attempts = self.probe(estimator, &candidates).await;

        let winner = attempts
            .iter()
            .position(|attempt| attempt.outcome.is_ok());
        let Some(index) = winner else {
            return Err(DexError::AllEstimatesFailed {
                failures: attempts
                    .into_iter()
                    .map(|attempt| (attempt.method, attempt.outcome.err().unwrap_or_default()))
                    .collect(),
            });
        };

        let estimated = attempts[index].outcome.clone().unwrap_or_default();
        let gas_limit = self.gas_limit(estimated)?;
        let call = candidates
            .into_iter()
            .nth(index)
            .ok_or(DexError::MissingDependency("candidate calls"))?;
        log::info!(
            "tx::resolver: using {} with gas limit {gas_limit} (estimated {estimated})",
            call.method_name()
        );

        Ok(ResolvedCall {
            call,
            estimated,
            gas_limit,
        })
    }
}
