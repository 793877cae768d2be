//! Batched, progressive retrieval of validator metrics for one era.
//!
//! Validators are processed in consecutive batches. Fetches inside a batch
//! run concurrently; batches run strictly one after another, so at most
//! `batch_size` requests are in flight. Each settled batch is sent to the
//! progress channel in input order before the next one starts.

use std::time::Duration;

use crate::error::{ChainError, FetchError, RetrievalError};
use crate::fetcher::{ExposureFetcher, PeriodSnapshot};
use crate::source::StakingSource;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use valyield_core::{EraIndex, RawFacts, RewardCalculator, RunConfig, ValidatorId, ValidatorMetrics};

/// Tuning for a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrieverConfig {
    pub batch_size: usize,
    /// Extra attempts per validator before it is skipped.
    pub fetch_retries: u32,
    pub fetch_timeout: Duration,
    pub calculator: RewardCalculator,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            batch_size: 16,
            fetch_retries: 1,
            fetch_timeout: Duration::from_secs(30),
            calculator: RewardCalculator::default(),
        }
    }
}

impl RetrieverConfig {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            fetch_retries: config.fetch_retries,
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            calculator: RewardCalculator::new(config.annualization),
        }
    }
}

/// One delivered batch of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEvent {
    pub batch_index: usize,
    pub total_batches: usize,
    pub metrics: Vec<ValidatorMetrics>,
}

/// A validator left out of the results, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedValidator {
    pub validator_id: ValidatorId,
    pub reason: String,
}

impl From<FetchError> for SkippedValidator {
    fn from(err: FetchError) -> Self {
        Self {
            reason: err.cause.to_string(),
            validator_id: err.validator_id,
        }
    }
}

/// Everything a run produced, in batch order then input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievalReport {
    pub era: EraIndex,
    pub metrics: Vec<ValidatorMetrics>,
    pub skipped: Vec<SkippedValidator>,
    pub batches_delivered: usize,
    pub cancelled: bool,
}

impl RetrievalReport {
    pub fn skipped_ids(&self) -> Vec<&ValidatorId> {
        self.skipped.iter().map(|s| &s.validator_id).collect()
    }
}

/// Drives the fetcher over a validator list in bounded batches.
pub struct BatchRetriever<'a, S: ?Sized> {
    source: &'a S,
    config: RetrieverConfig,
}

impl<'a, S: StakingSource + ?Sized> BatchRetriever<'a, S> {
    pub fn new(source: &'a S, config: RetrieverConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Fetch and compute metrics for `validator_ids` in `era`.
    ///
    /// Each completed batch is sent on `sink` when one is given. The run stops
    /// before the next batch once `cancel` fires or the sink's receiver is
    /// dropped; a batch settled after cancellation is not delivered.
    pub async fn retrieve(
        &self,
        era: EraIndex,
        validator_ids: &[ValidatorId],
        sink: Option<&mpsc::Sender<BatchEvent>>,
        cancel: &CancellationToken,
    ) -> Result<RetrievalReport, RetrievalError> {
        if self.config.batch_size == 0 {
            return Err(RetrievalError::InvalidArgument(
                "batch size must be at least 1".into(),
            ));
        }

        let mut report = RetrievalReport {
            era,
            ..Default::default()
        };
        if validator_ids.is_empty() {
            return Ok(report);
        }

        // Era-wide data is loaded once; if that fails each validator fetches its own copy.
        let snapshot = match tokio::time::timeout(
            self.config.fetch_timeout,
            PeriodSnapshot::load(self.source, era),
        )
        .await
        .map_err(|_| ChainError::Timeout(self.config.fetch_timeout))
        .and_then(|r| r)
        {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!("Could not preload era {} reward data: {}", era, e);
                None
            }
        };

        let fetcher = ExposureFetcher::new(self.source).with_timeout(self.config.fetch_timeout);
        let total_batches = validator_ids.len().div_ceil(self.config.batch_size);

        for (batch_index, chunk) in validator_ids.chunks(self.config.batch_size).enumerate() {
            if cancel.is_cancelled() {
                tracing::info!("Retrieval cancelled before batch {}/{}", batch_index + 1, total_batches);
                report.cancelled = true;
                break;
            }

            tracing::info!(
                "Fetching era {} batch {}/{} ({} validators)...",
                era,
                batch_index + 1,
                total_batches,
                chunk.len()
            );

            let futures: Vec<_> = chunk
                .iter()
                .map(|id| self.fetch_with_retry(&fetcher, era, snapshot.as_ref(), id))
                .collect();

            // join_all yields results in input order regardless of completion order
            let results = futures::future::join_all(futures).await;

            let mut batch_metrics = Vec::with_capacity(chunk.len());
            let mut batch_skipped = Vec::new();
            for result in results {
                match result {
                    Ok(facts) => batch_metrics.push(self.config.calculator.compute(&facts)),
                    Err(e) => {
                        tracing::warn!("Skipping {}: {}", e.validator_id, e.cause);
                        batch_skipped.push(SkippedValidator::from(e));
                    }
                }
            }

            if cancel.is_cancelled() {
                tracing::info!("Retrieval cancelled, dropping batch {}/{}", batch_index + 1, total_batches);
                report.cancelled = true;
                break;
            }

            tracing::debug!(
                "Batch {}: {} computed, {} skipped",
                batch_index + 1,
                batch_metrics.len(),
                batch_skipped.len()
            );

            report.metrics.extend(batch_metrics.iter().cloned());
            report.skipped.extend(batch_skipped);
            report.batches_delivered += 1;

            if let Some(sink) = sink {
                let event = BatchEvent {
                    batch_index,
                    total_batches,
                    metrics: batch_metrics,
                };
                if sink.send(event).await.is_err() {
                    tracing::info!("Progress receiver closed, stopping after batch {}", batch_index + 1);
                    report.cancelled = batch_index + 1 < total_batches;
                    break;
                }
            }
        }

        tracing::info!(
            "Era {}: {} validators computed, {} skipped",
            era,
            report.metrics.len(),
            report.skipped.len()
        );

        Ok(report)
    }

    /// Run without progress delivery or cancellation.
    pub async fn retrieve_all(
        &self,
        era: EraIndex,
        validator_ids: &[ValidatorId],
    ) -> Result<RetrievalReport, RetrievalError> {
        self.retrieve(era, validator_ids, None, &CancellationToken::new())
            .await
    }

    async fn fetch_with_retry(
        &self,
        fetcher: &ExposureFetcher<'a, S>,
        era: EraIndex,
        snapshot: Option<&PeriodSnapshot>,
        validator_id: &ValidatorId,
    ) -> Result<RawFacts, FetchError> {
        let mut attempt = 0;
        loop {
            let result = match snapshot {
                Some(snapshot) => fetcher.fetch_in(snapshot, validator_id).await,
                None => fetcher.fetch(era, validator_id).await,
            };
            match result {
                Ok(facts) => return Ok(facts),
                Err(e) if e.is_invalid_argument() || attempt >= self.config.fetch_retries => {
                    return Err(e);
                }
                Err(e) => {
                    attempt += 1;
                    tracing::debug!("Retrying {} (attempt {}): {}", validator_id, attempt + 1, e.cause);
                }
            }
        }
    }
}
