//! Validator yield ranking - fetches one era's staking data and ranks validators by APY.

mod report;

use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use valyield_chain::{
    BatchEvent, BatchRetriever, RetrievalReport, RetrieverConfig, RetryPolicy, Session,
    StakingSource, endpoints_for, last_rewarded_period, validator_activity, validator_id,
};
use valyield_core::config::load_config_from;
use valyield_core::{ConnectionStatus, EraIndex, Network, RunConfig, ValidatorId, ValidatorMetrics, merge_ranked};

/// Eras scanned in nominator mode when `--from` is not given.
const DEFAULT_ACTIVITY_ERAS: u32 = 10;

/// Rank validators by annualized yield for a single era.
#[derive(Parser, Debug)]
#[command(name = "valyield")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Network to query (polkadot, kusama, westend, paseo)
    #[arg(short, long)]
    network: Option<Network>,

    /// Custom RPC endpoint URL (ws:// or wss://)
    #[arg(long)]
    endpoint: Option<String>,

    /// Era to analyze instead of the last rewarded one
    #[arg(long)]
    era: Option<EraIndex>,

    /// Number of validators fetched concurrently
    #[arg(long)]
    batch_size: Option<usize>,

    /// Number of validators to show (0 shows all)
    #[arg(long)]
    top: Option<usize>,

    /// Maximum eras to walk back looking for rewards
    #[arg(long)]
    lookback: Option<u32>,

    /// Extra fetch attempts per validator before it is skipped
    #[arg(long)]
    retries: Option<u32>,

    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validators to rank instead of the active set (comma separated)
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    validators: Vec<String>,

    /// Show which of this nominator's targets were active, era by era
    #[arg(long, conflicts_with = "validators")]
    nominator: Option<String>,

    /// First era of the nominator scan
    #[arg(long, requires = "nominator")]
    from: Option<EraIndex>,

    /// Last era of the nominator scan
    #[arg(long, requires = "nominator")]
    to: Option<EraIndex>,
}

impl Args {
    /// Apply command line overrides on top of file configuration.
    fn apply(&self, config: &mut RunConfig) {
        if let Some(network) = self.network {
            config.network = network;
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = Some(endpoint.clone());
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(top) = self.top {
            config.top_n = (top > 0).then_some(top);
        }
        if let Some(lookback) = self.lookback {
            config.max_lookback = Some(lookback);
        }
        if let Some(retries) = self.retries {
            config.fetch_retries = retries;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    color_eyre::install()?;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("valyield_cli=info".parse()?)
        .add_directive("valyield_chain=info".parse()?)
        .add_directive("valyield_core=info".parse()?);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = load_run_config(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    let network = config.network;
    let endpoints = endpoints_for(network, config.endpoint.as_deref());
    let policy = RetryPolicy::from_config(&config);

    let (status_tx, mut status_rx) = mpsc::channel::<ConnectionStatus>(16);
    tokio::spawn(async move {
        while let Some(status) = status_rx.recv().await {
            match status {
                ConnectionStatus::Connecting { attempt } => {
                    tracing::debug!("Connection attempt {}", attempt)
                }
                ConnectionStatus::Retrying { attempt, delay_ms } => {
                    tracing::info!("Retrying connection (attempt {}) in {}ms", attempt, delay_ms)
                }
                ConnectionStatus::Connected => tracing::debug!("Connected"),
                ConnectionStatus::Error(e) => tracing::warn!("Connection error: {}", e),
                ConnectionStatus::Disconnected => tracing::warn!("Disconnected from node"),
            }
        }
    });

    println!("Connecting to {}...", network);
    let session = Session::connect(network, &endpoints, &policy, status_tx).await?;
    let (block, _) = session.get_latest_block().await?;
    println!("Connected via {} at block #{}", session.endpoint(), block);

    match &args.nominator {
        Some(nominator) => run_activity(&session, &config, nominator, args.from, args.to).await,
        None => run_ranking(&session, &config, args.era, &args.validators).await,
    }
}

fn load_run_config(path: Option<&Path>) -> Result<RunConfig> {
    let config = match path {
        Some(path) => load_config_from(path)
            .map_err(|e| eyre!("Failed to load config from {}: {}", path.display(), e))?,
        None => valyield_core::config::load_config().unwrap_or_else(|e| {
            tracing::warn!("Could not load config, using defaults: {}", e);
            RunConfig::default()
        }),
    };
    Ok(config)
}

/// Walk-back bound for the period selector. Falls back to the chain's history depth.
fn lookback(session: &Session, config: &RunConfig) -> Option<u32> {
    config.max_lookback.or_else(|| match session.get_history_depth() {
        Ok(depth) => Some(depth),
        Err(e) => {
            tracing::debug!("History depth unavailable: {}", e);
            None
        }
    })
}

/// Rank one era's validators, printing progress as batches arrive.
async fn run_ranking(
    session: &Session,
    config: &RunConfig,
    era: Option<EraIndex>,
    validators: &[String],
) -> Result<()> {
    let era = match era {
        Some(era) => era,
        None => last_rewarded_period(session, lookback(session, config)).await?,
    };

    let validator_ids: Vec<ValidatorId> = if validators.is_empty() {
        let prefix = session.ss58_prefix();
        session
            .active_validators()
            .await?
            .iter()
            .map(|account| validator_id(account, prefix))
            .collect()
    } else {
        validators.iter().map(|v| ValidatorId::new(v.trim())).collect()
    };

    if validator_ids.is_empty() {
        return Err(eyre!("No validators to rank for era {}", era));
    }
    println!("Ranking {} validators for era {}", validator_ids.len(), era);

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, finishing the current batch");
            ctrl_c.cancel();
        }
    });

    let retriever = BatchRetriever::new(session, RetrieverConfig::from_config(config));
    let (tx, rx) = mpsc::channel::<BatchEvent>(config.progress_buffer);

    let run = async {
        let report = retriever.retrieve(era, &validator_ids, Some(&tx), &cancel).await;
        drop(tx);
        report
    };
    let (report, ranked) = tokio::join!(run, consume(rx, config.top_n));
    let report: RetrievalReport = report?;

    println!();
    report::print_ranking(&ranked, session.network());
    report::print_summary(&report, &ranked);
    Ok(())
}

/// Fold batches into a running ranking, reporting progress on each one.
async fn consume(mut rx: mpsc::Receiver<BatchEvent>, top_n: Option<usize>) -> Vec<ValidatorMetrics> {
    let mut ranked = Vec::new();
    while let Some(event) = rx.recv().await {
        ranked = merge_ranked(ranked, &event.metrics, top_n);
        let leader = ranked
            .first()
            .map(|m| format!(", leader {} at {}", m.validator_id, m.apy))
            .unwrap_or_default();
        println!(
            "  Batch {}/{}: {} validators{}",
            event.batch_index + 1,
            event.total_batches,
            event.metrics.len(),
            leader
        );
    }
    ranked
}

/// Show whether a nominator's targets were backed in each era of a range.
async fn run_activity(
    session: &Session,
    config: &RunConfig,
    nominator: &str,
    from: Option<EraIndex>,
    to: Option<EraIndex>,
) -> Result<()> {
    let end = match to {
        Some(era) => era,
        None => last_rewarded_period(session, lookback(session, config)).await?,
    };
    let start = from.unwrap_or_else(|| end.saturating_sub(DEFAULT_ACTIVITY_ERAS - 1));

    let nominator = ValidatorId::new(nominator.trim());
    println!("Checking targets of {} for eras {}..={}", nominator, start, end);

    let activity = validator_activity(session, &nominator, start, end).await?;

    if activity.is_empty() {
        println!("{} has no nomination targets", nominator);
    } else {
        report::print_activity(&activity);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "valyield",
            "--network",
            "ksm",
            "--batch-size",
            "8",
            "--top",
            "0",
            "--lookback",
            "3",
            "--retries",
            "2",
        ])
        .unwrap();

        let mut config = RunConfig::default();
        args.apply(&mut config);
        assert_eq!(config.network, Network::Kusama);
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.top_n, None);
        assert_eq!(config.max_lookback, Some(3));
        assert_eq!(config.fetch_retries, 2);
        assert_eq!(config.endpoint, None);
    }

    #[test]
    fn test_unset_flags_keep_config() {
        let args = Args::try_parse_from(["valyield"]).unwrap();
        let mut config = RunConfig {
            batch_size: 4,
            top_n: Some(5),
            ..Default::default()
        };
        args.apply(&mut config);
        assert_eq!(config.batch_size, 4);
        assert_eq!(config.top_n, Some(5));
    }

    #[test]
    fn test_validator_list_is_comma_separated() {
        let args = Args::try_parse_from(["valyield", "--validators", "a,b", "c"]).unwrap();
        assert_eq!(args.validators, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_scan_range_requires_nominator() {
        assert!(Args::try_parse_from(["valyield", "--from", "10"]).is_err());
        assert!(Args::try_parse_from(["valyield", "--nominator", "x", "--validators", "a"]).is_err());
    }
}
