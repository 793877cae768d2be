pub mod activity;
pub mod client;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod period;
pub mod queries;
pub mod retriever;
pub mod source;
pub mod ss58;

pub use activity::{NominatorEraActivity, validator_activity};
pub use client::*;
pub use config::*;
pub use error::*;
pub use fetcher::{ExposureFetcher, PeriodSnapshot};
pub use period::last_rewarded_period;
pub use retriever::{BatchEvent, BatchRetriever, RetrievalReport, RetrieverConfig, SkippedValidator};
pub use source::StakingSource;
pub use ss58::{decode_ss58, encode_ss58, validator_account, validator_id};
