pub mod config;
pub mod cursor;
pub mod decoder;
pub mod format;
pub mod manager;
pub mod model;
pub mod parser;
pub mod query;
pub mod schema;
pub mod server;
pub mod source;
pub mod store;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::decoder::{decode_batch, DecodeFailure};
use crate::model::{Address, HistoricalRecord, CATEGORIES};
use crate::query::QueryRequest;
use crate::source::{AccountSource, SourceError};
use crate::store::{RecordStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("fetching accounts failed: {0}")]
    Source(#[from] SourceError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub fetched: usize,
    pub decoded: usize,
    pub foreign: usize,
    pub failures: Vec<DecodeFailure>,
}

pub struct Archive<S> {
    source: S,
    program: Address,
    store: RecordStore,
    last_report: RwLock<Option<LoadReport>>,
    // one reload at a time, from fetch to swap
    reload_gate: Mutex<()>,
}

impl<S> fmt::Debug for Archive<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("program", &self.program)
            .field("record_count", &self.store.len())
            .finish()
    }
}

impl<S: AccountSource> Archive<S> {
    pub fn new(source: S, program: Address) -> Self {
        Self {
            source,
            program,
            store: RecordStore::new(),
            last_report: RwLock::new(None),
            reload_gate: Mutex::new(()),
        }
    }

    pub fn program(&self) -> &Address {
        &self.program
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Fetch all accounts, decode them and swap the result in.
    /// A failed fetch or a duplicate address leaves the current set in place.
    /// Individual undecodable accounts are reported, not returned as errors.
    /// Concurrent reloads run one after another, in call order.
    pub async fn reload(&self) -> Result<LoadReport, ArchiveError> {
        let _gate = self.reload_gate.lock().await;
        let accounts = self.source.fetch_raw_accounts(&self.program).await?;
        let batch = decode_batch(&accounts);
        let report = LoadReport {
            fetched: accounts.len(),
            decoded: batch.records.len(),
            foreign: batch.foreign,
            failures: batch.failures,
        };
        {
            // the report lock spans the swap so /report always describes the held set
            let mut last = self.last_report.write().unwrap_or_else(PoisonError::into_inner);
            self.store.replace_all(batch.records)?;
            *last = Some(report.clone());
        }

        info!(
            program = %self.program,
            fetched = report.fetched,
            decoded = report.decoded,
            foreign = report.foreign,
            failed = report.failures.len(),
            "archive reloaded"
        );
        Ok(report)
    }

    pub fn query(&self, request: &QueryRequest) -> Vec<HistoricalRecord> {
        let hits = query::query(&self.store.all(), request);
        debug!(category = ?request.category, search = ?request.search(), hits = hits.len(), "query");
        hits
    }

    pub fn get(&self, address: &Address) -> Option<HistoricalRecord> {
        self.store.get(address)
    }

    /// Counts per category. The categories the publishing UI offers are
    /// always listed, at zero when nothing is filed under them.
    pub fn categories(&self) -> BTreeMap<String, usize> {
        let mut counts: BTreeMap<String, usize> = CATEGORIES.iter().map(|c| (c.to_string(), 0)).collect();
        counts.extend(query::category_counts(&self.store.all()));
        counts
    }

    pub fn last_report(&self) -> Option<LoadReport> {
        self.last_report
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
