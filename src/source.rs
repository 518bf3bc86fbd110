use std::future::Future;
use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::model::{Address, AddressError, RawAccount};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("account {pubkey}: invalid base64 data: {source}")]
    Base64 {
        pubkey: String,
        #[source]
        source: base64::DecodeError,
    },
    #[error("unsupported account data encoding `{0}`")]
    Encoding(String),
    #[error(transparent)]
    Address(#[from] AddressError),
}

/// Supplies every account owned by a program. Implementations may block or
/// fail; callers treat the returned list as a value.
pub trait AccountSource: Send + Sync {
    fn fetch_raw_accounts(
        &self,
        program: &Address,
    ) -> impl Future<Output = Result<Vec<RawAccount>, SourceError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureAccount {
    pub pubkey: String,
    pub data: String,
}

impl FixtureAccount {
    pub fn from_raw(account: &RawAccount) -> Self {
        Self {
            pubkey: account.address.to_string(),
            data: STANDARD.encode(&account.bytes),
        }
    }

    pub fn into_raw(self) -> Result<RawAccount, SourceError> {
        raw_account(&self.pubkey, &self.data)
    }
}

fn raw_account(pubkey: &str, data: &str) -> Result<RawAccount, SourceError> {
    let address: Address = pubkey.parse()?;
    let bytes = STANDARD.decode(data).map_err(|source| SourceError::Base64 {
        pubkey: pubkey.to_owned(),
        source,
    })?;
    Ok(RawAccount::new(address, bytes))
}

// --- JSON-RPC ---

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct KeyedAccount {
    pubkey: String,
    account: UiAccount,
}

#[derive(Debug, Deserialize)]
struct UiAccount {
    /// `[payload, encoding]`
    data: (String, String),
}

#[derive(Debug, Clone)]
pub struct RpcSource {
    client: reqwest::Client,
    url: String,
}

impl RpcSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn request_body(program: &Address) -> serde_json::Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "getProgramAccounts",
        "params": [
            program.to_string(),
            { "encoding": "base64", "commitment": "confirmed" }
        ]
    })
}

fn accounts_from_response(response: RpcResponse<Vec<KeyedAccount>>) -> Result<Vec<RawAccount>, SourceError> {
    if let Some(error) = response.error {
        return Err(SourceError::Rpc {
            code: error.code,
            message: error.message,
        });
    }
    let Some(keyed) = response.result else {
        return Err(SourceError::Rpc {
            code: 0,
            message: "response carried neither result nor error".into(),
        });
    };

    keyed
        .into_iter()
        .map(|entry| {
            let (payload, encoding) = entry.account.data;
            if encoding != "base64" {
                return Err(SourceError::Encoding(encoding));
            }
            raw_account(&entry.pubkey, &payload)
        })
        .collect()
}

impl AccountSource for RpcSource {
    async fn fetch_raw_accounts(&self, program: &Address) -> Result<Vec<RawAccount>, SourceError> {
        debug!(url = %self.url, %program, "requesting program accounts");
        let response: RpcResponse<Vec<KeyedAccount>> = self
            .client
            .post(&self.url)
            .json(&request_body(program))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        accounts_from_response(response)
    }
}

// --- Fixture file ---

#[derive(Debug, Clone)]
pub struct FixtureSource {
    path: PathBuf,
}

impl FixtureSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn write(path: impl Into<PathBuf>, accounts: &[RawAccount]) -> Result<(), SourceError> {
        let entries: Vec<FixtureAccount> = accounts.iter().map(FixtureAccount::from_raw).collect();
        tokio::fs::write(path.into(), serde_json::to_vec_pretty(&entries)?).await?;
        Ok(())
    }
}

impl AccountSource for FixtureSource {
    async fn fetch_raw_accounts(&self, _program: &Address) -> Result<Vec<RawAccount>, SourceError> {
        debug!(path = %self.path.display(), "reading fixture accounts");
        let bytes = tokio::fs::read(&self.path).await?;
        let entries: Vec<FixtureAccount> = serde_json::from_slice(&bytes)?;
        entries.into_iter().map(FixtureAccount::into_raw).collect()
    }
}

// --- In memory ---

#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    accounts: Vec<RawAccount>,
}

impl MemorySource {
    pub fn new(accounts: Vec<RawAccount>) -> Self {
        Self { accounts }
    }
}

impl AccountSource for MemorySource {
    async fn fetch_raw_accounts(&self, _program: &Address) -> Result<Vec<RawAccount>, SourceError> {
        Ok(self.accounts.clone())
    }
}

#[derive(Debug, Clone)]
pub enum ConfiguredSource {
    Rpc(RpcSource),
    Fixture(FixtureSource),
}

impl AccountSource for ConfiguredSource {
    async fn fetch_raw_accounts(&self, program: &Address) -> Result<Vec<RawAccount>, SourceError> {
        match self {
            Self::Rpc(source) => source.fetch_raw_accounts(program).await,
            Self::Fixture(source) => source.fetch_raw_accounts(program).await,
        }
    }
}
