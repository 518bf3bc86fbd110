use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use crate::model::Address;
use crate::source::{ConfiguredSource, FixtureSource, RpcSource};

pub const DEFAULT_PROGRAM_ID: &str = "411nw24abKMmqgmUXMeNgwuLytABW2HBZVR85rLGNKSY";
pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";

#[derive(clap::Args, Clone, Debug)]
pub struct SourceArgs {
    /// JSON-RPC endpoint of the ledger node
    #[arg(long, env = "CLIO_RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Program owning the record accounts
    #[arg(long, env = "CLIO_PROGRAM_ID", default_value = DEFAULT_PROGRAM_ID)]
    pub program_id: Address,

    /// Read accounts from a JSON dump instead of the node
    #[arg(long, env = "CLIO_FIXTURE")]
    pub fixture: Option<PathBuf>,
}

impl SourceArgs {
    pub fn source(&self) -> ConfiguredSource {
        match &self.fixture {
            Some(path) => ConfiguredSource::Fixture(FixtureSource::new(path)),
            None => ConfiguredSource::Rpc(RpcSource::new(&self.rpc_url)),
        }
    }
}

/// Install the fmt subscriber. `RUST_LOG` wins over `default_directives`.
pub fn init_tracing(default_directives: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct Probe {
        #[command(flatten)]
        source: SourceArgs,
    }

    #[test]
    fn defaults_point_at_devnet_program() {
        let probe = Probe::try_parse_from(["probe"]).unwrap();
        assert_eq!(probe.source.program_id.to_string(), DEFAULT_PROGRAM_ID);
        assert!(matches!(probe.source.source(), ConfiguredSource::Rpc(rpc) if rpc.url() == DEFAULT_RPC_URL));
    }

    #[test]
    fn fixture_flag_switches_source() {
        let probe = Probe::try_parse_from(["probe", "--fixture", "dump.json"]).unwrap();
        assert!(matches!(probe.source.source(), ConfiguredSource::Fixture(_)));
    }

    #[test]
    fn malformed_program_id_is_rejected() {
        assert!(Probe::try_parse_from(["probe", "--program-id", "nope"]).is_err());
    }
}
