//! CLI surface, credential lookup and the resolved per-chain configuration.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use solana_sdk::signature::{Keypair, Signer};
use tracing::warn;

use crate::deployment::DeploymentSource;
use crate::error::ConfigError;

#[derive(Debug, Parser)]
#[command(name = "purchase-cron", version, about = "Lottery purchase-window cron and operator console")]
pub struct Cli {
    /// Whitespace-separated chain names; each needs `<deployments-dir>/<chain>.json`.
    #[arg(long, env = "DEPLOYMENTS", default_value = "")]
    pub deployments: String,

    #[arg(long, env = "DEPLOYMENTS_DIR", default_value = "deployments")]
    pub deployments_dir: PathBuf,

    /// Seconds between ticks in `run` mode.
    #[arg(long, env = "CRON_INTERVAL_SECS", default_value_t = 60)]
    pub interval_secs: u64,

    /// Once a tick has run this long, remaining chains wait for the next tick.
    #[arg(long, env = "TICK_BUDGET_SECS", default_value_t = 45)]
    pub tick_budget_secs: u64,

    /// Purchase task JSON offered to every chain.
    #[arg(long, env = "NEXT_TASK")]
    pub next_task: Option<String>,

    /// Run a single tick and exit (cron-style triggering).
    #[arg(long)]
    pub once: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Tick forever on the configured interval (default).
    Run,
    /// One pass over every chain.
    Tick,
    /// Open the next round once the current one has closed.
    StartNext {
        #[arg(long)]
        chain: String,
    },
    /// Seal the prize list and request randomness for a closed round.
    RequestDraw {
        #[arg(long)]
        chain: String,
        #[arg(long)]
        round_id: u64,
    },
    /// Resolve undrawn prize slots; `--batch 0` draws all of them.
    Draw {
        #[arg(long)]
        chain: String,
        #[arg(long)]
        round_id: u64,
        #[arg(long, default_value_t = 0)]
        batch: u32,
    },
    Finalize {
        #[arg(long)]
        chain: String,
        #[arg(long)]
        round_id: u64,
    },
    /// Unclaimed prizes won by an address.
    Prizes {
        #[arg(long)]
        chain: String,
        #[arg(long)]
        owner: String,
        /// Defaults to every round up to the current one.
        #[arg(long)]
        round_id: Option<u64>,
    },
}

impl Cli {
    pub fn chains(&self) -> Vec<String> {
        self.deployments
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

/// Source of `RPC_<chainId>` / `PK_<chainId>` values.
pub trait CredentialStore {
    fn get(&self, key: &str) -> Option<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EnvCredentials;

impl CredentialStore for EnvCredentials {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

impl CredentialStore for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).filter(|v| !v.trim().is_empty()).cloned()
    }
}

#[derive(Clone)]
pub struct ChainCredentials {
    pub chain_id: String,
    pub rpc_url: String,
    pub signer: Arc<Keypair>,
}

impl fmt::Debug for ChainCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainCredentials")
            .field("chain_id", &self.chain_id)
            .field("rpc_url", &self.rpc_url)
            .field("signer", &self.signer.pubkey())
            .finish()
    }
}

/// `devnet` -> `DEVNET`, `mainnet-beta` -> `MAINNET_BETA`.
pub fn credential_suffix(chain_id: &str) -> String {
    chain_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Accepts a base58 secret key or a JSON byte array (solana-keygen file contents).
pub fn parse_keypair(var: &str, raw: &str) -> Result<Keypair, ConfigError> {
    let raw = raw.trim();
    let bytes = if raw.starts_with('[') {
        serde_json::from_str::<Vec<u8>>(raw).map_err(|_| ConfigError::InvalidKeypair(var.into()))?
    } else {
        bs58::decode(raw)
            .into_vec()
            .map_err(|_| ConfigError::InvalidKeypair(var.into()))?
    };
    Keypair::try_from(bytes.as_slice()).map_err(|_| ConfigError::InvalidKeypair(var.into()))
}

/// Turns chain names into credentials using the deployment registry and a credential store.
pub struct ChainConfigResolver<'a> {
    credentials: &'a dyn CredentialStore,
    deployments: &'a dyn DeploymentSource,
}

impl<'a> ChainConfigResolver<'a> {
    pub fn new(credentials: &'a dyn CredentialStore, deployments: &'a dyn DeploymentSource) -> Self {
        Self {
            credentials,
            deployments,
        }
    }

    pub fn resolve(&self, chain: &str) -> Result<ChainCredentials, ConfigError> {
        let deployment = self.deployments.load(chain)?;
        let suffix = credential_suffix(&deployment.chain_id);
        let rpc_key = format!("RPC_{suffix}");
        let pk_key = format!("PK_{suffix}");

        let rpc_url = self
            .credentials
            .get(&rpc_key)
            .ok_or_else(|| ConfigError::CredentialMissing(rpc_key.clone()))?;
        let pk = self
            .credentials
            .get(&pk_key)
            .ok_or_else(|| ConfigError::CredentialMissing(pk_key.clone()))?;

        Ok(ChainCredentials {
            chain_id: deployment.chain_id,
            rpc_url,
            signer: Arc::new(parse_keypair(&pk_key, &pk)?),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ChainEntry {
    pub chain: String,
    /// Resolved once at start-up; an error here skips the chain on every tick.
    pub credentials: Result<ChainCredentials, ConfigError>,
}

/// Everything a tick needs, resolved up front. Ticks never read the environment.
#[derive(Debug, Clone)]
pub struct CronConfig {
    pub chains: Vec<ChainEntry>,
    pub interval: Duration,
    pub tick_budget: Duration,
}

impl CronConfig {
    pub fn resolve(cli: &Cli, resolver: &ChainConfigResolver<'_>) -> Self {
        let chains = cli
            .chains()
            .into_iter()
            .map(|chain| {
                let credentials = resolver.resolve(&chain);
                if let Err(e) = &credentials {
                    warn!(chain = %chain, error = %e, "chain not configured, it will be skipped");
                }
                ChainEntry { chain, credentials }
            })
            .collect();

        Self {
            chains,
            interval: Duration::from_secs(cli.interval_secs.max(1)),
            tick_budget: Duration::from_secs(cli.tick_budget_secs),
        }
    }

    pub fn entry(&self, chain: &str) -> Result<&ChainEntry, ConfigError> {
        self.chains
            .iter()
            .find(|e| e.chain == chain)
            .ok_or_else(|| ConfigError::UnknownChain(chain.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployment::ChainDeployment;

    struct OneDeployment;

    impl DeploymentSource for OneDeployment {
        fn load(&self, chain: &str) -> Result<ChainDeployment, ConfigError> {
            if chain != "devnet" {
                return Err(ConfigError::DeploymentMissing {
                    chain: chain.into(),
                    path: format!("deployments/{chain}.json").into(),
                });
            }
            Ok(ChainDeployment {
                chain: chain.into(),
                chain_id: "devnet".into(),
                program_id: lottery::ID,
                config: lottery::ID,
                prize_vault: lottery::ID,
                marketplace_allowlist: lottery::ID,
                asset_allowlist: lottery::ID,
            })
        }
    }

    #[test]
    fn splits_deployments_on_any_whitespace() {
        let cli = Cli::parse_from(["purchase-cron", "--deployments", " devnet \t mainnet  "]);
        assert_eq!(cli.chains(), vec!["devnet", "mainnet"]);
    }

    #[test]
    fn suffix_is_env_safe() {
        assert_eq!(credential_suffix("mainnet-beta"), "MAINNET_BETA");
        assert_eq!(credential_suffix("devnet"), "DEVNET");
    }

    #[test]
    fn keypair_accepts_json_and_base58() {
        let kp = Keypair::new();
        let json = serde_json::to_string(&kp.to_bytes().to_vec()).unwrap();
        assert_eq!(parse_keypair("PK", &json).unwrap().pubkey(), kp.pubkey());
        let b58 = bs58::encode(kp.to_bytes()).into_string();
        assert_eq!(parse_keypair("PK", &b58).unwrap().pubkey(), kp.pubkey());
        assert!(parse_keypair("PK", "not-a-key").is_err());
    }

    #[test]
    fn missing_credentials_are_reported_per_chain() {
        let mut store = HashMap::new();
        store.insert("RPC_DEVNET".to_string(), "http://localhost:8899".to_string());
        let resolver = ChainConfigResolver::new(&store, &OneDeployment);

        assert!(matches!(
            resolver.resolve("devnet"),
            Err(ConfigError::CredentialMissing(k)) if k == "PK_DEVNET"
        ));
        assert!(matches!(
            resolver.resolve("mainnet"),
            Err(ConfigError::DeploymentMissing { .. })
        ));

        let kp = Keypair::new();
        store.insert("PK_DEVNET".to_string(), bs58::encode(kp.to_bytes()).into_string());
        let resolver = ChainConfigResolver::new(&store, &OneDeployment);
        let creds = resolver.resolve("devnet").unwrap();
        assert_eq!(creds.signer.pubkey(), kp.pubkey());
        assert_eq!(creds.rpc_url, "http://localhost:8899");
    }

    #[test]
    fn resolve_keeps_every_listed_chain() {
        let cli = Cli::parse_from(["purchase-cron", "--deployments", "devnet mainnet"]);
        let store: HashMap<String, String> = HashMap::new();
        let resolver = ChainConfigResolver::new(&store, &OneDeployment);
        let cfg = CronConfig::resolve(&cli, &resolver);
        assert_eq!(cfg.chains.len(), 2);
        assert!(cfg.chains.iter().all(|c| c.credentials.is_err()));
        assert!(cfg.entry("devnet").is_ok());
        assert!(matches!(cfg.entry("testnet"), Err(ConfigError::UnknownChain(_))));
    }
}
