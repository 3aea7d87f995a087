//! Per-chain deployment records (`<deployments_dir>/<chain>.json`).

use std::path::{Path, PathBuf};
use std::str::FromStr;

use lottery::constants::{
    SEED_ALLOWLIST_ASSET, SEED_ALLOWLIST_MARKETPLACE, SEED_CFG, SEED_PRIZE, SEED_PRIZE_VAULT,
    SEED_ROUND, SEED_VAULT,
};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::error::ConfigError;

/// On-disk shape of a deployment record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub chain_id: String,
    pub lottery: String,
    #[serde(default)]
    pub prize_vault: Option<String>,
    #[serde(default)]
    pub marketplace_allowlist: Option<String>,
    #[serde(default)]
    pub asset_allowlist: Option<String>,
}

/// Resolved addresses of one lottery deployment. Immutable for the tick that loaded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainDeployment {
    pub chain: String,
    pub chain_id: String,
    pub program_id: Pubkey,
    pub config: Pubkey,
    pub prize_vault: Pubkey,
    pub marketplace_allowlist: Pubkey,
    pub asset_allowlist: Pubkey,
}

fn parse_address(field: &'static str, value: &str) -> Result<Pubkey, ConfigError> {
    Pubkey::from_str(value.trim()).map_err(|_| ConfigError::InvalidAddress {
        field,
        value: value.to_string(),
    })
}

impl ChainDeployment {
    pub fn from_record(chain: &str, record: &DeploymentRecord) -> Result<Self, ConfigError> {
        let program_id = parse_address("lottery", &record.lottery)?;
        let pda = |seeds: &[&[u8]]| Pubkey::find_program_address(seeds, &program_id).0;

        let prize_vault = match &record.prize_vault {
            Some(v) => parse_address("prizeVault", v)?,
            None => pda(&[SEED_PRIZE_VAULT]),
        };
        let marketplace_allowlist = match &record.marketplace_allowlist {
            Some(v) => parse_address("marketplaceAllowlist", v)?,
            None => pda(&[SEED_ALLOWLIST_MARKETPLACE]),
        };
        let asset_allowlist = match &record.asset_allowlist {
            Some(v) => parse_address("assetAllowlist", v)?,
            None => pda(&[SEED_ALLOWLIST_ASSET]),
        };

        Ok(Self {
            chain: chain.to_string(),
            chain_id: record.chain_id.clone(),
            program_id,
            config: pda(&[SEED_CFG]),
            prize_vault,
            marketplace_allowlist,
            asset_allowlist,
        })
    }

    pub fn round_address(&self, round_id: u64) -> Pubkey {
        Pubkey::find_program_address(&[SEED_ROUND, &round_id.to_le_bytes()], &self.program_id).0
    }

    pub fn vault_address(&self, round_id: u64) -> Pubkey {
        Pubkey::find_program_address(&[SEED_VAULT, &round_id.to_le_bytes()], &self.program_id).0
    }

    pub fn prize_address(&self, round_id: u64, index: u32) -> Pubkey {
        Pubkey::find_program_address(
            &[SEED_PRIZE, &round_id.to_le_bytes(), &index.to_le_bytes()],
            &self.program_id,
        )
        .0
    }
}

/// Where deployment records come from. Loaded again on every tick.
pub trait DeploymentSource: Send + Sync {
    fn load(&self, chain: &str) -> Result<ChainDeployment, ConfigError>;
}

pub struct FsDeployments {
    dir: PathBuf,
}

impl FsDeployments {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, chain: &str) -> PathBuf {
        self.dir.join(format!("{chain}.json"))
    }

    fn read(path: &Path, chain: &str) -> Result<DeploymentRecord, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::DeploymentMissing {
            chain: chain.to_string(),
            path: path.to_path_buf(),
        })?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::DeploymentMalformed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

impl DeploymentSource for FsDeployments {
    fn load(&self, chain: &str) -> Result<ChainDeployment, ConfigError> {
        let path = self.path_for(chain);
        let record = Self::read(&path, chain)?;
        ChainDeployment::from_record(chain, &record)
    }
}
