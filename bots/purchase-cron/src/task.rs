//! Purchase tasks: what to buy, through which marketplace, and at what price.

use std::str::FromStr;

use async_trait::async_trait;
use serde::Deserialize;
use solana_sdk::instruction::AccountMeta;
use solana_sdk::pubkey::Pubkey;

use crate::amount::parse_sol;
use crate::error::ConfigError;

pub const DEFAULT_NATIVE_PRICE: &str = "0.01";
pub const DEFAULT_MAX_NATIVE_SPEND: &str = "0.02";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountRecord {
    pubkey: String,
    #[serde(default)]
    is_signer: bool,
    #[serde(default)]
    is_writable: bool,
}

/// JSON shape of `NEXT_TASK`. Amounts are decimal SOL strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    marketplace_program: String,
    #[serde(default)]
    accounts: Vec<AccountRecord>,
    /// Hex instruction data for the marketplace program, `0x` prefix optional.
    calldata: String,
    prize_mint: String,
    #[serde(default)]
    native_price: Option<String>,
    #[serde(default)]
    max_native_spend: Option<String>,
}

/// One purchase the executor may attempt. Amounts are lamports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseTask {
    pub marketplace_program: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub calldata: Vec<u8>,
    pub prize_mint: Pubkey,
    pub native_price: u64,
    pub max_native_spend: u64,
}

fn address(field: &'static str, value: &str) -> Result<Pubkey, ConfigError> {
    Pubkey::from_str(value.trim()).map_err(|_| ConfigError::InvalidAddress {
        field,
        value: value.to_string(),
    })
}

impl PurchaseTask {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let record: TaskRecord =
            serde_json::from_str(raw).map_err(|e| ConfigError::InvalidTask(e.to_string()))?;

        let hex_data = record.calldata.trim();
        let hex_data = hex_data.strip_prefix("0x").unwrap_or(hex_data);
        let calldata = hex::decode(hex_data)
            .map_err(|e| ConfigError::InvalidTask(format!("calldata: {e}")))?;

        let accounts = record
            .accounts
            .iter()
            .map(|a| {
                Ok(AccountMeta {
                    pubkey: address("accounts.pubkey", &a.pubkey)?,
                    is_signer: a.is_signer,
                    is_writable: a.is_writable,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            marketplace_program: address("marketplaceProgram", &record.marketplace_program)?,
            accounts,
            calldata,
            prize_mint: address("prizeMint", &record.prize_mint)?,
            native_price: parse_sol(
                record.native_price.as_deref().unwrap_or(DEFAULT_NATIVE_PRICE),
            )?,
            max_native_spend: parse_sol(
                record
                    .max_native_spend
                    .as_deref()
                    .unwrap_or(DEFAULT_MAX_NATIVE_SPEND),
            )?,
        })
    }

    /// Short stable id for log correlation.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.marketplace_program.as_ref());
        hasher.update(self.prize_mint.as_ref());
        hasher.update(&self.calldata);
        hasher.update(&self.native_price.to_le_bytes());
        hasher.update(&self.max_native_spend.to_le_bytes());
        for meta in &self.accounts {
            hasher.update(meta.pubkey.as_ref());
            hasher.update(&[meta.is_signer as u8, meta.is_writable as u8]);
        }
        hasher.finalize().to_hex()[..12].to_string()
    }
}

/// Supplies at most one task per chain per tick.
#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn next_task(&self, chain: &str) -> Option<PurchaseTask>;
}

/// The same configured task for every chain, or none.
#[derive(Debug, Clone, Default)]
pub struct StaticTaskSource {
    task: Option<PurchaseTask>,
}

impl StaticTaskSource {
    pub fn new(task: Option<PurchaseTask>) -> Self {
        Self { task }
    }

    /// Blank or absent input means no task.
    pub fn from_env_value(raw: Option<&str>) -> Result<Self, ConfigError> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(json) => Ok(Self::new(Some(PurchaseTask::from_json(json)?))),
            None => Ok(Self::new(None)),
        }
    }
}

#[async_trait]
impl TaskSource for StaticTaskSource {
    async fn next_task(&self, _chain: &str) -> Option<PurchaseTask> {
        self.task.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_json(extra: &str) -> String {
        format!(
            r#"{{
                "marketplaceProgram": "{}",
                "prizeMint": "{}",
                "calldata": "0x0a0b0c",
                "accounts": [{{ "pubkey": "{}", "isWritable": true }}]
                {extra}
            }}"#,
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
        )
    }

    #[test]
    fn omitted_amounts_fall_back_to_defaults() {
        let task = PurchaseTask::from_json(&task_json("")).unwrap();
        assert_eq!(task.native_price, 10_000_000);
        assert_eq!(task.max_native_spend, 20_000_000);
        assert_eq!(task.calldata, vec![0x0a, 0x0b, 0x0c]);
        assert!(task.accounts[0].is_writable);
        assert!(!task.accounts[0].is_signer);
    }

    #[test]
    fn explicit_amounts_are_kept() {
        let task = PurchaseTask::from_json(&task_json(
            r#", "nativePrice": "0.05", "maxNativeSpend": "0.02""#,
        ))
        .unwrap();
        assert_eq!(task.native_price, 50_000_000);
        assert_eq!(task.max_native_spend, 20_000_000);
    }

    #[test]
    fn bad_calldata_is_a_task_error() {
        let raw = task_json("").replace("0x0a0b0c", "zz");
        assert!(matches!(
            PurchaseTask::from_json(&raw),
            Err(ConfigError::InvalidTask(_))
        ));
    }

    #[test]
    fn blank_env_means_no_task() {
        assert!(StaticTaskSource::from_env_value(None).unwrap().task.is_none());
        assert!(StaticTaskSource::from_env_value(Some("  ")).unwrap().task.is_none());
        assert!(StaticTaskSource::from_env_value(Some("{")).is_err());
    }

    #[test]
    fn fingerprint_tracks_price() {
        let a = PurchaseTask::from_json(&task_json("")).unwrap();
        let mut b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.native_price += 1;
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
