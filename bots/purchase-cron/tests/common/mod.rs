#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use purchase_cron::config::{ChainCredentials, ChainEntry, CronConfig};
use purchase_cron::deployment::{ChainDeployment, DeploymentSource};
use purchase_cron::error::{ConfigError, LedgerError};
use purchase_cron::ledger::{Ledger, LedgerConnector, PrizeSnapshot, RoundSnapshot, TxReceipt};
use purchase_cron::task::PurchaseTask;
use solana_sdk::instruction::AccountMeta;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};

pub const SOL_0_01: u64 = 10_000_000;
pub const SOL_0_02: u64 = 20_000_000;
pub const SOL_0_05: u64 = 50_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    pub round_id: u64,
    pub prize_index: u32,
    pub value: u64,
    pub cap: u64,
}

#[derive(Default)]
pub struct MockState {
    pub current_round_id: u64,
    pub rounds: HashMap<u64, RoundSnapshot>,
    /// Served before `rounds`, one per read.
    pub scripted_reads: VecDeque<RoundSnapshot>,
    pub purchase_window: i64,
    pub prizes: HashMap<u64, Vec<PrizeSnapshot>>,
    pub fail_reads: bool,
    pub fail_submissions: bool,
    pub read_delay: Option<Duration>,
    pub round_reads: usize,
    pub purchases: Vec<Purchase>,
    pub writes: Vec<String>,
}

#[derive(Default)]
pub struct MockLedger {
    pub state: Mutex<MockState>,
}

impl MockLedger {
    /// Round 1 ending at `end`, with `budget` lamports to spend.
    pub fn with_round(end: i64, window: i64, budget: u64) -> Arc<Self> {
        let ledger = Self::default();
        {
            let mut s = ledger.state.lock().unwrap();
            s.current_round_id = 1;
            s.purchase_window = window;
            s.rounds.insert(
                1,
                RoundSnapshot {
                    round_id: 1,
                    start: end - 3_600,
                    end,
                    deposited: budget * 4,
                    purchase_budget: budget,
                    ..Default::default()
                },
            );
        }
        Arc::new(ledger)
    }

    pub fn update_round(&self, round_id: u64, f: impl FnOnce(&mut RoundSnapshot)) {
        let mut s = self.state.lock().unwrap();
        if let Some(r) = s.rounds.get_mut(&round_id) {
            f(r);
        }
    }

    pub fn purchases(&self) -> Vec<Purchase> {
        self.state.lock().unwrap().purchases.clone()
    }

    pub fn writes(&self) -> Vec<String> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn round_reads(&self) -> usize {
        self.state.lock().unwrap().round_reads
    }

    fn receipt() -> TxReceipt {
        TxReceipt {
            signature: Signature::default(),
        }
    }

    fn write(&self, name: String) -> Result<TxReceipt, LedgerError> {
        let mut s = self.state.lock().unwrap();
        if s.fail_submissions {
            return Err(LedgerError::Transaction("simulated failure".into()));
        }
        s.writes.push(name);
        Ok(Self::receipt())
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn current_round_id(&self) -> Result<u64, LedgerError> {
        let delay = self.state.lock().unwrap().read_delay;
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        let s = self.state.lock().unwrap();
        if s.fail_reads {
            return Err(LedgerError::Rpc("connection refused".into()));
        }
        Ok(s.current_round_id)
    }

    async fn round(&self, round_id: u64) -> Result<RoundSnapshot, LedgerError> {
        let mut s = self.state.lock().unwrap();
        if s.fail_reads {
            return Err(LedgerError::Rpc("connection refused".into()));
        }
        s.round_reads += 1;
        if let Some(r) = s.scripted_reads.pop_front() {
            return Ok(r);
        }
        s.rounds
            .get(&round_id)
            .cloned()
            .ok_or(LedgerError::AccountNotFound(Pubkey::default()))
    }

    async fn purchase_window(&self) -> Result<i64, LedgerError> {
        let s = self.state.lock().unwrap();
        if s.fail_reads {
            return Err(LedgerError::Rpc("connection refused".into()));
        }
        Ok(s.purchase_window)
    }

    async fn prizes(&self, round_id: u64) -> Result<Vec<PrizeSnapshot>, LedgerError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .prizes
            .get(&round_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn execute_marketplace_purchase(
        &self,
        round_id: u64,
        prize_index: u32,
        task: &PurchaseTask,
    ) -> Result<TxReceipt, LedgerError> {
        let mut s = self.state.lock().unwrap();
        if s.fail_submissions {
            return Err(LedgerError::Transaction("simulated failure".into()));
        }
        s.purchases.push(Purchase {
            round_id,
            prize_index,
            value: task.native_price,
            cap: task.max_native_spend,
        });
        if let Some(r) = s.rounds.get_mut(&round_id) {
            r.spent += task.native_price;
            r.prize_count += 1;
        }
        Ok(Self::receipt())
    }

    async fn request_draw(&self, round_id: u64) -> Result<TxReceipt, LedgerError> {
        self.write(format!("request_draw:{round_id}"))
    }

    async fn draw_winners(&self, round_id: u64, batch_size: u32) -> Result<TxReceipt, LedgerError> {
        self.write(format!("draw_winners:{round_id}:{batch_size}"))
    }

    async fn finalize_round(&self, round_id: u64) -> Result<TxReceipt, LedgerError> {
        self.write(format!("finalize_round:{round_id}"))
    }

    async fn start_next_round(&self) -> Result<TxReceipt, LedgerError> {
        let receipt = self.write("start_next_round".into())?;
        let mut s = self.state.lock().unwrap();
        let previous_end = s
            .rounds
            .get(&s.current_round_id)
            .map(|r| r.end)
            .unwrap_or_default();
        s.current_round_id += 1;
        let round_id = s.current_round_id;
        s.rounds.insert(
            round_id,
            RoundSnapshot {
                round_id,
                start: previous_end,
                end: previous_end + 3_600,
                ..Default::default()
            },
        );
        Ok(receipt)
    }
}

/// Hands out a pre-built ledger per chain.
#[derive(Default)]
pub struct MockConnector {
    pub ledgers: HashMap<String, Arc<MockLedger>>,
}

impl MockConnector {
    pub fn with(mut self, chain: &str, ledger: Arc<MockLedger>) -> Self {
        self.ledgers.insert(chain.to_string(), ledger);
        self
    }
}

impl LedgerConnector for MockConnector {
    fn connect(
        &self,
        deployment: &ChainDeployment,
        _credentials: &ChainCredentials,
    ) -> Result<Arc<dyn Ledger>, ConfigError> {
        self.ledgers
            .get(&deployment.chain)
            .cloned()
            .map(|l| l as Arc<dyn Ledger>)
            .ok_or_else(|| ConfigError::UnknownChain(deployment.chain.clone()))
    }
}

/// Deployment records that exist for the listed chains only.
#[derive(Default)]
pub struct MapDeployments {
    pub chains: HashSet<String>,
}

impl MapDeployments {
    pub fn of(chains: &[&str]) -> Self {
        Self {
            chains: chains.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl DeploymentSource for MapDeployments {
    fn load(&self, chain: &str) -> Result<ChainDeployment, ConfigError> {
        if !self.chains.contains(chain) {
            return Err(ConfigError::DeploymentMissing {
                chain: chain.to_string(),
                path: format!("deployments/{chain}.json").into(),
            });
        }
        Ok(ChainDeployment {
            chain: chain.to_string(),
            chain_id: chain.to_string(),
            program_id: lottery::ID,
            config: Pubkey::new_unique(),
            prize_vault: Pubkey::new_unique(),
            marketplace_allowlist: Pubkey::new_unique(),
            asset_allowlist: Pubkey::new_unique(),
        })
    }
}

pub fn configured(chain: &str) -> ChainEntry {
    ChainEntry {
        chain: chain.to_string(),
        credentials: Ok(ChainCredentials {
            chain_id: chain.to_string(),
            rpc_url: format!("mock://{chain}"),
            signer: Arc::new(Keypair::new()),
        }),
    }
}

pub fn unconfigured(chain: &str) -> ChainEntry {
    ChainEntry {
        chain: chain.to_string(),
        credentials: Err(ConfigError::CredentialMissing(format!(
            "PK_{}",
            chain.to_uppercase()
        ))),
    }
}

pub fn cron_config(chains: Vec<ChainEntry>) -> CronConfig {
    CronConfig {
        chains,
        interval: Duration::from_secs(60),
        tick_budget: Duration::from_secs(45),
    }
}

pub fn task(native_price: u64, max_native_spend: u64) -> PurchaseTask {
    PurchaseTask {
        marketplace_program: Pubkey::new_unique(),
        accounts: vec![AccountMeta::new(Pubkey::new_unique(), false)],
        calldata: vec![1, 2, 3],
        prize_mint: Pubkey::new_unique(),
        native_price,
        max_native_spend,
    }
}
