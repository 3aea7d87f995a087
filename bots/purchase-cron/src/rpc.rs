//! `Ledger` over Solana JSON-RPC.

use std::sync::Arc;

use anchor_lang::{AccountDeserialize, Discriminator, InstructionData, ToAccountMetas};
use anchor_spl::associated_token::get_associated_token_address;
use async_trait::async_trait;
use lottery::state::{Config, Prize, Round};
use lottery::utils::compute_jackpot;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::compute_budget::ComputeBudgetInstruction;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::transaction::Transaction;
use tracing::debug;

use crate::config::ChainCredentials;
use crate::deployment::ChainDeployment;
use crate::error::{ConfigError, LedgerError};
use crate::ledger::{Ledger, LedgerConnector, PrizeSnapshot, RoundSnapshot, TxReceipt};
use crate::task::PurchaseTask;

/// Prize accounts per `draw_winners` transaction.
const MAX_DRAW_BATCH: u32 = 16;
/// `getMultipleAccounts` limit.
const MAX_MULTIPLE_ACCOUNTS: usize = 100;
const PURCHASE_COMPUTE_UNITS: u32 = 400_000;

pub struct RpcLedger {
    client: RpcClient,
    signer: Arc<Keypair>,
    deployment: ChainDeployment,
}

fn rpc_err(e: impl std::fmt::Display) -> LedgerError {
    LedgerError::Rpc(e.to_string())
}

fn decode_round(address: Pubkey, data: &[u8]) -> Result<Round, LedgerError> {
    let bad = || LedgerError::Decode {
        what: "round",
        address,
    };
    let body = data.strip_prefix(Round::DISCRIMINATOR).ok_or_else(bad)?;
    let size = std::mem::size_of::<Round>();
    if body.len() < size {
        return Err(bad());
    }
    bytemuck::try_pod_read_unaligned::<Round>(&body[..size]).map_err(|_| bad())
}

impl RpcLedger {
    pub fn new(rpc_url: String, signer: Arc<Keypair>, deployment: ChainDeployment) -> Self {
        Self {
            client: RpcClient::new_with_commitment(rpc_url, CommitmentConfig::confirmed()),
            signer,
            deployment,
        }
    }

    async fn fetch(&self, address: &Pubkey) -> Result<Vec<u8>, LedgerError> {
        let account = self
            .client
            .get_account_with_commitment(address, self.client.commitment())
            .await
            .map_err(rpc_err)?
            .value
            .ok_or(LedgerError::AccountNotFound(*address))?;
        Ok(account.data)
    }

    async fn config(&self) -> Result<Config, LedgerError> {
        let address = self.deployment.config;
        let data = self.fetch(&address).await?;
        Config::try_deserialize(&mut data.as_slice()).map_err(|_| LedgerError::Decode {
            what: "config",
            address,
        })
    }

    async fn load_round(&self, round_id: u64) -> Result<Round, LedgerError> {
        let address = self.deployment.round_address(round_id);
        let data = self.fetch(&address).await?;
        decode_round(address, &data)
    }

    async fn send(&self, instructions: &[Instruction]) -> Result<TxReceipt, LedgerError> {
        let blockhash = self.client.get_latest_blockhash().await.map_err(rpc_err)?;
        let tx = Transaction::new_signed_with_payer(
            instructions,
            Some(&self.signer.pubkey()),
            &[self.signer.as_ref()],
            blockhash,
        );
        let signature = self
            .client
            .send_and_confirm_transaction(&tx)
            .await
            .map_err(|e| LedgerError::Transaction(e.to_string()))?;
        Ok(TxReceipt { signature })
    }

    fn instruction(&self, accounts: Vec<AccountMeta>, data: Vec<u8>) -> Instruction {
        Instruction {
            program_id: self.deployment.program_id,
            accounts,
            data,
        }
    }

    /// Marketplace account list as sent in the outer transaction. Only our own
    /// key can sign here; the program signs for the round vault inside the CPI.
    fn marketplace_metas(&self, round_id: u64, task: &PurchaseTask) -> Vec<AccountMeta> {
        let vault = self.deployment.vault_address(round_id);
        let me = self.signer.pubkey();
        task.accounts
            .iter()
            .map(|m| AccountMeta {
                pubkey: m.pubkey,
                is_signer: m.pubkey == me && m.is_signer,
                is_writable: m.is_writable || m.pubkey == vault,
            })
            .collect()
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn current_round_id(&self) -> Result<u64, LedgerError> {
        Ok(self.config().await?.current_round_id)
    }

    async fn round(&self, round_id: u64) -> Result<RoundSnapshot, LedgerError> {
        Ok(RoundSnapshot::from(&self.load_round(round_id).await?))
    }

    async fn purchase_window(&self) -> Result<i64, LedgerError> {
        Ok(self.config().await?.purchase_window())
    }

    async fn prizes(&self, round_id: u64) -> Result<Vec<PrizeSnapshot>, LedgerError> {
        let round = self.load_round(round_id).await?;
        let addresses: Vec<Pubkey> = (0..round.prize_count)
            .map(|i| self.deployment.prize_address(round_id, i))
            .collect();

        let mut prizes = Vec::with_capacity(addresses.len());
        for chunk in addresses.chunks(MAX_MULTIPLE_ACCOUNTS) {
            let accounts = self
                .client
                .get_multiple_accounts(chunk)
                .await
                .map_err(rpc_err)?;
            for (address, account) in chunk.iter().zip(accounts) {
                let account = account.ok_or(LedgerError::AccountNotFound(*address))?;
                let decode_err = || LedgerError::Decode {
                    what: "prize",
                    address: *address,
                };
                let prize = Prize::try_deserialize(&mut account.data.as_slice())
                    .map_err(|_| decode_err())?;
                prizes.push(PrizeSnapshot::from_account(&prize).ok_or_else(decode_err)?);
            }
        }
        Ok(prizes)
    }

    async fn execute_marketplace_purchase(
        &self,
        round_id: u64,
        prize_index: u32,
        task: &PurchaseTask,
    ) -> Result<TxReceipt, LedgerError> {
        let dep = &self.deployment;
        let executor = self.signer.pubkey();

        let mut accounts = lottery::accounts::ExecuteMarketplacePurchase {
            executor,
            config: dep.config,
            round: dep.round_address(round_id),
            vault: dep.vault_address(round_id),
            marketplace_allowlist: dep.marketplace_allowlist,
            asset_allowlist: dep.asset_allowlist,
            marketplace_program: task.marketplace_program,
            prize_mint: task.prize_mint,
            prize_vault: dep.prize_vault,
            prize_vault_token_account: get_associated_token_address(&dep.prize_vault, &task.prize_mint),
            prize: dep.prize_address(round_id, prize_index),
            associated_token_program: anchor_spl::associated_token::ID,
            token_program: anchor_spl::token::ID,
            system_program: solana_sdk::system_program::ID,
        }
        .to_account_metas(None);
        accounts.extend(self.marketplace_metas(round_id, task));

        let data = lottery::instruction::ExecuteMarketplacePurchase {
            round_id,
            calldata: task.calldata.clone(),
            native_price: task.native_price,
            max_native_spend: task.max_native_spend,
            prize_index,
        }
        .data();

        self.send(&[
            ComputeBudgetInstruction::set_compute_unit_limit(PURCHASE_COMPUTE_UNITS),
            self.instruction(accounts, data),
        ])
        .await
    }

    async fn request_draw(&self, round_id: u64) -> Result<TxReceipt, LedgerError> {
        let dep = &self.deployment;
        let round = self.load_round(round_id).await?;
        let jackpot = compute_jackpot(round.deposited, round.owner_amount, round.spent).map_err(|_| {
            LedgerError::Decode {
                what: "round totals",
                address: dep.round_address(round_id),
            }
        })?;
        let jackpot_index = round.prize_count;

        let accounts = lottery::accounts::RequestDraw {
            payer: self.signer.pubkey(),
            config: dep.config,
            round: dep.round_address(round_id),
            jackpot: (jackpot > 0).then(|| dep.prize_address(round_id, jackpot_index)),
            program_identity: Pubkey::find_program_address(&[b"identity"], &dep.program_id).0,
            oracle_queue: lottery::instructions::request_draw::DEFAULT_QUEUE,
            vrf_program: lottery::instructions::request_draw::VRF_PROGRAM_ID,
            slot_hashes: solana_sdk::sysvar::slot_hashes::ID,
            system_program: solana_sdk::system_program::ID,
        }
        .to_account_metas(None);
        let data = lottery::instruction::RequestDraw {
            round_id,
            jackpot_index,
        }
        .data();

        self.send(&[self.instruction(accounts, data)]).await
    }

    async fn draw_winners(&self, round_id: u64, batch_size: u32) -> Result<TxReceipt, LedgerError> {
        let dep = &self.deployment;
        let round = self.load_round(round_id).await?;
        let remaining = round.undrawn_slots();
        let total = if batch_size == 0 {
            remaining
        } else {
            batch_size.min(remaining)
        };

        let mut next = round.winners_drawn;
        let end = next + total;
        let mut last = None;
        while next < end {
            let n = (end - next).min(MAX_DRAW_BATCH);
            let mut accounts = lottery::accounts::DrawWinners {
                caller: self.signer.pubkey(),
                round: dep.round_address(round_id),
            }
            .to_account_metas(None);
            accounts.extend(
                (next..next + n).map(|slot| AccountMeta::new(dep.prize_address(round_id, slot), false)),
            );
            let data = lottery::instruction::DrawWinners {
                round_id,
                batch_size: n,
            }
            .data();

            let receipt = self.send(&[self.instruction(accounts, data)]).await?;
            debug!(round_id, first_slot = next, n, signature = %receipt.signature, "draw batch sent");
            last = Some(receipt);
            next += n;
        }

        last.ok_or_else(|| LedgerError::Transaction(format!("round {round_id} has no undrawn slots")))
    }

    async fn finalize_round(&self, round_id: u64) -> Result<TxReceipt, LedgerError> {
        let dep = &self.deployment;
        let cfg = self.config().await?;
        let accounts = lottery::accounts::FinalizeRound {
            admin: self.signer.pubkey(),
            config: dep.config,
            round: dep.round_address(round_id),
            vault: dep.vault_address(round_id),
            fee_recipient: cfg.fee_recipient,
            system_program: solana_sdk::system_program::ID,
        }
        .to_account_metas(None);
        let data = lottery::instruction::FinalizeRound { round_id }.data();
        self.send(&[self.instruction(accounts, data)]).await
    }

    async fn start_next_round(&self) -> Result<TxReceipt, LedgerError> {
        let dep = &self.deployment;
        let current = self.config().await?.current_round_id;
        let round_id = current + 1;
        let accounts = lottery::accounts::StartNextRound {
            payer: self.signer.pubkey(),
            config: dep.config,
            previous_round: (current > 0).then(|| dep.round_address(current)),
            round: dep.round_address(round_id),
            vault: dep.vault_address(round_id),
            system_program: solana_sdk::system_program::ID,
        }
        .to_account_metas(None);
        let data = lottery::instruction::StartNextRound { round_id }.data();
        self.send(&[self.instruction(accounts, data)]).await
    }
}

pub struct RpcConnector;

impl LedgerConnector for RpcConnector {
    fn connect(
        &self,
        deployment: &ChainDeployment,
        credentials: &ChainCredentials,
    ) -> Result<Arc<dyn Ledger>, ConfigError> {
        Ok(Arc::new(RpcLedger::new(
            credentials.rpc_url.clone(),
            credentials.signer.clone(),
            deployment.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    #[test]
    fn round_decodes_from_account_bytes() {
        let mut round = Round::zeroed();
        round.round_id = 7;
        round.end_ts = 1_000;
        round.prize_count = 2;

        let mut data = Round::DISCRIMINATOR.to_vec();
        data.extend_from_slice(bytemuck::bytes_of(&round));

        let decoded = decode_round(Pubkey::new_unique(), &data).unwrap();
        assert_eq!(decoded.round_id, 7);
        assert_eq!(decoded.end_ts, 1_000);
        assert_eq!(RoundSnapshot::from(&decoded).prize_count, 2);
    }

    #[test]
    fn round_decode_rejects_wrong_discriminator_or_short_data() {
        let round = Round::zeroed();
        let mut data = vec![0u8; 8];
        data.extend_from_slice(bytemuck::bytes_of(&round));
        assert!(decode_round(Pubkey::new_unique(), &data).is_err());

        let short = Round::DISCRIMINATOR.to_vec();
        assert!(decode_round(Pubkey::new_unique(), &short).is_err());
    }
}
