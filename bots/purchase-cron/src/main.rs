use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use purchase_cron::amount::format_sol;
use purchase_cron::clock::SystemClock;
use purchase_cron::config::{ChainConfigResolver, Cli, Command, CronConfig, EnvCredentials};
use purchase_cron::deployment::{DeploymentSource, FsDeployments};
use purchase_cron::driver::RoundLifecycleDriver;
use purchase_cron::ledger::{Ledger, LedgerConnector};
use purchase_cron::prizes::claimable_prizes;
use purchase_cron::rpc::RpcConnector;
use purchase_cron::scheduler::Scheduler;
use purchase_cron::task::StaticTaskSource;
use solana_sdk::pubkey::Pubkey;
use tracing::{info, warn};

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

fn connect(
    config: &CronConfig,
    deployments: &dyn DeploymentSource,
    chain: &str,
) -> Result<Arc<dyn Ledger>> {
    let entry = config.entry(chain)?;
    let credentials = entry
        .credentials
        .as_ref()
        .map_err(|e| anyhow::anyhow!("chain `{chain}` is not configured: {e}"))?;
    let deployment = deployments.load(chain)?;
    Ok(RpcConnector.connect(&deployment, credentials)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let deployments = Arc::new(FsDeployments::new(&cli.deployments_dir));
    let config = {
        let resolver = ChainConfigResolver::new(&EnvCredentials, deployments.as_ref());
        CronConfig::resolve(&cli, &resolver)
    };
    let clock = SystemClock;

    let command = match (cli.command.clone(), cli.once) {
        (Some(c), _) => c,
        (None, true) => Command::Tick,
        (None, false) => Command::Run,
    };

    let single_tick = matches!(command, Command::Tick);

    match command {
        Command::Run | Command::Tick => {
            let tasks = StaticTaskSource::from_env_value(cli.next_task.as_deref())
                .context("NEXT_TASK")?;
            if config.chains.is_empty() {
                warn!("DEPLOYMENTS is empty, ticks will do nothing");
            }
            let scheduler = Scheduler::new(
                config,
                deployments,
                Arc::new(RpcConnector),
                Arc::new(tasks),
                Arc::new(clock),
            );

            if single_tick {
                let report = scheduler.tick().await;
                info!(chains = report.outcomes.len(), attempts = report.attempts(), "tick done");
                return Ok(());
            }

            let mut interval = tokio::time::interval(scheduler.config().interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            info!(
                chains = scheduler.config().chains.len(),
                interval_secs = scheduler.config().interval.as_secs(),
                "purchase cron started"
            );
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let report = scheduler.tick().await;
                        info!(chains = report.outcomes.len(), attempts = report.attempts(), "tick done");
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("shutting down");
                        return Ok(());
                    }
                }
            }
        }
        Command::StartNext { chain } => {
            let ledger = connect(&config, deployments.as_ref(), &chain)?;
            let receipt = RoundLifecycleDriver::new(ledger.as_ref(), &clock)
                .start_next_round()
                .await?;
            println!("{}", receipt.signature);
        }
        Command::RequestDraw { chain, round_id } => {
            let ledger = connect(&config, deployments.as_ref(), &chain)?;
            let receipt = RoundLifecycleDriver::new(ledger.as_ref(), &clock)
                .request_draw(round_id)
                .await?;
            println!("{}", receipt.signature);
        }
        Command::Draw {
            chain,
            round_id,
            batch,
        } => {
            let ledger = connect(&config, deployments.as_ref(), &chain)?;
            let receipt = RoundLifecycleDriver::new(ledger.as_ref(), &clock)
                .draw_winners(round_id, batch)
                .await?;
            println!("{}", receipt.signature);
        }
        Command::Finalize { chain, round_id } => {
            let ledger = connect(&config, deployments.as_ref(), &chain)?;
            let receipt = RoundLifecycleDriver::new(ledger.as_ref(), &clock)
                .finalize_round(round_id)
                .await?;
            println!("{}", receipt.signature);
        }
        Command::Prizes {
            chain,
            owner,
            round_id,
        } => {
            let owner = Pubkey::from_str(owner.trim()).context("--owner")?;
            let ledger = connect(&config, deployments.as_ref(), &chain)?;
            let prizes = claimable_prizes(ledger.as_ref(), &owner, round_id).await?;
            if prizes.is_empty() {
                println!("no unclaimed prizes for {owner}");
            }
            for p in prizes {
                let asset = p
                    .asset_mint
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "SOL".to_string());
                let amount = match p.asset_mint {
                    None => format_sol(p.amount),
                    Some(_) => p.amount.to_string(),
                };
                println!("round {} prize {} {:?} {} {}", p.round_id, p.index, p.kind, asset, amount);
            }
        }
    }

    Ok(())
}
