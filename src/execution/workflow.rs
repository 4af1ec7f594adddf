//! Flashloan workflow: size the loan, then approve → deposit → balance read → flashloan

use alloy::{
    primitives::{Address, Bytes, U256},
    signers::local::PrivateKeySigner,
};
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};
use crate::{
    config::Config,
    errors::{BotError, BotResult, SizingError},
    execution::{
        engine::{ExecutionConfig, TransactionExecutor},
        intents::{contract_balance_call, decode_contract_balance, IntentContext},
    },
    network::{with_rotation, ChainClient, Connector, EndpointPool, GasPriceOracle, RetryConfig},
    sizing::size_trade,
    storage::{record_deployment, save_transaction_outcome},
    types::{
        Account, BufferPolicy, GasPrice, HaltReason, NetworkAddresses, NetworkKind,
        SequenceReport, TradeSize, TradeSizeRequest, TransactionIntent, TransactionState,
    },
    utils::{eth_to_wei, wei_to_eth},
};

#[derive(Debug, Clone, Copy)]
pub struct GasLimits {
    pub flashloan: u64,
    pub deploy: u64,
    pub approve: u64,
    pub deposit: u64,
    pub wrap: u64,
}

/// Already-resolved inputs of one workflow run.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub network_kind: NetworkKind,
    pub addresses: NetworkAddresses,
    pub contract: Option<Address>,
    pub init_code: Option<Bytes>,
    pub deposit_amount_eth: Decimal,
    pub wrap_amount_eth: Decimal,
    pub gas_limits: GasLimits,
    pub buffer: BufferPolicy,
    pub safety_fraction: Decimal,
    pub deployment_log: PathBuf,
    /// `None` disables the outcome journal.
    pub executions_dir: Option<PathBuf>,
}

impl WorkflowSettings {
    pub fn from_config(config: &Config) -> BotResult<Self> {
        let contract = config.flashloan_contract_address()?;
        let init_code = match (&contract, &config.bytecode_path) {
            (None, Some(path)) => Some(load_init_code(path)?),
            _ => None,
        };

        Ok(Self {
            network_kind: config.network_kind(),
            addresses: config.network_addresses()?,
            contract,
            init_code,
            deposit_amount_eth: config.deposit_amount_eth,
            wrap_amount_eth: config.wrap_amount_eth,
            gas_limits: GasLimits {
                flashloan: config.flashloan_gas_limit,
                deploy: config.deploy_gas_limit,
                approve: config.approve_gas_limit,
                deposit: config.deposit_gas_limit,
                wrap: config.wrap_gas_limit,
            },
            buffer: config.sizing_buffer,
            safety_fraction: config.safety_fraction,
            deployment_log: config.deployment_log.clone(),
            executions_dir: Some(config.executions_dir.clone()),
        })
    }
}

fn load_init_code(path: &Path) -> BotResult<Bytes> {
    let raw = fs::read_to_string(path).map_err(|e| BotError::config(format!(
        "Cannot read contract bytecode {}: {}", path.display(), e
    )))?;
    Bytes::from_str(raw.trim()).map_err(|e| BotError::DataParsing {
        context: format!("contract bytecode in {}", path.display()),
        source: anyhow::anyhow!("{}", e),
    })
}

/// Node-managed account on test networks, key-backed signer on live ones.
pub async fn resolve_account<C: ChainClient>(
    kind: NetworkKind,
    private_key: Option<&str>,
    account_index: usize,
    client: &C,
) -> BotResult<Account> {
    if kind.is_test_node() {
        let accounts = client.accounts().await?;
        let address = accounts.get(account_index).copied().ok_or_else(|| BotError::config(format!(
            "Node {} exposes {} accounts, index {} requested",
            client.endpoint(), accounts.len(), account_index
        )))?;
        return Ok(Account::NodeManaged { address });
    }

    let key = private_key.ok_or_else(|| BotError::config("PRIVATE_KEY is required on live networks"))?;
    let signer = PrivateKeySigner::from_str(key.trim_start_matches("0x"))
        .map_err(|e| BotError::config(format!("Invalid PRIVATE_KEY: {}", e)))?;
    Ok(Account::LocalSigner { signer })
}

#[derive(Debug, Clone)]
pub enum WorkflowStatus {
    Completed,
    /// Balance too small after gas and buffer; nothing was submitted for the loan.
    SizingRejected(SizingError),
    Halted(HaltReason),
}

#[derive(Debug, Clone)]
pub struct WorkflowReport {
    pub run_id: String,
    pub account: Address,
    pub contract: Option<Address>,
    pub gas_price: GasPrice,
    pub balance_eth: Decimal,
    pub sizing: Option<TradeSize>,
    pub setup: Vec<SequenceReport>,
    pub sequence: Option<SequenceReport>,
    pub status: WorkflowStatus,
}

pub struct FlashloanWorkflow<K: Connector + Clone> {
    pool: Arc<EndpointPool>,
    connector: K,
    oracle: GasPriceOracle,
    executor: TransactionExecutor<K>,
    settings: WorkflowSettings,
    query_retry: RetryConfig,
}

impl<K: Connector + Clone> FlashloanWorkflow<K> {
    pub fn new(
        pool: Arc<EndpointPool>,
        connector: K,
        oracle: GasPriceOracle,
        execution: ExecutionConfig,
        settings: WorkflowSettings,
    ) -> Self {
        let query_retry = execution.submission.clone();
        let executor = TransactionExecutor::new(pool.clone(), connector.clone(), execution);
        Self {
            pool,
            connector,
            oracle,
            executor,
            settings,
            query_retry,
        }
    }

    /// Fresh balance (never cached) plus the client that answered.
    async fn balance_of(&self, address: Address) -> BotResult<(K::Client, Decimal)> {
        let (client, wei) = with_rotation(
            &self.pool,
            &self.connector,
            &self.query_retry,
            "balance query",
            |client| async move { client.balance(address).await },
        )
        .await?;

        let eth = wei_to_eth(wei).map_err(|e| BotError::DataParsing {
            context: "wallet balance".to_string(),
            source: e,
        })?;
        Ok((client, eth))
    }

    pub async fn run(&self, account: &Account) -> BotResult<WorkflowReport> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let sender = account.address();
        info!(run_id = %run_id, account = %sender, "🏁 Starting flashloan workflow");

        let (client, balance_eth) = self.balance_of(sender).await?;
        let gas_price = self.oracle.current_price(&client).await;
        info!("💰 Wallet balance: {} ETH", balance_eth);

        let mut report = WorkflowReport {
            run_id,
            account: sender,
            contract: self.settings.contract,
            gas_price,
            balance_eth,
            sizing: None,
            setup: Vec::new(),
            sequence: None,
            status: WorkflowStatus::Completed,
        };

        let ctx = IntentContext { sender, gas_price: gas_price.wei };

        if self.settings.network_kind == NetworkKind::Forked && self.settings.wrap_amount_eth > Decimal::ZERO {
            let amount = self.to_wei(self.settings.wrap_amount_eth, "wrap amount")?;
            info!("🔄 Wrapping {} ETH into WETH", self.settings.wrap_amount_eth);
            let wrap = ctx.wrap_eth(self.settings.addresses.weth, amount, self.settings.gas_limits.wrap);
            if self.run_setup(&mut report, &[wrap]).await {
                return Ok(report);
            }
        }

        let contract = match self.settings.contract {
            Some(contract) => contract,
            None => match self.deploy(&ctx, &mut report).await? {
                Some(contract) => contract,
                None => return Ok(report),
            },
        };
        report.contract = Some(contract);

        // Size against a fresh balance after setup spent gas
        let (client, balance_eth) = self.balance_of(sender).await?;
        let gas_price = self.oracle.current_price(&client).await;
        report.balance_eth = balance_eth;
        report.gas_price = gas_price;

        let request = TradeSizeRequest {
            balance: balance_eth,
            gas_price_wei: gas_price.wei,
            gas_limit: self.settings.gas_limits.flashloan,
            buffer: self.settings.buffer,
            safety_fraction: self.settings.safety_fraction,
        };
        let size = match size_trade(&request) {
            Ok(size) => size,
            Err(e) => {
                warn!("🛑 Flashloan not sized: {}", e);
                report.status = WorkflowStatus::SizingRejected(e);
                return Ok(report);
            }
        };
        info!(
            "📐 Flashloan amount: {} WETH (usable {} ETH, gas {} ETH, buffer {} ETH)",
            size.amount, size.usable, size.gas_cost, size.buffer
        );
        report.sizing = Some(size.clone());

        let ctx = IntentContext { sender, gas_price: gas_price.wei };
        let deposit = self.to_wei(self.settings.deposit_amount_eth, "deposit amount")?;
        let loan = self.to_wei(size.amount, "flashloan amount")?;
        let weth = self.settings.addresses.weth;
        let limits = self.settings.gas_limits;

        let funding = [
            ctx.approve(weth, contract, deposit, limits.approve),
            ctx.deposit(contract, deposit, limits.deposit),
        ];
        let mut sequence = self.executor.execute_sequence(&funding).await;

        if sequence.completed() {
            self.log_contract_balance(&client, contract, weth).await;
            let loan = [ctx.flashloan(contract, weth, loan, limits.flashloan)];
            sequence.append(self.executor.execute_sequence(&loan).await);
        }
        self.journal(&report.run_id, &sequence);

        if let Some(halted) = &sequence.halted {
            report.status = WorkflowStatus::Halted(halted.clone());
        }
        report.sequence = Some(sequence);
        Ok(report)
    }

    /// Runs setup intents; returns true when the workflow has to stop.
    async fn run_setup(&self, report: &mut WorkflowReport, intents: &[TransactionIntent]) -> bool {
        let sequence = self.executor.execute_sequence(intents).await;
        self.journal(&report.run_id, &sequence);
        let halted = sequence.halted.clone();
        report.setup.push(sequence);
        match halted {
            Some(halted) => {
                error!("Setup step failed, aborting run: {:?}", halted);
                report.status = WorkflowStatus::Halted(halted);
                true
            }
            None => false,
        }
    }

    async fn deploy(&self, ctx: &IntentContext, report: &mut WorkflowReport) -> BotResult<Option<Address>> {
        let init_code = self.settings.init_code.clone().ok_or_else(|| BotError::config(
            "No FLASHLOAN_CONTRACT configured and no FLASHLOAN_BYTECODE_PATH to deploy from",
        ))?;

        info!("📦 Deploying flashloan arbitrage contract");
        let intent = ctx.deploy(init_code, &self.settings.addresses, self.settings.gas_limits.deploy);
        if self.run_setup(report, &[intent]).await {
            return Ok(None);
        }

        let deployed = report
            .setup
            .last()
            .and_then(|s| s.outcomes.last())
            .filter(|o| o.state == TransactionState::Confirmed)
            .and_then(|o| o.receipt_summary.as_ref().and_then(|r| r.contract_address).map(|a| (o.transaction_id, a)));

        let Some((tx_hash, contract)) = deployed else {
            return Err(BotError::DataParsing {
                context: "deployment receipt".to_string(),
                source: anyhow::anyhow!("receipt carries no contract address"),
            });
        };

        info!(tx_hash = %tx_hash, "✅ Deployed contract at {}", contract);
        if let Err(e) = record_deployment(&self.settings.deployment_log, tx_hash, contract) {
            error!("Failed to record deployment: {}", e);
        }
        Ok(Some(contract))
    }

    async fn log_contract_balance(&self, client: &K::Client, contract: Address, token: Address) {
        let raw = match client.call(contract, contract_balance_call(token)).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Contract balance query failed: {}", e);
                return;
            }
        };
        match decode_contract_balance(&raw).and_then(wei_to_eth) {
            Ok(eth) => info!("🏦 Contract holds {} WETH", eth),
            Err(e) => warn!("Contract balance unreadable: {}", e),
        }
    }

    fn journal(&self, run_id: &str, sequence: &SequenceReport) {
        let Some(dir) = &self.settings.executions_dir else { return };
        for outcome in &sequence.outcomes {
            if let Err(e) = save_transaction_outcome(dir, run_id, outcome) {
                error!("Failed to save transaction outcome: {}", e);
            }
        }
    }

    fn to_wei(&self, eth: Decimal, what: &str) -> BotResult<U256> {
        eth_to_wei(eth).map_err(|e| BotError::DataParsing {
            context: what.to_string(),
            source: e,
        })
    }
}
