// Scriptable in-memory node shared by the integration tests.
#![allow(dead_code)]

use alloy::primitives::{keccak256, Address, Bytes, TxHash, U256};
use flashloan_orchestrator::{
    errors::{BotError, BotResult},
    network::{ChainClient, Connector, Endpoint, EndpointPool},
    types::{IntentTarget, ReceiptSummary, TransactionIntent},
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

pub const DEPLOYED_CONTRACT: Address = Address::new([0xc0; 20]);

#[derive(Debug, Clone)]
pub struct SentTransaction {
    pub endpoint: String,
    pub method: String,
    pub tx_hash: TxHash,
}

#[derive(Debug, Default)]
pub struct NodeState {
    /// Endpoint labels that fail every call with a transport error.
    pub unreachable: HashSet<String>,
    /// Endpoint labels whose node answers `send` with a JSON-RPC refusal.
    pub rejecting: HashSet<String>,
    /// Method signatures mined with a failed status.
    pub reverting: HashSet<String>,
    /// Method signatures that never get a receipt.
    pub never_mined: HashSet<String>,
    pub balance: U256,
    /// `None` makes `eth_gasPrice` fail.
    pub gas_price: Option<u128>,
    pub accounts: Vec<Address>,
    pub head: u64,
    /// Every `block_number` call mines one block.
    pub auto_mine: bool,
    pub contract_balance: U256,
    pub snapshots: Vec<String>,
    pub connects: u32,
    pub send_attempts: u32,
    pub sent: Vec<SentTransaction>,
    /// Number of sent transactions at each `eth_call`.
    pub balance_reads_at: Vec<usize>,
    /// Receipts by hash: (method, inclusion block, success).
    pub mined: HashMap<TxHash, (String, u64, bool)>,
}

impl NodeState {
    pub fn sent_methods(&self) -> Vec<String> {
        self.sent.iter().map(|s| s.method.clone()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct MockClient {
    endpoint: String,
    state: Arc<Mutex<NodeState>>,
}

impl MockClient {
    fn ensure_reachable(&self, state: &NodeState, operation: &'static str) -> BotResult<()> {
        if state.unreachable.contains(&self.endpoint) {
            return Err(BotError::rpc(&self.endpoint, operation, anyhow::anyhow!("connection refused")));
        }
        Ok(())
    }
}

impl ChainClient for MockClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn block_number(&self) -> BotResult<u64> {
        let mut state = self.state.lock().unwrap();
        self.ensure_reachable(&state, "eth_blockNumber")?;
        if state.auto_mine {
            state.head += 1;
        }
        Ok(state.head)
    }

    async fn balance(&self, _address: Address) -> BotResult<U256> {
        let state = self.state.lock().unwrap();
        self.ensure_reachable(&state, "eth_getBalance")?;
        Ok(state.balance)
    }

    async fn gas_price(&self) -> BotResult<u128> {
        let state = self.state.lock().unwrap();
        self.ensure_reachable(&state, "eth_gasPrice")?;
        state
            .gas_price
            .ok_or_else(|| BotError::rpc(&self.endpoint, "eth_gasPrice", anyhow::anyhow!("method not found")))
    }

    async fn accounts(&self) -> BotResult<Vec<Address>> {
        let state = self.state.lock().unwrap();
        self.ensure_reachable(&state, "eth_accounts")?;
        Ok(state.accounts.clone())
    }

    async fn call(&self, _to: Address, _data: Bytes) -> BotResult<Bytes> {
        let mut state = self.state.lock().unwrap();
        self.ensure_reachable(&state, "eth_call")?;
        let sent = state.sent.len();
        state.balance_reads_at.push(sent);
        Ok(Bytes::from(state.contract_balance.to_be_bytes::<32>().to_vec()))
    }

    async fn send(&self, intent: &TransactionIntent) -> BotResult<TxHash> {
        let mut state = self.state.lock().unwrap();
        state.send_attempts += 1;
        self.ensure_reachable(&state, "eth_sendTransaction")?;
        if state.rejecting.contains(&self.endpoint) {
            return Err(BotError::NodeRejected {
                endpoint: self.endpoint.clone(),
                method: intent.method.clone(),
                reason: "insufficient funds for gas * price + value".to_string(),
            });
        }

        let nonce = state.sent.len() as u64;
        let tx_hash = keccak256([intent.method.as_bytes(), nonce.to_be_bytes().as_slice()].concat());
        let success = !state.reverting.contains(&intent.method);
        if !state.never_mined.contains(&intent.method) {
            let block = state.head;
            let method = match intent.target {
                IntentTarget::Create => "create".to_string(),
                IntentTarget::Contract(_) => intent.method.clone(),
            };
            state.mined.insert(tx_hash, (method, block, success));
        }
        state.sent.push(SentTransaction {
            endpoint: self.endpoint.clone(),
            method: intent.method.clone(),
            tx_hash,
        });
        Ok(tx_hash)
    }

    async fn receipt(&self, tx_hash: TxHash) -> BotResult<Option<ReceiptSummary>> {
        let state = self.state.lock().unwrap();
        self.ensure_reachable(&state, "eth_getTransactionReceipt")?;
        Ok(state.mined.get(&tx_hash).map(|(method, block, success)| ReceiptSummary {
            block_number: Some(*block),
            gas_used: 21_000,
            success: *success,
            contract_address: (method == "create").then_some(DEPLOYED_CONTRACT),
        }))
    }

    async fn snapshot(&self) -> BotResult<String> {
        let mut state = self.state.lock().unwrap();
        self.ensure_reachable(&state, "evm_snapshot")?;
        let id = format!("0x{:x}", state.snapshots.len() + 1);
        state.snapshots.push(id.clone());
        Ok(id)
    }

    async fn revert(&self, snapshot_id: &str) -> BotResult<bool> {
        let mut state = self.state.lock().unwrap();
        self.ensure_reachable(&state, "evm_revert")?;
        // Reverting consumes the snapshot and every later one
        match state.snapshots.iter().position(|id| id == snapshot_id) {
            Some(index) => {
                state.snapshots.truncate(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Clone)]
pub struct MockConnector {
    pub state: Arc<Mutex<NodeState>>,
}

impl MockConnector {
    pub fn new(state: NodeState) -> Self {
        Self { state: Arc::new(Mutex::new(state)) }
    }

    pub fn client(&self, label: &str) -> MockClient {
        MockClient { endpoint: label.to_string(), state: self.state.clone() }
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut NodeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }
}

impl Connector for MockConnector {
    type Client = MockClient;

    fn connect(&self, endpoint: &Endpoint) -> BotResult<MockClient> {
        self.state.lock().unwrap().connects += 1;
        Ok(self.client(&endpoint.label))
    }
}

/// Pool of `n` endpoints labelled `rpc-0` .. `rpc-{n-1}`.
pub fn pool(n: usize) -> Arc<EndpointPool> {
    let endpoints = (0..n)
        .map(|i| Endpoint::parse(format!("rpc-{}", i), &format!("http://node{}.test:8545", i)).unwrap())
        .collect();
    Arc::new(EndpointPool::new(endpoints).unwrap())
}

pub fn eth(amount: u64) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(18))
}

pub fn temp_dir(prefix: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("{}-{}", prefix, uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
