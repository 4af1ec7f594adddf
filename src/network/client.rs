//! Narrow interface to one blockchain node, plus the alloy-backed implementation

use alloy::{
    eips::eip2718::Encodable2718,
    network::{EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes, TxHash, U256},
    providers::{Provider, ProviderBuilder},
    rpc::types::eth::TransactionRequest,
    transports::{RpcError, TransportError},
};
use std::sync::Arc;
use tracing::debug;
use crate::{
    errors::{BotError, BotResult},
    network::pool::Endpoint,
    types::{Account, IntentTarget, ReceiptSummary, TransactionIntent},
    ConcreteProvider,
};

/// The RPC calls the orchestrator makes against a single node.
///
/// Failures are `BotError::Rpc` naming the endpoint and the call, except that `send`
/// reports a node's outright refusal as `BotError::NodeRejected`.
#[allow(async_fn_in_trait)]
pub trait ChainClient: Clone {
    fn endpoint(&self) -> &str;

    async fn block_number(&self) -> BotResult<u64>;

    async fn balance(&self, address: Address) -> BotResult<U256>;

    /// Node-suggested gas price in wei.
    async fn gas_price(&self) -> BotResult<u128>;

    /// Accounts managed by the node (local and fork networks only).
    async fn accounts(&self) -> BotResult<Vec<Address>>;

    async fn call(&self, to: Address, data: Bytes) -> BotResult<Bytes>;

    async fn send(&self, intent: &TransactionIntent) -> BotResult<TxHash>;

    async fn receipt(&self, tx_hash: TxHash) -> BotResult<Option<ReceiptSummary>>;

    /// `evm_snapshot`; returns the node's snapshot id.
    async fn snapshot(&self) -> BotResult<String>;

    /// `evm_revert`; `false` when the node no longer knows the id.
    async fn revert(&self, snapshot_id: &str) -> BotResult<bool>;
}

/// Opens a client for an endpoint handed out by the pool.
pub trait Connector {
    type Client: ChainClient;

    fn connect(&self, endpoint: &Endpoint) -> BotResult<Self::Client>;
}

#[derive(Clone)]
pub struct AlloyClient {
    endpoint: String,
    provider: Arc<ConcreteProvider>,
    wallet: Option<EthereumWallet>,
}

impl AlloyClient {
    pub fn new(endpoint: &Endpoint, wallet: Option<EthereumWallet>) -> Self {
        let provider: Arc<ConcreteProvider> = Arc::new(
            ProviderBuilder::new()
                .on_http(endpoint.url.clone())
                .boxed()
        );
        Self {
            endpoint: endpoint.to_string(),
            provider,
            wallet,
        }
    }

    fn build_request(intent: &TransactionIntent) -> TransactionRequest {
        let input = intent.input.clone();
        let tx = TransactionRequest::default()
            .with_from(intent.sender)
            .with_value(intent.value)
            .with_gas_limit(intent.gas_limit)
            .with_gas_price(intent.gas_price);

        match intent.target {
            IntentTarget::Contract(address) => tx.with_to(address).with_input(input),
            IntentTarget::Create => tx.with_deploy_code(input),
        }
    }

    /// A JSON-RPC error response means the node refused the transaction; anything else is transport.
    fn submission_error(&self, operation: &'static str, method: &str, error: TransportError) -> BotError {
        match error {
            RpcError::ErrorResp(payload) => BotError::NodeRejected {
                endpoint: self.endpoint.clone(),
                method: method.to_string(),
                reason: payload.to_string(),
            },
            other => BotError::rpc(&self.endpoint, operation, other),
        }
    }

    async fn send_signed(&self, wallet: &EthereumWallet, tx: TransactionRequest, method: &str) -> BotResult<TxHash> {
        let from = tx.from.unwrap_or_default();
        let nonce = self.provider.get_transaction_count(from).await
            .map_err(|e| BotError::rpc(&self.endpoint, "eth_getTransactionCount", e))?;
        let chain_id = self.provider.get_chain_id().await
            .map_err(|e| BotError::rpc(&self.endpoint, "eth_chainId", e))?;

        let envelope = tx
            .with_nonce(nonce)
            .with_chain_id(chain_id)
            .build(wallet)
            .await
            .map_err(|e| BotError::rpc(&self.endpoint, "sign_transaction", anyhow::anyhow!("{}", e)))?;

        let pending = self.provider.send_raw_transaction(&envelope.encoded_2718()).await
            .map_err(|e| self.submission_error("eth_sendRawTransaction", method, e))?;
        Ok(*pending.tx_hash())
    }
}

impl ChainClient for AlloyClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn block_number(&self) -> BotResult<u64> {
        self.provider.get_block_number().await
            .map_err(|e| BotError::rpc(&self.endpoint, "eth_blockNumber", e))
    }

    async fn balance(&self, address: Address) -> BotResult<U256> {
        self.provider.get_balance(address).await
            .map_err(|e| BotError::rpc(&self.endpoint, "eth_getBalance", e))
    }

    async fn gas_price(&self) -> BotResult<u128> {
        self.provider.get_gas_price().await
            .map_err(|e| BotError::rpc(&self.endpoint, "eth_gasPrice", e))
    }

    async fn accounts(&self) -> BotResult<Vec<Address>> {
        self.provider.get_accounts().await
            .map_err(|e| BotError::rpc(&self.endpoint, "eth_accounts", e))
    }

    async fn call(&self, to: Address, data: Bytes) -> BotResult<Bytes> {
        let tx = TransactionRequest::default().with_to(to).with_input(data);
        self.provider.call(&tx).await
            .map_err(|e| BotError::rpc(&self.endpoint, "eth_call", e))
    }

    async fn send(&self, intent: &TransactionIntent) -> BotResult<TxHash> {
        let tx = Self::build_request(intent);
        debug!(endpoint = %self.endpoint, method = %intent.method, "Sending transaction");

        match &self.wallet {
            Some(wallet) => self.send_signed(wallet, tx, &intent.method).await,
            None => {
                let pending = self.provider.send_transaction(tx).await
                    .map_err(|e| self.submission_error("eth_sendTransaction", &intent.method, e))?;
                Ok(*pending.tx_hash())
            }
        }
    }

    async fn receipt(&self, tx_hash: TxHash) -> BotResult<Option<ReceiptSummary>> {
        let receipt = self.provider.get_transaction_receipt(tx_hash).await
            .map_err(|e| BotError::rpc(&self.endpoint, "eth_getTransactionReceipt", e))?;

        Ok(receipt.map(|r| ReceiptSummary {
            block_number: r.block_number,
            gas_used: r.gas_used as u64,
            success: r.status(),
            contract_address: r.contract_address,
        }))
    }

    async fn snapshot(&self) -> BotResult<String> {
        self.provider
            .raw_request::<_, String>("evm_snapshot".into(), Vec::<String>::new())
            .await
            .map_err(|e| BotError::rpc(&self.endpoint, "evm_snapshot", e))
    }

    async fn revert(&self, snapshot_id: &str) -> BotResult<bool> {
        self.provider
            .raw_request::<_, bool>("evm_revert".into(), vec![snapshot_id.to_string()])
            .await
            .map_err(|e| BotError::rpc(&self.endpoint, "evm_revert", e))
    }
}

/// Connects to pool endpoints, signing locally when the account carries a key.
#[derive(Clone, Default)]
pub struct AlloyConnector {
    wallet: Option<EthereumWallet>,
}

impl AlloyConnector {
    pub fn new(account: Option<&Account>) -> Self {
        let wallet = account
            .and_then(|a| a.signer())
            .map(|signer| EthereumWallet::from(signer.clone()));
        Self { wallet }
    }
}

impl Connector for AlloyConnector {
    type Client = AlloyClient;

    fn connect(&self, endpoint: &Endpoint) -> BotResult<AlloyClient> {
        Ok(AlloyClient::new(endpoint, self.wallet.clone()))
    }
}
