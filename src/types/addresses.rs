//! Per-network contract addresses

use alloy::primitives::{Address, address};

// Ethereum mainnet, also used by the fork networks
pub const WETH_MAINNET: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
pub const DAI_MAINNET: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");
pub const UNISWAP_V2_ROUTER_MAINNET: Address = address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D");
pub const SUSHISWAP_ROUTER_MAINNET: Address = address!("d9e1cE17f2641f24aE83637ab66a2cca9C378B9F");
pub const AAVE_ADDRESSES_PROVIDER_MAINNET: Address = address!("B53C1a33016B2DC2fF3653530bfF1848a515c8c5");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkAddresses {
    pub weth: Address,
    pub dai: Address,
    pub uniswap_router: Address,
    pub sushiswap_router: Address,
    pub lending_pool_provider: Address,
}

impl NetworkAddresses {
    pub fn builtin(network: &str) -> Option<Self> {
        match network {
            "mainnet" | "mainnet-fork" | "mainnet-fork-dev" => Some(Self {
                weth: WETH_MAINNET,
                dai: DAI_MAINNET,
                uniswap_router: UNISWAP_V2_ROUTER_MAINNET,
                sushiswap_router: SUSHISWAP_ROUTER_MAINNET,
                lending_pool_provider: AAVE_ADDRESSES_PROVIDER_MAINNET,
            }),
            _ => None,
        }
    }
}
