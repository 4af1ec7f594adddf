//! Contract interfaces and the intents making up the flashloan workflow

use alloy::{
    primitives::{Address, Bytes, U256},
    sol,
    sol_types::{SolCall, SolValue},
};
use anyhow::{Context, Result};
use crate::types::{IntentTarget, NetworkAddresses, TransactionIntent};

sol! {
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
    }

    interface IWETH {
        function deposit() external payable;
    }

    interface IFlashLoanArbitrage {
        function deposit(uint256 amount) external;
        function flashloan(address asset, uint256 amount) external;
        function getERC20Balance(address token) external view returns (uint256);
    }
}

pub const APPROVE: &str = <IERC20::approveCall as SolCall>::SIGNATURE;
pub const WETH_WRAP: &str = <IWETH::depositCall as SolCall>::SIGNATURE;
pub const CONTRACT_DEPOSIT: &str = <IFlashLoanArbitrage::depositCall as SolCall>::SIGNATURE;
pub const FLASHLOAN: &str = <IFlashLoanArbitrage::flashloanCall as SolCall>::SIGNATURE;
pub const CONSTRUCTOR: &str = "constructor(address,address,address,address,address)";

/// Calldata for the contract's `getERC20Balance(token)` view.
pub fn contract_balance_call(token: Address) -> Bytes {
    IFlashLoanArbitrage::getERC20BalanceCall { token }.abi_encode().into()
}

pub fn decode_contract_balance(raw: &[u8]) -> Result<U256> {
    let decoded = IFlashLoanArbitrage::getERC20BalanceCall::abi_decode_returns(raw, true)
        .context("getERC20Balance returned malformed data")?;
    Ok(decoded._0)
}

/// Fee settings shared by every intent a workflow builds.
#[derive(Debug, Clone, Copy)]
pub struct IntentContext {
    pub sender: Address,
    pub gas_price: u128,
}

impl IntentContext {
    fn call<C: SolCall>(&self, target: Address, call: C, gas_limit: u64) -> TransactionIntent {
        TransactionIntent {
            target: IntentTarget::Contract(target),
            method: C::SIGNATURE.to_string(),
            input: call.abi_encode().into(),
            sender: self.sender,
            value: U256::ZERO,
            gas_limit,
            gas_price: self.gas_price,
        }
    }

    /// Wraps native ETH into WETH.
    pub fn wrap_eth(&self, weth: Address, amount: U256, gas_limit: u64) -> TransactionIntent {
        let mut intent = self.call(weth, IWETH::depositCall {}, gas_limit);
        intent.value = amount;
        intent
    }

    pub fn approve(&self, token: Address, spender: Address, amount: U256, gas_limit: u64) -> TransactionIntent {
        self.call(token, IERC20::approveCall { spender, amount }, gas_limit)
    }

    pub fn deposit(&self, contract: Address, amount: U256, gas_limit: u64) -> TransactionIntent {
        self.call(contract, IFlashLoanArbitrage::depositCall { amount }, gas_limit)
    }

    pub fn flashloan(&self, contract: Address, asset: Address, amount: U256, gas_limit: u64) -> TransactionIntent {
        self.call(contract, IFlashLoanArbitrage::flashloanCall { asset, amount }, gas_limit)
    }

    /// Contract creation: init code followed by the constructor arguments
    /// (lending pool provider, Uniswap router, Sushiswap router, WETH, DAI).
    pub fn deploy(&self, init_code: Bytes, addresses: &NetworkAddresses, gas_limit: u64) -> TransactionIntent {
        let constructor_args = (
            addresses.lending_pool_provider,
            addresses.uniswap_router,
            addresses.sushiswap_router,
            addresses.weth,
            addresses.dai,
        )
            .abi_encode_params();

        let mut input = init_code.to_vec();
        input.extend(constructor_args);

        TransactionIntent {
            target: IntentTarget::Create,
            method: CONSTRUCTOR.to_string(),
            input: input.into(),
            sender: self.sender,
            value: U256::ZERO,
            gas_limit,
            gas_price: self.gas_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn known_selectors() {
        assert_eq!(IERC20::approveCall::SELECTOR, [0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(IWETH::depositCall::SELECTOR, [0xd0, 0xe3, 0x0d, 0xb0]);
        assert_eq!(APPROVE, "approve(address,uint256)");
        assert_eq!(FLASHLOAN, "flashloan(address,uint256)");
    }

    #[test]
    fn approve_round_trips_through_the_interface() {
        let ctx = IntentContext { sender: Address::ZERO, gas_price: 1 };
        let spender = address!("1111111111111111111111111111111111111111");
        let intent = ctx.approve(Address::ZERO, spender, U256::from(5u64), 100_000);

        let decoded = IERC20::approveCall::abi_decode(&intent.input, true).unwrap();
        assert_eq!(decoded.spender, spender);
        assert_eq!(decoded.amount, U256::from(5u64));
        assert_eq!(intent.method_name(), "approve");
    }

    #[test]
    fn deploy_appends_constructor_args() {
        let ctx = IntentContext { sender: Address::ZERO, gas_price: 1 };
        let addresses = NetworkAddresses::builtin("mainnet").unwrap();
        let intent = ctx.deploy(Bytes::from(vec![0x60, 0x80]), &addresses, 6_000_000);

        assert_eq!(intent.input.len(), 2 + 5 * 32);
        assert_eq!(&intent.input[..2], &[0x60, 0x80]);
        let args = <(Address, Address, Address, Address, Address)>::abi_decode_params(&intent.input[2..], true).unwrap();
        assert_eq!(args.0, addresses.lending_pool_provider);
        assert_eq!(args.4, addresses.dai);
        assert_eq!(intent.target_contract(), None);
    }

    #[test]
    fn wrap_carries_value() {
        let ctx = IntentContext { sender: Address::ZERO, gas_price: 1 };
        let intent = ctx.wrap_eth(Address::ZERO, U256::from(10u64), 60_000);
        assert_eq!(intent.value, U256::from(10u64));
        assert_eq!(intent.input.len(), 4);
    }

    #[test]
    fn decodes_contract_balance() {
        let raw = U256::from(7u64).abi_encode();
        assert_eq!(decode_contract_balance(&raw).unwrap(), U256::from(7u64));
        assert!(decode_contract_balance(&[0u8; 3]).is_err());
    }
}
