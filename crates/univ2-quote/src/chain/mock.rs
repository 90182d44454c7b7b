//! In-memory Uniswap V2 deployment implementing [`ChainReader`].
//!
//! Calldata is decoded with the same `sol!` types the engine encodes with, so
//! tests exercise the real ABI round trip. Every call is recorded.

use alloy::primitives::{keccak256, Address, Bytes, U256};
use alloy::sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use super::ChainReader;
use crate::abi::{IUniswapV2Factory, IUniswapV2Pair, IUniswapV2Router02, IERC20};
use crate::error::ChainError;

/// State of one fake pair contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockPool {
    pub token0: Address,
    pub token1: Address,
    pub reserve0: U256,
    pub reserve1: U256,
    pub block_timestamp_last: u32,
}

/// A call observed by [`MockChain`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedCall {
    pub to: Address,
    pub selector: [u8; 4],
    /// Addresses passed as arguments (pair lookup tokens, swap path, balance owner).
    pub arguments: Vec<Address>,
}

impl RecordedCall {
    pub fn touches(&self, address: Address) -> bool {
        self.to == address || self.arguments.contains(&address)
    }
}

#[derive(Debug, Default)]
struct MockState {
    pairs: HashMap<(Address, Address), Address>,
    pools: HashMap<Address, MockPool>,
    token_decimals: HashMap<Address, u8>,
    token_balances: HashMap<(Address, Address), U256>,
    native_balances: HashMap<Address, U256>,
    reverting: HashSet<Address>,
    unreachable: HashSet<Address>,
    offline: bool,
    calls: Vec<RecordedCall>,
}

/// Fake node serving one factory, one router, their pairs and ERC-20 tokens.
#[derive(Debug)]
pub struct MockChain {
    factory: Address,
    router: Address,
    state: Mutex<MockState>,
}

fn sorted(a: Address, b: Address) -> (Address, Address) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn revert(reason: &str) -> ChainError {
    ChainError::Rpc {
        code: 3,
        message: format!("execution reverted: {reason}"),
    }
}

/// Uniswap V2 `getAmountOut` with the 0.3% fee, floor division.
fn amount_out(amount_in: U256, reserve_in: U256, reserve_out: U256) -> U256 {
    let amount_in_with_fee = amount_in * U256::from(997u32);
    let numerator = amount_in_with_fee * reserve_out;
    let denominator = reserve_in * U256::from(1000u32) + amount_in_with_fee;
    numerator / denominator
}

impl MockChain {
    pub fn new(factory: Address, router: Address) -> Self {
        Self {
            factory,
            router,
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn factory(&self) -> Address {
        self.factory
    }

    pub fn router(&self) -> Address {
        self.router
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panic in another test thread must not cascade through poisoning.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Deploy a pair for `token_a`/`token_b` holding the given reserves.
    ///
    /// Tokens are stored sorted (token0 < token1) like the real factory, so
    /// the reserves are swapped when `token_a > token_b`.
    pub fn add_pair(
        &self,
        token_a: Address,
        reserve_a: U256,
        token_b: Address,
        reserve_b: U256,
    ) -> Address {
        let (token0, token1) = sorted(token_a, token_b);
        let (reserve0, reserve1) = if token0 == token_a {
            (reserve_a, reserve_b)
        } else {
            (reserve_b, reserve_a)
        };

        let pair = Address::from_word(keccak256([token0.as_slice(), token1.as_slice()].concat()));
        self.insert_pool(
            pair,
            MockPool {
                token0,
                token1,
                reserve0,
                reserve1,
                block_timestamp_last: 1_708_617_600,
            },
        );
        self.lock().pairs.insert((token0, token1), pair);
        pair
    }

    /// Install pair contract state at `pair` without registering it in the factory.
    pub fn insert_pool(&self, pair: Address, pool: MockPool) {
        self.lock().pools.insert(pair, pool);
    }

    /// Make the factory report `pair` for `token_a`/`token_b`.
    pub fn register_pair(&self, token_a: Address, token_b: Address, pair: Address) {
        self.lock().pairs.insert(sorted(token_a, token_b), pair);
    }

    pub fn set_decimals(&self, token: Address, decimals: u8) {
        self.lock().token_decimals.insert(token, decimals);
    }

    pub fn set_balance(&self, token: Address, owner: Address, balance: U256) {
        self.lock().token_balances.insert((token, owner), balance);
    }

    pub fn set_native_balance(&self, owner: Address, balance: U256) {
        self.lock().native_balances.insert(owner, balance);
    }

    /// Any call targeting or mentioning `address` reverts.
    pub fn revert_on(&self, address: Address) {
        self.lock().reverting.insert(address);
    }

    /// Any call targeting or mentioning `address` fails at transport level.
    pub fn unreachable_on(&self, address: Address) {
        self.lock().unreachable.insert(address);
    }

    /// Every call fails at transport level.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn calls_touching(&self, address: Address) -> usize {
        self.lock().calls.iter().filter(|c| c.touches(address)).count()
    }

    fn arguments(selector: [u8; 4], input: &[u8]) -> Vec<Address> {
        match selector {
            IUniswapV2Factory::getPairCall::SELECTOR => {
                IUniswapV2Factory::getPairCall::abi_decode(input, true)
                    .map(|c| vec![c.tokenA, c.tokenB])
                    .unwrap_or_default()
            }
            IUniswapV2Router02::getAmountsOutCall::SELECTOR => {
                IUniswapV2Router02::getAmountsOutCall::abi_decode(input, true)
                    .map(|c| c.path)
                    .unwrap_or_default()
            }
            IERC20::balanceOfCall::SELECTOR => IERC20::balanceOfCall::abi_decode(input, true)
                .map(|c| vec![c.account])
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    fn dispatch(
        &self,
        state: &MockState,
        to: Address,
        selector: [u8; 4],
        input: &[u8],
    ) -> Result<Vec<u8>, ChainError> {
        let malformed = |e: alloy::sol_types::Error| ChainError::Malformed(e.to_string());

        if to == self.factory {
            return match selector {
                IUniswapV2Factory::getPairCall::SELECTOR => {
                    let call =
                        IUniswapV2Factory::getPairCall::abi_decode(input, true).map_err(malformed)?;
                    let pair = state
                        .pairs
                        .get(&sorted(call.tokenA, call.tokenB))
                        .copied()
                        .unwrap_or(Address::ZERO);
                    Ok((pair,).abi_encode_params())
                }
                _ => Err(revert("unknown factory selector")),
            };
        }

        if to == self.router {
            return match selector {
                IUniswapV2Router02::getAmountsOutCall::SELECTOR => {
                    let call = IUniswapV2Router02::getAmountsOutCall::abi_decode(input, true)
                        .map_err(malformed)?;
                    let amounts = Self::amounts_out(state, call.amountIn, &call.path)?;
                    Ok((amounts,).abi_encode_params())
                }
                _ => Err(revert("unknown router selector")),
            };
        }

        if let Some(pool) = state.pools.get(&to) {
            return match selector {
                IUniswapV2Pair::token0Call::SELECTOR => Ok((pool.token0,).abi_encode_params()),
                IUniswapV2Pair::token1Call::SELECTOR => Ok((pool.token1,).abi_encode_params()),
                IUniswapV2Pair::getReservesCall::SELECTOR => Ok((
                    pool.reserve0,
                    pool.reserve1,
                    pool.block_timestamp_last,
                )
                    .abi_encode_params()),
                IUniswapV2Pair::nameCall::SELECTOR => {
                    Ok((String::from("Uniswap V2"),).abi_encode_params())
                }
                IUniswapV2Pair::symbolCall::SELECTOR => {
                    Ok((String::from("UNI-V2"),).abi_encode_params())
                }
                IUniswapV2Pair::decimalsCall::SELECTOR => {
                    Ok(IUniswapV2Pair::decimalsCall::abi_encode_returns(&(18u8,)))
                }
                _ => Err(revert("unknown pair selector")),
            };
        }

        if let Some(decimals) = state.token_decimals.get(&to) {
            return match selector {
                IERC20::decimalsCall::SELECTOR => {
                    Ok(IERC20::decimalsCall::abi_encode_returns(&(*decimals,)))
                }
                IERC20::balanceOfCall::SELECTOR => {
                    let call = IERC20::balanceOfCall::abi_decode(input, true).map_err(malformed)?;
                    let balance = state
                        .token_balances
                        .get(&(to, call.account))
                        .copied()
                        .unwrap_or(U256::ZERO);
                    Ok((balance,).abi_encode_params())
                }
                _ => Err(revert("unknown token selector")),
            };
        }

        // No code at this address: nodes answer with empty return data.
        Ok(Vec::new())
    }

    fn amounts_out(
        state: &MockState,
        amount_in: U256,
        path: &[Address],
    ) -> Result<Vec<U256>, ChainError> {
        if path.len() < 2 {
            return Err(revert("UniswapV2Library: INVALID_PATH"));
        }
        if amount_in.is_zero() {
            return Err(revert("UniswapV2Library: INSUFFICIENT_INPUT_AMOUNT"));
        }

        let mut amounts = vec![amount_in];
        for hop in path.windows(2) {
            let (token_in, token_out) = (hop[0], hop[1]);
            let pool = state
                .pairs
                .get(&sorted(token_in, token_out))
                .and_then(|pair| state.pools.get(pair))
                .ok_or_else(|| revert("pair does not exist"))?;

            let (reserve_in, reserve_out) = if pool.token0 == token_in {
                (pool.reserve0, pool.reserve1)
            } else {
                (pool.reserve1, pool.reserve0)
            };
            if reserve_in.is_zero() || reserve_out.is_zero() {
                return Err(revert("UniswapV2Library: INSUFFICIENT_LIQUIDITY"));
            }

            let last = amounts[amounts.len() - 1];
            amounts.push(amount_out(last, reserve_in, reserve_out));
        }
        Ok(amounts)
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, ChainError> {
        let selector: [u8; 4] = input
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| ChainError::Malformed("calldata shorter than a selector".into()))?;
        let arguments = Self::arguments(selector, &input);

        let mut state = self.lock();
        let call = RecordedCall {
            to,
            selector,
            arguments,
        };

        let offline = state.offline || state.unreachable.iter().any(|a| call.touches(*a));
        let reverting = state.reverting.iter().any(|a| call.touches(*a));
        state.calls.push(call);

        if offline {
            return Err(ChainError::Transport("connection refused".into()));
        }
        if reverting {
            return Err(revert("mock revert"));
        }

        self.dispatch(&state, to, selector, &input).map(Bytes::from)
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError> {
        let state = self.lock();
        if state.offline {
            return Err(ChainError::Transport("connection refused".into()));
        }
        Ok(state.native_balances.get(&owner).copied().unwrap_or(U256::ZERO))
    }

    /// Fails only when the whole node is offline; `unreachable_on` targets
    /// single calls.
    async fn ping(&self) -> Result<(), ChainError> {
        if self.lock().offline {
            return Err(ChainError::Transport("connection refused".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::call_contract;

    #[test]
    fn amount_out_matches_uniswap_v2_semantics() {
        // (1000 * 997 * 10_000) / (10_000 * 1000 + 1000 * 997) = 906 (floor)
        let out = amount_out(U256::from(1000u64), U256::from(10_000u64), U256::from(10_000u64));
        assert_eq!(out, U256::from(906u64));
    }

    #[tokio::test]
    async fn serves_lp_and_token_decimals() {
        let chain = MockChain::new(Address::repeat_byte(0xfa), Address::repeat_byte(0xfb));
        let token = Address::repeat_byte(0x11);
        chain.set_decimals(token, 6);
        let other = Address::repeat_byte(0x22);
        let pair = chain.add_pair(token, U256::from(1u64), other, U256::from(1u64));

        let lp = call_contract(&chain, pair, &IUniswapV2Pair::decimalsCall {})
            .await
            .expect("pair decimals");
        assert_eq!(lp._0, 18);

        let erc20 = call_contract(&chain, token, &IERC20::decimalsCall {})
            .await
            .expect("token decimals");
        assert_eq!(erc20._0, 6);
    }

    #[tokio::test]
    async fn ping_ignores_single_unreachable_targets() {
        let chain = MockChain::new(Address::repeat_byte(0xfa), Address::repeat_byte(0xfb));
        chain.unreachable_on(Address::repeat_byte(0x11));
        assert_eq!(chain.ping().await, Ok(()));

        chain.set_offline(true);
        assert!(matches!(chain.ping().await, Err(ChainError::Transport(_))));
    }

    #[test]
    fn add_pair_stores_tokens_sorted() {
        let chain = MockChain::new(Address::repeat_byte(0xfa), Address::repeat_byte(0xfb));
        let high = Address::repeat_byte(0x22);
        let low = Address::repeat_byte(0x11);
        let pair = chain.add_pair(high, U256::from(5u64), low, U256::from(7u64));

        let state = chain.lock();
        let pool = state.pools.get(&pair).expect("pool installed");
        assert_eq!(pool.token0, low);
        assert_eq!(pool.reserve0, U256::from(7u64));
        assert_eq!(pool.reserve1, U256::from(5u64));
    }
}
