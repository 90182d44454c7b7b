//! Compile-time ABI definitions for the contracts the engine reads.
//!
//! Only view functions are declared; the engine never builds transactions.

use alloy::sol;

/// Ethereum mainnet defaults used when no override is configured.
pub mod addresses {
    use alloy::primitives::Address;

    /// Uniswap V2 Factory
    pub const UNISWAP_V2_FACTORY: Address =
        alloy::primitives::address!("5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f");

    /// Uniswap V2 Router02
    pub const UNISWAP_V2_ROUTER: Address =
        alloy::primitives::address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D");

    /// Wrapped Ether (WETH)
    pub const WETH: Address =
        alloy::primitives::address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
}

sol! {
    interface IUniswapV2Factory {
        /// Zero address when no pair exists.
        function getPair(address tokenA, address tokenB) external view returns (address pair);
    }

    interface IUniswapV2Pair {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function token0() external view returns (address);
        function token1() external view returns (address);
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
    }

    interface IUniswapV2Router02 {
        /// `amounts[amounts.length - 1]` is the output of the last hop.
        function getAmountsOut(uint256 amountIn, address[] calldata path) external view returns (uint256[] memory amounts);
    }

    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
    }
}
