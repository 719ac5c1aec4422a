use alloy::sol;

sol! {
    /// The metadata subset of ERC-20; balances and transfers are never
    /// read here.
    #[sol(rpc)]
    interface IERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
    }
}
