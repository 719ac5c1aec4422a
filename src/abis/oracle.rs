use alloy::sol;

sol! {
    /// Batched spot-price oracle. Returns one USD rate (base-1e18) per
    /// connector token, aligned by position with the input list.
    #[sol(rpc)]
    interface IPriceOracle {
        function getManyRatesWithConnectors(uint8 srcLen, address[] memory connectors) external view returns (uint256[] memory rates);
    }
}
