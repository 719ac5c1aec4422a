use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IVoter {
        function isAlive(address gauge) external view returns (bool);
        function balanceOf(address account) external view returns (uint256);
    }
}
