pub mod erc20;
pub mod oracle;
pub mod voter;

pub use erc20::IERC20;
pub use oracle::IPriceOracle;
pub use voter::IVoter;
