//! Known lending deployments

use crate::config::NetworkConfig;

/// Kovan testnet deployment
pub const KOVAN: NetworkConfig = NetworkConfig {
    chain_id: 42,
    name: "kovan",
    controller: "0x899659b74B6B07A8C401657cD76d289b5E0248a4",
    collateral_token: "0xd35f5965B4B84382ca27072fF3B6b42e7053e672",
    collateral_receipt_token: "0x73f227a0EE9c3964061e28f1D23B2217Cd1621E1",
    borrow_token: "0x5ADf17577CF2be1288C5228735ea58EeB4C15Ee3",
    borrow_receipt_token: "0xf18feCe22570f7bA7c7D50dd4A9d11b4aE74bC89",
    price_oracle: "0x7B0568A2BE71b28E9631FBa1182806Acf10ec123",
    governance: "0x5960B28C24425f5db4abb3e43Dd15A34f3cc41a9",
    timelock: "0xD12Ba62471a5E66c27936477a532A601B3Fb68A0",
    // Base 500bps / slope 1200bps per year
    interest_rate_model: "0x7CbE5Bc02fDdA09F540f6233fC25AD89695fcD25",
    comptroller_implementation: "0xEcB9686cB8Bec28B81e5369782c0534269413842",
    maximillion: "0x5960B28C24425f5db4abb3e43Dd15A34f3cc41a9",
};

/// Binance Smart Chain testnet deployment. The borrow market is BUSD.
pub const BSC_TESTNET: NetworkConfig = NetworkConfig {
    chain_id: 97,
    name: "bsc-testnet",
    controller: "0x96498309220d9E477d1ce5972Ff723aC4DF19C2C",
    collateral_token: "0xbb92794048D4477AD7042B5D365d785C3d71CA20",
    collateral_receipt_token: "0x4bDe92De1e1D12d7baC4B4a1fef02f9f24052EE7",
    borrow_token: "0xeD24FC36d5Ee211Ea25A80239Fb8C4Cfd80f12Ee",
    borrow_receipt_token: "0x34538C7E2f7f283a69beddd0897aB7f8Bae0B92D",
    ..NetworkConfig::placeholder(97, "bsc-testnet")
};

pub const MAINNET: NetworkConfig = NetworkConfig::placeholder(1, "mainnet");
pub const ROPSTEN: NetworkConfig = NetworkConfig::placeholder(3, "ropsten");
pub const RINKEBY: NetworkConfig = NetworkConfig::placeholder(4, "rinkeby");
pub const GOERLI: NetworkConfig = NetworkConfig::placeholder(5, "goerli");

/// Every entry compiled into the registry, ordered by chain id
pub static ALL: [NetworkConfig; 6] = [MAINNET, ROPSTEN, RINKEBY, GOERLI, KOVAN, BSC_TESTNET];
