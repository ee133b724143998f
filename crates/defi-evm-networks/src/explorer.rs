//! Block explorer helpers

use crate::registry::chain;

/// What a block explorer link points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplorerKind {
    Transaction,
    Token,
    Address,
}

fn explorer_host(chain_id: u64) -> &'static str {
    match chain_id {
        chain::ROPSTEN => "https://ropsten.etherscan.io",
        chain::RINKEBY => "https://rinkeby.etherscan.io",
        chain::GOERLI => "https://goerli.etherscan.io",
        chain::KOVAN => "https://kovan.etherscan.io",
        chain::BSC_TESTNET => "https://testnet.bscscan.com",
        _ => "https://etherscan.io",
    }
}

/// Build a block explorer URL. Unknown chains use the mainnet explorer.
pub fn explorer_link(chain_id: u64, data: &str, kind: ExplorerKind) -> String {
    let host = explorer_host(chain_id);
    match kind {
        ExplorerKind::Transaction => format!("{host}/tx/{data}"),
        ExplorerKind::Token => format!("{host}/token/{data}"),
        ExplorerKind::Address => format!("{host}/address/{data}"),
    }
}

/// Abbreviate an address or hash to `0x1234...abcd` for display.
pub fn shorten(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return value.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
