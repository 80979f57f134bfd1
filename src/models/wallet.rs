use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::utils::math::MathUtils;

/// Public key of the connected wallet
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WalletIdentity(Pubkey);

impl WalletIdentity {
    pub fn new(pubkey: Pubkey) -> Self {
        Self(pubkey)
    }

    pub fn pubkey(&self) -> &Pubkey {
        &self.0
    }
}

impl From<Pubkey> for WalletIdentity {
    fn from(pubkey: Pubkey) -> Self {
        Self(pubkey)
    }
}

impl FromStr for WalletIdentity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pubkey = Pubkey::from_str(s.trim())
            .map_err(|e| anyhow::anyhow!("Invalid wallet address {}: {}", s, e))?;
        Ok(Self(pubkey))
    }
}

impl std::fmt::Display for WalletIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Native SOL balance of a wallet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceReading {
    pub lamports: u64,
    pub sol: Decimal,
}

impl BalanceReading {
    pub fn from_lamports(lamports: u64) -> Self {
        Self {
            lamports,
            sol: MathUtils::lamports_to_sol(lamports),
        }
    }
}

impl std::fmt::Display for BalanceReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} SOL", self.sol.normalize())
    }
}
