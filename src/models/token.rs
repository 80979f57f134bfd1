use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use rust_decimal::Decimal;

/// On-ledger token account holding the tracked token
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TokenAccountRef {
    pub address: Pubkey,
}

impl TokenAccountRef {
    pub fn new(address: Pubkey) -> Self {
        Self { address }
    }
}

impl std::fmt::Display for TokenAccountRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.address)
    }
}

/// Token balance as reported by the ledger, already scaled by the mint decimals
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenBalanceReading {
    pub ui_amount: Decimal,
    pub amount: String,
    pub decimals: u8,
}

impl TokenBalanceReading {
    pub fn new(ui_amount: Decimal, amount: String, decimals: u8) -> Self {
        Self {
            ui_amount,
            amount,
            decimals,
        }
    }
}

impl std::fmt::Display for TokenBalanceReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ui_amount.normalize())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub image: String,
}

impl TokenMetadata {
    pub fn new(name: String, symbol: String, description: String, image: String) -> Self {
        Self {
            name,
            symbol,
            description,
            image,
        }
    }
}

impl std::fmt::Display for TokenMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.symbol)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PriceSource {
    CoinGecko,
}

/// Fiat price of one asset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceQuote {
    pub asset_id: String,
    pub fiat_currency: String,
    pub price: Decimal,
    pub source: PriceSource,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl PriceQuote {
    pub fn new(asset_id: String, fiat_currency: String, price: Decimal, source: PriceSource) -> Self {
        Self {
            asset_id,
            fiat_currency,
            price,
            source,
            timestamp: chrono::Utc::now(),
        }
    }
}

impl std::fmt::Display for PriceQuote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} per {}",
            self.price.normalize(),
            self.fiat_currency.to_uppercase(),
            self.asset_id
        )
    }
}
