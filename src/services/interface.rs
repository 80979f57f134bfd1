use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use std::time::Duration;

use crate::models::{
    BalanceReading, PriceQuote, TokenAccountRef, TokenBalanceReading, TokenMetadata,
    WalletIdentity,
};

/// Read-only ledger queries used by the aggregation controller
#[async_trait]
pub trait NetworkClient: Send + Sync {
    /// Native balance of a wallet
    async fn get_balance(&self, identity: &WalletIdentity) -> Result<BalanceReading, QueryError>;

    /// First token account owned by `owner` under `token_program_id`, if any
    async fn find_token_account(
        &self,
        owner: &Pubkey,
        token_program_id: &Pubkey,
    ) -> Result<Option<TokenAccountRef>, QueryError>;

    /// UI amount held by a token account
    async fn get_token_account_balance(
        &self,
        account: &TokenAccountRef,
    ) -> Result<TokenBalanceReading, QueryError>;
}

/// Fiat quotation for a single asset
#[async_trait]
pub trait PriceClient: Send + Sync {
    async fn get_quote(&self, asset_id: &str, fiat_currency: &str) -> Result<PriceQuote, QueryError>;
}

/// Descriptive metadata for a token account
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    async fn resolve(&self, account: &TokenAccountRef) -> Result<TokenMetadata, QueryError>;
}

/// Failure of a single query. Stored inside the display state, hence `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("endpoint unreachable: {0}")]
    UnreachableEndpoint(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        if err.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) {
            QueryError::RateLimited(err.to_string())
        } else if err.is_decode() {
            QueryError::MalformedResponse(err.to_string())
        } else {
            QueryError::UnreachableEndpoint(err.to_string())
        }
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::MalformedResponse(err.to_string())
    }
}
