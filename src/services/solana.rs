use async_trait::async_trait;
use rust_decimal::Decimal;
use solana_commitment_config::{CommitmentConfig, CommitmentLevel};
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::client_error::{Error as ClientError, ErrorKind as ClientErrorKind};
use solana_rpc_client_api::request::{RpcError, TokenAccountsFilter};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::models::{BalanceReading, TokenAccountRef, TokenBalanceReading, WalletIdentity};
use crate::services::interface::{NetworkClient, QueryError};
use crate::utils::math::MathUtils;

/// Ledger client backed by the Solana JSON-RPC API
pub struct RpcNetworkClient {
    rpc_client: RpcClient,
    commitment: CommitmentConfig,
}

impl RpcNetworkClient {
    /// Create a new RPC network client
    pub fn new(rpc_url: &str, commitment: CommitmentConfig, timeout: Duration) -> Self {
        let rpc_client =
            RpcClient::new_with_timeout_and_commitment(rpc_url.to_string(), timeout, commitment);

        Self {
            rpc_client,
            commitment,
        }
    }

    /// Endpoint this client talks to
    pub fn url(&self) -> String {
        self.rpc_client.url()
    }
}

#[async_trait]
impl NetworkClient for RpcNetworkClient {
    async fn get_balance(&self, identity: &WalletIdentity) -> Result<BalanceReading, QueryError> {
        let balance = self
            .rpc_client
            .get_balance_with_commitment(identity.pubkey(), self.commitment)
            .await
            .map_err(|e| classify_client_error(&e))?;

        Ok(BalanceReading::from_lamports(balance.value))
    }

    async fn find_token_account(
        &self,
        owner: &Pubkey,
        token_program_id: &Pubkey,
    ) -> Result<Option<TokenAccountRef>, QueryError> {
        let accounts = self
            .rpc_client
            .get_token_accounts_by_owner(owner, TokenAccountsFilter::ProgramId(*token_program_id))
            .await
            .map_err(|e| classify_client_error(&e))?;

        debug!("Owner {} holds {} token accounts", owner, accounts.len());

        match accounts.first() {
            Some(keyed_account) => {
                let address = Pubkey::from_str(&keyed_account.pubkey).map_err(|e| {
                    QueryError::MalformedResponse(format!(
                        "invalid token account key {}: {}",
                        keyed_account.pubkey, e
                    ))
                })?;
                Ok(Some(TokenAccountRef::new(address)))
            }
            None => Ok(None),
        }
    }

    async fn get_token_account_balance(
        &self,
        account: &TokenAccountRef,
    ) -> Result<TokenBalanceReading, QueryError> {
        let balance = self
            .rpc_client
            .get_token_account_balance_with_commitment(&account.address, self.commitment)
            .await
            .map_err(|e| classify_client_error(&e))?;

        let amount = balance.value;
        let ui_amount = parse_ui_amount(&amount.ui_amount_string, &amount.amount, amount.decimals)?;

        Ok(TokenBalanceReading::new(ui_amount, amount.amount.clone(), amount.decimals))
    }
}

/// Prefer the ledger's own UI string, fall back to scaling the raw amount
fn parse_ui_amount(ui_amount_string: &str, amount: &str, decimals: u8) -> Result<Decimal, QueryError> {
    if let Ok(ui_amount) = Decimal::from_str(ui_amount_string) {
        return Ok(ui_amount);
    }

    let raw = amount.parse::<u64>().map_err(|e| {
        QueryError::MalformedResponse(format!("invalid token amount {}: {}", amount, e))
    })?;
    MathUtils::atomic_to_ui(raw, decimals as u32).ok_or_else(|| {
        QueryError::MalformedResponse(format!("unsupported token decimals {}", decimals))
    })
}

/// Map an RPC client error onto the query error kinds shown to the user
pub fn classify_client_error(err: &ClientError) -> QueryError {
    match err.kind() {
        ClientErrorKind::Io(e) => QueryError::UnreachableEndpoint(e.to_string()),
        ClientErrorKind::Reqwest(e) => {
            if e.status().map(|s| s.as_u16()) == Some(429) {
                QueryError::RateLimited(e.to_string())
            } else if e.is_decode() {
                QueryError::MalformedResponse(e.to_string())
            } else {
                QueryError::UnreachableEndpoint(e.to_string())
            }
        }
        ClientErrorKind::SerdeJson(e) => QueryError::MalformedResponse(e.to_string()),
        ClientErrorKind::RpcError(rpc_error) => classify_rpc_error(rpc_error),
        other => QueryError::UnreachableEndpoint(other.to_string()),
    }
}

fn classify_rpc_error(err: &RpcError) -> QueryError {
    match err {
        RpcError::RpcResponseError { message, .. } | RpcError::ForUser(message) => {
            if is_missing_account(message) {
                QueryError::AccountNotFound(message.clone())
            } else if is_rate_limited(message) {
                QueryError::RateLimited(message.clone())
            } else {
                QueryError::UnreachableEndpoint(message.clone())
            }
        }
        RpcError::ParseError(message) => QueryError::MalformedResponse(message.clone()),
        other => QueryError::UnreachableEndpoint(other.to_string()),
    }
}

fn is_rate_limited(message: &str) -> bool {
    message.to_lowercase().contains("too many requests")
}

fn is_missing_account(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("could not find account") || message.contains("account not found")
}

/// Parse a commitment level name such as `confirmed`
pub fn parse_commitment(value: &str) -> anyhow::Result<CommitmentConfig> {
    let commitment = CommitmentLevel::from_str(&value.to_lowercase())
        .map_err(|_| anyhow::anyhow!("Unknown commitment level: {}", value))?;
    Ok(CommitmentConfig { commitment })
}

/// Solana network type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolanaNetwork {
    Mainnet,
    Testnet,
    Devnet,
    Localnet,
}

impl SolanaNetwork {
    /// Get network RPC URL
    pub fn get_rpc_url(&self) -> &'static str {
        match self {
            SolanaNetwork::Mainnet => "https://api.mainnet-beta.solana.com",
            SolanaNetwork::Testnet => "https://api.testnet.solana.com",
            SolanaNetwork::Devnet => "https://api.devnet.solana.com",
            SolanaNetwork::Localnet => "http://localhost:8899",
        }
    }

    /// Get network name
    pub fn get_name(&self) -> &'static str {
        match self {
            SolanaNetwork::Mainnet => "Mainnet",
            SolanaNetwork::Testnet => "Testnet",
            SolanaNetwork::Devnet => "Devnet",
            SolanaNetwork::Localnet => "Localnet",
        }
    }
}

impl Default for SolanaNetwork {
    fn default() -> Self {
        SolanaNetwork::Devnet
    }
}

impl FromStr for SolanaNetwork {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "mainnet-beta" => Ok(SolanaNetwork::Mainnet),
            "testnet" => Ok(SolanaNetwork::Testnet),
            "devnet" => Ok(SolanaNetwork::Devnet),
            "localnet" | "localhost" => Ok(SolanaNetwork::Localnet),
            _ => Err(anyhow::anyhow!("Unknown Solana network: {}", s)),
        }
    }
}

impl std::fmt::Display for SolanaNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get_name())
    }
}
