use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::time::Duration;
use anyhow::Result;
use tracing::debug;

use crate::models::{TokenMetadata, WalletIdentity};
use crate::services::solana::{parse_commitment, SolanaNetwork};
use crate::utils::crypto::CryptoUtils;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub solana: SolanaConfig,
    pub token: TokenConfig,
    pub price: PriceConfig,
    pub metadata: MetadataConfig,
    pub aggregation: AggregationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolanaConfig {
    pub network: String,
    /// Overrides the network's public endpoint when set
    #[serde(default)]
    pub rpc_url: Option<String>,
    pub commitment: String,
    pub timeout_seconds: u64,
}

/// Whose token accounts are looked up
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenOwnerSource {
    Wallet,
    Fixed,
    SigningKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    pub program_id: String,
    pub owner: TokenOwnerSource,
    #[serde(default)]
    pub owner_pubkey: Option<String>,
    #[serde(default)]
    pub owner_secret_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceConfig {
    pub base_url: String,
    pub asset_id: String,
    pub fiat_currency: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Zero disables the per-query bound
    pub query_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl AppConfig {
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("WALLET_OVERVIEW").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    pub fn validate(&self) -> Result<()> {
        self.network()?;
        parse_commitment(&self.solana.commitment)?;
        if matches!(&self.solana.rpc_url, Some(url) if url.is_empty()) {
            anyhow::bail!("Solana RPC URL must not be empty when set");
        }
        if self.price.base_url.is_empty() {
            anyhow::bail!("Price service URL is required");
        }
        if self.price.asset_id.is_empty() || self.price.fiat_currency.is_empty() {
            anyhow::bail!("Price asset id and fiat currency are required");
        }
        self.token_owner()?;
        CryptoUtils::parse_pubkey(&self.token.program_id)?;
        Ok(())
    }

    pub fn network(&self) -> Result<SolanaNetwork> {
        SolanaNetwork::from_str(&self.solana.network)
    }

    /// Endpoint to query: the explicit URL, or the selected network's public one
    pub fn rpc_url(&self) -> Result<String> {
        match &self.solana.rpc_url {
            Some(url) if !url.is_empty() => Ok(url.clone()),
            _ => Ok(self.network()?.get_rpc_url().to_string()),
        }
    }

    pub fn token_owner(&self) -> Result<TokenOwner> {
        match self.token.owner {
            TokenOwnerSource::Wallet => Ok(TokenOwner::ConnectedWallet),
            TokenOwnerSource::Fixed => {
                let pubkey = self
                    .token
                    .owner_pubkey
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("token.owner_pubkey is required for a fixed owner"))?;
                Ok(TokenOwner::Fixed(CryptoUtils::parse_pubkey(pubkey)?))
            }
            TokenOwnerSource::SigningKey => {
                let secret = self
                    .token
                    .owner_secret_key
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("token.owner_secret_key is required for a signing-key owner"))?;
                let pubkey = CryptoUtils::pubkey_from_secret(secret)?;
                debug!("Token owner derived from signing key: {}", pubkey);
                Ok(TokenOwner::Fixed(pubkey))
            }
        }
    }

    pub fn token_metadata(&self) -> TokenMetadata {
        TokenMetadata::new(
            self.metadata.name.clone(),
            self.metadata.symbol.clone(),
            self.metadata.description.clone(),
            self.metadata.image.clone(),
        )
    }

    /// Explicit settings record handed to the aggregation controller
    pub fn aggregator_config(&self) -> Result<AggregatorConfig> {
        let query_timeout = match self.aggregation.query_timeout_seconds {
            0 => None,
            seconds => Some(Duration::from_secs(seconds)),
        };

        Ok(AggregatorConfig {
            token_program_id: CryptoUtils::parse_pubkey(&self.token.program_id)?,
            token_owner: self.token_owner()?,
            asset_id: self.price.asset_id.clone(),
            fiat_currency: self.price.fiat_currency.clone(),
            query_timeout,
        })
    }
}

/// Account whose token holdings are displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOwner {
    ConnectedWallet,
    Fixed(Pubkey),
}

impl TokenOwner {
    pub fn resolve(&self, identity: &WalletIdentity) -> Pubkey {
        match self {
            TokenOwner::ConnectedWallet => *identity.pubkey(),
            TokenOwner::Fixed(pubkey) => *pubkey,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub token_program_id: Pubkey,
    pub token_owner: TokenOwner,
    pub asset_id: String,
    pub fiat_currency: String,
    pub query_timeout: Option<Duration>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            token_program_id: spl_token_interface::id(),
            token_owner: TokenOwner::ConnectedWallet,
            asset_id: "solana".to_string(),
            fiat_currency: "usd".to_string(),
            query_timeout: Some(Duration::from_secs(15)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signature::{Keypair, Signer};

    fn sample_config() -> AppConfig {
        AppConfig {
            solana: SolanaConfig {
                network: "devnet".to_string(),
                rpc_url: None,
                commitment: "confirmed".to_string(),
                timeout_seconds: 10,
            },
            token: TokenConfig {
                program_id: spl_token_interface::id().to_string(),
                owner: TokenOwnerSource::Wallet,
                owner_pubkey: None,
                owner_secret_key: None,
            },
            price: PriceConfig {
                base_url: "https://api.coingecko.com/api/v3".to_string(),
                asset_id: "solana".to_string(),
                fiat_currency: "usd".to_string(),
                api_key: None,
                timeout_seconds: 10,
            },
            metadata: MetadataConfig {
                name: "Solana Token".to_string(),
                symbol: "SOL".to_string(),
                description: "test".to_string(),
                image: "https://example.com/token-image.png".to_string(),
            },
            aggregation: AggregationConfig {
                query_timeout_seconds: 15,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    #[test]
    fn test_sample_config_is_valid() {
        let config = sample_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.rpc_url().unwrap(), "https://api.devnet.solana.com");

        let aggregator = config.aggregator_config().unwrap();
        assert_eq!(aggregator.token_program_id, spl_token_interface::id());
        assert_eq!(aggregator.token_owner, TokenOwner::ConnectedWallet);
        assert_eq!(aggregator.query_timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_custom_rpc_url_wins() {
        let mut config = sample_config();
        config.solana.rpc_url = Some("http://127.0.0.1:8899".to_string());
        assert_eq!(config.rpc_url().unwrap(), "http://127.0.0.1:8899");

        config.solana.rpc_url = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut config = sample_config();
        config.solana.network = "moonnet".to_string();
        assert!(config.validate().is_err());

        let mut config = sample_config();
        config.solana.commitment = "eventually".to_string();
        assert!(config.validate().is_err());

        let mut config = sample_config();
        config.price.asset_id.clear();
        assert!(config.validate().is_err());

        let mut config = sample_config();
        config.token.owner = TokenOwnerSource::Fixed;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_token_owner_resolution() {
        let identity = WalletIdentity::new(Pubkey::new_unique());

        let config = sample_config();
        assert_eq!(config.token_owner().unwrap().resolve(&identity), *identity.pubkey());

        let fixed = Pubkey::new_unique();
        let mut config = sample_config();
        config.token.owner = TokenOwnerSource::Fixed;
        config.token.owner_pubkey = Some(fixed.to_string());
        assert_eq!(config.token_owner().unwrap().resolve(&identity), fixed);

        let keypair = Keypair::new();
        let mut config = sample_config();
        config.token.owner = TokenOwnerSource::SigningKey;
        config.token.owner_secret_key = Some(bs58::encode(keypair.to_bytes()).into_string());
        assert_eq!(
            config.token_owner().unwrap(),
            TokenOwner::Fixed(keypair.pubkey())
        );
    }

    #[test]
    fn test_zero_timeout_disables_bound() {
        let mut config = sample_config();
        config.aggregation.query_timeout_seconds = 0;
        assert_eq!(config.aggregator_config().unwrap().query_timeout, None);
    }

    #[test]
    fn test_owner_source_names() {
        let source: TokenOwnerSource = serde_json::from_str(r#""signing_key""#).unwrap();
        assert_eq!(source, TokenOwnerSource::SigningKey);
    }
}
