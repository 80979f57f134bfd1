use anyhow::Result;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use std::str::FromStr;

/// Key handling utilities
pub struct CryptoUtils;

impl CryptoUtils {
    /// Parse a base58 public key
    pub fn parse_pubkey(value: &str) -> Result<Pubkey> {
        Pubkey::from_str(value.trim())
            .map_err(|e| anyhow::anyhow!("Invalid pubkey {}: {}", value, e))
    }

    /// Decode a base58 encoded 64 byte secret key into a keypair
    pub fn keypair_from_base58(secret: &str) -> Result<Keypair> {
        let bytes = bs58::decode(secret.trim())
            .into_vec()
            .map_err(|e| anyhow::anyhow!("Secret key is not valid base58: {}", e))?;

        if bytes.len() != 64 {
            anyhow::bail!("Secret key must be 64 bytes, got {}", bytes.len());
        }

        Keypair::try_from(bytes.as_slice())
            .map_err(|e| anyhow::anyhow!("Invalid secret key: {}", e))
    }

    /// Derive the public key of a base58 secret key without keeping the secret around
    pub fn pubkey_from_secret(secret: &str) -> Result<Pubkey> {
        let keypair = Self::keypair_from_base58(secret)?;
        Ok(keypair.pubkey())
    }
}
