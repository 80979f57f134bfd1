use async_trait::async_trait;
use tracing::debug;

use crate::models::{TokenAccountRef, TokenMetadata};
use crate::services::interface::{MetadataResolver, QueryError};

/// Resolver that answers every account with the same record.
///
/// Stand-in until a token metadata registry is wired in; a registry-backed
/// resolver reports `NotFound` or `UnreachableEndpoint` instead.
pub struct StaticMetadataResolver {
    metadata: TokenMetadata,
}

impl StaticMetadataResolver {
    pub fn new(metadata: TokenMetadata) -> Self {
        Self { metadata }
    }
}

impl Default for StaticMetadataResolver {
    fn default() -> Self {
        Self::new(TokenMetadata::new(
            "Solana Token".to_string(),
            "SOL".to_string(),
            "A decentralized blockchain built to enable scalable, user-friendly apps for the world."
                .to_string(),
            "https://example.com/token-image.png".to_string(),
        ))
    }
}

#[async_trait]
impl MetadataResolver for StaticMetadataResolver {
    async fn resolve(&self, account: &TokenAccountRef) -> Result<TokenMetadata, QueryError> {
        debug!("Resolving metadata for token account {}", account);
        Ok(self.metadata.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::pubkey::Pubkey;

    #[tokio::test]
    async fn test_static_resolver_ignores_account() {
        let resolver = StaticMetadataResolver::default();
        let first = resolver.resolve(&TokenAccountRef::new(Pubkey::new_unique())).await;
        let second = resolver.resolve(&TokenAccountRef::new(Pubkey::new_unique())).await;

        let first = tokio_test::assert_ok!(first);
        assert_eq!(first.name, "Solana Token");
        assert_eq!(first.symbol, "SOL");
        assert_eq!(Ok(first), second);
    }
}
