use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::token::{PriceQuote, TokenAccountRef, TokenBalanceReading, TokenMetadata};
use super::wallet::{BalanceReading, WalletIdentity};
use crate::services::interface::QueryError;

/// Progress of one display field within an identity session.
///
/// `Idle` only appears while no wallet is connected. Once a session starts,
/// every field is `Pending` and settles exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldState<T> {
    Idle,
    Pending,
    Resolved(T),
    Absent,
    Failed(QueryError),
}

impl<T> FieldState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, FieldState::Pending)
    }

    /// Settled fields never change again within the same session
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            FieldState::Resolved(_) | FieldState::Absent | FieldState::Failed(_)
        )
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            FieldState::Resolved(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&QueryError> {
        match self {
            FieldState::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Move a pending field to its outcome. Returns whether the field changed.
    pub fn settle(&mut self, outcome: FieldState<T>) -> bool {
        if !self.is_pending() || !outcome.is_settled() {
            return false;
        }
        *self = outcome;
        true
    }

    pub fn settle_with(&mut self, result: Result<T, QueryError>) -> bool {
        match result {
            Ok(value) => self.settle(FieldState::Resolved(value)),
            Err(err) => self.settle(FieldState::Failed(err)),
        }
    }
}

impl<T: std::fmt::Display> std::fmt::Display for FieldState<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldState::Idle => write!(f, "-"),
            FieldState::Pending => write!(f, "loading..."),
            FieldState::Resolved(value) => write!(f, "{}", value),
            FieldState::Absent => write!(f, "none"),
            FieldState::Failed(err) => write!(f, "unavailable ({})", err),
        }
    }
}

/// Aggregated wallet view republished by the controller
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    pub identity: Option<WalletIdentity>,
    pub session: u64,
    pub balance: FieldState<BalanceReading>,
    pub token_account: FieldState<TokenAccountRef>,
    pub token_balance: FieldState<TokenBalanceReading>,
    pub token_metadata: FieldState<TokenMetadata>,
    pub price_quote: FieldState<PriceQuote>,
    pub updated_at: DateTime<Utc>,
}

impl DisplayState {
    pub fn disconnected(session: u64) -> Self {
        Self {
            identity: None,
            session,
            balance: FieldState::Idle,
            token_account: FieldState::Idle,
            token_balance: FieldState::Idle,
            token_metadata: FieldState::Idle,
            price_quote: FieldState::Idle,
            updated_at: Utc::now(),
        }
    }

    pub fn pending(identity: WalletIdentity, session: u64) -> Self {
        Self {
            identity: Some(identity),
            session,
            balance: FieldState::Pending,
            token_account: FieldState::Pending,
            token_balance: FieldState::Pending,
            token_metadata: FieldState::Pending,
            price_quote: FieldState::Pending,
            updated_at: Utc::now(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.identity.is_some()
    }

    /// True once no field of the current session is still loading
    pub fn is_settled(&self) -> bool {
        !self.balance.is_pending()
            && !self.token_account.is_pending()
            && !self.token_balance.is_pending()
            && !self.token_metadata.is_pending()
            && !self.price_quote.is_pending()
    }

    /// Fiat value of the native balance when both balance and price are known
    pub fn native_fiat_value(&self) -> Option<Decimal> {
        let balance = self.balance.value()?;
        let quote = self.price_quote.value()?;
        Some(balance.sol * quote.price)
    }

    /// Console rendering used by the binary
    pub fn render(&self) -> String {
        let identity = match &self.identity {
            Some(identity) => identity,
            None => return "Connect your wallet to see details".to_string(),
        };

        let mut lines = vec![
            format!("Wallet Public Key: {}", identity),
            format!("Balance: {}", self.balance),
            format!("Token Account: {}", self.token_account),
            format!("Token Balance: {}", self.token_balance),
        ];

        match &self.token_metadata {
            FieldState::Resolved(metadata) => {
                lines.push(format!("Token Name: {}", metadata.name));
                lines.push(format!("Token Symbol: {}", metadata.symbol));
                lines.push(format!("Description: {}", metadata.description));
                lines.push(format!("Image: {}", metadata.image));
            }
            other => lines.push(format!("Token Metadata: {}", other)),
        }

        lines.push(format!("Token Price: {}", self.price_quote));
        if let Some(value) = self.native_fiat_value() {
            lines.push(format!("Balance Value: {}", value.round_dp(2)));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::token::PriceSource;
    use solana_sdk::pubkey::Pubkey;

    fn identity() -> WalletIdentity {
        WalletIdentity::new(Pubkey::new_unique())
    }

    #[test]
    fn test_settle_is_monotonic() {
        let mut field: FieldState<u32> = FieldState::Pending;
        assert!(field.settle(FieldState::Resolved(7)));
        assert!(!field.settle(FieldState::Resolved(8)));
        assert!(!field.settle(FieldState::Absent));
        assert!(!field.settle_with(Err(QueryError::NotFound("x".to_string()))));
        assert_eq!(field, FieldState::Resolved(7));
    }

    #[test]
    fn test_settle_rejects_non_terminal_outcomes() {
        let mut field: FieldState<u32> = FieldState::Pending;
        assert!(!field.settle(FieldState::Pending));
        assert!(!field.settle(FieldState::Idle));
        assert!(field.is_pending());

        let mut idle: FieldState<u32> = FieldState::Idle;
        assert!(!idle.settle(FieldState::Resolved(1)));
        assert_eq!(idle, FieldState::Idle);
    }

    #[test]
    fn test_settled_state() {
        let mut state = DisplayState::pending(identity(), 1);
        assert!(!state.is_settled());

        state.balance.settle(FieldState::Resolved(BalanceReading::from_lamports(1)));
        state.token_account.settle(FieldState::Absent);
        state.token_balance.settle(FieldState::Absent);
        state.token_metadata.settle(FieldState::Absent);
        assert!(!state.is_settled());

        state
            .price_quote
            .settle(FieldState::Failed(QueryError::RateLimited("429".to_string())));
        assert!(state.is_settled());
        assert!(DisplayState::disconnected(2).is_settled());
    }

    #[test]
    fn test_native_fiat_value() {
        let mut state = DisplayState::pending(identity(), 1);
        assert_eq!(state.native_fiat_value(), None);

        state
            .balance
            .settle(FieldState::Resolved(BalanceReading::from_lamports(2_500_000_000)));
        state.price_quote.settle(FieldState::Resolved(PriceQuote::new(
            "solana".to_string(),
            "usd".to_string(),
            Decimal::new(14237, 2),
            PriceSource::CoinGecko,
        )));

        assert_eq!(state.native_fiat_value(), Some(Decimal::new(355925, 3)));
    }

    #[test]
    fn test_render_distinguishes_field_states() {
        assert_eq!(
            DisplayState::disconnected(0).render(),
            "Connect your wallet to see details"
        );

        let mut state = DisplayState::pending(identity(), 1);
        state.token_account.settle(FieldState::Absent);
        state
            .price_quote
            .settle(FieldState::Failed(QueryError::UnreachableEndpoint("refused".to_string())));

        let rendered = state.render();
        assert!(rendered.contains("Balance: loading..."));
        assert!(rendered.contains("Token Account: none"));
        assert!(rendered.contains("Token Price: unavailable (endpoint unreachable: refused)"));
    }
}
