use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::AggregatorConfig;
use crate::models::{DisplayState, FieldState, TokenAccountRef, WalletIdentity};
use crate::services::interface::{MetadataResolver, NetworkClient, PriceClient, QueryError};

/// Tag carried by every query so late results can be matched against the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub id: u64,
    pub identity: WalletIdentity,
}

/// Everything a query task needs, cloned into each spawned task
#[derive(Clone)]
pub(crate) struct QueryContext {
    pub network: Arc<dyn NetworkClient>,
    pub price: Arc<dyn PriceClient>,
    pub metadata: Arc<dyn MetadataResolver>,
    pub config: Arc<AggregatorConfig>,
    pub state: Arc<watch::Sender<DisplayState>>,
}

impl QueryContext {
    /// Issue the independent queries of a session, one task each
    pub(crate) fn spawn_all(&self, session: Session) -> Vec<JoinHandle<()>> {
        vec![
            tokio::spawn(self.clone().fetch_balance(session)),
            tokio::spawn(self.clone().fetch_token(session)),
            tokio::spawn(self.clone().fetch_price(session)),
        ]
    }

    async fn fetch_balance(self, session: Session) {
        let result = self
            .bounded(&session, "balance", self.network.get_balance(&session.identity))
            .await;
        self.publish(&session, "balance", |state| state.balance.settle_with(result));
    }

    async fn fetch_price(self, session: Session) {
        let result = self
            .bounded(
                &session,
                "price",
                self.price.get_quote(&self.config.asset_id, &self.config.fiat_currency),
            )
            .await;
        self.publish(&session, "price", |state| state.price_quote.settle_with(result));
    }

    /// Token account discovery, chaining balance and metadata lookups on success
    async fn fetch_token(self, session: Session) {
        let owner = self.config.token_owner.resolve(&session.identity);
        let lookup = self
            .bounded(
                &session,
                "token account",
                self.network
                    .find_token_account(&owner, &self.config.token_program_id),
            )
            .await;

        match lookup {
            Ok(Some(account)) => {
                let recorded = self.publish(&session, "token account", |state| {
                    state.token_account.settle(FieldState::Resolved(account))
                });
                if !recorded {
                    return;
                }

                tokio::join!(
                    self.fetch_token_balance(&session, &account),
                    self.fetch_token_metadata(&session, &account),
                );
            }
            Ok(None) => {
                debug!("No token account for owner {} under {}", owner, self.config.token_program_id);
                self.publish(&session, "token account", |state| {
                    state.token_account.settle(FieldState::Absent)
                        | state.token_balance.settle(FieldState::Absent)
                        | state.token_metadata.settle(FieldState::Absent)
                });
            }
            Err(err) => {
                self.publish(&session, "token account", |state| {
                    state.token_account.settle(FieldState::Failed(err.clone()))
                        | state.token_balance.settle(FieldState::Failed(err.clone()))
                        | state.token_metadata.settle(FieldState::Failed(err))
                });
            }
        }
    }

    async fn fetch_token_balance(&self, session: &Session, account: &TokenAccountRef) {
        let result = self
            .bounded(
                session,
                "token balance",
                self.network.get_token_account_balance(account),
            )
            .await;
        self.publish(session, "token balance", |state| {
            state.token_balance.settle_with(result)
        });
    }

    async fn fetch_token_metadata(&self, session: &Session, account: &TokenAccountRef) {
        let result = self
            .bounded(session, "token metadata", self.metadata.resolve(account))
            .await;
        self.publish(session, "token metadata", |state| {
            state.token_metadata.settle_with(result)
        });
    }

    /// Apply the configured per-query timeout and log failures
    async fn bounded<T>(
        &self,
        session: &Session,
        query: &str,
        request: impl Future<Output = Result<T, QueryError>>,
    ) -> Result<T, QueryError> {
        let result = match self.config.query_timeout {
            Some(limit) => timeout(limit, request)
                .await
                .unwrap_or(Err(QueryError::Timeout(limit))),
            None => request.await,
        };

        if let Err(e) = &result {
            warn!(
                "{} query failed for {} (session {}): {}",
                query, session.identity, session.id, e
            );
        }
        result
    }

    fn publish<F>(&self, session: &Session, query: &str, update: F) -> bool
    where
        F: FnOnce(&mut DisplayState) -> bool,
    {
        apply_update(&self.state, session, query, update)
    }
}

/// Read-modify-publish one update, discarding it when the session is no longer current.
/// Returns whether the state changed.
pub(crate) fn apply_update<F>(
    state: &watch::Sender<DisplayState>,
    session: &Session,
    query: &str,
    update: F,
) -> bool
where
    F: FnOnce(&mut DisplayState) -> bool,
{
    let mut stale = false;
    let changed = state.send_if_modified(|current| {
        if current.session != session.id || current.identity != Some(session.identity) {
            stale = true;
            return false;
        }

        let changed = update(current);
        if changed {
            current.updated_at = Utc::now();
        }
        changed
    });

    if stale {
        debug!(
            "Discarding stale {} result for {} (session {})",
            query, session.identity, session.id
        );
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BalanceReading;
    use solana_sdk::pubkey::Pubkey;

    fn identity() -> WalletIdentity {
        WalletIdentity::new(Pubkey::new_unique())
    }

    #[test]
    fn test_update_for_other_identity_is_discarded() {
        let (a, b) = (identity(), identity());
        let (sender, _receiver) = watch::channel(DisplayState::pending(b, 2));

        let stale = Session { id: 1, identity: a };
        let applied = apply_update(&sender, &stale, "balance", |state| {
            state.balance.settle(FieldState::Resolved(BalanceReading::from_lamports(5)))
        });

        assert!(!applied);
        assert_eq!(sender.borrow().identity, Some(b));
        assert!(sender.borrow().balance.is_pending());
    }

    #[test]
    fn test_update_from_previous_session_of_same_identity_is_discarded() {
        let a = identity();
        let (sender, _receiver) = watch::channel(DisplayState::pending(a, 3));

        let old = Session { id: 1, identity: a };
        assert!(!apply_update(&sender, &old, "price", |state| {
            state.price_quote.settle(FieldState::Absent)
        }));
        assert!(sender.borrow().price_quote.is_pending());
    }

    #[test]
    fn test_update_after_disconnect_is_discarded() {
        let a = identity();
        let (sender, _receiver) = watch::channel(DisplayState::disconnected(2));

        let old = Session { id: 1, identity: a };
        assert!(!apply_update(&sender, &old, "balance", |state| {
            state.balance.settle(FieldState::Resolved(BalanceReading::from_lamports(5)))
        }));
        assert_eq!(sender.borrow().identity, None);
        assert_eq!(sender.borrow().balance, FieldState::Idle);
    }

    #[test]
    fn test_current_update_is_published_once() {
        let a = identity();
        let (sender, mut receiver) = watch::channel(DisplayState::pending(a, 1));
        receiver.borrow_and_update();

        let session = Session { id: 1, identity: a };
        assert!(apply_update(&sender, &session, "balance", |state| {
            state.balance.settle(FieldState::Resolved(BalanceReading::from_lamports(5)))
        }));
        assert!(receiver.has_changed().unwrap());
        receiver.borrow_and_update();

        // already settled, nothing to republish
        assert!(!apply_update(&sender, &session, "balance", |state| {
            state.balance.settle(FieldState::Absent)
        }));
        assert!(!receiver.has_changed().unwrap());
        assert_eq!(
            receiver.borrow().balance,
            FieldState::Resolved(BalanceReading::from_lamports(5))
        );
    }
}
