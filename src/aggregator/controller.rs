use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::aggregator::fanout::{QueryContext, Session};
use crate::config::AggregatorConfig;
use crate::models::{DisplayState, WalletIdentity};
use crate::services::interface::{MetadataResolver, NetworkClient, PriceClient};

/// Identity session bookkeeping, guarded by one lock so identity changes are serialized
#[derive(Default)]
struct SessionTracker {
    last_id: u64,
    current: Option<Session>,
    tasks: Vec<JoinHandle<()>>,
}

impl SessionTracker {
    fn abort_in_flight(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

/// Turns wallet identity changes into an incrementally built [`DisplayState`].
///
/// Every identity gets its own session. The balance, token and price queries
/// of a session run as independent tasks and publish into a shared watch
/// channel as soon as each one settles. Results tagged with an older session
/// are dropped on arrival, and the tasks of an older session are aborted.
pub struct AggregationController {
    context: QueryContext,
    sessions: Mutex<SessionTracker>,
}

impl AggregationController {
    pub fn new(
        config: AggregatorConfig,
        network: Arc<dyn NetworkClient>,
        price: Arc<dyn PriceClient>,
        metadata: Arc<dyn MetadataResolver>,
    ) -> Self {
        let (state, _) = watch::channel(DisplayState::disconnected(0));

        Self {
            context: QueryContext {
                network,
                price,
                metadata,
                config: Arc::new(config),
                state: Arc::new(state),
            },
            sessions: Mutex::new(SessionTracker::default()),
        }
    }

    /// React to the wallet connecting, switching or disconnecting
    pub async fn on_identity_change(&self, identity: Option<WalletIdentity>) {
        let mut tracker = self.sessions.lock().await;

        if tracker.current.map(|session| session.identity) == identity {
            debug!("Identity unchanged, keeping current overview");
            return;
        }

        tracker.abort_in_flight();
        tracker.last_id += 1;
        let id = tracker.last_id;

        match identity {
            None => {
                tracker.current = None;
                self.context.state.send_replace(DisplayState::disconnected(id));
                info!("Wallet disconnected");
            }
            Some(identity) => {
                let session = Session { id, identity };
                tracker.current = Some(session);
                self.context.state.send_replace(DisplayState::pending(identity, id));
                info!("Wallet {} connected, fetching overview (session {})", identity, id);

                tracker.tasks = self.context.spawn_all(session);
            }
        }
    }

    /// Current display state
    pub fn snapshot(&self) -> DisplayState {
        self.context.state.borrow().clone()
    }

    /// Receiver notified on every republish
    pub fn subscribe(&self) -> watch::Receiver<DisplayState> {
        self.context.state.subscribe()
    }

    pub fn current_identity(&self) -> Option<WalletIdentity> {
        self.context.state.borrow().identity
    }

    /// Wait until no field of the current session is pending.
    ///
    /// Also returns when the session is replaced, with the newer state.
    pub async fn wait_settled(&self) -> DisplayState {
        let mut receiver = self.context.state.subscribe();
        let session = receiver.borrow().session;

        let settled = receiver
            .wait_for(|state| state.session != session || state.is_settled())
            .await
            .map(|state| state.clone());

        match settled {
            Ok(state) => state,
            Err(_) => self.snapshot(),
        }
    }
}

impl Drop for AggregationController {
    fn drop(&mut self) {
        self.sessions.get_mut().abort_in_flight();
    }
}
