//! Observable search state and the transient notification channel.
//!
//! [`StatePublisher`] owns the only writer of [`SearchState`]. Every query gets a
//! generation token; a write tagged with anything but the current generation is
//! dropped, which makes results of superseded lookups unobservable. The token
//! lives inside the watched value so the check and the write happen under the
//! same lock.

use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::model::City;

/// Lifecycle of the active query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryPhase {
    #[default]
    Idle,
    /// Waiting for the quiescence interval to elapse.
    Debouncing,
    /// A lookup for the active query is in flight.
    Loading,
}

/// Composite state consumed by the display layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchState {
    pub query: String,
    pub phase: QueryPhase,
    pub results: Vec<City>,
    pub favorites: Vec<City>,
    generation: u64,
}

impl SearchState {
    pub fn is_searching(&self) -> bool {
        self.phase == QueryPhase::Loading
    }

    pub fn is_favorite(&self, city: &City) -> bool {
        self.favorites.iter().any(|f| f.same_city(city))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    SearchFailed,
    FavoritesWriteFailed,
}

/// A short, dismissible message for the user. Sent once per failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

const NOTIFICATION_CAPACITY: usize = 16;

#[derive(Debug)]
pub struct StatePublisher {
    state: watch::Sender<SearchState>,
    notifications: broadcast::Sender<Notification>,
}

impl Default for StatePublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl StatePublisher {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SearchState::default());
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self { state, notifications }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    pub fn snapshot(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Makes `query` the active query in the debouncing phase and returns its token.
    /// Any earlier token loses its right to write.
    pub fn begin_query(&self, query: &str) -> u64 {
        let mut token = 0;
        self.state.send_modify(|s| {
            s.generation += 1;
            s.query = query.to_string();
            s.phase = QueryPhase::Debouncing;
            token = s.generation;
        });
        debug!(query, token, "query debouncing");
        token
    }

    /// Sets a blank query, empties the results and invalidates any outstanding token.
    pub fn clear_query(&self, text: &str) {
        self.state.send_modify(|s| {
            s.generation += 1;
            s.query = text.to_string();
            s.results.clear();
            s.phase = QueryPhase::Idle;
        });
        debug!("query cleared");
    }

    /// Debounce elapsed for `token`; flips to loading if it is still current.
    pub fn start_loading(&self, token: u64) -> bool {
        self.state.send_if_modified(|s| {
            if s.generation != token {
                return false;
            }
            s.phase = QueryPhase::Loading;
            true
        })
    }

    /// Publishes `results` for `token`. Returns `false` when the token was stale.
    pub fn complete(&self, token: u64, results: Vec<City>) -> bool {
        let applied = self.state.send_if_modified(|s| {
            if s.generation != token {
                return false;
            }
            s.results = results;
            s.phase = QueryPhase::Idle;
            true
        });
        if !applied {
            debug!(token, "discarding stale results");
        }
        applied
    }

    /// Records a failed lookup for `token`: empty results, idle.
    ///
    /// `message` is broadcast only if the token is still current, and before
    /// state subscribers observe the idle phase.
    pub fn fail(&self, token: u64, message: Option<String>) -> bool {
        let applied = self.state.send_if_modified(|s| {
            if s.generation != token {
                return false;
            }
            if let Some(message) = message {
                self.notify(NotificationKind::SearchFailed, message);
            }
            s.results.clear();
            s.phase = QueryPhase::Idle;
            true
        });
        if !applied {
            debug!(token, "discarding stale failure");
        }
        applied
    }

    /// Invalidates every token and leaves the phase idle without touching results.
    pub fn cancel(&self) {
        self.state.send_if_modified(|s| {
            s.generation += 1;
            if s.phase == QueryPhase::Idle {
                return false;
            }
            s.phase = QueryPhase::Idle;
            true
        });
    }

    pub fn set_favorites(&self, favorites: Vec<City>) {
        self.state.send_if_modified(|s| {
            if s.favorites == favorites {
                return false;
            }
            s.favorites = favorites;
            true
        });
    }

    pub fn notify(&self, kind: NotificationKind, message: impl Into<String>) {
        let notification = Notification { kind, message: message.into() };
        // No subscribers is fine; nobody is looking at the screen.
        let _ = self.notifications.send(notification);
    }
}
