//! City search & favorites coordinator.
//!
//! The host view forwards text input through [`CitySearchCoordinator::on_query_changed`],
//! calls [`CitySearchCoordinator::on_activate`] whenever the screen becomes
//! visible again, and renders whatever arrives on [`CitySearchCoordinator::subscribe`].
//!
//! ```text
//! Idle ──input──▶ Debouncing ──quiet──▶ Loading ──response──▶ Idle (results)
//!   ▲                 │  ▲                 │    └──error─────▶ Idle (empty + notification)
//!   │                 └──┴──new input──────┘
//!   └──────────── blank input from any state
//! ```

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::{
    Config,
    debounce::Debouncer,
    error::LookupError,
    favorites::{FavoritesStore, JsonFavoritesStore},
    model::{City, DetailTarget},
    provider::{CityLookup, default_provider_from_config},
    state::{Notification, NotificationKind, QueryPhase, SearchState, StatePublisher},
};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

/// Receives the selection when the user opens a city.
pub trait Navigator: Send + Sync {
    fn open_detail(&self, target: DetailTarget);
}

pub struct CitySearchCoordinator {
    lookup: Arc<dyn CityLookup>,
    favorites: Arc<dyn FavoritesStore>,
    navigator: Option<Arc<dyn Navigator>>,
    publisher: Arc<StatePublisher>,
    debouncer: Debouncer,
    debounce: Duration,
}

impl CitySearchCoordinator {
    /// Favorites are read once here, so the first published state already
    /// carries them.
    pub fn new(lookup: Arc<dyn CityLookup>, favorites: Arc<dyn FavoritesStore>) -> Self {
        let coordinator = Self {
            lookup,
            favorites,
            navigator: None,
            publisher: Arc::new(StatePublisher::new()),
            debouncer: Debouncer::new(),
            debounce: DEFAULT_DEBOUNCE,
        };
        coordinator.refresh_favorites();
        coordinator
    }

    /// Default provider and on-disk favorites, as described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let lookup = default_provider_from_config(config)?;
        let favorites = Arc::new(JsonFavoritesStore::new(Config::favorites_file_path()?));
        Ok(Self::new(lookup, favorites).with_debounce(config.search.debounce()))
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.publisher.subscribe()
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.publisher.notifications()
    }

    pub fn state(&self) -> SearchState {
        self.publisher.snapshot()
    }

    /// Records new input and schedules a lookup for it after the debounce interval.
    ///
    /// Blank input cancels pending work and clears results without a request.
    /// Must be called from within a Tokio runtime.
    pub fn on_query_changed(&self, text: &str) {
        let query = text.trim();
        if query.is_empty() {
            self.publisher.clear_query(text);
            self.debouncer.cancel();
            return;
        }

        let token = self.publisher.begin_query(text);
        let publisher = Arc::clone(&self.publisher);
        let lookup = Arc::clone(&self.lookup);
        let query = query.to_string();

        self.debouncer.schedule(self.debounce, async move {
            run_lookup(publisher, lookup, token, query).await;
        });
    }

    /// The view became visible again: pick up favorites changed elsewhere.
    ///
    /// Hosts call this each time the screen is shown again after the first render.
    pub fn on_activate(&self) {
        self.refresh_favorites();
    }

    pub fn is_favorite(&self, city: &City) -> bool {
        self.publisher.snapshot().is_favorite(city)
    }

    /// Returns `true` if the city is a favorite afterwards.
    pub fn add_favorite(&self, city: &City) -> bool {
        match self.favorites.add(city) {
            Ok(inserted) => {
                debug!(city = %city.name, inserted, "favorite added");
                self.refresh_favorites();
                true
            }
            Err(err) => {
                warn!(city = %city.name, error = %err, "failed to save favorite");
                self.publisher.notify(
                    NotificationKind::FavoritesWriteFailed,
                    format!("Couldn't save {} to favorites.", city.name),
                );
                self.is_favorite(city)
            }
        }
    }

    /// Returns `true` if the city is still a favorite afterwards.
    pub fn remove_favorite(&self, city: &City) -> bool {
        match self.favorites.remove(city) {
            Ok(removed) => {
                debug!(city = %city.name, removed, "favorite removed");
                self.refresh_favorites();
                false
            }
            Err(err) => {
                warn!(city = %city.name, error = %err, "failed to remove favorite");
                self.publisher.notify(
                    NotificationKind::FavoritesWriteFailed,
                    format!("Couldn't remove {} from favorites.", city.name),
                );
                self.is_favorite(city)
            }
        }
    }

    /// Returns `true` if the city is a favorite afterwards.
    pub fn toggle_favorite(&self, city: &City) -> bool {
        if self.is_favorite(city) {
            self.remove_favorite(city)
        } else {
            self.add_favorite(city)
        }
    }

    /// Hands the city to the navigator, if any, and returns what was sent.
    pub fn open_detail(&self, city: &City) -> DetailTarget {
        let target = city.detail_target();
        debug!(city = %target.name, latitude = target.latitude, longitude = target.longitude, "opening detail");
        if let Some(navigator) = &self.navigator {
            navigator.open_detail(target.clone());
        }
        target
    }

    /// Waits until no query is debouncing or loading and returns that state.
    pub async fn settled(&self) -> SearchState {
        let mut rx = self.publisher.subscribe();
        match rx.wait_for(|s| s.phase == QueryPhase::Idle).await {
            Ok(state) => state.clone(),
            Err(_) => self.publisher.snapshot(),
        }
    }

    /// Cancels pending work and resets the loading flag. Also runs on drop.
    pub fn shutdown(&self) {
        self.publisher.cancel();
        self.debouncer.cancel();
    }

    fn refresh_favorites(&self) {
        self.publisher.set_favorites(self.favorites.list_or_empty());
    }
}

impl Drop for CitySearchCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Publishes a failure for its token if dropped before the lookup finished,
/// which happens when the lookup panics. Aborted tasks hold a stale token by
/// then, so their drop is a no-op.
struct PendingLookup {
    publisher: Arc<StatePublisher>,
    token: u64,
    finished: bool,
}

impl Drop for PendingLookup {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if self.publisher.fail(self.token, Some("Search failed. Please try again.".to_string())) {
            warn!(token = self.token, "lookup ended without a result");
        }
    }
}

async fn run_lookup(publisher: Arc<StatePublisher>, lookup: Arc<dyn CityLookup>, token: u64, query: String) {
    if !publisher.start_loading(token) {
        return;
    }
    let mut pending = PendingLookup { publisher, token, finished: false };

    let outcome = lookup.search(&query).await;
    pending.finished = true;
    let publisher = &pending.publisher;

    match outcome {
        Ok(cities) => {
            let count = cities.len();
            if publisher.complete(token, cities) {
                info!(query = %query, count, "search completed");
            }
        }
        Err(LookupError::EmptyQuery) => {
            publisher.fail(token, None);
        }
        Err(err) => {
            if publisher.fail(token, Some(err.user_message())) {
                warn!(query = %query, error = %err, "search failed");
            }
        }
    }
}
