//! Core library for WeatherDex.
//!
//! This crate defines:
//! - City and forecast models as returned by the weather providers
//! - Abstraction over city lookup and forecast providers
//! - Favorites persistence
//! - The debounced search coordinator and the state it publishes
//! - Configuration & credentials handling
//!
//! It is used by `weatherdex-cli`, but any host able to render a
//! [`SearchState`] can drive a [`CitySearchCoordinator`].

pub mod config;
pub mod coordinator;
pub mod debounce;
pub mod error;
pub mod favorites;
pub mod forecast;
pub mod model;
pub mod provider;
pub mod state;

pub use config::{Config, HttpConfig, ProviderConfig, SearchConfig};
pub use coordinator::{CitySearchCoordinator, Navigator};
pub use error::{LookupError, StoreError};
pub use favorites::{FavoritesStore, JsonFavoritesStore, MemoryFavoritesStore};
pub use forecast::{DailyForecast, Forecast};
pub use model::{City, CityKey, DetailTarget, Units};
pub use provider::{CityLookup, ForecastProvider, ProviderId};
pub use state::{Notification, NotificationKind, QueryPhase, SearchState};
