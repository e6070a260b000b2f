use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, Select};
use weatherdex_core::{
    City, CitySearchCoordinator, Config, FavoritesStore, JsonFavoritesStore, ProviderId, Units,
    provider::forecast_provider_from_config,
};

use crate::{browse, output};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherdex", version, about = "Search cities, keep favorites and read forecasts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "apininjas".
        provider: String,
    },

    /// Look up cities matching a name.
    Search {
        /// City name or prefix.
        query: String,
    },

    /// Interactive search: pick a city, read its forecast, manage favorites.
    Browse,

    /// Manage favorited cities.
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },

    /// Show the daily forecast for a coordinate.
    #[command(allow_negative_numbers = true)]
    Forecast {
        latitude: f64,
        longitude: f64,

        /// Display name for the location.
        #[arg(long)]
        name: Option<String>,

        /// Unit system: metric, imperial or standard. Defaults to the configured one.
        #[arg(long)]
        units: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum FavoritesAction {
    /// List favorites in the order they were added.
    List,

    /// Search for a city and add it to favorites.
    Add {
        /// City name.
        query: String,
    },

    /// Pick a favorite to remove.
    Remove,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Search { query } => search(&query).await,
            Command::Browse => {
                let config = Config::load()?;
                browse::run(&config).await
            }
            Command::Favorites { action } => favorites(action).await,
            Command::Forecast { latitude, longitude, name, units } => {
                let config = Config::load()?;
                let units = match units {
                    Some(u) => Units::try_from(u.as_str())?,
                    None => config.units,
                };
                let name = name.unwrap_or_else(|| format!("{latitude:.4}, {longitude:.4}"));
                show_forecast(&config, &name, latitude, longitude, units).await
            }
        }
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let api_key = Password::new(&format!("{id} API key:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    config.upsert_provider_api_key(id, api_key.to_string());

    if config.default_provider_id().ok() != Some(id) {
        let make_default = Confirm::new(&format!("Use {id} as the default city provider?"))
            .with_default(false)
            .prompt()
            .context("Failed to read answer")?;
        if make_default {
            config.set_default_provider(id);
        }
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn search(query: &str) -> anyhow::Result<()> {
    let config = Config::load()?;
    let coordinator = CitySearchCoordinator::from_config(&config)?;
    let mut notifications = coordinator.notifications();

    coordinator.on_activate();
    coordinator.on_query_changed(query);
    let state = coordinator.settled().await;

    output::drain_notifications(&mut notifications);
    output::print_results(&state);
    Ok(())
}

async fn favorites(action: FavoritesAction) -> anyhow::Result<()> {
    match action {
        FavoritesAction::List => {
            let store = JsonFavoritesStore::new(Config::favorites_file_path()?);
            println!("{}", favorites_listing(&store));
        }
        FavoritesAction::Add { query } => {
            let config = Config::load()?;
            let coordinator = CitySearchCoordinator::from_config(&config)?;
            let mut notifications = coordinator.notifications();

            coordinator.on_query_changed(&query);
            let state = coordinator.settled().await;
            output::drain_notifications(&mut notifications);

            let mut choices = output::choices(&state);
            choices.retain(|c| state.results.iter().any(|r| r.same_city(&c.city)));

            let choice = match choices.len() {
                0 => {
                    output::print_results(&state);
                    return Ok(());
                }
                1 => choices.remove(0),
                _ => Select::new("Which city?", choices).prompt()?,
            };

            if coordinator.add_favorite(&choice.city) {
                println!("♥ {} is a favorite.", choice.city);
            }
            output::drain_notifications(&mut notifications);
        }
        FavoritesAction::Remove => {
            let store = JsonFavoritesStore::new(Config::favorites_file_path()?);
            let favorites = store.list_or_empty();
            if favorites.is_empty() {
                output::print_favorites(&favorites);
                return Ok(());
            }

            let city = Select::new("Remove which favorite?", favorites).prompt()?;
            match remove_favorite(&store, &city) {
                Ok(line) => println!("{line}"),
                Err(line) => eprintln!("{line}"),
            }
        }
    }

    Ok(())
}

/// Rendered favorites list. An unreadable store lists as empty.
fn favorites_listing(store: &dyn FavoritesStore) -> String {
    output::favorites_text(&store.list_or_empty())
}

/// Outcome line for removing `city`; `Err` holds the line for stderr.
fn remove_favorite(store: &dyn FavoritesStore, city: &City) -> Result<String, String> {
    match store.remove(city) {
        Ok(true) => Ok(format!("Removed {city} from favorites.")),
        Ok(false) => Ok(format!("{city} is not a favorite.")),
        Err(err) => {
            tracing::warn!(city = %city.name, error = %err, "failed to remove favorite");
            Err(format!("! Couldn't remove {} from favorites.", city.name))
        }
    }
}

pub async fn show_forecast(
    config: &Config,
    name: &str,
    latitude: f64,
    longitude: f64,
    units: Units,
) -> anyhow::Result<()> {
    let provider = forecast_provider_from_config(config)?;
    let forecast = provider
        .forecast(latitude, longitude, units)
        .await
        .with_context(|| format!("Failed to fetch forecast for {name}"))?;

    output::print_forecast(name, &forecast, units);
    Ok(())
}
