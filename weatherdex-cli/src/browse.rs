//! Interactive search screen.
//!
//! Each pass of the loop is one visit to the main screen: favorites are
//! re-read, the user types a query, picks a result or a favorite and lands on
//! its detail view. Leaving the detail view re-activates the main screen.

use std::fmt;

use anyhow::Context;
use inquire::{Select, Text};
use weatherdex_core::{City, CitySearchCoordinator, Config};

use crate::{cli::show_forecast, output};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetailAction {
    AddFavorite,
    RemoveFavorite,
    Back,
}

impl fmt::Display for DetailAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DetailAction::AddFavorite => "Add to favorites",
            DetailAction::RemoveFavorite => "Remove from favorites",
            DetailAction::Back => "Back",
        })
    }
}

pub async fn run(config: &Config) -> anyhow::Result<()> {
    let coordinator = CitySearchCoordinator::from_config(config)?;
    let mut notifications = coordinator.notifications();

    loop {
        coordinator.on_activate();
        let state = coordinator.state();
        output::print_favorites(&state.favorites);

        let Some(input) = Text::new("City:")
            .with_initial_value(&state.query)
            .with_help_message("leave empty to pick a favorite, Esc to quit")
            .prompt_skippable()
            .context("Failed to read query")?
        else {
            break;
        };

        coordinator.on_query_changed(&input);
        let state = coordinator.settled().await;
        output::drain_notifications(&mut notifications);

        let choices = output::choices(&state);
        if choices.is_empty() {
            output::print_results(&state);
            continue;
        }

        let Some(choice) = Select::new("Open:", choices)
            .prompt_skippable()
            .context("Failed to read selection")?
        else {
            continue;
        };

        detail(config, &coordinator, &choice.city).await?;
        output::drain_notifications(&mut notifications);
    }

    coordinator.shutdown();
    Ok(())
}

async fn detail(config: &Config, coordinator: &CitySearchCoordinator, city: &City) -> anyhow::Result<()> {
    let target = coordinator.open_detail(city);

    if let Err(err) = show_forecast(config, &target.name, target.latitude, target.longitude, config.units).await {
        tracing::warn!(error = %err, "forecast unavailable");
        eprintln!("! {err:#}");
    }

    loop {
        let toggle = if coordinator.is_favorite(city) {
            DetailAction::RemoveFavorite
        } else {
            DetailAction::AddFavorite
        };

        let action = Select::new(&format!("{city}"), vec![toggle, DetailAction::Back])
            .prompt_skippable()
            .context("Failed to read action")?
            .unwrap_or(DetailAction::Back);

        match action {
            DetailAction::AddFavorite => {
                coordinator.add_favorite(city);
            }
            DetailAction::RemoveFavorite => {
                coordinator.remove_favorite(city);
            }
            DetailAction::Back => return Ok(()),
        }
    }
}
