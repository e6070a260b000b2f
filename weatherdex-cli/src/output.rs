use std::fmt;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use tokio::sync::broadcast::Receiver;
use weatherdex_core::{City, DailyForecast, Forecast, Notification, SearchState, Units};

/// One selectable line in a city list.
#[derive(Debug, Clone)]
pub struct CityChoice {
    pub city: City,
    pub favorite: bool,
}

impl fmt::Display for CityChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.favorite { "♥ " } else { "  " })?;
        write!(f, "{}", self.city)?;
        if let Some(population) = self.city.population_label() {
            write!(f, " · {population}")?;
        }
        Ok(())
    }
}

/// Search results first, then favorites, as the main screen lists them.
pub fn choices(state: &SearchState) -> Vec<CityChoice> {
    let results = state.results.iter().map(|city| CityChoice {
        city: city.clone(),
        favorite: state.is_favorite(city),
    });
    let favorites = state
        .favorites
        .iter()
        .filter(|fav| !state.results.iter().any(|c| c.same_city(fav)))
        .map(|city| CityChoice { city: city.clone(), favorite: true });

    results.chain(favorites).collect()
}

pub fn print_results(state: &SearchState) {
    if state.query.trim().is_empty() {
        println!("Enter a city name to search.");
    } else if state.results.is_empty() {
        println!("No cities found for \"{}\".", state.query.trim());
    } else {
        for city in &state.results {
            println!("{}", CityChoice { city: city.clone(), favorite: state.is_favorite(city) });
        }
    }
}

pub fn print_favorites(favorites: &[City]) {
    println!("{}", favorites_text(favorites));
}

pub fn favorites_text(favorites: &[City]) -> String {
    if favorites.is_empty() {
        return "No favorited cities yet.".to_string();
    }

    let mut text = String::from("Favorited Cities");
    for city in favorites {
        text.push('\n');
        text.push_str(&CityChoice { city: city.clone(), favorite: true }.to_string());
    }
    text
}

/// Shows every notification that arrived since the last call, once.
pub fn drain_notifications(rx: &mut Receiver<Notification>) {
    while let Ok(notification) = rx.try_recv() {
        eprintln!("! {}", notification.message);
    }
}

pub fn print_forecast(name: &str, forecast: &Forecast, units: Units) {
    let offset = forecast
        .timezone_offset
        .and_then(|secs| i32::try_from(secs).ok())
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix());

    match &forecast.timezone {
        Some(tz) => println!("{name} ({tz})"),
        None => println!("{name}"),
    }

    if forecast.days().is_empty() {
        println!("  No daily forecast available.");
        return;
    }

    for day in forecast.days() {
        println!("{}", day_line(day, offset, units));
        if let Some(details) = detail_line(day, offset, units) {
            println!("    {details}");
        }
    }
}

fn day_line(day: &DailyForecast, offset: FixedOffset, units: Units) -> String {
    let date = day
        .time()
        .map(|t| local(t, offset).format("%a %d %b").to_string())
        .unwrap_or_else(|| "??? ?? ???".to_string());

    let temp = units.temperature_suffix();
    let range = match day.temp.as_ref().map(|t| (t.min, t.max)) {
        Some((Some(min), Some(max))) => format!("{min:>5.1}{temp} / {max:>5.1}{temp}"),
        Some((_, Some(max))) => format!("      ? / {max:>5.1}{temp}"),
        Some((Some(min), _)) => format!("{min:>5.1}{temp} /       ?"),
        _ => "      ? /       ?".to_string(),
    };

    let mut line = format!("  {date}  {range}");
    if let Some(summary) = day.summary() {
        line.push_str("  ");
        line.push_str(summary);
    }
    if let Some(pop) = day.pop {
        line.push_str(&format!("  rain {:.0}%", pop * 100.0));
    }
    line
}

fn detail_line(day: &DailyForecast, offset: FixedOffset, units: Units) -> Option<String> {
    let mut parts = Vec::new();

    if let Some(feels) = day.feels_like.as_ref().and_then(|f| f.day) {
        parts.push(format!("feels {feels:.1}{}", units.temperature_suffix()));
    }
    if let Some(humidity) = day.humidity {
        parts.push(format!("humidity {humidity}%"));
    }
    if let Some(speed) = day.wind_speed {
        let mut wind = format!("wind {speed:.1} {}", units.speed_suffix());
        if let Some(deg) = day.wind_deg {
            wind.push_str(&format!(" from {deg}°"));
        }
        if let Some(gust) = day.wind_gust {
            wind.push_str(&format!(", gusts {gust:.1}"));
        }
        parts.push(wind);
    }
    if let Some(pressure) = day.pressure {
        parts.push(format!("{pressure} hPa"));
    }
    if let Some(uvi) = day.uvi {
        parts.push(format!("UV {uvi:.1}"));
    }
    if let (Some(rise), Some(set)) = (day.sunrise_time(), day.sunset_time()) {
        parts.push(format!(
            "sun {}–{}",
            local(rise, offset).format("%H:%M"),
            local(set, offset).format("%H:%M")
        ));
    }

    if parts.is_empty() { None } else { Some(parts.join(", ")) }
}

fn local(time: DateTime<Utc>, offset: FixedOffset) -> DateTime<FixedOffset> {
    time.with_timezone(&offset)
}
