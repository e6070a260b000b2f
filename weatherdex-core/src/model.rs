use serde::{Deserialize, Serialize};
use std::fmt;

/// A city candidate returned by a lookup provider or stored as a favorite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    /// `None` when the provider does not report a population.
    #[serde(default)]
    pub population: Option<u64>,
}

impl City {
    pub fn new(name: impl Into<String>, country: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            latitude,
            longitude,
            population: None,
        }
    }

    pub fn with_population(mut self, population: u64) -> Self {
        self.population = Some(population);
        self
    }

    /// Identity used to deduplicate and match cities across search and favorites.
    pub fn key(&self) -> CityKey {
        CityKey::new(&self.name, self.latitude, self.longitude)
    }

    pub fn same_city(&self, other: &City) -> bool {
        self.key() == other.key()
    }

    pub fn detail_target(&self) -> DetailTarget {
        DetailTarget {
            name: self.name.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// Population line for display, absent when unknown.
    pub fn population_label(&self) -> Option<String> {
        self.population.map(|p| format!("Population: {}", group_thousands(p)))
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.country)
    }
}

/// `(name, latitude, longitude)` with total equality over the coordinate bits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CityKey {
    name: String,
    latitude_bits: u64,
    longitude_bits: u64,
}

impl CityKey {
    pub fn new(name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.to_string(),
            latitude_bits: normalized_bits(latitude),
            longitude_bits: normalized_bits(longitude),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

// -0.0 and 0.0 must map to the same key.
fn normalized_bits(value: f64) -> u64 {
    (value + 0.0).to_bits()
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Parameters handed to the detail view when a city is selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailTarget {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Unit system requested from the forecast provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Standard => "standard",
        }
    }

    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
            Units::Standard => "K",
        }
    }

    pub fn speed_suffix(&self) -> &'static str {
        match self {
            Units::Imperial => "mph",
            Units::Metric | Units::Standard => "m/s",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            "standard" => Ok(Units::Standard),
            _ => Err(anyhow::anyhow!(
                "Unknown units '{value}'. Supported units: metric, imperial, standard."
            )),
        }
    }
}
