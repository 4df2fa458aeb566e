use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named observation source and the endpoint its readings are published at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationEntry {
    pub name: String,
    pub url: String,
}

impl StationEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self { name: name.into(), url: url.into() }
    }
}

/// One reading as published upstream.
///
/// Weather values are kept as raw JSON so they reach the output exactly as the
/// station reported them (numbers, `"-"` placeholders, nulls). Coordinates are
/// read leniently through [`Observation::latitude`] and [`Observation::longitude`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Observation {
    #[serde(default)]
    pub local_date_time_full: Option<String>,
    #[serde(default)]
    pub lat: Option<Value>,
    #[serde(default)]
    pub lon: Option<Value>,
    #[serde(default)]
    pub air_temp: Option<Value>,
    #[serde(default)]
    pub apparent_t: Option<Value>,
    #[serde(default)]
    pub dewpt: Option<Value>,
    #[serde(default)]
    pub rel_hum: Option<Value>,
    #[serde(default)]
    pub wind_dir: Option<Value>,
    #[serde(default)]
    pub wind_spd_kmh: Option<Value>,
    #[serde(default)]
    pub wind_gust_kmh: Option<Value>,
    #[serde(default)]
    pub rain_trace: Option<Value>,
}

impl Observation {
    pub fn latitude(&self) -> f64 {
        coordinate(self.lat.as_ref())
    }

    pub fn longitude(&self) -> f64 {
        coordinate(self.lon.as_ref())
    }
}

/// GeoJSON positions must be numeric: numbers and numeric strings are read,
/// anything else (missing, `"-"`, null) becomes 0.
fn coordinate(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
    .unwrap_or(0.0)
}

/// Top-level upstream body: `{"observations": {"data": [...]}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct StationResponse {
    pub observations: Option<ObservationBlock>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ObservationBlock {
    pub data: Option<Vec<Value>>,
}
