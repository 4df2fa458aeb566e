//! Fetch → parse → select → normalize → assemble → write.
//!
//! Stations are handled one at a time, in table order. A failure at any step
//! only drops that station; the collection is always produced.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use geojson::{Feature, FeatureCollection};
use serde::{Deserialize, Serialize};
use serde_json::{Value, ser::PrettyFormatter};
use std::{convert::TryFrom, fs, path::Path};

use crate::{
    config::Config,
    error::StationError,
    feature::FeatureInput,
    model::{Observation, StationEntry, StationResponse},
    source::ObservationSource,
    timestamp::{self, TimeMode},
};

/// Which end of `observations.data` holds the latest reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    /// The upstream lists readings newest first.
    #[default]
    First,
    Last,
}

impl Selection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Selection::First => "first",
            Selection::Last => "last",
        }
    }

    pub fn pick<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        match self {
            Selection::First => items.first(),
            Selection::Last => items.last(),
        }
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Selection {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "first" => Ok(Selection::First),
            "last" => Ok(Selection::Last),
            _ => Err(anyhow::anyhow!("Unknown selection '{value}'. Supported values: first, last.")),
        }
    }
}

/// The per-run knobs that shape each feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub selection: Selection,
    pub time_mode: TimeMode,
    pub heartbeat: bool,
}

impl From<&Config> for RunOptions {
    fn from(config: &Config) -> Self {
        Self {
            selection: config.selection,
            time_mode: config.time_mode,
            heartbeat: config.heartbeat,
        }
    }
}

/// A station that produced no feature, and why.
#[derive(Debug)]
pub struct Skipped {
    pub station: String,
    pub error: StationError,
}

/// Outcome of one pass over the station table.
#[derive(Debug)]
pub struct RunReport {
    pub collection: FeatureCollection,
    pub skipped: Vec<Skipped>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.collection.features.len()
    }
}

/// Pull `observations.data` out of a body and pick the latest reading.
pub fn select_observation(body: &str, selection: Selection) -> Result<Observation, StationError> {
    let parsed: StationResponse = serde_json::from_str(body)?;

    let data = parsed
        .observations
        .and_then(|o| o.data)
        .ok_or(StationError::MissingData)?;

    let raw: &Value = selection.pick(&data).ok_or(StationError::EmptyData)?;

    Observation::deserialize(raw).map_err(StationError::Observation)
}

/// Turn one station body into its feature.
pub fn process_body(
    station: &StationEntry,
    body: &str,
    options: RunOptions,
    now: DateTime<Utc>,
) -> Result<Feature, StationError> {
    let observation = select_observation(body, options.selection)?;

    let raw_time = observation.local_date_time_full.as_deref();
    let time = raw_time
        .and_then(|raw| timestamp::normalize(raw, options.time_mode))
        .ok_or_else(|| StationError::Timestamp(raw_time.map(str::to_owned)))?;

    Ok(FeatureInput {
        station: &station.name,
        observation: &observation,
        time: &time,
        heartbeat: options.heartbeat.then_some(now),
    }
    .into())
}

/// Fetch and process every station in order.
pub async fn collect(
    source: &dyn ObservationSource,
    stations: &[StationEntry],
    options: RunOptions,
    now: DateTime<Utc>,
) -> RunReport {
    let mut features = Vec::with_capacity(stations.len());
    let mut skipped = Vec::new();

    for station in stations {
        let outcome = match source.fetch(station).await {
            Ok(body) => process_body(station, &body, options, now),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(feature) => {
                tracing::info!(station = %station.name, "data added");
                features.push(feature);
            }
            Err(error) => {
                tracing::warn!(station = %station.name, %error, "station skipped");
                skipped.push(Skipped { station: station.name.clone(), error });
            }
        }
    }

    RunReport {
        collection: FeatureCollection { bbox: None, features, foreign_members: None },
        skipped,
    }
}

/// Render a collection the way it is written to disk: 4-space indented UTF-8 JSON.
pub fn render_collection(collection: &FeatureCollection) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    collection.serialize(&mut ser).context("Failed to serialize FeatureCollection")?;
    Ok(buf)
}

/// Write the collection to `path`, replacing whatever was there.
pub fn write_collection(path: &Path, collection: &FeatureCollection) -> Result<()> {
    let bytes = render_collection(collection)?;

    fs::write(path, bytes)
        .with_context(|| format!("Failed to write GeoJSON output: {}", path.display()))?;

    Ok(())
}

/// One full run: collect from `source` per `config`, then write the output file.
///
/// The report is returned alongside the write result so callers can still
/// summarise what was gathered when the write fails.
pub async fn run(
    source: &dyn ObservationSource,
    config: &Config,
    now: DateTime<Utc>,
) -> (RunReport, Result<()>) {
    let report = collect(source, &config.stations, RunOptions::from(config), now).await;

    let written = write_collection(&config.output, &report.collection);
    match &written {
        Ok(()) => tracing::info!(
            path = %config.output.display(),
            features = report.succeeded(),
            skipped = report.skipped.len(),
            "output written"
        ),
        Err(e) => tracing::error!(path = %config.output.display(), "{e:#}"),
    }

    (report, written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use chrono::TimeZone;
    use serde_json::json;

    fn body(timestamps: &[&str]) -> String {
        let data: Vec<Value> = timestamps
            .iter()
            .map(|t| json!({"local_date_time_full": t, "lat": -27.5, "lon": 153.0, "air_temp": 25.0}))
            .collect();
        json!({"observations": {"data": data}}).to_string()
    }

    fn station(name: &str) -> StationEntry {
        StationEntry::new(name, format!("http://test/{name}.json"))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 4, 0, 0, 0).unwrap()
    }

    fn props(feature: &Feature) -> &geojson::JsonObject {
        feature.properties.as_ref().unwrap()
    }

    #[test]
    fn selection_picks_either_end() {
        let items = [1, 2, 3];
        assert_eq!(Selection::First.pick(&items), Some(&1));
        assert_eq!(Selection::Last.pick(&items), Some(&3));
        assert_eq!(Selection::First.pick::<i32>(&[]), None);
    }

    #[test]
    fn selection_str_roundtrip() {
        for sel in [Selection::First, Selection::Last] {
            assert_eq!(Selection::try_from(sel.as_str()).unwrap(), sel);
        }
        assert!(Selection::try_from("middle").unwrap_err().to_string().contains("Unknown selection"));
    }

    #[test]
    fn first_and_last_select_different_readings() {
        let b = body(&["20250303133000", "20250303130000"]);

        let first = select_observation(&b, Selection::First).unwrap();
        let last = select_observation(&b, Selection::Last).unwrap();

        assert_eq!(first.local_date_time_full.as_deref(), Some("20250303133000"));
        assert_eq!(last.local_date_time_full.as_deref(), Some("20250303130000"));
    }

    #[test]
    fn shape_errors_are_classified() {
        assert!(matches!(select_observation("not json", Selection::First), Err(StationError::Json(_))));
        assert!(matches!(select_observation("{}", Selection::First), Err(StationError::MissingData)));
        assert!(matches!(
            select_observation(r#"{"observations":{"header":[]}}"#, Selection::First),
            Err(StationError::MissingData)
        ));
        assert!(matches!(
            select_observation(r#"{"observations":{"data":[]}}"#, Selection::Last),
            Err(StationError::EmptyData)
        ));
        assert!(matches!(
            select_observation(r#"{"observations":{"data":[42]}}"#, Selection::First),
            Err(StationError::Observation(_))
        ));
    }

    #[test]
    fn bad_timestamp_skips_station() {
        let s = station("Canungra");
        let opts = RunOptions::default();

        let err = process_body(&s, &body(&["2025-03-03"]), opts, now()).unwrap_err();
        assert!(matches!(err, StationError::Timestamp(Some(ref raw)) if raw == "2025-03-03"));

        let missing = json!({"observations": {"data": [{"air_temp": 20.0}]}}).to_string();
        let err = process_body(&s, &missing, opts, now()).unwrap_err();
        assert!(matches!(err, StationError::Timestamp(None)));
    }

    #[test]
    fn string_coordinates_do_not_drop_the_station() {
        let s = station("Tin Can Bay");
        let quoted = json!({"observations": {"data": [
            {"local_date_time_full": "20250303133000", "lat": "-25.9", "lon": 153.0}
        ]}})
        .to_string();
        let placeholder = json!({"observations": {"data": [
            {"local_date_time_full": "20250303133000", "lat": "-", "lon": "-"}
        ]}})
        .to_string();

        let feature = process_body(&s, &quoted, RunOptions::default(), now()).unwrap();
        assert_eq!(feature.geometry.unwrap().value, geojson::Value::Point(vec![153.0, -25.9]));

        let feature = process_body(&s, &placeholder, RunOptions::default(), now()).unwrap();
        assert_eq!(feature.geometry.unwrap().value, geojson::Value::Point(vec![0.0, 0.0]));
    }

    #[test]
    fn aest_mode_shifts_feature_times() {
        let opts = RunOptions { time_mode: TimeMode::Aest, ..RunOptions::default() };

        let feature = process_body(&station("Amberley"), &body(&["20250303133000"]), opts, now()).unwrap();

        assert_eq!(props(&feature)["timestamp"], "2025-03-03 23:30:00");
        assert_eq!(props(&feature)["timestamp_iso"], "2025-03-03T23:30:00+10:00");
    }

    #[tokio::test]
    async fn one_feature_per_good_station() {
        let stations = vec![station("A"), station("B"), station("C"), station("D"), station("E")];
        let source = MemorySource::new()
            .with_body(&stations[0].url, body(&["20250303133000", "20250303130000"]))
            .with_body(&stations[1].url, "")
            .with_body(&stations[2].url, "{ not json")
            .with_body(&stations[3].url, r#"{"observations":{}}"#)
            .with_body(&stations[4].url, body(&["20250303120000"]));

        let report = collect(&source, &stations, RunOptions::default(), now()).await;

        assert_eq!(report.succeeded(), 2);
        let names: Vec<_> = report.collection.features.iter().map(|f| props(f)["station"].clone()).collect();
        assert_eq!(names, vec![json!("A"), json!("E")]);

        let skipped: Vec<_> = report.skipped.iter().map(|s| s.station.as_str()).collect();
        assert_eq!(skipped, vec!["B", "C", "D"]);
        assert!(matches!(report.skipped[0].error, StationError::EmptyBody));
        assert!(matches!(report.skipped[1].error, StationError::Json(_)));
        assert!(matches!(report.skipped[2].error, StationError::MissingData));
    }

    #[tokio::test]
    async fn unreachable_stations_are_skipped() {
        let stations = vec![station("Gone")];

        let report = collect(&MemorySource::new(), &stations, RunOptions::default(), now()).await;

        assert_eq!(report.succeeded(), 0);
        assert!(matches!(report.skipped[0].error, StationError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn zero_successes_still_write_a_collection() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            output: dir.path().join("out.geojson"),
            stations: vec![station("A")],
            ..Config::default()
        };

        let (report, written) = run(&MemorySource::new(), &config, now()).await;
        written.unwrap();
        assert_eq!(report.succeeded(), 0);

        let text = fs::read_to_string(&config.output).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"], json!([]));
        assert!(text.contains("\n    \"features\""));
    }

    #[tokio::test]
    async fn reruns_are_identical_without_heartbeat() {
        let dir = tempfile::tempdir().unwrap();
        let stations = vec![station("A")];
        let source = MemorySource::new().with_body(&stations[0].url, body(&["20250303133000"]));
        let config = Config { output: dir.path().join("out.geojson"), stations, ..Config::default() };

        run(&source, &config, now()).await.1.unwrap();
        let first = fs::read(&config.output).unwrap();

        let later = now() + chrono::Duration::hours(1);
        run(&source, &config, later).await.1.unwrap();
        let second = fs::read(&config.output).unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn heartbeat_changes_output_between_runs() {
        let dir = tempfile::tempdir().unwrap();
        let stations = vec![station("A")];
        let source = MemorySource::new().with_body(&stations[0].url, body(&["20250303133000"]));
        let config = Config {
            output: dir.path().join("out.geojson"),
            stations,
            heartbeat: true,
            ..Config::default()
        };

        let (report, _) = run(&source, &config, now()).await;
        assert_eq!(props(&report.collection.features[0])["last_updated"], "2025-03-04T00:00:00Z");
        let first = fs::read(&config.output).unwrap();

        run(&source, &config, now() + chrono::Duration::seconds(1)).await.1.unwrap();
        let second = fs::read(&config.output).unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn write_failure_is_reported_with_report_intact() {
        let dir = tempfile::tempdir().unwrap();
        let stations = vec![station("A")];
        let source = MemorySource::new().with_body(&stations[0].url, body(&["20250303133000"]));
        let config = Config {
            output: dir.path().join("missing-dir").join("out.geojson"),
            stations,
            ..Config::default()
        };

        let (report, written) = run(&source, &config, now()).await;

        assert_eq!(report.succeeded(), 1);
        let err = written.unwrap_err();
        assert!(err.to_string().contains("Failed to write GeoJSON output"));
    }
}
