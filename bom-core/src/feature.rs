use chrono::{DateTime, SecondsFormat, Utc};
use geojson::{Feature, Geometry, JsonObject, JsonValue, Value};

use crate::{model::Observation, timestamp::NormalizedTime};

/// Everything needed to turn one selected observation into a Feature.
#[derive(Debug, Clone)]
pub struct FeatureInput<'a> {
    pub station: &'a str,
    pub observation: &'a Observation,
    pub time: &'a NormalizedTime,
    /// Set to inject a `last_updated` property.
    pub heartbeat: Option<DateTime<Utc>>,
}

fn or_null(value: &Option<JsonValue>) -> JsonValue {
    value.clone().unwrap_or(JsonValue::Null)
}

impl From<FeatureInput<'_>> for Feature {
    fn from(input: FeatureInput<'_>) -> Feature {
        let obs = input.observation;
        let lnglat: Vec<f64> = vec![obs.longitude(), obs.latitude()];
        let geometry = Geometry::new(Value::Point(lnglat));

        let mut properties = JsonObject::new();
        properties.insert("station".to_string(), JsonValue::from(input.station));
        properties.insert("timestamp".to_string(), JsonValue::from(input.time.human.as_str()));
        properties.insert("timestamp_iso".to_string(), JsonValue::from(input.time.iso.as_str()));
        properties.insert(
            "rainfall_mm".to_string(),
            obs.rain_trace.clone().unwrap_or_else(|| JsonValue::from(0)),
        );
        properties.insert("humidity_%".to_string(), or_null(&obs.rel_hum));
        properties.insert("dew_point_C".to_string(), or_null(&obs.dewpt));
        properties.insert("air_temp_C".to_string(), or_null(&obs.air_temp));
        properties.insert("feels_like_C".to_string(), or_null(&obs.apparent_t));
        properties.insert("wind_dir".to_string(), or_null(&obs.wind_dir));
        properties.insert("wind_speed_kmh".to_string(), or_null(&obs.wind_spd_kmh));
        properties.insert("wind_gust_kmh".to_string(), or_null(&obs.wind_gust_kmh));

        if let Some(now) = input.heartbeat {
            properties.insert(
                "last_updated".to_string(),
                JsonValue::from(now.to_rfc3339_opts(SecondsFormat::Secs, true)),
            );
        }

        Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}
