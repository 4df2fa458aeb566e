use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

const RAW_FORMAT: &str = "%Y%m%d%H%M%S";
const HUMAN_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fixed AEST offset, in seconds. No daylight-saving rules are applied.
const AEST_OFFSET_SECS: i32 = 10 * 3600;

/// How upstream timestamps are presented in the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeMode {
    /// Report the timestamp as UTC, unchanged.
    #[default]
    Utc,
    /// Shift by a fixed +10:00 and label the ISO form with that offset.
    Aest,
}

impl TimeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeMode::Utc => "utc",
            TimeMode::Aest => "aest",
        }
    }

    fn offset(&self) -> Option<FixedOffset> {
        match self {
            TimeMode::Utc => None,
            TimeMode::Aest => FixedOffset::east_opt(AEST_OFFSET_SECS),
        }
    }
}

impl std::fmt::Display for TimeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TimeMode {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "utc" => Ok(TimeMode::Utc),
            "aest" => Ok(TimeMode::Aest),
            _ => Err(anyhow::anyhow!("Unknown time mode '{value}'. Supported modes: utc, aest.")),
        }
    }
}

/// A timestamp rendered both for people and for machines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTime {
    pub human: String,
    pub iso: String,
}

/// Parse a 14-digit `YYYYMMDDHHMMSS` UTC timestamp.
pub fn parse_raw(raw: &str) -> Option<DateTime<Utc>> {
    if raw.len() != 14 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    NaiveDateTime::parse_from_str(raw, RAW_FORMAT).ok().map(|ndt| ndt.and_utc())
}

/// Normalize an upstream timestamp. `None` means the value could not be parsed.
pub fn normalize(raw: &str, mode: TimeMode) -> Option<NormalizedTime> {
    let utc = parse_raw(raw)?;

    let normalized = match mode.offset() {
        None => NormalizedTime {
            human: utc.format(HUMAN_FORMAT).to_string(),
            iso: utc.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        },
        Some(offset) => {
            let shifted = utc.with_timezone(&offset);
            NormalizedTime {
                human: shifted.format(HUMAN_FORMAT).to_string(),
                iso: shifted.format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
            }
        }
    };

    Some(normalized)
}
