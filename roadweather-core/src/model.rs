use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::json_path::{number_or, str_at};
use crate::path;

/// A WGS84 position. The provider writes it as WKT, longitude first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wgs84Point {
    pub longitude: f64,
    pub latitude: f64,
}

impl FromStr for Wgs84Point {
    type Err = String;

    /// Parses `POINT (13.0590207 55.6955307)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .strip_prefix("POINT")
            .map(str::trim)
            .and_then(|rest| rest.strip_prefix('('))
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| format!("not a WKT point: '{s}'"))?;

        let mut coords = inner.split_whitespace().map(str::parse::<f64>);
        match (coords.next(), coords.next()) {
            (Some(Ok(longitude)), Some(Ok(latitude))) => Ok(Self {
                longitude,
                latitude,
            }),
            _ => Err(format!("invalid coordinates in '{s}'")),
        }
    }
}

impl fmt::Display for Wgs84Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "POINT ({} {})", self.longitude, self.latitude)
    }
}

/// Parameters of a pairing-time station search.
#[derive(Debug, Clone, PartialEq)]
pub struct StationQuery {
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: u32,
}

/// A weather measure point as returned by a search. Its `id` becomes the
/// identity of a paired device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    #[serde(rename = "Id", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Geometry", default, deserialize_with = "wgs84_geometry")]
    pub geometry: Option<Wgs84Point>,
}

/// A road camera near a station.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CameraRecord {
    #[serde(rename = "Id", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "PhotoUrl", default)]
    pub photo_url: Option<String>,
    #[serde(rename = "HasFullSizePhoto", default)]
    pub has_full_size_photo: bool,
}

impl CameraRecord {
    /// URL of the photo, pointing at the full size variant when there is one.
    pub fn image_url(&self) -> Option<String> {
        let url = self.photo_url.as_deref()?;
        if self.has_full_size_photo {
            Some(format!("{url}?type=fullsize"))
        } else {
            Some(url.to_owned())
        }
    }
}

/// Measured values of one observation. Missing sensors read as `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Readings {
    pub air_temperature: f64,
    pub surface_temperature: f64,
    pub relative_humidity: f64,
    pub wind_speed: f64,
    pub wind_direction_degrees: f64,
    pub wind_gust_speed: f64,
    pub rain_sum: f64,
    pub snow_sum_solid: f64,
    pub total_water_equivalent: f64,
}

impl Readings {
    /// Extract readings from the `Observation` object of a measure point.
    pub fn from_observation(observation: &Value) -> Self {
        let read = |path: &[crate::json_path::Segment<'_>]| number_or(observation, path, 0.0);

        Self {
            air_temperature: read(&path!["Air", "Temperature", "Value"]),
            surface_temperature: read(&path!["Surface", "Temperature", "Value"]),
            relative_humidity: read(&path!["Air", "RelativeHumidity", "Value"]),
            wind_speed: read(&path!["Wind", 0, "Speed", "Value"]),
            wind_direction_degrees: read(&path!["Wind", 0, "Direction", "Value"]),
            wind_gust_speed: read(&path!["Aggregated30minutes", "Wind", "SpeedMax", "Value"]),
            rain_sum: read(&path!["Aggregated30minutes", "Precipitation", "RainSum", "Value"]),
            snow_sum_solid: read(&path![
                "Aggregated30minutes",
                "Precipitation",
                "SnowSum",
                "Solid",
                "Value"
            ]),
            total_water_equivalent: read(&path![
                "Aggregated30minutes",
                "Precipitation",
                "TotalWaterEquivalent",
                "Value"
            ]),
        }
    }
}

/// Snapshot of a station fetched by one poll. Replaced wholesale on the
/// next poll, never updated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub id: String,
    pub name: String,
    pub geometry: Option<Wgs84Point>,
    pub modified_time: Option<DateTime<Utc>>,
    pub readings: Readings,
    /// The measure point exactly as received, kept for diagnostics.
    pub raw: Value,
}

impl Observation {
    pub fn from_measurepoint(measurepoint: Value) -> Result<Self, String> {
        let station: StationRecord = serde_json::from_value(measurepoint.clone())
            .map_err(|e| format!("invalid measure point: {e}"))?;

        let readings = measurepoint
            .get("Observation")
            .map(Readings::from_observation)
            .unwrap_or_default();

        let modified_time = str_at(&measurepoint, &path!["ModifiedTime"])
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(Self {
            id: station.id,
            name: station.name,
            geometry: station.geometry,
            modified_time,
            readings,
            raw: measurepoint,
        })
    }
}

/// Scalar held by a device capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapabilityValue {
    Number(f64),
    Text(String),
}

impl CapabilityValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CapabilityValue::Number(n) => Some(*n),
            CapabilityValue::Text(_) => None,
        }
    }
}

impl From<f64> for CapabilityValue {
    fn from(value: f64) -> Self {
        CapabilityValue::Number(value)
    }
}

impl From<String> for CapabilityValue {
    fn from(value: String) -> Self {
        CapabilityValue::Text(value)
    }
}

impl fmt::Display for CapabilityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityValue::Number(n) => write!(f, "{n}"),
            CapabilityValue::Text(s) => f.write_str(s),
        }
    }
}

/// A camera image tracked by a device. The URL is fixed once set, only
/// the rendered photo behind it is refreshed.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraImage {
    pub id: String,
    pub name: String,
    pub url: String,
    pub last_refreshed: Option<DateTime<Utc>>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn wgs84_geometry<'de, D>(deserializer: D) -> Result<Option<Wgs84Point>, D::Error>
where
    D: Deserializer<'de>,
{
    let geometry = Option::<Value>::deserialize(deserializer)?;
    Ok(geometry
        .as_ref()
        .and_then(|g| str_at(g, &path!["WGS84"]))
        .and_then(|wkt| wkt.parse().ok()))
}
