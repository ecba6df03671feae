//! Road weather stations from the Trafikinfo API as smart-home devices.
//!
//! This crate defines:
//! - An HTTP client for the XML-query / JSON-response Trafikinfo API
//! - Polling devices that map observations onto capability values
//! - Station search for pairing new devices
//!
//! The host runtime supplies settings, capabilities, images, translations
//! and geolocation through the traits in [`host`].

pub mod client;
pub mod compass;
pub mod conditions;
pub mod config;
pub mod device;
pub mod diagnostics;
pub mod enums;
pub mod error;
pub mod host;
pub mod json_path;
pub mod model;
pub mod pairing;

pub use client::{ClientOptions, StationApi, TrafikinfoClient};
pub use compass::CompassPoint;
pub use config::Config;
pub use device::{PollOutcome, WeatherDevice};
pub use error::{ApiError, HostError, TransportKind};
pub use host::{DeviceHost, DeviceIdentity};
pub use model::{
    CameraImage, CameraRecord, CapabilityValue, Observation, Readings, StationQuery,
    StationRecord, Wgs84Point,
};
pub use pairing::{PairingCandidate, PairingSession};
