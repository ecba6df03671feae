//! Finding a station to pair as a new device.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::{
    client::StationApi,
    config::PairingConfig,
    host::Geolocation,
    model::{StationQuery, StationRecord},
};

/// Opaque payload the host stores with a new device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceData {
    pub id: String,
}

/// One entry in the host's device list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairingCandidate {
    pub name: String,
    pub data: DeviceData,
}

impl From<StationRecord> for PairingCandidate {
    fn from(station: StationRecord) -> Self {
        Self {
            name: station.name,
            data: DeviceData { id: station.id },
        }
    }
}

/// Run one station search and project the hits into pairing candidates.
///
/// A query with a name searches by name prefix, otherwise by position.
/// Failures are logged and come back as an empty list.
pub async fn search(api: &dyn StationApi, query: &StationQuery) -> Vec<PairingCandidate> {
    let result = match query.name.as_deref() {
        Some(name) => {
            info!("Searching for a specific station by name '{name}'");
            api.search_stations_by_name(name).await
        }
        None => {
            info!(
                "Searching for stations within {}m of ({}, {})",
                query.radius_meters, query.latitude, query.longitude
            );
            api.search_stations_by_location(query.latitude, query.longitude, query.radius_meters)
                .await
        }
    };

    match result {
        Ok(stations) => {
            if stations.is_empty() {
                info!("No weather stations received in API response");
            }
            stations.into_iter().map(PairingCandidate::from).collect()
        }
        Err(e) => {
            error!("Failed to get weather stations: {e}");
            Vec::new()
        }
    }
}

/// State of one pairing flow: the settings step may record a name, the
/// list step consumes it.
#[derive(Debug)]
pub struct PairingSession {
    api: Arc<dyn StationApi>,
    geolocation: Arc<dyn Geolocation>,
    config: PairingConfig,
    station_name: Option<String>,
}

impl PairingSession {
    pub fn new(
        api: Arc<dyn StationApi>,
        geolocation: Arc<dyn Geolocation>,
        config: PairingConfig,
    ) -> Self {
        Self {
            api,
            geolocation,
            config,
            station_name: None,
        }
    }

    /// Settings step. A blank name means "search near the host".
    pub fn set_station_name(&mut self, name: Option<&str>) {
        self.station_name = name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned);

        match &self.station_name {
            Some(name) => info!("User wants to search for '{name}'"),
            None => info!("User decided to search for stations nearby host location"),
        }
    }

    /// List step. The remembered name is used once and then cleared.
    pub async fn list_devices(&mut self) -> Vec<PairingCandidate> {
        let query = StationQuery {
            name: self.station_name.take(),
            latitude: self.geolocation.latitude(),
            longitude: self.geolocation.longitude(),
            radius_meters: self.config.search_radius_meters,
        };

        search(self.api.as_ref(), &query).await
    }
}
