//! In-memory stand-ins for the host runtime and the station API.
#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use roadweather_core::{
    ApiError, CameraRecord, CapabilityValue, Config, DeviceHost, DeviceIdentity, HostError,
    Observation, StationApi, StationRecord, WeatherDevice,
    host::{
        CapabilityStore, Geolocation, ImageHost, ImageResource, SettingsStore, Translator,
        TriggerCard,
    },
};
use serde_json::json;

pub fn observation(snow: f64, wind_direction: f64) -> Observation {
    Observation::from_measurepoint(json!({
        "Id": "SE_STA_VVIS1211",
        "Name": "Löddeköpinge",
        "Observation": {
            "Air": { "Temperature": { "Value": -4.2 }, "RelativeHumidity": { "Value": 91.0 } },
            "Wind": [ { "Speed": { "Value": 5.3 }, "Direction": { "Value": wind_direction } } ],
            "Aggregated30minutes": {
                "Precipitation": { "SnowSum": { "Solid": { "Value": snow } } }
            }
        }
    }))
    .unwrap()
}

pub fn server_error() -> ApiError {
    ApiError::Api {
        object_type: "WeatherMeasurepoint".into(),
        status: 500,
        body: "Internal Server Error".into(),
    }
}

pub fn camera(id: &str, full_size: bool) -> CameraRecord {
    CameraRecord {
        id: id.into(),
        name: format!("Camera {id}"),
        photo_url: Some(format!("https://images.example/{id}.jpg")),
        has_full_size_photo: full_size,
    }
}

pub fn station(id: &str, name: &str) -> StationRecord {
    StationRecord {
        id: id.into(),
        name: name.into(),
        geometry: None,
    }
}

#[derive(Debug)]
pub struct FakeApi {
    observations: Mutex<VecDeque<Result<Observation, ApiError>>>,
    fallback: Mutex<Result<Observation, ApiError>>,
    pub cameras: Mutex<Result<Vec<CameraRecord>, ApiError>>,
    pub stations: Mutex<Result<Vec<StationRecord>, ApiError>>,
    pub delay: Mutex<Option<Duration>>,
    pub camera_delay: Mutex<Option<Duration>>,
    pub observation_calls: AtomicUsize,
    pub name_searches: Mutex<Vec<String>>,
    pub location_searches: Mutex<Vec<(f64, f64, u32)>>,
}

impl FakeApi {
    pub fn returning(result: Result<Observation, ApiError>) -> Arc<Self> {
        Arc::new(Self {
            observations: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(result),
            cameras: Mutex::new(Ok(Vec::new())),
            stations: Mutex::new(Ok(Vec::new())),
            delay: Mutex::new(None),
            camera_delay: Mutex::new(None),
            observation_calls: AtomicUsize::new(0),
            name_searches: Mutex::new(Vec::new()),
            location_searches: Mutex::new(Vec::new()),
        })
    }

    /// Queue results served before the fallback.
    pub fn queue(&self, result: Result<Observation, ApiError>) {
        self.observations.lock().unwrap().push_back(result);
    }

    pub fn set_fallback(&self, result: Result<Observation, ApiError>) {
        *self.fallback.lock().unwrap() = result;
    }

    pub fn calls(&self) -> usize {
        self.observation_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StationApi for FakeApi {
    async fn search_stations_by_name(&self, prefix: &str) -> Result<Vec<StationRecord>, ApiError> {
        self.name_searches.lock().unwrap().push(prefix.to_string());
        self.stations.lock().unwrap().clone()
    }

    async fn search_stations_by_location(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: u32,
    ) -> Result<Vec<StationRecord>, ApiError> {
        self.location_searches
            .lock()
            .unwrap()
            .push((latitude, longitude, radius_meters));
        self.stations.lock().unwrap().clone()
    }

    async fn fetch_station_observation(&self, _station_id: &str) -> Result<Observation, ApiError> {
        self.observation_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self.observations.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| self.fallback.lock().unwrap().clone())
    }

    async fn fetch_station_cameras(
        &self,
        _station_name: &str,
    ) -> Result<Vec<CameraRecord>, ApiError> {
        let delay = *self.camera_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.cameras.lock().unwrap().clone()
    }
}

#[derive(Debug, Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, String>>,
    pub writes: Mutex<Vec<(String, String)>>,
}

impl MemorySettings {
    pub fn with(key: &str, value: &str) -> Arc<Self> {
        let settings = Self::default();
        settings
            .values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Arc::new(settings)
    }

    pub fn writes_to(&self, key: &str) -> Vec<String> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .collect()
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    async fn set(&self, key: &str, value: String) -> Result<(), HostError> {
        self.writes
            .lock()
            .unwrap()
            .push((key.to_string(), value.clone()));
        self.values.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}

#[derive(Debug)]
pub struct MemoryCapabilities {
    keys: HashSet<String>,
    values: Mutex<HashMap<String, CapabilityValue>>,
    pub writes: Mutex<Vec<(String, CapabilityValue)>>,
}

impl MemoryCapabilities {
    pub fn with_keys(keys: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            values: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
        })
    }

    pub fn all() -> Arc<Self> {
        use roadweather_core::device::capability::*;
        Self::with_keys(&[
            TEMPERATURE,
            SURFACE_TEMPERATURE,
            HUMIDITY,
            WIND_STRENGTH,
            WIND_ANGLE,
            WIND_ANGLE_TEXT,
            GUST_STRENGTH,
            RAIN,
            SNOW,
            TOTAL_PRECIPITATION,
        ])
    }

    pub fn value(&self, key: &str) -> Option<CapabilityValue> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    pub fn preset(&self, key: &str, value: CapabilityValue) {
        self.values.lock().unwrap().insert(key.to_string(), value);
    }
}

#[async_trait]
impl CapabilityStore for MemoryCapabilities {
    fn has_capability(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    fn get(&self, key: &str) -> Option<CapabilityValue> {
        self.value(key)
    }

    async fn set(&self, key: &str, value: CapabilityValue) -> Result<(), HostError> {
        self.writes
            .lock()
            .unwrap()
            .push((key.to_string(), value.clone()));
        self.values.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingTrigger {
    pub calls: Mutex<Vec<(DeviceIdentity, HashMap<String, CapabilityValue>)>>,
}

impl RecordingTrigger {
    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TriggerCard for RecordingTrigger {
    async fn trigger(
        &self,
        device: &DeviceIdentity,
        tokens: HashMap<String, CapabilityValue>,
    ) -> Result<(), HostError> {
        self.calls.lock().unwrap().push((device.clone(), tokens));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FakeImage {
    pub url: Mutex<Option<String>>,
    pub updates: AtomicUsize,
    pub fail: bool,
}

#[async_trait]
impl ImageResource for FakeImage {
    fn set_url(&self, url: &str) {
        *self.url.lock().unwrap() = Some(url.to_string());
    }

    async fn update(&self) -> Result<(), HostError> {
        if self.fail {
            return Err(HostError::new("image server unreachable"));
        }
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FakeImages {
    /// Indices (in creation order) of images whose refresh fails.
    pub failing: Vec<usize>,
    pub created: Mutex<Vec<Arc<FakeImage>>>,
    pub attached: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ImageHost for FakeImages {
    async fn create_image(&self) -> Result<Arc<dyn ImageResource>, HostError> {
        let mut created = self.created.lock().unwrap();
        let image = Arc::new(FakeImage {
            fail: self.failing.contains(&created.len()),
            ..FakeImage::default()
        });
        created.push(Arc::clone(&image));
        Ok(image)
    }

    async fn set_camera_image(
        &self,
        id: &str,
        name: &str,
        _image: Arc<dyn ImageResource>,
    ) -> Result<(), HostError> {
        self.attached
            .lock()
            .unwrap()
            .push((id.to_string(), name.to_string()));
        Ok(())
    }
}

#[derive(Debug)]
pub struct PrefixTranslator;

impl Translator for PrefixTranslator {
    fn translate(&self, key: &str) -> String {
        format!("tr:{key}")
    }
}

#[derive(Debug)]
pub struct FixedLocation(pub f64, pub f64);

impl Geolocation for FixedLocation {
    fn latitude(&self) -> f64 {
        self.0
    }

    fn longitude(&self) -> f64 {
        self.1
    }
}

/// A device wired to fakes, with handles to inspect them.
pub struct Harness {
    pub device: Arc<WeatherDevice>,
    pub api: Arc<FakeApi>,
    pub settings: Arc<MemorySettings>,
    pub capabilities: Arc<MemoryCapabilities>,
    pub trigger: Arc<RecordingTrigger>,
    pub images: Arc<FakeImages>,
}

impl Harness {
    pub fn new(api: Arc<FakeApi>) -> Self {
        Self::with(api, MemorySettings::with("refresh_status_cloud", "5"), FakeImages::default())
    }

    pub fn with(api: Arc<FakeApi>, settings: Arc<MemorySettings>, images: FakeImages) -> Self {
        let capabilities = MemoryCapabilities::all();
        let trigger = Arc::new(RecordingTrigger::default());
        let images = Arc::new(images);

        let host = DeviceHost {
            settings: settings.clone(),
            capabilities: capabilities.clone(),
            snow_changed: trigger.clone(),
            images: images.clone(),
            translator: Arc::new(PrefixTranslator),
        };
        let identity = DeviceIdentity {
            id: "SE_STA_VVIS1211".into(),
            name: "Löddeköpinge".into(),
        };
        let device = WeatherDevice::new(identity, api.clone(), host, Config::default());

        Self {
            device: Arc::new(device),
            api,
            settings,
            capabilities,
            trigger,
            images,
        }
    }
}
