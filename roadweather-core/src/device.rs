//! A paired weather station and its polling loop.
//!
//! Each [`WeatherDevice`] owns its timer, camera images and collaborators;
//! nothing is shared between devices.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use chrono::Utc;
use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

use crate::{
    client::StationApi,
    compass::CompassPoint,
    config::{Config, SETTING_LAST_ERROR, SETTING_LAST_RESPONSE, SETTING_REFRESH_INTERVAL},
    error::ApiError,
    host::{DeviceHost, DeviceIdentity, ImageResource},
    model::{CameraImage, CapabilityValue, Observation},
};

/// Capability keys written by a poll.
pub mod capability {
    pub const TEMPERATURE: &str = "measure_temperature";
    pub const SURFACE_TEMPERATURE: &str = "measure_temperature.surface";
    pub const HUMIDITY: &str = "measure_humidity";
    pub const WIND_STRENGTH: &str = "measure_wind_strength";
    pub const WIND_ANGLE: &str = "measure_wind_angle";
    pub const WIND_ANGLE_TEXT: &str = "wind_angle_text";
    pub const GUST_STRENGTH: &str = "measure_gust_strength";
    pub const RAIN: &str = "measure_rain";
    pub const SNOW: &str = "measure_rain.snow";
    pub const TOTAL_PRECIPITATION: &str = "measure_rain.total";
}

const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Token passed to the snow-changed trigger card.
pub const SNOW_TOKEN: &str = "snow";

/// What a single poll did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Updated,
    Failed,
    /// Another poll of this device was still running.
    Skipped,
    /// The device was deleted while the request was in flight.
    Discarded,
}

#[derive(Debug)]
struct TrackedCamera {
    image: CameraImage,
    resource: Arc<dyn ImageResource>,
}

#[derive(Debug)]
struct DeviceState {
    identity: DeviceIdentity,
    api: Arc<dyn StationApi>,
    host: DeviceHost,
    config: Config,
    cameras: Mutex<HashMap<String, TrackedCamera>>,
    polling: AtomicBool,
    destroyed: AtomicBool,
}

/// Clears the in-progress flag when a poll ends, including when a poll
/// is dropped mid-request.
struct PollGuard<'a>(&'a AtomicBool);

impl Drop for PollGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
pub struct WeatherDevice {
    state: Arc<DeviceState>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl WeatherDevice {
    pub fn new(
        identity: DeviceIdentity,
        api: Arc<dyn StationApi>,
        host: DeviceHost,
        config: Config,
    ) -> Self {
        Self {
            state: Arc::new(DeviceState {
                identity,
                api,
                host,
                config,
                cameras: Mutex::new(HashMap::new()),
                polling: AtomicBool::new(false),
                destroyed: AtomicBool::new(false),
            }),
            timer: Mutex::new(None),
        }
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.state.identity
    }

    /// Poll once right away, arm the timer, then set up camera images.
    pub async fn start(&self) {
        info!(station_id = %self.state.identity.id, "Weather station '{}' initiated", self.state.identity.name);

        self.poll_once().await;

        let interval = self.refresh_interval().await;
        self.set_refresh_interval(interval);

        self.initialize_camera_images().await;
    }

    pub async fn poll_once(&self) -> PollOutcome {
        self.state.poll_once().await
    }

    /// Replace the polling timer. The old timer is cancelled before the new
    /// one is armed, and the new one first fires one full `interval` from now.
    /// A poll the old timer already started runs to completion.
    pub fn set_refresh_interval(&self, interval: Duration) {
        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = timer.take() {
            old.abort();
        }

        if self.state.destroyed.load(Ordering::Acquire) {
            return;
        }

        info!(station_id = %self.state.identity.id, "Polling every {}s", interval.as_secs());
        *timer = Some(spawn_timer(Arc::clone(&self.state), interval));
    }

    /// React to a settings change. Returns whether the timer was re-armed.
    pub fn on_settings(&self, new_settings: &HashMap<String, String>, changed_keys: &[String]) -> bool {
        if !changed_keys.iter().any(|key| key == SETTING_REFRESH_INTERVAL) {
            return false;
        }

        let setting = new_settings.get(SETTING_REFRESH_INTERVAL).map(String::as_str);
        info!(
            station_id = %self.state.identity.id,
            "Refresh interval was changed to {:?}", setting
        );
        self.set_refresh_interval(self.state.config.refresh_interval(setting));
        true
    }

    /// Cancel the polling timer. Safe to call repeatedly.
    pub fn stop(&self) {
        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = timer.take() {
            debug!(station_id = %self.state.identity.id, "Removing timer");
            handle.abort();
        }
    }

    /// Tear the device down. Results of requests still in flight are dropped.
    pub fn on_deleted(&self) {
        info!(station_id = %self.state.identity.id, "Deleting weather station '{}'", self.state.identity.name);
        self.state.destroyed.store(true, Ordering::Release);
        self.stop();
    }

    pub fn is_polling_scheduled(&self) -> bool {
        self.timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Look up cameras named after the station and attach their images.
    /// Returns how many images are tracked afterwards.
    pub async fn initialize_camera_images(&self) -> usize {
        let state = &self.state;
        let name = &state.identity.name;

        let cameras = match state.api.fetch_station_cameras(name).await {
            Ok(cameras) => cameras,
            Err(e) => {
                error!(station_id = %state.identity.id, "Failed to look up cameras: {e}");
                state.persist_error(&e).await;
                return state.camera_count();
            }
        };

        for camera in cameras {
            let Some(url) = camera.image_url() else {
                debug!(camera_id = %camera.id, "Camera '{}' has no photo", camera.name);
                continue;
            };

            let resource = match state.host.images.create_image().await {
                Ok(resource) => resource,
                Err(e) => {
                    warn!(camera_id = %camera.id, "Failed to create image: {e}");
                    continue;
                }
            };
            resource.set_url(&url);

            if let Err(e) = state
                .host
                .images
                .set_camera_image(&camera.id, &camera.name, Arc::clone(&resource))
                .await
            {
                warn!(camera_id = %camera.id, "Failed to attach camera image: {e}");
                continue;
            }

            info!(camera_id = %camera.id, "Camera '{}' for station '{}'", camera.name, name);
            state.lock_cameras().insert(
                camera.id.clone(),
                TrackedCamera {
                    image: CameraImage {
                        id: camera.id,
                        name: camera.name,
                        url,
                        last_refreshed: None,
                    },
                    resource,
                },
            );
        }

        state.camera_count()
    }

    pub fn camera_images(&self) -> Vec<CameraImage> {
        let mut images: Vec<_> = self
            .state
            .lock_cameras()
            .values()
            .map(|tracked| tracked.image.clone())
            .collect();
        images.sort_by(|a, b| a.id.cmp(&b.id));
        images
    }

    async fn refresh_interval(&self) -> Duration {
        let setting = self.state.host.settings.get(SETTING_REFRESH_INTERVAL).await;
        self.state.config.refresh_interval(setting.as_deref())
    }
}

impl Drop for WeatherDevice {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_timer(state: Arc<DeviceState>, period: Duration) -> JoinHandle<()> {
    let period = period.max(MIN_REFRESH_INTERVAL);
    let first_tick = Instant::now() + period;

    tokio::spawn(async move {
        let mut ticks = time::interval_at(first_tick, period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticks.tick().await;

            // Detached, so aborting the timer only cancels future ticks.
            let polled = Arc::clone(&state);
            let poll = tokio::spawn(async move { polled.poll_once().await });
            if let Err(e) = poll.await {
                error!("Poll task failed: {e}");
            }
        }
    })
}

impl DeviceState {
    async fn poll_once(&self) -> PollOutcome {
        if self.is_destroyed() {
            return PollOutcome::Discarded;
        }
        if self.polling.swap(true, Ordering::AcqRel) {
            debug!(station_id = %self.identity.id, "Previous poll still running, skipping");
            return PollOutcome::Skipped;
        }
        let _guard = PollGuard(&self.polling);

        let outcome = self.refresh_station().await;
        if outcome != PollOutcome::Discarded {
            // The URLs never change, only the photos behind them.
            self.refresh_camera_images().await;
        }
        outcome
    }

    async fn refresh_station(&self) -> PollOutcome {
        let result = self.api.fetch_station_observation(&self.identity.id).await;
        if self.is_destroyed() {
            debug!(station_id = %self.identity.id, "Device deleted during poll, discarding result");
            return PollOutcome::Discarded;
        }

        match result {
            Ok(observation) => {
                self.apply_observation(&observation).await;
                self.persist_response(&observation).await;
                PollOutcome::Updated
            }
            Err(e) => {
                error!(station_id = %self.identity.id, "Failed to refresh station: {e}");
                self.persist_error(&e).await;
                PollOutcome::Failed
            }
        }
    }

    async fn apply_observation(&self, observation: &Observation) {
        let r = &observation.readings;
        let compass = CompassPoint::from_degrees(r.wind_direction_degrees);
        let wind_text = self.host.translator.translate(&compass.translation_key());

        let updates: [(&str, CapabilityValue); 10] = [
            (capability::TEMPERATURE, r.air_temperature.into()),
            (capability::SURFACE_TEMPERATURE, r.surface_temperature.into()),
            (capability::HUMIDITY, r.relative_humidity.into()),
            (capability::WIND_STRENGTH, r.wind_speed.into()),
            (capability::WIND_ANGLE, r.wind_direction_degrees.into()),
            (capability::WIND_ANGLE_TEXT, wind_text.into()),
            (capability::GUST_STRENGTH, r.wind_gust_speed.into()),
            (capability::RAIN, r.rain_sum.into()),
            (capability::SNOW, r.snow_sum_solid.into()),
            (capability::TOTAL_PRECIPITATION, r.total_water_equivalent.into()),
        ];

        for (key, value) in updates {
            self.update_capability(key, value).await;
        }
    }

    /// Write `value` unconditionally; only a snow change fires the trigger.
    async fn update_capability(&self, key: &str, value: CapabilityValue) {
        let capabilities = &self.host.capabilities;
        if !capabilities.has_capability(key) {
            return;
        }

        let previous = capabilities.get(key);
        if let Err(e) = capabilities.set(key, value.clone()).await {
            warn!(station_id = %self.identity.id, capability = key, "Failed to set capability: {e}");
        }

        if key != capability::SNOW {
            return;
        }
        if let Some(previous) = previous.filter(|previous| *previous != value) {
            debug!(station_id = %self.identity.id, "Snow changed from {previous} to {value}");
            let tokens = HashMap::from([(SNOW_TOKEN.to_string(), value)]);
            if let Err(e) = self.host.snow_changed.trigger(&self.identity, tokens).await {
                error!(station_id = %self.identity.id, "Failed to trigger snow changed: {e}");
            }
        }
    }

    async fn persist_response(&self, observation: &Observation) {
        let pretty = match serde_json::to_string_pretty(&observation.raw) {
            Ok(pretty) => pretty,
            Err(e) => {
                warn!(station_id = %self.identity.id, "Failed to serialize response: {e}");
                return;
            }
        };

        if let Err(e) = self.host.settings.set(SETTING_LAST_RESPONSE, pretty).await {
            error!(station_id = %self.identity.id, "Failed to update settings: {e}");
        }
    }

    async fn persist_error(&self, e: &ApiError) {
        let message = format!("{}\n{e}\n{e:#?}", Utc::now().to_rfc3339());
        if let Err(e) = self.host.settings.set(SETTING_LAST_ERROR, message).await {
            error!(station_id = %self.identity.id, "Failed to update settings: {e}");
        }
    }

    async fn refresh_camera_images(&self) {
        let resources: Vec<(String, Arc<dyn ImageResource>)> = self
            .lock_cameras()
            .iter()
            .map(|(id, tracked)| (id.clone(), Arc::clone(&tracked.resource)))
            .collect();

        for (id, resource) in resources {
            match resource.update().await {
                Ok(()) => {
                    if let Some(tracked) = self.lock_cameras().get_mut(&id) {
                        tracked.image.last_refreshed = Some(Utc::now());
                    }
                }
                Err(e) => warn!(camera_id = %id, "Failed to refresh camera image: {e}"),
            }
        }
    }

    fn lock_cameras(&self) -> std::sync::MutexGuard<'_, HashMap<String, TrackedCamera>> {
        self.cameras.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn camera_count(&self) -> usize {
        self.lock_cameras().len()
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }
}
