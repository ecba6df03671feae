//! Collaborators provided by the smart-home host runtime.
//!
//! A device never talks to the host directly; it is handed a [`DeviceHost`]
//! at construction so tests can substitute in-memory fakes.

use std::{collections::HashMap, fmt::Debug, sync::Arc};

use async_trait::async_trait;
use serde::Serialize;

use crate::{error::HostError, model::CapabilityValue};

/// Identity of a paired device: the station id plus its display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DeviceIdentity {
    pub id: String,
    pub name: String,
}

/// Persistent per-device settings.
#[async_trait]
pub trait SettingsStore: Send + Sync + Debug {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: String) -> Result<(), HostError>;
}

/// Current capability values of a device, as shown by the host UI.
#[async_trait]
pub trait CapabilityStore: Send + Sync + Debug {
    fn has_capability(&self, key: &str) -> bool;
    fn get(&self, key: &str) -> Option<CapabilityValue>;
    async fn set(&self, key: &str, value: CapabilityValue) -> Result<(), HostError>;
}

/// A device trigger card that automations can listen to.
#[async_trait]
pub trait TriggerCard: Send + Sync + Debug {
    async fn trigger(
        &self,
        device: &DeviceIdentity,
        tokens: HashMap<String, CapabilityValue>,
    ) -> Result<(), HostError>;
}

/// An image owned by the host. Its URL is set once, `update` re-renders it.
#[async_trait]
pub trait ImageResource: Send + Sync + Debug {
    fn set_url(&self, url: &str);
    async fn update(&self) -> Result<(), HostError>;
}

#[async_trait]
pub trait ImageHost: Send + Sync + Debug {
    async fn create_image(&self) -> Result<Arc<dyn ImageResource>, HostError>;

    /// Attach `image` to the device as a camera view.
    async fn set_camera_image(
        &self,
        id: &str,
        name: &str,
        image: Arc<dyn ImageResource>,
    ) -> Result<(), HostError>;
}

/// Localised string lookup. Unknown keys come back unchanged.
pub trait Translator: Send + Sync + Debug {
    fn translate(&self, key: &str) -> String;
}

/// Location of the host, used for nearby station search.
pub trait Geolocation: Send + Sync + Debug {
    fn latitude(&self) -> f64;
    fn longitude(&self) -> f64;
}

/// Everything a weather device needs from the host.
#[derive(Debug, Clone)]
pub struct DeviceHost {
    pub settings: Arc<dyn SettingsStore>,
    pub capabilities: Arc<dyn CapabilityStore>,
    pub snow_changed: Arc<dyn TriggerCard>,
    pub images: Arc<dyn ImageHost>,
    pub translator: Arc<dyn Translator>,
}
