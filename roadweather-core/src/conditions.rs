//! Flow conditions evaluated against a device's current capability values.

use tracing::debug;

use crate::{device::capability, host::CapabilityStore};

/// Rain over the last half hour is above `threshold`.
pub fn rain_amount_exceeds(capabilities: &dyn CapabilityStore, threshold: f64) -> bool {
    exceeds(capabilities, capability::RAIN, threshold)
}

/// Snow over the last half hour is above `threshold`.
pub fn snow_amount_exceeds(capabilities: &dyn CapabilityStore, threshold: f64) -> bool {
    exceeds(capabilities, capability::SNOW, threshold)
}

fn exceeds(capabilities: &dyn CapabilityStore, key: &str, threshold: f64) -> bool {
    let current = capabilities.get(key).and_then(|value| value.as_f64());
    debug!(capability = key, ?current, threshold, "Evaluating amount condition");

    current.is_some_and(|current| current > threshold)
}
