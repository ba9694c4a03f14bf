//! Two-stage mean aggregation.
//!
//! Readings are averaged per device first, then the device means are
//! averaged, so every qualifying device carries equal weight no matter how
//! many readings it submitted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use wxresolve_core::DeviceRecord;

use crate::{DecisionError, DecisionResult};

/// The resolution statistic for one input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Mean of per-device mean temperatures
    pub value: f64,
    /// Devices contributing
    pub devices: usize,
    /// Readings contributing
    pub readings: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Running {
    sum: f64,
    count: usize,
}

/// Streaming accumulator of per-device temperature sums.
///
/// Non-finite readings are skipped, the way a grouped mean skips missing
/// values; a device with no finite reading never becomes a contributor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceMeans {
    devices: BTreeMap<String, Running>,
}

impl DeviceMeans {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, device: &str, temperature: f64) {
        if !temperature.is_finite() {
            return;
        }
        if let Some(running) = self.devices.get_mut(device) {
            running.sum += temperature;
            running.count += 1;
            return;
        }
        self.devices.insert(
            device.to_string(),
            Running {
                sum: temperature,
                count: 1,
            },
        );
    }

    pub fn push_record(&mut self, record: &DeviceRecord) {
        self.push(&record.name, record.temperature);
    }

    pub fn extend<'a>(&mut self, records: impl IntoIterator<Item = &'a DeviceRecord>) {
        for record in records {
            self.push_record(record);
        }
    }

    /// Fold another accumulator into this one.
    pub fn merge(&mut self, other: DeviceMeans) {
        for (device, theirs) in other.devices {
            let ours = self.devices.entry(device).or_default();
            ours.sum += theirs.sum;
            ours.count += theirs.count;
        }
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn reading_count(&self) -> usize {
        self.devices.values().map(|running| running.count).sum()
    }

    pub fn device_mean(&self, device: &str) -> Option<f64> {
        self.devices
            .get(device)
            .map(|running| running.sum / running.count as f64)
    }

    /// Mean of device means, or [`DecisionError::EmptyAggregationInput`]
    /// when no device contributed.
    pub fn decision(&self) -> DecisionResult<Decision> {
        if self.devices.is_empty() {
            return Err(DecisionError::EmptyAggregationInput);
        }
        let total: f64 = self
            .devices
            .values()
            .map(|running| running.sum / running.count as f64)
            .sum();
        Ok(Decision {
            value: total / self.devices.len() as f64,
            devices: self.devices.len(),
            readings: self.reading_count(),
        })
    }
}

/// Two-stage mean over verified records.
pub fn resolve(records: &[DeviceRecord]) -> DecisionResult<f64> {
    let mut means = DeviceMeans::new();
    means.extend(records);
    Ok(means.decision()?.value)
}
