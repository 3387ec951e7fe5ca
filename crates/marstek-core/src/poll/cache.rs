// TTL'd snapshot cache with content hashing.
//
// The cache absorbs both duplicate reads (a manual refresh racing the
// scheduled tick) and transient upstream failures (stale fallback).
// Reads are lock-free via `ArcSwapOption`; the coordinator serializes
// writers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};

use crate::model::{DeviceSnapshot, MetricValue};

/// A cached snapshot plus the bookkeeping around it.
#[derive(Debug)]
pub struct CacheEntry {
    pub snapshot: Arc<DeviceSnapshot>,
    /// Monotonic commit time, drives TTL checks.
    pub fetched_at: Instant,
    /// Wall-clock commit time, for diagnostics.
    pub fetched_at_utc: DateTime<Utc>,
    /// Hash over the significant telemetry fields.
    pub content_hash: [u8; 16],
}

#[derive(Debug)]
pub struct SnapshotCache {
    ttl: Duration,
    entry: ArcSwapOption<CacheEntry>,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: ArcSwapOption::empty(),
        }
    }

    /// The entry, if one exists and is still within the TTL.
    pub fn get(&self, now: Instant) -> Option<Arc<CacheEntry>> {
        let entry = self.entry.load_full()?;
        (now.duration_since(entry.fetched_at) < self.ttl).then_some(entry)
    }

    /// The entry regardless of age. Used for stale fallback.
    pub fn force_get(&self) -> Option<Arc<CacheEntry>> {
        self.entry.load_full()
    }

    /// Commit a fresh snapshot. Returns the shared snapshot and whether
    /// its significant content differs from the previous entry.
    pub fn put(&self, snapshot: DeviceSnapshot, now: Instant) -> (Arc<DeviceSnapshot>, bool) {
        let hash = content_hash(&snapshot);
        let changed = self
            .entry
            .load()
            .as_ref()
            .is_none_or(|prev| prev.content_hash != hash);

        let snapshot = Arc::new(snapshot);
        self.entry.store(Some(Arc::new(CacheEntry {
            snapshot: Arc::clone(&snapshot),
            fetched_at: now,
            fetched_at_utc: Utc::now(),
            content_hash: hash,
        })));
        (snapshot, changed)
    }
}

/// Significant metric keys, in hash order. Cosmetic fields (name,
/// firmware) and the noisy `pv` reading are deliberately excluded so
/// they never reset the adaptive interval.
const HASHED_METRICS: [&str; 5] = ["soc", "charge", "discharge", "load", "profit"];

/// Hash the fields whose change should count as "new data".
fn content_hash(snapshot: &DeviceSnapshot) -> [u8; 16] {
    let mut hasher = Md5::new();
    for device in &snapshot.devices {
        hasher.update(device.id.as_bytes());
        hasher.update([0xff]);
        if let Some(serial) = &device.serial {
            hasher.update(serial.as_bytes());
        }
        hasher.update([0xff]);
        for key in HASHED_METRICS {
            match device.metrics.get(key) {
                Some(MetricValue::Number(n)) => hasher.update(n.to_bits().to_le_bytes()),
                Some(MetricValue::Text(s)) => hasher.update(s.as_bytes()),
                None => hasher.update([0x00]),
            }
            hasher.update([0xfe]);
        }
        if let Some(ts) = device.report_time {
            hasher.update(ts.timestamp().to_le_bytes());
        }
        hasher.update([0xff]);
    }
    hasher.finalize().into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Device;
    use std::collections::BTreeMap;

    fn device(id: &str, soc: f64) -> Device {
        let mut metrics = BTreeMap::new();
        metrics.insert("soc".to_owned(), MetricValue::Number(soc));
        Device {
            id: id.to_owned(),
            name: Some("Venus E".to_owned()),
            serial: Some("SN-001".to_owned()),
            firmware_version: Some("151".to_owned()),
            metrics,
            report_time: None,
        }
    }

    fn snapshot(soc: f64) -> DeviceSnapshot {
        DeviceSnapshot {
            devices: vec![device("dev-1", soc)],
        }
    }

    #[test]
    fn entry_expires_after_ttl() {
        let cache = SnapshotCache::new(Duration::from_secs(30));
        let now = Instant::now();
        cache.put(snapshot(87.0), now);

        assert!(cache.get(now + Duration::from_secs(29)).is_some());
        assert!(cache.get(now + Duration::from_secs(30)).is_none());
        // Stale fallback still sees the entry.
        assert!(cache.force_get().is_some());
    }

    #[test]
    fn first_put_counts_as_changed() {
        let cache = SnapshotCache::new(Duration::from_secs(30));
        let (_, changed) = cache.put(snapshot(87.0), Instant::now());
        assert!(changed);
    }

    #[test]
    fn identical_content_is_unchanged() {
        let cache = SnapshotCache::new(Duration::from_secs(30));
        let now = Instant::now();
        cache.put(snapshot(87.0), now);
        let (_, changed) = cache.put(snapshot(87.0), now + Duration::from_secs(60));
        assert!(!changed);
    }

    #[test]
    fn metric_change_is_detected() {
        let cache = SnapshotCache::new(Duration::from_secs(30));
        let now = Instant::now();
        cache.put(snapshot(87.0), now);
        let (_, changed) = cache.put(snapshot(86.0), now);
        assert!(changed);
    }

    #[test]
    fn cosmetic_change_is_ignored() {
        let cache = SnapshotCache::new(Duration::from_secs(30));
        let now = Instant::now();
        cache.put(snapshot(87.0), now);

        let mut renamed = snapshot(87.0);
        renamed.devices[0].name = Some("Garage battery".to_owned());
        renamed.devices[0].firmware_version = Some("152".to_owned());
        let (_, changed) = cache.put(renamed, now);
        assert!(!changed);
    }

    #[test]
    fn device_set_change_is_detected() {
        let cache = SnapshotCache::new(Duration::from_secs(30));
        let now = Instant::now();
        cache.put(snapshot(87.0), now);

        let two = DeviceSnapshot {
            devices: vec![device("dev-1", 87.0), device("dev-2", 50.0)],
        };
        let (_, changed) = cache.put(two, now);
        assert!(changed);
    }
}
