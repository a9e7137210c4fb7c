//! Road distance oracle and travel-speed constants.
//!
//! The planner never touches a road graph directly; it asks an oracle for
//! meters between two coordinates. When no real graph is available the
//! fallback estimates road distance as 1.3× the great-circle distance,
//! and graph-backed oracles are expected to degrade to the same estimate
//! on lookup failure without surfacing an error.
//!
//! Distances are memoized at two levels: an optional process-wide LRU
//! shared by all queries, and a per-query map owned by one `plan` call.
//! Keys quantize coordinates to ~5 m so jittered inputs still hit.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use moka::sync::Cache;

use crate::domain::{GeoPoint, MobilityMode, QuantizedPoint};

/// Walking speed, meters per second.
pub const WALK_SPEED_MPS: f64 = 1.2;

/// Shared bike speed, meters per second (~15 km/h).
pub const BIKE_SPEED_MPS: f64 = 4.17;

/// Kickboard and e-bike speed, meters per second (~20 km/h).
pub const KICKBOARD_SPEED_MPS: f64 = 5.56;

/// Detour factor applied to great-circle distance when no road graph is
/// available.
pub const ROAD_DETOUR_FACTOR: f64 = 1.3;

/// Default capacity of the process-wide distance LRU.
pub const SHARED_CACHE_CAPACITY: u64 = 100_000;

/// Riding speed for a mobility mode, meters per second.
pub fn ride_speed_mps(mode: MobilityMode) -> f64 {
    match mode {
        MobilityMode::Bike => BIKE_SPEED_MPS,
        MobilityMode::Kickboard | MobilityMode::Ebike => KICKBOARD_SPEED_MPS,
    }
}

/// Walking time over `meters`, rounded to whole seconds.
pub fn walk_secs(meters: f64) -> u32 {
    (meters / WALK_SPEED_MPS).round() as u32
}

/// Riding time over `meters` on the given mode, rounded to whole seconds.
pub fn ride_secs(mode: MobilityMode, meters: f64) -> u32 {
    (meters / ride_speed_mps(mode)).round() as u32
}

/// Source of road distances between coordinates.
///
/// Implementations must be cheap enough to call on the query hot path and
/// must never fail: a graph miss degrades to an estimate instead.
pub trait RoadDistance: Send + Sync {
    /// Road distance from `a` to `b` in meters.
    fn road_distance(&self, a: GeoPoint, b: GeoPoint) -> f64;
}

/// The no-graph oracle: great-circle distance times the detour factor.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineFallback;

impl RoadDistance for HaversineFallback {
    fn road_distance(&self, a: GeoPoint, b: GeoPoint) -> f64 {
        a.haversine_meters(b) * ROAD_DETOUR_FACTOR
    }
}

/// Process-wide LRU in front of another oracle.
///
/// Shared by every planner query; internally synchronized.
pub struct SharedDistanceCache {
    inner: Arc<dyn RoadDistance>,
    cache: Cache<(QuantizedPoint, QuantizedPoint), f64>,
}

impl SharedDistanceCache {
    /// Wrap an oracle with the default capacity.
    pub fn new(inner: Arc<dyn RoadDistance>) -> Self {
        Self::with_capacity(inner, SHARED_CACHE_CAPACITY)
    }

    /// Wrap an oracle with an explicit entry capacity.
    pub fn with_capacity(inner: Arc<dyn RoadDistance>, capacity: u64) -> Self {
        Self {
            inner,
            cache: Cache::new(capacity),
        }
    }

    /// Number of cached entries (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl RoadDistance for SharedDistanceCache {
    fn road_distance(&self, a: GeoPoint, b: GeoPoint) -> f64 {
        let key = (a.quantized(), b.quantized());
        if let Some(meters) = self.cache.get(&key) {
            return meters;
        }
        let meters = self.inner.road_distance(a, b);
        self.cache.insert(key, meters);
        meters
    }
}

/// Per-query distance memo. Owned by exactly one `plan` call, so a plain
/// map behind a `RefCell` suffices; it is dropped with the query.
pub struct QueryDistanceCache<'a> {
    oracle: &'a dyn RoadDistance,
    memo: RefCell<HashMap<(QuantizedPoint, QuantizedPoint), f64>>,
}

impl<'a> QueryDistanceCache<'a> {
    /// Wrap the query's oracle handle.
    pub fn new(oracle: &'a dyn RoadDistance) -> Self {
        Self {
            oracle,
            memo: RefCell::new(HashMap::new()),
        }
    }

    /// Memoized road distance in meters.
    pub fn distance(&self, a: GeoPoint, b: GeoPoint) -> f64 {
        let key = (a.quantized(), b.quantized());
        if let Some(&meters) = self.memo.borrow().get(&key) {
            return meters;
        }
        let meters = self.oracle.road_distance(a, b);
        self.memo.borrow_mut().insert(key, meters);
        meters
    }

    /// Walking seconds over the memoized road distance.
    pub fn walk_secs_between(&self, a: GeoPoint, b: GeoPoint) -> u32 {
        walk_secs(self.distance(a, b))
    }

    /// Number of memoized pairs.
    pub fn memo_len(&self) -> usize {
        self.memo.borrow().len()
    }
}
