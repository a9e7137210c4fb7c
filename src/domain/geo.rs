//! Geographic primitives.
//!
//! Coordinates are WGS84 latitude/longitude. Distances are great-circle
//! meters via the haversine formula; at district scale (~10 km) this is
//! accurate to well under a meter.

use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

/// Quantization step for distance-cache keys: 1/20000 degree ≈ 5.5 m of
/// latitude. Two points closer than this share a cache slot.
const QUANT_STEPS_PER_DEGREE: f64 = 20_000.0;

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Create a point from latitude and longitude in degrees.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance to `other` in meters.
    ///
    /// # Examples
    ///
    /// ```
    /// use journey_planner::domain::GeoPoint;
    ///
    /// let a = GeoPoint::new(37.4979, 127.0276);
    /// let b = GeoPoint::new(37.5007, 127.0363);
    /// let d = a.haversine_meters(b);
    /// assert!(d > 700.0 && d < 900.0);
    /// ```
    pub fn haversine_meters(self, other: GeoPoint) -> f64 {
        Haversine.distance(
            Point::new(self.lon, self.lat),
            Point::new(other.lon, other.lat),
        )
    }

    /// Snap to the ~5 m quantization grid used as a distance-cache key.
    pub fn quantized(self) -> QuantizedPoint {
        QuantizedPoint {
            lat: (self.lat * QUANT_STEPS_PER_DEGREE).round() as i32,
            lon: (self.lon * QUANT_STEPS_PER_DEGREE).round() as i32,
        }
    }

    /// True if the two points are the same location for routing purposes
    /// (within roughly a meter).
    pub fn coincides_with(self, other: GeoPoint) -> bool {
        (self.lat - other.lat).abs() < 1e-5 && (self.lon - other.lon).abs() < 1e-5
    }
}

/// A point snapped to the ~5 m cache grid. Hashable and exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuantizedPoint {
    lat: i32,
    lon: i32,
}

/// The district's bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// Construct a bounding box; callers are expected to pass
    /// `min < max` on both axes (the dataset builder validates this).
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    /// True if the point lies inside the box (boundary inclusive).
    pub fn contains(&self, p: GeoPoint) -> bool {
        p.lat >= self.lat_min && p.lat <= self.lat_max && p.lon >= self.lon_min && p.lon <= self.lon_max
    }

    /// Height of the box in degrees of latitude.
    pub fn lat_span(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Width of the box in degrees of longitude.
    pub fn lon_span(&self) -> f64 {
        self.lon_max - self.lon_min
    }
}
