//! Zone grid over the district bounding box.
//!
//! The district is tiled by a uniform G×G grid. A query's origin and
//! destination zones determine a Chebyshev zone distance, which selects the
//! routing strategy: how strongly the planner leans on micro-mobility
//! versus scheduled transit.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{BoundingBox, GeoPoint};

/// A grid cell: row `i` (latitude axis), column `j` (longitude axis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneId {
    pub i: u32,
    pub j: u32,
}

/// The strategy families, ordered from mobility-leaning to transit-leaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    MobilityOnly,
    MobilityFirst,
    MobilityPreferred,
    Balanced,
    TransitPreferred,
    TransitFirst,
    TransitOnly,
}

impl StrategyKind {
    /// Snake-case label used in serialized output.
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::MobilityOnly => "mobility_only",
            StrategyKind::MobilityFirst => "mobility_first",
            StrategyKind::MobilityPreferred => "mobility_preferred",
            StrategyKind::Balanced => "balanced",
            StrategyKind::TransitPreferred => "transit_preferred",
            StrategyKind::TransitFirst => "transit_first",
            StrategyKind::TransitOnly => "transit_only",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A routing strategy: the mode weights derived from zone distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Strategy {
    pub kind: StrategyKind,
    pub mobility_weight: f64,
    pub transit_weight: f64,
}

/// Strategy for a given zone distance. Fixed table:
///
/// | d  | strategy           | w_mob | w_tr |
/// |----|--------------------|-------|------|
/// | 0  | mobility_only      | 1.0   | 0.0  |
/// | 1  | mobility_first     | 0.8   | 0.2  |
/// | 2  | mobility_preferred | 0.7   | 0.3  |
/// | 3  | balanced           | 0.5   | 0.5  |
/// | 4  | transit_preferred  | 0.3   | 0.7  |
/// | 5  | transit_first      | 0.2   | 0.8  |
/// | ≥6 | transit_only       | 0.1   | 0.9  |
pub fn strategy_for(zone_distance: u32) -> Strategy {
    let (kind, mobility_weight, transit_weight) = match zone_distance {
        0 => (StrategyKind::MobilityOnly, 1.0, 0.0),
        1 => (StrategyKind::MobilityFirst, 0.8, 0.2),
        2 => (StrategyKind::MobilityPreferred, 0.7, 0.3),
        3 => (StrategyKind::Balanced, 0.5, 0.5),
        4 => (StrategyKind::TransitPreferred, 0.3, 0.7),
        5 => (StrategyKind::TransitFirst, 0.2, 0.8),
        _ => (StrategyKind::TransitOnly, 0.1, 0.9),
    };
    Strategy {
        kind,
        mobility_weight,
        transit_weight,
    }
}

/// The uniform zone grid. Pure and stateless: a bounding box plus a size.
#[derive(Debug, Clone, Copy)]
pub struct ZoneGrid {
    bounds: BoundingBox,
    size: u32,
}

impl ZoneGrid {
    /// Create a grid of `size × size` cells over `bounds`.
    pub fn new(bounds: BoundingBox, size: u32) -> Self {
        debug_assert!(size >= 1);
        Self { bounds, size }
    }

    /// Grid dimension G.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The zone containing a point. Coordinates outside the box clamp to
    /// the edge cells, so every point maps to some zone.
    ///
    /// # Examples
    ///
    /// ```
    /// use journey_planner::domain::{BoundingBox, GeoPoint};
    /// use journey_planner::zone::{ZoneGrid, ZoneId};
    ///
    /// let grid = ZoneGrid::new(BoundingBox::new(37.46, 37.55, 127.00, 127.14), 30);
    /// let center = grid.center(ZoneId { i: 12, j: 20 });
    /// assert_eq!(grid.zone_of(center), ZoneId { i: 12, j: 20 });
    /// ```
    pub fn zone_of(&self, p: GeoPoint) -> ZoneId {
        let lat_step = self.bounds.lat_span() / self.size as f64;
        let lon_step = self.bounds.lon_span() / self.size as f64;

        let i = ((p.lat - self.bounds.lat_min) / lat_step).floor();
        let j = ((p.lon - self.bounds.lon_min) / lon_step).floor();

        let max = (self.size - 1) as f64;
        ZoneId {
            i: i.clamp(0.0, max) as u32,
            j: j.clamp(0.0, max) as u32,
        }
    }

    /// Chebyshev distance between two zones.
    pub fn zone_distance(&self, a: ZoneId, b: ZoneId) -> u32 {
        a.i.abs_diff(b.i).max(a.j.abs_diff(b.j))
    }

    /// Center coordinate of a zone.
    pub fn center(&self, z: ZoneId) -> GeoPoint {
        let lat_step = self.bounds.lat_span() / self.size as f64;
        let lon_step = self.bounds.lon_span() / self.size as f64;
        GeoPoint::new(
            self.bounds.lat_min + (z.i as f64 + 0.5) * lat_step,
            self.bounds.lon_min + (z.j as f64 + 0.5) * lon_step,
        )
    }

    /// The cells within Chebyshev distance `radius` of `z`, clipped at the
    /// grid edge. Includes `z` itself; up to `(2·radius + 1)²` cells.
    pub fn neighbors(&self, z: ZoneId, radius: u32) -> Vec<ZoneId> {
        let i_lo = z.i.saturating_sub(radius);
        let i_hi = (z.i + radius).min(self.size - 1);
        let j_lo = z.j.saturating_sub(radius);
        let j_hi = (z.j + radius).min(self.size - 1);

        let mut cells = Vec::with_capacity(((i_hi - i_lo + 1) * (j_hi - j_lo + 1)) as usize);
        for i in i_lo..=i_hi {
            for j in j_lo..=j_hi {
                cells.push(ZoneId { i, j });
            }
        }
        cells
    }
}
