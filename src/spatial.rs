//! Spatial index over stops and mobility vehicles.
//!
//! Two R-trees in lat/lon space: one over transit stops (bus + metro) and
//! one over mobility vehicles. Queries take a radius in meters; candidates
//! come from a conservative degree-radius envelope and are then filtered
//! and ordered by exact haversine distance.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::dataset::RoutingDataset;
use crate::domain::{GeoPoint, MobilityMode, StopId};

/// Meters per degree of latitude (minimum over the globe, so the envelope
/// never under-covers).
const METERS_PER_DEG_LAT: f64 = 110_574.0;

/// Meters per degree of longitude at the equator; scaled by cos(lat).
const METERS_PER_DEG_LON_EQUATOR: f64 = 111_320.0;

/// Entry stored in an R-tree: a `[lat, lon]` point with its slot index and
/// (for vehicles) the mode.
#[derive(Clone)]
struct Entry {
    point: [f64; 2],
    slot: u32,
    mode: Option<MobilityMode>,
}

impl RTreeObject for Entry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for Entry {
    /// Squared Euclidean distance in degree space. Only used to rank and
    /// cut candidates; exact meters are computed afterwards.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

/// Static nearest-neighbour index over the dataset's points.
pub struct SpatialIndex {
    stops: RTree<Entry>,
    vehicles: RTree<Entry>,
}

impl SpatialIndex {
    /// Bulk-load the index from a dataset. Only transit stops (bus, metro)
    /// enter the stop tree; docks and mobility cells are found through the
    /// vehicles they host.
    pub fn build(dataset: &RoutingDataset) -> Self {
        let stop_entries: Vec<Entry> = dataset
            .stops()
            .iter()
            .enumerate()
            .filter(|(_, stop)| stop.kind.is_transit())
            .map(|(i, stop)| Entry {
                point: [stop.location.lat, stop.location.lon],
                slot: i as u32,
                mode: None,
            })
            .collect();

        let vehicle_entries: Vec<Entry> = dataset
            .vehicles()
            .iter()
            .enumerate()
            .map(|(i, v)| Entry {
                point: [v.location.lat, v.location.lon],
                slot: i as u32,
                mode: Some(v.mode),
            })
            .collect();

        Self {
            stops: RTree::bulk_load(stop_entries),
            vehicles: RTree::bulk_load(vehicle_entries),
        }
    }

    /// Transit stops within `radius_m` of `p`, as `(stop, meters)` sorted
    /// by ascending meters.
    pub fn stops_within(&self, p: GeoPoint, radius_m: f64) -> Vec<(StopId, f64)> {
        let mut hits: Vec<(StopId, f64)> = within(&self.stops, p, radius_m, |_| true)
            .map(|(slot, meters)| (StopId(slot), meters))
            .collect();
        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        hits
    }

    /// Vehicles of `mode` within `radius_m` of `p`, as `(vehicle index,
    /// meters)` sorted by ascending meters.
    pub fn vehicles_within(
        &self,
        p: GeoPoint,
        radius_m: f64,
        mode: MobilityMode,
    ) -> Vec<(usize, f64)> {
        let mut hits: Vec<(usize, f64)> =
            within(&self.vehicles, p, radius_m, |e| e.mode == Some(mode))
                .map(|(slot, meters)| (slot as usize, meters))
                .collect();
        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        hits
    }

    /// The closest vehicle of `mode` within `radius_m`, if any.
    pub fn nearest_vehicle(
        &self,
        p: GeoPoint,
        radius_m: f64,
        mode: MobilityMode,
    ) -> Option<(usize, f64)> {
        within(&self.vehicles, p, radius_m, |e| e.mode == Some(mode))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(slot, meters)| (slot as usize, meters))
    }
}

/// Candidates within `radius_m` of `p` passing `filter`, as `(slot,
/// haversine meters)` in tree order.
fn within<'a>(
    tree: &'a RTree<Entry>,
    p: GeoPoint,
    radius_m: f64,
    filter: impl Fn(&Entry) -> bool + 'a,
) -> impl Iterator<Item = (u32, f64)> + 'a {
    let deg = degree_radius(p, radius_m);
    tree.locate_within_distance([p.lat, p.lon], deg * deg)
        .filter(move |e| filter(e))
        .filter_map(move |e| {
            let meters = p.haversine_meters(GeoPoint::new(e.point[0], e.point[1]));
            (meters <= radius_m).then_some((e.slot, meters))
        })
}

/// A degree radius guaranteed to cover `meters` around `p` on both axes.
fn degree_radius(p: GeoPoint, meters: f64) -> f64 {
    let lat_deg = meters / METERS_PER_DEG_LAT;
    let cos_lat = p.lat.to_radians().cos().max(0.01);
    let lon_deg = meters / (METERS_PER_DEG_LON_EQUATOR * cos_lat);
    lat_deg.max(lon_deg)
}
