//! Dataset record types.

use serde::{Deserialize, Serialize};

use crate::domain::{BoundingBox, GeoPoint, MobilityMode, RouteId, StopId, TransitTime};

/// What kind of point a stop is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopKind {
    Bus,
    Metro,
    BikeDock,
    MobilityCell,
}

impl StopKind {
    /// True for stops served by scheduled transit.
    pub fn is_transit(self) -> bool {
        matches!(self, StopKind::Bus | StopKind::Metro)
    }
}

/// An addressable point in the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub location: GeoPoint,
    pub kind: StopKind,
}

/// Transport mode of a scheduled route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    Bus,
    Metro,
}

/// An ordered stop sequence served by a family of trips.
#[derive(Debug, Clone, Serialize)]
pub struct Route {
    pub id: String,
    pub mode: RouteMode,
    /// Display label, e.g. "Bus 146" or "Metro Line 2".
    pub label: String,
    pub stops: Vec<StopId>,
}

/// Arrival/departure pair at one stop of one trip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopTime {
    pub arrival: TransitTime,
    pub departure: TransitTime,
}

/// One scheduled pass along a route.
#[derive(Debug, Clone, Serialize)]
pub struct Trip {
    pub id: String,
    /// One entry per stop position of the parent route.
    pub stop_times: Vec<StopTime>,
}

/// The schedule of one route: trips × stop positions.
///
/// Trips are sorted by departure time and do not overtake each other
/// (enforced at build), so for any stop position the departures across
/// trips are non-decreasing and boardable trips can be found by binary
/// search.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Timetable {
    trips: Vec<Trip>,
}

impl Timetable {
    pub(crate) fn new(trips: Vec<Trip>) -> Self {
        Self { trips }
    }

    /// Number of trips. A missing timetable is simply empty.
    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }

    /// True if the route has no service.
    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    /// The trip at `trip_index`.
    pub fn trip(&self, trip_index: usize) -> &Trip {
        &self.trips[trip_index]
    }

    /// Arrival time of `trip_index` at stop position `pos`.
    pub fn arrival(&self, trip_index: usize, pos: usize) -> TransitTime {
        self.trips[trip_index].stop_times[pos].arrival
    }

    /// Departure time of `trip_index` at stop position `pos`.
    pub fn departure(&self, trip_index: usize, pos: usize) -> TransitTime {
        self.trips[trip_index].stop_times[pos].departure
    }

    /// Index of the earliest trip departing from stop position `pos` at or
    /// after `not_before`, if any.
    ///
    /// Binary search; valid because departures at a fixed position are
    /// non-decreasing across trips.
    pub fn earliest_trip_from(&self, pos: usize, not_before: TransitTime) -> Option<usize> {
        let idx = self
            .trips
            .partition_point(|trip| trip.stop_times[pos].departure < not_before);
        (idx < self.trips.len()).then_some(idx)
    }
}

/// A precomputed walking connection between two stops.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Transfer {
    pub to: StopId,
    pub walk_secs: u32,
}

/// A docked bike, or a virtual station aggregating free-floating vehicles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MobilityVehicle {
    pub id: String,
    pub mode: MobilityMode,
    pub location: GeoPoint,
    /// Static nominal availability.
    pub capacity: u16,
}

/// Unlock fee plus per-minute rate for one mobility mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tariff {
    pub unlock: u32,
    pub per_minute: u32,
}

/// Fare schedule. Currency units are opaque integers; the dataset may
/// override any of the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TariffTable {
    pub bike: Tariff,
    pub kickboard: Tariff,
    pub ebike: Tariff,
    /// Flat fare charged on the first transit boarding of a journey.
    pub transit_flat: u32,
    /// Per-km surcharge on each boarding after the first transfer.
    pub hybrid_per_km: u32,
}

impl Default for TariffTable {
    fn default() -> Self {
        Self {
            bike: Tariff {
                unlock: 1000,
                per_minute: 0,
            },
            kickboard: Tariff {
                unlock: 1200,
                per_minute: 150,
            },
            ebike: Tariff {
                unlock: 1500,
                per_minute: 180,
            },
            transit_flat: 1370,
            hybrid_per_km: 100,
        }
    }
}

impl TariffTable {
    /// Tariff for a mobility mode.
    pub fn for_mode(&self, mode: MobilityMode) -> Tariff {
        match mode {
            MobilityMode::Bike => self.bike,
            MobilityMode::Kickboard => self.kickboard,
            MobilityMode::Ebike => self.ebike,
        }
    }

    /// Fare for a ride of the given duration: unlock fee plus the
    /// per-minute rate on started minutes.
    pub fn ride_cost(&self, mode: MobilityMode, duration_secs: u32) -> u32 {
        let tariff = self.for_mode(mode);
        tariff.unlock + tariff.per_minute * duration_secs.div_ceil(60)
    }
}

/// The complete immutable routing dataset.
///
/// Constructed by [`super::DatasetBuilder`]; all invariants hold. Shared
/// read-only across concurrent queries.
#[derive(Debug)]
pub struct RoutingDataset {
    pub(crate) stops: Vec<Stop>,
    pub(crate) routes: Vec<Route>,
    /// Indexed by `RouteId`; an empty timetable means no service.
    pub(crate) timetables: Vec<Timetable>,
    /// Indexed by `StopId`.
    pub(crate) transfers: Vec<Vec<Transfer>>,
    /// Indexed by `StopId`: every (route, position) occurrence serving the
    /// stop. Loop routes contribute one entry per visit.
    pub(crate) serving_routes: Vec<Vec<(RouteId, u32)>>,
    pub(crate) vehicles: Vec<MobilityVehicle>,
    pub(crate) bounds: BoundingBox,
    pub(crate) grid_size: u32,
    pub(crate) tariffs: TariffTable,
}

impl RoutingDataset {
    /// The stop with the given id.
    pub fn stop(&self, id: StopId) -> &Stop {
        &self.stops[id.index()]
    }

    /// Coordinate of a stop.
    pub fn stop_point(&self, id: StopId) -> GeoPoint {
        self.stops[id.index()].location
    }

    /// All stops.
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// Number of stops.
    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    /// The route with the given id.
    pub fn route(&self, id: RouteId) -> &Route {
        &self.routes[id.index()]
    }

    /// All routes.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// The timetable of a route. Empty when the route has no service.
    pub fn timetable(&self, id: RouteId) -> &Timetable {
        &self.timetables[id.index()]
    }

    /// Walking transfers departing from a stop.
    pub fn transfers_from(&self, id: StopId) -> &[Transfer] {
        &self.transfers[id.index()]
    }

    /// The (route, stop-position) pairs serving a stop.
    pub fn serving_routes(&self, id: StopId) -> &[(RouteId, u32)] {
        &self.serving_routes[id.index()]
    }

    /// All mobility vehicles.
    pub fn vehicles(&self) -> &[MobilityVehicle] {
        &self.vehicles
    }

    /// The district bounding box.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Zone grid dimension G.
    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// The fare schedule.
    pub fn tariffs(&self) -> &TariffTable {
        &self.tariffs
    }
}
