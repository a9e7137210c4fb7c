//! Dataset construction and invariant validation.
//!
//! All dataset invariants are enforced here, once, at startup. A dataset
//! that builds successfully is trusted by the whole query path; nothing
//! re-validates mid-query.

use thiserror::Error;
use tracing::info;

use crate::domain::{BoundingBox, GeoPoint, MobilityMode, RouteId, StopId, TransitTime};

use super::model::{
    MobilityVehicle, Route, RouteMode, RoutingDataset, Stop, StopKind, StopTime, TariffTable,
    Timetable, Transfer, Trip,
};

/// Errors detected while building the dataset. Fatal at startup; never
/// raised mid-query.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// No bounding box was provided
    #[error("dataset has no bounding box")]
    MissingBounds,

    /// Bounding box is empty or inverted
    #[error("bounding box is degenerate")]
    InvalidBounds,

    /// Grid size must be at least 1
    #[error("grid size must be at least 1")]
    InvalidGridSize,

    /// A stop lies outside the district
    #[error("stop {id} lies outside the district bounding box")]
    StopOutOfBounds { id: String },

    /// A route has no stops
    #[error("route {id} has an empty stop sequence")]
    EmptyRoute { id: String },

    /// A route references a stop that does not exist
    #[error("route {id} references a stop that does not exist")]
    DanglingStopRef { id: String },

    /// A trip's stop-time count differs from its route's stop count
    #[error("trip {trip} on route {route} does not match the route's stop count")]
    TimetableShape { route: String, trip: String },

    /// Times decrease along a trip, or departure precedes arrival
    #[error("trip {trip} on route {route} has non-monotone times")]
    NonMonotoneTrip { route: String, trip: String },

    /// Trips overtake each other within a route
    #[error("trips on route {route} overtake at stop position {position}")]
    TripOvertakes { route: String, position: usize },

    /// A transfer references a stop that does not exist
    #[error("transfer references a stop that does not exist")]
    DanglingTransferRef,

    /// A JSON payload referenced an unknown stop id
    #[error("unknown stop id \"{id}\"")]
    UnknownStopRef { id: String },

    /// The dataset JSON failed to parse
    #[error("failed to parse dataset JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The dataset file could not be read
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
}

/// Incrementally assemble a [`RoutingDataset`], then [`build`](Self::build).
///
/// # Example
///
/// ```
/// use journey_planner::dataset::{DatasetBuilder, RouteMode, StopKind};
/// use journey_planner::domain::{BoundingBox, GeoPoint};
///
/// let mut b = DatasetBuilder::new(BoundingBox::new(37.46, 37.55, 127.00, 127.14), 30);
/// let s1 = b.add_stop("M201", "Gangnam", GeoPoint::new(37.4979, 127.0276), StopKind::Metro);
/// let s2 = b.add_stop("M202", "Yeoksam", GeoPoint::new(37.5006, 127.0364), StopKind::Metro);
/// let line = b.add_route("2", RouteMode::Metro, "Metro Line 2", vec![s1, s2]);
/// b.add_trip(line, "2-0800", vec![(28800, 28800), (28920, 28940)]);
/// b.add_transfer(s1, s2, 700);
///
/// let dataset = b.build().unwrap();
/// assert_eq!(dataset.stop_count(), 2);
/// ```
pub struct DatasetBuilder {
    stops: Vec<Stop>,
    routes: Vec<Route>,
    trips: Vec<Vec<Trip>>,
    transfer_edges: Vec<(StopId, StopId, u32)>,
    vehicles: Vec<MobilityVehicle>,
    bounds: BoundingBox,
    grid_size: u32,
    tariffs: TariffTable,
}

impl DatasetBuilder {
    /// Start a dataset for the given district bounds and zone grid size.
    pub fn new(bounds: BoundingBox, grid_size: u32) -> Self {
        Self {
            stops: Vec::new(),
            routes: Vec::new(),
            trips: Vec::new(),
            transfer_edges: Vec::new(),
            vehicles: Vec::new(),
            bounds,
            grid_size,
            tariffs: TariffTable::default(),
        }
    }

    /// Override the default fare schedule.
    pub fn set_tariffs(&mut self, tariffs: TariffTable) {
        self.tariffs = tariffs;
    }

    /// Add a stop and return its id.
    pub fn add_stop(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        location: GeoPoint,
        kind: StopKind,
    ) -> StopId {
        let stop_id = StopId(self.stops.len() as u32);
        self.stops.push(Stop {
            id: id.into(),
            name: name.into(),
            location,
            kind,
        });
        stop_id
    }

    /// Add a route with its ordered stop sequence and return its id.
    ///
    /// Circular lines must arrive pre-split into directed variants so each
    /// sequence is a simple path; the builder does not synthesize variants.
    pub fn add_route(
        &mut self,
        id: impl Into<String>,
        mode: RouteMode,
        label: impl Into<String>,
        stops: Vec<StopId>,
    ) -> RouteId {
        let route_id = RouteId(self.routes.len() as u32);
        self.routes.push(Route {
            id: id.into(),
            mode,
            label: label.into(),
            stops,
        });
        self.trips.push(Vec::new());
        route_id
    }

    /// Add a trip to a route. `stop_times` are `(arrival, departure)`
    /// seconds-of-day, one pair per stop of the route.
    pub fn add_trip(&mut self, route: RouteId, id: impl Into<String>, stop_times: Vec<(u32, u32)>) {
        self.trips[route.index()].push(Trip {
            id: id.into(),
            stop_times: stop_times
                .into_iter()
                .map(|(a, d)| StopTime {
                    arrival: TransitTime::from_seconds(a),
                    departure: TransitTime::from_seconds(d),
                })
                .collect(),
        });
    }

    /// Add an undirected walking transfer between two stops.
    pub fn add_transfer(&mut self, a: StopId, b: StopId, walk_secs: u32) {
        self.transfer_edges.push((a, b, walk_secs));
    }

    /// Add a mobility vehicle or virtual station.
    pub fn add_vehicle(
        &mut self,
        id: impl Into<String>,
        mode: MobilityMode,
        location: GeoPoint,
        capacity: u16,
    ) {
        self.vehicles.push(MobilityVehicle {
            id: id.into(),
            mode,
            location,
            capacity,
        });
    }

    /// Validate every invariant and produce the dataset.
    pub fn build(self) -> Result<RoutingDataset, DatasetError> {
        let Self {
            stops,
            routes,
            trips: all_trips,
            transfer_edges,
            vehicles,
            bounds,
            grid_size,
            tariffs,
        } = self;

        if bounds.lat_span() <= 0.0 || bounds.lon_span() <= 0.0 {
            return Err(DatasetError::InvalidBounds);
        }
        if grid_size == 0 {
            return Err(DatasetError::InvalidGridSize);
        }

        for stop in &stops {
            if !bounds.contains(stop.location) {
                return Err(DatasetError::StopOutOfBounds {
                    id: stop.id.clone(),
                });
            }
        }

        let stop_count = stops.len();
        for route in &routes {
            if route.stops.is_empty() {
                return Err(DatasetError::EmptyRoute {
                    id: route.id.clone(),
                });
            }
            if route.stops.iter().any(|s| s.index() >= stop_count) {
                return Err(DatasetError::DanglingStopRef {
                    id: route.id.clone(),
                });
            }
        }

        let mut timetables = Vec::with_capacity(routes.len());
        for (route, mut trips) in routes.iter().zip(all_trips) {
            for trip in &trips {
                if trip.stop_times.len() != route.stops.len() {
                    return Err(DatasetError::TimetableShape {
                        route: route.id.clone(),
                        trip: trip.id.clone(),
                    });
                }
                let mut prev = None;
                for st in &trip.stop_times {
                    if st.departure < st.arrival {
                        return Err(DatasetError::NonMonotoneTrip {
                            route: route.id.clone(),
                            trip: trip.id.clone(),
                        });
                    }
                    if let Some(prev) = prev
                        && st.arrival < prev
                    {
                        return Err(DatasetError::NonMonotoneTrip {
                            route: route.id.clone(),
                            trip: trip.id.clone(),
                        });
                    }
                    prev = Some(st.departure);
                }
            }

            // Sort by first departure, then verify no overtaking anywhere.
            trips.sort_by_key(|t| t.stop_times[0].departure);
            for pos in 0..route.stops.len() {
                for pair in trips.windows(2) {
                    if pair[1].stop_times[pos].departure < pair[0].stop_times[pos].departure {
                        return Err(DatasetError::TripOvertakes {
                            route: route.id.clone(),
                            position: pos,
                        });
                    }
                }
            }

            timetables.push(Timetable::new(trips));
        }

        let mut transfers = vec![Vec::new(); stop_count];
        for (a, b, walk_secs) in transfer_edges {
            if a.index() >= stop_count || b.index() >= stop_count {
                return Err(DatasetError::DanglingTransferRef);
            }
            transfers[a.index()].push(Transfer { to: b, walk_secs });
            transfers[b.index()].push(Transfer { to: a, walk_secs });
        }

        let mut serving_routes: Vec<Vec<(RouteId, u32)>> = vec![Vec::new(); stop_count];
        for (r, route) in routes.iter().enumerate() {
            for (pos, stop) in route.stops.iter().enumerate() {
                serving_routes[stop.index()].push((RouteId(r as u32), pos as u32));
            }
        }

        info!(
            stops = stop_count,
            routes = routes.len(),
            vehicles = vehicles.len(),
            "routing dataset built"
        );

        Ok(RoutingDataset {
            stops,
            routes,
            timetables,
            transfers,
            serving_routes,
            vehicles,
            bounds,
            grid_size,
            tariffs,
        })
    }
}
