//! JSON dataset loading.
//!
//! The on-disk format mirrors the prebuilt structure the core consumes:
//! stops, routes with their trips, transfers, mobility vehicles, bounds,
//! grid size, and an optional tariff override. Stop references are by
//! external string id and are resolved while feeding the builder, so every
//! build-time invariant applies to loaded data too.

use std::collections::HashMap;
use std::io::Read;

use serde::Deserialize;

use crate::domain::{BoundingBox, GeoPoint, MobilityMode, StopId};

use super::build::{DatasetBuilder, DatasetError};
use super::model::{RouteMode, RoutingDataset, StopKind, TariffTable};

#[derive(Deserialize)]
struct RawDataset {
    bounds: BoundingBox,
    #[serde(default = "default_grid_size")]
    grid_size: u32,
    #[serde(default)]
    tariffs: Option<TariffTable>,
    stops: Vec<RawStop>,
    routes: Vec<RawRoute>,
    #[serde(default)]
    transfers: Vec<RawTransfer>,
    #[serde(default)]
    vehicles: Vec<RawVehicle>,
}

fn default_grid_size() -> u32 {
    30
}

#[derive(Deserialize)]
struct RawStop {
    id: String,
    name: String,
    lat: f64,
    lon: f64,
    kind: StopKind,
}

#[derive(Deserialize)]
struct RawRoute {
    id: String,
    mode: RouteMode,
    label: String,
    stops: Vec<String>,
    #[serde(default)]
    trips: Vec<RawTrip>,
}

#[derive(Deserialize)]
struct RawTrip {
    id: String,
    /// `(arrival, departure)` seconds-of-day per stop of the route.
    stop_times: Vec<(u32, u32)>,
}

#[derive(Deserialize)]
struct RawTransfer {
    from: String,
    to: String,
    walk_secs: u32,
}

#[derive(Deserialize)]
struct RawVehicle {
    id: String,
    mode: MobilityMode,
    lat: f64,
    lon: f64,
    #[serde(default = "default_capacity")]
    capacity: u16,
}

fn default_capacity() -> u16 {
    1
}

impl RoutingDataset {
    /// Load and validate a dataset from its JSON representation.
    pub fn from_json_str(json: &str) -> Result<Self, DatasetError> {
        let raw: RawDataset = serde_json::from_str(json)?;
        build_from_raw(raw)
    }

    /// Load and validate a dataset from a reader.
    pub fn from_json_reader(reader: impl Read) -> Result<Self, DatasetError> {
        let raw: RawDataset = serde_json::from_reader(reader)?;
        build_from_raw(raw)
    }
}

fn build_from_raw(raw: RawDataset) -> Result<RoutingDataset, DatasetError> {
    let mut builder = DatasetBuilder::new(raw.bounds, raw.grid_size);
    if let Some(tariffs) = raw.tariffs {
        builder.set_tariffs(tariffs);
    }

    let mut by_id: HashMap<String, StopId> = HashMap::with_capacity(raw.stops.len());
    for stop in raw.stops {
        let id = builder.add_stop(
            stop.id.clone(),
            stop.name,
            GeoPoint::new(stop.lat, stop.lon),
            stop.kind,
        );
        by_id.insert(stop.id, id);
    }

    let resolve = |id: &str, by_id: &HashMap<String, StopId>| {
        by_id
            .get(id)
            .copied()
            .ok_or_else(|| DatasetError::UnknownStopRef { id: id.to_owned() })
    };

    for route in raw.routes {
        let stops = route
            .stops
            .iter()
            .map(|s| resolve(s, &by_id))
            .collect::<Result<Vec<_>, _>>()?;
        let route_id = builder.add_route(route.id, route.mode, route.label, stops);
        for trip in route.trips {
            builder.add_trip(route_id, trip.id, trip.stop_times);
        }
    }

    for transfer in raw.transfers {
        let from = resolve(&transfer.from, &by_id)?;
        let to = resolve(&transfer.to, &by_id)?;
        builder.add_transfer(from, to, transfer.walk_secs);
    }

    for vehicle in raw.vehicles {
        builder.add_vehicle(
            vehicle.id,
            vehicle.mode,
            GeoPoint::new(vehicle.lat, vehicle.lon),
            vehicle.capacity,
        );
    }

    builder.build()
}
