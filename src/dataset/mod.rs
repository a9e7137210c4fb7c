//! The immutable routing dataset.
//!
//! Everything the planner routes over is loaded once into a
//! [`RoutingDataset`] and shared read-only across queries. Invariants
//! (timetable monotonicity, stop references, bounding box membership) are
//! enforced when the dataset is built; query code trusts them thereafter.

mod build;
mod load;
mod model;

pub use build::{DatasetBuilder, DatasetError};
pub use model::{
    MobilityVehicle, Route, RouteMode, RoutingDataset, Stop, StopKind, StopTime, Tariff,
    TariffTable, Timetable, Transfer, Trip,
};
