//! Domain types for the multimodal journey planner.
//!
//! This module contains the core value types shared by the routing
//! dataset, the transit search, and the planner. All types enforce their
//! invariants at construction time, so code that receives these types can
//! trust their validity.

mod error;
mod geo;
mod ids;
mod journey;
mod mode;
mod preference;
mod time;

pub use error::DomainError;
pub use geo::{BoundingBox, GeoPoint, QuantizedPoint};
pub use ids::{RouteId, StopId};
pub use journey::{Journey, Place, Segment};
pub use mode::MobilityMode;
pub use preference::{MobilityPreference, PreferenceError, RoutePreference};
pub use time::{TimeError, TransitTime};
