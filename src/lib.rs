//! Zone-based multimodal journey planner for a bounded urban district.
//!
//! Answers queries of the form *(origin, destination, departure time,
//! preference profile) → ranked journeys*, interleaving scheduled transit
//! with shared micro-mobility and walking. The origin/destination zone
//! distance selects a routing strategy; a round-based transit search and a
//! lazy zone-pruned mobility expansion produce candidates; preference-
//! weighted scoring ranks them.

pub mod dataset;
pub mod domain;
pub mod planner;
pub mod raptor;
pub mod road;
pub mod spatial;
pub mod zone;
