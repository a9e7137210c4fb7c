//! Round-based transit search.
//!
//! This module implements the earliest-arrival search over scheduled
//! routes and foot transfers: round k extends journeys to exactly k
//! transit boardings. The planner feeds it labeled entry points (walk or
//! mobility lead-ins) and reads back domination-free labels at its egress
//! stops.

mod search;

pub use search::{RaptorOutput, RaptorParams, SourceAnchor, TargetLabel, search};
