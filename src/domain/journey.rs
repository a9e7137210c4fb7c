//! Journey types.
//!
//! A `Journey` represents a complete trip from origin to destination:
//! walking legs, micro-mobility rides, and transit legs in order. Segments
//! must connect end-to-end; this is validated at construction.

use serde::Serialize;

use crate::zone::StrategyKind;

use super::{DomainError, GeoPoint, MobilityMode, RouteId, StopId, TransitTime};

/// An endpoint of a segment: either a network stop or a free coordinate
/// (query origin/destination, vehicle pickup point).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Place {
    Stop(StopId),
    Point(GeoPoint),
}

impl Place {
    /// True if two places are the same location for journey-chaining
    /// purposes. Stops match by id, points by coordinate coincidence; a
    /// stop never matches a raw point.
    pub fn coincides_with(&self, other: &Place) -> bool {
        match (self, other) {
            (Place::Stop(a), Place::Stop(b)) => a == b,
            (Place::Point(a), Place::Point(b)) => a.coincides_with(*b),
            _ => false,
        }
    }
}

/// A segment of a journey.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Segment {
    /// A walking leg.
    Walk {
        from: Place,
        to: Place,
        meters: f64,
        duration_secs: u32,
    },

    /// A micro-mobility ride.
    Ride {
        mode: MobilityMode,
        from: Place,
        to: Place,
        meters: f64,
        duration_secs: u32,
        cost: u32,
    },

    /// A scheduled transit leg, anchored at stops.
    Transit {
        route: RouteId,
        line: String,
        board: StopId,
        alight: StopId,
        departs: TransitTime,
        arrives: TransitTime,
        cost: u32,
    },
}

impl Segment {
    /// Returns the origin of this segment.
    pub fn origin(&self) -> Place {
        match self {
            Segment::Walk { from, .. } | Segment::Ride { from, .. } => *from,
            Segment::Transit { board, .. } => Place::Stop(*board),
        }
    }

    /// Returns the destination of this segment.
    pub fn destination(&self) -> Place {
        match self {
            Segment::Walk { to, .. } | Segment::Ride { to, .. } => *to,
            Segment::Transit { alight, .. } => Place::Stop(*alight),
        }
    }

    /// In-motion duration of this segment in seconds. For transit this is
    /// ride time only; waiting for the departure is accounted for by the
    /// journey's clock, not the segment.
    pub fn duration_secs(&self) -> u32 {
        match self {
            Segment::Walk { duration_secs, .. } | Segment::Ride { duration_secs, .. } => {
                *duration_secs
            }
            Segment::Transit { departs, arrives, .. } => arrives.seconds_since(*departs),
        }
    }

    /// Fare contribution of this segment.
    pub fn cost(&self) -> u32 {
        match self {
            Segment::Walk { .. } => 0,
            Segment::Ride { cost, .. } | Segment::Transit { cost, .. } => *cost,
        }
    }

    /// Returns true if this is a walking segment.
    pub fn is_walk(&self) -> bool {
        matches!(self, Segment::Walk { .. })
    }

    /// Returns true if this is a mobility ride.
    pub fn is_ride(&self) -> bool {
        matches!(self, Segment::Ride { .. })
    }

    /// Returns true if this is a transit leg.
    pub fn is_transit(&self) -> bool {
        matches!(self, Segment::Transit { .. })
    }

    /// Returns the ride mode if this is a mobility segment.
    pub fn ride_mode(&self) -> Option<MobilityMode> {
        match self {
            Segment::Ride { mode, .. } => Some(*mode),
            _ => None,
        }
    }
}

/// A complete journey from origin to destination.
///
/// # Invariants
///
/// - At least one segment
/// - Consecutive segments connect (destination of one = origin of next)
/// - Arrival is not before departure
#[derive(Debug, Clone, Serialize)]
pub struct Journey {
    segments: Vec<Segment>,
    strategy: StrategyKind,
    departs: TransitTime,
    arrives: TransitTime,
    walk_meters: f64,
    cost: u32,
}

impl Journey {
    /// Construct a journey from segments and its clock endpoints.
    ///
    /// Walk meters and fare cost are derived from the segments. The clock
    /// endpoints come from the caller because only it knows the waiting
    /// time before scheduled departures.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the segment list is empty, consecutive segments
    /// don't connect, or `arrives < departs`.
    pub fn new(
        segments: Vec<Segment>,
        strategy: StrategyKind,
        departs: TransitTime,
        arrives: TransitTime,
    ) -> Result<Self, DomainError> {
        if segments.is_empty() {
            return Err(DomainError::EmptyJourney);
        }

        for (i, window) in segments.windows(2).enumerate() {
            if !window[0].destination().coincides_with(&window[1].origin()) {
                return Err(DomainError::DisconnectedSegments(i, i + 1));
            }
        }

        if arrives < departs {
            return Err(DomainError::ArrivalBeforeDeparture);
        }

        let walk_meters = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Walk { meters, .. } => Some(*meters),
                _ => None,
            })
            .sum();
        let cost = segments.iter().map(Segment::cost).sum();

        Ok(Self {
            segments,
            strategy,
            departs,
            arrives,
            walk_meters,
            cost,
        })
    }

    /// Returns all segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The strategy that produced this journey.
    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// Departure clock time.
    pub fn departs(&self) -> TransitTime {
        self.departs
    }

    /// Arrival clock time.
    pub fn arrives(&self) -> TransitTime {
        self.arrives
    }

    /// Total door-to-door travel time in seconds, waiting included.
    pub fn total_secs(&self) -> u32 {
        self.arrives.seconds_since(self.departs)
    }

    /// Total walking distance in meters.
    pub fn walk_meters(&self) -> f64 {
        self.walk_meters
    }

    /// Total fare cost.
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Number of transfers: distinct transit routes used minus one, or 0
    /// if the journey uses no transit.
    pub fn transfer_count(&self) -> usize {
        let mut seen: Vec<RouteId> = Vec::new();
        for seg in &self.segments {
            if let Segment::Transit { route, .. } = seg
                && !seen.contains(route)
            {
                seen.push(*route);
            }
        }
        seen.len().saturating_sub(1)
    }

    /// Transit routes in boarding order (with repeats), for dedup keys.
    pub fn transit_sequence(&self) -> Vec<RouteId> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Transit { route, .. } => Some(*route),
                _ => None,
            })
            .collect()
    }

    /// All transit legs in order.
    pub fn transit_legs(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|s| s.is_transit())
    }

    /// All mobility rides in order.
    pub fn rides(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|s| s.is_ride())
    }

    /// True if the journey contains at least one mobility ride.
    pub fn uses_mobility(&self) -> bool {
        self.segments.iter().any(Segment::is_ride)
    }

    /// True if the journey is walking only.
    pub fn is_walk_only(&self) -> bool {
        self.segments.iter().all(Segment::is_walk)
    }

    /// Seconds spent on mobility rides.
    pub fn mobility_secs(&self) -> u32 {
        self.rides().map(Segment::duration_secs).sum()
    }

    /// Seconds spent aboard transit.
    pub fn transit_secs(&self) -> u32 {
        self.transit_legs().map(Segment::duration_secs).sum()
    }
}
