//! Query orchestration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use itertools::Itertools;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::dataset::{MobilityVehicle, RoutingDataset};
use crate::domain::{
    GeoPoint, Journey, MobilityMode, Place, PreferenceError, RoutePreference, Segment, StopId,
    TransitTime,
};
use crate::raptor::{RaptorParams, SourceAnchor, search};
use crate::road::{QueryDistanceCache, RoadDistance, ride_secs, walk_secs};
use crate::spatial::SpatialIndex;
use crate::zone::{Strategy, StrategyKind, ZoneGrid, strategy_for};

use super::config::PlannerConfig;
use super::rank::{ScoredJourney, deduplicate, remove_dominated, score_journeys};

/// Error from planning a query.
#[derive(Debug, Clone, Error)]
pub enum PlanError {
    /// Origin or destination lies outside the district
    #[error("point ({lat}, {lon}) lies outside the district")]
    OutOfBounds { lat: f64, lon: f64 },

    /// The preference profile failed validation
    #[error("invalid preference: {0}")]
    Preference(#[from] PreferenceError),
}

/// A journey planning request.
#[derive(Debug, Clone)]
pub struct PlanQuery {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub departure: TransitTime,
    pub preference: RoutePreference,
    /// Wall-clock budget for the query. On expiry the planner returns its
    /// best-so-far candidates with `timed_out` set.
    pub deadline: Option<Duration>,
}

impl PlanQuery {
    /// A query with default preferences and no deadline.
    pub fn new(origin: GeoPoint, destination: GeoPoint, departure: TransitTime) -> Self {
        Self {
            origin,
            destination,
            departure,
            preference: RoutePreference::default(),
            deadline: None,
        }
    }
}

/// The ranked answer to a query.
#[derive(Debug, Clone, Serialize)]
pub struct PlanResult {
    /// The strategy selected from the origin/destination zone distance.
    pub strategy: StrategyKind,
    /// At most `max_results` journeys, best first.
    pub journeys: Vec<ScoredJourney>,
    /// True when the deadline cut the search short.
    pub timed_out: bool,
    /// Set when `journeys` is empty: why nothing was found.
    pub reason: Option<String>,
}

/// One egress option at a transit stop: the segments from alighting to the
/// destination and their duration.
struct EgressOption {
    tail: Vec<Segment>,
    secs: u32,
}

/// The multimodal journey planner.
///
/// Holds the shared read-only state (dataset, spatial index, zone grid,
/// road-distance oracle). `plan` borrows `&self`, so one planner serves
/// concurrent queries from multiple threads.
pub struct Planner {
    dataset: Arc<RoutingDataset>,
    spatial: SpatialIndex,
    grid: ZoneGrid,
    oracle: Arc<dyn RoadDistance>,
    config: PlannerConfig,
}

impl Planner {
    /// Build a planner over a dataset and a road-distance oracle.
    pub fn new(
        dataset: Arc<RoutingDataset>,
        oracle: Arc<dyn RoadDistance>,
        config: PlannerConfig,
    ) -> Self {
        let spatial = SpatialIndex::build(&dataset);
        let grid = ZoneGrid::new(dataset.bounds(), dataset.grid_size());
        Self {
            dataset,
            spatial,
            grid,
            oracle,
            config,
        }
    }

    /// Plan journeys for a query.
    #[instrument(skip(self, query), fields(departure = %query.departure))]
    pub fn plan(&self, query: &PlanQuery) -> Result<PlanResult, PlanError> {
        let started = Instant::now();
        let deadline = query.deadline.map(|budget| started + budget);
        let preference = query.preference.validated()?;

        for point in [query.origin, query.destination] {
            if !self.dataset.bounds().contains(point) {
                return Err(PlanError::OutOfBounds {
                    lat: point.lat,
                    lon: point.lon,
                });
            }
        }

        let origin_zone = self.grid.zone_of(query.origin);
        let dest_zone = self.grid.zone_of(query.destination);
        let zone_distance = self.grid.zone_distance(origin_zone, dest_zone);
        let strategy = strategy_for(zone_distance);

        debug!(
            ?origin_zone,
            ?dest_zone,
            zone_distance,
            strategy = %strategy.kind,
            "strategy selected"
        );

        // Identical origin and destination: exactly one zero-length walk.
        if query.origin.coincides_with(query.destination) {
            return Ok(PlanResult {
                strategy: strategy.kind,
                journeys: vec![ScoredJourney {
                    journey: zero_walk(query, strategy.kind),
                    score: 0.0,
                }],
                timed_out: false,
                reason: None,
            });
        }

        let distances = QueryDistanceCache::new(&*self.oracle);
        let mut candidates: Vec<Journey> = Vec::new();

        // Step 2: direct mobility and pure-walk candidates, always.
        self.direct_candidates(query, &preference, strategy, &distances, &mut candidates);

        let mut timed_out = expired(deadline);
        if !timed_out && strategy.kind != StrategyKind::MobilityOnly {
            timed_out = self.transit_candidates(
                query,
                &preference,
                strategy,
                zone_distance,
                origin_zone,
                dest_zone,
                deadline,
                &distances,
                &mut candidates,
            );
        }

        let survivors = remove_dominated(candidates);
        let mut scored = score_journeys(survivors, &preference, strategy, &self.config);
        scored.sort_by(|a, b| a.score.total_cmp(&b.score));
        let mut journeys = deduplicate(scored, self.config.dedup_window_secs);
        journeys.truncate(self.config.max_results);

        let reason = if journeys.is_empty() {
            warn!("no journey found");
            Some(
                "no transit, mobility, or walking option connects origin and destination \
                 within the walking limits"
                    .to_string(),
            )
        } else {
            None
        };

        debug!(
            journeys = journeys.len(),
            timed_out,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "plan complete"
        );

        Ok(PlanResult {
            strategy: strategy.kind,
            journeys,
            timed_out,
            reason,
        })
    }

    /// Step 2: per-mode vehicle pairs near the endpoints, plus a pure-walk
    /// journey when the whole trip is within the walking limit.
    fn direct_candidates(
        &self,
        query: &PlanQuery,
        preference: &RoutePreference,
        strategy: Strategy,
        distances: &QueryDistanceCache<'_>,
        out: &mut Vec<Journey>,
    ) {
        let origin = query.origin;
        let destination = query.destination;

        let walk_m = distances.distance(origin, destination);
        if walk_m <= preference.max_walk_distance {
            let secs = walk_secs(walk_m);
            push_journey(
                out,
                vec![Segment::Walk {
                    from: Place::Point(origin),
                    to: Place::Point(destination),
                    meters: walk_m,
                    duration_secs: secs,
                }],
                strategy.kind,
                query.departure,
                query.departure + secs,
            );
        }

        for mode in MobilityMode::ALL {
            let Some((pickup_idx, pickup_m)) = self.nearest_vehicle_by_road(
                origin,
                preference.max_walk_to_stop,
                mode,
                distances,
                false,
            ) else {
                continue;
            };
            let Some((dropoff_idx, dropoff_m)) = self.nearest_vehicle_by_road(
                destination,
                preference.max_walk_to_stop,
                mode,
                distances,
                true,
            ) else {
                continue;
            };
            if pickup_idx == dropoff_idx {
                continue;
            }

            let pickup = &self.dataset.vehicles()[pickup_idx];
            let dropoff = &self.dataset.vehicles()[dropoff_idx];

            let walk_in_secs = walk_secs(pickup_m);
            let ride_m = distances.distance(pickup.location, dropoff.location);
            let ride_time = ride_secs(mode, ride_m);
            let walk_out_secs = walk_secs(dropoff_m);
            let cost = self.dataset.tariffs().ride_cost(mode, ride_time);

            let segments = vec![
                Segment::Walk {
                    from: Place::Point(origin),
                    to: Place::Point(pickup.location),
                    meters: pickup_m,
                    duration_secs: walk_in_secs,
                },
                Segment::Ride {
                    mode,
                    from: Place::Point(pickup.location),
                    to: Place::Point(dropoff.location),
                    meters: ride_m,
                    duration_secs: ride_time,
                    cost,
                },
                Segment::Walk {
                    from: Place::Point(dropoff.location),
                    to: Place::Point(destination),
                    meters: dropoff_m,
                    duration_secs: walk_out_secs,
                },
            ];
            let total = walk_in_secs + ride_time + walk_out_secs;
            push_journey(
                out,
                segments,
                strategy.kind,
                query.departure,
                query.departure + total,
            );
        }
    }

    /// The vehicle of `mode` with the smallest road distance to `point`
    /// within the walk limit. `from_vehicle` measures vehicle→point
    /// (egress side) instead of point→vehicle.
    fn nearest_vehicle_by_road(
        &self,
        point: GeoPoint,
        limit_m: f64,
        mode: MobilityMode,
        distances: &QueryDistanceCache<'_>,
        from_vehicle: bool,
    ) -> Option<(usize, f64)> {
        self.spatial
            .vehicles_within(point, limit_m, mode)
            .into_iter()
            .map(|(idx, _)| {
                let loc = self.dataset.vehicles()[idx].location;
                let road_m = if from_vehicle {
                    distances.distance(loc, point)
                } else {
                    distances.distance(point, loc)
                };
                (idx, road_m)
            })
            .filter(|(_, road_m)| *road_m <= limit_m)
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Steps 3 and 4: a transit search over the walk access/egress sets,
    /// then (when the strategy leans mobility and the trip spans zones) a
    /// second search over the sets augmented with zone-pruned mobility
    /// anchors. Returns whether the deadline expired.
    #[allow(clippy::too_many_arguments)]
    fn transit_candidates(
        &self,
        query: &PlanQuery,
        preference: &RoutePreference,
        strategy: Strategy,
        zone_distance: u32,
        origin_zone: crate::zone::ZoneId,
        dest_zone: crate::zone::ZoneId,
        deadline: Option<Instant>,
        distances: &QueryDistanceCache<'_>,
        out: &mut Vec<Journey>,
    ) -> bool {
        let sources = self.walk_access(query, preference, distances);
        let egress = self.walk_egress(query, preference, distances);

        let mut timed_out =
            self.run_search(query, strategy, &sources, &egress, deadline, out);

        let hybrid = strategy.mobility_weight > self.config.hybrid_mobility_floor
            && zone_distance >= 1;
        if hybrid && !timed_out {
            // An anchor arriving earlier at a shared stop shadows the
            // others, so the augmented sets get their own search rather
            // than being merged into the first.
            let mut sources = sources;
            let mut egress = egress;
            self.mobility_access(query, preference, origin_zone, distances, &mut sources);
            self.mobility_egress(query, preference, dest_zone, distances, &mut egress);
            timed_out |= self.run_search(query, strategy, &sources, &egress, deadline, out);
        }

        timed_out || expired(deadline)
    }

    /// One search invocation plus journey synthesis from its labels.
    fn run_search(
        &self,
        query: &PlanQuery,
        strategy: Strategy,
        sources: &[SourceAnchor],
        egress: &HashMap<StopId, Vec<EgressOption>>,
        deadline: Option<Instant>,
        out: &mut Vec<Journey>,
    ) -> bool {
        debug!(
            sources = sources.len(),
            targets = egress.len(),
            "transit anchor sets built"
        );
        if sources.is_empty() || egress.is_empty() {
            return expired(deadline);
        }

        let params = RaptorParams {
            max_rounds: self.config.max_rounds,
            deadline,
        };
        let targets: Vec<StopId> = egress.keys().copied().collect();
        let output = search(&self.dataset, sources.to_vec(), &targets, &params);

        for stop in output.reached_targets() {
            let options = &egress[&stop];
            for label in output.labels_at(stop) {
                for option in options {
                    let mut segments = output.reconstruct(&self.dataset, label);
                    segments.extend(option.tail.iter().cloned());
                    push_journey(
                        out,
                        segments,
                        strategy.kind,
                        query.departure,
                        label.arrival + option.secs,
                    );
                }
            }
        }

        output.timed_out
    }

    /// Access set A: transit stops walkable from the origin.
    fn walk_access(
        &self,
        query: &PlanQuery,
        preference: &RoutePreference,
        distances: &QueryDistanceCache<'_>,
    ) -> Vec<SourceAnchor> {
        let mut sources = Vec::new();
        for (stop, _) in self
            .spatial
            .stops_within(query.origin, preference.max_walk_to_stop)
        {
            let meters = distances.distance(query.origin, self.dataset.stop_point(stop));
            if meters > preference.max_walk_to_stop {
                continue;
            }
            let secs = walk_secs(meters);
            sources.push(SourceAnchor {
                stop,
                arrival: query.departure + secs,
                lead_in: vec![Segment::Walk {
                    from: Place::Point(query.origin),
                    to: Place::Stop(stop),
                    meters,
                    duration_secs: secs,
                }],
                walk_meters: meters,
                cost: 0,
            });
        }
        sources
    }

    /// Egress set E: transit stops walkable to the destination.
    fn walk_egress(
        &self,
        query: &PlanQuery,
        preference: &RoutePreference,
        distances: &QueryDistanceCache<'_>,
    ) -> HashMap<StopId, Vec<EgressOption>> {
        let mut egress: HashMap<StopId, Vec<EgressOption>> = HashMap::new();
        for (stop, _) in self
            .spatial
            .stops_within(query.destination, preference.max_walk_to_stop)
        {
            let meters = distances.distance(self.dataset.stop_point(stop), query.destination);
            if meters > preference.max_walk_to_stop {
                continue;
            }
            let secs = walk_secs(meters);
            egress.entry(stop).or_default().push(EgressOption {
                tail: vec![Segment::Walk {
                    from: Place::Stop(stop),
                    to: Place::Point(query.destination),
                    meters,
                    duration_secs: secs,
                }],
                secs,
            });
        }
        egress
    }

    /// Access anchors A′: walk to a nearby vehicle, ride it to a transit
    /// stop near its position.
    fn mobility_access(
        &self,
        query: &PlanQuery,
        preference: &RoutePreference,
        origin_zone: crate::zone::ZoneId,
        distances: &QueryDistanceCache<'_>,
        sources: &mut Vec<SourceAnchor>,
    ) {
        for (idx, walk_m) in self.hybrid_vehicles(origin_zone, query.origin, distances, false) {
            let vehicle = &self.dataset.vehicles()[idx];
            let walk_in_secs = walk_secs(walk_m);

            for (stop, ride_m) in self.stops_near_vehicle(vehicle, preference, distances) {
                let ride_time = ride_secs(vehicle.mode, ride_m);
                let cost = self.dataset.tariffs().ride_cost(vehicle.mode, ride_time);
                sources.push(SourceAnchor {
                    stop,
                    arrival: query.departure + walk_in_secs + ride_time,
                    lead_in: vec![
                        Segment::Walk {
                            from: Place::Point(query.origin),
                            to: Place::Point(vehicle.location),
                            meters: walk_m,
                            duration_secs: walk_in_secs,
                        },
                        Segment::Ride {
                            mode: vehicle.mode,
                            from: Place::Point(vehicle.location),
                            to: Place::Stop(stop),
                            meters: ride_m,
                            duration_secs: ride_time,
                            cost,
                        },
                    ],
                    walk_meters: walk_m,
                    cost,
                });
            }
        }
    }

    /// Egress anchors E′: walk from a transit stop to a vehicle near the
    /// destination zone, ride it to the destination.
    fn mobility_egress(
        &self,
        query: &PlanQuery,
        preference: &RoutePreference,
        dest_zone: crate::zone::ZoneId,
        distances: &QueryDistanceCache<'_>,
        egress: &mut HashMap<StopId, Vec<EgressOption>>,
    ) {
        for (idx, _) in self.hybrid_vehicles(dest_zone, query.destination, distances, true) {
            let vehicle = &self.dataset.vehicles()[idx];
            let ride_m = distances.distance(vehicle.location, query.destination);
            let ride_time = ride_secs(vehicle.mode, ride_m);
            let cost = self.dataset.tariffs().ride_cost(vehicle.mode, ride_time);

            for (stop, stop_to_vehicle_m) in self.stops_near_vehicle(vehicle, preference, distances)
            {
                let walk_secs_out = walk_secs(stop_to_vehicle_m);
                egress.entry(stop).or_default().push(EgressOption {
                    tail: vec![
                        Segment::Walk {
                            from: Place::Stop(stop),
                            to: Place::Point(vehicle.location),
                            meters: stop_to_vehicle_m,
                            duration_secs: walk_secs_out,
                        },
                        Segment::Ride {
                            mode: vehicle.mode,
                            from: Place::Point(vehicle.location),
                            to: Place::Point(query.destination),
                            meters: ride_m,
                            duration_secs: ride_time,
                            cost,
                        },
                    ],
                    secs: walk_secs_out + ride_time,
                });
            }
        }
    }

    /// Vehicles whose zone is within the hybrid radius of `zone`, top N
    /// per mode by ascending road distance from `endpoint`.
    fn hybrid_vehicles(
        &self,
        zone: crate::zone::ZoneId,
        endpoint: GeoPoint,
        distances: &QueryDistanceCache<'_>,
        from_vehicle: bool,
    ) -> Vec<(usize, f64)> {
        let in_range = |vehicle: &MobilityVehicle| {
            let vz = self.grid.zone_of(vehicle.location);
            self.grid.zone_distance(vz, zone) <= self.config.hybrid_zone_radius
        };

        let mut picked = Vec::new();
        for mode in MobilityMode::ALL {
            picked.extend(
                self.dataset
                    .vehicles()
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| v.mode == mode && in_range(v))
                    .map(|(idx, v)| {
                        let road_m = if from_vehicle {
                            distances.distance(v.location, endpoint)
                        } else {
                            distances.distance(endpoint, v.location)
                        };
                        (idx, road_m)
                    })
                    .sorted_by(|a, b| a.1.total_cmp(&b.1))
                    .take(self.config.hybrid_vehicles_per_mode),
            );
        }
        picked
    }

    /// Transit stops within the walk-to-stop limit of a vehicle, top N by
    /// ascending road distance from it.
    fn stops_near_vehicle(
        &self,
        vehicle: &MobilityVehicle,
        preference: &RoutePreference,
        distances: &QueryDistanceCache<'_>,
    ) -> Vec<(StopId, f64)> {
        self.spatial
            .stops_within(vehicle.location, preference.max_walk_to_stop)
            .into_iter()
            .map(|(stop, _)| {
                (
                    stop,
                    distances.distance(vehicle.location, self.dataset.stop_point(stop)),
                )
            })
            .sorted_by(|a, b| a.1.total_cmp(&b.1))
            .take(self.config.hybrid_stops_per_vehicle)
            .collect()
    }
}

/// Append a journey if its segments validate; anchor-set construction
/// guarantees they do, but a malformed candidate is dropped rather than
/// aborting the query.
fn push_journey(
    out: &mut Vec<Journey>,
    segments: Vec<Segment>,
    strategy: StrategyKind,
    departs: TransitTime,
    arrives: TransitTime,
) {
    if let Ok(journey) = Journey::new(segments, strategy, departs, arrives) {
        out.push(journey);
    }
}

/// The single zero-length walk for an identical origin and destination.
fn zero_walk(query: &PlanQuery, strategy: StrategyKind) -> Journey {
    Journey::new(
        vec![Segment::Walk {
            from: Place::Point(query.origin),
            to: Place::Point(query.destination),
            meters: 0.0,
            duration_secs: 0,
        }],
        strategy,
        query.departure,
        query.departure,
    )
    // Safe: a single zero-length segment always validates.
    .unwrap()
}

fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}
