//! The transit search engine.
//!
//! Per round, two relaxation phases: a route scan over every route serving
//! a stop marked in the previous round, then foot-transfer relaxation from
//! the stops the scan improved. Boarding decisions read only previous-round
//! labels, so transfers never chain within a round and a loop route cannot
//! be re-boarded from a label created in the same round.
//!
//! All per-query state lives in this module's `SearchState`; nothing
//! escapes the call. Back-pointers go through a contiguous arena with
//! integer parents.

use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, trace};

use crate::dataset::RoutingDataset;
use crate::domain::{RouteId, Segment, StopId, TransitTime};
use crate::road::WALK_SPEED_MPS;

const INF: u32 = u32::MAX;

/// A labeled entry point into the transit network.
///
/// The lead-in segments (access walk, or walk + mobility ride) are carried
/// through so reconstructed journeys start at the query origin.
#[derive(Debug, Clone)]
pub struct SourceAnchor {
    pub stop: StopId,
    /// Clock time the traveler is ready to board at `stop`.
    pub arrival: TransitTime,
    /// Segments that got the traveler to `stop`.
    pub lead_in: Vec<Segment>,
    /// Walk meters already spent in the lead-in.
    pub walk_meters: f64,
    /// Fare already spent in the lead-in.
    pub cost: u32,
}

/// Search limits.
#[derive(Debug, Clone)]
pub struct RaptorParams {
    /// Maximum number of transit boardings (rounds).
    pub max_rounds: usize,
    /// Wall-clock cutoff, checked at round boundaries and before each
    /// route scan.
    pub deadline: Option<Instant>,
}

impl Default for RaptorParams {
    fn default() -> Self {
        Self {
            max_rounds: 4,
            deadline: None,
        }
    }
}

/// A non-dominated arrival at a target stop.
#[derive(Debug, Clone, Copy)]
pub struct TargetLabel {
    pub arrival: TransitTime,
    /// Transit boardings used (the round that produced the label).
    pub boardings: u8,
    /// Walk meters accumulated, lead-in included.
    pub walk_meters: f64,
    /// Fare accumulated, lead-in included.
    pub cost: u32,
    node: u32,
}

/// Result of a search: per-target label sets plus the back-pointer arena
/// needed to reconstruct segment chains.
#[derive(Debug)]
pub struct RaptorOutput {
    labels: HashMap<StopId, Vec<TargetLabel>>,
    arena: Vec<Node>,
    sources: Vec<SourceAnchor>,
    /// True when the deadline expired and the labels are best-so-far.
    pub timed_out: bool,
}

impl RaptorOutput {
    /// Non-dominated labels recorded at a target stop.
    pub fn labels_at(&self, stop: StopId) -> &[TargetLabel] {
        self.labels.get(&stop).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Target stops that received at least one label.
    pub fn reached_targets(&self) -> impl Iterator<Item = StopId> + '_ {
        self.labels.keys().copied()
    }

    /// Rebuild the segment chain behind a label, lead-in included.
    ///
    /// Transit fares are re-derived along the chain: the flat fare on the
    /// first boarding, the per-km hybrid surcharge on each later boarding.
    pub fn reconstruct(&self, dataset: &RoutingDataset, label: &TargetLabel) -> Vec<Segment> {
        let mut steps = Vec::new();
        let mut cursor = label.node as usize;
        let source_index = loop {
            match self.arena[cursor].step {
                Step::Source { index } => break index as usize,
                step => {
                    steps.push(step);
                    // Non-source nodes always have a parent.
                    cursor = self.arena[cursor].parent as usize;
                }
            }
        };
        steps.reverse();

        let source = &self.sources[source_index];
        let mut segments = source.lead_in.clone();
        let mut boardings = 0u32;

        for step in steps {
            match step {
                Step::Source { .. } => unreachable!("source is the chain head"),
                Step::Transit {
                    route,
                    trip,
                    board_pos,
                    alight_pos,
                } => {
                    boardings += 1;
                    let r = dataset.route(route);
                    let tt = dataset.timetable(route);
                    let board = r.stops[board_pos as usize];
                    let alight = r.stops[alight_pos as usize];
                    segments.push(Segment::Transit {
                        route,
                        line: r.label.clone(),
                        board,
                        alight,
                        departs: tt.departure(trip as usize, board_pos as usize),
                        arrives: tt.arrival(trip as usize, alight_pos as usize),
                        cost: boarding_fare(dataset, boardings, board, alight),
                    });
                }
                Step::Walk {
                    from,
                    to,
                    walk_secs,
                } => {
                    segments.push(Segment::Walk {
                        from: crate::domain::Place::Stop(from),
                        to: crate::domain::Place::Stop(to),
                        meters: walk_secs as f64 * WALK_SPEED_MPS,
                        duration_secs: walk_secs,
                    });
                }
            }
        }

        segments
    }
}

/// Fare for the n-th transit boarding of a journey.
fn boarding_fare(dataset: &RoutingDataset, boarding: u32, board: StopId, alight: StopId) -> u32 {
    let tariffs = dataset.tariffs();
    if boarding == 1 {
        tariffs.transit_flat
    } else {
        let km = dataset
            .stop_point(board)
            .haversine_meters(dataset.stop_point(alight))
            / 1000.0;
        (tariffs.hybrid_per_km as f64 * km).round() as u32
    }
}

/// One back-pointer arena entry.
#[derive(Debug, Clone, Copy)]
struct Node {
    step: Step,
    /// Arena index of the predecessor; unused for `Source`.
    parent: u32,
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Source {
        index: u32,
    },
    Transit {
        route: RouteId,
        trip: u32,
        board_pos: u32,
        alight_pos: u32,
    },
    Walk {
        from: StopId,
        to: StopId,
        walk_secs: u32,
    },
}

/// A tentative per-stop label within a round.
#[derive(Debug, Clone, Copy)]
struct Label {
    arrival: u32,
    walk_meters: f64,
    cost: u32,
    node: u32,
}

/// Boarding context while scanning a route: where the active trip was
/// boarded and with what accumulated label.
#[derive(Debug, Clone, Copy)]
struct Board {
    pos: usize,
    parent: u32,
    walk_meters: f64,
    cost: u32,
}

struct SearchState<'a> {
    dataset: &'a RoutingDataset,
    /// Best arrival per stop over all rounds so far (τ*).
    best: Vec<u32>,
    /// Accumulated best labels of rounds < k; read for boarding.
    prev: Vec<Option<Label>>,
    /// Labels written during round k.
    curr: Vec<Option<Label>>,
    /// Stops improved during the current round, with dedup flags.
    improved: Vec<usize>,
    improved_flag: Vec<bool>,
    is_target: Vec<bool>,
    /// Earliest arrival at any target (the target-pruning cut).
    bound: u32,
    arena: Vec<Node>,
}

impl<'a> SearchState<'a> {
    fn new(dataset: &'a RoutingDataset, targets: &[StopId]) -> Self {
        let n = dataset.stop_count();
        let mut is_target = vec![false; n];
        for t in targets {
            is_target[t.index()] = true;
        }
        Self {
            dataset,
            best: vec![INF; n],
            prev: vec![None; n],
            curr: vec![None; n],
            improved: Vec::new(),
            improved_flag: vec![false; n],
            is_target,
            bound: INF,
            arena: Vec::new(),
        }
    }

    fn push_node(&mut self, step: Step, parent: u32) -> u32 {
        self.arena.push(Node { step, parent });
        (self.arena.len() - 1) as u32
    }

    /// Install an improved label at `stop` during the current round.
    fn improve(&mut self, stop: usize, label: Label) {
        self.curr[stop] = Some(label);
        self.best[stop] = label.arrival;
        if self.is_target[stop] {
            self.bound = self.bound.min(label.arrival);
        }
        if !self.improved_flag[stop] {
            self.improved_flag[stop] = true;
            self.improved.push(stop);
        }
    }

    /// An update to `stop` at `arrival` survives local and target pruning.
    fn accepts(&self, stop: usize, arrival: u32) -> bool {
        arrival < self.best[stop] && arrival < self.bound
    }
}

fn deadline_expired(params: &RaptorParams) -> bool {
    params
        .deadline
        .is_some_and(|deadline| Instant::now() >= deadline)
}

/// Run the round-based search.
///
/// `sources` seed round 0; `targets` are the stops at which labels are
/// recorded. Returns the domination-free label set per reached target for
/// rounds 1..=`max_rounds`; a label must board transit at least once,
/// since transit-free paths are the planner's direct candidates.
pub fn search(
    dataset: &RoutingDataset,
    sources: Vec<SourceAnchor>,
    targets: &[StopId],
    params: &RaptorParams,
) -> RaptorOutput {
    let mut state = SearchState::new(dataset, targets);
    let mut marked: Vec<usize> = Vec::new();
    let mut labels: HashMap<StopId, Vec<TargetLabel>> = HashMap::new();
    let mut timed_out = false;

    // Round 0: seed the sources. Duplicate anchors at one stop keep the
    // earliest arrival.
    for (index, src) in sources.iter().enumerate() {
        let stop = src.stop.index();
        let arrival = src.arrival.seconds();
        if arrival >= state.best[stop] {
            continue;
        }
        let node = state.push_node(
            Step::Source {
                index: index as u32,
            },
            0,
        );
        if state.best[stop] == INF {
            marked.push(stop);
        }
        state.best[stop] = arrival;
        state.prev[stop] = Some(Label {
            arrival,
            walk_meters: src.walk_meters,
            cost: src.cost,
            node,
        });
        if state.is_target[stop] {
            state.bound = state.bound.min(arrival);
        }
    }

    debug!(
        sources = sources.len(),
        targets = targets.len(),
        seeded = marked.len(),
        "transit search start"
    );

    'rounds: for round in 1..=params.max_rounds {
        if deadline_expired(params) {
            timed_out = true;
            break;
        }

        // Routes serving any marked stop, from their earliest marked
        // position.
        let mut queue: HashMap<RouteId, u32> = HashMap::new();
        for &stop in &marked {
            for &(route, pos) in dataset.serving_routes(StopId(stop as u32)) {
                queue
                    .entry(route)
                    .and_modify(|p| *p = (*p).min(pos))
                    .or_insert(pos);
            }
        }
        marked.clear();

        let mut scan_order: Vec<(RouteId, u32)> = queue.into_iter().collect();
        scan_order.sort_by_key(|(route, _)| *route);

        for (route, first_pos) in scan_order {
            if deadline_expired(params) {
                timed_out = true;
                break 'rounds;
            }
            scan_route(&mut state, route, first_pos as usize, round);
        }

        let scanned = state.improved.len();

        // Transfer relaxation from the stops the route scan improved.
        // Labels are snapshotted first so transfers cannot chain.
        let relax_from: Vec<(usize, Label)> = state
            .improved
            .iter()
            .map(|&s| (s, state.curr[s].expect("improved stop has a label")))
            .collect();
        for (stop, label) in relax_from {
            for transfer in dataset.transfers_from(StopId(stop as u32)) {
                let arrival = label.arrival.saturating_add(transfer.walk_secs);
                let to = transfer.to.index();
                if !state.accepts(to, arrival) {
                    continue;
                }
                let node = state.push_node(
                    Step::Walk {
                        from: StopId(stop as u32),
                        to: transfer.to,
                        walk_secs: transfer.walk_secs,
                    },
                    label.node,
                );
                state.improve(
                    to,
                    Label {
                        arrival,
                        walk_meters: label.walk_meters
                            + transfer.walk_secs as f64 * WALK_SPEED_MPS,
                        cost: label.cost,
                        node,
                    },
                );
            }
        }

        trace!(
            round,
            by_route = scanned,
            by_transfer = state.improved.len() - scanned,
            bound = state.bound,
            "round complete"
        );

        if state.improved.is_empty() {
            debug!(round, "no improvements, search settled");
            break;
        }

        // Record target labels, merge the round into `prev`, and mark the
        // improved stops for the next round's scan.
        for &stop in &state.improved {
            let label = state.curr[stop].expect("improved stop has a label");
            if state.is_target[stop] {
                labels.entry(StopId(stop as u32)).or_default().push(TargetLabel {
                    arrival: TransitTime::from_seconds(label.arrival),
                    boardings: round as u8,
                    walk_meters: label.walk_meters,
                    cost: label.cost,
                    node: label.node,
                });
            }
            state.prev[stop] = Some(label);
            state.improved_flag[stop] = false;
            marked.push(stop);
        }
        state.improved.clear();
    }

    // Per-target domination filter across rounds.
    for stop_labels in labels.values_mut() {
        *stop_labels = prune_dominated(std::mem::take(stop_labels));
    }

    debug!(
        reached = labels.len(),
        timed_out,
        "transit search complete"
    );

    RaptorOutput {
        labels,
        arena: state.arena,
        sources,
        timed_out,
    }
}

/// Scan one route from its earliest marked position, maintaining the
/// active trip and re-seeking by binary search whenever a previous-round
/// label would allow an earlier boarding.
fn scan_route(state: &mut SearchState<'_>, route_id: RouteId, first_pos: usize, round: usize) {
    let route = state.dataset.route(route_id);
    let tt = state.dataset.timetable(route_id);
    if tt.is_empty() {
        return;
    }

    let mut active: Option<(usize, Board)> = None;

    for pos in first_pos..route.stops.len() {
        let stop_id = route.stops[pos];
        let stop = stop_id.index();

        // Alight from the active trip if that improves this stop.
        if let Some((trip, board)) = active {
            if pos > board.pos {
                let arrival = tt.arrival(trip, pos).seconds();
                if state.accepts(stop, arrival) {
                    let board_stop = route.stops[board.pos];
                    let cost = board.cost
                        + boarding_fare(state.dataset, round as u32, board_stop, stop_id);
                    let node = state.push_node(
                        Step::Transit {
                            route: route_id,
                            trip: trip as u32,
                            board_pos: board.pos as u32,
                            alight_pos: pos as u32,
                        },
                        board.parent,
                    );
                    state.improve(
                        stop,
                        Label {
                            arrival,
                            walk_meters: board.walk_meters,
                            cost,
                            node,
                        },
                    );
                }
            }
        }

        // Could a previous-round label at this stop catch an earlier trip?
        if let Some(prev_label) = state.prev[stop] {
            let worth_seeking = match active {
                None => true,
                Some((trip, _)) => prev_label.arrival <= tt.departure(trip, pos).seconds(),
            };
            if worth_seeking
                && let Some(earlier) =
                    tt.earliest_trip_from(pos, TransitTime::from_seconds(prev_label.arrival))
                && active.is_none_or(|(trip, _)| earlier < trip)
            {
                active = Some((
                    earlier,
                    Board {
                        pos,
                        parent: prev_label.node,
                        walk_meters: prev_label.walk_meters,
                        cost: prev_label.cost,
                    },
                ));
            }
        }
    }
}

/// Drop labels that are dominated on (arrival, boardings, walk, cost).
fn prune_dominated(labels: Vec<TargetLabel>) -> Vec<TargetLabel> {
    let mut kept: Vec<TargetLabel> = Vec::with_capacity(labels.len());
    for label in labels {
        let dominated = kept.iter().any(|other| dominates(other, &label));
        if !dominated {
            kept.retain(|other| !dominates(&label, other));
            kept.push(label);
        }
    }
    kept
}

/// `a` dominates `b`: no worse on every axis, strictly better on one.
fn dominates(a: &TargetLabel, b: &TargetLabel) -> bool {
    a.arrival <= b.arrival
        && a.boardings <= b.boardings
        && a.walk_meters <= b.walk_meters
        && a.cost <= b.cost
        && (a.arrival < b.arrival
            || a.boardings < b.boardings
            || a.walk_meters < b.walk_meters
            || a.cost < b.cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DatasetBuilder, RouteMode, StopKind};
    use crate::domain::{BoundingBox, GeoPoint};
    use std::time::Duration;

    fn t(s: &str) -> TransitTime {
        TransitTime::parse_hhmm(s).unwrap()
    }

    /// A line of `n` stops 800 m apart along a parallel of latitude.
    fn line_builder(n: u32) -> (DatasetBuilder, Vec<StopId>) {
        let mut b = DatasetBuilder::new(BoundingBox::new(37.46, 37.55, 127.00, 127.14), 30);
        let stops = (0..n)
            .map(|k| {
                b.add_stop(
                    format!("S{k}"),
                    format!("Stop {k}"),
                    GeoPoint::new(37.50, 127.005 + 0.009 * k as f64),
                    StopKind::Metro,
                )
            })
            .collect();
        (b, stops)
    }

    fn anchor(stop: StopId, arrival: TransitTime) -> SourceAnchor {
        SourceAnchor {
            stop,
            arrival,
            lead_in: Vec::new(),
            walk_meters: 0.0,
            cost: 0,
        }
    }

    /// Trips every `headway` seconds with `hop` seconds between stops and
    /// a 20-second dwell.
    fn add_service(
        b: &mut DatasetBuilder,
        route: crate::domain::RouteId,
        prefix: &str,
        first_dep: u32,
        last_dep: u32,
        headway: u32,
        hop: u32,
        n_stops: u32,
    ) {
        let mut dep = first_dep;
        let mut k = 0;
        while dep <= last_dep {
            let times: Vec<(u32, u32)> = (0..n_stops)
                .map(|i| {
                    let arr = dep + i * hop;
                    (arr, arr + 20)
                })
                .collect();
            b.add_trip(route, format!("{prefix}-{k}"), times);
            dep += headway;
            k += 1;
        }
    }

    #[test]
    fn single_leg_journey() {
        let (mut b, stops) = line_builder(4);
        let line = b.add_route("L1", RouteMode::Metro, "Metro Line 1", stops.clone());
        add_service(&mut b, line, "l1", 30_600, 36_000, 300, 120, 4);
        let ds = b.build().unwrap();

        let out = search(
            &ds,
            vec![anchor(stops[0], t("08:30"))],
            &[stops[3]],
            &RaptorParams::default(),
        );

        let labels = out.labels_at(stops[3]);
        assert_eq!(labels.len(), 1);
        let label = labels[0];
        assert_eq!(label.boardings, 1);
        // Board the 08:30 trip, three hops of 120 s.
        assert_eq!(label.arrival, TransitTime::from_seconds(30_600 + 3 * 120));
        assert_eq!(label.cost, ds.tariffs().transit_flat);

        let segments = out.reconstruct(&ds, &label);
        assert_eq!(segments.len(), 1);
        assert!(segments[0].is_transit());
    }

    #[test]
    fn waits_for_next_trip() {
        let (mut b, stops) = line_builder(3);
        let line = b.add_route("L1", RouteMode::Metro, "Metro Line 1", stops.clone());
        add_service(&mut b, line, "l1", 30_600, 36_000, 600, 120, 3);
        let ds = b.build().unwrap();

        // Ready one second after the 08:30 departure: must take 08:40.
        let out = search(
            &ds,
            vec![anchor(stops[0], TransitTime::from_seconds(30_621))],
            &[stops[2]],
            &RaptorParams::default(),
        );

        let labels = out.labels_at(stops[2]);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].arrival, TransitTime::from_seconds(31_200 + 240));
    }

    #[test]
    fn two_routes_with_interchange() {
        let (mut b, stops) = line_builder(6);
        let east = b.add_route("E", RouteMode::Metro, "East Line", stops[0..3].to_vec());
        add_service(&mut b, east, "e", 30_600, 36_000, 300, 120, 3);
        let north = b.add_route("N", RouteMode::Bus, "Bus North", stops[3..6].to_vec());
        add_service(&mut b, north, "n", 30_600, 36_000, 300, 180, 3);
        // Foot transfer between the lines' meeting stops.
        b.add_transfer(stops[2], stops[3], 60);
        let ds = b.build().unwrap();

        let out = search(
            &ds,
            vec![anchor(stops[0], t("08:30"))],
            &[stops[5]],
            &RaptorParams::default(),
        );

        let labels = out.labels_at(stops[5]);
        assert_eq!(labels.len(), 1);
        let label = labels[0];
        assert_eq!(label.boardings, 2);
        assert!(label.walk_meters > 0.0);
        // Second boarding adds the per-km surcharge, not another flat fare.
        assert!(label.cost > ds.tariffs().transit_flat);
        assert!(label.cost < 2 * ds.tariffs().transit_flat);

        let segments = out.reconstruct(&ds, &label);
        assert_eq!(segments.len(), 3);
        assert!(segments[0].is_transit());
        assert!(segments[1].is_walk());
        assert!(segments[2].is_transit());
    }

    #[test]
    fn departure_after_last_trip_yields_nothing() {
        let (mut b, stops) = line_builder(3);
        let line = b.add_route("L1", RouteMode::Metro, "Metro Line 1", stops.clone());
        add_service(&mut b, line, "l1", 30_600, 32_400, 300, 120, 3);
        let ds = b.build().unwrap();

        let out = search(
            &ds,
            vec![anchor(stops[0], t("10:00"))],
            &[stops[2]],
            &RaptorParams::default(),
        );

        assert!(out.labels_at(stops[2]).is_empty());
        assert!(!out.timed_out);
    }

    #[test]
    fn route_without_trips_is_skipped() {
        let (mut b, stops) = line_builder(3);
        b.add_route("L1", RouteMode::Metro, "Ghost Line", stops.clone());
        let ds = b.build().unwrap();

        let out = search(
            &ds,
            vec![anchor(stops[0], t("08:30"))],
            &[stops[2]],
            &RaptorParams::default(),
        );
        assert!(out.labels_at(stops[2]).is_empty());
    }

    #[test]
    fn midnight_crossing_trip() {
        let (mut b, stops) = line_builder(2);
        let line = b.add_route("N1", RouteMode::Bus, "Night Bus", stops.clone());
        // Departs 24:10, arrives 24:25.
        b.add_trip(line, "n1", vec![(87_000, 87_000), (87_900, 87_900)]);
        let ds = b.build().unwrap();

        let out = search(
            &ds,
            vec![anchor(stops[0], t("23:55"))],
            &[stops[1]],
            &RaptorParams::default(),
        );

        let labels = out.labels_at(stops[1]);
        assert_eq!(labels.len(), 1);
        assert!(labels[0].arrival.is_past_midnight());
        assert_eq!(labels[0].arrival.seconds(), 87_900);
    }

    #[test]
    fn target_pruning_rejects_later_arrivals() {
        let (mut b, stops) = line_builder(4);
        let fast = b.add_route("F", RouteMode::Metro, "Fast", vec![stops[0], stops[3]]);
        b.add_trip(fast, "f1", vec![(30_600, 30_600), (30_900, 30_900)]);
        let slow = b.add_route("S", RouteMode::Bus, "Slow", stops.clone());
        add_service(&mut b, slow, "s", 30_600, 33_000, 300, 600, 4);
        let ds = b.build().unwrap();

        let out = search(
            &ds,
            vec![anchor(stops[0], t("08:30"))],
            &[stops[3]],
            &RaptorParams::default(),
        );

        // Only the fast arrival survives; every slow-line arrival at the
        // target is at or past the bound.
        let labels = out.labels_at(stops[3]);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].arrival, TransitTime::from_seconds(30_900));
    }

    #[test]
    fn multiple_sources_seed_independent_entries() {
        let (mut b, stops) = line_builder(4);
        let line = b.add_route("L1", RouteMode::Metro, "Metro Line 1", stops.clone());
        add_service(&mut b, line, "l1", 30_600, 36_000, 300, 120, 4);
        let ds = b.build().unwrap();

        let out = search(
            &ds,
            vec![
                anchor(stops[0], t("08:30")),
                anchor(stops[2], t("08:31")),
            ],
            &[stops[3]],
            &RaptorParams::default(),
        );

        // Both anchors catch the same 08:30 trip: the stop-2 anchor at
        // 08:31 still makes its 30860 departure there.
        let labels = out.labels_at(stops[3]);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].arrival, TransitTime::from_seconds(30_600 + 3 * 120));
    }

    #[test]
    fn expired_deadline_returns_timed_out() {
        let (mut b, stops) = line_builder(3);
        let line = b.add_route("L1", RouteMode::Metro, "Metro Line 1", stops.clone());
        add_service(&mut b, line, "l1", 30_600, 36_000, 300, 120, 3);
        let ds = b.build().unwrap();

        let params = RaptorParams {
            max_rounds: 4,
            deadline: Some(Instant::now() - Duration::from_millis(1)),
        };
        let out = search(&ds, vec![anchor(stops[0], t("08:30"))], &[stops[2]], &params);

        assert!(out.timed_out);
        assert!(out.labels_at(stops[2]).is_empty());
    }

    #[test]
    fn loop_route_not_reboarded_same_round() {
        // Directed split of a loop: stop 1 appears twice. A single round
        // may ride past the repeat, but the second occurrence must not act
        // as a fresh board point within the same round.
        let (mut b, stops) = line_builder(3);
        let loop_route = b.add_route(
            "LOOP",
            RouteMode::Metro,
            "Loop (inner)",
            vec![stops[0], stops[1], stops[2], stops[1]],
        );
        b.add_trip(
            loop_route,
            "lp1",
            vec![(30_600, 30_620), (30_700, 30_720), (30_800, 30_820), (30_900, 30_920)],
        );
        let ds = b.build().unwrap();

        let out = search(
            &ds,
            vec![anchor(stops[0], t("08:30"))],
            &[stops[1]],
            &RaptorParams::default(),
        );

        // One boarding reaches stop 1 at its first occurrence.
        let labels = out.labels_at(stops[1]);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].boardings, 1);
        assert_eq!(labels[0].arrival, TransitTime::from_seconds(30_700));
    }

    #[test]
    fn label_sets_are_domination_free() {
        // Express with long walk transfer vs. slower direct: both should
        // survive at the target (time vs. walk trade-off).
        let (mut b, stops) = line_builder(5);
        let direct = b.add_route("D", RouteMode::Bus, "Direct", vec![stops[0], stops[4]]);
        b.add_trip(direct, "d1", vec![(30_600, 30_600), (32_400, 32_400)]);

        let express = b.add_route("X", RouteMode::Metro, "Express", vec![stops[0], stops[3]]);
        b.add_trip(express, "x1", vec![(30_600, 30_600), (31_200, 31_200)]);
        let feeder = b.add_route("F", RouteMode::Bus, "Feeder", vec![stops[3], stops[4]]);
        b.add_trip(feeder, "f1", vec![(31_500, 31_500), (31_800, 31_800)]);
        let ds = b.build().unwrap();

        let out = search(
            &ds,
            vec![anchor(stops[0], t("08:30"))],
            &[stops[4]],
            &RaptorParams::default(),
        );

        // The two-leg journey arrives earlier (31800 < 32400) but costs a
        // second boarding, so neither label dominates the other.
        let labels = out.labels_at(stops[4]);
        assert_eq!(labels.len(), 2);
        for a in labels {
            for other in labels {
                if (a.arrival, a.boardings) != (other.arrival, other.boardings) {
                    assert!(!dominates(a, other));
                }
            }
        }
    }

    #[test]
    fn best_arrival_improves_monotonically_with_rounds() {
        // A slow one-seat ride and a chain of fast hops needing four
        // boardings. Raising the round budget must never worsen the best
        // arrival at the target.
        let (mut b, stops) = line_builder(5);
        for k in 0..4 {
            let r = b.add_route(
                format!("R{k}"),
                RouteMode::Bus,
                format!("Hop {k}"),
                vec![stops[k], stops[k + 1]],
            );
            add_service(&mut b, r, &format!("r{k}"), 30_600, 36_000, 120, 60, 2);
        }
        let slow = b.add_route("D", RouteMode::Bus, "Direct slow", vec![stops[0], stops[4]]);
        b.add_trip(slow, "d1", vec![(30_600, 30_600), (36_000, 36_000)]);
        let ds = b.build().unwrap();

        let mut best_by_budget = Vec::new();
        for max_rounds in 1..=4 {
            let out = search(
                &ds,
                vec![anchor(stops[0], t("08:30"))],
                &[stops[4]],
                &RaptorParams {
                    max_rounds,
                    deadline: None,
                },
            );
            let best = out
                .labels_at(stops[4])
                .iter()
                .map(|l| l.arrival)
                .min()
                .expect("slow direct line reaches the target in round 1");
            best_by_budget.push(best);
        }

        for pair in best_by_budget.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
        // The four-hop chain beats the slow direct ride once allowed.
        assert_eq!(best_by_budget[0], TransitTime::from_seconds(36_000));
        assert_eq!(best_by_budget[3], TransitTime::from_seconds(31_020));
    }
}
