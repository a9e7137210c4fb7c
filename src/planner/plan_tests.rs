//! End-to-end planner scenarios on a synthetic district.
//!
//! The fixture models a ~10×14 km district on a 30×30 zone grid: one
//! east-west metro line, one north-south bus line crossing it, a single
//! after-midnight bus, and mobility vehicles clustered around the
//! scenario endpoints.

use std::sync::Arc;
use std::time::Duration;

use crate::dataset::{DatasetBuilder, RouteMode, RoutingDataset, StopKind};
use crate::domain::{BoundingBox, GeoPoint, Journey, MobilityMode, RoutePreference, TransitTime};
use crate::road::{HaversineFallback, RoadDistance, WALK_SPEED_MPS, ride_speed_mps};
use crate::zone::StrategyKind;

use super::{PlanError, PlanQuery, Planner, PlannerConfig};

fn t(s: &str) -> TransitTime {
    TransitTime::parse_hhmm(s).unwrap()
}

/// East-west metro at lat 37.5040, stops every ~1.3 km.
const METRO_LAT: f64 = 37.5040;

/// North-south bus at lon 127.0300.
const BUS_LON: f64 = 127.0300;

fn district() -> Arc<RoutingDataset> {
    let mut b = DatasetBuilder::new(BoundingBox::new(37.46, 37.55, 127.00, 127.14), 30);

    // Metro Line 2: M0..M7, lon 127.005 + k*0.015.
    let metro_stops: Vec<_> = (0..8)
        .map(|k| {
            b.add_stop(
                format!("M{k}"),
                format!("Metro {k}"),
                GeoPoint::new(METRO_LAT, 127.005 + 0.015 * k as f64),
                StopKind::Metro,
            )
        })
        .collect();
    let metro = b.add_route("L2", RouteMode::Metro, "Metro Line 2", metro_stops.clone());
    add_service(&mut b, metro, "l2", 19_800, 82_800, 300, 180, 8);

    // Bus 146: B0..B6, lat 37.465 + k*0.012.
    let bus_stops: Vec<_> = (0..7)
        .map(|k| {
            b.add_stop(
                format!("B{k}"),
                format!("Bus {k}"),
                GeoPoint::new(37.465 + 0.012 * k as f64, BUS_LON),
                StopKind::Bus,
            )
        })
        .collect();
    let bus = b.add_route("146", RouteMode::Bus, "Bus 146", bus_stops.clone());
    add_service(&mut b, bus, "b146", 19_800, 82_800, 600, 240, 7);

    // Interchange between the lines.
    b.add_transfer(bus_stops[3], metro_stops[2], 480);

    // After-midnight bus across the north edge: one trip at 24:10.
    let night_a = b.add_stop("NBA", "Night A", GeoPoint::new(37.545, 127.010), StopKind::Bus);
    let night_b = b.add_stop("NBB", "Night B", GeoPoint::new(37.545, 127.090), StopKind::Bus);
    let night = b.add_route("N26", RouteMode::Bus, "Night Bus 26", vec![night_a, night_b]);
    b.add_trip(night, "n26-1", vec![(87_000, 87_000), (87_900, 87_900)]);

    // Scenario 1 vehicles (same-zone hop around (37.497, 127.026)).
    b.add_vehicle("KB-o1", MobilityMode::Kickboard, GeoPoint::new(37.4968, 127.0247), 1);
    b.add_vehicle("KB-d1", MobilityMode::Kickboard, GeoPoint::new(37.4983, 127.0274), 1);
    b.add_vehicle("BK-o1", MobilityMode::Bike, GeoPoint::new(37.4963, 127.0250), 5);
    b.add_vehicle("BK-d1", MobilityMode::Bike, GeoPoint::new(37.4979, 127.0269), 5);

    // Scenario 2 vehicles (near M1 and M2).
    b.add_vehicle("KB-o2", MobilityMode::Kickboard, GeoPoint::new(37.5048, 127.0209), 1);
    b.add_vehicle("KB-d2", MobilityMode::Kickboard, GeoPoint::new(37.5030, 127.0345), 1);

    Arc::new(b.build().unwrap())
}

/// Trips every `headway` seconds with `hop` seconds between stops and a
/// 20-second dwell.
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

fn planner() -> Planner {
    Planner::new(district(), Arc::new(HaversineFallback), PlannerConfig::default())
}

/// Invariants every returned journey must satisfy, regardless of scenario.
fn assert_journey_invariants(origin: GeoPoint, destination: GeoPoint, journeys: &[super::ScoredJourney]) {
    for scored in journeys {
        let journey = &scored.journey;

        // Consecutive segments connect.
        for window in journey.segments().windows(2) {
            assert!(
                window[0].destination().coincides_with(&window[1].origin()),
                "segments must chain"
            );
        }

        // Transfer count is distinct transit routes minus one.
        let mut routes: Vec<_> = journey.transit_sequence();
        routes.sort();
        routes.dedup();
        assert_eq!(journey.transfer_count(), routes.len().saturating_sub(1));

        // Physical lower bound: a journey with no transit leg cannot beat
        // its fastest mode over the road distance.
        if journey.transit_legs().next().is_none() {
            let max_speed = journey
                .segments()
                .iter()
                .map(|s| s.ride_mode().map_or(WALK_SPEED_MPS, ride_speed_mps))
                .fold(WALK_SPEED_MPS, f64::max);
            let road = HaversineFallback.road_distance(origin, destination);
            assert!(
                journey.total_secs() as f64 >= road / max_speed - 1.0,
                "journey faster than physics allows"
            );
        }
    }

    // No returned journey dominates another.
    for a in journeys {
        for b in journeys {
            if !std::ptr::eq(a, b) {
                assert!(!dominates(&a.journey, &b.journey));
            }
        }
    }
}

fn dominates(a: &Journey, b: &Journey) -> bool {
    a.total_secs() <= b.total_secs()
        && a.transfer_count() <= b.transfer_count()
        && a.walk_meters() <= b.walk_meters()
        && a.cost() <= b.cost()
        && (a.total_secs() < b.total_secs()
            || a.transfer_count() < b.transfer_count()
            || a.walk_meters() < b.walk_meters()
            || a.cost() < b.cost())
}

#[test]
fn same_zone_hop_is_mobility_only() {
    let planner = planner();
    let origin = GeoPoint::new(37.4966, 127.0245);
    let destination = GeoPoint::new(37.4982, 127.0272);

    let result = planner
        .plan(&PlanQuery::new(origin, destination, t("08:30")))
        .unwrap();

    assert_eq!(result.strategy, StrategyKind::MobilityOnly);
    assert!(!result.timed_out);
    assert!(!result.journeys.is_empty());

    // A direct kickboard option within six minutes.
    let kickboard = result.journeys.iter().find(|s| {
        s.journey
            .rides()
            .any(|r| r.ride_mode() == Some(MobilityMode::Kickboard))
    });
    assert!(kickboard.is_some(), "expected a kickboard journey");
    assert!(kickboard.unwrap().journey.total_secs() <= 360);

    // A bike alternative with its access walks.
    assert!(
        result.journeys.iter().any(|s| {
            s.journey
                .rides()
                .any(|r| r.ride_mode() == Some(MobilityMode::Bike))
        }),
        "expected a bike journey"
    );

    // Nothing boards transit under mobility_only.
    assert!(
        result
            .journeys
            .iter()
            .all(|s| s.journey.transit_legs().next().is_none())
    );

    assert_journey_invariants(origin, destination, &result.journeys);
}

#[test]
fn multi_zone_hop_offers_metro_with_short_walk() {
    let planner = planner();
    let origin = GeoPoint::new(37.5045, 127.0205); // near M1
    let destination = GeoPoint::new(37.5032, 127.0342); // near M2

    let result = planner
        .plan(&PlanQuery::new(origin, destination, t("08:30")))
        .unwrap();

    assert_eq!(result.strategy, StrategyKind::Balanced);

    let metro = result.journeys.iter().find(|s| {
        s.journey
            .transit_legs()
            .any(|leg| matches!(leg, crate::domain::Segment::Transit { line, .. } if line == "Metro Line 2"))
    });
    assert!(metro.is_some(), "expected a Metro Line 2 journey");

    // Faster than covering the whole distance on foot.
    let walk_secs_full =
        HaversineFallback.road_distance(origin, destination) / WALK_SPEED_MPS;
    assert!((metro.unwrap().journey.total_secs() as f64) < walk_secs_full);

    assert_journey_invariants(origin, destination, &result.journeys);
}

#[test]
fn cross_district_is_transit_first() {
    let planner = planner();
    let origin = GeoPoint::new(37.5035, 127.0055); // near M0
    let destination = GeoPoint::new(37.5046, 127.1095); // near M7

    let result = planner
        .plan(&PlanQuery::new(origin, destination, t("08:30")))
        .unwrap();

    assert_eq!(result.strategy, StrategyKind::TransitOnly);
    assert!(!result.journeys.is_empty());

    // The best journey rides the metro end to end with no transfer.
    let best = &result.journeys[0].journey;
    assert!(best.transit_legs().next().is_some());
    assert!(best.transfer_count() <= 2);

    assert_journey_invariants(origin, destination, &result.journeys);
}

#[test]
fn out_of_bounds_origin_is_rejected() {
    let planner = planner();
    let result = planner.plan(&PlanQuery::new(
        GeoPoint::new(37.40, 127.02),
        GeoPoint::new(37.50, 127.03),
        t("08:30"),
    ));

    assert!(matches!(result, Err(PlanError::OutOfBounds { .. })));
}

#[test]
fn midnight_crossing_journey_reports_next_day_arrival() {
    let planner = planner();
    let origin = GeoPoint::new(37.5448, 127.0105); // near the night bus A stop
    let destination = GeoPoint::new(37.5452, 127.0895); // near B

    let result = planner
        .plan(&PlanQuery::new(origin, destination, t("23:55")))
        .unwrap();

    assert!(!result.journeys.is_empty(), "night bus should be found");
    let journey = &result.journeys[0].journey;
    assert!(journey.arrives().is_past_midnight());
    assert!(journey.arrives().seconds() > 86_400);
    assert!(journey.transit_legs().next().is_some());
}

#[test]
fn departure_after_last_trip_leaves_mobility_options() {
    let planner = planner();
    // Scenario-2 endpoints, but after the last metro trip of the day.
    let origin = GeoPoint::new(37.5045, 127.0205);
    let destination = GeoPoint::new(37.5032, 127.0342);

    let result = planner
        .plan(&PlanQuery::new(origin, destination, t("23:30")))
        .unwrap();

    assert!(!result.journeys.is_empty());
    assert!(
        result
            .journeys
            .iter()
            .all(|s| s.journey.transit_legs().next().is_none()),
        "no transit runs this late here"
    );
}

#[test]
fn zero_deadline_times_out_with_direct_candidates_only() {
    let planner = planner();
    let mut query = PlanQuery::new(
        GeoPoint::new(37.5045, 127.0205),
        GeoPoint::new(37.5032, 127.0342),
        t("08:30"),
    );
    query.deadline = Some(Duration::ZERO);

    let result = planner.plan(&query).unwrap();

    assert!(result.timed_out);
    assert!(
        result
            .journeys
            .iter()
            .all(|s| s.journey.transit_legs().next().is_none()),
        "an expired deadline admits only direct candidates"
    );
}

#[test]
fn identical_origin_and_destination() {
    let planner = planner();
    let point = GeoPoint::new(37.50, 127.03);

    let result = planner
        .plan(&PlanQuery::new(point, point, t("08:30")))
        .unwrap();

    assert_eq!(result.journeys.len(), 1);
    let journey = &result.journeys[0].journey;
    assert!(journey.is_walk_only());
    assert_eq!(journey.total_secs(), 0);
    assert_eq!(journey.walk_meters(), 0.0);
    assert_eq!(journey.cost(), 0);
}

#[test]
fn no_path_reports_reason() {
    let planner = planner();
    // Southeast corner: no stops, no vehicles, too far to walk.
    let origin = GeoPoint::new(37.4650, 127.1300);
    let destination = GeoPoint::new(37.4850, 127.1350);

    let result = planner
        .plan(&PlanQuery::new(origin, destination, t("08:30")))
        .unwrap();

    assert!(result.journeys.is_empty());
    assert!(result.reason.is_some());
}

#[test]
fn results_are_capped_and_sorted() {
    let planner = planner();
    let origin = GeoPoint::new(37.5045, 127.0205);
    let destination = GeoPoint::new(37.5032, 127.0342);

    let result = planner
        .plan(&PlanQuery::new(origin, destination, t("08:30")))
        .unwrap();

    assert!(result.journeys.len() <= 5);
    for pair in result.journeys.windows(2) {
        assert!(pair[0].score <= pair[1].score);
    }
}

#[test]
fn tighter_walk_preference_drops_walk_journeys() {
    let planner = planner();
    let origin = GeoPoint::new(37.4966, 127.0245);
    let destination = GeoPoint::new(37.4982, 127.0272);

    let mut query = PlanQuery::new(origin, destination, t("08:30"));
    query.preference = RoutePreference {
        max_walk_distance: 100.0,
        ..Default::default()
    };

    let result = planner.plan(&query).unwrap();

    // The ~390 m pure walk violates the limit; mobility rides remain.
    assert!(!result.journeys.is_empty());
    assert!(result.journeys.iter().all(|s| !s.journey.is_walk_only()));
}

#[test]
fn concurrent_queries_share_one_planner() {
    let planner = Arc::new(planner());
    let mut handles = Vec::new();

    for k in 0..4 {
        let planner = planner.clone();
        handles.push(std::thread::spawn(move || {
            let origin = GeoPoint::new(37.4966 + 0.0002 * k as f64, 127.0245);
            let destination = GeoPoint::new(37.4982, 127.0272);
            planner
                .plan(&PlanQuery::new(origin, destination, t("08:30")))
                .unwrap()
        }));
    }

    for handle in handles {
        let result = handle.join().unwrap();
        assert!(!result.journeys.is_empty());
    }
}
