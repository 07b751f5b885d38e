use hawker_route::haversine::HaversineModel;
use hawker_route::solver::{SolveOptions, optimize};
use hawker_route::{BuyerRequest, Coordinate};

fn coord(lat: f64, lng: f64) -> Coordinate {
    Coordinate::new(lat, lng).unwrap()
}

#[test]
fn visits_every_reachable_request() {
    let now = 1_000;
    let requests = vec![
        BuyerRequest::new("r1", coord(0.0, 0.002), vec!["bread".into()], now, now + 3600).unwrap(),
        BuyerRequest::new("r2", coord(0.0, 0.001), vec!["milk".into()], now, now + 3600).unwrap(),
        BuyerRequest::new("r3", coord(0.0, 0.003), vec!["eggs".into()], now, now + 3600).unwrap(),
    ];

    let route = optimize(
        coord(0.0, 0.0),
        &requests,
        now,
        &HaversineModel::default(),
        &SolveOptions::default(),
    );

    assert_eq!(route.request_ids(), vec!["r2", "r1", "r3"]);
    assert!(route.total_distance_m > 300.0 && route.total_distance_m < 350.0);
}
