mod common;

use common::*;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use wayfinder::*;

fn manager(loader: CapabilityLoader<dyn Router>) -> OverlayManager {
    OverlayManager::new(loader, OverlaySettings::default())
}

fn overlay_counts(map: &HeadlessMap) -> (usize, usize) {
    (map.paths().count(), map.routing_controls().count())
}

#[test]
fn straight_line_twice_leaves_one_line() {
    let (loader, loads) = router_loader(Arc::new(FakeRouter::london_paris()));
    let mut overlay = manager(loader);
    let mut map = headless_map();

    overlay.show(london(), paris(), OverlayMode::StraightLine, &mut map);
    overlay.show(london(), paris(), OverlayMode::StraightLine, &mut map);

    assert_eq!(overlay_counts(&map), (1, 0));
    assert_eq!(overlay.active().map(|a| a.mode()), Some(OverlayMode::StraightLine));
    assert_eq!(overlay.readout(), "Distance: 343.56 km");
    assert_eq!(map.view().zoom, 8);
    assert!(overlay.is_idle());
    // Straight lines never need the routing provider.
    assert_eq!(loads.load(Ordering::SeqCst), 0);

    let line = map.paths().next().unwrap();
    assert_eq!(
        line,
        &Layer::Path {
            points: vec![london(), paris()],
            style: PathStyle::default(),
        }
    );
}

#[test]
fn routed_twice_leaves_one_route() {
    let router = Arc::new(FakeRouter::london_paris());
    let (loader, loads) = router_loader(router.clone());
    let mut overlay = manager(loader);
    let mut map = headless_map();

    overlay.show(london(), paris(), OverlayMode::Routed, &mut map);
    assert!(overlay.run_until_idle(&mut map, TIMEOUT));
    overlay.show(london(), paris(), OverlayMode::Routed, &mut map);
    assert!(overlay.run_until_idle(&mut map, TIMEOUT));

    assert_eq!(overlay_counts(&map), (1, 1));
    assert_eq!(overlay.readout(), "Distance: 463.72 km");
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(router.calls(), 2);

    match map.paths().next().unwrap() {
        Layer::Path { points, .. } => assert_eq!(points.len(), 4),
        other => panic!("expected a path, got {:?}", other),
    };
}

#[test]
fn routed_then_straight_while_the_provider_loads() {
    let router = Arc::new(FakeRouter::london_paris());
    let (loader, loads) = router_loader(router.clone());
    let mut overlay = manager(loader);
    let mut map = headless_map();

    overlay.show(london(), paris(), OverlayMode::Routed, &mut map);
    overlay.show(london(), paris(), OverlayMode::StraightLine, &mut map);
    assert!(overlay.run_until_idle(&mut map, TIMEOUT));

    assert_eq!(overlay_counts(&map), (1, 0));
    assert_eq!(overlay.active().map(|a| a.mode()), Some(OverlayMode::StraightLine));
    assert_eq!(overlay.readout(), "Distance: 343.56 km");
    // The provider stays loaded for later, but no route was requested.
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(router.calls(), 0);
}

#[test]
fn routed_then_straight_while_the_route_is_computed() {
    let (router, gate) = FakeRouter::london_paris().gated();
    let router = Arc::new(router);
    let (loader, _) = router_loader(router.clone());
    let mut overlay = manager(loader);
    let mut map = headless_map();

    overlay.show(london(), paris(), OverlayMode::Routed, &mut map);
    // Provider loaded, control added, route requested.
    assert!(overlay.process_next(&mut map, TIMEOUT));
    assert_eq!(overlay_counts(&map), (0, 1));

    overlay.show(london(), paris(), OverlayMode::StraightLine, &mut map);
    assert_eq!(overlay_counts(&map), (1, 0));

    gate.send(()).unwrap();
    assert!(overlay.run_until_idle(&mut map, TIMEOUT));

    assert_eq!(router.calls(), 1);
    assert_eq!(overlay_counts(&map), (1, 0));
    assert_eq!(overlay.active().map(|a| a.mode()), Some(OverlayMode::StraightLine));
    assert_eq!(overlay.readout(), "Distance: 343.56 km");
}

#[test]
fn straight_then_routed_replaces_the_line() {
    let (loader, _) = router_loader(Arc::new(FakeRouter::london_paris()));
    let mut overlay = manager(loader);
    let mut map = headless_map();

    overlay.show(london(), paris(), OverlayMode::StraightLine, &mut map);
    overlay.show(london(), paris(), OverlayMode::Routed, &mut map);
    assert!(overlay.run_until_idle(&mut map, TIMEOUT));

    assert_eq!(overlay_counts(&map), (1, 1));
    assert_eq!(overlay.active().map(|a| a.mode()), Some(OverlayMode::Routed));
    assert_eq!(overlay.readout(), "Distance: 463.72 km");
}

#[test]
fn unavailable_provider_changes_nothing() {
    let (loader, loads) = broken_loader();
    let mut overlay = manager(loader);
    let mut map = headless_map();

    overlay.show(london(), paris(), OverlayMode::StraightLine, &mut map);
    overlay.show(london(), berlin(), OverlayMode::Routed, &mut map);
    assert!(overlay.run_until_idle(&mut map, TIMEOUT));

    assert_eq!(overlay_counts(&map), (1, 0));
    assert_eq!(overlay.readout(), "Distance: 343.56 km");

    // No retries on their own, but the next request tries again.
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    overlay.show(london(), berlin(), OverlayMode::Routed, &mut map);
    assert!(overlay.run_until_idle(&mut map, TIMEOUT));
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}

#[test]
fn failed_route_leaves_an_empty_map() {
    let router = Arc::new(FakeRouter::new(Err(Error::RouteCompute(
        "NoRoute: Impossible route between points".into(),
    ))));
    let (loader, _) = router_loader(router);
    let mut overlay = manager(loader);
    let mut map = headless_map();

    overlay.show(london(), paris(), OverlayMode::StraightLine, &mut map);
    overlay.show(london(), paris(), OverlayMode::Routed, &mut map);
    assert!(overlay.run_until_idle(&mut map, TIMEOUT));

    assert!(map.layers().is_empty());
    assert!(overlay.active().is_none());
    assert_eq!(overlay.readout(), "Distance: 343.56 km");
}

#[test]
fn empty_route_list_is_a_failure() {
    let (loader, _) = router_loader(Arc::new(FakeRouter::new(Ok(vec![]))));
    let mut overlay = manager(loader);
    let mut map = headless_map();

    overlay.show(london(), paris(), OverlayMode::Routed, &mut map);
    assert!(overlay.run_until_idle(&mut map, TIMEOUT));

    assert!(map.layers().is_empty());
    assert_eq!(overlay.distance(), None);
    assert_eq!(overlay.readout(), "Distance: 0.00 km");
}

#[test]
fn clear_drops_pending_routes() {
    let (router, gate) = FakeRouter::london_paris().gated();
    let (loader, _) = router_loader(Arc::new(router));
    let mut overlay = manager(loader);
    let mut map = headless_map();

    overlay.show(london(), paris(), OverlayMode::StraightLine, &mut map);
    overlay.show(london(), paris(), OverlayMode::Routed, &mut map);
    assert!(overlay.process_next(&mut map, TIMEOUT));
    overlay.clear(&mut map);

    gate.send(()).unwrap();
    assert!(overlay.run_until_idle(&mut map, TIMEOUT));

    assert!(map.layers().is_empty());
    assert!(overlay.active().is_none());
    assert_eq!(overlay.readout(), "Distance: 0.00 km");
}
