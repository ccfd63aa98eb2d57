#![allow(dead_code)]

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wayfinder::*;

pub const TIMEOUT: Duration = Duration::from_secs(10);

pub fn london() -> GeoPoint {
    GeoPoint::new(51.5074, -0.1278).unwrap()
}

pub fn paris() -> GeoPoint {
    GeoPoint::new(48.8566, 2.3522).unwrap()
}

pub fn berlin() -> GeoPoint {
    GeoPoint::new(52.52, 13.405).unwrap()
}

pub fn headless_map() -> HeadlessMap {
    HeadlessMap::new(
        Screen::new(1600, 1000, 256, 18),
        ViewportDefaults::default().initial(),
    )
}

/// A geocoder that knows a handful of places.
///
/// Queries starting with `offline` fail like an unreachable service, every
/// other unknown query has no candidates.
pub struct FakeGeocoder {
    places: HashMap<String, Vec<Candidate>>,
    gates: Mutex<HashMap<String, Receiver<()>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeGeocoder {
    pub fn new() -> Self {
        Self {
            places: HashMap::new(),
            gates: Mutex::new(HashMap::new()),
            calls: Mutex::new(vec![]),
        }
    }

    pub fn with_place(mut self, name: &str, point: GeoPoint) -> Self {
        self.places.insert(
            name.to_string(),
            vec![Candidate::new(point.lat().to_string(), point.lng().to_string())],
        );
        self
    }

    pub fn standard() -> Self {
        Self::new()
            .with_place("London", london())
            .with_place("Paris", paris())
            .with_place("Berlin", berlin())
    }

    /// Holds back the next search for `query` until the returned sender fires.
    pub fn gate(&self, query: &str) -> Sender<()> {
        let (tx, rx) = unbounded();
        self.gates.lock().unwrap().insert(query.to_string(), rx);
        tx
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Geocoder for FakeGeocoder {
    fn search(&self, query: &str) -> Result<Vec<Candidate>, Error> {
        self.calls.lock().unwrap().push(query.to_string());
        let gate = self.gates.lock().unwrap().remove(query);
        if let Some(gate) = gate {
            let _ = gate.recv_timeout(TIMEOUT);
        }

        if query.starts_with("offline") {
            return Err(Error::Service("connection refused".into()));
        }
        Ok(self.places.get(query).cloned().unwrap_or_default())
    }
}

/// A router that answers every request with the same result.
pub struct FakeRouter {
    result: Result<Vec<Route>, Error>,
    gate: Option<Receiver<()>>,
    calls: AtomicUsize,
}

impl FakeRouter {
    pub fn new(result: Result<Vec<Route>, Error>) -> Self {
        Self {
            result,
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// A single route from London to Paris over the channel tunnel.
    pub fn london_paris() -> Self {
        Self::new(Ok(vec![Route {
            geometry: vec![
                london(),
                GeoPoint::new(51.0955, 1.1205).unwrap(),
                GeoPoint::new(50.9225, 1.8090).unwrap(),
                paris(),
            ],
            summary: RouteSummary {
                total_distance: 463_719.4,
                total_time: 21_046.1,
            },
        }]))
    }

    /// Every route request blocks until the returned sender fires once.
    pub fn gated(mut self) -> (Self, Sender<()>) {
        let (tx, rx) = unbounded();
        self.gate = Some(rx);
        (self, tx)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Router for FakeRouter {
    fn route(&self, _waypoints: &[GeoPoint]) -> Result<Vec<Route>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let _ = gate.recv_timeout(TIMEOUT);
        }
        self.result.clone()
    }
}

/// A loader whose router capability hands out `router`. Returns the number of loads.
pub fn router_loader(router: Arc<FakeRouter>) -> (CapabilityLoader<dyn Router>, Arc<AtomicUsize>) {
    let loads = Arc::new(AtomicUsize::new(0));
    let loads_clone = loads.clone();
    let mut loader: CapabilityLoader<dyn Router> = CapabilityLoader::new();
    loader.register(
        ROUTER_CAPABILITY,
        Arc::new(move || -> Result<Arc<dyn Router>, Error> {
            loads_clone.fetch_add(1, Ordering::SeqCst);
            Ok(router.clone() as Arc<dyn Router>)
        }),
    );
    (loader, loads)
}

/// A loader whose router capability never loads. Returns the number of attempts.
pub fn broken_loader() -> (CapabilityLoader<dyn Router>, Arc<AtomicUsize>) {
    let loads = Arc::new(AtomicUsize::new(0));
    let loads_clone = loads.clone();
    let mut loader: CapabilityLoader<dyn Router> = CapabilityLoader::new();
    loader.register(
        ROUTER_CAPABILITY,
        Arc::new(move || -> Result<Arc<dyn Router>, Error> {
            loads_clone.fetch_add(1, Ordering::SeqCst);
            Err(Error::ProviderUnavailable("script failed to load".into()))
        }),
    );
    (loader, loads)
}

pub fn coordinator(
    geocoder: Arc<FakeGeocoder>,
    loader: CapabilityLoader<dyn Router>,
    mode: OverlayMode,
    drop_stale_resolutions: bool,
) -> Coordinator<HeadlessMap> {
    Coordinator::new(
        headless_map(),
        Resolver::new(geocoder),
        OverlayManager::new(loader, OverlaySettings::default()),
        CoordinatorSettings {
            viewport: ViewportDefaults::default(),
            mode,
            drop_stale_resolutions,
        },
    )
}

/// Pumps `coordinator` until `done` holds. Returns `false` on timeout.
pub fn pump_until<M: MapView>(
    coordinator: &mut Coordinator<M>,
    done: impl Fn(&Coordinator<M>) -> bool,
) -> bool {
    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        coordinator.pump();
        if done(coordinator) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    false
}
