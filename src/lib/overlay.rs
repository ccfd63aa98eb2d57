use crate::*;
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde_derive::Deserialize;
use std::sync::Arc;
use std::thread::spawn;
use std::time::{Duration, Instant};

/// Name the routing provider is registered under in the [`CapabilityLoader`].
pub const ROUTER_CAPABILITY: &str = "router";

/// Selects how the path between the two points is drawn.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayMode {
    /// Follow the roads, as computed by the routing provider.
    Routed,
    /// A direct line between both points.
    StraightLine,
}

impl std::fmt::Display for OverlayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            OverlayMode::Routed => write!(f, "routed"),
            OverlayMode::StraightLine => write!(f, "straight line"),
        }
    }
}

/// The length of the currently shown path.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Distance {
    pub kilometers: f64,
}

impl Distance {
    pub fn from_meters(meters: f64) -> Self {
        Self {
            kilometers: meters / 1000.0,
        }
    }
}

impl std::fmt::Display for Distance {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Distance: {:.2} km", self.kilometers)
    }
}

/// The overlay currently on the map and the layers it owns.
#[derive(Debug, Clone, PartialEq)]
pub enum ActiveOverlay {
    StraightLine {
        line: LayerId,
    },
    Routed {
        control: LayerId,
        /// Only present once the route has been computed.
        path: Option<LayerId>,
    },
}

impl ActiveOverlay {
    pub fn mode(&self) -> OverlayMode {
        match self {
            ActiveOverlay::StraightLine { .. } => OverlayMode::StraightLine,
            ActiveOverlay::Routed { .. } => OverlayMode::Routed,
        }
    }

    fn layers(&self) -> Vec<LayerId> {
        match *self {
            ActiveOverlay::StraightLine { line } => vec![line],
            ActiveOverlay::Routed { control, path } => {
                path.into_iter().chain(std::iter::once(control)).collect()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySettings {
    pub style: PathStyle,
    /// Room left around the path when fitting the map to it, in pixels.
    pub padding: u32,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            style: PathStyle::default(),
            padding: 50,
        }
    }
}

/// Completion of asynchronous overlay work.
pub enum OverlayEvent {
    ProviderLoaded(Result<Arc<dyn Router>, Error>),
    RouteComputed {
        generation: u64,
        result: Result<Vec<Route>, Error>,
    },
}

/// A routed overlay that waits for the routing provider to become available.
#[derive(Debug, Copy, Clone)]
struct WaitingRoute {
    generation: u64,
    start: GeoPoint,
    end: GeoPoint,
}

/// Owns the single overlay between the start and the destination.
///
/// Every call to [`OverlayManager::show`] starts a new generation. Work that
/// completes for an older generation is discarded, so overlapping calls can
/// never leave more than one overlay on the map.
pub struct OverlayManager {
    loader: CapabilityLoader<dyn Router>,
    settings: OverlaySettings,
    active: Option<ActiveOverlay>,
    waiting: Option<WaitingRoute>,
    generation: u64,
    distance: Option<Distance>,
    channel: (Sender<OverlayEvent>, Receiver<OverlayEvent>),
    in_flight: usize,
}

impl OverlayManager {
    pub fn new(loader: CapabilityLoader<dyn Router>, settings: OverlaySettings) -> Self {
        Self {
            loader,
            settings,
            active: None,
            waiting: None,
            generation: 0,
            distance: None,
            channel: unbounded(),
            in_flight: 0,
        }
    }

    pub fn active(&self) -> Option<&ActiveOverlay> {
        self.active.as_ref()
    }

    /// The length of the last path that was shown.
    pub fn distance(&self) -> Option<Distance> {
        self.distance
    }

    /// The text of the distance display.
    pub fn readout(&self) -> String {
        self.distance.unwrap_or_default().to_string()
    }

    /// `true` if no provider load or route computation is pending.
    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }

    pub(crate) fn receiver(&self) -> &Receiver<OverlayEvent> {
        &self.channel.1
    }

    /// Shows a path between `start` and `end`, replacing whatever was shown before.
    pub fn show(&mut self, start: GeoPoint, end: GeoPoint, mode: OverlayMode, map: &mut dyn MapView) {
        self.generation += 1;
        self.waiting = None;

        match mode {
            OverlayMode::StraightLine => {
                teardown(self.active.take(), map);
                let (overlay, distance) =
                    draw_straight_line(start, end, &self.settings, map);
                log::info!("Showing a straight line from {} to {}.", start, end);
                self.active = Some(overlay);
                self.distance = Some(distance);
            }
            OverlayMode::Routed => match self.loader.get(ROUTER_CAPABILITY) {
                Some(router) => self.request_route(router, start, end, map),
                None => {
                    self.waiting = Some(WaitingRoute {
                        generation: self.generation,
                        start,
                        end,
                    });
                    let tx = self.channel.0.clone();
                    let started = self.loader.load(ROUTER_CAPABILITY, move |result| {
                        if tx.send(OverlayEvent::ProviderLoaded(result)).is_err() {
                            log::debug!("Could not send the provider load message. This most likely happened because the app was terminated.")
                        }
                    });
                    if started {
                        self.in_flight += 1;
                    }
                }
            },
        }
    }

    /// Removes the overlay and forgets the distance.
    pub fn clear(&mut self, map: &mut dyn MapView) {
        self.generation += 1;
        self.waiting = None;
        teardown(self.active.take(), map);
        self.distance = None;
    }

    /// Applies all completed work. Returns how many completions were handled.
    pub fn pump(&mut self, map: &mut dyn MapView) -> usize {
        let events = self.channel.1.try_iter().collect::<Vec<_>>();
        let count = events.len();
        for event in events {
            self.handle(event, map);
        }
        count
    }

    /// Pumps until nothing is in flight anymore or `timeout` passed.
    ///
    /// Returns `true` if the manager went idle.
    pub fn run_until_idle(&mut self, map: &mut dyn MapView, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump(map);
            if self.is_idle() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            match self.channel.1.recv_timeout(deadline - now) {
                Ok(event) => self.handle(event, map),
                Err(_) => return false,
            }
        }
    }

    /// Waits up to `timeout` for a single completion and applies it.
    pub fn process_next(&mut self, map: &mut dyn MapView, timeout: Duration) -> bool {
        match self.channel.1.recv_timeout(timeout) {
            Ok(event) => {
                self.handle(event, map);
                true
            }
            Err(_) => false,
        }
    }

    pub(crate) fn handle(&mut self, event: OverlayEvent, map: &mut dyn MapView) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match event {
            OverlayEvent::ProviderLoaded(result) => {
                match self.loader.finish(ROUTER_CAPABILITY, result) {
                    Ok(router) => {
                        if let Some(waiting) = self.waiting.take() {
                            if waiting.generation == self.generation {
                                self.request_route(router, waiting.start, waiting.end, map);
                            }
                        }
                    }
                    Err(e) => {
                        // The overlay that is shown stays as it is.
                        if self.waiting.take().is_some() {
                            log::error!("Could not show the route. Reason:\r\n{}", e);
                        }
                    }
                }
            }
            OverlayEvent::RouteComputed { generation, result } => {
                if generation != self.generation {
                    log::debug!(
                        "Dropping the route of generation {}, generation {} is current.",
                        generation,
                        self.generation
                    );
                    return;
                }
                let control = match self.active {
                    Some(ActiveOverlay::Routed { control, path: None }) => control,
                    _ => {
                        log::debug!("Dropping a route that has no routing control anymore.");
                        return;
                    }
                };
                match result.and_then(|routes| {
                    routes
                        .into_iter()
                        .next()
                        .ok_or_else(|| Error::RouteCompute("no route found".into()))
                }) {
                    Ok(best) => {
                        let path = map.add_layer(Layer::Path {
                            points: best.geometry.clone(),
                            style: self.settings.style,
                        });
                        map.fit_bounds(&best.geometry, self.settings.padding);
                        let distance = Distance::from_meters(best.summary.total_distance);
                        log::info!(
                            "Showing a route, {}, about {} minutes.",
                            distance,
                            (best.summary.total_time / 60.0).round()
                        );
                        self.active = Some(ActiveOverlay::Routed {
                            control,
                            path: Some(path),
                        });
                        self.distance = Some(distance);
                    }
                    Err(e) => {
                        log::error!("Could not compute a route. Reason:\r\n{}", e);
                        teardown(self.active.take(), map);
                    }
                }
            }
        }
    }

    fn request_route(
        &mut self,
        router: Arc<dyn Router>,
        start: GeoPoint,
        end: GeoPoint,
        map: &mut dyn MapView,
    ) {
        teardown(self.active.take(), map);

        let waypoints = vec![start, end];
        let control = map.add_layer(Layer::RoutingControl {
            waypoints: waypoints.clone(),
        });
        self.active = Some(ActiveOverlay::Routed {
            control,
            path: None,
        });

        let generation = self.generation;
        let tx = self.channel.0.clone();
        self.in_flight += 1;
        log::debug!("Requesting a route from {} to {}.", start, end);
        spawn(move || {
            let result = router.route(&waypoints);
            if tx
                .send(OverlayEvent::RouteComputed { generation, result })
                .is_err()
            {
                log::debug!("Could not send the route message. This most likely happened because the app was terminated.")
            }
        });
    }
}

fn teardown(overlay: Option<ActiveOverlay>, map: &mut dyn MapView) {
    if let Some(overlay) = overlay {
        for layer in overlay.layers() {
            map.remove_layer(layer);
        }
    }
}

fn draw_straight_line(
    start: GeoPoint,
    end: GeoPoint,
    settings: &OverlaySettings,
    map: &mut dyn MapView,
) -> (ActiveOverlay, Distance) {
    let line = map.add_layer(Layer::Path {
        points: vec![start, end],
        style: settings.style,
    });
    let distance = Distance::from_meters(map.distance(&start, &end));
    map.fit_bounds(&[start, end], settings.padding);
    (ActiveOverlay::StraightLine { line }, distance)
}

#[test]
fn distance_readout() {
    assert_eq!(Distance::default().to_string(), "Distance: 0.00 km");
    assert_eq!(Distance::from_meters(343_556.06).to_string(), "Distance: 343.56 km");
    assert_eq!(Distance::from_meters(4.0).to_string(), "Distance: 0.00 km");
}

#[test]
fn routed_overlay_owns_control_and_path() {
    let overlay = ActiveOverlay::Routed {
        control: LayerId(3),
        path: Some(LayerId(4)),
    };
    assert_eq!(overlay.layers(), vec![LayerId(4), LayerId(3)]);
    assert_eq!(overlay.mode(), OverlayMode::Routed);
}
