use crate::*;
use crossbeam_channel::{unbounded, Receiver, Select, Sender};
use std::thread::spawn;
use std::time::{Duration, Instant};

/// User entered text for one role.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationQuery {
    pub text: String,
    pub role: Role,
}

impl LocationQuery {
    pub fn new(role: Role) -> Self {
        Self {
            text: String::new(),
            role,
        }
    }
}

/// How far the resolution of both places has come.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResolutionState {
    Empty,
    PartiallyResolved,
    FullyResolved,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorSettings {
    pub viewport: ViewportDefaults,
    pub mode: OverlayMode,
    /// Drop resolutions that were requested before the latest submit, swap or clear.
    pub drop_stale_resolutions: bool,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            viewport: ViewportDefaults::default(),
            mode: OverlayMode::Routed,
            drop_stale_resolutions: false,
        }
    }
}

/// A finished geocoding request.
struct Resolution {
    role: Role,
    submission: u64,
    text: String,
    result: Result<GeoPoint, Error>,
}

/// Turns two place names into points on the map and a path between them.
///
/// All state lives on the thread that owns the coordinator. Geocoding runs on
/// worker threads and its results are only applied by [`Coordinator::pump`].
pub struct Coordinator<M: MapView> {
    map: M,
    resolver: Resolver,
    overlay: OverlayManager,
    settings: CoordinatorSettings,
    start: LocationQuery,
    destination: LocationQuery,
    points: KnownPoints,
    markers: [Option<LayerId>; 2],
    viewport: ViewportState,
    submission: u64,
    channel: (Sender<Resolution>, Receiver<Resolution>),
    in_flight: usize,
}

fn slot(role: Role) -> usize {
    match role {
        Role::Start => 0,
        Role::Destination => 1,
    }
}

impl<M: MapView> Coordinator<M> {
    pub fn new(
        mut map: M,
        resolver: Resolver,
        overlay: OverlayManager,
        settings: CoordinatorSettings,
    ) -> Self {
        let viewport = settings.viewport.initial();
        map.set_view(viewport.center, viewport.zoom);
        Self {
            map,
            resolver,
            overlay,
            settings,
            start: LocationQuery::new(Role::Start),
            destination: LocationQuery::new(Role::Destination),
            points: KnownPoints::default(),
            markers: [None, None],
            viewport,
            submission: 0,
            channel: unbounded(),
            in_flight: 0,
        }
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn overlay(&self) -> &OverlayManager {
        &self.overlay
    }

    pub fn query(&self, role: Role) -> &LocationQuery {
        match role {
            Role::Start => &self.start,
            Role::Destination => &self.destination,
        }
    }

    fn query_mut(&mut self, role: Role) -> &mut LocationQuery {
        match role {
            Role::Start => &mut self.start,
            Role::Destination => &mut self.destination,
        }
    }

    pub fn point(&self, role: Role) -> Option<GeoPoint> {
        self.points.get(role)
    }

    pub fn points(&self) -> KnownPoints {
        self.points
    }

    /// Where the map has been told to look by the viewport policy.
    pub fn viewport(&self) -> ViewportState {
        self.viewport
    }

    pub fn mode(&self) -> OverlayMode {
        self.settings.mode
    }

    pub fn state(&self) -> ResolutionState {
        match (self.points.start, self.points.end) {
            (None, None) => ResolutionState::Empty,
            (Some(_), Some(_)) => ResolutionState::FullyResolved,
            _ => ResolutionState::PartiallyResolved,
        }
    }

    /// The text of the distance display.
    pub fn readout(&self) -> String {
        self.overlay.readout()
    }

    /// `true` if no geocoding, provider load or route computation is pending.
    pub fn is_idle(&self) -> bool {
        self.in_flight == 0 && self.overlay.is_idle()
    }

    /// Updates the text of a role. Nothing is resolved until [`Self::submit`].
    pub fn set_text(&mut self, role: Role, text: impl Into<String>) {
        self.query_mut(role).text = text.into();
    }

    /// Resolves both texts. Empty texts are skipped.
    ///
    /// Both resolutions run concurrently and are applied in whatever order they
    /// complete.
    pub fn submit(&mut self, start_text: impl Into<String>, dest_text: impl Into<String>) {
        self.start.text = start_text.into();
        self.destination.text = dest_text.into();
        self.submission += 1;

        for &role in &[Role::Start, Role::Destination] {
            let text = self.query(role).text.clone();
            if text.trim().is_empty() {
                log::debug!("Not resolving the {}, no location was entered.", role);
                continue;
            }

            let resolver = self.resolver.clone();
            let tx = self.channel.0.clone();
            let submission = self.submission;
            self.in_flight += 1;
            spawn(move || {
                let result = resolver.resolve(&text);
                let resolution = Resolution {
                    role,
                    submission,
                    text,
                    result,
                };
                if tx.send(resolution).is_err() {
                    log::debug!("Could not send the resolution message. This most likely happened because the app was terminated.")
                }
            });
        }
    }

    /// Submits the texts that are currently entered.
    pub fn submit_current(&mut self) {
        let start = self.start.text.clone();
        let destination = self.destination.text.clone();
        self.submit(start, destination);
    }

    /// Sets the point of `role` and reacts to it.
    pub fn apply_resolution(&mut self, role: Role, point: GeoPoint) {
        self.points.set(role, Some(point));
        self.place_marker(role);

        self.viewport = next_viewport(self.points, role, &self.settings.viewport);
        self.map.set_view(self.viewport.center, self.viewport.zoom);

        self.show_overlay();
    }

    /// Exchanges the text and the point of both roles.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.start.text, &mut self.destination.text);
        self.points = KnownPoints {
            start: self.points.end,
            end: self.points.start,
        };
        if self.settings.drop_stale_resolutions {
            self.submission += 1;
        }

        self.place_marker(Role::Start);
        self.place_marker(Role::Destination);

        self.viewport = next_viewport(self.points, Role::Start, &self.settings.viewport);
        self.map.set_view(self.viewport.center, self.viewport.zoom);

        self.show_overlay();
    }

    /// Forgets both locations and everything that was shown for them.
    pub fn clear(&mut self) {
        self.start.text.clear();
        self.destination.text.clear();
        self.points = KnownPoints::default();
        if self.settings.drop_stale_resolutions {
            self.submission += 1;
        }

        self.place_marker(Role::Start);
        self.place_marker(Role::Destination);
        self.overlay.clear(&mut self.map);

        self.viewport = self.settings.viewport.initial();
        self.map.set_view(self.viewport.center, self.viewport.zoom);
    }

    /// Applies all completed asynchronous work. Returns how many completions were handled.
    pub fn pump(&mut self) -> usize {
        let resolutions = self.channel.1.try_iter().collect::<Vec<_>>();
        let count = resolutions.len();
        for resolution in resolutions {
            self.finish_resolution(resolution);
        }
        count + self.overlay.pump(&mut self.map)
    }

    /// Pumps until nothing is in flight anymore or `timeout` passed.
    ///
    /// Returns `true` if the coordinator went idle.
    pub fn run_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            if self.is_idle() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }

            let mut select = Select::new();
            select.recv(&self.channel.1);
            select.recv(self.overlay.receiver());
            if select.ready_timeout(deadline - now).is_err() {
                return false;
            }
        }
    }

    fn finish_resolution(&mut self, resolution: Resolution) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let Resolution {
            role,
            submission,
            text,
            result,
        } = resolution;

        if self.settings.drop_stale_resolutions && submission != self.submission {
            log::debug!(
                "Dropping the stale resolution of {:?} for the {}.",
                text,
                role
            );
            return;
        }

        match result {
            Ok(point) => {
                log::info!("Resolved the {} {:?} to {}.", role, text, point);
                self.apply_resolution(role, point);
            }
            Err(e) => {
                log::error!("Unable to resolve the {} {:?}. Reason:\r\n{}", role, text, e);
            }
        }
    }

    /// Makes the marker of `role` match its current point.
    fn place_marker(&mut self, role: Role) {
        if let Some(marker) = self.markers[slot(role)].take() {
            self.map.remove_layer(marker);
        }
        if let Some(point) = self.points.get(role) {
            self.markers[slot(role)] = Some(self.map.add_layer(Layer::Marker { point, role }));
        }
    }

    fn show_overlay(&mut self) {
        if let Some((start, end)) = self.points.both() {
            self.overlay.show(start, end, self.settings.mode, &mut self.map);
        }
    }
}
