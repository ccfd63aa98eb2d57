use crate::command::{Command, HELP};
use crate::config::CONFIG;
use std::sync::Arc;
use std::time::Duration;
use wayfinder::*;

pub struct AppState {
    pub coordinator: Coordinator<HeadlessMap>,
    last_readout: String,
}

impl AppState {
    pub fn new() -> Result<Self, Error> {
        let geocoder = NominatimGeocoder::new(HttpSettings {
            base_url: CONFIG.geocoder.base_url.clone(),
            user_agent: CONFIG.geocoder.user_agent.clone(),
            timeout: Duration::from_secs(CONFIG.geocoder.timeout),
        });

        let router_settings = HttpSettings {
            base_url: CONFIG.router.base_url.clone(),
            user_agent: CONFIG.router.user_agent.clone(),
            timeout: Duration::from_secs(CONFIG.router.timeout),
        };
        let mut loader: CapabilityLoader<dyn Router> = CapabilityLoader::new();
        loader.register(
            ROUTER_CAPABILITY,
            Arc::new(move || -> Result<Arc<dyn Router>, Error> {
                let router = OsrmRouter::connect(router_settings.clone(), &CONFIG.router.profile)?;
                Ok(Arc::new(router) as Arc<dyn Router>)
            }),
        );

        let overlay = OverlayManager::new(
            loader,
            OverlaySettings {
                style: PathStyle::parse(&CONFIG.overlay.path_style)?,
                padding: CONFIG.map.fit_padding,
            },
        );

        let viewport = ViewportDefaults {
            center: GeoPoint::new(CONFIG.map.center_lat, CONFIG.map.center_lng)?,
            zoom: CONFIG.map.zoom,
            wide_zoom: CONFIG.map.wide_zoom,
        };
        let map = HeadlessMap::new(
            Screen::new(
                CONFIG.map.width,
                CONFIG.map.height,
                CONFIG.map.tile_size,
                CONFIG.map.max_zoom,
            ),
            viewport.initial(),
        );

        let coordinator = Coordinator::new(
            map,
            Resolver::new(Arc::new(geocoder)),
            overlay,
            CoordinatorSettings {
                viewport,
                mode: CONFIG.overlay.mode,
                drop_stale_resolutions: CONFIG.coordinator.drop_stale_resolutions,
            },
        );

        Ok(Self {
            last_readout: coordinator.readout(),
            coordinator,
        })
    }

    /// Runs a command. Returns `false` once the user wants to leave.
    pub fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::SetText(role, text) => self.coordinator.set_text(role, text),
            Command::Submit => {
                let missing = [Role::Start, Role::Destination]
                    .iter()
                    .copied()
                    .find(|&role| self.coordinator.query(role).text.trim().is_empty());
                match missing {
                    Some(role) => println!("Please enter a {} first.", role),
                    None => self.coordinator.submit_current(),
                }
            }
            Command::Swap => self.coordinator.swap(),
            Command::Clear => self.coordinator.clear(),
            Command::Status => self.print_status(),
            Command::Help => println!("{}", HELP),
            Command::Quit => return false,
        }
        true
    }

    /// Applies finished lookups and prints the distance whenever it changes.
    pub fn update(&mut self) {
        self.coordinator.pump();
        let readout = self.coordinator.readout();
        if readout != self.last_readout {
            println!("{}", readout);
            self.last_readout = readout;
        }
    }

    pub fn print_status(&self) {
        for &role in &[Role::Start, Role::Destination] {
            let query = self.coordinator.query(role);
            let label = query.role.to_string();
            match self.coordinator.point(role) {
                Some(point) => println!("{:<12} {:?} at {}", label, query.text, point),
                None => println!("{:<12} {:?}", label, query.text),
            }
        }

        let viewport = self.coordinator.viewport();
        println!("view         {} at zoom {}", viewport.center, viewport.zoom);
        match self.coordinator.overlay().active() {
            Some(overlay) => println!("path         {}", overlay.mode()),
            None => println!("path         none ({})", self.coordinator.mode()),
        }
        if !self.coordinator.is_idle() {
            println!("still looking things up");
        }
        println!("{}", self.coordinator.readout());
    }
}
