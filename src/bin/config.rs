use once_cell::sync::Lazy;
use serde_derive::Deserialize;
use wayfinder::OverlayMode;

pub static CONFIG: Lazy<Config> = Lazy::new(|| Config::new().expect("Config could not be loaded."));

#[derive(Debug, Deserialize)]
pub struct General {
    pub log_level: log::Level,
    /// How long the event loop waits for input before pumping, in milliseconds.
    pub tick: u64,
}

#[derive(Debug, Deserialize)]
pub struct Geocoder {
    pub base_url: String,
    pub user_agent: String,
    /// Seconds.
    pub timeout: u64,
}

#[derive(Debug, Deserialize)]
pub struct Router {
    pub base_url: String,
    pub profile: String,
    pub user_agent: String,
    /// Seconds.
    pub timeout: u64,
}

#[derive(Debug, Deserialize)]
pub struct Map {
    pub center_lat: f64,
    pub center_lng: f64,
    pub zoom: u8,
    pub wide_zoom: u8,
    pub fit_padding: u32,
    pub width: u32,
    pub height: u32,
    pub tile_size: u32,
    pub max_zoom: u8,
}

#[derive(Debug, Deserialize)]
pub struct Overlay {
    pub mode: OverlayMode,
    pub path_style: String,
}

#[derive(Debug, Deserialize)]
pub struct Coordinator {
    pub drop_stale_resolutions: bool,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub general: General,
    pub geocoder: Geocoder,
    pub router: Router,
    pub map: Map,
    pub overlay: Overlay,
    pub coordinator: Coordinator,
}

impl Config {
    pub fn new() -> Result<Self, config::ConfigError> {
        let mut s = config::Config::new();

        s.merge(config::File::with_name("config/default"))?;

        // Not checked in, overrides the defaults on this machine.
        s.merge(config::File::with_name("config/local").required(false))?;

        // WAYFINDER__ROUTER__BASE_URL=... and friends.
        s.merge(config::Environment::with_prefix("WAYFINDER").separator("__"))?;

        s.try_into()
    }
}
