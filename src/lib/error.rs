/// Everything that can go wrong while resolving places and drawing overlays.
///
/// None of these are fatal. They get logged where they happen and the user
/// only notices that the expected change did not show up.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The geocoder answered with an empty candidate list.
    #[error("no location found for {0:?}")]
    NotFound(String),
    /// The geocoder could not be reached or returned garbage.
    #[error("geocoding service failed: {0}")]
    Service(String),
    /// The routing capability could not be loaded.
    #[error("routing provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// The routing provider is loaded but could not compute a route.
    #[error("route computation failed: {0}")]
    RouteCompute(String),
    #[error("invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate { lat: f64, lng: f64 },
    #[error("invalid path style: {0}")]
    Style(String),
}
