use crate::*;
use serde_derive::Deserialize;
use std::sync::Arc;

/// A single search hit as geocoding services hand it out.
///
/// Coordinates arrive as strings and are only validated by the [`Resolver`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Candidate {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Candidate {
    pub fn new(lat: impl Into<String>, lon: impl Into<String>) -> Self {
        Self {
            lat: lat.into(),
            lon: lon.into(),
            display_name: None,
        }
    }
}

/// A geocoding service that turns a free text place name into candidates.
pub trait Geocoder: Send + Sync {
    /// Returns all candidates for `query`, best match first.
    ///
    /// Transport and decoding problems are reported as [`Error::Service`].
    fn search(&self, query: &str) -> Result<Vec<Candidate>, Error>;
}

/// Searches a Nominatim compatible HTTP endpoint.
pub struct NominatimGeocoder {
    settings: HttpSettings,
}

impl NominatimGeocoder {
    pub fn new(settings: HttpSettings) -> Self {
        Self { settings }
    }

    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}?format=json&q={}",
            join_url(&self.settings.base_url, "search"),
            encode_component(query)
        )
    }
}

impl Geocoder for NominatimGeocoder {
    fn search(&self, query: &str) -> Result<Vec<Candidate>, Error> {
        fetch_json(&self.search_url(query), &self.settings).map_err(|e| {
            log::warn!("Geocoding request for {:?} failed. Reason:\r\n{}", query, e);
            Error::Service(e.to_string())
        })
    }
}

/// Turns place names into validated points.
#[derive(Clone)]
pub struct Resolver {
    geocoder: Arc<dyn Geocoder>,
}

impl Resolver {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    /// Resolves `text` to the first candidate the geocoder knows about.
    ///
    /// `text` must not be empty. This blocks for as long as the geocoder does.
    pub fn resolve(&self, text: &str) -> Result<GeoPoint, Error> {
        let candidates = self.geocoder.search(text)?;
        let best = candidates
            .first()
            .ok_or_else(|| Error::NotFound(text.to_string()))?;
        if let Some(name) = &best.display_name {
            log::debug!("Picked {:?} for {:?}.", name, text);
        }
        candidate_to_point(best)
    }
}

fn candidate_to_point(candidate: &Candidate) -> Result<GeoPoint, Error> {
    let lat = candidate
        .lat
        .trim()
        .parse::<f64>()
        .map_err(|e| Error::Service(format!("invalid latitude {:?}: {}", candidate.lat, e)))?;
    let lng = candidate
        .lon
        .trim()
        .parse::<f64>()
        .map_err(|e| Error::Service(format!("invalid longitude {:?}: {}", candidate.lon, e)))?;
    GeoPoint::new(lat, lng).map_err(|e| Error::Service(e.to_string()))
}

#[cfg(test)]
struct StaticGeocoder(Result<Vec<Candidate>, Error>);

#[cfg(test)]
impl Geocoder for StaticGeocoder {
    fn search(&self, _query: &str) -> Result<Vec<Candidate>, Error> {
        self.0.clone()
    }
}

#[test]
fn takes_the_first_candidate() {
    let resolver = Resolver::new(Arc::new(StaticGeocoder(Ok(vec![
        Candidate::new("51.5073219", "-0.1276474"),
        Candidate::new("42.9832406", "-81.243372"),
    ]))));

    let point = resolver.resolve("London").unwrap();
    assert_eq!(point, GeoPoint::new(51.5073219, -0.1276474).unwrap());
}

#[test]
fn empty_candidate_list_is_not_found() {
    let resolver = Resolver::new(Arc::new(StaticGeocoder(Ok(vec![]))));
    assert_eq!(
        resolver.resolve("Nonexistentplacexyz"),
        Err(Error::NotFound("Nonexistentplacexyz".into()))
    );
}

#[test]
fn malformed_candidates_are_service_errors() {
    let resolver = Resolver::new(Arc::new(StaticGeocoder(Ok(vec![Candidate::new(
        "north", "2.35",
    )]))));
    assert!(matches!(resolver.resolve("Paris"), Err(Error::Service(_))));

    let resolver = Resolver::new(Arc::new(StaticGeocoder(Ok(vec![Candidate::new(
        "123.0", "2.35",
    )]))));
    assert!(matches!(resolver.resolve("Paris"), Err(Error::Service(_))));
}

#[test]
fn service_errors_pass_through() {
    let resolver = Resolver::new(Arc::new(StaticGeocoder(Err(Error::Service(
        "connection refused".into(),
    )))));
    assert_eq!(
        resolver.resolve("Paris"),
        Err(Error::Service("connection refused".into()))
    );
}

#[test]
fn decodes_nominatim_response() {
    let body = r#"[
        {"place_id": 88066702, "lat": "48.8588897", "lon": "2.3200410", "display_name": "Paris, France", "importance": 0.88},
        {"place_id": 1, "lat": "33.6617962", "lon": "-95.555513", "display_name": "Paris, Texas"}
    ]"#;
    let candidates: Vec<Candidate> = serde_json::from_str(body).unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].lat, "48.8588897");
    assert_eq!(candidates[0].display_name.as_deref(), Some("Paris, France"));
}

#[test]
fn builds_search_url() {
    let geocoder = NominatimGeocoder::new(HttpSettings {
        base_url: "https://nominatim.openstreetmap.org/".into(),
        user_agent: "wayfinder-test".into(),
        timeout: std::time::Duration::from_secs(1),
    });
    assert_eq!(
        geocoder.search_url("St. Gallen, CH"),
        "https://nominatim.openstreetmap.org/search?format=json&q=St.%20Gallen%2C%20CH"
    );
}

#[test]
fn unreachable_geocoder_is_a_service_error() {
    let url = crate::fetch::serve_once("500 Internal Server Error", "{}");
    let geocoder = NominatimGeocoder::new(HttpSettings {
        base_url: url,
        user_agent: "wayfinder-test".into(),
        timeout: std::time::Duration::from_secs(5),
    });
    assert!(matches!(geocoder.search("Paris"), Err(Error::Service(_))));
}

#[test]
fn geocoder_garbage_is_a_service_error() {
    let url = crate::fetch::serve_once("200 OK", "Too many requests, slow down.");
    let geocoder = NominatimGeocoder::new(HttpSettings {
        base_url: url,
        user_agent: "wayfinder-test".into(),
        timeout: std::time::Duration::from_secs(5),
    });
    let resolver = Resolver::new(Arc::new(geocoder));
    assert!(matches!(resolver.resolve("Paris"), Err(Error::Service(_))));
}
