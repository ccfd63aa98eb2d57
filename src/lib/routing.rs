use crate::*;
use serde_derive::Deserialize;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RouteSummary {
    /// Length of the route in meters.
    pub total_distance: f64,
    /// Expected travel time in seconds.
    pub total_time: f64,
}

/// A route computed by a [`Router`].
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub geometry: Vec<GeoPoint>,
    pub summary: RouteSummary,
}

/// A turn-by-turn routing provider.
pub trait Router: Send + Sync {
    /// Computes routes along `waypoints`, best route first.
    ///
    /// An empty route list is never returned, that case is an
    /// [`Error::RouteCompute`].
    fn route(&self, waypoints: &[GeoPoint]) -> Result<Vec<Route>, Error>;
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<(f64, f64)>,
}

/// Routes through an OSRM compatible HTTP service.
pub struct OsrmRouter {
    settings: HttpSettings,
    profile: String,
}

impl OsrmRouter {
    /// Sets up a router for the service at `settings.base_url`.
    ///
    /// Only checks that the settings make sense, the service is first
    /// contacted by the first route request.
    pub fn connect(settings: HttpSettings, profile: impl Into<String>) -> Result<Self, Error> {
        let profile = profile.into();
        if !(settings.base_url.starts_with("http://") || settings.base_url.starts_with("https://"))
        {
            return Err(Error::ProviderUnavailable(format!(
                "{:?} is not an http(s) url",
                settings.base_url
            )));
        }
        if profile.is_empty() || profile.contains('/') {
            return Err(Error::ProviderUnavailable(format!(
                "{:?} is not a routing profile",
                profile
            )));
        }
        Ok(Self { settings, profile })
    }

    pub fn route_url(&self, waypoints: &[GeoPoint]) -> String {
        let coordinates = waypoints
            .iter()
            .map(|p| format!("{},{}", p.lng(), p.lat()))
            .collect::<Vec<_>>()
            .join(";");
        format!(
            "{}?overview=full&geometries=geojson&alternatives=false&steps=false",
            join_url(
                &self.settings.base_url,
                &format!("route/v1/{}/{}", self.profile, coordinates)
            )
        )
    }
}

impl Router for OsrmRouter {
    fn route(&self, waypoints: &[GeoPoint]) -> Result<Vec<Route>, Error> {
        if waypoints.len() < 2 {
            return Err(Error::RouteCompute(format!(
                "need at least two waypoints, got {}",
                waypoints.len()
            )));
        }
        let response: OsrmResponse = fetch_json(&self.route_url(waypoints), &self.settings)
            .map_err(|e| Error::RouteCompute(e.to_string()))?;
        routes_from_response(response)
    }
}

fn routes_from_response(response: OsrmResponse) -> Result<Vec<Route>, Error> {
    if response.code != "Ok" {
        return Err(Error::RouteCompute(format!(
            "{}: {}",
            response.code,
            response.message.unwrap_or_default()
        )));
    }

    let routes = response
        .routes
        .into_iter()
        .map(|route| {
            let geometry = route
                .geometry
                .coordinates
                .into_iter()
                .map(|(lng, lat)| GeoPoint::new(lat, lng))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| Error::RouteCompute(e.to_string()))?;
            Ok(Route {
                geometry,
                summary: RouteSummary {
                    total_distance: route.distance,
                    total_time: route.duration,
                },
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    if routes.is_empty() {
        return Err(Error::RouteCompute("no route found".into()));
    }
    Ok(routes)
}

#[cfg(test)]
fn settings(base_url: &str) -> HttpSettings {
    HttpSettings {
        base_url: base_url.into(),
        user_agent: "wayfinder-test".into(),
        timeout: std::time::Duration::from_secs(1),
    }
}

#[test]
fn builds_route_url() {
    let router = OsrmRouter::connect(settings("https://router.project-osrm.org"), "driving").unwrap();
    let london = GeoPoint::new(51.5074, -0.1278).unwrap();
    let paris = GeoPoint::new(48.8566, 2.3522).unwrap();
    assert_eq!(
        router.route_url(&[london, paris]),
        "https://router.project-osrm.org/route/v1/driving/-0.1278,51.5074;2.3522,48.8566\
         ?overview=full&geometries=geojson&alternatives=false&steps=false"
    );
}

#[test]
fn connect_rejects_bad_settings() {
    assert!(matches!(
        OsrmRouter::connect(settings("router.project-osrm.org"), "driving"),
        Err(Error::ProviderUnavailable(_))
    ));
    assert!(matches!(
        OsrmRouter::connect(settings("http://localhost:5000"), ""),
        Err(Error::ProviderUnavailable(_))
    ));
}

#[test]
fn decodes_routes() {
    let body = r#"{
        "code": "Ok",
        "routes": [{
            "distance": 463719.4,
            "duration": 21046.1,
            "weight": 21046.1,
            "geometry": {"type": "LineString", "coordinates": [[-0.127758, 51.507351], [1.8, 50.9], [2.352222, 48.856614]]}
        }],
        "waypoints": []
    }"#;
    let routes = routes_from_response(serde_json::from_str(body).unwrap()).unwrap();

    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].summary.total_distance, 463719.4);
    assert_eq!(routes[0].geometry.len(), 3);
    assert_eq!(routes[0].geometry[0], GeoPoint::new(51.507351, -0.127758).unwrap());
}

#[test]
fn failed_routing_is_reported() {
    let body = r#"{"code": "NoRoute", "message": "Impossible route between points"}"#;
    assert_eq!(
        routes_from_response(serde_json::from_str(body).unwrap()),
        Err(Error::RouteCompute(
            "NoRoute: Impossible route between points".into()
        ))
    );

    let body = r#"{"code": "Ok", "routes": []}"#;
    assert!(matches!(
        routes_from_response(serde_json::from_str(body).unwrap()),
        Err(Error::RouteCompute(_))
    ));
}

#[test]
fn transport_problems_are_route_failures() {
    let london = GeoPoint::new(51.5074, -0.1278).unwrap();
    let paris = GeoPoint::new(48.8566, 2.3522).unwrap();

    let url = crate::fetch::serve_once("200 OK", "{\"code\": ");
    let mut settings = settings(&url);
    settings.timeout = std::time::Duration::from_secs(5);
    let router = OsrmRouter::connect(settings, "driving").unwrap();
    assert!(matches!(
        router.route(&[london, paris]),
        Err(Error::RouteCompute(_))
    ));
}
