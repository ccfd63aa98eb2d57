use crate::*;

/// Which of the two locations a query, point or marker belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Start,
    Destination,
}

impl Role {
    pub fn other(self) -> Role {
        match self {
            Role::Start => Role::Destination,
            Role::Destination => Role::Start,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Role::Start => write!(f, "start"),
            Role::Destination => write!(f, "destination"),
        }
    }
}

/// The resolved points currently known for both roles.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct KnownPoints {
    pub start: Option<GeoPoint>,
    pub end: Option<GeoPoint>,
}

impl KnownPoints {
    pub fn get(&self, role: Role) -> Option<GeoPoint> {
        match role {
            Role::Start => self.start,
            Role::Destination => self.end,
        }
    }

    pub fn set(&mut self, role: Role, point: Option<GeoPoint>) {
        match role {
            Role::Start => self.start = point,
            Role::Destination => self.end = point,
        }
    }

    /// Returns both points if both are known.
    pub fn both(&self) -> Option<(GeoPoint, GeoPoint)> {
        Some((self.start?, self.end?))
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportState {
    pub center: GeoPoint,
    pub zoom: u8,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportDefaults {
    /// Where the map looks when nothing is known.
    pub center: GeoPoint,
    /// Zoom used when looking at a single point.
    pub zoom: u8,
    /// Zoom used when both points are known.
    pub wide_zoom: u8,
}

impl ViewportDefaults {
    pub fn initial(&self) -> ViewportState {
        ViewportState {
            center: self.center,
            zoom: self.zoom,
        }
    }
}

impl Default for ViewportDefaults {
    fn default() -> Self {
        Self {
            // Central London.
            center: GeoPoint::new(51.505, -0.09).expect("constant coordinate is valid"),
            zoom: 13,
            wide_zoom: 5,
        }
    }
}

/// Computes where the map should look after the point for `just_set` changed.
pub fn next_viewport(
    known: KnownPoints,
    just_set: Role,
    defaults: &ViewportDefaults,
) -> ViewportState {
    match (known.get(just_set), known.get(just_set.other())) {
        (Some(a), Some(b)) => ViewportState {
            center: a.midpoint(&b),
            zoom: defaults.wide_zoom,
        },
        (Some(point), None) | (None, Some(point)) => ViewportState {
            center: point,
            zoom: defaults.zoom,
        },
        (None, None) => defaults.initial(),
    }
}

#[cfg(test)]
fn sample_points() -> Vec<GeoPoint> {
    let mut points = vec![
        GeoPoint::new(51.5074, -0.1278).unwrap(),
        GeoPoint::new(-33.8688, 151.2093).unwrap(),
        GeoPoint::new(0.000_1, -0.000_1).unwrap(),
    ];
    for lat in (-90..=90).step_by(15) {
        for lng in (-180..=180).step_by(20) {
            points.push(GeoPoint::new(lat as f64, lng as f64).unwrap());
        }
    }
    points
}

#[test]
fn single_point_centers_on_it() {
    let defaults = ViewportDefaults::default();
    for point in sample_points() {
        for &role in &[Role::Start, Role::Destination] {
            let mut known = KnownPoints::default();
            known.set(role, Some(point));

            let view = next_viewport(known, role, &defaults);
            assert_eq!(view.center, point);
            assert_eq!(view.zoom, 13);
        }
    }
}

#[test]
fn both_points_center_on_midpoint() {
    let defaults = ViewportDefaults::default();
    let points = sample_points();
    for (a, b) in points.iter().zip(points.iter().rev()) {
        let known = KnownPoints {
            start: Some(*a),
            end: Some(*b),
        };
        for &role in &[Role::Start, Role::Destination] {
            let view = next_viewport(known, role, &defaults);
            assert_eq!(view.center.lat(), (a.lat() + b.lat()) / 2.0);
            assert_eq!(view.center.lng(), (a.lng() + b.lng()) / 2.0);
            assert_eq!(view.zoom, 5);
        }
    }
}

#[test]
fn nothing_known_falls_back_to_default() {
    let defaults = ViewportDefaults::default();
    let view = next_viewport(KnownPoints::default(), Role::Destination, &defaults);
    assert_eq!(view, defaults.initial());
    assert_eq!(view.zoom, 13);
}

#[test]
fn only_other_role_known_centers_on_it() {
    let defaults = ViewportDefaults::default();
    let paris = GeoPoint::new(48.8566, 2.3522).unwrap();
    let known = KnownPoints {
        start: None,
        end: Some(paris),
    };
    let view = next_viewport(known, Role::Start, &defaults);
    assert_eq!(view.center, paris);
    assert_eq!(view.zoom, 13);
}
