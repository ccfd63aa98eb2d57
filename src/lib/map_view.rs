use crate::*;
use std::collections::BTreeMap;

/// Identifies a layer that has been added to a [`MapView`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct LayerId(pub u64);

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Anything that can be put on top of the map.
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    /// A pin marking the resolved point of a role.
    Marker { point: GeoPoint, role: Role },
    /// A stroked polyline.
    Path {
        points: Vec<GeoPoint>,
        style: PathStyle,
    },
    /// The control that owns a routing request between waypoints.
    RoutingControl { waypoints: Vec<GeoPoint> },
}

impl Layer {
    pub fn is_marker(&self) -> bool {
        matches!(self, Layer::Marker { .. })
    }

    pub fn is_path(&self) -> bool {
        matches!(self, Layer::Path { .. })
    }

    pub fn is_routing_control(&self) -> bool {
        matches!(self, Layer::RoutingControl { .. })
    }
}

/// The map surface everything is drawn on.
///
/// Implementations only render. All decisions about what to show are made by
/// the [`Coordinator`] and the [`OverlayManager`].
pub trait MapView {
    fn set_view(&mut self, center: GeoPoint, zoom: u8);

    /// Moves and zooms the map so all `points` are visible with `padding`
    /// pixels to spare on every side.
    fn fit_bounds(&mut self, points: &[GeoPoint], padding: u32);

    /// Distance between two points in meters.
    fn distance(&self, a: &GeoPoint, b: &GeoPoint) -> f64;

    fn add_layer(&mut self, layer: Layer) -> LayerId;

    /// Removes a layer. Removing an unknown layer does nothing.
    fn remove_layer(&mut self, id: LayerId);
}

/// A map view that keeps its state in memory without rendering anything.
pub struct HeadlessMap {
    screen: Screen,
    view: ViewportState,
    layers: BTreeMap<LayerId, Layer>,
    next_id: u64,
}

impl HeadlessMap {
    pub fn new(screen: Screen, view: ViewportState) -> Self {
        Self {
            screen,
            view,
            layers: BTreeMap::new(),
            next_id: 0,
        }
    }

    pub fn view(&self) -> ViewportState {
        self.view
    }

    pub fn layers(&self) -> &BTreeMap<LayerId, Layer> {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(&id)
    }

    pub fn markers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values().filter(|l| l.is_marker())
    }

    pub fn paths(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values().filter(|l| l.is_path())
    }

    pub fn routing_controls(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values().filter(|l| l.is_routing_control())
    }

    pub fn marker_for(&self, role: Role) -> Option<GeoPoint> {
        self.layers.values().find_map(|l| match l {
            Layer::Marker { point, role: r } if *r == role => Some(*point),
            _ => None,
        })
    }
}

impl MapView for HeadlessMap {
    fn set_view(&mut self, center: GeoPoint, zoom: u8) {
        log::trace!("Set view to {} at zoom {}.", center, zoom);
        self.view = ViewportState { center, zoom };
    }

    fn fit_bounds(&mut self, points: &[GeoPoint], padding: u32) {
        if let Some(view) = self.screen.fit(points, padding) {
            log::trace!("Fit {} points into {} at zoom {}.", points.len(), view.center, view.zoom);
            self.view = view;
        }
    }

    fn distance(&self, a: &GeoPoint, b: &GeoPoint) -> f64 {
        a.distance_to(b)
    }

    fn add_layer(&mut self, layer: Layer) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        log::trace!("Add layer {}: {:?}", id, layer);
        self.layers.insert(id, layer);
        id
    }

    fn remove_layer(&mut self, id: LayerId) {
        if self.layers.remove(&id).is_some() {
            log::trace!("Removed layer {}.", id);
        }
    }
}

#[cfg(test)]
fn test_map() -> HeadlessMap {
    HeadlessMap::new(
        Screen::new(1600, 1000, 256, 18),
        ViewportDefaults::default().initial(),
    )
}

#[test]
fn layers_come_and_go() {
    let mut map = test_map();
    let london = GeoPoint::new(51.5074, -0.1278).unwrap();
    let paris = GeoPoint::new(48.8566, 2.3522).unwrap();

    let marker = map.add_layer(Layer::Marker {
        point: london,
        role: Role::Start,
    });
    let path = map.add_layer(Layer::Path {
        points: vec![london, paris],
        style: PathStyle::default(),
    });
    assert_ne!(marker, path);
    assert_eq!(map.markers().count(), 1);
    assert_eq!(map.paths().count(), 1);
    assert_eq!(map.marker_for(Role::Start), Some(london));
    assert_eq!(map.marker_for(Role::Destination), None);

    map.remove_layer(path);
    map.remove_layer(path);
    assert_eq!(map.paths().count(), 0);
    assert_eq!(map.layers().len(), 1);
}

#[test]
fn fit_bounds_moves_the_view() {
    let mut map = test_map();
    let london = GeoPoint::new(51.5074, -0.1278).unwrap();
    let paris = GeoPoint::new(48.8566, 2.3522).unwrap();

    map.fit_bounds(&[london, paris], 50);
    assert_eq!(map.view().zoom, 8);

    // Nothing to fit leaves the view alone.
    map.set_view(paris, 13);
    map.fit_bounds(&[], 50);
    assert_eq!(map.view(), ViewportState { center: paris, zoom: 13 });
}
