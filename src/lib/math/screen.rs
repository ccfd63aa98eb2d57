use super::*;
use crate::ViewportState;

/// The pixel dimensions of the map surface.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Screen {
    pub width: u32,
    pub height: u32,
    tile_size: u32,
    max_zoom: u8,
}

impl Screen {
    pub fn new(width: u32, height: u32, tile_size: u32, max_zoom: u8) -> Self {
        Self {
            width,
            height,
            tile_size,
            max_zoom,
        }
    }

    pub fn get_tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Finds the closest view that still shows all `points` with `padding`
    /// pixels of room on every side.
    ///
    /// Returns `None` if there are no points.
    pub fn fit(&self, points: &[GeoPoint], padding: u32) -> Option<ViewportState> {
        let first = points.first()?;
        let (mut north, mut south, mut west, mut east) =
            (first.lat(), first.lat(), first.lng(), first.lng());
        for point in &points[1..] {
            north = north.max(point.lat());
            south = south.min(point.lat());
            west = west.min(point.lng());
            east = east.max(point.lng());
        }

        let available_x = self.width as f64 - 2.0 * padding as f64;
        let available_y = self.height as f64 - 2.0 * padding as f64;

        let mut zoom = self.max_zoom;
        while zoom > 0 {
            let top_left = deg2num(north, west, zoom);
            let bottom_right = deg2num(south, east, zoom);
            let tile_size = self.get_tile_size() as f64;
            let size_x = (bottom_right.x - top_left.x) * tile_size;
            let size_y = (bottom_right.y - top_left.y) * tile_size;
            if size_x <= available_x && size_y <= available_y {
                break;
            }
            zoom -= 1;
        }

        // Center in projected space.
        let top_left = deg2num(north, west, zoom);
        let bottom_right = deg2num(south, east, zoom);
        let (lat, lng) = num2deg(&TileCoordinate::new(
            zoom,
            (top_left.x + bottom_right.x) / 2.0,
            (top_left.y + bottom_right.y) / 2.0,
        ));
        let center = GeoPoint::new(lat, lng).ok()?;

        Some(ViewportState { center, zoom })
    }
}

#[test]
fn fit_single_point_uses_max_zoom() {
    let screen = Screen::new(800, 600, 256, 18);
    let zurich = GeoPoint::new(47.3769, 8.5417).unwrap();
    let view = screen.fit(&[zurich], 50).unwrap();

    assert_eq!(view.zoom, 18);
    approx::assert_abs_diff_eq!(view.center.lat(), zurich.lat(), epsilon = 1e-9);
    approx::assert_abs_diff_eq!(view.center.lng(), zurich.lng(), epsilon = 1e-9);
}

#[test]
fn fit_london_paris() {
    let screen = Screen::new(1600, 1000, 256, 18);
    let london = GeoPoint::new(51.5074, -0.1278).unwrap();
    let paris = GeoPoint::new(48.8566, 2.3522).unwrap();
    let view = screen.fit(&[london, paris], 50).unwrap();

    assert_eq!(view.zoom, 8);
    assert!(view.center.lat() < london.lat() && view.center.lat() > paris.lat());
    approx::assert_abs_diff_eq!(view.center.lng(), 1.1122, epsilon = 1e-9);
}

#[test]
fn fit_nothing() {
    let screen = Screen::new(800, 600, 256, 18);
    assert_eq!(screen.fit(&[], 50), None);
}
