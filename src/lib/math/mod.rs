mod geo_point;
mod screen;

use std::f64::consts::PI;

pub use geo_point::*;
pub use screen::*;

/// Latitude limit of the Web-Mercator projection.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_78;

fn deg2rad(deg: f64) -> f64 {
    2.0 * PI * deg / 360.0
}

fn rad2deg(rad: f64) -> f64 {
    rad * 360.0 / (2.0 * PI)
}

/// A fractional position in the tile grid of zoom level `z`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TileCoordinate {
    pub z: u8,
    pub x: f64,
    pub y: f64,
}

impl TileCoordinate {
    pub fn new(z: u8, x: f64, y: f64) -> Self {
        Self { z, x, y }
    }
}

pub fn deg2num(lat_deg: f64, lon_deg: f64, zoom: u8) -> TileCoordinate {
    let lat_rad = deg2rad(lat_deg.max(-MAX_MERCATOR_LATITUDE).min(MAX_MERCATOR_LATITUDE));
    let n = 2f64.powi(zoom as i32);
    let xtile = (lon_deg + 180.0) / 360.0 * n;
    let ytile = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n;

    TileCoordinate::new(zoom, xtile, ytile)
}

pub fn num2deg(coordinate: &TileCoordinate) -> (f64, f64) {
    let n = 2f64.powi(coordinate.z as i32);
    let lon_deg = coordinate.x / n * 360.0 - 180.0;
    let lat_rad = (PI * (1.0 - 2.0 * coordinate.y / n)).sinh().atan();
    (rad2deg(lat_rad), lon_deg)
}

#[test]
fn zurich_tile_at_zoom_8() {
    let coordinate = deg2num(47.3769, 8.5417, 8);
    assert_eq!(coordinate.x as u32, 134);
    assert_eq!(coordinate.y as u32, 89);

    let (lat, lon) = num2deg(&coordinate);
    approx::assert_relative_eq!(lat, 47.3769, epsilon = 1e-9);
    approx::assert_relative_eq!(lon, 8.5417, epsilon = 1e-9);
}
