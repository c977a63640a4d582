//! 球面上の距離計算と範囲計算

use serde::{Deserialize, Serialize};

/// 地球半径（km）
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// 緯度・経度（度）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lon: f64,
}

impl LatLng {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// Haversine公式による大円距離（km）
///
/// 入力は度単位。`haversine_km(a, b) == haversine_km(b, a)`。
pub fn haversine_km(a: LatLng, b: LatLng) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// 緯度・経度の算術平均
///
/// 空の入力では `None`
pub fn mean_center(points: &[LatLng]) -> Option<LatLng> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let lat = points.iter().map(|p| p.lat).sum::<f64>() / n;
    let lon = points.iter().map(|p| p.lon).sum::<f64>() / n;
    Some(LatLng::new(lat, lon))
}

/// 矩形範囲（南西・北東）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    /// 1点から範囲を作成
    pub fn from_point(p: LatLng) -> Self {
        Self {
            south: p.lat,
            west: p.lon,
            north: p.lat,
            east: p.lon,
        }
    }

    /// 有限値の点のみから範囲を作成（該当なしなら `None`）
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a LatLng>,
    {
        let mut bounds: Option<Bounds> = None;
        for p in points.into_iter().filter(|p| p.is_finite()) {
            match bounds.as_mut() {
                Some(b) => b.extend(*p),
                None => bounds = Some(Bounds::from_point(*p)),
            }
        }
        bounds
    }

    pub fn extend(&mut self, p: LatLng) {
        self.south = self.south.min(p.lat);
        self.west = self.west.min(p.lon);
        self.north = self.north.max(p.lat);
        self.east = self.east.max(p.lon);
    }

    pub fn center(&self) -> LatLng {
        LatLng::new((self.south + self.north) / 2.0, (self.west + self.east) / 2.0)
    }

    pub fn contains(&self, p: LatLng) -> bool {
        p.lat >= self.south && p.lat <= self.north && p.lon >= self.west && p.lon <= self.east
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_same_point_is_zero() {
        for p in [
            LatLng::new(0.0, 0.0),
            LatLng::new(35.6812, 139.7671),
            LatLng::new(-33.8688, 151.2093),
            LatLng::new(89.9, -179.9),
        ] {
            assert_eq!(haversine_km(p, p), 0.0);
        }
    }

    #[test]
    fn test_distance_symmetric() {
        let pairs = [
            (LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0)),
            (LatLng::new(51.5074, -0.1278), LatLng::new(40.7128, -74.0060)),
            (LatLng::new(-33.8688, 151.2093), LatLng::new(35.6812, 139.7671)),
        ];
        for (a, b) in pairs {
            assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_distance_one_degree_longitude_at_equator() {
        let d = haversine_km(LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0));
        assert!((d - 111.19).abs() < 0.5, "距離: {}", d);
    }

    #[test]
    fn test_distance_london_new_york() {
        let d = haversine_km(LatLng::new(51.5074, -0.1278), LatLng::new(40.7128, -74.0060));
        assert!((d - 5570.0).abs() < 10.0, "距離: {}", d);
    }

    #[test]
    fn test_distance_antipodal() {
        let d = haversine_km(LatLng::new(0.0, 0.0), LatLng::new(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_mean_center() {
        assert!(mean_center(&[]).is_none());

        let c = mean_center(&[LatLng::new(10.0, 20.0), LatLng::new(20.0, 40.0)]).unwrap();
        assert_eq!(c, LatLng::new(15.0, 30.0));
    }

    #[test]
    fn test_bounds_from_points() {
        let points = vec![
            LatLng::new(10.0, 20.0),
            LatLng::new(-5.0, 30.0),
            LatLng::new(f64::NAN, 100.0),
            LatLng::new(3.0, -4.0),
        ];
        let b = Bounds::from_points(&points).unwrap();
        assert_eq!(b.south, -5.0);
        assert_eq!(b.north, 10.0);
        assert_eq!(b.west, -4.0);
        assert_eq!(b.east, 30.0);
        assert!(b.contains(LatLng::new(0.0, 0.0)));
        assert!(!b.contains(LatLng::new(0.0, 100.0)));
        assert_eq!(b.center(), LatLng::new(2.5, 13.0));
    }

    #[test]
    fn test_bounds_empty() {
        let points: Vec<LatLng> = vec![];
        assert!(Bounds::from_points(&points).is_none());
    }
}
