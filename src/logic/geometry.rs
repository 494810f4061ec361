//! Planar geometry for small parcels.
//!
//! Area uses an equirectangular projection centred on the mean latitude.
//! Distortion stays well under 1% for parcels a few kilometres across away
//! from the poles, which covers the configured 1 km² ceiling comfortably.
//! No datum or ellipsoid correction is applied.

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Arithmetic mean of latitudes and longitudes, returned as (lat, lon).
/// Returns `None` for an empty slice.
pub fn centroid(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let lat = points.iter().map(|(lat, _)| lat).sum::<f64>() / n;
    let lon = points.iter().map(|(_, lon)| lon).sum::<f64>() / n;
    Some((lat, lon))
}

/// Shoelace area in m² of the implicitly closed ring; 0 below 3 points
pub fn planar_area_m2(points: &[(f64, f64)]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let center_lat_rad = (points.iter().map(|(lat, _)| lat).sum::<f64>()
        / points.len() as f64)
        .to_radians();
    let cos_center = center_lat_rad.cos();

    let projected: Vec<(f64, f64)> = points
        .iter()
        .map(|(lat, lon)| {
            let x = lon.to_radians() * EARTH_RADIUS_M * cos_center;
            let y = lat.to_radians() * EARTH_RADIUS_M;
            (x, y)
        })
        .collect();

    let n = projected.len();
    let twice_area: f64 = (0..n)
        .map(|i| {
            let (x_i, y_i) = projected[i];
            let (x_j, y_j) = projected[(i + 1) % n];
            x_i * y_j - x_j * y_i
        })
        .sum();

    twice_area.abs() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Degrees spanned by `metres` along a meridian
    fn deg(metres: f64) -> f64 {
        (metres / EARTH_RADIUS_M).to_degrees()
    }

    #[test]
    fn centroid_is_vertex_mean() {
        let pts = [(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0)];
        assert_eq!(centroid(&pts), Some((1.0, 1.0)));
        assert_eq!(centroid(&[]), None);
    }

    #[test]
    fn centroid_is_not_edge_weighted() {
        // Three vertices bunched at one corner pull the mean towards them
        let pts = [(0.0, 0.0), (0.0, 0.1), (0.1, 0.0), (4.0, 4.0)];
        let (lat, lon) = centroid(&pts).unwrap();
        assert!((lat - 1.025).abs() < 1e-12);
        assert!((lon - 1.025).abs() < 1e-12);
    }

    #[test]
    fn hundred_metre_square_at_equator() {
        let d = deg(100.0);
        let pts = [(0.0, 0.0), (0.0, d), (d, d), (d, 0.0)];
        let area = planar_area_m2(&pts);
        assert!((area - 10_000.0).abs() / 10_000.0 < 0.01, "area was {}", area);
    }

    #[test]
    fn area_independent_of_winding() {
        let d = deg(100.0);
        let cw = [(0.0, 0.0), (d, 0.0), (d, d), (0.0, d)];
        let ccw = [(0.0, 0.0), (0.0, d), (d, d), (d, 0.0)];
        assert!((planar_area_m2(&cw) - planar_area_m2(&ccw)).abs() < 1e-6);
    }

    #[test]
    fn fewer_than_three_points_is_zero() {
        assert_eq!(planar_area_m2(&[]), 0.0);
        assert_eq!(planar_area_m2(&[(1.0, 1.0)]), 0.0);
        assert_eq!(planar_area_m2(&[(1.0, 1.0), (2.0, 2.0)]), 0.0);
    }

    #[test]
    fn munich_parcel_is_a_few_thousand_square_metres() {
        let pts = [
            (48.12978723465923, 11.567817614315333),
            (48.12976197492467, 11.56856190677253),
            (48.12927361761429, 11.568536676519743),
            (48.12923993762861, 11.567767153809761),
        ];
        let area = planar_area_m2(&pts);
        assert!(area > 2_500.0 && area < 4_000.0, "area was {}", area);
    }
}
