//! Great-circle helpers shared by the geospatial validators.

use geo::{Closest, HaversineClosestPoint, HaversineDistance, LineString, Point};

/// Haversine distance between two coordinates, in meters.
pub fn distance_meters(from_lat: f64, from_lon: f64, to_lat: f64, to_lon: f64) -> f64 {
    Point::new(from_lon, from_lat).haversine_distance(&Point::new(to_lon, to_lat))
}

/// Builds a polyline from `(latitude, longitude)` pairs, in order.
pub fn polyline(points: impl IntoIterator<Item = (f64, f64)>) -> LineString<f64> {
    LineString::from(
        points
            .into_iter()
            .map(|(lat, lon)| (lon, lat))
            .collect::<Vec<_>>(),
    )
}

/// Minimum distance in meters from a coordinate to a polyline, or
/// `None` when the polyline is empty.
pub fn distance_to_polyline_meters(lat: f64, lon: f64, line: &LineString<f64>) -> Option<f64> {
    let point = Point::new(lon, lat);
    match line.0.len() {
        0 => None,
        1 => {
            let only = Point::new(line.0[0].x, line.0[0].y);
            Some(point.haversine_distance(&only))
        }
        _ => match line.haversine_closest_point(&point) {
            Closest::Intersection(closest) | Closest::SinglePoint(closest) => {
                Some(point.haversine_distance(&closest))
            }
            Closest::Indeterminate => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = distance_meters(45.0, -73.0, 46.0, -73.0);
        assert!((d - 111_195.0).abs() < 200.0, "got {}", d);
    }

    #[test]
    fn zero_distance_for_identical_points() {
        assert_eq!(distance_meters(45.5, -73.5, 45.5, -73.5), 0.0);
    }

    #[test]
    fn point_on_the_line_is_at_distance_zero() {
        let line = polyline([(45.0, -73.0), (45.0, -72.0)]);
        let d = distance_to_polyline_meters(45.0, -72.5, &line).unwrap();
        assert!(d < 1.0, "got {}", d);
    }

    #[test]
    fn point_off_the_line_measures_the_perpendicular() {
        let line = polyline([(45.0, -73.0), (45.0, -72.0)]);
        // roughly 0.01 degrees of latitude north of the segment
        let d = distance_to_polyline_meters(45.01, -72.5, &line).unwrap();
        assert!((d - 1_112.0).abs() < 30.0, "got {}", d);
    }

    #[test]
    fn empty_polyline_has_no_distance() {
        let line = polyline([]);
        assert!(distance_to_polyline_meters(45.0, -73.0, &line).is_none());
    }
}
