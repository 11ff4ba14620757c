use crate::error::{Error, Result};
use geo::algorithm::geodesic_destination::GeodesicDestination;
use tracing::trace;

/// A point of interest laid out relative to the center: a bearing measured
/// clockwise from true north and a distance along it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoiDef {
    pub name: &'static str,
    pub bearing_deg: f64,
    pub distance_m: f64,
}

impl PoiDef {
    const fn new(name: &'static str, bearing_deg: f64, distance_m: f64) -> Self {
        Self {
            name,
            bearing_deg,
            distance_m,
        }
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }
}

/// Three rays 120° apart, each with a start marker at 5 m and an end marker at 30 m.
pub const POI_TABLE: &[PoiDef] = &[
    PoiDef::new("P1S", 360.0, 5.0),
    PoiDef::new("P2S", 120.0, 5.0),
    PoiDef::new("P3S", 240.0, 5.0),
    PoiDef::new("P1E", 360.0, 30.0),
    PoiDef::new("P2E", 120.0, 30.0),
    PoiDef::new("P3E", 240.0, 30.0),
];

#[derive(Clone, Debug, PartialEq)]
pub struct NamedPoint {
    pub point: geo::Point,
    pub name: String,
}

impl NamedPoint {
    pub fn new(point: geo::Point, name: String) -> Self {
        Self { point, name }
    }

    /// Longitude.
    pub fn x(&self) -> f64 {
        self.point.x()
    }

    /// Latitude.
    pub fn y(&self) -> f64 {
        self.point.y()
    }
}

/// Projects every entry of `table` from `center`, rotating each bearing by the
/// magnetic declination (positive east).
///
/// The adjusted bearing is handed to the geodesic solver as-is, so values
/// outside `[0, 360)` are left for the solver to normalize. One result per
/// table entry, in table order; any failure rejects the whole set.
pub fn project(
    center: geo::Point,
    declination_deg: f64,
    table: &[PoiDef],
) -> Result<Vec<NamedPoint>> {
    check_center(center)?;
    if !declination_deg.is_finite() {
        return Err(Error::InvalidCoordinate {
            lat: center.y(),
            lon: center.x(),
            reason: "declination is not a finite number",
        });
    }

    let mut results = Vec::with_capacity(table.len());
    for poi in table {
        let bearing = poi.bearing_deg + declination_deg;
        let point = center.geodesic_destination(bearing, poi.distance_m);
        trace!(
            "{}: bearing {}° ({}° + {}°), {} km -> ({}, {})",
            poi.name,
            bearing,
            poi.bearing_deg,
            declination_deg,
            poi.distance_km(),
            point.y(),
            point.x()
        );
        results.push(NamedPoint::new(point, poi.name.to_string()));
    }

    Ok(results)
}

fn check_center(center: geo::Point) -> Result<()> {
    let (lat, lon) = (center.y(), center.x());
    let reason = if !lat.is_finite() || !lon.is_finite() {
        "coordinates must be finite numbers"
    } else if !(-90.0..=90.0).contains(&lat) {
        "latitude must be in the [-90, 90] range"
    } else {
        return Ok(());
    };
    Err(Error::InvalidCoordinate { lat, lon, reason })
}

#[cfg(test)]
mod test {
    use super::*;
    use geo::{GeodesicBearing, GeodesicDistance, Point};

    const TOL_DEG: f64 = 1e-6;

    fn angle_diff(a: f64, b: f64) -> f64 {
        ((a - b + 540.0).rem_euclid(360.0) - 180.0).abs()
    }

    fn find<'a>(results: &'a [NamedPoint], name: &str) -> &'a NamedPoint {
        results.iter().find(|p| p.name == name).unwrap()
    }

    #[test]
    fn one_result_per_table_entry_in_order() {
        let center = Point::new(-93.0, 45.0);
        let results = project(center, -1.25, POI_TABLE).unwrap();
        let names = results.iter().map(|p| p.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["P1S", "P2S", "P3S", "P1E", "P2E", "P3E"]);
    }

    #[test]
    fn five_meters_north() {
        let center = Point::new(-93.0, 45.0);
        let results = project(center, 0.0, POI_TABLE).unwrap();
        let p1s = find(&results, "P1S");
        assert!((p1s.y() - 45.000045).abs() < TOL_DEG, "lat = {}", p1s.y());
        assert!((p1s.x() - -93.0).abs() < TOL_DEG, "lon = {}", p1s.x());
        assert!(p1s.y() > 45.0);
    }

    #[test]
    fn matches_direct_geodesic_projection() {
        let center = Point::new(-84.151764, 39.603480);
        let results = project(center, 0.0, POI_TABLE).unwrap();
        for (poi, result) in POI_TABLE.iter().zip(&results) {
            let expected = center.geodesic_destination(poi.bearing_deg, poi.distance_m);
            assert!((result.x() - expected.x()).abs() < TOL_DEG);
            assert!((result.y() - expected.y()).abs() < TOL_DEG);
        }
    }

    #[test]
    fn inverse_recovers_bearing_and_distance() {
        let center = Point::new(151.2093, -33.8688);
        let results = project(center, 0.0, POI_TABLE).unwrap();
        for (poi, result) in POI_TABLE.iter().zip(&results) {
            let dist = center.geodesic_distance(&result.point);
            let bearing = center.geodesic_bearing(result.point);
            assert!((dist - poi.distance_m).abs() < 1e-6, "{}: {dist} m", poi.name);
            assert!(
                angle_diff(bearing, poi.bearing_deg) < TOL_DEG,
                "{}: bearing {bearing}",
                poi.name
            );
        }
    }

    #[test]
    fn declination_rotates_bearings() {
        let center = Point::new(-93.0, 45.0);
        let declination = 7.5;
        let rotated = POI_TABLE
            .iter()
            .map(|p| PoiDef::new(p.name, p.bearing_deg + declination, p.distance_m))
            .collect::<Vec<_>>();

        let with_decl = project(center, declination, POI_TABLE).unwrap();
        let pre_rotated = project(center, 0.0, &rotated).unwrap();
        assert_eq!(with_decl.len(), pre_rotated.len());
        for (a, b) in with_decl.iter().zip(&pre_rotated) {
            assert_eq!(a.name, b.name);
            assert!((a.x() - b.x()).abs() < 1e-12);
            assert!((a.y() - b.y()).abs() < 1e-12);
        }
    }

    #[test]
    fn start_and_end_markers_share_a_ray() {
        let center = Point::new(-93.0, 45.0);
        let results = project(center, 3.0, POI_TABLE).unwrap();
        for (start, end) in [("P1S", "P1E"), ("P2S", "P2E"), ("P3S", "P3E")] {
            let start = find(&results, start);
            let end = find(&results, end);
            let start_bearing = center.geodesic_bearing(start.point);
            let end_bearing = center.geodesic_bearing(end.point);
            assert!(angle_diff(start_bearing, end_bearing) < TOL_DEG);

            let start_dist = center.geodesic_distance(&start.point);
            let end_dist = center.geodesic_distance(&end.point);
            assert!((start_dist - 5.0).abs() < 1e-6);
            assert!((end_dist - 30.0).abs() < 1e-6);
        }
    }

    #[test]
    fn unnormalized_bearing_passes_through() {
        // 360 + 5 lands on the same ray as 5.
        let center = Point::new(10.0, 60.0);
        let wrapped = project(center, 5.0, &POI_TABLE[..1]).unwrap();
        let plain = center.geodesic_destination(5.0, 5.0);
        assert!((wrapped[0].x() - plain.x()).abs() < 1e-9);
        assert!((wrapped[0].y() - plain.y()).abs() < 1e-9);

        // 240 - 250 goes negative.
        let negative = project(center, -250.0, &POI_TABLE[2..3]).unwrap();
        let plain = center.geodesic_destination(350.0, 5.0);
        assert!((negative[0].x() - plain.x()).abs() < 1e-9);
        assert!((negative[0].y() - plain.y()).abs() < 1e-9);
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        let err = project(Point::new(0.0, 91.0), 0.0, POI_TABLE).unwrap_err();
        assert!(matches!(err, Error::InvalidCoordinate { lat, .. } if lat == 91.0));
    }

    #[test]
    fn rejects_non_finite_input() {
        assert!(project(Point::new(f64::NAN, 45.0), 0.0, POI_TABLE).is_err());
        assert!(project(Point::new(-93.0, 45.0), f64::INFINITY, POI_TABLE).is_err());
    }

    #[test]
    fn longitude_outside_range_wraps() {
        let wrapped = project(Point::new(267.0, 45.0), 0.0, POI_TABLE).unwrap();
        let plain = project(Point::new(-93.0, 45.0), 0.0, POI_TABLE).unwrap();
        for (a, b) in wrapped.iter().zip(&plain) {
            assert!(angle_diff(a.x(), b.x()) < 1e-9);
            assert!((a.y() - b.y()).abs() < 1e-9);
        }
    }

    #[test]
    fn distance_in_kilometers() {
        assert_eq!(POI_TABLE[0].distance_km(), 0.005);
        assert_eq!(POI_TABLE[3].distance_km(), 0.03);
    }
}
