//! Raw form fields and their conversion into a [`RouteRequest`].
//!
//! Fields are kept as the strings the user typed; parsing happens once, when a
//! request is built.

use crate::{
    error::RouteError,
    model::{
        Coordinate, DEFAULT_POINT_WEIGHT, DEFAULT_RADIUS_M, Heuristic, Optimization, RouteRequest,
        SafetyIndex, SafetyPoint, WeightPercents,
    },
};

pub const MISSING_ENDPOINTS: &str = "Please select start and end points on the map";

/// Finite number or nothing.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_coordinate(lat: &str, lon: &str) -> Option<Coordinate> {
    Some(Coordinate::new(parse_number(lat)?, parse_number(lon)?))
}

/// Coordinates are written back into fields with six decimals.
pub fn format_coord(value: f64) -> String {
    format!("{value:.6}")
}

pub fn parse_radius(raw: &str) -> f64 {
    parse_number(raw)
        .filter(|r| *r > 0.0)
        .unwrap_or(DEFAULT_RADIUS_M)
}

pub fn parse_safety_index(raw: &str) -> SafetyIndex {
    raw.trim()
        .parse::<u8>()
        .ok()
        .and_then(SafetyIndex::new)
        .unwrap_or_default()
}

pub fn parse_point_weight(raw: &str) -> f64 {
    parse_number(raw)
        .map(|w| w.clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_POINT_WEIGHT)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SafetyPointFields {
    pub lat: String,
    pub lon: String,
    pub radius: String,
    pub safety_index: String,
    pub weight: String,
}

impl Default for SafetyPointFields {
    fn default() -> Self {
        Self {
            lat: String::new(),
            lon: String::new(),
            radius: "200".into(),
            safety_index: "1".into(),
            weight: "1.0".into(),
        }
    }
}

impl SafetyPointFields {
    pub fn coordinate(&self) -> Option<Coordinate> {
        parse_coordinate(&self.lat, &self.lon)
    }

    pub fn radius(&self) -> f64 {
        parse_radius(&self.radius)
    }

    pub fn safety_index(&self) -> SafetyIndex {
        parse_safety_index(&self.safety_index)
    }

    /// `None` when the row has no usable coordinates; such rows are left out of
    /// the request without an error.
    pub fn to_point(&self) -> Option<SafetyPoint> {
        let coord = self.coordinate()?;
        Some(SafetyPoint {
            lat: coord.lat,
            lon: coord.lon,
            radius: self.radius(),
            safety_index: self.safety_index(),
            weight: parse_point_weight(&self.weight),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteFields {
    pub start_lat: String,
    pub start_lon: String,
    pub end_lat: String,
    pub end_lon: String,
    pub optimization: Optimization,
    pub heuristic: Heuristic,
    pub weights: WeightPercents,
}

impl RouteFields {
    pub fn start(&self) -> Option<Coordinate> {
        parse_coordinate(&self.start_lat, &self.start_lon)
    }

    pub fn end(&self) -> Option<Coordinate> {
        parse_coordinate(&self.end_lat, &self.end_lon)
    }

    pub fn set_start(&mut self, coord: Coordinate) {
        self.start_lat = format_coord(coord.lat);
        self.start_lon = format_coord(coord.lon);
    }

    pub fn set_end(&mut self, coord: Coordinate) {
        self.end_lat = format_coord(coord.lat);
        self.end_lon = format_coord(coord.lon);
    }

    pub fn clear_endpoints(&mut self) {
        self.start_lat.clear();
        self.start_lon.clear();
        self.end_lat.clear();
        self.end_lon.clear();
    }

    pub fn to_request<'a>(
        &self,
        points: impl IntoIterator<Item = &'a SafetyPointFields>,
    ) -> Result<RouteRequest, RouteError> {
        let (Some(start), Some(end)) = (self.start(), self.end()) else {
            return Err(RouteError::validation(MISSING_ENDPOINTS));
        };
        let mut request = RouteRequest::new(start, end).with_weights(self.weights);
        request.optimization = self.optimization;
        request.heuristic = self.heuristic;
        request.safety_points = points
            .into_iter()
            .filter_map(SafetyPointFields::to_point)
            .collect();
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> RouteFields {
        RouteFields {
            start_lat: "19.954".into(),
            start_lon: "-99.533".into(),
            end_lat: "19.960".into(),
            end_lon: "-99.540".into(),
            ..RouteFields::default()
        }
    }

    fn row(lat: &str, lon: &str, radius: &str, index: &str, weight: &str) -> SafetyPointFields {
        SafetyPointFields {
            lat: lat.into(),
            lon: lon.into(),
            radius: radius.into(),
            safety_index: index.into(),
            weight: weight.into(),
        }
    }

    #[test]
    fn rejects_non_numeric_endpoints() {
        let mut form = fields();
        form.end_lon = "west".into();
        let err = form.to_request(&[]).unwrap_err();
        assert_eq!(err, RouteError::Validation(MISSING_ENDPOINTS.into()));

        let mut form = fields();
        form.start_lat.clear();
        assert!(form.to_request(&[]).unwrap_err().is_validation());
    }

    #[test]
    fn drops_rows_without_coordinates() {
        let rows = [
            row("19.955", "-99.535", "150", "4", "0.5"),
            row("", "-99.535", "150", "4", "0.5"),
            row("19.955", "abc", "150", "4", "0.5"),
        ];
        let req = fields().to_request(&rows).unwrap();
        assert_eq!(req.safety_points.len(), 1);
        assert_eq!(req.safety_points[0].radius, 150.0);
        assert_eq!(req.safety_points[0].safety_index.value(), 4);
        assert_eq!(req.safety_points[0].weight, 0.5);
    }

    #[test]
    fn defaults_missing_point_attributes() {
        let rows = [row("19.955", "-99.535", "", "", "")];
        let point = fields().to_request(&rows).unwrap().safety_points[0];
        assert_eq!(point.radius, 200.0);
        assert_eq!(point.safety_index, SafetyIndex::SAFEST);
        assert_eq!(point.weight, 1.0);
    }

    #[test]
    fn out_of_range_index_falls_back_to_safest() {
        assert_eq!(parse_safety_index("9"), SafetyIndex::SAFEST);
        assert_eq!(parse_safety_index("0"), SafetyIndex::SAFEST);
        assert_eq!(parse_safety_index(" 5 ").value(), 5);
    }

    #[test]
    fn point_weight_is_clamped() {
        assert_eq!(parse_point_weight("3"), 1.0);
        assert_eq!(parse_point_weight("-1"), 0.0);
        assert_eq!(parse_point_weight("0"), 0.0);
    }

    #[test]
    fn sliders_are_normalized() {
        let mut form = fields();
        form.weights = WeightPercents {
            distance: 50,
            time: 25,
            safety: 100,
        };
        let req = form.to_request(&[]).unwrap();
        assert_eq!(req.distance_weight, 0.5);
        assert_eq!(req.time_weight, 0.25);
        assert_eq!(req.safety_weight, 1.0);
    }

    #[test]
    fn coordinates_round_trip_through_fields() {
        let mut form = RouteFields::default();
        form.set_start(Coordinate::new(19.1234567, -99.7654321));
        assert_eq!(form.start_lat, "19.123457");
        assert_eq!(form.start_lon, "-99.765432");
        assert!(form.start().is_some());
    }

    #[test]
    fn nan_is_not_a_number() {
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number(" 12.5 "), Some(12.5));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn valid_row() -> impl Strategy<Value = SafetyPointFields> {
            (-90.0f64..=90.0, -180.0f64..=180.0, "[0-9]{0,4}", "[0-9]?", "[0-9.]{0,3}").prop_map(
                |(lat, lon, radius, index, weight)| SafetyPointFields {
                    lat: format_coord(lat),
                    lon: format_coord(lon),
                    radius,
                    safety_index: index,
                    weight,
                },
            )
        }

        fn broken_row() -> impl Strategy<Value = SafetyPointFields> {
            ("[a-z]{0,5}", -180.0f64..=180.0).prop_map(|(lat, lon)| SafetyPointFields {
                lat,
                lon: format_coord(lon),
                ..SafetyPointFields::default()
            })
        }

        proptest! {
            #[test]
            fn prop_only_rows_with_coordinates_are_sent(
                valid in prop::collection::vec(valid_row(), 0..6),
                broken in prop::collection::vec(broken_row(), 0..6)
            ) {
                let rows: Vec<_> = valid.iter().chain(broken.iter()).cloned().collect();
                let req = fields().to_request(&rows).unwrap();
                prop_assert_eq!(req.safety_points.len(), valid.len());
            }

            #[test]
            fn prop_point_attributes_stay_in_range(row in valid_row()) {
                let point = row.to_point().expect("valid coordinates");
                prop_assert!(point.radius > 0.0);
                prop_assert!((1..=5).contains(&point.safety_index.value()));
                prop_assert!((0.0..=1.0).contains(&point.weight));
            }
        }
    }
}
