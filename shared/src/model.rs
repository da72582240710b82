use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub const DEFAULT_RADIUS_M: f64 = 200.0;
pub const DEFAULT_POINT_WEIGHT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([lat, lon]: [f64; 2]) -> Self {
        Self { lat, lon }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl RouteBounds {
    /// Smallest box holding every point of `path`, `None` when the path is empty.
    pub fn from_path(path: &[Coordinate]) -> Option<Self> {
        let first = path.first()?;
        let init = Self {
            min_lat: first.lat,
            max_lat: first.lat,
            min_lon: first.lon,
            max_lon: first.lon,
        };
        Some(path.iter().skip(1).fold(init, |acc, c| Self {
            min_lat: acc.min_lat.min(c.lat),
            max_lat: acc.max_lat.max(c.lat),
            min_lon: acc.min_lon.min(c.lon),
            max_lon: acc.max_lon.max(c.lon),
        }))
    }

    pub fn contains(&self, c: Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&c.lat)
            && (self.min_lon..=self.max_lon).contains(&c.lon)
    }
}

/// Risk severity of a safety point, 1 (safest) to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SafetyIndex(u8);

impl SafetyIndex {
    pub const SAFEST: Self = Self(1);
    pub const ALL: [Self; 5] = [Self(1), Self(2), Self(3), Self(4), Self(5)];

    pub fn new(value: u8) -> Option<Self> {
        (1..=5).contains(&value).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Marker/stroke colour and circle fill colour.
    pub fn colors(self) -> (&'static str, &'static str) {
        match self.0 {
            1 => ("#2ecc71", "#d5f5e3"),
            2 => ("#27ae60", "#a3e4d7"),
            3 => ("#f39c12", "#fdebd0"),
            4 => ("#e74c3c", "#fadbd8"),
            _ => ("#c0392b", "#f5b7b1"),
        }
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Very safe",
            2 => "Safe",
            3 => "Moderate",
            4 => "Unsafe",
            _ => "Very unsafe",
        }
    }
}

impl Default for SafetyIndex {
    fn default() -> Self {
        Self::SAFEST
    }
}

impl TryFrom<u8> for SafetyIndex {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("safety index {value} is outside 1-5"))
    }
}

impl From<SafetyIndex> for u8 {
    fn from(index: SafetyIndex) -> Self {
        index.0
    }
}

impl fmt::Display for SafetyIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafetyPoint {
    pub lat: f64,
    pub lon: f64,
    pub radius: f64,
    pub safety_index: SafetyIndex,
    pub weight: f64,
}

impl SafetyPoint {
    pub fn at(coord: Coordinate) -> Self {
        Self {
            lat: coord.lat,
            lon: coord.lon,
            radius: DEFAULT_RADIUS_M,
            safety_index: SafetyIndex::default(),
            weight: DEFAULT_POINT_WEIGHT,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Optimization {
    #[default]
    Balanced,
    Shortest,
    Fastest,
    Safest,
}

impl Optimization {
    pub const ALL: [Self; 4] = [Self::Balanced, Self::Shortest, Self::Fastest, Self::Safest];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Shortest => "shortest",
            Self::Fastest => "fastest",
            Self::Safest => "safest",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Balanced => "Balanced",
            Self::Shortest => "Shortest",
            Self::Fastest => "Fastest",
            Self::Safest => "Safest",
        }
    }

    /// Only the balanced mode mixes the three weights.
    pub fn uses_weights(self) -> bool {
        self == Self::Balanced
    }
}

impl FromStr for Optimization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| format!("unknown optimization mode `{s}`"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Heuristic {
    #[default]
    Euclidean,
    Manhattan,
}

impl Heuristic {
    pub const ALL: [Self; 2] = [Self::Euclidean, Self::Manhattan];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::Manhattan => "manhattan",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Euclidean => "Euclidean",
            Self::Manhattan => "Manhattan",
        }
    }
}

impl FromStr for Heuristic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|h| h.as_str() == s)
            .ok_or_else(|| format!("unknown heuristic `{s}`"))
    }
}

/// Slider positions for the three criteria, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightPercents {
    pub distance: u8,
    pub time: u8,
    pub safety: u8,
}

impl Default for WeightPercents {
    fn default() -> Self {
        Self {
            distance: 40,
            time: 30,
            safety: 30,
        }
    }
}

impl WeightPercents {
    pub fn normalized(self) -> (f64, f64, f64) {
        let norm = |p: u8| f64::from(p.min(100)) / 100.0;
        (norm(self.distance), norm(self.time), norm(self.safety))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub start_lat: f64,
    pub start_lon: f64,
    pub end_lat: f64,
    pub end_lon: f64,
    pub optimization: Optimization,
    pub heuristic: Heuristic,
    pub distance_weight: f64,
    pub time_weight: f64,
    pub safety_weight: f64,
    #[serde(default)]
    pub safety_points: Vec<SafetyPoint>,
}

impl RouteRequest {
    pub fn new(start: Coordinate, end: Coordinate) -> Self {
        let (distance_weight, time_weight, safety_weight) = WeightPercents::default().normalized();
        Self {
            start_lat: start.lat,
            start_lon: start.lon,
            end_lat: end.lat,
            end_lon: end.lon,
            optimization: Optimization::default(),
            heuristic: Heuristic::default(),
            distance_weight,
            time_weight,
            safety_weight,
            safety_points: Vec::new(),
        }
    }

    pub fn with_weights(mut self, weights: WeightPercents) -> Self {
        (self.distance_weight, self.time_weight, self.safety_weight) = weights.normalized();
        self
    }

    pub fn start(&self) -> Coordinate {
        Coordinate::new(self.start_lat, self.start_lon)
    }

    pub fn end(&self) -> Coordinate {
        Coordinate::new(self.end_lat, self.end_lon)
    }
}
