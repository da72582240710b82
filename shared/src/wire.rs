use serde::{Deserialize, Serialize};

use crate::{
    error::RouteError,
    model::{Coordinate, Optimization},
};

pub const STATUS_PROCESSING: &str = "processing";
pub const STATUS_COMPLETED: &str = "completed";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadMapRequest {
    pub place_name: String,
}

/// Reply of `POST /load-map`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadMapReply {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub nodes: Option<u64>,
    #[serde(default)]
    pub edges: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapStats {
    pub nodes: u64,
    pub edges: u64,
    pub message: Option<String>,
}

impl LoadMapReply {
    pub fn into_stats(self) -> Result<MapStats, RouteError> {
        if self.status.as_deref() == Some("success") {
            return Ok(MapStats {
                nodes: self.nodes.unwrap_or_default(),
                edges: self.edges.unwrap_or_default(),
                message: self.message,
            });
        }
        Err(RouteError::Server(
            self.error.unwrap_or_else(|| "Error loading the map".to_string()),
        ))
    }
}

/// One hit of the Nominatim search API. Coordinates come back as strings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeHit {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl GeocodeHit {
    pub fn coordinate(&self) -> Option<Coordinate> {
        let lat = self.lat.trim().parse::<f64>().ok()?;
        let lon = self.lon.trim().parse::<f64>().ok()?;
        Some(Coordinate::new(lat, lon))
    }
}

/// First usable coordinate of a geocoder answer.
pub fn first_geocode_match(hits: &[GeocodeHit]) -> Option<Coordinate> {
    hits.first().and_then(GeocodeHit::coordinate)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub total_distance_km: Option<f64>,
    #[serde(default)]
    pub total_time_minutes: Option<f64>,
    #[serde(default)]
    pub safety_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_safety: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Meters.
    #[serde(default)]
    pub distance: Option<f64>,
    /// Seconds.
    #[serde(default)]
    pub time: Option<f64>,
    /// km/h.
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub safety_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<[f64; 2]>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriteriaWeights {
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub time: f64,
    #[serde(default)]
    pub safety: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    #[serde(default)]
    pub optimization: Option<String>,
    #[serde(default)]
    pub heuristic: Option<String>,
    #[serde(default)]
    pub weights: Option<CriteriaWeights>,
    #[serde(default)]
    pub safety_points_count: Option<usize>,
}

impl ResultMetadata {
    /// Display label of the optimisation the server applied. Missing means
    /// balanced; an unknown name is shown as sent.
    pub fn optimization_label(&self) -> String {
        match self.optimization.as_deref() {
            None => Optimization::Balanced.label().to_string(),
            Some(raw) => raw
                .parse::<Optimization>()
                .map(|mode| mode.label().to_string())
                .unwrap_or_else(|_| raw.to_string()),
        }
    }
}

/// Loosely shaped JSON body shared by `/calculate-route` and `/route-result`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<[f64; 2]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<Segment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResultMetadata>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplyKind {
    Processing,
    Completed,
    Failed(String),
    Unrecognized,
}

/// Outcome of trying to read a Route Result out of a reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Ready(RouteResult),
    NotReady,
}

impl ServerReply {
    /// What a `404` from `/route-result` stands for.
    pub fn processing() -> Self {
        Self {
            status: Some(STATUS_PROCESSING.to_string()),
            ..Self::default()
        }
    }

    pub fn kind(&self) -> ReplyKind {
        match self.status.as_deref() {
            Some(STATUS_COMPLETED) => ReplyKind::Completed,
            _ if self.error.is_some() => {
                ReplyKind::Failed(self.error.clone().unwrap_or_default())
            }
            Some(STATUS_PROCESSING) => ReplyKind::Processing,
            _ => ReplyKind::Unrecognized,
        }
    }

    pub fn has_result(&self) -> bool {
        self.summary.is_some() && self.path.is_some() && self.segments.is_some()
    }

    pub fn decode(self) -> Result<Decoded, RouteError> {
        if let Some(error) = self.error {
            return Err(RouteError::Server(error));
        }
        match (self.summary, self.path, self.segments) {
            (Some(summary), Some(path), Some(segments)) => Ok(Decoded::Ready(RouteResult {
                summary,
                segments,
                path: path.into_iter().map(Coordinate::from).collect(),
                metadata: self.metadata.unwrap_or_default(),
            })),
            _ if self.status.as_deref() == Some(STATUS_PROCESSING) => Ok(Decoded::NotReady),
            _ => Err(RouteError::Incomplete),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    pub summary: Summary,
    pub segments: Vec<Segment>,
    pub path: Vec<Coordinate>,
    pub metadata: ResultMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply(value: serde_json::Value) -> ServerReply {
        serde_json::from_value(value).expect("reply")
    }

    #[test]
    fn classifies_server_shapes() {
        assert_eq!(
            reply(json!({"status": "processing", "task_id": "t1"})).kind(),
            ReplyKind::Processing
        );
        assert_eq!(
            reply(json!({"status": "completed", "task_id": "k"})).kind(),
            ReplyKind::Completed
        );
        assert_eq!(
            reply(json!({"error": "no path"})).kind(),
            ReplyKind::Failed("no path".into())
        );
        assert_eq!(reply(json!({"status": "weird"})).kind(), ReplyKind::Unrecognized);
    }

    #[test]
    fn decodes_completed_result() {
        let decoded = reply(json!({
            "status": "completed",
            "summary": {"total_distance_km": 1.234, "total_time_minutes": 3.5, "safety_level": "Seguro"},
            "segments": [{"distance": 120.0, "time": 8.6, "speed": 50, "safety_level": "Seguro", "safety": 1.2}],
            "path": [[19.0, -99.0], [19.1, -99.1]],
            "metadata": {"optimization": "safest", "heuristic": "manhattan", "safety_points_count": 2}
        }))
        .decode()
        .expect("decoded");

        let Decoded::Ready(result) = decoded else {
            panic!("expected a ready result");
        };
        assert_eq!(result.path, vec![Coordinate::new(19.0, -99.0), Coordinate::new(19.1, -99.1)]);
        assert_eq!(result.segments[0].speed, Some(50.0));
        assert_eq!(result.metadata.optimization_label(), "Safest");
        assert_eq!(result.metadata.safety_points_count, Some(2));
    }

    #[test]
    fn missing_parts_while_processing_is_not_ready() {
        assert_eq!(ServerReply::processing().decode(), Ok(Decoded::NotReady));
    }

    #[test]
    fn missing_parts_otherwise_is_incomplete() {
        let decoded = reply(json!({"status": "completed", "task_id": "k", "path": []})).decode();
        assert_eq!(decoded, Err(RouteError::Incomplete));
    }

    #[test]
    fn error_field_wins_over_payload() {
        let decoded = reply(json!({"error": "graph not loaded", "path": []})).decode();
        assert_eq!(decoded, Err(RouteError::Server("graph not loaded".into())));
    }

    #[test]
    fn load_map_reply_maps_to_stats() {
        let stats = reply_map(json!({"status": "success", "nodes": 120, "edges": 310, "message": "ok"}))
            .into_stats()
            .unwrap();
        assert_eq!(stats.nodes, 120);
        assert_eq!(stats.edges, 310);

        let err = reply_map(json!({"error": "place not found"})).into_stats().unwrap_err();
        assert_eq!(err, RouteError::Server("place not found".into()));
    }

    fn reply_map(value: serde_json::Value) -> LoadMapReply {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn geocode_uses_first_hit() {
        let hits: Vec<GeocodeHit> = serde_json::from_value(json!([
            {"lat": "19.954", "lon": "-99.533", "display_name": "Jilotepec"},
            {"lat": "0", "lon": "0"}
        ]))
        .unwrap();
        assert_eq!(first_geocode_match(&hits), Some(Coordinate::new(19.954, -99.533)));
        assert_eq!(first_geocode_match(&[]), None);
    }

    #[test]
    fn unknown_optimization_label_is_kept() {
        let meta = ResultMetadata {
            optimization: Some("scenic".into()),
            ..ResultMetadata::default()
        };
        assert_eq!(meta.optimization_label(), "scenic");
        assert_eq!(ResultMetadata::default().optimization_label(), "Balanced");
    }
}
