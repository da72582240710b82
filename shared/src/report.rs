use crate::{
    model::{Coordinate, RouteBounds},
    wire::RouteResult,
};

const UNKNOWN_LEVEL: &str = "Unknown";

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRow {
    pub title: String,
    pub distance: String,
    pub time: String,
    pub speed: String,
    pub safety_level: String,
}

/// Everything the result panel and the map need, already formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteReport {
    pub distance: String,
    pub time: String,
    pub safety_level: String,
    pub optimization: String,
    pub segments: Vec<SegmentRow>,
    pub details: Vec<(&'static str, String)>,
    pub path: Vec<Coordinate>,
    pub bounds: Option<RouteBounds>,
}

impl RouteReport {
    pub fn start(&self) -> Option<Coordinate> {
        self.path.first().copied()
    }

    pub fn end(&self) -> Option<Coordinate> {
        self.path.last().copied()
    }

    pub fn has_path(&self) -> bool {
        !self.path.is_empty()
    }
}

impl From<&RouteResult> for RouteReport {
    fn from(result: &RouteResult) -> Self {
        let summary = &result.summary;
        let segments = result
            .segments
            .iter()
            .enumerate()
            .map(|(idx, segment)| SegmentRow {
                title: format!("Segment {}", idx + 1),
                distance: format!("{:.0} m", segment.distance.unwrap_or_default()),
                time: format!("{:.1} s", segment.time.unwrap_or_default()),
                speed: format!("{:.0} km/h", segment.speed.unwrap_or_default()),
                safety_level: level_or_unknown(segment.safety_level.as_deref()),
            })
            .collect();

        let meta = &result.metadata;
        let mut details = Vec::new();
        if let Some(heuristic) = &meta.heuristic {
            details.push(("Heuristic", heuristic.clone()));
        }
        if let Some(weights) = &meta.weights {
            details.push((
                "Weights",
                format!(
                    "distance {:.0}% / time {:.0}% / safety {:.0}%",
                    weights.distance * 100.0,
                    weights.time * 100.0,
                    weights.safety * 100.0
                ),
            ));
        }
        if let Some(count) = meta.safety_points_count {
            details.push(("Safety points", count.to_string()));
        }
        if let Some(speed) = summary.avg_speed {
            details.push(("Average speed", format!("{speed:.1} km/h")));
        }
        if let Some(seconds) = summary.processing_time {
            details.push(("Computed in", format!("{seconds:.2} s")));
        }

        Self {
            distance: format!("{:.2} km", summary.total_distance_km.unwrap_or_default()),
            time: format!("{:.1} min", summary.total_time_minutes.unwrap_or_default()),
            safety_level: level_or_unknown(summary.safety_level.as_deref()),
            optimization: meta.optimization_label(),
            segments,
            details,
            bounds: RouteBounds::from_path(&result.path),
            path: result.path.clone(),
        }
    }
}

fn level_or_unknown(level: Option<&str>) -> String {
    level
        .filter(|l| !l.is_empty())
        .unwrap_or(UNKNOWN_LEVEL)
        .to_string()
}
