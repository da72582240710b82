pub mod error;
pub mod form;
pub mod model;
pub mod report;
pub mod task;
pub mod wire;

pub use error::RouteError;
pub use form::{RouteFields, SafetyPointFields};
pub use model::{
    Coordinate, Heuristic, Optimization, RouteBounds, RouteRequest, SafetyIndex, SafetyPoint,
    WeightPercents,
};
pub use report::{RouteReport, SegmentRow};
pub use task::{Generation, RouteTask, TaskPhase, Transition};
pub use wire::{
    GeocodeHit, LoadMapReply, LoadMapRequest, MapStats, RouteResult, ServerReply,
    first_geocode_match,
};

/// Interval between two `/route-result` requests.
pub const POLL_INTERVAL_MS: u32 = 1_000;
/// Zoom used when centring the map on a place.
pub const PLACE_ZOOM: u8 = 14;
pub const DEFAULT_CENTER: Coordinate = Coordinate {
    lat: 19.954,
    lon: -99.533,
};
