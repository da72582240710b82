//! Browser-independent state of the planner page.
//!
//! [`Planner`] owns every piece of UI state. Map side effects go through the
//! [`MapSurface`] trait, network work is handed back to the caller as
//! [`Command`]s, so the whole flow runs under `cargo test` without a browser.

use shared::{
    Coordinate, Generation, Heuristic, MapStats, Optimization, PLACE_ZOOM, RouteBounds,
    RouteError, RouteFields, RouteReport, RouteRequest, RouteResult, RouteTask, SafetyIndex,
    SafetyPointFields, ServerReply, Transition,
    form::format_coord,
    wire::LoadMapReply,
};

pub type PointId = u64;

pub const MISSING_PLACE: &str = "Please enter a place name";
pub const NO_SAFETY_POINT: &str = "Add a safety point first";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SelectionMode {
    Start,
    End,
    SafetyPoint(PointId),
}

impl SelectionMode {
    pub fn indicator(self) -> &'static str {
        match self {
            SelectionMode::Start => "Selecting start point",
            SelectionMode::End => "Selecting end point",
            SelectionMode::SafetyPoint(_) => "Selecting safety point location",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Endpoint {
    Start,
    End,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Axis {
    Lat,
    Lon,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PointField {
    Lat,
    Lon,
    Radius,
    SafetyIndex,
    Weight,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Criterion {
    Distance,
    Time,
    Safety,
}

/// The map widget as the planner sees it.
pub trait MapSurface {
    /// Creates the start/end marker or moves it.
    fn place_endpoint(&mut self, endpoint: Endpoint, at: Coordinate);
    fn remove_endpoint(&mut self, endpoint: Endpoint);
    /// Draws the marker and circle of a safety point, replacing previous ones.
    fn place_zone(&mut self, id: PointId, at: Coordinate, radius_m: f64, index: SafetyIndex);
    /// Redraws only the circle of an existing zone.
    fn resize_zone(&mut self, id: PointId, radius_m: f64, index: SafetyIndex);
    fn remove_zone(&mut self, id: PointId);
    fn draw_route(&mut self, path: &[Coordinate]);
    fn clear_route(&mut self);
    fn fit_bounds(&mut self, bounds: RouteBounds);
    fn center_on(&mut self, at: Coordinate, zoom: u8);
}

/// Network work the driver has to perform for the planner.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    LoadMap {
        place: String,
    },
    Geocode {
        place: String,
    },
    Calculate {
        generation: Generation,
        request: RouteRequest,
    },
    /// Replaces any running poll timer with one ticking for `generation`.
    StartPolling {
        generation: Generation,
        task_id: String,
    },
    FetchResult {
        generation: Generation,
        task_id: String,
    },
    StopPolling,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SafetyPointRow {
    pub id: PointId,
    pub fields: SafetyPointFields,
    placed: bool,
}

#[derive(Debug)]
pub struct Planner {
    pub form: RouteFields,
    pub place_name: String,
    rows: Vec<SafetyPointRow>,
    next_id: PointId,
    selection: Option<SelectionMode>,
    task: RouteTask,
    report: Option<RouteReport>,
    map_stats: Option<MapStats>,
    loading_place: Option<String>,
    error: Option<String>,
    loading: bool,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}

impl Planner {
    /// A fresh page: empty endpoints and one empty safety point row.
    pub fn new() -> Self {
        let mut planner = Self {
            form: RouteFields::default(),
            place_name: String::new(),
            rows: Vec::new(),
            next_id: 1,
            selection: None,
            task: RouteTask::new(),
            report: None,
            map_stats: None,
            loading_place: None,
            error: None,
            loading: false,
        };
        planner.add_safety_point();
        planner
    }

    pub fn rows(&self) -> &[SafetyPointRow] {
        &self.rows
    }

    pub fn selection(&self) -> Option<SelectionMode> {
        self.selection
    }

    pub fn report(&self) -> Option<&RouteReport> {
        self.report.as_ref()
    }

    pub fn map_stats(&self) -> Option<&MapStats> {
        self.map_stats.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[cfg(test)]
    fn is_polling(&self) -> bool {
        self.task.is_polling()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    fn show_error(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }

    // Selection mode

    pub fn enter_selection(&mut self, mode: SelectionMode) {
        if let SelectionMode::SafetyPoint(id) = mode {
            if self.row(id).is_none() {
                return;
            }
        }
        self.selection = Some(mode);
    }

    /// Targets the most recently added safety point.
    pub fn select_safety_location(&mut self) {
        match self.rows.last() {
            Some(row) => self.selection = Some(SelectionMode::SafetyPoint(row.id)),
            None => self.show_error(NO_SAFETY_POINT),
        }
    }

    pub fn cancel_selection(&mut self) {
        self.selection = None;
    }

    /// Applies a map click to the active selection mode, then leaves the mode.
    pub fn map_clicked(&mut self, at: Coordinate, map: &mut impl MapSurface) {
        let Some(mode) = self.selection.take() else {
            return;
        };
        match mode {
            SelectionMode::Start => {
                self.form.set_start(at);
                map.place_endpoint(Endpoint::Start, at);
            }
            SelectionMode::End => {
                self.form.set_end(at);
                map.place_endpoint(Endpoint::End, at);
            }
            SelectionMode::SafetyPoint(id) => {
                if let Some(row) = self.row_mut(id) {
                    row.fields.lat = format_coord(at.lat);
                    row.fields.lon = format_coord(at.lon);
                    row.placed = true;
                    map.place_zone(id, at, row.fields.radius(), row.fields.safety_index());
                }
            }
        }
    }

    pub fn edit_endpoint(
        &mut self,
        endpoint: Endpoint,
        axis: Axis,
        value: String,
        map: &mut impl MapSurface,
    ) {
        let form = &mut self.form;
        let field = match (endpoint, axis) {
            (Endpoint::Start, Axis::Lat) => &mut form.start_lat,
            (Endpoint::Start, Axis::Lon) => &mut form.start_lon,
            (Endpoint::End, Axis::Lat) => &mut form.end_lat,
            (Endpoint::End, Axis::Lon) => &mut form.end_lon,
        };
        *field = value;
        let coord = match endpoint {
            Endpoint::Start => form.start(),
            Endpoint::End => form.end(),
        };
        if let Some(coord) = coord {
            map.place_endpoint(endpoint, coord);
        }
    }

    // Settings

    pub fn set_optimization(&mut self, raw: &str) {
        if let Ok(mode) = raw.parse::<Optimization>() {
            self.form.optimization = mode;
        }
    }

    pub fn set_heuristic(&mut self, raw: &str) {
        if let Ok(heuristic) = raw.parse::<Heuristic>() {
            self.form.heuristic = heuristic;
        }
    }

    pub fn set_weight(&mut self, criterion: Criterion, raw: &str) {
        let Ok(percent) = raw.trim().parse::<u32>() else {
            return;
        };
        let percent = percent.min(100) as u8;
        let weights = &mut self.form.weights;
        match criterion {
            Criterion::Distance => weights.distance = percent,
            Criterion::Time => weights.time = percent,
            Criterion::Safety => weights.safety = percent,
        }
    }

    // Safety points

    pub fn add_safety_point(&mut self) -> PointId {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.push(SafetyPointRow {
            id,
            fields: SafetyPointFields::default(),
            placed: false,
        });
        id
    }

    pub fn remove_safety_point(&mut self, id: PointId, map: &mut impl MapSurface) {
        let Some(pos) = self.rows.iter().position(|row| row.id == id) else {
            return;
        };
        let row = self.rows.remove(pos);
        if row.placed {
            map.remove_zone(id);
        }
        if self.selection == Some(SelectionMode::SafetyPoint(id)) {
            self.selection = None;
        }
    }

    pub fn edit_safety_point(
        &mut self,
        id: PointId,
        field: PointField,
        value: String,
        map: &mut impl MapSurface,
    ) {
        let Some(row) = self.row_mut(id) else {
            return;
        };
        let fields = &mut row.fields;
        match field {
            PointField::Lat => fields.lat = value,
            PointField::Lon => fields.lon = value,
            PointField::Radius => fields.radius = value,
            PointField::SafetyIndex => fields.safety_index = value,
            PointField::Weight => fields.weight = value,
        }

        let (radius, index) = (fields.radius(), fields.safety_index());
        match field {
            PointField::Lat | PointField::Lon => match fields.coordinate() {
                Some(coord) => {
                    row.placed = true;
                    map.place_zone(id, coord, radius, index);
                }
                None if row.placed => {
                    row.placed = false;
                    map.remove_zone(id);
                }
                None => {}
            },
            PointField::Radius if row.placed => map.resize_zone(id, radius, index),
            PointField::SafetyIndex if row.placed => {
                if let Some(coord) = fields.coordinate() {
                    map.place_zone(id, coord, radius, index);
                }
            }
            _ => {}
        }
    }

    fn row(&self, id: PointId) -> Option<&SafetyPointRow> {
        self.rows.iter().find(|row| row.id == id)
    }

    fn row_mut(&mut self, id: PointId) -> Option<&mut SafetyPointRow> {
        self.rows.iter_mut().find(|row| row.id == id)
    }

    // Map loading

    pub fn load_map(&mut self) -> Vec<Command> {
        let place = self.place_name.trim();
        if place.is_empty() {
            self.show_error(MISSING_PLACE);
            return Vec::new();
        }
        self.error = None;
        self.loading_place = Some(place.to_string());
        vec![Command::LoadMap {
            place: place.to_string(),
        }]
    }

    pub fn on_map_loaded(&mut self, reply: Result<LoadMapReply, RouteError>) -> Vec<Command> {
        let place = self.loading_place.take();
        match reply.and_then(LoadMapReply::into_stats) {
            Ok(stats) => {
                self.map_stats = Some(stats);
                place
                    .map(|place| vec![Command::Geocode { place }])
                    .unwrap_or_default()
            }
            Err(err) => {
                self.show_error(err.to_string());
                Vec::new()
            }
        }
    }

    pub fn on_geocoded(&mut self, center: Option<Coordinate>, map: &mut impl MapSurface) {
        if let Some(center) = center {
            map.center_on(center, PLACE_ZOOM);
        }
    }

    // Route calculation

    /// Validates the form and starts a new calculation, cancelling the previous
    /// one. Nothing is sent when the endpoints are not numeric.
    pub fn calculate(&mut self, map: &mut impl MapSurface) -> Vec<Command> {
        let request = match self.form.to_request(self.rows.iter().map(|row| &row.fields)) {
            Ok(request) => request,
            Err(err) => {
                self.show_error(err.to_string());
                return Vec::new();
            }
        };
        self.report = None;
        self.error = None;
        self.loading = true;
        map.clear_route();

        let generation = self.task.begin();
        vec![
            Command::StopPolling,
            Command::Calculate {
                generation,
                request,
            },
        ]
    }

    pub fn on_calculated(
        &mut self,
        generation: Generation,
        reply: Result<ServerReply, RouteError>,
        map: &mut impl MapSurface,
    ) -> Vec<Command> {
        let transition = self.task.on_submitted(generation, reply);
        self.apply(transition, map)
    }

    /// One timer tick: ask for the result if this generation is still polling.
    pub fn poll_tick(&self, generation: Generation) -> Vec<Command> {
        match self.task.pending_task_id() {
            Some(task_id) if self.task.is_current(generation) && self.task.is_polling() => {
                vec![Command::FetchResult {
                    generation,
                    task_id: task_id.to_string(),
                }]
            }
            _ => Vec::new(),
        }
    }

    pub fn on_polled(
        &mut self,
        generation: Generation,
        reply: Result<ServerReply, RouteError>,
        map: &mut impl MapSurface,
    ) -> Vec<Command> {
        let transition = self.task.on_polled(generation, reply);
        self.apply(transition, map)
    }

    fn apply(&mut self, transition: Transition, map: &mut impl MapSurface) -> Vec<Command> {
        let generation = self.task.generation();
        match transition {
            Transition::Ignored | Transition::Wait => Vec::new(),
            Transition::StartPolling { task_id } => {
                vec![Command::StartPolling {
                    generation,
                    task_id,
                }]
            }
            Transition::FetchOnce { task_id } => vec![Command::FetchResult {
                generation,
                task_id,
            }],
            Transition::Completed(result) => {
                self.render(&result, map);
                vec![Command::StopPolling]
            }
            Transition::Failed(err) => {
                self.show_error(err.to_string());
                vec![Command::StopPolling]
            }
        }
    }

    fn render(&mut self, result: &RouteResult, map: &mut impl MapSurface) {
        let report = RouteReport::from(result);
        if let (Some(start), Some(end)) = (report.start(), report.end()) {
            map.draw_route(&report.path);
            if let Some(bounds) = report.bounds {
                map.fit_bounds(bounds);
            }
            map.place_endpoint(Endpoint::Start, start);
            map.place_endpoint(Endpoint::End, end);
        }
        self.loading = false;
        self.report = Some(report);
    }

    /// "New calculation": wipes route, markers, safety points and polling, then
    /// leaves one empty safety point row.
    pub fn reset(&mut self, map: &mut impl MapSurface) -> Vec<Command> {
        self.report = None;
        map.clear_route();
        map.remove_endpoint(Endpoint::Start);
        map.remove_endpoint(Endpoint::End);
        self.form.clear_endpoints();

        for row in self.rows.drain(..) {
            if row.placed {
                map.remove_zone(row.id);
            }
        }
        self.selection = None;
        self.loading = false;
        self.error = None;
        self.task.cancel();

        self.add_safety_point();
        vec![Command::StopPolling]
    }
}
