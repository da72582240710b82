mod controller;
mod map;
mod view;

use seed::{
    browser::fetch::{FetchError, Response},
    prelude::*,
};
use serde::Deserialize;
use shared::{
    Coordinate, DEFAULT_CENTER, GeocodeHit, Generation, LoadMapReply, LoadMapRequest,
    PLACE_ZOOM, POLL_INTERVAL_MS, RouteError, RouteRequest, ServerReply, first_geocode_match,
};
use wasm_bindgen::{JsCast, prelude::wasm_bindgen};

use controller::{Axis, Command, Criterion, Endpoint, Planner, PointField, PointId, SelectionMode};
use map::LeafletMap;

fn api_root() -> String {
    // Empty means same origin as the page.
    option_env!("FRONTEND_API_ROOT")
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_default()
}

fn geocoder_root() -> String {
    if let Some(url) = option_env!("FRONTEND_GEOCODER_URL") {
        return url.trim_end_matches('/').to_string();
    }
    "https://nominatim.openstreetmap.org".to_string()
}

fn endpoint(path: &str) -> String {
    format!("{}{path}", api_root())
}

const FETCH_FAILED: &str = "request failed";

fn debug(message: &str) {
    web_sys::console::debug_1(&format!("[frontend] {message}").into());
}

pub struct Model {
    planner: Planner,
    map: LeafletMap,
    /// Dropping the handle stops the poll timer.
    poll: Option<StreamHandle>,
}

pub enum Msg {
    PlaceNameChanged(String),
    LoadMap,
    MapLoaded(Result<LoadMapReply, RouteError>),
    Geocoded(Option<Coordinate>),
    EndpointChanged(Endpoint, Axis, String),
    SetSelection(SelectionMode),
    SelectSafetyLocation,
    CancelSelection,
    MapClicked { lat: f64, lon: f64 },
    OptimizationChanged(String),
    HeuristicChanged(String),
    WeightChanged(Criterion, String),
    AddSafetyPoint,
    RemoveSafetyPoint(PointId),
    SafetyPointEdited(PointId, PointField, String),
    Calculate,
    RouteSubmitted(Generation, Result<ServerReply, RouteError>),
    PollTick(Generation),
    RoutePolled(Generation, Result<ServerReply, RouteError>),
    NewCalculation,
    DismissError,
}

pub fn init(_: Url, orders: &mut impl Orders<Msg>) -> Model {
    orders.stream(streams::window_event(Ev::from("map-click"), |event| {
        let event = event.dyn_into::<web_sys::CustomEvent>().ok()?;
        let payload: MapClickPayload = serde_wasm_bindgen::from_value(event.detail()).ok()?;
        Some(Msg::MapClicked {
            lat: payload.lat,
            lon: payload.lon,
        })
    }));

    Model {
        planner: Planner::new(),
        map: LeafletMap::init(DEFAULT_CENTER, PLACE_ZOOM),
        poll: None,
    }
}

pub fn update(msg: Msg, model: &mut Model, orders: &mut impl Orders<Msg>) {
    let planner = &mut model.planner;
    let map = &mut model.map;
    let commands = match msg {
        Msg::PlaceNameChanged(val) => {
            planner.place_name = val;
            Vec::new()
        }
        Msg::LoadMap => planner.load_map(),
        Msg::MapLoaded(reply) => planner.on_map_loaded(reply),
        Msg::Geocoded(center) => {
            planner.on_geocoded(center, map);
            Vec::new()
        }
        Msg::EndpointChanged(endpoint, axis, val) => {
            planner.edit_endpoint(endpoint, axis, val, map);
            Vec::new()
        }
        Msg::SetSelection(mode) => {
            planner.enter_selection(mode);
            Vec::new()
        }
        Msg::SelectSafetyLocation => {
            planner.select_safety_location();
            Vec::new()
        }
        Msg::CancelSelection => {
            planner.cancel_selection();
            Vec::new()
        }
        Msg::MapClicked { lat, lon } => {
            debug(&format!(
                "MapClicked mode={:?} lat={lat:.5} lon={lon:.5}",
                planner.selection()
            ));
            planner.map_clicked(Coordinate::new(lat, lon), map);
            Vec::new()
        }
        Msg::OptimizationChanged(val) => {
            planner.set_optimization(&val);
            Vec::new()
        }
        Msg::HeuristicChanged(val) => {
            planner.set_heuristic(&val);
            Vec::new()
        }
        Msg::WeightChanged(criterion, val) => {
            planner.set_weight(criterion, &val);
            Vec::new()
        }
        Msg::AddSafetyPoint => {
            planner.add_safety_point();
            Vec::new()
        }
        Msg::RemoveSafetyPoint(id) => {
            planner.remove_safety_point(id, map);
            Vec::new()
        }
        Msg::SafetyPointEdited(id, field, val) => {
            planner.edit_safety_point(id, field, val, map);
            Vec::new()
        }
        Msg::Calculate => planner.calculate(map),
        Msg::RouteSubmitted(generation, reply) => planner.on_calculated(generation, reply, map),
        Msg::PollTick(generation) => planner.poll_tick(generation),
        Msg::RoutePolled(generation, reply) => planner.on_polled(generation, reply, map),
        Msg::NewCalculation => planner.reset(map),
        Msg::DismissError => {
            planner.dismiss_error();
            Vec::new()
        }
    };
    run(commands, model, orders);
}

fn run(commands: Vec<Command>, model: &mut Model, orders: &mut impl Orders<Msg>) {
    for command in commands {
        match command {
            Command::LoadMap { place } => {
                orders.perform_cmd(async move { Msg::MapLoaded(send_load_map(place).await) });
            }
            Command::Geocode { place } => {
                orders.perform_cmd(async move { Msg::Geocoded(geocode(&place).await) });
            }
            Command::Calculate {
                generation,
                request,
            } => {
                orders.perform_cmd(async move {
                    Msg::RouteSubmitted(generation, send_route_request(&request).await)
                });
            }
            Command::StartPolling {
                generation,
                task_id,
            } => {
                debug(&format!("polling task {task_id} (generation {})", generation.value()));
                model.poll = Some(orders.stream_with_handle(streams::interval(
                    POLL_INTERVAL_MS,
                    move || Msg::PollTick(generation),
                )));
            }
            Command::FetchResult {
                generation,
                task_id,
            } => {
                orders.perform_cmd(async move {
                    Msg::RoutePolled(generation, fetch_route_result(&task_id).await)
                });
            }
            Command::StopPolling => model.poll = None,
        }
    }
}

/// The full detail goes to the console; the banner gets a short message.
fn fetch_error(err: FetchError) -> RouteError {
    web_sys::console::error_1(&format!("[frontend] request failed: {err:?}").into());
    RouteError::transport(FETCH_FAILED)
}

/// Reads a `/calculate-route` or `/route-result` answer. A non-2xx reply that
/// still carries an `error` field surfaces that message.
async fn read_reply(response: Response, pending_on_404: bool) -> Result<ServerReply, RouteError> {
    let code = response.status().code;
    if pending_on_404 && code == 404 {
        return Ok(ServerReply::processing());
    }
    let success = (200..300).contains(&code);
    match response.json::<ServerReply>().await {
        Ok(reply) if success => Ok(reply),
        Ok(ServerReply {
            error: Some(message),
            ..
        }) => Err(RouteError::Server(message)),
        Err(err) if success => Err(fetch_error(err)),
        _ => Err(RouteError::transport(format!("status {code}"))),
    }
}

async fn send_route_request(payload: &RouteRequest) -> Result<ServerReply, RouteError> {
    debug(&format!(
        "sending route request start=({:.5},{:.5}) end=({:.5},{:.5}) safety_points={}",
        payload.start_lat,
        payload.start_lon,
        payload.end_lat,
        payload.end_lon,
        payload.safety_points.len()
    ));
    let response = Request::new(endpoint("/calculate-route"))
        .method(Method::Post)
        .json(payload)
        .map_err(fetch_error)?
        .fetch()
        .await
        .map_err(fetch_error)?;
    read_reply(response, false).await
}

async fn fetch_route_result(task_id: &str) -> Result<ServerReply, RouteError> {
    let task_id = String::from(js_sys::encode_uri_component(task_id));
    let response = Request::new(endpoint(&format!("/route-result/{task_id}")))
        .fetch()
        .await
        .map_err(fetch_error)?;
    read_reply(response, true).await
}

async fn send_load_map(place_name: String) -> Result<LoadMapReply, RouteError> {
    debug(&format!("loading map for {place_name:?}"));
    let body = LoadMapRequest { place_name };
    Request::new(endpoint("/load-map"))
        .method(Method::Post)
        .json(&body)
        .map_err(fetch_error)?
        .fetch()
        .await
        .map_err(fetch_error)?
        .json::<LoadMapReply>()
        .await
        .map_err(fetch_error)
}

async fn fetch_geocode(url: String) -> Result<Vec<GeocodeHit>, FetchError> {
    Request::new(url)
        .fetch()
        .await?
        .check_status()?
        .json::<Vec<GeocodeHit>>()
        .await
}

/// Geocoding failures only leave the map where it is.
async fn geocode(place: &str) -> Option<Coordinate> {
    let query = String::from(js_sys::encode_uri_component(place));
    let url = format!("{}/search?format=json&q={query}", geocoder_root());
    match fetch_geocode(url).await {
        Ok(hits) => first_geocode_match(&hits),
        Err(err) => {
            web_sys::console::error_1(&format!("[frontend] geocoding failed: {err:?}").into());
            None
        }
    }
}

fn view(model: &Model) -> Node<Msg> {
    view::view(&model.planner)
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    App::start("app", init, update, view);
}

#[derive(Deserialize)]
struct MapClickPayload {
    lat: f64,
    lon: f64,
}
