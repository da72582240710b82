use serde_wasm_bindgen::to_value;
use shared::{Coordinate, RouteBounds, SafetyIndex};
use wasm_bindgen::prelude::{JsValue, wasm_bindgen};

use crate::controller::{Endpoint, MapSurface, PointId};

#[wasm_bindgen(module = "/leaflet_map.js")]
extern "C" {
    #[wasm_bindgen(js_name = initMap)]
    fn init_map_js(lat: f64, lon: f64, zoom: u8);
    #[wasm_bindgen(js_name = setEndpoint)]
    fn set_endpoint_js(kind: &str, lat: f64, lon: f64);
    #[wasm_bindgen(js_name = removeEndpoint)]
    fn remove_endpoint_js(kind: &str);
    #[wasm_bindgen(js_name = setSafetyZone)]
    fn set_safety_zone_js(
        id: &str,
        lat: f64,
        lon: f64,
        radius: f64,
        level: u8,
        color: &str,
        fill: &str,
    );
    #[wasm_bindgen(js_name = resizeSafetyZone)]
    fn resize_safety_zone_js(id: &str, radius: f64, level: u8, color: &str, fill: &str);
    #[wasm_bindgen(js_name = removeSafetyZone)]
    fn remove_safety_zone_js(id: &str);
    #[wasm_bindgen(js_name = drawRoute)]
    fn draw_route_js(coords: JsValue);
    #[wasm_bindgen(js_name = clearRoute)]
    fn clear_route_js();
    #[wasm_bindgen(js_name = fitBounds)]
    fn fit_bounds_js(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64);
    #[wasm_bindgen(js_name = setView)]
    fn set_view_js(lat: f64, lon: f64, zoom: u8);
}

/// Leaflet map living in `#map`, driven through `leaflet_map.js`.
#[derive(Debug, Default)]
pub struct LeafletMap;

impl LeafletMap {
    pub fn init(center: Coordinate, zoom: u8) -> Self {
        init_map_js(center.lat, center.lon, zoom);
        Self
    }
}

fn endpoint_kind(endpoint: Endpoint) -> &'static str {
    match endpoint {
        Endpoint::Start => "start",
        Endpoint::End => "end",
    }
}

impl MapSurface for LeafletMap {
    fn place_endpoint(&mut self, endpoint: Endpoint, at: Coordinate) {
        set_endpoint_js(endpoint_kind(endpoint), at.lat, at.lon);
    }

    fn remove_endpoint(&mut self, endpoint: Endpoint) {
        remove_endpoint_js(endpoint_kind(endpoint));
    }

    fn place_zone(&mut self, id: PointId, at: Coordinate, radius_m: f64, index: SafetyIndex) {
        let (color, fill) = index.colors();
        set_safety_zone_js(
            &id.to_string(),
            at.lat,
            at.lon,
            radius_m,
            index.value(),
            color,
            fill,
        );
    }

    fn resize_zone(&mut self, id: PointId, radius_m: f64, index: SafetyIndex) {
        let (color, fill) = index.colors();
        resize_safety_zone_js(&id.to_string(), radius_m, index.value(), color, fill);
    }

    fn remove_zone(&mut self, id: PointId) {
        remove_safety_zone_js(&id.to_string());
    }

    fn draw_route(&mut self, path: &[Coordinate]) {
        if let Ok(value) = to_value(path) {
            draw_route_js(value);
        }
    }

    fn clear_route(&mut self) {
        clear_route_js();
    }

    fn fit_bounds(&mut self, bounds: RouteBounds) {
        fit_bounds_js(bounds.min_lat, bounds.min_lon, bounds.max_lat, bounds.max_lon);
    }

    fn center_on(&mut self, at: Coordinate, zoom: u8) {
        set_view_js(at.lat, at.lon, zoom);
    }
}
