use seed::{prelude::*, virtual_dom::AtValue, *};
use shared::{Heuristic, Optimization, RouteReport, SafetyIndex, SegmentRow};

use crate::{
    Msg,
    controller::{Axis, Criterion, Endpoint, Planner, PointField, SafetyPointRow, SelectionMode},
};

pub fn view(planner: &Planner) -> Node<Msg> {
    let header = h1!["Safe route planner"];
    div![
        C!["app-container"],
        header,
        view_selection_indicator(planner),
        view_controls(planner),
        view_status(planner),
        view_results(planner),
    ]
}

fn view_selection_indicator(planner: &Planner) -> Node<Msg> {
    match planner.selection() {
        Some(mode) => div![
            C!["selecting-mode"],
            mode.indicator(),
            button![
                "Cancel",
                ev(Ev::Click, |event| {
                    event.prevent_default();
                    Msg::CancelSelection
                }),
            ],
        ],
        None => empty![],
    }
}

fn input_field(label: &str, value: &str, msg: impl FnOnce(String) -> Msg + Clone + 'static) -> Node<Msg> {
    div![
        C!["input-field"],
        label![label],
        input![
            attrs! {
                At::Value => value,
                At::AutoComplete => "off",
                At::SpellCheck => "false",
            },
            input_ev(Ev::Input, msg),
        ]
    ]
}

fn action_button(text: &str, msg: impl FnOnce() -> Msg + Clone + 'static) -> Node<Msg> {
    button![
        text,
        ev(Ev::Click, move |event| {
            event.prevent_default();
            msg()
        }),
    ]
}

fn view_controls(planner: &Planner) -> Node<Msg> {
    form![
        C!["controls"],
        view_map_loader(planner),
        view_endpoints(planner),
        view_settings(planner),
        view_safety_points(planner),
        div![
            C!["actions"],
            button![
                "Calculate route",
                ev(Ev::Click, |event| {
                    event.prevent_default();
                    Msg::Calculate
                }),
                attrs! { At::Disabled => bool_attr(planner.is_loading()) },
            ],
            action_button("New calculation", || Msg::NewCalculation),
        ],
    ]
}

fn view_map_loader(planner: &Planner) -> Node<Msg> {
    let stats = match planner.map_stats() {
        Some(stats) => div![
            C!["map-stats"],
            span![format!("Nodes: {}", stats.nodes)],
            span![format!("Edges: {}", stats.edges)],
            stats.message.as_ref().map(|message| small![message]),
        ],
        None => empty![],
    };

    fieldset![
        legend!["Map"],
        input_field("Place", &planner.place_name, Msg::PlaceNameChanged),
        action_button("Load map", || Msg::LoadMap),
        stats,
    ]
}

fn view_endpoints(planner: &Planner) -> Node<Msg> {
    let form = &planner.form;
    fieldset![
        legend!["Points"],
        input_field("Start latitude", &form.start_lat, |v| {
            Msg::EndpointChanged(Endpoint::Start, Axis::Lat, v)
        }),
        input_field("Start longitude", &form.start_lon, |v| {
            Msg::EndpointChanged(Endpoint::Start, Axis::Lon, v)
        }),
        action_button("Set start on map", || Msg::SetSelection(SelectionMode::Start)),
        input_field("End latitude", &form.end_lat, |v| {
            Msg::EndpointChanged(Endpoint::End, Axis::Lat, v)
        }),
        input_field("End longitude", &form.end_lon, |v| {
            Msg::EndpointChanged(Endpoint::End, Axis::Lon, v)
        }),
        action_button("Set end on map", || Msg::SetSelection(SelectionMode::End)),
        small!["Pick a mode, then click the map to fill the position."],
    ]
}

fn view_settings(planner: &Planner) -> Node<Msg> {
    let form = &planner.form;
    let optimization = form.optimization;
    let heuristic = form.heuristic;

    let weights = if optimization.uses_weights() {
        let slider = |label: &str, value: u8, criterion: Criterion| {
            div![
                C!["weight-slider"],
                label![label],
                input![
                    attrs! {
                        At::Type => "range",
                        At::Min => "0",
                        At::Max => "100",
                        At::Value => value.to_string(),
                    },
                    input_ev(Ev::Input, move |v| Msg::WeightChanged(criterion, v)),
                ],
                span![C!["weight-value"], value.to_string()],
            ]
        };
        div![
            C!["weights-sliders"],
            slider("Distance", form.weights.distance, Criterion::Distance),
            slider("Time", form.weights.time, Criterion::Time),
            slider("Safety", form.weights.safety, Criterion::Safety),
        ]
    } else {
        empty![]
    };

    fieldset![
        legend!["Route settings"],
        label!["Optimization"],
        select![
            Optimization::ALL.iter().map(|mode| option![
                attrs! {
                    At::Value => mode.as_str(),
                    At::Selected => bool_attr(*mode == optimization),
                },
                mode.label(),
            ]),
            input_ev(Ev::Change, Msg::OptimizationChanged),
        ],
        label!["Heuristic"],
        select![
            Heuristic::ALL.iter().map(|h| option![
                attrs! {
                    At::Value => h.as_str(),
                    At::Selected => bool_attr(*h == heuristic),
                },
                h.label(),
            ]),
            input_ev(Ev::Change, Msg::HeuristicChanged),
        ],
        weights,
    ]
}

fn view_safety_points(planner: &Planner) -> Node<Msg> {
    fieldset![
        legend!["Safety points"],
        div![
            C!["safety-points-container"],
            planner.rows().iter().map(view_safety_point),
        ],
        action_button("Add safety point", || Msg::AddSafetyPoint),
        action_button("Select safety point on map", || Msg::SelectSafetyLocation),
    ]
}

fn view_safety_point(row: &SafetyPointRow) -> Node<Msg> {
    let id = row.id;
    let fields = &row.fields;
    let current = fields.safety_index();

    div![
        C!["safety-point"],
        button![
            C!["remove-safety-point"],
            "✕",
            ev(Ev::Click, move |event| {
                event.prevent_default();
                Msg::RemoveSafetyPoint(id)
            }),
        ],
        input_field("Latitude", &fields.lat, move |v| {
            Msg::SafetyPointEdited(id, PointField::Lat, v)
        }),
        input_field("Longitude", &fields.lon, move |v| {
            Msg::SafetyPointEdited(id, PointField::Lon, v)
        }),
        input_field("Radius (m)", &fields.radius, move |v| {
            Msg::SafetyPointEdited(id, PointField::Radius, v)
        }),
        div![
            C!["input-field"],
            label!["Safety index (1-5)"],
            select![
                SafetyIndex::ALL.iter().map(|index| option![
                    attrs! {
                        At::Value => index.value().to_string(),
                        At::Selected => bool_attr(*index == current),
                    },
                    format!("{} ({})", index.value(), index.label()),
                ]),
                input_ev(Ev::Change, move |v| {
                    Msg::SafetyPointEdited(id, PointField::SafetyIndex, v)
                }),
            ],
        ],
        input_field("Weight (0-1)", &fields.weight, move |v| {
            Msg::SafetyPointEdited(id, PointField::Weight, v)
        }),
        action_button("Select on map", move || {
            Msg::SetSelection(SelectionMode::SafetyPoint(id))
        }),
    ]
}

fn view_status(planner: &Planner) -> Node<Msg> {
    div![
        C!["status"],
        if planner.is_loading() {
            div![C!["loading-indicator"], "Calculating route…"]
        } else {
            empty![]
        },
        if let Some(error) = planner.error() {
            div![
                C!["error-message"],
                p![C!["error"], error],
                action_button("Dismiss", || Msg::DismissError),
            ]
        } else {
            empty![]
        },
    ]
}

fn view_results(planner: &Planner) -> Node<Msg> {
    let Some(report) = planner.report() else {
        return div![
            C!["preview"],
            h2!["Waiting"],
            p!["Pick start and end points, then calculate a route."]
        ];
    };
    div![
        C!["preview"],
        h2!["Route"],
        view_summary(report),
        h3!["Segments"],
        div![
            C!["segments-list"],
            report.segments.iter().map(view_segment),
        ],
    ]
}

fn card(label: &str, content: &str) -> Node<Msg> {
    div![
        C!["metadata-card"],
        span![C!["label"], label],
        strong![content],
    ]
}

fn view_summary(report: &RouteReport) -> Node<Msg> {
    div![
        C!["metadata-grid"],
        card("Total distance", &report.distance),
        card("Total time", &report.time),
        card("Safety level", &report.safety_level),
        card("Optimization", &report.optimization),
        report
            .details
            .iter()
            .map(|(label, value)| card(label, value)),
    ]
}

fn view_segment(segment: &SegmentRow) -> Node<Msg> {
    let detail = |label: &str, value: &str| {
        div![
            C!["segment-detail"],
            span![C!["segment-detail-label"], label],
            span![value],
        ]
    };
    div![
        C!["segment-item"],
        div![
            C!["segment-header"],
            span![&segment.title],
            span![&segment.distance],
        ],
        div![
            C!["segment-details"],
            detail("Time", &segment.time),
            detail("Speed", &segment.speed),
            detail("Safety", &segment.safety_level),
        ],
    ]
}

fn bool_attr(value: bool) -> AtValue {
    if value {
        AtValue::Some("true".into())
    } else {
        AtValue::Ignored
    }
}
