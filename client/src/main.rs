use clap::{Parser, Subcommand};
use client::{ClientConfig, ClientError, Dispatcher, Outcome, RouteClient};
use shared::{
    Coordinate, Heuristic, Optimization, RouteReport, RouteRequest, SafetyPoint,
    SafetyPointFields, WeightPercents, form::parse_coordinate,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(author, version, about = "Plan safe routes against a route server")]
struct Args {
    /// Route server base URL (overrides ROUTE_SERVER_URL)
    #[arg(long, global = true)]
    server: Option<String>,
    /// Nominatim base URL (overrides GEOCODER_URL)
    #[arg(long, global = true)]
    geocoder: Option<String>,
    /// Delay between two result polls (overrides POLL_INTERVAL_MS)
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load the road network of a place on the server and locate it
    LoadMap { place: String },
    /// Calculate a route and print its summary
    Route(RouteArgs),
}

#[derive(Debug, clap::Args)]
struct RouteArgs {
    /// Start as LAT,LON
    #[arg(long, value_parser = parse_coordinate_arg, allow_hyphen_values = true)]
    start: Coordinate,
    /// End as LAT,LON
    #[arg(long, value_parser = parse_coordinate_arg, allow_hyphen_values = true)]
    end: Coordinate,
    #[arg(long, default_value = "balanced")]
    optimization: Optimization,
    #[arg(long, default_value = "euclidean")]
    heuristic: Heuristic,
    /// Percent, only used by the balanced mode
    #[arg(long, default_value_t = 40, value_parser = clap::value_parser!(u8).range(0..=100))]
    distance_weight: u8,
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u8).range(0..=100))]
    time_weight: u8,
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u8).range(0..=100))]
    safety_weight: u8,
    /// LAT,LON[,RADIUS[,INDEX[,WEIGHT]]], repeatable
    #[arg(long = "safety-point", value_parser = parse_safety_point_arg, allow_hyphen_values = true)]
    safety_points: Vec<SafetyPoint>,
}

impl RouteArgs {
    fn to_request(&self) -> RouteRequest {
        let mut request = RouteRequest::new(self.start, self.end).with_weights(WeightPercents {
            distance: self.distance_weight,
            time: self.time_weight,
            safety: self.safety_weight,
        });
        request.optimization = self.optimization;
        request.heuristic = self.heuristic;
        request.safety_points = self.safety_points.clone();
        request
    }
}

fn parse_coordinate_arg(raw: &str) -> Result<Coordinate, String> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got `{raw}`"))?;
    parse_coordinate(lat, lon).ok_or_else(|| format!("`{raw}` is not a coordinate"))
}

fn parse_safety_point_arg(raw: &str) -> Result<SafetyPoint, String> {
    let mut parts = raw.split(',').map(str::to_string);
    let defaults = SafetyPointFields::default();
    let fields = SafetyPointFields {
        lat: parts.next().unwrap_or_default(),
        lon: parts.next().unwrap_or_default(),
        radius: parts.next().unwrap_or(defaults.radius),
        safety_index: parts.next().unwrap_or(defaults.safety_index),
        weight: parts.next().unwrap_or(defaults.weight),
    };
    if parts.next().is_some() {
        return Err(format!("too many values in `{raw}`"));
    }
    fields
        .to_point()
        .ok_or_else(|| format!("expected LAT,LON[,RADIUS[,INDEX[,WEIGHT]]], got `{raw}`"))
}

fn config(args: &Args) -> Result<ClientConfig, ClientError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(server) = &args.server {
        config.server_url = server.clone();
    }
    if let Some(geocoder) = &args.geocoder {
        config.geocoder_url = geocoder.clone();
    }
    if let Some(millis) = args.poll_interval_ms {
        config = config.with_poll_interval_ms(millis)?;
    }
    Ok(config)
}

fn print_report(report: &RouteReport) {
    println!("Route ({})", report.optimization);
    println!("  distance: {}", report.distance);
    println!("  time:     {}", report.time);
    println!("  safety:   {}", report.safety_level);
    for (label, value) in &report.details {
        println!("  {label}: {value}");
    }
    if let (Some(start), Some(end)) = (report.start(), report.end()) {
        println!(
            "  path:     {} points from {:.6},{:.6} to {:.6},{:.6}",
            report.path.len(),
            start.lat,
            start.lon,
            end.lat,
            end.lon
        );
    }
    for segment in &report.segments {
        println!(
            "  {}: {}, {}, {}, safety {}",
            segment.title, segment.distance, segment.time, segment.speed, segment.safety_level
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = config(&args)?;
    tracing::info!("using route server {}", config.server_url);
    let client = RouteClient::new(&config)?;

    match args.command {
        Command::LoadMap { place } => {
            let stats = client.load_map(&place).await?;
            println!("nodes: {}", stats.nodes);
            println!("edges: {}", stats.edges);
            if let Some(message) = stats.message {
                println!("{message}");
            }
            match client.geocode(&place).await {
                Ok(Some(center)) => println!("center: {:.6},{:.6}", center.lat, center.lon),
                Ok(None) => tracing::warn!("no geocoding match for {place:?}"),
                Err(err) => tracing::warn!("geocoding failed: {err}"),
            }
        }
        Command::Route(route) => {
            let mut dispatcher = Dispatcher::new(client, config.poll_interval);
            let handle = dispatcher.submit(route.to_request());
            match handle.outcome().await {
                Outcome::Completed(result) => print_report(&RouteReport::from(&result)),
                Outcome::Failed(err) => return Err(ClientError::from(err).into()),
                Outcome::Cancelled => return Err("route calculation was cancelled".into()),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use shared::SafetyIndex;

    use super::*;

    proptest! {
        #[test]
        fn any_finite_coordinate_is_accepted(lat in -90.0f64..90.0, lon in -180.0f64..180.0) {
            prop_assert_eq!(parse_coordinate_arg(&format!("{lat},{lon}")), Ok(Coordinate::new(lat, lon)));
        }

        #[test]
        fn out_of_range_index_falls_back_to_safest(index in 6u32..1000) {
            let point = parse_safety_point_arg(&format!("19.1,-99.2,200,{index}")).unwrap();
            prop_assert_eq!(point.safety_index, SafetyIndex::SAFEST);
        }
    }

    #[test]
    fn parses_coordinates_with_negative_longitude() {
        let coord = parse_coordinate_arg("19.4326,-99.1332").unwrap();
        assert_eq!(coord, Coordinate::new(19.4326, -99.1332));
        assert!(parse_coordinate_arg("19.4").is_err());
        assert!(parse_coordinate_arg("north,-99").is_err());
    }

    #[test]
    fn safety_point_defaults_fill_missing_values() {
        let point = parse_safety_point_arg("19.1,-99.2").unwrap();
        assert_eq!(point.radius, 200.0);
        assert_eq!(point.safety_index, SafetyIndex::SAFEST);
        assert_eq!(point.weight, 1.0);

        let point = parse_safety_point_arg("19.1,-99.2,350,4,0.5").unwrap();
        assert_eq!(point.radius, 350.0);
        assert_eq!(point.safety_index.value(), 4);
        assert_eq!(point.weight, 0.5);

        assert!(parse_safety_point_arg("19.1").is_err());
        assert!(parse_safety_point_arg("19.1,-99.2,1,1,1,1").is_err());
    }

    #[test]
    fn route_command_builds_a_request() {
        let args = Args::try_parse_from([
            "route-planner",
            "route",
            "--start",
            "19.0,-99.0",
            "--end",
            "19.1,-99.1",
            "--optimization",
            "safest",
            "--distance-weight",
            "50",
            "--safety-point",
            "19.05,-99.05,300,5",
        ])
        .unwrap();
        let Command::Route(route) = args.command else {
            panic!("expected route command");
        };
        let request = route.to_request();
        assert_eq!(request.start(), Coordinate::new(19.0, -99.0));
        assert_eq!(request.optimization, Optimization::Safest);
        assert_eq!(request.heuristic, Heuristic::Euclidean);
        assert_eq!(request.distance_weight, 0.5);
        assert_eq!(request.time_weight, 0.3);
        assert_eq!(request.safety_points.len(), 1);
        assert_eq!(request.safety_points[0].safety_index.value(), 5);
    }

    #[test]
    fn weights_above_one_hundred_are_rejected() {
        let parsed = Args::try_parse_from([
            "route-planner",
            "route",
            "--start",
            "19.0,-99.0",
            "--end",
            "19.1,-99.1",
            "--time-weight",
            "150",
        ]);
        assert!(parsed.is_err());
    }
}
