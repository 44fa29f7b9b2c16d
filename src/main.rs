//! Qibla Finder CLI
//!
//! `bearing` computes the direction and distance to the Kaaba from a point.
//! `simulate` runs both resources and a fusion session against scripted
//! providers and prints the stream of screen positions.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::info;

use qibla_finder::api::{
    CompassInitializer, FusionSession, Providers, ResourceRegistry, ScreenPositioner, Viewport,
};
use qibla_finder::providers::{MockHeading, MockLocation, MockPermissions};
use qibla_finder::utils::{init_logging, ConfigurationManager};
use qibla_finder::validation::validate_fix;
use qibla_finder::{
    qibla, GeoPoint, HeadingProvider, OrientationSample, PermissionKind, PermissionStatus,
    ResourceState,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human readable lines
    Text,
    /// One JSON object per line
    Json,
}

#[derive(Parser)]
#[command(name = "qibla-finder")]
#[command(about = "Find the Qibla direction and simulate the compass view", long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute bearing and distance to the Kaaba
    Bearing {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Acquire both resources from mock providers and stream screen positions
    Simulate {
        /// Simulated GPS latitude
        #[arg(long, allow_hyphen_values = true, default_value = "51.5074")]
        lat: f64,
        /// Simulated GPS longitude
        #[arg(long, allow_hyphen_values = true, default_value = "-0.1278")]
        lon: f64,
        /// JSON configuration file
        #[arg(long)]
        config: Option<String>,
        /// Use this bearing instead of acquiring a location
        #[arg(long, allow_hyphen_values = true)]
        override_bearing: Option<f64>,
        /// Simulate a permanently denied location permission
        #[arg(long)]
        deny_location: bool,
        /// Fall back to north when location fails
        #[arg(long)]
        skip_on_location_failure: bool,
        /// Heading of the first simulated sample
        #[arg(long, default_value = "90.0")]
        heading_start: f64,
        /// Heading change between samples
        #[arg(long, allow_hyphen_values = true, default_value = "3.0")]
        heading_step: f64,
        /// Number of heading samples to stream
        #[arg(long, default_value = "20")]
        samples: u32,
        /// Interval between samples in milliseconds
        #[arg(long, default_value = "50")]
        interval_ms: u64,
        /// Viewport width in pixels
        #[arg(long, default_value = "1080")]
        width: f64,
        /// Viewport height in pixels
        #[arg(long, default_value = "1920")]
        height: f64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command {
        Command::Bearing { lat, lon } => run_bearing(GeoPoint::new(lat, lon), cli.format),
        Command::Simulate {
            lat,
            lon,
            config,
            override_bearing,
            deny_location,
            skip_on_location_failure,
            heading_start,
            heading_step,
            samples,
            interval_ms,
            width,
            height,
        } => {
            let mut manager = match config {
                Some(path) => ConfigurationManager::from_file(path)?,
                None => ConfigurationManager::new(),
            };
            if skip_on_location_failure {
                manager.set_skip_on_location_failure(true);
            }

            let permissions = if deny_location {
                MockPermissions::granted()
                    .with_status(PermissionKind::Location, PermissionStatus::PermanentlyDenied)
            } else {
                MockPermissions::granted()
            };
            let script: Vec<OrientationSample> = (0..samples)
                .map(|i| {
                    let heading = heading_start + heading_step * f64::from(i);
                    let pitch = 10.0 * (f64::from(i) / 4.0).sin();
                    OrientationSample::new(heading, pitch, u64::from(i) * interval_ms)
                })
                .collect();

            let simulation = Simulation {
                providers: Providers::new(
                    Arc::new(permissions),
                    Arc::new(MockLocation::fix_after(
                        GeoPoint::new(lat, lon),
                        Duration::from_millis(200),
                    )),
                    Some(Arc::new(MockHeading::steady(
                        OrientationSample::new(heading_start, 0.0, 0),
                        Duration::from_millis(interval_ms),
                    )) as Arc<dyn HeadingProvider>),
                ),
                stream: Arc::new(MockHeading::sequence(
                    script,
                    Duration::from_millis(interval_ms),
                )),
                viewport: Viewport::new(width, height)?,
                override_bearing,
                format: cli.format,
            };
            simulation.run(&manager).await
        }
    }
}

fn run_bearing(from: GeoPoint, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let from = validate_fix(from)?;
    let result = qibla(from);

    match format {
        OutputFormat::Text => {
            println!("From:     {}", from);
            println!("Bearing:  {:.2}°", result.bearing_degrees);
            println!("Distance: {:.1} km", result.distance_km);
        }
        OutputFormat::Json => {
            println!(
                "{}",
                json!({
                    "from": from,
                    "bearing_degrees": result.bearing_degrees,
                    "distance_km": result.distance_km,
                })
            );
        }
    }
    Ok(())
}

struct Simulation {
    providers: Providers,
    stream: Arc<MockHeading>,
    viewport: Viewport,
    override_bearing: Option<f64>,
    format: OutputFormat,
}

impl Simulation {
    async fn run(self, manager: &ConfigurationManager) -> Result<(), Box<dyn std::error::Error>> {
        let config = manager.config();
        let registry = ResourceRegistry::from_config(self.providers.clone(), config);

        let compass: CompassInitializer = registry.compass();
        let augmented = registry.augmented_view();
        let (compass_state, augmented_state) = tokio::join!(
            compass.initialize(self.override_bearing),
            augmented.initialize(self.override_bearing)
        );
        self.report("compass", &compass_state);
        self.report("augmented-view", &augmented_state);

        let Some(target) = compass_state.bearing_degrees() else {
            return Err("compass resource did not become ready".into());
        };

        info!(
            bearing = target,
            width = self.viewport.width(),
            height = self.viewport.height(),
            "starting fusion session"
        );
        let session = FusionSession::start(
            self.stream.clone(),
            target,
            config.filter.build_filter(),
            ScreenPositioner::new(config.view.clone()),
            self.viewport,
        );

        let mut updates = session.subscribe();
        while updates.changed().await.is_ok() {
            let Some(update) = *updates.borrow_and_update() else {
                continue;
            };
            match self.format {
                OutputFormat::Text => println!(
                    "heading {:6.1}°  pitch {:5.1}°  x {:7.1}  y {:7.1}  diff {:6.1}°  {:?}",
                    update.fused.heading_degrees,
                    update.fused.pitch_degrees,
                    update.position.x,
                    update.position.y,
                    update.position.angle_diff_degrees,
                    update.hint
                ),
                OutputFormat::Json => println!("{}", serde_json::to_string(&update)?),
            }
        }

        session.stop().await;
        Ok(())
    }

    fn report<E: std::fmt::Debug>(&self, name: &str, state: &ResourceState<E>) {
        match (self.format, state.payload(), state.error()) {
            (OutputFormat::Text, Some(payload), _) => println!(
                "{}: ready, bearing {:.2}° ({:?}), distance {:.1} km",
                name, payload.bearing.bearing_degrees, payload.source, payload.bearing.distance_km
            ),
            (OutputFormat::Text, None, Some(error)) => println!(
                "{}: failed, {} ({})",
                name,
                error,
                error.remediation_message()
            ),
            (OutputFormat::Json, Some(payload), _) => println!(
                "{}",
                json!({
                    "resource": name,
                    "status": state.status(),
                    "bearing_degrees": payload.bearing.bearing_degrees,
                    "distance_km": payload.bearing.distance_km,
                    "heading_degrees": payload.heading_degrees,
                    "source": payload.source,
                    "extras": format!("{:?}", payload.extras),
                })
            ),
            (OutputFormat::Json, None, Some(error)) => println!(
                "{}",
                json!({
                    "resource": name,
                    "status": state.status(),
                    "error": error.to_string(),
                    "kind": format!("{:?}", error.kind()),
                    "remediation": error.remediation_message(),
                })
            ),
            (_, None, None) => println!("{}: {:?}", name, state.status()),
        }
    }
}
