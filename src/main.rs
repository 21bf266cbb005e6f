use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::SdkTracerProvider;
use stages::geocode::{DEFAULT_ADDRESS_SUFFIX, DEFAULT_GEOCODE_URL, DEFAULT_SCHOOL, GeocoderConfig};
use stages::upload::DEFAULT_COLLECTION;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

mod dal;
mod model;
mod parser;
mod stages;
mod utils;

const SERVICE_NAME: &str = "bus_route_import";

/// Turns hand written school bus route sheets into geocoded route documents
#[derive(Parser)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a route text sheet into routes JSON
    Extract {
        #[arg(short, long)]
        input: PathBuf,
        /// Defaults to the input path with a `.json` extension
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Geocode every stop and reshape the routes into the school document
    Geocode(GeocodeArgs),
    /// Flatten the school document's coordinates
    Restructure {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Upload the school document into the document store
    Upload {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long, default_value = DEFAULT_COLLECTION)]
        collection: String,
        #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
        database_url: String,
    },
}

#[derive(Args)]
struct GeocodeArgs {
    #[arg(short, long)]
    input: PathBuf,
    #[arg(short, long)]
    output: PathBuf,
    #[arg(long, env = "GOOGLE_MAPS_API_KEY", hide_env_values = true)]
    api_key: String,
    #[arg(long, default_value = DEFAULT_SCHOOL)]
    school: String,
    #[arg(long, default_value = DEFAULT_ADDRESS_SUFFIX, allow_hyphen_values = true)]
    address_suffix: String,
    /// Pause between two geocoding requests, the API allows about 2.5 requests a second
    #[arg(long, default_value_t = 500)]
    request_delay_ms: u64,
    #[arg(long, default_value = DEFAULT_GEOCODE_URL)]
    geocode_url: String,
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    _ = dotenv();
    let cli = Cli::parse();

    let (_guard, provider) = init_tracing()?;

    let result = run(cli.command).await;
    if let Err(e) = &result {
        error!("{e:?}");
    }

    if let Some(provider) = provider {
        if let Err(e) = provider.shutdown() {
            eprintln!("error shutting down the tracer provider: {e}");
        }
    }

    result
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Extract { input, output } => {
            let output = output.unwrap_or_else(|| stages::extract::default_output_path(&input));
            stages::extract::extract(&input, &output)?;
        }
        Command::Geocode(args) => {
            let config = GeocoderConfig {
                base_url: args.geocode_url,
                api_key: args.api_key,
                address_suffix: args.address_suffix,
                timeout: Duration::from_secs(args.timeout_secs),
            };
            stages::geocode::geocode(
                &args.input,
                &args.output,
                args.school,
                config,
                Duration::from_millis(args.request_delay_ms),
            )
            .await?;
        }
        Command::Restructure { input, output } => {
            stages::restructure::restructure(&input, &output)?;
        }
        Command::Upload {
            input,
            collection,
            database_url,
        } => {
            stages::upload::upload_file(&input, &collection, &database_url).await?;
        }
    }

    info!("done");

    Ok(())
}

/// Logs to stderr and to daily files in `./logs`. Spans are also exported over OTLP when `OTLP_ENDPOINT` is set.
fn init_tracing() -> Result<(WorkerGuard, Option<SdkTracerProvider>)> {
    let provider = match dotenvy::var("OTLP_ENDPOINT") {
        Ok(endpoint) => Some(otlp_tracer_provider(endpoint)?),
        Err(_) => None,
    };

    let telemetry_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer(SERVICE_NAME)));

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let appender = tracing_appender::rolling::daily("./logs", "bus_route_import.log");
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(appender);

    // A layer that logs events to rolling files.
    let file_log = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_appender)
        .with_ansi(false)
        .pretty();

    let stderr_log = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    Registry::default()
        .with(telemetry_layer)
        .with(file_log)
        .with(stderr_log)
        .with(env_filter)
        .init();

    Ok((guard, provider))
}

fn otlp_tracer_provider(endpoint: String) -> Result<SdkTracerProvider> {
    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_timeout(Duration::from_millis(1000))
        .with_endpoint(endpoint)
        .build()?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(Resource::builder().with_service_name(SERVICE_NAME).build())
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_output_is_optional() {
        let cli = Cli::try_parse_from(["bus_route_import", "extract", "--input", "routes.txt"]).unwrap();

        assert!(matches!(
            cli.command,
            Command::Extract { ref input, output: None } if input == &PathBuf::from("routes.txt")
        ));
    }

    #[test]
    fn test_geocode_defaults() {
        let cli = Cli::try_parse_from([
            "bus_route_import",
            "geocode",
            "-i",
            "routes.json",
            "-o",
            "output.json",
            "--api-key",
            "key",
        ])
        .unwrap();

        let Command::Geocode(args) = cli.command else {
            panic!("expected the geocode command");
        };
        assert_eq!(args.api_key, "key");
        assert_eq!(args.school, DEFAULT_SCHOOL);
        assert_eq!(args.address_suffix, ", Merrimack, NH");
        assert_eq!(args.request_delay_ms, 500);
        assert_eq!(args.geocode_url, DEFAULT_GEOCODE_URL);
    }

    #[test]
    fn test_upload_collection_default() {
        let cli = Cli::try_parse_from([
            "bus_route_import",
            "upload",
            "-i",
            "output.json",
            "--database-url",
            "postgres://localhost/routes",
        ])
        .unwrap();

        let Command::Upload { collection, .. } = cli.command else {
            panic!("expected the upload command");
        };
        assert_eq!(collection, "schools");
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(Cli::try_parse_from(["bus_route_import", "convert"]).is_err());
    }
}
