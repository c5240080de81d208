//! Embrasure command-line interface.
//!
//! Compiles an API description and prints routes, URLs and request
//! descriptors built from it.

use std::path::Path;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};

use embrasure::{parse_route_table, CompileError, Registry};
use embrasure_telemetry::{init_logging, LogFormat, TelemetryConfig};

#[derive(Parser, Debug)]
#[command(
    name = "embrasure",
    about = "Build HTTP requests from Swagger/OpenAPI descriptions",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, global = true, env = "EMBRASURE_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Log output format (json or pretty).
    #[arg(long, global = true, default_value = "pretty", value_parser = parse_log_format)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the routes compiled from a description.
    Routes {
        /// Swagger/OpenAPI document or route table (YAML or JSON).
        #[arg(short, long)]
        spec: String,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Describe one route as JSON.
    Explore {
        /// Swagger/OpenAPI document or route table (YAML or JSON).
        #[arg(short, long)]
        spec: String,

        /// Route name.
        #[arg(short, long)]
        route: String,
    },

    /// Print the URL of a route.
    Url {
        #[command(flatten)]
        target: Target,
    },

    /// Print the request descriptor for a route as JSON.
    Request {
        #[command(flatten)]
        target: Target,
    },
}

#[derive(clap::Args, Debug)]
struct Target {
    /// Swagger/OpenAPI document or route table (YAML or JSON).
    #[arg(short, long)]
    spec: String,

    /// Route name.
    #[arg(short, long)]
    route: String,

    /// Parameters as a JSON object.
    #[arg(short, long, default_value = "{}")]
    params: String,

    /// Base URL prefixed to every path. Defaults to the document's server.
    #[arg(long, env = "EMBRASURE_BASE_URL")]
    base_url: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    LogFormat::parse(s).ok_or_else(|| format!("unknown log format '{}' (expected json or pretty)", s))
}

/// Exit status for a route name that matches nothing.
const UNKNOWN_ROUTE: u8 = 2;

/// Load a registry from a Swagger/OpenAPI document, or from a route table
/// when the document's root is a list.
fn load(spec: &str, base_url: Option<&str>) -> Result<Registry, CompileError> {
    let path = Path::new(spec);
    let content = std::fs::read_to_string(path)?;

    let is_table = matches!(
        serde_yaml::from_str::<serde_yaml::Value>(&content),
        Ok(serde_yaml::Value::Sequence(_))
    );
    if is_table {
        let routes = parse_route_table(&content)?;
        return Registry::builder()
            .base_url(base_url.unwrap_or_default())
            .build_from_routes(routes);
    }

    let mut builder = Registry::builder();
    if let Some(url) = base_url {
        builder = builder.base_url(url);
    }
    builder.build_from_str(&content)
}

fn load_or_report(spec: &str, base_url: Option<&str>) -> Result<Registry, ExitCode> {
    load(spec, base_url).map_err(|e| {
        eprintln!("error: failed to load {}: {}", spec, e);
        ExitCode::from(1)
    })
}

fn parse_params(params: &str) -> Result<Value, ExitCode> {
    serde_json::from_str(params).map_err(|e| {
        eprintln!("error: --params is not valid JSON: {}", e);
        ExitCode::from(1)
    })
}

fn unknown_route(route: &str) -> ExitCode {
    eprintln!("error: unknown route '{}'", route);
    ExitCode::from(UNKNOWN_ROUTE)
}

fn print_json(value: &impl serde::Serialize) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(out) => {
            println!("{}", out);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to serialize output: {}", e);
            ExitCode::from(1)
        }
    }
}

fn run_routes(spec: &str, format: OutputFormat) -> ExitCode {
    let registry = match load_or_report(spec, None) {
        Ok(r) => r,
        Err(code) => return code,
    };

    match format {
        OutputFormat::Json => {
            let routes: Vec<Value> = registry
                .routes()
                .map(|r| {
                    json!({
                        "routeName": r.route_name,
                        "method": r.method,
                        "path": r.path_template.to_string(),
                        "summary": r.summary,
                        "deprecated": r.deprecated,
                    })
                })
                .collect();
            print_json(&routes)
        }
        OutputFormat::Text => {
            for route in registry.routes() {
                let method = route.method.as_str().to_uppercase();
                match &route.summary {
                    Some(summary) => println!(
                        "{} {} {}  {}",
                        route.route_name, method, route.path_template, summary
                    ),
                    None => println!("{} {} {}", route.route_name, method, route.path_template),
                }
            }
            eprintln!("{} route(s)", registry.routes().count());
            ExitCode::SUCCESS
        }
    }
}

fn run_explore(spec: &str, route: &str) -> ExitCode {
    let registry = match load_or_report(spec, None) {
        Ok(r) => r,
        Err(code) => return code,
    };
    match registry.explore_route(route) {
        Some(summary) => print_json(&summary),
        None => unknown_route(route),
    }
}

fn run_url(target: &Target) -> ExitCode {
    let (registry, params) = match prepare(target) {
        Ok(prepared) => prepared,
        Err(code) => return code,
    };
    match registry.url_for(&target.route, &params) {
        Ok(Some(url)) => {
            println!("{}", url);
            ExitCode::SUCCESS
        }
        Ok(None) => unknown_route(&target.route),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn run_request(target: &Target) -> ExitCode {
    let (registry, params) = match prepare(target) {
        Ok(prepared) => prepared,
        Err(code) => return code,
    };
    match registry.request_for(&target.route, &params) {
        Ok(Some(request)) => print_json(&request),
        Ok(None) => unknown_route(&target.route),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn prepare(target: &Target) -> Result<(Registry, Value), ExitCode> {
    let params = parse_params(&target.params)?;
    let registry = load_or_report(&target.spec, target.base_url.as_deref())?;
    Ok((registry, params))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = TelemetryConfig::new()
        .with_log_level(&cli.log_level)
        .with_log_format(cli.log_format);
    if let Err(e) = init_logging(&config) {
        eprintln!("warning: {}", e);
    }

    match &cli.command {
        Commands::Routes { spec, format } => run_routes(spec, *format),
        Commands::Explore { spec, route } => run_explore(spec, route),
        Commands::Url { target } => run_url(target),
        Commands::Request { target } => run_request(target),
    }
}
