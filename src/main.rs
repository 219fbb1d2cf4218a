use anomaly_sensor::components::anomaly_sensor::{self as anomaly, SENSOR_READING_KEY};
use anomaly_sensor::config::{ConfigLoader, ModuleConfig};
use anomaly_sensor::logging::init_logging;
use anomaly_sensor::resource::Extra;
use anomaly_sensor::{ComponentConfig, Error, Module};
use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Host the anomaly sensor locally and classify readings from stdin
#[derive(Parser, Debug)]
#[command(name = "anomaly-sensor", version, about)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "ANOMALY_SENSOR_CONFIG")]
    config: Option<PathBuf>,

    /// Log level or filter directive, overrides the configuration file
    #[arg(long)]
    log_level: Option<String>,

    /// Per-read timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print a sample configuration file and exit
    #[arg(long)]
    print_sample_config: bool,
}

/// One stdin request in object form
#[derive(Debug, Default, Deserialize)]
struct Request {
    /// Target component, defaults to the first configured one
    component: Option<String>,
    /// Extra read parameters
    extra: Option<Extra>,
    /// Attributes to apply instead of reading
    reconfigure: Option<Map<String, Value>>,
}

/// Turn one stdin line into a request.
///
/// Blank lines read a synthesized value, bare numbers or arrays are readings,
/// objects are full requests.
fn parse_request(line: &str) -> anomaly_sensor::Result<Request> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Request::default());
    }

    let value: Value = serde_json::from_str(line)
        .map_err(|e| Error::InvalidInput(format!("request is not valid JSON: {}", e)))?;

    match value {
        Value::Object(_) => Ok(serde_json::from_value(value)?),
        reading => {
            let mut extra = Extra::new();
            extra.insert(SENSOR_READING_KEY.to_string(), reading);
            Ok(Request {
                extra: Some(extra),
                ..Request::default()
            })
        }
    }
}

fn error_response(e: &Error) -> Value {
    json!({"error": {"code": e.code(), "message": e.to_string()}})
}

async fn handle_request(
    module: &Module,
    config: &ModuleConfig,
    request: Request,
    timeout: Option<Duration>,
) -> anomaly_sensor::Result<Value> {
    let name = match request.component {
        Some(name) => name,
        None => config
            .components
            .first()
            .map(|c| c.name.clone())
            .ok_or_else(|| Error::ResourceNotFound("no components configured".to_string()))?,
    };

    if let Some(attributes) = request.reconfigure {
        let model = config
            .components
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.model.clone())
            .ok_or_else(|| Error::ResourceNotFound(name.clone()))?;
        let update = ComponentConfig::new(name.clone(), model).with_attributes(attributes);
        module.reconfigure_resource(&update).await?;
        return Ok(json!({"reconfigured": name}));
    }

    let readings = module
        .get_readings(&name, request.extra.as_ref(), timeout)
        .await?;
    Ok(Value::Object(readings))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.print_sample_config {
        println!("{}", ModuleConfig::sample_toml()?);
        return Ok(());
    }

    let mut config = ConfigLoader::new()
        .load_from_file(cli.config.as_ref())
        .load_from_env()
        .build()
        .context("Failed to load configuration")?;

    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    init_logging(&config.logging).context("Failed to initialize logging")?;

    let module = Module::from_global()?;
    module
        .add_model_from_registry(&anomaly::model())
        .await?;

    for component in &config.components {
        module
            .add_resource(component)
            .await
            .with_context(|| format!("Failed to create component '{}'", component.name))?;
    }
    module.start().await?;
    info!(components = ?module.resource_names().await, "Serving readings from stdin");

    let timeout = cli.timeout_ms.map(Duration::from_millis);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                let response = match parse_request(&line) {
                    Ok(request) => handle_request(&module, &config, request, timeout).await,
                    Err(e) => Err(e),
                };
                let output = response.unwrap_or_else(|e| {
                    warn!("Request failed: {}", e);
                    error_response(&e)
                });
                println!("{}", output);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    module.shutdown().await?;
    Ok(())
}
