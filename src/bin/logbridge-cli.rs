use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use logbridge::backend::{MemorySink, SinkControl};
use logbridge::bridge::{registry_from_config, LogCall, LogState};
use logbridge::config::loader::environment_from_env;
use logbridge::config::{BridgeConfig, ConfigSources};
use logbridge::event::{EventId, LogLevel, ObjectValue, StateValue};
use logbridge::observability::NoTraceContext;

#[derive(Parser)]
#[command(name = "logbridge-cli")]
#[command(about = "Render log events and inspect logbridge configuration", long_about = None)]
struct Cli {
    /// Directory holding logbridge.{toml,json,yaml}
    #[arg(short, long, default_value = ".")]
    config_dir: PathBuf,

    /// Environment layer to apply (defaults to $LOGBRIDGE_ENVIRONMENT)
    #[arg(short, long)]
    environment: Option<String>,

    /// User override file, applied last
    #[arg(short, long)]
    user_config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a message template and print the resulting JSON event
    Render {
        /// Message template, e.g. "Hello {Name}"
        template: String,

        /// Positional values; JSON is parsed, anything else is a string.
        /// Objects with a "$type" key become typed objects.
        args: Vec<String>,

        #[arg(short, long, default_value = "information")]
        level: LogLevel,

        #[arg(long, default_value = "Cli")]
        category: String,

        #[arg(long)]
        event_id: Option<i32>,

        #[arg(long)]
        event_name: Option<String>,

        /// Pretty-print the event
        #[arg(long)]
        pretty: bool,
    },
    /// Print the merged configuration
    Config {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Toml)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Toml,
    Json,
    Yaml,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let environment = cli.environment.or_else(environment_from_env);
    let config = ConfigSources::conventional(&cli.config_dir, environment.as_deref(), cli.user_config).load()?;

    match cli.command {
        Commands::Render {
            template,
            args,
            level,
            category,
            event_id,
            event_name,
            pretty,
        } => render(&config, &template, &args, level, &category, event_id, event_name, pretty)?,
        Commands::Config { format } => {
            let text = match format {
                OutputFormat::Toml => toml::to_string_pretty(&config)?,
                OutputFormat::Json => serde_json::to_string_pretty(&config)?,
                OutputFormat::Yaml => serde_yaml_ng::to_string(&config)?,
            };
            println!("{}", text.trim_end());
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn render(
    config: &BridgeConfig,
    template: &str,
    args: &[String],
    level: LogLevel,
    category: &str,
    event_id: Option<i32>,
    event_name: Option<String>,
    pretty: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // Render regardless of the configured threshold.
    let control = SinkControl::from_config(config);
    control.set_minimum_level(LogLevel::Trace);
    let sink = Arc::new(MemorySink::new(control));
    let registry = registry_from_config(config, sink.clone(), Arc::new(NoTraceContext));

    let event_id = EventId {
        id: event_id.unwrap_or_default(),
        name: event_name,
    };
    let state = LogState::formatted(template, args.iter().map(String::as_str).map(parse_arg).collect());
    let call = LogCall::new(level, Some(&state)).with_event_id(&event_id);
    registry.get_or_create(category).log(&call);

    let Some(event) = sink.take().pop() else {
        eprintln!("No event produced for level {}", level);
        return Ok(());
    };
    let json = event.to_json();
    if pretty {
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("{}", serde_json::to_string(&json)?);
    }
    Ok(())
}

fn parse_arg(raw: &str) -> StateValue {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) if map.get("$type").is_some_and(Value::is_string) => {
            let type_name = map.get("$type").and_then(Value::as_str).unwrap_or_default();
            map.iter()
                .filter(|(key, _)| key.as_str() != "$type")
                .fold(ObjectValue::new(type_name), |obj, (key, value)| {
                    obj.field(key.as_str(), StateValue::from(value))
                })
                .into()
        }
        Ok(value) => StateValue::from(&value),
        Err(_) => StateValue::Str(raw.to_string()),
    }
}
