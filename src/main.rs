//! logbridge host
//!
//! Demo host for the translation bridge. Loads layered configuration, wires
//! the selected sink, attaches a pair of UI surfaces and a command handler to
//! the host lifecycle, and emits sample log traffic until SIGINT/SIGTERM.
//!
//! # Environment
//! - `LOGBRIDGE_CONFIG_DIR`: directory holding `logbridge.*` (default `.`)
//! - `LOGBRIDGE_ENVIRONMENT`: selects `logbridge.<environment>.*`
//! - `LOGBRIDGE_USER_CONFIG`: user override file, applied last
//! - `RUST_LOG`: overrides `diagnostics.filter`

use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tracing::Instrument;

use logbridge::backend::{sink_from_config, SinkControl};
use logbridge::bridge::registry_from_config;
use logbridge::config::loader::environment_from_env;
use logbridge::config::{ConfigSources, ConfigWatcher};
use logbridge::event::ObjectValue;
use logbridge::lifecycle::{
    command_binding, signals, surface_binding, CommandRegistry, HostLifecycle, HostSignal,
    HostToggle, LifecycleCoordinator, ToggleBus, UiSurface,
};
use logbridge::observability::{init_diagnostics, SpanTraceContext};
use logbridge::{state_args, CategoryLogger};

const CONFIG_DIR_VAR: &str = "LOGBRIDGE_CONFIG_DIR";
const USER_CONFIG_VAR: &str = "LOGBRIDGE_USER_CONFIG";
const HEARTBEAT: Duration = Duration::from_secs(5);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

struct DemoWindow {
    type_name: &'static str,
    visible: AtomicBool,
    logger: Arc<CategoryLogger>,
}

impl UiSurface for DemoWindow {
    fn type_name(&self) -> &str {
        self.type_name
    }

    fn toggle(&self) {
        let visible = !self.visible.fetch_xor(true, Ordering::SeqCst);
        self.logger.information(
            "Window {Window} is now {Visibility}",
            state_args![self.type_name, if visible { "shown" } else { "hidden" }],
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = env::var_os(CONFIG_DIR_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let user_override = env::var_os(USER_CONFIG_VAR).map(PathBuf::from);
    let sources = ConfigSources::conventional(
        &config_dir,
        environment_from_env().as_deref(),
        user_override,
    );
    let config = sources.load()?;

    init_diagnostics(&config.diagnostics);

    tracing::info!(
        plugin = %config.plugin.name,
        sink = ?config.logging.sink,
        minimum_level = %config.logging.minimum_level,
        layers = sources.layers().len(),
        "logbridge host starting"
    );

    let control = SinkControl::from_config(&config);
    let sink = sink_from_config(config.logging.sink, control.clone());
    let registry = Arc::new(registry_from_config(
        &config,
        sink,
        Arc::new(SpanTraceContext),
    ));

    // Hot reload: only the sink settings follow config changes.
    let (watcher, mut updates) = ConfigWatcher::new(sources);
    let _watcher = match watcher.run() {
        Ok(w) => Some(w),
        Err(e) => {
            tracing::warn!(error = %e, "Config hot reload disabled");
            None
        }
    };
    let reload_control = control.clone();
    tokio::spawn(async move {
        while let Some(next) = updates.recv().await {
            reload_control.apply(&next);
            tracing::info!("Configuration reloaded");
        }
    });

    let host = Arc::new(HostLifecycle::new());
    let bus = Arc::new(ToggleBus::new());
    let commands = Arc::new(CommandRegistry::new());

    let main_window = Arc::new(DemoWindow {
        type_name: "DemoMainWindow",
        visible: AtomicBool::new(false),
        logger: registry.get_or_create("Demo.MainWindow"),
    });
    let config_window = Arc::new(DemoWindow {
        type_name: "DemoConfigWindow",
        visible: AtomicBool::new(false),
        logger: registry.get_or_create("Demo.ConfigWindow"),
    });
    let windows = Arc::new(
        LifecycleCoordinator::new("windows")
            .with_binding(surface_binding(bus.clone(), main_window)?)
            .with_binding(surface_binding(bus.clone(), config_window)?),
    );

    let command_logger = registry.get_or_create("Demo.Commands");
    let command_handlers = Arc::new(
        LifecycleCoordinator::new("commands").with_binding(command_binding(
            commands.clone(),
            "/logbridge",
            Arc::new(move |args: &str| {
                command_logger.information(
                    "Command {Command} invoked with {Args}",
                    state_args!["/logbridge", args],
                );
            }),
        )),
    );

    let mut tasks = Vec::new();
    for coordinator in [windows, command_handlers] {
        let signals = host.subscribe();
        tasks.push(tokio::spawn(async move { coordinator.run(signals).await }));
    }

    let mut host_signals = host.subscribe();
    let signal_task = signals::stop_on_signal(host.clone());
    host.start();

    let traffic = registry.get_or_create("Demo.Traffic");
    let mut ticker = tokio::time::interval(HEARTBEAT);
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tick += 1;
                async {
                    traffic.information("Heartbeat {Tick}", state_args![tick]);
                    traffic.debug(
                        "Processed {@Batch}",
                        state_args![ObjectValue::new("Batch").field("Tick", tick).field("Size", 3)],
                    );
                    if tick % 3 == 0 {
                        bus.raise(HostToggle::MainUi);
                        commands.invoke("/logbridge", "status");
                    }
                }
                .instrument(tracing::info_span!("heartbeat", tick))
                .await;
            }
            signal = host_signals.recv() => match signal {
                Ok(HostSignal::Stop) | Err(RecvError::Closed) => break,
                _ => {}
            },
        }
    }

    tracing::info!(
        loggers = registry.len(),
        categories = ?registry.categories(),
        "Stopping host"
    );
    let _ = signal_task.await;
    drop(host);
    for task in tasks {
        if tokio::time::timeout(SHUTDOWN_GRACE, task).await.is_err() {
            tracing::warn!("Coordinator did not stop in time");
        }
    }
    registry.clear();

    tracing::info!("Shutdown complete");
    Ok(())
}
