//! Host lifecycle, coordinators and configuration reload.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use logbridge::backend::SinkControl;
use logbridge::config::{ConfigSources, ConfigWatcher, LayerKind};
use logbridge::lifecycle::{
    command_binding, surface_binding, CommandRegistry, HostLifecycle, HostToggle,
    LifecycleCoordinator, ToggleBus, UiSurface,
};
use logbridge::{state_args, LogLevel};

mod common;

struct CountingWindow {
    type_name: &'static str,
    toggles: AtomicUsize,
}

impl UiSurface for CountingWindow {
    fn type_name(&self) -> &str {
        self.type_name
    }

    fn toggle(&self) {
        self.toggles.fetch_add(1, Ordering::SeqCst);
    }
}

fn window(type_name: &'static str) -> Arc<CountingWindow> {
    Arc::new(CountingWindow {
        type_name,
        toggles: AtomicUsize::new(0),
    })
}

/// Let spawned coordinators drain pending host signals.
async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::test]
async fn test_coordinators_follow_host() {
    let host = HostLifecycle::new();
    let bus = Arc::new(ToggleBus::new());
    let commands = Arc::new(CommandRegistry::new());
    let main = window("StatsMainWindow");
    let config = window("StatsConfigWindow");
    let invoked = Arc::new(AtomicUsize::new(0));

    let windows = Arc::new(
        LifecycleCoordinator::new("windows")
            .with_binding(surface_binding(bus.clone(), main.clone()).unwrap())
            .with_binding(surface_binding(bus.clone(), config.clone()).unwrap()),
    );
    let counter = invoked.clone();
    let handlers = Arc::new(LifecycleCoordinator::new("commands").with_binding(
        command_binding(
            commands.clone(),
            "/stats",
            Arc::new(move |_: &str| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        ),
    ));

    let tasks: Vec<_> = [windows.clone(), handlers.clone()]
        .into_iter()
        .map(|coordinator| {
            let signals = host.subscribe();
            tokio::spawn(async move { coordinator.run(signals).await })
        })
        .collect();

    host.start();
    settle().await;
    assert!(windows.is_running() && handlers.is_running());

    bus.raise(HostToggle::MainUi);
    bus.raise(HostToggle::ConfigUi);
    bus.raise(HostToggle::ConfigUi);
    assert!(commands.invoke("/stats", ""));
    assert_eq!(main.toggles.load(Ordering::SeqCst), 1);
    assert_eq!(config.toggles.load(Ordering::SeqCst), 2);
    assert_eq!(invoked.load(Ordering::SeqCst), 1);

    host.stop();
    settle().await;
    assert!(!windows.is_running());
    assert_eq!(bus.raise(HostToggle::MainUi), 0);
    assert!(!commands.invoke("/stats", ""));

    drop(host);
    for task in tasks {
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
    }
}

#[tokio::test]
async fn test_reload_adjusts_sink_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let base = common::write_config(
        dir.path(),
        "logbridge.toml",
        "[logging]\nminimum_level = \"warning\"\n",
    );
    let sources = ConfigSources::new().with_layer(LayerKind::Base, &base);
    let config = sources.load().unwrap();

    let control = SinkControl::from_config(&config);
    let (registry, lines) = common::json_bridge("Reload", control.clone());
    let logger = registry.get_or_create("Watcher");
    logger.information("dropped {N}", state_args![1]);
    assert!(lines.lines().is_empty());

    let (watcher, mut updates) = ConfigWatcher::new(sources);
    let _guard = watcher.run().unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    std::fs::write(&base, "[logging]\nminimum_level = \"debug\"\n").unwrap();

    tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(next) = updates.recv().await {
            control.apply(&next);
            if control.minimum_level() == LogLevel::Debug {
                break;
            }
        }
    })
    .await
    .unwrap();

    logger.debug("kept {N}", state_args![2]);
    assert_eq!(lines.lines().len(), 1);
}

#[test]
fn test_layered_sources_feed_bridge() {
    let dir = tempfile::tempdir().unwrap();
    common::write_config(
        dir.path(),
        "logbridge.yaml",
        "plugin:\n  name: Layered\nlogging:\n  minimum_level: error\n",
    );
    common::write_config(
        dir.path(),
        "logbridge.dev.json",
        r#"{"logging": {"minimum_level": "trace"}}"#,
    );

    let config = ConfigSources::conventional(dir.path(), Some("dev"), None)
        .load()
        .unwrap();
    assert_eq!(config.plugin.name, "Layered");

    let control = SinkControl::from_config(&config);
    let (registry, lines) = common::json_bridge(&config.plugin.name, control);
    registry.get_or_create("Layers").trace("deep {Level}", state_args!["trace"]);

    let lines = lines.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("[Layered] [Layers] deep {Level}"));
}
