//! Entry point for the **hyprzones** daemon.
//!
//! Spawns the event sources (command socket, Hyprland event stream and the
//! desktop watcher) on background threads and processes incoming events on
//! the main thread.  Editor launch requests are printed as JSON lines on
//! stdout for a wrapper script to act on.

use hyprzones::config::Config;
use hyprzones::editor::EditorCommand;
use hyprzones::engine::ZoneEngine;
use hyprzones::event::{DisplayChangeKind, Event};
use hyprzones::hyprland::events::HyprlandEventSource;
use hyprzones::hyprland::wm::HyprlandWm;
use hyprzones::ipc::listener::UnixSocketListener;
use hyprzones::store::MemoryStore;
use hyprzones::traits::EventSource;
use hyprzones::watcher::DesktopWatcher;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::mpsc;

/// Default socket path for the event listener.
fn default_socket_path() -> String {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    format!("{}/hyprzones.sock", runtime)
}

/// `--config <path>` if given.
fn config_arg() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

/// Load the config from `--config` or the default location, falling back
/// to compiled-in defaults.
fn load_config() -> Config {
    let Some(path) = config_arg().or_else(Config::default_path) else {
        info!("no config location, using defaults");
        return Config::default();
    };
    match Config::load_or_default(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            warn!("{}, using defaults", e);
            Config::default()
        }
    }
}

fn open_store(config: &Config) -> MemoryStore {
    let default_layout = config.default_layout();
    let Some(path) = &config.store_path else {
        return MemoryStore::new(default_layout);
    };
    match MemoryStore::open(path, default_layout.clone()) {
        Ok(store) => store,
        Err(e) => {
            error!("cannot open layout store {}: {}", path.display(), e);
            MemoryStore::new(default_layout)
        }
    }
}

//  Main

fn main() {
    env_logger::init();

    let config = load_config();
    let store = open_store(&config);

    let mut engine = ZoneEngine::new(HyprlandWm::new(), HyprlandWm::new(), store, config.settings);

    let (editor_tx, editor_rx) = mpsc::channel::<EditorCommand>();
    engine.set_editor(editor_tx);
    spawn_editor_relay(editor_rx);

    let (event_tx, event_rx) = mpsc::channel::<Event>();
    if event_tx
        .send(Event::DisplayChanged(DisplayChangeKind::Initialization))
        .is_err()
    {
        return;
    }
    let watcher = DesktopWatcher::new(HyprlandWm::new()).spawn(event_tx.clone());
    spawn_event_sources(event_tx);

    engine.run(event_rx);
    watcher.stop();
}

//  Helpers

fn spawn_event_sources(tx: mpsc::Sender<Event>) {
    {
        let tx = tx.clone();
        let path = default_socket_path();
        std::thread::spawn(move || {
            let mut source = UnixSocketListener::new(&path);
            if let Err(e) = source.run(tx) {
                error!("socket listener error: {}", e);
            }
        });
    }

    std::thread::spawn(move || {
        let mut source = HyprlandEventSource::new();
        if let Err(e) = source.run(tx) {
            error!("hyprland event source error: {}", e);
        }
    });
}

/// Print editor commands for whoever launches the editor.  The editor
/// reports back by sending `EditorExit` to the command socket.
fn spawn_editor_relay(rx: mpsc::Receiver<EditorCommand>) {
    std::thread::spawn(move || {
        for command in rx {
            match serde_json::to_string(&command) {
                Ok(line) => println!("{}", line),
                Err(e) => error!("cannot encode editor command: {}", e),
            }
        }
    });
}
