use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use scrobblebar_core::{AppConfig, ListenerKind, PlayerKind, PlayerStatus, Track};
use scrobblebar_engine::{
    DiffKind, GateAction, PollSnapshot, ScrobbleGate, ScrobbleService,
};
use scrobblebar_osa::{OsaBridge, ScriptBridge};
use scrobblebar_players::{collect, fetch_track, registry, resolve};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "scrobblebar",
    about = "Now Playing -> Scrobble Gate for macOS media players"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Run,
    Doctor,
    Status {
        #[arg(long)]
        json: bool,
    },
    Login,
    Logout,
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cmd = cli.command.unwrap_or(Commands::Run);
    let cfg_path = cli.config.unwrap_or_else(default_config_path);

    match cmd {
        Commands::Config {
            action: ConfigAction::Init,
        } => {
            init_config(&cfg_path)?;
            println!("Initialized config at {}", cfg_path.display());
            Ok(())
        }
        Commands::Doctor => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            doctor().await
        }
        Commands::Status { json } => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            status(json).await
        }
        Commands::Login => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            let service = AnnounceService;
            service.begin_login().await?;
            match service.username() {
                Some(name) => println!("Signed in as {name}"),
                None => println!("No scrobble backend is configured."),
            }
            Ok(())
        }
        Commands::Logout => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            AnnounceService.logout().await?;
            println!("Signed out.");
            Ok(())
        }
        Commands::Run => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            run(cfg, cfg_path).await
        }
    }
}

async fn run(mut cfg: AppConfig, cfg_path: PathBuf) -> Result<()> {
    let bridge = OsaBridge::new();
    let mut gate = ScrobbleGate::new(cfg.history_limit);
    let service = AnnounceService;

    info!(
        players = ?PlayerKind::ALL.map(PlayerKind::display_name),
        scrobbling = cfg.scrobbling_enabled,
        "scrobblebar started"
    );

    // The presentation layer subscribes here; the daemon itself only writes.
    let (snapshot_tx, _snapshot_rx) = watch::channel(PollSnapshot::default());

    let (reload_tx, mut reload_rx) = mpsc::channel::<()>(4);
    spawn_reload_watchers(
        cfg_path.clone(),
        cfg.intervals.file_watch_poll_ms,
        reload_tx,
    )
    .await?;

    let mut poll = tokio::time::interval(Duration::from_millis(cfg.intervals.poll_ms));
    let mut refresh = tokio::time::interval(Duration::from_millis(cfg.intervals.refresh_ms));

    loop {
        tokio::select! {
            _ = poll.tick() => {
                // The bridge cannot take overlapping calls, so the whole
                // pipeline is awaited inline; a slow cycle delays the next
                // tick instead of stacking on top of it.
                let (snapshot, diff) = poll_once(&bridge, &mut gate, &cfg, &service).await;
                if diff != DiffKind::Nothing {
                    snapshot_tx.send_replace(snapshot);
                }
            }
            _ = refresh.tick() => {
                // Forced republish: listener processes come and go without
                // producing a track or status diff.
                let snapshot = snapshot_tx.borrow().clone();
                snapshot_tx.send_replace(snapshot);
            }
            msg = reload_rx.recv() => {
                if msg.is_some() {
                    match load_or_default(&cfg_path) {
                        Ok(new_cfg) => {
                            cfg = new_cfg;
                            poll = tokio::time::interval(Duration::from_millis(cfg.intervals.poll_ms));
                            refresh = tokio::time::interval(Duration::from_millis(cfg.intervals.refresh_ms));
                            info!("configuration reloaded");
                        }
                        Err(err) => {
                            error!(error=%err, "failed to reload config");
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("received ctrl-c; shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// One full pipeline pass: discover, resolve, fetch, gate, dispatch.
async fn poll_once(
    bridge: &dyn ScriptBridge,
    gate: &mut ScrobbleGate,
    cfg: &AppConfig,
    service: &dyn ScrobbleService,
) -> (PollSnapshot, DiffKind) {
    let players = collect(bridge, &PlayerKind::ALL).await;
    let active = resolve(&players);
    let track = match &active {
        Some(player) => fetch_track(bridge, player).await,
        None => None,
    };
    let status = active.map(|p| p.status).unwrap_or(PlayerStatus::NotOpen);

    let out = gate.tick(track.clone(), status);
    if cfg.scrobbling_enabled {
        dispatch(out.actions, service).await;
    }

    (
        PollSnapshot {
            player: active,
            track,
        },
        out.diff,
    )
}

/// Submissions are best-effort: a failure is logged and the gate's state
/// stands, so a flaky service can only ever lose a play, never wedge the
/// pipeline.
async fn dispatch(actions: Vec<GateAction>, service: &dyn ScrobbleService) {
    for action in actions {
        match action {
            GateAction::NowPlaying(track) => {
                if let Err(err) = service.report_now_playing(&track).await {
                    warn!(error=%err, "now-playing report failed; not retrying");
                }
            }
            GateAction::Submit(track) => {
                let start = unix_now() - track.position;
                if let Err(err) = service.submit_play(&track, start).await {
                    warn!(error=%err, "scrobble submission failed; not retrying");
                }
            }
        }
    }
}

/// Tracing-backed scrobble sink. The logging service's protocol, login flow
/// and credential storage live outside this daemon; this sink records what
/// would have been sent.
struct AnnounceService;

#[async_trait]
impl ScrobbleService for AnnounceService {
    async fn report_now_playing(&self, track: &Track) -> Result<()> {
        info!(title = %track.title, artist = %track.artist, "now playing");
        Ok(())
    }

    async fn submit_play(&self, track: &Track, start_unix: i64) -> Result<()> {
        info!(
            title = %track.title,
            artist = %track.artist,
            album = %track.album,
            start_unix,
            "scrobble submitted"
        );
        Ok(())
    }

    fn username(&self) -> Option<String> {
        None
    }

    async fn begin_login(&self) -> Result<()> {
        info!("login requested; no scrobble backend is configured");
        Ok(())
    }

    async fn logout(&self) -> Result<()> {
        Ok(())
    }
}

async fn status(json: bool) -> Result<()> {
    let bridge = OsaBridge::new();
    let players = collect(&bridge, &PlayerKind::ALL).await;
    let active = resolve(&players);
    let track = match &active {
        Some(player) => fetch_track(&bridge, player).await,
        None => None,
    };
    let snapshot = PollSnapshot {
        player: active,
        track,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    match &snapshot.player {
        Some(player) => {
            println!("player: {}", player.kind.display_name());
            println!("state: {:?}", player.status);
            println!(
                "scrobbling: {}",
                if player.scrobbling {
                    "ready"
                } else {
                    "no listener running"
                }
            );
        }
        None => println!("player: <none>"),
    }

    match &snapshot.track {
        Some(track) => {
            println!("track: {} - {}", track.artist, track.title);
            if !track.album.is_empty() {
                println!("album: {}", track.album);
            }
            if track.duration > 0 {
                println!("position: {}s / {}s", track.position, track.duration);
            }
        }
        None => println!("track: <none>"),
    }

    let service = AnnounceService;
    match service.username() {
        Some(name) => println!("scrobble account: {name}"),
        None => println!("scrobble account: not signed in"),
    }

    Ok(())
}

async fn doctor() -> Result<()> {
    println!("== scrobblebar doctor ==");
    let bridge = OsaBridge::new();

    match bridge.run_script("return 1 + 2", &[]).await {
        Ok(out) if out == "3" => println!("osascript channel: ok"),
        Ok(out) => println!("osascript channel: unexpected reply ({out})"),
        Err(err) => println!("osascript channel: failed ({err})"),
    }

    let player_ids: Vec<&str> = PlayerKind::ALL.iter().map(|k| k.bundle_id()).collect();
    let installed = registry::check_installed(&bridge, &player_ids).await;
    let running = registry::check_running(&bridge, &player_ids).await;
    for ((kind, installed), running) in PlayerKind::ALL.iter().zip(installed).zip(running) {
        println!(
            "player {}: installed={installed} running={running}",
            kind.display_name()
        );
    }

    let listener_ids: Vec<&str> = ListenerKind::ALL.iter().map(|l| l.bundle_id()).collect();
    let listeners = registry::check_running(&bridge, &listener_ids).await;
    for (listener, running) in ListenerKind::ALL.iter().zip(listeners) {
        println!("listener {}: running={running}", listener.display_name());
    }

    println!(
        "macOS automation: verify System Settings > Privacy & Security > Automation allows this binary to control your players"
    );

    Ok(())
}

fn default_config_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("scrobblebar").join("config.toml")
}

fn init_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let cfg = AppConfig::default();
    let toml = toml::to_string_pretty(&cfg)?;
    std::fs::write(path, toml)
        .with_context(|| format!("failed to write config file {}", path.display()))?;
    Ok(())
}

fn load_or_default(path: &Path) -> Result<AppConfig> {
    let mut cfg = if !path.exists() {
        AppConfig::default()
    } else {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))?
    };
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

fn apply_env_overrides(cfg: &mut AppConfig) {
    if let Ok(v) = std::env::var("SCROBBLEBAR_LOG_LEVEL") {
        if !v.trim().is_empty() {
            cfg.log_level = v;
        }
    }
    if let Ok(v) = std::env::var("SCROBBLEBAR_SCROBBLING_ENABLED") {
        if let Ok(parsed) = v.parse::<bool>() {
            cfg.scrobbling_enabled = parsed;
        }
    }
    if let Ok(v) = std::env::var("SCROBBLEBAR_POLL_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            cfg.intervals.poll_ms = parsed;
        }
    }
}

fn init_logging(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

async fn spawn_reload_watchers(path: PathBuf, poll_ms: u64, tx: mpsc::Sender<()>) -> Result<()> {
    let tx_poll = tx.clone();
    tokio::spawn(async move {
        let mut known_mtime = file_mtime(&path);
        let sleep = Duration::from_millis(poll_ms.max(2_000));
        loop {
            tokio::time::sleep(sleep).await;
            let current = file_mtime(&path);
            if current.is_some() && current != known_mtime {
                known_mtime = current;
                let _ = tx_poll.send(()).await;
            }
        }
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let tx_hup = tx.clone();
        tokio::spawn(async move {
            if let Ok(mut sig) = signal(SignalKind::hangup()) {
                while sig.recv().await.is_some() {
                    let _ = tx_hup.send(()).await;
                }
            }
        });
    }

    Ok(())
}

fn file_mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).ok()?.modified().ok()
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
