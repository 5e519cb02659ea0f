//! emf - inspect and check EO map files
//!
//! Also replays captured packet streams through the dispatcher, which is
//! handy for checking routing and gating without a server.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use eoclient_config::ClientConfig;
use eoclient_core::{GameState, MapId};
use eoclient_maps::{MapFile, MapFileLoader};
use eoclient_network::{
    spawn_dispatch_loop, DispatchTableBuilder, GameStateRepository, PacketDispatcher, KNOWN_ROUTES,
};
use eoclient_protocol::{EoReader, Packet};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "emf")]
#[command(about = "Inspect, verify and re-checksum EO map files")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to config/settings.ini)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a summary of a map
    Info {
        /// Map file path, or a map id looked up in the maps directory
        map: String,
    },
    /// Check that a map re-encodes to identical bytes
    Verify { map: String },
    /// Print the content checksum of a map
    Checksum {
        map: String,

        /// Store the computed checksum in the file
        #[arg(long)]
        write: bool,
    },
    /// Print a map as JSON
    Dump { map: String },
    /// Dispatch a capture of length-prefixed packets
    Replay {
        /// Capture file: frames of a two-byte length followed by the packet
        capture: PathBuf,

        /// Treat the client as already in game
        #[arg(long)]
        in_game: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => ClientConfig::load_from_file(path),
        None => ClientConfig::load_default(),
    };
    let config = match loaded {
        Ok(config) => {
            initialize_logging(&config.log_level);
            config
        }
        Err(e) => {
            let config = ClientConfig::default();
            initialize_logging(&config.log_level);
            warn!("Failed to load configuration: {}", e);
            warn!("Using default configuration");
            config
        }
    };
    config.display();

    match cli.command {
        Command::Info { map } => info_command(&config, &map),
        Command::Verify { map } => verify_command(&config, &map),
        Command::Checksum { map, write } => checksum_command(&config, &map, write),
        Command::Dump { map } => dump_command(&config, &map),
        Command::Replay { capture, in_game } => replay_command(&config, &capture, in_game).await,
    }
}

/// Log to stderr, honouring `RUST_LOG` before the configured level
fn initialize_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve a map argument to a file path
///
/// An existing path is used as is; otherwise a number is treated as a map
/// id inside the maps directory.
fn resolve_map_path(arg: &str, maps_dir: &Path) -> PathBuf {
    let path = PathBuf::from(arg);
    if path.exists() {
        return path;
    }
    match arg.parse::<u16>() {
        Ok(id) => maps_dir.join(MapFileLoader::file_name(MapId::new(id))),
        Err(_) => path,
    }
}

fn load_map(config: &ClientConfig, arg: &str) -> anyhow::Result<(PathBuf, MapFile)> {
    let path = resolve_map_path(arg, &config.maps_dir);
    let map = MapFileLoader::load_file(&path).with_context(|| format!("loading {}", path.display()))?;
    Ok((path, map))
}

fn info_command(config: &ClientConfig, arg: &str) -> anyhow::Result<()> {
    let (path, map) = load_map(config, arg)?;
    let props = map.properties();
    let computed = map.compute_checksum()?;

    println!("{}", path.display());
    println!("  id:        {}", props.map_id());
    println!("  name:      {}", props.name());
    println!("  size:      {}x{}", props.columns(), props.rows());
    println!("  type:      {:?}", props.map_type());
    println!("  effect:    {:?}", props.effect());
    println!("  music:     {} (control {})", props.music(), props.music_control());
    println!("  ambient:   {}", props.ambient_noise());
    println!("  fill tile: {}", props.fill_tile());
    println!("  relog:     {:?}", props.relog_position());
    println!("  checksum:  {} (content {})", props.checksum(), computed);
    println!("  warps:     {}", map.warps().len());
    println!("  npcs:      {}", map.npc_spawns().len());
    println!("  chests:    {}", map.chests().len());
    println!("  signs:     {}", map.signs().len());
    println!("  unknowns:  {}", map.unknowns().len());
    println!("  trailing:  {} bytes", map.trailing_bytes().len());

    if config.verify_checksums && computed != props.checksum() {
        warn!("Stored checksum {} does not match content checksum {}", props.checksum(), computed);
    }
    Ok(())
}

fn verify_command(config: &ClientConfig, arg: &str) -> anyhow::Result<()> {
    let path = resolve_map_path(arg, &config.maps_dir);
    let original = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;

    let map = MapFile::from_bytes(&original).with_context(|| format!("decoding {}", path.display()))?;
    let encoded = map.to_bytes()?;
    if encoded != original {
        let at = encoded
            .iter()
            .zip(&original)
            .position(|(a, b)| a != b)
            .unwrap_or_else(|| encoded.len().min(original.len()));
        bail!("{} does not round-trip: first difference at byte {}", path.display(), at);
    }

    if config.verify_checksums && !map.verify_checksum()? {
        bail!(
            "{} round-trips but its stored checksum {} is stale",
            path.display(),
            map.properties().checksum()
        );
    }

    println!("{}: ok ({} bytes)", path.display(), original.len());
    Ok(())
}

fn checksum_command(config: &ClientConfig, arg: &str, write: bool) -> anyhow::Result<()> {
    let (path, map) = load_map(config, arg)?;
    let computed = map.compute_checksum()?;
    println!("{}", computed);

    if write && computed != map.properties().checksum() {
        let map = map.with_computed_checksum()?;
        MapFileLoader::save_file(&path, &map)?;
        info!("Updated checksum of {}", path.display());
    }
    Ok(())
}

fn dump_command(config: &ClientConfig, arg: &str) -> anyhow::Result<()> {
    let (_, map) = load_map(config, arg)?;
    println!("{}", serde_json::to_string_pretty(&map)?);
    Ok(())
}

/// Split a capture into packet frames
fn read_frames(data: &[u8]) -> anyhow::Result<Vec<&[u8]>> {
    let mut reader = EoReader::new(data);
    let mut frames = Vec::new();
    while !reader.is_empty() {
        let len = reader.get_short()? as usize;
        frames.push(reader.get_bytes(len)?);
    }
    Ok(frames)
}

async fn replay_command(config: &ClientConfig, capture: &Path, in_game: bool) -> anyhow::Result<()> {
    let data = std::fs::read(capture).with_context(|| format!("reading {}", capture.display()))?;
    let frames = read_frames(&data)?;

    let handled: Arc<Mutex<BTreeMap<String, usize>>> = Arc::default();
    let mut builder = DispatchTableBuilder::new();
    for route in KNOWN_ROUTES.iter() {
        let handled = Arc::clone(&handled);
        builder.register_known(route.key, move |packet: Packet| {
            let handled = Arc::clone(&handled);
            async move {
                tracing::debug!("{}: {} byte body", packet.key(), packet.body.len());
                *handled.lock().entry(packet.key().to_string()).or_insert(0) += 1;
                Ok(())
            }
        })?;
    }

    let state = Arc::new(GameStateRepository::new());
    state.set_state(if in_game { GameState::InGame } else { GameState::Connected });
    let dispatcher = Arc::new(PacketDispatcher::new(builder.build(), state));

    let (sender, receiver) = mpsc::channel(config.dispatch_queue);
    let dispatch_loop = spawn_dispatch_loop(Arc::clone(&dispatcher), receiver);

    let mut malformed = 0usize;
    for frame in &frames {
        match Packet::from_bytes(frame) {
            Ok(packet) => sender.send(packet).await?,
            Err(e) => {
                warn!("Skipping malformed frame: {}", e);
                malformed += 1;
            }
        }
    }
    drop(sender);
    dispatch_loop.await?;

    let handled = handled.lock();
    let total: usize = handled.values().sum();
    for (key, count) in handled.iter() {
        println!("{:<24} {}", key, count);
    }
    println!(
        "{} frames, {} handled, {} dropped, {} malformed",
        frames.len(),
        total,
        frames.len() - total - malformed,
        malformed
    );
    Ok(())
}
