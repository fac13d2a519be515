use clap::Parser;
use log::{error, info};
use server::config::{GameConfig, ServerConfig};
use server::network::Server;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Side length of the square map
    #[arg(short, long, default_value_t = shared::MAP_SIZE)]
    map_size: f32,

    /// Number of resources kept on the map
    #[arg(short, long, default_value_t = shared::RESOURCE_TARGET)]
    resources: usize,

    /// Simulation ticks per second
    #[arg(short, long, default_value_t = shared::FAST_TICK_RATE)]
    tick_rate: u32,

    /// Snapshots per second
    #[arg(short, long, default_value_t = shared::BROADCAST_RATE)]
    broadcast_rate: u32,

    /// Radius around a head inside which entities are sent
    #[arg(short, long, default_value_t = shared::VIEW_DISTANCE)]
    view_distance: f32,

    /// Maximum concurrent players
    #[arg(short = 'c', long, default_value = "64")]
    max_clients: usize,

    /// Seconds of silence before a player is dropped
    #[arg(long, default_value = "5")]
    client_timeout: u64,

    /// Fixed RNG seed for reproducible worlds
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let server_config = ServerConfig {
        bind_addr: format!("{}:{}", args.host, args.port),
        max_clients: args.max_clients,
        client_timeout: Duration::from_secs(args.client_timeout),
        ..ServerConfig::default()
    };
    let game_config = GameConfig {
        map_size: args.map_size,
        resource_target: args.resources,
        fast_tick_rate: args.tick_rate,
        broadcast_rate: args.broadcast_rate,
        view_distance: args.view_distance,
        seed: args.seed,
        ..GameConfig::default()
    };

    info!("Starting server...");
    info!(
        "Map {}x{}, {} resources, {}Hz simulation, {}Hz broadcast",
        game_config.map_size,
        game_config.map_size,
        game_config.resource_target,
        game_config.fast_tick_rate,
        game_config.broadcast_rate
    );

    let mut server = Server::new(server_config, game_config).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
