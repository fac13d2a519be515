//! # Slither Server Library
//!
//! This library provides the authoritative server for a real-time multiplayer
//! snake arena. Players steer snakes ("agents") across a square map that wraps
//! at its edges, eat resources to grow, and die when their head runs into
//! another agent's body.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! The server owns the only copy of the world. Clients send intents (join,
//! steer, boost, leave); every movement, pickup and death is decided here.
//!
//! ### Two Tick Rates
//! A fast tick (60Hz by default) applies queued commands, moves every agent
//! and resolves collisions. A slower broadcast tick (30Hz by default) builds a
//! view-culled snapshot for each live agent. Both run under exclusive access
//! to the world, so a snapshot never observes a half-applied step.
//!
//! ### Session Management
//! Each UDP address that joins gets a session id, which is also the id of the
//! agent it controls. Sessions that stay silent past the client timeout are
//! dropped and their agents removed.
//!
//! ## Module Organization
//!
//! ### World (`world`, `config`)
//! Agents, resources, the seeded RNG and the game settings that fix the rules
//! for the lifetime of the server.
//!
//! ### Rules (`motion`, `collision`, `resources`, `commands`)
//! - Movement on the wrapping plane and boost decay
//! - Resource pickups, body hits and the resources a dead body leaves behind
//! - Applying client intents to the world
//!
//! ### Output (`visibility`, `tick`)
//! Spatial indexing, leaderboard ranking and per-recipient snapshots, plus the
//! tick passes that tie the rules together and return packets to deliver.
//!
//! ### Runtime (`scheduler`, `network`, `sessions`)
//! The periodic tick tasks, the UDP transport and the session table.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::{GameConfig, ServerConfig};
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new(ServerConfig::default(), GameConfig::default()).await?;
//!
//!     // Runs until a shutdown message arrives:
//!     // - Receives and decodes client packets
//!     // - Feeds commands to the simulation tick
//!     // - Delivers init, death and snapshot packets
//!     // - Drops sessions that time out
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod collision;
pub mod commands;
pub mod config;
pub mod motion;
pub mod network;
pub mod resources;
pub mod scheduler;
pub mod sessions;
pub mod tick;
pub mod visibility;
pub mod world;
