//! Client intents applied to the world
//!
//! Commands arrive from the network layer at any time but are queued and
//! applied at the start of a fast tick. Every command except `Join` is a
//! no-op when its agent is missing or dead.

use crate::world::{Agent, World};
use log::{debug, info};
use shared::{Packet, Vec2};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Join { id: u32, nickname: Option<String> },
    SetHeading { id: u32, x: f32, y: f32 },
    BoostStart { id: u32 },
    BoostEnd { id: u32 },
    Leave { id: u32 },
}

impl Command {
    pub fn id(&self) -> u32 {
        match self {
            Command::Join { id, .. }
            | Command::SetHeading { id, .. }
            | Command::BoostStart { id }
            | Command::BoostEnd { id }
            | Command::Leave { id } => *id,
        }
    }
}

/// Applies a command. Returns the reply for the issuing client, if any.
pub fn apply_command(world: &mut World, command: Command) -> Option<Packet> {
    match command {
        Command::Join { id, nickname } => {
            let (player_id, map_size) = join(world, id, nickname.as_deref());
            Some(Packet::Init {
                player_id,
                map_size,
            })
        }
        Command::SetHeading { id, x, y } => {
            set_heading(world, id, x, y);
            None
        }
        Command::BoostStart { id } => {
            set_boost(world, id, true);
            None
        }
        Command::BoostEnd { id } => {
            set_boost(world, id, false);
            None
        }
        Command::Leave { id } => {
            leave(world, id);
            None
        }
    }
}

/// Spawns a fresh agent for `id` at a random position. Any previous agent
/// under the same id, alive or awaiting removal, is replaced.
pub fn join(world: &mut World, id: u32, nickname: Option<&str>) -> (u32, f32) {
    let head = world.random_position();
    let color = world.random_agent_color();
    let agent = Agent::new(id, nickname, head, color, &world.config);

    info!(
        "{} joined as agent {} at ({:.1}, {:.1})",
        agent.nickname, id, head.x, head.y
    );
    if world.insert_agent(agent).is_some() {
        debug!("Agent {} replaced its previous body", id);
    }

    (id, world.config.map_size)
}

/// Points the agent's heading from its head toward `(x, y)`. A target equal
/// to the head leaves the heading unchanged.
pub fn set_heading(world: &mut World, id: u32, x: f32, y: f32) {
    let Some(agent) = world.live_agent_mut(id) else {
        return;
    };
    if !x.is_finite() || !y.is_finite() {
        return;
    }
    if let Some(heading) = (Vec2::new(x, y) - agent.head()).normalize() {
        agent.heading = heading;
    }
}

pub fn set_boost(world: &mut World, id: u32, boosting: bool) {
    if let Some(agent) = world.live_agent_mut(id) {
        agent.boosting = boosting;
        if !boosting {
            agent.boost_debt = 0.0;
        }
    }
}

/// Removes the agent at once; a clean disconnect has no grace window.
pub fn leave(world: &mut World, id: u32) {
    if let Some(agent) = world.remove_agent(id) {
        info!("{} (agent {}) left", agent.nickname, id);
    }
}
