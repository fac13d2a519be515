//! Authoritative world state
//!
//! The [`World`] owns every agent and resource. Other modules mutate it only
//! through the methods here, always while holding the tick lock. Score and
//! radius are computed from body length on demand and never stored.

use crate::config::GameConfig;
use crate::resources;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{AgentView, Resource, Vec2};
use std::collections::{HashMap, VecDeque};

const AGENT_COLORS: [&str; 8] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#FFA07A", "#98D8C8", "#F7DC6F", "#BB8FCE", "#85C1E2",
];

const MAX_NICKNAME_CHARS: usize = 16;

/// A player's snake.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: u32,
    pub nickname: String,
    /// Body points, head first.
    pub segments: VecDeque<Vec2>,
    /// Unit vector.
    pub heading: Vec2,
    pub boosting: bool,
    pub color: String,
    pub alive: bool,
    /// Fractional tail loss carried between boosting ticks.
    pub boost_debt: f32,
    /// Fast tick at which a dead agent may be removed.
    pub remove_at_tick: Option<u64>,
}

impl Agent {
    /// Creates an agent with its head at `head` and the rest of the body laid
    /// out behind it along -x, wrapped onto the map.
    pub fn new(
        id: u32,
        nickname: Option<&str>,
        head: Vec2,
        color: String,
        config: &GameConfig,
    ) -> Self {
        let segments = (0..config.initial_length)
            .map(|i| {
                Vec2::new(head.x - i as f32 * config.segment_radius, head.y).wrap(config.map_size)
            })
            .collect();

        Self {
            id,
            nickname: display_name(id, nickname),
            segments,
            heading: Vec2::new(1.0, 0.0),
            boosting: false,
            color,
            alive: true,
            boost_debt: 0.0,
            remove_at_tick: None,
        }
    }

    pub fn head(&self) -> Vec2 {
        self.segments[0]
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn score(&self, config: &GameConfig) -> u32 {
        self.len().saturating_sub(config.initial_length) as u32 * config.score_per_segment
    }

    /// Grows slowly with body length.
    pub fn radius(&self, config: &GameConfig) -> f32 {
        config.segment_radius + (self.len() as f32).sqrt() * 0.3
    }

    pub fn speed(&self, config: &GameConfig) -> f32 {
        if self.boosting {
            config.boost_speed
        } else {
            config.base_speed
        }
    }

    /// Appends `amount` copies of the tail point. They spread out over the
    /// following ticks as the body is dragged forward.
    pub fn grow(&mut self, amount: u32) {
        if let Some(tail) = self.segments.back().copied() {
            for _ in 0..amount {
                self.segments.push_back(tail);
            }
        }
    }

    pub fn to_view(&self, config: &GameConfig) -> AgentView {
        AgentView {
            id: self.id,
            nickname: self.nickname.clone(),
            segments: self
                .segments
                .iter()
                .take(config.snapshot_segments)
                .copied()
                .collect(),
            color: self.color.clone(),
            score: self.score(config),
            radius: self.radius(config),
        }
    }
}

/// Trims and caps a requested nickname, falling back to a name derived from
/// the id.
fn display_name(id: u32, nickname: Option<&str>) -> String {
    match nickname.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => name.chars().take(MAX_NICKNAME_CHARS).collect(),
        None => {
            let short: String = id.to_string().chars().take(4).collect();
            format!("Player{}", short)
        }
    }
}

pub struct World {
    pub config: GameConfig,
    /// Completed fast ticks.
    pub tick: u64,
    agents: HashMap<u32, Agent>,
    resources: Vec<Resource>,
    rng: StdRng,
}

impl World {
    /// Builds an empty world and fills it to the resource target.
    pub fn new(config: GameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut world = Self {
            config,
            tick: 0,
            agents: HashMap::new(),
            resources: Vec::new(),
            rng,
        };
        resources::populate(&mut world);

        info!(
            "World initialised: {}x{} map, {} resources",
            world.config.map_size,
            world.config.map_size,
            world.resources.len()
        );
        world
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn random_position(&mut self) -> Vec2 {
        let size = self.config.map_size;
        Vec2::new(self.rng.gen_range(0.0..size), self.rng.gen_range(0.0..size))
    }

    pub fn random_agent_color(&mut self) -> String {
        AGENT_COLORS[self.rng.gen_range(0..AGENT_COLORS.len())].to_string()
    }

    pub fn agent(&self, id: u32) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub fn agent_mut(&mut self, id: u32) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    /// The agent with this id, only while it is alive.
    pub fn live_agent_mut(&mut self, id: u32) -> Option<&mut Agent> {
        self.agents.get_mut(&id).filter(|agent| agent.alive)
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn agents_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.agents.values_mut()
    }

    /// Agent ids in ascending order, for passes that must not depend on hash
    /// iteration order.
    pub fn agent_ids_sorted(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.agents.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn alive_count(&self) -> usize {
        self.agents.values().filter(|agent| agent.alive).count()
    }

    /// Inserts an agent, replacing any previous agent with the same id.
    pub fn insert_agent(&mut self, agent: Agent) -> Option<Agent> {
        debug_assert!(agent.len() >= self.config.initial_length);
        self.agents.insert(agent.id, agent)
    }

    pub fn remove_agent(&mut self, id: u32) -> Option<Agent> {
        self.agents.remove(&id)
    }

    /// Flags an agent as dead and schedules its removal after the grace window.
    pub fn mark_dead(&mut self, id: u32) {
        let remove_at = self.tick + self.config.death_grace_ticks;
        if let Some(agent) = self.agents.get_mut(&id) {
            agent.alive = false;
            agent.boosting = false;
            agent.remove_at_tick = Some(remove_at);
        }
    }

    /// Removes dead agents whose grace window has elapsed. Returns their ids.
    pub fn sweep_dead(&mut self) -> Vec<u32> {
        let tick = self.tick;
        let expired: Vec<u32> = self
            .agents
            .values()
            .filter(|agent| !agent.alive && agent.remove_at_tick.is_some_and(|at| at <= tick))
            .map(|agent| agent.id)
            .collect();

        for id in &expired {
            self.agents.remove(id);
        }
        expired
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn push_resource(&mut self, resource: Resource) {
        self.resources.push(resource);
    }

    /// Removes the resource at `index`. Resource order carries no meaning, so
    /// the last resource takes its slot.
    pub fn take_resource(&mut self, index: usize) -> Resource {
        self.resources.swap_remove(index)
    }
}
