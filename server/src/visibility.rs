//! Per-client visibility and snapshot assembly
//!
//! Each broadcast pass buckets resources and agent heads into a uniform grid
//! whose cells are one view distance wide. A recipient then only inspects
//! the 3x3 block of cells around its own head, so the cost per recipient
//! follows local density rather than world size. The leaderboard is built
//! once per pass and shared by every snapshot.

use crate::tick::Outbound;
use crate::world::World;
use shared::{AgentView, LeaderboardEntry, Packet, Resource, Vec2};

/// Upper bound on grid columns per axis.
pub const MAX_GRID_COLS: f32 = 64.0;

/// Uniform bucket grid over the map, storing indices into a caller-owned list.
pub struct SpatialGrid {
    cell_size: f32,
    cols: usize,
    cells: Vec<Vec<usize>>,
}

impl SpatialGrid {
    /// Cells are never narrower than `map_size / MAX_GRID_COLS`. A wider
    /// cell still holds every point within `cell_size` of the 3x3 block.
    pub fn new(map_size: f32, cell_size: f32) -> Self {
        let cell_size = cell_size.max(map_size / MAX_GRID_COLS);
        let cols = ((map_size / cell_size).ceil() as usize).max(1);
        Self {
            cell_size,
            cols,
            cells: vec![Vec::new(); cols * cols],
        }
    }

    /// Points outside the map are clamped into the border cells, which keeps
    /// neighbour lookups correct for them.
    fn cell_of(&self, point: &Vec2) -> (usize, usize) {
        let col = (point.x / self.cell_size).floor().max(0.0) as usize;
        let row = (point.y / self.cell_size).floor().max(0.0) as usize;
        (col.min(self.cols - 1), row.min(self.cols - 1))
    }

    pub fn insert(&mut self, point: &Vec2, index: usize) {
        let (col, row) = self.cell_of(point);
        self.cells[row * self.cols + col].push(index);
    }

    /// Indices stored in the cell containing `point` and its neighbours.
    pub fn nearby(&self, point: &Vec2) -> impl Iterator<Item = usize> + '_ {
        let (col, row) = self.cell_of(point);
        let cols = self.cols;
        let row_range = row.saturating_sub(1)..=(row + 1).min(cols - 1);

        row_range.flat_map(move |r| {
            let col_range = col.saturating_sub(1)..=(col + 1).min(cols - 1);
            col_range.flat_map(move |c| self.cells[r * cols + c].iter().copied())
        })
    }
}

/// Top alive agents by descending score. Equal scores keep ascending id order.
pub fn leaderboard(world: &World) -> Vec<LeaderboardEntry> {
    let config = &world.config;
    let mut ranked: Vec<(u32, &str)> = world
        .agent_ids_sorted()
        .into_iter()
        .filter_map(|id| world.agent(id))
        .filter(|agent| agent.alive)
        .map(|agent| (agent.score(config), agent.nickname.as_str()))
        .collect();

    ranked.sort_by(|a, b| b.0.cmp(&a.0));

    ranked
        .into_iter()
        .take(config.leaderboard_size)
        .map(|(score, nickname)| LeaderboardEntry {
            nickname: nickname.to_string(),
            score,
        })
        .collect()
}

/// Read-only index over one broadcast pass.
pub struct VisibilityIndex<'a> {
    world: &'a World,
    agent_ids: Vec<u32>,
    agent_grid: SpatialGrid,
    resource_grid: SpatialGrid,
    leaderboard: Vec<LeaderboardEntry>,
}

impl<'a> VisibilityIndex<'a> {
    pub fn build(world: &'a World) -> Self {
        let config = &world.config;

        let agent_ids: Vec<u32> = world
            .agent_ids_sorted()
            .into_iter()
            .filter(|id| world.agent(*id).is_some_and(|agent| agent.alive))
            .collect();

        let mut agent_grid = SpatialGrid::new(config.map_size, config.view_distance);
        for (index, id) in agent_ids.iter().enumerate() {
            if let Some(agent) = world.agent(*id) {
                agent_grid.insert(&agent.head(), index);
            }
        }

        let mut resource_grid = SpatialGrid::new(config.map_size, config.view_distance);
        for (index, resource) in world.resources().iter().enumerate() {
            resource_grid.insert(&resource.position, index);
        }

        Self {
            world,
            agent_ids,
            agent_grid,
            resource_grid,
            leaderboard: leaderboard(world),
        }
    }

    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    /// Alive agents whose heads lie strictly within view of `center`,
    /// ordered by id.
    pub fn visible_agents(&self, center: &Vec2) -> Vec<AgentView> {
        let config = &self.world.config;
        let mut indices: Vec<usize> = self
            .agent_grid
            .nearby(center)
            .filter(|&index| {
                self.world
                    .agent(self.agent_ids[index])
                    .is_some_and(|agent| agent.head().distance(center) < config.view_distance)
            })
            .collect();
        indices.sort_unstable();

        indices
            .into_iter()
            .filter_map(|index| self.world.agent(self.agent_ids[index]))
            .map(|agent| agent.to_view(config))
            .collect()
    }

    /// Resources strictly within view of `center`.
    pub fn visible_resources(&self, center: &Vec2) -> Vec<Resource> {
        let view_distance = self.world.config.view_distance;
        let resources = self.world.resources();

        self.resource_grid
            .nearby(center)
            .map(|index| &resources[index])
            .filter(|resource| resource.position.distance(center) < view_distance)
            .cloned()
            .collect()
    }

    /// Snapshot for one recipient, or `None` when it has no live agent.
    pub fn snapshot_for(&self, recipient: u32) -> Option<Packet> {
        let agent = self.world.agent(recipient).filter(|agent| agent.alive)?;
        let head = agent.head();

        Some(Packet::GameState {
            agents: self.visible_agents(&head),
            resources: self.visible_resources(&head),
            leaderboard: self.leaderboard.clone(),
        })
    }
}

/// Builds one snapshot per live agent.
pub fn snapshots(world: &World) -> Vec<Outbound> {
    let index = VisibilityIndex::build(world);
    index
        .agent_ids
        .iter()
        .filter_map(|&recipient| {
            index
                .snapshot_for(recipient)
                .map(|packet| Outbound { recipient, packet })
        })
        .collect()
}
