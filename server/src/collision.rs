//! Collision resolution, run once per fast tick after movement
//!
//! Resource pickups are resolved first, then agent-versus-agent hits. Hits
//! are detected against a single view of the world and applied afterwards,
//! so when two heads cross each other's bodies in the same tick both agents
//! die regardless of which one is examined first.

use crate::resources;
use crate::world::World;
use log::info;
use shared::{circles_overlap, Vec2};

/// A death produced by this tick. Routed only to the victim.
#[derive(Debug, Clone, PartialEq)]
pub struct Death {
    pub victim: u32,
    pub killer: u32,
    pub killer_name: String,
    /// Victim's score at the moment of death.
    pub score: u32,
    pub resources_spawned: usize,
}

/// Runs pickups and agent collisions. Returns the deaths of this tick.
pub fn resolve(world: &mut World) -> Vec<Death> {
    resolve_pickups(world);
    let kills = detect_kills(world);
    apply_deaths(world, kills)
}

/// Consumes every resource under a live head and replaces each one
/// immediately. Returns the number of pickups.
pub fn resolve_pickups(world: &mut World) -> usize {
    let mut pickups = 0;

    for id in world.agent_ids_sorted() {
        let (head, radius) = match world.agent(id) {
            Some(agent) if agent.alive => (agent.head(), agent.radius(&world.config)),
            _ => continue,
        };

        let hits: Vec<usize> = world
            .resources()
            .iter()
            .enumerate()
            .filter(|(_, resource)| {
                circles_overlap(&head, radius, &resource.position, resource.radius)
            })
            .map(|(index, _)| index)
            .collect();

        // Descending so that swap removal never disturbs a pending index
        for &index in hits.iter().rev() {
            let resource = world.take_resource(index);
            if let Some(agent) = world.agent_mut(id) {
                agent.grow(resource.value);
            }
            resources::replenish(world);
            pickups += 1;
        }
    }

    pickups
}

struct Contender {
    id: u32,
    head: Vec2,
    radius: f32,
}

/// Finds every (victim, killer) pair where the victim's head overlaps the
/// killer's body past its head region. Each victim gets at most one killer.
fn detect_kills(world: &World) -> Vec<(u32, u32)> {
    let config = &world.config;
    let contenders: Vec<Contender> = world
        .agent_ids_sorted()
        .into_iter()
        .filter_map(|id| world.agent(id))
        .filter(|agent| agent.alive)
        .map(|agent| Contender {
            id: agent.id,
            head: agent.head(),
            radius: agent.radius(config),
        })
        .collect();

    let mut kills = Vec::new();
    for attacker in &contenders {
        for other in &contenders {
            if other.id == attacker.id {
                continue;
            }
            let Some(body) = world.agent(other.id) else {
                continue;
            };
            let hit = body
                .segments
                .iter()
                .skip(config.head_exclusion)
                .any(|segment| {
                    circles_overlap(&attacker.head, attacker.radius, segment, other.radius)
                });
            if hit {
                kills.push((attacker.id, other.id));
                break;
            }
        }
    }
    kills
}

fn apply_deaths(world: &mut World, kills: Vec<(u32, u32)>) -> Vec<Death> {
    let mut deaths = Vec::with_capacity(kills.len());

    for (victim_id, killer_id) in kills {
        let Some(victim) = world.agent(victim_id).cloned() else {
            continue;
        };
        let killer_name = world
            .agent(killer_id)
            .map(|killer| killer.nickname.clone())
            .unwrap_or_default();
        let score = victim.score(&world.config);

        let resources_spawned = resources::spawn_from_body(world, &victim);
        world.mark_dead(victim_id);

        info!(
            "{} (id {}) was killed by {} (id {}) with score {}",
            victim.nickname, victim_id, killer_name, killer_id, score
        );

        deaths.push(Death {
            victim: victim_id,
            killer: killer_id,
            killer_name,
            score,
            resources_spawned,
        });
    }

    deaths
}
