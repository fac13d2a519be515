//! Tick transactions
//!
//! A fast tick and a slow tick are each a single pass over the world run
//! under exclusive access. They return the packets to deliver instead of
//! sending anything themselves, so no I/O happens while the world is held.

use crate::collision;
use crate::commands::{apply_command, Command};
use crate::motion;
use crate::visibility;
use crate::world::World;
use log::debug;
use shared::Packet;

/// A packet addressed to one client.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub recipient: u32,
    pub packet: Packet,
}

/// One simulation step: removals whose grace window expired, queued
/// commands, movement, then collisions.
pub fn fast_tick(world: &mut World, commands: Vec<Command>) -> Vec<Outbound> {
    world.tick += 1;
    let mut outbound = Vec::new();

    for id in world.sweep_dead() {
        debug!("Removed dead agent {}", id);
    }

    for command in commands {
        let recipient = command.id();
        if let Some(packet) = apply_command(world, command) {
            outbound.push(Outbound { recipient, packet });
        }
    }

    motion::integrate(world);

    for death in collision::resolve(world) {
        outbound.push(Outbound {
            recipient: death.victim,
            packet: Packet::PlayerDied {
                killer_id: death.killer,
                killer_name: death.killer_name,
                score: death.score,
            },
        });
    }

    debug_assert!(world.resource_count() >= world.config.resource_target);
    outbound
}

/// One broadcast step: a snapshot for every live agent.
pub fn slow_tick(world: &World) -> Vec<Outbound> {
    visibility::snapshots(world)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::world::tests::{agent_at, test_config};
    use assert_approx_eq::assert_approx_eq;
    use shared::Vec2;

    #[test]
    fn test_join_reply_and_first_step() {
        let mut world = World::new(test_config());

        let outbound = fast_tick(
            &mut world,
            vec![Command::Join {
                id: 1,
                nickname: None,
            }],
        );

        assert_eq!(outbound.len(), 1);
        assert_eq!(outbound[0].recipient, 1);
        assert!(matches!(outbound[0].packet, Packet::Init { player_id: 1, .. }));
        assert_eq!(world.tick, 1);
        assert_eq!(world.agent(1).unwrap().len(), world.config.initial_length);
    }

    #[test]
    fn test_agent_moves_one_step_per_tick() {
        let config = test_config();
        let mut world = World::new(config.clone());
        world.insert_agent(agent_at(1, 100.0, 100.0, &config));

        fast_tick(&mut world, Vec::new());

        let agent = world.agent(1).unwrap();
        assert_approx_eq!(agent.head().x, 102.5, 1e-4);
        assert_approx_eq!(agent.head().y, 100.0, 1e-4);
        assert_eq!(agent.len(), 10);
    }

    #[test]
    fn test_commands_apply_before_movement() {
        let config = test_config();
        let mut world = World::new(config.clone());
        world.insert_agent(agent_at(1, 100.0, 100.0, &config));

        fast_tick(
            &mut world,
            vec![
                Command::SetHeading {
                    id: 1,
                    x: 100.0,
                    y: 200.0,
                },
                Command::BoostStart { id: 1 },
            ],
        );

        let head = world.agent(1).unwrap().head();
        assert_approx_eq!(head.x, 100.0, 1e-4);
        assert_approx_eq!(head.y, 105.0, 1e-4);
    }

    #[test]
    fn test_death_notifies_victim_then_removed_after_grace() {
        let config = GameConfig {
            death_grace_ticks: 3,
            ..test_config()
        };
        let mut world = World::new(config.clone());
        world.insert_agent(agent_at(2, 600.0, 500.0, &config));
        world.insert_agent(agent_at(1, 0.0, 0.0, &config));
        {
            let agent = world.agent_mut(1).unwrap();
            agent.segments = (0..10)
                .map(|i| Vec2::new(566.0, 505.0 + i as f32 * 8.0))
                .collect();
            agent.heading = Vec2::new(0.0, -1.0);
        }

        let outbound = fast_tick(&mut world, Vec::new());

        assert_eq!(
            outbound,
            vec![Outbound {
                recipient: 1,
                packet: Packet::PlayerDied {
                    killer_id: 2,
                    killer_name: "Player2".to_string(),
                    score: 0,
                },
            }]
        );
        assert!(!world.agent(1).unwrap().alive);
        assert_eq!(world.resource_count(), 5);

        fast_tick(&mut world, Vec::new());
        fast_tick(&mut world, Vec::new());
        assert!(world.agent(1).is_some());

        fast_tick(&mut world, Vec::new());
        assert!(world.agent(1).is_none());
        assert!(world.agent(2).is_some());
    }

    #[test]
    fn test_leave_is_immediate() {
        let config = test_config();
        let mut world = World::new(config.clone());
        world.insert_agent(agent_at(1, 100.0, 100.0, &config));

        let outbound = fast_tick(&mut world, vec![Command::Leave { id: 1 }]);

        assert!(outbound.is_empty());
        assert!(world.agent(1).is_none());
    }

    #[test]
    fn test_resource_population_constant_over_ticks() {
        let config = GameConfig {
            resource_target: 400,
            map_size: 600.0,
            view_distance: 300.0,
            seed: Some(3),
            ..test_config()
        };
        let mut world = World::new(config.clone());
        world.insert_agent(agent_at(1, 300.0, 300.0, &config));

        let mut grown = 0;
        for _ in 0..200 {
            fast_tick(&mut world, Vec::new());
            assert_eq!(world.resource_count(), 400);
            grown = world.agent(1).unwrap().len() - config.initial_length;
        }
        assert!(grown > 0);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let config = GameConfig {
            resource_target: 50,
            seed: Some(21),
            ..test_config()
        };
        let run = || {
            let mut world = World::new(config.clone());
            let joins = (1..=4).map(|id| Command::Join { id, nickname: None }).collect();
            fast_tick(&mut world, joins);
            for _ in 0..120 {
                fast_tick(&mut world, Vec::new());
            }
            slow_tick(&world)
        };

        let first = run();
        assert!(!first.is_empty());
        assert_eq!(first, run());
    }

    #[test]
    fn test_slow_tick_skips_dead_agents() {
        let config = test_config();
        let mut world = World::new(config.clone());
        world.insert_agent(agent_at(1, 100.0, 100.0, &config));
        world.insert_agent(agent_at(2, 200.0, 200.0, &config));
        world.mark_dead(2);

        let outbound = slow_tick(&world);

        assert_eq!(outbound.len(), 1);
        assert_eq!(outbound[0].recipient, 1);
    }
}
