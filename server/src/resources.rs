//! Resource generation
//!
//! Ordinary resources are scattered uniformly over the map and kept at the
//! configured population. A dying agent also drops a denser, more valuable
//! resource on every other body segment.

use crate::world::{Agent, World};
use rand::Rng;
use shared::Resource;

/// Creates an ordinary resource at a uniformly random position.
pub fn random_resource(world: &mut World) -> Resource {
    let position = world.random_position();
    let hue = world.rng().gen_range(0.0..360.0_f32);

    Resource {
        position,
        color: format!("hsl({:.0}, 70%, 60%)", hue),
        radius: world.config.resource_radius,
        value: world.config.resource_value,
    }
}

/// Tops the world up to its resource target.
pub fn populate(world: &mut World) {
    while world.resource_count() < world.config.resource_target {
        let resource = random_resource(world);
        world.push_resource(resource);
    }
}

/// Spawns a single replacement for a consumed resource.
pub fn replenish(world: &mut World) {
    let resource = random_resource(world);
    world.push_resource(resource);
}

/// Drops a resource on segments 0, 2, 4, ... of a dead agent's body.
/// Returns how many were created.
pub fn spawn_from_body(world: &mut World, agent: &Agent) -> usize {
    let radius = world.config.death_resource_radius;
    let value = world.config.death_resource_value;

    let mut spawned = 0;
    for position in agent.segments.iter().step_by(2) {
        world.push_resource(Resource {
            position: *position,
            color: agent.color.clone(),
            radius,
            value,
        });
        spawned += 1;
    }
    spawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::world::tests::{agent_at, test_config};

    #[test]
    fn test_populate_reaches_target() {
        let mut world = World::new(test_config());
        world.config.resource_target = 40;

        populate(&mut world);
        assert_eq!(world.resource_count(), 40);

        populate(&mut world);
        assert_eq!(world.resource_count(), 40);
    }

    #[test]
    fn test_random_resource_properties() {
        let mut world = World::new(test_config());
        let resource = random_resource(&mut world);

        assert_eq!(resource.radius, world.config.resource_radius);
        assert_eq!(resource.value, world.config.resource_value);
        assert!(resource.color.starts_with("hsl("));
        assert!(resource.position.x >= 0.0 && resource.position.x < world.config.map_size);
        assert!(resource.position.y >= 0.0 && resource.position.y < world.config.map_size);
    }

    #[test]
    fn test_replenish_adds_one() {
        let mut world = World::new(test_config());
        replenish(&mut world);
        assert_eq!(world.resource_count(), 1);
    }

    #[test]
    fn test_spawn_from_body_every_other_segment() {
        let config = GameConfig {
            initial_length: 11,
            ..test_config()
        };
        let mut world = World::new(config.clone());
        let agent = agent_at(1, 500.0, 500.0, &config);

        let spawned = spawn_from_body(&mut world, &agent);

        assert_eq!(spawned, 6);
        assert_eq!(world.resource_count(), 6);
        for (i, resource) in world.resources().iter().enumerate() {
            assert_eq!(resource.position, agent.segments[i * 2]);
            assert_eq!(resource.color, agent.color);
            assert_eq!(resource.radius, config.death_resource_radius);
            assert_eq!(resource.value, config.death_resource_value);
        }
    }
}
