//! Per-tick movement
//!
//! Each live agent moves its head one step along its heading. The map is a
//! torus, so a head leaving one edge re-enters on the opposite one. The body
//! follows by prepending the new head and dropping the tail.

use crate::config::GameConfig;
use crate::world::{Agent, World};

/// Advances every live agent by one fast tick.
pub fn integrate(world: &mut World) {
    let config = world.config.clone();
    for agent in world.agents_mut().filter(|agent| agent.alive) {
        advance_agent(agent, &config);
    }
}

/// Moves one agent and applies boost decay.
///
/// Boost loss is a rate: it accumulates in `boost_debt` and a segment is
/// shed each time the debt reaches a whole unit. Decay only engages above
/// the shrink threshold and never takes the body below its initial length.
pub fn advance_agent(agent: &mut Agent, config: &GameConfig) {
    debug_assert!(!agent.is_empty());

    let step = agent.heading.scale(agent.speed(config));
    let new_head = (agent.head() + step).wrap(config.map_size);

    agent.segments.push_front(new_head);
    agent.segments.pop_back();

    if agent.boosting && agent.len() > config.boost_shrink_threshold() {
        agent.boost_debt += config.boost_loss;
        while agent.boost_debt >= 1.0 && agent.len() > config.initial_length {
            agent.segments.pop_back();
            agent.boost_debt -= 1.0;
        }
    }

    debug_assert!(agent.len() >= config.initial_length);
}
