//! Start-time configuration
//!
//! Every tunable of the simulation lives in [`GameConfig`]; transport
//! settings live in [`ServerConfig`]. Values are fixed once the server
//! starts and the world keeps its own copy of the game settings.

use shared::{
    BASE_SPEED, BOOST_LOSS, BOOST_SHRINK_BUFFER, BOOST_SPEED, BROADCAST_RATE,
    DEATH_RESOURCE_RADIUS, DEATH_RESOURCE_VALUE, FAST_TICK_RATE, INITIAL_LENGTH,
    LEADERBOARD_SIZE, MAP_SIZE, RESOURCE_RADIUS, RESOURCE_TARGET, RESOURCE_VALUE,
    SCORE_PER_SEGMENT, SEGMENT_RADIUS, SNAPSHOT_SEGMENTS, VIEW_DISTANCE,
};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("map size must be positive, got {0}")]
    MapSize(f32),
    #[error("tick rates must be non-zero (fast {fast}, broadcast {broadcast})")]
    ZeroRate { fast: u32, broadcast: u32 },
    #[error("broadcast rate {broadcast} exceeds simulation rate {fast}")]
    BroadcastTooFast { fast: u32, broadcast: u32 },
    #[error("initial length must be at least 1")]
    InitialLength,
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[error("view distance {value} is below the segment radius {min}")]
    ViewDistance { value: f32, min: f32 },
}

/// Transport and session settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub max_clients: usize,
    /// Sessions silent for longer than this are dropped.
    pub client_timeout: Duration,
    pub command_capacity: usize,
    /// Snapshots buffered for the sender task before new ones are dropped.
    pub outbound_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            max_clients: 64,
            client_timeout: Duration::from_secs(5),
            command_capacity: 1000,
            outbound_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub map_size: f32,
    /// Number of ordinary resources kept on the map.
    pub resource_target: usize,
    /// Simulation passes per second.
    pub fast_tick_rate: u32,
    /// Snapshot passes per second.
    pub broadcast_rate: u32,
    pub initial_length: usize,
    pub segment_radius: f32,
    pub base_speed: f32,
    pub boost_speed: f32,
    /// Tail segments lost per tick while boosting; fractional values accumulate.
    pub boost_loss: f32,
    /// Boost decay only engages above `initial_length + boost_shrink_buffer`.
    pub boost_shrink_buffer: usize,
    pub resource_value: u32,
    pub resource_radius: f32,
    pub death_resource_value: u32,
    pub death_resource_radius: f32,
    pub view_distance: f32,
    /// Body prefix length sent in snapshots.
    pub snapshot_segments: usize,
    pub leaderboard_size: usize,
    /// Leading segments of a body that never count as a body hit.
    pub head_exclusion: usize,
    /// Fast ticks a dead agent stays in the world before removal.
    pub death_grace_ticks: u64,
    pub score_per_segment: u32,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            map_size: MAP_SIZE,
            resource_target: RESOURCE_TARGET,
            fast_tick_rate: FAST_TICK_RATE,
            broadcast_rate: BROADCAST_RATE,
            initial_length: INITIAL_LENGTH,
            segment_radius: SEGMENT_RADIUS,
            base_speed: BASE_SPEED,
            boost_speed: BOOST_SPEED,
            boost_loss: BOOST_LOSS,
            boost_shrink_buffer: BOOST_SHRINK_BUFFER,
            resource_value: RESOURCE_VALUE,
            resource_radius: RESOURCE_RADIUS,
            death_resource_value: DEATH_RESOURCE_VALUE,
            death_resource_radius: DEATH_RESOURCE_RADIUS,
            view_distance: VIEW_DISTANCE,
            snapshot_segments: SNAPSHOT_SEGMENTS,
            leaderboard_size: LEADERBOARD_SIZE,
            head_exclusion: 3,
            death_grace_ticks: 6,
            score_per_segment: SCORE_PER_SEGMENT,
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.map_size > 0.0) {
            return Err(ConfigError::MapSize(self.map_size));
        }
        if self.fast_tick_rate == 0 || self.broadcast_rate == 0 {
            return Err(ConfigError::ZeroRate {
                fast: self.fast_tick_rate,
                broadcast: self.broadcast_rate,
            });
        }
        if self.broadcast_rate > self.fast_tick_rate {
            return Err(ConfigError::BroadcastTooFast {
                fast: self.fast_tick_rate,
                broadcast: self.broadcast_rate,
            });
        }
        if self.initial_length == 0 {
            return Err(ConfigError::InitialLength);
        }
        for (name, value) in [
            ("segment radius", self.segment_radius),
            ("base speed", self.base_speed),
            ("boost speed", self.boost_speed),
            ("view distance", self.view_distance),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        if self.view_distance < self.segment_radius {
            return Err(ConfigError::ViewDistance {
                value: self.view_distance,
                min: self.segment_radius,
            });
        }
        Ok(())
    }

    pub fn fast_tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fast_tick_rate as f64)
    }

    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.broadcast_rate as f64)
    }

    /// Body length at which boost decay starts removing extra segments.
    pub fn boost_shrink_threshold(&self) -> usize {
        self.initial_length + self.boost_shrink_buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_zero_map_size() {
        let config = GameConfig {
            map_size: 0.0,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MapSize(0.0)));
    }

    #[test]
    fn test_rejects_zero_rate() {
        let config = GameConfig {
            broadcast_rate: 0,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroRate { .. })
        ));
    }

    #[test]
    fn test_rejects_broadcast_faster_than_simulation() {
        let config = GameConfig {
            fast_tick_rate: 30,
            broadcast_rate: 60,
            ..GameConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::BroadcastTooFast {
                fast: 30,
                broadcast: 60
            })
        );
    }

    #[test]
    fn test_rejects_nan_speed() {
        let config = GameConfig {
            base_speed: f32::NAN,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive {
                name: "base speed",
                ..
            })
        ));
    }

    #[test]
    fn test_view_distance_floor() {
        let tiny = GameConfig {
            view_distance: 2.0,
            ..GameConfig::default()
        };
        assert_eq!(
            tiny.validate(),
            Err(ConfigError::ViewDistance {
                value: 2.0,
                min: SEGMENT_RADIUS
            })
        );

        let at_floor = GameConfig {
            view_distance: SEGMENT_RADIUS,
            ..GameConfig::default()
        };
        assert_eq!(at_floor.validate(), Ok(()));
    }

    #[test]
    fn test_intervals() {
        let config = GameConfig::default();
        assert_eq!(config.fast_tick_interval().as_millis(), 16);
        assert_eq!(config.broadcast_interval().as_millis(), 33);
        assert_eq!(config.boost_shrink_threshold(), 15);
    }
}
