use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

pub const MAP_SIZE: f32 = 5000.0;
pub const RESOURCE_TARGET: usize = 800;
pub const FAST_TICK_RATE: u32 = 60;
pub const BROADCAST_RATE: u32 = 30;
pub const INITIAL_LENGTH: usize = 10;
pub const SEGMENT_RADIUS: f32 = 8.0;
pub const BASE_SPEED: f32 = 2.5;
pub const BOOST_SPEED: f32 = 5.0;
pub const BOOST_LOSS: f32 = 0.05;
pub const BOOST_SHRINK_BUFFER: usize = 5;
pub const RESOURCE_VALUE: u32 = 1;
pub const RESOURCE_RADIUS: f32 = 4.0;
pub const DEATH_RESOURCE_VALUE: u32 = 2;
pub const DEATH_RESOURCE_RADIUS: f32 = 6.0;
pub const VIEW_DISTANCE: f32 = 1200.0;
pub const SNAPSHOT_SEGMENTS: usize = 50;
pub const LEADERBOARD_SIZE: usize = 10;
pub const SCORE_PER_SEGMENT: u32 = 10;

/// Largest datagram either side will put on the wire.
pub const MAX_PACKET_SIZE: usize = 65_507;

/// A point or direction on the plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the magnitude of the vector.
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Returns the unit vector, or `None` for the zero vector.
    pub fn normalize(&self) -> Option<Vec2> {
        let mag = self.magnitude();
        if mag > 0.0 {
            Some(Vec2::new(self.x / mag, self.y / mag))
        } else {
            None
        }
    }

    pub fn scale(&self, scalar: f32) -> Vec2 {
        Vec2::new(self.x * scalar, self.y * scalar)
    }

    /// Plain Euclidean distance; the plane's wrap-around is not considered.
    pub fn distance(&self, other: &Vec2) -> f32 {
        (*self - *other).magnitude()
    }

    /// Wraps both coordinates into `[0, size)`.
    pub fn wrap(&self, size: f32) -> Vec2 {
        Vec2::new(wrap_coord(self.x, size), wrap_coord(self.y, size))
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}

/// Torus wrap of a single coordinate.
///
/// `rem_euclid` can round up to exactly `size` for tiny negative inputs, so
/// that case is folded back to zero.
pub fn wrap_coord(value: f32, size: f32) -> f32 {
    let wrapped = value.rem_euclid(size);
    if wrapped >= size {
        0.0
    } else {
        wrapped
    }
}

/// Strict circle overlap: touching circles do not collide.
pub fn circles_overlap(a: &Vec2, ra: f32, b: &Vec2, rb: f32) -> bool {
    a.distance(b) < ra + rb
}

/// A collectible node. Resources carry no identity; a pickup removes one and
/// spawns a fresh one elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub position: Vec2,
    pub color: String,
    pub radius: f32,
    pub value: u32,
}

/// An agent as seen by another client. `segments` is a head-first prefix of
/// the body, not the whole body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    pub id: u32,
    pub nickname: String,
    pub segments: Vec<Vec2>,
    pub color: String,
    pub score: u32,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub nickname: String,
    pub score: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    Join {
        nickname: Option<String>,
    },
    SetHeading {
        x: f32,
        y: f32,
    },
    BoostStart,
    BoostEnd,
    Heartbeat,
    StatusRequest,
    Leave,

    Init {
        player_id: u32,
        map_size: f32,
    },
    GameState {
        agents: Vec<AgentView>,
        resources: Vec<Resource>,
        leaderboard: Vec<LeaderboardEntry>,
    },
    PlayerDied {
        killer_id: u32,
        killer_name: String,
        score: u32,
    },
    Status {
        players: usize,
        resources: usize,
    },
    Rejected {
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_vector_normalize() {
        let v = Vec2::new(3.0, 4.0).normalize().unwrap();
        assert_approx_eq!(v.x, 0.6, 1e-6);
        assert_approx_eq!(v.y, 0.8, 1e-6);
        assert_approx_eq!(v.magnitude(), 1.0, 1e-6);
    }

    #[test]
    fn test_vector_normalize_zero() {
        assert!(Vec2::default().normalize().is_none());
    }

    #[test]
    fn test_vector_operators() {
        let a = Vec2::new(1.5, -2.0);
        let b = Vec2::new(0.5, 4.0);

        assert_eq!(a + b, Vec2::new(2.0, 2.0));
        assert_eq!(a - b, Vec2::new(1.0, -6.0));
        assert_eq!(a + b - b, a);
    }

    #[test]
    fn test_distance() {
        let a = Vec2::new(1.0, 1.0);
        let b = Vec2::new(4.0, 5.0);
        assert_approx_eq!(a.distance(&b), 5.0, 1e-6);
    }

    #[test]
    fn test_wrap_coord_positive_overflow() {
        assert_approx_eq!(wrap_coord(5001.0, 5000.0), 1.0, 1e-3);
    }

    #[test]
    fn test_wrap_coord_negative() {
        assert_approx_eq!(wrap_coord(-2.5, 5000.0), 4997.5, 1e-3);
    }

    #[test]
    fn test_wrap_coord_tiny_negative_stays_in_range() {
        let wrapped = wrap_coord(-1e-7, 5000.0);
        assert!((0.0..5000.0).contains(&wrapped));
    }

    #[test]
    fn test_wrap_coord_exact_size() {
        assert_eq!(wrap_coord(5000.0, 5000.0), 0.0);
    }

    #[test]
    fn test_collision_detection_overlap() {
        assert!(circles_overlap(
            &Vec2::new(0.0, 0.0),
            10.0,
            &Vec2::new(8.0, 0.0),
            4.0
        ));
    }

    #[test]
    fn test_collision_detection_exact_touch() {
        assert!(!circles_overlap(
            &Vec2::new(0.0, 0.0),
            10.0,
            &Vec2::new(14.0, 0.0),
            4.0
        ));
    }

    #[test]
    fn test_collision_detection_no_collision() {
        assert!(!circles_overlap(
            &Vec2::new(0.0, 0.0),
            10.0,
            &Vec2::new(100.0, 100.0),
            4.0
        ));
    }

    #[test]
    fn test_packet_serialization_join() {
        let packet = Packet::Join {
            nickname: Some("viper".to_string()),
        };
        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::Join { nickname } => assert_eq!(nickname.as_deref(), Some("viper")),
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_game_state() {
        let packet = Packet::GameState {
            agents: vec![AgentView {
                id: 7,
                nickname: "Player7".to_string(),
                segments: vec![Vec2::new(10.0, 20.0), Vec2::new(2.0, 20.0)],
                color: "#FF6B6B".to_string(),
                score: 30,
                radius: 9.1,
            }],
            resources: vec![Resource {
                position: Vec2::new(1.0, 2.0),
                color: "hsl(120, 70%, 60%)".to_string(),
                radius: RESOURCE_RADIUS,
                value: RESOURCE_VALUE,
            }],
            leaderboard: vec![LeaderboardEntry {
                nickname: "Player7".to_string(),
                score: 30,
            }],
        };

        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::GameState {
                agents,
                resources,
                leaderboard,
            } => {
                assert_eq!(agents.len(), 1);
                assert_eq!(agents[0].id, 7);
                assert_eq!(agents[0].segments.len(), 2);
                assert_eq!(resources[0].value, RESOURCE_VALUE);
                assert_eq!(leaderboard[0].score, 30);
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_truncated_packet_is_rejected() {
        let data = bincode::serialize(&Packet::SetHeading { x: 1.0, y: 2.0 }).unwrap();
        let result: Result<Packet, _> = bincode::deserialize(&data[..data.len() / 2]);
        assert!(result.is_err());
    }
}
