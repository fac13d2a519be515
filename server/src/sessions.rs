//! Transport sessions
//!
//! A session binds a UDP address to a player id. It outlives the agent it
//! controls: after a death the same session joins again and receives a fresh
//! agent under the same id. Sessions that go quiet for longer than the
//! configured timeout are expired by the network layer.

use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Session {
    pub id: u32,
    pub addr: SocketAddr,
    /// When the last datagram from this address arrived.
    pub last_seen: Instant,
}

impl Session {
    pub fn new(id: u32, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
        }
    }

    pub fn is_stale(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Open sessions, indexed both ways.
///
/// Ids start at 1 and are never handed out twice, so a late datagram for a
/// closed session cannot land on a newer one.
pub struct SessionTable {
    sessions: HashMap<u32, Session>,
    by_addr: HashMap<SocketAddr, u32>,
    next_id: u32,
    capacity: usize,
}

impl SessionTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            by_addr: HashMap::new(),
            next_id: 1,
            capacity,
        }
    }

    /// Opens a session for `addr`. Returns `None` when the table is full.
    pub fn open(&mut self, addr: SocketAddr) -> Option<u32> {
        if self.sessions.len() >= self.capacity {
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.sessions.insert(id, Session::new(id, addr));
        self.by_addr.insert(addr, id);

        info!("Session {} opened for {}", id, addr);
        Some(id)
    }

    pub fn close(&mut self, id: u32) -> bool {
        match self.sessions.remove(&id) {
            Some(session) => {
                self.by_addr.remove(&session.addr);
                info!("Session {} closed", id);
                true
            }
            None => false,
        }
    }

    pub fn id_for(&self, addr: SocketAddr) -> Option<u32> {
        self.by_addr.get(&addr).copied()
    }

    pub fn addr_of(&self, id: u32) -> Option<SocketAddr> {
        self.sessions.get(&id).map(|session| session.addr)
    }

    /// Refreshes the session behind `addr` and returns its id.
    pub fn touch(&mut self, addr: SocketAddr) -> Option<u32> {
        let id = self.id_for(addr)?;
        if let Some(session) = self.sessions.get_mut(&id) {
            session.last_seen = Instant::now();
        }
        Some(id)
    }

    /// Closes every session silent for longer than `timeout`. Returns the
    /// closed ids in ascending order.
    pub fn expire(&mut self, timeout: Duration) -> Vec<u32> {
        let mut stale: Vec<u32> = self
            .sessions
            .values()
            .filter(|session| session.is_stale(timeout))
            .map(|session| session.id)
            .collect();
        stale.sort_unstable();

        for &id in &stale {
            self.close(id);
        }
        stale
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
