//! Server network layer handling UDP communications
//!
//! The main loop owns session bookkeeping and turns client packets into
//! world commands. Simulation and broadcasting run on the scheduler's own
//! tasks; this layer only queues commands for them and delivers what they
//! produce.

use crate::commands::Command;
use crate::config::{GameConfig, ServerConfig};
use crate::scheduler::{Outlets, Scheduler};
use crate::sessions::SessionTable;
use crate::tick::Outbound;
use crate::world::World;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{Packet, MAX_PACKET_SIZE};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { packet: Packet, addr: SocketAddr },
    ClientTimeout { client_id: u32 },
    Shutdown,
}

/// Main server coordinating networking and the tick scheduler
pub struct Server {
    socket: Arc<UdpSocket>,
    sessions: Arc<RwLock<SessionTable>>,
    world: Arc<Mutex<World>>,
    config: ServerConfig,
    fast_period: Duration,
    slow_period: Duration,

    // Communication channels
    command_tx: mpsc::Sender<Command>,
    command_rx: Option<mpsc::Receiver<Command>>,
    outlets: Outlets,
    control_rx: Option<mpsc::UnboundedReceiver<Outbound>>,
    snapshot_rx: Option<mpsc::Receiver<Outbound>>,
    reply_tx: mpsc::UnboundedSender<(Packet, SocketAddr)>,
    reply_rx: Option<mpsc::UnboundedReceiver<(Packet, SocketAddr)>>,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,

    tasks: Vec<JoinHandle<()>>,
}

impl Server {
    pub async fn new(
        config: ServerConfig,
        game_config: GameConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        game_config.validate()?;

        let socket = Arc::new(UdpSocket::bind(&config.bind_addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let fast_period = game_config.fast_tick_interval();
        let slow_period = game_config.broadcast_interval();
        let world = World::new(game_config);

        let (command_tx, command_rx) = mpsc::channel(config.command_capacity);
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = mpsc::channel(config.outbound_capacity);
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            sessions: Arc::new(RwLock::new(SessionTable::new(config.max_clients))),
            world: Arc::new(Mutex::new(world)),
            config,
            fast_period,
            slow_period,
            command_tx,
            command_rx: Some(command_rx),
            outlets: Outlets {
                control: control_tx,
                snapshots: snapshot_tx,
            },
            control_rx: Some(control_rx),
            snapshot_rx: Some(snapshot_rx),
            reply_tx,
            reply_rx: Some(reply_rx),
            server_tx,
            server_rx,
            tasks: Vec::new(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Handle for stopping the server from another task.
    pub fn shutdown_sender(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&mut self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        self.tasks.push(tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        }));
    }

    /// Spawns task that delivers tick output and direct replies
    ///
    /// Control packets are always taken before snapshots, so a client sees
    /// its `Init` ahead of any state addressed to it.
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let sessions = Arc::clone(&self.sessions);
        let (Some(mut control_rx), Some(mut snapshot_rx), Some(mut reply_rx)) = (
            self.control_rx.take(),
            self.snapshot_rx.take(),
            self.reply_rx.take(),
        ) else {
            return;
        };

        self.tasks.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;

                    Some(message) = control_rx.recv() => {
                        deliver(&socket, &sessions, message).await;
                    },
                    Some((packet, addr)) = reply_rx.recv() => {
                        if let Err(e) = send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    },
                    Some(message) = snapshot_rx.recv() => {
                        deliver(&socket, &sessions, message).await;
                    },
                    else => break,
                }
            }
        }));
    }

    /// Spawns task that monitors client timeouts
    fn spawn_timeout_checker(&mut self) {
        let sessions = Arc::clone(&self.sessions);
        let server_tx = self.server_tx.clone();
        let timeout = self.config.client_timeout;

        self.tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = sessions.write().await.expire(timeout);

                for client_id in timed_out {
                    info!("Client {} timed out", client_id);
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        return;
                    }
                }
            }
        }));
    }

    fn reply(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.reply_tx.send((packet, addr)) {
            error!("Failed to queue reply for {}: {}", addr, e);
        }
    }

    async fn enqueue(&self, command: Command) {
        if let Err(e) = self.command_tx.send(command).await {
            error!("Failed to queue command: {}", e);
        }
    }

    /// Looks up the session for `addr` and refreshes its timeout.
    async fn session_for(&self, addr: SocketAddr) -> Option<u32> {
        self.sessions.write().await.touch(addr)
    }

    /// Turns one client packet into session changes and world commands
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Join { nickname } => {
                let client_id = match self.session_for(addr).await {
                    Some(existing_id) => {
                        info!("Client {} rejoining from {}", existing_id, addr);
                        Some(existing_id)
                    }
                    None => self.sessions.write().await.open(addr),
                };

                match client_id {
                    Some(id) => self.enqueue(Command::Join { id, nickname }).await,
                    None => {
                        warn!("Rejecting {}: server full", addr);
                        self.reply(
                            Packet::Rejected {
                                reason: "Server full".to_string(),
                            },
                            addr,
                        );
                    }
                }
            }

            Packet::SetHeading { x, y } => {
                if let Some(id) = self.session_for(addr).await {
                    self.enqueue(Command::SetHeading { id, x, y }).await;
                }
            }

            Packet::BoostStart => {
                if let Some(id) = self.session_for(addr).await {
                    self.enqueue(Command::BoostStart { id }).await;
                }
            }

            Packet::BoostEnd => {
                if let Some(id) = self.session_for(addr).await {
                    self.enqueue(Command::BoostEnd { id }).await;
                }
            }

            Packet::Heartbeat => {
                self.session_for(addr).await;
            }

            Packet::StatusRequest => {
                let status = {
                    let world = self.world.lock().await;
                    Packet::Status {
                        players: world.agent_count(),
                        resources: world.resource_count(),
                    }
                };
                self.reply(status, addr);
            }

            Packet::Leave => {
                let closed = {
                    let mut sessions = self.sessions.write().await;
                    sessions.id_for(addr).filter(|&id| sessions.close(id))
                };

                if let Some(id) = closed {
                    self.enqueue(Command::Leave { id }).await;
                }
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let commands = self
            .command_rx
            .take()
            .ok_or("server has already been started")?;

        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        let scheduler = Scheduler::start(
            Arc::clone(&self.world),
            commands,
            self.outlets.clone(),
            self.fast_period,
            self.slow_period,
        );

        info!("Server started successfully");

        loop {
            match self.server_rx.recv().await {
                Some(ServerMessage::PacketReceived { packet, addr }) => {
                    self.handle_packet(packet, addr).await;
                }
                Some(ServerMessage::ClientTimeout { client_id }) => {
                    self.enqueue(Command::Leave { id: client_id }).await;
                }
                Some(ServerMessage::Shutdown) | None => {
                    info!("Server shutting down");
                    break;
                }
            }
        }

        scheduler.shutdown().await;
        for task in self.tasks.drain(..) {
            task.abort();
        }

        Ok(())
    }
}

/// Sends tick output to the address currently bound to its recipient.
async fn deliver(socket: &UdpSocket, sessions: &RwLock<SessionTable>, message: Outbound) {
    let addr = sessions.read().await.addr_of(message.recipient);

    match addr {
        Some(addr) => {
            if let Err(e) = send_packet_impl(socket, &message.packet, addr).await {
                error!("Failed to send to client {}: {}", message.recipient, e);
            }
        }
        None => debug!("No session for client {}, dropping packet", message.recipient),
    }
}

async fn send_packet_impl(
    socket: &UdpSocket,
    packet: &Packet,
    addr: SocketAddr,
) -> Result<(), SendError> {
    let data = serialize(packet)?;
    if data.len() > MAX_PACKET_SIZE {
        return Err(format!("packet of {} bytes exceeds datagram limit", data.len()).into());
    }
    socket.send_to(&data, addr).await?;
    Ok(())
}
