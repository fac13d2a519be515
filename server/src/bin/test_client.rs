use bincode::{deserialize, serialize};
use clap::Parser;
use shared::{Packet, Vec2, MAX_PACKET_SIZE};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{interval, timeout};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless client that joins and steers in a circle")]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Nickname to join with
    #[arg(short, long, default_value = "tester")]
    nickname: String,

    /// How long to play before leaving
    #[arg(short, long, default_value = "10")]
    duration: u64,
}

async fn send(
    socket: &UdpSocket,
    packet: &Packet,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    socket.send_to(&serialize(packet)?, addr).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    println!("Client socket bound to {}", socket.local_addr()?);

    let server_addr = args.server.parse::<SocketAddr>()?;

    send(&socket, &Packet::StatusRequest, server_addr).await?;
    send(
        &socket,
        &Packet::Join {
            nickname: Some(args.nickname.clone()),
        },
        server_addr,
    )
    .await?;
    println!("Sent join request to {}", server_addr);

    let mut buf = vec![0u8; MAX_PACKET_SIZE];
    let mut steer = interval(Duration::from_millis(100));
    let mut heartbeat = interval(Duration::from_secs(1));
    let deadline = tokio::time::Instant::now() + Duration::from_secs(args.duration);

    let mut player_id = None;
    let mut head: Option<Vec2> = None;
    let mut step: u32 = 0;
    let mut snapshots: u32 = 0;

    while tokio::time::Instant::now() < deadline {
        tokio::select! {
            received = timeout(Duration::from_millis(50), socket.recv_from(&mut buf)) => {
                let Ok(Ok((len, _))) = received else { continue };
                match deserialize::<Packet>(&buf[..len]) {
                    Ok(Packet::Init { player_id: id, map_size }) => {
                        println!("Joined as player {} on a {}x{} map", id, map_size, map_size);
                        player_id = Some(id);
                    }
                    Ok(Packet::GameState { agents, resources, leaderboard }) => {
                        snapshots += 1;
                        let me = agents.iter().find(|agent| Some(agent.id) == player_id);
                        head = me.and_then(|agent| agent.segments.first().copied());
                        if snapshots % 30 == 0 {
                            if let Some(me) = me {
                                println!(
                                    "Head {:?}, score {}, {} agents and {} resources visible",
                                    me.segments.first(),
                                    me.score,
                                    agents.len(),
                                    resources.len()
                                );
                            }
                            if let Some(leader) = leaderboard.first() {
                                println!("  Leader: {} ({})", leader.nickname, leader.score);
                            }
                        }
                    }
                    Ok(Packet::PlayerDied { killer_name, score, .. }) => {
                        println!("Killed by {} with score {}, rejoining", killer_name, score);
                        head = None;
                        send(&socket, &Packet::Join { nickname: Some(args.nickname.clone()) }, server_addr).await?;
                    }
                    Ok(Packet::Status { players, resources }) => {
                        println!("Server has {} players and {} resources", players, resources);
                    }
                    Ok(Packet::Rejected { reason }) => {
                        println!("Join rejected: {}", reason);
                        return Ok(());
                    }
                    Ok(other) => println!("Unexpected packet: {:?}", other),
                    Err(e) => println!("Failed to deserialize packet: {}", e),
                }
            }
            _ = steer.tick() => {
                let Some(current) = head else { continue };
                step += 1;
                let angle = step as f32 / 10.0;
                let target = current + Vec2::new(angle.cos(), angle.sin()).scale(100.0);
                send(&socket, &Packet::SetHeading { x: target.x, y: target.y }, server_addr).await?;

                match step % 50 {
                    0 => send(&socket, &Packet::BoostStart, server_addr).await?,
                    10 => send(&socket, &Packet::BoostEnd, server_addr).await?,
                    _ => {}
                }
            }
            _ = heartbeat.tick() => {
                send(&socket, &Packet::Heartbeat, server_addr).await?;
            }
        }
    }

    println!("Sending leave, {} snapshots received", snapshots);
    send(&socket, &Packet::Leave, server_addr).await?;

    println!("Test client finished");
    Ok(())
}
