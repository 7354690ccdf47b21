use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use parley_client::{
    CallState, ClientConfig, ClientEvent, NegotiationClient, RelayAddress, RtcBackend,
};
use parley_core::IceServerConfig;
use parley_relay::{DEFAULT_WS_PATH, RelayConfig, RoomPolicy};
use std::net::SocketAddr;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "parley")]
#[command(version, about = "Peer-to-peer audio calls negotiated through a websocket relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the room relay.
    Relay {
        #[arg(long, env = "PARLEY_BIND", default_value = "0.0.0.0:3000")]
        bind: SocketAddr,

        #[arg(long, env = "PARLEY_WS_PATH", default_value = DEFAULT_WS_PATH)]
        path: String,

        /// Members allowed per room; 0 lifts the limit.
        #[arg(long, env = "PARLEY_MAX_MEMBERS", default_value_t = 2)]
        max_members: usize,
    },

    /// Join a room and stay in the call until Ctrl-C or until the peer leaves.
    Call {
        /// Relay websocket url; falls back to PARLEY_RELAY_URL.
        #[arg(long)]
        relay: Option<String>,

        #[arg(long)]
        room: String,

        /// STUN server url, may be repeated. Public STUN servers are used when absent.
        #[arg(long = "ice-server", env = "PARLEY_ICE_SERVERS", value_delimiter = ',')]
        ice_servers: Vec<String>,

        /// Join with the microphone muted.
        #[arg(long)]
        muted: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Relay {
            bind,
            path,
            max_members,
        } => run_relay(bind, path, max_members).await,

        Commands::Call {
            relay,
            room,
            ice_servers,
            muted,
        } => run_call(relay, room, ice_servers, muted).await,
    }
}

async fn run_relay(bind: SocketAddr, path: String, max_members: usize) -> Result<()> {
    let policy = match max_members {
        0 => RoomPolicy::unbounded(),
        n => RoomPolicy::with_max_members(n),
    };
    let config = RelayConfig { bind, path, policy };

    println!("{}", "Starting parley relay...".green().bold());
    parley_relay::serve(config, ctrl_c()).await?;
    println!("{}", "Relay stopped.".green());
    Ok(())
}

async fn run_call(
    relay: Option<String>,
    room: String,
    ice_servers: Vec<String>,
    muted: bool,
) -> Result<()> {
    // Resolved before anything else so a bad address fails without touching media.
    let relay = RelayAddress::resolve(relay.as_deref())?;

    let mut config = ClientConfig {
        relay,
        ..ClientConfig::default()
    };
    if !ice_servers.is_empty() {
        config.ice_servers = ice_servers.into_iter().map(IceServerConfig::stun).collect();
    }

    let backend = RtcBackend::new().context("Failed to set up the WebRTC stack")?;
    let (client, mut events) = NegotiationClient::spawn(config, backend);

    println!("{} {}", "Joining room".cyan(), room.bold());
    let joined = client.join(room).await;
    while let Ok(event) = events.try_recv() {
        print_event(&event);
    }
    joined.context("Could not join the call")?;

    if muted {
        client.set_muted(true).await;
    }
    println!("{}", "In the call. Press Ctrl-C to hang up.".green().bold());

    let hang_up = ctrl_c();
    tokio::pin!(hang_up);
    loop {
        tokio::select! {
            _ = &mut hang_up => {
                println!("{}", "Hanging up...".yellow());
                client.leave().await;
                break;
            }
            event = events.recv() => match event {
                Some(event) => {
                    print_event(&event);
                    if event == ClientEvent::StateChanged(CallState::Idle) {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    while let Ok(event) = events.try_recv() {
        print_event(&event);
    }
    Ok(())
}

fn print_event(event: &ClientEvent) {
    match event {
        ClientEvent::StateChanged(state) => {
            println!("{} {}", "state".cyan(), format!("{:?}", state).bold())
        }
        ClientEvent::Status(text) => println!("{} {}", "status".yellow(), text),
        ClientEvent::RemoteAudio(remote) => println!(
            "{} track {} ({})",
            "remote audio".green(),
            remote.track_id,
            remote.codec
        ),
        ClientEvent::Muted(true) => println!("{}", "microphone muted".magenta()),
        ClientEvent::Muted(false) => println!("{}", "microphone live".magenta()),
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
