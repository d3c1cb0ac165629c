use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use futures::future::join_all;
use huddle_call::{
    CallController, CallHandle, CallSnapshot, LocalRelay, RtcConnectionFactory, SyntheticMedia,
    TransportConfig,
};
use huddle_core::{Envelope, IceCandidate, IceServerConfig, Participant, PeerId, SignalMessage};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const NAMES: [&str; 6] = ["Ada", "Grace", "Linus", "Barbara", "Ken", "Margaret"];

#[derive(Parser)]
#[command(name = "huddle")]
#[command(about = "Full-mesh call orchestrator playground", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a call between local participants over an in-process relay.
    Simulate {
        #[arg(short, long, env = "HUDDLE_PARTICIPANTS", default_value_t = 3)]
        participants: usize,

        /// How long to wait for every participant to see every other one.
        #[arg(long, env = "HUDDLE_SETTLE_SECS", default_value_t = 10)]
        settle_secs: u64,

        /// How long to keep the call up once it has settled.
        #[arg(long, env = "HUDDLE_HOLD_SECS", default_value_t = 2)]
        hold_secs: u64,

        /// STUN/TURN url. Without any, only host candidates are gathered.
        #[arg(long = "ice-server", env = "HUDDLE_ICE_SERVERS", value_delimiter = ',')]
        ice_servers: Vec<String>,

        /// Username for the TURN servers among `--ice-server`.
        #[arg(long, env = "HUDDLE_ICE_USERNAME", requires = "ice_credential")]
        ice_username: Option<String>,

        /// Credential for the TURN servers among `--ice-server`.
        #[arg(long, env = "HUDDLE_ICE_CREDENTIAL", requires = "ice_username")]
        ice_credential: Option<String>,
    },

    /// Print one example frame of every signaling message.
    Frames,
}

struct Member {
    participant: Participant,
    handle: CallHandle,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match Cli::parse().command {
        Commands::Simulate {
            participants,
            settle_secs,
            hold_secs,
            ice_servers,
            ice_username,
            ice_credential,
        } => {
            let config = transport_config(ice_servers, ice_username, ice_credential);
            simulate(
                participants,
                Duration::from_secs(settle_secs),
                Duration::from_secs(hold_secs),
                config,
            )
            .await
        }
        Commands::Frames => print_frames(),
    }
}

async fn simulate(
    participants: usize,
    settle: Duration,
    hold: Duration,
    config: TransportConfig,
) -> Result<()> {
    if participants < 2 {
        anyhow::bail!("A call needs at least two participants");
    }

    println!(
        "{}",
        format!("📞 Simulating a call with {} participants", participants)
            .green()
            .bold()
    );

    let connections =
        Arc::new(RtcConnectionFactory::new(config).context("Failed to set up WebRTC")?);
    let relay = LocalRelay::new();

    let members: Vec<Member> = (0..participants)
        .map(|i| {
            let name = NAMES
                .get(i)
                .map(|n| n.to_string())
                .unwrap_or_else(|| format!("Guest {}", i + 1));
            let participant = Participant::new(PeerId::random(), name);
            let (endpoint, inbound) = relay.connect(participant.id.clone());

            let controller = CallController::new(
                participant.clone(),
                Arc::new(endpoint),
                Arc::new(SyntheticMedia::new(participant.display_name.clone())),
                connections.clone(),
            );
            Member {
                participant,
                handle: CallHandle::spawn(controller, inbound),
            }
        })
        .collect();

    for result in join_all(members.iter().map(|m| m.handle.start_call())).await {
        result.context("Failed to start a call")?;
    }
    println!("{}", "🚀 Everyone started their call".cyan());

    let expected = participants - 1;
    if wait_for_mesh(&members, expected, settle).await {
        println!("{}", "✨ Mesh settled".green().bold());
    } else {
        println!(
            "{}",
            format!("⚠️  Mesh did not settle within {:?}", settle).yellow()
        );
    }
    for member in &members {
        print_view(member);
    }

    tokio::time::sleep(hold).await;

    for (i, member) in members.iter().enumerate() {
        let name = &member.participant.display_name;
        member
            .handle
            .end_call()
            .await
            .with_context(|| format!("{} failed to end the call", name))?;
        println!("{}", format!("👋 {} left", name).cyan());
        tokio::time::sleep(Duration::from_millis(300)).await;

        for remaining in &members[i + 1..] {
            let snapshot = remaining.handle.snapshot();
            println!(
                "   {} now sees {} stream(s)",
                remaining.participant.display_name,
                snapshot.remote_streams.len()
            );
        }
    }

    info!("Simulation finished");
    println!("{}", "✅ Simulation finished".green().bold());
    Ok(())
}

/// Credentials only go to `turn:`/`turns:` urls; STUN servers take none.
fn transport_config(
    urls: Vec<String>,
    username: Option<String>,
    credential: Option<String>,
) -> TransportConfig {
    if urls.is_empty() {
        return TransportConfig::local_only();
    }

    let ice_servers = urls
        .into_iter()
        .map(|url| {
            let is_turn = url.starts_with("turn:") || url.starts_with("turns:");
            let mut server = IceServerConfig::stun(url);
            if is_turn {
                server.username = username.clone();
                server.credential = credential.clone();
            }
            server
        })
        .collect();

    TransportConfig { ice_servers }
}

async fn wait_for_mesh(members: &[Member], expected: usize, within: Duration) -> bool {
    let settled = tokio::time::timeout(within, async {
        for member in members {
            let mut state = member.handle.subscribe();
            if state
                .wait_for(|s| s.remote_streams.len() >= expected)
                .await
                .is_err()
            {
                return false;
            }
        }
        true
    })
    .await;

    settled.unwrap_or(false)
}

fn print_view(member: &Member) {
    let snapshot: CallSnapshot = member.handle.snapshot();
    let status = if snapshot.is_in_call {
        "in call".green()
    } else {
        "not in call".red()
    };

    println!(
        "\n{} ({}) {}",
        member.participant.display_name.bold(),
        member.participant.id.to_string().dimmed(),
        status
    );

    for (peer_id, stream) in &snapshot.remote_streams {
        let name = snapshot
            .remote_usernames
            .get(peer_id)
            .map(String::as_str)
            .unwrap_or("unknown");
        let kinds: Vec<String> = stream.tracks.iter().map(|t| t.kind.to_string()).collect();
        println!("   📺 {} [{}] {}", name, stream.id, kinds.join("+"));
    }
    if snapshot.remote_streams.is_empty() {
        println!("   {}", "no remote streams".dimmed());
    }
}

fn print_frames() -> Result<()> {
    let alice = PeerId::from("alice");
    let bob = PeerId::from("bob");

    let frames = [
        SignalMessage::Join {
            peer_id: alice.clone(),
            name: "Alice".to_string(),
        },
        SignalMessage::Offer {
            sdp: "v=0\r\n...".to_string(),
            target_peer_id: bob.clone(),
        },
        SignalMessage::Answer {
            sdp: "v=0\r\n...".to_string(),
            target_peer_id: bob.clone(),
        },
        SignalMessage::IceCandidate {
            candidate: IceCandidate::new(
                "candidate:1 1 udp 2130706431 192.168.1.2 54321 typ host",
            ),
            target_peer_id: bob.clone(),
        },
        SignalMessage::Leave {
            peer_id: alice.clone(),
            name: "Alice".to_string(),
        },
    ];

    for signal in frames {
        println!("{}", signal.event_name().cyan().bold());
        println!("  out: {}", serde_json::to_string(&signal)?);

        let envelope = Envelope {
            from: alice.clone(),
            signal,
        };
        println!("  in:  {}", serde_json::to_string(&envelope)?);
    }
    Ok(())
}
