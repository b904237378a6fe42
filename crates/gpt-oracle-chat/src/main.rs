mod config;
mod render;

use std::sync::Arc;

use clap::Parser;
use gpt_oracle_client::{
    AgentMetadata, Applied, InteractionSession, KeypairWallet, RpcLedger, SessionError,
    SessionEvent, SessionState, Wallet,
};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast,
};

type Session = InteractionSession<RpcLedger, KeypairWallet, AgentMetadata>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "gpt_oracle_chat=info,gpt_oracle_client=info".parse().unwrap()
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = config::Config::parse();
    let session_config = config.session_config()?;

    let rpc = Arc::new(RpcClient::new_with_commitment(
        config.rpc_url.clone(),
        CommitmentConfig::confirmed(),
    ));
    let ledger = RpcLedger::new(rpc.clone(), config.ws_url(), config.confirm_poll_interval());
    let metadata = AgentMetadata::new(rpc, session_config.agent_program);

    let mut wallet = KeypairWallet::new(config.keypair_path());
    wallet.connect().await?;

    tracing::info!(
        rpc            = %config.rpc_url,
        agent_program  = %session_config.agent_program,
        oracle_program = %session_config.oracle_program,
        "gpt-oracle-chat starting",
    );

    let mut session = InteractionSession::new(ledger, wallet, metadata, session_config);
    let mut events = session.subscribe_events();

    // A failure is reported through the Error banner.
    if session.initialize().await.is_err() {
        println!("Type /init to retry.");
    } else {
        println!("Connected. Type a message, /history, /init or /quit.");
    }

    run(&mut session, &mut events, config.is_devnet()).await;
    session.shutdown();
    Ok(())
}

async fn run(session: &mut Session, events: &mut broadcast::Receiver<SessionEvent>, devnet: bool) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if !handle_line(session, line, devnet).await {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!("stdin: {e}");
                        break;
                    }
                }
            }
            notification = session.next_notification() => match notification {
                Some(notification) => {
                    if let Applied::Resolved(_) = session.handle_notification(notification) {
                        print!("{}", render::render_history(session.history(), false, devnet));
                    }
                }
                None => println!("Reply stream lost. Type /init to reconnect."),
            },
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if let Some(line) = render::banner(&event) {
                            println!("{line}");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed)    => break,
                }
            }
        }
    }
}

/// Returns false when the user asked to quit.
async fn handle_line(session: &mut Session, line: String, devnet: bool) -> bool {
    match line.trim() {
        "" => {}
        "/quit" | "/exit" => return false,
        "/history" => match serde_json::to_string_pretty(session.history()) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::warn!("history serialisation failed: {e}"),
        },
        "/init" => {
            if session.initialize().await.is_ok() {
                println!("Connected.");
            }
        }
        _ => {
            session.set_input(line.as_str());
            match session.submit_input().await {
                Ok(_) => {
                    let awaiting = session.state() == SessionState::AwaitingReply;
                    print!("{}", render::render_history(session.history(), awaiting, devnet));
                }
                Err(SessionError::NotReady)
                    if session.state() == SessionState::AwaitingReply && !session.is_listening() =>
                {
                    println!("Reply stream lost. Type /init to reconnect.");
                }
                Err(SessionError::NotReady) if session.state() == SessionState::AwaitingReply => {
                    println!("Still waiting for the agent's reply.");
                }
                Err(SessionError::NotReady) => println!("Not connected. Type /init to retry."),
                // Ledger failures arrive as an Error banner.
                Err(SessionError::Send(_) | SessionError::Confirmation(_)) => {}
                Err(e) => println!("{e}"),
            }
        }
    }
    true
}
