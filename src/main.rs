use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quizmaster::config::QuizConfig;
use quizmaster::engine::{EngineMsg, QuizGame};
use quizmaster::protocol::{Action, Event, PrivilegeDelta};
use quizmaster::questions::FileQuestionSource;

/// Console gateway for local play: each stdin line is `<nick> <text>`, fed
/// to the engine as channel text. A real deployment replaces this with a
/// chat transport adapter speaking the same `Event`/`Action` protocol.
#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quizmaster=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match QuizConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting quizmaster for {}...", config.channel);

    let channel = config.channel.clone();
    let source = FileQuestionSource::new(config.question_dir.clone());

    let (action_tx, mut action_rx) = tokio::sync::mpsc::unbounded_channel();
    let engine = QuizGame::new(config, Box::new(source), action_tx);
    let mailbox = engine.mailbox();
    tokio::spawn(engine.run());

    // Render outbound actions to the terminal
    tokio::spawn(async move {
        while let Some(action) = action_rx.recv().await {
            match action {
                Action::Announce { lines } => {
                    for line in lines {
                        println!("{channel} <- {line}");
                    }
                }
                Action::Notify { recipient, lines } => {
                    for line in lines {
                        println!("{recipient} <- {line}");
                    }
                }
                Action::Privilege {
                    channel,
                    delta,
                    nick,
                } => {
                    let verb = match delta {
                        PrivilegeDelta::Grant => "grant",
                        PrivilegeDelta::Revoke => "revoke",
                    };
                    tracing::debug!(%channel, ?nick, "privilege {}", verb);
                }
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let Some((nick, text)) = line.trim().split_once(' ') else {
            eprintln!("usage: <nick> <text>   (e.g. \"alice !play\")");
            continue;
        };
        let event = Event::Message {
            nick: nick.to_string(),
            text: text.trim().to_string(),
        };
        if mailbox.send(EngineMsg::Event(event)).is_err() {
            break;
        }
    }
}
