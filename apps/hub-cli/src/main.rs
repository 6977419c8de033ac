//! HubChat terminal client entry point.

mod config;
mod console;
mod logging;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use hubchat_hub_connection::{
    ConnectionLifecycleManager, ConnectionState, HubConnectionFactory, LifecycleEvents, SendError,
};
use hubchat_hub_notifications::{NotificationSink, ToastQueue};
use hubchat_protocol::types::{ChatId, UserId};

use config::ClientConfig;
use console::{Command, ConsoleConversation, HELP};

const TOAST_TICK: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, load_error) = ClientConfig::load_or_default();
    logging::init(config.log_filter());

    info!(version = env!("CARGO_PKG_VERSION"), "starting HubChat client");

    match load_error {
        None => info!(hub_url = %config.hub_url, "configuration loaded"),
        Some(e) => {
            warn!(error = %e, hub_url = %config.hub_url, "failed to load config, using defaults");
        }
    }

    let handle = HubConnectionFactory::new()
        .with_client_name(config.client_name.clone())
        .with_log_level(tracing::Level::DEBUG)
        .create_connection(&config.hub_url)
        .with_context(|| format!("cannot use hub URL {:?}", config.hub_url))?;

    let conversation = Arc::new(ConsoleConversation::new(
        config.user_id().map(UserId::from),
        config.chat_id().map(ChatId::from),
    ));
    let manager = ConnectionLifecycleManager::new(handle, conversation.clone());

    let events = manager.start().await?;
    println!("{HELP}");

    let result = run(&manager, &conversation, events).await;
    manager.stop().await;
    info!("disconnected");
    result
}

/// Interleaves lifecycle events, stdin commands and Ctrl-C until the user
/// quits.
async fn run(
    manager: &ConnectionLifecycleManager,
    conversation: &ConsoleConversation,
    mut events: LifecycleEvents,
) -> anyhow::Result<()> {
    let channel = manager.channel();
    let mut toasts = ToastQueue::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tick = tokio::time::interval(TOAST_TICK);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupted");
                return Ok(());
            }

            Some(event) = events.recv() => {
                toasts.notify(&event);
                if let Some(toast) = toasts.latest() {
                    println!("{}", console::format_toast(toast));
                }
            }

            _ = tick.tick() => {
                toasts.expire(TOAST_TICK);
            }

            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    return Ok(());
                };
                match Command::parse(&line) {
                    Command::Send(text) => {
                        match channel.send_from(conversation, &text).await {
                            Ok(()) => {}
                            Err(SendError::Rejected { message, .. }) => {
                                println!("*** message rejected: {message}");
                            }
                            Err(e) => println!("*** {e}"),
                        }
                    }
                    Command::Chat(chat) => {
                        println!("*** now in {chat}");
                        conversation.select_chat(chat);
                    }
                    Command::User(user) => {
                        println!("*** signed in as {user}");
                        conversation.set_user(user);
                    }
                    Command::Refresh => {
                        if manager.state() == ConnectionState::Connected {
                            println!("*** already connected");
                        } else {
                            toasts.clear();
                            events = manager.restart().await?;
                        }
                    }
                    Command::Quit => return Ok(()),
                    Command::Help => println!("{HELP}"),
                    Command::Invalid(hint) => println!("*** {hint}"),
                }
            }
        }
    }
}
