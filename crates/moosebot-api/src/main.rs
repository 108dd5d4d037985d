//! Moosebot service binary: wiring and the inbound dispatch loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use moosebot_core::credentials::CredentialRefresher;
use moosebot_core::provider::{
    BoxChatBackend, BoxGateway, BoxImageBackend, BoxModerationBackend, BoxSpeechBackend,
};
use moosebot_core::router::{strip_mention, CommandContext, Router};
use moosebot_core::session::{BoxSessionRepository, SessionStore, SessionStoreConfig};
use moosebot_infra::auth::OauthTokenSource;
use moosebot_infra::config::load_config;
use moosebot_infra::gateway::TelegramGateway;
use moosebot_infra::provider::{ArtBackend, OpenAiBackend};
use moosebot_infra::session::FsSessionRepository;
use moosebot_types::gateway::InboundMessage;

#[derive(Parser)]
#[command(name = "moosebot", about = "Chat bot with a conversation-state engine")]
struct Args {
    /// Data directory holding config.toml and session records.
    #[arg(long, env = "MOOSEBOT_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => dirs::home_dir()
            .context("cannot determine home directory")?
            .join(".moosebot"),
    };

    let config = load_config(&data_dir).await?;
    let http = reqwest::Client::new();

    let refresher = Arc::new(
        CredentialRefresher::start(
            OauthTokenSource::new(http.clone(), config.oauth.clone()),
            Duration::from_secs(config.token_refresh_interval_secs),
        )
        .await,
    );

    let openai = OpenAiBackend::new(http.clone(), config.chat.clone());
    let chat = Arc::new(BoxChatBackend::new(openai.clone()));
    let speech = Arc::new(BoxSpeechBackend::new(openai.clone()));
    let moderation = Arc::new(BoxModerationBackend::new(openai));
    let images = Arc::new(BoxImageBackend::new(ArtBackend::new(
        http.clone(),
        config.art.clone(),
        refresher.clone(),
    )));

    let repo = FsSessionRepository::open(data_dir.join("sessions")).await?;
    let store = Arc::new(SessionStore::new(
        Arc::new(BoxSessionRepository::new(repo)),
        chat,
        SessionStoreConfig {
            default_system_role: config.default_system_role.clone(),
            excerpt_threshold_tokens: config.excerpt_threshold_tokens,
            excerpt_check_interval: Duration::from_secs(config.excerpt_check_interval_secs),
        },
    ));

    let telegram = Arc::new(TelegramGateway::new(http, config.telegram.clone()));
    let gateway = Arc::new(BoxGateway::new(telegram.clone()));
    let router = Arc::new(Router::with_default_commands());
    let image_poll_interval = Duration::from_secs(config.image_poll_interval_secs);

    info!(data_dir = %data_dir.display(), "moosebot up");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            polled = telegram.poll_updates() => match polled {
                Ok(messages) => {
                    for inbound in messages {
                        let store = store.clone();
                        let router = router.clone();
                        let gateway = gateway.clone();
                        let speech = speech.clone();
                        let moderation = moderation.clone();
                        let images = images.clone();
                        tokio::spawn(async move {
                            handle_message(
                                inbound,
                                store,
                                router,
                                gateway,
                                speech,
                                moderation,
                                images,
                                image_poll_interval,
                            )
                            .await;
                        });
                    }
                }
                Err(e) => {
                    warn!(error = %e, "update poll failed");
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            },
        }
    }

    info!("shutting down");
    store.shutdown();
    refresher.stop();
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn handle_message(
    mut inbound: InboundMessage,
    store: Arc<SessionStore>,
    router: Arc<Router>,
    gateway: Arc<BoxGateway>,
    speech: Arc<BoxSpeechBackend>,
    moderation: Arc<BoxModerationBackend>,
    images: Arc<BoxImageBackend>,
    image_poll_interval: Duration,
) {
    // A voice note becomes the prompt via transcription.
    if inbound.text.is_empty() {
        if let Some(voice) = inbound.voice.clone() {
            let transcribed = match gateway.voice_bytes(&voice).await {
                Ok(audio) => speech.transcribe(&audio).await,
                Err(e) => {
                    warn!(conversation = %inbound.conversation, error = %e, "voice download failed");
                    return;
                }
            };
            match transcribed {
                Ok(text) => inbound.text = text,
                Err(e) => {
                    warn!(conversation = %inbound.conversation, error = %e, "transcription failed");
                    return;
                }
            }
        }
    }

    inbound.text = strip_mention(&inbound.text).to_string();
    if inbound.text.is_empty() {
        return;
    }

    let session = match store.get(&inbound.conversation).await {
        Ok(session) => session,
        Err(e) => {
            error!(conversation = %inbound.conversation, error = %e, "session unavailable");
            return;
        }
    };

    let ctx = CommandContext {
        session,
        gateway,
        speech,
        moderation,
        images,
        inbound,
        image_poll_interval,
    };
    router.dispatch(&ctx).await;
}
