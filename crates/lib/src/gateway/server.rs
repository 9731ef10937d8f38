//! Webhook HTTP server: event intake, dedup, command routing, answer
//! pipeline, reply dispatch.
//!
//! Every shape-valid payload gets a 200 with a structured `{code, message?}`
//! body; outbound failures are caught here and turned into a logged no-op or
//! a user-facing fallback reply, never a 5xx.

use crate::answer::{AnswerService, HttpAnswerClient};
use crate::command::{Command, CLEAR_CONFIRMATION, USAGE};
use crate::config::{self, Config};
use crate::dedup::DedupGuard;
use crate::event::{
    self, Ack, EventHeader, MessageEvent, WebhookPayload, MESSAGE_RECEIVE_EVENT, TEXT_MESSAGE_TYPE,
};
use crate::reply;
use crate::session::SessionStore;
use crate::transport::{ChatTransport, LarkTransport};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Fixed user-facing replies. The platform shows these verbatim; underlying
/// errors go to the log only.
const UNSUPPORTED_REPLY: &str = "Only text messages are supported.";
const INVALID_INPUT_REPLY: &str = "I couldn't read any text in that message.";
const APOLOGY_REPLY: &str = "Sorry, I couldn't get an answer right now. Please try again.";

/// Shared state for the bridge: config plus the process-lifetime stores and
/// the two external capabilities. Constructed once at startup; tests build
/// one per test with fresh stores and mock capabilities.
#[derive(Clone)]
pub struct BridgeState {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionStore>,
    pub dedup: Arc<DedupGuard>,
    pub transport: Arc<dyn ChatTransport>,
    pub answers: Arc<dyn AnswerService>,
}

impl BridgeState {
    pub fn new(
        config: Config,
        transport: Arc<dyn ChatTransport>,
        answers: Arc<dyn AnswerService>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            sessions: Arc::new(SessionStore::new()),
            dedup: Arc::new(DedupGuard::new()),
            transport,
            answers,
        }
    }
}

/// Run the webhook server; binds to config.server.bind:config.server.port.
/// Blocks until shutdown (Ctrl+C or SIGTERM).
pub async fn run_server(mut config: Config) -> Result<()> {
    // Fold env overrides in once so the dispatcher reads settled values.
    config.app.app_id = config::resolve_app_id(&config);
    config.app.app_secret = config::resolve_app_secret(&config);
    config.answer.url = config::resolve_answer_url(&config);

    let transport: Arc<dyn ChatTransport> = Arc::new(LarkTransport::new(
        config.app.app_id.clone().unwrap_or_default(),
        config.app.app_secret.clone().unwrap_or_default(),
        None,
    ));
    let answer_url = config
        .answer
        .url
        .clone()
        .context("answer service url is not configured (set ANSWER_SERVICE_URL or answer.url)")?;
    let answers: Arc<dyn AnswerService> = Arc::new(HttpAnswerClient::new(answer_url));

    let bind_addr = format!("{}:{}", config.server.bind.trim(), config.server.port);
    let state = BridgeState::new(config, transport, answers);

    let app = Router::new()
        .route("/webhook", post(webhook))
        .route("/hello", get(hello))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("webhook server listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("webhook server exited")?;
    log::info!("webhook server stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received");
}

/// GET /hello — liveness probe.
async fn hello() -> Json<serde_json::Value> {
    Json(json!({ "message": "Hello, World!" }))
}

/// POST /webhook — parse the envelope and dispatch. Unparseable bodies get a
/// structured code-1 ack rather than an HTTP error.
async fn webhook(State(state): State<BridgeState>, body: Bytes) -> Json<Ack> {
    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            log::debug!("webhook: unparseable payload: {}", e);
            return Json(Ack::failure("invalid payload"));
        }
    };
    Json(dispatch(&state, payload).await)
}

/// Route one inbound payload. Always returns an Ack; no failure propagates.
pub async fn dispatch(state: &BridgeState, payload: WebhookPayload) -> Ack {
    // Verification handshake: echo the challenge, nothing else.
    if let Some(challenge) = payload.challenge {
        return Ack::challenge(challenge);
    }

    // Encrypted events are a deployment misconfiguration, not something to
    // negotiate at runtime.
    if payload.encrypt.as_ref().is_some_and(is_truthy) {
        return Ack::failure(
            "event encryption is enabled; disable encrypt key in the developer console",
        );
    }

    let Some(header) = payload.header else {
        // No event header: treat as a configuration self-check.
        return match config::check_credentials(
            state.config.app.app_id.as_deref(),
            state.config.app.app_secret.as_deref(),
        ) {
            Ok(()) => Ack::ok_with("success"),
            Err(message) => Ack::failure(message),
        };
    };

    if header.event_type == MESSAGE_RECEIVE_EVENT {
        handle_message(state, header, payload.event).await
    } else {
        log::debug!("webhook: unrecognized event type {}", header.event_type);
        Ack::unrecognized()
    }
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        serde_json::Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Handle one im.message.receive_v1 event: dedup, message-type check, text
/// extraction, then command or answer pipeline. Dedup marking strictly
/// precedes any reply attempt so a reply failure never causes reprocessing.
async fn handle_message(state: &BridgeState, header: EventHeader, event: Option<MessageEvent>) -> Ack {
    let Some(event) = event else {
        return Ack::failure("event body missing");
    };
    let Some(message) = event.message else {
        return Ack::failure("event message missing");
    };
    let sender_id = event
        .sender
        .and_then(|s| s.sender_id)
        .and_then(|s| s.open_id)
        .unwrap_or_default();
    let session_id = event::session_id(&message.chat_id, &sender_id);

    if !state.dedup.mark(&header.event_id).await {
        log::debug!("webhook: duplicate event {}", header.event_id);
        return Ack::ok_with("Duplicate event");
    }

    if message.message_type != TEXT_MESSAGE_TYPE {
        send_reply(state, &message.message_id, UNSUPPORTED_REPLY).await;
        return Ack::ok();
    }

    let text = message.content.as_deref().and_then(event::extract_text);
    let Some(text) = text else {
        send_reply(state, &message.message_id, INVALID_INPUT_REPLY).await;
        return Ack::ok();
    };

    match Command::parse(&text) {
        Some(command) => handle_command(state, command, &session_id, &message.message_id).await,
        None => answer_pipeline(state, &text, &session_id, &message.message_id).await,
    }
    Ack::ok()
}

/// Built-in commands never touch the answer service or the dedup set.
async fn handle_command(state: &BridgeState, command: Command, session_id: &str, message_id: &str) {
    match command {
        Command::Help => send_reply(state, message_id, USAGE).await,
        Command::Clear => {
            state.sessions.clear(session_id).await;
            send_reply(state, message_id, CLEAR_CONFIRMATION).await;
        }
    }
}

/// Append the question, ask with the full joined history, append the answer
/// and deliver it. The question stays in history even when the ask fails, so
/// a retried question still accumulates context.
async fn answer_pipeline(state: &BridgeState, text: &str, session_id: &str, message_id: &str) {
    let prompt = state.sessions.append_question(session_id, text).await;
    match state.answers.ask(&prompt).await {
        Ok(answer) => {
            state.sessions.append_answer(session_id, &answer.text).await;
            reply::deliver_answer(state.transport.as_ref(), message_id, &answer).await;
        }
        Err(e) => {
            log::warn!("answer service failed for session {}: {}", session_id, e);
            send_reply(state, message_id, APOLOGY_REPLY).await;
        }
    }
}

/// Best-effort text reply; transport failures are logged and abandoned.
async fn send_reply(state: &BridgeState, message_id: &str, text: &str) {
    if let Err(e) = state.transport.reply_text(message_id, text).await {
        if e.is_bot_removed() {
            log::warn!("reply skipped: bot removed from conversation: {}", e);
        } else {
            log::warn!("reply failed: {}", e);
        }
    }
}
