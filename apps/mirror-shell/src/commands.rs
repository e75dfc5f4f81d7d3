//! Service channel handlers

use bytes::Bytes;
use capture_session::SessionError;
use permission_coordinator::CoordinatorError;
use shared_protocol::{ChannelReply, InboundMessage, PermissionStatus, Reply, ServiceMethod};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::state::{AppState, Outbound};

/// Map a failed action to the error reply the UI expects
pub fn error_reply(err: &CoordinatorError) -> Reply {
    let code = match err {
        CoordinatorError::PermissionDenied(_) => "PERMISSION_DENIED",
        CoordinatorError::AlreadyPending => "ALREADY_PENDING",
        CoordinatorError::Launch(_) => "LAUNCH_FAILED",
        CoordinatorError::Abandoned => "ABANDONED",
        CoordinatorError::Session(SessionError::NoGrant) => "NO_GRANT",
        CoordinatorError::Session(SessionError::PromotionRefused(_)) => "PROMOTION_REFUSED",
        CoordinatorError::Session(SessionError::AlreadyRunning) => "ALREADY_RUNNING",
        CoordinatorError::Session(SessionError::Protocol(_)) => "INTERNAL",
    };
    Reply::error(code, err.to_string())
}

/// Run one method call to completion
pub async fn handle_call(state: &AppState, method: &str) -> Reply {
    let Some(method) = ServiceMethod::parse(method) else {
        debug!("Method {} not implemented", method);
        return Reply::NotImplemented;
    };

    info!("Handling {}", method.name());
    let result = match method {
        ServiceMethod::StartForegroundService => state.coordinator.start_sharing().await,
        ServiceMethod::StopForegroundService => state.coordinator.stop_sharing(),
    };

    match result {
        Ok(()) => Reply::Success,
        Err(e) => {
            warn!("{} failed: {}", method.name(), e);
            error_reply(&e)
        }
    }
}

/// Route one inbound message.
///
/// Method calls run on their own task, tracked in `tasks`, so a pending
/// permission request does not hold up the activity result that will
/// answer it.
pub fn dispatch(state: &Arc<AppState>, tasks: &mut JoinSet<()>, message: InboundMessage) {
    match message {
        InboundMessage::MethodCall { id, method } => {
            let state = state.clone();
            tasks.spawn(async move {
                let reply = handle_call(&state, &method).await;
                if state
                    .outbound
                    .send(Outbound::Reply(ChannelReply { id, reply }))
                    .is_err()
                {
                    error!("Shell output closed, dropping reply to call {}", id);
                }
            });
        }
        InboundMessage::ActivityResult {
            request_code,
            result_code,
            payload,
        } => {
            let status = PermissionStatus::from_result_code(result_code);
            let payload = payload.map(|p| Bytes::from(p.into_bytes()));
            state
                .coordinator
                .on_permission_result(request_code, status, payload);
        }
        InboundMessage::ServiceDestroyed => {
            if let Err(e) = state.coordinator.on_service_destroyed() {
                error!("Teardown failed: {}", e);
            }
        }
    }
}

/// Orderly shutdown once input is closed.
///
/// New requests are refused and the open dialog is abandoned, then every
/// in-flight call is drained before the session is torn down, so nothing
/// can promote the service after teardown.
pub async fn shutdown(state: &AppState, tasks: &mut JoinSet<()>) {
    state.coordinator.close();

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!("Method call task failed: {}", e);
        }
    }

    if let Err(e) = state.coordinator.on_service_destroyed() {
        error!("Teardown failed: {}", e);
    }
}
