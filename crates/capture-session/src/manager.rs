//! Capture session manager
//!
//! Every transition goes through one mutex, so at most one session can be
//! running per manager, no matter how many threads drive it.

use parking_lot::Mutex;
use shared_protocol::{CaptureGrant, PlatformCapabilities, SessionState};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{ForegroundHost, SessionConfig, SessionError, SessionResult};

struct SessionInner {
    state: SessionState,
    grant: Option<CaptureGrant>,
    session_id: Option<Uuid>,
    channel_created: bool,
}

/// Owner of the process-wide capture session
pub struct CaptureSessionManager {
    host: Arc<dyn ForegroundHost>,
    capabilities: PlatformCapabilities,
    config: SessionConfig,
    inner: Mutex<SessionInner>,
}

impl CaptureSessionManager {
    pub fn new(
        host: Arc<dyn ForegroundHost>,
        capabilities: PlatformCapabilities,
        config: SessionConfig,
    ) -> Self {
        Self {
            host,
            capabilities,
            config,
            inner: Mutex::new(SessionInner {
                state: SessionState::Idle,
                grant: None,
                session_id: None,
                channel_created: false,
            }),
        }
    }

    pub fn capabilities(&self) -> PlatformCapabilities {
        self.capabilities
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == SessionState::Running
    }

    pub fn has_grant(&self) -> bool {
        self.inner.lock().grant.is_some()
    }

    /// Id of the running session, if any
    pub fn session_id(&self) -> Option<Uuid> {
        self.inner.lock().session_id
    }

    /// Reserve the session while a permission dialog is open
    pub fn begin_awaiting_grant(&self) -> SessionResult<()> {
        let mut inner = self.inner.lock();
        if inner.state != SessionState::Idle {
            return Err(SessionError::AlreadyRunning);
        }
        inner.state = inner.state.advance(SessionState::AwaitingGrant)?;
        debug!("Awaiting screen capture grant");
        Ok(())
    }

    /// Release the reservation taken by [`begin_awaiting_grant`](Self::begin_awaiting_grant)
    pub fn cancel_awaiting_grant(&self) {
        let mut inner = self.inner.lock();
        if inner.state == SessionState::AwaitingGrant {
            inner.state = SessionState::Idle;
            debug!("No longer awaiting screen capture grant");
        }
    }

    /// Start the session, promoting the service to the foreground.
    ///
    /// The grant, if any, is held until the session stops. On failure the
    /// session is back to idle and the grant has been dropped.
    pub fn start(&self, grant: Option<CaptureGrant>) -> SessionResult<()> {
        let mut inner = self.inner.lock();

        match inner.state {
            SessionState::Idle | SessionState::AwaitingGrant => {}
            state => {
                warn!("Ignoring start request, session is {:?}", state);
                return Err(SessionError::AlreadyRunning);
            }
        }

        if self.capabilities.requires_upfront_grant && grant.is_none() {
            warn!("Refusing to start capture session without a grant");
            inner.state = SessionState::Idle;
            return Err(SessionError::NoGrant);
        }

        inner.state = inner.state.advance(SessionState::Starting)?;

        if let Err(e) = self.promote(&mut inner, grant.is_some()) {
            warn!("Foreground promotion refused: {}", e);
            inner.state = inner.state.advance(SessionState::Idle)?;
            return Err(e);
        }

        let session_id = Uuid::new_v4();
        inner.state = inner.state.advance(SessionState::Running)?;
        inner.session_id = Some(session_id);

        match &grant {
            Some(g) => info!("Capture session {} running with grant {}", session_id, g.id()),
            None => info!("Capture session {} running without grant", session_id),
        }
        inner.grant = grant;

        Ok(())
    }

    fn promote(&self, inner: &mut SessionInner, has_grant: bool) -> SessionResult<()> {
        if self.capabilities.has_notification_channels && !inner.channel_created {
            let channel = self.config.channel();
            self.host
                .create_channel(&channel)
                .map_err(|e| SessionError::PromotionRefused(e.to_string()))?;
            debug!("Created notification channel {}", channel.id);
            inner.channel_created = true;
        }

        let category = self.capabilities.foreground_category(has_grant);
        self.host
            .start_foreground(&self.config.notification(), category)
            .map_err(|e| SessionError::PromotionRefused(e.to_string()))?;
        debug!("Promoted to foreground as {:?}", category);

        Ok(())
    }

    /// Stop the session. Stopping an idle session is a no-op.
    pub fn stop(&self) -> SessionResult<()> {
        self.release("stop requested")
    }

    /// Hosting process destroyed the service; release everything as on stop
    pub fn teardown(&self) -> SessionResult<()> {
        self.release("service destroyed")
    }

    fn release(&self, reason: &str) -> SessionResult<()> {
        let mut inner = self.inner.lock();

        if let Some(grant) = inner.grant.take() {
            debug!(
                "Released capture grant {} after {:?}",
                grant.id(),
                grant.age()
            );
        }

        if inner.state != SessionState::Running {
            debug!("Nothing to release ({}), session is {:?}", reason, inner.state);
            return Ok(());
        }

        self.host.stop_foreground(self.config.notification_id);
        inner.state = inner.state.advance(SessionState::Stopped)?;
        let session_id = inner.session_id.take();
        inner.state = inner.state.advance(SessionState::Idle)?;

        info!("Capture session {:?} stopped: {}", session_id, reason);
        Ok(())
    }
}
