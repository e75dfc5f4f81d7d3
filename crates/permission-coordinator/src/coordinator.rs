//! Permission exchange and the start/stop sharing actions

use bytes::Bytes;
use capture_session::CaptureSessionManager;
use parking_lot::Mutex;
use shared_protocol::{
    CaptureGrant, MEDIA_PROJECTION_REQUEST_CODE, PERMISSION_DENIED_REASON, PermissionStatus,
};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{CoordinatorError, CoordinatorResult, ExchangeError};

/// OS permission-exchange facility
pub trait PermissionExchange: Send + Sync {
    /// Show the capture consent dialog.
    ///
    /// The answer is delivered later through
    /// [`PermissionCoordinator::on_permission_result`] with the same request code.
    fn launch(&self, request_code: i32) -> Result<(), ExchangeError>;
}

/// Result of one permission exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionOutcome {
    /// Consent given; the grant now belongs to the running session
    Granted { grant_id: Uuid },
    Denied { reason: String },
    Cancelled,
}

type PendingReply = oneshot::Sender<CoordinatorResult<PermissionOutcome>>;

#[derive(Default)]
struct PendingSlot {
    reply: Option<PendingReply>,
    /// No further requests are accepted once set
    closed: bool,
}

pub struct PermissionCoordinator {
    exchange: Arc<dyn PermissionExchange>,
    sessions: Arc<CaptureSessionManager>,
    request_code: i32,
    pending: Mutex<PendingSlot>,
}

impl PermissionCoordinator {
    pub fn new(exchange: Arc<dyn PermissionExchange>, sessions: Arc<CaptureSessionManager>) -> Self {
        Self {
            exchange,
            sessions,
            request_code: MEDIA_PROJECTION_REQUEST_CODE,
            pending: Mutex::new(PendingSlot::default()),
        }
    }

    pub fn sessions(&self) -> &Arc<CaptureSessionManager> {
        &self.sessions
    }

    /// Check if a permission dialog is waiting for an answer
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .reply
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    pub fn is_closed(&self) -> bool {
        self.pending.lock().closed
    }

    /// "Start sharing" UI action.
    ///
    /// Asks for consent first where the platform requires it, otherwise
    /// starts the session straight away.
    pub async fn start_sharing(&self) -> CoordinatorResult<()> {
        if self.is_closed() {
            return Err(CoordinatorError::Abandoned);
        }

        if !self.sessions.capabilities().requires_upfront_grant {
            self.sessions.start(None)?;
            return Ok(());
        }

        match self.request_capture_permission().await? {
            PermissionOutcome::Granted { .. } => Ok(()),
            PermissionOutcome::Denied { reason } => Err(CoordinatorError::PermissionDenied(reason)),
            PermissionOutcome::Cancelled => Err(CoordinatorError::PermissionDenied(
                PERMISSION_DENIED_REASON.to_string(),
            )),
        }
    }

    /// "Stop sharing" UI action.
    ///
    /// An open permission dialog is abandoned too, so a grant arriving after
    /// the stop does not start a session.
    pub fn stop_sharing(&self) -> CoordinatorResult<()> {
        self.abandon_pending();
        self.sessions.stop()?;
        Ok(())
    }

    /// Hosting process destroyed the capture service
    pub fn on_service_destroyed(&self) -> CoordinatorResult<()> {
        self.sessions.teardown()?;
        Ok(())
    }

    /// Drop the outstanding request, if any; its requester sees `Abandoned`
    pub fn abandon_pending(&self) {
        if self.pending.lock().reply.take().is_some() {
            info!("Abandoning pending permission request");
            self.sessions.cancel_awaiting_grant();
        }
    }

    /// Refuse all further requests and abandon the outstanding one.
    ///
    /// Used at shutdown; a start racing with it fails with `Abandoned`
    /// instead of waiting for a dialog nobody will answer.
    pub fn close(&self) {
        let abandoned = {
            let mut pending = self.pending.lock();
            pending.closed = true;
            pending.reply.take()
        };
        info!("Permission coordinator closed");
        if abandoned.is_some() {
            self.sessions.cancel_awaiting_grant();
        }
    }

    /// Run the consent exchange.
    ///
    /// Only one request may be outstanding; a second one is rejected with
    /// [`CoordinatorError::AlreadyPending`]. There is no timeout: the request
    /// completes when the platform reports the dialog's result.
    pub async fn request_capture_permission(&self) -> CoordinatorResult<PermissionOutcome> {
        let rx = {
            let mut pending = self.pending.lock();
            if pending.closed {
                return Err(CoordinatorError::Abandoned);
            }

            let abandoned = match pending.reply.as_ref() {
                Some(tx) if !tx.is_closed() => return Err(CoordinatorError::AlreadyPending),
                Some(_) => true,
                None => false,
            };
            if abandoned {
                debug!("Dropping abandoned permission request");
                pending.reply.take();
                self.sessions.cancel_awaiting_grant();
            }

            self.sessions.begin_awaiting_grant()?;
            let (tx, rx) = oneshot::channel();
            pending.reply = Some(tx);
            rx
        };

        info!("Requesting screen capture permission");
        if let Err(e) = self.exchange.launch(self.request_code) {
            warn!("Permission dialog failed to launch: {}", e);
            self.pending.lock().reply.take();
            self.sessions.cancel_awaiting_grant();
            return Err(CoordinatorError::Launch(e.0));
        }

        rx.await.map_err(|_| CoordinatorError::Abandoned)?
    }

    /// Platform callback for the permission dialog.
    ///
    /// Returns `true` if the result answered the pending request. Results for
    /// other request codes, or arriving with nothing pending, are ignored.
    pub fn on_permission_result(
        &self,
        request_code: i32,
        status: PermissionStatus,
        payload: Option<Bytes>,
    ) -> bool {
        if request_code != self.request_code {
            debug!("Ignoring activity result for request code {}", request_code);
            return false;
        }

        let Some(tx) = self.pending.lock().reply.take() else {
            warn!("Permission result {:?} arrived with no pending request", status);
            return false;
        };

        let outcome = match CaptureGrant::from_exchange(status, payload) {
            Some(grant) => {
                let grant_id = grant.id();
                info!("Screen capture permission granted ({})", grant_id);
                self.sessions
                    .start(Some(grant))
                    .map(|_| PermissionOutcome::Granted { grant_id })
                    .map_err(CoordinatorError::from)
            }
            None => {
                self.sessions.cancel_awaiting_grant();
                if status == PermissionStatus::Cancelled {
                    info!("Screen capture permission dialog dismissed");
                    Ok(PermissionOutcome::Cancelled)
                } else {
                    info!("Screen capture permission denied");
                    Ok(PermissionOutcome::Denied {
                        reason: PERMISSION_DENIED_REASON.to_string(),
                    })
                }
            }
        };

        if tx.send(outcome).is_err() {
            debug!("Permission requester went away before the result arrived");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capture_session::{
        ForegroundHost, HostResult, Notification, NotificationChannel, SessionConfig, SessionError,
    };
    use shared_protocol::{ForegroundCategory, PlatformCapabilities, SessionState};
    use tokio::sync::Notify;

    #[derive(Default)]
    struct CountingHost {
        posted: Mutex<Vec<ForegroundCategory>>,
        stopped: Mutex<usize>,
    }

    impl ForegroundHost for CountingHost {
        fn create_channel(&self, _channel: &NotificationChannel) -> HostResult<()> {
            Ok(())
        }

        fn start_foreground(
            &self,
            _notification: &Notification,
            category: ForegroundCategory,
        ) -> HostResult<()> {
            self.posted.lock().push(category);
            Ok(())
        }

        fn stop_foreground(&self, _notification_id: i32) {
            *self.stopped.lock() += 1;
        }
    }

    #[derive(Default)]
    struct ScriptedExchange {
        launches: Mutex<Vec<i32>>,
        launched: Notify,
        fail: bool,
    }

    impl PermissionExchange for ScriptedExchange {
        fn launch(&self, request_code: i32) -> Result<(), ExchangeError> {
            if self.fail {
                return Err(ExchangeError("no activity to handle intent".to_string()));
            }
            self.launches.lock().push(request_code);
            self.launched.notify_one();
            Ok(())
        }
    }

    struct Fixture {
        host: Arc<CountingHost>,
        exchange: Arc<ScriptedExchange>,
        coordinator: Arc<PermissionCoordinator>,
    }

    fn fixture_with(api_level: u32, exchange: ScriptedExchange) -> Fixture {
        let host = Arc::new(CountingHost::default());
        let exchange = Arc::new(exchange);
        let caps = PlatformCapabilities::for_api_level(api_level).unwrap();
        let sessions = Arc::new(CaptureSessionManager::new(
            host.clone(),
            caps,
            SessionConfig::default(),
        ));
        let coordinator = Arc::new(PermissionCoordinator::new(exchange.clone(), sessions));
        Fixture {
            host,
            exchange,
            coordinator,
        }
    }

    fn fixture(api_level: u32) -> Fixture {
        fixture_with(api_level, ScriptedExchange::default())
    }

    fn projection() -> Option<Bytes> {
        Some(Bytes::from_static(b"projection-intent"))
    }

    #[tokio::test]
    async fn test_granted_starts_session() {
        let f = fixture(34);
        let c = f.coordinator.clone();
        let task = tokio::spawn(async move { c.start_sharing().await });

        f.exchange.launched.notified().await;
        assert_eq!(f.coordinator.sessions().state(), SessionState::AwaitingGrant);
        assert!(f.coordinator.is_pending());

        assert!(f.coordinator.on_permission_result(
            MEDIA_PROJECTION_REQUEST_CODE,
            PermissionStatus::Ok,
            projection()
        ));

        task.await.unwrap().unwrap();
        assert_eq!(f.coordinator.sessions().state(), SessionState::Running);
        assert!(f.coordinator.sessions().has_grant());
        assert_eq!(
            *f.host.posted.lock(),
            vec![ForegroundCategory::MediaProjection]
        );
        assert_eq!(*f.exchange.launches.lock(), vec![MEDIA_PROJECTION_REQUEST_CODE]);
    }

    #[tokio::test]
    async fn test_denied_surfaces_reason() {
        let f = fixture(34);
        let c = f.coordinator.clone();
        let task = tokio::spawn(async move { c.start_sharing().await });

        f.exchange.launched.notified().await;
        f.coordinator
            .on_permission_result(MEDIA_PROJECTION_REQUEST_CODE, PermissionStatus::Denied, None);

        match task.await.unwrap() {
            Err(CoordinatorError::PermissionDenied(reason)) => {
                assert_eq!(reason, "User denied screen capture permission")
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(f.coordinator.sessions().state(), SessionState::Idle);
        assert!(f.host.posted.lock().is_empty());
    }

    #[tokio::test]
    async fn test_ok_without_payload_is_denied() {
        let f = fixture(34);
        let c = f.coordinator.clone();
        let task = tokio::spawn(async move { c.request_capture_permission().await });

        f.exchange.launched.notified().await;
        f.coordinator
            .on_permission_result(MEDIA_PROJECTION_REQUEST_CODE, PermissionStatus::Ok, None);

        assert_eq!(
            task.await.unwrap().unwrap(),
            PermissionOutcome::Denied {
                reason: PERMISSION_DENIED_REASON.to_string()
            }
        );
        assert_eq!(f.coordinator.sessions().state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_cancelled_leaves_idle() {
        let f = fixture(34);
        let c = f.coordinator.clone();
        let task = tokio::spawn(async move { c.request_capture_permission().await });

        f.exchange.launched.notified().await;
        f.coordinator.on_permission_result(
            MEDIA_PROJECTION_REQUEST_CODE,
            PermissionStatus::Cancelled,
            None,
        );

        assert_eq!(task.await.unwrap().unwrap(), PermissionOutcome::Cancelled);
        assert_eq!(f.coordinator.sessions().state(), SessionState::Idle);
        assert!(!f.coordinator.is_pending());
    }

    #[tokio::test]
    async fn test_legacy_platform_skips_permission() {
        let f = fixture(29);
        f.coordinator.start_sharing().await.unwrap();

        assert!(f.exchange.launches.lock().is_empty());
        assert!(f.coordinator.sessions().is_running());
        assert!(!f.coordinator.sessions().has_grant());
        assert_eq!(*f.host.posted.lock(), vec![ForegroundCategory::Generic]);
    }

    #[tokio::test]
    async fn test_second_request_while_pending_is_rejected() {
        let f = fixture(34);
        let c = f.coordinator.clone();
        let first = tokio::spawn(async move { c.start_sharing().await });
        f.exchange.launched.notified().await;

        assert!(matches!(
            f.coordinator.start_sharing().await,
            Err(CoordinatorError::AlreadyPending)
        ));

        f.coordinator.on_permission_result(
            MEDIA_PROJECTION_REQUEST_CODE,
            PermissionStatus::Ok,
            projection(),
        );
        first.await.unwrap().unwrap();

        assert_eq!(f.exchange.launches.lock().len(), 1);
        assert_eq!(f.host.posted.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_results_post_one_notification() {
        let f = fixture(34);
        let c = f.coordinator.clone();
        let task = tokio::spawn(async move { c.start_sharing().await });
        f.exchange.launched.notified().await;

        // Platform replays the result; only the first one counts
        assert!(f.coordinator.on_permission_result(
            MEDIA_PROJECTION_REQUEST_CODE,
            PermissionStatus::Ok,
            projection()
        ));
        assert!(!f.coordinator.on_permission_result(
            MEDIA_PROJECTION_REQUEST_CODE,
            PermissionStatus::Ok,
            projection()
        ));

        task.await.unwrap().unwrap();
        assert_eq!(f.host.posted.lock().len(), 1);
        assert!(f.coordinator.sessions().is_running());
    }

    #[tokio::test]
    async fn test_foreign_request_code_is_ignored() {
        let f = fixture(34);
        let c = f.coordinator.clone();
        let task = tokio::spawn(async move { c.start_sharing().await });
        f.exchange.launched.notified().await;

        assert!(!f.coordinator.on_permission_result(42, PermissionStatus::Ok, projection()));
        assert!(f.coordinator.is_pending());

        f.coordinator.on_permission_result(
            MEDIA_PROJECTION_REQUEST_CODE,
            PermissionStatus::Ok,
            projection(),
        );
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_launch_failure_clears_pending() {
        let f = fixture_with(
            34,
            ScriptedExchange {
                fail: true,
                ..Default::default()
            },
        );

        assert!(matches!(
            f.coordinator.start_sharing().await,
            Err(CoordinatorError::Launch(_))
        ));
        assert!(!f.coordinator.is_pending());
        assert_eq!(f.coordinator.sessions().state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_teardown_requires_fresh_grant() {
        let f = fixture(34);
        let c = f.coordinator.clone();
        let task = tokio::spawn(async move { c.start_sharing().await });
        f.exchange.launched.notified().await;
        f.coordinator.on_permission_result(
            MEDIA_PROJECTION_REQUEST_CODE,
            PermissionStatus::Ok,
            projection(),
        );
        task.await.unwrap().unwrap();

        f.coordinator.on_service_destroyed().unwrap();
        assert_eq!(*f.host.stopped.lock(), 1);
        assert!(!f.coordinator.sessions().has_grant());
        assert!(matches!(
            f.coordinator.sessions().start(None),
            Err(SessionError::NoGrant)
        ));
    }

    #[tokio::test]
    async fn test_stop_sharing_is_idempotent() {
        let f = fixture(29);
        f.coordinator.stop_sharing().unwrap();
        f.coordinator.start_sharing().await.unwrap();
        f.coordinator.stop_sharing().unwrap();
        f.coordinator.stop_sharing().unwrap();

        assert_eq!(*f.host.stopped.lock(), 1);
        assert_eq!(f.coordinator.sessions().state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_abandoned_request_frees_the_session() {
        let f = fixture(34);
        let c = f.coordinator.clone();
        let task = tokio::spawn(async move { c.start_sharing().await });
        f.exchange.launched.notified().await;

        f.coordinator.abandon_pending();
        assert!(matches!(task.await.unwrap(), Err(CoordinatorError::Abandoned)));
        assert_eq!(f.coordinator.sessions().state(), SessionState::Idle);

        // A fresh request can be made afterwards
        let c = f.coordinator.clone();
        let task = tokio::spawn(async move { c.start_sharing().await });
        f.exchange.launched.notified().await;
        f.coordinator.on_permission_result(
            MEDIA_PROJECTION_REQUEST_CODE,
            PermissionStatus::Ok,
            projection(),
        );
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_stop_while_dialog_open_discards_late_grant() {
        let f = fixture(34);
        let c = f.coordinator.clone();
        let task = tokio::spawn(async move { c.start_sharing().await });
        f.exchange.launched.notified().await;

        f.coordinator.stop_sharing().unwrap();
        assert!(matches!(task.await.unwrap(), Err(CoordinatorError::Abandoned)));
        assert_eq!(f.coordinator.sessions().state(), SessionState::Idle);

        assert!(!f.coordinator.on_permission_result(
            MEDIA_PROJECTION_REQUEST_CODE,
            PermissionStatus::Ok,
            projection()
        ));
        assert!(!f.coordinator.sessions().is_running());
        assert!(f.host.posted.lock().is_empty());
    }

    #[tokio::test]
    async fn test_close_abandons_pending_and_refuses_new_starts() {
        let f = fixture(34);
        let c = f.coordinator.clone();
        let task = tokio::spawn(async move { c.start_sharing().await });
        f.exchange.launched.notified().await;

        f.coordinator.close();
        assert!(matches!(task.await.unwrap(), Err(CoordinatorError::Abandoned)));
        assert_eq!(f.coordinator.sessions().state(), SessionState::Idle);

        assert!(matches!(
            f.coordinator.start_sharing().await,
            Err(CoordinatorError::Abandoned)
        ));
        assert_eq!(f.exchange.launches.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_close_refuses_direct_start() {
        let f = fixture(29);
        f.coordinator.close();
        assert!(matches!(
            f.coordinator.start_sharing().await,
            Err(CoordinatorError::Abandoned)
        ));
        assert!(f.host.posted.lock().is_empty());
    }

    #[tokio::test]
    async fn test_late_result_without_request_is_ignored() {
        let f = fixture(34);
        assert!(!f.coordinator.on_permission_result(
            MEDIA_PROJECTION_REQUEST_CODE,
            PermissionStatus::Ok,
            projection()
        ));
        assert_eq!(f.coordinator.sessions().state(), SessionState::Idle);
        assert!(f.host.posted.lock().is_empty());
    }
}
