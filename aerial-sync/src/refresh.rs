//! Refresh orchestration
//!
//! Drives one full refresh in strict sequence - validate credentials,
//! download, parse, categorize, persist - emitting stage transitions and
//! progress on the event bus. Any stage failure moves the run straight to
//! `Failed`; no downstream stage runs after an error.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{error, info};
use uuid::Uuid;

use aerial_common::db::models::Credentials;
use aerial_common::db::{account, catalog};
use aerial_common::events::{AerialEvent, EventBus, Progress, RefreshStage, RefreshStatus};
use aerial_common::Result;

use crate::catalog::categorize;
use crate::playlist::parse_playlist;
use crate::xtream::XtreamClient;

/// One refresh run: identity, current stage and timing
#[derive(Debug, Clone)]
pub struct RefreshSession {
    pub session_id: Uuid,
    pub stage: RefreshStage,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl RefreshSession {
    fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            stage: RefreshStage::Idle,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Move to `new_stage`, returning the (old, new) pair
    fn transition_to(&mut self, new_stage: RefreshStage) -> (RefreshStage, RefreshStage) {
        let old_stage = self.stage;
        self.stage = new_stage;
        if new_stage.is_terminal() {
            self.ended_at = Some(Utc::now());
        }
        (old_stage, new_stage)
    }
}

/// Counts from a completed refresh
#[derive(Debug, Clone)]
pub struct RefreshSummary {
    pub categories: usize,
    pub items: usize,
}

/// Sequences the refresh pipeline against one database pool
///
/// Runs are strictly sequential: callers must not start a second refresh
/// while one is in flight (e.g. disable the triggering control until the
/// final status arrives).
pub struct RefreshOrchestrator {
    pool: SqlitePool,
    event_bus: EventBus,
}

impl RefreshOrchestrator {
    pub fn new(pool: SqlitePool, event_bus: EventBus) -> Self {
        Self { pool, event_bus }
    }

    /// Run one refresh to completion or failure
    ///
    /// Every stage transition is emitted on the event bus; the returned
    /// status matches the terminal `RefreshCompleted` event. A failed run
    /// carries the originating error's message and is never reported as a
    /// partial success.
    pub async fn run(&self, credentials: Credentials) -> RefreshStatus {
        let mut session = RefreshSession::new();
        info!(
            session_id = %session.session_id,
            server = %credentials.server,
            "Refresh started"
        );

        let status = match self.execute(&mut session, credentials).await {
            Ok(summary) => {
                info!(
                    session_id = %session.session_id,
                    categories = summary.categories,
                    items = summary.items,
                    "Refresh complete"
                );
                RefreshStatus::succeeded("Data refresh complete")
            }
            Err(e) => {
                error!(session_id = %session.session_id, error = %e, "Refresh failed");
                RefreshStatus::failed(e.to_string())
            }
        };

        let terminal = if status.success {
            RefreshStage::Complete
        } else {
            RefreshStage::Failed
        };
        self.enter_stage(&mut session, terminal, status.clone());

        self.event_bus.emit_lossy(AerialEvent::RefreshCompleted {
            session_id: session.session_id,
            status: status.clone(),
            timestamp: Utc::now(),
        });

        status
    }

    async fn execute(
        &self,
        session: &mut RefreshSession,
        credentials: Credentials,
    ) -> Result<RefreshSummary> {
        let client = XtreamClient::new(credentials)?;

        self.enter_stage(
            session,
            RefreshStage::Validating,
            RefreshStatus::running("Verifying credentials..."),
        );
        client.validate().await?;
        account::save_account(&self.pool, client.credentials()).await?;

        self.enter_stage(
            session,
            RefreshStage::Downloading,
            RefreshStatus::running("Downloading playlist..."),
        );
        let text = client
            .download_playlist(forward_progress(
                self.event_bus.clone(),
                session.session_id,
                session.stage,
            ))
            .await?;

        self.enter_stage(
            session,
            RefreshStage::Parsing,
            RefreshStatus::running("Parsing playlist..."),
        );
        let entries = parse_playlist(&text)?;

        self.enter_stage(
            session,
            RefreshStage::Persisting,
            RefreshStatus::running("Saving data to database..."),
        );
        let categories = categorize(entries);
        let stats = catalog::replace_catalog(
            &self.pool,
            &categories,
            forward_progress(self.event_bus.clone(), session.session_id, session.stage),
        )
        .await?;

        Ok(RefreshSummary {
            categories: stats.categories_written,
            items: stats.items_written,
        })
    }

    fn enter_stage(&self, session: &mut RefreshSession, stage: RefreshStage, status: RefreshStatus) {
        let (old_stage, new_stage) = session.transition_to(stage);
        self.event_bus.emit_lossy(AerialEvent::RefreshStageChanged {
            session_id: session.session_id,
            old_stage,
            new_stage,
            status,
            timestamp: Utc::now(),
        });
    }
}

/// Adapt a stage's progress callback into bus events
fn forward_progress(
    bus: EventBus,
    session_id: Uuid,
    stage: RefreshStage,
) -> impl FnMut(Progress) {
    move |progress| {
        bus.emit_lossy(AerialEvent::RefreshProgress {
            session_id,
            stage,
            message: progress.message,
            percent: progress.percent,
            timestamp: Utc::now(),
        });
    }
}
