//! Event types for the Aerial event system
//!
//! Provides the shared event definitions and the EventBus used to stream
//! refresh progress from the pipeline to observers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Refresh pipeline stage
///
/// Transitions run strictly forward through
/// `Idle → Validating → Downloading → Parsing → Persisting → Complete`;
/// `Failed` is reachable from any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RefreshStage {
    /// No refresh running
    Idle,
    /// Verifying credentials against the account endpoint
    Validating,
    /// Streaming the playlist document
    Downloading,
    /// Parsing playlist text into entries
    Parsing,
    /// Writing the catalog transaction
    Persisting,
    /// Refresh finished successfully
    Complete,
    /// Refresh aborted with an error
    Failed,
}

impl RefreshStage {
    /// Whether the stage ends the pipeline
    pub fn is_terminal(&self) -> bool {
        matches!(self, RefreshStage::Complete | RefreshStage::Failed)
    }
}

/// Observer-facing status of a refresh run
///
/// Intermediate stages report `success: false, in_progress: true`; only
/// the terminal stages flip those flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshStatus {
    pub success: bool,
    pub in_progress: bool,
    pub message: String,
}

impl RefreshStatus {
    /// Status for a stage still in flight
    pub fn running(message: impl Into<String>) -> Self {
        Self {
            success: false,
            in_progress: true,
            message: message.into(),
        }
    }

    /// Terminal success status
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            in_progress: false,
            message: message.into(),
        }
    }

    /// Terminal failure status carrying the originating error's message
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            in_progress: false,
            message: message.into(),
        }
    }
}

/// Advisory progress notification emitted by pipeline stages
///
/// `percent` is present only when the stage can compute one (e.g. the
/// download knows the declared content length).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub message: String,
    pub percent: Option<u8>,
}

impl Progress {
    /// Progress with a message only
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            percent: None,
        }
    }

    /// Progress with a completion percentage
    pub fn with_percent(message: impl Into<String>, percent: u8) -> Self {
        Self {
            message: message.into(),
            percent: Some(percent),
        }
    }
}

/// Aerial event types
///
/// Events are broadcast via [`EventBus`]; they serialize with a `type` tag
/// so observers outside the process can consume them unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AerialEvent {
    /// The refresh pipeline moved to a new stage
    RefreshStageChanged {
        /// Refresh run this event belongs to
        session_id: Uuid,
        /// Stage before the transition
        old_stage: RefreshStage,
        /// Stage after the transition
        new_stage: RefreshStage,
        /// Observer-facing status at this transition
        status: RefreshStatus,
        /// When the transition happened
        timestamp: DateTime<Utc>,
    },

    /// A stage reported byte- or row-level progress
    RefreshProgress {
        session_id: Uuid,
        /// Stage that produced the progress
        stage: RefreshStage,
        message: String,
        /// Completion percentage when the stage can compute one
        percent: Option<u8>,
        timestamp: DateTime<Utc>,
    },

    /// The pipeline reached a terminal stage
    ///
    /// `status` matches the value returned to the caller; a failed run
    /// carries the failure message here.
    RefreshCompleted {
        session_id: Uuid,
        status: RefreshStatus,
        timestamp: DateTime<Utc>,
    },
}

/// Central event distribution bus
///
/// Wraps `tokio::sync::broadcast`: non-blocking publish, any number of
/// concurrent subscribers, automatic cleanup when receivers drop. Progress
/// delivery is advisory, so emission is lossy — having no subscribers is
/// never an error and can never abort the pipeline.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AerialEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<AerialEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring the absence of subscribers
    pub fn emit_lossy(&self, event: AerialEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
