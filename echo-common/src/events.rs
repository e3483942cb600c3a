//! Event types for the journey
//!
//! The journey runtime publishes these on an [`EventBus`] so a front end
//! can re-render without polling the controller.

use crate::models::{Payload, RecognizedSong, Stage};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Journey event types
///
/// Serialized with a `type` tag so they can be forwarded verbatim to a
/// browser or logged as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JourneyEvent {
    /// The visible stage changed
    StageChanged {
        old_stage: Stage,
        new_stage: Stage,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Token fetch finished; `ready` is false when it failed
    TokenResolved {
        ready: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Wheel moved the front-facing menu item
    SelectionChanged { index: usize },

    /// Modal opened (`kind` = menu index) or closed (`kind` = None)
    ModalChanged { visible: bool, kind: Option<usize> },

    /// Modal submitted a payload
    PayloadSubmitted { payload: Payload },

    /// Song list finished loading
    SongListLoaded {
        count: usize,
        cover_url: Option<String>,
    },

    /// Cover art in the centre of the scene changed
    CoverChanged { cover_url: Option<String> },

    /// Audio preview source changed (None stops playback)
    PreviewChanged { preview_url: Option<String> },

    /// Recognition succeeded
    SongRecognized {
        song: RecognizedSong,
        file_name: Option<String>,
    },

    /// Recognition failed; the capture screen stays open
    RecognitionFailed { reason: String },

    /// Dismissible message for the user
    Notice { message: String },
}

impl JourneyEvent {
    pub fn stage_changed(old_stage: Stage, new_stage: Stage) -> Self {
        JourneyEvent::StageChanged {
            old_stage,
            new_stage,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn event_type(&self) -> &str {
        match self {
            JourneyEvent::StageChanged { .. } => "StageChanged",
            JourneyEvent::TokenResolved { .. } => "TokenResolved",
            JourneyEvent::SelectionChanged { .. } => "SelectionChanged",
            JourneyEvent::ModalChanged { .. } => "ModalChanged",
            JourneyEvent::PayloadSubmitted { .. } => "PayloadSubmitted",
            JourneyEvent::SongListLoaded { .. } => "SongListLoaded",
            JourneyEvent::CoverChanged { .. } => "CoverChanged",
            JourneyEvent::PreviewChanged { .. } => "PreviewChanged",
            JourneyEvent::SongRecognized { .. } => "SongRecognized",
            JourneyEvent::RecognitionFailed { .. } => "RecognitionFailed",
            JourneyEvent::Notice { .. } => "Notice",
        }
    }
}

/// Broadcast bus for journey events
///
/// Cloning shares the same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<JourneyEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<JourneyEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: JourneyEvent,
    ) -> Result<usize, broadcast::error::SendError<JourneyEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: JourneyEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
