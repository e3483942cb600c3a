//! Stage controller
//!
//! Owns the visible stage and every piece of state that hangs off it.
//! Each input returns the [`Effect`]s the runtime must carry out; the
//! controller itself never sleeps, spawns or touches the network, so it
//! can be driven step by step in tests.
//!
//! Delayed transitions are tickets. Scheduling one cancels the previous
//! ticket, and so does any stage change. A timer that fires with a ticket
//! that is no longer pending, or whose origin stage is no longer current,
//! is dropped. Song loads, preview lookups and recognition uploads carry
//! tickets too; a late result whose ticket is no longer pending is
//! discarded.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use echo_common::events::JourneyEvent;
use echo_common::models::{Payload, RecognizedSong, Song, Stage};
use echo_common::query::build_search_query;
use echo_common::time::Clock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::recognition::{AudioUpload, RecognitionOutcome};
use crate::song_list::preview_unavailable_notice;
use crate::stage::{MenuTarget, ModalKind, ModalState, SelectionIndex};

/// Delays and throttles used by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerTimings {
    /// Intro (2) to menu (3)
    pub intro_delay: Duration,
    /// Configure (4) to song list (5) after a submission
    pub submit_delay: Duration,
    /// Wheel input ignored for this long after a step
    pub wheel_throttle: Duration,
}

impl Default for ControllerTimings {
    fn default() -> Self {
        Self {
            intro_delay: Duration::from_secs(2),
            submit_delay: Duration::from_secs(1),
            wheel_throttle: Duration::from_millis(500),
        }
    }
}

/// Identifies one scheduled transition and the stage it was scheduled from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransitionTicket {
    pub id: u64,
    pub from: Stage,
}

/// Identifies one song list load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadTicket(pub u64);

/// Identifies one preview fallback lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreviewTicket(pub u64);

/// Identifies one recognition upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecognitionTicket(pub u64);

/// Progress of the startup token fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TokenState {
    #[default]
    Pending,
    Ready,
    /// Fetch failed; the welcome screen stays locked
    Failed,
}

/// Work requested by the controller
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ScheduleTransition {
        ticket: TransitionTicket,
        to: Stage,
        delay: Duration,
    },
    CancelTransition(TransitionTicket),
    LoadSongs {
        ticket: LoadTicket,
        query: String,
    },
    LookupPreview {
        ticket: PreviewTicket,
        title: String,
        artist: String,
    },
    Recognize {
        ticket: RecognitionTicket,
        upload: AudioUpload,
    },
    Emit(JourneyEvent),
}

/// Read-only view of the controller state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerSnapshot {
    pub stage: Stage,
    pub selection: usize,
    pub modal: ModalState,
    pub payload: Option<Payload>,
    pub token: TokenState,
    pub songs: Vec<Song>,
    pub total_songs: usize,
    pub selected_song: usize,
    pub cover_url: Option<String>,
    pub preview_url: Option<String>,
    pub preview_lookup_pending: bool,
    pub recognition_pending: bool,
    pub recognized: Option<RecognizedSong>,
    pub upload_file_name: Option<String>,
    pub pending_transition: Option<TransitionTicket>,
}

pub struct StageController {
    clock: Arc<dyn Clock>,
    timings: ControllerTimings,

    stage: Stage,
    selection: SelectionIndex,
    modal: ModalState,
    payload: Option<Payload>,
    token: TokenState,

    songs: Vec<Song>,
    total_songs: usize,
    selected_song: usize,
    cover_url: Option<String>,
    preview_url: Option<String>,
    pending_preview: Option<PreviewTicket>,

    recognized: Option<RecognizedSong>,
    upload_file_name: Option<String>,
    pending_recognition: Option<RecognitionTicket>,

    pending_transition: Option<(TransitionTicket, Stage)>,
    next_ticket_id: u64,
    current_load: Option<LoadTicket>,
    next_load_id: u64,
    next_preview_id: u64,
    next_recognition_id: u64,
    last_wheel: Option<DateTime<Utc>>,
}

impl StageController {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_timings(clock, ControllerTimings::default())
    }

    pub fn with_timings(clock: Arc<dyn Clock>, timings: ControllerTimings) -> Self {
        Self {
            clock,
            timings,
            stage: Stage::Welcome,
            selection: SelectionIndex::default(),
            modal: ModalState::closed(),
            payload: None,
            token: TokenState::Pending,
            songs: Vec::new(),
            total_songs: 0,
            selected_song: 0,
            cover_url: None,
            preview_url: None,
            pending_preview: None,
            recognized: None,
            upload_file_name: None,
            pending_recognition: None,
            pending_transition: None,
            next_ticket_id: 1,
            current_load: None,
            next_load_id: 1,
            next_preview_id: 1,
            next_recognition_id: 1,
            last_wheel: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn timings(&self) -> ControllerTimings {
        self.timings
    }

    /// The welcome screen only advances once the token is in hand
    pub fn is_next_enabled(&self) -> bool {
        self.stage == Stage::Welcome && self.token == TokenState::Ready
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            stage: self.stage,
            selection: self.selection.get(),
            modal: self.modal,
            payload: self.payload.clone(),
            token: self.token,
            songs: self.songs.clone(),
            total_songs: self.total_songs,
            selected_song: self.selected_song,
            cover_url: self.cover_url.clone(),
            preview_url: self.preview_url.clone(),
            preview_lookup_pending: self.pending_preview.is_some(),
            recognition_pending: self.pending_recognition.is_some(),
            recognized: self.recognized.clone(),
            upload_file_name: self.upload_file_name.clone(),
            pending_transition: self.pending_transition.map(|(ticket, _)| ticket),
        }
    }

    // ------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------

    pub fn token_resolved(&mut self, ready: bool) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.token = if ready {
            TokenState::Ready
        } else {
            warn!("Catalog token unavailable; welcome screen stays locked");
            TokenState::Failed
        };
        effects.push(Effect::Emit(JourneyEvent::TokenResolved {
            ready,
            timestamp: self.clock.now(),
        }));

        // Song list opened before the token arrived
        if ready
            && self.stage == Stage::SongList
            && self.current_load.is_none()
            && self.songs.is_empty()
        {
            self.start_load(&mut effects);
        }
        effects
    }

    /// Login or continue as guest
    pub fn next(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.stage != Stage::Welcome {
            return effects;
        }
        match self.token {
            TokenState::Pending => debug!("Next ignored: token fetch still pending"),
            TokenState::Failed => debug!("Next ignored: token fetch failed"),
            TokenState::Ready => {
                self.change_stage(Stage::Intro, &mut effects);
                self.schedule(Stage::Menu, self.timings.intro_delay, &mut effects);
            }
        }
        effects
    }

    pub fn wheel(&mut self, delta: f64) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.stage != Stage::Menu {
            return effects;
        }

        let now = self.clock.now();
        if let Some(last) = self.last_wheel {
            let throttle = ChronoDuration::from_std(self.timings.wheel_throttle)
                .unwrap_or(ChronoDuration::zero());
            if now.signed_duration_since(last) < throttle {
                return effects;
            }
        }
        self.last_wheel = Some(now);

        self.selection = self.selection.step(delta);
        effects.push(Effect::Emit(JourneyEvent::SelectionChanged {
            index: self.selection.get(),
        }));
        effects
    }

    /// Click on a menu item
    pub fn click_item(&mut self, index: usize) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.stage != Stage::Menu {
            return effects;
        }

        match MenuTarget::for_index(index) {
            None => debug!(index, "Click on unknown menu item ignored"),
            Some(MenuTarget::Wall) => self.change_stage(Stage::MessageWall, &mut effects),
            Some(MenuTarget::Modal(kind)) => {
                self.modal = ModalState::open(kind);
                effects.push(Effect::Emit(JourneyEvent::ModalChanged {
                    visible: true,
                    kind: Some(kind.index()),
                }));
                self.change_stage(Stage::Configure, &mut effects);
            }
        }
        effects
    }

    /// Click on whichever item currently faces the user
    pub fn activate_selection(&mut self) -> Vec<Effect> {
        self.click_item(self.selection.get())
    }

    pub fn submit(&mut self, payload: Payload) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.stage != Stage::Configure {
            debug!(stage = %self.stage, "Submission outside the configure stage ignored");
            return effects;
        }

        // A confirmed choice supersedes any upload still in flight
        self.pending_recognition = None;
        effects.push(Effect::Emit(JourneyEvent::PayloadSubmitted {
            payload: payload.clone(),
        }));
        self.modal = self.modal.hidden();
        effects.push(Effect::Emit(JourneyEvent::ModalChanged {
            visible: false,
            kind: self.modal.kind.map(|k| k.index()),
        }));

        match payload {
            Payload::Recognized { song, file_name } => {
                self.recognized = Some(song.clone());
                self.upload_file_name = file_name.clone();
                effects.push(Effect::Emit(JourneyEvent::SongRecognized { song, file_name }));
                self.change_stage(Stage::RecognitionResult, &mut effects);
            }
            search => {
                self.payload = Some(search);
                self.total_songs = 0;
                self.selected_song = 0;
                self.preview_url = None;
                self.schedule(Stage::SongList, self.timings.submit_delay, &mut effects);
            }
        }
        effects
    }

    pub fn cancel_modal(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.stage != Stage::Configure {
            return effects;
        }
        self.modal = ModalState::closed();
        self.pending_recognition = None;
        effects.push(Effect::Emit(JourneyEvent::ModalChanged {
            visible: false,
            kind: None,
        }));
        self.change_stage(Stage::Menu, &mut effects);
        effects
    }

    pub fn back(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        match self.stage {
            Stage::SongList => {
                self.change_stage(Stage::Menu, &mut effects);
                self.selection = SelectionIndex::default();
                self.payload = None;
                self.cover_url = None;
                self.selected_song = 0;
                self.total_songs = 0;
                self.preview_url = None;
                self.songs.clear();
                self.current_load = None;
                self.pending_preview = None;
                effects.push(Effect::Emit(JourneyEvent::SelectionChanged { index: 0 }));
                effects.push(Effect::Emit(JourneyEvent::CoverChanged { cover_url: None }));
                effects.push(Effect::Emit(JourneyEvent::PreviewChanged { preview_url: None }));
            }
            Stage::MessageWall | Stage::RecognitionResult => {
                self.change_stage(Stage::Menu, &mut effects);
            }
            _ => {}
        }
        effects
    }

    pub fn timer_fired(&mut self, ticket: TransitionTicket) -> Vec<Effect> {
        let mut effects = Vec::new();
        match self.pending_transition {
            Some((pending, to)) if pending == ticket && self.stage == ticket.from => {
                self.pending_transition = None;
                self.change_stage(to, &mut effects);
            }
            _ => debug!(ticket = ticket.id, from = %ticket.from, "Stale transition ignored"),
        }
        effects
    }

    pub fn songs_loaded(&mut self, ticket: LoadTicket, songs: Vec<Song>) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.current_load != Some(ticket) || self.stage != Stage::SongList {
            debug!(ticket = ticket.0, "Stale song list discarded");
            return effects;
        }
        self.current_load = None;

        self.total_songs = songs.len();
        self.selected_song = 0;
        self.cover_url = songs.first().and_then(|s| s.cover_url.clone());
        self.songs = songs;
        info!(count = self.total_songs, "Song list loaded");

        effects.push(Effect::Emit(JourneyEvent::SongListLoaded {
            count: self.total_songs,
            cover_url: self.cover_url.clone(),
        }));
        effects.push(Effect::Emit(JourneyEvent::CoverChanged {
            cover_url: self.cover_url.clone(),
        }));
        if self.songs.is_empty() {
            self.preview_url = None;
            effects.push(Effect::Emit(JourneyEvent::PreviewChanged { preview_url: None }));
        }
        effects
    }

    pub fn select_song(&mut self, index: usize) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.stage != Stage::SongList {
            return effects;
        }
        if self.pending_preview.is_some() {
            debug!(index, "Selection ignored while a preview lookup is in flight");
            return effects;
        }
        let Some(song) = self.songs.get(index).cloned() else {
            return effects;
        };

        self.selected_song = index;
        self.cover_url = song.cover_url.clone();
        effects.push(Effect::Emit(JourneyEvent::CoverChanged {
            cover_url: song.cover_url.clone(),
        }));

        match song.preview_url {
            Some(url) => {
                self.preview_url = Some(url.clone());
                effects.push(Effect::Emit(JourneyEvent::PreviewChanged {
                    preview_url: Some(url),
                }));
            }
            None => {
                let ticket = PreviewTicket(self.next_preview_id);
                self.next_preview_id += 1;
                self.preview_url = None;
                self.pending_preview = Some(ticket);
                effects.push(Effect::Emit(JourneyEvent::PreviewChanged { preview_url: None }));
                effects.push(Effect::LookupPreview {
                    ticket,
                    title: song.title,
                    artist: song.artist,
                });
            }
        }
        effects
    }

    pub fn preview_resolved(
        &mut self,
        ticket: PreviewTicket,
        title: &str,
        preview_url: Option<String>,
    ) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.pending_preview != Some(ticket) || self.stage != Stage::SongList {
            debug!(ticket = ticket.0, %title, "Stale preview discarded");
            return effects;
        }
        self.pending_preview = None;

        match preview_url {
            Some(url) => {
                self.preview_url = Some(url.clone());
                effects.push(Effect::Emit(JourneyEvent::PreviewChanged {
                    preview_url: Some(url),
                }));
            }
            None => effects.push(Effect::Emit(JourneyEvent::Notice {
                message: preview_unavailable_notice(title),
            })),
        }
        effects
    }

    /// Upload a recording from the AI capture screen
    pub fn submit_recording(&mut self, upload: AudioUpload) -> Vec<Effect> {
        if !self.capturing() {
            debug!(stage = %self.stage, "Recording outside the capture screen ignored");
            return Vec::new();
        }
        let ticket = RecognitionTicket(self.next_recognition_id);
        self.next_recognition_id += 1;
        self.pending_recognition = Some(ticket);
        vec![Effect::Recognize { ticket, upload }]
    }

    pub fn recognition_completed(
        &mut self,
        ticket: RecognitionTicket,
        outcome: RecognitionOutcome,
    ) -> Vec<Effect> {
        if self.pending_recognition != Some(ticket) || !self.capturing() {
            debug!(ticket = ticket.0, "Stale recognition result discarded");
            return Vec::new();
        }
        self.pending_recognition = None;

        match outcome {
            RecognitionOutcome::Recognized(payload) => self.submit(payload),
            // The capture screen stays open
            RecognitionOutcome::Failed(reason) => {
                warn!(%reason, "Recognition failed");
                vec![Effect::Emit(JourneyEvent::RecognitionFailed { reason })]
            }
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn capturing(&self) -> bool {
        self.stage == Stage::Configure && self.modal.kind == Some(ModalKind::Ai)
    }

    fn change_stage(&mut self, to: Stage, effects: &mut Vec<Effect>) {
        if self.stage == to {
            return;
        }
        if let Some((ticket, _)) = self.pending_transition.take() {
            effects.push(Effect::CancelTransition(ticket));
        }
        self.pending_recognition = None;

        let old_stage = self.stage;
        self.stage = to;
        info!(from = %old_stage, to = %to, "Stage changed");
        effects.push(Effect::Emit(JourneyEvent::StageChanged {
            old_stage,
            new_stage: to,
            timestamp: self.clock.now(),
        }));

        if to == Stage::SongList {
            self.total_songs = 0;
            self.preview_url = None;
            self.songs.clear();
            self.selected_song = 0;
            self.pending_preview = None;
            self.current_load = None;
            self.start_load(effects);
        }
    }

    fn schedule(&mut self, to: Stage, delay: Duration, effects: &mut Vec<Effect>) {
        if let Some((previous, _)) = self.pending_transition.take() {
            effects.push(Effect::CancelTransition(previous));
        }
        let ticket = TransitionTicket {
            id: self.next_ticket_id,
            from: self.stage,
        };
        self.next_ticket_id += 1;
        self.pending_transition = Some((ticket, to));
        effects.push(Effect::ScheduleTransition { ticket, to, delay });
    }

    fn start_load(&mut self, effects: &mut Vec<Effect>) {
        if self.token != TokenState::Ready {
            debug!("No catalog token; song list left empty");
            return;
        }
        let ticket = LoadTicket(self.next_load_id);
        self.next_load_id += 1;
        self.current_load = Some(ticket);
        effects.push(Effect::LoadSongs {
            ticket,
            query: build_search_query(self.payload.as_ref()),
        });
    }
}
