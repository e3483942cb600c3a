//! Journey runtime
//!
//! A single task owns the [`StageController`]. Commands arrive on an mpsc
//! channel; network work runs in spawned tasks that post their results
//! back to the same task. Events are broadcast on the [`EventBus`].

use async_trait::async_trait;
use echo_common::events::EventBus;
use echo_common::models::{Payload, Song};
use echo_common::time::Clock;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::clients::ClientError;
use crate::controller::{
    ControllerSnapshot, ControllerTimings, Effect, LoadTicket, PreviewTicket, RecognitionTicket,
    StageController, TransitionTicket,
};
use crate::recognition::{submit_recording, AudioUpload, RecognitionBackend, RecognitionOutcome};
use crate::scheduler::TransitionScheduler;
use crate::song_list::SongListLoader;

const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Source of the catalog access token
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, ClientError>;
}

#[derive(Debug, Error)]
pub enum JourneyError {
    #[error("Journey runtime has stopped")]
    Stopped,
}

/// External collaborators of the runtime
#[derive(Clone)]
pub struct JourneyServices {
    pub tokens: Arc<dyn TokenProvider>,
    pub songs: SongListLoader,
    pub recognition: Arc<dyn RecognitionBackend>,
}

#[derive(Debug)]
pub enum JourneyCommand {
    Next,
    Wheel(f64),
    ClickItem(usize),
    ActivateSelection,
    Submit(Payload),
    CancelModal,
    Back,
    SelectSong(usize),
    SubmitRecording(AudioUpload),
    Snapshot(oneshot::Sender<ControllerSnapshot>),
    Shutdown,
}

/// Results posted back by spawned tasks
#[derive(Debug)]
enum TaskResult {
    Token(Option<String>),
    SongsLoaded { ticket: LoadTicket, songs: Vec<Song> },
    PreviewResolved {
        ticket: PreviewTicket,
        title: String,
        preview_url: Option<String>,
    },
    Recognition {
        ticket: RecognitionTicket,
        outcome: RecognitionOutcome,
    },
}

/// Cloneable handle to a running journey
#[derive(Clone)]
pub struct JourneyHandle {
    tx: mpsc::Sender<JourneyCommand>,
}

impl JourneyHandle {
    pub async fn send(&self, command: JourneyCommand) -> Result<(), JourneyError> {
        self.tx.send(command).await.map_err(|_| JourneyError::Stopped)
    }

    pub async fn next(&self) -> Result<(), JourneyError> {
        self.send(JourneyCommand::Next).await
    }

    pub async fn wheel(&self, delta: f64) -> Result<(), JourneyError> {
        self.send(JourneyCommand::Wheel(delta)).await
    }

    pub async fn click_item(&self, index: usize) -> Result<(), JourneyError> {
        self.send(JourneyCommand::ClickItem(index)).await
    }

    pub async fn submit(&self, payload: Payload) -> Result<(), JourneyError> {
        self.send(JourneyCommand::Submit(payload)).await
    }

    pub async fn cancel_modal(&self) -> Result<(), JourneyError> {
        self.send(JourneyCommand::CancelModal).await
    }

    pub async fn back(&self) -> Result<(), JourneyError> {
        self.send(JourneyCommand::Back).await
    }

    pub async fn select_song(&self, index: usize) -> Result<(), JourneyError> {
        self.send(JourneyCommand::SelectSong(index)).await
    }

    pub async fn submit_recording(&self, upload: AudioUpload) -> Result<(), JourneyError> {
        self.send(JourneyCommand::SubmitRecording(upload)).await
    }

    pub async fn snapshot(&self) -> Result<ControllerSnapshot, JourneyError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(JourneyCommand::Snapshot(reply_tx)).await?;
        reply_rx.await.map_err(|_| JourneyError::Stopped)
    }

    pub async fn shutdown(&self) -> Result<(), JourneyError> {
        self.send(JourneyCommand::Shutdown).await
    }
}

pub struct Journey {
    controller: StageController,
    scheduler: TransitionScheduler,
    services: JourneyServices,
    bus: EventBus,
    token: Option<String>,
    results_tx: mpsc::UnboundedSender<TaskResult>,
}

impl Journey {
    /// Start the runtime; the token fetch begins immediately
    pub fn spawn(
        services: JourneyServices,
        bus: EventBus,
        clock: Arc<dyn Clock>,
        timings: ControllerTimings,
    ) -> (JourneyHandle, JoinHandle<()>) {
        let (tx, commands) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (results_tx, results) = mpsc::unbounded_channel();
        let (scheduler, fired) = TransitionScheduler::new();

        let journey = Journey {
            controller: StageController::with_timings(clock, timings),
            scheduler,
            services,
            bus,
            token: None,
            results_tx,
        };

        let task = tokio::spawn(journey.run(commands, results, fired));
        (JourneyHandle { tx }, task)
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<JourneyCommand>,
        mut results: mpsc::UnboundedReceiver<TaskResult>,
        mut fired: mpsc::UnboundedReceiver<TransitionTicket>,
    ) {
        info!("Journey started");
        self.fetch_token();

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    None | Some(JourneyCommand::Shutdown) => break,
                    Some(command) => self.handle_command(command),
                },
                Some(ticket) = fired.recv() => {
                    self.scheduler.complete(ticket);
                    let effects = self.controller.timer_fired(ticket);
                    self.apply(effects);
                }
                Some(result) = results.recv() => self.handle_result(result),
            }
        }

        self.scheduler.cancel_all();
        info!("Journey stopped");
    }

    fn handle_command(&mut self, command: JourneyCommand) {
        debug!(?command, "Journey command");
        let effects = match command {
            JourneyCommand::Next => self.controller.next(),
            JourneyCommand::Wheel(delta) => self.controller.wheel(delta),
            JourneyCommand::ClickItem(index) => self.controller.click_item(index),
            JourneyCommand::ActivateSelection => self.controller.activate_selection(),
            JourneyCommand::Submit(payload) => self.controller.submit(payload),
            JourneyCommand::CancelModal => self.controller.cancel_modal(),
            JourneyCommand::Back => self.controller.back(),
            JourneyCommand::SelectSong(index) => self.controller.select_song(index),
            JourneyCommand::SubmitRecording(upload) => self.controller.submit_recording(upload),
            JourneyCommand::Snapshot(reply) => {
                let _ = reply.send(self.controller.snapshot());
                Vec::new()
            }
            JourneyCommand::Shutdown => Vec::new(),
        };
        self.apply(effects);
    }

    fn handle_result(&mut self, result: TaskResult) {
        let effects = match result {
            TaskResult::Token(token) => {
                let ready = token.is_some();
                self.token = token;
                self.controller.token_resolved(ready)
            }
            TaskResult::SongsLoaded { ticket, songs } => self.controller.songs_loaded(ticket, songs),
            TaskResult::PreviewResolved {
                ticket,
                title,
                preview_url,
            } => self.controller.preview_resolved(ticket, &title, preview_url),
            TaskResult::Recognition { ticket, outcome } => {
                self.controller.recognition_completed(ticket, outcome)
            }
        };
        self.apply(effects);
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ScheduleTransition { ticket, to, delay } => {
                    debug!(ticket = ticket.id, from = %ticket.from, to = %to, ?delay, "Transition scheduled");
                    self.scheduler.schedule(ticket, delay);
                }
                Effect::CancelTransition(ticket) => self.scheduler.cancel(ticket),
                Effect::LoadSongs { ticket, query } => self.spawn_load(ticket, query),
                Effect::LookupPreview {
                    ticket,
                    title,
                    artist,
                } => self.spawn_preview_lookup(ticket, title, artist),
                Effect::Recognize { ticket, upload } => self.spawn_recognition(ticket, upload),
                Effect::Emit(event) => {
                    debug!(event_type = event.event_type(), "Journey event");
                    self.bus.emit_lossy(event);
                }
            }
        }
    }

    fn fetch_token(&self) {
        let tokens = Arc::clone(&self.services.tokens);
        let results_tx = self.results_tx.clone();
        tokio::spawn(async move {
            let token = match tokens.access_token().await {
                Ok(token) => Some(token),
                Err(e) => {
                    error!("Token fetch failed: {}", e);
                    None
                }
            };
            let _ = results_tx.send(TaskResult::Token(token));
        });
    }

    fn spawn_load(&self, ticket: LoadTicket, query: String) {
        let loader = self.services.songs.clone();
        let token = self.token.clone();
        let results_tx = self.results_tx.clone();
        tokio::spawn(async move {
            let songs = loader.load(token.as_deref(), &query).await;
            let _ = results_tx.send(TaskResult::SongsLoaded { ticket, songs });
        });
    }

    fn spawn_preview_lookup(&self, ticket: PreviewTicket, title: String, artist: String) {
        let loader = self.services.songs.clone();
        let results_tx = self.results_tx.clone();
        tokio::spawn(async move {
            let preview_url = loader.resolve_preview(&title, &artist).await;
            let _ = results_tx.send(TaskResult::PreviewResolved {
                ticket,
                title,
                preview_url,
            });
        });
    }

    fn spawn_recognition(&self, ticket: RecognitionTicket, upload: AudioUpload) {
        let backend = Arc::clone(&self.services.recognition);
        let results_tx = self.results_tx.clone();
        tokio::spawn(async move {
            let outcome = submit_recording(backend.as_ref(), upload).await;
            let _ = results_tx.send(TaskResult::Recognition { ticket, outcome });
        });
    }
}
