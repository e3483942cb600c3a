//! echo-journey library
//!
//! Headless driver for the ECHO journey: the stage controller, its
//! delayed transitions, the song list and recognition flows, and the
//! visitor session. A front end sends commands through a
//! [`JourneyHandle`] and renders from [`JourneyEvent`]s and snapshots.
//!
//! [`JourneyEvent`]: echo_common::events::JourneyEvent

pub mod clients;
pub mod controller;
pub mod journey;
pub mod recognition;
pub mod scheduler;
pub mod session;
pub mod song_list;
pub mod stage;

pub use controller::{ControllerSnapshot, ControllerTimings, Effect, StageController, TokenState};
pub use journey::{Journey, JourneyCommand, JourneyError, JourneyHandle, JourneyServices};
pub use session::{Identity, Session, Wall};
pub use stage::{ModalKind, ModalState, SelectionIndex};

use std::sync::Arc;

use crate::clients::{ClientError, ItunesPreviewClient, ProxyClient, SpotifyCatalogClient};
use crate::song_list::SongListLoader;

impl JourneyServices {
    /// Production services: the proxy for tokens and recognition, the
    /// catalog for search, iTunes for missing previews
    pub fn http(proxy_url: &str) -> Result<Self, ClientError> {
        let proxy = Arc::new(ProxyClient::new(proxy_url)?);
        let songs = SongListLoader::new(
            Arc::new(SpotifyCatalogClient::new()?),
            Arc::new(ItunesPreviewClient::new()?),
        );
        Ok(Self {
            tokens: proxy.clone(),
            songs,
            recognition: proxy,
        })
    }
}
