//! Third-party API clients used by the proxy

pub mod playlist;
pub mod recognition;
pub mod spotify_auth;

pub use playlist::{PlaylistSource, PlaylistTrack, SpotifyPlaylistClient};
pub use recognition::{AudioClip, AuddClient, Recognition, Recognizer};
pub use spotify_auth::{ClientCredentials, IssuedToken, SpotifyAuthClient, TokenSource};
