//! Shared data models
//!
//! Songs come from the catalog search and are never persisted. Payloads are
//! the user's modal choice; each variant carries only the fields its modal
//! collects.

use serde::{Deserialize, Serialize};

/// One discrete screen of the journey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Stage {
    /// Login or continue as guest
    #[default]
    Welcome = 1,
    /// Short intro shown before the menu
    Intro = 2,
    /// Five-item selection wheel
    Menu = 3,
    /// A configuration modal is open
    Configure = 4,
    SongList = 5,
    MessageWall = 6,
    RecognitionResult = 7,
}

impl Stage {
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Stage::Welcome),
            2 => Some(Stage::Intro),
            3 => Some(Stage::Menu),
            4 => Some(Stage::Configure),
            5 => Some(Stage::SongList),
            6 => Some(Stage::MessageWall),
            7 => Some(Stage::RecognitionResult),
            _ => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Welcome => "Welcome",
            Stage::Intro => "Intro",
            Stage::Menu => "Menu",
            Stage::Configure => "Configure",
            Stage::SongList => "SongList",
            Stage::MessageWall => "MessageWall",
            Stage::RecognitionResult => "RecognitionResult",
        };
        write!(f, "{} ({})", name, self.number())
    }
}

/// Chart region offered by the chart modal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Region {
    #[default]
    Global,
    Mandarin,
    English,
}

impl Region {
    /// Parse a region name; anything unrecognised falls back to `Global`
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "mandarin" => Region::Mandarin,
            "english" => Region::English,
            _ => Region::Global,
        }
    }
}

/// Moods offered by the mood modal
pub const MOOD_OPTIONS: [&str; 4] = ["COOL", "HAPPY", "RELAX", "SAD"];

/// Song metadata returned by the recognition endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecognizedSong {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub lyrics: Option<String>,
    pub cover: Option<String>,
    pub song_link: Option<String>,
}

impl RecognizedSong {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Unknown Title")
    }

    pub fn display_artist(&self) -> &str {
        self.artist.as_deref().unwrap_or("Unknown Artist")
    }

    pub fn display_lyrics(&self) -> &str {
        self.lyrics
            .as_deref()
            .unwrap_or("Lyrics not available for this track.")
    }
}

/// The user's modal submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Payload {
    Playlist { region: Region },
    Mood { mood: String },
    Weather { weather: String },
    Recognized {
        song: RecognizedSong,
        file_name: Option<String>,
    },
}

/// Popularity bucket used to colour a song's heat bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heat {
    Cool,
    Warm,
    Hot,
}

/// A catalog track after mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    /// All credited artists joined with ", "
    pub artist: String,
    pub cover_url: Option<String>,
    pub preview_url: Option<String>,
    /// 0-100
    pub popularity: u8,
}

impl Song {
    /// Deduplication key: title and artist
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.title, &self.artist)
    }

    pub fn heat(&self) -> Heat {
        match self.popularity {
            p if p > 80 => Heat::Hot,
            p if p > 50 => Heat::Warm,
            _ => Heat::Cool,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(popularity: u8) -> Song {
        Song {
            id: "id".to_string(),
            title: "t".to_string(),
            artist: "a".to_string(),
            cover_url: None,
            preview_url: None,
            popularity,
        }
    }

    #[test]
    fn test_stage_numbers_round_trip() {
        for n in 1..=7 {
            assert_eq!(Stage::from_number(n).map(Stage::number), Some(n));
        }
        assert_eq!(Stage::from_number(0), None);
        assert_eq!(Stage::from_number(8), None);
        assert_eq!(Stage::default(), Stage::Welcome);
    }

    #[test]
    fn test_region_parse_falls_back_to_global() {
        assert_eq!(Region::parse("Mandarin"), Region::Mandarin);
        assert_eq!(Region::parse("english"), Region::English);
        assert_eq!(Region::parse("Klingon"), Region::Global);
        assert_eq!(Region::parse(""), Region::Global);
    }

    #[test]
    fn test_heat_buckets() {
        assert_eq!(song(81).heat(), Heat::Hot);
        assert_eq!(song(80).heat(), Heat::Warm);
        assert_eq!(song(51).heat(), Heat::Warm);
        assert_eq!(song(50).heat(), Heat::Cool);
    }

    #[test]
    fn test_payload_wire_format_is_tagged() {
        let payload = Payload::Weather {
            weather: "Clear".to_string(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "Weather");
        assert_eq!(json["weather"], "Clear");
    }

    #[test]
    fn test_recognized_song_display_fallbacks() {
        let song = RecognizedSong::default();
        assert_eq!(song.display_title(), "Unknown Title");
        assert_eq!(song.display_artist(), "Unknown Artist");
        assert_eq!(song.display_lyrics(), "Lyrics not available for this track.");
    }
}
