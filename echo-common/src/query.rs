//! Search query building
//!
//! Maps a payload to the catalog search string. Total over every variant,
//! no side effects.

use crate::models::{Payload, Region};

/// Query used when nothing more specific applies
pub const DEFAULT_QUERY: &str = "Top 50 Global";

/// Build the catalog search query for a payload
pub fn build_search_query(payload: Option<&Payload>) -> String {
    match payload {
        None => DEFAULT_QUERY.to_string(),
        Some(Payload::Playlist { region }) => region_query(*region).to_string(),
        Some(Payload::Mood { mood }) => format!("{} vibes", mood),
        Some(Payload::Weather { weather }) => format!("{} chill songs", weather),
        // Recognition results never drive a search
        Some(Payload::Recognized { .. }) => DEFAULT_QUERY.to_string(),
    }
}

fn region_query(region: Region) -> &'static str {
    match region {
        Region::Global => DEFAULT_QUERY,
        Region::Mandarin => "Mandarin Hits",
        Region::English => "Global Top Chart",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecognizedSong, MOOD_OPTIONS};

    #[test]
    fn test_missing_payload_uses_default() {
        assert_eq!(build_search_query(None), "Top 50 Global");
    }

    #[test]
    fn test_playlist_regions() {
        let query = |region| build_search_query(Some(&Payload::Playlist { region }));
        assert_eq!(query(Region::Global), "Top 50 Global");
        assert_eq!(query(Region::Mandarin), "Mandarin Hits");
        assert_eq!(query(Region::English), "Global Top Chart");
    }

    #[test]
    fn test_unknown_region_name_maps_to_global_chart() {
        let payload = Payload::Playlist {
            region: Region::parse("Atlantis"),
        };
        assert_eq!(build_search_query(Some(&payload)), "Top 50 Global");
    }

    #[test]
    fn test_mood() {
        for mood in MOOD_OPTIONS {
            let payload = Payload::Mood {
                mood: mood.to_string(),
            };
            assert_eq!(build_search_query(Some(&payload)), format!("{} vibes", mood));
        }
        let payload = Payload::Mood {
            mood: "Jazz".to_string(),
        };
        assert_eq!(build_search_query(Some(&payload)), "Jazz vibes");
    }

    #[test]
    fn test_weather_clear() {
        let payload = Payload::Weather {
            weather: "Clear".to_string(),
        };
        assert_eq!(build_search_query(Some(&payload)), "Clear chill songs");
    }

    #[test]
    fn test_recognition_payload_uses_default() {
        let payload = Payload::Recognized {
            song: RecognizedSong::default(),
            file_name: None,
        };
        assert_eq!(build_search_query(Some(&payload)), DEFAULT_QUERY);
    }
}
