use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub id: String,
    pub title: String,
    #[serde(rename = "thumbnail", default)]
    pub thumbnail_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(rename = "duration", default, skip_serializing_if = "Option::is_none")]
    pub duration_hint: Option<f64>,
}

impl Track {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            thumbnail_url: String::new(),
            artist: None,
            album: None,
            duration_hint: None,
        }
    }

    pub fn display_artist(&self) -> &str {
        self.artist.as_deref().unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
}

impl Playlist {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            tracks: Vec::new(),
            cover_image: None,
        }
    }

    pub fn contains(&self, track_id: &str) -> bool {
        self.tracks.iter().any(|t| t.id == track_id)
    }

    /// Explicit cover, else the first track's thumbnail.
    pub fn cover(&self) -> Option<&str> {
        self.cover_image.as_deref().or_else(|| {
            self.tracks
                .first()
                .map(|t| t.thumbnail_url.as_str())
                .filter(|s| !s.is_empty())
        })
    }
}

/// States the embedded player reports through `stateChanged`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Paused,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportState {
    pub is_playing: bool,
    pub current_time: f64,
    pub duration: f64,
    pub volume: u8,
}

impl Default for TransportState {
    fn default() -> Self {
        Self {
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume: 100,
        }
    }
}

impl TransportState {
    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub show_video: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ArtistDetails {
    #[serde(default)]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub artist_image: Option<String>,
    #[serde(default)]
    pub view_count: Option<u64>,
}

/// Renders seconds as `m:ss`.
pub fn format_clock(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::{format_clock, Playlist, Track};

    #[test]
    fn clock_formats_minutes_and_padded_seconds() {
        assert_eq!(format_clock(0.0), "0:00");
        assert_eq!(format_clock(65.9), "1:05");
        assert_eq!(format_clock(600.0), "10:00");
        assert_eq!(format_clock(f64::NAN), "0:00");
        assert_eq!(format_clock(-3.0), "0:00");
    }

    #[test]
    fn cover_falls_back_to_first_thumbnail() {
        let mut playlist = Playlist::new(1, "Mix");
        assert_eq!(playlist.cover(), None);

        let mut track = Track::new("a", "A");
        track.thumbnail_url = "https://img/a.jpg".to_string();
        playlist.tracks.push(track);
        assert_eq!(playlist.cover(), Some("https://img/a.jpg"));

        playlist.cover_image = Some("data:image/png;base64,xx".to_string());
        assert_eq!(playlist.cover(), Some("data:image/png;base64,xx"));
    }

    #[test]
    fn playlist_reads_stored_json_shape() {
        let raw = r#"[{"id":1718000000000,"name":"Road","tracks":[{"id":"x1","title":"One","thumbnail":"t.jpg"}],"coverImage":null}]"#;
        let parsed: Vec<Playlist> = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed[0].id, 1_718_000_000_000);
        assert_eq!(parsed[0].tracks[0].thumbnail_url, "t.jpg");
        assert!(parsed[0].cover_image.is_none());
    }
}
