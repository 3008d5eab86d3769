use serde::{Deserialize, Serialize};

/// One ranked entry of the Beatport top list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTrack {
    pub song: String,
    pub artist: String,
    /// 1-based position in the top list.
    pub rank: usize,
}

impl SourceTrack {
    pub fn new(song: impl Into<String>, artist: impl Into<String>, rank: usize) -> Self {
        Self {
            song: song.into(),
            artist: artist.into(),
            rank,
        }
    }
}

/// One search hit from the streaming catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateResult {
    pub track_name: String,
    pub artists: Vec<String>,
    pub catalog_id: String,
}

/// A source track identified in the streaming catalog.
///
/// On the wire `catalog_id` is written as `track_id`, a one-element array,
/// which is the shape the playlist append call takes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedTrack {
    #[serde(rename = "Song")]
    pub song: String,
    #[serde(rename = "Artist")]
    pub artist: String,
    #[serde(rename = "track_id", with = "single_id")]
    pub catalog_id: String,
}

mod single_id {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(id: &str, serializer: S) -> Result<S::Ok, S::Error> {
        [id].serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let [id] = <[String; 1]>::deserialize(deserializer)?;
        Ok(id)
    }
}

/// Entry of the genre registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Genre {
    /// URL slug on Beatport, e.g. `deep-house`.
    pub key: &'static str,
    pub numeric_id: u32,
    pub title: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPlaylist {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub track_count: usize,
}
