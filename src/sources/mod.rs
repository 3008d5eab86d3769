pub mod beatport;
pub mod spotify;

use crate::error::ClientError;
use crate::models::{CandidateResult, Genre, SourceTrack};

/// Search capability of the streaming catalog.
pub trait CatalogSearch {
    /// Returns at most `limit` candidates in the provider's relevance order.
    fn search(&self, query: &str, limit: usize) -> Result<Vec<CandidateResult>, ClientError>;
}

/// Ranked chart of the source catalog.
pub trait TopTracksSource {
    /// Fetches the chart for a genre. Ranks are 1-based positions.
    fn fetch_top_tracks(&self, genre: &Genre) -> Result<Vec<SourceTrack>, ClientError>;
}

/// Playlist writes on the streaming catalog.
pub trait PlaylistService {
    fn current_user_id(&self) -> Result<String, ClientError>;
    /// Creates a public playlist and returns its id and public URL.
    fn create_playlist(
        &self,
        owner_id: &str,
        title: &str,
    ) -> Result<(String, Option<String>), ClientError>;
    /// Appends track ids in the given order.
    fn append_items(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), ClientError>;
}
