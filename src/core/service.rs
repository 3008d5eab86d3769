use tracing::info;

use crate::core::genres::resolve_genre;
use crate::core::matcher::TrackMatcher;
use crate::error::{Error, Result};
use crate::models::{CreatedPlaylist, Genre, MatchedTrack};
use crate::sources::{CatalogSearch, PlaylistService, TopTracksSource};

// The trailing space is part of the name existing playlists were created with.
const PLAYLIST_SUFFIX: &str = " TOP TRACKS ";

/// Wires the chart source and the catalog together for one genre request.
pub struct TopTracksService<'a> {
    source: &'a dyn TopTracksSource,
    matcher: TrackMatcher<'a>,
}

impl<'a> TopTracksService<'a> {
    pub fn new(source: &'a dyn TopTracksSource, matcher: TrackMatcher<'a>) -> Self {
        Self { source, matcher }
    }

    pub fn with_catalog(
        source: &'a dyn TopTracksSource,
        catalog: &'a dyn CatalogSearch,
        search_limit: usize,
    ) -> Self {
        Self::new(source, TrackMatcher::with_limit(catalog, search_limit))
    }

    /// Chart entries for `genre_key` that exist in the catalog, in chart order.
    pub fn top_tracks(&self, genre_key: &str) -> Result<Vec<MatchedTrack>> {
        let genre = resolve_genre(genre_key)?;
        self.top_tracks_for(genre)
    }

    fn top_tracks_for(&self, genre: &Genre) -> Result<Vec<MatchedTrack>> {
        info!(genre = genre.key, "finding top tracks in catalog");
        let chart = self
            .source
            .fetch_top_tracks(genre)
            .map_err(|source| Error::SourceFetch {
                genre: genre.key.to_string(),
                source,
            })?;
        info!(genre = genre.key, entries = chart.len(), "chart fetched");

        self.matcher.match_tracks(&chart)
    }

    /// Creates a playlist named after the genre and fills it with the
    /// matched tracks.
    ///
    /// The playlist is created before the chart is fetched, so a failed
    /// fetch or search leaves an empty playlist behind.
    pub fn create_playlist(
        &self,
        playlists: &dyn PlaylistService,
        genre_key: &str,
    ) -> Result<CreatedPlaylist> {
        let genre = resolve_genre(genre_key)?;
        let title = playlist_title(genre);

        info!(%title, "creating playlist");
        let owner = playlists.current_user_id().map_err(Error::User)?;
        let (playlist_id, url) =
            playlists
                .create_playlist(&owner, &title)
                .map_err(|source| Error::PlaylistCreate {
                    title: title.clone(),
                    source,
                })?;

        let tracks = self.top_tracks_for(genre)?;
        let ids: Vec<String> = tracks.into_iter().map(|t| t.catalog_id).collect();
        if !ids.is_empty() {
            playlists
                .append_items(&playlist_id, &ids)
                .map_err(|source| Error::PlaylistAppend {
                    playlist_id: playlist_id.clone(),
                    source,
                })?;
        }
        info!(%playlist_id, tracks = ids.len(), "playlist populated");

        Ok(CreatedPlaylist {
            id: playlist_id,
            title,
            url,
            track_count: ids.len(),
        })
    }
}

pub fn playlist_title(genre: &Genre) -> String {
    format!("{}{}", genre.title.to_uppercase(), PLAYLIST_SUFFIX)
}
