//! Cross-catalog track matching.
//!
//! A chart entry is matched when the catalog returns a candidate whose name
//! is byte-equal to the song title and whose credited artists include the
//! source artist byte-for-byte. No normalization is applied, so remix
//! suffixes ("Strobe (Radio Edit)"), different featured-artist formatting or
//! case differences all produce misses. Those misses are accepted in exchange
//! for never emitting a wrong track.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{CandidateResult, MatchedTrack, SourceTrack};
use crate::sources::CatalogSearch;

/// Candidates requested per search.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;
/// Largest `limit` the Spotify search endpoint accepts.
pub const MAX_SEARCH_LIMIT: usize = 50;

pub struct TrackMatcher<'a> {
    catalog: &'a dyn CatalogSearch,
    search_limit: usize,
}

impl<'a> TrackMatcher<'a> {
    pub fn with_limit(catalog: &'a dyn CatalogSearch, search_limit: usize) -> Self {
        Self {
            catalog,
            search_limit: search_limit.clamp(1, MAX_SEARCH_LIMIT),
        }
    }

    /// Match each source track in order, one search per track.
    ///
    /// Unmatched tracks are dropped. The first failing search aborts the
    /// whole run.
    pub fn match_tracks(&self, tracks: &[SourceTrack]) -> Result<Vec<MatchedTrack>> {
        let mut matched = Vec::with_capacity(tracks.len());

        for track in tracks {
            if let Some(found) = self.match_track(track)? {
                matched.push(found);
            }
        }

        info!(
            total = tracks.len(),
            matched = matched.len(),
            "cross-catalog matching finished"
        );
        Ok(matched)
    }

    pub fn match_track(&self, track: &SourceTrack) -> Result<Option<MatchedTrack>> {
        let candidates = self
            .catalog
            .search(&track.song, self.search_limit)
            .map_err(|source| Error::Search {
                query: track.song.clone(),
                source,
            })?;

        match select_candidate(track, &candidates) {
            Some(candidate) => {
                debug!(
                    rank = track.rank,
                    song = %track.song,
                    artist = %track.artist,
                    catalog_id = %candidate.catalog_id,
                    "matched"
                );
                Ok(Some(MatchedTrack {
                    song: track.song.clone(),
                    artist: track.artist.clone(),
                    catalog_id: candidate.catalog_id.clone(),
                }))
            }
            None => {
                debug!(
                    rank = track.rank,
                    song = %track.song,
                    artist = %track.artist,
                    candidates = candidates.len(),
                    "no match"
                );
                Ok(None)
            }
        }
    }
}

/// First candidate, in provider order, with the exact song name and the
/// source artist among its credits.
///
/// Stopping at the first confirmed candidate also covers duplicate search
/// hits carrying an already accepted name.
pub fn select_candidate<'c>(
    track: &SourceTrack,
    candidates: &'c [CandidateResult],
) -> Option<&'c CandidateResult> {
    candidates.iter().find(|c| {
        c.track_name == track.song && c.artists.iter().any(|a| *a == track.artist)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Canned search results keyed by query. Unknown queries return nothing.
    #[derive(Default)]
    struct FakeCatalog {
        results: HashMap<String, Vec<CandidateResult>>,
        failing: Option<String>,
        calls: RefCell<Vec<(String, usize)>>,
    }

    impl FakeCatalog {
        fn with(mut self, query: &str, candidates: Vec<CandidateResult>) -> Self {
            self.results.insert(query.to_string(), candidates);
            self
        }

        fn failing_on(mut self, query: &str) -> Self {
            self.failing = Some(query.to_string());
            self
        }
    }

    impl CatalogSearch for FakeCatalog {
        fn search(
            &self,
            query: &str,
            limit: usize,
        ) -> std::result::Result<Vec<CandidateResult>, ClientError> {
            self.calls.borrow_mut().push((query.to_string(), limit));
            if self.failing.as_deref() == Some(query) {
                return Err(ClientError::Api {
                    status: 503,
                    message: "Service unavailable".to_string(),
                });
            }
            let mut hits = self.results.get(query).cloned().unwrap_or_default();
            hits.truncate(limit);
            Ok(hits)
        }
    }

    fn candidate(name: &str, artists: &[&str], id: &str) -> CandidateResult {
        CandidateResult {
            track_name: name.to_string(),
            artists: artists.iter().map(|a| a.to_string()).collect(),
            catalog_id: id.to_string(),
        }
    }

    fn matched(song: &str, artist: &str, id: &str) -> MatchedTrack {
        MatchedTrack {
            song: song.to_string(),
            artist: artist.to_string(),
            catalog_id: id.to_string(),
        }
    }

    #[test]
    fn test_exact_match_ignores_radio_edit() {
        let catalog = FakeCatalog::default().with(
            "Strobe",
            vec![
                candidate("Strobe", &["Deadmau5"], "abc123"),
                candidate("Strobe (Radio Edit)", &["Deadmau5"], "xyz999"),
            ],
        );
        let out = TrackMatcher::with_limit(&catalog, DEFAULT_SEARCH_LIMIT)
            .match_tracks(&[SourceTrack::new("Strobe", "Deadmau5", 1)])
            .unwrap();
        assert_eq!(out, vec![matched("Strobe", "Deadmau5", "abc123")]);
    }

    #[test]
    fn test_artist_found_among_credits() {
        let catalog = FakeCatalog::default().with(
            "Opus",
            vec![candidate("Opus", &["Eric Prydz", "Pryda"], "q1")],
        );
        let out = TrackMatcher::with_limit(&catalog, DEFAULT_SEARCH_LIMIT)
            .match_tracks(&[SourceTrack::new("Opus", "Eric Prydz", 1)])
            .unwrap();
        assert_eq!(out, vec![matched("Opus", "Eric Prydz", "q1")]);

        let catalog = FakeCatalog::default().with(
            "Opus",
            vec![candidate("Opus", &["Pryda", "Eric Prydz"], "q1")],
        );
        let out = TrackMatcher::with_limit(&catalog, DEFAULT_SEARCH_LIMIT)
            .match_tracks(&[SourceTrack::new("Opus", "Eric Prydz", 1)])
            .unwrap();
        assert_eq!(out.len(), 1, "artist in second position must match");
    }

    #[test]
    fn test_no_results_is_not_an_error() {
        let catalog = FakeCatalog::default();
        let out = TrackMatcher::with_limit(&catalog, DEFAULT_SEARCH_LIMIT)
            .match_tracks(&[SourceTrack::new("Unknown Track", "Nobody", 1)])
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_name_must_be_byte_equal() {
        let track = SourceTrack::new("Strobe", "Deadmau5", 1);
        for name in ["strobe", "Strobe ", " Strobe", "Strob", "STROBE", "Strobe."] {
            let candidates = vec![candidate(name, &["Deadmau5"], "id")];
            assert!(
                select_candidate(&track, &candidates).is_none(),
                "{name:?} must not match"
            );
        }
    }

    #[test]
    fn test_artist_must_be_byte_equal() {
        let track = SourceTrack::new("Strobe", "Deadmau5", 1);
        let candidates = vec![
            candidate("Strobe", &["deadmau5"], "a"),
            candidate("Strobe", &["Deadmau5 "], "b"),
            candidate("Strobe", &["Deadmau5, Kaskade"], "c"),
            candidate("Strobe", &[], "d"),
        ];
        assert!(select_candidate(&track, &candidates).is_none());
    }

    #[test]
    fn test_song_and_artist_come_from_source() {
        let catalog = FakeCatalog::default().with(
            "Opus",
            vec![candidate("Opus", &["Pryda", "Eric Prydz"], "q1")],
        );
        let out = TrackMatcher::with_limit(&catalog, DEFAULT_SEARCH_LIMIT)
            .match_tracks(&[SourceTrack::new("Opus", "Eric Prydz", 1)])
            .unwrap();
        assert_eq!(out[0].artist, "Eric Prydz");
    }

    #[test]
    fn test_first_confirmed_candidate_wins() {
        let catalog = FakeCatalog::default().with(
            "Losing It",
            vec![
                candidate("Losing It", &["Someone Else"], "wrong-artist"),
                candidate("Losing It", &["FISHER"], "first"),
                candidate("Losing It", &["FISHER"], "duplicate"),
                candidate("Losing It", &["FISHER", "Chris Lake"], "other"),
            ],
        );
        let out = TrackMatcher::with_limit(&catalog, DEFAULT_SEARCH_LIMIT)
            .match_tracks(&[SourceTrack::new("Losing It", "FISHER", 1)])
            .unwrap();
        assert_eq!(out, vec![matched("Losing It", "FISHER", "first")]);
    }

    #[test]
    fn test_order_preserved_and_unmatched_dropped() {
        let catalog = FakeCatalog::default()
            .with("A", vec![candidate("A", &["x"], "id-a")])
            .with("B", vec![candidate("B", &["not y"], "id-b")])
            .with("C", vec![candidate("C", &["z"], "id-c")]);
        let input = vec![
            SourceTrack::new("A", "x", 1),
            SourceTrack::new("B", "y", 2),
            SourceTrack::new("C", "z", 3),
        ];
        let out = TrackMatcher::with_limit(&catalog, DEFAULT_SEARCH_LIMIT)
            .match_tracks(&input)
            .unwrap();
        assert_eq!(out, vec![matched("A", "x", "id-a"), matched("C", "z", "id-c")]);

        let queries: Vec<String> = catalog.calls.borrow().iter().map(|(q, _)| q.clone()).collect();
        assert_eq!(queries, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_same_song_twice_matches_each_entry() {
        let catalog = FakeCatalog::default().with(
            "Intro",
            vec![
                candidate("Intro", &["One"], "id-1"),
                candidate("Intro", &["Two"], "id-2"),
            ],
        );
        let input = vec![SourceTrack::new("Intro", "Two", 1), SourceTrack::new("Intro", "One", 2)];
        let out = TrackMatcher::with_limit(&catalog, DEFAULT_SEARCH_LIMIT)
            .match_tracks(&input)
            .unwrap();
        assert_eq!(out, vec![matched("Intro", "Two", "id-2"), matched("Intro", "One", "id-1")]);
    }

    #[test]
    fn test_search_window_is_bounded() {
        let mut hits: Vec<CandidateResult> = (0..15)
            .map(|i| candidate("Song", &["Other"], &format!("n{i}")))
            .collect();
        hits.push(candidate("Song", &["Artist"], "late"));
        let catalog = FakeCatalog::default().with("Song", hits);

        let out = TrackMatcher::with_limit(&catalog, DEFAULT_SEARCH_LIMIT)
            .match_tracks(&[SourceTrack::new("Song", "Artist", 1)])
            .unwrap();
        assert!(out.is_empty(), "match beyond the window must not be seen");
        assert_eq!(catalog.calls.borrow()[0], ("Song".to_string(), DEFAULT_SEARCH_LIMIT));

        let out = TrackMatcher::with_limit(&catalog, 20)
            .match_tracks(&[SourceTrack::new("Song", "Artist", 1)])
            .unwrap();
        assert_eq!(out, vec![matched("Song", "Artist", "late")]);
    }

    #[test]
    fn test_search_limit_is_clamped() {
        let catalog = FakeCatalog::default();
        let track = SourceTrack::new("Song", "Artist", 1);
        TrackMatcher::with_limit(&catalog, 60).match_track(&track).unwrap();
        TrackMatcher::with_limit(&catalog, 0).match_track(&track).unwrap();
        TrackMatcher::with_limit(&catalog, 50).match_track(&track).unwrap();
        let limits: Vec<usize> = catalog.calls.borrow().iter().map(|(_, l)| *l).collect();
        assert_eq!(limits, vec![MAX_SEARCH_LIMIT, 1, 50]);
    }

    #[test]
    fn test_search_failure_aborts_run() {
        let catalog = FakeCatalog::default()
            .with("A", vec![candidate("A", &["x"], "id-a")])
            .failing_on("B");
        let input = vec![
            SourceTrack::new("A", "x", 1),
            SourceTrack::new("B", "y", 2),
            SourceTrack::new("C", "z", 3),
        ];
        let err = TrackMatcher::with_limit(&catalog, DEFAULT_SEARCH_LIMIT)
            .match_tracks(&input)
            .unwrap_err();
        assert!(matches!(err, Error::Search { ref query, .. } if query == "B"));
        assert_eq!(catalog.calls.borrow().len(), 2, "no search after the failure");
    }

    #[test]
    fn test_matching_is_idempotent() {
        let catalog = FakeCatalog::default()
            .with("Strobe", vec![candidate("Strobe", &["Deadmau5"], "abc123")])
            .with("Opus", vec![candidate("Opus", &["Eric Prydz"], "q1")]);
        let input = vec![
            SourceTrack::new("Strobe", "Deadmau5", 1),
            SourceTrack::new("Missing", "Nobody", 2),
            SourceTrack::new("Opus", "Eric Prydz", 3),
        ];
        let matcher = TrackMatcher::with_limit(&catalog, DEFAULT_SEARCH_LIMIT);
        let first = matcher.match_tracks(&input).unwrap();
        let second = matcher.match_tracks(&input).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let catalog = FakeCatalog::default();
        let out = TrackMatcher::with_limit(&catalog, DEFAULT_SEARCH_LIMIT)
            .match_tracks(&[])
            .unwrap();
        assert!(out.is_empty());
        assert!(catalog.calls.borrow().is_empty());
    }
}
