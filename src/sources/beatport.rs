use scraper::{Html, Selector};
use tracing::debug;

use crate::error::ClientError;
use crate::models::{Genre, SourceTrack};
use crate::sources::TopTracksSource;

pub const DEFAULT_BASE_URL: &str = "https://www.beatport.com";
pub const TOP_LIST_SIZE: usize = 100;

/// Beatport chart scraper.
/// Reads the top-100 page of a genre without authentication.
pub struct BeatportClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl BeatportClient {
    pub fn new(base_url: Option<&str>) -> Result<Self, ClientError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        })
    }

    pub fn chart_url(&self, genre: &Genre) -> String {
        format!(
            "{}/genre/{}/{}/top-100",
            self.base_url, genre.key, genre.numeric_id
        )
    }
}

impl TopTracksSource for BeatportClient {
    fn fetch_top_tracks(&self, genre: &Genre) -> Result<Vec<SourceTrack>, ClientError> {
        let url = self.chart_url(genre);
        debug!(%url, "fetching Beatport chart");

        let resp = self.client.get(&url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: format!("GET {url}"),
            });
        }

        parse_top_tracks(&resp.text()?)
    }
}

/// Extract the ranked chart from a Beatport genre page.
///
/// Each chart row is a `.bucket-item.ec-item.track` element carrying the
/// song in `data-ec-name` and the artist in `data-ec-d1`. Rows where either
/// attribute is missing or blank are skipped; ranks count the rows that were
/// kept.
pub fn parse_top_tracks(html: &str) -> Result<Vec<SourceTrack>, ClientError> {
    let document = Html::parse_document(html);
    let row_sel = Selector::parse(".bucket-item.ec-item.track")
        .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

    let tracks: Vec<SourceTrack> = document
        .select(&row_sel)
        .filter_map(|row| {
            let el = row.value();
            let song = el.attr("data-ec-name").filter(|s| !s.trim().is_empty())?;
            let artist = el.attr("data-ec-d1").filter(|s| !s.trim().is_empty())?;
            Some((song, artist))
        })
        .take(TOP_LIST_SIZE)
        .enumerate()
        .map(|(i, (song, artist))| SourceTrack::new(song, artist, i + 1))
        .collect();

    if tracks.is_empty() {
        return Err(ClientError::InvalidResponse(
            "no chart rows found on Beatport page".to_string(),
        ));
    }

    Ok(tracks)
}
