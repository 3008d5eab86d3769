use thiserror::Error;

/// Failure reported by an external collaborator (Beatport, Spotify).
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("authorization failed: {0}")]
    Auth(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown genre: {0}")]
    UnknownGenre(String),

    #[error("failed to fetch top tracks for genre {genre}")]
    SourceFetch {
        genre: String,
        #[source]
        source: ClientError,
    },

    #[error("catalog search failed for \"{query}\"")]
    Search {
        query: String,
        #[source]
        source: ClientError,
    },

    #[error("failed to resolve the current user")]
    User(#[source] ClientError),

    #[error("failed to create playlist \"{title}\"")]
    PlaylistCreate {
        title: String,
        #[source]
        source: ClientError,
    },

    #[error("failed to add tracks to playlist {playlist_id}")]
    PlaylistAppend {
        playlist_id: String,
        #[source]
        source: ClientError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
