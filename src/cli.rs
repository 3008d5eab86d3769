use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use dialoguer::Input;
use tracing::{info, warn};

use crate::config::{self, Config, SpotifyConfig};
use crate::core::genres;
use crate::core::service::TopTracksService;
use crate::models::MatchedTrack;
use crate::sources::beatport::BeatportClient;
use crate::sources::spotify::SpotifyClient;

#[derive(Parser)]
#[command(
    name = "toptracks",
    about = "Beatport genre top-100 matched against the Spotify catalog"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the supported genres
    Genres,
    /// Show the chart entries of a genre that exist on Spotify
    TopTracks {
        /// Genre key, e.g. deep-house
        genre: String,
        /// Print JSON records instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Create a Spotify playlist with the matched chart entries
    Playlist {
        /// Genre key, e.g. deep-house
        genre: String,
    },
    /// Set Spotify credentials
    Config,
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Genres => cmd_genres(),
        Commands::TopTracks { genre, json } => cmd_top_tracks(&genre, json),
        Commands::Playlist { genre } => cmd_playlist(&genre),
        Commands::Config => cmd_config(),
    }
}

fn cmd_genres() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Key", "Beatport ID", "Title"]);
    for genre in genres::genres() {
        table.add_row(vec![
            Cell::new(genre.key),
            Cell::new(genre.numeric_id),
            Cell::new(genre.title),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn load_configured() -> Result<Config> {
    let cfg = config::load_config();
    if !cfg.spotify.is_configured() {
        bail!("Spotify is not configured. Run 'toptracks config' first.");
    }
    Ok(cfg)
}

fn cmd_top_tracks(genre: &str, json: bool) -> Result<()> {
    // Fail on a bad key before authenticating.
    genres::resolve_genre(genre)?;
    let cfg = load_configured()?;

    let spotify = SpotifyClient::new(&cfg.spotify).context("Spotify authentication failed")?;
    let beatport = BeatportClient::new(cfg.beatport.base_url.as_deref())?;
    let service = TopTracksService::with_catalog(&beatport, &spotify, cfg.matcher.search_limit);

    let tracks = service.top_tracks(genre)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tracks)?);
    } else {
        print_tracks(&tracks);
    }
    Ok(())
}

fn print_tracks(tracks: &[MatchedTrack]) {
    if tracks.is_empty() {
        println!("No chart entries were found on Spotify.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Song", "Artist", "Spotify ID"]);
    for (i, track) in tracks.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&track.song),
            Cell::new(&track.artist),
            Cell::new(&track.catalog_id),
        ]);
    }
    println!("{table}");
    println!("\n{} tracks found on Spotify", tracks.len());
}

fn cmd_playlist(genre: &str) -> Result<()> {
    genres::resolve_genre(genre)?;
    let mut cfg = load_configured()?;

    let spotify = user_session(&mut cfg)?;
    let beatport = BeatportClient::new(cfg.beatport.base_url.as_deref())?;
    let service = TopTracksService::with_catalog(&beatport, &spotify, cfg.matcher.search_limit);

    let playlist = service.create_playlist(&spotify, genre)?;

    println!("Created playlist \"{}\" ({})", playlist.title, playlist.id);
    if let Some(url) = &playlist.url {
        println!("{url}");
    }
    println!("{} tracks added", playlist.track_count);
    Ok(())
}

/// Spotify session allowed to modify playlists.
/// Reuses the cached refresh token and falls back to the browser flow.
fn user_session(cfg: &mut Config) -> Result<SpotifyClient> {
    if let Some(token) = cfg.spotify.refresh_token.clone() {
        match SpotifyClient::from_refresh_token(&cfg.spotify, &token) {
            Ok(client) => {
                remember_refresh_token(cfg, &client);
                return Ok(client);
            }
            Err(e) => warn!(error = %e, "cached Spotify authorization rejected"),
        }
    }

    let client = authorize_interactively(&cfg.spotify)?;
    remember_refresh_token(cfg, &client);
    Ok(client)
}

fn authorize_interactively(spotify: &SpotifyConfig) -> Result<SpotifyClient> {
    let url = SpotifyClient::authorize_url(spotify)?;
    println!("Open this URL and allow access:\n\n  {url}\n");

    let redirected: String = Input::new()
        .with_prompt("URL you were redirected to")
        .interact_text()?;

    let code = SpotifyClient::code_from_redirect(&redirected)?;
    let client = SpotifyClient::from_authorization_code(spotify, &code)
        .context("Spotify authorization failed")?;
    info!("Spotify authorization granted");
    Ok(client)
}

fn remember_refresh_token(cfg: &mut Config, client: &SpotifyClient) {
    let Some(token) = client.refresh_token() else {
        return;
    };
    if cfg.spotify.refresh_token.as_deref() == Some(token) {
        return;
    }
    cfg.spotify.refresh_token = Some(token.to_string());
    if let Err(e) = config::save_config(cfg) {
        warn!(error = %e, "failed to cache Spotify authorization");
    }
}

fn cmd_config() -> Result<()> {
    let mut cfg = config::load_config();

    println!("Spotify API settings");
    println!("(create an app at https://developer.spotify.com/dashboard)\n");

    let client_id: String = Input::new()
        .with_prompt("Client ID")
        .with_initial_text(cfg.spotify.client_id.clone().unwrap_or_default())
        .interact_text()?;

    let client_secret: String = Input::new()
        .with_prompt("Client Secret")
        .with_initial_text(cfg.spotify.client_secret.clone().unwrap_or_default())
        .interact_text()?;

    let redirect_uri: String = Input::new()
        .with_prompt("Redirect URI")
        .with_initial_text(cfg.spotify.redirect_uri().to_string())
        .interact_text()?;

    cfg.spotify = SpotifyConfig {
        client_id: Some(client_id),
        client_secret: Some(client_secret),
        redirect_uri: Some(redirect_uri),
        // New credentials invalidate the cached authorization.
        refresh_token: None,
    };

    config::save_config(&cfg)?;
    println!("\nSettings saved.");
    Ok(())
}
