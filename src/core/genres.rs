use crate::error::{Error, Result};
use crate::models::Genre;

const fn genre(key: &'static str, numeric_id: u32, title: &'static str) -> Genre {
    Genre {
        key,
        numeric_id,
        title,
    }
}

/// Genres with a Beatport top-100 chart.
static GENRES: &[Genre] = &[
    genre("house", 5, "house"),
    genre("deep-house", 12, "deep house"),
    genre("afro-house", 89, "afro house"),
    genre("breaks-breakbeat-uk-bass", 9, "breaks / breakbeat / uk bass"),
    genre("bass-club", 85, "bass / club"),
    genre("bass-house", 91, "bass house"),
    genre("140-deep-dubstep-grime", 95, "140 / deep dubstep / grime"),
    genre("dance-electro-pop", 39, "dance / electro pop"),
    genre("dj-tools", 16, "dj tools"),
    genre("drum-bass", 1, "drum & bass"),
    genre("dubstep", 18, "dubstep"),
    genre(
        "electro-classic-detroit-modern",
        94,
        "electro (classic / detroit / modern)",
    ),
    genre("electronica", 3, "electronica"),
    genre("funky-house", 81, "funky house"),
    genre("hard-dance-hardcore", 8, "hard dance / hardcore"),
    genre("hard-techno", 2, "hard techno"),
    genre("indie-dance", 37, "indie dance"),
    genre("jackin-house", 97, "jackin house"),
    genre("mainstage", 96, "mainstage"),
    genre("melodic-house-techno", 90, "melodic house & techno"),
    genre("minimal-deep-tech", 14, "minimal / deep tech"),
    genre("nu-disco-disco", 50, "nu disco / disco"),
    genre("organic-house-downtempo", 93, "organic house / downtempo"),
    genre("progressive-house", 15, "progressive house"),
    genre("psy-trance", 13, "psy-trance"),
    genre("tech-house", 11, "tech house"),
    genre("techno-peak-time-driving", 6, "techno (peak time / driving)"),
    genre("techno-raw-deep-hypnotic", 92, "techno (raw / deep / hypnotic)"),
    genre("trance", 7, "trance"),
    genre("trap-wave", 38, "trap / wave"),
    genre("uk-garage-bassline", 86, "uk garage / bassline"),
];

pub fn genres() -> &'static [Genre] {
    GENRES
}

/// Look up a genre by its URL key.
pub fn resolve_genre(key: &str) -> Result<&'static Genre> {
    GENRES
        .iter()
        .find(|g| g.key == key)
        .ok_or_else(|| Error::UnknownGenre(key.to_string()))
}
