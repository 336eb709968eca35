/// TVMaze API response types for deserialization.
///
/// These structures mirror the JSON response format from the TVMaze API.
/// Everything except the id is optional; absent fields are filled with
/// placeholders when converting to the domain types.
use super::{Episode, Image, PLACEHOLDER, Rating, Show};
use serde::Deserialize;

/// A show from the `/shows` endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct TvMazeShow {
    pub id: u64,
    pub name: Option<String>,
    /// May be absent or null
    pub genres: Option<Vec<String>>,
    /// Show summary in HTML format
    pub summary: Option<String>,
    pub image: Option<TvMazeImage>,
    pub status: Option<String>,
    pub rating: Option<TvMazeRating>,
    pub runtime: Option<u32>,
}

/// A single episode from the `/shows/{id}/episodes` endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct TvMazeEpisode {
    pub id: u64,
    /// Season number (0 for specials)
    pub season: Option<u32>,
    /// Episode number within the season (null for specials)
    pub number: Option<u32>,
    /// Episode title (may be null for episodes without a title)
    pub name: Option<String>,
    /// Episode summary in HTML format (may be null)
    pub summary: Option<String>,
    pub image: Option<TvMazeImage>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TvMazeImage {
    pub medium: Option<String>,
    pub original: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TvMazeRating {
    pub average: Option<f64>,
}

impl From<TvMazeImage> for Image {
    fn from(image: TvMazeImage) -> Self {
        Image {
            medium: image.medium,
            original: image.original,
        }
    }
}

impl From<TvMazeShow> for Show {
    fn from(show: TvMazeShow) -> Self {
        Show {
            id: show.id,
            name: show.name.unwrap_or_else(|| PLACEHOLDER.to_string()),
            genres: show.genres.unwrap_or_default(),
            summary: show.summary,
            image: show.image.map(Image::from),
            status: show.status,
            rating: show.rating.map(|r| Rating { average: r.average }),
            runtime: show.runtime,
        }
    }
}

impl From<TvMazeEpisode> for Episode {
    fn from(episode: TvMazeEpisode) -> Self {
        Episode {
            id: episode.id,
            season: episode.season.unwrap_or_default(),
            number: episode.number.unwrap_or_default(),
            name: episode.name.unwrap_or_else(|| PLACEHOLDER.to_string()),
            summary: episode.summary,
            image: episode.image.map(Image::from),
        }
    }
}
