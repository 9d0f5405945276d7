//! [`LayoutGenerator`] backed by an HTTP service speaking the crossword-layout-generator format.

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Layout, LayoutError, LayoutGenerator, Placement, WordClue};
use crate::state::puzzle::Direction;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Client for the layout service at a fixed URL.
#[derive(Clone)]
pub struct HttpLayoutGenerator {
    client: reqwest::Client,
    url: Arc<str>,
}

impl HttpLayoutGenerator {
    /// Build the client; requests time out after 20 seconds.
    pub fn new(url: impl Into<String>) -> Result<Self, LayoutError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| LayoutError::Unavailable(err.to_string()))?;
        Ok(Self {
            client,
            url: Arc::from(url.into()),
        })
    }

    async fn request_layout(&self, words: Vec<WordClue>, size: u32) -> Result<Layout, LayoutError> {
        let entries: Vec<RequestEntry> = words
            .into_iter()
            .map(|word| RequestEntry {
                answer: word.answer,
                clue: word.clue,
            })
            .collect();
        let body = GenerateRequest {
            entries: &entries,
            grid_size: size,
        };

        let response = self
            .client
            .post(self.url.as_ref())
            .json(&body)
            .send()
            .await
            .map_err(|err| LayoutError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(LayoutError::Unavailable(format!(
                "layout service answered {}",
                response.status()
            )));
        }

        let payload = response
            .json::<GenerateResponse>()
            .await
            .map_err(|err| LayoutError::InvalidResponse(err.to_string()))?;
        debug!(
            rows = payload.rows,
            cols = payload.cols,
            words = payload.result.len(),
            "layout service responded"
        );
        into_layout(payload)
    }
}

impl LayoutGenerator for HttpLayoutGenerator {
    fn generate(
        &self,
        words: Vec<WordClue>,
        size: u32,
    ) -> BoxFuture<'static, Result<Layout, LayoutError>> {
        let generator = self.clone();
        Box::pin(async move { generator.request_layout(words, size).await })
    }
}

#[derive(Debug, Serialize)]
struct RequestEntry {
    answer: String,
    clue: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    entries: &'a [RequestEntry],
    grid_size: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    rows: u32,
    cols: u32,
    #[serde(default)]
    result: Vec<PlacedWord>,
}

#[derive(Debug, Deserialize)]
struct PlacedWord {
    clue: String,
    answer: String,
    #[serde(default)]
    startx: u32,
    #[serde(default)]
    starty: u32,
    orientation: String,
}

/// Keep placed words only, converting 1-based `startx`/`starty` into 0-based row/col.
fn into_layout(response: GenerateResponse) -> Result<Layout, LayoutError> {
    let mut placements = Vec::with_capacity(response.result.len());
    for word in response.result {
        let direction = match word.orientation.as_str() {
            "none" => continue,
            "across" => Direction::Across,
            "down" => Direction::Down,
            other => {
                return Err(LayoutError::InvalidResponse(format!(
                    "unknown orientation `{other}` for `{}`",
                    word.answer
                )));
            }
        };
        if word.startx == 0 || word.starty == 0 {
            return Err(LayoutError::InvalidResponse(format!(
                "missing start position for `{}`",
                word.answer
            )));
        }
        placements.push(Placement {
            answer: word.answer.to_uppercase(),
            clue: word.clue,
            row: word.starty - 1,
            col: word.startx - 1,
            direction,
        });
    }

    if placements.is_empty() {
        return Err(LayoutError::NoLayout);
    }

    Ok(Layout {
        rows: response.rows,
        cols: response.cols,
        placements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GenerateResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn placements_are_converted_to_zero_based_and_unplaced_words_dropped() {
        let response = parse(
            r#"{
                "rows": 3, "cols": 3,
                "result": [
                    {"clue": "pet", "answer": "cat", "startx": 1, "starty": 1, "orientation": "across", "position": 1},
                    {"clue": "vehicle", "answer": "car", "startx": 1, "starty": 1, "orientation": "down", "position": 1},
                    {"clue": "bird", "answer": "emu", "orientation": "none"}
                ]
            }"#,
        );
        let layout = into_layout(response).unwrap();
        assert_eq!((layout.rows, layout.cols), (3, 3));
        assert_eq!(layout.placements.len(), 2);
        assert_eq!(layout.placements[0].answer, "CAT");
        assert_eq!((layout.placements[0].row, layout.placements[0].col), (0, 0));
        assert_eq!(layout.placements[1].direction, Direction::Down);
    }

    #[test]
    fn nothing_placed_is_a_failure() {
        let response = parse(
            r#"{"rows": 0, "cols": 0, "result": [
                {"clue": "bird", "answer": "emu", "orientation": "none"}
            ]}"#,
        );
        assert!(matches!(into_layout(response), Err(LayoutError::NoLayout)));
    }

    #[test]
    fn unknown_orientation_is_rejected() {
        let response = parse(
            r#"{"rows": 1, "cols": 3, "result": [
                {"clue": "pet", "answer": "cat", "startx": 1, "starty": 1, "orientation": "diagonal"}
            ]}"#,
        );
        assert!(matches!(
            into_layout(response),
            Err(LayoutError::InvalidResponse(_))
        ));
    }

    #[test]
    fn request_uses_camel_case_grid_size() {
        let entries = vec![RequestEntry {
            answer: "CAT".into(),
            clue: "pet".into(),
        }];
        let body = serde_json::to_value(GenerateRequest {
            entries: &entries,
            grid_size: 15,
        })
        .unwrap();
        assert_eq!(body["gridSize"], 15);
        assert_eq!(body["entries"][0]["answer"], "CAT");
    }
}
