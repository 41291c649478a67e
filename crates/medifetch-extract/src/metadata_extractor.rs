//! Metadata extractor driver (C5): invoke the Extractor in probe mode
//! and parse its JSON output into a [`MediaCandidate`].

use std::process::Stdio;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use medifetch_core::{AppError, MediaCandidate, MediaKind, MetadataExtractor, Provider, Track};

use crate::argv::metadata_probe_args;

/// Small enumerated rewrite table of noisy substrings Extractors
/// commonly leave in titles (e.g. "(Official Video)"). Applied
/// per-provider; matching is case-insensitive.
const NOISY_TITLE_SUBSTRINGS: &[(Provider, &str)] = &[
    (Provider::A, "(Explicit)"),
    (Provider::A, "[Explicit]"),
    (Provider::M, "(Official Video)"),
    (Provider::M, "(Official Audio)"),
    (Provider::M, "(Lyric Video)"),
    (Provider::M, "[Official Music Video]"),
];

fn clean_title(provider: Provider, title: &str) -> String {
    let mut cleaned = title.to_string();
    for (p, noisy) in NOISY_TITLE_SUBSTRINGS {
        if *p != provider {
            continue;
        }
        // Case-insensitive removal without allocating a regex per call.
        if let Some(idx) = cleaned.to_lowercase().find(&noisy.to_lowercase()) {
            cleaned.replace_range(idx..idx + noisy.len(), "");
        }
    }
    cleaned.trim().to_string()
}

/// [`MetadataExtractor`] that drives a real Extractor binary in
/// dump-metadata mode.
pub struct ExtractorMetadataExtractor {
    extractor_bin: String,
}

impl ExtractorMetadataExtractor {
    #[must_use]
    pub fn new(extractor_bin: impl Into<String>) -> Self {
        Self {
            extractor_bin: extractor_bin.into(),
        }
    }
}

#[async_trait]
impl MetadataExtractor for ExtractorMetadataExtractor {
    async fn fetch_metadata(
        &self,
        url: &str,
        provider: Provider,
        kind: MediaKind,
    ) -> Result<MediaCandidate, AppError> {
        let args = metadata_probe_args(url, provider, kind);

        let output = Command::new(&self.extractor_bin)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AppError::internal(format!("extractor_failed: spawn error: {e}")))?;

        if !output.status.success() {
            return Err(AppError::internal(format!(
                "extractor_failed: exit code {:?}",
                output.status.code()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let doc: Value = serde_json::from_str(stdout.trim())
            .map_err(|e| AppError::internal(format!("metadata_parse_failed: {e}")))?;

        Ok(candidate_from_document(&doc, provider, kind))
    }
}

fn str_field(doc: &Value, key: &str) -> Option<String> {
    doc.get(key).and_then(Value::as_str).map(str::to_string)
}

fn int_field(doc: &Value, key: &str) -> Option<i64> {
    doc.get(key).and_then(Value::as_i64)
}

fn candidate_from_document(doc: &Value, provider: Provider, kind: MediaKind) -> MediaCandidate {
    let title = str_field(doc, "title").map(|t| clean_title(provider, &t));
    let artist = str_field(doc, "artist").or_else(|| str_field(doc, "uploader"));
    let album = str_field(doc, "album");
    let album_artist = str_field(doc, "album_artist").or_else(|| artist.clone());
    let year = int_field(doc, "release_year")
        .or_else(|| int_field(doc, "upload_date").map(|d| d / 10_000))
        .map(|y| y as i32);
    let cover_url = str_field(doc, "thumbnail");
    let duration = doc
        .get("duration")
        .and_then(Value::as_f64)
        .map(|d| d.round() as u32);
    let provider_id = str_field(doc, "id").unwrap_or_default();

    let tracks = (kind == MediaKind::Album)
        .then(|| doc.get("entries").and_then(Value::as_array))
        .flatten()
        .map(|entries| {
            entries
                .iter()
                .enumerate()
                .map(|(idx, entry)| Track {
                    track_no: idx as u32 + 1,
                    title: str_field(entry, "title")
                        .map(|t| clean_title(provider, &t))
                        .unwrap_or_default(),
                    duration: entry
                        .get("duration")
                        .and_then(Value::as_f64)
                        .map(|d| d.round() as u32),
                })
                .collect::<Vec<_>>()
        })
        .filter(|t| !t.is_empty());

    MediaCandidate {
        title,
        artist,
        album,
        album_artist,
        year,
        cover_url,
        duration,
        provider_id,
        tracks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clean_title_strips_known_noise_case_insensitively() {
        assert_eq!(
            clean_title(Provider::M, "Song Title (official video)"),
            "Song Title"
        );
        assert_eq!(
            clean_title(Provider::A, "Track Name [Explicit]"),
            "Track Name"
        );
    }

    #[test]
    fn clean_title_leaves_unmatched_titles_alone() {
        assert_eq!(clean_title(Provider::A, "Plain Title"), "Plain Title");
    }

    #[test]
    fn candidate_from_document_extracts_core_fields() {
        let doc = json!({
            "id": "abc123",
            "title": "My Song (Official Video)",
            "artist": "Some Artist",
            "duration": 212.7,
            "thumbnail": "https://example.com/cover.jpg",
        });
        let candidate = candidate_from_document(&doc, Provider::M, MediaKind::Track);
        assert_eq!(candidate.title.as_deref(), Some("My Song"));
        assert_eq!(candidate.artist.as_deref(), Some("Some Artist"));
        assert_eq!(candidate.duration, Some(213));
        assert_eq!(candidate.provider_id, "abc123");
        assert!(candidate.tracks.is_none());
    }

    #[test]
    fn candidate_from_document_derives_track_list_for_albums() {
        let doc = json!({
            "id": "album1",
            "title": "My Album",
            "entries": [
                {"title": "Track One", "duration": 120.0},
                {"title": "Track Two", "duration": 150.0},
            ],
        });
        let candidate = candidate_from_document(&doc, Provider::A, MediaKind::Album);
        let tracks = candidate.tracks.unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].track_no, 1);
        assert_eq!(tracks[1].track_no, 2);
        assert_eq!(tracks[0].title, "Track One");
    }

    #[test]
    fn candidate_from_document_tolerates_missing_fields() {
        let doc = json!({});
        let candidate = candidate_from_document(&doc, Provider::A, MediaKind::Track);
        assert!(candidate.title.is_none());
        assert_eq!(candidate.provider_id, "");
    }
}
