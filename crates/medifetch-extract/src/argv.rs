//! Argv construction for the Extractor subprocess.

use medifetch_core::{MediaKind, Provider};

/// Build the argv for a metadata-probe invocation: dump a single JSON
/// document describing `url` without downloading anything.
#[must_use]
pub fn metadata_probe_args(url: &str, provider: Provider, kind: MediaKind) -> Vec<String> {
    let mut args = vec![
        "--dump-single-json".to_string(),
        "--no-playlist".to_string(),
        "--skip-download".to_string(),
    ];

    // Album/playlist pages need the flattened entry list expanded so the
    // track list can be derived positionally; track pages never have one.
    if matches!(kind, MediaKind::Album) {
        args.push("--yes-playlist".to_string());
        args.push("--flat-playlist".to_string());
    }

    if matches!(provider, Provider::M) {
        args.push("--extractor-args".to_string());
        args.push("youtube:player_client=web".to_string());
    }

    args.push(url.to_string());
    args
}

/// Build the argv for a fetch invocation: extract audio, embed metadata
/// and thumbnail, write under `output_dir`.
#[must_use]
pub fn download_args(url: &str, provider: Provider, output_dir: &str) -> Vec<String> {
    let mut args = vec![
        "-x".to_string(),
        "--audio-format".to_string(),
        "mp3".to_string(),
        "--audio-quality".to_string(),
        "0".to_string(),
        "--embed-thumbnail".to_string(),
        "--embed-metadata".to_string(),
        "--newline".to_string(),
        "-o".to_string(),
        format!("{output_dir}/%(artist)s - %(title)s.%(ext)s"),
    ];

    if matches!(provider, Provider::M) {
        args.push("--extractor-args".to_string());
        args.push("youtube:player_client=web".to_string());
    }

    args.push(url.to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_probe_args_expand_playlist_for_albums() {
        let args = metadata_probe_args("https://hosta.tld/album/x", Provider::A, MediaKind::Album);
        assert!(args.contains(&"--flat-playlist".to_string()));
    }

    #[test]
    fn metadata_probe_args_skip_playlist_for_tracks() {
        let args = metadata_probe_args("https://hosta.tld/track/x", Provider::A, MediaKind::Track);
        assert!(!args.contains(&"--flat-playlist".to_string()));
    }

    #[test]
    fn download_args_places_output_under_dir() {
        let args = download_args("https://hosta.tld/track/x", Provider::A, "/tmp/out");
        let template = args.iter().find(|a| a.starts_with("/tmp/out")).unwrap();
        assert!(template.starts_with("/tmp/out/"));
    }
}
