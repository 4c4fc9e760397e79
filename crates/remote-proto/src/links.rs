//! Video ids from user-pasted links.

use reqwest::Url;

/// Extract a video id from a YouTube / YouTube Music watch URL, a `youtu.be`
/// short link, or a bare 11-character id.
pub fn parse_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    if let Ok(url) = Url::parse(input) {
        let host = url.host_str().unwrap_or("");
        if host.contains("youtube.com") {
            return url
                .query_pairs()
                .find(|(k, _)| *k == "v")
                .map(|(_, v)| v.into_owned())
                .filter(|v| !v.is_empty());
        }
        if host == "youtu.be" {
            return url
                .path_segments()
                .and_then(|mut segments| segments.next())
                .filter(|s| !s.is_empty())
                .map(str::to_string);
        }
    }

    is_bare_video_id(input).then(|| input.to_string())
}

fn is_bare_video_id(s: &str) -> bool {
    s.len() == 11
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}
