//! Fallback for payloads that carry plain track objects instead of
//! renderers.

use serde_json::{Map, Value};

use super::{is_truthy, CanonicalTrack};

const MAX_SEARCH_DEPTH: usize = 8;

/// Keys that conventionally hold a track list, probed before anything else.
static CONTAINER_KEYS: [&str; 7] = [
    "items", "queue", "tracks", "results", "content", "contents", "songs",
];

fn looks_like_track(value: &Value) -> bool {
    value.as_object().is_some_and(|obj| {
        ["videoId", "title", "name"]
            .iter()
            .any(|k| obj.get(*k).is_some_and(is_truthy))
    })
}

/// Find the first array whose first element looks like a track.
///
/// Conventional container keys are searched before other keys; the first
/// candidate found is returned without backtracking.
pub fn locate_track_array(value: &Value, depth: usize) -> Option<&Vec<Value>> {
    if depth > MAX_SEARCH_DEPTH {
        return None;
    }
    match value {
        Value::Array(items) => {
            if items.first().is_some_and(looks_like_track) {
                return Some(items);
            }
            items
                .iter()
                .filter(|item| item.is_object() || item.is_array())
                .find_map(|item| locate_track_array(item, depth + 1))
        }
        Value::Object(obj) => {
            let preferred = CONTAINER_KEYS
                .iter()
                .filter_map(|key| obj.get(*key))
                .filter(|v| is_truthy(v));
            let rest = obj
                .iter()
                .filter(|(key, _)| !CONTAINER_KEYS.contains(&key.as_str()))
                .map(|(_, v)| v)
                .filter(|v| v.is_object() || v.is_array());
            preferred
                .chain(rest)
                .find_map(|v| locate_track_array(v, depth + 1))
        }
        _ => None,
    }
}

fn first_str<'v>(obj: &'v Map<String, Value>, keys: &[&str]) -> Option<&'v str> {
    keys.iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str).filter(|s| !s.is_empty()))
}

fn name_or_string(value: &Value) -> &str {
    match value {
        Value::String(s) => s.as_str(),
        other => other.get("name").and_then(Value::as_str).unwrap_or(""),
    }
}

fn simple_identifier(obj: &Map<String, Value>) -> Option<String> {
    ["videoId", "id"].iter().find_map(|k| match obj.get(*k) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Map one loosely-shaped track object, accepting the usual alternate key
/// spellings. `None` when the object has no id.
pub fn normalize_simple_track(item: &Value) -> Option<CanonicalTrack> {
    let obj = item.as_object()?;
    let identifier = simple_identifier(obj)?;

    let artist = match first_str(obj, &["artist", "author"]) {
        Some(a) => a.to_string(),
        None => obj
            .get("artists")
            .and_then(Value::as_array)
            .map(|artists| {
                artists
                    .iter()
                    .map(name_or_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default(),
    };

    let thumbnail_url = match first_str(obj, &["thumbnail", "imageSrc", "thumbnailUrl"]) {
        Some(t) => t.to_string(),
        None => obj
            .get("thumbnails")
            .and_then(Value::as_array)
            .and_then(|t| t.first())
            .map(|t| match t {
                Value::String(s) => s.as_str(),
                other => other.get("url").and_then(Value::as_str).unwrap_or(""),
            })
            .unwrap_or("")
            .to_string(),
    };

    Some(CanonicalTrack {
        title: first_str(obj, &["title", "name"]).unwrap_or("").to_string(),
        artist,
        thumbnail_url,
        identifier,
        is_selected: obj.get("selected").is_some_and(is_truthy),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prefers_container_keys() {
        let payload = json!({
            "meta": [{ "title": "not this" }],
            "tracks": [{ "videoId": "t1" }]
        });
        let found = locate_track_array(&payload, 0).unwrap();
        assert_eq!(found[0]["videoId"], "t1");
    }

    #[test]
    fn test_scans_other_keys_in_order() {
        let payload = json!({
            "header": { "label": "x" },
            "body": { "list": [{ "name": "first" }] },
            "footer": [{ "name": "second" }]
        });
        let found = locate_track_array(&payload, 0).unwrap();
        assert_eq!(found[0]["name"], "first");
    }

    #[test]
    fn test_recurses_through_arrays() {
        let payload = json!([[{ "x": 1 }], [[{ "videoId": "deep" }]]]);
        let found = locate_track_array(&payload, 0).unwrap();
        assert_eq!(found[0]["videoId"], "deep");
    }

    #[test]
    fn test_depth_limit() {
        let mut payload = json!([{ "videoId": "v" }]);
        for _ in 0..9 {
            payload = json!({ "wrap": payload });
        }
        assert!(locate_track_array(&payload, 0).is_none());

        let mut payload = json!([{ "videoId": "v" }]);
        for _ in 0..8 {
            payload = json!({ "wrap": payload });
        }
        assert!(locate_track_array(&payload, 0).is_some());
    }

    #[test]
    fn test_normalize_alternate_keys() {
        let track = normalize_simple_track(&json!({
            "id": 42,
            "name": "Named",
            "author": "Writer",
            "imageSrc": "https://img/a.jpg",
            "selected": 1
        }))
        .unwrap();
        assert_eq!(track.identifier, "42");
        assert_eq!(track.title, "Named");
        assert_eq!(track.artist, "Writer");
        assert_eq!(track.thumbnail_url, "https://img/a.jpg");
        assert!(track.is_selected);
    }

    #[test]
    fn test_normalize_artist_list_and_thumbnail_list() {
        let track = normalize_simple_track(&json!({
            "videoId": "v1",
            "title": "Duet",
            "artists": [{ "name": "One" }, "Two", { "id": "x" }],
            "thumbnails": [{ "url": "https://img/t.jpg" }]
        }))
        .unwrap();
        assert_eq!(track.artist, "One, Two, ");
        assert_eq!(track.thumbnail_url, "https://img/t.jpg");

        let track = normalize_simple_track(&json!({ "videoId": "v2", "thumbnails": ["https://img/s.jpg"] })).unwrap();
        assert_eq!(track.thumbnail_url, "https://img/s.jpg");
    }

    #[test]
    fn test_normalize_requires_identifier() {
        assert!(normalize_simple_track(&json!({ "title": "No id" })).is_none());
        assert!(normalize_simple_track(&json!("string")).is_none());
    }
}
