//! Turns a completed job's clip references into things the view can render.

use serde::Serialize;
use url::{ParseError, Url};

use crate::models::ClipReference;

const DEFAULT_EXTENSION: &str = "mp4";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClipDescriptor {
    /// 1-based position in the job's clip list.
    pub index: usize,
    pub source: ClipReference,
    pub filename: String,
}

impl ClipDescriptor {
    /// Link target for the clip. Server-relative references are resolved
    /// against the backend's base URL; anything that does not end up as an
    /// http(s) link yields `None`.
    pub fn href(&self, backend: &Url) -> Option<String> {
        let (url, absolute) = match Url::parse(&self.source) {
            Ok(url) => (url, true),
            Err(ParseError::RelativeUrlWithoutBase) => (backend.join(&self.source).ok()?, false),
            Err(_) => return None,
        };
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        Some(if absolute {
            self.source.clone()
        } else {
            url.into()
        })
    }
}

pub fn present(clips: &[ClipReference]) -> Vec<ClipDescriptor> {
    clips
        .iter()
        .enumerate()
        .map(|(i, source)| {
            let index = i + 1;
            ClipDescriptor {
                index,
                source: source.clone(),
                filename: format!("clip-{}.{}", index, extension_of(source)),
            }
        })
        .collect()
}

/// Extension of the last path segment, ignoring query and fragment.
fn extension_of(reference: &str) -> String {
    let path = reference
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let segment = path.rsplit('/').next().unwrap_or_default();

    match segment.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && (1..=5).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_indexes_from_one() {
        let clips = vec![
            "https://cdn/1.mp4".to_string(),
            "https://cdn/2.mp4".to_string(),
        ];
        let rendered = present(&clips);

        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[0].index, 1);
        assert_eq!(rendered[0].filename, "clip-1.mp4");
        assert_eq!(rendered[0].source, "https://cdn/1.mp4");
        assert_eq!(rendered[1].index, 2);
        assert_eq!(rendered[1].filename, "clip-2.mp4");
    }

    #[test]
    fn test_present_empty() {
        assert!(present(&[]).is_empty());
    }

    #[test]
    fn test_extension_detection() {
        assert_eq!(extension_of("https://cdn/a/b/clip_3.WEBM?sig=x.y"), "webm");
        assert_eq!(extension_of("/clips/job/clip.mov#t=10"), "mov");
        assert_eq!(extension_of("https://cdn/stream"), "mp4");
        assert_eq!(extension_of("https://cdn.example.com/"), "mp4");
        assert_eq!(extension_of("https://cdn/.hidden"), "mp4");
        assert_eq!(extension_of("https://cdn/clip.not-an-ext"), "mp4");
    }

    #[test]
    fn test_href_resolves_relative_references() {
        let backend = Url::parse("http://localhost:8000/").unwrap();
        let clips = present(&[
            "/clips/j1/clip_1.mp4".to_string(),
            "https://bucket.s3.amazonaws.com/clip_2.mp4".to_string(),
        ]);

        assert_eq!(
            clips[0].href(&backend).as_deref(),
            Some("http://localhost:8000/clips/j1/clip_1.mp4")
        );
        assert_eq!(
            clips[1].href(&backend).as_deref(),
            Some("https://bucket.s3.amazonaws.com/clip_2.mp4")
        );
    }

    #[test]
    fn test_href_drops_non_http_schemes() {
        let backend = Url::parse("http://localhost:8000/").unwrap();
        let clips = present(&[
            "javascript:alert(1)".to_string(),
            "data:video/mp4;base64,AAAA".to_string(),
            "file:///etc/passwd".to_string(),
            "clips/j1/clip_4.mp4".to_string(),
        ]);

        assert_eq!(clips[0].href(&backend), None);
        assert_eq!(clips[1].href(&backend), None);
        assert_eq!(clips[2].href(&backend), None);
        assert_eq!(
            clips[3].href(&backend).as_deref(),
            Some("http://localhost:8000/clips/j1/clip_4.mp4")
        );
    }
}
