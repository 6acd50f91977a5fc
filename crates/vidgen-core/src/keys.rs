//! Storage key derivation.
//!
//! Uploaded source images live under `uploads/{timestamp}-{filename}`;
//! finished videos under `videos/{timestamp}-{stem}[-4k].mp4`. The same
//! timestamp is used for both keys of a submission so the pair is easy to
//! correlate, and the destination key is computed once at submission time
//! and carried through the task record to finalize.

use uuid::Uuid;

/// Strip a filename down to alphanumerics plus `.`, `-` and `_`.
///
/// Degenerate results (empty, too short, extension-only) fall back to a
/// UUID-based name so keys never collapse to e.g. `uploads/123-.jpg`.
pub fn sanitize_filename(original: &str) -> String {
    let extension = original
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| "bin".to_string());

    let safe = original
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-' || *c == '_')
        .collect::<String>();

    if safe.trim().is_empty() || safe.len() < 3 || safe == format!(".{}", extension) {
        format!("{}.{}", Uuid::new_v4(), extension)
    } else {
        safe
    }
}

/// Key for the uploaded source image.
pub fn upload_key(timestamp_ms: i64, filename: &str) -> String {
    format!("uploads/{}-{}", timestamp_ms, sanitize_filename(filename))
}

/// Key the finished video will be stored under. `upscale` appends a `-4k`
/// marker so the plain and upscaled renditions never collide.
pub fn destination_key(timestamp_ms: i64, filename: &str, upscale: bool) -> String {
    let safe = sanitize_filename(filename);
    let stem = safe.rsplit_once('.').map(|(s, _)| s).unwrap_or(&safe);
    let suffix = if upscale { "-4k" } else { "" };
    format!("videos/{}-{}{}.mp4", timestamp_ms, stem, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_safe_characters() {
        assert_eq!(sanitize_filename("cat.jpg"), "cat.jpg");
        assert_eq!(sanitize_filename("my photo (1).png"), "myphoto1.png");
        assert_eq!(sanitize_filename("a_b-c.webp"), "a_b-c.webp");
    }

    #[test]
    fn test_sanitize_degenerate_falls_back_to_uuid() {
        let out = sanitize_filename("日本語.jpg");
        assert!(out.ends_with(".jpg"));
        assert!(out.len() > ".jpg".len() + 3);

        let out = sanitize_filename("");
        assert!(out.ends_with(".bin"));
    }

    #[test]
    fn test_upload_key_shape() {
        assert_eq!(upload_key(171, "cat.jpg"), "uploads/171-cat.jpg");
    }

    #[test]
    fn test_destination_key_plain_and_upscaled() {
        assert_eq!(destination_key(171, "cat.jpg", false), "videos/171-cat.mp4");
        assert_eq!(destination_key(171, "cat.jpg", true), "videos/171-cat-4k.mp4");
    }

    #[test]
    fn test_destination_key_without_extension() {
        assert_eq!(destination_key(171, "catpic", false), "videos/171-catpic.mp4");
    }
}
