//! Primary artifact selection.

/// Extensions treated as motion/video output, checked case-insensitively.
pub const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".webm", ".mov", ".mkv", ".gif"];

/// First stored path with a video extension, else the first path, else `None`.
pub fn pick_primary(stored_paths: &[String]) -> Option<&str> {
    stored_paths
        .iter()
        .find(|p| is_video(p))
        .or_else(|| stored_paths.first())
        .map(String::as_str)
}

fn is_video(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    VIDEO_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}
