//! Call-site stack capture.
//!
//! Captured frames come from `std::backtrace`, trimmed of capture
//! infrastructure and runtime plumbing so the remaining lines point at
//! application code. Capture happens synchronously at send time and is
//! gated behind [`InspectConfig::capture_stacks`](crate::InspectConfig),
//! since symbolizing a stack on every call is expensive.

/// Substrings that identify frames with no diagnostic value.
const NOISE: &[&str] = &[
    "std::backtrace",
    "backtrace::",
    "reqscope::stack",
    "reqscope::client",
    "__rust_begin_short_backtrace",
    "__rust_end_short_backtrace",
    "core::ops::function",
    "tokio::runtime",
    "std::rt::",
];

/// Capture the current stack, keeping at most `max_frames` lines.
///
/// Always captures (independent of `RUST_BACKTRACE`); returns an empty
/// vector when symbol information is unavailable.
pub(crate) fn capture(max_frames: usize) -> Vec<String> {
    let backtrace = std::backtrace::Backtrace::force_capture();
    let rendered = backtrace.to_string();

    let mut frames = Vec::new();
    for line in rendered.lines() {
        if NOISE.iter().any(|noise| line.contains(noise)) {
            continue;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        frames.push(trimmed.to_string());
        if frames.len() >= max_frames {
            break;
        }
    }
    frames
}

/// Render captured frames to display text, one frame per line.
pub(crate) fn render(frames: &[String]) -> String {
    frames.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_respects_frame_cap() {
        let frames = capture(4);
        assert!(frames.len() <= 4);
    }

    #[test]
    fn test_capture_filters_infrastructure() {
        let frames = capture(64);
        for frame in &frames {
            assert!(!frame.contains("std::backtrace"));
            assert!(!frame.contains("reqscope::stack"));
        }
    }

    #[test]
    fn test_render_joins_lines() {
        let frames = vec!["one".to_string(), "two".to_string()];
        assert_eq!(render(&frames), "one\ntwo");
        assert_eq!(render(&[]), "");
    }
}
