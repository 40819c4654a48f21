//! Maps yt-dlp error output onto [`ExtractionFailure`].

use tunebox_core::{ExtractionFailure, ForbiddenReason};

const MAX_MESSAGE_LEN: usize = 300;

// Checked in order: the private-video message also asks to "sign in", and
// copyright takedowns are phrased as "video unavailable".
const PRIVATE_MARKERS: &[&str] = &["private video", "video is private"];
const COPYRIGHT_MARKERS: &[&str] = &["copyright"];
const MEMBERS_MARKERS: &[&str] = &["members-only", "available to this channel's members"];
const GEO_MARKERS: &[&str] = &[
    "available in your country",
    "geo restricted",
    "geo-restricted",
];
const AUTH_MARKERS: &[&str] = &[
    "sign in to confirm",
    "not a bot",
    "confirm your age",
    "use --cookies",
    "login required",
    "requires authentication",
];
// Rate limiting is also phrased as "video unavailable", so these win over
// the not-found markers.
const TRANSIENT_MARKERS: &[&str] = &[
    "try again later",
    "rate-limit",
    "rate limit",
    "too many requests",
    "http error 429",
];
const NOT_FOUND_MARKERS: &[&str] = &[
    "video unavailable",
    "does not exist",
    "has been removed",
    "incomplete youtube id",
    "http error 404",
];

fn contains_any(haystack: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| haystack.contains(m))
}

/// Classifies the stderr of a failed yt-dlp run.
pub fn classify_failure(stderr: &str) -> ExtractionFailure {
    let lowered = stderr.to_ascii_lowercase();

    if contains_any(&lowered, PRIVATE_MARKERS) {
        ExtractionFailure::Forbidden(ForbiddenReason::Private)
    } else if contains_any(&lowered, COPYRIGHT_MARKERS) {
        ExtractionFailure::Forbidden(ForbiddenReason::Copyright)
    } else if contains_any(&lowered, MEMBERS_MARKERS) {
        ExtractionFailure::Forbidden(ForbiddenReason::MembersOnly)
    } else if contains_any(&lowered, GEO_MARKERS) {
        ExtractionFailure::Forbidden(ForbiddenReason::GeoRestricted)
    } else if contains_any(&lowered, AUTH_MARKERS) {
        ExtractionFailure::AuthRequired
    } else if contains_any(&lowered, TRANSIENT_MARKERS) {
        ExtractionFailure::UpstreamError(summarize(stderr))
    } else if contains_any(&lowered, NOT_FOUND_MARKERS) {
        ExtractionFailure::NotFound
    } else {
        ExtractionFailure::UpstreamError(summarize(stderr))
    }
}

/// Picks the most relevant line of the output: the last `ERROR:` line if
/// there is one, otherwise the last non-empty line.
fn summarize(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let line = lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .copied()
        .unwrap_or("extractor exited without output");

    let mut message: String = line.chars().take(MAX_MESSAGE_LEN).collect();
    if line.chars().count() > MAX_MESSAGE_LEN {
        message.push('…');
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bot_check_requires_auth() {
        let stderr = "ERROR: [youtube] abc123: Sign in to confirm you’re not a bot. \
                      Use --cookies-from-browser or --cookies for the authentication.";
        assert_eq!(classify_failure(stderr), ExtractionFailure::AuthRequired);
    }

    #[test]
    fn age_gate_requires_auth() {
        let stderr = "ERROR: [youtube] abc123: Sign in to confirm your age. \
                      This video may be inappropriate for some users.";
        assert_eq!(classify_failure(stderr), ExtractionFailure::AuthRequired);
    }

    #[test]
    fn private_video_is_forbidden_even_though_it_mentions_sign_in() {
        let stderr = "ERROR: [youtube] abc123: Private video. \
                      Sign in if you've been granted access to this video";
        assert_eq!(
            classify_failure(stderr),
            ExtractionFailure::Forbidden(ForbiddenReason::Private)
        );
    }

    #[test]
    fn copyright_takedown_is_forbidden_not_missing() {
        let stderr = "ERROR: [youtube] abc123: Video unavailable. This video is no longer \
                      available due to a copyright claim by Example Records";
        assert_eq!(
            classify_failure(stderr),
            ExtractionFailure::Forbidden(ForbiddenReason::Copyright)
        );
    }

    #[test]
    fn geo_block_and_members_only() {
        assert_eq!(
            classify_failure("ERROR: The uploader has not made this video available in your country"),
            ExtractionFailure::Forbidden(ForbiddenReason::GeoRestricted)
        );
        assert_eq!(
            classify_failure("ERROR: [youtube] x: Video unavailable. This video is not available in your country"),
            ExtractionFailure::Forbidden(ForbiddenReason::GeoRestricted)
        );
        assert_eq!(
            classify_failure("ERROR: [youtube] x: Join this channel to get access to members-only content"),
            ExtractionFailure::Forbidden(ForbiddenReason::MembersOnly)
        );
    }

    #[test]
    fn removed_video_is_not_found() {
        let stderr = "ERROR: [youtube] abc123: Video unavailable. \
                      This video has been removed by the uploader";
        assert_eq!(classify_failure(stderr), ExtractionFailure::NotFound);
    }

    #[test]
    fn rate_limited_unavailable_is_upstream_not_missing() {
        let stderr = "ERROR: [youtube] dQw4w9WgXcQ: Video unavailable. \
                      This content isn't available, try again later.";
        assert!(matches!(
            classify_failure(stderr),
            ExtractionFailure::UpstreamError(_)
        ));

        for stderr in [
            "ERROR: [youtube] abc123: Unable to download webpage: HTTP Error 429: Too Many Requests",
            "ERROR: [youtube] abc123: You have been rate-limited by YouTube",
        ] {
            assert!(
                matches!(classify_failure(stderr), ExtractionFailure::UpstreamError(_)),
                "{stderr}"
            );
        }
    }

    #[test]
    fn unknown_failure_keeps_last_error_line() {
        let stderr = "WARNING: something minor\n\
                      ERROR: [youtube] abc123: Unable to download API page: HTTP Error 503\n\
                      \n";
        assert_eq!(
            classify_failure(stderr),
            ExtractionFailure::UpstreamError(
                "ERROR: [youtube] abc123: Unable to download API page: HTTP Error 503".into()
            )
        );
    }

    #[test]
    fn empty_output_still_yields_a_message() {
        assert_eq!(
            classify_failure(""),
            ExtractionFailure::UpstreamError("extractor exited without output".into())
        );
    }

    #[test]
    fn long_messages_are_truncated() {
        let stderr = format!("ERROR: {}", "x".repeat(1000));
        match classify_failure(&stderr) {
            ExtractionFailure::UpstreamError(message) => {
                assert_eq!(message.chars().count(), MAX_MESSAGE_LEN + 1);
                assert!(message.ends_with('…'));
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }
}
