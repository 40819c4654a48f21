use crate::classify::classify_failure;
use crate::format::VideoInfo;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, trace, warn};
use tunebox_core::{
    ContentId, CredentialBundle, ExtractionFailure, ResolutionRecord, StreamExtractor,
};
use typed_builder::TypedBuilder;

pub const DEFAULT_USER_AGENT: &str = tunebox_core::BROWSER_USER_AGENT;
pub const DEFAULT_PREFERRED_CONTAINER: &str = "m4a";
pub const DEFAULT_EXTRACT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RECORD_TTL: Duration = Duration::from_secs(3600);

/// Settings for [`YtDlpExtractor`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct YtDlpConfig {
    /// Path or name of the yt-dlp executable.
    #[builder(default = PathBuf::from("yt-dlp"), setter(into))]
    pub binary: PathBuf,
    /// Audio container tried first, e.g. `m4a` or `webm`.
    #[builder(default = DEFAULT_PREFERRED_CONTAINER.to_string(), setter(into))]
    pub preferred_container: String,
    /// User agent presented to the upstream.
    #[builder(default = DEFAULT_USER_AGENT.to_string(), setter(into))]
    pub user_agent: String,
    /// Upper bound for one yt-dlp run.
    #[builder(default = DEFAULT_EXTRACT_TIMEOUT)]
    pub timeout: Duration,
    /// TTL stamped on produced records.
    #[builder(default = DEFAULT_RECORD_TTL)]
    pub record_ttl: Duration,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A [`StreamExtractor`] that shells out to yt-dlp.
///
/// Each call runs `yt-dlp --dump-single-json` for the content's watch URL.
/// The child process is killed if the returned future is dropped, so a
/// cancelled resolution does not leave extractions running.
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    config: YtDlpConfig,
}

impl YtDlpExtractor {
    pub fn new(config: YtDlpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &YtDlpConfig {
        &self.config
    }

    fn format_selector(&self) -> String {
        format!(
            "bestaudio[ext={}]/bestaudio/best",
            self.config.preferred_container
        )
    }

    fn command(&self, id: &ContentId, cookie_jar: Option<&Path>) -> Command {
        let mut command = Command::new(&self.config.binary);
        command
            .arg("--dump-single-json")
            .arg("--skip-download")
            .arg("--no-playlist")
            .arg("--no-warnings")
            .arg("--no-progress")
            .arg("--format")
            .arg(self.format_selector())
            .arg("--user-agent")
            .arg(&self.config.user_agent);

        if let Some(path) = cookie_jar {
            command.arg("--cookies").arg(path);
        }

        command
            .arg("--")
            .arg(id.watch_url())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

fn staging_failed(e: impl std::fmt::Display) -> ExtractionFailure {
    ExtractionFailure::UpstreamError(format!("failed to stage credentials: {e}"))
}

/// Writes the cookie jar to a private temporary file, removed on drop.
///
/// File creation and the write are blocking, so they run on the blocking pool.
async fn stage_cookie_jar(
    credentials: &CredentialBundle,
) -> Result<NamedTempFile, ExtractionFailure> {
    let jar = credentials.cookie_jar().to_owned();
    tokio::task::spawn_blocking(move || {
        let mut file = NamedTempFile::new()?;
        file.write_all(jar.as_bytes())?;
        file.flush()?;
        Ok::<_, std::io::Error>(file)
    })
    .await
    .map_err(staging_failed)?
    .map_err(staging_failed)
}

#[async_trait]
impl StreamExtractor for YtDlpExtractor {
    async fn extract(
        &self,
        id: &ContentId,
        credentials: Option<&CredentialBundle>,
    ) -> Result<ResolutionRecord, ExtractionFailure> {
        let cookie_jar = match credentials {
            Some(credentials) => Some(stage_cookie_jar(credentials).await?),
            None => None,
        };
        trace!(
            content_id = %id,
            with_credentials = cookie_jar.is_some(),
            "Running yt-dlp"
        );

        let mut command = self.command(id, cookie_jar.as_ref().map(NamedTempFile::path));
        let output = tokio::time::timeout(self.config.timeout, command.output())
            .await
            .map_err(|_| {
                warn!(content_id = %id, timeout = ?self.config.timeout, "yt-dlp timed out");
                ExtractionFailure::UpstreamError(format!(
                    "extraction timed out after {:?}",
                    self.config.timeout
                ))
            })?
            .map_err(|e| {
                warn!(content_id = %id, error = %e, "Failed to run yt-dlp");
                ExtractionFailure::UpstreamError(format!(
                    "failed to run {}: {e}",
                    self.config.binary.display()
                ))
            })?;
        drop(cookie_jar);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let failure = classify_failure(&stderr);
            debug!(content_id = %id, status = %output.status, failure = %failure, "yt-dlp failed");
            return Err(failure);
        }

        let info: VideoInfo = serde_json::from_slice(&output.stdout).map_err(|e| {
            ExtractionFailure::UpstreamError(format!("unreadable extractor output: {e}"))
        })?;

        let stream = info
            .select_stream(&self.config.preferred_container)
            .ok_or_else(|| {
                ExtractionFailure::UpstreamError("no playable audio stream".to_string())
            })?;

        debug!(content_id = %id, format = ?stream.format, "Extracted stream");
        Ok(ResolutionRecord::new(
            id.clone(),
            stream.url,
            stream.format,
            self.config.record_ttl,
        ))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    const SUCCESS_JSON: &str = r#"{
  "id": "abc123XYZ_-",
  "url": "https://cdn.example/abc123.m4a",
  "ext": "m4a",
  "format_id": "140",
  "formats": []
}"#;

    /// Installs a fake yt-dlp that records its arguments (and the staged
    /// cookie jar) next to itself before running `body`.
    fn install_stub(dir: &Path, body: &str) -> PathBuf {
        let script_path = dir.join("yt-dlp");
        let script = r#"#!/bin/sh
prev=""
for arg in "$@"; do
    if [ "$prev" = "--cookies" ]; then
        echo "$arg" > "__DIR__/cookies.path"
        cp "$arg" "__DIR__/cookies.seen"
    fi
    prev="$arg"
done
printf '%s\n' "$@" > "__DIR__/args"
__BODY__
"#
        .replace("__DIR__", &dir.display().to_string())
        .replace("__BODY__", body);
        fs::write(&script_path, script).unwrap();
        let mut perms = fs::metadata(&script_path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script_path, perms).unwrap();
        script_path
    }

    fn success_body() -> String {
        format!("cat <<'JSON'\n{SUCCESS_JSON}\nJSON\nexit 0")
    }

    fn extractor(binary: PathBuf) -> YtDlpExtractor {
        YtDlpExtractor::new(YtDlpConfig::builder().binary(binary).build())
    }

    fn id(s: &str) -> ContentId {
        ContentId::parse(s).unwrap()
    }

    fn recorded_args(dir: &Path) -> Vec<String> {
        fs::read_to_string(dir.join("args"))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn extracts_stream_with_browser_user_agent() {
        let dir = tempfile::tempdir().unwrap();
        let binary = install_stub(dir.path(), &success_body());

        let record = extractor(binary)
            .extract(&id("abc123XYZ_-"), None)
            .await
            .unwrap();

        assert_eq!(record.content_id.as_str(), "abc123XYZ_-");
        assert_eq!(record.stream_url, "https://cdn.example/abc123.m4a");
        assert_eq!(record.format.as_deref(), Some("m4a"));
        assert_eq!(record.ttl, Duration::from_secs(3600));

        let args = recorded_args(dir.path());
        let ua = args.iter().position(|a| a == "--user-agent").unwrap();
        assert_eq!(args[ua + 1], DEFAULT_USER_AGENT);
        let fmt = args.iter().position(|a| a == "--format").unwrap();
        assert_eq!(args[fmt + 1], "bestaudio[ext=m4a]/bestaudio/best");
        assert!(!args.iter().any(|a| a == "--cookies"));
        // the watch url is the last argument, after the option terminator
        assert_eq!(
            &args[args.len() - 2..],
            &["--", "https://www.youtube.com/watch?v=abc123XYZ_-"]
        );
    }

    #[tokio::test]
    async fn passes_cookies_through_a_temporary_jar() {
        let dir = tempfile::tempdir().unwrap();
        let binary = install_stub(dir.path(), &success_body());
        let jar = ".youtube.com\tTRUE\t/\tTRUE\t0\tSID\tsecret\n";
        let credentials = CredentialBundle::from_cookie_jar(jar);

        extractor(binary)
            .extract(&id("abc123"), Some(&credentials))
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("cookies.seen")).unwrap(), jar);
        let staged = fs::read_to_string(dir.path().join("cookies.path")).unwrap();
        assert!(
            !Path::new(staged.trim()).exists(),
            "staged cookie jar should be removed after extraction"
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn staged_jar_is_written_off_the_runtime_and_removed_on_drop() {
        let jar = ".youtube.com\tTRUE\t/\tTRUE\t0\tSID\tsecret\n";
        let staged = stage_cookie_jar(&CredentialBundle::from_cookie_jar(jar))
            .await
            .unwrap();

        let path = staged.path().to_path_buf();
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), jar);

        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn bot_check_maps_to_auth_required() {
        let dir = tempfile::tempdir().unwrap();
        let binary = install_stub(
            dir.path(),
            "echo \"ERROR: [youtube] abc123: Sign in to confirm you're not a bot\" >&2\nexit 1",
        );

        let err = extractor(binary).extract(&id("abc123"), None).await.unwrap_err();
        assert_eq!(err, ExtractionFailure::AuthRequired);
    }

    #[tokio::test]
    async fn private_video_maps_to_forbidden() {
        let dir = tempfile::tempdir().unwrap();
        let binary = install_stub(
            dir.path(),
            "echo 'ERROR: [youtube] abc123: Private video' >&2\nexit 1",
        );

        let err = extractor(binary).extract(&id("abc123"), None).await.unwrap_err();
        assert_eq!(
            err,
            ExtractionFailure::Forbidden(tunebox_core::ForbiddenReason::Private)
        );
    }

    #[tokio::test]
    async fn garbage_output_is_an_upstream_error() {
        let dir = tempfile::tempdir().unwrap();
        let binary = install_stub(dir.path(), "echo 'not json'\nexit 0");

        let err = extractor(binary).extract(&id("abc123"), None).await.unwrap_err();
        assert!(matches!(err, ExtractionFailure::UpstreamError(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn slow_extraction_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let binary = install_stub(dir.path(), "sleep 5\nexit 0");
        let extractor = YtDlpExtractor::new(
            YtDlpConfig::builder()
                .binary(binary)
                .timeout(Duration::from_millis(200))
                .build(),
        );

        let started = std::time::Instant::now();
        let err = extractor.extract(&id("abc123"), None).await.unwrap_err();
        assert!(matches!(err, ExtractionFailure::UpstreamError(ref m) if m.contains("timed out")));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn missing_binary_is_an_upstream_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = extractor(dir.path().join("does-not-exist"))
            .extract(&id("abc123"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionFailure::UpstreamError(_)), "got {err:?}");
    }
}
