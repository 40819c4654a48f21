//! Credential sources that re-read their backing configuration on every call.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::trace;
use tunebox_core::{CredentialBundle, CredentialError, CredentialSource};

/// Reads a Netscape cookie jar from disk.
///
/// A missing or empty file means "no credentials", so cookies can be
/// provisioned or revoked while the service is running.
#[derive(Debug, Clone)]
pub struct CookieFileSource {
    path: PathBuf,
}

impl CookieFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialSource for CookieFileSource {
    async fn load(&self) -> Result<Option<CredentialBundle>, CredentialError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(None),
            Ok(content) => {
                trace!(path = %self.path.display(), "Loaded cookie jar");
                Ok(Some(CredentialBundle::from_cookie_jar(content)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                Err(CredentialError::Encoding(self.path.display().to_string()))
            }
            Err(error) => Err(CredentialError::Io {
                source_name: self.path.display().to_string(),
                error,
            }),
        }
    }
}

/// Reads a cookie jar from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvCookieSource {
    var: String,
}

impl EnvCookieSource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl CredentialSource for EnvCookieSource {
    async fn load(&self) -> Result<Option<CredentialBundle>, CredentialError> {
        match std::env::var(&self.var) {
            Ok(content) if content.trim().is_empty() => Ok(None),
            Ok(content) => Ok(Some(CredentialBundle::from_cookie_jar(content))),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => {
                Err(CredentialError::Encoding(format!("${}", self.var)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAR: &str = "# Netscape HTTP Cookie File\n.youtube.com\tTRUE\t/\tTRUE\t0\tSID\tabc\n";

    #[tokio::test]
    async fn cookie_file_is_reread_on_every_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.txt");
        let source = CookieFileSource::new(&path);

        assert!(source.load().await.unwrap().is_none());

        std::fs::write(&path, JAR).unwrap();
        let bundle = source.load().await.unwrap().unwrap();
        assert_eq!(bundle.cookie_jar(), JAR);

        std::fs::write(&path, "   \n").unwrap();
        assert!(source.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unreadable_cookie_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be read as a file
        let source = CookieFileSource::new(dir.path());
        assert!(source.load().await.is_err());
    }

    #[tokio::test]
    async fn env_source_reads_current_value() {
        let var = "TUNEBOX_TEST_COOKIES_ENV_SOURCE";
        let source = EnvCookieSource::new(var);

        std::env::remove_var(var);
        assert!(source.load().await.unwrap().is_none());

        std::env::set_var(var, JAR);
        assert_eq!(source.load().await.unwrap().unwrap().cookie_jar(), JAR);

        std::env::remove_var(var);
    }
}
