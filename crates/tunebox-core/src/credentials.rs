use crate::error::CredentialError;
use async_trait::async_trait;
use std::sync::Arc;

/// Session cookies handed to the extractor.
///
/// The content is a Netscape-format cookie jar. It is never cached and
/// never printed: the `Debug` impl only reports its size.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialBundle {
    cookies: String,
}

impl CredentialBundle {
    pub fn from_cookie_jar(cookies: impl Into<String>) -> Self {
        Self {
            cookies: cookies.into(),
        }
    }

    pub fn cookie_jar(&self) -> &str {
        &self.cookies
    }
}

impl std::fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("cookies", &format_args!("<{} bytes redacted>", self.cookies.len()))
            .finish()
    }
}

/// Where credentials come from.
///
/// Sources are consulted on every extraction attempt so that rotated
/// cookies are picked up without a restart.
#[async_trait]
pub trait CredentialSource: Send + Sync + 'static {
    /// Loads the current credentials, `Ok(None)` when none are configured.
    async fn load(&self) -> Result<Option<CredentialBundle>, CredentialError>;
}

#[async_trait]
impl<T: CredentialSource + ?Sized> CredentialSource for Arc<T> {
    async fn load(&self) -> Result<Option<CredentialBundle>, CredentialError> {
        (**self).load().await
    }
}

/// A source that never provides credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

#[async_trait]
impl CredentialSource for NoCredentials {
    async fn load(&self) -> Result<Option<CredentialBundle>, CredentialError> {
        Ok(None)
    }
}
