use crate::error::ExtractionFailure;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A validated identifier for a piece of media.
///
/// Content ids come straight from clients and end up inside outbound
/// requests, so they must be 1-64 characters and contain only
/// alphanumeric characters, hyphens, or underscores.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ContentId(String);

const MAX_LENGTH: usize = 64;

const WATCH_URL_BASE: &str = "https://www.youtube.com/watch?v=";

impl ContentId {
    /// Parses an untrusted identifier.
    ///
    /// Fails with [`ExtractionFailure::InvalidInput`] so callers can surface the
    /// rejection without touching the network.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ExtractionFailure> {
        let raw = raw.into();
        Self::validate(&raw)?;
        Ok(Self(raw))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The canonical watch page for this content.
    pub fn watch_url(&self) -> String {
        format!("{WATCH_URL_BASE}{}", self.0)
    }

    fn validate(raw: &str) -> Result<(), ExtractionFailure> {
        if raw.is_empty() {
            return Err(ExtractionFailure::InvalidInput(
                "content id must not be empty".to_string(),
            ));
        }

        if raw.len() > MAX_LENGTH {
            return Err(ExtractionFailure::InvalidInput(format!(
                "content id must be at most {MAX_LENGTH} characters, got {}",
                raw.len()
            )));
        }

        if let Some(bad) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(ExtractionFailure::InvalidInput(format!(
                "content id contains disallowed character {bad:?}"
            )));
        }

        Ok(())
    }
}

impl Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ContentId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ContentId::parse(raw).map_err(serde::de::Error::custom)
    }
}
