//! Gist identifiers and metadata as reported by `gh`.

use crate::error::PublishError;
use serde::Deserialize;
use std::fmt;

/// Text every gist page URL contains.
const GIST_HOST: &str = "gist.github.com";

/// The web URL of a created gist and the identifier taken from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GistUrl {
    url: String,
    id: String,
}

impl GistUrl {
    /// Parses the output of `gh gist create`.
    pub fn parse(output: &str) -> Result<Self, PublishError> {
        let url = output.trim();
        if !url.contains(GIST_HOST) {
            return Err(PublishError::UnexpectedCreateResponse(url.to_string()));
        }
        let id = url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty() && !id.contains(GIST_HOST))
            .ok_or_else(|| PublishError::UnexpectedCreateResponse(url.to_string()))?;
        Ok(Self {
            url: url.to_string(),
            id: id.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for GistUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

#[derive(Debug, Deserialize)]
struct GistMetadata {
    owner: Option<GistOwner>,
}

#[derive(Debug, Deserialize)]
struct GistOwner {
    login: String,
}

/// Extracts `owner.login` from the JSON returned by `gh api gists/<id>`.
pub fn owner_login_from_json(json: &str) -> Result<String, PublishError> {
    let metadata: GistMetadata = serde_json::from_str(json)
        .map_err(|err| PublishError::MalformedMetadata(err.to_string()))?;
    metadata
        .owner
        .map(|owner| owner.login)
        .filter(|login| !login.is_empty())
        .ok_or_else(|| PublishError::MalformedMetadata("missing owner login".to_string()))
}
