//! Repository slugs (`owner/name`).
//!
//! Accepts the short form as well as the HTTPS and SSH remote URLs GitHub hands out.

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid repository {0:?} (expected `owner/name` or a GitHub remote URL)")]
    InvalidSlug(String),
}

/// Owner and name of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl std::fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

fn is_valid_part(part: &str) -> bool {
    !part.is_empty() && !part.contains(char::is_whitespace) && !part.contains('/')
}

impl RepoSlug {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self, Error> {
        let (owner, name) = (owner.into(), name.into());
        let name = name.strip_suffix(".git").unwrap_or(&name).to_string();
        if !is_valid_part(&owner) || !is_valid_part(&name) {
            return Err(Error::InvalidSlug(format!("{owner}/{name}")));
        }
        Ok(Self { owner, name })
    }

    fn from_path(path: &str, input: &str) -> Result<Self, Error> {
        let path = path.trim_matches('/');
        let (owner, name) = path
            .split_once('/')
            .ok_or_else(|| Error::InvalidSlug(input.to_string()))?;
        Self::new(owner, name).map_err(|_| Error::InvalidSlug(input.to_string()))
    }
}

impl std::str::FromStr for RepoSlug {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();

        // scp-like ssh remote: git@github.com:owner/name.git
        if let Some((user_host, path)) = value.split_once(':') {
            if user_host.contains('@') && !user_host.contains('/') {
                return Self::from_path(path, value);
            }
        }

        if value.contains("://") {
            let url = url::Url::parse(value).map_err(|_| Error::InvalidSlug(value.to_string()))?;
            if !matches!(url.scheme(), "http" | "https" | "ssh" | "git") || url.host().is_none() {
                return Err(Error::InvalidSlug(value.to_string()));
            }
            return Self::from_path(url.path(), value);
        }

        Self::from_path(value, value)
    }
}
