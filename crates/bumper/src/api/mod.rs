//! Remote tag stores.
pub mod github;

#[cfg(test)]
pub mod memory;

/// A tag as listed by the host.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct RemoteTag {
    pub name: String,
    /// Commit the tag resolves to.
    ///
    /// Annotated tags are peeled to the commit they point at.
    pub commit_sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Tagger {
    pub name: String,
    pub email: String,
}

/// A tag to create.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NewTag {
    pub name: String,
    /// Tag message of an annotated tag.
    ///
    /// A tag without message is created as a lightweight tag.
    pub message: Option<String>,
    pub commit_sha: String,
    pub tagger: Option<Tagger>,
}

impl NewTag {
    #[must_use]
    pub fn is_lightweight(&self) -> bool {
        self.message.is_none()
    }
}

pub trait TagHost {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Whether the host accepts tag mutations.
    fn is_authenticated(&self) -> bool;

    /// Name of the default branch of the repository.
    async fn default_branch(&self) -> Result<String, Self::Error>;

    /// Resolve a branch, tag or commit to the SHA of a commit.
    async fn resolve_ref(&self, reference: &str) -> Result<String, Self::Error>;

    /// All tags of the repository.
    async fn tags(&self) -> Result<Vec<RemoteTag>, Self::Error>;

    /// Get a single tag by name.
    ///
    /// Returns `None` if the tag does not exist.
    async fn tag(&self, name: &str) -> Result<Option<RemoteTag>, Self::Error>;

    /// Create a new tag.
    async fn create_tag(&self, tag: &NewTag) -> Result<RemoteTag, Self::Error>;

    /// Point an existing tag at another commit.
    async fn update_tag(&self, name: &str, commit_sha: &str) -> Result<RemoteTag, Self::Error>;

    /// Delete a tag.
    async fn delete_tag(&self, name: &str) -> Result<(), Self::Error>;
}
