//! Context for rendering tag names and tag messages.
use crate::{repo::RepoSlug, tags::VersionTag, version::Version};

/// Where a new tag will be created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Target {
    /// The ref as given by the user or the default branch.
    pub reference: String,
    /// The commit the ref resolved to.
    pub commit_sha: String,
}

/// Return the environment with keys prefixed with `$`
fn prefixed_env() -> impl Iterator<Item = (String, String)> {
    std::env::vars().map(|(k, v)| (format!("${k}"), v))
}

fn base_context(
    repo: Option<&RepoSlug>,
    target: Option<&Target>,
    current_tag: Option<&VersionTag>,
) -> impl Iterator<Item = (String, String)> {
    let (owner, name) = repo
        .map(|repo| (repo.owner.clone(), repo.name.clone()))
        .unwrap_or_default();
    let target = target.cloned().unwrap_or_default();
    let current_tag = current_tag
        .map(|tag| tag.tag.name.clone())
        .unwrap_or_default();

    [
        ("now".to_string(), chrono::Local::now().to_rfc3339()),
        ("utcnow".to_string(), chrono::Utc::now().to_rfc3339()),
    ]
    .into_iter()
    .chain(prefixed_env())
    .chain([
        ("owner".to_string(), owner),
        ("repo".to_string(), name),
        ("ref".to_string(), target.reference),
        ("commit_sha".to_string(), target.commit_sha),
        ("current_tag".to_string(), current_tag),
        ("#".to_string(), "#".to_string()),
        (";".to_string(), ";".to_string()),
    ])
}

fn components<'a>(
    prefix: &'a str,
    version: Option<&'a Version>,
) -> impl Iterator<Item = (String, String)> + 'a {
    version.into_iter().flat_map(move |version| {
        version
            .iter()
            .map(move |(part, value)| (format!("{prefix}_{part}"), value.value().to_string()))
    })
}

/// Return the context for rendering tag names and messages.
pub fn get_context<'a>(
    repo: Option<&RepoSlug>,
    target: Option<&Target>,
    current_tag: Option<&VersionTag>,
    current_version: Option<&'a Version>,
    new_version: Option<&'a Version>,
    current_version_serialized: Option<&str>,
    new_version_serialized: Option<&str>,
) -> impl Iterator<Item = (String, String)> + 'a {
    base_context(repo, target, current_tag)
        .chain([
            (
                "current_version".to_string(),
                current_version_serialized.unwrap_or_default().to_string(),
            ),
            (
                "new_version".to_string(),
                new_version_serialized.unwrap_or_default().to_string(),
            ),
        ])
        .chain(components("current", current_version))
        .chain(components("new", new_version))
}
