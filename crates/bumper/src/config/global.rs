use super::{defaults, regex::Regex};
use crate::{f_string::FormatString, repo::RepoSlug};

#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlobalConfig {
    /// Repository whose tags are managed
    pub repo: Option<RepoSlug>,
    /// Base URL of the GitHub REST API
    pub api_url: Option<String>,
    /// Regex parsing the version string
    pub parse_version_pattern: Option<Regex>,
    /// How to serialize back to a version
    pub serialize_version_patterns: Option<Vec<FormatString>>,
    /// Tag name template
    pub tag_name: Option<FormatString>,
    /// Tag message template
    pub tag_message: Option<FormatString>,
    /// Version assumed when the repository has no version tags
    pub initial_version: Option<String>,
    /// Ref to tag (defaults to the default branch of the repository)
    pub default_ref: Option<String>,
    /// Create lightweight tags without a tag message
    pub lightweight: Option<bool>,
    /// Allow tagging a commit that already carries the latest version tag
    pub allow_same_commit: Option<bool>,
    /// Don't create, move or delete any tags, just pretend
    pub dry_run: Option<bool>,
    /// Name of the tagger of annotated tags
    pub tagger_name: Option<String>,
    /// Email of the tagger of annotated tags
    pub tagger_email: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlobalConfigFinalized {
    /// Repository whose tags are managed
    pub repo: Option<RepoSlug>,
    /// Base URL of the GitHub REST API
    pub api_url: String,
    /// Regex parsing the version string
    pub parse_version_pattern: Regex,
    /// How to serialize back to a version
    pub serialize_version_patterns: Vec<FormatString>,
    /// Tag name template
    pub tag_name: FormatString,
    /// Tag message template
    pub tag_message: FormatString,
    /// Version assumed when the repository has no version tags
    pub initial_version: String,
    /// Ref to tag
    pub default_ref: Option<String>,
    /// Create lightweight tags without a tag message
    pub lightweight: bool,
    /// Allow tagging a commit that already carries the latest version tag
    pub allow_same_commit: bool,
    /// Don't create, move or delete any tags, just pretend
    pub dry_run: bool,
    pub tagger_name: Option<String>,
    pub tagger_email: Option<String>,
}

impl Default for GlobalConfigFinalized {
    fn default() -> Self {
        Self {
            repo: None,
            api_url: defaults::API_URL.to_string(),
            parse_version_pattern: defaults::PARSE_VERSION_REGEX.clone(),
            serialize_version_patterns: defaults::SERIALIZE_VERSION_PATTERNS.clone(),
            tag_name: defaults::TAG_NAME.clone(),
            tag_message: defaults::TAG_MESSAGE.clone(),
            initial_version: defaults::INITIAL_VERSION.to_string(),
            default_ref: None,
            lightweight: defaults::LIGHTWEIGHT,
            allow_same_commit: defaults::ALLOW_SAME_COMMIT,
            dry_run: defaults::DRY_RUN,
            tagger_name: None,
            tagger_email: None,
        }
    }
}

impl GlobalConfig {
    /// Finalize the global config.
    ///
    /// All unset configuration options will be set to their default value.
    #[must_use]
    pub fn finalize(self) -> GlobalConfigFinalized {
        let default = GlobalConfigFinalized::default();
        GlobalConfigFinalized {
            repo: self.repo.or(default.repo),
            api_url: self.api_url.unwrap_or(default.api_url),
            parse_version_pattern: self
                .parse_version_pattern
                .unwrap_or(default.parse_version_pattern),
            serialize_version_patterns: self
                .serialize_version_patterns
                .unwrap_or(default.serialize_version_patterns),
            tag_name: self.tag_name.unwrap_or(default.tag_name),
            tag_message: self.tag_message.unwrap_or(default.tag_message),
            initial_version: self.initial_version.unwrap_or(default.initial_version),
            default_ref: self.default_ref.or(default.default_ref),
            lightweight: self.lightweight.unwrap_or(default.lightweight),
            allow_same_commit: self
                .allow_same_commit
                .unwrap_or(default.allow_same_commit),
            dry_run: self.dry_run.unwrap_or(default.dry_run),
            tagger_name: self.tagger_name.or(default.tagger_name),
            tagger_email: self.tagger_email.or(default.tagger_email),
        }
    }
}

impl<'a> super::MergeWith<&'a GlobalConfig> for GlobalConfig {
    fn merge_with(&mut self, other: &'a GlobalConfig) {
        self.repo.merge_with(other.repo.as_ref());
        self.api_url.merge_with(other.api_url.as_ref());
        self.parse_version_pattern
            .merge_with(other.parse_version_pattern.as_ref());
        self.serialize_version_patterns
            .merge_with(other.serialize_version_patterns.as_ref());
        self.tag_name.merge_with(other.tag_name.as_ref());
        self.tag_message.merge_with(other.tag_message.as_ref());
        self.initial_version
            .merge_with(other.initial_version.as_ref());
        self.default_ref.merge_with(other.default_ref.as_ref());
        self.lightweight.merge_with(other.lightweight.as_ref());
        self.allow_same_commit
            .merge_with(other.allow_same_commit.as_ref());
        self.dry_run.merge_with(other.dry_run.as_ref());
        self.tagger_name.merge_with(other.tagger_name.as_ref());
        self.tagger_email.merge_with(other.tagger_email.as_ref());
    }
}
