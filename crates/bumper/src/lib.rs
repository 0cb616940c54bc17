#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod f_string;
pub mod logging;
pub mod repo;
pub mod tags;
pub mod version;

use crate::{
    api::{NewTag, RemoteTag, TagHost, Tagger},
    context::Target,
    logging::{LogExt, TagAction, Verbosity},
    tags::VersionTag,
    version::{Version, VersionSpec},
};
use colored::{Color, Colorize};
use futures::stream::{StreamExt, TryStreamExt};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Maximum number of concurrent tag deletions.
pub const MAX_CONCURRENT_REQUESTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bump<'a> {
    Component(&'a str),
    NewVersion(&'a str),
}

/// Find and parse the config file.
///
/// If `config_file` is given, only that file is read and it must exist.
/// Otherwise the first default config file location with a `bumper` table wins.
///
/// # Errors
/// When the config file cannot be read or parsed.
pub async fn find_config<W>(
    dir: &Path,
    config_file: Option<&Path>,
    printer: &diagnostics::Printer<W>,
) -> Result<Option<(config::ConfigFile, config::Config)>, config::Error>
where
    W: codespan_reporting::term::termcolor::WriteColor,
{
    use crate::diagnostics::ToDiagnostics;

    let required = config_file.is_some();
    let config_files: Vec<config::ConfigFile> = match config_file {
        Some(path) => vec![config::ConfigFile::from_path(dir.join(path))],
        None => config::config_file_locations(dir).collect(),
    };

    let config_files = futures::stream::iter(config_files)
        .then(|config_file| async move {
            let path = config_file.path().to_path_buf();
            if !required && !path.is_file() {
                return Ok::<_, config::Error>(None);
            }
            let config = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| config::Error::Io {
                    source,
                    path: path.clone(),
                })?;

            let file_id = printer.add_source_file(&path, config.clone());
            let table_path = config_file.table_path();

            let parse_config_task = tokio::task::spawn_blocking(move || {
                let res = config::Config::from_toml(&config, table_path);
                let diagnostics = match res {
                    Err(ref err) => err.to_diagnostics(file_id),
                    Ok(_) => vec![],
                };
                (res, diagnostics)
            });
            let (res, diagnostics) = parse_config_task.await?;

            for diagnostic in &diagnostics {
                printer.emit(diagnostic).map_err(diagnostics::Error::from)?;
            }

            let config = res.map_err(|source| config::Error::Toml {
                source,
                path: path.clone(),
            })?;
            if config.is_none() && required {
                tracing::warn!(?path, "config file has no bumper table");
            }
            Ok::<_, config::Error>(config.map(|config| (config_file, config)))
        })
        .filter_map(|res| async move { res.transpose() });

    futures::pin_mut!(config_files);
    config_files.next().await.transpose()
}

#[derive(thiserror::Error, Debug)]
pub enum BumpError<H>
where
    H: TagHost,
{
    #[error("missing repository (set `repo` in the config file or pass `--repo`)")]
    MissingRepo,
    #[error("missing API token, which is required to create, move or delete tags")]
    MissingToken,
    #[error("invalid version {0:?}")]
    InvalidVersion(String),
    #[error("initial version {0:?} does not match the parse pattern")]
    InvalidInitialVersion(String),
    #[error("commit {commit_sha} is already tagged with the latest version tag {tag:?}")]
    AlreadyTagged { tag: String, commit_sha: String },
    #[error("tag {0:?} already exists")]
    TagExists(String),
    #[error("tag {0:?} does not exist")]
    TagNotFound(String),
    #[error("failed to bump version")]
    Bump(#[from] crate::version::BumpError),
    #[error("failed to serialize version")]
    Serialize(#[from] crate::version::SerializeError),
    #[error(transparent)]
    Format(#[from] f_string::FormatError),
    #[error(transparent)]
    Tags(#[from] tags::Error),
    #[error(transparent)]
    Host(H::Error),
}

/// What happened to a tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagStatus {
    Created,
    Moved { from: String },
    Deleted,
    /// The tag already existed and was left untouched.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagOutcome {
    pub tag: RemoteTag,
    pub message: Option<String>,
    pub status: TagStatus,
    /// Nothing was changed on the host.
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct BumpOutcome {
    /// The latest version tag before the bump.
    pub current: Option<VersionTag>,
    pub current_version: String,
    pub new_version: String,
    pub target: Target,
    pub tag: TagOutcome,
}

#[derive(Debug, Clone)]
pub struct Listing {
    /// All tags of the repository.
    pub tags: Vec<RemoteTag>,
    /// Version tags, ordered from the highest to the lowest version.
    pub version_tags: Vec<VersionTag>,
}

/// Bumper manager
#[derive(Debug)]
pub struct Bumper<H, L> {
    pub host: H,
    pub config: config::FinalizedConfig,
    pub logger: L,
    pub components: config::version::VersionComponentConfigs,
    pub dry_run: bool,
}

impl<H, L> Bumper<H, L>
where
    H: TagHost,
    L: logging::Log,
{
    pub fn new(host: H, config: config::FinalizedConfig, logger: L) -> Self {
        let components = config::version::version_component_configs(&config);
        let dry_run = config.global.dry_run;
        Self {
            host,
            config,
            logger,
            components,
            dry_run,
        }
    }

    #[must_use]
    pub fn version_spec(&self) -> VersionSpec {
        VersionSpec::from_components(self.components.clone())
    }

    /// Mutations need a token, unless they only pretend.
    fn require_token(&self) -> Result<(), BumpError<H>> {
        if self.dry_run || self.host.is_authenticated() {
            Ok(())
        } else {
            Err(BumpError::MissingToken)
        }
    }

    fn tagger(&self) -> Option<Tagger> {
        match (&self.config.global.tagger_name, &self.config.global.tagger_email) {
            (Some(name), Some(email)) => Some(Tagger {
                name: name.clone(),
                email: email.clone(),
            }),
            (None, None) => None,
            _ => {
                tracing::warn!("tagger requires both a name and an email and will be ignored");
                None
            }
        }
    }

    /// Resolve the ref to tag.
    ///
    /// Falls back to the configured default ref and then to the default branch.
    async fn resolve_target(&self, reference: Option<&str>) -> Result<Target, BumpError<H>> {
        let reference = match reference.or(self.config.global.default_ref.as_deref()) {
            Some(reference) => reference.to_string(),
            None => self
                .host
                .default_branch()
                .await
                .map_err(BumpError::Host)?,
        };
        let commit_sha = self
            .host
            .resolve_ref(&reference)
            .await
            .map_err(BumpError::Host)?;
        tracing::debug!(reference, commit_sha, "resolved target");
        Ok(Target {
            reference,
            commit_sha,
        })
    }

    async fn version_tags(&self) -> Result<(Vec<RemoteTag>, Vec<VersionTag>), BumpError<H>> {
        let tags = self.host.tags().await.map_err(BumpError::Host)?;
        let version_tags = tags::version_tags(
            tags.iter().cloned(),
            &self.config.global.tag_name,
            &self.config.global.parse_version_pattern,
            &self.version_spec(),
        )?;
        tracing::debug!(
            tags = tags.len(),
            version_tags = version_tags.len(),
            "listed tags"
        );
        Ok((tags, version_tags))
    }

    /// List all tags and the version tags among them.
    ///
    /// # Errors
    /// When the tags cannot be listed.
    pub async fn list(&self) -> Result<Listing, BumpError<H>> {
        let (tags, version_tags) = self.version_tags().await?;
        Ok(Listing { tags, version_tags })
    }

    /// The tag with the highest version.
    ///
    /// # Errors
    /// When the tags cannot be listed.
    pub async fn latest(&self) -> Result<Option<VersionTag>, BumpError<H>> {
        let (_, version_tags) = self.version_tags().await?;
        Ok(version_tags.into_iter().next())
    }

    /// Bump the latest version and tag the target commit with the new version.
    ///
    /// # Errors
    /// - When no token is available outside of a dry run.
    /// - When the latest version tag already points at the target commit.
    /// - When the version cannot be bumped or serialized.
    /// - When a request to the host fails.
    pub async fn bump(&self, bump: Bump<'_>) -> Result<BumpOutcome, BumpError<H>> {
        self.require_token()?;

        let global = &self.config.global;
        let parse_version_pattern = &global.parse_version_pattern;
        let version_spec = self.version_spec();

        let target = self.resolve_target(None).await?;
        let (tags, version_tags) = self.version_tags().await?;
        let current = version_tags.into_iter().next();

        let (current_version, current_version_serialized) = match &current {
            Some(current) => (current.version.clone(), current.serialized.clone()),
            None => {
                tracing::info!(
                    initial_version = global.initial_version,
                    "no version tag found"
                );
                let version =
                    Version::parse(&global.initial_version, parse_version_pattern, &version_spec)
                        .ok_or_else(|| {
                            BumpError::InvalidInitialVersion(global.initial_version.clone())
                        })?;
                (version, global.initial_version.clone())
            }
        };

        self.logger.log_version(
            "current version",
            &current_version_serialized,
            Some(&current_version),
        );
        if let Some(current) = &current {
            self.logger.log(
                Verbosity::Medium,
                &format!(
                    "\t{}{} {}",
                    "tag = ".dimmed(),
                    current.tag.name.yellow(),
                    logging::short_sha(&current.tag.commit_sha).cyan()
                ),
            );
        }

        let new_version = match bump {
            Bump::Component(comp_name) => {
                tracing::info!(component = comp_name, "attempting to increment version component");
                current_version.bump(comp_name)?
            }
            Bump::NewVersion(new_version) => {
                tracing::info!(new_version, "parse new version");
                Version::parse(new_version, parse_version_pattern, &version_spec)
                    .ok_or_else(|| BumpError::InvalidVersion(new_version.to_string()))?
            }
        };

        if let Some(current) = &current {
            if current.tag.commit_sha == target.commit_sha && !global.allow_same_commit {
                return Err(BumpError::AlreadyTagged {
                    tag: current.tag.name.clone(),
                    commit_sha: target.commit_sha.clone(),
                });
            }
        }

        let ctx_without_new_version: HashMap<String, String> = context::get_context(
            global.repo.as_ref(),
            Some(&target),
            current.as_ref(),
            Some(&current_version),
            None,
            Some(current_version_serialized.as_str()),
            None,
        )
        .collect();

        let new_version_serialized = new_version.serialize(
            &global.serialize_version_patterns,
            &ctx_without_new_version,
        )?;
        tracing::info!(version = new_version_serialized, "next version");
        self.logger
            .log_version("new version", &new_version_serialized, Some(&new_version));

        let ctx: HashMap<String, String> = context::get_context(
            global.repo.as_ref(),
            Some(&target),
            current.as_ref(),
            Some(&current_version),
            Some(&new_version),
            Some(current_version_serialized.as_str()),
            Some(new_version_serialized.as_str()),
        )
        .collect();

        let tag_name = global.tag_name.format(&ctx, true)?;
        let message = if global.lightweight {
            None
        } else {
            Some(global.tag_message.format(&ctx, true)?)
        };
        tracing::info!(name = tag_name, ?message, "tag");

        self.logger.log_section("tag", Color::Magenta);

        let tag = RemoteTag {
            name: tag_name,
            commit_sha: target.commit_sha.clone(),
        };

        if let Some(existing) = tags.iter().find(|existing| existing.name == tag.name) {
            tracing::warn!("tag {:?} already exists and will not be created", tag.name);
            self.logger
                .log_tag(TagAction::Skip, existing, None, self.dry_run);
            return Ok(BumpOutcome {
                current,
                current_version: current_version_serialized,
                new_version: new_version_serialized,
                target,
                tag: TagOutcome {
                    tag: existing.clone(),
                    message: None,
                    status: TagStatus::Skipped,
                    dry_run: self.dry_run,
                },
            });
        }

        let outcome = self.create_new_tag(tag, message).await?;
        Ok(BumpOutcome {
            current,
            current_version: current_version_serialized,
            new_version: new_version_serialized,
            target,
            tag: outcome,
        })
    }

    async fn create_new_tag(
        &self,
        tag: RemoteTag,
        message: Option<String>,
    ) -> Result<TagOutcome, BumpError<H>> {
        self.logger
            .log_tag(TagAction::Create, &tag, message.as_deref(), self.dry_run);
        if self.dry_run {
            tracing::info!("dry run active, won't create tag {:?}", tag.name);
        } else {
            let new_tag = NewTag {
                name: tag.name.clone(),
                message: message.clone(),
                commit_sha: tag.commit_sha.clone(),
                tagger: self.tagger(),
            };
            self.host
                .create_tag(&new_tag)
                .await
                .map_err(BumpError::Host)?;
        }
        Ok(TagOutcome {
            tag,
            message,
            status: TagStatus::Created,
            dry_run: self.dry_run,
        })
    }

    async fn move_existing_tag(
        &self,
        existing: RemoteTag,
        target: &Target,
    ) -> Result<TagOutcome, BumpError<H>> {
        let tag = RemoteTag {
            name: existing.name,
            commit_sha: target.commit_sha.clone(),
        };
        self.logger
            .log_tag(TagAction::Move, &tag, None, self.dry_run);
        if self.dry_run {
            tracing::info!("dry run active, won't move tag {:?}", tag.name);
        } else {
            self.host
                .update_tag(&tag.name, &tag.commit_sha)
                .await
                .map_err(BumpError::Host)?;
        }
        Ok(TagOutcome {
            tag,
            message: None,
            status: TagStatus::Moved {
                from: existing.commit_sha,
            },
            dry_run: self.dry_run,
        })
    }

    /// Create a tag with an arbitrary name.
    ///
    /// A tag without `message` is created as lightweight tag.
    /// With `force`, an existing tag is moved to the target instead.
    ///
    /// # Errors
    /// When no token is available or the tag exists and `force` is not set.
    pub async fn create(
        &self,
        name: &str,
        reference: Option<&str>,
        message: Option<&str>,
        force: bool,
    ) -> Result<TagOutcome, BumpError<H>> {
        self.require_token()?;
        let target = self.resolve_target(reference).await?;
        let existing = self.host.tag(name).await.map_err(BumpError::Host)?;

        self.logger.log_section("tag", Color::Magenta);
        match existing {
            Some(_) if !force => Err(BumpError::TagExists(name.to_string())),
            Some(existing) => self.move_existing_tag(existing, &target).await,
            None => {
                let tag = RemoteTag {
                    name: name.to_string(),
                    commit_sha: target.commit_sha,
                };
                self.create_new_tag(tag, message.map(ToString::to_string))
                    .await
            }
        }
    }

    /// Move an existing tag to another ref.
    ///
    /// # Errors
    /// When no token is available or the tag does not exist.
    pub async fn move_tag(&self, name: &str, reference: &str) -> Result<TagOutcome, BumpError<H>> {
        self.require_token()?;
        let existing = self
            .host
            .tag(name)
            .await
            .map_err(BumpError::Host)?
            .ok_or_else(|| BumpError::TagNotFound(name.to_string()))?;
        let target = self.resolve_target(Some(reference)).await?;

        self.logger.log_section("tag", Color::Magenta);
        self.move_existing_tag(existing, &target).await
    }

    /// Delete tags.
    ///
    /// Nothing is deleted if any of the tags does not exist.
    ///
    /// # Errors
    /// When no token is available, a tag does not exist, or a deletion fails.
    pub async fn delete(&self, names: &[impl AsRef<str>]) -> Result<Vec<TagOutcome>, BumpError<H>> {
        self.require_token()?;
        let tags = self.host.tags().await.map_err(BumpError::Host)?;

        let mut seen = HashSet::new();
        let to_delete: Vec<RemoteTag> = names
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| seen.insert(*name))
            .map(|name| {
                tags.iter()
                    .find(|tag| tag.name == name)
                    .cloned()
                    .ok_or_else(|| BumpError::TagNotFound(name.to_string()))
            })
            .collect::<Result<_, _>>()?;

        self.logger.log_section("delete", Color::Magenta);
        for tag in &to_delete {
            self.logger
                .log_tag(TagAction::Delete, tag, None, self.dry_run);
        }

        if self.dry_run {
            tracing::info!("dry run active, won't delete {} tags", to_delete.len());
        } else {
            futures::stream::iter(&to_delete)
                .map(|tag| async move {
                    self.host.delete_tag(&tag.name).await?;
                    tracing::debug!(tag = tag.name, "deleted tag");
                    Ok::<_, H::Error>(())
                })
                .buffer_unordered(MAX_CONCURRENT_REQUESTS)
                .try_collect::<Vec<()>>()
                .await
                .map_err(BumpError::Host)?;
        }

        Ok(to_delete
            .into_iter()
            .map(|tag| TagOutcome {
                tag,
                message: None,
                status: TagStatus::Deleted,
                dry_run: self.dry_run,
            })
            .collect())
    }
}

#[cfg(test)]
pub mod tests {
    use super::{find_config, Bump, BumpError, Bumper, TagStatus};
    use crate::{
        api::memory::{self, MemoryHost},
        config::{self, Config, ConfigFile, GlobalConfig, VersionComponentSpec},
        diagnostics::Printer,
        f_string::FormatString,
        logging::NoOpLogger,
        repo::RepoSlug,
    };
    use color_eyre::eyre;
    use indoc::indoc;
    use similar_asserts::assert_eq as sim_assert_eq;
    use std::path::Path;

    static INIT: std::sync::Once = std::sync::Once::new();

    /// Initialize test
    ///
    /// This ensures `color_eyre` is setup once.
    pub(crate) fn init() {
        INIT.call_once(|| {
            color_eyre::install().ok();
        });
    }

    const HEAD: &str = "1111111111111111111111111111111111111111";
    const OLD: &str = "0000000000000000000000000000000000000000";

    fn manager(host: MemoryHost, global: GlobalConfig) -> Bumper<MemoryHost, NoOpLogger> {
        let config = Config {
            global: GlobalConfig {
                repo: Some("duncancreek/bumper".parse().expect("valid slug")),
                ..global
            },
            ..Config::default()
        };
        Bumper::new(host, config.finalize(), NoOpLogger::default())
    }

    #[tokio::test]
    async fn bump_without_tags_starts_at_initial_version() -> eyre::Result<()> {
        init();
        let bumper = manager(MemoryHost::new(HEAD), GlobalConfig::default());
        let outcome = bumper.bump(Bump::Component("patch")).await?;
        sim_assert_eq!(outcome.current_version, "0.0.0");
        sim_assert_eq!(outcome.new_version, "0.0.1");
        sim_assert_eq!(outcome.tag.tag.name, "v0.0.1");
        sim_assert_eq!(outcome.tag.status, TagStatus::Created);
        sim_assert_eq!(bumper.host.get("v0.0.1").map(|tag| tag.commit_sha), Some(HEAD.to_string()));
        sim_assert_eq!(
            bumper.host.message("v0.0.1").as_deref(),
            Some("Bump version: 0.0.0 → 0.0.1")
        );

        let bumper = manager(MemoryHost::new(HEAD), GlobalConfig::default());
        let outcome = bumper.bump(Bump::Component("minor")).await?;
        sim_assert_eq!(outcome.tag.tag.name, "v0.1.0");
        Ok(())
    }

    #[tokio::test]
    async fn bump_latest_version_by_version_order() -> eyre::Result<()> {
        init();
        let host = MemoryHost::new(HEAD)
            .with_tag("v1.9.0", OLD)
            .with_tag("v1.10.0", OLD)
            .with_tag("nightly", OLD);
        let bumper = manager(host, GlobalConfig::default());
        let outcome = bumper.bump(Bump::Component("minor")).await?;
        sim_assert_eq!(
            outcome.current.map(|current| current.tag.name),
            Some("v1.10.0".to_string())
        );
        sim_assert_eq!(outcome.new_version, "1.11.0");
        sim_assert_eq!(
            bumper.host.tag_names(),
            vec!["nightly", "v1.10.0", "v1.11.0", "v1.9.0"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn bump_refuses_already_tagged_commit() -> eyre::Result<()> {
        init();
        let host = MemoryHost::new(HEAD).with_tag("v1.0.0", HEAD);
        let bumper = manager(host, GlobalConfig::default());
        let res = bumper.bump(Bump::Component("patch")).await;
        assert!(matches!(res, Err(BumpError::AlreadyTagged { .. })));
        sim_assert_eq!(bumper.host.mutations(), 0);

        let host = MemoryHost::new(HEAD).with_tag("v1.0.0", HEAD);
        let bumper = manager(
            host,
            GlobalConfig {
                allow_same_commit: Some(true),
                ..GlobalConfig::default()
            },
        );
        let outcome = bumper.bump(Bump::Component("patch")).await?;
        sim_assert_eq!(outcome.tag.tag.name, "v1.0.1");
        Ok(())
    }

    #[tokio::test]
    async fn bump_dry_run_does_not_mutate() -> eyre::Result<()> {
        init();
        let host = MemoryHost::new(HEAD).with_tag("v2.3.4", OLD);
        let bumper = manager(
            host,
            GlobalConfig {
                dry_run: Some(true),
                ..GlobalConfig::default()
            },
        );
        let outcome = bumper.bump(Bump::Component("major")).await?;
        sim_assert_eq!(outcome.tag.tag.name, "v3.0.0");
        assert!(outcome.tag.dry_run);
        sim_assert_eq!(bumper.host.mutations(), 0);
        sim_assert_eq!(bumper.host.tag_names(), vec!["v2.3.4"]);
        Ok(())
    }

    #[tokio::test]
    async fn dry_run_mutations_work_without_token() -> eyre::Result<()> {
        init();
        let host = MemoryHost::new(HEAD).with_tag("v2.3.4", OLD).anonymous();
        let bumper = manager(
            host,
            GlobalConfig {
                dry_run: Some(true),
                ..GlobalConfig::default()
            },
        );
        let outcome = bumper.bump(Bump::Component("minor")).await?;
        sim_assert_eq!(outcome.tag.tag.name, "v2.4.0");
        assert!(outcome.tag.dry_run);

        let outcome = bumper.create("v2.3.4", None, None, true).await?;
        sim_assert_eq!(
            outcome.status,
            TagStatus::Moved {
                from: OLD.to_string()
            }
        );
        let outcomes = bumper.delete(&["v2.3.4"]).await?;
        sim_assert_eq!(outcomes.len(), 1);

        sim_assert_eq!(bumper.host.mutations(), 0);
        sim_assert_eq!(bumper.host.tag_names(), vec!["v2.3.4"]);
        Ok(())
    }

    #[tokio::test]
    async fn bump_skips_existing_tag() -> eyre::Result<()> {
        init();
        let host = MemoryHost::new(HEAD).with_tag("v1.0.0", OLD);
        let bumper = manager(host, GlobalConfig::default());
        let outcome = bumper.bump(Bump::NewVersion("1.0.0")).await?;
        sim_assert_eq!(outcome.tag.status, TagStatus::Skipped);
        sim_assert_eq!(outcome.tag.tag.commit_sha, OLD);
        sim_assert_eq!(bumper.host.mutations(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn bump_with_custom_parts_and_lightweight_tags() -> eyre::Result<()> {
        init();
        let host = MemoryHost::new(HEAD)
            .with_branch("release", "2222222222222222222222222222222222222222")
            .with_tag("app-1.4.0-rc", OLD);
        let config = Config {
            global: GlobalConfig {
                repo: Some("duncancreek/bumper".parse()?),
                tag_name: Some(FormatString::parse("app-{new_version}")?),
                parse_version_pattern: Some(
                    regex::Regex::new(
                        r"(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)(-(?P<release>[a-z]+))?",
                    )?
                    .into(),
                ),
                serialize_version_patterns: Some(vec![
                    FormatString::parse("{major}.{minor}.{patch}-{release}")?,
                    FormatString::parse("{major}.{minor}.{patch}")?,
                ]),
                default_ref: Some("release".to_string()),
                lightweight: Some(true),
                ..GlobalConfig::default()
            },
            components: [(
                "release".to_string(),
                VersionComponentSpec {
                    values: vec!["rc".to_string(), "final".to_string()],
                    optional_value: Some("final".to_string()),
                    ..VersionComponentSpec::default()
                },
            )]
            .into_iter()
            .collect(),
        };
        let bumper = Bumper::new(host, config.finalize(), NoOpLogger::default());
        let outcome = bumper.bump(Bump::Component("release")).await?;
        sim_assert_eq!(outcome.tag.tag.name, "app-1.4.0");
        sim_assert_eq!(outcome.target.reference, "release");
        sim_assert_eq!(
            outcome.tag.tag.commit_sha,
            "2222222222222222222222222222222222222222"
        );
        sim_assert_eq!(outcome.tag.message, None);
        sim_assert_eq!(bumper.host.message("app-1.4.0"), None);
        Ok(())
    }

    #[tokio::test]
    async fn final_release_is_latest_and_cannot_be_bumped() -> eyre::Result<()> {
        init();
        let host = MemoryHost::new(HEAD)
            .with_tag("v1.4.0-rc", OLD)
            .with_tag("v1.4.0", OLD);
        let config = Config {
            global: GlobalConfig {
                repo: Some("duncancreek/bumper".parse()?),
                parse_version_pattern: Some(
                    regex::Regex::new(
                        r"(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)(-(?P<release>[a-z]+))?",
                    )?
                    .into(),
                ),
                serialize_version_patterns: Some(vec![
                    FormatString::parse("{major}.{minor}.{patch}-{release}")?,
                    FormatString::parse("{major}.{minor}.{patch}")?,
                ]),
                ..GlobalConfig::default()
            },
            components: [(
                "release".to_string(),
                VersionComponentSpec {
                    values: vec!["dev".to_string(), "rc".to_string(), "final".to_string()],
                    optional_value: Some("final".to_string()),
                    ..VersionComponentSpec::default()
                },
            )]
            .into_iter()
            .collect(),
        };
        let bumper = Bumper::new(host, config.finalize(), NoOpLogger::default());

        let latest = bumper.latest().await?.map(|tag| tag.tag.name);
        sim_assert_eq!(latest.as_deref(), Some("v1.4.0"));

        assert!(matches!(
            bumper.bump(Bump::Component("release")).await,
            Err(BumpError::Bump(_))
        ));
        sim_assert_eq!(bumper.host.mutations(), 0);

        let outcome = bumper.bump(Bump::Component("patch")).await?;
        sim_assert_eq!(outcome.current_version, "1.4.0");
        sim_assert_eq!(outcome.tag.tag.name, "v1.4.1-dev");
        Ok(())
    }

    #[tokio::test]
    async fn bump_invalid_inputs() -> eyre::Result<()> {
        init();
        let bumper = manager(MemoryHost::new(HEAD).with_tag("v1.0.0", OLD), GlobalConfig::default());
        assert!(matches!(
            bumper.bump(Bump::Component("build")).await,
            Err(BumpError::Bump(_))
        ));
        assert!(matches!(
            bumper.bump(Bump::NewVersion("latest")).await,
            Err(BumpError::InvalidVersion(_))
        ));

        let bumper = manager(MemoryHost::new(HEAD).anonymous(), GlobalConfig::default());
        assert!(matches!(
            bumper.bump(Bump::Component("patch")).await,
            Err(BumpError::MissingToken)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn create_and_force_move_tags() -> eyre::Result<()> {
        init();
        let host = MemoryHost::new(HEAD).with_tag("stable", OLD);
        let bumper = manager(host, GlobalConfig::default());

        let outcome = bumper.create("canary", None, Some("canary build"), false).await?;
        sim_assert_eq!(outcome.status, TagStatus::Created);
        sim_assert_eq!(bumper.host.message("canary").as_deref(), Some("canary build"));

        let res = bumper.create("stable", None, None, false).await;
        assert!(matches!(res, Err(BumpError::TagExists(name)) if name == "stable"));

        let outcome = bumper.create("stable", None, None, true).await?;
        sim_assert_eq!(
            outcome.status,
            TagStatus::Moved {
                from: OLD.to_string()
            }
        );
        sim_assert_eq!(
            bumper.host.get("stable").map(|tag| tag.commit_sha),
            Some(HEAD.to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn move_tag_requires_existing_tag() -> eyre::Result<()> {
        init();
        let host = MemoryHost::new(HEAD).with_tag("stable", OLD);
        let bumper = manager(host, GlobalConfig::default());

        let res = bumper.move_tag("missing", "main").await;
        assert!(matches!(res, Err(BumpError::TagNotFound(_))));

        let outcome = bumper.move_tag("stable", "main").await?;
        sim_assert_eq!(outcome.tag.commit_sha, HEAD);

        let res = bumper.move_tag("stable", "no-such-branch").await;
        assert!(matches!(
            res,
            Err(BumpError::Host(memory::Error::NotFound(_)))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn delete_is_all_or_nothing() -> eyre::Result<()> {
        init();
        let host = MemoryHost::new(HEAD)
            .with_tag("v1.0.0", OLD)
            .with_tag("v1.0.1", OLD)
            .with_tag("v1.0.2", HEAD);
        let bumper = manager(host, GlobalConfig::default());

        let res = bumper.delete(&["v1.0.0", "v9.9.9"]).await;
        assert!(matches!(res, Err(BumpError::TagNotFound(name)) if name == "v9.9.9"));
        sim_assert_eq!(bumper.host.mutations(), 0);

        let outcomes = bumper.delete(&["v1.0.1", "v1.0.0", "v1.0.1"]).await?;
        let deleted: Vec<_> = outcomes.into_iter().map(|outcome| outcome.tag.name).collect();
        sim_assert_eq!(deleted, vec!["v1.0.1", "v1.0.0"]);
        sim_assert_eq!(bumper.host.tag_names(), vec!["v1.0.2"]);
        Ok(())
    }

    #[tokio::test]
    async fn list_and_latest() -> eyre::Result<()> {
        init();
        let host = MemoryHost::new(HEAD)
            .with_tag("v0.9.0", OLD)
            .with_tag("v0.10.0", HEAD)
            .with_tag("docs", OLD);
        let bumper = manager(host.anonymous(), GlobalConfig::default());

        let listing = bumper.list().await?;
        sim_assert_eq!(listing.tags.len(), 3);
        let versions: Vec<_> = listing
            .version_tags
            .iter()
            .map(|tag| tag.serialized.as_str())
            .collect();
        sim_assert_eq!(versions, vec!["0.10.0", "0.9.0"]);

        let latest = bumper.latest().await?.map(|tag| tag.tag.name);
        sim_assert_eq!(latest.as_deref(), Some("v0.10.0"));
        Ok(())
    }

    async fn found_config(
        dir: &Path,
        config_file: Option<&Path>,
    ) -> eyre::Result<Option<(ConfigFile, Option<RepoSlug>)>> {
        let printer = Printer::buffered();
        let found = find_config(dir, config_file, &printer).await?;
        Ok(found.map(|(config_file, config)| (config_file, config.global.repo)))
    }

    #[tokio::test]
    async fn find_config_in_directory() -> eyre::Result<()> {
        init();
        let dir = tempfile::TempDir::new()?;
        sim_assert_eq!(found_config(dir.path(), None).await?, None);

        // a pyproject.toml without a bumper table is skipped
        std::fs::write(
            dir.path().join("pyproject.toml"),
            indoc! {r#"
                [project]
                name = "bumper"
            "#},
        )?;
        sim_assert_eq!(found_config(dir.path(), None).await?, None);

        std::fs::write(
            dir.path().join("pyproject.toml"),
            indoc! {r#"
                [tool.bumper]
                repo = "duncancreek/pyproject"
            "#},
        )?;
        sim_assert_eq!(
            found_config(dir.path(), None).await?,
            Some((
                ConfigFile::PyProject(dir.path().join("pyproject.toml")),
                Some("duncancreek/pyproject".parse()?)
            ))
        );

        std::fs::write(
            dir.path().join("bumper.toml"),
            indoc! {r#"
                [bumper]
                repo = "duncancreek/bumper-toml"
            "#},
        )?;
        sim_assert_eq!(
            found_config(dir.path(), None).await?,
            Some((
                ConfigFile::BumperToml(dir.path().join("bumper.toml")),
                Some("duncancreek/bumper-toml".parse()?)
            ))
        );

        std::fs::write(
            dir.path().join(".bumper.toml"),
            indoc! {r#"
                [bumper]
                repo = "duncancreek/hidden"
            "#},
        )?;
        sim_assert_eq!(
            found_config(dir.path(), None).await?,
            Some((
                ConfigFile::BumperToml(dir.path().join(".bumper.toml")),
                Some("duncancreek/hidden".parse()?)
            ))
        );
        Ok(())
    }

    #[tokio::test]
    async fn find_explicit_config_file() -> eyre::Result<()> {
        init();
        let dir = tempfile::TempDir::new()?;
        std::fs::write(
            dir.path().join(".bumper.toml"),
            indoc! {r#"
                [bumper]
                repo = "duncancreek/hidden"
            "#},
        )?;

        let printer = Printer::buffered();
        let res = find_config(dir.path(), Some(Path::new("release.toml")), &printer).await;
        assert!(matches!(res, Err(config::Error::Io { .. })));

        std::fs::write(
            dir.path().join("release.toml"),
            indoc! {r#"
                [bumper]
                repo = "duncancreek/release"
            "#},
        )?;
        sim_assert_eq!(
            found_config(dir.path(), Some(Path::new("release.toml"))).await?,
            Some((
                ConfigFile::BumperToml(dir.path().join("release.toml")),
                Some("duncancreek/release".parse()?)
            ))
        );
        Ok(())
    }
}
