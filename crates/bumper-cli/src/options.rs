use bumper::{config, f_string::FormatString, repo::RepoSlug};
use clap::Parser;
use color_eyre::eyre::{self, WrapErr};
use std::path::PathBuf;

/// Logging flags to `#[command(flatten)]` into your CLI
#[derive(clap::Args, Debug, Clone, Copy, Default)]
pub struct Verbosity {
    #[arg(
        long,
        short = 'v',
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase logging verbosity",
        long_help = None,
    )]
    pub verbose: u8,

    #[arg(
        long,
        short = 'q',
        action = clap::ArgAction::Count,
        global = true,
        help = "Decrease logging verbosity",
        long_help = None,
        conflicts_with = "verbose",
    )]
    pub quiet: u8,
}

impl Verbosity {
    /// Verbosity of the user facing output.
    ///
    /// Output is on by default, `-q` silences it.
    pub fn level(self) -> bumper::logging::Verbosity {
        if self.quiet > 0 {
            bumper::logging::Verbosity::Off
        } else {
            self.verbose.saturating_add(1).into()
        }
    }
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct BumpOptions {
    #[arg(help = "version component to bump (e.g. major, minor or patch)")]
    pub component: Option<String>,

    #[arg(
        long = "new-version",
        help = "use this version instead of bumping a component",
        conflicts_with = "component",
        required_unless_present = "component",
        env = "BUMPER_NEW_VERSION"
    )]
    pub new_version: Option<String>,

    #[arg(
        long = "ref",
        help = "branch, tag or commit to tag (defaults to the default branch)",
        env = "BUMPER_REF"
    )]
    pub reference: Option<String>,

    #[arg(
        long = "lightweight",
        help = "create a lightweight tag without tag message",
        env = "BUMPER_LIGHTWEIGHT",
        action = clap::ArgAction::SetTrue,
    )]
    pub lightweight: Option<bool>,

    #[arg(
        short = 'm',
        long = "message",
        help = "tag message template",
        env = "BUMPER_TAG_MESSAGE"
    )]
    pub message: Option<String>,

    #[arg(
        long = "allow-same-commit",
        help = "tag a commit even if it already carries the latest version tag",
        env = "BUMPER_ALLOW_SAME_COMMIT",
        action = clap::ArgAction::SetTrue,
    )]
    pub allow_same_commit: Option<bool>,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// List version tags, highest version first
    List {
        #[arg(long = "all", help = "list all tags, not only version tags")]
        all: bool,
        #[arg(long = "json", help = "print as JSON")]
        json: bool,
    },
    /// Print the latest version
    Latest {
        #[arg(long = "json", help = "print as JSON")]
        json: bool,
    },
    /// Bump the latest version and tag the result
    Bump(BumpOptions),
    /// Create a tag
    Create {
        name: String,
        #[arg(long = "ref", help = "branch, tag or commit to tag")]
        reference: Option<String>,
        #[arg(short = 'm', long = "message", help = "tag message (lightweight tag if omitted)")]
        message: Option<String>,
        #[arg(short = 'f', long = "force", help = "move the tag if it already exists")]
        force: bool,
    },
    /// Move an existing tag to another ref
    Move {
        name: String,
        #[arg(long = "ref", help = "branch, tag or commit to move the tag to")]
        reference: String,
    },
    /// Delete tags
    Delete {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(Parser, Debug, Clone)]
#[clap(
    name = "bumper",
    version = option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"),
    about = "manipulate version tags on GitHub hosted repos",
)]
pub struct Options {
    #[clap(
        long = "repo",
        help = "repository as owner/name or remote URL",
        env = "BUMPER_REPO"
    )]
    pub repo: Option<String>,

    #[clap(
        long = "token",
        help = "GitHub API token (falls back to GITHUB_TOKEN)",
        env = "BUMPER_TOKEN",
        hide_env_values = true
    )]
    pub token: Option<String>,

    #[clap(
        long = "api-url",
        help = "base URL of the GitHub REST API",
        env = "BUMPER_API_URL"
    )]
    pub api_url: Option<String>,

    #[clap(
        long = "dir",
        help = "directory to search for config files",
        env = "BUMPER_DIR"
    )]
    pub dir: Option<PathBuf>,

    #[clap(
        long = "config-file",
        help = "config file to read most of the variables from",
        env = "BUMPER_CONFIG_FILE"
    )]
    pub config_file: Option<PathBuf>,

    #[clap(
        long = "tag-name",
        help = "tag name template",
        env = "BUMPER_TAG_NAME"
    )]
    pub tag_name: Option<String>,

    #[clap(
        long = "parse",
        help = "regex parsing the version string",
        env = "BUMPER_PARSE"
    )]
    pub parse_pattern: Option<String>,

    #[clap(
        long = "serialize",
        help = "how to format what is parsed back to a version",
        env = "BUMPER_SERIALIZE"
    )]
    pub serialize: Vec<String>,

    #[clap(
        short = 'n',
        long = "dry-run",
        help = "don't create, move or delete any tags, just pretend",
        env = "BUMPER_DRY_RUN",
        action = clap::ArgAction::SetTrue,
        global = true
    )]
    pub dry_run: Option<bool>,

    #[arg(
        long = "color",
        env = "BUMPER_COLOR",
        help = "enable or disable color"
    )]
    pub color_choice: Option<termcolor::ColorChoice>,

    #[command(flatten)]
    pub verbosity: Verbosity,

    #[arg(
        long = "log",
        env = "BUMPER_LOG_LEVEL",
        aliases = ["log-level"],
        help = "Log level. When using a more sophisticated logging setup using RUST_LOG environment variable, this option is overwritten."
    )]
    pub log_level: Option<tracing::metadata::Level>,

    #[arg(
        long = "log-format",
        env = "BUMPER_LOG_FORMAT",
        help = "log format (json, pretty or pretty-compact)"
    )]
    pub log_format: Option<crate::logging::LogFormat>,

    #[clap(subcommand)]
    pub command: Command,
}

/// Fix flags that clap sets to `Some(false)` when they are not given.
///
/// `clap::ArgAction::SetTrue` does not allow `--flag=false`, so `Some(false)` always means unset.
pub fn fix(options: &mut Options) {
    fn unset_false(flag: &mut Option<bool>) {
        if *flag != Some(true) {
            *flag = None;
        }
    }
    unset_false(&mut options.dry_run);
    if let Command::Bump(bump) = &mut options.command {
        unset_false(&mut bump.lightweight);
        unset_false(&mut bump.allow_same_commit);
    }
}

/// The API token from `--token`, `BUMPER_TOKEN` or `GITHUB_TOKEN`.
pub fn token(options: &Options) -> Option<String> {
    options
        .token
        .clone()
        .or_else(|| std::env::var("GITHUB_TOKEN").ok())
        .filter(|token| !token.trim().is_empty())
}

/// Config overrides given on the command line.
///
/// # Errors
/// If any of the values is invalid.
pub fn global_cli_config(options: &Options) -> eyre::Result<config::GlobalConfig> {
    let repo = options
        .repo
        .as_deref()
        .map(str::parse::<RepoSlug>)
        .transpose()?;
    let tag_name = options
        .tag_name
        .as_deref()
        .map(FormatString::parse)
        .transpose()
        .wrap_err("invalid tag name")?;
    if let Some(tag_name) = &tag_name {
        if !tag_name.named_arguments().any(|arg| arg == "new_version") {
            eyre::bail!("tag name {tag_name:?} must contain {{new_version}}");
        }
    }
    let parse_version_pattern = options
        .parse_pattern
        .as_deref()
        .map(config::regex::Regex::try_from)
        .transpose()
        .wrap_err("invalid parse pattern")?;
    let serialize_version_patterns = if options.serialize.is_empty() {
        None
    } else {
        let patterns = options
            .serialize
            .iter()
            .map(|pattern| FormatString::parse(pattern))
            .collect::<Result<Vec<_>, _>>()
            .wrap_err("invalid serialize pattern")?;
        Some(patterns)
    };

    let mut global = config::GlobalConfig {
        repo,
        api_url: options.api_url.clone(),
        parse_version_pattern,
        serialize_version_patterns,
        tag_name,
        dry_run: options.dry_run,
        ..config::GlobalConfig::default()
    };

    if let Command::Bump(bump) = &options.command {
        global.default_ref.clone_from(&bump.reference);
        global.lightweight = bump.lightweight;
        global.allow_same_commit = bump.allow_same_commit;
        global.tag_message = bump
            .message
            .as_deref()
            .map(FormatString::parse)
            .transpose()
            .wrap_err("invalid tag message")?;
    }
    Ok(global)
}
