//! User facing output, gated by verbosity.
use crate::{api::RemoteTag, version::Version};
use colored::{Color, Colorize};

/// Controls level of detail emitted by loggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Verbosity {
    /// No logs will be emitted.
    Off = 0,
    /// Minimal output, e.g. current and new version and the created tag.
    Low = 1,
    /// Version components and tag details.
    Medium = 2,
    /// Verbose debug-level output.
    High = 3,
}

impl From<u8> for Verbosity {
    fn from(value: u8) -> Self {
        match value {
            0 => Verbosity::Off,
            1 => Verbosity::Low,
            2 => Verbosity::Medium,
            _ => Verbosity::High,
        }
    }
}

/// A no-op logger implementation.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoOpLogger {}

impl Log for NoOpLogger {
    fn log(&self, _: Verbosity, _: &str) {}
}

pub trait Log {
    /// Log a message if `verbosity` is within the configured level.
    fn log(&self, verbosity: Verbosity, message: &str);
}

/// What happened (or would happen) to a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagAction {
    Create,
    Move,
    Delete,
    Skip,
}

impl TagAction {
    fn label(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Move => "  move",
            Self::Delete => "delete",
            Self::Skip => "  skip",
        }
    }

    fn color(self) -> Color {
        match self {
            Self::Create => Color::Green,
            Self::Move => Color::Yellow,
            Self::Delete => Color::Red,
            Self::Skip => Color::BrightBlack,
        }
    }
}

pub trait LogExt {
    /// Log a section header, e.g. `[current version]`.
    fn log_section(&self, title: &str, color: Color);

    /// Log a version with its components.
    fn log_version(&self, title: &str, serialized: &str, version: Option<&Version>);

    /// Log a tag operation.
    fn log_tag(&self, action: TagAction, tag: &RemoteTag, message: Option<&str>, dry_run: bool);
}

impl<T> LogExt for T
where
    T: Log,
{
    fn log_section(&self, title: &str, color: Color) {
        self.log(
            Verbosity::Low,
            &format!("{}", format!("[{title}]").color(color)),
        );
    }

    fn log_version(&self, title: &str, serialized: &str, version: Option<&Version>) {
        self.log_section(title, Color::Blue);
        self.log(Verbosity::Low, &format!("\t{}", serialized.yellow().bold()));
        if let Some(version) = version {
            self.log(
                Verbosity::Medium,
                &format!("\t{}", format_version(version, Color::Cyan)),
            );
        }
    }

    fn log_tag(&self, action: TagAction, tag: &RemoteTag, message: Option<&str>, dry_run: bool) {
        let suffix = if dry_run {
            format!(" {}", "(dry run)".dimmed())
        } else {
            String::new()
        };
        self.log(
            Verbosity::Low,
            &format!(
                "\t{} {} {} {}{suffix}",
                action.label().color(action.color()),
                tag.name.yellow(),
                "→".dimmed(),
                short_sha(&tag.commit_sha).cyan(),
            ),
        );
        if let Some(message) = message {
            self.log(
                Verbosity::Medium,
                &format!("\t{}{}", "message = ".dimmed(), message.yellow()),
            );
        }
    }
}

/// First 7 characters of a commit SHA.
#[must_use]
pub fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

pub(crate) fn format_version(version: &Version, color: Color) -> String {
    version
        .iter()
        .map(|(comp_name, value)| format!("{}={}", comp_name.color(color), value.value()))
        .collect::<Vec<_>>()
        .join("  ")
}
