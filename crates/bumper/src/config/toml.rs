//! Parsing of `[bumper]` tables in TOML config files.
use crate::{
    config::{self, global::GlobalConfig, version::VersionComponentSpec, Config},
    diagnostics::Span,
    f_string::FormatString,
};
use indexmap::IndexMap;
use toml_span as toml;

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("{message}")]
    InvalidConfiguration { message: String, span: Span },
    #[error("{message}")]
    UnexpectedType {
        message: String,
        expected: Vec<ValueKind>,
        found: ValueKind,
        span: Span,
    },
    #[error("{message}")]
    InvalidFormatString {
        #[source]
        source: crate::f_string::ParseError,
        message: String,
        span: Span,
    },
    #[error("{message}")]
    InvalidRegex {
        #[source]
        source: regex::Error,
        message: String,
        span: Span,
    },
    #[error("{message}")]
    InvalidRepo {
        #[source]
        source: crate::repo::Error,
        message: String,
        span: Span,
    },
    #[error("{source}")]
    Toml {
        #[source]
        source: toml_span::Error,
    },
}

mod diagnostics {
    use crate::diagnostics::{Span, ToDiagnostics};
    use codespan_reporting::diagnostic::{Diagnostic, Label};

    fn invalid_value<F: Copy>(
        file_id: F,
        title: &str,
        source: &dyn std::error::Error,
        message: &str,
        span: &Span,
    ) -> Diagnostic<F> {
        Diagnostic::error()
            .with_message(title.to_string())
            .with_labels(vec![
                Label::primary(file_id, span.clone()).with_message(source.to_string()),
                Label::secondary(file_id, span.clone()).with_message(message),
            ])
    }

    impl ToDiagnostics for super::ParseError {
        fn to_diagnostics<F: Copy + PartialEq>(&self, file_id: F) -> Vec<Diagnostic<F>> {
            match self {
                Self::InvalidFormatString {
                    source,
                    message,
                    span,
                } => vec![invalid_value(
                    file_id,
                    "invalid format string",
                    source,
                    message,
                    span,
                )],
                Self::InvalidRegex {
                    source,
                    message,
                    span,
                } => vec![invalid_value(
                    file_id,
                    "invalid regular expression",
                    source,
                    message,
                    span,
                )],
                Self::InvalidRepo {
                    source,
                    message,
                    span,
                } => vec![invalid_value(
                    file_id,
                    "invalid repository",
                    source,
                    message,
                    span,
                )],
                Self::InvalidConfiguration { message, span } => vec![Diagnostic::error()
                    .with_message("invalid configuration".to_string())
                    .with_labels(vec![
                        Label::secondary(file_id, span.clone()).with_message(message)
                    ])],
                Self::UnexpectedType {
                    expected,
                    found,
                    span,
                    ..
                } => {
                    let expected = expected
                        .iter()
                        .map(|ty| format!("`{ty:?}`"))
                        .collect::<Vec<_>>()
                        .join(", or ");
                    let diagnostic = Diagnostic::error()
                        .with_message(self.to_string())
                        .with_labels(vec![Label::primary(file_id, span.clone())
                            .with_message(format!("expected {expected}"))])
                        .with_notes(vec![unindent::unindent(&format!(
                            "
                        expected type {expected}
                           found type `{found:?}`
                        "
                        ))]);
                    vec![diagnostic]
                }
                Self::Toml { source } => {
                    vec![source.to_diagnostic(file_id)]
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueKind {
    String,
    Integer,
    Float,
    Boolean,
    Array,
    Table,
}

impl<'de> From<&toml_span::Value<'de>> for ValueKind {
    fn from(value: &toml_span::Value<'de>) -> Self {
        value.as_ref().into()
    }
}

impl<'de> From<&toml_span::value::ValueInner<'de>> for ValueKind {
    fn from(value: &toml_span::value::ValueInner<'de>) -> Self {
        use toml_span::value::ValueInner;
        match value {
            ValueInner::String(..) => ValueKind::String,
            ValueInner::Integer(..) => ValueKind::Integer,
            ValueInner::Float(..) => ValueKind::Float,
            ValueInner::Boolean(..) => ValueKind::Boolean,
            ValueInner::Array(..) => ValueKind::Array,
            ValueInner::Table(..) => ValueKind::Table,
        }
    }
}

/// A single value or an array of values.
#[must_use]
pub fn as_array<'de>(value: &'de toml::Value<'de>) -> Vec<&'de toml::Value<'de>> {
    match value.as_ref() {
        toml::value::ValueInner::Array(array) => array.iter().collect(),
        _ => vec![value],
    }
}

pub fn as_string_array<'de>(value: &'de toml::Value<'de>) -> Result<Vec<String>, ParseError> {
    as_array(value).into_iter().map(as_string).collect()
}

pub fn as_str<'de>(value: &'de toml::Value<'de>) -> Result<&'de str, ParseError> {
    value.as_str().ok_or_else(|| ParseError::UnexpectedType {
        message: "expected a string".to_string(),
        expected: vec![ValueKind::String],
        found: value.into(),
        span: value.span.into(),
    })
}

pub fn as_string<'de>(value: &'de toml::Value<'de>) -> Result<String, ParseError> {
    as_str(value).map(ToString::to_string)
}

pub fn as_bool<'de>(value: &'de toml::Value<'de>) -> Result<bool, ParseError> {
    value.as_bool().ok_or_else(|| ParseError::UnexpectedType {
        message: "expected a boolean".to_string(),
        expected: vec![ValueKind::Boolean],
        found: value.into(),
        span: value.span.into(),
    })
}

pub fn as_format_string<'de>(value: &'de toml::Value<'de>) -> Result<FormatString, ParseError> {
    as_str(value).and_then(|s| {
        FormatString::parse(s).map_err(|source| ParseError::InvalidFormatString {
            source,
            message: "invalid format string".to_string(),
            span: value.span.into(),
        })
    })
}

pub fn as_regex<'de>(value: &'de toml::Value<'de>) -> Result<config::regex::Regex, ParseError> {
    as_str(value).and_then(|s| {
        regex::Regex::new(s)
            .map(Into::into)
            .map_err(|source| ParseError::InvalidRegex {
                source,
                message: format!("invalid regular expression: {s:?}"),
                span: value.span.into(),
            })
    })
}

pub fn as_repo<'de>(value: &'de toml::Value<'de>) -> Result<crate::repo::RepoSlug, ParseError> {
    as_str(value).and_then(|s| {
        s.parse().map_err(|source| ParseError::InvalidRepo {
            source,
            message: "expected `owner/name` or a GitHub URL".to_string(),
            span: value.span.into(),
        })
    })
}

fn as_table<'de>(
    value: &'de toml::Value<'de>,
    what: &str,
) -> Result<&'de toml::value::Table<'de>, ParseError> {
    value.as_table().ok_or_else(|| ParseError::UnexpectedType {
        message: format!("{what} must be a table"),
        expected: vec![ValueKind::Table],
        found: value.into(),
        span: value.span.into(),
    })
}

pub(crate) fn parse_part_config<'de>(
    value: &'de toml::Value<'de>,
) -> Result<VersionComponentSpec, ParseError> {
    let table = as_table(value, "part config")?;
    let independent = table.get("independent").map(as_bool).transpose()?;
    let optional_value = table.get("optional_value").map(as_string).transpose()?;
    let first_value = table.get("first_value").map(as_string).transpose()?;
    let depends_on = table.get("depends_on").map(as_string).transpose()?;
    let values = table
        .get("values")
        .map(as_string_array)
        .transpose()?
        .unwrap_or_default();

    if let (Some(first_value), false) = (&first_value, values.is_empty()) {
        if !values.contains(first_value) {
            return Err(ParseError::InvalidConfiguration {
                message: format!("first value {first_value:?} is not one of {values:?}"),
                span: value.span.into(),
            });
        }
    }

    Ok(VersionComponentSpec {
        independent,
        optional_value,
        values,
        first_value,
        depends_on,
    })
}

pub(crate) fn parse_global_config<'de>(
    table: &'de toml::value::Table<'de>,
) -> Result<GlobalConfig, ParseError> {
    let repo = table.get("repo").map(as_repo).transpose()?;
    let api_url = table.get("api_url").map(as_string).transpose()?;
    let parse_version_pattern = table.get("parse").map(as_regex).transpose()?;
    let serialize_version_patterns = table
        .get("serialize")
        .map(as_array)
        .map(|patterns| {
            patterns
                .into_iter()
                .map(as_format_string)
                .collect::<Result<_, _>>()
        })
        .transpose()?;
    let tag_name = table.get("tag_name").map(as_format_string).transpose()?;
    let tag_message = table.get("tag_message").map(as_format_string).transpose()?;
    let initial_version = table.get("initial_version").map(as_string).transpose()?;
    let default_ref = table
        .get("default_ref")
        .or(table.get("ref"))
        .map(as_string)
        .transpose()?;
    let lightweight = table.get("lightweight").map(as_bool).transpose()?;
    let allow_same_commit = table.get("allow_same_commit").map(as_bool).transpose()?;
    let dry_run = table.get("dry_run").map(as_bool).transpose()?;
    let tagger_name = table.get("tagger_name").map(as_string).transpose()?;
    let tagger_email = table.get("tagger_email").map(as_string).transpose()?;

    if let Some(value) = table.get("tag_name") {
        let has_new_version = tag_name
            .as_ref()
            .is_some_and(|tag_name| tag_name.named_arguments().any(|arg| arg == "new_version"));
        if !has_new_version {
            return Err(ParseError::InvalidConfiguration {
                message: "tag name must contain `{new_version}`".to_string(),
                span: value.span.into(),
            });
        }
    }

    Ok(GlobalConfig {
        repo,
        api_url,
        parse_version_pattern,
        serialize_version_patterns,
        tag_name,
        tag_message,
        initial_version,
        default_ref,
        lightweight,
        allow_same_commit,
        dry_run,
        tagger_name,
        tagger_email,
    })
}

/// Where the `bumper` table lives in a TOML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TablePath {
    /// `[bumper]`
    Root,
    /// `[tool.bumper]`
    Tool,
}

impl Config {
    /// Read the `bumper` table of a parsed TOML document.
    ///
    /// Returns `None` if the document contains no (or an empty) `bumper` table.
    pub fn from_toml_value(
        config: &toml::Value<'_>,
        table_path: TablePath,
    ) -> Result<Option<Self>, ParseError> {
        let root = config.as_table();
        let root = match table_path {
            TablePath::Root => root,
            TablePath::Tool => root
                .and_then(|table| table.get("tool"))
                .and_then(|tool| tool.as_table()),
        };
        let Some(config) = root.and_then(|table| table.get("bumper")) else {
            return Ok(None);
        };

        let table = as_table(config, "bumper config")?;
        if table.is_empty() {
            return Ok(None);
        }

        let global = parse_global_config(table)?;

        let components = match table.get("parts") {
            None => IndexMap::new(),
            Some(value) => as_table(value, "parts")?
                .iter()
                .map(|(key, value)| Ok((key.name.to_string(), parse_part_config(value)?)))
                .collect::<Result<IndexMap<String, VersionComponentSpec>, ParseError>>()?,
        };

        Ok(Some(Self { global, components }))
    }

    /// Parse a TOML config file.
    ///
    /// # Errors
    /// When the file is not valid TOML or the `bumper` table is invalid.
    pub fn from_toml(config: &str, table_path: TablePath) -> Result<Option<Self>, ParseError> {
        let config = toml_span::parse(config).map_err(|source| ParseError::Toml { source })?;
        Self::from_toml_value(&config, table_path)
    }
}
