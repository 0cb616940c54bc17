//! Format strings with `{name}` placeholders.
//!
//! Used for tag names (`v{new_version}`), tag messages and version serialization
//! patterns (`{major}.{minor}.{patch}`). Doubled braces (`{{`, `}}`) are literal braces.
pub use parser::ParseError;
use std::collections::HashMap;

/// A segment of a format string: either literal text or a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    String(String),
    Argument(String),
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => write!(f, "{}", s.replace('{', "{{").replace('}', "}}")),
            Self::Argument(arg) => write!(f, "{{{arg}}}"),
        }
    }
}

impl Value {
    /// The placeholder name, if this is a placeholder.
    ///
    /// # Examples
    /// ```
    /// use bumper::f_string::Value;
    /// assert_eq!(Value::Argument("x".to_string()).as_argument(), Some("x"));
    /// assert_eq!(Value::String("x".to_string()).as_argument(), None);
    /// ```
    #[must_use]
    pub fn as_argument(&self) -> Option<&str> {
        match self {
            Self::Argument(arg) => Some(arg),
            Self::String(_) => None,
        }
    }
}

impl<'a> From<parser::Value<'a>> for Value {
    fn from(value: parser::Value<'a>) -> Self {
        match value {
            parser::Value::String(s) => Self::String(s),
            parser::Value::Argument(s) => Self::Argument(s.to_string()),
        }
    }
}

pub mod parser {
    //! `winnow` parser splitting a format string into text and placeholders.
    use winnow::combinator::{alt, delimited, repeat};
    use winnow::error::InputError;
    use winnow::prelude::*;
    use winnow::token::take_while;

    #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub enum Value<'a> {
        String(String),
        Argument(&'a str),
    }

    #[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
    #[error("invalid format string: {format_string:?}")]
    pub struct ParseError {
        pub format_string: String,
    }

    fn any_except_curly_bracket0<'a>(s: &mut &'a str) -> ModalResult<&'a str, InputError<&'a str>> {
        take_while(0.., |c| c != '{' && c != '}').parse_next(s)
    }

    fn any_except_curly_bracket1<'a>(s: &mut &'a str) -> ModalResult<&'a str, InputError<&'a str>> {
        take_while(1.., |c| c != '{' && c != '}').parse_next(s)
    }

    fn text<'a>(s: &mut &'a str) -> ModalResult<String, InputError<&'a str>> {
        repeat(
            1..,
            alt((any_except_curly_bracket1, "{{".value("{"), "}}".value("}"))),
        )
        .fold(String::new, |mut string, c| {
            string.push_str(c);
            string
        })
        .parse_next(s)
    }

    fn argument<'a>(s: &mut &'a str) -> ModalResult<Value<'a>, InputError<&'a str>> {
        delimited("{", any_except_curly_bracket0, "}")
            .map(|arg: &'a str| Value::Argument(arg.trim()))
            .parse_next(s)
    }

    fn text_or_argument<'a>(s: &mut &'a str) -> ModalResult<Value<'a>, InputError<&'a str>> {
        alt((text.map(Value::String), argument)).parse_next(s)
    }

    /// Parse a format string into a sequence of `Value` segments.
    ///
    /// # Errors
    /// When the format string contains an unbalanced brace.
    pub fn parse_format_arguments(value: &str) -> Result<Vec<Value<'_>>, ParseError> {
        repeat(0.., text_or_argument)
            .parse(value)
            .map_err(|_| ParseError {
                format_string: value.to_string(),
            })
    }

}

/// A parsed format string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FormatString(pub Vec<Value>);

impl std::fmt::Display for FormatString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for value in &self.0 {
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

impl FromIterator<Value> for FormatString {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl AsRef<[Value]> for FormatString {
    fn as_ref(&self) -> &[Value] {
        &self.0
    }
}

impl std::str::FromStr for FormatString {
    type Err = ParseError;
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, PartialOrd, Hash)]
pub enum FormatError {
    #[error("missing argument {0:?}")]
    MissingArgument(String),
    #[error("invalid timestamp format {format:?} in argument {argument:?}")]
    InvalidTimestampFormat { argument: String, format: String },
}

/// Render the RFC3339 timestamp `value` using the `strftime` style `format`.
///
/// Returns `None` if `value` is not a timestamp.
fn format_timestamp(
    argument: &str,
    value: &str,
    format: &str,
) -> Option<Result<String, FormatError>> {
    use chrono::format::{Item, StrftimeItems};
    use std::fmt::Write;

    let timestamp = chrono::DateTime::parse_from_rfc3339(value).ok()?;
    let invalid = || FormatError::InvalidTimestampFormat {
        argument: argument.to_string(),
        format: format.to_string(),
    };
    let items = StrftimeItems::new(format);
    if items.clone().any(|item| matches!(item, Item::Error)) {
        return Some(Err(invalid()));
    }
    let mut rendered = String::new();
    Some(
        write!(rendered, "{}", timestamp.format_with_items(items))
            .map(|()| rendered)
            .map_err(|_| invalid()),
    )
}

impl FormatString {
    /// Parse a format string.
    ///
    /// # Errors
    /// When the format string contains an unbalanced brace.
    pub fn parse(value: &str) -> Result<Self, ParseError> {
        let arguments = parser::parse_format_arguments(value)?;
        Ok(Self(arguments.into_iter().map(Into::into).collect()))
    }

    /// Render the format string using the values in `ctx`.
    ///
    /// An argument of the form `{name:format}` whose `name` holds a RFC3339 timestamp
    /// is rendered using the `strftime` style `format`, e.g. `{utcnow:%Y-%m-%d}`.
    ///
    /// # Errors
    /// - In `strict` mode, when an argument is missing from `ctx`.
    ///   Otherwise, missing arguments render as empty strings.
    /// - When the `strftime` format of a timestamp argument is invalid.
    pub fn format<K, V, S>(
        &self,
        ctx: &HashMap<K, V, S>,
        strict: bool,
    ) -> Result<String, FormatError>
    where
        K: std::borrow::Borrow<str> + std::hash::Hash + Eq,
        V: AsRef<str>,
        S: std::hash::BuildHasher,
    {
        self.0.iter().try_fold(String::new(), |mut acc, value| {
            match value {
                Value::String(s) => acc.push_str(s),
                Value::Argument(arg) => {
                    let as_timestamp = || {
                        let (name, format) = arg.split_once(':')?;
                        let value = ctx.get(name)?;
                        format_timestamp(arg, value.as_ref(), format)
                    };
                    let value = ctx
                        .get(arg.as_str())
                        .map(|value| Ok(value.as_ref().to_string()))
                        .or_else(as_timestamp)
                        .transpose()?;
                    match value {
                        Some(value) => acc.push_str(&value),
                        None if strict => return Err(FormatError::MissingArgument(arg.clone())),
                        None => {}
                    }
                }
            }
            Ok(acc)
        })
    }

    pub fn named_arguments(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(Value::as_argument)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    /// Split the format string around the first occurrence of `argument`.
    ///
    /// Returns `None` if the argument is not part of the format string.
    #[must_use]
    pub fn split_at_argument(&self, argument: &str) -> Option<(&[Value], &[Value])> {
        let idx = self
            .0
            .iter()
            .position(|value| value.as_argument() == Some(argument))?;
        Some((&self.0[..idx], &self.0[idx + 1..]))
    }
}
