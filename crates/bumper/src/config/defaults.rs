use crate::f_string::{FormatString, Value};
use once_cell::sync::Lazy;

pub const API_URL: &str = "https://api.github.com";

pub const PARSE_VERSION_PATTERN: &str = r"(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)";

pub static PARSE_VERSION_REGEX: Lazy<super::regex::Regex> = Lazy::new(|| {
    regex::RegexBuilder::new(PARSE_VERSION_PATTERN)
        .build()
        .map(Into::into)
        .expect("default parse pattern is a valid regex")
});

pub static SERIALIZE_VERSION_PATTERNS: Lazy<Vec<FormatString>> = Lazy::new(|| {
    vec![FormatString(vec![
        Value::Argument("major".to_string()),
        Value::String(".".to_string()),
        Value::Argument("minor".to_string()),
        Value::String(".".to_string()),
        Value::Argument("patch".to_string()),
    ])]
});

pub static TAG_NAME: Lazy<FormatString> = Lazy::new(|| {
    [
        Value::String("v".to_string()),
        Value::Argument("new_version".to_string()),
    ]
    .into_iter()
    .collect()
});

pub static TAG_MESSAGE: Lazy<FormatString> = Lazy::new(|| {
    FormatString(vec![
        Value::String("Bump version: ".to_string()),
        Value::Argument("current_version".to_string()),
        Value::String(" → ".to_string()),
        Value::Argument("new_version".to_string()),
    ])
});

pub const INITIAL_VERSION: &str = "0.0.0";

pub const LIGHTWEIGHT: bool = false;
pub const ALLOW_SAME_COMMIT: bool = false;
pub const DRY_RUN: bool = false;
