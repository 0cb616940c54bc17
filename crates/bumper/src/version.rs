use crate::{
    config::version::{VersionComponentConfigs, VersionComponentSpec},
    f_string::FormatString,
};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// Raw representation of parsed version segments.
///
/// Maps component names (e.g., "major", "minor") to their string values.
pub type RawVersion<'a> = HashMap<&'a str, &'a str>;

/// Numeric parsing and bumping of version components.
pub mod numeric {
    /// Matches the first number with its prefix and suffix.
    pub static FIRST_NUMERIC_REGEX: once_cell::sync::Lazy<regex::Regex> =
        once_cell::sync::Lazy::new(|| {
            regex::RegexBuilder::new(r"^(?P<prefix>[^0-9]*)(?P<number>\d+)(?P<suffix>.*)$")
                .build()
                .expect("valid numeric regex")
        });

    #[derive(thiserror::Error, Debug, PartialEq, Eq)]
    pub enum Error {
        #[error("version component {0:?} does not contain any digit")]
        MissingDigit(String),
        #[error("{value:?} is not a valid number")]
        InvalidNumber {
            #[source]
            source: std::num::ParseIntError,
            value: String,
        },
        #[error("{value:?} is lower than the first value {first_value:?} and cannot be bumped")]
        LessThanFirstValue { first_value: usize, value: usize },
        #[error("version component {component:?} exceeds bounds and cannot be bumped")]
        OutOfBounds { component: usize },
    }

    /// Split `value` into the prefix, the first number, and the suffix.
    ///
    /// # Errors
    /// If `value` contains no digits or the number does not fit into `usize`.
    pub fn split(value: &str) -> Result<(&str, usize, &str), Error> {
        let captures = FIRST_NUMERIC_REGEX
            .captures(value)
            .ok_or_else(|| Error::MissingDigit(value.to_string()))?;
        let group = |name| captures.name(name).map_or("", |m| m.as_str());
        let number = group("number");
        let number = number.parse().map_err(|source| Error::InvalidNumber {
            source,
            value: number.to_string(),
        })?;
        Ok((group("prefix"), number, group("suffix")))
    }

    /// Bumps the first number of a numeric component.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NumericFunction {
        /// Minimum value allowed for the numeric component.
        pub first_value: usize,
    }

    impl NumericFunction {
        /// # Errors
        /// If `first_value` is not a number.
        pub fn new(first_value: &str) -> Result<Self, Error> {
            let (_, first_value, _) = split(first_value)?;
            Ok(Self { first_value })
        }

        /// Increase the first number in `value` by one.
        ///
        /// # Errors
        /// If `value` has no number, is lower than the first value, or would overflow.
        pub fn bump(&self, value: &str) -> Result<String, Error> {
            let (prefix, number, suffix) = split(value)?;
            if number < self.first_value {
                return Err(Error::LessThanFirstValue {
                    first_value: self.first_value,
                    value: number,
                });
            }
            let bumped = number
                .checked_add(1)
                .ok_or(Error::OutOfBounds { component: number })?;
            Ok(format!("{prefix}{bumped}{suffix}"))
        }
    }
}

/// Bumping of components with a fixed list of values.
pub mod values {
    #[derive(thiserror::Error, Debug, PartialEq, Eq)]
    pub enum Error {
        #[error("{value:?} must be one of {values:?}")]
        InvalidValue { value: String, values: Vec<String> },
        #[error("{value:?} is already the maximum value among {values:?} and cannot be bumped")]
        MaxValue { value: String, values: Vec<String> },
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ValuesFunction<'a> {
        pub values: &'a [String],
    }

    impl ValuesFunction<'_> {
        /// Return the value after `value` in the list.
        ///
        /// # Errors
        /// If `value` is not part of the list or is the last value.
        pub fn bump(&self, value: &str) -> Result<String, Error> {
            let idx = self.values.iter().position(|v| v == value).ok_or_else(|| {
                Error::InvalidValue {
                    value: value.to_string(),
                    values: self.values.to_vec(),
                }
            })?;
            self.values
                .get(idx + 1)
                .cloned()
                .ok_or_else(|| Error::MaxValue {
                    value: value.to_string(),
                    values: self.values.to_vec(),
                })
        }
    }
}

/// Errors that can occur when bumping a version component.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum BumpError {
    #[error(transparent)]
    Numeric(#[from] numeric::Error),
    #[error(transparent)]
    Values(#[from] values::Error),
    #[error("invalid version component {0:?}")]
    InvalidComponent(String),
}

/// A single version component, combining a value and its specification.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Component {
    value: Option<String>,
    spec: VersionComponentSpec,
}

impl AsRef<str> for Component {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

/// Sort key of a component value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Rank<'a> {
    Position(usize),
    Numeric(usize, &'a str),
    Text(&'a str),
}

impl Component {
    #[must_use]
    pub fn new(value: Option<&str>, spec: VersionComponentSpec) -> Self {
        Self {
            value: value.map(ToString::to_string),
            spec,
        }
    }

    /// The effective value of this component.
    ///
    /// Falls back to the optional value if the version did not specify this component,
    /// e.g. `1.4.0` has the release `final` when `final` is the optional release value.
    #[must_use]
    pub fn value(&self) -> &str {
        self.value
            .as_deref()
            .unwrap_or_else(|| self.spec.optional_value())
    }

    /// Whether the value equals the optional value and may be omitted.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.value() == self.spec.optional_value()
    }

    /// The component reset to its first value.
    #[must_use]
    pub fn first(&self) -> Self {
        Self {
            value: Some(self.spec.first_value().to_string()),
            ..self.clone()
        }
    }

    /// Bump this component according to its specification.
    ///
    /// # Errors
    /// If the value cannot be bumped.
    pub fn bump(&self) -> Result<Self, BumpError> {
        let value = if self.spec.is_numeric() {
            numeric::NumericFunction::new(self.spec.first_value())?.bump(self.value())?
        } else {
            values::ValuesFunction {
                values: &self.spec.values,
            }
            .bump(self.value())?
        };
        Ok(Self {
            value: Some(value),
            ..self.clone()
        })
    }

    fn rank(&self) -> Rank<'_> {
        let value = self.value();
        if !self.spec.is_numeric() {
            if let Some(idx) = self.spec.values.iter().position(|v| v == value) {
                return Rank::Position(idx);
            }
        }
        match numeric::split(value) {
            Ok((_, number, suffix)) => Rank::Numeric(number, suffix),
            Err(_) => Rank::Text(value),
        }
    }
}

/// A parsed version.
#[derive(Debug, Clone)]
pub struct Version {
    components: IndexMap<String, Component>,
    spec: VersionSpec,
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.components.iter().map(|(k, v)| (k, v.value())))
            .finish()
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    /// Compare component by component, in the order of the version spec.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        fn ranks(version: &Version) -> Vec<Rank<'_>> {
            version
                .iter()
                .map(|(_, component)| component.rank())
                .collect()
        }
        let (left, right) = (ranks(self), ranks(other));
        left.iter()
            .zip(right.iter())
            .map(|(l, r)| l.cmp(r))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| left.len().cmp(&right.len()))
    }
}

impl<'a> IntoIterator for &'a Version {
    type Item = (&'a String, &'a Component);
    type IntoIter = indexmap::map::Iter<'a, String, Component>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Version {
    /// Parse a version string.
    ///
    /// Returns `None` if the pattern does not match.
    #[must_use]
    pub fn parse(value: &str, regex: &regex::Regex, version_spec: &VersionSpec) -> Option<Self> {
        let parsed = parse_raw_version(value, regex);
        if parsed.is_empty() {
            return None;
        }
        Some(version_spec.build(&parsed))
    }

    /// Serialize the version using one of the given serialization patterns.
    ///
    /// # Errors
    /// If no pattern is given or the chosen pattern references unknown arguments.
    pub fn serialize<'a, K, V, S>(
        &self,
        serialize_version_patterns: impl IntoIterator<Item = &'a FormatString>,
        ctx: &HashMap<K, V, S>,
    ) -> Result<String, SerializeError>
    where
        K: std::borrow::Borrow<str> + std::hash::Hash + Eq,
        V: AsRef<str>,
        S: std::hash::BuildHasher,
    {
        serialize_version(self, serialize_version_patterns, ctx)
    }

    pub fn get<Q>(&self, component: &Q) -> Option<&Component>
    where
        Q: ?Sized + std::hash::Hash + indexmap::Equivalent<String>,
    {
        self.components.get(component)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Component> {
        self.components.iter()
    }

    /// Compare two versions component by component.
    #[must_use]
    pub fn compare(&self, other: &Self) -> std::cmp::Ordering {
        self.cmp(other)
    }

    /// Names of the components that cannot be omitted when serializing.
    pub fn required_component_names(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, component)| !component.is_optional())
            .map(|(name, _)| name.as_str())
    }

    /// Increase the value of the given component.
    ///
    /// All components depending on it are reset to their first value.
    ///
    /// # Errors
    /// If the component does not exist or cannot be bumped.
    pub fn bump(&self, component: &str) -> Result<Self, BumpError> {
        let current = self
            .components
            .get(component)
            .ok_or_else(|| BumpError::InvalidComponent(component.to_string()))?;

        let mut components = self.components.clone();
        components.insert(component.to_string(), current.bump()?);

        for dependent in self.spec.dependents(component) {
            let Some(comp) = self.components.get(dependent) else {
                continue;
            };
            if comp.spec.independent != Some(true) {
                components.insert(dependent.to_string(), comp.first());
            }
        }

        Ok(Self {
            components,
            spec: self.spec.clone(),
        })
    }
}

/// Ordered version components and their dependencies.
#[derive(Debug, Clone, Default)]
pub struct VersionSpec {
    components: VersionComponentConfigs,
    dependency_map: HashMap<String, Vec<String>>,
}

impl VersionSpec {
    /// Build the dependency map of the components.
    ///
    /// Each component depends on its `depends_on` component, or on the preceding one.
    #[must_use]
    pub fn from_components(components: VersionComponentConfigs) -> Self {
        let mut dependency_map: HashMap<String, Vec<String>> = HashMap::new();
        for (previous, (name, spec)) in components.keys().zip(components.iter().skip(1)) {
            if spec.independent == Some(true) {
                continue;
            }
            let depends_on = spec.depends_on.as_ref().unwrap_or(previous);
            dependency_map
                .entry(depends_on.clone())
                .or_default()
                .push(name.clone());
        }
        Self {
            components,
            dependency_map,
        }
    }

    /// The set of components that transitively depend on `comp_name`.
    #[must_use]
    pub fn dependents(&self, comp_name: &str) -> HashSet<&str> {
        let mut stack: Vec<&String> = self
            .dependency_map
            .get(comp_name)
            .map(|deps| deps.iter().collect())
            .unwrap_or_default();
        let mut visited: HashSet<&str> = HashSet::new();
        while let Some(dep) = stack.pop() {
            if visited.insert(dep.as_str()) {
                stack.extend(self.dependency_map.get(dep).into_iter().flatten());
            }
        }
        visited
    }

    /// Build a `Version` from raw parsed values.
    #[must_use]
    pub fn build(&self, raw_components: &RawVersion) -> Version {
        let components = self
            .components
            .iter()
            .map(|(name, spec)| {
                let value = raw_components.get(name.as_str()).copied();
                (name.clone(), Component::new(value, spec.clone()))
            })
            .collect();
        Version {
            components,
            spec: self.clone(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SerializeError {
    #[error("version {version} has no valid formats")]
    NoValidFormat { version: Box<Version> },
    #[error(transparent)]
    Format(#[from] crate::f_string::FormatError),
}

/// Serialize a version with the best matching pattern.
///
/// - patterns that contain all required components are preferred
/// - then the pattern with the fewest arguments
/// - then the pattern listed first
fn serialize_version<'a, K, V, S>(
    version: &Version,
    serialize_patterns: impl IntoIterator<Item = &'a FormatString>,
    ctx: &HashMap<K, V, S>,
) -> Result<String, SerializeError>
where
    K: std::borrow::Borrow<str> + std::hash::Hash + Eq,
    V: AsRef<str>,
    S: std::hash::BuildHasher,
{
    let ctx: HashMap<&str, &str> = ctx
        .iter()
        .map(|(k, v)| (k.borrow(), v.as_ref()))
        .chain(version.iter().map(|(k, v)| (k.as_str(), v.value())))
        .collect();

    let required: HashSet<&str> = version.required_component_names().collect();

    let chosen = serialize_patterns
        .into_iter()
        .enumerate()
        .min_by_key(|(idx, pattern)| {
            let labels: HashSet<&str> = pattern.named_arguments().collect();
            let has_required = required.is_subset(&labels);
            (std::cmp::Reverse(has_required), labels.len(), *idx)
        })
        .map(|(_, pattern)| pattern)
        .ok_or_else(|| SerializeError::NoValidFormat {
            version: Box::new(version.clone()),
        })?;

    tracing::debug!(format = %chosen, "serialization format");
    Ok(chosen.format(&ctx, true)?)
}

/// Parse a version string into its named components.
fn parse_raw_version<'a>(version: &'a str, pattern: &'a regex::Regex) -> RawVersion<'a> {
    if version.is_empty() {
        return RawVersion::default();
    }
    let Some(captures) = pattern.captures(version) else {
        tracing::debug!(?pattern, version, "pattern does not parse version");
        return RawVersion::default();
    };
    pattern
        .capture_names()
        .flatten()
        .filter_map(|name| captures.name(name).map(|value| (name, value.as_str())))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{BumpError, Version, VersionSpec};
    use crate::config::version::{VersionComponentConfigs, VersionComponentSpec};
    use crate::f_string::FormatString;
    use color_eyre::eyre;
    use similar_asserts::assert_eq as sim_assert_eq;
    use std::collections::HashMap;

    pub(crate) const SEMVER: &str = r"(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)";

    pub(crate) fn semver_spec() -> VersionSpec {
        let components: VersionComponentConfigs = ["major", "minor", "patch"]
            .into_iter()
            .map(|name| (name.to_string(), VersionComponentSpec::default()))
            .collect();
        VersionSpec::from_components(components)
    }

    pub(crate) const SEMVER_RELEASE: &str =
        r"(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)(-(?P<release>[a-z]+))?";

    /// Semver with a `release` component of `dev`, `rc` and the implicit `final`.
    pub(crate) fn semver_release_spec() -> VersionSpec {
        let mut components: VersionComponentConfigs = ["major", "minor", "patch"]
            .into_iter()
            .map(|name| (name.to_string(), VersionComponentSpec::default()))
            .collect();
        components.insert(
            "release".to_string(),
            VersionComponentSpec {
                values: vec!["dev".to_string(), "rc".to_string(), "final".to_string()],
                optional_value: Some("final".to_string()),
                ..VersionComponentSpec::default()
            },
        );
        VersionSpec::from_components(components)
    }

    fn parse(value: &str) -> eyre::Result<Version> {
        let regex = regex::Regex::new(SEMVER)?;
        Version::parse(value, &regex, &semver_spec())
            .ok_or_else(|| eyre::eyre!("{value:?} is not a version"))
    }

    fn serialize(version: &Version) -> eyre::Result<String> {
        let patterns = [FormatString::parse("{major}.{minor}.{patch}")?];
        Ok(version.serialize(&patterns, &HashMap::<&str, &str>::new())?)
    }

    #[test]
    fn test_parse_raw_version() -> eyre::Result<()> {
        crate::tests::init();
        let regex = regex::Regex::new(SEMVER)?;
        sim_assert_eq!(
            super::parse_raw_version("2.1.3", &regex),
            [("major", "2"), ("minor", "1"), ("patch", "3")]
                .into_iter()
                .collect::<super::RawVersion>(),
        );
        assert!(super::parse_raw_version("latest", &regex).is_empty());
        Ok(())
    }

    #[test]
    fn bump_resets_dependents() -> eyre::Result<()> {
        crate::tests::init();
        let version = parse("1.4.7")?;
        sim_assert_eq!(serialize(&version.bump("patch")?)?, "1.4.8");
        sim_assert_eq!(serialize(&version.bump("minor")?)?, "1.5.0");
        sim_assert_eq!(serialize(&version.bump("major")?)?, "2.0.0");
        Ok(())
    }

    #[test]
    fn bump_unknown_component() -> eyre::Result<()> {
        crate::tests::init();
        let version = parse("1.4.7")?;
        sim_assert_eq!(
            version.bump("build").err(),
            Some(BumpError::InvalidComponent("build".to_string()))
        );
        Ok(())
    }

    #[test]
    fn bump_values_component() -> eyre::Result<()> {
        crate::tests::init();
        let regex = regex::Regex::new(
            r"(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)(-(?P<release>[a-z]+))?",
        )?;
        let release = VersionComponentSpec {
            values: vec!["rc".to_string(), "final".to_string()],
            optional_value: Some("final".to_string()),
            ..VersionComponentSpec::default()
        };
        let mut components: VersionComponentConfigs = ["major", "minor", "patch"]
            .into_iter()
            .map(|name| (name.to_string(), VersionComponentSpec::default()))
            .collect();
        components.insert("release".to_string(), release);
        let spec = VersionSpec::from_components(components);
        let patterns = [
            FormatString::parse("{major}.{minor}.{patch}-{release}")?,
            FormatString::parse("{major}.{minor}.{patch}")?,
        ];
        let ctx = HashMap::<&str, &str>::new();

        let version = Version::parse("1.2.3-rc", &regex, &spec)
            .ok_or_else(|| eyre::eyre!("not a version"))?;
        sim_assert_eq!(version.serialize(&patterns, &ctx)?, "1.2.3-rc");

        let released = version.bump("release")?;
        sim_assert_eq!(released.serialize(&patterns, &ctx)?, "1.2.3");

        // bumping patch resets the release to `rc`
        let next = released.bump("patch")?;
        sim_assert_eq!(next.serialize(&patterns, &ctx)?, "1.2.4-rc");

        assert!(matches!(
            released.bump("release"),
            Err(BumpError::Values(super::values::Error::MaxValue { .. }))
        ));
        Ok(())
    }

    #[test]
    fn missing_component_takes_optional_value() -> eyre::Result<()> {
        crate::tests::init();
        let regex = regex::Regex::new(SEMVER_RELEASE)?;
        let spec = semver_release_spec();
        let parse = |value: &str| {
            Version::parse(value, &regex, &spec).ok_or_else(|| eyre::eyre!("not a version"))
        };

        let released = parse("1.4.0")?;
        sim_assert_eq!(released.get("release").map(|c| c.value()), Some("final"));
        assert!(released > parse("1.4.0-rc")?);
        assert!(released < parse("1.4.1-dev")?);
        assert!(matches!(
            released.bump("release"),
            Err(BumpError::Values(super::values::Error::MaxValue { .. }))
        ));

        // reset uses the first value, not the optional one
        let next = released.bump("patch")?;
        sim_assert_eq!(next.get("release").map(|c| c.value()), Some("dev"));
        Ok(())
    }

    #[test]
    fn independent_component_is_not_reset() -> eyre::Result<()> {
        crate::tests::init();
        let regex = regex::Regex::new(r"(?P<major>\d+)\.(?P<minor>\d+)\+(?P<build>\d+)")?;
        let mut components: VersionComponentConfigs = ["major", "minor"]
            .into_iter()
            .map(|name| (name.to_string(), VersionComponentSpec::default()))
            .collect();
        components.insert(
            "build".to_string(),
            VersionComponentSpec {
                independent: Some(true),
                ..VersionComponentSpec::default()
            },
        );
        let spec = VersionSpec::from_components(components);
        let version =
            Version::parse("3.1+17", &regex, &spec).ok_or_else(|| eyre::eyre!("not a version"))?;
        let bumped = version.bump("major")?;
        sim_assert_eq!(bumped.get("minor").map(|c| c.value()), Some("0"));
        sim_assert_eq!(bumped.get("build").map(|c| c.value()), Some("17"));
        Ok(())
    }

    #[test]
    fn versions_order_numerically() -> eyre::Result<()> {
        crate::tests::init();
        assert!(parse("1.10.0")? > parse("1.9.0")?);
        assert!(parse("2.0.0")? > parse("1.99.99")?);
        assert!(parse("0.0.1")? < parse("0.1.0")?);
        sim_assert_eq!(parse("1.2.3")?, parse("1.2.3")?);
        sim_assert_eq!(
            parse("1.2.3")?.compare(&parse("1.2.4")?),
            std::cmp::Ordering::Less
        );
        Ok(())
    }

    #[test]
    fn serialize_prefers_shortest_pattern_with_required_components() -> eyre::Result<()> {
        crate::tests::init();
        let patterns = [
            FormatString::parse("{major}.{minor}.{patch}")?,
            FormatString::parse("{major}.{minor}")?,
        ];
        let ctx = HashMap::<&str, &str>::new();
        sim_assert_eq!(parse("1.2.0")?.serialize(&patterns, &ctx)?, "1.2");
        sim_assert_eq!(parse("1.2.5")?.serialize(&patterns, &ctx)?, "1.2.5");
        Ok(())
    }
}
