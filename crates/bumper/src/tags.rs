//! Mapping between tag names and versions.
use crate::{
    api::RemoteTag,
    f_string::{FormatString, Value},
    version::{Version, VersionSpec},
};

pub const NEW_VERSION: &str = "new_version";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("tag name {0:?} does not contain `{{new_version}}`")]
    MissingNewVersion(String),
    #[error("failed to build tag pattern")]
    Regex(#[from] regex::Error),
}

/// A version tag of the repository.
#[derive(Debug, Clone)]
pub struct VersionTag {
    pub tag: RemoteTag,
    pub version: Version,
    /// The version as it appears in the tag name.
    pub serialized: String,
}

fn literal_pattern(values: &[Value]) -> String {
    values
        .iter()
        .map(|value| match value {
            Value::String(s) => regex::escape(s),
            Value::Argument(_) => ".*?".to_string(),
        })
        .collect()
}

/// Regex matching the full name of a version tag.
///
/// The literal parts of the tag name template around `{new_version}` must match exactly,
/// the version itself must match the parse pattern.
#[derive(Debug, Clone)]
pub struct TagPattern(regex::Regex);

impl TagPattern {
    /// # Errors
    /// If the tag name does not contain `{new_version}`.
    pub fn new(tag_name: &FormatString, parse: &regex::Regex) -> Result<Self, Error> {
        let (prefix, suffix) = tag_name
            .split_at_argument(NEW_VERSION)
            .ok_or_else(|| Error::MissingNewVersion(tag_name.to_string()))?;
        let pattern = format!(
            "^{}(?P<current_version>{}){}$",
            literal_pattern(prefix),
            parse.as_str(),
            literal_pattern(suffix),
        );
        tracing::trace!(pattern, "tag pattern");
        Ok(Self(regex::RegexBuilder::new(&pattern).build()?))
    }

    /// The version part of a tag name, if the tag is a version tag.
    #[must_use]
    pub fn version<'a>(&self, tag: &'a str) -> Option<&'a str> {
        self.0
            .captures(tag)
            .and_then(|captures| captures.name("current_version"))
            .map(|m| m.as_str())
    }
}

/// Extract the version from a tag name.
///
/// # Errors
/// If the tag name does not contain `{new_version}`.
pub fn version_from_tag<'a>(
    tag: &'a str,
    tag_name: &FormatString,
    parse: &regex::Regex,
) -> Result<Option<&'a str>, Error> {
    Ok(TagPattern::new(tag_name, parse)?.version(tag))
}

/// All version tags, ordered from the highest to the lowest version.
///
/// Tags with equal versions are ordered by name.
///
/// # Errors
/// If the tag name does not contain `{new_version}`.
pub fn version_tags(
    tags: impl IntoIterator<Item = RemoteTag>,
    tag_name: &FormatString,
    parse: &regex::Regex,
    version_spec: &VersionSpec,
) -> Result<Vec<VersionTag>, Error> {
    let pattern = TagPattern::new(tag_name, parse)?;
    let mut version_tags: Vec<VersionTag> = tags
        .into_iter()
        .filter_map(|tag| {
            let serialized = pattern.version(&tag.name)?.to_string();
            let version = Version::parse(&serialized, parse, version_spec)?;
            Some(VersionTag {
                tag,
                version,
                serialized,
            })
        })
        .collect();
    version_tags.sort_by(|a, b| {
        b.version
            .cmp(&a.version)
            .then_with(|| a.tag.name.cmp(&b.tag.name))
    });
    Ok(version_tags)
}

/// The tag with the highest version.
///
/// # Errors
/// If the tag name does not contain `{new_version}`.
pub fn latest_version_tag(
    tags: impl IntoIterator<Item = RemoteTag>,
    tag_name: &FormatString,
    parse: &regex::Regex,
    version_spec: &VersionSpec,
) -> Result<Option<VersionTag>, Error> {
    Ok(version_tags(tags, tag_name, parse, version_spec)?
        .into_iter()
        .next())
}

/// Shell style glob matching the names of version tags, e.g. `v*`.
#[must_use]
pub fn glob_for(tag_name: &FormatString) -> String {
    tag_name
        .iter()
        .map(|value| match value {
            Value::String(s) => s.as_str(),
            Value::Argument(_) => "*",
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{glob_for, latest_version_tag, version_from_tag, version_tags, Error};
    use crate::{api::RemoteTag, f_string::FormatString, version::tests as version};
    use color_eyre::eyre;
    use similar_asserts::assert_eq as sim_assert_eq;

    fn remote_tags(names: &[&str]) -> Vec<RemoteTag> {
        names
            .iter()
            .enumerate()
            .map(|(idx, name)| RemoteTag {
                name: (*name).to_string(),
                commit_sha: format!("{idx:040x}"),
            })
            .collect()
    }

    #[test]
    fn extract_version_from_tag() -> eyre::Result<()> {
        crate::tests::init();
        let parse = regex::Regex::new(version::SEMVER)?;

        let tag_name = FormatString::parse("v{new_version}")?;
        sim_assert_eq!(version_from_tag("v1.2.3", &tag_name, &parse)?, Some("1.2.3"));
        sim_assert_eq!(version_from_tag("1.2.3", &tag_name, &parse)?, None);
        sim_assert_eq!(version_from_tag("v1.2.3-rc1", &tag_name, &parse)?, None);
        sim_assert_eq!(version_from_tag("xv1.2.3", &tag_name, &parse)?, None);

        let tag_name = FormatString::parse("app.v{new_version}+build")?;
        sim_assert_eq!(
            version_from_tag("app.v0.10.0+build", &tag_name, &parse)?,
            Some("0.10.0")
        );
        sim_assert_eq!(version_from_tag("appxv0.10.0+build", &tag_name, &parse)?, None);
        sim_assert_eq!(version_from_tag("app.v0.10.0+buildd", &tag_name, &parse)?, None);

        let tag_name = FormatString::parse("release")?;
        assert!(matches!(
            version_from_tag("release", &tag_name, &parse),
            Err(Error::MissingNewVersion(_))
        ));
        Ok(())
    }

    #[test]
    fn latest_version_is_highest_not_lexical() -> eyre::Result<()> {
        crate::tests::init();
        let parse = regex::Regex::new(version::SEMVER)?;
        let tag_name = FormatString::parse("v{new_version}")?;
        let tags = remote_tags(&["v1.9.0", "nightly", "v1.10.0", "v0.1.0", "latest"]);

        let latest = latest_version_tag(tags.clone(), &tag_name, &parse, &version::semver_spec())?
            .ok_or_else(|| eyre::eyre!("no version tag"))?;
        sim_assert_eq!(latest.tag.name, "v1.10.0");
        sim_assert_eq!(latest.serialized, "1.10.0");

        let names: Vec<_> = version_tags(tags, &tag_name, &parse, &version::semver_spec())?
            .into_iter()
            .map(|tag| tag.tag.name)
            .collect();
        sim_assert_eq!(names, vec!["v1.10.0", "v1.9.0", "v0.1.0"]);
        Ok(())
    }

    #[test]
    fn final_release_sorts_above_release_candidate() -> eyre::Result<()> {
        crate::tests::init();
        let parse = regex::Regex::new(version::SEMVER_RELEASE)?;
        let tag_name = FormatString::parse("v{new_version}")?;
        let spec = version::semver_release_spec();
        let tags = remote_tags(&["v1.4.0-rc", "v1.4.0", "v1.4.0-dev", "v1.3.9"]);

        let names: Vec<_> = version_tags(tags.clone(), &tag_name, &parse, &spec)?
            .into_iter()
            .map(|tag| tag.tag.name)
            .collect();
        sim_assert_eq!(names, vec!["v1.4.0", "v1.4.0-rc", "v1.4.0-dev", "v1.3.9"]);

        let latest = latest_version_tag(tags, &tag_name, &parse, &spec)?
            .ok_or_else(|| eyre::eyre!("no version tag"))?;
        sim_assert_eq!(latest.serialized, "1.4.0");
        sim_assert_eq!(
            latest.version.get("release").map(|component| component.value()),
            Some("final")
        );
        Ok(())
    }

    #[test]
    fn no_version_tags() -> eyre::Result<()> {
        crate::tests::init();
        let parse = regex::Regex::new(version::SEMVER)?;
        let tag_name = FormatString::parse("v{new_version}")?;
        let latest = latest_version_tag(
            remote_tags(&["nightly", "stable"]),
            &tag_name,
            &parse,
            &version::semver_spec(),
        )?;
        assert!(latest.is_none());
        Ok(())
    }

    #[test]
    fn tag_globs() -> eyre::Result<()> {
        crate::tests::init();
        sim_assert_eq!(glob_for(&FormatString::parse("v{new_version}")?), "v*");
        sim_assert_eq!(
            glob_for(&FormatString::parse("release-{new_version}-final")?),
            "release-*-final"
        );
        Ok(())
    }
}
