use indexmap::IndexMap;

pub type VersionComponentConfigs = IndexMap<String, VersionComponentSpec>;

/// Configuration of a version component.
///
/// Read from the `[bumper.parts.<name>]` tables of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionComponentSpec {
    /// Is the component independent of the other components?
    ///
    /// Independent components are never reset when another component is bumped.
    pub independent: Option<bool>,

    /// The value that may be left out when serializing.
    ///
    /// Defaults to the first value.
    pub optional_value: Option<String>,

    /// The possible values for the component.
    ///
    /// If empty, the component is numeric.
    pub values: Vec<String>,

    /// The first value to increment from.
    pub first_value: Option<String>,

    /// The name of the component this component depends on.
    ///
    /// Defaults to the preceding component.
    pub depends_on: Option<String>,
}

impl VersionComponentSpec {
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.values.is_empty()
    }

    /// The value a component is reset to.
    #[must_use]
    pub fn first_value(&self) -> &str {
        match self.first_value.as_deref() {
            Some(first_value) => first_value,
            None if self.is_numeric() => "0",
            None => self.values[0].as_str(),
        }
    }

    /// The value that can be omitted when serializing.
    #[must_use]
    pub fn optional_value(&self) -> &str {
        self.optional_value
            .as_deref()
            .unwrap_or_else(|| self.first_value())
    }
}

/// Make sure all version components of the parse pattern are included.
///
/// Components are ordered as their capture groups appear in the parse pattern.
#[must_use]
pub fn version_component_configs(config: &super::FinalizedConfig) -> VersionComponentConfigs {
    config
        .global
        .parse_version_pattern
        .capture_names()
        .flatten()
        .map(|label| {
            let spec = config.components.get(label).cloned().unwrap_or_default();
            (label.to_string(), spec)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::VersionComponentSpec;
    use similar_asserts::assert_eq as sim_assert_eq;

    #[test]
    fn numeric_first_value_defaults_to_zero() {
        let spec = VersionComponentSpec::default();
        sim_assert_eq!(spec.first_value(), "0");
        sim_assert_eq!(spec.optional_value(), "0");
    }

    #[test]
    fn values_first_value_defaults_to_first_entry() {
        let spec = VersionComponentSpec {
            values: vec!["alpha".to_string(), "beta".to_string(), "final".to_string()],
            optional_value: Some("final".to_string()),
            ..VersionComponentSpec::default()
        };
        sim_assert_eq!(spec.first_value(), "alpha");
        sim_assert_eq!(spec.optional_value(), "final");
    }
}
