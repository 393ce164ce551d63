use crate::locator::LocatorCandidate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Interaction performed to reveal a hidden target before re-scanning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discovery {
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub trigger: Vec<LocatorCandidate>,
    #[serde(with = "millis", default = "default_settle")]
    pub settle: Duration,
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub rescan: Vec<LocatorCandidate>,
}

impl Discovery {
    pub fn new(trigger: Vec<LocatorCandidate>, rescan: Vec<LocatorCandidate>) -> Self {
        Self {
            trigger,
            settle: default_settle(),
            rescan,
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }
}

fn default_settle() -> Duration {
    Duration::from_millis(1000)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// Failure stops the scenario.
    Mandatory,
    /// Failure is logged and the caller carries on.
    #[default]
    Optional,
}

/// A logical UI target and the ranked ways of finding it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub candidates: Vec<LocatorCandidate>,
    #[serde(default)]
    pub discovery: Option<Discovery>,
    #[serde(default)]
    pub requirement: Requirement,
}

impl Target {
    pub fn optional(name: impl Into<String>, candidates: Vec<LocatorCandidate>) -> Self {
        Self {
            name: name.into(),
            candidates,
            discovery: None,
            requirement: Requirement::Optional,
        }
    }

    pub fn mandatory(name: impl Into<String>, candidates: Vec<LocatorCandidate>) -> Self {
        Self {
            requirement: Requirement::Mandatory,
            ..Self::optional(name, candidates)
        }
    }

    pub fn with_discovery(mut self, discovery: Discovery) -> Self {
        self.discovery = Some(discovery);
        self
    }

    pub fn is_mandatory(&self) -> bool {
        self.requirement == Requirement::Mandatory
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_loads_from_yaml() {
        let yaml = r##"
name: search input
requirement: mandatory
candidates:
  - css: "#search"
  - attribute:
      tag: input
      name: placeholder
      op: contains
      value: Hledat
discovery:
  trigger:
    - css: .search-icon
  settle: 250
  rescan:
    - positional:
        selector: input
        index: 0
"##;
        let target: Target = serde_yaml::from_str(yaml).unwrap();
        assert!(target.is_mandatory());
        assert_eq!(target.candidates.len(), 2);
        assert_eq!(target.candidates[0], LocatorCandidate::css("#search"));

        let discovery = target.discovery.unwrap();
        assert_eq!(discovery.trigger, vec![LocatorCandidate::css(".search-icon")]);
        assert_eq!(discovery.settle, Duration::from_millis(250));
        assert_eq!(discovery.rescan, vec![LocatorCandidate::nth("input", 0)]);
    }

    #[test]
    fn target_round_trips_through_yaml() {
        let target = Target::optional("cookie button", vec![LocatorCandidate::text_in("button", "zde")]);
        let yaml = serde_yaml::to_string(&target).unwrap();
        assert!(yaml.contains("text:"));
        let back: Target = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.candidates, target.candidates);
    }
}
