//! The configuration as written by the operator, before validation.
//!
//! Keys follow the camelCase names of the YAML file. Every field is optional
//! here; defaults and validation are applied by [`Config::assemble`].
//!
//! [`Config::assemble`]: super::Config::assemble

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};

use super::error::ConfigError;
use super::{LogFormat, LogSettings, parse_log_level};
use crate::network::target::{DEFAULT_GROUP, Network, Target};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawConfig {
    #[serde(default, with = "humantime_serde")]
    pub connection_timeout: Option<Duration>,
    /// Upper bound for one DNS lookup. Unset means lookups are not bounded.
    #[serde(default, with = "humantime_serde")]
    pub resolution_timeout: Option<Duration>,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub log_format: Option<String>,
    #[serde(default)]
    pub listen_addr: Option<String>,
    #[serde(default)]
    pub metrics_path: Option<String>,
    #[serde(default)]
    pub items: ItemGroups,
    /// Interface name to the groups probed through it.
    #[serde(default)]
    pub interfaces: Option<InterfaceGroups>,
}

/// Values coming from command line flags or the environment.
///
/// Anything set here wins over the configuration file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub connection_timeout: Option<Duration>,
    pub resolution_timeout: Option<Duration>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub listen_addr: Option<String>,
    pub metrics_path: Option<String>,
    /// Comma separated resources, appended to the `all` group.
    pub resources: Option<String>,
}

impl RawConfig {
    /// Reads the optional configuration file, then layers `overrides` on top.
    pub fn load(overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut raw = match &overrides.config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        raw.apply(overrides);
        Ok(raw)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    fn apply(&mut self, overrides: &Overrides) {
        if overrides.connection_timeout.is_some() {
            self.connection_timeout = overrides.connection_timeout;
        }
        if overrides.resolution_timeout.is_some() {
            self.resolution_timeout = overrides.resolution_timeout;
        }
        if overrides.log_level.is_some() {
            self.log_level = overrides.log_level.clone();
        }
        if overrides.log_format.is_some() {
            self.log_format = overrides.log_format.clone();
        }
        if overrides.listen_addr.is_some() {
            self.listen_addr = overrides.listen_addr.clone();
        }
        if overrides.metrics_path.is_some() {
            self.metrics_path = overrides.metrics_path.clone();
        }
        if let Some(resources) = &overrides.resources {
            for resource in resources.split(',').map(str::trim) {
                if resource.is_empty() {
                    continue;
                }
                self.items
                    .push(DEFAULT_GROUP, ItemEntry::Bare(resource.to_string()));
            }
        }
    }

    /// Validated logging settings.
    ///
    /// Available before the targets are built so logging can be set up first.
    pub fn log_settings(&self) -> Result<LogSettings, ConfigError> {
        let level = parse_log_level(self.log_level.as_deref().unwrap_or("info"))?;
        let format = match self.log_format.as_deref() {
            Some(format) => format.parse()?,
            None => LogFormat::default(),
        };
        Ok(LogSettings { level, format })
    }
}

/// One entry of an `items` group.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ItemEntry {
    /// `host:port`, optionally with a scheme prefix.
    Bare(String),
    Detailed(ItemSpec),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemSpec {
    pub resource: String,
    #[serde(default)]
    pub alias: Option<String>,
    /// Overrides the name of the section the entry is listed under.
    #[serde(default)]
    pub group: Option<String>,
    /// Overrides the scheme prefix of `resource`.
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub iface: Option<String>,
}

impl ItemEntry {
    /// Parses the entry into a target belonging to `section`.
    pub fn to_target(&self, section: &str) -> Result<Target, ConfigError> {
        match self {
            ItemEntry::Bare(resource) => Ok(Target::parse(resource)?.with_group(section)),
            ItemEntry::Detailed(spec) => {
                let mut target = Target::parse(&spec.resource)?
                    .with_group(spec.group.as_deref().unwrap_or(section));
                if let Some(alias) = &spec.alias {
                    target = target.with_alias(alias);
                }
                if let Some(network) = &spec.network {
                    let network = network.parse::<Network>().map_err(|reason| {
                        ConfigError::InvalidTarget {
                            resource: spec.resource.clone(),
                            reason,
                        }
                    })?;
                    target = target.with_network(network);
                }
                if let Some(iface) = &spec.iface {
                    target = target.with_iface(iface);
                }
                Ok(target)
            }
        }
    }
}

/// Resources by group, in configuration order.
///
/// Accepts either a plain sequence, which lands in the `all` group, or a
/// mapping of group name to sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemGroups(Vec<(String, Vec<ItemEntry>)>);

impl ItemGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `entry` to `group`, creating the group at the end if needed.
    pub fn push(&mut self, group: &str, entry: ItemEntry) {
        match self.0.iter_mut().find(|(name, _)| name == group) {
            Some((_, entries)) => entries.push(entry),
            None => self.0.push((group.to_string(), vec![entry])),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ItemEntry])> {
        self.0
            .iter()
            .map(|(group, entries)| (group.as_str(), entries.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|(_, entries)| entries.is_empty())
    }
}

impl<'de> Deserialize<'de> for ItemGroups {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ItemGroupsVisitor;

        impl<'de> Visitor<'de> for ItemGroupsVisitor {
            type Value = ItemGroups;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a list of resources or a map of group name to resources")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(ItemGroups::new())
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::new();
                while let Some(entry) = seq.next_element::<ItemEntry>()? {
                    entries.push(entry);
                }
                Ok(ItemGroups(vec![(DEFAULT_GROUP.to_string(), entries)]))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut groups = ItemGroups::new();
                while let Some((group, entries)) = map.next_entry::<String, Vec<ItemEntry>>()? {
                    for entry in entries {
                        groups.push(&group, entry);
                    }
                }
                Ok(groups)
            }
        }

        deserializer.deserialize_any(ItemGroupsVisitor)
    }
}

/// Interface name to group names, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceGroups(Vec<(String, Vec<String>)>);

impl InterfaceGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, iface: impl Into<String>, groups: Vec<String>) {
        self.0.push((iface.into(), groups));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(iface, groups)| (iface.as_str(), groups.as_slice()))
    }

    /// Interfaces whose group list contains `group`.
    pub fn interfaces_for<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.iter()
            .filter(move |(_, groups)| groups.iter().any(|g| g == group))
            .map(|(iface, _)| iface)
    }
}

impl<'de> Deserialize<'de> for InterfaceGroups {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct InterfaceGroupsVisitor;

        impl<'de> Visitor<'de> for InterfaceGroupsVisitor {
            type Value = InterfaceGroups;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of interface name to group names")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut interfaces = InterfaceGroups::new();
                while let Some((iface, groups)) = map.next_entry::<String, Vec<String>>()? {
                    interfaces.insert(iface, groups);
                }
                Ok(interfaces)
            }
        }

        deserializer.deserialize_map(InterfaceGroupsVisitor)
    }
}
