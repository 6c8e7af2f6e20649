//! Turns configured groups into the flat list of probe targets.
//!
//! Two stages, both pure:
//! 1. every entry of every group is parsed into a [`Target`];
//! 2. without an interface mapping the list is used as is, otherwise each
//!    target is repeated once per interface that lists its group.

use std::collections::HashSet;

use tracing::warn;

use super::error::ConfigError;
use super::raw::{InterfaceGroups, ItemGroups};
use crate::network::target::Target;

pub fn expand_targets(
    items: &ItemGroups,
    interfaces: Option<&InterfaceGroups>,
) -> Result<Vec<Target>, ConfigError> {
    let parsed = parse_groups(items)?;
    if parsed.is_empty() {
        return Err(ConfigError::EmptyTargets);
    }

    let targets = match interfaces {
        None => parsed,
        Some(mapping) => {
            check_interface_groups(&parsed, mapping)?;
            bind_to_interfaces(parsed, mapping)
        }
    };

    if targets.is_empty() {
        return Err(ConfigError::EmptyTargets);
    }
    Ok(targets)
}

fn parse_groups(items: &ItemGroups) -> Result<Vec<Target>, ConfigError> {
    let mut targets = Vec::new();
    for (group, entries) in items.iter() {
        for entry in entries {
            targets.push(entry.to_target(group)?);
        }
    }
    Ok(targets)
}

fn check_interface_groups(targets: &[Target], mapping: &InterfaceGroups) -> Result<(), ConfigError> {
    let known: HashSet<&str> = targets.iter().map(Target::group).collect();
    for (iface, groups) in mapping.iter() {
        if let Some(group) = groups.iter().find(|group| !known.contains(group.as_str())) {
            return Err(ConfigError::UnknownGroup {
                iface: iface.to_string(),
                group: group.clone(),
            });
        }
    }
    Ok(())
}

fn bind_to_interfaces(targets: Vec<Target>, mapping: &InterfaceGroups) -> Vec<Target> {
    let mut bound = Vec::with_capacity(targets.len());
    for target in targets {
        if target.iface().is_some() {
            bound.push(target);
            continue;
        }

        let before = bound.len();
        for iface in mapping.interfaces_for(target.group()) {
            bound.push(target.clone().with_iface(iface));
        }
        if bound.len() == before {
            warn!(
                resource = target.resource(),
                group = target.group(),
                "No interface mapped to group, resource will not be probed"
            );
        }
    }
    bound
}
