//! Static checks on a parsed rules config.  Loading refuses configs that
//! fail here, which is what makes queries over a loaded [`crate::Authz`]
//! infallible.

use std::collections::HashSet;

use crate::config::{Config, Section};
use crate::errors::AuthzError;

/// Walk the whole config and report the first structural error: undefined
/// group or alias references, circular group definitions, malformed rule
/// keys, disallowed rule characters, and non-canonical section paths.
pub fn validate(config: &Config) -> Result<(), AuthzError> {
    for (name, section) in config.sections() {
        match name {
            "groups" => {
                for (group, _) in section.entries() {
                    group_walk(config, group, &mut HashSet::new())?;
                }
            }
            // Any value is a valid alias target.
            "aliases" => {}
            _ => validate_path_rules(config, name, section)?,
        }
    }
    Ok(())
}

/// Recursively check one group definition for undefined references and
/// circular dependencies.  `checked` carries the groups on the current
/// recursion path; entries are removed on the way out so that a diamond
/// (two groups sharing a subgroup) is not mistaken for a cycle.
fn group_walk(
    config: &Config,
    group: &str,
    checked: &mut HashSet<String>,
) -> Result<(), AuthzError> {
    let Some(value) = config.get("groups", group) else {
        return Err(AuthzError::InvalidConfig(format!(
            "An authz rule refers to group '{group}', which is undefined"
        )));
    };

    for member in value.split(',').map(str::trim).filter(|m| !m.is_empty()) {
        if let Some(subgroup) = member.strip_prefix('@') {
            if checked.contains(subgroup) {
                return Err(AuthzError::InvalidConfig(format!(
                    "Circular dependency between groups '{subgroup}' and '{group}'"
                )));
            }
            checked.insert(subgroup.to_string());
            group_walk(config, subgroup, checked)?;
            checked.remove(subgroup);
        } else if let Some(alias) = member.strip_prefix('&') {
            if config.get("aliases", alias).is_none() {
                return Err(AuthzError::InvalidConfig(format!(
                    "An authz rule refers to alias '{alias}', which is undefined"
                )));
            }
        }
        // Anything else is a user literal, always valid.
    }

    Ok(())
}

fn validate_path_rules(
    config: &Config,
    name: &str,
    section: &Section,
) -> Result<(), AuthzError> {
    // Skip the optional repository prefix; the rest must be a canonical
    // absolute path.
    let fspath = name.split_once(':').map_or(name, |(_, path)| path);
    if !is_canonical_fspath(fspath) {
        return Err(AuthzError::InvalidConfig(format!(
            "Section name '{name}' contains non-canonical path '{fspath}'"
        )));
    }

    for (key, value) in section.entries() {
        validate_rule(config, key, value)?;
    }
    Ok(())
}

fn validate_rule(config: &Config, rule: &str, value: &str) -> Result<(), AuthzError> {
    let mut subject = rule;

    if let Some(rest) = subject.strip_prefix('~') {
        subject = rest;

        if subject.starts_with('~') {
            return Err(AuthzError::InvalidConfig(format!(
                "Rule '{rule}' has more than one inversion; double negatives are not permitted"
            )));
        }
        if subject == "*" {
            return Err(AuthzError::InvalidConfig(
                "Authz rules with match string '~*' are not allowed, \
                 because they never match anyone"
                    .to_string(),
            ));
        }
    }

    if let Some(group) = subject.strip_prefix('@') {
        if config.get("groups", group).is_none() {
            return Err(AuthzError::InvalidConfig(format!(
                "An authz rule refers to group '{rule}', which is undefined"
            )));
        }
    } else if let Some(alias) = subject.strip_prefix('&') {
        if config.get("aliases", alias).is_none() {
            return Err(AuthzError::InvalidConfig(format!(
                "An authz rule refers to alias '{rule}', which is undefined"
            )));
        }
    } else if let Some(token) = subject.strip_prefix('$') {
        if token != "anonymous" && token != "authenticated" {
            return Err(AuthzError::InvalidConfig(format!(
                "Unrecognized authz token '{rule}'"
            )));
        }
    }

    if let Some(bad) = value.chars().find(|&c| c != 'r' && c != 'w' && !c.is_whitespace()) {
        return Err(AuthzError::InvalidConfig(format!(
            "The character '{bad}' in rule '{rule}' is not allowed in authz rules"
        )));
    }

    Ok(())
}

/// A canonical rule path: absolute, no `.` or `..` components, no empty
/// segments, and no trailing `/` except for the root itself.
fn is_canonical_fspath(path: &str) -> bool {
    match path.strip_prefix('/') {
        None => false,
        Some("") => true,
        Some(rest) => rest
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != ".."),
    }
}
