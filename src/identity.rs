//! Resolves a user to the set of names a rules file can address them by.

use std::collections::{HashMap, HashSet};

use crate::config::Config;

/// Every name in `config` that refers to `user`: the plain user name, each
/// alias decorated with `&`, each group the user is transitively a member
/// of decorated with `@`, plus the standard tokens.
///
/// An anonymous user (`None`) resolves to `{"*", "$anonymous"}` no matter
/// what the config contains.
pub fn memberships(config: &Config, user: Option<&str>) -> HashSet<String> {
    let Some(user) = user else {
        return ["*", "$anonymous"].map(String::from).into();
    };

    let mut result = HashSet::new();
    result.insert(user.to_string());

    // The user and all aliases that point at them.
    if let Some(aliases) = config.section("aliases") {
        for (name, value) in aliases.entries() {
            if value == user {
                result.insert(format!("&{name}"));
            }
        }
    }

    // Reversal of the group declarations: member -> groups it appears in.
    // Only members that are groups themselves or already name the user are
    // relevant.
    let mut reverse: HashMap<String, Vec<String>> = HashMap::new();
    if let Some(groups) = config.section("groups") {
        for (name, value) in groups.entries() {
            let decorated = format!("@{name}");
            for member in value.split(',').map(str::trim).filter(|m| !m.is_empty()) {
                if member.starts_with('@') || result.contains(member) {
                    reverse
                        .entry(member.to_string())
                        .or_default()
                        .push(decorated.clone());
                }
            }
        }
    }

    // Transitive closure over the reverse map.  Terminates because the set
    // only grows and the group universe is finite; already-visited names
    // are skipped, so cycles (rejected by validation anyway) cannot loop.
    let mut to_follow: Vec<String> = result.iter().cloned().collect();
    while let Some(name) = to_follow.pop() {
        if let Some(parents) = reverse.get(&name) {
            for group in parents {
                if result.insert(group.clone()) {
                    to_follow.push(group.clone());
                }
            }
        }
    }

    result.insert("*".to_string());
    result.insert("$authenticated".to_string());
    result
}
