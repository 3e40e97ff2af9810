//! Filters rule sections down to the ones that apply to a user and
//! repository, collapsing each into a single rights bitset.

use std::collections::HashSet;

use crate::access::Access;
use crate::config::Section;

/// If `section` names a path rule relevant to `repos`, return the path
/// part.  Sections scoped with a `repo:` prefix apply only to that
/// repository; unscoped path sections apply to every repository.  Anything
/// not starting with `/` after scoping (`groups`, `aliases`, ...) is not a
/// path rule.
pub fn repos_path<'a>(section: &'a str, repos: &str) -> Option<&'a str> {
    let path = match section.split_once(':') {
        Some((prefix, path)) => (prefix == repos).then_some(path)?,
        None => section,
    };
    path.starts_with('/').then_some(path)
}

/// Collapse one path-rule section against the user's membership set.
///
/// Every matching entry ORs its rights in; a `~`-prefixed key inverts the
/// membership test.  Returns `None` when no entry matched, i.e. the
/// section says nothing about this user.  Rights only accumulate within a
/// section; precedence between paths comes from the tree, not from here.
pub fn section_rights(section: &Section, memberships: &HashSet<String>) -> Option<Access> {
    let mut found = false;
    let mut rights = Access::NONE;

    for (name, value) in section.entries() {
        let (subject, inverted) = match name.strip_prefix('~') {
            Some(subject) => (subject, true),
            None => (name, false),
        };
        if memberships.contains(subject) != inverted {
            found = true;
            rights |= Access::from_rule_value(value);
        }
    }

    found.then_some(rights)
}
