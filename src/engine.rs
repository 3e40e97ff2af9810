//! The lookup core: compiles the rules that apply to one `(repository,
//! user)` pair into a segment-indexed prefix tree, then answers access
//! queries by walking it.
//!
//! The tree is built once per query tuple and is immutable afterwards.
//! `min_rights` / `max_rights` aggregate the effective rights over each
//! node's entire subtree, which lets the walk answer most queries after a
//! constant number of comparisons per path segment.

use std::collections::HashMap;

use crate::access::Access;
use crate::config::Config;
use crate::errors::AuthzError;
use crate::identity;
use crate::rules;

/// One node of the per-user prefix tree.  `access` is set only where a
/// rule names exactly this path; everything else inherits from the nearest
/// ancestor with `access` set.  The root always has `access` after build.
#[derive(Debug)]
struct Node {
    segment: String,
    access: Option<Access>,
    min_rights: Access,
    max_rights: Access,
    sub_nodes: HashMap<String, Node>,
}

impl Node {
    fn new(segment: &str) -> Node {
        Node {
            segment: segment.to_string(),
            access: None,
            min_rights: Access::NONE,
            max_rights: Access::NONE,
            sub_nodes: HashMap::new(),
        }
    }
}

/// Decide whether `user` holds `required` on `path` within `repos_name`.
///
/// A `None` repository matches only rule sections without a `repo:`
/// prefix.  A `None` path asks whether the user holds `required` anywhere
/// in the repository.  A present path must start with `/`.
pub fn check(
    config: &Config,
    repos_name: Option<&str>,
    path: Option<&str>,
    user: Option<&str>,
    required: Access,
    recursive: bool,
) -> Result<bool, AuthzError> {
    let root = user_tree(config, repos_name.unwrap_or(""), user);

    let Some(path) = path else {
        return Ok(root.max_rights.contains(required));
    };
    let Some(relative) = path.strip_prefix('/') else {
        return Err(AuthzError::QueryPath(path.to_string()));
    };

    Ok(lookup(&root, relative, required, recursive))
}

/// Extract the rules relevant to `(repos, user)` from `config` and fold
/// them into a finalized prefix tree.
fn user_tree(config: &Config, repos: &str, user: Option<&str>) -> Node {
    let memberships = identity::memberships(config, user);

    let mut root = Node::new("");
    for (name, section) in config.sections() {
        let Some(path) = rules::repos_path(name, repos) else {
            continue;
        };
        let Some(rights) = rules::section_rights(section, &memberships) else {
            continue;
        };
        insert_path(&mut root, path, rights);
    }

    // With no rule at the root, the "no access" default applies.
    let inherited = *root.access.get_or_insert(Access::NONE);
    finalize(&mut root, inherited);
    root
}

fn insert_path(root: &mut Node, path: &str, rights: Access) {
    let mut node = root;
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        node = node
            .sub_nodes
            .entry(segment.to_string())
            .or_insert_with(|| Node::new(segment));
    }
    // One section per path after config merging; only a section scoped to
    // the empty repository name can collide with an unscoped one.
    debug_assert!(
        node.access.is_none(),
        "two rule sections resolve to the same path"
    );
    node.access = Some(rights);
}

/// Post-order pass computing `min_rights` / `max_rights`.  `inherited` is
/// the effective access of the nearest ancestor holding one.
fn finalize(node: &mut Node, inherited: Access) {
    let effective = node.access.unwrap_or(inherited);
    let mut min = effective;
    let mut max = effective;

    for child in node.sub_nodes.values_mut() {
        finalize(child, effective);
        min &= child.min_rights;
        max |= child.max_rights;
    }

    node.min_rights = min;
    node.max_rights = max;
}

/// Walk the tree along `path` (leading `/` already stripped; need not be
/// normalized otherwise) and decide the query.
fn lookup(root: &Node, path: &str, required: Access, recursive: bool) -> bool {
    let mut current = Some(root);

    // Last explicit access seen along the walk; the root always has one.
    let mut access = root.access.unwrap_or_default();
    let mut min_rights = root.min_rights;
    let mut max_rights = root.max_rights;

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let Some(node) = current else {
            break;
        };

        // Nowhere in this subtree are there enough rights.
        if !max_rights.contains(required) {
            return false;
        }
        // Everywhere in this subtree there are enough rights.
        if min_rights.contains(required) {
            return true;
        }
        // The rights are uniform across this subtree.
        if min_rights & required == max_rights & required {
            return min_rights.contains(required);
        }

        match node.sub_nodes.get(segment) {
            Some(next) => {
                // Rules for exactly this segment take over.
                if let Some(rights) = next.access {
                    access = rights;
                }
                min_rights = next.min_rights;
                max_rights = next.max_rights;
                current = Some(next);
            }
            None => {
                // No more specific rules; the inherited access governs the
                // rest of the path.
                min_rights = access;
                max_rights = access;
                current = None;
            }
        }
    }

    if recursive {
        // Every potential sub-path must hold the rights.
        min_rights.contains(required)
    } else {
        access.contains(required)
    }
}
