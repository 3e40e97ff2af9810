//! Portcullis - path-based access control for version-control servers.
//!
//! Rules live in an INI-style file: `[groups]` and `[aliases]` define who
//! is who, and `[/path]` / `[repo:/path]` sections assign read/write
//! rights to users, groups, aliases, and tokens.  [`Authz::load`] or
//! [`Authz::parse`] build a validated handle; [`Authz::check_access`]
//! answers single-path and recursive queries by compiling the rules that
//! apply to one `(repository, user)` pair into a segment-indexed prefix
//! tree and walking it.

pub mod access;
pub mod config;
pub mod engine;
pub mod errors;
pub mod identity;
pub mod loader;
pub mod retrieval;
pub mod rules;
pub mod validate;

use std::io::Read;

pub use access::Access;
pub use errors::AuthzError;

/// Loaded and validated authorization rules.
///
/// Immutable after construction; queries never mutate it, so one handle
/// may serve concurrent read-only queries without synchronization.
#[derive(Debug, Clone)]
pub struct Authz {
    pub(crate) config: config::Config,
}

impl Authz {
    /// Load rules from disk (see [`loader::load`]).
    pub fn load(
        path: &str,
        groups_path: Option<&str>,
        must_exist: bool,
    ) -> Result<Self, AuthzError> {
        loader::load(path, groups_path, must_exist)
    }

    /// Parse rules from a stream (see [`loader::parse`]).
    pub fn parse(
        rules: &mut dyn Read,
        groups: Option<&mut dyn Read>,
    ) -> Result<Self, AuthzError> {
        loader::parse(rules, groups)
    }

    /// Decide whether `user` (`None` for anonymous) holds `required` on
    /// `path` within `repos_name`.
    ///
    /// With no path, answers whether the user holds `required` anywhere
    /// in the repository.  With `recursive`, the rights must hold on the
    /// path and every potential path below it.
    pub fn check_access(
        &self,
        repos_name: Option<&str>,
        path: Option<&str>,
        user: Option<&str>,
        required: Access,
        recursive: bool,
    ) -> Result<bool, AuthzError> {
        engine::check(&self.config, repos_name, path, user, required, recursive)
    }

    /// The raw rules document backing this handle.
    pub fn config(&self) -> &config::Config {
        &self.config
    }
}
