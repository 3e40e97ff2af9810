//! Builds an [`Authz`] from files, URLs, or streams: retrieve, splice in
//! global groups, validate, done.

use std::io::Read;

use crate::config::Config;
use crate::errors::AuthzError;
use crate::retrieval::{self, ReposLocator};
use crate::validate;
use crate::Authz;

/// Load and validate a rules file from disk, optionally combined with a
/// global groups file.  A missing file yields a deny-all config unless
/// `must_exist` is set.
pub fn load(path: &str, groups_path: Option<&str>, must_exist: bool) -> Result<Authz, AuthzError> {
    load_with(None, path, groups_path, must_exist)
}

/// Like [`load`], but `file://` URLs resolve inside a repository through
/// `locator`.
pub fn load_with(
    locator: Option<&dyn ReposLocator>,
    path: &str,
    groups_path: Option<&str>,
    must_exist: bool,
) -> Result<Authz, AuthzError> {
    let mut config = retrieval::retrieve(locator, path, must_exist)?;

    if let Some(groups_path) = groups_path {
        let groups = retrieval::retrieve(locator, groups_path, must_exist)?;
        copy_groups(&mut config, &groups).map_err(|source| AuthzError::GroupsFile {
            path: path.to_string(),
            groups_path: groups_path.to_string(),
            source: Box::new(source),
        })?;
    }

    finish(config)
}

/// Parse and validate rules from a stream, optionally with a second
/// stream supplying global groups.
pub fn parse(
    rules: &mut dyn Read,
    groups: Option<&mut dyn Read>,
) -> Result<Authz, AuthzError> {
    let mut config = Config::from_reader(rules)?;

    if let Some(groups) = groups {
        let groups = Config::from_reader(groups)?;
        copy_groups(&mut config, &groups)?;
    }

    finish(config)
}

fn finish(config: Config) -> Result<Authz, AuthzError> {
    validate::validate(&config)?;

    tracing::info!(
        sections = config.section_count(),
        "Loaded authorization rules"
    );

    Ok(Authz { config })
}

/// Splice the groups file's `[groups]` into the main config.  Local group
/// definitions are prohibited once global groups are in play.
fn copy_groups(config: &mut Config, groups: &Config) -> Result<(), AuthzError> {
    if config.has_section("groups") {
        return Err(AuthzError::InvalidConfig(
            "Authz file cannot contain any groups when global groups are being used".to_string(),
        ));
    }

    if let Some(section) = groups.section("groups") {
        for (name, value) in section.entries() {
            config.set("groups", name, value);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Access;
    use std::io::Write;

    #[test]
    fn test_parse_and_query() {
        let authz = parse(&mut "[/]\nalice = rw\n".as_bytes(), None).unwrap();
        assert!(authz
            .check_access(None, Some("/x"), Some("alice"), Access::READ_WRITE, false)
            .unwrap());
    }

    #[test]
    fn test_parse_rejects_invalid_config() {
        let err = parse(&mut "[/]\n@ghosts = r\n".as_bytes(), None).unwrap_err();
        assert!(matches!(err, AuthzError::InvalidConfig(_)));
    }

    #[test]
    fn test_global_groups_are_spliced_in() {
        let authz = parse(
            &mut "[/code]\n@devs = rw\n".as_bytes(),
            Some(&mut "[groups]\ndevs = alice\n".as_bytes()),
        )
        .unwrap();
        assert!(authz
            .check_access(None, Some("/code"), Some("alice"), Access::WRITE, false)
            .unwrap());
        assert!(!authz
            .check_access(None, Some("/code"), Some("bob"), Access::READ, false)
            .unwrap());
    }

    #[test]
    fn test_local_groups_conflict_with_global_groups() {
        let err = parse(
            &mut "[groups]\ndevs = alice\n[/]\n@devs = r\n".as_bytes(),
            Some(&mut "[groups]\nstaff = bob\n".as_bytes()),
        )
        .unwrap_err();
        assert!(err
            .to_string()
            .contains("cannot contain any groups when global groups"));
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[/]\n* = r\n").unwrap();

        let authz = load(&file.path().display().to_string(), None, true).unwrap();
        assert!(authz
            .check_access(None, Some("/anything"), None, Access::READ, false)
            .unwrap());
    }

    #[test]
    fn test_load_with_groups_file() {
        let mut rules = tempfile::NamedTempFile::new().unwrap();
        write!(rules, "[/code]\n@devs = rw\n").unwrap();
        let mut groups = tempfile::NamedTempFile::new().unwrap();
        write!(groups, "[groups]\ndevs = alice\n").unwrap();

        let authz = load(
            &rules.path().display().to_string(),
            Some(&groups.path().display().to_string()),
            true,
        )
        .unwrap();
        assert!(authz
            .check_access(None, Some("/code"), Some("alice"), Access::READ, false)
            .unwrap());
    }

    #[test]
    fn test_load_groups_conflict_wraps_both_paths() {
        let mut rules = tempfile::NamedTempFile::new().unwrap();
        write!(rules, "[groups]\ndevs = alice\n").unwrap();
        let mut groups = tempfile::NamedTempFile::new().unwrap();
        write!(groups, "[groups]\nstaff = bob\n").unwrap();

        let err = load(
            &rules.path().display().to_string(),
            Some(&groups.path().display().to_string()),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, AuthzError::GroupsFile { .. }));
    }

    #[test]
    fn test_missing_rules_file_denies_everything() {
        let authz = load("/nonexistent/authz", None, false).unwrap();
        assert!(!authz
            .check_access(None, Some("/"), Some("alice"), Access::READ, false)
            .unwrap());
        assert!(!authz
            .check_access(None, None, Some("alice"), Access::READ, false)
            .unwrap());
    }
}
