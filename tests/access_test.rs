//! End-to-end access decisions over complete rules files.

use std::io::Write;

use portcullis::{Access, Authz};

fn authz(text: &str) -> Authz {
    Authz::parse(&mut text.as_bytes(), None).unwrap()
}

fn check(authz: &Authz, repo: Option<&str>, path: &str, user: Option<&str>, required: Access) -> bool {
    authz
        .check_access(repo, Some(path), user, required, false)
        .unwrap()
}

fn check_recursive(authz: &Authz, path: &str, user: Option<&str>, required: Access) -> bool {
    authz
        .check_access(None, Some(path), user, required, true)
        .unwrap()
}

#[test]
fn root_deny_leaf_grant() {
    let a = authz("[/]\n* =\n[/trunk]\nalice = rw\n");

    assert!(!check(&a, None, "/", Some("alice"), Access::READ));
    assert!(check(&a, None, "/trunk", Some("alice"), Access::READ));
    assert!(check(&a, None, "/trunk/src/a.c", Some("alice"), Access::READ));
    assert!(!check(&a, None, "/branches", Some("alice"), Access::READ));
}

#[test]
fn recursive_admission() {
    let open = authz("[/]\n* =\n[/trunk]\nalice = rw\n");
    assert!(check_recursive(&open, "/trunk", Some("alice"), Access::READ));

    let with_secret = authz("[/]\n* =\n[/trunk]\nalice = rw\n[/trunk/secret]\nalice =\n");
    assert!(!check_recursive(&with_secret, "/trunk", Some("alice"), Access::READ));
    assert!(check(&with_secret, None, "/trunk", Some("alice"), Access::READ));
}

#[test]
fn group_with_alias() {
    let a = authz(
        "[aliases]\n\
         a1 = alice\n\
         [groups]\n\
         devs = &a1, bob\n\
         [/code]\n\
         @devs = rw\n",
    );

    assert!(check(&a, None, "/code/x", Some("alice"), Access::WRITE));
    assert!(check(&a, None, "/code/x", Some("bob"), Access::WRITE));
    assert!(!check(&a, None, "/code/x", Some("carol"), Access::READ));
}

#[test]
fn repository_scoping() {
    let a = authz("[repoA:/]\nalice = rw\n[repoB:/]\nalice =\n");

    assert!(check(&a, Some("repoA"), "/any", Some("alice"), Access::READ));
    assert!(!check(&a, Some("repoB"), "/any", Some("alice"), Access::READ));
    assert!(!check(&a, Some(""), "/any", Some("alice"), Access::READ));
    assert!(!check(&a, None, "/any", Some("alice"), Access::READ));
}

#[test]
fn anonymous_vs_authenticated() {
    let a = authz("[/]\n* = r\n[/priv]\n$anonymous =\n");

    assert!(check(&a, None, "/pub", None, Access::READ));
    assert!(!check(&a, None, "/priv", None, Access::READ));
    assert!(check(&a, None, "/priv", Some("alice"), Access::READ));
}

#[test]
fn group_cycle_rejected() {
    let err = Authz::parse(&mut "[groups]\na = @b\nb = @a\n".as_bytes(), None).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("Circular dependency"), "{msg}");
    assert!(msg.contains("'a'") && msg.contains("'b'"), "{msg}");
}

#[test]
fn deny_by_default_at_root() {
    let a = authz("");
    for user in [None, Some("alice")] {
        for path in ["/", "/trunk", "/deep/down/here"] {
            assert!(!check(&a, None, path, user, Access::READ));
            assert!(!check(&a, None, path, user, Access::WRITE));
        }
        assert!(!a.check_access(None, None, user, Access::READ, false).unwrap());
    }
}

#[test]
fn token_rules_reach_every_user() {
    let a = authz("[/]\n$authenticated = rw\n[/drop]\n* = w\n");

    assert!(check(&a, None, "/x", Some("alice"), Access::READ_WRITE));
    assert!(!check(&a, None, "/x", None, Access::READ));
    assert!(check(&a, None, "/drop", None, Access::WRITE));
}

#[test]
fn inverted_rules_end_to_end() {
    let a = authz("[groups]\ndevs = alice\n[/]\n~@devs = r\n");

    assert!(check(&a, None, "/x", Some("bob"), Access::READ));
    assert!(check(&a, None, "/x", None, Access::READ));
    // The section says nothing about devs, so the deny default applies.
    assert!(!check(&a, None, "/x", Some("alice"), Access::READ));
}

#[test]
fn reordering_rules_does_not_change_answers() {
    let texts = [
        "[groups]\ndevs = alice, bob\n[/]\n* = r\n[/code]\n@devs = w\ncarol = r\n[/code/gen]\n* =\n",
        "[/code]\ncarol = r\n@devs = w\n[/code/gen]\n* =\n[/]\n* = r\n[groups]\ndevs = bob, alice\n",
    ];
    let [a, b] = texts.map(authz);

    for user in [None, Some("alice"), Some("bob"), Some("carol"), Some("dave")] {
        for path in ["/", "/code", "/code/gen", "/code/x/y", "/other"] {
            for required in [Access::READ, Access::WRITE, Access::READ_WRITE] {
                for recursive in [false, true] {
                    assert_eq!(
                        a.check_access(None, Some(path), user, required, recursive).unwrap(),
                        b.check_access(None, Some(path), user, required, recursive).unwrap(),
                        "user={user:?} path={path} required={required} recursive={recursive}"
                    );
                }
            }
        }
    }
}

#[test]
fn recursive_grant_implies_grant_on_every_subpath() {
    let a = authz(
        "[/]\n* =\n[/trunk]\nalice = rw\n[/trunk/doc]\nalice = r\n[/branches]\nalice = r\n",
    );

    for prefix in ["/", "/trunk", "/trunk/doc", "/branches"] {
        if !check_recursive(&a, prefix, Some("alice"), Access::READ) {
            continue;
        }
        let extensions = [
            prefix.to_string(),
            format!("{}/sub", prefix.trim_end_matches('/')),
            format!("{}/sub/deeper/file.c", prefix.trim_end_matches('/')),
        ];
        for path in &extensions {
            assert!(
                check(&a, None, path, Some("alice"), Access::READ),
                "recursive grant on {prefix} but plain read denied on {path}"
            );
        }
    }
}

#[test]
fn loading_from_disk_matches_parsing_the_same_text() {
    let text = "[groups]\ndevs = alice\n[/]\n* = r\n[/code]\n@devs = rw\n";
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{text}").unwrap();

    let loaded = Authz::load(&file.path().display().to_string(), None, true).unwrap();
    let parsed = authz(text);

    for user in [None, Some("alice"), Some("bob")] {
        for path in ["/", "/code", "/code/x"] {
            for required in [Access::READ, Access::WRITE] {
                assert_eq!(
                    loaded.check_access(None, Some(path), user, required, false).unwrap(),
                    parsed.check_access(None, Some(path), user, required, false).unwrap(),
                );
            }
        }
    }
}
