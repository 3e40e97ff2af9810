use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AuthzError {
    #[error("Failed to read authz file `{path}`")]
    #[diagnostic(
        code(portcullis::authz::rules_load),
        help("Check that the file exists and is readable")
    )]
    RulesLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {reason}")]
    #[diagnostic(
        code(portcullis::authz::config_syntax),
        help("Rules files are INI-style: `[section]` headers followed by `key = value` entries")
    )]
    ConfigSyntax { line: usize, reason: String },

    #[error("Error while parsing rules file `{path}`")]
    #[diagnostic(code(portcullis::authz::rules_parse))]
    InvalidRulesFile {
        path: String,
        #[source]
        source: Box<AuthzError>,
    },

    #[error("Error reading authz file `{path}` with groups file `{groups_path}`")]
    #[diagnostic(code(portcullis::authz::groups_file))]
    GroupsFile {
        path: String,
        groups_path: String,
        #[source]
        source: Box<AuthzError>,
    },

    #[error("{0}")]
    #[diagnostic(
        code(portcullis::authz::invalid_config),
        help("Authorization refuses to run on uncertain rules; fix the rules file and reload")
    )]
    InvalidConfig(String),

    #[error("{0}")]
    #[diagnostic(code(portcullis::authz::illegal_target))]
    IllegalTarget(String),

    #[error("Unable to find repository at `{0}`")]
    #[diagnostic(code(portcullis::authz::repos_not_found))]
    ReposNotFound(String),

    #[error("Access query path `{0}` must start with '/'")]
    #[diagnostic(code(portcullis::authz::query_path))]
    QueryPath(String),

    #[error("I/O error: {0}")]
    #[diagnostic(code(portcullis::authz::io))]
    Io(#[from] std::io::Error),
}
