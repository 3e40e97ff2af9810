use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use portcullis::{Access, Authz};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "portcullis",
    version,
    about = "Path-based authorization for version-control repositories"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that a rules file loads and validates
    Validate {
        /// Path to the rules file
        file: String,

        /// Path to a global groups file
        #[arg(long)]
        groups: Option<String>,
    },
    /// Print the access a user has on a path
    Accessof {
        /// Path to the rules file
        file: String,

        /// Path to a global groups file
        #[arg(long)]
        groups: Option<String>,

        /// User name; omit for anonymous
        #[arg(short, long)]
        user: Option<String>,

        /// Repository name; omit to match only unscoped rules
        #[arg(short, long)]
        repository: Option<String>,

        /// Absolute path inside the repository, e.g. /trunk/src
        #[arg(short, long)]
        path: Option<String>,

        /// Instead of printing the rights, test for these (r, w, or rw)
        /// and answer yes/no; "no" also sets a nonzero exit status
        #[arg(long)]
        is: Option<Access>,

        /// Require the rights over the entire subtree
        #[arg(short = 'R', long)]
        recursive: bool,

        /// Emit the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Serialize)]
struct AccessReport {
    user: Option<String>,
    repository: Option<String>,
    path: Option<String>,
    recursive: bool,
    access: String,
}

fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Validate { file, groups } => {
            Authz::load(&file, groups.as_deref(), true)?;
            println!("{file}: OK");
        }
        Command::Accessof {
            file,
            groups,
            user,
            repository,
            path,
            is,
            recursive,
            json,
        } => {
            let authz = Authz::load(&file, groups.as_deref(), true)?;

            if let Some(required) = is {
                let granted = authz.check_access(
                    repository.as_deref(),
                    path.as_deref(),
                    user.as_deref(),
                    required,
                    recursive,
                )?;
                if json {
                    println!("{}", serde_json::json!({ "granted": granted }));
                } else {
                    println!("{}", if granted { "yes" } else { "no" });
                }
                if !granted {
                    std::process::exit(1);
                }
                return Ok(());
            }

            let mut rights = Access::NONE;
            for probe in [Access::READ, Access::WRITE] {
                if authz.check_access(
                    repository.as_deref(),
                    path.as_deref(),
                    user.as_deref(),
                    probe,
                    recursive,
                )? {
                    rights |= probe;
                }
            }

            if json {
                let report = AccessReport {
                    user,
                    repository,
                    path,
                    recursive,
                    access: rights.to_string(),
                };
                println!("{}", serde_json::to_string(&report).into_diagnostic()?);
            } else {
                println!("{rights}");
            }
        }
    }

    Ok(())
}
