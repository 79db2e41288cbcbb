use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "tabvault", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    /// Configuration file [default: ./tabvault.toml]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract uploaded archives into individual objects
    #[command(alias = "x", name = "extract")]
    Extract(ExtractArgs),
    /// Issue a signed POST grant for a browser upload
    #[command(name = "issue-upload")]
    IssueUpload(BodyArgs),
    /// Delete every object in a folder
    #[command(name = "delete-folder")]
    DeleteFolder(DeleteFolderArgs),
    /// Delete specific objects
    #[command(alias = "rm", name = "delete-files")]
    DeleteFiles(DeleteFilesArgs),
    /// Merge metadata into an existing object
    #[command(name = "patch-metadata")]
    PatchMetadata(BodyArgs),
    /// Write a local file into the store
    #[command(name = "put")]
    Put(PutArgs),
}

#[derive(Clone, Debug, Args)]
pub struct AuthArgs {
    /// Bearer token of the caller
    #[arg(long, env = "TABVAULT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

impl AuthArgs {
    /// The token as an `authorization` header value.
    pub fn authorization(&self) -> Option<String> {
        self.token.as_deref().map(|token| match token.strip_prefix("Bearer ") {
            Some(_) => token.to_owned(),
            None => format!("Bearer {token}"),
        })
    }
}

#[derive(Clone, Debug, Args)]
#[command(group(ArgGroup::new("source").required(true).args(["event", "bucket"])))]
pub struct ExtractArgs {
    /// Object-created notification (JSON file)
    #[arg(long)]
    pub event: Option<PathBuf>,
    /// Bucket of a single archive
    #[arg(long, requires = "key")]
    pub bucket: Option<String>,
    /// Key of a single archive
    #[arg(long, requires = "bucket")]
    pub key: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct BodyArgs {
    #[command(flatten)]
    pub auth: AuthArgs,
    /// Request body as JSON
    #[arg(long)]
    pub body: String,
}

#[derive(Clone, Debug, Args)]
pub struct DeleteFolderArgs {
    #[command(flatten)]
    pub auth: AuthArgs,
    /// Folder below the key prefix; may be percent-encoded
    pub name: String,
}

#[derive(Clone, Debug, Args)]
pub struct DeleteFilesArgs {
    #[command(flatten)]
    pub auth: AuthArgs,
    #[arg(required = true)]
    pub keys: Vec<String>,
}

#[derive(Clone, Debug, Args)]
pub struct PutArgs {
    pub file: PathBuf,
    #[arg(long)]
    pub bucket: String,
    #[arg(long)]
    pub key: String,
    /// Inferred from the key's extension when omitted
    #[arg(long)]
    pub content_type: Option<String>,
    /// User metadata, repeatable
    #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub meta: Vec<(String, String)>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.to_owned()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_is_well_formed() {
        App::command().debug_assert();
    }

    #[test]
    fn extract_needs_a_source() {
        assert!(App::try_parse_from(["tabvault", "extract"]).is_err());
        assert!(App::try_parse_from(["tabvault", "extract", "--bucket", "b"]).is_err());
        let app = App::try_parse_from(["tabvault", "extract", "--bucket", "b", "--key", "k"]).unwrap();
        assert!(matches!(app.cmd, Commands::Extract(ExtractArgs { bucket: Some(_), .. })));
        assert!(
            App::try_parse_from(["tabvault", "extract", "--event", "e.json", "--bucket", "b", "--key", "k"])
                .is_err()
        );
    }

    #[test]
    fn put_parses_metadata_pairs() {
        let app = App::try_parse_from([
            "tabvault", "put", "a.zip", "--bucket", "zips", "--key", "uploads/a.zip", "--meta",
            "target-folder=tabs/demo", "--meta", "note=a=b",
        ])
        .unwrap();
        let Commands::Put(put) = app.cmd else {
            panic!("expected put");
        };
        assert_eq!(
            put.meta,
            vec![
                ("target-folder".to_string(), "tabs/demo".to_string()),
                ("note".to_string(), "a=b".to_string()),
            ]
        );
        assert!(parse_key_value("novalue").is_err());
    }

    #[test]
    fn token_becomes_bearer_header() {
        let auth = AuthArgs {
            token: Some("abc".into()),
        };
        assert_eq!(auth.authorization().as_deref(), Some("Bearer abc"));
        let auth = AuthArgs {
            token: Some("Bearer abc".into()),
        };
        assert_eq!(auth.authorization().as_deref(), Some("Bearer abc"));
    }
}
