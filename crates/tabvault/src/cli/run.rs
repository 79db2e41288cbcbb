use std::sync::Arc;

use anyhow::{Context, Result};
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use tabvault_admin::{
    AccessGuard, CredentialIssuer, DeletionService, MetadataService, PatchRequest, UploadRequest,
};
use tabvault_extract::{Extractor, ObjectRef};
use tabvault_store::{ObjectMeta, ObjectStore};
use tracing::info;

use super::app::{
    AuthArgs, BodyArgs, Commands, DeleteFilesArgs, DeleteFolderArgs, ExtractArgs, PutArgs,
};
use crate::backend::Backend;
use crate::config::Config;

/// Result of one command: JSON for stdout and whether it fully succeeded.
#[derive(Debug)]
pub struct Report {
    pub body: Value,
    pub success: bool,
}

impl Report {
    fn ok(body: impl Serialize) -> Result<Self> {
        Ok(Self {
            body: serde_json::to_value(body)?,
            success: true,
        })
    }
}

pub struct Runner {
    config: Config,
    store: Arc<Backend>,
}

impl Runner {
    pub fn new(config: Config) -> Self {
        let store = Arc::new(Backend::from_config(&config.storage));
        Self { config, store }
    }

    pub async fn run(&self, cmd: Commands) -> Result<Report> {
        match cmd {
            Commands::Extract(args) => self.extract(args).await,
            Commands::IssueUpload(args) => self.issue_upload(args),
            Commands::DeleteFolder(args) => self.delete_folder(args).await,
            Commands::DeleteFiles(args) => self.delete_files(args).await,
            Commands::PatchMetadata(args) => self.patch_metadata(args).await,
            Commands::Put(args) => self.put(args).await,
        }
    }

    fn authorize(&self, auth: &AuthArgs) -> Result<()> {
        AccessGuard::new(&self.config.access.admin_group)
            .claim(&self.config.access.group_claim)
            .authorize(auth.authorization().as_deref())
            .context("admin access required")?;
        Ok(())
    }

    async fn extract(&self, args: ExtractArgs) -> Result<Report> {
        let extractor = Extractor::new(Arc::clone(&self.store), self.config.extract_settings());
        let outcomes = match (args.event, args.bucket, args.key) {
            (Some(path), _, _) => {
                let raw = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("failed to read event file {}", path.display()))?;
                extractor.handle_event(&raw).await?
            }
            (None, Some(bucket), Some(key)) => {
                vec![extractor.extract(&ObjectRef::new(bucket, key)).await]
            }
            _ => anyhow::bail!("either --event or --bucket with --key is required"),
        };

        let success = outcomes.iter().all(|outcome| outcome.is_completed());
        Ok(Report {
            body: serde_json::to_value(&outcomes)?,
            success,
        })
    }

    fn issue_upload(&self, args: BodyArgs) -> Result<Report> {
        self.authorize(&args.auth)?;
        let request: UploadRequest =
            serde_json::from_str(&args.body).context("invalid upload request")?;
        let issuer = CredentialIssuer::new(
            &self.config.buckets.archive,
            &self.config.buckets.extracted,
            self.config.signing_keys(),
        )
        .expires_in(self.config.signing.expires_in)
        .max_upload_bytes(self.config.signing.max_upload_bytes);
        Report::ok(issuer.issue(request)?)
    }

    async fn delete_folder(&self, args: DeleteFolderArgs) -> Result<Report> {
        self.authorize(&args.auth)?;
        let report = self.deletion().delete_folder(&args.name).await?;
        Ok(Report {
            success: report.errors.is_empty(),
            body: serde_json::to_value(report)?,
        })
    }

    async fn delete_files(&self, args: DeleteFilesArgs) -> Result<Report> {
        self.authorize(&args.auth)?;
        let report = self.deletion().delete_keys(&args.keys).await?;
        Ok(Report {
            success: report.errors.is_empty(),
            body: serde_json::to_value(report)?,
        })
    }

    async fn patch_metadata(&self, args: BodyArgs) -> Result<Report> {
        self.authorize(&args.auth)?;
        let request: PatchRequest =
            serde_json::from_str(&args.body).context("invalid metadata request")?;
        let result = MetadataService::new(Arc::clone(&self.store)).patch(request).await?;
        Report::ok(result)
    }

    async fn put(&self, args: PutArgs) -> Result<Report> {
        let body = tokio::fs::read(&args.file)
            .await
            .with_context(|| format!("failed to read {}", args.file.display()))?;
        let content_type = args
            .content_type
            .unwrap_or_else(|| tabvault_archive::content_type_for(&args.key).to_owned());
        let meta = ObjectMeta::new(content_type).with_metadata(args.meta.into_iter().collect());
        let size = body.len();

        self.store
            .put(&args.bucket, &args.key, Bytes::from(body), meta)
            .await
            .with_context(|| format!("failed to write {}/{}", args.bucket, args.key))?;
        info!(bucket = %args.bucket, key = %args.key, size, "object written");
        Report::ok(serde_json::json!({
            "bucket": args.bucket,
            "key": args.key,
            "size": size,
        }))
    }

    fn deletion(&self) -> DeletionService<Backend> {
        DeletionService::new(
            Arc::clone(&self.store),
            &self.config.buckets.extracted,
            &self.config.extract.prefix,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

    use super::*;
    use crate::config::StorageBackend;

    fn runner() -> Runner {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Memory;
        config.signing.access_key_id = "AKID".into();
        config.signing.secret_access_key = "secret".into();
        Runner::new(config)
    }

    fn admin() -> AuthArgs {
        let claims = URL_SAFE_NO_PAD.encode(br#"{"cognito:groups":["admins"]}"#);
        AuthArgs {
            token: Some(format!("e30.{claims}.sig")),
        }
    }

    fn demo_zip(dir: &std::path::Path) -> std::path::PathBuf {
        let path = dir.join("demo.zip");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("a.txt", options).unwrap();
        writer.write_all(b"alpha").unwrap();
        writer.start_file(".DS_Store", options).unwrap();
        writer.write_all(b"junk").unwrap();
        writer.finish().unwrap();
        path
    }

    #[tokio::test]
    async fn put_then_extract() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner();

        let put = runner
            .run(Commands::Put(PutArgs {
                file: demo_zip(dir.path()),
                bucket: "tabvault-archives".into(),
                key: "uploads/1_demo.zip".into(),
                content_type: None,
                meta: vec![("target-folder".into(), "demo".into())],
            }))
            .await
            .unwrap();
        assert!(put.success);

        let report = runner
            .run(Commands::Extract(ExtractArgs {
                event: None,
                bucket: Some("tabvault-archives".into()),
                key: Some("uploads/1_demo.zip".into()),
            }))
            .await
            .unwrap();
        assert!(report.success);
        assert_eq!(report.body[0]["written"], serde_json::json!(["tabs/demo/a.txt"]));
        assert_eq!(report.body[0]["skipped_count"], 1);
        assert_eq!(report.body[0]["source_deleted"], true);
    }

    #[tokio::test]
    async fn extract_of_missing_source_is_unsuccessful() {
        let report = runner()
            .run(Commands::Extract(ExtractArgs {
                event: None,
                bucket: Some("tabvault-archives".into()),
                key: Some("uploads/none.zip".into()),
            }))
            .await
            .unwrap();
        assert!(!report.success);
        assert_eq!(report.body[0]["overall_status"], "SourceMissing");
    }

    #[tokio::test]
    async fn admin_commands_are_guarded() {
        let err = runner()
            .run(Commands::DeleteFiles(DeleteFilesArgs {
                auth: AuthArgs { token: None },
                keys: vec!["tabs/demo/a.txt".into()],
            }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("admin access required"));
    }

    #[tokio::test]
    async fn issue_upload_for_admin() {
        let report = runner()
            .run(Commands::IssueUpload(BodyArgs {
                auth: admin(),
                body: r#"{"folder_prefix": "tabs", "folder_name": "demo", "file_name": "notes.md"}"#
                    .into(),
            }))
            .await
            .unwrap();
        assert_eq!(report.body["bucket"], "tabvault-extracted");
        assert_eq!(report.body["key"], "tabs/demo/notes.md");
        assert_eq!(report.body["expires_in"], 3600);
    }
}
