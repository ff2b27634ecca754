use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::api::ArchiveSource;
use crate::models::deployment::ArchiveFormat;
use crate::session::Session;

pub async fn run(
    session: &mut Session,
    archive: &str,
    git_ref: Option<&str>,
    war: bool,
) -> Result<()> {
    let app = session.config().require_app()?.to_string();
    let source = ArchiveSource::parse(archive);
    let format = if war {
        ArchiveFormat::War
    } else {
        ArchiveFormat::TarGz
    };

    if let ArchiveSource::Local(path) = &source {
        validate_local_archive(path, format)?;
    }

    match format {
        ArchiveFormat::War => println!("Deploy a WAR archive"),
        ArchiveFormat::TarGz => println!("Deploy an archive"),
    }
    if let ArchiveSource::Local(path) = &source {
        println!("Uploading {}...", path.display());
    }

    let deployment = session
        .with_client(|client| {
            let (app, source) = (&app, &source);
            async move { client.trigger_deployment(app, source, git_ref, format).await }
        })
        .await
        .with_context(|| format!("Failed to deploy '{}'", app))?;

    println!(
        "Deployment {} of '{}' started (status: {}).",
        deployment.id, app, deployment.status
    );
    println!("Follow it with `paas -a {} deployment-follow`.", app);
    Ok(())
}

fn validate_local_archive(path: &Path, format: ArchiveFormat) -> Result<()> {
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }

    let metadata = path
        .metadata()
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if !metadata.is_file() {
        bail!("{} is not a file", path.display());
    }

    if format == ArchiveFormat::War {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if ext != "war" {
            bail!("WAR deployments need a .war file (got .{})", ext);
        }
    }
    Ok(())
}
