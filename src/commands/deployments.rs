use anyhow::{Context, Result};
use futures::StreamExt;
use tracing::debug;

use crate::models::deployment::Deployment;
use crate::session::Session;

pub async fn list(session: &mut Session) -> Result<()> {
    let app = session.config().require_app()?.to_string();

    let deployments = session
        .with_client(|client| {
            let app = &app;
            async move { client.list_deployments(app).await }
        })
        .await
        .with_context(|| format!("Failed to list deployments of '{}'", app))?;

    if deployments.is_empty() {
        println!("No deployment for '{}' yet.", app);
        return Ok(());
    }

    println!("{}", format_header());
    for deployment in &deployments {
        println!("{}", format_row(deployment));
    }
    Ok(())
}

pub async fn logs(session: &mut Session, deployment_id: &str) -> Result<()> {
    let app = session.config().require_app()?.to_string();

    let output = session
        .with_client(|client| {
            let app = &app;
            async move { client.deployment_log(app, deployment_id).await }
        })
        .await?;
    print!("{}", output);
    if !output.is_empty() && !output.ends_with('\n') {
        println!();
    }
    Ok(())
}

/// Print deployment events until the platform closes the stream or the user
/// hits Ctrl-C.
pub async fn follow(session: &mut Session) -> Result<()> {
    let app = session.config().require_app()?.to_string();

    let events = session
        .with_client(|client| {
            let app = &app;
            async move { client.stream_deployment_events(app).await }
        })
        .await
        .with_context(|| format!("Failed to follow deployments of '{}'", app))?;
    let mut events = Box::pin(events);

    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(event) => {
                    let event = event?;
                    match event.render() {
                        Some(line) => println!("{}", line),
                        None => debug!(kind = %event.kind, "skipping event"),
                    }
                }
                None => {
                    debug!("deployment stream closed by the platform");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted, stop following");
                break;
            }
        }
    }
    Ok(())
}

fn format_header() -> String {
    format!(
        "{:<26} {:<20} {:<14} {:<16} {:>8}  {}",
        "ID", "DATE", "STATUS", "PUSHER", "DURATION", "GIT REF"
    )
}

fn format_row(deployment: &Deployment) -> String {
    let duration = deployment
        .duration
        .map(|secs| format!("{}m{:02}s", secs / 60, secs % 60))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:<26} {:<20} {:<14} {:<16} {:>8}  {}",
        deployment.id,
        deployment.created_at.format("%Y/%m/%d %H:%M:%S").to_string(),
        deployment.status,
        deployment.pusher_name(),
        duration,
        deployment.git_ref.as_deref().unwrap_or("-"),
    )
}
