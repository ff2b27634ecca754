use chrono::Utc;
use tracing::debug;

use super::envelope::{
    CURRENT_VERSION, ConfigPerHost, Envelope, LegacyEnvelope, UserRecord, V1Envelope,
};
use crate::error::{CliError, Result};

/// Upgrade an envelope to the current multi-host format.
///
/// A legacy file holds a single user with no host key, so the caller names the
/// host it belonged to. Envelopes that are already versioned come back as-is,
/// which makes the migration idempotent. Nothing here touches the disk.
pub fn migrate(envelope: Envelope, host: &str) -> Result<V1Envelope> {
    match envelope {
        Envelope::V1(envelope) => Ok(envelope),
        Envelope::Legacy(legacy) => migrate_legacy(legacy, host),
    }
}

fn migrate_legacy(legacy: LegacyEnvelope, host: &str) -> Result<V1Envelope> {
    let user: Option<UserRecord> = serde_json::from_value(legacy.auth_config_per_host)
        .map_err(|e| CliError::corruption(format!("legacy credential payload: {e}")))?;

    debug!(host, cleared = user.is_none(), "migrating legacy credential file");

    let mut per_host = ConfigPerHost::new();
    per_host.insert(host.to_string(), user);

    Ok(V1Envelope {
        version: CURRENT_VERSION.to_string(),
        last_update: legacy.last_update.unwrap_or_else(Utc::now),
        auth_config_per_host: per_host,
    })
}
