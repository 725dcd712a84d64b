//! The installed-set manifest (`<target>/.manifest`).
//!
//! A pretty-printed JSON array of identity strings, sorted. The target is
//! considered up to date exactly when the sorted identities of the requested
//! set equal the persisted list. A missing or unreadable manifest means "not
//! up to date", which makes any interrupted pass retry everything.

use std::path::Path;

use tracing::{debug, warn};

use crate::installable::Installable;
use crate::{io, paths};

/// Sorted identities of `installs`.
pub fn identities<I: Installable>(installs: &[I]) -> Vec<String> {
    let mut ids: Vec<String> = installs.iter().map(|i| i.identity().to_string()).collect();
    ids.sort();
    ids
}

/// Read the persisted identity list. `None` if absent or unparseable.
pub async fn read(target: &Path) -> Option<Vec<String>> {
    let path = paths::manifest_path(target);
    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("no manifest at {}", path.display());
            return None;
        }
        Err(e) => {
            warn!("cannot read {}: {e}", path.display());
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(ids) => Some(ids),
        Err(e) => {
            warn!("ignoring corrupt manifest {}: {e}", path.display());
            None
        }
    }
}

/// True iff the persisted list, once sorted, equals the sorted identities of
/// `installs`.
pub async fn is_up_to_date<I: Installable>(installs: &[I], target: &Path) -> bool {
    let Some(mut existing) = read(target).await else {
        return false;
    };
    existing.sort();
    let needed = identities(installs);
    let up_to_date = existing == needed;
    debug!(
        "manifest has {} entries, {} requested, up to date: {up_to_date}",
        existing.len(),
        needed.len()
    );
    up_to_date
}

/// Persist the sorted identities of `installs`.
pub async fn write<I: Installable>(installs: &[I], target: &Path) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(&identities(installs))?;
    io::write_atomic(&paths::manifest_path(target), json.as_bytes()).await
}
