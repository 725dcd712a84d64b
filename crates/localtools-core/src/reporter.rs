//! Reporter trait for dependency injection
//!
//! Core operations report progress through this trait so they are not tied
//! to a particular console or UI.

use std::path::Path;

/// Receives progress events from install passes.
pub trait Reporter: Send + Sync {
    /// The requested set matches the manifest; nothing will be installed.
    fn up_to_date(&self, count: usize);

    /// An install pass over `count` installables is starting.
    fn starting(&self, count: usize);

    /// An installable's install action is about to run.
    fn installing(&self, identity: &str);

    /// A download has started.
    fn fetching(&self, url: &str, total: Option<u64>);

    /// A cache entry was reused instead of downloading.
    fn cache_hit(&self, cache_key: &str);

    /// An archive is being unpacked.
    fn extracting(&self, archive: &Path, dest: &Path);

    /// An installable finished installing.
    fn installed(&self, identity: &str);

    /// The environment script and manifest were written.
    fn summary(&self, count: usize, elapsed_secs: f64);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn up_to_date(&self, count: usize) {
        (**self).up_to_date(count);
    }
    fn starting(&self, count: usize) {
        (**self).starting(count);
    }
    fn installing(&self, identity: &str) {
        (**self).installing(identity);
    }
    fn fetching(&self, url: &str, total: Option<u64>) {
        (**self).fetching(url, total);
    }
    fn cache_hit(&self, cache_key: &str) {
        (**self).cache_hit(cache_key);
    }
    fn extracting(&self, archive: &Path, dest: &Path) {
        (**self).extracting(archive, dest);
    }
    fn installed(&self, identity: &str) {
        (**self).installed(identity);
    }
    fn summary(&self, count: usize, elapsed_secs: f64) {
        (**self).summary(count, elapsed_secs);
    }
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn up_to_date(&self, _: usize) {}
    fn starting(&self, _: usize) {}
    fn installing(&self, _: &str) {}
    fn fetching(&self, _: &str, _: Option<u64>) {}
    fn cache_hit(&self, _: &str) {}
    fn extracting(&self, _: &Path, _: &Path) {}
    fn installed(&self, _: &str) {}
    fn summary(&self, _: usize, _: f64) {}
}
