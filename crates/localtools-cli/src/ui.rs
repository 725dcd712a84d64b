//! Console output for install passes.

use std::path::Path;

use crossterm::style::Stylize;
use localtools_core::Reporter;

/// Prints progress lines to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    /// With `verbose`, cache hits and extraction steps are printed too.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "tool" } else { "tools" }
}

impl Reporter for ConsoleReporter {
    fn up_to_date(&self, count: usize) {
        println!(
            "{} {count} {} already installed",
            "✓".green(),
            plural(count)
        );
    }

    fn starting(&self, count: usize) {
        println!("{} {count} {}", "Installing".bold(), plural(count));
    }

    fn installing(&self, identity: &str) {
        println!("  {} {identity}", "→".cyan());
    }

    fn fetching(&self, url: &str, total: Option<u64>) {
        match total {
            Some(bytes) => println!(
                "    {} {url} {}",
                "download".dark_grey(),
                format!("({:.1} MiB)", bytes as f64 / 1_048_576.0).dark_grey()
            ),
            None => println!("    {} {url}", "download".dark_grey()),
        }
    }

    fn cache_hit(&self, cache_key: &str) {
        if self.verbose {
            println!("    {} {cache_key}", "cached".dark_grey());
        }
    }

    fn extracting(&self, archive: &Path, dest: &Path) {
        if self.verbose {
            println!(
                "    {} {} -> {}",
                "extract".dark_grey(),
                archive.display(),
                dest.display()
            );
        }
    }

    fn installed(&self, identity: &str) {
        println!("  {} {identity}", "✓".green());
    }

    fn summary(&self, count: usize, elapsed_secs: f64) {
        println!(
            "{} {count} {} in {elapsed_secs:.1}s",
            "Installed".green().bold(),
            plural(count)
        );
    }
}
