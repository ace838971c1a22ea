//! Locating report files on disk.
//!
//! Reports are named `<prefix>_<YYYY-MM-DDTHH_MM_SS>.gurka`. Files in the
//! reports directory that do not follow the pattern are ignored.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::report::Testrun;

static REPORT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"_(?<date>\d{4}-\d{2}-\d{2}T\d{2}_\d{2}_\d{2})\.gurka$").expect("report name pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFile {
    pub path: PathBuf,
    pub file_name: String,
    /// Run timestamp as `YYYY-MM-DDTHH:MM:SS`; sorts chronologically as text.
    pub timestamp: String,
}

impl ReportFile {
    pub fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_string();
        let caps = REPORT_NAME.captures(&file_name)?;
        let timestamp = caps["date"].replace('_', ":");
        Some(Self { path: path.to_path_buf(), file_name, timestamp })
    }
}

/// Report files directly inside `dir`, oldest first.
///
/// A missing directory is created so a fresh install starts empty instead of failing.
pub fn discover_reports(dir: &Path) -> Vec<ReportFile> {
    if !dir.exists() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!(dir = %dir.display(), error = %e, "failed to create reports directory");
        }
        return Vec::new();
    }
    let mut reports: Vec<ReportFile> = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| ReportFile::from_path(e.path()))
        .collect();
    reports.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.file_name.cmp(&b.file_name)));
    debug!(dir = %dir.display(), count = reports.len(), "discovered reports");
    reports
}

fn read_report(report: &ReportFile) -> Option<Testrun> {
    match Testrun::read(&report.path) {
        Ok(run) => Some(run),
        Err(e) => {
            warn!(error = %e, "skipping report");
            None
        }
    }
}

/// Product names across every report, compared case-insensitively.
///
/// The first spelling encountered is the one returned.
pub fn unique_product_names(dir: &Path) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for report in discover_reports(dir) {
        let Some(run) = read_report(&report) else { continue };
        for product in run.products {
            if seen.insert(product.name.to_lowercase()) {
                names.push(product.name);
            }
        }
    }
    names
}

/// Newest report containing `product`, together with the file it came from.
pub fn latest_run(dir: &Path, product: &str) -> Option<(ReportFile, Testrun)> {
    discover_reports(dir)
        .into_iter()
        .rev()
        .filter_map(|report| read_report(&report).map(|run| (report, run)))
        .find(|(_, run)| run.product(product).is_some())
}
