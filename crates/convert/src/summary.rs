use crate::format::Legacy;
use crate::task::Outcome;
use serde::Serialize;

/// Aggregated result of a batch.
///
/// Every processed file lands in exactly one counter, so
/// `copied + converted_doc + converted_xls + failed == total` always holds.
/// Only the batch processor can build one; it's read-only afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    total: u64,
    copied: u64,
    converted_doc: u64,
    converted_xls: u64,
    failed: u64,
    /// Paths (relative to the input root) of every failed file, in
    /// processing order.
    failed_files: Vec<String>,
}

impl Summary {
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn copied(&self) -> u64 {
        self.copied
    }

    pub fn converted(&self, legacy: Legacy) -> u64 {
        match legacy {
            Legacy::Doc => self.converted_doc,
            Legacy::Xls => self.converted_xls,
        }
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }

    pub fn failed_files(&self) -> &[String] {
        &self.failed_files
    }

    /// `true` when no file failed.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Running totals while a batch is in progress.
pub(crate) struct Tally(Summary);
impl Tally {
    pub(crate) fn new(total: u64) -> Self {
        Self(Summary { total, ..Summary::default() })
    }

    pub(crate) fn record(&mut self, relative: impl Into<String>, outcome: Outcome) {
        let summary = &mut self.0;
        match outcome {
            Outcome::Copied => summary.copied += 1,
            Outcome::Converted(Legacy::Doc) => summary.converted_doc += 1,
            Outcome::Converted(Legacy::Xls) => summary.converted_xls += 1,
            Outcome::Failed(_) => {
                summary.failed += 1;
                summary.failed_files.push(relative.into());
            },
        }
    }

    pub(crate) fn finish(self) -> Summary {
        self.0
    }
}
