//! Progress reporting for document processing.
//!
//! Progress is a pure notification (current, total, stage) with no
//! backpressure semantics; callers may ignore it entirely.

use std::fmt;

/// Processing stages for a single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingStage {
    /// Analyzing page content bounds
    #[default]
    Analyzing,
    /// Applying crop boxes and scaling
    Cropping,
    /// Writing the output PDF
    WritingPdf,
    /// Completed
    Completed,
}

impl ProcessingStage {
    /// English name of the stage.
    pub fn name(&self) -> &'static str {
        match self {
            ProcessingStage::Analyzing => "Analyzing",
            ProcessingStage::Cropping => "Cropping",
            ProcessingStage::WritingPdf => "WritingPdf",
            ProcessingStage::Completed => "Completed",
        }
    }

    /// Japanese description of the stage.
    pub fn description_ja(&self) -> &'static str {
        match self {
            ProcessingStage::Analyzing => "分析中",
            ProcessingStage::Cropping => "クロップ中",
            ProcessingStage::WritingPdf => "PDF生成中",
            ProcessingStage::Completed => "完了",
        }
    }
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.description_ja())
    }
}

/// Synchronous observer for per-page progress.
///
/// `current` counters are monotonically increasing within a stage and end at
/// `total`.
pub trait ProgressCallback: Sync {
    /// A stage has started.
    fn on_stage_start(&self, _stage: ProcessingStage) {}

    /// A page within the current stage finished (1-based current).
    fn on_page_progress(&self, _stage: ProcessingStage, _current: usize, _total: usize) {}

    /// A stage completed.
    fn on_stage_complete(&self, _stage: ProcessingStage) {}
}

/// Callback that discards all notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressCallback for NoProgress {}

/// Print a batch summary line after processing multiple files.
pub fn print_summary(total: usize, ok: usize, skipped: usize, errors: usize) {
    println!(
        "Done: {} file(s), {} converted, {} skipped, {} failed",
        total, ok, skipped, errors
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(ProcessingStage::Analyzing.name(), "Analyzing");
        assert_eq!(ProcessingStage::Completed.description_ja(), "完了");
        assert_eq!(
            ProcessingStage::WritingPdf.to_string(),
            "WritingPdf (PDF生成中)"
        );
    }

    #[test]
    fn test_no_progress_is_silent() {
        let progress = NoProgress;
        progress.on_stage_start(ProcessingStage::Analyzing);
        progress.on_page_progress(ProcessingStage::Analyzing, 1, 10);
        progress.on_stage_complete(ProcessingStage::Analyzing);
    }
}
