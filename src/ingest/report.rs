use std::time::Duration;

/// Outcome of the post-upload search for a fixed query.
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    Found { preview: String, score: f64 },
    Empty,
    Failed(String),
    /// Nothing was uploaded, so there was nothing to look for.
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub total_chunks: usize,
    pub successful: usize,
    pub failed: usize,
    pub cancelled: bool,
    /// Time spent in pauses and cooldowns.
    pub slept: Duration,
    pub verification: Verification,
}

impl IngestReport {
    pub fn new(total_chunks: usize) -> Self {
        Self {
            total_chunks,
            successful: 0,
            failed: 0,
            cancelled: false,
            slept: Duration::ZERO,
            verification: Verification::Skipped,
        }
    }

    /// Chunks never attempted because the run was cancelled.
    pub fn skipped(&self) -> usize {
        self.total_chunks
            .saturating_sub(self.successful + self.failed)
    }

    pub fn is_complete_success(&self) -> bool {
        !self.cancelled && self.failed == 0 && self.successful == self.total_chunks
    }

    pub fn log_summary(&self) {
        tracing::info!(
            successful = self.successful,
            failed = self.failed,
            skipped = self.skipped(),
            total = self.total_chunks,
            slept_secs = self.slept.as_secs_f64(),
            "Ingestion finished: {}/{} chunks uploaded",
            self.successful,
            self.total_chunks
        );

        if self.successful > 0 && self.failed > 0 {
            tracing::warn!(
                "Some chunks failed. Re-running uploads everything again with new ids, so expect duplicates."
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_counts_unattempted_chunks() {
        let mut report = IngestReport::new(10);
        report.successful = 3;
        report.failed = 1;
        report.cancelled = true;

        assert_eq!(report.skipped(), 6);
        assert!(!report.is_complete_success());
    }

    #[test]
    fn full_run_is_complete_success() {
        let mut report = IngestReport::new(2);
        report.successful = 2;
        assert!(report.is_complete_success());
        assert_eq!(report.skipped(), 0);
    }
}
