//! Run-wide success and failure accounting.

use crate::config::ReportConfig;
use std::fmt;

/// Outcome counters for one pipeline stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOutcome {
    pub success_count: usize,
    pub failed: Vec<String>,
}

impl StageOutcome {
    pub fn record_success(&mut self) {
        self.success_count += 1;
    }

    pub fn record_failure(&mut self, item: impl Into<String>) {
        self.failed.push(item.into());
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    /// Files that reached this stage.
    pub fn attempted(&self) -> usize {
        self.success_count + self.failed.len()
    }
}

/// Summary of a whole migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    pub total: usize,
    pub schema_update: StageOutcome,
    pub export: StageOutcome,
    pub migration: StageOutcome,
}

impl MigrationSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Failures across all stages.
    pub fn total_failures(&self) -> usize {
        self.schema_update.failure_count()
            + self.export.failure_count()
            + self.migration.failure_count()
    }

    /// Overall success rate as a percentage.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let succeeded = self.total.saturating_sub(self.total_failures());
        succeeded as f64 / self.total as f64 * 100.0
    }

    pub fn all_succeeded(&self) -> bool {
        self.total_failures() == 0
    }
}

fn write_stage(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    failed_heading: &str,
    stage: &StageOutcome,
) -> fmt::Result {
    writeln!(
        f,
        "{}: {} successful, {} failed",
        label,
        stage.success_count,
        stage.failure_count()
    )?;
    if stage.failed.is_empty() {
        return Ok(());
    }

    writeln!(f, "  {}:", failed_heading)?;
    for name in stage.failed.iter().take(ReportConfig::MAX_LISTED_FAILURES) {
        writeln!(f, "    - {}", name)?;
    }
    let hidden = stage
        .failed
        .len()
        .saturating_sub(ReportConfig::MAX_LISTED_FAILURES);
    if hidden > 0 {
        writeln!(f, "    ... and {} more", hidden)?;
    }
    Ok(())
}

impl fmt::Display for MigrationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{}", rule)?;
        writeln!(f, "                    MIGRATION SUMMARY")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Total Grafana dashboards processed: {}", self.total)?;
        writeln!(f)?;

        write_stage(f, "Grafana Schema Update", "Failed schema updates", &self.schema_update)?;
        writeln!(f)?;
        write_stage(f, "Export", "Failed exports", &self.export)?;
        writeln!(f)?;
        write_stage(f, "Perses Migration", "Failed migrations", &self.migration)?;
        writeln!(f)?;

        writeln!(f, "Overall Success Rate: {:.1}%", self.success_rate())?;
        if self.all_succeeded() {
            writeln!(f, "All dashboards migrated successfully!")?;
        } else {
            writeln!(
                f,
                "{} dashboard(s) encountered issues during migration",
                self.total_failures()
            )?;
        }
        write!(f, "{}", rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MigrationSummary {
        let mut summary = MigrationSummary::new(4);
        summary.schema_update.record_success();
        summary.schema_update.record_success();
        summary.schema_update.record_success();
        summary.schema_update.record_failure("broken.json");
        summary.export.record_success();
        summary.export.record_success();
        summary.export.record_failure("gone.json");
        summary.migration.record_success();
        summary.migration.record_success();
        summary
    }

    #[test]
    fn test_counts_and_rate() {
        let summary = sample();
        assert_eq!(summary.total_failures(), 2);
        assert!(!summary.all_succeeded());
        assert!((summary.success_rate() - 50.0).abs() < f64::EPSILON);
        assert_eq!(summary.schema_update.attempted(), 4);
        assert_eq!(summary.export.attempted(), 3);
    }

    #[test]
    fn test_rate_edge_cases() {
        assert_eq!(MigrationSummary::new(0).success_rate(), 0.0);

        let mut clean = MigrationSummary::new(2);
        clean.schema_update.record_success();
        clean.schema_update.record_success();
        assert!((clean.success_rate() - 100.0).abs() < f64::EPSILON);
        assert!(clean.all_succeeded());

        let mut over = MigrationSummary::new(1);
        over.migration.record_failure("a.json");
        over.migration.record_failure("stale.json");
        assert_eq!(over.success_rate(), 0.0);
    }

    #[test]
    fn test_render_lists_failures() {
        let report = sample().to_string();
        assert!(report.contains("MIGRATION SUMMARY"));
        assert!(report.contains("Total Grafana dashboards processed: 4"));
        assert!(report.contains("Grafana Schema Update: 3 successful, 1 failed"));
        assert!(report.contains("  Failed schema updates:\n    - broken.json"));
        assert!(report.contains("Export: 2 successful, 1 failed"));
        assert!(report.contains("    - gone.json"));
        assert!(report.contains("Perses Migration: 2 successful, 0 failed"));
        assert!(!report.contains("Failed migrations"));
        assert!(report.contains("Overall Success Rate: 50.0%"));
        assert!(report.contains("2 dashboard(s) encountered issues during migration"));
    }

    #[test]
    fn test_render_all_succeeded() {
        let mut summary = MigrationSummary::new(1);
        summary.schema_update.record_success();
        summary.export.record_success();
        summary.migration.record_success();
        let report = summary.to_string();
        assert!(report.contains("Overall Success Rate: 100.0%"));
        assert!(report.contains("All dashboards migrated successfully!"));
    }

    #[test]
    fn test_render_caps_failure_list() {
        let mut summary = MigrationSummary::new(60);
        for i in 0..60 {
            summary.schema_update.record_failure(format!("d{}.json", i));
        }
        let report = summary.to_string();
        assert!(report.contains("    - d49.json"));
        assert!(!report.contains("    - d50.json"));
        assert!(report.contains("    ... and 10 more"));
        assert!(report.contains("Grafana Schema Update: 0 successful, 60 failed"));
    }
}
