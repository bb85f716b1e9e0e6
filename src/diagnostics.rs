// ABOUTME: Diagnostics accumulator for non-fatal warnings during a deploy run.
// ABOUTME: Collects warnings that shouldn't fail a deployment but should be shown to users.

use crate::publish::DeploymentReport;

/// Collects non-fatal warnings during deployment operations.
#[derive(Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A non-fatal warning collected during deployment.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// A published version was abandoned and is left unreferenced.
    pub fn orphaned_version(report: &DeploymentReport) -> Self {
        Self {
            kind: WarningKind::OrphanedVersion,
            message: format!(
                "{} version {} was published but not promoted; it can be deleted",
                report.function, report.new_version
            ),
        }
    }

    /// No verification payload was configured; `{}` is sent instead.
    pub fn default_payload(product: impl std::fmt::Display) -> Self {
        Self {
            kind: WarningKind::DefaultPayload,
            message: format!("{product}: no verify payload configured, sending {{}}"),
        }
    }
}

/// Categories of warnings that can occur during deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// A new version exists remotely that no alias points at.
    OrphanedVersion,
    /// Verification ran with the default empty-object payload.
    DefaultPayload,
}
