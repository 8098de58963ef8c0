//! Sync summary and reporting
//!
//! This module defines structures for tracking and reporting the results of
//! a registration run.

use crate::domain::RegistrarError;
use std::time::Duration;

/// A composite record that made it into the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredRecord {
    /// Name from the input document
    pub name: String,

    /// Registry identity of the composite, once assigned
    pub registry_id: Option<String>,

    /// `(field, registry identity)` of each component, in field order
    pub components: Vec<(String, Option<String>)>,
}

/// Summary of a sync run
#[derive(Debug, Clone)]
pub struct SyncSummary {
    /// Records read from the input
    pub total_records: usize,

    /// Records registered successfully
    pub succeeded: usize,

    /// Records that failed
    pub failed: usize,

    /// Component records created during the run
    pub components_created: usize,

    /// Component records reused from the registry
    pub components_reused: usize,

    /// Duration of the run
    pub duration: Duration,

    /// Errors encountered during the run
    pub errors: Vec<SyncError>,

    /// Registered records, in input order
    pub registered: Vec<RegisteredRecord>,
}

impl SyncSummary {
    /// Create a new empty summary
    pub fn new(total_records: usize) -> Self {
        Self {
            total_records,
            succeeded: 0,
            failed: 0,
            components_created: 0,
            components_reused: 0,
            duration: Duration::from_secs(0),
            errors: Vec::new(),
            registered: Vec::new(),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Record a successful registration
    pub fn add_registered(&mut self, record: RegisteredRecord) {
        self.succeeded += 1;
        self.registered.push(record);
    }

    /// Record a failed record
    pub fn add_failure(&mut self, error: SyncError) {
        self.failed += 1;
        self.errors.push(error);
    }

    /// Check if every record succeeded
    pub fn is_successful(&self) -> bool {
        self.failed == 0 && self.errors.is_empty()
    }

    /// Get success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_records == 0 {
            return 100.0;
        }
        (self.succeeded as f64 / self.total_records as f64) * 100.0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            total_records = self.total_records,
            succeeded = self.succeeded,
            failed = self.failed,
            components_created = self.components_created,
            components_reused = self.components_reused,
            duration_secs = self.duration.as_secs(),
            success_rate = format!("{:.2}%", self.success_rate()),
            "Sync completed"
        );

        for record in &self.registered {
            tracing::info!(
                name = %record.name,
                registry_id = ?record.registry_id,
                components = ?record.components,
                "Registered record"
            );
        }

        if !self.errors.is_empty() {
            tracing::warn!(error_count = self.errors.len(), "Sync completed with errors");
            for error in &self.errors {
                tracing::warn!(
                    kind = ?error.kind,
                    record = ?error.record,
                    message = %error.message,
                    "Sync error"
                );
            }
        }
    }
}

impl Default for SyncSummary {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Kind of per-record failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncErrorKind {
    /// The registry rejected the registration request
    Registration,
    /// A component matched more than one registered record
    Reconciliation,
    /// A bulk task failed
    Task,
    /// Any other remote failure
    Remote,
    /// Input could not be used
    Validation,
}

/// Per-record error with context
#[derive(Debug, Clone)]
pub struct SyncError {
    /// Kind of failure
    pub kind: SyncErrorKind,

    /// Error message
    pub message: String,

    /// Record the failure belongs to
    pub record: Option<String>,
}

impl SyncError {
    /// Create a new sync error
    pub fn new(kind: SyncErrorKind, message: String) -> Self {
        Self {
            kind,
            message,
            record: None,
        }
    }

    /// Classify a crate error
    pub fn from_error(error: &RegistrarError) -> Self {
        let kind = match error {
            RegistrarError::ReconciliationConflict { .. } => SyncErrorKind::Reconciliation,
            RegistrarError::TaskFailed { .. } => SyncErrorKind::Task,
            RegistrarError::Validation(_) => SyncErrorKind::Validation,
            RegistrarError::Remote(_) if error.status() == Some(400) => {
                SyncErrorKind::Registration
            }
            _ => SyncErrorKind::Remote,
        };
        Self::new(kind, error.to_string())
    }

    /// Attach the record name
    pub fn with_record(mut self, record: impl Into<String>) -> Self {
        self.record = Some(record.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RemoteError;
    use serde_json::json;

    #[test]
    fn test_summary_creation() {
        let summary = SyncSummary::new(3);

        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed, 0);
        assert!(summary.errors.is_empty());
        assert!(summary.registered.is_empty());
    }

    #[test]
    fn test_summary_success_rate() {
        let mut summary = SyncSummary::new(4);
        for name in ["AB-1", "AB-2", "AB-3"] {
            summary.add_registered(RegisteredRecord {
                name: name.to_string(),
                registry_id: None,
                components: Vec::new(),
            });
        }
        summary.add_failure(SyncError::new(
            SyncErrorKind::Registration,
            "rejected".to_string(),
        ));

        assert_eq!(summary.success_rate(), 75.0);
        assert!(!summary.is_successful());

        assert_eq!(SyncSummary::new(0).success_rate(), 100.0);
    }

    #[test]
    fn test_sync_error_classification() {
        let bad_request: RegistrarError = RemoteError::RequestFailed {
            status: 400,
            body: json!({}),
        }
        .into();
        let err = SyncError::from_error(&bad_request).with_record("AB-7");
        assert_eq!(err.kind, SyncErrorKind::Registration);
        assert_eq!(err.record.as_deref(), Some("AB-7"));

        let conflict = RegistrarError::ReconciliationConflict {
            key: "aa-sequences?aminoAcids=MAAS".to_string(),
            matches: 2,
        };
        assert_eq!(
            SyncError::from_error(&conflict).kind,
            SyncErrorKind::Reconciliation
        );
    }
}
