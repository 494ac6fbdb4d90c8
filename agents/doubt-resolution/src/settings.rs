//! System settings stored in `system/settings`
//!
//! The doubt pipeline only needs `exam_mode`, read fresh on every request.
//! `GET /admin/settings` returns the whole document merged over defaults.

use serde::{Deserialize, Serialize};

use crate::client::{Document, DocumentStore};
use crate::error::StoreError;

pub const SETTINGS_COLLECTION: &str = "system";
pub const SETTINGS_DOCUMENT: &str = "settings";
pub const EXAM_MODE_FIELD: &str = "exam_mode";

/// Outcome of reading the exam-mode flag
///
/// `Absent` and `ReadFailed` both leave the gate open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExamModeRead {
    Enabled,
    Disabled,
    /// No settings document, or no boolean `exam_mode` field
    Absent,
    ReadFailed(String),
}

impl ExamModeRead {
    /// Whether requests must be blocked
    pub fn is_blocking(&self) -> bool {
        matches!(self, ExamModeRead::Enabled)
    }
}

/// Read the exam-mode flag; never fails
pub async fn read_exam_mode(store: &dyn DocumentStore) -> ExamModeRead {
    match store.get(SETTINGS_COLLECTION, SETTINGS_DOCUMENT).await {
        Ok(Some(doc)) => match doc.get(EXAM_MODE_FIELD).and_then(|v| v.as_bool()) {
            Some(true) => ExamModeRead::Enabled,
            Some(false) => ExamModeRead::Disabled,
            None => ExamModeRead::Absent,
        },
        Ok(None) => ExamModeRead::Absent,
        Err(e) => ExamModeRead::ReadFailed(e.to_string()),
    }
}

/// Platform-wide settings with their defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSettings {
    #[serde(default)]
    pub maintenance_mode: bool,

    #[serde(default)]
    pub exam_mode: bool,

    #[serde(default = "default_attendance_threshold")]
    pub attendance_threshold: f64,

    #[serde(default = "default_cgpa_threshold")]
    pub cgpa_threshold: f64,

    /// Any other stored fields (`updated_at`, `updated_by`, ...)
    #[serde(flatten)]
    pub extra: Document,
}

fn default_attendance_threshold() -> f64 {
    75.0
}

fn default_cgpa_threshold() -> f64 {
    5.0
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            maintenance_mode: false,
            exam_mode: false,
            attendance_threshold: default_attendance_threshold(),
            cgpa_threshold: default_cgpa_threshold(),
            extra: Document::new(),
        }
    }
}

impl SystemSettings {
    /// Overlay a stored document on the defaults
    ///
    /// Fields with the wrong type keep their default instead of failing the
    /// whole read.
    pub fn from_document(doc: Document) -> Self {
        let mut settings = SystemSettings::default();
        for (name, value) in doc {
            match name.as_str() {
                "maintenance_mode" => {
                    if let Some(b) = value.as_bool() {
                        settings.maintenance_mode = b;
                    }
                }
                "exam_mode" => {
                    if let Some(b) = value.as_bool() {
                        settings.exam_mode = b;
                    }
                }
                "attendance_threshold" => {
                    if let Some(n) = value.as_f64() {
                        settings.attendance_threshold = n;
                    }
                }
                "cgpa_threshold" => {
                    if let Some(n) = value.as_f64() {
                        settings.cgpa_threshold = n;
                    }
                }
                _ => {
                    settings.extra.insert(name, value);
                }
            }
        }
        settings
    }
}

/// Load settings, falling back to defaults when the document is absent
pub async fn load_settings(store: &dyn DocumentStore) -> Result<SystemSettings, StoreError> {
    let doc = store.get(SETTINGS_COLLECTION, SETTINGS_DOCUMENT).await?;
    Ok(doc.map(SystemSettings::from_document).unwrap_or_default())
}
