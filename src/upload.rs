//! Upload pipeline: Idle → Validating → Uploading → terminal → Idle.
//!
//! Validation runs entirely client-side and short-circuits the whole run
//! before any network call. Files then upload **sequentially** so one
//! aggregate progress bar can be driven: overall progress is the
//! completed-file fraction plus the in-flight file's fraction, scaled by
//! total count. Reported progress is monotone and reaches 1.0 exactly
//! when every file succeeded.

use std::path::Path;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::config::{ALLOWED_UPLOAD_TYPES, MAX_UPLOAD_BYTES};
use crate::routes;
use crate::transport::{FileUpload, ProgressCallback, Transport};

/// Client-side rejection, raised before any request is sent.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File \"{file_name}\" exceeds the 20 MB limit")]
    TooLarge { file_name: String, size: u64 },
    #[error("File \"{file_name}\" has an unsupported format ({content_type})")]
    UnsupportedType {
        file_name: String,
        content_type: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("An upload run is already in progress")]
    Busy,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// One file queued for upload.
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadCandidate {
    /// Build a candidate; when no content type is declared, guess from
    /// the file name and fall back to `application/octet-stream`.
    pub fn new(file_name: impl Into<String>, content_type: Option<&str>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type
            .map(str::to_string)
            .or_else(|| {
                mime_guess::from_path(&file_name)
                    .first_raw()
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "application/octet-stream".to_string());
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// Read a candidate off disk.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, None, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Check one candidate against the size ceiling and type allow-list.
pub fn validate(candidate: &UploadCandidate) -> Result<(), ValidationError> {
    if candidate.size() > MAX_UPLOAD_BYTES {
        return Err(ValidationError::TooLarge {
            file_name: candidate.file_name.clone(),
            size: candidate.size(),
        });
    }
    if !ALLOWED_UPLOAD_TYPES.contains(&candidate.content_type.as_str()) {
        return Err(ValidationError::UnsupportedType {
            file_name: candidate.file_name.clone(),
            content_type: candidate.content_type.clone(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Validating,
    Uploading,
    Succeeded,
    PartiallyFailed,
    Failed,
}

/// Terminal result of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Every file uploaded.
    Succeeded,
    /// Some but not all uploaded; successes are not rolled back.
    PartiallyFailed,
    /// Nothing uploaded (including the empty file list).
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileResult {
    Uploaded {
        file_name: String,
        record_id: Option<String>,
    },
    Failed {
        file_name: String,
        reason: String,
    },
}

#[derive(Debug)]
pub struct UploadReport {
    pub outcome: UploadOutcome,
    pub files: Vec<FileResult>,
}

impl UploadReport {
    pub fn uploaded_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f, FileResult::Uploaded { .. }))
            .count()
    }
}

/// Monotone progress gate: raw fractions are clamped to [0, 1] and never
/// allowed to move backwards, so a failed file's abandoned progress
/// cannot make the bar jump down when the next file starts.
struct ProgressTracker {
    last: Mutex<f64>,
    sink: ProgressCallback,
}

impl ProgressTracker {
    fn new(sink: ProgressCallback) -> Self {
        Self {
            last: Mutex::new(0.0),
            sink,
        }
    }

    fn emit(&self, raw: f64) {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let value = raw.clamp(0.0, 1.0).max(*last);
        *last = value;
        (self.sink)(value);
    }
}

#[derive(Default)]
pub struct UploadPipeline {
    state: PipelineState,
}

impl UploadPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Acknowledge a terminal state and return to `Idle`.
    pub fn reset(&mut self) {
        self.state = PipelineState::Idle;
    }

    /// Validate and upload the candidates sequentially.
    ///
    /// A validation failure aborts the run before any network call and
    /// leaves the pipeline in `Failed`. Otherwise every file is attempted;
    /// an individual failure is recorded and the run continues.
    pub fn run(
        &mut self,
        transport: &dyn Transport,
        patient_id: &str,
        candidates: Vec<UploadCandidate>,
        note: Option<String>,
        on_progress: ProgressCallback,
    ) -> Result<UploadReport, UploadError> {
        if self.state != PipelineState::Idle {
            return Err(UploadError::Busy);
        }

        self.state = PipelineState::Validating;
        if candidates.is_empty() {
            self.state = PipelineState::Failed;
            return Ok(UploadReport {
                outcome: UploadOutcome::Failed,
                files: Vec::new(),
            });
        }
        for candidate in &candidates {
            if let Err(rejection) = validate(candidate) {
                self.state = PipelineState::Failed;
                return Err(rejection.into());
            }
        }

        self.state = PipelineState::Uploading;
        let total = candidates.len();
        let tracker = Arc::new(ProgressTracker::new(on_progress));
        let mut files = Vec::with_capacity(total);
        let mut uploaded = 0usize;

        for candidate in candidates {
            let file_name = candidate.file_name.clone();
            let completed = uploaded;
            let per_file_tracker = Arc::clone(&tracker);
            let per_file: ProgressCallback = Arc::new(move |fraction: f64| {
                // A file can stream fully and still fail; hold back the
                // final sliver until the server has confirmed it.
                per_file_tracker.emit((completed as f64 + fraction.min(0.99)) / total as f64);
            });

            let upload = FileUpload {
                patient_id: patient_id.to_string(),
                file_name: file_name.clone(),
                content_type: candidate.content_type.clone(),
                bytes: candidate.bytes,
                note: note.clone(),
            };

            match transport.upload_with_progress(&routes::upload(), upload, per_file) {
                Ok(reply) => {
                    uploaded += 1;
                    tracker.emit(uploaded as f64 / total as f64);
                    let record_id = match reply.get("recordId") {
                        Some(Value::String(s)) => Some(s.clone()),
                        Some(Value::Number(n)) => Some(n.to_string()),
                        _ => None,
                    };
                    files.push(FileResult::Uploaded {
                        file_name,
                        record_id,
                    });
                }
                Err(error) => {
                    tracing::error!(file = %file_name, error = %error, "upload failed");
                    files.push(FileResult::Failed {
                        file_name,
                        reason: error.user_message(),
                    });
                }
            }
        }

        let outcome = if uploaded == total {
            UploadOutcome::Succeeded
        } else if uploaded > 0 {
            UploadOutcome::PartiallyFailed
        } else {
            UploadOutcome::Failed
        };
        self.state = match outcome {
            UploadOutcome::Succeeded => PipelineState::Succeeded,
            UploadOutcome::PartiallyFailed => PipelineState::PartiallyFailed,
            UploadOutcome::Failed => PipelineState::Failed,
        };

        Ok(UploadReport { outcome, files })
    }
}
