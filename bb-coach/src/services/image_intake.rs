//! Image intake
//!
//! Validates uploaded payloads and turns them into frames. Content is sniffed
//! from the bytes; the declared content type is only consulted when sniffing
//! cannot identify the payload.

use std::collections::BTreeMap;

use crate::error::CoachError;
use crate::models::Frame;

/// One uploaded file as received from the client
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    /// Content type declared by the client, if any
    pub declared_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(
        file_name: impl Into<String>,
        declared_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            declared_type,
            bytes,
        }
    }
}

/// Outcome of a batch import
#[derive(Debug, Default)]
pub struct IntakeReport {
    /// Accepted frames in upload order
    pub frames: Vec<Frame>,
    /// One `InvalidMediaType` per rejected file
    pub rejected: Vec<CoachError>,
}

/// Determine the image media type of a payload
fn detect_image_type(file: &UploadedFile) -> Result<String, CoachError> {
    let reject = |reason: String| CoachError::InvalidMediaType {
        file_name: file.file_name.clone(),
        reason,
    };

    if file.bytes.is_empty() {
        return Err(reject("file is empty".to_string()));
    }

    match infer::get(&file.bytes) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => {
            Ok(kind.mime_type().to_string())
        }
        Some(kind) => Err(reject(format!("content is {}", kind.mime_type()))),
        None => match file.declared_type.as_deref() {
            Some(declared) if declared.starts_with("image/") => Ok(declared.to_string()),
            Some(declared) => Err(reject(format!("declared type is {}", declared))),
            None => Err(reject("content type could not be determined".to_string())),
        },
    }
}

/// Validate one file and turn it into a frame
pub fn import_single(file: UploadedFile) -> Result<Frame, CoachError> {
    let media_type = detect_image_type(&file)?;
    tracing::debug!(
        file_name = %file.file_name,
        media_type = %media_type,
        size_bytes = file.bytes.len(),
        "Image accepted"
    );
    Ok(Frame::new(file.file_name, media_type, file.bytes))
}

/// Validate a batch; invalid files are reported, valid ones still import
pub fn import_batch(files: Vec<UploadedFile>) -> IntakeReport {
    let mut report = IntakeReport::default();

    for file in files {
        match import_single(file) {
            Ok(frame) => report.frames.push(frame),
            Err(err) => {
                tracing::warn!("Rejected upload: {}", err);
                report.rejected.push(err);
            }
        }
    }

    tracing::info!(
        accepted = report.frames.len(),
        rejected = report.rejected.len(),
        "Image batch imported"
    );
    report
}

/// Spread valid images over consecutive steps starting at 0
///
/// The first `min(valid, step_count)` valid images fill steps `0..`; the rest
/// are ignored. Rejections are returned alongside.
pub fn bulk_distribute(
    files: Vec<UploadedFile>,
    step_count: usize,
) -> (BTreeMap<usize, Frame>, Vec<CoachError>) {
    let report = import_batch(files);
    let placed = report
        .frames
        .into_iter()
        .take(step_count)
        .enumerate()
        .collect();
    (placed, report.rejected)
}
