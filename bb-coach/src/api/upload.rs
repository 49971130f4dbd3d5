//! Multipart upload helpers

use std::collections::HashMap;

use axum::extract::Multipart;
use serde::Serialize;

use crate::error::{ApiError, ApiResult, CoachError};
use crate::services::image_intake::UploadedFile;

/// A file the intake refused
#[derive(Debug, Clone, Serialize)]
pub struct RejectedFile {
    pub code: &'static str,
    pub file_name: String,
    pub message: String,
}

impl From<&CoachError> for RejectedFile {
    fn from(err: &CoachError) -> Self {
        let file_name = match err {
            CoachError::InvalidMediaType { file_name, .. } => file_name.clone(),
            _ => String::new(),
        };
        Self {
            code: "INVALID_MEDIA_TYPE",
            file_name,
            message: err.to_string(),
        }
    }
}

pub fn rejected_files(errors: &[CoachError]) -> Vec<RejectedFile> {
    errors.iter().map(RejectedFile::from).collect()
}

/// Text fields and files of a multipart body
#[derive(Debug, Default)]
pub struct FormUpload {
    pub fields: HashMap<String, String>,
    pub files: Vec<UploadedFile>,
}

impl FormUpload {
    /// Trimmed text field, empty when absent
    pub fn text(&self, name: &str) -> &str {
        self.fields.get(name).map(|v| v.trim()).unwrap_or("")
    }
}

/// Read every part of a multipart body, in order
///
/// Parts with a file name are files; the rest are text fields.
pub async fn collect_form(mut multipart: Multipart) -> ApiResult<FormUpload> {
    let mut form = FormUpload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let Some(file_name) = field.file_name().map(str::to_string) else {
            let value = field.text().await.map_err(|e| {
                ApiError::BadRequest(format!("Failed to read field {}: {}", name, e))
            })?;
            form.fields.insert(name, value);
            continue;
        };
        let declared_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read {}: {}", file_name, e)))?;

        form.files.push(UploadedFile::new(file_name, declared_type, bytes.to_vec()));
    }

    tracing::debug!(
        fields = form.fields.len(),
        files = form.files.len(),
        "Multipart upload received"
    );
    Ok(form)
}

/// Read every file part of a multipart body, in order
///
/// Plain form fields are ignored. An upload without files is a bad request.
pub async fn collect_files(multipart: Multipart) -> ApiResult<Vec<UploadedFile>> {
    let files = collect_form(multipart).await?.files;
    if files.is_empty() {
        return Err(ApiError::BadRequest("No files in upload".to_string()));
    }
    Ok(files)
}
