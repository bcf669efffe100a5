//! Material ingestion: multipart parsing, payload validation, and the
//! normalization of text vs. uploaded materials into store records.
//!
//! Replacement uploads follow one policy everywhere: store the new object
//! first, delete the old one only after the write succeeded.

use axum::extract::Multipart;
use uuid::Uuid;

use studyshelf_core::{Error, Material, MaterialKind, NewMaterial, ParentRef, Result};
use studyshelf_storage::{StorageKind, StoredObject};

use crate::state::AppState;

/// Extension whitelist from the upload middleware this replaces.
const ALLOWED_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "jpg", "jpeg", "png", "mp4", "mp3", "pptx",
];

const ALLOWED_MIMES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "image/jpeg",
    "image/png",
    "video/mp4",
    "audio/mpeg",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
];

const INVALID_FILE_MSG: &str =
    "Invalid file type. Allowed: pdf, docx, doc, jpg, jpeg, png, mp4, mp3, pptx";

/// Fields of a material add/update form.
#[derive(Debug, Default)]
pub struct Upload {
    pub kind: Option<String>,
    pub content: Option<String>,
    pub subject_id: Option<String>,
    pub chapter_id: Option<String>,
    pub exercise_id: Option<String>,
    pub file: Option<UploadedFile>,
}

#[derive(Debug)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Drains a multipart request into an [`Upload`]. Unknown fields are
/// ignored; empty text fields count as absent (HTML forms send them).
pub async fn read_upload(mut multipart: Multipart) -> Result<Upload> {
    let mut upload = Upload::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("invalid multipart request: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().map(|m| m.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| Error::Validation(format!("invalid file upload: {e}")))?;
            upload.file = Some(UploadedFile {
                name: file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
            continue;
        }
        let value = field
            .text()
            .await
            .map_err(|e| Error::Validation(format!("invalid form field {name}: {e}")))?;
        let value = (!value.is_empty()).then_some(value);
        match name.as_str() {
            "type" => upload.kind = value,
            "content" => upload.content = value,
            "subjectId" => upload.subject_id = value,
            "chapterId" => upload.chapter_id = value,
            "exerciseId" => upload.exercise_id = value,
            _ => {}
        }
    }
    Ok(upload)
}

pub async fn add_material(state: &AppState, upload: Upload) -> Result<Material> {
    let parent = ParentRef::from_ids(upload.subject_id, upload.chapter_id, upload.exercise_id)?;
    state.hierarchy.ensure_parent(&parent).await?;

    let kind = MaterialKind::parse(
        upload
            .kind
            .as_deref()
            .ok_or_else(|| Error::Validation("type is required".into()))?,
    )?;

    let new = if kind.is_text() {
        let content = upload
            .content
            .ok_or_else(|| Error::Validation("content is required for text materials".into()))?;
        NewMaterial {
            parent,
            kind,
            content,
            storage_id: None,
        }
    } else {
        let file = upload.file.ok_or_else(|| {
            Error::Validation("A file is required for image and file materials".into())
        })?;
        let stored = store_file(state, file, kind).await?;
        NewMaterial {
            parent,
            kind,
            content: stored.url,
            storage_id: Some(stored.storage_id),
        }
    };
    state.store.create_material(new).await
}

pub async fn update_material(state: &AppState, id: &str, upload: Upload) -> Result<Material> {
    let existing = state.store.material(id).await?;

    if existing.kind.is_text() {
        let content = upload
            .content
            .ok_or_else(|| Error::Validation("content is required for text materials".into()))?;
        return state.store.update_material(id, &content, None).await;
    }

    // Binary kinds: omitting the file keeps the stored object.
    let Some(file) = upload.file else {
        return Ok(existing);
    };

    let stored = store_file(state, file, existing.kind).await?;
    let updated = state
        .store
        .update_material(id, &stored.url, Some(stored.storage_id))
        .await?;

    // Old object goes only after the new one is safely stored.
    if let Some(old_id) = existing.storage_id {
        if let Err(err) = state
            .objects
            .remove(&old_id, storage_kind(existing.kind))
            .await
        {
            tracing::warn!(material = %id, %err, "failed to remove replaced object");
        }
    }
    Ok(updated)
}

async fn store_file(
    state: &AppState,
    file: UploadedFile,
    kind: MaterialKind,
) -> Result<StoredObject> {
    if file.bytes.len() > state.max_upload_bytes {
        return Err(Error::Validation(
            "File exceeds the maximum upload size of 20 MB".into(),
        ));
    }
    let ext = validate_file(&file)?;
    let file_name = format!("{}.{ext}", Uuid::new_v4().simple());
    state
        .objects
        .store(file.bytes, "materials", &file_name, storage_kind(kind))
        .await
}

/// Extension and MIME whitelist; returns the lowercased extension.
fn validate_file(file: &UploadedFile) -> Result<String> {
    let ext = file
        .name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .ok_or_else(|| Error::Validation(INVALID_FILE_MSG.into()))?;
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(Error::Validation(INVALID_FILE_MSG.into()));
    }
    match &file.content_type {
        Some(mime) if ALLOWED_MIMES.contains(&mime.as_str()) => Ok(ext),
        _ => Err(Error::Validation(INVALID_FILE_MSG.into())),
    }
}

pub(crate) fn storage_kind(kind: MaterialKind) -> StorageKind {
    match kind {
        MaterialKind::Image => StorageKind::Image,
        _ => StorageKind::Raw,
    }
}
