//! `multipart/form-data` uploads.
//!
//! Forms are built with `reqwest::multipart`. The file part is streamed in
//! fixed-size chunks with a declared length, so the form length is known
//! before the first byte is sent and each chunk pulled by the connection
//! becomes one progress tick.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};

use crate::transport::{ProgressSink, UploadProgress};

/// Form field name the file part is sent under.
pub const FILE_FIELD: &str = "file";

/// Chunk size used when streaming the file part.
pub const UPLOAD_CHUNK_SIZE: usize = 16 * 1024;

/// A file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: "application/octet-stream".to_string(),
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// `fields` in order, then `file` under `FILE_FIELD`. Fails when the
/// file's content type is not a valid MIME type.
pub(crate) fn build_form(
    fields: Vec<(String, String)>,
    file: FileUpload,
    progress: Option<ProgressSink>,
) -> Result<Form, reqwest::Error> {
    let form = fields
        .into_iter()
        .fold(Form::new(), |form, (name, value)| form.text(name, value));
    Ok(form.part(FILE_FIELD, file_part(file, progress)?))
}

fn file_part(file: FileUpload, progress: Option<ProgressSink>) -> Result<Part, reqwest::Error> {
    let total = file.bytes.len() as u64;
    let chunks = split_chunks(Bytes::from(file.bytes), UPLOAD_CHUNK_SIZE);

    let mut sent = 0u64;
    let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
        sent += chunk.len() as u64;
        if let Some(progress) = &progress {
            progress(UploadProgress {
                sent,
                total: Some(total),
            });
        }
        Ok::<Bytes, std::io::Error>(chunk)
    }));

    Part::stream_with_length(reqwest::Body::wrap_stream(stream), total)
        .file_name(file.file_name)
        .mime_str(&file.content_type)
}

fn split_chunks(bytes: Bytes, size: usize) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(bytes.len() / size + 1);
    let mut start = 0;
    while start < bytes.len() {
        let end = (start + size).min(bytes.len());
        chunks.push(bytes.slice(start..end));
        start = end;
    }
    chunks
}
