//! Direct uploads to presigned POST URLs
//!
//! The provider hands out S3-style presigned POST targets: a URL plus a set
//! of form fields. The body is `multipart/form-data` with every field first
//! and the file part, named `file`, last.

use crate::error::{Error, Result};
use crate::types::PresignedPostUrls;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};

const OCTET_STREAM: &str = "application/octet-stream";

/// Upper bound on up-front buffer allocation; larger bodies grow as read
const PREALLOC_LIMIT: u64 = 64 * 1024;

/// Build the multipart body for a presigned POST
pub fn create_multipart_form(
    content: Vec<u8>,
    file_name: &str,
    file_type: &str,
    fields: &BTreeMap<String, String>,
) -> Result<Form> {
    let mut form = Form::new();
    for (name, value) in fields {
        form = form.text(name.clone(), value.clone());
    }

    let mime = if file_type.is_empty() {
        OCTET_STREAM
    } else {
        file_type
    };
    let part = Part::bytes(content)
        .file_name(file_name.to_string())
        .mime_str(mime)
        .map_err(|e| Error::InvalidInput(format!("Invalid file type '{}': {}", file_type, e)))?;

    Ok(form.part("file", part))
}

/// Upload a local file to a presigned POST URL
pub async fn upload_file_to_presigned_url(
    file_path: impl AsRef<Path>,
    presigned: &PresignedPostUrls,
) -> Result<()> {
    upload_file_with_client(&Client::new(), file_path.as_ref(), presigned).await
}

/// Upload `size` bytes read from `content` to a presigned POST URL
pub async fn upload_content_to_presigned_url<R>(
    content: R,
    size: u64,
    presigned: &PresignedPostUrls,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    upload_content_with_client(&Client::new(), content, size, presigned).await
}

pub(crate) async fn upload_file_with_client(
    client: &Client,
    file_path: &Path,
    presigned: &PresignedPostUrls,
) -> Result<()> {
    let mut file = File::open(file_path).await?;
    let size = file.metadata().await?.len();

    let mut buffer = Vec::with_capacity(size.min(PREALLOC_LIMIT) as usize);
    file.read_to_end(&mut buffer).await?;
    drop(file);

    tracing::debug!(path = %file_path.display(), size, key = %presigned.key, "uploading file");
    send_form(client, presigned, buffer).await
}

pub(crate) async fn upload_content_with_client<R>(
    client: &Client,
    content: R,
    size: u64,
    presigned: &PresignedPostUrls,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let buffer = read_exact_size(content, size).await?;

    tracing::debug!(size, key = %presigned.key, "uploading content");
    send_form(client, presigned, buffer).await
}

/// Read exactly `size` bytes; a shorter stream is an error
async fn read_exact_size<R>(content: R, size: u64) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = Vec::with_capacity(size.min(PREALLOC_LIMIT) as usize);
    if size == 0 {
        return Ok(buffer);
    }

    content.take(size).read_to_end(&mut buffer).await?;
    if (buffer.len() as u64) < size {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes, got {}", size, buffer.len()),
        )));
    }

    Ok(buffer)
}

async fn send_form(client: &Client, presigned: &PresignedPostUrls, content: Vec<u8>) -> Result<()> {
    let form = create_multipart_form(
        content,
        &presigned.file_name,
        &presigned.file_type,
        &presigned.fields,
    )?;

    let response = client.post(&presigned.url).multipart(form).send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), "presigned upload rejected");
        return Err(Error::Upload {
            status: status.as_u16(),
            body,
        });
    }

    Ok(())
}
