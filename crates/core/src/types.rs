//! Request and response shapes of the UploadThing REST API

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Access control applied to uploaded files
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Acl {
    #[default]
    PublicRead,
    Private,
    /// Value returned by the provider that this crate does not know about
    Other(String),
}

impl Acl {
    pub fn as_str(&self) -> &str {
        match self {
            Acl::PublicRead => "public-read",
            Acl::Private => "private",
            Acl::Other(value) => value,
        }
    }
}

impl From<String> for Acl {
    fn from(value: String) -> Self {
        match value.as_str() {
            "public-read" => Acl::PublicRead,
            "private" => Acl::Private,
            _ => Acl::Other(value),
        }
    }
}

impl From<Acl> for String {
    fn from(acl: Acl) -> Self {
        acl.as_str().to_string()
    }
}

impl std::str::FromStr for Acl {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Acl::from(s.to_string()))
    }
}

impl fmt::Display for Acl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How browsers should present a file served from its URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentDisposition {
    Inline,
    Attachment,
}

impl ContentDisposition {
    pub fn as_str(&self) -> &str {
        match self {
            ContentDisposition::Inline => "inline",
            ContentDisposition::Attachment => "attachment",
        }
    }
}

// === deleteFiles ===

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFilesRequest {
    pub file_keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFilesResponse {
    pub success: bool,
    #[serde(default)]
    pub deleted_count: u64,
}

// === listFiles ===

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ListFilesRequest {
    pub limit: u32,
    pub offset: u32,
}

/// A stored file as reported by `listFiles`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesFile {
    pub id: String,
    #[serde(default)]
    pub custom_id: Option<String>,
    pub key: String,
    pub name: String,
    pub status: String,
    pub size: u64,
    /// Milliseconds since the unix epoch
    pub uploaded_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesResponse {
    pub has_more: bool,
    pub files: Vec<ListFilesFile>,
}

// === renameFiles ===

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameFileUpdate {
    pub file_key: String,
    pub new_name: String,
}

impl RenameFileUpdate {
    pub fn new(file_key: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self {
            file_key: file_key.into(),
            new_name: new_name.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RenameFilesRequest {
    pub updates: Vec<RenameFileUpdate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameFilesResponse {
    pub success: bool,
    #[serde(default)]
    pub renamed_count: u64,
}

// === getUsageInfo ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageInfoResponse {
    pub total_bytes: u64,
    pub app_total_bytes: u64,
    pub files_uploaded: u64,
    pub limit_bytes: u64,
}

// === requestFileAccess ===

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFileAccessRequest {
    pub file_key: String,
    /// Seconds; the provider default applies when omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFileAccessResponse {
    #[serde(default)]
    pub ufs_url: String,
    /// Deprecated by the provider in favour of `ufs_url`
    #[serde(default)]
    pub url: String,
}

// === getAppInfo ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAppInfoResponse {
    pub app_id: String,
    #[serde(rename = "defaultACL")]
    pub default_acl: Acl,
    #[serde(rename = "allowACLOverride")]
    pub allow_acl_override: bool,
}

// === uploadFiles ===

/// Description of one file to be uploaded
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileInfo {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub file_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
}

impl UploadFileInfo {
    pub fn new(name: impl Into<String>, size: u64, file_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            file_type: file_type.into(),
            custom_id: None,
        }
    }

    pub fn with_custom_id(mut self, custom_id: impl Into<String>) -> Self {
        self.custom_id = Some(custom_id.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFilesRequest {
    pub files: Vec<UploadFileInfo>,
    pub acl: Acl,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_disposition: Option<ContentDisposition>,
}

impl UploadFilesRequest {
    pub fn new(files: Vec<UploadFileInfo>, acl: Acl) -> Self {
        Self {
            files,
            acl,
            metadata: None,
            content_disposition: None,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_content_disposition(mut self, disposition: ContentDisposition) -> Self {
        self.content_disposition = Some(disposition);
        self
    }
}

/// Presigned POST target for one file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedPostUrls {
    pub key: String,
    pub file_name: String,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub file_url: String,
    #[serde(default)]
    pub content_disposition: String,
    /// JWT carrying the expiry of the polling window
    #[serde(default)]
    pub polling_jwt: String,
    #[serde(default)]
    pub polling_url: String,
    #[serde(default)]
    pub custom_id: Option<String>,
    pub url: String,
    /// Form fields that must precede the file part
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFilesResponse {
    pub data: Vec<PresignedPostUrls>,
}
