//! utapi-core - Core library for the utapi CLI
//!
//! Typed client for the UploadThing REST API: file deletion, listing and
//! renaming, usage reporting, presigned URL issuance, and direct uploads to
//! presigned POST targets.

pub mod client;
pub mod config;
pub mod error;
pub mod types;
pub mod upload;

// Re-export commonly used types
pub use client::UtApi;
pub use config::{config_exists, get_config_path, load_config, save_config, validate_config};
pub use config::{
    AdvancedConfig, ConfigFile, LoggingConfig, OutputConfig, UploadThingConfig, UploadThingSection,
};
pub use error::{Error, Result};
pub use types::{
    Acl, ContentDisposition, DeleteFilesResponse, GetAppInfoResponse, ListFilesFile,
    ListFilesResponse, PresignedPostUrls, RenameFileUpdate, RenameFilesResponse,
    RequestFileAccessResponse, UploadFileInfo, UploadFilesRequest, UploadFilesResponse,
    UsageInfoResponse,
};
pub use upload::{
    create_multipart_form, upload_content_to_presigned_url, upload_file_to_presigned_url,
};
