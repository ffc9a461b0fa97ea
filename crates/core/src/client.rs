//! UploadThing API client

use crate::config::{self, UploadThingConfig};
use crate::error::{Error, Result};
use crate::types::{
    Acl, DeleteFilesRequest, DeleteFilesResponse, GetAppInfoResponse, ListFilesRequest,
    ListFilesResponse, PresignedPostUrls, RenameFileUpdate, RenameFilesRequest,
    RenameFilesResponse, RequestFileAccessRequest, RequestFileAccessResponse, UploadFileInfo,
    UploadFilesRequest, UploadFilesResponse, UsageInfoResponse,
};
use crate::upload;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncRead;

const HEADER_API_KEY: &str = "x-uploadthing-api-key";
const HEADER_VERSION: &str = "x-uploadthing-version";
const HEADER_FE_PACKAGE: &str = "x-uploadthing-fe-package";
const HEADER_BE_ADAPTER: &str = "x-uploadthing-be-adapter";

/// Client for the UploadThing REST API
#[derive(Debug, Clone)]
pub struct UtApi {
    config: UploadThingConfig,
    http_client: Client,
}

impl UtApi {
    /// Create a new client
    pub fn new(config: UploadThingConfig) -> Result<Self> {
        config::validate(&config)?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Create a client from `UPLOADTHING_SECRET` (and `.env`, config file)
    pub fn from_env() -> Result<Self> {
        Self::new(UploadThingConfig::from_env()?)
    }

    /// Replace the underlying HTTP client
    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// Set `x-uploadthing-fe-package`; empty disables the header
    pub fn with_fe_package(mut self, fe_package: impl Into<String>) -> Self {
        self.config.fe_package = fe_package.into();
        self
    }

    /// Set `x-uploadthing-be-adapter`; empty disables the header
    pub fn with_be_adapter(mut self, be_adapter: impl Into<String>) -> Self {
        self.config.be_adapter = be_adapter.into();
        self
    }

    pub fn config(&self) -> &UploadThingConfig {
        &self.config
    }

    /// Headers sent with every API request
    pub fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(HEADER_API_KEY, header_value("API key", &self.config.api_key)?);
        headers.insert(HEADER_VERSION, header_value("version", &self.config.version)?);

        if !self.config.fe_package.is_empty() {
            headers.insert(
                HEADER_FE_PACKAGE,
                header_value("fe package", &self.config.fe_package)?,
            );
        }
        if !self.config.be_adapter.is_empty() {
            headers.insert(
                HEADER_BE_ADAPTER,
                header_value("be adapter", &self.config.be_adapter)?,
            );
        }

        Ok(headers)
    }

    /// POST a JSON body to `path` and decode the JSON answer
    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.config.host, path);
        let payload = serde_json::to_vec(body)?;

        let response = self
            .http_client
            .post(&url)
            .headers(self.headers()?)
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(path, status = status.as_u16(), "UploadThing API call");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Delete files by key
    pub async fn delete_files<S: Into<String>>(
        &self,
        file_keys: impl IntoIterator<Item = S>,
    ) -> Result<DeleteFilesResponse> {
        let file_keys: Vec<String> = file_keys.into_iter().map(Into::into).collect();
        if file_keys.is_empty() {
            return Err(Error::InvalidInput("No file keys given".to_string()));
        }

        self.post("/v6/deleteFiles", &DeleteFilesRequest { file_keys })
            .await
    }

    /// List stored files, one page at a time
    pub async fn list_files(&self, limit: u32, offset: u32) -> Result<ListFilesResponse> {
        self.post("/v6/listFiles", &ListFilesRequest { limit, offset })
            .await
    }

    /// Rename files
    pub async fn rename_files(&self, updates: Vec<RenameFileUpdate>) -> Result<RenameFilesResponse> {
        if updates.is_empty() {
            return Err(Error::InvalidInput("No rename updates given".to_string()));
        }

        self.post("/v6/renameFiles", &RenameFilesRequest { updates })
            .await
    }

    /// Storage usage of the app
    pub async fn get_usage_info(&self) -> Result<UsageInfoResponse> {
        self.post("/v6/getUsageInfo", &serde_json::json!({})).await
    }

    /// Request a presigned URL for a private file
    pub async fn request_file_access(
        &self,
        file_key: &str,
        expires_in: Option<u32>,
    ) -> Result<RequestFileAccessResponse> {
        if file_key.is_empty() {
            return Err(Error::InvalidInput("File key cannot be empty".to_string()));
        }

        let request = RequestFileAccessRequest {
            file_key: file_key.to_string(),
            expires_in: expires_in.filter(|secs| *secs > 0),
        };
        self.post("/v6/requestFileAccess", &request).await
    }

    /// Presigned URL for a private file
    pub async fn get_presigned_url(&self, file_key: &str, expires_in: Option<u32>) -> Result<String> {
        let response = self.request_file_access(file_key, expires_in).await?;

        if !response.ufs_url.is_empty() {
            Ok(response.ufs_url)
        } else if !response.url.is_empty() {
            Ok(response.url)
        } else {
            Err(Error::UnexpectedResponse(
                "requestFileAccess returned no URL".to_string(),
            ))
        }
    }

    /// App id and ACL defaults
    pub async fn get_app_info(&self) -> Result<GetAppInfoResponse> {
        self.post("/v7/getAppInfo", &serde_json::json!({})).await
    }

    /// Presigned POST targets for the given files
    pub async fn get_presigned_upload_url(
        &self,
        files: Vec<UploadFileInfo>,
        acl: Acl,
    ) -> Result<UploadFilesResponse> {
        self.request_upload(&UploadFilesRequest::new(files, acl)).await
    }

    /// Presigned POST targets, with metadata and content disposition
    pub async fn request_upload(&self, request: &UploadFilesRequest) -> Result<UploadFilesResponse> {
        if request.files.is_empty() {
            return Err(Error::InvalidInput("No files to upload".to_string()));
        }

        self.post("/v6/uploadFiles", request).await
    }

    /// Upload a local file: request a presigned POST, then send the file to it
    pub async fn upload_file(
        &self,
        file_path: impl AsRef<Path>,
        acl: Acl,
        custom_id: Option<&str>,
    ) -> Result<PresignedPostUrls> {
        let file_path = file_path.as_ref();
        let size = tokio::fs::metadata(file_path).await?.len();

        let name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::InvalidInput(format!("Invalid file name: {}", file_path.display()))
            })?;
        let file_type = mime_guess::from_path(file_path)
            .first_or_octet_stream()
            .to_string();

        let mut info = UploadFileInfo::new(name, size, file_type);
        if let Some(custom_id) = custom_id {
            info = info.with_custom_id(custom_id);
        }

        let response = self.get_presigned_upload_url(vec![info], acl).await?;
        let presigned = response.data.into_iter().next().ok_or_else(|| {
            Error::UnexpectedResponse("uploadFiles returned no presigned URL".to_string())
        })?;

        self.upload_to_presigned_url(file_path, &presigned).await?;
        Ok(presigned)
    }

    /// Send a local file to a presigned POST target
    pub async fn upload_to_presigned_url(
        &self,
        file_path: impl AsRef<Path>,
        presigned: &PresignedPostUrls,
    ) -> Result<()> {
        upload::upload_file_with_client(&self.http_client, file_path.as_ref(), presigned).await
    }

    /// Send `size` bytes from `content` to a presigned POST target
    pub async fn upload_content_to_presigned_url<R>(
        &self,
        content: R,
        size: u64,
        presigned: &PresignedPostUrls,
    ) -> Result<()>
    where
        R: AsyncRead + Unpin,
    {
        upload::upload_content_with_client(&self.http_client, content, size, presigned).await
    }
}

fn header_value(what: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| Error::InvalidInput(format!("Invalid characters in {}", what)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    const KEY: &str = "sk_test_123";

    fn client_for(server: &Server) -> UtApi {
        let config = UploadThingConfig::new(KEY).with_host(server.url());
        UtApi::new(config).unwrap()
    }

    #[test]
    fn test_headers_default() {
        let api = UtApi::new(UploadThingConfig::new(KEY)).unwrap();
        let headers = api.headers().unwrap();

        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(headers["x-uploadthing-api-key"], KEY);
        assert_eq!(headers["x-uploadthing-version"], config::DEFAULT_VERSION);
        assert_eq!(headers["x-uploadthing-be-adapter"], config::DEFAULT_BE_ADAPTER);
        assert!(headers.get("x-uploadthing-fe-package").is_none());
    }

    #[test]
    fn test_headers_optional_analytics() {
        let api = UtApi::new(UploadThingConfig::new(KEY))
            .unwrap()
            .with_fe_package("my-frontend")
            .with_be_adapter("");
        let headers = api.headers().unwrap();

        assert_eq!(headers["x-uploadthing-fe-package"], "my-frontend");
        assert!(headers.get("x-uploadthing-be-adapter").is_none());
    }

    #[test]
    fn test_headers_reject_control_chars() {
        let api = UtApi::new(UploadThingConfig::new(KEY))
            .unwrap()
            .with_fe_package("bad\nvalue");
        assert!(matches!(api.headers(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_new_rejects_missing_key() {
        let err = UtApi::new(UploadThingConfig::new("")).unwrap_err();
        assert_eq!(err.to_string(), "UPLOADTHING_SECRET is not set");
    }

    #[tokio::test]
    async fn test_delete_files() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v6/deleteFiles")
            .match_header("content-type", "application/json")
            .match_header("x-uploadthing-api-key", KEY)
            .match_header("x-uploadthing-version", config::DEFAULT_VERSION)
            .match_header("x-uploadthing-fe-package", Matcher::Missing)
            .match_body(Matcher::Json(json!({ "fileKeys": ["k1", "k2"] })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":true,"deletedCount":2}"#)
            .create_async()
            .await;

        let api = client_for(&server);
        let result = api.delete_files(["k1", "k2"]).await.unwrap();

        assert!(result.success);
        assert_eq!(result.deleted_count, 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_files_empty_is_rejected() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v6/deleteFiles")
            .expect(0)
            .create_async()
            .await;

        let api = client_for(&server);
        let err = api.delete_files(Vec::<String>::new()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rename_files_empty_is_rejected() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v6/renameFiles")
            .expect(0)
            .create_async()
            .await;

        let api = client_for(&server);
        let err = api.rename_files(vec![]).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_file_access_empty_key_is_rejected() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v6/requestFileAccess")
            .expect(0)
            .create_async()
            .await;

        let api = client_for(&server);
        let err = api.request_file_access("", Some(60)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        let err = api.get_presigned_url("", None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_request_upload_without_files_is_rejected() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v6/uploadFiles")
            .expect(0)
            .create_async()
            .await;

        let api = client_for(&server);
        let err = api
            .request_upload(&UploadFilesRequest::new(vec![], Acl::PublicRead))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        let err = api
            .get_presigned_upload_url(vec![], Acl::Private)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_request_upload_sends_metadata_and_disposition() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v6/uploadFiles")
            .match_body(Matcher::Json(json!({
                "files": [{ "name": "report.pdf", "size": 2048, "type": "application/pdf" }],
                "acl": "private",
                "metadata": { "owner": "u_42" },
                "contentDisposition": "attachment"
            })))
            .with_status(200)
            .with_body(r#"{"data":[{"key":"k2","fileName":"report.pdf","url":"https://s3.example","fields":{}}]}"#)
            .create_async()
            .await;

        let api = client_for(&server);
        let request = UploadFilesRequest::new(
            vec![UploadFileInfo::new("report.pdf", 2048, "application/pdf")],
            Acl::Private,
        )
        .with_metadata(json!({ "owner": "u_42" }))
        .with_content_disposition(crate::types::ContentDisposition::Attachment);
        let response = api.request_upload(&request).await.unwrap();

        assert_eq!(response.data[0].key, "k2");
        assert!(response.data[0].fields.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_files() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v6/listFiles")
            .match_body(Matcher::Json(json!({ "limit": 100, "offset": 0 })))
            .with_status(200)
            .with_body(
                json!({
                    "hasMore": true,
                    "files": [{
                        "id": "id1",
                        "customId": "avatar-1",
                        "key": "k1",
                        "name": "a.png",
                        "status": "Uploaded",
                        "size": 512,
                        "uploadedAt": 1700000000000i64
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let api = client_for(&server);
        let page = api.list_files(100, 0).await.unwrap();

        assert!(page.has_more);
        assert_eq!(page.files[0].custom_id.as_deref(), Some("avatar-1"));
        assert_eq!(page.files[0].name, "a.png");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rename_files() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v6/renameFiles")
            .match_body(Matcher::Json(json!({
                "updates": [{ "fileKey": "k1", "newName": "b.png" }]
            })))
            .with_status(200)
            .with_body(r#"{"success":true,"renamedCount":1}"#)
            .create_async()
            .await;

        let api = client_for(&server);
        let result = api
            .rename_files(vec![RenameFileUpdate::new("k1", "b.png")])
            .await
            .unwrap();

        assert_eq!(result.renamed_count, 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_usage_info_sends_empty_object() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v6/getUsageInfo")
            .match_body(Matcher::Json(json!({})))
            .with_status(200)
            .with_body(
                r#"{"totalBytes":2048,"appTotalBytes":1024,"filesUploaded":3,"limitBytes":2147483648}"#,
            )
            .create_async()
            .await;

        let api = client_for(&server);
        let usage = api.get_usage_info().await.unwrap();

        assert_eq!(usage.total_bytes, 2048);
        assert_eq!(usage.files_uploaded, 3);
        assert_eq!(usage.limit_bytes, 2_147_483_648);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_presigned_url() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v6/requestFileAccess")
            .match_body(Matcher::Json(json!({ "fileKey": "k1", "expiresIn": 3600 })))
            .with_status(200)
            .with_body(r#"{"ufsUrl":"https://app.ufs.sh/f/k1?sig=1","url":"https://utfs.io/f/k1"}"#)
            .create_async()
            .await;

        let api = client_for(&server);
        let url = api.get_presigned_url("k1", Some(3600)).await.unwrap();

        assert_eq!(url, "https://app.ufs.sh/f/k1?sig=1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_presigned_url_zero_expiry_is_omitted() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v6/requestFileAccess")
            .match_body(Matcher::Json(json!({ "fileKey": "k1" })))
            .with_status(200)
            .with_body(r#"{"url":"https://utfs.io/f/k1"}"#)
            .create_async()
            .await;

        let api = client_for(&server);
        let url = api.get_presigned_url("k1", Some(0)).await.unwrap();

        assert_eq!(url, "https://utfs.io/f/k1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_app_info() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v7/getAppInfo")
            .match_body(Matcher::Json(json!({})))
            .with_status(200)
            .with_body(r#"{"appId":"app1","defaultACL":"private","allowACLOverride":false}"#)
            .create_async()
            .await;

        let api = client_for(&server);
        let info = api.get_app_info().await.unwrap();

        assert_eq!(info.app_id, "app1");
        assert_eq!(info.default_acl, Acl::Private);
        assert!(!info.allow_acl_override);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_presigned_upload_url() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v6/uploadFiles")
            .match_body(Matcher::Json(json!({
                "files": [{ "name": "file.txt", "size": 11, "type": "text/plain" }],
                "acl": "public-read"
            })))
            .with_status(200)
            .with_body(
                json!({
                    "data": [{
                        "key": "k1",
                        "fileName": "file.txt",
                        "fileType": "text/plain",
                        "fileUrl": "https://utfs.io/f/k1",
                        "contentDisposition": "inline",
                        "pollingJwt": "eyJhbGciOiJIUzI1NiJ9.e30.sig",
                        "pollingUrl": "https://api.uploadthing.com/v6/pollUpload/k1",
                        "customId": null,
                        "url": "https://uploadthing.s3.amazonaws.com",
                        "fields": { "key": "k1", "Policy": "p" }
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let api = client_for(&server);
        let response = api
            .get_presigned_upload_url(
                vec![UploadFileInfo::new("file.txt", 11, "text/plain")],
                Acl::PublicRead,
            )
            .await
            .unwrap();

        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].fields["Policy"], "p");
        assert_eq!(response.data[0].polling_url, "https://api.uploadthing.com/v6/pollUpload/k1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_2xx_is_error_with_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v6/listFiles")
            .with_status(401)
            .with_body(r#"{"error":"Invalid API key"}"#)
            .create_async()
            .await;

        let api = client_for(&server);
        let err = api.list_files(10, 0).await.unwrap_err();

        assert_eq!(err.status(), Some(401));
        assert_eq!(
            err.to_string(),
            r#"UploadThing: error 401: {"error":"Invalid API key"}"#
        );
    }

    #[tokio::test]
    async fn test_invalid_json_is_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v6/getUsageInfo")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let api = client_for(&server);
        let err = api.get_usage_info().await.unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[tokio::test]
    async fn test_upload_file_end_to_end() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"some notes")
            .unwrap();

        let mut server = Server::new_async().await;
        let upload_url = format!("{}/s3", server.url());

        let api_mock = server
            .mock("POST", "/v6/uploadFiles")
            .match_body(Matcher::Json(json!({
                "files": [{ "name": "notes.txt", "size": 10, "type": "text/plain", "customId": "n-1" }],
                "acl": "private"
            })))
            .with_status(200)
            .with_body(
                json!({
                    "data": [{
                        "key": "k9",
                        "fileName": "notes.txt",
                        "fileType": "text/plain",
                        "fileUrl": "https://utfs.io/f/k9",
                        "customId": "n-1",
                        "url": upload_url,
                        "fields": { "key": "k9" }
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let s3_mock = server
            .mock("POST", "/s3")
            .match_body(Matcher::Regex(r#"(?s)name="key"\r\n\r\nk9\r\n.*some notes"#.to_string()))
            .with_status(204)
            .create_async()
            .await;

        let api = client_for(&server);
        let presigned = api
            .upload_file(&path, Acl::Private, Some("n-1"))
            .await
            .unwrap();

        assert_eq!(presigned.key, "k9");
        assert_eq!(presigned.file_url, "https://utfs.io/f/k9");
        api_mock.assert_async().await;
        s3_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_file_no_presigned_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::write(&path, b"").unwrap();

        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v6/uploadFiles")
            .with_status(200)
            .with_body(r#"{"data":[]}"#)
            .create_async()
            .await;

        let api = client_for(&server);
        let err = api.upload_file(&path, Acl::PublicRead, None).await.unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse(_)));
    }
}
