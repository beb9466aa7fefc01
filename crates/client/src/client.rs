//! Harbor service client
//!
//! Wraps the dispatcher with one method per service operation and
//! implements the core seam traits so the transfer controller and listing
//! cursor can run against the live service.

use std::path::{MAIN_SEPARATOR, Path};

use async_trait::async_trait;
use bytes::Bytes;
use hb_core::types::MetadataEnvelope;
use hb_core::{
    AccessPermission, ApiResult, ApiStatus, BucketStats, Chunk, ChunkAck, ChunkStore,
    ClientConfig, Error, ListingCursor, ListingPage, Metadata, ObjectLocator, PageSource,
    Progress, Result, TransferController, TransferOutcome, UrlBuilder,
};
use http::Method;
use reqwest::multipart::{Form, Part};
use tokio::fs::{self, OpenOptions};

use crate::dispatch::{Dispatcher, RequestOptions};
use crate::response::Reply;

/// Header carrying the size of the returned chunk
pub const CHUNK_SIZE_HEADER: &str = "evob_chunk_size";

/// Header carrying the total object size
pub const OBJECT_SIZE_HEADER: &str = "evob_obj_size";

/// Client for one service endpoint and credential
#[derive(Debug, Clone)]
pub struct HarborClient {
    config: ClientConfig,
    urls: UrlBuilder,
    dispatcher: Dispatcher,
}

impl HarborClient {
    /// Create a client; invalid configuration is rejected here
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let urls = UrlBuilder::new(&config)?;
        let dispatcher = Dispatcher::new(&config)?;
        Ok(Self {
            config,
            urls,
            dispatcher,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn urls(&self) -> &UrlBuilder {
        &self.urls
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    async fn send(&self, method: Method, url: &str, options: RequestOptions) -> Result<Reply> {
        let response = self.dispatcher.execute(method, url, options).await?;
        Reply::read(response).await
    }

    /// Metadata of an object or directory
    pub async fn get_metadata(&self, bucket: &str, path: &str) -> Result<ApiResult<Metadata>> {
        let url = self.urls.metadata_url(bucket, path, &[])?;
        let reply = self.send(Method::GET, url.as_str(), RequestOptions::new()).await?;
        Ok(reply
            .json::<MetadataEnvelope>("Metadata retrieved", "Failed to get metadata")
            .map(|envelope| envelope.data))
    }

    /// Create directory `name` under `dir_path`
    pub async fn create_dir(&self, bucket: &str, dir_path: &str, name: &str) -> Result<ApiResult<()>> {
        let url = self.urls.dir_url(bucket, dir_path, "", &[])?;
        let options = RequestOptions::new().form(vec![("dir_name".to_string(), name.to_string())]);
        let reply = self.send(Method::POST, url.as_str(), options).await?;
        Ok(reply.status_only("Directory created", "Failed to create directory"))
    }

    pub async fn delete_dir(&self, bucket: &str, dir_path: &str) -> Result<ApiResult<()>> {
        let url = self.urls.dir_url(bucket, dir_path, "", &[])?;
        let reply = self.send(Method::DELETE, url.as_str(), RequestOptions::new()).await?;
        Ok(reply.status_only("Directory deleted", "Failed to delete directory"))
    }

    /// First page of a directory listing
    pub async fn list_dir(
        &self,
        bucket: &str,
        dir_path: &str,
        page_size: u32,
    ) -> Result<ApiResult<ListingPage>> {
        let url = self.urls.dir_url(bucket, dir_path, "", &[])?;
        let options = RequestOptions::new().param("limit", page_size);
        let reply = self.send(Method::GET, url.as_str(), options).await?;
        Ok(reply.json("Listing retrieved", "Failed to list directory"))
    }

    /// A listing page by the URL the service handed out
    pub async fn list_url(&self, url: &str) -> Result<ApiResult<ListingPage>> {
        let reply = self.send(Method::GET, url, RequestOptions::new()).await?;
        Ok(reply.json("Listing retrieved", "Failed to list directory"))
    }

    /// A listing cursor over `dir_path`
    pub fn cursor(&self, bucket: &str, dir_path: &str) -> ListingCursor<'_, Self> {
        ListingCursor::new(self, bucket, dir_path)
    }

    pub async fn delete_object(&self, bucket: &str, path: &str) -> Result<ApiResult<()>> {
        let locator = ObjectLocator::parse(bucket, path)?;
        let url = self
            .urls
            .object_url(bucket, &locator.dir_path, &locator.name, &[])?;
        let reply = self.send(Method::DELETE, url.as_str(), RequestOptions::new()).await?;
        Ok(reply.status_only("Object deleted", "Failed to delete object"))
    }

    /// Move an object into `dest_dir`; an empty `dest_dir` is the bucket root
    pub async fn move_object(&self, bucket: &str, path: &str, dest_dir: &str) -> Result<ApiResult<()>> {
        self.move_with(bucket, path, "move_to", dest_dir, "Object moved", "Failed to move object")
            .await
    }

    pub async fn rename_object(&self, bucket: &str, path: &str, new_name: &str) -> Result<ApiResult<()>> {
        if new_name.is_empty() || new_name.contains('/') {
            return Err(Error::InvalidPath(format!(
                "'{new_name}' is not a valid object name"
            )));
        }
        self.move_with(bucket, path, "rename", new_name, "Object renamed", "Failed to rename object")
            .await
    }

    async fn move_with(
        &self,
        bucket: &str,
        path: &str,
        param: &str,
        value: &str,
        on_success: &str,
        on_failure: &str,
    ) -> Result<ApiResult<()>> {
        let locator = ObjectLocator::parse(bucket, path)?;
        let url = self
            .urls
            .move_url(bucket, &locator.dir_path, &locator.name, &[])?;
        let options = RequestOptions::new().param(param, value);
        let reply = self.send(Method::POST, url.as_str(), options).await?;
        Ok(reply.status_only(on_success, on_failure))
    }

    pub async fn set_access_permission(
        &self,
        bucket: &str,
        path: &str,
        permission: AccessPermission,
    ) -> Result<ApiResult<()>> {
        let locator = ObjectLocator::parse(bucket, path)?;
        let url = self
            .urls
            .object_url(bucket, &locator.dir_path, &locator.name, &[])?;
        let options = RequestOptions::new().param("share", permission.as_share_param());
        let reply = self.send(Method::PATCH, url.as_str(), options).await?;
        Ok(reply.status_only(
            &format!("Object is now {permission}"),
            "Failed to change access permission",
        ))
    }

    pub async fn create_bucket(&self, name: &str) -> Result<ApiResult<()>> {
        let url = self.urls.bucket_url("", &[])?;
        let options = RequestOptions::new().form(vec![("name".to_string(), name.to_string())]);
        let reply = self.send(Method::POST, url.as_str(), options).await?;
        Ok(reply.status_only("Bucket created", "Failed to create bucket"))
    }

    pub async fn delete_bucket(&self, name: &str) -> Result<ApiResult<()>> {
        let url = self.urls.bucket_url(name, &[])?;
        let reply = self.send(Method::DELETE, url.as_str(), RequestOptions::new()).await?;
        Ok(reply.status_only("Bucket deleted", "Failed to delete bucket"))
    }

    pub async fn bucket_stats(&self, bucket: &str) -> Result<ApiResult<BucketStats>> {
        let url = self.urls.stats_url(bucket, &[])?;
        let reply = self.send(Method::GET, url.as_str(), RequestOptions::new()).await?;
        Ok(reply.json("Statistics retrieved", "Failed to get bucket statistics"))
    }

    /// Store one chunk of the object at `path`
    pub async fn upload_chunk(
        &self,
        bucket: &str,
        path: &str,
        offset: u64,
        data: Bytes,
    ) -> Result<ApiResult<ChunkAck>> {
        let locator = ObjectLocator::parse(bucket, path)?;
        ChunkStore::upload_chunk(self, &locator, offset, data).await
    }

    /// Fetch one chunk of the object at `path`
    pub async fn download_chunk(
        &self,
        bucket: &str,
        path: &str,
        offset: u64,
        size: u32,
    ) -> Result<ApiResult<Chunk>> {
        let locator = ObjectLocator::parse(bucket, path)?;
        ChunkStore::download_chunk(self, &locator, offset, size).await
    }

    /// Upload a local file to `path`, starting at `start_offset`.
    ///
    /// `Err` only for local failures before the transfer starts; everything
    /// else is reported in the outcome.
    pub async fn upload_file(
        &self,
        local: &Path,
        bucket: &str,
        path: &str,
        start_offset: u64,
        progress: Progress<'_>,
    ) -> Result<TransferOutcome> {
        let locator = ObjectLocator::parse(bucket, path)?;
        let mut file = fs::File::open(local).await?;
        let object_size = file.metadata().await?.len();

        tracing::debug!(
            local = %local.display(),
            bucket,
            path = %locator.full_path(),
            object_size,
            start_offset,
            "Uploading file"
        );
        let controller = TransferController::new(self, self.config.transfer);
        Ok(controller
            .upload(&locator, &mut file, object_size, start_offset, progress)
            .await)
    }

    /// Download the object at `path` into `dest_dir`.
    ///
    /// The file is named `file_name`, or after the object when `None`.
    /// Starting at offset 0 truncates an existing file; a resume keeps the
    /// bytes already there.
    pub async fn download_file(
        &self,
        bucket: &str,
        path: &str,
        dest_dir: &Path,
        file_name: Option<&str>,
        start_offset: u64,
        progress: Progress<'_>,
    ) -> Result<TransferOutcome> {
        let locator = ObjectLocator::parse(bucket, path)?;
        let file_name = match file_name {
            Some(name) if name.contains(MAIN_SEPARATOR) || name.contains('/') => {
                return Err(Error::InvalidPath(format!(
                    "file name '{name}' must not contain a path separator"
                )));
            }
            Some(name) if !name.is_empty() => name.to_string(),
            _ => locator.name.clone(),
        };

        fs::create_dir_all(dest_dir).await?;
        let target = dest_dir.join(&file_name);
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(start_offset == 0)
            .open(&target)
            .await?;

        tracing::debug!(
            bucket,
            path = %locator.full_path(),
            target = %target.display(),
            start_offset,
            "Downloading object"
        );
        let controller = TransferController::new(self, self.config.transfer);
        let outcome = controller
            .download(&locator, &mut file, start_offset, progress)
            .await;

        if outcome.is_done()
            && let Some(size) = outcome.object_size
        {
            file.set_len(size).await?;
        }
        Ok(outcome)
    }
}

#[async_trait]
impl ChunkStore for HarborClient {
    async fn download_chunk(
        &self,
        locator: &ObjectLocator,
        offset: u64,
        size: u32,
    ) -> Result<ApiResult<Chunk>> {
        let url = self
            .urls
            .object_url(&locator.bucket, &locator.dir_path, &locator.name, &[])?;
        let options = RequestOptions::new()
            .param("offset", offset)
            .param("size", size);
        let reply = self.send(Method::GET, url.as_str(), options).await?;

        if !reply.status.ok {
            let status = reply.status.or_message("", "Failed to download a chunk of the object");
            return Ok(ApiResult::status_only(status));
        }
        let Some(object_size) = reply.header_u64(OBJECT_SIZE_HEADER) else {
            return Ok(ApiResult::status_only(ApiStatus::failure(
                reply.status.code,
                format!("response lacks the {OBJECT_SIZE_HEADER} header"),
            )));
        };

        let chunk = Chunk {
            offset,
            declared_size: reply.header_u64(CHUNK_SIZE_HEADER).unwrap_or(0),
            object_size,
            data: reply.body,
        };
        let status = reply.status.or_message("Chunk downloaded", "");
        Ok(ApiResult::new(status, Some(chunk)))
    }

    async fn upload_chunk(
        &self,
        locator: &ObjectLocator,
        offset: u64,
        data: Bytes,
    ) -> Result<ApiResult<ChunkAck>> {
        let url = self
            .urls
            .object_url(&locator.bucket, &locator.dir_path, &locator.name, &[])?;
        let len = data.len() as u64;
        let form = Form::new()
            .part(
                "chunk",
                Part::bytes(data.to_vec()).file_name(locator.name.clone()),
            )
            .text("chunk_offset", offset.to_string())
            .text("chunk_size", len.to_string());
        let reply = self
            .send(Method::PUT, url.as_str(), RequestOptions::new().multipart(form))
            .await?;

        let status = reply.status.or_message(
            "Chunk uploaded",
            "Failed to upload a chunk of the object",
        );
        if !status.ok {
            return Ok(ApiResult::status_only(status));
        }
        // The acknowledgement is optional; an empty or foreign body is fine
        let ack = serde_json::from_slice::<ChunkAck>(&reply.body).ok();
        Ok(ApiResult::new(status, Some(ack.unwrap_or_default())))
    }
}

#[async_trait]
impl PageSource for HarborClient {
    async fn first_page(
        &self,
        bucket: &str,
        dir_path: &str,
        page_size: u32,
    ) -> Result<ApiResult<ListingPage>> {
        self.list_dir(bucket, dir_path, page_size).await
    }

    async fn page_at(&self, url: &str) -> Result<ApiResult<ListingPage>> {
        self.list_url(url).await
    }
}
