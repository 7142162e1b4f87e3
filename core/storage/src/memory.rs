//! In-memory backend clients for testing and development.
//!
//! All data lives in process memory and is lost on drop. Call counters
//! let tests assert how many physical reads and writes an operation
//! performed (e.g. that deduplication really skipped the second write).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use caslink_common::{Error, Result};

use crate::firebase::client::{GcsApi, GcsInsertParams, GcsObject};
use crate::gdrive::client::{DriveApi, DriveFile, DriveLinks};
use crate::r2::client::{BucketApi, ObjectHead, PutParams};

fn not_found(what: &str) -> Error {
    Error::Backend {
        status: 404,
        message: format!("{} not found", what),
    }
}

fn precondition_failed(what: &str) -> Error {
    Error::Backend {
        status: 412,
        message: format!("{} already exists", what),
    }
}

/// Stored object shared by the bucket-shaped fakes.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
    pub cache_control: Option<String>,
    pub metadata: HashMap<String, String>,
    pub public: bool,
}

/// In-memory [`BucketApi`].
#[derive(Default)]
pub struct MemoryBucket {
    objects: RwLock<HashMap<String, StoredObject>>,
    head_calls: AtomicUsize,
    put_calls: AtomicUsize,
}

impl MemoryBucket {
    /// Create an empty bucket store.
    pub fn new() -> Self {
        Self::default()
    }

    fn object_key(bucket: &str, key: &str) -> String {
        format!("{}/{}", bucket, key)
    }

    /// Number of HEAD calls served.
    pub fn head_calls(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst)
    }

    /// Number of PUT calls served.
    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    /// Whether an object is present.
    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .read()
            .unwrap()
            .contains_key(&Self::object_key(bucket, key))
    }

    /// Seed an object directly, bypassing the API surface.
    pub fn insert_raw(&self, bucket: &str, key: &str, object: StoredObject) {
        self.objects
            .write()
            .unwrap()
            .insert(Self::object_key(bucket, key), object);
    }
}

#[async_trait]
impl BucketApi for MemoryBucket {
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectHead> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        let objects = self.objects.read().unwrap();
        let object = objects
            .get(&Self::object_key(bucket, key))
            .ok_or_else(|| not_found("object"))?;
        Ok(ObjectHead {
            size_bytes: object.data.len() as u64,
            etag: None,
            metadata: object.metadata.clone(),
            last_modified: None,
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        params: PutParams,
    ) -> Result<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        let mut objects = self.objects.write().unwrap();
        let object_key = Self::object_key(bucket, key);
        if params.if_none_match && objects.contains_key(&object_key) {
            return Err(precondition_failed("object"));
        }
        objects.insert(
            object_key,
            StoredObject {
                data: body,
                content_type: params.content_type,
                cache_control: params.cache_control,
                metadata: params.metadata,
                public: false,
            },
        );
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        // S3 DELETE is idempotent at the API level.
        self.objects
            .write()
            .unwrap()
            .remove(&Self::object_key(bucket, key));
        Ok(())
    }
}

/// In-memory [`GcsApi`].
#[derive(Default)]
pub struct MemoryGcs {
    objects: RwLock<HashMap<String, StoredObject>>,
    exists_calls: AtomicUsize,
    get_calls: AtomicUsize,
    insert_calls: AtomicUsize,
}

impl MemoryGcs {
    /// Create an empty object store.
    pub fn new() -> Self {
        Self::default()
    }

    fn object_key(bucket: &str, name: &str) -> String {
        format!("{}/{}", bucket, name)
    }

    fn resource(bucket: &str, name: &str, object: &StoredObject) -> GcsObject {
        GcsObject {
            name: name.to_string(),
            bucket: bucket.to_string(),
            size: Some(object.data.len().to_string()),
            content_type: Some(object.content_type.clone()),
            cache_control: object.cache_control.clone(),
            generation: Some("1".to_string()),
            metadata: Some(object.metadata.clone()),
            updated: None,
        }
    }

    /// Number of existence calls served.
    pub fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }

    /// Number of metadata fetches served.
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Number of insert calls served.
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    /// Whether the object has been made publicly readable.
    pub fn is_public(&self, bucket: &str, name: &str) -> bool {
        self.objects
            .read()
            .unwrap()
            .get(&Self::object_key(bucket, name))
            .map(|o| o.public)
            .unwrap_or(false)
    }

    /// Seed an object directly, bypassing the API surface.
    pub fn insert_raw(&self, bucket: &str, name: &str, object: StoredObject) {
        self.objects
            .write()
            .unwrap()
            .insert(Self::object_key(bucket, name), object);
    }
}

#[async_trait]
impl GcsApi for MemoryGcs {
    async fn object_exists(&self, bucket: &str, name: &str) -> Result<bool> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .objects
            .read()
            .unwrap()
            .contains_key(&Self::object_key(bucket, name)))
    }

    async fn get_object(&self, bucket: &str, name: &str) -> Result<GcsObject> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let objects = self.objects.read().unwrap();
        let object = objects
            .get(&Self::object_key(bucket, name))
            .ok_or_else(|| not_found("object"))?;
        Ok(Self::resource(bucket, name, object))
    }

    async fn insert_object(
        &self,
        bucket: &str,
        name: &str,
        data: Bytes,
        params: GcsInsertParams,
    ) -> Result<GcsObject> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        let mut objects = self.objects.write().unwrap();
        let object_key = Self::object_key(bucket, name);
        if params.if_absent && objects.contains_key(&object_key) {
            return Err(precondition_failed("object"));
        }
        let stored = StoredObject {
            data,
            content_type: params.content_type,
            cache_control: params.cache_control,
            metadata: params.metadata,
            public: false,
        };
        let resource = Self::resource(bucket, name, &stored);
        objects.insert(object_key, stored);
        Ok(resource)
    }

    async fn make_public(&self, bucket: &str, name: &str) -> Result<()> {
        let mut objects = self.objects.write().unwrap();
        let object = objects
            .get_mut(&Self::object_key(bucket, name))
            .ok_or_else(|| not_found("object"))?;
        object.public = true;
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, name: &str) -> Result<()> {
        let mut objects = self.objects.write().unwrap();
        objects
            .remove(&Self::object_key(bucket, name))
            .ok_or_else(|| not_found("object"))?;
        Ok(())
    }
}

/// In-memory [`DriveApi`].
#[derive(Default)]
pub struct MemoryDrive {
    files: RwLock<HashMap<String, MemoryDriveFile>>,
}

struct MemoryDriveFile {
    file: DriveFile,
    public: bool,
}

impl MemoryDrive {
    /// Create an empty drive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files currently stored.
    pub fn file_count(&self) -> usize {
        self.files.read().unwrap().len()
    }

    /// Whether the file has been granted the public-read permission.
    pub fn is_public(&self, file_id: &str) -> bool {
        self.files
            .read()
            .unwrap()
            .get(file_id)
            .map(|f| f.public)
            .unwrap_or(false)
    }

    /// Move a file to the trash, bypassing the API surface.
    pub fn set_trashed(&self, file_id: &str) {
        if let Some(entry) = self.files.write().unwrap().get_mut(file_id) {
            entry.file.trashed = true;
        }
    }
}

#[async_trait]
impl DriveApi for MemoryDrive {
    async fn get_file(&self, file_id: &str, _supports_all_drives: bool) -> Result<DriveFile> {
        self.files
            .read()
            .unwrap()
            .get(file_id)
            .map(|f| f.file.clone())
            .ok_or_else(|| not_found("file"))
    }

    async fn create_file(
        &self,
        name: &str,
        parents: &[String],
        content_type: &str,
        data: Bytes,
        _supports_all_drives: bool,
    ) -> Result<DriveFile> {
        let id = Uuid::new_v4().to_string();
        let file = DriveFile {
            id: id.clone(),
            name: name.to_string(),
            mime_type: Some(content_type.to_string()),
            size: Some(data.len().to_string()),
            md5_checksum: None,
            modified_time: None,
            parents: parents.to_vec(),
            web_view_link: Some(format!("https://drive.google.com/file/d/{}/view", id)),
            web_content_link: Some(format!("https://drive.google.com/uc?id={}", id)),
            trashed: false,
        };
        self.files.write().unwrap().insert(
            id,
            MemoryDriveFile {
                file: file.clone(),
                public: false,
            },
        );
        Ok(file)
    }

    async fn grant_public_read(&self, file_id: &str, _supports_all_drives: bool) -> Result<()> {
        let mut files = self.files.write().unwrap();
        let entry = files.get_mut(file_id).ok_or_else(|| not_found("file"))?;
        entry.public = true;
        Ok(())
    }

    async fn file_links(&self, file_id: &str, _supports_all_drives: bool) -> Result<DriveLinks> {
        let files = self.files.read().unwrap();
        let entry = files.get(file_id).ok_or_else(|| not_found("file"))?;
        Ok(DriveLinks {
            web_view_link: entry.file.web_view_link.clone(),
            web_content_link: entry.file.web_content_link.clone(),
        })
    }

    async fn delete_file(&self, file_id: &str, _supports_all_drives: bool) -> Result<()> {
        let mut files = self.files.write().unwrap();
        files.remove(file_id).ok_or_else(|| not_found("file"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_if_none_match_detects_existing_object() {
        let bucket = MemoryBucket::new();
        let params = PutParams {
            content_type: "text/plain".to_string(),
            if_none_match: true,
            ..Default::default()
        };

        bucket
            .put_object("b", "k", Bytes::from_static(b"one"), params.clone())
            .await
            .unwrap();
        let err = bucket
            .put_object("b", "k", Bytes::from_static(b"two"), params)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(412));
        assert_eq!(bucket.put_calls(), 2);
    }

    #[tokio::test]
    async fn test_head_reports_metadata_and_size() {
        let bucket = MemoryBucket::new();
        let mut metadata = HashMap::new();
        metadata.insert("content-sha256".to_string(), "cafe".to_string());
        bucket
            .put_object(
                "b",
                "k",
                Bytes::from_static(b"payload"),
                PutParams {
                    content_type: "text/plain".to_string(),
                    metadata,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let head = bucket.head_object("b", "k").await.unwrap();
        assert_eq!(head.size_bytes, 7);
        assert_eq!(head.metadata.get("content-sha256").unwrap(), "cafe");

        let err = bucket.head_object("b", "missing").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_drive_create_and_publish() {
        let drive = MemoryDrive::new();
        let file = drive
            .create_file(
                "abc.png",
                &["folder-1".to_string()],
                "image/png",
                Bytes::from_static(b"img"),
                false,
            )
            .await
            .unwrap();
        assert!(!drive.is_public(&file.id));

        drive.grant_public_read(&file.id, false).await.unwrap();
        assert!(drive.is_public(&file.id));

        let links = drive.file_links(&file.id, false).await.unwrap();
        assert!(links.web_view_link.unwrap().contains(&file.id));
    }
}
