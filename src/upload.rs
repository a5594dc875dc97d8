use crate::compressor::{CompressedImage, Compressor, CompressorOptions, Quality};
use crate::constants::{
    CACHE_CONTROL, DEFAULT_BUCKET, MAX_UPLOAD_SIZE, PROGRESS_COMPRESSED, PROGRESS_COMPRESSING,
    PROGRESS_UPLOADED,
};
use crate::error::{EncodingError, Result, UploadError};
use crate::formats::MediaType;
use crate::sanitize::{sanitize_file_name, validate_file_name, Clock, SystemClock};
use crate::storage::{ObjectStorage, PutOptions};
use bytes::Bytes;
use std::path::Path;

/// A user-selected file, held in memory for a single upload attempt
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    /// Declared MIME type, as reported by whoever picked the file
    pub media_type: String,
    pub bytes: Bytes,
}

impl SourceFile {
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Reads a file from disk. Without `media_type`, the type is inferred from
    /// the extension; unknown extensions get `application/octet-stream` and
    /// are rejected later by [`ImageUploader::upload`].
    pub async fn from_path(path: &Path, media_type: Option<String>) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let media_type = media_type.unwrap_or_else(|| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .and_then(MediaType::from_extension)
                .map(|t| t.mime().to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string())
        });

        Ok(Self::new(name, media_type, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Outcome of a successful upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadResult {
    /// Public reference to store alongside the workout record
    pub url: String,
    pub key: String,
    pub compressed: bool,
    /// Bytes actually transferred
    pub final_size: u64,
    /// Quality the compressor settled on, when it ran
    pub quality: Option<Quality>,
}

#[derive(Debug, Clone)]
pub struct UploaderConfig {
    pub bucket: String,
    /// Files above this size are recompressed to fit it
    pub max_upload_size: u64,
    pub cache_control: String,
    pub compressor: CompressorOptions,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            max_upload_size: MAX_UPLOAD_SIZE,
            cache_control: CACHE_CONTROL.to_string(),
            compressor: CompressorOptions::default(),
        }
    }
}

impl UploaderConfig {
    pub fn new(
        bucket: Option<String>,
        max_upload_size: Option<u64>,
        compressor: Option<CompressorOptions>,
    ) -> Self {
        Self {
            bucket: bucket.unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            max_upload_size: max_upload_size
                .filter(|&size| size > 0)
                .unwrap_or(MAX_UPLOAD_SIZE),
            cache_control: CACHE_CONTROL.to_string(),
            compressor: compressor.unwrap_or_default(),
        }
    }
}

/// Validates, recompresses when needed, names and stores user images.
pub struct ImageUploader<S, C = SystemClock> {
    storage: S,
    clock: C,
    compressor: Compressor,
    config: UploaderConfig,
}

impl<S: ObjectStorage> ImageUploader<S, SystemClock> {
    pub fn new(storage: S, config: UploaderConfig) -> Self {
        let compressor = Compressor::new(config.compressor.clone());
        Self {
            storage,
            clock: SystemClock,
            compressor,
            config,
        }
    }
}

impl<S: ObjectStorage, C: Clock> ImageUploader<S, C> {
    pub fn with_clock<C2: Clock>(self, clock: C2) -> ImageUploader<S, C2> {
        ImageUploader {
            storage: self.storage,
            clock,
            compressor: self.compressor,
            config: self.config,
        }
    }

    pub fn with_compressor(mut self, compressor: Compressor) -> Self {
        self.compressor = compressor;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn config(&self) -> &UploaderConfig {
        &self.config
    }

    pub async fn upload(&self, file: SourceFile) -> Result<UploadResult> {
        self.upload_with_progress(file, |_| {}).await
    }

    /// Runs the full ingestion pipeline for one file.
    ///
    /// `on_progress` receives 10 and 50 around compression (only when the
    /// file is over budget) and 100 once the bytes are stored.
    ///
    /// # Errors
    /// Checks run in order and the first failure wins:
    /// * `UnsupportedType` - declared type is not an accepted image type
    /// * `InvalidName` - name contains characters from a rejected script
    /// * `Compression` - decode or re-encode failed; nothing is uploaded
    /// * `Storage` - the store refused the object
    pub async fn upload_with_progress<F>(
        &self,
        file: SourceFile,
        mut on_progress: F,
    ) -> Result<UploadResult>
    where
        F: FnMut(u8) + Send,
    {
        let declared = MediaType::from_mime(&file.media_type)
            .ok_or_else(|| UploadError::UnsupportedType(file.media_type.clone()))?;
        validate_file_name(&file.name)?;

        let original_size = file.size();
        let max_size = self.config.max_upload_size;

        let (payload, content_type, quality) = if original_size <= max_size {
            (file.bytes.clone(), declared, None)
        } else {
            on_progress(PROGRESS_COMPRESSING);
            let compressed = self.compress(file.bytes.clone(), max_size).await?;
            on_progress(PROGRESS_COMPRESSED);
            (
                Bytes::from(compressed.bytes),
                compressed.media_type,
                Some(compressed.quality),
            )
        };
        let compressed = quality.is_some();
        let final_size = payload.len() as u64;

        let key = sanitize_file_name(&file.name, self.clock.now_millis());
        let options = PutOptions {
            cache_control: self.config.cache_control.clone(),
            overwrite: false,
            content_type: Some(content_type.mime().to_string()),
        };

        let bucket = &self.config.bucket;
        let stored = self
            .storage
            .put(bucket, &key, payload, &options)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    size_bytes = final_size,
                    "image upload failed"
                );
                UploadError::Storage(e)
            })?;

        on_progress(PROGRESS_UPLOADED);

        let url = self.storage.public_url(bucket, &stored.path);
        tracing::info!(
            bucket = %bucket,
            key = %stored.path,
            original_bytes = original_size,
            size_bytes = final_size,
            compressed,
            "image uploaded"
        );

        Ok(UploadResult {
            url,
            key: stored.path,
            compressed,
            final_size,
            quality,
        })
    }

    /// Deletes the object behind a reference issued by [`ImageUploader::upload`].
    ///
    /// References outside this uploader's bucket are ignored. Failures are
    /// logged and never returned.
    pub async fn delete_by_reference(&self, reference: &str) {
        let bucket = &self.config.bucket;
        let Some(key) = storage_key_from_reference(reference, bucket) else {
            tracing::debug!(reference, "reference has no storage key, nothing to delete");
            return;
        };

        match self.storage.remove(bucket, std::slice::from_ref(&key)).await {
            Ok(()) => tracing::info!(bucket = %bucket, key = %key, "image deleted"),
            Err(e) => {
                tracing::warn!(error = %e, bucket = %bucket, key = %key, "image delete failed")
            }
        }
    }

    async fn compress(&self, data: Bytes, max_size: u64) -> Result<CompressedImage> {
        let compressor = self.compressor.clone();
        tokio::task::spawn_blocking(move || compressor.compress_bytes(&data, max_size))
            .await
            .map_err(|e| UploadError::Compression(EncodingError::Interrupted(e.to_string())))?
            .map_err(UploadError::Compression)
    }
}

/// Extracts the storage key from a public reference: everything after the
/// first whole `{bucket}/` path segment, minus any query string or fragment.
///
/// # Example
/// ```
/// use workout_images::storage_key_from_reference;
///
/// let url = "https://cdn.example.com/public/workout_images/squat_1700000000000.png";
/// assert_eq!(
///     storage_key_from_reference(url, "workout_images").as_deref(),
///     Some("squat_1700000000000.png")
/// );
/// assert_eq!(storage_key_from_reference("https://elsewhere/x.png", "workout_images"), None);
/// ```
pub fn storage_key_from_reference(reference: &str, bucket: &str) -> Option<String> {
    if bucket.is_empty() {
        return None;
    }
    let segment = format!("{}/", bucket);
    let (index, _) = reference
        .match_indices(&segment)
        .find(|&(i, _)| i == 0 || reference[..i].ends_with('/'))?;
    let rest = &reference[index + segment.len()..];
    let key = rest.split(['?', '#']).next().unwrap_or_default();

    (!key.is_empty()).then(|| key.to_string())
}
