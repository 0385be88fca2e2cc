use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream as SdkByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use burnbin_blob::{BlobError, ByteStream, ContentStore};
use burnbin_core::ContentHash;
use burnbin_state::retry::{ConnectRetry, retry_until};
use bytes::Bytes;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::auth::build_sdk_config;
use crate::config::AwsBaseConfig;
use crate::error::classify_sdk_error;

/// Content type written on every paste body.
const PASTE_CONTENT_TYPE: &str = "text/plain";

/// Configuration for the S3 content store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// Shared AWS configuration (region, endpoint URL).
    #[serde(flatten)]
    pub aws: AwsBaseConfig,

    /// Bucket holding paste bodies. Created on connect if missing.
    pub bucket: String,

    /// Key prefix for all objects (e.g. `"pastes/"`).
    #[serde(default)]
    pub prefix: String,
}

impl S3Config {
    /// Create a new `S3Config` for `bucket` in the given AWS region.
    pub fn new(region: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            aws: AwsBaseConfig::new(region),
            bucket: bucket.into(),
            prefix: String::new(),
        }
    }

    /// Set the key prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the endpoint URL override (for MinIO).
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.aws.endpoint_url = Some(endpoint_url.into());
        self
    }

    fn object_key(&self, hash: &ContentHash) -> String {
        format!("{}{}", self.prefix, hash)
    }
}

fn sdk_error<E>(e: &SdkError<E>) -> BlobError
where
    E: std::error::Error + 'static,
{
    classify_sdk_error(&DisplayErrorContext(e).to_string())
}

/// [`ContentStore`] backed by an S3 bucket, one object per content hash.
pub struct S3ContentStore {
    config: S3Config,
    client: aws_sdk_s3::Client,
}

impl std::fmt::Debug for S3ContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ContentStore")
            .field("config", &self.config)
            .field("client", &"<S3Client>")
            .finish()
    }
}

impl S3ContentStore {
    /// Build the SDK client and wait until the bucket is reachable, creating
    /// it when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::Connection`] if the bucket cannot be reached or
    /// created before the connect deadline.
    pub async fn connect(config: S3Config, retry: ConnectRetry) -> Result<Self, BlobError> {
        let sdk_config = build_sdk_config(&config.aws).await;
        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if config.aws.endpoint_url.is_some() {
            // MinIO and friends do not serve virtual-hosted buckets.
            builder = builder.force_path_style(true);
        }
        let store = Self::with_client(config, aws_sdk_s3::Client::from_conf(builder.build()));

        retry_until("s3", retry, || store.ensure_bucket())
            .await
            .map_err(|e| BlobError::Connection(e.to_string()))?;
        info!(bucket = %store.config.bucket, "s3 content store ready");
        Ok(store)
    }

    /// Create a store with a pre-built client.
    pub fn with_client(config: S3Config, client: aws_sdk_s3::Client) -> Self {
        Self { config, client }
    }

    async fn ensure_bucket(&self) -> Result<(), BlobError> {
        let bucket = &self.config.bucket;
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => return Ok(()),
            Err(e) if e.as_service_error().is_some_and(HeadBucketError::is_not_found) => {}
            Err(e) => return Err(sdk_error(&e)),
        }

        info!(bucket = %bucket, "bucket missing, creating");
        let mut create = self.client.create_bucket().bucket(bucket);
        if self.config.aws.region != "us-east-1" {
            create = create.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(
                        self.config.aws.region.as_str(),
                    ))
                    .build(),
            );
        }
        create.send().await.map_err(|e| sdk_error(&e))?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for S3ContentStore {
    #[instrument(skip(self), fields(bucket = %self.config.bucket))]
    async fn exists(&self, hash: &ContentHash) -> Result<bool, BlobError> {
        match self
            .client
            .head_object()
            .bucket(&self.config.bucket)
            .key(self.config.object_key(hash))
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(HeadObjectError::is_not_found) => Ok(false),
            Err(e) => Err(sdk_error(&e)),
        }
    }

    #[instrument(skip(self, data), fields(bucket = %self.config.bucket, size = data.len()))]
    async fn put(&self, hash: &ContentHash, data: Bytes) -> Result<(), BlobError> {
        let size = i64::try_from(data.len()).unwrap_or(i64::MAX);
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(self.config.object_key(hash))
            .content_type(PASTE_CONTENT_TYPE)
            .content_length(size)
            .body(SdkByteStream::from(data))
            .send()
            .await
            .map_err(|e| sdk_error(&e))?;
        debug!("object stored");
        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.config.bucket))]
    async fn get(&self, hash: &ContentHash) -> Result<Option<ByteStream>, BlobError> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.config.bucket)
            .key(self.config.object_key(hash))
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) if e.as_service_error().is_some_and(GetObjectError::is_no_such_key) => {
                return Ok(None);
            }
            Err(e) => return Err(sdk_error(&e)),
        };

        let body = futures::stream::try_unfold(output.body, |mut body| async move {
            match body.try_next().await {
                Ok(Some(chunk)) => Ok(Some((chunk, body))),
                Ok(None) => Ok(None),
                Err(e) => Err(BlobError::Storage(e.to_string())),
            }
        });
        Ok(Some(body.boxed()))
    }

    #[instrument(skip(self), fields(bucket = %self.config.bucket))]
    async fn delete(&self, hash: &ContentHash) -> Result<bool, BlobError> {
        // S3 deletes are idempotent and do not report prior existence.
        let existed = self.exists(hash).await?;
        if existed {
            self.client
                .delete_object()
                .bucket(&self.config.bucket)
                .key(self.config.object_key(hash))
                .send()
                .await
                .map_err(|e| sdk_error(&e))?;
        }
        Ok(existed)
    }
}
