use crate::config::logging::secure_log;
use crate::dto::media_dto::{DeletionOutcome, ResourceType, UploadFile, UploadedAsset};
use crate::error::media_error::MediaError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

const UPLOAD_MARKER: &str = "upload";

/// Object storage for user images. Implementations only need to hand back a
/// public URL on upload and accept deletes by public id.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, file: &UploadFile) -> Result<UploadedAsset, MediaError>;

    async fn delete(&self, public_id: &str, resource_type: ResourceType) -> Result<DeletionOutcome, MediaError>;
}

/// Derive the store's public id from a delivery URL.
///
/// `https://res.cloudinary.com/demo/image/upload/v1712/folder/avatar.png`
/// yields `folder/avatar`. Returns `None` when the URL has no `upload`
/// segment or nothing after it.
pub fn extract_public_id(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let parts: Vec<&str> = path.split('/').collect();
    let upload_index = parts.iter().position(|part| *part == UPLOAD_MARKER)?;

    let mut rest = &parts[upload_index + 1..];
    if rest.first().is_some_and(|segment| is_version_segment(segment)) {
        rest = &rest[1..];
    }

    let with_extension = rest.join("/");
    let public_id = match with_extension.rfind('.') {
        Some(dot) if !with_extension[dot..].contains('/') => &with_extension[..dot],
        _ => with_extension.as_str(),
    };

    if public_id.is_empty() {
        secure_log::sensitive_debug!("No public id in asset URL: {}", url);
        return None;
    }

    Some(public_id.to_string())
}

/// The resource type is the path segment right before `upload`. Delivery URLs
/// without a recognised one are treated as images.
pub fn extract_resource_type(url: &str) -> ResourceType {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let parts: Vec<&str> = path.split('/').collect();
    parts
        .iter()
        .position(|part| *part == UPLOAD_MARKER)
        .and_then(|index| index.checked_sub(1))
        .and_then(|index| ResourceType::parse(parts[index]))
        .unwrap_or(ResourceType::Image)
}

fn is_version_segment(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('v')
        && segment[1..].chars().all(|c| c.is_ascii_digit())
}

/// In-memory media store for tests and local runs. Upload failures can be
/// switched on to exercise error paths.
pub struct InMemoryMediaStore {
    base_url: String,
    assets: DashMap<String, usize>,
    deletions: Mutex<Vec<(String, ResourceType)>>,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
}

impl InMemoryMediaStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            assets: DashMap::new(),
            deletions: Mutex::new(Vec::new()),
            fail_uploads: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new("https://media.local/vidhub/image/upload"))
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, public_id: &str) -> bool {
        self.assets.contains_key(public_id)
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    /// Every delete call received, in order
    pub fn deletions(&self) -> Vec<(String, ResourceType)> {
        self.deletions
            .lock()
            .map(|deletions| deletions.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn upload(&self, file: &UploadFile) -> Result<UploadedAsset, MediaError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(MediaError::UploadFailed(file.file_name.clone()));
        }

        let extension = file
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_else(|| "bin".to_string());
        let public_id = format!("vidhub/{}", Uuid::new_v4().simple());
        let url = format!("{}/v1/{}.{}", self.base_url, public_id, extension);

        self.assets.insert(public_id.clone(), file.bytes.len());
        Ok(UploadedAsset { url, public_id })
    }

    async fn delete(&self, public_id: &str, resource_type: ResourceType) -> Result<DeletionOutcome, MediaError> {
        if let Ok(mut deletions) = self.deletions.lock() {
            deletions.push((public_id.to_string(), resource_type));
        }

        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(MediaError::DeletionFailed(public_id.to_string()));
        }

        Ok(match self.assets.remove(public_id) {
            Some(_) => DeletionOutcome::Deleted,
            None => DeletionOutcome::NotFound,
        })
    }
}
