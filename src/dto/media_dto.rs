use serde::{Deserialize, Serialize};

/// A file received in a multipart request, fully buffered
#[derive(Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// MIME type from the part header, falling back to the extension
    pub fn mime_type(&self) -> String {
        if let Some(content_type) = self.content_type.as_deref().filter(|ct| !ct.is_empty()) {
            return content_type.to_string();
        }

        let extension = self.file_name.rsplit('.').next().unwrap_or("").to_lowercase();
        match extension.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "svg" => "image/svg+xml",
            _ => "application/octet-stream",
        }
        .to_string()
    }
}

impl std::fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// What the media store hands back after a successful upload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedAsset {
    pub url: String,
    pub public_id: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceType {
    Image,
    Video,
    Raw,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Video => "video",
            ResourceType::Raw => "raw",
        }
    }

    pub fn parse(segment: &str) -> Option<Self> {
        match segment {
            "image" => Some(ResourceType::Image),
            "video" => Some(ResourceType::Video),
            "raw" => Some(ResourceType::Raw),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeletionOutcome {
    Deleted,
    NotFound,
}
