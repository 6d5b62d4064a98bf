use serde::{Deserialize, Serialize};

/// Broad media type of an uploaded asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Image,
    Video,
    Text,
    Other,
}

impl AssetType {
    /// Classify a MIME type the way the upload screen does.
    pub fn from_mime(mime: &str) -> Self {
        const DOCUMENT_TYPES: &[&str] = &[
            "application/pdf",
            "application/msword",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ];

        if mime.starts_with("image/") {
            Self::Image
        } else if mime.starts_with("video/") {
            Self::Video
        } else if mime.contains("text/") || DOCUMENT_TYPES.contains(&mime) {
            Self::Text
        } else {
            Self::Other
        }
    }

    /// The tag string for this type ("image", "video", ...).
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Text => "text",
            Self::Other => "other",
        }
    }

    /// Knowledge-base category label.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Image => CATEGORY_VISUAL,
            Self::Video => CATEGORY_VIDEO,
            Self::Text => CATEGORY_TEXT,
            Self::Other => CATEGORY_OTHER,
        }
    }
}

pub const CATEGORY_VISUAL: &str = "视觉素材";
pub const CATEGORY_VIDEO: &str = "视频素材";
pub const CATEGORY_TEXT: &str = "文本资料";
pub const CATEGORY_OTHER: &str = "其他素材";

/// Every browsable category, in display order.
pub const CATEGORIES: [&str; 4] = [CATEGORY_VISUAL, CATEGORY_VIDEO, CATEGORY_TEXT, CATEGORY_OTHER];

/// Sub-category chosen for image uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageCategory {
    Character,
    Scene,
    Prop,
}

impl ImageCategory {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Character => "人物图",
            Self::Scene => "场景图",
            Self::Prop => "道具图",
        }
    }
}

/// A file as it arrives from the upload screen, before classification.
#[derive(Debug, Clone)]
pub struct AssetUpload {
    pub name: String,
    pub mime_type: String,
    pub byte_len: u64,
    /// Only honoured for image uploads.
    pub image_category: Option<ImageCategory>,
    pub preview: Option<String>,
}

/// A classified knowledge-base entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_category: Option<ImageCategory>,
    #[serde(default)]
    pub size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Asset {
    /// Build an unclassified asset from an upload.
    pub fn from_upload(upload: AssetUpload) -> Self {
        let asset_type = AssetType::from_mime(&upload.mime_type);
        let image_category = match asset_type {
            AssetType::Image => upload.image_category,
            _ => None,
        };

        Self {
            id: format!("asset_{}", uuid::Uuid::new_v4().simple()),
            name: upload.name,
            asset_type,
            image_category,
            size: format_file_size(upload.byte_len),
            preview: upload.preview,
            category: String::new(),
            tags: Vec::new(),
        }
    }

    /// Assign category and tags from the asset type and image sub-category.
    ///
    /// Tags are `[type, sub-tag?, "IP相关", "自动分类"]`; any previous tags are replaced.
    pub fn classify(&mut self) {
        self.category = self.asset_type.category().to_string();

        let mut tags = vec![self.asset_type.tag().to_string()];
        if self.asset_type == AssetType::Image {
            if let Some(sub) = self.image_category {
                tags.push(sub.tag().to_string());
            }
        }
        tags.push("IP相关".to_string());
        tags.push("自动分类".to_string());
        self.tags = tags;
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Case-insensitive substring match over the name and every tag.
    pub fn matches_query(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let needle = query.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&needle))
    }
}

/// Human-readable size label: `"512 B"`, `"1.5 KB"`, `"2.0 MB"`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1_048_576 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(mime: &str, category: Option<ImageCategory>) -> AssetUpload {
        AssetUpload {
            name: "hero.png".to_string(),
            mime_type: mime.to_string(),
            byte_len: 2048,
            image_category: category,
            preview: None,
        }
    }

    #[test]
    fn mime_classification() {
        assert_eq!(AssetType::from_mime("image/png"), AssetType::Image);
        assert_eq!(AssetType::from_mime("video/mp4"), AssetType::Video);
        assert_eq!(AssetType::from_mime("text/plain"), AssetType::Text);
        assert_eq!(AssetType::from_mime("application/pdf"), AssetType::Text);
        assert_eq!(AssetType::from_mime("application/zip"), AssetType::Other);
    }

    #[test]
    fn size_labels() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(1023), "1023 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(3 * 1_048_576), "3.0 MB");
    }

    #[test]
    fn classify_character_image() {
        let mut asset = Asset::from_upload(upload("image/png", Some(ImageCategory::Character)));
        asset.classify();
        assert_eq!(asset.category, "视觉素材");
        assert_eq!(asset.tags, vec!["image", "人物图", "IP相关", "自动分类"]);
        assert_eq!(asset.size, "2.0 KB");
        assert!(asset.id.starts_with("asset_"));
    }

    #[test]
    fn non_image_drops_sub_category() {
        let mut asset = Asset::from_upload(upload("video/mp4", Some(ImageCategory::Scene)));
        asset.classify();
        assert_eq!(asset.image_category, None);
        assert_eq!(asset.category, "视频素材");
        assert_eq!(asset.tags, vec!["video", "IP相关", "自动分类"]);
    }

    #[test]
    fn query_matches_name_and_tags() {
        let mut asset = Asset::from_upload(upload("image/png", Some(ImageCategory::Prop)));
        asset.classify();
        assert!(asset.matches_query(""));
        assert!(asset.matches_query("HERO"));
        assert!(asset.matches_query("道具"));
        assert!(!asset.matches_query("场景"));
    }

    #[test]
    fn json_uses_camel_case() {
        let mut asset = Asset::from_upload(upload("image/png", Some(ImageCategory::Scene)));
        asset.classify();
        let json = serde_json::to_string(&asset).unwrap();
        assert!(json.contains("\"imageCategory\":\"scene\""));
        assert!(json.contains("\"type\":\"image\""));
    }
}
