use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::asset::{Asset, AssetType};

pub const DEFAULT_PROJECT_NAME: &str = "我的第一个游戏项目";
pub const NEW_PROJECT_NAME: &str = "新游戏项目";
pub const UNNAMED_PROJECT_NAME: &str = "未命名项目";

/// A project owns one knowledge base of classified assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub knowledge_base: Vec<Asset>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn new(name: &str) -> Self {
        Self {
            id: new_project_id(),
            name: name.to_string(),
            knowledge_base: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Rebuild a project from an untrusted JSON record, defaulting every
    /// missing or unreadable field. Assets that do not deserialize are dropped.
    pub fn from_json_lenient(value: &serde_json::Value) -> Self {
        let id = value
            .get("id")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(new_project_id);

        let name = value
            .get("name")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(UNNAMED_PROJECT_NAME)
            .to_string();

        let knowledge_base = value
            .get("knowledgeBase")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| match serde_json::from_value::<Asset>(item.clone()) {
                        Ok(asset) => Some(asset),
                        Err(e) => {
                            log::warn!("dropping unreadable asset in project {}: {}", id, e);
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let created_at = value
            .get("createdAt")
            .and_then(parse_timestamp)
            .unwrap_or_else(Utc::now);

        Self {
            id,
            name,
            knowledge_base,
            created_at,
        }
    }

    /// Knowledge-base browser filter: `category` of `None` or `"all"` matches
    /// everything; `query` matches name or any tag, case-insensitively.
    pub fn filter_assets(&self, category: Option<&str>, query: &str) -> Vec<&Asset> {
        let category = category.filter(|c| *c != "all");
        self.knowledge_base
            .iter()
            .filter(|a| category.map_or(true, |c| a.category == c))
            .filter(|a| a.matches_query(query))
            .collect()
    }

    pub fn count_by_type(&self, asset_type: AssetType) -> usize {
        self.knowledge_base
            .iter()
            .filter(|a| a.asset_type == asset_type)
            .count()
    }

    /// First image asset in upload order.
    pub fn first_image(&self) -> Option<&Asset> {
        self.knowledge_base
            .iter()
            .find(|a| a.asset_type == AssetType::Image)
    }
}

fn new_project_id() -> String {
    format!("project_{}", uuid::Uuid::new_v4().simple())
}

/// Accepts RFC 3339 strings and millisecond epoch numbers.
fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    if let Some(s) = value.as_str() {
        return DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|d| d.with_timezone(&Utc));
    }
    value
        .as_i64()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::asset::{AssetUpload, ImageCategory};
    use serde_json::json;

    fn asset(name: &str, mime: &str, category: Option<ImageCategory>) -> Asset {
        let mut a = Asset::from_upload(AssetUpload {
            name: name.to_string(),
            mime_type: mime.to_string(),
            byte_len: 10,
            image_category: category,
            preview: None,
        });
        a.classify();
        a
    }

    #[test]
    fn lenient_rebuild_defaults_missing_fields() {
        let p = Project::from_json_lenient(&json!({}));
        assert!(p.id.starts_with("project_"));
        assert_eq!(p.name, UNNAMED_PROJECT_NAME);
        assert!(p.knowledge_base.is_empty());
    }

    #[test]
    fn lenient_rebuild_parses_dates() {
        let p = Project::from_json_lenient(&json!({
            "id": "project_1",
            "name": "旧项目",
            "knowledgeBase": [],
            "createdAt": "2025-09-14T08:30:00.000Z"
        }));
        assert_eq!(p.id, "project_1");
        assert_eq!(p.name, "旧项目");
        assert_eq!(p.created_at.timestamp(), 1757838600);

        let p = Project::from_json_lenient(&json!({ "createdAt": 1_000 }));
        assert_eq!(p.created_at.timestamp_millis(), 1_000);
    }

    #[test]
    fn lenient_rebuild_drops_bad_assets() {
        let good = serde_json::to_value(asset("a.png", "image/png", None)).unwrap();
        let p = Project::from_json_lenient(&json!({
            "knowledgeBase": [good, { "bogus": true }]
        }));
        assert_eq!(p.knowledge_base.len(), 1);
    }

    #[test]
    fn filter_by_category_and_query() {
        let mut p = Project::new("测试");
        p.knowledge_base.push(asset("hero.png", "image/png", Some(ImageCategory::Character)));
        p.knowledge_base.push(asset("intro.mp4", "video/mp4", None));
        p.knowledge_base.push(asset("lore.txt", "text/plain", None));

        assert_eq!(p.filter_assets(None, "").len(), 3);
        assert_eq!(p.filter_assets(Some("all"), "").len(), 3);
        assert_eq!(p.filter_assets(Some("视觉素材"), "").len(), 1);
        assert_eq!(p.filter_assets(None, "人物").len(), 1);
        assert_eq!(p.filter_assets(Some("视频素材"), "人物").len(), 0);
        assert_eq!(p.count_by_type(AssetType::Text), 1);
        assert_eq!(p.first_image().map(|a| a.name.as_str()), Some("hero.png"));
    }
}
