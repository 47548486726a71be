use serde::Deserialize;
use serde_json::Value;

pub const TEMPLATES: &str = "templates";
pub const IMAGES: &str = "images";
pub const ASSETS: &str = "assets";
pub const SCRIPTS: &str = "scripts";
pub const SCHEDULES: &str = "schedules";

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cron: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// Stored image. `content` is the opaque payload (base64 text in the store).
#[derive(Debug, Clone, Deserialize)]
pub struct ImageRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "contentType", default)]
    pub content_type: String,
    #[serde(default)]
    pub content: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetRecord {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: String,
}
