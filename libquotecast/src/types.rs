//! Core types for Quotecast

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Minutes of the hour (0-59) at which something is due
pub type MinuteSet = BTreeSet<u8>;

/// Content form of a single post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Text,
    Image,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Text => "text",
            PostType::Image => "image",
        }
    }

    /// The other content form
    pub fn complement(&self) -> PostType {
        match self {
            PostType::Text => PostType::Image,
            PostType::Image => PostType::Text,
        }
    }
}

impl FromStr for PostType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(PostType::Text),
            "image" => Ok(PostType::Image),
            other => Err(format!("Unknown post type: '{}'", other)),
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed or alternating content form for a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostMode {
    Text,
    Image,
    Alternate,
}

impl PostMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostMode::Text => "text",
            PostMode::Image => "image",
            PostMode::Alternate => "alternate",
        }
    }
}

impl FromStr for PostMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(PostMode::Text),
            "image" => Ok(PostMode::Image),
            "alternate" => Ok(PostMode::Alternate),
            other => Err(format!(
                "Unknown post mode: '{}'. Valid options: text, image, alternate",
                other
            )),
        }
    }
}

impl fmt::Display for PostMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where image posts get their picture from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageSource {
    #[default]
    Generated,
    TemplatedBackground,
}

impl ImageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSource::Generated => "generated",
            ImageSource::TemplatedBackground => "templated-background",
        }
    }
}

impl FromStr for ImageSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "generated" | "ai" => Ok(ImageSource::Generated),
            "templated-background" | "og" => Ok(ImageSource::TemplatedBackground),
            other => Err(format!("Unknown image source: '{}'", other)),
        }
    }
}

/// Which post types are relayed to the share target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShareMode {
    #[default]
    Both,
    TextOnly,
    ImageOnly,
}

impl ShareMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareMode::Both => "both",
            ShareMode::TextOnly => "text-only",
            ShareMode::ImageOnly => "image-only",
        }
    }

    /// Whether a post of `post_type` should be relayed under this mode
    pub fn accepts(&self, post_type: PostType) -> bool {
        match self {
            ShareMode::Both => true,
            ShareMode::TextOnly => post_type == PostType::Text,
            ShareMode::ImageOnly => post_type == PostType::Image,
        }
    }
}

impl FromStr for ShareMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "both" => Ok(ShareMode::Both),
            "text-only" | "text" => Ok(ShareMode::TextOnly),
            "image-only" | "image" => Ok(ShareMode::ImageOnly),
            other => Err(format!("Unknown share mode: '{}'", other)),
        }
    }
}

/// Half-open `[start, end)` window of local hours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub start: u8,
    pub end: u8,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self { start: 6, end: 24 }
    }
}

impl WorkingHours {
    pub fn contains(&self, hour: u8) -> bool {
        self.start <= hour && hour < self.end
    }
}

/// Image generation parameters for a page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSettings {
    pub source: ImageSource,
    pub model: Option<String>,
    pub resolution: Option<String>,
    pub aspect_ratio: Option<String>,
    /// Custom prompt with `{{QUOTE}}` and `{{PAGE_NAME}}` placeholders
    pub prompt_template: Option<String>,
    pub background_url: Option<String>,
    pub font: Option<String>,
}

/// Decorative background presets for text posts, rotated round-robin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorPresets {
    pub enabled: bool,
    pub presets: Vec<String>,
    pub index: u32,
}

/// Per-page scheduling and publishing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    pub page_id: String,
    pub page_name: Option<String>,
    pub enabled: bool,
    /// `None` when unset; the selector applies the default set
    pub schedule_minutes: Option<MinuteSet>,
    pub working_hours: WorkingHours,
    pub post_mode: Option<PostMode>,
    pub last_post_type: Option<PostType>,
    pub credential: Option<String>,
    pub image: ImageSettings,
    pub color: ColorPresets,
    pub share_target_page_id: Option<String>,
    pub share_mode: ShareMode,
    pub share_schedule_minutes: Option<MinuteSet>,
}

impl PageConfig {
    /// A disabled page with every optional setting unset
    pub fn new(page_id: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            page_name: None,
            enabled: false,
            schedule_minutes: None,
            working_hours: WorkingHours::default(),
            post_mode: None,
            last_post_type: None,
            credential: None,
            image: ImageSettings::default(),
            color: ColorPresets::default(),
            share_target_page_id: None,
            share_mode: ShareMode::default(),
            share_schedule_minutes: None,
        }
    }

    /// Whether a post of `post_type` must be queued for relay
    pub fn should_enqueue_share(&self, post_type: PostType) -> bool {
        self.share_target_page_id.is_some() && self.share_mode.accepts(post_type)
    }
}

/// A reusable content string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteItem {
    pub id: i64,
    pub text: String,
    pub consumed_by: BTreeSet<String>,
    pub created_at: i64,
}

impl QuoteItem {
    /// No page has ever used this quote
    pub fn is_globally_unused(&self) -> bool {
        self.consumed_by.is_empty()
    }

    pub fn is_unused_by(&self, page_id: &str) -> bool {
        !self.consumed_by.contains(page_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Success,
    Failed,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Success => "success",
            LogStatus::Failed => "failed",
        }
    }
}

/// One auto-post attempt; never mutated after insert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoPostLogEntry {
    pub id: Option<i64>,
    pub page_id: String,
    pub post_type: Option<PostType>,
    pub quote_text: Option<String>,
    pub status: LogStatus,
    pub platform_post_id: Option<String>,
    pub error_message: Option<String>,
    pub created_at: i64,
}

impl AutoPostLogEntry {
    pub fn success(
        page_id: &str,
        post_type: PostType,
        quote_text: &str,
        post_id: &str,
        created_at: i64,
    ) -> Self {
        Self {
            id: None,
            page_id: page_id.to_string(),
            post_type: Some(post_type),
            quote_text: Some(quote_text.to_string()),
            status: LogStatus::Success,
            platform_post_id: Some(post_id.to_string()),
            error_message: None,
            created_at,
        }
    }

    pub fn failure(
        page_id: &str,
        post_type: Option<PostType>,
        quote_text: Option<&str>,
        error: &str,
        created_at: i64,
    ) -> Self {
        Self {
            id: None,
            page_id: page_id.to_string(),
            post_type,
            quote_text: quote_text.map(str::to_string),
            status: LogStatus::Failed,
            platform_post_id: None,
            error_message: Some(error.to_string()),
            created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareStatus {
    Pending,
    Shared,
    Failed,
}

impl ShareStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareStatus::Pending => "pending",
            ShareStatus::Shared => "shared",
            ShareStatus::Failed => "failed",
        }
    }
}

impl FromStr for ShareStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ShareStatus::Pending),
            "shared" => Ok(ShareStatus::Shared),
            "failed" => Ok(ShareStatus::Failed),
            other => Err(format!("Unknown share status: '{}'", other)),
        }
    }
}

/// A pending or finished relay of a published post to a second page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareQueueItem {
    pub id: Option<i64>,
    pub source_page_id: String,
    pub target_page_id: String,
    pub platform_post_id: String,
    pub post_type: PostType,
    pub status: ShareStatus,
    pub created_at: i64,
    pub shared_post_id: Option<String>,
    pub shared_at: Option<i64>,
    pub error_message: Option<String>,
}

impl ShareQueueItem {
    pub fn pending(
        source_page_id: &str,
        target_page_id: &str,
        platform_post_id: &str,
        post_type: PostType,
        created_at: i64,
    ) -> Self {
        Self {
            id: None,
            source_page_id: source_page_id.to_string(),
            target_page_id: target_page_id.to_string(),
            platform_post_id: platform_post_id.to_string(),
            post_type,
            status: ShareStatus::Pending,
            created_at,
            shared_post_id: None,
            shared_at: None,
            error_message: None,
        }
    }
}
