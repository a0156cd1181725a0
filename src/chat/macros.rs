use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::cache::MetadataCache;
use crate::error::Result;
use crate::sources::{extract_video_id, VideoInfo};
use crate::ui::embeds::{format_duration, format_upload_date, thumbnail_image};

/// What a `{{yt-<name>::<arg>}}` macro expands to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroKind {
    Id,
    Title,
    Thumbnail,
    ThumbnailImage,
    Duration,
    Channel,
    Views,
    Date,
    Description,
    Url,
    /// Any other name, looked up as a raw metadata field
    Field(String),
}

impl MacroKind {
    /// Parses a macro name, ignoring case and surrounding whitespace.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "id" => MacroKind::Id,
            "title" | "name" => MacroKind::Title,
            "thumbnail" | "thumb" => MacroKind::Thumbnail,
            "thumb-img" | "thumbnail-img" => MacroKind::ThumbnailImage,
            "duration" | "length" => MacroKind::Duration,
            "channel" | "uploader" | "author" => MacroKind::Channel,
            "views" => MacroKind::Views,
            "date" | "uploaded" => MacroKind::Date,
            "description" => MacroKind::Description,
            "url" => MacroKind::Url,
            other => MacroKind::Field(other.to_string()),
        }
    }

    /// Renders the macro against fetched metadata.
    pub fn render(&self, info: &VideoInfo) -> String {
        match self {
            MacroKind::Id => String::new(),
            MacroKind::Title => info.title.clone(),
            MacroKind::Thumbnail => info.thumbnail.clone(),
            MacroKind::ThumbnailImage => thumbnail_image(&info.title, &info.thumbnail),
            MacroKind::Duration => format_duration(info.duration),
            MacroKind::Channel => info.uploader.clone(),
            MacroKind::Views => info.view_count.to_string(),
            MacroKind::Date => format_upload_date(&info.upload_date),
            MacroKind::Description => info.description.clone(),
            MacroKind::Url => info.url.clone(),
            MacroKind::Field(name) => match info.field(name) {
                Some(Value::String(s)) => s,
                Some(Value::Number(n)) => n.to_string(),
                Some(other) => other.to_string(),
                None => String::new(),
            },
        }
    }
}

/// Expands macros into metadata of the referenced video.
pub struct MacroResolver {
    cache: Arc<MetadataCache>,
}

impl MacroResolver {
    pub fn new(cache: Arc<MetadataCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    /// Resolves one macro invocation.
    ///
    /// Missing arguments, unrecognised links, videos without metadata and
    /// unknown fields all expand to an empty string. Only fetch transport
    /// failures come back as `Err`.
    pub async fn resolve(&self, name: &str, raw_arg: &str) -> Result<String> {
        let arg = raw_arg.trim();
        if arg.is_empty() {
            debug!("Macro yt-{} has no argument, expanding to nothing", name.trim());
            return Ok(String::new());
        }

        let kind = MacroKind::from_name(name);

        let Some(id) = extract_video_id(arg) else {
            debug!("No video id in macro argument {:?}", arg);
            return Ok(String::new());
        };

        if kind == MacroKind::Id {
            return Ok(id.to_string());
        }

        match self.cache.get_info(&id).await? {
            Some(info) => Ok(kind.render(&info)),
            None => {
                debug!("No metadata for video {}, macro yt-{} expands to nothing", id, name.trim());
                Ok(String::new())
            }
        }
    }
}
