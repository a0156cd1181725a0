pub mod embeds;

pub use embeds::{escape_markdown, rewrite_video_links, rewrite_video_links_with};
