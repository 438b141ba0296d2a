//! Utility functions shared by the feed pipeline and the CLI.
//!
//! - **HTML sanitization**: turning publisher markup into plain text
//! - **Text processing**: whitespace, control characters, display widths
//! - **URL validation**: scheme and host policy for feed URLs

mod html;
mod text;
mod url_validator;

pub use html::{clean_content, decode_entities, extract_image_url, sanitize_text, sanitize_url};
pub use text::{
    collapse_whitespace, display_width, format_read_time, format_relative_date,
    strip_control_chars, truncate_to_width, word_count,
};
pub use url_validator::{validate_url, HostPolicy, UrlValidationError};
