//! Textual HTML cleaning pipeline.
//!
//! Every stage is a regex rewrite over the raw string, not a DOM transform,
//! so fragments and malformed markup pass through predictably. Enabled stages
//! always run in this order: scripts, comments, styles, meta, clean, minify.
//! Truncation to `max_length` happens last and is unconditional.

use std::sync::LazyLock;

use regex::Regex;

/// Appended after a truncated result. Not counted against `max_length`.
pub const TRUNCATION_MARKER: &str = "...";

pub const DEFAULT_MAX_LENGTH: usize = 20_000;

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("cleaning pattern is valid")
}

// Lazy `.*?` stops at the first closing tag, so a stray `<` in the body does not end the match.
static SCRIPT: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?is)<script\b.*?</script\s*>"));
static STYLE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?is)<style\b.*?</style\s*>"));
static COMMENT: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?s)<!--.*?-->"));
static META: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)<meta\b[^>]*>"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| pattern(r"\s+"));
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| pattern(r"\s{2,}"));
static BETWEEN_TAGS: LazyLock<Regex> = LazyLock::new(|| pattern(r">\s+<"));
static EMPTY_ATTR: LazyLock<Regex> = LazyLock::new(|| pattern(r#"\s+[\w:-]+="""#));
static BEFORE_CLOSE: LazyLock<Regex> = LazyLock::new(|| pattern(r"\s+>"));
static AFTER_OPEN: LazyLock<Regex> = LazyLock::new(|| pattern(r"<\s+"));

/// Toggles for the cleaning stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub remove_scripts: bool,
    pub remove_comments: bool,
    pub remove_styles: bool,
    pub remove_meta: bool,
    pub clean_html: bool,
    pub minify: bool,
    /// Maximum output length in characters, excluding the marker.
    pub max_length: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            remove_scripts: true,
            remove_comments: false,
            remove_styles: false,
            remove_meta: false,
            clean_html: false,
            minify: false,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

/// Pipeline output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedHtml {
    pub html: String,
    /// Character count after cleaning, before truncation.
    pub cleaned_len: usize,
    pub truncated: bool,
}

pub fn strip_scripts(html: &str) -> String {
    SCRIPT.replace_all(html, "").into_owned()
}

pub fn strip_comments(html: &str) -> String {
    COMMENT.replace_all(html, "").into_owned()
}

pub fn strip_styles(html: &str) -> String {
    STYLE.replace_all(html, "").into_owned()
}

pub fn strip_meta(html: &str) -> String {
    META.replace_all(html, "").into_owned()
}

/// Collapse whitespace, drop whitespace between tags and empty `attr=""` pairs.
pub fn normalize(html: &str) -> String {
    let out = WHITESPACE.replace_all(html, " ");
    let out = BETWEEN_TAGS.replace_all(&out, "><");
    let out = EMPTY_ATTR.replace_all(&out, "");
    out.trim().to_string()
}

pub fn minify(html: &str) -> String {
    let out = WHITESPACE_RUN.replace_all(html, " ");
    let out = BETWEEN_TAGS.replace_all(&out, "><");
    let out = BEFORE_CLOSE.replace_all(&out, ">");
    let out = AFTER_OPEN.replace_all(&out, "<");
    out.trim().to_string()
}

/// Cut to `max_length` characters and append the marker when anything was cut.
/// The cut may land inside a tag.
pub fn truncate(html: String, max_length: usize) -> (String, bool) {
    match html.char_indices().nth(max_length) {
        Some((byte_idx, _)) => {
            let mut cut = html;
            cut.truncate(byte_idx);
            cut.push_str(TRUNCATION_MARKER);
            (cut, true)
        }
        None => (html, false),
    }
}

/// Run every enabled stage in order, then truncate.
pub fn clean(input: &str, config: &PipelineConfig) -> CleanedHtml {
    let mut html = input.to_string();

    if config.remove_scripts {
        html = strip_scripts(&html);
    }
    if config.remove_comments {
        html = strip_comments(&html);
    }
    if config.remove_styles {
        html = strip_styles(&html);
    }
    if config.remove_meta {
        html = strip_meta(&html);
    }
    if config.clean_html {
        html = normalize(&html);
    }
    if config.minify {
        html = minify(&html);
    }

    let cleaned_len = html.chars().count();
    let (html, truncated) = truncate(html, config.max_length);
    CleanedHtml {
        html,
        cleaned_len,
        truncated,
    }
}
