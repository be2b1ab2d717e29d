//! Sprite descriptor decoding from inline CSS style strings.
//!
//! The selection tool renders product thumbnails as 64×64 tiles of a shared
//! sprite sheet, addressed by an inline style like:
//!
//! ```text
//! background-image:url(&quot;ApplRangeHandler.vhd?x=1&amp;y=2&quot;);
//! background-position:-64px -0px; width:64px; height:64px
//! ```
//!
//! The `url(...)` argument arrives either raw or HTML-entity-encoded
//! (`&quot;`/`&amp;`), depending on which attribute API produced the string.

use std::sync::OnceLock;

use regex::Regex;

/// Origin prefixed onto relative sprite URLs.
pub const SELECT_BASE_ORIGIN: &str = "https://select.wilo.com";

/// Default tile edge when the style carries no width/height declarations.
const DEFAULT_TILE_PX: u32 = 64;

/// Addresses one tile of a shared sprite sheet.
///
/// `offset` is the top-left corner of the tile within the sheet — the
/// magnitude of the (conventionally negative) CSS background-position pair.
/// `size` components are always positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteDescriptor {
    pub sheet_url: String,
    pub offset: (u32, u32),
    pub size: (u32, u32),
}

fn position_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"background-position:\s*([^;]+)").expect("valid regex"))
}

fn width_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|[;\s])width:\s*(\d+)px").expect("valid regex"))
}

fn height_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|[;\s])height:\s*(\d+)px").expect("valid regex"))
}

/// Decodes a style string into a [`SpriteDescriptor`].
///
/// Returns `None` when the style carries no `background-image: url(...)`
/// declaration at all; the caller then falls back to the plain `<img src>`
/// strategy, which has nothing to do with sprites.
#[must_use]
pub fn decode(style: &str) -> Option<SpriteDescriptor> {
    let sheet_url = extract_sheet_url(style)?;
    let offset = extract_offset(style);
    let size = extract_size(style);
    Some(SpriteDescriptor {
        sheet_url,
        offset,
        size,
    })
}

/// Extracts and normalizes the sprite sheet URL from the `background-image`
/// declaration. Handles the entity-encoded (`url(&quot;…&quot;)`), quoted
/// (`url("…")` / `url('…')`), and bare (`url(…)`) forms.
fn extract_sheet_url(style: &str) -> Option<String> {
    let decl_start = style.find("background-image")?;
    let after_decl = &style[decl_start..];
    let url_start = after_decl.find("url(")?;
    let arg = &after_decl[url_start + "url(".len()..];

    let raw = if let Some(inner) = delimited(arg, "&quot;", "&quot;)") {
        inner
    } else if let Some(inner) = delimited(arg, "\"", "\")") {
        inner
    } else if let Some(inner) = delimited(arg, "'", "')") {
        inner
    } else {
        arg.split(')').next()?
    };

    // Only the two entities the attribute API actually produces.
    let decoded = raw.replace("&amp;", "&").replace("&quot;", "\"");
    let decoded = decoded.trim();
    if decoded.is_empty() {
        return None;
    }

    Some(absolutize(decoded))
}

/// Returns the text between a leading `open` and the first following `close`,
/// or `None` if `s` does not start with `open`.
fn delimited<'a>(s: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let rest = s.strip_prefix(open)?;
    let end = rest.find(close)?;
    Some(&rest[..end])
}

fn absolutize(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_owned()
    } else if let Some(rest) = url.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        format!("{SELECT_BASE_ORIGIN}/{}", url.trim_start_matches('/'))
    }
}

/// Parses `background-position` into non-negative offsets. Sprite offsets are
/// conventionally negative in CSS; the descriptor stores their magnitudes.
/// Missing or unparseable positions default to `(0, 0)`.
fn extract_offset(style: &str) -> (u32, u32) {
    let Some(captures) = position_re().captures(style) else {
        return (0, 0);
    };
    let value = captures.get(1).map_or("", |m| m.as_str());
    let mut tokens = value.split_whitespace();

    let mut parse = |token: Option<&str>| -> Option<u32> {
        let cleaned = token?.trim_end_matches(',').trim_end_matches("px");
        let parsed = cleaned.parse::<f64>().ok()?;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some(parsed.abs() as u32)
    };

    let x = parse(tokens.next());
    let y = parse(tokens.next());
    match (x, y) {
        (Some(x), Some(y)) => (x, y),
        _ => (0, 0),
    }
}

/// Parses `width`/`height` declarations from the same style string, falling
/// back to the site's fixed 64px tile convention.
fn extract_size(style: &str) -> (u32, u32) {
    let dim = |re: &Regex| -> u32 {
        re.captures(style)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(DEFAULT_TILE_PX)
    };
    (dim(width_re()), dim(height_re()))
}
