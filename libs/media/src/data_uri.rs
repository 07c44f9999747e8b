use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use bcast_core::StoreError;

/// Decoded body of a `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineMedia {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl InlineMedia {
    /// File extension used when storing the body.
    pub fn extension(&self) -> &'static str {
        extension_for(&self.mime)
    }
}

/// Parses `data:[<mime>][;base64],<body>`.
///
/// ```
/// use bcast_media::parse_data_uri;
///
/// let media = parse_data_uri("data:text/plain;base64,aGk=").unwrap();
/// assert_eq!(media.mime, "text/plain");
/// assert_eq!(media.bytes, b"hi");
/// ```
pub fn parse_data_uri(uri: &str) -> Result<InlineMedia, StoreError> {
    let trimmed = uri.trim();
    let rest = trimmed
        .get(..5)
        .filter(|scheme| scheme.eq_ignore_ascii_case("data:"))
        .and_then(|_| trimmed.get(5..))
        .ok_or_else(|| StoreError::Unsupported(preview(uri)))?;
    let (meta, body) = rest
        .split_once(',')
        .ok_or_else(|| StoreError::Decode("missing ',' separator".into()))?;

    let mut params = meta.split(';');
    let mime = params
        .next()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or("text/plain")
        .to_ascii_lowercase();
    let is_base64 = params.any(|p| p.trim().eq_ignore_ascii_case("base64"));

    let bytes = if is_base64 {
        let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
        B64.decode(compact.as_bytes())
            .map_err(|err| StoreError::Decode(err.to_string()))?
    } else {
        urlencoding::decode_binary(body.as_bytes()).into_owned()
    };
    if bytes.is_empty() {
        return Err(StoreError::Decode("empty body".into()));
    }
    Ok(InlineMedia { mime, bytes })
}

pub fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "video/mp4" => "mp4",
        "audio/mpeg" => "mp3",
        "audio/ogg" => "ogg",
        "application/pdf" => "pdf",
        "text/plain" => "txt",
        _ => "bin",
    }
}

fn preview(reference: &str) -> String {
    reference.chars().take(32).collect()
}
