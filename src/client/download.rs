//! Binary (CSV/blob) responses.

use super::RawResponse;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use std::path::{Path, PathBuf};

/// A downloaded file, named from the response's `Content-Disposition`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Download {
    /// Build from a raw response, using `fallback` when no filename is sent.
    pub fn from_response(raw: RawResponse, fallback: &str) -> Self {
        let filename = raw
            .headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_content_disposition)
            .unwrap_or_else(|| fallback.to_string());
        let content_type = raw
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Self {
            filename,
            content_type,
            bytes: raw.body,
        }
    }

    /// Write the file into `dir`, returning the full path.
    pub fn save_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Extract a safe filename from a `Content-Disposition` header value.
///
/// `filename*` (RFC 5987) wins over `filename`. Directory components are
/// stripped so a hostile header cannot escape the target directory.
pub fn filename_from_content_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for part in value.split(';').map(str::trim) {
        let Some((key, raw)) = part.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                let encoded = raw
                    .trim()
                    .split_once("''")
                    .map(|(_, rest)| rest)
                    .unwrap_or(raw.trim());
                let decoded = urlencoding::decode_binary(encoded.as_bytes());
                extended = Some(String::from_utf8_lossy(&decoded).into_owned());
            }
            "filename" => plain = Some(raw.trim().trim_matches('"').to_string()),
            _ => {}
        }
    }

    extended
        .or(plain)
        .map(|name| {
            name.rsplit(['/', '\\'])
                .next()
                .unwrap_or_default()
                .to_string()
        })
        .filter(|name| !name.is_empty() && name != "." && name != "..")
}
