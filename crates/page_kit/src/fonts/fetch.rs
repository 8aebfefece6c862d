//! Network-backed font loading over http(s), file and data URLs.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use bytes::Bytes;
use futures::future::BoxFuture;
use log::{debug, trace};
use reqwest::Client;
use url::Url;

use super::descriptor::{FontFace, FontSource, LoadedFontFace};
use super::{FontFaceLoader, FontLoadError};

/// Fetches each source candidate in order and keeps the first one whose bytes
/// carry a recognized font signature.
#[derive(Clone, Debug, Default)]
pub struct FetchFontLoader {
    client: Client,
    base_url: Option<Url>,
}

impl FetchFontLoader {
    pub fn new(base_url: Option<Url>) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }
}

impl FontFaceLoader for FetchFontLoader {
    fn load(&self, face: FontFace) -> BoxFuture<'static, Result<LoadedFontFace, FontLoadError>> {
        let client = self.client.clone();
        let base_url = self.base_url.clone();
        Box::pin(async move {
            if face.sources.is_empty() {
                return Err(FontLoadError::NoSources {
                    family: face.family,
                });
            }
            let mut attempts = Vec::with_capacity(face.sources.len());
            for source in &face.sources {
                match fetch_source(&client, base_url.as_ref(), source).await {
                    Ok(data) => {
                        let location = source.location();
                        debug!(target: "page_kit::fonts", "loaded {} from {location}", face.family);
                        let source = source.clone();
                        return Ok(LoadedFontFace::new(face, source, data));
                    }
                    Err(error) => {
                        let location = source.location();
                        trace!(target: "page_kit::fonts", "skipping {location}: {error}");
                        attempts.push(error.to_string());
                    }
                }
            }
            Err(FontLoadError::NoUsableSource {
                family: face.family,
                attempts,
            })
        })
    }
}

async fn fetch_source(
    client: &Client,
    base_url: Option<&Url>,
    source: &FontSource,
) -> Result<Bytes, FontLoadError> {
    let location = source.location();
    let data = if location.starts_with("data:") {
        decode_data_url(location)?
    } else {
        let url = resolve(base_url, location)?;
        match url.scheme() {
            "http" | "https" => fetch_http(client, &url).await?,
            "file" => fetch_file(&url).await?,
            _ => {
                return Err(FontLoadError::UnsupportedScheme {
                    url: url.to_string(),
                });
            }
        }
    };
    if sniff_font(&data).is_none() {
        return Err(FontLoadError::InvalidData {
            url: location.to_owned(),
        });
    }
    Ok(data)
}

fn resolve(base_url: Option<&Url>, location: &str) -> Result<Url, FontLoadError> {
    match Url::parse(location) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => base_url
            .ok_or_else(|| FontLoadError::Fetch {
                url: location.to_owned(),
                reason: "relative URL without a base".to_owned(),
            })?
            .join(location)
            .map_err(|error| FontLoadError::Fetch {
                url: location.to_owned(),
                reason: error.to_string(),
            }),
        Err(error) => Err(FontLoadError::Fetch {
            url: location.to_owned(),
            reason: error.to_string(),
        }),
    }
}

async fn fetch_http(client: &Client, url: &Url) -> Result<Bytes, FontLoadError> {
    let fail = |reason: String| FontLoadError::Fetch {
        url: url.to_string(),
        reason,
    };
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|error| fail(error.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(fail(format!("status {}", status.as_u16())));
    }
    response.bytes().await.map_err(|error| fail(error.to_string()))
}

async fn fetch_file(url: &Url) -> Result<Bytes, FontLoadError> {
    let fail = |reason: String| FontLoadError::Fetch {
        url: url.to_string(),
        reason,
    };
    let path = url
        .to_file_path()
        .map_err(|()| fail("invalid file path".to_owned()))?;
    let data = tokio::fs::read(path)
        .await
        .map_err(|error| fail(error.to_string()))?;
    Ok(Bytes::from(data))
}

/// Decode `data:[<mediatype>][;base64],<payload>`.
pub fn decode_data_url(location: &str) -> Result<Bytes, FontLoadError> {
    let invalid = || FontLoadError::InvalidData {
        url: truncate(location),
    };
    let rest = location.strip_prefix("data:").ok_or_else(invalid)?;
    let (header, payload) = rest.split_once(',').ok_or_else(invalid)?;
    if header.to_ascii_lowercase().ends_with(";base64") {
        let compact: String = payload.chars().filter(|ch| !ch.is_ascii_whitespace()).collect();
        BASE64_STANDARD
            .decode(compact)
            .map(Bytes::from)
            .map_err(|_| invalid())
    } else {
        Ok(Bytes::from(urlencoding::decode_binary(payload.as_bytes()).into_owned()))
    }
}

fn truncate(location: &str) -> String {
    location.chars().take(48).collect()
}

/// Container detected from the leading bytes of a font file.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FontSignature {
    TrueType,
    OpenType,
    Collection,
    Woff,
    Woff2,
    EmbeddedOpenType,
    Svg,
}

/// Recognize a font container from its magic bytes.
pub fn sniff_font(data: &[u8]) -> Option<FontSignature> {
    match data.get(..4)? {
        [0x00, 0x01, 0x00, 0x00] | b"true" => return Some(FontSignature::TrueType),
        b"OTTO" => return Some(FontSignature::OpenType),
        b"ttcf" => return Some(FontSignature::Collection),
        b"wOFF" => return Some(FontSignature::Woff),
        b"wOF2" => return Some(FontSignature::Woff2),
        _ => {}
    }
    if data.get(34..36) == Some(&[0x4C, 0x50]) {
        return Some(FontSignature::EmbeddedOpenType);
    }
    let head = String::from_utf8_lossy(&data[..data.len().min(1024)]);
    (head.contains("<svg") && head.contains("<font")).then_some(FontSignature::Svg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_urls_decode_both_encodings() {
        let encoded = decode_data_url("data:font/woff2;base64,d09GMgABAAA=").unwrap();
        assert_eq!(sniff_font(&encoded), Some(FontSignature::Woff2));
        let plain = decode_data_url("data:font/otf,OTTO%00%01").unwrap();
        assert_eq!(plain.as_ref(), b"OTTO\x00\x01");
        let stray = decode_data_url("data:font/otf,OTTO%zz%4").unwrap();
        assert_eq!(stray.as_ref(), b"OTTO%zz%4");
        assert!(decode_data_url("data:nocomma").is_err());
    }

    #[test]
    fn sniffing_rejects_markup() {
        assert_eq!(sniff_font(b"<!doctype html><html>"), None);
        assert_eq!(sniff_font(b"wOF"), None);
        assert_eq!(sniff_font(&[0, 1, 0, 0, 9, 9]), Some(FontSignature::TrueType));
    }

    #[test]
    fn relative_locations_need_a_base() {
        assert!(matches!(resolve(None, "/a.woff"), Err(FontLoadError::Fetch { .. })));
        let base = Url::parse("https://cdn.example/app/").unwrap();
        assert_eq!(
            resolve(Some(&base), "fonts/a.woff").unwrap().as_str(),
            "https://cdn.example/app/fonts/a.woff"
        );
    }
}
