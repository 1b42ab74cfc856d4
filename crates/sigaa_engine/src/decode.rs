use chardetng::EncodingDetector;
use encoding_rs::Encoding;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("failed to decode body as {encoding}")]
pub(crate) struct DecodeError {
    pub encoding: &'static str,
}

/// Decode a response body into UTF-8 text.
///
/// The portal serves ISO-8859-1 with a charset parameter on most pages, so
/// the `Content-Type` charset wins; a byte-order mark and a chardetng guess
/// cover the rest.
pub(crate) fn decode_body(bytes: &[u8], content_type: Option<&str>) -> Result<String, DecodeError> {
    let encoding = content_type
        .and_then(extract_charset)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| Encoding::for_bom(bytes).map(|(encoding, _)| encoding))
        .unwrap_or_else(|| {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        });

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(DecodeError {
            encoding: used.name(),
        });
    }
    Ok(text.into_owned())
}

fn extract_charset(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let part = part.trim().to_ascii_lowercase();
        part.strip_prefix("charset=")
            .map(|value| value.trim_matches([' ', '"', '\'']).to_string())
    })
}
