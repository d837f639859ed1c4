//! Encoding and format detection.
//!
//! Given raw bytes and an optional filename / content-type hint, [`detect`]
//! builds a [`DecodePlan`]: source format, character encoding (with the
//! fallback to retry with) and, for delimited text, the field delimiter.
//! [`decode`] then applies the plan, retrying once with the fallback before
//! giving up with [`ResultsError::Decode`].

use encoding_rs::{DecoderResult, Encoding, UTF_8, WINDOWS_1252};
use std::path::Path;

use crate::config::IngestConfig;
use crate::error::{ErrorContext, ResultsError, ResultsResult};
use crate::models::SourceFormat;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE2_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Delimiters tried when sniffing, in tie-break order.
const CANDIDATE_DELIMITERS: [u8; 4] = [b';', b',', b'\t', b'|'];

/// Optional hints about a source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceHint {
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

impl SourceHint {
    pub fn from_filename(name: impl Into<String>) -> Self {
        Self {
            filename: Some(name.into()),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Format implied by the content type or the file extension.
    pub fn declared_format(&self) -> Option<SourceFormat> {
        if let Some(format) = self.content_type.as_deref().and_then(format_for_content_type) {
            return Some(format);
        }
        let ext = self
            .filename
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())?
            .to_lowercase();
        match ext.as_str() {
            "csv" | "txt" | "tsv" => Some(SourceFormat::Delimited),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(SourceFormat::Spreadsheet),
            _ => None,
        }
    }
}

fn format_for_content_type(content_type: &str) -> Option<SourceFormat> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    match mime.as_str() {
        "text/csv" | "text/plain" | "text/tab-separated-values" => Some(SourceFormat::Delimited),
        "application/vnd.ms-excel"
        | "application/vnd.oasis.opendocument.spreadsheet"
        | "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => {
            Some(SourceFormat::Spreadsheet)
        }
        _ => None,
    }
}

/// How to turn a byte source into rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodePlan {
    pub format: SourceFormat,
    pub encoding: &'static Encoding,
    pub fallback: &'static Encoding,
    /// Field delimiter; `None` for spreadsheets
    pub delimiter: Option<u8>,
    /// Confidence of the encoding choice, 0..=1
    pub confidence: f64,
}

/// Text produced by [`decode`].
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static Encoding,
    pub used_fallback: bool,
}

/// Build a decode plan for `bytes`.
pub fn detect(bytes: &[u8], hint: &SourceHint, config: &IngestConfig) -> ResultsResult<DecodePlan> {
    let fallback = config.fallback()?;
    let format = hint.declared_format().unwrap_or_else(|| sniff_format(bytes));

    if format == SourceFormat::Spreadsheet {
        log::debug!("Detected spreadsheet source");
        return Ok(DecodePlan {
            format,
            encoding: UTF_8,
            fallback,
            delimiter: None,
            confidence: 1.0,
        });
    }

    let (encoding, confidence) = guess_encoding(bytes, config.min_confidence);
    let delimiter = match config.delimiter {
        Some(c) if c.is_ascii() => c as u8,
        Some(c) => {
            return Err(ResultsError::Config(format!(
                "Delimiter {:?} must be a single ASCII character",
                c
            )))
        }
        None => {
            let (sample, _, _) = encoding.decode(head(bytes, 64 * 1024));
            sniff_delimiter(&sample, config.sample_lines)
        }
    };

    log::debug!(
        "Detected delimited source: encoding={}, confidence={:.2}, delimiter={:?}",
        encoding.name(),
        confidence,
        delimiter as char
    );

    Ok(DecodePlan {
        format,
        encoding,
        fallback,
        delimiter: Some(delimiter),
        confidence,
    })
}

fn head(bytes: &[u8], len: usize) -> &[u8] {
    &bytes[..bytes.len().min(len)]
}

/// Container format from magic bytes.
pub fn sniff_format(bytes: &[u8]) -> SourceFormat {
    if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE2_MAGIC) {
        SourceFormat::Spreadsheet
    } else {
        SourceFormat::Delimited
    }
}

/// Statistical encoding guess with a confidence score.
///
/// A BOM is authoritative and valid UTF-8 is taken as UTF-8. Otherwise the
/// non-ASCII bytes are inspected: Latin text mostly uses accented letters in
/// `0xC0..=0xFF`, and bytes in `0x80..=0x9F` only make sense as
/// windows-1252 punctuation. Low confidence yields UTF-8.
pub fn guess_encoding(bytes: &[u8], min_confidence: f64) -> (&'static Encoding, f64) {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return (encoding, 1.0);
    }
    if std::str::from_utf8(bytes).is_ok() {
        return (UTF_8, 1.0);
    }

    let mut high = 0usize;
    let mut letters = 0usize;
    let mut c1 = 0usize;
    for &b in bytes {
        match b {
            0x00..=0x7F => {}
            0x80..=0x9F => {
                high += 1;
                c1 += 1;
            }
            0xC0..=0xFF if b != 0xD7 && b != 0xF7 => {
                high += 1;
                letters += 1;
            }
            _ => high += 1,
        }
    }

    let confidence = if high == 0 {
        0.0
    } else {
        (letters + c1) as f64 / high as f64
    };

    if confidence < min_confidence {
        log::debug!(
            "Low encoding confidence ({:.2}); defaulting to UTF-8",
            confidence
        );
        return (UTF_8, confidence);
    }
    (WINDOWS_1252, confidence)
}

/// Choose the delimiter producing the most uniform field count.
///
/// For each candidate the sampled lines are split (respecting double quotes);
/// the score is the share of lines agreeing on the most common field count,
/// weighted by that count. Candidates that never split a line score zero.
pub fn sniff_delimiter(text: &str, sample_lines: usize) -> u8 {
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(sample_lines.max(1))
        .collect();

    let mut best = (CANDIDATE_DELIMITERS[0], 0.0f64);
    for &delim in &CANDIDATE_DELIMITERS {
        let counts: Vec<usize> = lines.iter().map(|l| count_fields(l, delim)).collect();
        let Some(mode) = most_common(&counts) else {
            continue;
        };
        if mode <= 1 {
            continue;
        }
        let agreeing = counts.iter().filter(|&&c| c == mode).count();
        let score = agreeing as f64 / counts.len() as f64 * mode as f64;
        if score > best.1 {
            best = (delim, score);
        }
    }
    best.0
}

fn count_fields(line: &str, delimiter: u8) -> usize {
    let mut fields = 1;
    let mut in_quotes = false;
    for b in line.bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
        } else if b == delimiter && !in_quotes {
            fields += 1;
        }
    }
    fields
}

fn most_common(values: &[usize]) -> Option<usize> {
    let mut counts: std::collections::BTreeMap<usize, usize> = std::collections::BTreeMap::new();
    for &v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
        .map(|(value, _)| value)
}

/// Decode bytes according to a plan.
///
/// The planned encoding is tried strictly; on a malformed sequence the
/// fallback is tried once. If that fails too, the error reports the byte
/// offset of the first malformed sequence under the fallback.
pub fn decode(bytes: &[u8], plan: &DecodePlan) -> ResultsResult<DecodedText> {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((bom_encoding, bom_len)) => (bom_encoding, &bytes[bom_len..]),
        None => (plan.encoding, bytes),
    };

    let first_offset = match decode_strict(body, encoding) {
        Ok(text) => {
            return Ok(DecodedText {
                text,
                encoding,
                used_fallback: false,
            })
        }
        Err(offset) => offset,
    };

    log::warn!(
        "Malformed {} sequence at byte {}; retrying with {}",
        encoding.name(),
        first_offset,
        plan.fallback.name()
    );

    match decode_strict(body, plan.fallback) {
        Ok(text) => Ok(DecodedText {
            text,
            encoding: plan.fallback,
            used_fallback: true,
        }),
        Err(offset) => Err(ResultsError::decode(
            format!(
                "input is neither valid {} nor valid {}",
                encoding.name(),
                plan.fallback.name()
            ),
            ErrorContext::new("decode").with_byte_offset(offset),
        )),
    }
}

/// Decode without replacement; on failure return the offset of the bad bytes.
fn decode_strict(bytes: &[u8], encoding: &'static Encoding) -> Result<String, usize> {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let capacity = decoder
        .max_utf8_buffer_length_without_replacement(bytes.len())
        .unwrap_or(bytes.len() * 3);
    let mut out = String::with_capacity(capacity);
    let (result, read) = decoder.decode_to_string_without_replacement(bytes, &mut out, true);
    match result {
        DecoderResult::InputEmpty => Ok(out),
        DecoderResult::Malformed(bad, after) => {
            Err(read.saturating_sub(bad as usize + after as usize))
        }
        DecoderResult::OutputFull => Err(read),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> IngestConfig {
        IngestConfig::default()
    }

    #[test]
    fn test_extension_wins_over_content() {
        let hint = SourceHint::from_filename("resultados.xlsx");
        let plan = detect(b"a;b;c\n", &hint, &config()).unwrap();
        assert_eq!(plan.format, SourceFormat::Spreadsheet);
        assert_eq!(plan.delimiter, None);
    }

    #[test]
    fn test_content_type_declares_format() {
        let hint = SourceHint::default().with_content_type("text/csv; charset=latin1");
        assert_eq!(hint.declared_format(), Some(SourceFormat::Delimited));
    }

    #[test]
    fn test_magic_bytes_without_hint() {
        assert_eq!(sniff_format(b"PK\x03\x04rest"), SourceFormat::Spreadsheet);
        assert_eq!(sniff_format(b"id;name\n"), SourceFormat::Delimited);
    }

    #[test]
    fn test_utf8_detected_with_full_confidence() {
        let (enc, conf) = guess_encoding("Código;João".as_bytes(), 0.6);
        assert_eq!(enc, UTF_8);
        assert_eq!(conf, 1.0);
    }

    #[test]
    fn test_latin1_bytes_detected_as_windows_1252() {
        // "Código;João" in ISO-8859-1
        let bytes = b"C\xf3digo;Jo\xe3o";
        let (enc, conf) = guess_encoding(bytes, 0.6);
        assert_eq!(enc, WINDOWS_1252);
        assert!(conf >= 0.6);
    }

    #[test]
    fn test_low_confidence_defaults_to_utf8() {
        let bytes = b"\xa1\xa2\xa3\xa4 noise";
        let (enc, conf) = guess_encoding(bytes, 0.6);
        assert_eq!(enc, UTF_8);
        assert!(conf < 0.6);
    }

    #[test]
    fn test_bom_is_authoritative() {
        let (enc, _) = guess_encoding(b"\xEF\xBB\xBFid;name", 0.6);
        assert_eq!(enc, UTF_8);
    }

    #[test]
    fn test_sniff_semicolon() {
        let text = "a;b;c;d\n1;2;3;4\n5;6;7;8\n";
        assert_eq!(sniff_delimiter(text, 50), b';');
    }

    #[test]
    fn test_sniff_comma_ignores_quoted_delimiters() {
        let text = "id,name,team\n1,\"Silva, Ana\",Club\n2,Bruno,Club\n";
        assert_eq!(sniff_delimiter(text, 50), b',');
    }

    #[test]
    fn test_sniff_tab() {
        let text = "a\tb\tc\n1\t2\t3\n";
        assert_eq!(sniff_delimiter(text, 50), b'\t');
    }

    #[test]
    fn test_sniff_defaults_to_semicolon() {
        assert_eq!(sniff_delimiter("single column\nvalues\n", 50), b';');
    }

    #[test]
    fn test_decode_utf8() {
        let plan = detect("Nome;Sexo\nJoão;M\n".as_bytes(), &SourceHint::default(), &config()).unwrap();
        let decoded = decode("Nome;Sexo\nJoão;M\n".as_bytes(), &plan).unwrap();
        assert!(decoded.text.contains("João"));
        assert!(!decoded.used_fallback);
    }

    #[test]
    fn test_decode_retries_with_fallback() {
        let bytes = b"Nome;Sexo\nJo\xe3o;M\n";
        let plan = DecodePlan {
            format: SourceFormat::Delimited,
            encoding: UTF_8,
            fallback: WINDOWS_1252,
            delimiter: Some(b';'),
            confidence: 0.1,
        };
        let decoded = decode(bytes, &plan).unwrap();
        assert!(decoded.used_fallback);
        assert_eq!(decoded.encoding, WINDOWS_1252);
        assert!(decoded.text.contains("João"));
    }

    #[test]
    fn test_decode_error_after_fallback_reports_offset() {
        let bytes = b"ok;\xff\xfe";
        let plan = DecodePlan {
            format: SourceFormat::Delimited,
            encoding: UTF_8,
            fallback: UTF_8,
            delimiter: Some(b';'),
            confidence: 0.0,
        };
        let err = decode(bytes, &plan).unwrap_err();
        match err {
            ResultsError::Decode { context, .. } => assert_eq!(context.byte_offset, Some(3)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_forced_delimiter() {
        let cfg = IngestConfig {
            delimiter: Some('|'),
            ..IngestConfig::default()
        };
        let plan = detect(b"a;b;c\n", &SourceHint::default(), &cfg).unwrap();
        assert_eq!(plan.delimiter, Some(b'|'));
    }
}
