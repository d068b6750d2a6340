//! Text-bearing tags: `text`, `desc` (v2) and `mluc` (v4)
//!
//! Reads tolerate all three encodings since description tags changed shape
//! between ICC versions. Only `mluc` is ever written; string offsets are
//! relative to the start of the tag (ICC.1:2022 section 10.15).

use crate::icc::types::TypeSignature;

/// Extract the text of a `text`/`desc`/`mluc` tag, preferring the given
/// language and country for multi-localized tags.
pub fn read(raw: &[u8], lang: &str, country: &str) -> Option<String> {
    match TypeSignature::of(raw)? {
        TypeSignature::TEXT => read_ascii(raw.get(8..)?),
        TypeSignature::DESC => {
            let payload = raw.get(8..)?;
            if payload.len() < 4 {
                return None;
            }
            let count =
                u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]) as usize;
            read_ascii(payload.get(4..4 + count)?)
        }
        TypeSignature::MLUC => read_mluc(raw, lang, country),
        _ => None,
    }
}

fn read_ascii(bytes: &[u8]) -> Option<String> {
    let text: String = bytes
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| b as char)
        .collect();
    (!text.is_empty()).then_some(text)
}

fn read_mluc(raw: &[u8], lang: &str, country: &str) -> Option<String> {
    if raw.len() < 16 {
        return None;
    }
    let record_count = u32::from_be_bytes([raw[8], raw[9], raw[10], raw[11]]) as usize;
    let record_size = u32::from_be_bytes([raw[12], raw[13], raw[14], raw[15]]) as usize;
    if record_size < 12 {
        return None;
    }

    let read_record = |at: usize| -> Option<(String, String, String)> {
        let rec = raw.get(at..at + 12)?;
        let rec_lang = String::from_utf8_lossy(&rec[0..2]).into_owned();
        let rec_country = String::from_utf8_lossy(&rec[2..4]).into_owned();
        let len = u32::from_be_bytes([rec[4], rec[5], rec[6], rec[7]]) as usize;
        let offset = u32::from_be_bytes([rec[8], rec[9], rec[10], rec[11]]) as usize;
        let text = decode_utf16be(raw.get(offset..offset + len)?)?;
        Some((rec_lang, rec_country, text))
    };

    let mut first = None;
    let mut lang_match = None;
    for i in 0..record_count {
        let Some((rec_lang, rec_country, text)) = read_record(16 + i * record_size) else {
            continue;
        };
        if rec_lang == lang && rec_country == country {
            return Some(text);
        }
        if rec_lang == lang && lang_match.is_none() {
            lang_match = Some(text.clone());
        }
        if first.is_none() {
            first = Some(text);
        }
    }
    lang_match.or(first)
}

fn decode_utf16be(bytes: &[u8]) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .take_while(|&u| u != 0)
        .collect();
    String::from_utf16(&units).ok()
}

/// Serialize a single-record `mluc` tag
pub fn write_mluc(lang: &str, country: &str, text: &str) -> Vec<u8> {
    let units: Vec<u16> = text.encode_utf16().collect();

    let mut out = Vec::with_capacity(28 + units.len() * 2);
    out.extend_from_slice(&TypeSignature::MLUC.0.to_be_bytes());
    out.extend_from_slice(&[0u8; 4]);
    out.extend_from_slice(&1u32.to_be_bytes()); // record count
    out.extend_from_slice(&12u32.to_be_bytes()); // record size
    out.extend_from_slice(&code(lang));
    out.extend_from_slice(&code(country));
    out.extend_from_slice(&((units.len() * 2) as u32).to_be_bytes());
    out.extend_from_slice(&28u32.to_be_bytes()); // offset from tag start
    for unit in units {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    out
}

fn code(s: &str) -> [u8; 2] {
    let bytes = s.as_bytes();
    [
        bytes.first().copied().unwrap_or(b' '),
        bytes.get(1).copied().unwrap_or(b' '),
    ]
}
