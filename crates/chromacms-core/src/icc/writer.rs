//! ICC profile serialization
//!
//! Lays out header, tag table and tag data. Tag data is aligned to 4-byte
//! boundaries and identical payloads share one offset, the way linked TRC
//! tags are stored by common CMMs.

use super::header::{IccHeader, HEADER_SIZE};
use super::types::TagSignature;

pub(super) fn serialize(header: &IccHeader, tags: &[(TagSignature, Vec<u8>)]) -> Vec<u8> {
    let table_end = HEADER_SIZE + 4 + tags.len() * 12;

    // (offset, len) of blobs already emitted, for sharing identical payloads
    let mut emitted: Vec<(u32, usize)> = Vec::with_capacity(tags.len());
    let mut entries: Vec<(TagSignature, u32, u32)> = Vec::with_capacity(tags.len());
    let mut data = Vec::new();

    for (sig, raw) in tags {
        let shared = emitted.iter().find(|(offset, len)| {
            let at = *offset as usize - table_end;
            *len == raw.len() && &data[at..at + len] == raw.as_slice()
        });
        let offset = match shared {
            Some((offset, _)) => *offset,
            None => {
                while data.len() % 4 != 0 {
                    data.push(0);
                }
                let offset = (table_end + data.len()) as u32;
                data.extend_from_slice(raw);
                emitted.push((offset, raw.len()));
                offset
            }
        };
        entries.push((*sig, offset, raw.len() as u32));
    }

    let total = table_end + data.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(&(tags.len() as u32).to_be_bytes());
    for (sig, offset, size) in entries {
        out.extend_from_slice(&sig.0.to_be_bytes());
        out.extend_from_slice(&offset.to_be_bytes());
        out.extend_from_slice(&size.to_be_bytes());
    }
    out.extend_from_slice(&data);

    // patch the header's size field now that the layout is known
    out[0..4].copy_from_slice(&(total as u32).to_be_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icc::parser::IccProfile;
    use crate::icc::tags;
    use crate::icc::types::XyzNumber;

    #[test]
    fn identical_payloads_share_one_offset() {
        let mut profile = IccProfile::from_header(IccHeader::new_display_rgb());
        let trc = tags::curves::write_gamma(2.4);
        profile.set_raw_tag(TagSignature::RED_TRC, trc.clone());
        profile.set_raw_tag(TagSignature::GREEN_TRC, trc.clone());
        profile.set_raw_tag(TagSignature::BLUE_TRC, trc.clone());

        let bytes = profile.serialize();
        let offsets: Vec<u32> = (0..3)
            .map(|i| {
                let at = HEADER_SIZE + 4 + i * 12 + 4;
                u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
            })
            .collect();
        assert_eq!(offsets[0], offsets[1]);
        assert_eq!(offsets[0], offsets[2]);

        // and the result still parses with three tags
        let reparsed = IccProfile::parse(&bytes).unwrap();
        assert_eq!(reparsed.tag_count(), 3);
    }

    #[test]
    fn size_field_matches_buffer() {
        let mut profile = IccProfile::from_header(IccHeader::new_display_rgb());
        profile.set_raw_tag(TagSignature::MEDIA_WHITE, tags::xyz::write(XyzNumber::D50));
        let bytes = profile.serialize();
        let size = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert_eq!(size as usize, bytes.len());
    }

    #[test]
    fn tag_data_is_aligned() {
        let mut profile = IccProfile::from_header(IccHeader::new_display_rgb());
        // 12-byte cicp payload forces padding before the next tag
        profile.set_raw_tag(
            TagSignature::CICP,
            tags::Cicp {
                color_primaries: 2,
                transfer_characteristics: tags::Cicp::TRANSFER_PQ,
                matrix_coefficients: 0,
                full_range: 1,
            }
            .write(),
        );
        profile.set_raw_tag(TagSignature::MEDIA_WHITE, tags::xyz::write(XyzNumber::D50));

        let bytes = profile.serialize();
        for i in 0..2 {
            let at = HEADER_SIZE + 4 + i * 12 + 4;
            let offset = u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
            assert_eq!(offset % 4, 0);
        }
    }
}
