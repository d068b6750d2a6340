//! ICC profile container
//!
//! A profile is a 128-byte header, a tag table, and tag data. The container
//! keeps every tag's raw bytes verbatim (type signature included) so that
//! serialization is byte-stable and targeted edits only touch one entry;
//! typed views are decoded on demand by the codecs in [`super::tags`].

use super::error::IccError;
use super::header::{IccHeader, HEADER_SIZE};
use super::tags::{curves::ToneCurve, Cicp};
use super::types::{TagSignature, XyzNumber};
use super::{tags, writer};

/// A parsed ICC profile: header plus ordered raw tag table
#[derive(Debug, Clone, PartialEq)]
pub struct IccProfile {
    pub header: IccHeader,
    tags: Vec<(TagSignature, Vec<u8>)>,
}

impl IccProfile {
    /// Parse a profile from its byte form
    pub fn parse(data: &[u8]) -> Result<Self, IccError> {
        let header = IccHeader::parse(data)?;

        if data.len() < HEADER_SIZE + 4 {
            return Err(IccError::TooSmall {
                expected: HEADER_SIZE + 4,
                actual: data.len(),
            });
        }
        let count = u32::from_be_bytes([data[128], data[129], data[130], data[131]]) as usize;

        let table_end = HEADER_SIZE + 4 + count * 12;
        if data.len() < table_end {
            return Err(IccError::TooSmall {
                expected: table_end,
                actual: data.len(),
            });
        }

        let mut tags = Vec::with_capacity(count);
        for i in 0..count {
            let at = HEADER_SIZE + 4 + i * 12;
            let signature = u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);
            let offset =
                u32::from_be_bytes([data[at + 4], data[at + 5], data[at + 6], data[at + 7]]);
            let size =
                u32::from_be_bytes([data[at + 8], data[at + 9], data[at + 10], data[at + 11]]);

            let end = offset as usize + size as usize;
            if end > data.len() || (offset as usize) < HEADER_SIZE {
                return Err(IccError::TagOutOfBounds {
                    tag: signature,
                    offset,
                    size,
                    profile_size: data.len(),
                });
            }
            tags.push((
                TagSignature(signature),
                data[offset as usize..end].to_vec(),
            ));
        }

        Ok(Self { header, tags })
    }

    /// Serialize back to the ICC byte form
    pub fn serialize(&self) -> Vec<u8> {
        writer::serialize(&self.header, &self.tags)
    }

    /// Start an empty profile from a header (tag table filled by the caller)
    pub fn from_header(header: IccHeader) -> Self {
        Self {
            header,
            tags: Vec::new(),
        }
    }

    pub fn has_tag(&self, sig: TagSignature) -> bool {
        self.raw_tag(sig).is_some()
    }

    /// Raw bytes of a tag, type signature included
    pub fn raw_tag(&self, sig: TagSignature) -> Option<&[u8]> {
        self.tags
            .iter()
            .find(|(s, _)| *s == sig)
            .map(|(_, raw)| raw.as_slice())
    }

    /// Replace a tag in place, or append it when absent
    pub fn set_raw_tag(&mut self, sig: TagSignature, raw: Vec<u8>) {
        if let Some(slot) = self.tags.iter_mut().find(|(s, _)| *s == sig) {
            slot.1 = raw;
        } else {
            self.tags.push((sig, raw));
        }
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    pub fn signatures(&self) -> impl Iterator<Item = TagSignature> + '_ {
        self.tags.iter().map(|(sig, _)| *sig)
    }

    // -- typed views ---------------------------------------------------

    pub fn xyz_tag(&self, sig: TagSignature) -> Option<XyzNumber> {
        tags::xyz::read(self.raw_tag(sig)?).ok()
    }

    pub fn tone_curve(&self, sig: TagSignature) -> Option<ToneCurve> {
        ToneCurve::parse(self.raw_tag(sig)?).ok()
    }

    pub fn chad_matrix(&self) -> Option<[[f64; 3]; 3]> {
        tags::read_sf32_matrix(self.raw_tag(TagSignature::CHAD)?).ok()
    }

    pub fn cicp(&self) -> Option<Cicp> {
        Cicp::parse(self.raw_tag(TagSignature::CICP)?).ok()
    }

    pub fn text(&self, sig: TagSignature, lang: &str, country: &str) -> Option<String> {
        tags::text::read(self.raw_tag(sig)?, lang, country)
    }
}
