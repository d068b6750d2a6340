//! ICC color profile handling
//!
//! A [`Profile`] pairs a parsed ICC container with a cached description and
//! answers the three questions the transform engine asks: what are the
//! primaries, what is the tone curve, what is the peak luminance. Profiles
//! can also be synthesized from those same primitives; a synthesized
//! profile queried back reports the values it was built from.

use crate::error::{Error, Result};
use crate::icc::{
    header::IccHeader,
    tags::{self, curves, text, xyz, Cicp},
    IccProfile, S15Fixed16, TagSignature, XyzNumber,
};
use crate::math::{chromatic_adaptation, matrix, transfer, Matrix3x3};

/// Luminance value meaning "the profile does not say"
pub const LUMINANCE_UNSPECIFIED: u32 = 0;

/// CIE xy chromaticities of the red, green, blue and white stimuli
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primaries {
    pub red: [f32; 2],
    pub green: [f32; 2],
    pub blue: [f32; 2],
    pub white: [f32; 2],
}

impl Primaries {
    /// BT.709 / sRGB primaries with D65 white
    pub const BT709: Self = Self {
        red: [0.64, 0.33],
        green: [0.30, 0.60],
        blue: [0.15, 0.06],
        white: [0.3127, 0.3290],
    };

    /// BT.2020 primaries with D65 white
    pub const BT2020: Self = Self {
        red: [0.708, 0.292],
        green: [0.170, 0.797],
        blue: [0.131, 0.046],
        white: [0.3127, 0.3290],
    };

    /// The degenerate-looking primaries whose RGB->XYZ matrix is the
    /// identity; a linear profile built from them encodes raw XYZ.
    pub const XYZ_PASSTHROUGH: Self = Self {
        red: [1.0, 0.0],
        green: [0.0, 1.0],
        blue: [0.0, 0.0],
        white: [1.0 / 3.0, 1.0 / 3.0],
    };

    /// Components in range, none NaN. Collinearity is caught separately
    /// by the matrix derivation.
    pub fn in_gamut(&self) -> bool {
        [self.red, self.green, self.blue, self.white]
            .iter()
            .flatten()
            .all(|c| c.is_finite() && (0.0..=1.0).contains(c))
    }

    fn close_to(&self, other: &Self, epsilon: f32) -> bool {
        let pairs = [
            (self.red, other.red),
            (self.green, other.green),
            (self.blue, other.blue),
            (self.white, other.white),
        ];
        pairs
            .iter()
            .all(|(a, b)| (a[0] - b[0]).abs() <= epsilon && (a[1] - b[1]).abs() <= epsilon)
    }
}

/// The tone curve a profile declares
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Curve {
    /// Pure power law with the given exponent
    Gamma(f32),
    /// SMPTE ST.2084
    Pq,
    /// ARIB/BT.2100 Hybrid Log-Gamma
    Hlg,
    /// A parametric or table curve that does not reduce to a scalar
    /// exponent. `estimated_gamma` is a best-effort fit for reporting;
    /// `matrix_curve_scale` is the implicit a^g scale of an A2B0 matrix
    /// curve when one is present.
    Complex {
        estimated_gamma: Option<f32>,
        matrix_curve_scale: Option<f32>,
    },
    /// No tone curve tag at all
    Unknown,
}

impl Curve {
    fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Gamma(a), Self::Gamma(b)) => (a - b).abs() <= 1e-3,
            (Self::Pq, Self::Pq) | (Self::Hlg, Self::Hlg) => true,
            _ => false,
        }
    }
}

/// Everything a profile query reports
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileInfo {
    pub primaries: Primaries,
    pub curve: Curve,
    /// Peak luminance in cd/m²; [`LUMINANCE_UNSPECIFIED`] when absent
    pub luminance: u32,
}

/// An ICC color profile
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    icc: IccProfile,
    description: String,
}

impl Profile {
    /// Parse ICC bytes. The cached description is the caller's override,
    /// else the embedded `desc` tag, else `"Unknown"`.
    pub fn parse(bytes: &[u8], description: Option<&str>) -> Result<Self> {
        let icc = IccProfile::parse(bytes)?;
        let description = description
            .map(str::to_owned)
            .or_else(|| icc.text(TagSignature::DESC, "en", "US"))
            .unwrap_or_else(|| "Unknown".to_owned());
        Ok(Self { icc, description })
    }

    /// Synthesize a display-RGB profile.
    ///
    /// Colorants are stored adapted to the D50 connection space with the
    /// matching `chad` tag, so a query round trip reproduces the inputs.
    /// `Gamma` writes one shared `para` curve for R/G/B; `Pq`/`Hlg` write a
    /// sampled table plus a `cicp` declaration. `Complex`/`Unknown` curves
    /// cannot be synthesized here; pack such profiles externally.
    pub fn create(
        primaries: &Primaries,
        curve: &Curve,
        max_luminance: u32,
        description: &str,
    ) -> Result<Self> {
        if !primaries.in_gamut() {
            return Err(Error::Primaries("chromaticities outside [0, 1]"));
        }
        let to_xyz = matrix::rgb_to_xyz(primaries)
            .ok_or(Error::Primaries("collinear RGB chromaticities"))?;

        let [xw, yw] = primaries.white;
        let white_xyz = [
            f64::from(xw) / f64::from(yw),
            1.0,
            f64::from(1.0 - xw - yw) / f64::from(yw),
        ];
        let chad = chromatic_adaptation::adaptation_matrix(white_xyz, XyzNumber::D50.to_array());
        let colorants = chad.mul(&to_xyz);

        let trc = match curve {
            Curve::Gamma(g) if *g > 0.0 => curves::write_gamma(f64::from(*g)),
            Curve::Gamma(_) => {
                return Err(Error::UnsupportedCurve("gamma exponent must be positive"))
            }
            Curve::Pq => sampled_table(transfer::pq_eotf),
            Curve::Hlg => sampled_table(transfer::hlg_eotf),
            Curve::Complex { .. } => {
                return Err(Error::UnsupportedCurve(
                    "complex curves must be packed externally",
                ))
            }
            Curve::Unknown => return Err(Error::UnsupportedCurve("no curve given")),
        };

        let column = |c: usize| {
            XyzNumber::from_f64(colorants.m[0][c], colorants.m[1][c], colorants.m[2][c])
        };

        let mut icc = IccProfile::from_header(IccHeader::new_display_rgb());
        icc.set_raw_tag(TagSignature::DESC, text::write_mluc("en", "US", description));
        icc.set_raw_tag(TagSignature::MEDIA_WHITE, xyz::write(XyzNumber::D50));
        icc.set_raw_tag(TagSignature::CHAD, tags::write_sf32_matrix(&chad.m));
        icc.set_raw_tag(TagSignature::RED_COLORANT, xyz::write(column(0)));
        icc.set_raw_tag(TagSignature::GREEN_COLORANT, xyz::write(column(1)));
        icc.set_raw_tag(TagSignature::BLUE_COLORANT, xyz::write(column(2)));
        icc.set_raw_tag(TagSignature::RED_TRC, trc.clone());
        icc.set_raw_tag(TagSignature::GREEN_TRC, trc.clone());
        icc.set_raw_tag(TagSignature::BLUE_TRC, trc);
        icc.set_raw_tag(
            TagSignature::LUMINANCE,
            xyz::write(XyzNumber::from_f64(0.0, f64::from(max_luminance), 0.0)),
        );
        match curve {
            Curve::Pq => icc.set_raw_tag(TagSignature::CICP, cicp_for(Cicp::TRANSFER_PQ)),
            Curve::Hlg => icc.set_raw_tag(TagSignature::CICP, cicp_for(Cicp::TRANSFER_HLG)),
            _ => {}
        }

        Ok(Self {
            icc,
            description: description.to_owned(),
        })
    }

    /// The stock profile used when nothing else is specified: BT.709
    /// primaries, gamma 2.4, 300 cd/m²
    pub fn create_stock_srgb() -> Self {
        Self::create(&Primaries::BT709, &Curve::Gamma(2.4), 300, "SRGB")
            .expect("stock sRGB parameters are valid")
    }

    /// A linear-light sibling: same primaries and luminance, gamma 1.0,
    /// description suffixed with " (Linear)"
    pub fn create_linear(&self) -> Result<Self> {
        let info = self.query()?;
        Self::create(
            &info.primaries,
            &Curve::Gamma(1.0),
            info.luminance,
            &format!("{} (Linear)", self.description),
        )
    }

    /// A linear profile whose RGB axes are the XYZ axes; the reference-CMM
    /// fallback uses it to stand in for an absent (pass-through) endpoint.
    pub fn create_xyz_passthrough() -> Self {
        Self::create(&Primaries::XYZ_PASSTHROUGH, &Curve::Gamma(1.0), 0, "XYZ")
            .expect("XYZ pass-through parameters are valid")
    }

    /// Serialize to ICC bytes. `parse(pack(p))` queries identically to `p`.
    pub fn pack(&self) -> Vec<u8> {
        self.icc.serialize()
    }

    /// Packed size in bytes
    pub fn size(&self) -> usize {
        self.pack().len()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Primaries, curve and luminance, following the tag-priority rules of
    /// the ICC format (see module docs for the fallbacks). Fails only when
    /// the media white point is missing or no colorant source is usable.
    pub fn query(&self) -> Result<ProfileInfo> {
        let white = self
            .icc
            .xyz_tag(TagSignature::MEDIA_WHITE)
            .ok_or(Error::ProfileQuery("media white point tag missing"))?;

        let r = self.icc.xyz_tag(TagSignature::RED_COLORANT);
        let g = self.icc.xyz_tag(TagSignature::GREEN_COLORANT);
        let b = self.icc.xyz_tag(TagSignature::BLUE_COLORANT);
        // colorant tags win over A2B0 when both are present
        let mut colorants = match (r, g, b) {
            (Some(r), Some(g), Some(b)) => {
                let [rx, ry, rz] = r.to_array();
                let [gx, gy, gz] = g.to_array();
                let [bx, by, bz] = b.to_array();
                Matrix3x3::new([[rx, gx, bx], [ry, gy, by], [rz, gz, bz]])
            }
            _ => self.a2b0_matrix()?,
        };

        let mut white_xyz = white.to_array();
        let has_chad_tag = self.icc.has_tag(TagSignature::CHAD);
        let chad = match self.icc.chad_matrix() {
            Some(m) => Matrix3x3::new(m),
            // v2 profiles without a chad tag imply one from their white point
            None if !self.icc.header.version.is_v4_or_later() => {
                chromatic_adaptation::adaptation_matrix(white_xyz, XyzNumber::D50.to_array())
            }
            None => Matrix3x3::identity(),
        };
        if let Some(inv_chad) = chad.inverse() {
            colorants = inv_chad.mul(&colorants);
            if self.icc.header.version.is_v4_or_later() || has_chad_tag {
                white_xyz = inv_chad.mul_vec(white_xyz);
            }
            // else: old profile without an explicit chad, honor wtpt as-is
        }

        let column_xy = |c: usize| {
            xyz_to_xy([
                colorants.m[0][c],
                colorants.m[1][c],
                colorants.m[2][c],
            ])
        };
        let primaries = Primaries {
            red: column_xy(0),
            green: column_xy(1),
            blue: column_xy(2),
            white: xyz_to_xy(white_xyz),
        };

        let curve = if self.has_pq_signature() {
            Curve::Pq
        } else if self.has_hlg_signature() {
            Curve::Hlg
        } else {
            self.queried_curve()
        };

        let luminance = self
            .icc
            .xyz_tag(TagSignature::LUMINANCE)
            .map(|l| l.y.to_f64().max(0.0) as u32)
            .unwrap_or(LUMINANCE_UNSPECIFIED);

        Ok(ProfileInfo {
            primaries,
            curve,
            luminance,
        })
    }

    fn queried_curve(&self) -> Curve {
        match self.icc.tone_curve(TagSignature::RED_TRC) {
            Some(trc) => match trc.as_pure_gamma() {
                Some(g) => Curve::Gamma(g as f32),
                None => Curve::Complex {
                    estimated_gamma: trc.estimate_gamma().map(|g| g as f32),
                    matrix_curve_scale: self.matrix_curve_scale(),
                },
            },
            None if self.icc.has_tag(TagSignature::A2B0) => Curve::Complex {
                estimated_gamma: None,
                matrix_curve_scale: self.matrix_curve_scale(),
            },
            None => Curve::Unknown,
        }
    }

    /// Harvest a colorant matrix from the A2B0 tag: nine s15Fixed16 values
    /// at the 32-bit matrix offset stored at tag byte 16.
    fn a2b0_matrix(&self) -> Result<Matrix3x3> {
        let raw = self
            .icc
            .raw_tag(TagSignature::A2B0)
            .ok_or(Error::ProfileQuery("no colorant tags and no A2B0 tag"))?;
        if raw.len() < 32 {
            return Err(Error::ProfileQuery("A2B0 tag too small for a matrix"));
        }
        let offset = be32(raw, 16) as usize;
        if offset == 0 {
            return Err(Error::ProfileQuery("A2B0 tag carries no matrix"));
        }
        if offset + 36 > raw.len() {
            return Err(Error::ProfileQuery("A2B0 matrix offset out of range"));
        }

        let mut rows = [[0.0f64; 3]; 3];
        for (i, cell) in rows.iter_mut().flatten().enumerate() {
            *cell = s15f16(raw, offset + i * 4).to_f64();
        }
        Ok(Matrix3x3::new(rows))
    }

    /// The implicit scale a^g of an A2B0 `para` matrix curve (function
    /// types 1..=4), reported with `Curve::Complex` for diagnostics.
    fn matrix_curve_scale(&self) -> Option<f32> {
        let raw = self.icc.raw_tag(TagSignature::A2B0)?;
        if raw.len() < 32 {
            return None;
        }
        let offset = be32(raw, 20) as usize;
        if offset == 0 || offset + 20 > raw.len() {
            return None;
        }
        if &raw[offset..offset + 4] != b"para" {
            return None;
        }
        let function_type = u16::from_be_bytes([raw[offset + 8], raw[offset + 9]]);
        if !(1..=4).contains(&function_type) {
            return None;
        }
        let g = s15f16(raw, offset + 12).to_f64();
        let a = s15f16(raw, offset + 16).to_f64();
        Some(a.powf(g) as f32)
    }

    /// Does the profile declare ST.2084 semantics? Checked via the `cicp`
    /// tag, or via well-known description markers when the stored tone
    /// curve is not a plain power law (an HDR LUT masquerading as a tone
    /// curve). Recognized profiles report `Curve::Pq` regardless of the
    /// stored curve; an explicit pure-gamma TRC always wins over a
    /// description marker.
    pub fn has_pq_signature(&self) -> bool {
        if let Some(cicp) = self.icc.cicp() {
            return cicp.transfer_characteristics == Cicp::TRANSFER_PQ;
        }
        if matches!(self.queried_curve(), Curve::Gamma(_)) {
            return false;
        }
        let desc = self.description.to_ascii_uppercase();
        desc.contains("PQ") || desc.contains("2084")
    }

    /// HLG twin of [`Self::has_pq_signature`]
    pub fn has_hlg_signature(&self) -> bool {
        if let Some(cicp) = self.icc.cicp() {
            return cicp.transfer_characteristics == Cicp::TRANSFER_HLG;
        }
        if matches!(self.queried_curve(), Curve::Gamma(_)) {
            return false;
        }
        self.description.to_ascii_uppercase().contains("HLG")
    }

    /// Can the built-in math evaluate this profile, or must a transform
    /// fall back to the reference CMM?
    pub fn uses_ccmm(&self) -> bool {
        matches!(
            self.query().map(|info| info.curve),
            Ok(Curve::Gamma(_) | Curve::Pq | Curve::Hlg)
        )
    }

    /// Replace the tone curves with a pure power law (one shared tag
    /// mirrored onto R/G/B, as linked TRC tags are stored)
    pub fn set_gamma(&mut self, gamma: f32) {
        let trc = curves::write_gamma(f64::from(gamma));
        self.icc.set_raw_tag(TagSignature::RED_TRC, trc.clone());
        self.icc.set_raw_tag(TagSignature::GREEN_TRC, trc.clone());
        self.icc.set_raw_tag(TagSignature::BLUE_TRC, trc);
    }

    /// Replace the luminance tag
    pub fn set_luminance(&mut self, max_luminance: u32) {
        self.icc.set_raw_tag(
            TagSignature::LUMINANCE,
            xyz::write(XyzNumber::from_f64(0.0, f64::from(max_luminance), 0.0)),
        );
    }

    /// Read a localized text tag. The signature is the 4-character tag
    /// name read big-endian, e.g. `"desc"`.
    pub fn get_mlu(&self, tag: &str, lang: &str, country: &str) -> Option<String> {
        self.icc.text(mlu_signature(tag)?, lang, country)
    }

    /// Write a localized text tag; see [`Self::get_mlu`] for the signature
    /// convention. Updates the cached description when the target is the
    /// `desc` tag.
    pub fn set_mlu(&mut self, tag: &str, lang: &str, country: &str, ascii: &str) -> bool {
        let Some(sig) = mlu_signature(tag) else {
            return false;
        };
        self.icc.set_raw_tag(sig, text::write_mluc(lang, country, ascii));
        if sig == TagSignature::DESC {
            self.description = ascii.to_owned();
        }
        true
    }
}

/// Structural profile equality, the transform engine's "is color
/// conversion needed at all" test. `None` stands for the XYZ pass-through
/// endpoint and only matches itself.
pub fn profile_matches(a: Option<&Profile>, b: Option<&Profile>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            if a.pack() == b.pack() {
                return true;
            }
            let (Ok(ia), Ok(ib)) = (a.query(), b.query()) else {
                return false;
            };
            ia.primaries.close_to(&ib.primaries, 1e-4)
                && ia.curve.matches(&ib.curve)
                && ia.luminance == ib.luminance
        }
        _ => false,
    }
}

/// A short human-readable description synthesized from profile primitives
pub fn generate_description(primaries: &Primaries, curve: &Curve, max_luminance: u32) -> String {
    let curve_word = match curve {
        Curve::Gamma(g) => format!("{g}g"),
        Curve::Pq => "PQ".to_owned(),
        Curve::Hlg => "HLG".to_owned(),
        Curve::Complex { .. } => "complex".to_owned(),
        Curve::Unknown => "?g".to_owned(),
    };
    format!(
        "P{} {} {}nits",
        primaries.red[0], curve_word, max_luminance
    )
}

fn cicp_for(transfer_characteristics: u8) -> Vec<u8> {
    Cicp {
        color_primaries: 2, // unspecified; primaries come from the colorants
        transfer_characteristics,
        matrix_coefficients: 0,
        full_range: 1,
    }
    .write()
}

/// Sample an EOTF into a 4096-entry `curv` table
fn sampled_table(eotf: impl Fn(f32) -> f32) -> Vec<u8> {
    const SAMPLES: usize = 4096;
    let table: Vec<u16> = (0..SAMPLES)
        .map(|i| {
            let x = i as f32 / (SAMPLES - 1) as f32;
            (eotf(x).clamp(0.0, 1.0) * 65535.0).round() as u16
        })
        .collect();
    curves::write_table(&table)
}

fn xyz_to_xy(xyz: [f64; 3]) -> [f32; 2] {
    let sum = xyz[0] + xyz[1] + xyz[2];
    if sum <= 0.0 {
        return [0.0, 0.0];
    }
    [(xyz[0] / sum) as f32, (xyz[1] / sum) as f32]
}

fn be32(data: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

fn s15f16(data: &[u8], at: usize) -> S15Fixed16 {
    S15Fixed16::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

fn mlu_signature(tag: &str) -> Option<TagSignature> {
    let bytes = tag.as_bytes();
    if bytes.len() != 4 {
        return None;
    }
    Some(TagSignature::new(&[bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_srgb_queries_back_its_inputs() {
        let info = Profile::create_stock_srgb().query().unwrap();
        assert!(info.primaries.close_to(&Primaries::BT709, 1e-4));
        match info.curve {
            Curve::Gamma(g) => assert!((g - 2.4).abs() < 1e-3),
            other => panic!("expected gamma curve, got {other:?}"),
        }
        assert_eq!(info.luminance, 300);
    }

    #[test]
    fn pack_parse_roundtrip_preserves_query() {
        let profile = Profile::create_stock_srgb();
        let reparsed = Profile::parse(&profile.pack(), None).unwrap();

        let a = profile.query().unwrap();
        let b = reparsed.query().unwrap();
        assert!(a.primaries.close_to(&b.primaries, 1e-4));
        assert!(a.curve.matches(&b.curve));
        assert_eq!(a.luminance, b.luminance);
        assert_eq!(reparsed.description(), "SRGB");
    }

    #[test]
    fn parse_without_desc_reports_unknown() {
        let bare = IccProfile::from_header(IccHeader::new_display_rgb()).serialize();
        let profile = Profile::parse(&bare, None).unwrap();
        assert_eq!(profile.description(), "Unknown");
    }

    #[test]
    fn caller_description_wins_over_embedded() {
        let bytes = Profile::create_stock_srgb().pack();
        let profile = Profile::parse(&bytes, Some("Override")).unwrap();
        assert_eq!(profile.description(), "Override");
    }

    #[test]
    fn query_without_white_point_fails() {
        let bare = IccProfile::from_header(IccHeader::new_display_rgb()).serialize();
        let profile = Profile::parse(&bare, None).unwrap();
        assert!(matches!(profile.query(), Err(Error::ProfileQuery(_))));
        // but packing still works
        assert!(profile.size() >= 132);
    }

    #[test]
    fn linear_profile_keeps_primaries_and_luminance() {
        let srgb = Profile::create_stock_srgb();
        let linear = srgb.create_linear().unwrap();
        assert_eq!(linear.description(), "SRGB (Linear)");

        let info = linear.query().unwrap();
        assert!(info.primaries.close_to(&Primaries::BT709, 1e-4));
        assert_eq!(info.curve, Curve::Gamma(1.0));
        assert_eq!(info.luminance, 300);
    }

    #[test]
    fn set_gamma_is_visible_to_query() {
        let mut profile = Profile::create_stock_srgb();
        profile.set_gamma(1.8);
        match profile.query().unwrap().curve {
            Curve::Gamma(g) => assert!((g - 1.8).abs() < 1e-3),
            other => panic!("expected gamma curve, got {other:?}"),
        }
    }

    #[test]
    fn set_luminance_is_visible_to_query() {
        let mut profile = Profile::create_stock_srgb();
        profile.set_luminance(10_000);
        assert_eq!(profile.query().unwrap().luminance, 10_000);
    }

    #[test]
    fn mlu_roundtrip_through_pack() {
        let mut profile = Profile::create_stock_srgb();
        assert!(profile.set_mlu("dmnd", "en", "US", "Example Displays Inc"));
        let reparsed = Profile::parse(&profile.pack(), None).unwrap();
        assert_eq!(
            reparsed.get_mlu("dmnd", "en", "US").as_deref(),
            Some("Example Displays Inc")
        );
    }

    #[test]
    fn clone_is_independent() {
        let original = Profile::create_stock_srgb();
        let mut copy = original.clone();
        copy.set_gamma(1.0);
        copy.set_luminance(80);

        let info = original.query().unwrap();
        assert_eq!(info.luminance, 300);
        assert!(matches!(info.curve, Curve::Gamma(g) if (g - 2.4).abs() < 1e-3));
    }

    #[test]
    fn pq_profile_reports_pq_curve() {
        let profile = Profile::create(&Primaries::BT2020, &Curve::Pq, 10_000, "BT.2020 PQ").unwrap();
        let info = profile.query().unwrap();
        assert_eq!(info.curve, Curve::Pq);
        assert!(info.primaries.close_to(&Primaries::BT2020, 1e-4));
        assert!(profile.has_pq_signature());
        assert!(!profile.has_hlg_signature());
        assert!(profile.uses_ccmm());
    }

    #[test]
    fn linear_sibling_of_pq_profile_is_plain_gamma() {
        // the " (Linear)" derivative inherits a PQ-marked description but
        // carries an explicit gamma TRC, which must win
        let pq = Profile::create(&Primaries::BT2020, &Curve::Pq, 10_000, "BT.2020 PQ").unwrap();
        let linear = pq.create_linear().unwrap();
        assert_eq!(linear.description(), "BT.2020 PQ (Linear)");
        assert!(!linear.has_pq_signature());
        assert_eq!(linear.query().unwrap().curve, Curve::Gamma(1.0));
    }

    #[test]
    fn hlg_profile_reports_hlg_curve() {
        let profile = Profile::create(&Primaries::BT2020, &Curve::Hlg, 1_000, "BT.2020 HLG").unwrap();
        assert_eq!(profile.query().unwrap().curve, Curve::Hlg);
        assert!(profile.has_hlg_signature());
        assert!(!profile.has_pq_signature());
    }

    #[test]
    fn create_rejects_complex_curves() {
        let complex = Curve::Complex {
            estimated_gamma: Some(2.2),
            matrix_curve_scale: None,
        };
        assert!(matches!(
            Profile::create(&Primaries::BT709, &complex, 100, "nope"),
            Err(Error::UnsupportedCurve(_))
        ));
    }

    #[test]
    fn create_rejects_degenerate_primaries() {
        let degenerate = Primaries {
            red: [0.3, 0.3],
            green: [0.4, 0.4],
            blue: [0.5, 0.5],
            white: [0.3127, 0.3290],
        };
        assert!(matches!(
            Profile::create(&degenerate, &Curve::Gamma(2.2), 100, "bad"),
            Err(Error::Primaries(_))
        ));
    }

    #[test]
    fn matches_same_parameters_different_instances() {
        let a = Profile::create_stock_srgb();
        let b = Profile::create_stock_srgb();
        assert!(profile_matches(Some(&a), Some(&b)));
    }

    #[test]
    fn matches_rejects_different_curves() {
        let srgb = Profile::create_stock_srgb();
        let linear = srgb.create_linear().unwrap();
        assert!(!profile_matches(Some(&srgb), Some(&linear)));
    }

    #[test]
    fn matches_handles_passthrough_endpoints() {
        let srgb = Profile::create_stock_srgb();
        assert!(profile_matches(None, None));
        assert!(!profile_matches(Some(&srgb), None));
        assert!(!profile_matches(None, Some(&srgb)));
    }

    #[test]
    fn xyz_passthrough_derives_identity_matrix() {
        let profile = Profile::create_xyz_passthrough();
        let info = profile.query().unwrap();
        let m = matrix::rgb_to_xyz(&info.primaries).unwrap();
        assert!(m.approx_eq(&Matrix3x3::identity(), 1e-3));
        assert_eq!(info.curve, Curve::Gamma(1.0));
    }

    #[test]
    fn complex_profile_falls_back_to_reference_cmm() {
        // overwrite the TRC with a table the native math cannot reduce
        let mut profile = Profile::create_stock_srgb();
        let table: Vec<u16> = (0..1024)
            .map(|i| {
                let x = i as f64 / 1023.0;
                // sRGB-shaped piecewise curve, not a pure power law
                let y = if x <= 0.04045 {
                    x / 12.92
                } else {
                    ((x + 0.055) / 1.055).powf(2.4)
                };
                (y * 65535.0).round() as u16
            })
            .collect();
        let trc = curves::write_table(&table);
        profile.icc.set_raw_tag(TagSignature::RED_TRC, trc.clone());
        profile.icc.set_raw_tag(TagSignature::GREEN_TRC, trc.clone());
        profile.icc.set_raw_tag(TagSignature::BLUE_TRC, trc);

        let info = profile.query().unwrap();
        match info.curve {
            Curve::Complex { estimated_gamma, .. } => {
                assert!(estimated_gamma.is_some());
            }
            other => panic!("expected complex curve, got {other:?}"),
        }
        assert!(!profile.uses_ccmm());
    }

    #[test]
    fn generated_description_mentions_the_curve() {
        let text = generate_description(&Primaries::BT709, &Curve::Gamma(2.4), 300);
        assert!(text.contains("2.4g"));
        assert!(text.contains("300nits"));
        assert!(generate_description(&Primaries::BT2020, &Curve::Pq, 10_000).contains("PQ"));
    }
}
