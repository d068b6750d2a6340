//! Tone reproduction curve tags: `curv` and `para`
//!
//! A `curv` tag is an identity marker, a single u8Fixed8 gamma, or a u16
//! lookup table. A `para` tag is one of the five ICC parametric function
//! shapes. ICC.1:2022 sections 10.6 and 10.18.

use crate::icc::error::IccError;
use crate::icc::types::{S15Fixed16, TypeSignature, U8Fixed8};

/// A parsed tone curve, device code -> linear light
#[derive(Debug, Clone, PartialEq)]
pub enum ToneCurve {
    /// `curv` with zero entries
    Identity,
    /// `curv` with a single u8Fixed8 exponent
    Gamma(f64),
    /// `curv` lookup table, values normalized over 65535
    Table(Vec<u16>),
    /// `para` function
    Parametric(ParametricCurve),
}

/// ICC parametric curve, function types 0..=4
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParametricCurve {
    pub function_type: u16,
    pub g: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl ParametricCurve {
    pub const fn pure_gamma(g: f64) -> Self {
        Self {
            function_type: 0,
            g,
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 0.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Number of s15Fixed16 parameters stored for each function type
    pub fn param_count(function_type: u16) -> Option<usize> {
        match function_type {
            0 => Some(1),
            1 => Some(3),
            2 => Some(4),
            3 => Some(5),
            4 => Some(7),
            _ => None,
        }
    }

    pub fn eval(&self, x: f64) -> f64 {
        match self.function_type {
            0 => x.max(0.0).powf(self.g),
            1 => {
                if self.a != 0.0 && x >= -self.b / self.a {
                    (self.a * x + self.b).powf(self.g)
                } else {
                    0.0
                }
            }
            2 => {
                if self.a != 0.0 && x >= -self.b / self.a {
                    (self.a * x + self.b).powf(self.g) + self.c
                } else {
                    self.c
                }
            }
            3 => {
                if x >= self.d {
                    (self.a * x + self.b).powf(self.g)
                } else {
                    self.c * x
                }
            }
            4 => {
                if x >= self.d {
                    (self.a * x + self.b).powf(self.g) + self.e
                } else {
                    self.c * x + self.f
                }
            }
            _ => x,
        }
    }
}

impl ToneCurve {
    /// Parse a full `curv` or `para` tag, type signature included
    pub fn parse(raw: &[u8]) -> Result<Self, IccError> {
        match TypeSignature::of(raw) {
            Some(TypeSignature::CURVE) => Self::parse_curv(raw),
            Some(TypeSignature::PARA) => Self::parse_para(raw),
            _ => Err(IccError::MalformedTag {
                kind: "curv",
                reason: "not a curve type signature",
            }),
        }
    }

    fn parse_curv(raw: &[u8]) -> Result<Self, IccError> {
        let payload = raw.get(8..).ok_or(IccError::MalformedTag {
            kind: "curv",
            reason: "missing entry count",
        })?;
        if payload.len() < 4 {
            return Err(IccError::MalformedTag {
                kind: "curv",
                reason: "missing entry count",
            });
        }
        let count = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]) as usize;
        match count {
            0 => Ok(Self::Identity),
            1 => {
                if payload.len() < 6 {
                    return Err(IccError::MalformedTag {
                        kind: "curv",
                        reason: "missing gamma value",
                    });
                }
                let gamma = U8Fixed8(u16::from_be_bytes([payload[4], payload[5]]));
                Ok(Self::Gamma(gamma.to_f64()))
            }
            _ => {
                let needed = 4 + count * 2;
                if payload.len() < needed {
                    return Err(IccError::MalformedTag {
                        kind: "curv",
                        reason: "table shorter than its entry count",
                    });
                }
                let table = payload[4..needed]
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                Ok(Self::Table(table))
            }
        }
    }

    fn parse_para(raw: &[u8]) -> Result<Self, IccError> {
        let payload = raw.get(8..).ok_or(IccError::MalformedTag {
            kind: "para",
            reason: "missing function type",
        })?;
        if payload.len() < 4 {
            return Err(IccError::MalformedTag {
                kind: "para",
                reason: "missing function type",
            });
        }
        let function_type = u16::from_be_bytes([payload[0], payload[1]]);
        let count =
            ParametricCurve::param_count(function_type).ok_or(IccError::UnknownCurveType(function_type))?;
        if payload.len() < 4 + count * 4 {
            return Err(IccError::MalformedTag {
                kind: "para",
                reason: "fewer parameters than the function type requires",
            });
        }

        let param = |i: usize| {
            let at = 4 + i * 4;
            S15Fixed16::from_be_bytes([payload[at], payload[at + 1], payload[at + 2], payload[at + 3]])
                .to_f64()
        };
        let mut params = [0.0f64; 7];
        for (i, slot) in params.iter_mut().enumerate().take(count) {
            *slot = param(i);
        }
        let [g, a, b, c, d, e, f] = params;
        // type 0 stores only g; a defaults to 1 so eval() stays uniform
        let a = if count > 1 { a } else { 1.0 };

        Ok(Self::Parametric(ParametricCurve {
            function_type,
            g,
            a,
            b,
            c,
            d,
            e,
            f,
        }))
    }

    /// Evaluate the curve at `x` in [0, 1]
    pub fn eval(&self, x: f64) -> f64 {
        let x = x.clamp(0.0, 1.0);
        match self {
            Self::Identity => x,
            Self::Gamma(g) => x.powf(*g),
            Self::Parametric(p) => p.eval(x),
            Self::Table(table) => match table.len() {
                0 => x,
                1 => f64::from(table[0]) / 65535.0,
                len => {
                    let pos = x * (len - 1) as f64;
                    let idx = (pos.floor() as usize).min(len - 2);
                    let frac = pos - idx as f64;
                    let lo = f64::from(table[idx]);
                    let hi = f64::from(table[idx + 1]);
                    (lo + frac * (hi - lo)) / 65535.0
                }
            },
        }
    }

    /// The exponent when the curve is exactly a power law, else None
    pub fn as_pure_gamma(&self) -> Option<f64> {
        match self {
            Self::Identity => Some(1.0),
            Self::Gamma(g) => Some(*g),
            Self::Parametric(p) if p.function_type == 0 => Some(p.g),
            _ => None,
        }
    }

    /// Fit an exponent to an arbitrary curve by log-log sampling.
    /// Returns None when the fit residual shows the curve is not close to
    /// any power law.
    pub fn estimate_gamma(&self) -> Option<f64> {
        if let Some(g) = self.as_pure_gamma() {
            return Some(g);
        }

        const SAMPLES: usize = 31;
        let mut sum = 0.0;
        let mut n = 0usize;
        for i in 1..=SAMPLES {
            let x = i as f64 / (SAMPLES + 1) as f64;
            let y = self.eval(x);
            if y > 1e-5 && y < 1.0 {
                sum += y.ln() / x.ln();
                n += 1;
            }
        }
        if n == 0 {
            return None;
        }
        let gamma = sum / n as f64;

        let mut worst = 0.0f64;
        for i in 1..=SAMPLES {
            let x = i as f64 / (SAMPLES + 1) as f64;
            worst = worst.max((self.eval(x) - x.powf(gamma)).abs());
        }
        (worst < 0.5).then_some(gamma)
    }
}

/// Serialize a `para` type-0 curve with the given exponent
pub fn write_gamma(gamma: f64) -> Vec<u8> {
    let mut out = Vec::with_capacity(16);
    out.extend_from_slice(&TypeSignature::PARA.0.to_be_bytes());
    out.extend_from_slice(&[0u8; 4]);
    out.extend_from_slice(&0u16.to_be_bytes()); // function type 0
    out.extend_from_slice(&[0u8; 2]); // reserved
    out.extend_from_slice(&S15Fixed16::from_f64(gamma).to_be_bytes());
    out
}

/// Serialize a `curv` lookup table
pub fn write_table(samples: &[u16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(12 + samples.len() * 2);
    out.extend_from_slice(&TypeSignature::CURVE.0.to_be_bytes());
    out.extend_from_slice(&[0u8; 4]);
    out.extend_from_slice(&(samples.len() as u32).to_be_bytes());
    for sample in samples {
        out.extend_from_slice(&sample.to_be_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_written_gamma() {
        let raw = write_gamma(2.4);
        let curve = ToneCurve::parse(&raw).unwrap();
        let g = curve.as_pure_gamma().unwrap();
        assert!((g - 2.4).abs() < 1e-4);
    }

    #[test]
    fn parse_curv_single_gamma() {
        // count = 1, gamma 2.2 as u8Fixed8 (0x0233)
        let mut raw = Vec::new();
        raw.extend_from_slice(b"curv");
        raw.extend_from_slice(&[0u8; 4]);
        raw.extend_from_slice(&1u32.to_be_bytes());
        raw.extend_from_slice(&[0x02, 0x33]);

        let curve = ToneCurve::parse(&raw).unwrap();
        assert!((curve.as_pure_gamma().unwrap() - 2.1992).abs() < 1e-3);
    }

    #[test]
    fn parse_curv_identity() {
        let mut raw = Vec::new();
        raw.extend_from_slice(b"curv");
        raw.extend_from_slice(&[0u8; 4]);
        raw.extend_from_slice(&0u32.to_be_bytes());

        let curve = ToneCurve::parse(&raw).unwrap();
        assert_eq!(curve, ToneCurve::Identity);
        assert_eq!(curve.as_pure_gamma(), Some(1.0));
    }

    #[test]
    fn table_interpolation() {
        let raw = write_table(&[0, 0x8000, 0xFFFF]);
        let curve = ToneCurve::parse(&raw).unwrap();
        assert!((curve.eval(0.0) - 0.0).abs() < 1e-3);
        assert!((curve.eval(0.5) - 0.5).abs() < 1e-3);
        assert!((curve.eval(1.0) - 1.0).abs() < 1e-3);
        assert!(curve.as_pure_gamma().is_none());
    }

    #[test]
    fn estimate_gamma_on_sampled_power_law() {
        let samples: Vec<u16> = (0..1024)
            .map(|i| {
                let x = i as f64 / 1023.0;
                (x.powf(2.2) * 65535.0).round() as u16
            })
            .collect();
        let curve = ToneCurve::parse(&write_table(&samples)).unwrap();
        let estimate = curve.estimate_gamma().unwrap();
        assert!((estimate - 2.2).abs() < 0.05, "estimate {estimate}");
    }

    #[test]
    fn parametric_srgb_shape() {
        let srgb = ParametricCurve {
            function_type: 3,
            g: 2.4,
            a: 1.0 / 1.055,
            b: 0.055 / 1.055,
            c: 1.0 / 12.92,
            d: 0.04045,
            e: 0.0,
            f: 0.0,
        };
        // linear segment below d, power segment above
        assert!((srgb.eval(0.02) - 0.02 / 12.92).abs() < 1e-9);
        assert!((srgb.eval(0.5) - ((0.5 + 0.055) / 1.055f64).powf(2.4)).abs() < 1e-9);
    }

    #[test]
    fn unknown_para_type_rejected() {
        let mut raw = Vec::new();
        raw.extend_from_slice(b"para");
        raw.extend_from_slice(&[0u8; 4]);
        raw.extend_from_slice(&7u16.to_be_bytes());
        raw.extend_from_slice(&[0u8; 2]);
        assert!(matches!(
            ToneCurve::parse(&raw),
            Err(IccError::UnknownCurveType(7))
        ));
    }
}
