//! HDR transfer functions
//!
//! SMPTE ST.2084 (PQ) and ARIB/BT.2100 Hybrid Log-Gamma, in f32 to match
//! the per-pixel kernels. Pure gamma curves are handled inline by the
//! kernels; only the shapes with named constants live here.

// SMPTE ST.2084 constants, exact rationals
const PQ_C1: f32 = 0.8359375; // 3424 / 4096
const PQ_C2: f32 = 18.8515625; // 2413 / 4096 * 32
const PQ_C3: f32 = 18.6875; // 2392 / 4096 * 32
const PQ_M1: f32 = 0.1593017578125; // 2610 / 4096 / 4
const PQ_M2: f32 = 78.84375; // 2523 / 4096 * 128

/// ST.2084 equation 4.1: display light from code value
pub fn pq_eotf(n: f32) -> f32 {
    let n1m2 = n.powf(1.0 / PQ_M2);
    let num = (n1m2 - PQ_C1).max(0.0);
    let den = PQ_C2 - PQ_C3 * n1m2;
    (num / den).powf(1.0 / PQ_M1)
}

/// ST.2084 equation 5.2: code value from display light
pub fn pq_oetf(l: f32) -> f32 {
    let lm1 = l.powf(PQ_M1);
    ((PQ_C1 + PQ_C2 * lm1) / (1.0 + PQ_C3 * lm1)).powf(PQ_M2)
}

// BT.2100 HLG constants
const HLG_A: f32 = 0.17883277;
const HLG_B: f32 = 0.28466892; // 1 - 4a
const HLG_C: f32 = 0.55991073; // 0.5 - a * ln(4a)

/// HLG inverse OETF, normalized scene light from code value
pub fn hlg_eotf(n: f32) -> f32 {
    if n <= 0.5 {
        (n * n) / 3.0
    } else {
        (((n - HLG_C) / HLG_A).exp() + HLG_B) / 12.0
    }
}

/// HLG OETF, code value from normalized scene light
pub fn hlg_oetf(l: f32) -> f32 {
    if l <= 1.0 / 12.0 {
        (3.0 * l).sqrt()
    } else {
        HLG_A * (12.0 * l - HLG_B).ln() + HLG_C
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pq_roundtrip() {
        for i in 0..=100 {
            let n = i as f32 / 100.0;
            assert!((pq_oetf(pq_eotf(n)) - n).abs() < 1e-4, "code value {n}");
            assert!((pq_eotf(pq_oetf(n)) - n).abs() < 1e-4, "display light {n}");
        }
    }

    #[test]
    fn pq_midlevel_decode() {
        // ~100 nits out of 10000 at the commonly quoted code value
        assert!((pq_eotf(0.5081) - 0.01).abs() < 1e-3);
    }

    #[test]
    fn pq_endpoints() {
        assert!(pq_eotf(0.0).abs() < 1e-6);
        assert!((pq_eotf(1.0) - 1.0).abs() < 1e-4);
        assert!(pq_oetf(0.0).abs() < 1e-6);
        assert!((pq_oetf(1.0) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn hlg_roundtrip() {
        for i in 0..=100 {
            let n = i as f32 / 100.0;
            assert!((hlg_oetf(hlg_eotf(n)) - n).abs() < 1e-4, "code value {n}");
            assert!((hlg_eotf(hlg_oetf(n)) - n).abs() < 1e-4, "scene light {n}");
        }
    }

    #[test]
    fn hlg_knee_is_continuous() {
        let below = hlg_oetf(1.0 / 12.0 - 1e-6);
        let above = hlg_oetf(1.0 / 12.0 + 1e-6);
        assert!((below - above).abs() < 1e-4);
        assert!((hlg_oetf(1.0 / 12.0) - 0.5).abs() < 1e-5);
    }
}
