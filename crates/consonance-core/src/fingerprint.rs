use serde::{Deserialize, Serialize};

/// Numeric summary of one audio file's spectral and tonal content.
///
/// Both vectors are time averages of frame-wise feature matrices. Their
/// lengths are fixed by the extractor configuration rather than by the
/// input file, so vectors of the same kind are always comparable across
/// files fingerprinted with the same configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Mel-frequency cepstral coefficients: spectral envelope / timbre.
    pub mfcc: Vec<f32>,
    /// Pitch-class energies: harmonic / tonal content.
    pub chroma: Vec<f32>,
}

impl Fingerprint {
    /// Feature kinds carried by this fingerprint.
    ///
    /// An empty vector counts as an absent kind; distance computation
    /// only considers kinds present on both sides of a comparison.
    pub fn kinds(&self) -> impl Iterator<Item = (&'static str, &[f32])> {
        [
            ("mfcc", self.mfcc.as_slice()),
            ("chroma", self.chroma.as_slice()),
        ]
        .into_iter()
        .filter(|(_, v)| !v.is_empty())
    }

    /// Look up one feature kind by name; empty vectors count as absent.
    pub fn kind(&self, name: &str) -> Option<&[f32]> {
        self.kinds().find(|(n, _)| *n == name).map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_skips_empty_vectors() {
        let fp = Fingerprint {
            mfcc: vec![1.0, 2.0],
            chroma: Vec::new(),
        };
        let kinds: Vec<&str> = fp.kinds().map(|(name, _)| name).collect();
        assert_eq!(kinds, vec!["mfcc"]);
        assert!(fp.kind("chroma").is_none());
        assert_eq!(fp.kind("mfcc"), Some(&[1.0_f32, 2.0][..]));
    }

    #[test]
    fn serde_round_trip_preserves_values() {
        let fp = Fingerprint {
            mfcc: vec![-12.75, 0.003, 7.25],
            chroma: vec![0.1, 0.9],
        };
        let json = serde_json::to_string(&fp).unwrap();
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fp);
    }
}
