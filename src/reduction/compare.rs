//! Image comparison contracts for the image-based judges.
//!
//! The engine only needs the accept/reject contract; the arithmetic here is
//! deliberately simple. Comparators receive raw image bytes and decide
//! whether the candidate's image keeps the property being reduced toward.

/// Verdict over a (reference, candidate) image pair.
pub trait ImageComparator {
    /// Returns true when the candidate image is still "interesting" with
    /// respect to the reference.
    fn accept(&self, reference: &[u8], candidate: &[u8]) -> bool;
}

/// Byte-for-byte comparison.
#[derive(Clone, Copy, Debug)]
pub struct ExactComparator {
    /// Accept when the images are identical; otherwise accept when they
    /// differ.
    pub accept_identical: bool,
}

impl ImageComparator for ExactComparator {
    fn accept(&self, reference: &[u8], candidate: &[u8]) -> bool {
        (reference == candidate) == self.accept_identical
    }
}

/// Histogram-distance comparison with a numeric threshold.
///
/// Boundary convention: the below-threshold variant accepts strictly below
/// (`distance < threshold`), the above-threshold variant accepts at or above
/// (`distance >= threshold`). The two accept sets partition at the threshold
/// with no overlap and no gap.
#[derive(Clone, Copy, Debug)]
pub struct HistogramComparator {
    /// Distance threshold; non-negative.
    pub threshold: f64,
    /// Accept when the distance is at or above the threshold; otherwise
    /// accept when it is strictly below.
    pub accept_above: bool,
}

impl HistogramComparator {
    /// Chi-square distance between 256-bin byte histograms.
    pub fn distance(reference: &[u8], candidate: &[u8]) -> f64 {
        let mut ref_hist = [0u64; 256];
        let mut cand_hist = [0u64; 256];
        for &b in reference {
            ref_hist[b as usize] += 1;
        }
        for &b in candidate {
            cand_hist[b as usize] += 1;
        }

        let mut dist = 0.0f64;
        for i in 0..256 {
            let a = ref_hist[i] as f64;
            let b = cand_hist[i] as f64;
            let sum = a + b;
            if sum > 0.0 {
                let diff = a - b;
                dist += (diff * diff) / sum;
            }
        }
        dist
    }
}

impl ImageComparator for HistogramComparator {
    fn accept(&self, reference: &[u8], candidate: &[u8]) -> bool {
        let distance = Self::distance(reference, candidate);
        if self.accept_above {
            distance >= self.threshold
        } else {
            distance < self.threshold
        }
    }
}
