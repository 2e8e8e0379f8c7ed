use std::collections::HashSet;

use mzpeaks::{CentroidPeak, Tolerance};

use msmatch::align::align;
use msmatch::matcher::match_peaks;
use msmatch::probability::AndromedaScorer;
use msmatch::proximity::gaussian_similarity;
use msmatch::scorer::{
    ReverseDotProduct, SimpleDotProduct, SpectralSimilarityScorer, WeightedDotProduct,
};
use msmatch::NOT_COMPUTED;

/// A small deterministic generator so the spectra below are varied but reproducible
struct Lcg(u64);

impl Lcg {
    fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

fn random_spectrum(rng: &mut Lcg, n: usize) -> Vec<CentroidPeak> {
    let mut mzs: Vec<f64> = (0..n).map(|_| 50.0 + rng.next_f64() * 900.0).collect();
    mzs.sort_by(|a, b| a.total_cmp(b));
    mzs.into_iter()
        .enumerate()
        .map(|(i, mz)| CentroidPeak::new(mz, (1.0 + rng.next_f64() * 999.0) as f32, i as u32))
        .collect()
}

fn spectrum(points: &[(f64, f32)]) -> Vec<CentroidPeak> {
    points
        .iter()
        .enumerate()
        .map(|(i, (mz, int))| CentroidPeak::new(*mz, *int, i as u32))
        .collect()
}

#[test]
fn self_alignment_is_balanced() {
    let mut rng = Lcg(42);
    for n in [1, 3, 10, 40] {
        let s = random_spectrum(&mut rng, n);
        let mut total = 0.0;
        for bin in align(&s, &s, 0.05, f64::NEG_INFINITY, f64::INFINITY) {
            assert_eq!(bin.measured, bin.reference);
            total += bin.reference;
        }
        let expected: f64 = s.iter().map(|p| p.intensity as f64).sum();
        assert!((total - expected).abs() < 1e-6);
    }
}

#[test]
fn dot_products_are_bounded() {
    let mut rng = Lcg(7);
    for _ in 0..50 {
        let a = random_spectrum(&mut rng, 12);
        let b = random_spectrum(&mut rng, 8);
        for score in [
            WeightedDotProduct::default().score(&a, &b, 0.5, 0.0, 2000.0),
            SimpleDotProduct::default().score(&a, &b, 0.5, 0.0, 2000.0),
            ReverseDotProduct::default().score(&a, &b, 0.5, 0.0, 2000.0),
        ] {
            assert!((0.0..=1.0).contains(&score), "{score}");
        }
    }
}

#[test]
fn self_similarity_ceiling() {
    let single = spectrum(&[(432.1, 55.0)]);
    let separated = spectrum(&[(110.07, 120.0), (245.1, 870.0), (390.2, 310.0), (612.4, 999.0)]);
    for s in [single, separated] {
        for score in [
            WeightedDotProduct::default().score(&s, &s, 0.01, 0.0, 2000.0),
            SimpleDotProduct::default().score(&s, &s, 0.01, 0.0, 2000.0),
            ReverseDotProduct::default().score(&s, &s, 0.01, 0.0, 2000.0),
        ] {
            assert!((score - 1.0).abs() < 1e-9, "{score}");
        }
    }
}

/// A copy of `source` with some peaks dropped, the rest nudged within `jitter` Da
/// and rescaled, and `extra` unrelated peaks mixed in
fn perturbed_spectrum(rng: &mut Lcg, source: &[CentroidPeak], jitter: f64, extra: usize) -> Vec<CentroidPeak> {
    let mut points: Vec<(f64, f32)> = Vec::with_capacity(source.len() + extra);
    for p in source {
        if rng.next_f64() < 0.3 {
            continue;
        }
        let mz = p.mz + (rng.next_f64() - 0.5) * jitter;
        points.push((mz, p.intensity * (0.2 + rng.next_f64() as f32 * 1.6)));
    }
    points.extend(random_spectrum(rng, extra).into_iter().map(|p| (p.mz, p.intensity)));
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    spectrum(&points)
}

#[test]
fn union_dot_products_are_symmetric() {
    let mut rng = Lcg(2024);
    let weighted = WeightedDotProduct::default();
    let simple = SimpleDotProduct::default();
    for n in [1, 2, 5, 12, 30] {
        for extra in [0, 1, 4] {
            let a = random_spectrum(&mut rng, n);
            let b = perturbed_spectrum(&mut rng, &a, 0.01, extra);
            if b.is_empty() {
                continue;
            }
            for (lo, hi) in [(0.0, 2000.0), (200.0, 700.0)] {
                let ab = weighted.score(&a, &b, 0.01, lo, hi);
                let ba = weighted.score(&b, &a, 0.01, lo, hi);
                assert!((ab - ba).abs() < 1e-12, "weighted {ab} != {ba} for {n}/{extra}");

                let ab = simple.score(&a, &b, 0.01, lo, hi);
                let ba = simple.score(&b, &a, 0.01, lo, hi);
                assert!((ab - ba).abs() < 1e-12, "simple {ab} != {ba} for {n}/{extra}");
            }
        }
    }

    // A peak present on only one side
    let a = spectrum(&[(100.0, 1000.0), (200.0, 1000.0)]);
    let b = spectrum(&[(100.0, 1000.0)]);
    let ab = weighted.score(&a, &b, 0.01, 0.0, 2000.0);
    let ba = weighted.score(&b, &a, 0.01, 0.0, 2000.0);
    assert_eq!(ab, ba);
    assert!((ab - 0.25).abs() < 1e-9, "{ab}");
    let ab = simple.score(&a, &b, 0.01, 0.0, 2000.0);
    let ba = simple.score(&b, &a, 0.01, 0.0, 2000.0);
    assert_eq!(ab, ba);
    assert!((ab - 0.375).abs() < 1e-9, "{ab}");
}

#[test]
fn reverse_dot_product_is_asymmetric() {
    let narrow = spectrum(&[(100.0, 1000.0), (150.0, 500.0)]);
    let wide = spectrum(&[(100.0, 1000.0), (150.0, 500.0), (400.0, 1000.0), (600.0, 800.0)]);
    let reverse = ReverseDotProduct::default();
    // Peaks outside the reference's range are invisible to the reverse score
    let wide_vs_narrow = reverse.score(&wide, &narrow, 0.01, 0.0, 2000.0);
    let narrow_vs_wide = reverse.score(&narrow, &wide, 0.01, 0.0, 2000.0);
    assert!((wide_vs_narrow - 1.0).abs() < 1e-9);
    assert!(narrow_vs_wide < wide_vs_narrow);
}

#[test]
fn peak_matcher_never_double_assigns() {
    let mut rng = Lcg(1234);
    for _ in 0..25 {
        let a = random_spectrum(&mut rng, 30);
        let b = random_spectrum(&mut rng, 30);
        let matches = match_peaks(&a, 500.0, &b, 518.0, Tolerance::Da(2.0));

        let assigned: Vec<usize> = matches.reference_to_query.iter().flatten().copied().collect();
        let unique: HashSet<usize> = assigned.iter().copied().collect();
        assert_eq!(unique.len(), assigned.len());
        assert_eq!(assigned.len(), matches.len());
        assert_eq!(
            matches.query_matched.iter().filter(|m| **m).count(),
            matches.len()
        );
        for q in assigned {
            assert!(matches.query_matched[q]);
        }
    }
}

#[test]
fn proximity_identity_and_sentinel() {
    for x in [0.01, 1.0, 37.5, 1234.5] {
        for tol in [0.001, 0.5, 10.0] {
            assert_eq!(gaussian_similarity(x, x, tol), 1.0);
            assert_eq!(gaussian_similarity(x, 0.0, tol), NOT_COMPUTED);
            assert_eq!(gaussian_similarity(-x, x, tol), NOT_COMPUTED);
        }
    }
}

#[test]
fn andromeda_monotone_in_matches() {
    for (delta, max_peaks) in [(100.0, 12.0), (100.0, 4.0), (50.0, 20.0)] {
        let scorer = AndromedaScorer::new(delta, max_peaks);
        for n in [3usize, 17, 60] {
            let scores: Vec<f64> = (0..=n).map(|k| scorer.score_counts(n, k)).collect();
            assert!(scores.windows(2).all(|w| w[0] <= w[1]), "{scores:?}");
        }
    }
}
