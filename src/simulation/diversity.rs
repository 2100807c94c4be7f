//! Alpha-diversity indices over abundance snapshots.

use serde::Serialize;

use crate::simulation::{AbundanceVector, SPECIES_COUNT, Session};

/// Divisor used for proportions; an all-zero vector divides by 1 instead of 0.
fn safe_total(abundances: &[f64]) -> f64 {
    let total: f64 = abundances.iter().sum();
    if total == 0.0 { 1.0 } else { total }
}

/// Shannon entropy H' = -Σ p ln p, skipping zero proportions.
pub fn shannon(abundances: &[f64]) -> f64 {
    let total = safe_total(abundances);
    abundances
        .iter()
        .map(|value| value / total)
        .filter(|p| *p > 0.0)
        .fold(0.0, |h, p| h - p * p.ln())
}

/// Simpson diversity 1 - Σ p². An empty community scores 0, not 1.
pub fn simpson(abundances: &[f64]) -> f64 {
    let total = safe_total(abundances);
    let sum_squares: f64 = abundances
        .iter()
        .map(|value| {
            let p = value / total;
            p * p
        })
        .sum();
    if sum_squares == 0.0 {
        return 0.0;
    }
    1.0 - sum_squares
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiversitySample {
    pub shannon: f64,
    pub simpson: f64,
}

impl DiversitySample {
    pub fn of(abundances: &[f64]) -> Self {
        Self {
            shannon: shannon(abundances),
            simpson: simpson(abundances),
        }
    }
}

/// Shannon and Simpson curves aligned to a session's time axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiversitySeries {
    pub shannon: Vec<f64>,
    pub simpson: Vec<f64>,
}

impl DiversitySeries {
    pub fn len(&self) -> usize {
        self.shannon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shannon.is_empty()
    }

    pub fn latest(&self) -> Option<DiversitySample> {
        Some(DiversitySample {
            shannon: *self.shannon.last()?,
            simpson: *self.simpson.last()?,
        })
    }
}

/// Rebuilds the snapshot at time index `t` from the per-species series.
pub fn snapshot_at(session: &Session, t: usize) -> AbundanceVector {
    let mut abundances = [0.0; SPECIES_COUNT];
    for (slot, series) in abundances.iter_mut().zip(session.series().iter()) {
        *slot = series.get(t).copied().unwrap_or(0.0);
    }
    abundances
}

/// Recomputes both diversity curves from scratch.
pub fn diversity_series(session: &Session) -> DiversitySeries {
    let (shannon, simpson) = (0..session.time_axis().len())
        .map(|t| DiversitySample::of(&snapshot_at(session, t)))
        .map(|sample| (sample.shannon, sample.simpson))
        .unzip();
    DiversitySeries { shannon, simpson }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn single_species_has_no_diversity() {
        let v = [0.0, 0.0, 42.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        assert_eq!(shannon(&v), 0.0);
        assert_eq!(simpson(&v), 0.0);
    }

    #[test]
    fn degenerate_communities_score_positive_zero() {
        let single = [0.0, 0.0, 0.0, 100.0, 0.0, 0.0, 0.0, 0.0];
        let empty = [0.0; SPECIES_COUNT];
        for v in [single, empty] {
            let h = shannon(&v);
            assert!(h.is_sign_positive());
            assert_eq!(format!("{h:.3}"), "0.000");
            assert_eq!(serde_json::to_string(&DiversitySample::of(&v)).unwrap(), r#"{"shannon":0.0,"simpson":0.0}"#);
        }
    }

    #[test]
    fn uniform_community_hits_the_maxima() {
        let v = [12.5; SPECIES_COUNT];
        let n = SPECIES_COUNT as f64;
        assert!((shannon(&v) - n.ln()).abs() < EPS);
        assert!((simpson(&v) - (1.0 - 1.0 / n)).abs() < EPS);
    }

    #[test]
    fn all_zero_vector_is_degenerate_safe() {
        let v = [0.0; SPECIES_COUNT];
        assert_eq!(shannon(&v), 0.0);
        assert_eq!(simpson(&v), 0.0);
        assert!(shannon(&v).is_finite());
    }

    #[test]
    fn indices_stay_in_range_for_skewed_vectors() {
        let vectors = [
            [22.0, 18.0, 12.0, 15.0, 20.0, 4.0, 6.0, 3.0],
            [99.0, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0],
            [1e-9, 1e-9, 1e-9, 1e-9, 1e-9, 1e-9, 1e-9, 100.0],
        ];
        for v in vectors {
            let h = shannon(&v);
            let d = simpson(&v);
            assert!(h >= 0.0);
            assert!((0.0..1.0).contains(&d), "simpson out of range: {d}");
        }
    }

    #[test]
    fn scale_does_not_change_indices() {
        let percent = [22.0, 18.0, 12.0, 15.0, 20.0, 4.0, 6.0, 3.0];
        let fractions = percent.map(|v| v / 100.0);
        assert!((shannon(&percent) - shannon(&fractions)).abs() < EPS);
        assert!((simpson(&percent) - simpson(&fractions)).abs() < EPS);
    }
}
