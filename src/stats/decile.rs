use thiserror::Error;

use crate::stats::{ClassifiedRegion, RegionalStat};

/// Returned when a set of densities cannot be split into at least two bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot form decile bins: {candidates} candidate region(s), {distinct} distinct edge(s)")]
pub struct EmptyQuantile {
    pub candidates: usize,
    pub distinct: usize,
}

/// Decile label of one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecileAssignment {
    pub id: String,
    pub decile: u8,
}

/// Quantile edges of ascending `sorted` values at ranks `i * (n - 1) / bins`,
/// interpolating linearly between neighbours. Equal consecutive edges are
/// collapsed into one, so the result may hold fewer than `bins + 1` edges.
pub fn quantile_edges(sorted: &[f64], bins: usize) -> Vec<f64> {
    let Some(last) = sorted.len().checked_sub(1) else { return Vec::new() };

    let mut edges: Vec<f64> = Vec::with_capacity(bins + 1);
    for i in 0..=bins {
        // Rank as an exact fraction: lo + rem / bins.
        let (lo, rem) = ((i * last) / bins, (i * last) % bins);
        let mut edge = if rem == 0 {
            sorted[lo]
        } else {
            sorted[lo] + (sorted[lo + 1] - sorted[lo]) * rem as f64 / bins as f64
        };
        if let Some(&prev) = edges.last() {
            edge = edge.max(prev);
            if edge == prev { continue }
        }
        edges.push(edge);
    }
    edges
}

/// Ranks regions of one country into ten density deciles.
///
/// Bins are right-closed, `(e[b], e[b + 1]]`, with the lowest bin also closed
/// on the left. When duplicate edges leave `k` bins, bin `b` (0 = least dense)
/// gets label `100 - 10 * (k - 1 - b)`, so the densest bin is always 100.
#[derive(Debug, Clone, Copy)]
pub struct DecileClassifier {
    bins: usize,
}

impl Default for DecileClassifier {
    fn default() -> Self { Self { bins: 10 } }
}

impl DecileClassifier {
    pub fn new() -> Self { Self::default() }

    /// Decile labels for `values`, in input order.
    pub fn labels(&self, values: &[f64]) -> Result<Vec<u8>, EmptyQuantile> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let edges = quantile_edges(&sorted, self.bins);
        if edges.len() < 2 {
            return Err(EmptyQuantile { candidates: values.len(), distinct: edges.len() });
        }

        let k = edges.len() - 1;
        Ok(values.iter()
            .map(|&value| {
                let bin = edges[1..].partition_point(|&edge| edge < value).min(k - 1);
                (100 - 10 * (k - 1 - bin)) as u8
            })
            .collect())
    }

    /// Label every region with positive area. Zero-area regions are left out.
    pub fn classify(&self, stats: &[RegionalStat]) -> Result<Vec<DecileAssignment>, EmptyQuantile> {
        let candidates: Vec<_> = stats.iter().filter(|s| s.is_classifiable()).collect();
        let densities: Vec<_> = candidates.iter().map(|s| s.density).collect();
        let labels = self.labels(&densities)?;

        Ok(candidates.into_iter().zip(labels)
            .map(|(stat, decile)| DecileAssignment { id: stat.id.clone(), decile })
            .collect())
    }

    /// Like [`classify`](Self::classify), keeping the full statistics of each region.
    pub fn classify_regions(&self, stats: &[RegionalStat]) -> Result<Vec<ClassifiedRegion>, EmptyQuantile> {
        let assignments = self.classify(stats)?;
        Ok(stats.iter().filter(|s| s.is_classifiable()).zip(assignments)
            .map(|(stat, assignment)| ClassifiedRegion { stat: stat.clone(), decile: assignment.decile })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn stat(id: &str, population: f64, area_km2: i64) -> RegionalStat {
        RegionalStat::new("ZZZ", id, 1, population, area_km2)
    }

    #[test]
    fn edges_interpolate_linearly() {
        let edges = quantile_edges(&[0.0, 10.0], 10);
        assert_eq!(edges.len(), 11);
        assert_eq!(edges[3], 3.0);
        assert_eq!(edges[10], 10.0);
    }

    #[test]
    fn duplicate_edges_collapse() {
        let edges = quantile_edges(&[1.0, 1.0, 1.0, 1.0, 5.0], 10);
        assert_eq!(edges.first(), Some(&1.0));
        assert_eq!(edges.last(), Some(&5.0));
        assert!(edges.windows(2).all(|w| w[0] < w[1]));
        assert!(edges.len() < 11);
    }

    #[test]
    fn three_region_scenario() {
        let stats = [stat("ZZZ.1_1", 0.0, 0), stat("ZZZ.2_1", 1000.0, 10), stat("ZZZ.3_1", 2000.0, 10)];
        let labels = DecileClassifier::new().classify(&stats).unwrap();

        assert_eq!(labels, vec![
            DecileAssignment { id: "ZZZ.2_1".into(), decile: 10 },
            DecileAssignment { id: "ZZZ.3_1".into(), decile: 100 },
        ]);
    }

    #[test]
    fn hundred_distinct_densities_fill_every_decile() {
        let stats: Vec<_> = (0..100).map(|i| stat(&format!("ZZZ.{i}_1"), (i * 37 % 100 + 1) as f64, 1)).collect();
        let labels = DecileClassifier::new().classify(&stats).unwrap();

        assert_eq!(labels.len(), 100);
        let mut counts = BTreeMap::new();
        for label in &labels { *counts.entry(label.decile).or_insert(0) += 1 }
        assert_eq!(counts.keys().copied().collect::<Vec<_>>(), vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
        assert!(counts.values().all(|&c| (9..=11).contains(&c)), "{counts:?}");
    }

    #[test]
    fn denser_regions_never_rank_lower() {
        let stats: Vec<_> = (0..37).map(|i| stat(&format!("ZZZ.{i}_1"), ((i * 13) % 37) as f64 * 2.5, 3)).collect();
        let labels = DecileClassifier::new().classify(&stats).unwrap();
        for (a, la) in stats.iter().zip(&labels) {
            for (b, lb) in stats.iter().zip(&labels) {
                if a.density < b.density { assert!(la.decile <= lb.decile) }
            }
        }
    }

    #[test]
    fn top_bin_is_always_100() {
        // Heavily tied data leaves only a few bins.
        let values = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0];
        let labels = DecileClassifier::new().labels(&values).unwrap();
        assert_eq!(labels[9], 100);
        assert!(labels[..9].iter().all(|&l| l < 100));
    }

    #[test]
    fn classified_regions_follow_assignments() {
        let stats = vec![stat("ZZZ.1_1", 0.0, 0), stat("ZZZ.2_1", 1000.0, 10), stat("ZZZ.3_1", 2000.0, 10)];
        let classifier = DecileClassifier::new();
        let assignments = classifier.classify(&stats).unwrap();
        let regions = classifier.classify_regions(&stats).unwrap();

        assert_eq!(regions.len(), assignments.len());
        for (region, assignment) in regions.iter().zip(&assignments) {
            assert_eq!((region.stat.id.as_str(), region.decile), (assignment.id.as_str(), assignment.decile));
        }
        assert_eq!(regions[1].stat, stats[2]);
    }

    #[test]
    fn single_region_is_empty_quantile() {
        let err = DecileClassifier::new().classify(&[stat("ZZZ.1_1", 5.0, 1), stat("ZZZ.2_1", 5.0, 0)]).unwrap_err();
        assert_eq!(err, EmptyQuantile { candidates: 1, distinct: 1 });
    }

    #[test]
    fn identical_densities_are_empty_quantile() {
        let stats = [stat("a", 5.0, 1), stat("b", 10.0, 2), stat("c", 15.0, 3)];
        assert!(DecileClassifier::new().classify(&stats).is_err());
        assert_eq!(DecileClassifier::new().classify(&[]).unwrap_err().candidates, 0);
    }
}
