/// K-means partition of the population in objective space.
///
/// Uses k-means++ seeding with several restarts, keeping the run with the
/// lowest inertia. All draws come from the caller's RNG, so labels are only
/// reproducible when that RNG is seeded.
use super::genome::{objective_matrix, Genome};
use crate::config::evolution::CLUSTER_COUNT;
use crate::error::{MoeecError, Result};
use rand::Rng;

#[derive(Debug, Clone)]
pub struct KMeans {
    pub k: usize,
    pub n_init: usize,
    pub max_iter: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    pub labels: Vec<usize>,
    pub centroids: Vec<[f64; 3]>,
    pub inertia: f64,
}

impl KMeans {
    pub fn new(k: usize, n_init: usize, max_iter: usize) -> Self {
        Self {
            k,
            n_init: n_init.max(1),
            max_iter: max_iter.max(1),
        }
    }

    pub fn fit<R: Rng + ?Sized>(&self, points: &[[f64; 3]], rng: &mut R) -> Result<KMeansFit> {
        if self.k == 0 || points.len() < self.k {
            return Err(MoeecError::InvalidInput(format!(
                "k-means with k = {} needs at least {} points, got {}",
                self.k,
                self.k,
                points.len()
            )));
        }

        let mut best: Option<KMeansFit> = None;
        for _ in 0..self.n_init {
            let fit = self.lloyd(points, self.seed_centroids(points, rng));
            if best.as_ref().map_or(true, |b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }

        best.ok_or_else(|| MoeecError::InvalidInput("k-means produced no fit".to_string()))
    }

    /// k-means++ seeding: each new centroid is drawn with probability
    /// proportional to its squared distance from the closest chosen one.
    fn seed_centroids<R: Rng + ?Sized>(&self, points: &[[f64; 3]], rng: &mut R) -> Vec<[f64; 3]> {
        let mut centroids = Vec::with_capacity(self.k);
        centroids.push(points[rng.gen_range(0..points.len())]);

        while centroids.len() < self.k {
            let weights: Vec<f64> = points
                .iter()
                .map(|p| nearest(p, &centroids).1)
                .collect();
            let total: f64 = weights.iter().sum();

            let chosen = if total > 0.0 {
                let mut spin = rng.gen::<f64>() * total;
                let mut chosen = points.len() - 1;
                for (i, w) in weights.iter().enumerate() {
                    spin -= w;
                    if spin <= 0.0 && *w > 0.0 {
                        chosen = i;
                        break;
                    }
                }
                chosen
            } else {
                rng.gen_range(0..points.len())
            };
            centroids.push(points[chosen]);
        }

        centroids
    }

    fn lloyd(&self, points: &[[f64; 3]], mut centroids: Vec<[f64; 3]>) -> KMeansFit {
        let mut labels = vec![usize::MAX; points.len()];

        for _iteration in 0..self.max_iter {
            let mut changed = false;

            // Assign points to nearest centroid
            for (i, point) in points.iter().enumerate() {
                let (cluster, _) = nearest(point, &centroids);
                if labels[i] != cluster {
                    labels[i] = cluster;
                    changed = true;
                }
            }

            if !changed {
                break;
            }

            // Update centroids
            for (c, centroid) in centroids.iter_mut().enumerate() {
                let mut sum = [0.0; 3];
                let mut count = 0usize;
                for (point, _) in points.iter().zip(&labels).filter(|(_, l)| **l == c) {
                    for m in 0..3 {
                        sum[m] += point[m];
                    }
                    count += 1;
                }
                if count == 0 {
                    log::warn!("k-means cluster {} became empty, keeping its centroid", c);
                    continue;
                }
                for m in 0..3 {
                    centroid[m] = sum[m] / count as f64;
                }
            }
        }

        let inertia = points
            .iter()
            .zip(&labels)
            .map(|(p, &l)| squared_distance(p, &centroids[l]))
            .sum();

        KMeansFit {
            labels,
            centroids,
            inertia,
        }
    }
}

fn squared_distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Index of and squared distance to the closest centroid.
fn nearest(point: &[f64; 3], centroids: &[[f64; 3]]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (c, centroid) in centroids.iter().enumerate() {
        let d = squared_distance(point, centroid);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

/// Label every genome with its cluster and return the members of each
/// cluster as population indices.
pub fn assign_clusters<R: Rng + ?Sized>(
    population: &mut [Genome],
    kmeans: &KMeans,
    rng: &mut R,
) -> Result<Vec<Vec<usize>>> {
    if population.len() < CLUSTER_COUNT {
        return Err(MoeecError::InvalidInput(format!(
            "clustering needs at least {} genomes, got {}",
            CLUSTER_COUNT,
            population.len()
        )));
    }

    let points = objective_matrix(population)?;
    let fit = kmeans.fit(&points, rng)?;
    for (genome, &label) in population.iter_mut().zip(&fit.labels) {
        genome.attributes.cluster_label = Some(label);
    }

    log::debug!("k-means inertia {:.6}", fit.inertia);
    cluster_members(population, kmeans.k)
}

/// Population indices grouped by `cluster_label`.
pub fn cluster_members(population: &[Genome], k: usize) -> Result<Vec<Vec<usize>>> {
    let mut members = vec![Vec::new(); k];
    for (idx, genome) in population.iter().enumerate() {
        let label = genome.attributes.cluster_label.ok_or_else(|| {
            MoeecError::InvalidInput(format!("genome {} has no cluster label", idx))
        })?;
        members
            .get_mut(label)
            .ok_or(MoeecError::IndexOutOfRange { index: label, len: k })?
            .push(idx);
    }
    Ok(members)
}
