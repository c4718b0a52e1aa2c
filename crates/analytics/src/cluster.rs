//! Density-based clustering over embedding space.
//!
//! DBSCAN with a Euclidean metric. Points that never reach a core
//! neighbourhood stay unassigned (noise); the selector's degraded mode
//! draws from them when fewer than three clusters form.

use crate::embedding::{centroid, euclidean};

/// DBSCAN parameters.
#[derive(Debug, Clone)]
pub struct DbscanConfig {
    /// Neighbourhood radius in embedding space.
    pub eps: f32,
    /// Minimum neighbourhood size for a core point. Doubles as the
    /// minimum cluster size.
    pub min_points: usize,
}

impl Default for DbscanConfig {
    fn default() -> Self {
        // eps tuned for unit-norm vectors, where distances fall in [0, 2].
        Self {
            eps: 0.95,
            min_points: 3,
        }
    }
}

/// Cluster labels for a point set.
#[derive(Debug, Clone)]
pub struct ClusterAssignment {
    /// Per-point label; `None` marks noise.
    pub labels: Vec<Option<usize>>,
    /// Number of clusters found.
    pub n_clusters: usize,
}

impl ClusterAssignment {
    /// Member indices of one cluster.
    #[must_use]
    pub fn members(&self, cluster: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter_map(|(i, l)| (*l == Some(cluster)).then_some(i))
            .collect()
    }

    /// Indices of noise points.
    #[must_use]
    pub fn noise(&self) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter_map(|(i, l)| l.is_none().then_some(i))
            .collect()
    }

    /// Cluster ids ordered by member count descending, id ascending on ties.
    #[must_use]
    pub fn clusters_by_size(&self) -> Vec<usize> {
        let mut sizes: Vec<(usize, usize)> = (0..self.n_clusters)
            .map(|c| (c, self.members(c).len()))
            .collect();
        sizes.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        sizes.into_iter().map(|(c, _)| c).collect()
    }
}

/// Runs DBSCAN over a point set.
#[must_use]
pub fn dbscan(points: &[Vec<f32>], config: &DbscanConfig) -> ClusterAssignment {
    let n = points.len();
    let mut labels: Vec<Option<usize>> = vec![None; n];
    let mut visited = vec![false; n];
    let mut n_clusters = 0;

    for i in 0..n {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        let neighbours = region_query(points, i, config.eps);
        if neighbours.len() < config.min_points {
            continue;
        }

        let cluster = n_clusters;
        n_clusters += 1;
        labels[i] = Some(cluster);

        let mut queue = neighbours;
        let mut head = 0;
        while head < queue.len() {
            let j = queue[head];
            head += 1;

            if !visited[j] {
                visited[j] = true;
                let extended = region_query(points, j, config.eps);
                if extended.len() >= config.min_points {
                    queue.extend(extended);
                }
            }
            if labels[j].is_none() {
                labels[j] = Some(cluster);
            }
        }
    }

    ClusterAssignment { labels, n_clusters }
}

/// Index of the cluster member nearest to the cluster centroid.
#[must_use]
pub fn medoid(points: &[Vec<f32>], members: &[usize]) -> Option<usize> {
    if members.is_empty() {
        return None;
    }
    let member_points: Vec<&Vec<f32>> = members.iter().map(|&i| &points[i]).collect();
    let center = centroid(&member_points);

    members
        .iter()
        .copied()
        .min_by(|&a, &b| {
            let da = euclidean(&points[a], &center);
            let db = euclidean(&points[b], &center);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
}

fn region_query(points: &[Vec<f32>], i: usize, eps: f32) -> Vec<usize> {
    (0..points.len())
        .filter(|&j| euclidean(&points[i], &points[j]) <= eps)
        .collect()
}
