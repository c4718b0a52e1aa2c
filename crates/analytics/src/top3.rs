//! Representative-article selection.
//!
//! Titles are embedded and clustered; the three largest clusters each
//! contribute their medoid. When fewer than three clusters form, the
//! remaining slots fill from noise points and then from the rest of the
//! titled pool, uniformly at random without replacement. The fill is
//! reproducible when a seed is configured.

use advisor_data::models::ArticleRecord;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::cluster::{dbscan, medoid, DbscanConfig};
use crate::embedding::SharedEmbedder;

/// Number of representatives per week.
const REPRESENTATIVES: usize = 3;

/// Selector parameters.
#[derive(Debug, Clone, Default)]
pub struct Top3Config {
    /// Density clustering parameters.
    pub clustering: DbscanConfig,
    /// Seed for degraded-mode random fill. None draws from entropy.
    pub seed: Option<u64>,
}

/// Chooses three representative articles for one week bucket.
pub struct Top3Selector {
    embedder: SharedEmbedder,
    config: Top3Config,
}

impl Top3Selector {
    /// Creates a new selector.
    #[must_use]
    pub fn new(embedder: SharedEmbedder, config: Top3Config) -> Self {
        Self { embedder, config }
    }

    /// Selects three representatives from one week's articles.
    ///
    /// Returns the empty vector when fewer than three articles carry a
    /// title. Embedding and clustering are CPU-bound and synchronous.
    pub fn select<'a>(&self, articles: &'a [ArticleRecord]) -> Vec<&'a ArticleRecord> {
        let titled: Vec<&ArticleRecord> = articles.iter().filter(|a| a.is_titled()).collect();
        if titled.len() < REPRESENTATIVES {
            warn!(
                titled = titled.len(),
                "fewer than three titled articles, returning empty selection"
            );
            return Vec::new();
        }

        let titles: Vec<&str> = titled.iter().map(|a| a.title_text()).collect();
        let embeddings = self.embedder.embed_batch(&titles);
        let picked = select_indices(&embeddings, &self.config);
        picked.into_iter().map(|i| titled[i]).collect()
    }
}

/// Core selection over precomputed embeddings.
///
/// Exposed separately so the clustering and degraded-mode rules can be
/// exercised with synthetic vectors.
#[must_use]
pub fn select_indices(embeddings: &[Vec<f32>], config: &Top3Config) -> Vec<usize> {
    let assignment = dbscan(embeddings, &config.clustering);
    debug!(
        clusters = assignment.n_clusters,
        noise = assignment.noise().len(),
        "clustered week titles"
    );

    let mut picked: Vec<usize> = assignment
        .clusters_by_size()
        .into_iter()
        .take(REPRESENTATIVES)
        .filter_map(|cluster| medoid(embeddings, &assignment.members(cluster)))
        .collect();

    if picked.len() < REPRESENTATIVES {
        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        fill_random(&mut picked, assignment.noise(), &mut rng);
        if picked.len() < REPRESENTATIVES {
            let remaining: Vec<usize> =
                (0..embeddings.len()).filter(|i| !picked.contains(i)).collect();
            fill_random(&mut picked, remaining, &mut rng);
        }
    }

    picked.truncate(REPRESENTATIVES);
    picked
}

/// Fills open slots from a candidate pool, uniformly without replacement.
fn fill_random(picked: &mut Vec<usize>, mut pool: Vec<usize>, rng: &mut ChaCha8Rng) {
    pool.retain(|i| !picked.contains(i));
    pool.shuffle(rng);
    for index in pool {
        if picked.len() >= REPRESENTATIVES {
            break;
        }
        picked.push(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{Embedder, HashedNgramEmbedder};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn tight_config(seed: Option<u64>) -> Top3Config {
        Top3Config {
            clustering: DbscanConfig {
                eps: 0.5,
                min_points: 3,
            },
            seed,
        }
    }

    fn article(title: Option<&str>) -> ArticleRecord {
        ArticleRecord {
            ticker: "AAPL".to_string(),
            sector: "Technology".to_string(),
            title: title.map(String::from),
            body: "body".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            week_start: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        }
    }

    /// One tight cluster of three plus two scattered noise points.
    fn one_cluster_two_noise() -> Vec<Vec<f32>> {
        vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![0.05, 0.1],
            vec![5.0, 5.0],
            vec![9.0, -3.0],
        ]
    }

    #[test]
    fn three_clusters_yield_three_medoids() {
        let mut points = Vec::new();
        for center in [0.0f32, 10.0, 20.0] {
            points.push(vec![center, 0.0]);
            points.push(vec![center + 0.1, 0.0]);
            points.push(vec![center, 0.1]);
        }
        let picked = select_indices(&points, &tight_config(Some(1)));

        assert_eq!(picked.len(), 3);
        // One representative per blob.
        let blobs: Vec<usize> = picked.iter().map(|i| i / 3).collect();
        let mut sorted = blobs.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 3);
    }

    #[test]
    fn under_clustering_fills_from_noise_with_seed() {
        let points = one_cluster_two_noise();
        let picked = select_indices(&points, &tight_config(Some(42)));

        assert_eq!(picked.len(), 3);
        // The cluster medoid leads, the two noise points fill the rest.
        assert!(picked[0] < 3);
        let mut tail = picked[1..].to_vec();
        tail.sort_unstable();
        assert_eq!(tail, vec![3, 4]);
    }

    #[test]
    fn seeded_fill_is_reproducible() {
        let points = one_cluster_two_noise();
        let first = select_indices(&points, &tight_config(Some(42)));
        let second = select_indices(&points, &tight_config(Some(42)));
        assert_eq!(first, second);
    }

    #[test]
    fn fills_from_remaining_titled_when_noise_is_short() {
        // Two tight blobs of three: two clusters, zero noise, one open slot.
        let mut points = Vec::new();
        for center in [0.0f32, 10.0] {
            points.push(vec![center, 0.0]);
            points.push(vec![center + 0.1, 0.0]);
            points.push(vec![center, 0.1]);
        }
        let picked = select_indices(&points, &tight_config(Some(7)));

        assert_eq!(picked.len(), 3);
        let mut unique = picked.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), 3, "no index picked twice");
    }

    #[test]
    fn selector_requires_three_titled_articles() {
        let embedder: Arc<dyn Embedder> = Arc::new(HashedNgramEmbedder::new());
        let selector = Top3Selector::new(embedder, Top3Config::default());

        let articles = vec![
            article(Some("one")),
            article(Some("two")),
            article(None),
            article(Some("   ")),
        ];
        assert!(selector.select(&articles).is_empty());
    }

    #[test]
    fn selector_returns_three_titled_articles() {
        let embedder: Arc<dyn Embedder> = Arc::new(HashedNgramEmbedder::new());
        let selector = Top3Selector::new(embedder, Top3Config { seed: Some(3), ..Top3Config::default() });

        let articles: Vec<ArticleRecord> = [
            "Fed holds rates steady",
            "Fed keeps rates unchanged",
            "Fed leaves rates on hold",
            "Retailer recalls lettuce",
            "Studio delays film sequel",
        ]
        .iter()
        .map(|t| article(Some(t)))
        .collect();

        let picked = selector.select(&articles);
        assert_eq!(picked.len(), 3);
    }
}
