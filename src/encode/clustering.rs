//! Pixel clustering used to rank partitions.
//!
//! Trying every partition of BC6H and BC7 is far too slow. Instead, the pixels
//! of a block are grouped with k-means and partitions are sorted by how well
//! their subsets line up with the groups.

use glam::Vec4;

use crate::bcn_data::subset_map;

/// The cluster of each pixel.
///
/// Cluster ids are dense and numbered in order of first appearance, so pixel
/// 0 is always in cluster 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ClusterMap {
    pub ids: [u8; 16],
    pub count: u8,
}
impl ClusterMap {
    fn from_raw(raw: [u8; 16]) -> Self {
        let mut mapping = [u8::MAX; 16];
        let mut count = 0;
        let ids = raw.map(|id| {
            let slot = &mut mapping[id as usize & 15];
            if *slot == u8::MAX {
                *slot = count;
                count += 1;
            }
            *slot
        });
        Self { ids, count }
    }
}

/// Groups the pixels into at most `k` clusters.
///
/// The distance between two pixels is the squared distance of their values
/// plus the squared distance of their positions in the block (in `0..=1`)
/// times `spatial_weight`. The result is deterministic: the first centroid is
/// pixel 0 and every further centroid is the pixel whose value is farthest
/// from all previous ones. Pixels with equal values never start separate
/// clusters.
pub(crate) fn cluster_pixels(
    points: &[Vec4; 16],
    k: usize,
    iterations: usize,
    spatial_weight: f32,
) -> ClusterMap {
    debug_assert!((1..=16).contains(&k));

    let positions: [Vec4; 16] = std::array::from_fn(|i| {
        Vec4::new((i % 4) as f32 / 3.0, (i / 4) as f32 / 3.0, 0.0, 0.0)
    });
    let distance = |value: Vec4, position: Vec4, c_value: Vec4, c_position: Vec4| {
        value.distance_squared(c_value) + position.distance_squared(c_position) * spatial_weight
    };

    // farthest point initialization
    let mut centroids: Vec<(Vec4, Vec4)> = Vec::with_capacity(k);
    centroids.push((points[0], positions[0]));
    while centroids.len() < k {
        let mut farthest = 0;
        let mut farthest_distance = 0.0;
        for i in 0..16 {
            let d = centroids
                .iter()
                .map(|&(v, _)| points[i].distance_squared(v))
                .fold(f32::INFINITY, f32::min);
            if d > farthest_distance {
                farthest = i;
                farthest_distance = d;
            }
        }
        if farthest_distance <= 0.0 {
            // fewer distinct pixels than clusters
            break;
        }
        centroids.push((points[farthest], positions[farthest]));
    }

    let mut ids = [0_u8; 16];
    for _ in 0..iterations {
        let mut changed = false;
        for i in 0..16 {
            let mut best = 0;
            let mut best_distance = f32::INFINITY;
            for (c, &(v, p)) in centroids.iter().enumerate() {
                let d = distance(points[i], positions[i], v, p);
                if d < best_distance {
                    best = c as u8;
                    best_distance = d;
                }
            }
            changed |= ids[i] != best;
            ids[i] = best;
        }

        for (c, centroid) in centroids.iter_mut().enumerate() {
            let mut value_sum = Vec4::ZERO;
            let mut position_sum = Vec4::ZERO;
            let mut n = 0;
            for i in 0..16 {
                if ids[i] as usize == c {
                    value_sum += points[i];
                    position_sum += positions[i];
                    n += 1;
                }
            }
            if n > 0 {
                *centroid = (value_sum / n as f32, position_sum / n as f32);
            }
        }

        if !changed {
            break;
        }
    }

    ClusterMap::from_raw(ids)
}

/// Counts the pixels that are not in the most common cluster of their
/// subset.
fn disagreement(clusters: &ClusterMap, subsets: &[u8; 16]) -> u32 {
    let mut counts = [[0_u8; 16]; 3];
    let mut majority = [0_u8; 3];
    for (&cluster, &subset) in clusters.ids.iter().zip(subsets) {
        let subset = subset as usize % 3;
        let cluster = cluster as usize & 15;
        counts[subset][cluster] += 1;
        if counts[subset][cluster] > counts[subset][majority[subset] as usize] {
            majority[subset] = cluster as u8;
        }
    }

    clusters
        .ids
        .iter()
        .zip(subsets)
        .filter(|(&cluster, &subset)| cluster != majority[subset as usize % 3])
        .count() as u32
}

/// Returns the ids of the first `partition_count` partitions with
/// `subset_count` subsets, best match first.
///
/// Partitions with the same number of disagreeing pixels keep their table
/// order.
pub(crate) fn rank_partitions(
    clusters: &ClusterMap,
    subset_count: u8,
    partition_count: u8,
) -> Vec<u8> {
    let mut ranked: Vec<(u32, u8)> = (0..partition_count)
        .map(|p| (disagreement(clusters, &subset_map(subset_count, p)), p))
        .collect();
    ranked.sort_by_key(|&(error, _)| error);
    ranked.into_iter().map(|(_, p)| p).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_colors(partition: u8) -> [Vec4; 16] {
        let subsets = subset_map(2, partition);
        subsets.map(|s| {
            if s == 0 {
                Vec4::new(0.9, 0.1, 0.2, 1.0)
            } else {
                Vec4::new(0.1, 0.7, 0.8, 1.0)
            }
        })
    }

    #[test]
    fn finds_a_two_color_split() {
        for partition in [0, 13, 34, 63] {
            let points = two_colors(partition);
            let clusters = cluster_pixels(&points, 2, 10, 0.01);
            assert_eq!(clusters.count, 2);
            assert_eq!(clusters.ids, subset_map(2, partition));

            let ranked = rank_partitions(&clusters, 2, 64);
            assert_eq!(ranked[0], partition);
            assert_eq!(ranked.len(), 64);
        }
    }

    #[test]
    fn solid_block_has_one_cluster() {
        let points = [Vec4::splat(0.5); 16];
        let clusters = cluster_pixels(&points, 3, 10, 0.01);
        assert_eq!(clusters.count, 1);
        assert_eq!(clusters.ids, [0; 16]);

        // all partitions are equally good, so the table order is kept
        let ranked = rank_partitions(&clusters, 3, 64);
        assert_eq!(ranked, (0..64).collect::<Vec<u8>>());
    }

    #[test]
    fn equal_values_are_not_split() {
        let points = two_colors(13);
        let clusters = cluster_pixels(&points, 3, 10, 0.01);
        assert_eq!(clusters.count, 2);
        assert_eq!(clusters.ids, subset_map(2, 13));
    }

    #[test]
    fn ids_are_dense() {
        let map = ClusterMap::from_raw([2, 2, 0, 5, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 5]);
        assert_eq!(map.count, 3);
        assert_eq!(&map.ids[..4], &[0, 0, 1, 2]);
        assert_eq!(map.ids[15], 2);
    }
}
