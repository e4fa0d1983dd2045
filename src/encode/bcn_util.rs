use glam::{Vec3A, Vec4};

use crate::block::ScalarBlock;
use crate::decode::scalar_palette;

/// Two endpoints with 3 quantized channels each.
pub(crate) type Endpoints = ([u8; 3], [u8; 3]);

/// The search effort of one quality tier.
///
/// All tiers of a format walk through the same sequence of candidates. A tier
/// only decides how far it walks, so a higher tier never ends up with a worse
/// result than a lower tier.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Strategy {
    /// Whether to also try endpoints along the principal axis of the colors.
    pub use_pca: bool,
    /// The maximum number of variations tried by the hill climber.
    pub max_tries: usize,
    /// The search stops as soon as the error drops below this value.
    pub error_threshold: f32,
    pub patience: Option<Patience>,
}
impl Strategy {
    pub const BOUNDING_BOX: Self = Self {
        use_pca: false,
        max_tries: 0,
        error_threshold: 0.0,
        patience: None,
    };
}

/// Stops the hill climber if it stagnates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Patience {
    /// Patience only applies after this many tries.
    pub min_tries: usize,
    /// The number of consecutive tries without improvement that end the
    /// search.
    pub streak: usize,
}

/// A greedy local search.
///
/// Starting at `start`, the `i`-th try evaluates `vary(best, i)` and keeps it
/// if its error is lower. The sequence of tries only depends on the start and
/// the variations, so two strategies that differ only in their stopping rule
/// follow the same path.
pub(crate) fn hill_climb<S: Copy + PartialEq, R>(
    start: (S, f32, R),
    strategy: &Strategy,
    mut vary: impl FnMut(S, usize) -> S,
    mut evaluate: impl FnMut(S) -> (f32, R),
) -> (S, f32, R) {
    let (mut best, mut best_error, mut best_result) = start;
    let mut since_improvement = 0;

    for i in 0..strategy.max_tries {
        if best_error < strategy.error_threshold {
            break;
        }
        if let Some(patience) = strategy.patience {
            if i >= patience.min_tries && since_improvement > patience.streak {
                break;
            }
        }

        since_improvement += 1;
        let candidate = vary(best, i);
        if candidate == best {
            continue;
        }

        let (error, result) = evaluate(candidate);
        if error < best_error {
            best = candidate;
            best_error = error;
            best_result = result;
            since_improvement = 0;
        }
    }

    (best, best_error, best_result)
}

/// `(channel, endpoint 0 direction, endpoint 1 direction)`
///
/// Green comes first, since it has the largest weight in both error metrics.
#[rustfmt::skip]
const VARIATIONS: [(usize, i8, i8); 24] = [
    (1, 1, 0), (1, -1, 0), (1, 0, 1), (1, 0, -1), (1, 1, 1), (1, -1, -1), (1, 1, -1), (1, -1, 1),
    (0, 1, 0), (0, -1, 0), (0, 0, 1), (0, 0, -1), (0, 1, 1), (0, -1, -1), (0, 1, -1), (0, -1, 1),
    (2, 1, 0), (2, -1, 0), (2, 0, 1), (2, 0, -1), (2, 1, 1), (2, -1, -1), (2, 1, -1), (2, -1, 1),
];
pub(crate) const VARIATION_COUNT: usize = VARIATIONS.len();

/// The `i`-th variation of two quantized endpoints.
///
/// The first round of variations moves single channels by one step, every
/// further round moves them one step further. Channels are clamped to
/// `0..=limits`.
pub(crate) fn vary_endpoints((e0, e1): Endpoints, limits: Endpoints, i: usize) -> Endpoints {
    let (channel, d0, d1) = VARIATIONS[i % VARIATION_COUNT];
    let step = (1 + i / VARIATION_COUNT).min(255) as i32;

    let apply = |value: u8, direction: i8, limit: u8| -> u8 {
        (value as i32 + direction as i32 * step).clamp(0, limit as i32) as u8
    };

    let mut e0 = e0;
    let mut e1 = e1;
    e0[channel] = apply(e0[channel], d0, limits.0[channel]);
    e1[channel] = apply(e1[channel], d1, limits.1[channel]);
    (e0, e1)
}

/// Returns the per-channel `(max, min)` of the colors.
pub(crate) fn bounding_box(colors: &[[u8; 3]]) -> ([u8; 3], [u8; 3]) {
    let mut min = [255_u8; 3];
    let mut max = [0_u8; 3];
    for color in colors {
        for c in 0..3 {
            min[c] = min[c].min(color[c]);
            max[c] = max[c].max(color[c]);
        }
    }
    (max, min)
}

/// Projects the colors onto their principal axis and returns the two extreme
/// points as `(high, low)`.
///
/// `high` is the end the axis points to, which is the end with the larger
/// sum of channels for most inputs.
pub(crate) fn pca_endpoints(colors: &[[u8; 3]]) -> ([u8; 3], [u8; 3]) {
    debug_assert!(!colors.is_empty());

    let points: Vec<Vec3A> = colors
        .iter()
        .map(|&[r, g, b]| Vec3A::new(r as f32, g as f32, b as f32))
        .collect();
    let line = ColorLine3::new(&points);

    let mut min_t = f32::INFINITY;
    let mut max_t = f32::NEG_INFINITY;
    for &p in &points {
        let t = line.project(p);
        min_t = min_t.min(t);
        max_t = max_t.max(t);
    }

    let to_u8 = |v: Vec3A| {
        let v = v.clamp(Vec3A::ZERO, Vec3A::splat(255.0)).round();
        [v.x as u8, v.y as u8, v.z as u8]
    };
    (to_u8(line.at(max_t)), to_u8(line.at(min_t)))
}

/// Finds two color endpoints for a 2-bit index block.
///
/// The search starts at the bounding box of the colors (and the principal
/// axis, if the strategy asks for it) and then hill climbs. `quantize` maps
/// `(high, low)` RGB8 colors to quantized endpoints, `limits` are the maximum
/// values of the quantized channels. `evaluate` returns the error and the
/// encoded result of a pair of quantized endpoints.
pub(crate) fn search_endpoints<R>(
    colors: &[[u8; 3]],
    limits: Endpoints,
    strategy: &Strategy,
    quantize: impl Fn([u8; 3], [u8; 3]) -> Endpoints,
    mut evaluate: impl FnMut(Endpoints) -> (f32, R),
) -> R {
    debug_assert!(!colors.is_empty());

    let (high, low) = bounding_box(colors);
    let start = quantize(high, low);
    let (error, result) = evaluate(start);
    let mut best = (start, error, result);

    if strategy.use_pca {
        let (high, low) = pca_endpoints(colors);
        let start = quantize(high, low);
        let (error, result) = evaluate(start);
        if error < best.1 {
            best = (start, error, result);
        }
    }

    let (_, _, result) = hill_climb(
        best,
        strategy,
        |e, i| vary_endpoints(e, limits, i),
        evaluate,
    );
    result
}

/// The search effort of the scalar (BC4) search.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScalarStrategy {
    /// The largest step size. Each step tries 6 variations.
    pub variations: u8,
    /// The sum of squared errors below which the search stops.
    pub error_threshold: u32,
}

/// Chooses the nearest palette value for every input value.
pub(crate) fn fit_scalar_block(values: &[u8; 16], value0: u8, value1: u8) -> (ScalarBlock, u32) {
    let mut block = ScalarBlock {
        value0,
        value1,
        indexes: [0; 16],
    };
    let palette = scalar_palette(&block);

    let mut total_error = 0;
    for (index, &value) in block.indexes.iter_mut().zip(values) {
        let mut best = 0;
        let mut best_error = u32::MAX;
        for (i, &p) in palette.iter().enumerate() {
            let d = value.abs_diff(p) as u32;
            if d * d < best_error {
                best = i as u8;
                best_error = d * d;
                if d == 0 {
                    break;
                }
            }
        }
        *index = best;
        total_error += best_error;
    }

    (block, total_error)
}

/// Finds the endpoints of a block of one 8-bit channel.
///
/// The extreme values 0 and 255 are exactly representable in the mode with 4
/// interpolated values. If the block contains them, the endpoints are ordered
/// to select that mode, and only the other values determine the endpoints.
pub(crate) fn search_scalar_block(values: &[u8; 16], strategy: &ScalarStrategy) -> ScalarBlock {
    let mut min = 255_u8;
    let mut max = 0_u8;
    let mut has_extremes = false;
    for &v in values {
        if v == 0 || v == 255 {
            has_extremes = true;
        } else {
            min = min.min(v);
            max = max.max(v);
        }
    }

    if has_extremes && min == 255 && max == 0 {
        // nothing but 0 and 255
        return fit_scalar_block(values, 0, 255).0;
    }

    let fit = |high: u8, low: u8| {
        if has_extremes {
            fit_scalar_block(values, low, high)
        } else {
            fit_scalar_block(values, high, low)
        }
    };

    let (mut best, mut best_error) = fit(max, min);
    if best_error == 0 {
        return best;
    }

    for step in 1..=strategy.variations as i32 {
        for (d_max, d_min) in [
            (-step, step),
            (step, -step),
            (0, -step),
            (step, 0),
            (0, step),
            (-step, 0),
        ] {
            let high = (max as i32 + d_max).clamp(0, 255) as u8;
            let low = (min as i32 + d_min).clamp(0, 255) as u8;
            let (block, error) = fit(high, low);
            if error < best_error {
                best = block;
                best_error = error;
                max = high;
                min = low;
            }
        }

        if best_error < strategy.error_threshold {
            break;
        }
    }

    best
}

/// A line through a set of colors along their direction of largest variance.
pub(crate) struct ColorLine3 {
    /// The centroid of the colors
    centroid: Vec3A,
    /// The normalized direction of the line
    d: Vec3A,
}
impl ColorLine3 {
    pub fn new(colors: &[Vec3A]) -> Self {
        debug_assert!(!colors.is_empty());

        let centroid = colors.iter().copied().sum::<Vec3A>() / colors.len() as f32;

        let mut cov = [Vec3A::ZERO; 3];
        for &p in colors {
            let d = p - centroid;
            cov[0] += d * d.x;
            cov[1] += d * d.y;
            cov[2] += d * d.z;
        }

        // power iteration, starting at the largest row of the covariance
        let mut v = cov
            .iter()
            .copied()
            .max_by(|a, b| a.length_squared().total_cmp(&b.length_squared()))
            .unwrap_or(Vec3A::ONE);
        for _ in 0..8 {
            v = Vec3A::new(cov[0].dot(v), cov[1].dot(v), cov[2].dot(v)).normalize_or_zero();
        }
        if v == Vec3A::ZERO {
            // All colors are the same, or the iteration collapsed. Use the
            // color farthest from the centroid.
            let far = colors
                .iter()
                .copied()
                .max_by(|a, b| {
                    let da = (*a - centroid).length_squared();
                    let db = (*b - centroid).length_squared();
                    da.total_cmp(&db)
                })
                .unwrap_or(centroid);
            v = (far - centroid).normalize_or_zero();
        }

        Self { centroid, d: v }
    }

    /// Returns the point along the line at parameter `t`.
    pub fn at(&self, t: f32) -> Vec3A {
        self.centroid + self.d * t
    }
    /// Projects the point onto the line and returns the parameter `t`.
    pub fn project(&self, color: Vec3A) -> f32 {
        (color - self.centroid).dot(self.d)
    }
    pub fn direction(&self) -> Vec3A {
        self.d
    }
}

/// [`ColorLine3`] for RGBA colors.
pub(crate) struct ColorLine4 {
    centroid: Vec4,
    d: Vec4,
}
impl ColorLine4 {
    pub fn new(colors: &[Vec4]) -> Self {
        debug_assert!(!colors.is_empty());

        let centroid = colors.iter().copied().sum::<Vec4>() / colors.len() as f32;

        let mut cov = [Vec4::ZERO; 4];
        for &p in colors {
            let d = p - centroid;
            cov[0] += d * d.x;
            cov[1] += d * d.y;
            cov[2] += d * d.z;
            cov[3] += d * d.w;
        }

        let mut v = cov
            .iter()
            .copied()
            .max_by(|a, b| a.length_squared().total_cmp(&b.length_squared()))
            .unwrap_or(Vec4::ONE);
        for _ in 0..8 {
            v = Vec4::new(cov[0].dot(v), cov[1].dot(v), cov[2].dot(v), cov[3].dot(v))
                .normalize_or_zero();
        }
        if v == Vec4::ZERO {
            let far = colors
                .iter()
                .copied()
                .max_by(|a, b| {
                    let da = (*a - centroid).length_squared();
                    let db = (*b - centroid).length_squared();
                    da.total_cmp(&db)
                })
                .unwrap_or(centroid);
            v = (far - centroid).normalize_or_zero();
        }

        Self { centroid, d: v }
    }

    pub fn at(&self, t: f32) -> Vec4 {
        self.centroid + self.d * t
    }
    pub fn project(&self, color: Vec4) -> f32 {
        (color - self.centroid).dot(self.d)
    }

    /// The two extreme points of the colors along the line as `(low, high)`.
    pub fn extremes(&self, colors: &[Vec4]) -> (Vec4, Vec4) {
        let mut min_t = f32::INFINITY;
        let mut max_t = f32::NEG_INFINITY;
        for &color in colors {
            let t = self.project(color);
            min_t = min_t.min(t);
            max_t = max_t.max(t);
        }
        (self.at(min_t), self.at(max_t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variations_are_bounded() {
        let limits = ([31, 63, 31], [31, 63, 31]);
        let start = ([31, 0, 31], [0, 63, 0]);
        for i in 0..1000 {
            let (e0, e1) = vary_endpoints(start, limits, i);
            for c in 0..3 {
                assert!(e0[c] <= limits.0[c] && e1[c] <= limits.1[c]);
            }
        }
        // the first variation moves green of endpoint 0 up by one
        assert_eq!(
            vary_endpoints(([1, 1, 1], [1, 1, 1]), limits, 0),
            ([1, 2, 1], [1, 1, 1])
        );
        // the second round moves by two
        assert_eq!(
            vary_endpoints(([5, 5, 5], [5, 5, 5]), limits, VARIATION_COUNT + 1),
            ([5, 3, 5], [5, 5, 5])
        );
    }

    #[test]
    fn hill_climb_follows_the_same_path() {
        // minimize |x - 37| with unit steps
        let evaluate = |x: i32| ((x - 37).abs() as f32, x);
        let vary = |x: i32, i: usize| if i % 2 == 0 { x + 1 } else { x - 1 };

        let short = Strategy {
            use_pca: false,
            max_tries: 10,
            error_threshold: 0.0,
            patience: None,
        };
        let long = Strategy {
            max_tries: 100,
            ..short
        };

        let (a, error_a, _) = hill_climb((0, 37.0, 0), &short, vary, evaluate);
        let (b, error_b, _) = hill_climb((0, 37.0, 0), &long, vary, evaluate);
        assert_eq!(a, 5);
        assert_eq!(b, 37);
        assert!(error_b <= error_a);
    }

    #[test]
    fn pca_of_a_gradient() {
        let colors: Vec<[u8; 3]> = (0..16).map(|i| [i * 10, 255 - i * 10, 100]).collect();
        let (high, low) = pca_endpoints(&colors);
        let mut ends = [high, low];
        ends.sort();
        assert_eq!(ends, [[0, 255, 100], [150, 105, 100]]);
    }

    #[test]
    fn pca_with_orthogonal_axis() {
        // the axis (1, -1, 0) is orthogonal to the gray diagonal
        let colors = [[100, 200, 50], [200, 100, 50]];
        let (high, low) = pca_endpoints(&colors);
        let mut ends = [high, low];
        ends.sort();
        assert_eq!(ends, [[100, 200, 50], [200, 100, 50]]);
    }

    #[test]
    fn scalar_extremes() {
        let values = std::array::from_fn(|i| if i % 3 == 0 { 0 } else { 255 });
        let strategy = ScalarStrategy {
            variations: 3,
            error_threshold: 5,
        };
        let block = search_scalar_block(&values, &strategy);
        assert_eq!((block.value0, block.value1), (0, 255));
        assert_eq!(fit_scalar_block(&values, 0, 255).1, 0);
    }

    #[test]
    fn scalar_with_some_extremes() {
        let mut values = [128_u8; 16];
        values[0] = 0;
        values[1] = 255;
        values[2] = 60;
        let strategy = ScalarStrategy {
            variations: 4,
            error_threshold: 5,
        };
        let block = search_scalar_block(&values, &strategy);
        // 0 and 255 are only available in the mode with 4 interpolated values
        assert!(!block.is_8_value());
        let palette = scalar_palette(&block);
        assert_eq!(palette[block.indexes[0] as usize], 0);
        assert_eq!(palette[block.indexes[1] as usize], 255);
    }

    #[test]
    fn scalar_exact() {
        let values = std::array::from_fn(|i| 20 + i as u8);
        let strategy = ScalarStrategy {
            variations: 8,
            error_threshold: 5,
        };
        let block = search_scalar_block(&values, &strategy);
        let palette = scalar_palette(&block);
        assert_eq!(palette[block.indexes[0] as usize], 20);
        assert_eq!(palette[block.indexes[15] as usize], 35);
    }
}
