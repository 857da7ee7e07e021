//! Harmonic-entropy field generation for 4-note chords.
//!
//! The pipeline: a bounded search enumerates group-coprime integer frequency
//! quadruples (i, j, k, l), each contributing mass w = 1/√(i·j·k·l) at its
//! point in the 3-D space of consecutive interval sizes. The accumulated
//! volume is smoothed with an isotropic Gaussian and condensed into a
//! Rényi-style entropy estimate per cell; low raw entropy marks regions
//! crowded with simple ratios, i.e. perceptually consonant chords. The field
//! is inverted before returning so that *high* values mean consonant, and
//! masked to the tetrahedron of chords that fit inside one equave.

use ndarray::{s, Array3, Zip};
use num_rational::Ratio;

#[cfg(not(target_family = "wasm"))]
use rayon::prelude::*;

use crate::ratio::{fold_gcd, ratio_f64};
use crate::utils::cents;

/// Tunables of the field generator.
///
/// Exposed as fields rather than hidden constants so callers (and tests) can
/// probe small search bounds and resolutions cheaply. The defaults produce a
/// dense data cloud for equaves around 2/1.
#[derive(Debug, Clone, Copy)]
pub struct FieldParams {
    /// Exclusive upper bound on the lowest voice of a quadruple.
    pub n_limit: i64,
    /// Cutoff on the raw integer product i·j·k·l.
    pub c_limit: i64,
    /// Order of the entropy estimator.
    pub alpha: i32,
    /// Standard deviation of the Gaussian smoothing kernel, in grid cells.
    pub sigma: f64,
    /// Guard added to both numerator and denominator of the entropy
    /// quotient so empty neighborhoods divide and log cleanly.
    pub epsilon: f64,
}

impl Default for FieldParams {
    fn default() -> Self {
        FieldParams {
            n_limit: 60,
            c_limit: 2_000_000,
            alpha: 7,
            sigma: 2.0,
            epsilon: 1e-16,
        }
    }
}

/// Output of [`entropy_field`]: three coordinate grids and the masked
/// entropy volume, all of shape resolution³.
///
/// The coordinate grids are in logical (c1, c2, c3) axis order — `c1` varies
/// along its first axis. The entropy volume is in the internal (c3, c2, c1)
/// storage order: `entropy[[z, y, x]]` sits at interval coordinates
/// (axis[x], axis[y], axis[z]). Masked cells are NaN.
#[derive(Debug, Clone)]
pub struct EntropyField {
    pub c1: Array3<f64>,
    pub c2: Array3<f64>,
    pub c3: Array3<f64>,
    pub entropy: Array3<f64>,
}

/// Generates the harmonic-entropy field for 4-note chords within `equave`.
///
/// Returns `None` when the bounded search finds no quadruples (or
/// `resolution` is 0) — "no data" is a normal outcome, not an error.
pub fn entropy_field(
    equave: Ratio<i64>,
    resolution: usize,
    params: &FieldParams,
) -> Option<EntropyField> {
    if resolution == 0 {
        return None;
    }

    let equave_f = ratio_f64(equave);
    let quads = bounded_quadruples(equave_f, params);
    if quads.is_empty() {
        return None;
    }

    let max_cents = cents(equave_f);
    let (mass, mass_alpha) = scatter_volumes(&quads, max_cents, resolution, params.alpha);

    let kernel = gaussian_kernel_3d(params.sigma);
    let kernel_alpha = kernel.mapv(|v| v.powi(params.alpha));
    let smoothed = convolve_same(&mass, &kernel);
    let smoothed_alpha = convolve_same(&mass_alpha, &kernel_alpha);

    // Rényi-style entropy of the locally accumulated weight distribution.
    let eps = params.epsilon;
    let scale = 1.0 / (1.0 - params.alpha as f64);
    let mut entropy = Array3::zeros(mass.raw_dim());
    Zip::from(&mut entropy)
        .and(&smoothed)
        .and(&smoothed_alpha)
        .for_each(|e, &m, &ma| {
            let v = scale * ((eps + ma) / (eps + m.powi(params.alpha))).ln();
            // Non-finite cells carry no information; zero them before the
            // global inversion.
            *e = if v.is_finite() { v } else { 0.0 };
        });

    // Flip the field so high output values mark consonant regions.
    let max_entropy = entropy.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
    entropy.mapv_inplace(|v| max_entropy - v);

    let axis = linspace(max_cents, resolution);

    // A cell is valid only when its three interval coordinates fit in one
    // equave span AND raw weight actually landed in it — smoothing alone must
    // not conjure support in empty regions. The tetrahedron predicate is
    // symmetric under the logical→storage axis transposition, so it is
    // evaluated directly in (z, y, x) order.
    Zip::indexed(&mut entropy)
        .and(&mass)
        .for_each(|(z, y, x), e, &raw| {
            if axis[z] + axis[y] + axis[x] > max_cents || raw == 0.0 {
                *e = f64::NAN;
            }
        });

    let shape = (resolution, resolution, resolution);
    let c1 = Array3::from_shape_fn(shape, |(a, _, _)| axis[a]);
    let c2 = Array3::from_shape_fn(shape, |(_, b, _)| axis[b]);
    let c3 = Array3::from_shape_fn(shape, |(_, _, c)| axis[c]);

    Some(EntropyField {
        c1,
        c2,
        c3,
        entropy,
    })
}

/// All group-coprime ascending quadruples (i, j, k, l) with `i < n_limit`,
/// every voice within one equave of its predecessor, and raw product
/// i·j·k·l ≤ `c_limit`.
///
/// Each axis' upper bound is the tighter of the equave bound and the integer
/// root of the remaining product budget (cube root for j, square root for k,
/// plain division for l). Since the later voices are at least as large as
/// the current one, an axis whose derived bound falls below its lower bound
/// prunes the whole subtree — this is what keeps the search tractable.
pub fn bounded_quadruples(equave: f64, params: &FieldParams) -> Vec<[i64; 4]> {
    #[cfg(not(target_family = "wasm"))]
    {
        return (1..params.n_limit)
            .into_par_iter()
            .flat_map_iter(|i| quadruples_above(i, equave, params))
            .collect();
    }
    #[cfg(target_family = "wasm")]
    {
        return (1..params.n_limit)
            .flat_map(|i| quadruples_above(i, equave, params))
            .collect();
    }
}

/// Accepted quadruples with bass voice `i`.
fn quadruples_above(i: i64, equave: f64, params: &FieldParams) -> Vec<[i64; 4]> {
    let c_limit = params.c_limit;
    let mut quads = vec![];

    let j_hi = ((i as f64 * equave).floor() as i64).min(floor_root(c_limit / i, 3));
    for j in i..=j_hi {
        let k_hi = ((j as f64 * equave).floor() as i64).min(floor_root(c_limit / (i * j), 2));
        for k in j..=k_hi {
            let l_hi = ((k as f64 * equave).floor() as i64).min(c_limit / (i * j * k));
            for l in k..=l_hi {
                if fold_gcd(&[i, j, k, l]) == 1 {
                    quads.push([i, j, k, l]);
                }
            }
        }
    }
    quads
}

/// Floor of the k-th root of `n`, exact (float seed + integer correction).
fn floor_root(n: i64, k: u32) -> i64 {
    if n <= 0 {
        return 0;
    }
    let mut r = (n as f64).powf(1.0 / k as f64) as i64;
    while (r + 1).checked_pow(k).is_some_and(|p| p <= n) {
        r += 1;
    }
    while r > 0 && r.pow(k) > n {
        r -= 1;
    }
    r
}

/// Roughness-discount weight of one quadruple: simpler chords weigh more.
fn weight(q: &[i64; 4]) -> f64 {
    1.0 / ((q[0] * q[1] * q[2] * q[3]) as f64).sqrt()
}

/// Scatter-accumulates w and w^alpha into two resolution³ volumes, indexed
/// in (c3, c2, c1) storage order.
///
/// Cell indices come from rounding (ties to even, matching the usual array
/// rounding convention) the cents coordinates scaled into [0, resolution−1];
/// a quadruple whose index escapes the grid on any axis is discarded.
/// Accumulation sums — distinct quadruples frequently share a cell.
fn scatter_volumes(
    quads: &[[i64; 4]],
    max_cents: f64,
    resolution: usize,
    alpha: i32,
) -> (Array3<f64>, Array3<f64>) {
    let shape = (resolution, resolution, resolution);
    let mut mass = Array3::zeros(shape);
    let mut mass_alpha = Array3::zeros(shape);

    let scale = (resolution - 1) as f64 / max_cents;
    let hi = resolution as i64;
    for q in quads {
        let [i, j, k, l] = *q;
        let x = (cents(j as f64 / i as f64) * scale).round_ties_even() as i64;
        let y = (cents(k as f64 / j as f64) * scale).round_ties_even() as i64;
        let z = (cents(l as f64 / k as f64) * scale).round_ties_even() as i64;
        if x < 0 || x >= hi || y < 0 || y >= hi || z < 0 || z >= hi {
            continue;
        }

        let w = weight(q);
        let cell = [z as usize, y as usize, x as usize];
        mass[cell] += w;
        mass_alpha[cell] += w.powi(alpha);
    }
    (mass, mass_alpha)
}

/// Isotropic 3-D Gaussian over integer offsets, half-width round(2σ) per
/// axis, peak 1 at the center.
fn gaussian_kernel_3d(sigma: f64) -> Array3<f64> {
    let half = (sigma * 2.0).round() as isize;
    let size = (2 * half + 1) as usize;
    let mut kernel = Array3::zeros((size, size, size));
    for ((zi, yi, xi), v) in kernel.indexed_iter_mut() {
        let x = (xi as isize - half) as f64;
        let y = (yi as isize - half) as f64;
        let z = (zi as isize - half) as f64;
        *v = (-(x * x + y * y + z * z) / (2.0 * sigma * sigma)).exp();
    }
    kernel
}

/// Same-size, zero-padded convolution of `vol` with a centrosymmetric
/// kernel.
///
/// One bulk shifted multiply-add over whole array views per kernel tap — no
/// per-cell inner loop. Correlation and convolution coincide for the
/// symmetric kernels used here.
fn convolve_same(vol: &Array3<f64>, kernel: &Array3<f64>) -> Array3<f64> {
    let (n0, n1, n2) = vol.dim();
    let (k0, k1, k2) = kernel.dim();
    let (c0, c1, c2) = (k0 as isize / 2, k1 as isize / 2, k2 as isize / 2);

    let mut out = Array3::zeros(vol.raw_dim());
    for ((t0, t1, t2), &kv) in kernel.indexed_iter() {
        if kv == 0.0 {
            continue;
        }
        let (Some((o0, i0)), Some((o1, i1)), Some((o2, i2))) = (
            shifted_range(n0, t0 as isize - c0),
            shifted_range(n1, t1 as isize - c1),
            shifted_range(n2, t2 as isize - c2),
        ) else {
            continue;
        };

        let src = vol.slice(s![i0.start..i0.end, i1.start..i1.end, i2.start..i2.end]);
        let mut dst = out.slice_mut(s![o0.start..o0.end, o1.start..o1.end, o2.start..o2.end]);
        Zip::from(&mut dst).and(&src).for_each(|o, &v| *o += kv * v);
    }
    out
}

/// Overlapping (output, input) index ranges under shift `d`, if any:
/// out[p] += k·vol[p + d] for p in the returned output range.
fn shifted_range(n: usize, d: isize) -> Option<(std::ops::Range<usize>, std::ops::Range<usize>)> {
    let n = n as isize;
    let start = (-d).max(0);
    let end = n - d.max(0);
    if end <= start {
        return None;
    }
    Some((
        start as usize..end as usize,
        (start + d) as usize..(end + d) as usize,
    ))
}

/// `resolution` evenly spaced samples over [0, max_cents].
fn linspace(max_cents: f64, resolution: usize) -> Vec<f64> {
    if resolution == 1 {
        return vec![0.0];
    }
    let step = max_cents / (resolution - 1) as f64;
    (0..resolution).map(|i| i as f64 * step).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Shrunk search bounds keep the tests fast without changing behavior.
    fn small_params() -> FieldParams {
        FieldParams {
            n_limit: 10,
            c_limit: 10_000,
            ..FieldParams::default()
        }
    }

    #[test]
    fn search_respects_all_bounds() {
        let params = small_params();
        let quads = bounded_quadruples(2.0, &params);
        assert!(!quads.is_empty());
        for q in &quads {
            let [i, j, k, l] = *q;
            assert!(i < params.n_limit);
            assert!(i <= j && j <= k && k <= l);
            assert!(i * j * k * l <= params.c_limit, "{:?}", q);
            assert_eq!(fold_gcd(q), 1, "{:?}", q);
            assert!(j <= 2 * i && k <= 2 * j && l <= 2 * k, "{:?}", q);
        }
    }

    #[test]
    fn pruned_search_equals_exhaustive_search() {
        let params = small_params();
        let pruned = bounded_quadruples(2.0, &params);

        let mut exhaustive = vec![];
        for i in 1..params.n_limit {
            for j in i..=(2 * i) {
                for k in j..=(2 * j) {
                    for l in k..=(2 * k) {
                        if i * j * k * l <= params.c_limit && fold_gcd(&[i, j, k, l]) == 1 {
                            exhaustive.push([i, j, k, l]);
                        }
                    }
                }
            }
        }
        assert_eq!(pruned, exhaustive);
    }

    #[test]
    fn weight_strictly_decreases_with_product() {
        let mut quads = bounded_quadruples(2.0, &small_params());
        quads.sort_by_key(|q| q[0] * q[1] * q[2] * q[3]);
        for pair in quads.windows(2) {
            let (p1, p2) = (
                pair[0].iter().product::<i64>(),
                pair[1].iter().product::<i64>(),
            );
            let (w1, w2) = (weight(&pair[0]), weight(&pair[1]));
            assert!(w1 > 0.0 && w2 > 0.0);
            if p1 < p2 {
                assert!(w1 > w2, "{:?} vs {:?}", pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn floor_root_is_exact() {
        for n in 0..2000i64 {
            for k in [2, 3] {
                let r = floor_root(n, k);
                assert!(r.pow(k) <= n.max(0));
                assert!((r + 1).pow(k) > n);
            }
        }
        assert_eq!(floor_root(1_000_000, 3), 100);
        assert_eq!(floor_root(999_999, 3), 99);
    }

    #[test]
    fn kernel_is_symmetric_with_unit_peak() {
        let kernel = gaussian_kernel_3d(2.0);
        assert_eq!(kernel.dim(), (9, 9, 9));
        assert_eq!(kernel[[4, 4, 4]], 1.0);
        for ((z, y, x), &v) in kernel.indexed_iter() {
            assert_eq!(v, kernel[[8 - z, 8 - y, 8 - x]]);
            assert!(v > 0.0 && v <= 1.0);
        }
    }

    #[test]
    fn convolution_of_impulse_reproduces_kernel() {
        let kernel = gaussian_kernel_3d(1.0);
        let mut vol = Array3::zeros((7, 7, 7));
        vol[[3, 3, 3]] = 1.0;
        let out = convolve_same(&vol, &kernel);

        let kernel_sum: f64 = kernel.sum();
        assert!((out.sum() - kernel_sum).abs() < 1e-12);
        // half-width 2: kernel tap (t0,t1,t2) lands at 3 + (t - 2)
        for ((t0, t1, t2), &kv) in kernel.indexed_iter() {
            assert!((out[[t0 + 1, t1 + 1, t2 + 1]] - kv).abs() < 1e-12);
        }
    }

    #[test]
    fn convolution_zero_pads_at_boundaries() {
        let kernel = gaussian_kernel_3d(1.0);
        let mut vol = Array3::zeros((5, 5, 5));
        vol[[0, 0, 0]] = 1.0;
        let out = convolve_same(&vol, &kernel);
        // Mass beyond the boundary is dropped, not wrapped.
        assert!(out.sum() < kernel.sum());
        assert!((out[[0, 0, 0]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn field_generation_is_deterministic() {
        let params = small_params();
        let equave = Ratio::from_integer(2);
        let first = entropy_field(equave, 17, &params).unwrap();
        let second = entropy_field(equave, 17, &params).unwrap();
        for (a, b) in first.entropy.iter().zip(second.entropy.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
        for (a, b) in first.c1.iter().zip(second.c1.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn masking_invariants_hold() {
        let params = small_params();
        let equave = Ratio::from_integer(2);
        let resolution = 9;
        let field = entropy_field(equave, resolution, &params).unwrap();

        let max_cents = cents(2.0);
        let axis = linspace(max_cents, resolution);
        let quads = bounded_quadruples(2.0, &params);
        let (mass, _) = scatter_volumes(&quads, max_cents, resolution, params.alpha);

        let mut supported = 0;
        for ((z, y, x), &e) in field.entropy.indexed_iter() {
            if axis[z] + axis[y] + axis[x] > max_cents {
                assert!(e.is_nan(), "cell ({z},{y},{x}) outside tetrahedron");
            }
            if mass[[z, y, x]] == 0.0 {
                assert!(e.is_nan(), "cell ({z},{y},{x}) has no raw support");
            } else if axis[z] + axis[y] + axis[x] <= max_cents {
                assert!(e.is_finite());
                supported += 1;
            }
        }
        assert!(supported > 0);
    }

    #[test]
    fn coordinate_grids_span_the_axes() {
        let field = entropy_field(Ratio::from_integer(2), 5, &small_params()).unwrap();
        let max_cents = cents(2.0);
        assert_eq!(field.c1[[0, 3, 1]], 0.0);
        assert!((field.c1[[4, 0, 0]] - max_cents).abs() < 1e-9);
        assert!((field.c2[[2, 4, 0]] - max_cents).abs() < 1e-9);
        assert!((field.c3[[0, 1, 4]] - max_cents).abs() < 1e-9);
        // c1 is constant along the other two axes.
        assert_eq!(field.c1[[2, 0, 0]], field.c1[[2, 4, 4]]);
    }

    #[test]
    fn resolution_one_collapses_all_mass_into_one_cell() {
        let params = small_params();
        let quads = bounded_quadruples(2.0, &params);
        let (mass, _) = scatter_volumes(&quads, cents(2.0), 1, params.alpha);
        let total: f64 = quads.iter().map(weight).sum();
        assert_eq!(mass.dim(), (1, 1, 1));
        assert!((mass[[0, 0, 0]] - total).abs() < 1e-9);

        let field = entropy_field(Ratio::from_integer(2), 1, &params).unwrap();
        assert_eq!(field.entropy.dim(), (1, 1, 1));
        assert!(field.entropy[[0, 0, 0]].is_finite());
    }

    /// Full production search bounds at a realistic resolution. Slow in
    /// debug builds, but it exercises the parameter set the UI actually
    /// requests.
    #[test]
    fn default_bounds_produce_a_dense_field() {
        let field = entropy_field(Ratio::from_integer(2), 33, &FieldParams::default()).unwrap();
        assert_eq!(field.entropy.dim(), (33, 33, 33));
        let supported = field.entropy.iter().filter(|v| v.is_finite()).count();
        assert!(supported > 1000, "expected a dense cloud, got {supported} cells");
        // The origin cell holds the unison chord 1:1:1:1 and is always
        // supported.
        assert!(field.entropy[[0, 0, 0]].is_finite());
    }

    #[test]
    fn empty_search_yields_no_field() {
        let params = FieldParams {
            c_limit: 0,
            ..small_params()
        };
        assert!(entropy_field(Ratio::from_integer(2), 9, &params).is_none());
        assert!(entropy_field(Ratio::from_integer(2), 0, &small_params()).is_none());
    }
}
