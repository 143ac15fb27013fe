//! Linear interpolation over a strictly increasing axis.

/// Linear interpolant over (`xs`, `ys`). Returns `None` outside `[xs[0],
/// xs[last]]` so callers can apply their own out-of-range policy.
pub(crate) fn interpolate(xs: &[f64], ys: &[f64], x: f64) -> Option<f64> {
    debug_assert_eq!(xs.len(), ys.len());
    let n = xs.len();
    if n == 0 || x < xs[0] || x > xs[n - 1] {
        return None;
    }
    if n == 1 {
        return Some(ys[0]);
    }
    // Index of the first axis point >= x.
    let hi = xs.partition_point(|&v| v < x);
    if hi == 0 {
        return Some(ys[0]);
    }
    let lo = hi - 1;
    if xs[hi.min(n - 1)] == x {
        return Some(ys[hi.min(n - 1)]);
    }
    let t = (x - xs[lo]) / (xs[hi] - xs[lo]);
    Some(ys[lo] + t * (ys[hi] - ys[lo]))
}

/// Whether `x` lies inside the closed range covered by `xs`.
pub(crate) fn covers(xs: &[f64], x: f64) -> bool {
    !xs.is_empty() && x >= xs[0] && x <= xs[xs.len() - 1]
}
