use crate::foundation::core::Rgba;

/// Resolution at which [`bezier_algebraic`] stops refining.
pub const BEZIER_EPSILON: f64 = 1.0 / 512.0;

/// Linear interpolation between `a` and `b`.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// Per-channel linear interpolation of two colors.
pub fn clerp(a: Rgba, b: Rgba, t: f64) -> Rgba {
    [
        lerp(a[0], b[0], t),
        lerp(a[1], b[1], t),
        lerp(a[2], b[2], t),
        lerp(a[3], b[3], t),
    ]
}

fn bezier3(a: f64, b: f64, c: f64, t: f64) -> f64 {
    lerp(lerp(a, b, t), lerp(b, c, t), t)
}

fn bezier4(a: f64, b: f64, c: f64, d: f64, t: f64) -> f64 {
    lerp(bezier3(a, b, c, t), bezier3(b, c, d, t), t)
}

/// Cubic Bézier from `(0,0)` to `(1,1)` with control points `(x2,y2)` and `(x3,y3)`,
/// evaluated at parameter `t`.
pub fn bezier(x2: f64, y2: f64, x3: f64, y3: f64, t: f64) -> [f64; 2] {
    [bezier4(0.0, x2, x3, 1.0, t), bezier4(0.0, y2, y3, 1.0, t)]
}

/// Find the parameter `t` whose curve x-coordinate is closest to `x`.
///
/// Hill-climbs from `t = 0.5` with a halving step, so it tolerates non-monotonic
/// curves at roughly `1/512` resolution.
pub fn bezier_algebraic(x2: f64, y2: f64, x3: f64, y3: f64, x: f64) -> f64 {
    let curve_x = |t: f64| bezier(x2, y2, x3, y3, t)[0];

    let mut t = 0.5;
    let mut step = 0.5;
    while step > BEZIER_EPSILON {
        let t_plus = (t + step).min(1.0);
        let t_minus = (t - step).max(0.0);
        let d = (curve_x(t) - x).abs();
        let d_plus = (curve_x(t_plus) - x).abs();
        let d_minus = (curve_x(t_minus) - x).abs();
        if d_plus < d_minus && d_plus < d {
            t = t_plus;
        } else if d_minus < d_plus && d_minus < d {
            t = t_minus;
        }
        step /= 2.0;
    }
    t
}

/// Curve point whose x-coordinate approximates `x`.
pub fn bezier_by_x(x1: f64, y1: f64, x2: f64, y2: f64, x: f64) -> [f64; 2] {
    bezier(x1, y1, x2, y2, bezier_algebraic(x1, y1, x2, y2, x))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
