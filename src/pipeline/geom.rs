//! Small 3-vector helpers shared by the geometry stages.

pub type Vec3 = [f64; 3];

#[inline]
pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn scale(v: Vec3, s: f64) -> Vec3 {
    [v[0] * s, v[1] * s, v[2] * s]
}

#[inline]
pub fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub fn norm(v: Vec3) -> f64 {
    dot(v, v).sqrt()
}

/// Unit vector, or `None` for a near-zero input.
pub fn normalize(v: Vec3) -> Option<Vec3> {
    let n = norm(v);
    if n < 1e-9 {
        None
    } else {
        Some(scale(v, 1.0 / n))
    }
}

/// Some unit vector perpendicular to `v` (assumed non-zero).
pub fn any_perpendicular(v: Vec3) -> Vec3 {
    let trial = if v[0].abs() < 0.9 {
        [1.0, 0.0, 0.0]
    } else {
        [0.0, 1.0, 0.0]
    };
    normalize(cross(v, trial)).unwrap_or([0.0, 0.0, 1.0])
}

/// Rodrigues rotation of `v` around the unit axis `k`.
pub fn rotate_about_axis(v: Vec3, k: Vec3, angle: f64) -> Vec3 {
    let (sin_a, cos_a) = angle.sin_cos();
    let kv = cross(k, v);
    let kdv = dot(k, v);
    [
        v[0] * cos_a + kv[0] * sin_a + k[0] * kdv * (1.0 - cos_a),
        v[1] * cos_a + kv[1] * sin_a + k[1] * kdv * (1.0 - cos_a),
        v[2] * cos_a + kv[2] * sin_a + k[2] * kdv * (1.0 - cos_a),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_rejects_zero() {
        assert!(normalize([0.0, 0.0, 0.0]).is_none());
        let u = normalize([3.0, 4.0, 0.0]).unwrap();
        assert!((norm(u) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn perpendicular_is_orthogonal() {
        for v in [[1.0, 0.0, 0.0], [0.95, 0.1, 0.2], [0.0, 0.0, 2.0]] {
            let p = any_perpendicular(v);
            assert!(dot(v, p).abs() < 1e-9);
            assert!((norm(p) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn rotation_preserves_length_and_quarter_turn() {
        let v = [1.0, 0.0, 0.0];
        let rotated = rotate_about_axis(v, [0.0, 0.0, 1.0], std::f64::consts::FRAC_PI_2);
        assert!((rotated[0]).abs() < 1e-12);
        assert!((rotated[1] - 1.0).abs() < 1e-12);
    }
}
