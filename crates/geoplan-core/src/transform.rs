//! Affine transform helpers for node matrices.
//!
//! Nodes carry a 2x3 matrix `[a, b, c, d, e, f]` which maps directly onto
//! [`kurbo::Affine`]. In documents the matrix is written as
//! `matrix(a b c d e f)`.

use kurbo::{Affine, Point, Vec2};
use std::fmt;
use thiserror::Error;

/// Identity coefficients.
pub const IDENTITY: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Recoverable problem found while reading a transform attribute.
///
/// Never returned to callers of [`parse_transform`]; it is logged and the
/// matrix falls back to identity.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseWarning {
    #[error("transform is not of the form matrix(...): {0:?}")]
    NotAMatrix(String),
    #[error("matrix has {0} coefficients, expected 6")]
    Arity(usize),
    #[error("matrix coefficient is not a finite number: {0:?}")]
    Number(String),
}

/// Parse a `matrix(a b c d e f)` string strictly.
pub fn try_parse_transform(value: &str) -> Result<Affine, ParseWarning> {
    let trimmed = value.trim();
    let inner = trimmed
        .strip_prefix("matrix(")
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| ParseWarning::NotAMatrix(value.to_string()))?;

    let parts: Vec<&str> = inner
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect();
    if parts.len() != 6 {
        return Err(ParseWarning::Arity(parts.len()));
    }

    let mut coeffs = [0.0; 6];
    for (slot, part) in coeffs.iter_mut().zip(&parts) {
        let number: f64 = part
            .parse()
            .map_err(|_| ParseWarning::Number(part.to_string()))?;
        if !number.is_finite() {
            return Err(ParseWarning::Number(part.to_string()));
        }
        *slot = number;
    }
    Ok(Affine::new(coeffs))
}

/// Parse an optional transform attribute, defaulting to identity.
///
/// A missing attribute is silent; a malformed one logs a warning.
pub fn parse_transform(value: Option<&str>) -> Affine {
    match value {
        None => Affine::IDENTITY,
        Some(text) => try_parse_transform(text).unwrap_or_else(|warning| {
            log::warn!("{warning}; using identity");
            Affine::IDENTITY
        }),
    }
}

/// Canonical `matrix(a b c d e f)` form.
pub fn format_transform(matrix: Affine) -> String {
    MatrixDisplay(matrix).to_string()
}

struct MatrixDisplay(Affine);

impl fmt::Display for MatrixDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0.as_coeffs();
        write!(f, "matrix({a} {b} {c} {d} {e} {g})")
    }
}

/// Coefficients of a matrix as an array.
pub fn coefficients(matrix: Affine) -> [f64; 6] {
    matrix.as_coeffs()
}

/// Translation component `(e, f)`.
pub fn translation(matrix: Affine) -> Vec2 {
    matrix.translation()
}

/// Replace the translation component, keeping the linear part.
pub fn with_translation(matrix: Affine, e: f64, f: f64) -> Affine {
    matrix.with_translation(Vec2::new(e, f))
}

/// Rotation angle in radians, from the first column.
pub fn rotation_angle(matrix: Affine) -> f64 {
    let [a, b, ..] = matrix.as_coeffs();
    b.atan2(a)
}

/// Length of the first column; 1 for pure rotations.
pub fn uniform_scale(matrix: Affine) -> f64 {
    let [a, b, ..] = matrix.as_coeffs();
    a.hypot(b)
}

/// Pure rotation matrix aligning the local +x axis with `direction`.
///
/// Scale is not preserved: the linear part is orthonormal afterwards.
/// Returns `None` for a zero-length direction.
pub fn rotation_towards(matrix: Affine, direction: Vec2) -> Option<Affine> {
    let length = direction.hypot();
    if length <= f64::EPSILON || !length.is_finite() {
        return None;
    }
    let (cos, sin) = (direction.x / length, direction.y / length);
    let [.., e, f] = matrix.as_coeffs();
    Some(Affine::new([cos, sin, -sin, cos, e, f]))
}

/// Express `world` in the space of `ancestor`: `inverse(ancestor) * world`.
pub fn relative_to(ancestor: Affine, world: Affine) -> Affine {
    ancestor.inverse() * world
}

/// Rotate a child around its ancestor's frame while compensating for the
/// ancestor: `inverse(ancestor) * child_world * ancestor`.
pub fn conjugate(ancestor: Affine, child_world: Affine) -> Affine {
    ancestor.inverse() * child_world * ancestor
}

/// Apply the linear part only (no translation) to a vector.
pub fn apply_linear(matrix: Affine, v: Vec2) -> Vec2 {
    let [a, b, c, d, ..] = matrix.as_coeffs();
    Vec2::new(a * v.x + c * v.y, b * v.x + d * v.y)
}

/// Inverse-apply the linear part to a vector.
pub fn apply_linear_inverse(matrix: Affine, v: Vec2) -> Vec2 {
    let inverse = matrix.inverse();
    apply_linear(inverse, v)
}

/// Map a point through the inverse of `matrix`.
pub fn untransform_point(matrix: Affine, point: Point) -> Point {
    matrix.inverse() * point
}

/// Whether two matrices are equal within `tolerance` per coefficient.
pub fn approx_eq(lhs: Affine, rhs: Affine, tolerance: f64) -> bool {
    lhs.as_coeffs()
        .iter()
        .zip(rhs.as_coeffs().iter())
        .all(|(l, r)| (l - r).abs() <= tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_parse_space_separated() {
        let m = try_parse_transform("matrix(1 0 0 1 10 20)").unwrap();
        assert_eq!(m.as_coeffs(), [1.0, 0.0, 0.0, 1.0, 10.0, 20.0]);
    }

    #[test]
    fn test_parse_comma_separated() {
        let m = try_parse_transform("matrix(0.5,0.1, -0.1,0.5, 3,4)").unwrap();
        assert_eq!(m.as_coeffs(), [0.5, 0.1, -0.1, 0.5, 3.0, 4.0]);
    }

    #[test]
    fn test_missing_is_identity() {
        assert_eq!(parse_transform(None), Affine::IDENTITY);
    }

    #[test]
    fn test_malformed_is_identity() {
        assert_eq!(parse_transform(Some("translate(3,4)")), Affine::IDENTITY);
        assert_eq!(parse_transform(Some("matrix(1 0 0 1 2)")), Affine::IDENTITY);
        assert_eq!(parse_transform(Some("matrix(1 0 0 1 x 2)")), Affine::IDENTITY);
        assert!(matches!(
            try_parse_transform("matrix(1 0 0 1 2)"),
            Err(ParseWarning::Arity(5))
        ));
    }

    #[test]
    fn test_format_parse_round_trip() {
        let samples = [
            [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            [0.7071067811865476, 0.7071067811865475, -0.7071067811865475, 0.7071067811865476, 12.25, -3.5],
            [2.0, 0.0, 0.0, 3.0, 1e-7, 683253.125],
        ];
        for coeffs in samples {
            let m = Affine::new(coeffs);
            let back = parse_transform(Some(&format_transform(m)));
            assert!(approx_eq(m, back, 1e-12), "{coeffs:?}");
        }
    }

    #[test]
    fn test_rotation_towards_is_orthonormal() {
        let scaled = Affine::new([3.0, 0.0, 0.0, 3.0, 5.0, 6.0]);
        let rotated = rotation_towards(scaled, Vec2::new(0.0, 2.0)).unwrap();
        assert!((rotation_angle(rotated) - FRAC_PI_2).abs() < 1e-12);
        // Uniform scale is reset to 1 by a rotation.
        assert!((uniform_scale(rotated) - 1.0).abs() < 1e-12);
        assert_eq!(translation(rotated), Vec2::new(5.0, 6.0));
    }

    #[test]
    fn test_rotation_towards_zero_vector() {
        assert!(rotation_towards(Affine::IDENTITY, Vec2::ZERO).is_none());
    }

    #[test]
    fn test_relative_to_composes_back() {
        let container = Affine::translate((100.0, 50.0)) * Affine::rotate(0.3);
        let member = Affine::translate((120.0, 40.0)) * Affine::rotate(-0.2);
        let relative = relative_to(container, member);
        assert!(approx_eq(container * relative, member, 1e-9));
    }

    #[test]
    fn test_conjugate_identity_ancestor() {
        let child = Affine::rotate(0.5);
        assert!(approx_eq(conjugate(Affine::IDENTITY, child), child, 1e-12));
    }

    #[test]
    fn test_apply_linear_ignores_translation() {
        let m = Affine::new([0.0, 1.0, -1.0, 0.0, 100.0, 100.0]);
        let v = apply_linear(m, Vec2::new(1.0, 0.0));
        assert!((v.x - 0.0).abs() < f64::EPSILON);
        assert!((v.y - 1.0).abs() < f64::EPSILON);
        let back = apply_linear_inverse(m, v);
        assert!((back.x - 1.0).abs() < 1e-12);
        assert!(back.y.abs() < 1e-12);
    }
}
