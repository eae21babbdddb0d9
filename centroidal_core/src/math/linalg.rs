// centroidal_core/src/math/linalg.rs

use nalgebra::{Cholesky, DMatrix, Dyn};

/// Replaces `m` by `½ (m + mᵀ)`.
pub fn symmetrize(m: &mut DMatrix<f64>) {
    let transposed = m.transpose();
    *m += transposed;
    *m *= 0.5;
}

/// True when no entry is NaN or infinite.
pub fn all_finite(m: &DMatrix<f64>) -> bool {
    m.iter().all(|v| v.is_finite())
}

/// Cholesky factor of a symmetric matrix, `None` unless it is positive definite
/// with a finite factor.
pub fn spd_factor(m: DMatrix<f64>) -> Option<Cholesky<f64, Dyn>> {
    if !all_finite(&m) {
        return None;
    }
    let chol = Cholesky::new(m)?;
    let diag_ok = chol.l_dirty().diagonal().iter().all(|d| d.is_finite() && *d > 0.0);
    diag_ok.then_some(chol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_spd_factor_rejects_singular_and_indefinite() {
        let mut singular = DMatrix::<f64>::identity(3, 3);
        singular[(1, 1)] = 0.0;
        assert!(spd_factor(singular).is_none());

        let mut indefinite = DMatrix::<f64>::identity(3, 3);
        indefinite[(2, 2)] = -1.0;
        assert!(spd_factor(indefinite).is_none());

        assert!(spd_factor(DMatrix::identity(3, 3) * 2.0).is_some());
    }

    #[test]
    fn test_symmetrize() {
        let mut m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 4.0, 3.0]);
        symmetrize(&mut m);
        assert_relative_eq!(m, DMatrix::from_row_slice(2, 2, &[1.0, 3.0, 3.0, 3.0]));
    }
}
