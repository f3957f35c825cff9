//! Least-squares polynomial fitting over a numeric index.

use crate::error::{ForecastError, Result};

/// Fit a polynomial of the given degree by ordinary least squares.
///
/// Returns coefficients in ascending order of power:
/// `y ~= c[0] + c[1]*x + c[2]*x^2 + ...`
///
/// Solves the normal equations by Gaussian elimination with partial
/// pivoting; an effectively singular system is a `ComputationError`.
pub fn polyfit(x: &[f64], y: &[f64], degree: usize) -> Result<Vec<f64>> {
    if x.len() != y.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: x.len(),
            got: y.len(),
        });
    }
    if x.len() < degree + 1 {
        return Err(ForecastError::InsufficientData {
            needed: degree + 1,
            got: x.len(),
        });
    }

    let m = degree + 1;

    // Normal equations: (X'X) c = X'y with X the Vandermonde matrix.
    let mut a = vec![vec![0.0; m]; m];
    let mut b = vec![0.0; m];
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let mut xp = 1.0;
        let mut powers = Vec::with_capacity(2 * m - 1);
        for _ in 0..2 * m - 1 {
            powers.push(xp);
            xp *= xi;
        }
        for i in 0..m {
            b[i] += yi * powers[i];
            for j in 0..m {
                a[i][j] += powers[i + j];
            }
        }
    }

    solve_linear_system(&mut a, &mut b)?;
    Ok(b)
}

/// Evaluate a polynomial (ascending coefficients) at `x` by Horner's rule.
pub fn polyval(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// In-place Gaussian elimination with partial pivoting. On success `b`
/// holds the solution vector.
fn solve_linear_system(a: &mut [Vec<f64>], b: &mut [f64]) -> Result<()> {
    let n = b.len();

    for col in 0..n {
        // Pivot on the largest remaining entry in this column.
        let mut pivot_row = col;
        for row in col + 1..n {
            if a[row][col].abs() > a[pivot_row][col].abs() {
                pivot_row = row;
            }
        }
        if a[pivot_row][col].abs() < 1e-12 {
            return Err(ForecastError::ComputationError(
                "singular normal equations".to_string(),
            ));
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    // Back substitution.
    for col in (0..n).rev() {
        let mut sum = b[col];
        for k in col + 1..n {
            sum -= a[col][k] * b[k];
        }
        b[col] = sum / a[col][col];
    }

    Ok(())
}
