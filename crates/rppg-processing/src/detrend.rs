//! Polynomial baseline removal
//!
//! Slow lighting and motion drift sits far below the heart-rate band. A
//! low-order least-squares polynomial fit over the window captures that
//! baseline; subtracting it leaves the pulsatile component untouched.

/// Least-squares polynomial detrender
///
/// Fits a polynomial of the configured degree (1 to 3) against the sample
/// index and subtracts the fit. Output length always equals input length.
#[derive(Debug, Clone)]
pub struct Detrender {
    degree: usize,
}

impl Detrender {
    /// `degree` is validated by [`crate::config::PulseConfig`]
    pub fn new(degree: usize) -> Self {
        Self { degree }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Remove the fitted baseline from `window`.
    ///
    /// Windows too short to fit the polynomial, and pathological windows
    /// where the normal equations go singular, fall back to plain mean
    /// subtraction; a constant window therefore comes back all zero with no
    /// division error.
    pub fn detrend(&self, window: &[f32]) -> Vec<f32> {
        let n = window.len();
        if n == 0 {
            return Vec::new();
        }
        if n <= self.degree {
            return subtract_mean(window);
        }

        match self.fit_baseline(window) {
            Some(baseline) => window
                .iter()
                .zip(baseline.iter())
                .map(|(&x, &b)| (x as f64 - b) as f32)
                .collect(),
            None => subtract_mean(window),
        }
    }

    /// Least-squares polynomial fit via the normal equations.
    ///
    /// The sample axis is centered on the window midpoint, which keeps the
    /// accumulated powers small and the system well conditioned for the
    /// degrees allowed here.
    fn fit_baseline(&self, window: &[f32]) -> Option<Vec<f64>> {
        let n = window.len();
        let p = self.degree + 1;
        let half = (n as f64 - 1.0) / 2.0;

        // A^T A (p x p) and A^T y (p x 1) where A[i][j] = x_i^j
        let mut ata = vec![vec![0.0f64; p]; p];
        let mut aty = vec![0.0f64; p];

        let max_power = 2 * self.degree;
        for (i, &y) in window.iter().enumerate() {
            let x = i as f64 - half;
            let y = y as f64;

            let mut powers = Vec::with_capacity(max_power + 1);
            powers.push(1.0);
            for k in 1..=max_power {
                powers.push(powers[k - 1] * x);
            }

            for j in 0..p {
                aty[j] += y * powers[j];
                for k in 0..p {
                    ata[j][k] += powers[j + k];
                }
            }
        }

        let coeffs = solve_linear_system(&mut ata, &mut aty)?;

        let baseline = (0..n)
            .map(|i| {
                let x = i as f64 - half;
                let mut acc = 0.0;
                let mut x_pow = 1.0;
                for &c in &coeffs {
                    acc += c * x_pow;
                    x_pow *= x;
                }
                acc
            })
            .collect();
        Some(baseline)
    }
}

fn subtract_mean(window: &[f32]) -> Vec<f32> {
    let mean = window.iter().copied().sum::<f32>() / window.len() as f32;
    window.iter().map(|&x| x - mean).collect()
}

/// Solve Ax = b by Gaussian elimination with partial pivoting.
///
/// Returns `None` on a near-singular pivot instead of dividing through it.
fn solve_linear_system(a: &mut [Vec<f64>], b: &mut [f64]) -> Option<Vec<f64>> {
    let n = b.len();

    for col in 0..n {
        let mut max_row = col;
        let mut max_val = a[col][col].abs();
        for row in (col + 1)..n {
            let v = a[row][col].abs();
            if v > max_val {
                max_val = v;
                max_row = row;
            }
        }

        if max_row != col {
            a.swap(col, max_row);
            b.swap(col, max_row);
        }

        let pivot = a[col][col];
        if pivot.abs() < 1e-12 {
            return None;
        }

        for row in (col + 1)..n {
            let factor = a[row][col] / pivot;
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0f64; n];
    for row in (0..n).rev() {
        let mut acc = b[row];
        for k in (row + 1)..n {
            acc -= a[row][k] * x[k];
        }
        x[row] = acc / a[row][row];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_drift_removed_to_residual_noise() {
        let detrender = Detrender::new(1);
        let window: Vec<f32> = (0..150).map(|i| 2.0 + 0.05 * i as f32).collect();

        let detrended = detrender.detrend(&window);

        assert_eq!(detrended.len(), window.len());
        for (i, value) in detrended.iter().enumerate() {
            assert!(value.abs() < 1e-3, "sample {} residual {}", i, value);
        }
    }

    #[test]
    fn test_cubic_drift_removed_by_matching_degree() {
        let detrender = Detrender::new(3);
        let window: Vec<f32> = (0..150)
            .map(|i| {
                let x = i as f32;
                10.0 + 0.3 * x - 0.004 * x * x + 0.00002 * x * x * x
            })
            .collect();

        let detrended = detrender.detrend(&window);

        for value in &detrended {
            assert!(value.abs() < 1e-2, "residual {}", value);
        }
    }

    #[test]
    fn test_constant_window_returns_zeros() {
        let detrender = Detrender::new(2);
        let window = vec![37.5f32; 150];

        let detrended = detrender.detrend(&window);

        assert_eq!(detrended.len(), 150);
        for value in &detrended {
            assert!(value.abs() < 1e-4);
        }
    }

    #[test]
    fn test_oscillation_survives_detrending() {
        // Sine riding a linear ramp: the fit takes the ramp, not the sine.
        let detrender = Detrender::new(1);
        let window: Vec<f32> = (0..150)
            .map(|i| {
                let t = i as f32 / 30.0;
                0.02 * i as f32 + (2.0 * std::f32::consts::PI * 1.2 * t).sin()
            })
            .collect();

        let detrended = detrender.detrend(&window);

        let mean = detrended.iter().sum::<f32>() / detrended.len() as f32;
        let peak = detrended.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        assert!(mean.abs() < 0.05, "mean {}", mean);
        assert!(peak > 0.8, "oscillation flattened, peak {}", peak);
    }

    #[test]
    fn test_short_window_falls_back_to_mean_subtraction() {
        let detrender = Detrender::new(3);
        let window = vec![1.0f32, 3.0];

        let detrended = detrender.detrend(&window);

        assert_eq!(detrended, vec![-1.0, 1.0]);
    }

    #[test]
    fn test_empty_window() {
        let detrender = Detrender::new(1);
        assert!(detrender.detrend(&[]).is_empty());
    }
}
