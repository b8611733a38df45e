use crate::HbError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, HbError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(HbError::NonFinite { what, value: v })
    }
}

/// Bisection on a bracketed interval `[lo, hi]`.
///
/// `f(lo)` and `f(hi)` must have opposite signs (or one of them be zero).
/// Stops when the interval is narrower than `x_tol` or after `max_iter`
/// halvings, returning the midpoint either way. A non-finite residual is
/// reported as [`HbError::NonFinite`].
pub fn bisect<F, E>(
    mut f: F,
    mut lo: Real,
    mut hi: Real,
    x_tol: Real,
    max_iter: usize,
    what: &'static str,
) -> Result<Real, E>
where
    F: FnMut(Real) -> Result<Real, E>,
    E: From<HbError>,
{
    let mut f_lo = ensure_finite(f(lo)?, what)?;
    if f_lo == 0.0 {
        return Ok(lo);
    }
    let f_hi = ensure_finite(f(hi)?, what)?;
    if f_hi == 0.0 {
        return Ok(hi);
    }
    if f_lo.signum() == f_hi.signum() {
        return Err(HbError::NotBracketed { what, f_lo, f_hi }.into());
    }

    for _ in 0..max_iter {
        let mid = 0.5 * (lo + hi);
        if (hi - lo).abs() <= x_tol {
            return Ok(mid);
        }
        let f_mid = ensure_finite(f(mid)?, what)?;
        if f_mid == 0.0 {
            return Ok(mid);
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    Ok(0.5 * (lo + hi))
}

/// Piecewise-linear interpolation over `(x, y)` points sorted by `x`.
///
/// Values outside the table are clamped to the end points.
pub fn interp_clamped(points: &[(Real, Real)], x: Real) -> Option<Real> {
    let (first, last) = (points.first()?, points.last()?);
    if x <= first.0 {
        return Some(first.1);
    }
    if x >= last.0 {
        return Some(last.1);
    }
    points.windows(2).find_map(|w| {
        let (x0, y0) = w[0];
        let (x1, y1) = w[1];
        if x >= x0 && x <= x1 {
            if (x1 - x0).abs() < Real::EPSILON {
                Some(y0)
            } else {
                Some(y0 + (y1 - y0) * (x - x0) / (x1 - x0))
            }
        } else {
            None
        }
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn bisect_stays_inside_bracket(target in 0.1f64..99.9) {
            let root = bisect::<_, HbError>(|x| Ok(x - target), 0.0, 100.0, 1e-9, 100, "linear")
                .unwrap();
            prop_assert!((0.0..=100.0).contains(&root));
            prop_assert!((root - target).abs() < 1e-6);
        }
    }
}
