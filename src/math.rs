//! Small numeric helpers shared by the moment recurrences
//!
//! Coefficients are computed in integer arithmetic and only converted to
//! `f64` at the end, so they are exact for every order up to [`MAX_ORDER`].

/// Highest power sum order an engine accepts
///
/// `C(67, 33)` is the largest central binomial coefficient that fits in a
/// `u64`; every row of Pascal's triangle up to here is exact.
pub const MAX_ORDER: u32 = 67;

/// Binomial coefficient `C(n, k)`, `None` if it does not fit in a `u64`
///
/// Returns `Some(0)` when `k > n`.
pub fn binomial(n: u32, k: u32) -> Option<u64> {
    if k > n {
        return Some(0);
    }
    let k = k.min(n - k);
    let mut result: u64 = 1;
    for i in 0..k {
        // result * (n - i) is always divisible by (i + 1); the partial
        // products C(n, i + 1) grow monotonically up to k = n / 2
        let next = u128::from(result) * u128::from(n - i) / u128::from(i + 1);
        result = u64::try_from(next).ok()?;
    }
    Some(result)
}

/// Rows `C(k, 0..=k)` of Pascal's triangle for every `k <= max`, as `f64`
///
/// `None` if any coefficient overflows, which cannot happen for
/// `max <= MAX_ORDER`.
pub fn binomial_rows(max: u32) -> Option<Vec<Vec<f64>>> {
    (0..=max)
        .map(|n| (0..=n).map(|k| binomial(n, k).map(|c| c as f64)).collect())
        .collect()
}

/// `(-1)^k`
#[inline]
pub fn parity_sign(k: u32) -> f64 {
    if k % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

/// `x^n` for a non-negative integer exponent
#[inline]
pub fn powu(x: f64, n: u32) -> f64 {
    match i32::try_from(n) {
        Ok(n) => x.powi(n),
        Err(_) => x.powf(f64::from(n)),
    }
}

/// Direct coefficient of `delta^k` in an undecayed insertion at count `n`
///
/// `(n - 1) / n^k * ((n - 1)^(k - 1) + (-1)^k)`
#[inline]
pub fn insertion_coefficient(n: f64, k: u32) -> f64 {
    debug_assert!(k >= 1);
    (n - 1.0) / powu(n, k) * (powu(n - 1.0, k - 1) + parity_sign(k))
}

/// Direct coefficient of `delta^k` in a decayed insertion with weight `decay`
///
/// `(1 - decay) * (-decay)^k + decay * (1 - decay)^k`
#[inline]
pub fn decayed_coefficient(decay: f64, k: u32) -> f64 {
    (1.0 - decay) * powu(-decay, k) + decay * powu(1.0 - decay, k)
}
