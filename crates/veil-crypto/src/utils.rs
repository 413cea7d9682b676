//! Constant-time comparison helpers.
//!
//! Used when checking a recomputed envelope id against the id an envelope
//! claims, so the comparison does not leak how many leading bytes matched.

use constant_time_eq::constant_time_eq;

/// Compare two byte slices in constant time.
///
/// ```rust
/// use veil_crypto::utils::constant_time_compare;
///
/// assert!(constant_time_compare(&[0u8; 32], &[0u8; 32]));
/// assert!(!constant_time_compare(&[0u8; 32], &[1u8; 32]));
/// ```
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    constant_time_eq(a, b)
}

/// Fixed-size variant of [`constant_time_compare`].
pub fn constant_time_compare_array<const N: usize>(a: &[u8; N], b: &[u8; N]) -> bool {
    constant_time_eq(a, b)
}
