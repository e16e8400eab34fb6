//! Hash mixing shared by every evaluator
//!
//! Interpreted evaluators, IR evaluation, closure-compiled evaluators and generated
//! source all call these functions, so they define the feature value of a
//! combination. Changing any constant here changes every feature id.

/// Initial state of every feature hash
pub const SEED: u64 = 0x9e37_79b9_7f4a_7c15;

/// Tag base that separates partial ngram features from full ngram features
pub const PARTIAL_TAG: u64 = 0x100;

const MULTIPLIER: u64 = 0xff51_afd7_ed55_8ccd;

/// Mix one value into a hash state
#[inline(always)]
pub const fn mix(state: u64, value: u64) -> u64 {
    let x = (state.rotate_left(23) ^ value).wrapping_mul(MULTIPLIER);
    x ^ (x >> 29)
}

/// Reduce a hash state to the 32-bit feature id written to the output buffer
#[inline(always)]
pub const fn finish(state: u64) -> u32 {
    (state ^ (state >> 32)) as u32
}
