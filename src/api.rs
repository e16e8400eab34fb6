//! Evaluator and factory traits shared by the analysis core and generated code
//!
//! Generated artifacts refer to these traits through absolute paths
//! (`::lattice_feature_codegen::NgramFeatureApply`), so their names and signatures
//! are part of the generated-code contract.

/// Engine-supplied computation of primitive feature values for one dictionary entry
pub trait PrimitiveFeatureApply: Send + Sync {
    /// Number of values written per entry, the width of a context slice
    fn width(&self) -> usize;

    /// Encode `entry` into `out`, which holds exactly [`width`](Self::width) values
    fn apply(&self, entry: &[i32], out: &mut [u64]);
}

/// Evaluator of all full ngram features
///
/// Implementations are stateless and may be called concurrently.
pub trait NgramFeatureApply: Send + Sync {
    /// Minimum length of the output buffer
    fn output_width(&self) -> usize;

    /// Write feature ids for the context `(t2, t1, t0)` into `result`
    fn apply(&self, result: &mut [u32], t2: &[u64], t1: &[u64], t0: &[u64]);
}

/// Evaluator of partial ngram features, which read a subset of the three positions
pub trait PartialNgramFeatureApply: Send + Sync {
    /// Minimum length of the output buffer
    fn output_width(&self) -> usize;

    /// Write feature ids for the context `(t2, t1, t0)` into `result`
    fn apply(&self, result: &mut [u32], t2: &[u64], t1: &[u64], t0: &[u64]);
}

/// Factory implemented by generated code
///
/// `None` means the kind could not be compiled and the caller must keep using the
/// interpreted evaluator for it.
pub trait StaticFeatureFactory {
    /// Produce the compiled ngram evaluator
    fn ngram(&self) -> Option<Box<dyn NgramFeatureApply>>;

    /// Produce the compiled partial ngram evaluator
    fn partial_ngram(&self) -> Option<Box<dyn PartialNgramFeatureApply>>;
}
