//! Tunables for an inference run.

/// Configuration for [`crate::infer_program_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferOptions {
    /// Re-runs of a recursive function body before its result is frozen at
    /// `Unknown`.
    pub max_fixpoint_iterations: usize,
    /// Nested activations allowed before a call is answered with `Unknown`.
    pub max_call_depth: usize,
    /// Record reads of names bound nowhere in [`crate::TypeMap::unbound_names`].
    pub strict_unbound: bool,
    /// Seed the global scope with the built-in bindings.
    pub seed_builtins: bool,
}

impl Default for InferOptions {
    fn default() -> Self {
        InferOptions {
            max_fixpoint_iterations: 16,
            max_call_depth: 64,
            strict_unbound: false,
            seed_builtins: true,
        }
    }
}

impl InferOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_fixpoint_iterations(mut self, n: usize) -> Self {
        self.max_fixpoint_iterations = n.max(1);
        self
    }

    pub fn with_max_call_depth(mut self, n: usize) -> Self {
        self.max_call_depth = n;
        self
    }

    pub fn with_strict_unbound(mut self, strict: bool) -> Self {
        self.strict_unbound = strict;
        self
    }

    pub fn with_seed_builtins(mut self, seed: bool) -> Self {
        self.seed_builtins = seed;
        self
    }
}
