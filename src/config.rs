/// Config for a resolver
/// ## Fields
/// - `max_depth`:
///   Maximum count of names under construction at once during one resolution.
///
///   Exceeding it fails with [`crate::ResolveErrorKind::DepthLimitExceeded`].
///   This bounds pathological graphs; true cycles are reported as
///   [`crate::ResolveErrorKind::CircularDependency`] regardless of the limit.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}
