//! Analysis settings.

/// Settings that control the complexity of cut-set generation.
///
/// The only knob of the engine itself is `limit_order`, the upper bound on
/// cut-set cardinality: cut sets larger than the limit are neither produced
/// nor retained. A limit of zero (or below) is not an error; the analysis
/// simply yields an empty family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    limit_order: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self { limit_order: 20 }
    }
}

impl Settings {
    /// Creates settings with the default limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// The maximum cut-set cardinality.
    pub fn limit_order(&self) -> i32 {
        self.limit_order
    }

    /// Sets the maximum cut-set cardinality.
    pub fn with_limit_order(mut self, limit_order: i32) -> Self {
        self.limit_order = limit_order;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limit() {
        assert_eq!(Settings::default().limit_order(), 20);
    }

    #[test]
    fn test_with_limit_order() {
        let settings = Settings::new().with_limit_order(3);
        assert_eq!(settings.limit_order(), 3);
    }
}
