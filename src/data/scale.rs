/// Square-root scale from frequency to marker radius in map units
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadiusScale {
    domain_max: f64,
}

impl RadiusScale {
    pub const MIN_RADIUS: f64 = 1.0;
    pub const MAX_RADIUS: f64 = 15.0;

    /// Domain is [1, max_frequency]; a max of 0 counts as 1
    pub fn new(max_frequency: u32) -> Self {
        Self {
            domain_max: max_frequency.max(1) as f64,
        }
    }

    pub fn radius(&self, frequency: u32) -> f64 {
        // Zero frequencies are drawn at the smallest size
        let value = frequency.max(1) as f64;
        let span = self.domain_max.sqrt() - 1.0;
        let t = if span > 0.0 { (value.sqrt() - 1.0) / span } else { 0.5 };
        Self::MIN_RADIUS + t * (Self::MAX_RADIUS - Self::MIN_RADIUS)
    }
}

impl Default for RadiusScale {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        let scale = RadiusScale::new(100);
        assert_eq!(scale.radius(1), 1.0);
        assert_eq!(scale.radius(100), 15.0);
        assert_eq!(scale.radius(0), 1.0);
    }

    #[test]
    fn test_square_root_shape() {
        let scale = RadiusScale::new(121);
        // sqrt(36) = 6 -> (6 - 1) / (11 - 1) = 0.5
        assert!((scale.radius(36) - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_domain_uses_midpoint() {
        assert_eq!(RadiusScale::new(1).radius(1), 8.0);
    }
}
