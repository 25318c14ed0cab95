use std::fmt::Display;

/// An amount of money in minor currency units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cents(u64);

impl Cents {
    pub const ZERO: Cents = Cents(0);
    /// The largest amount storage can hold
    pub const MAX: Cents = Cents(i64::MAX as u64);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Scales the amount by `basis_points` (1/100 of a percent) in either direction,
    /// never going below one cent.
    pub fn vary_by(&self, basis_points: i64) -> Self {
        let factor = (10_000 + basis_points).max(0) as u128;
        let scaled = (self.0 as u128 * factor + 5_000) / 10_000;

        Self(scaled.clamp(1, u64::MAX as u128) as u64)
    }

    /// How much cheaper `self` is compared to `other`, if at all.
    pub fn drop_from(&self, other: Cents) -> Option<Cents> {
        other.0.checked_sub(self.0).filter(|d| *d > 0).map(Cents)
    }
}

impl From<u64> for Cents {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::Cents;

    #[test]
    fn variation_is_rounded_and_bounded() {
        assert_eq!(Cents::new(49999).vary_by(0), Cents::new(49999));
        assert_eq!(Cents::new(10000).vary_by(1000), Cents::new(11000));
        assert_eq!(Cents::new(10000).vary_by(-1000), Cents::new(9000));
        assert_eq!(Cents::new(1).vary_by(-1000), Cents::new(1));
        assert_eq!(Cents::ZERO.vary_by(500), Cents::new(1));
    }

    #[test]
    fn price_drop() {
        assert_eq!(Cents::new(44999).drop_from(Cents::new(49999)), Some(Cents::new(5000)));
        assert_eq!(Cents::new(49999).drop_from(Cents::new(49999)), None);
        assert_eq!(Cents::new(50000).drop_from(Cents::new(49999)), None);
    }

    #[test]
    fn displays_as_dollars() {
        assert_eq!(Cents::new(44999).to_string(), "$449.99");
        assert_eq!(Cents::new(5).to_string(), "$0.05");
    }
}
