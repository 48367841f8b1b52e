//! Construction-time configuration for [`DynArray`](crate::DynArray).

use crate::error::ConfigError;

/// Ratio applied to the capacity when an append finds the buffer full.
///
/// Stored as a fraction so growth stays integral: `3/2` multiplies by 1.5.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrowthFactor {
  num: usize,
  den: usize,
}

impl GrowthFactor {
  /// 1.5x, the default.
  pub const ONE_AND_A_HALF: Self = Self { num: 3, den: 2 };

  /// 2x.
  pub const DOUBLE: Self = Self { num: 2, den: 1 };

  /// 3x.
  pub const TRIPLE: Self = Self { num: 3, den: 1 };

  /// Creates `num/den`. Use [`validate`](Self::validate) before relying on it.
  pub const fn new(
    num: usize,
    den: usize,
  ) -> Self {
    Self { num, den }
  }

  /// Numerator of the ratio.
  pub const fn num(&self) -> usize {
    self.num
  }

  /// Denominator of the ratio.
  pub const fn den(&self) -> usize {
    self.den
  }

  /// Rejects ratios that would not strictly enlarge the buffer.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.den == 0 {
      return Err(ConfigError::ZeroDenominator);
    }
    if self.num <= self.den {
      return Err(ConfigError::GrowthFactorTooSmall {
        num: self.num,
        den: self.den,
      });
    }
    Ok(())
  }

  /// Capacity to grow to from `capacity`, always at least `capacity + 1`.
  ///
  /// Saturates at `usize::MAX`; the layout check downstream turns that into
  /// a capacity overflow.
  pub fn apply(
    &self,
    capacity: usize,
  ) -> usize {
    let scaled = capacity as u128 * self.num as u128 / self.den.max(1) as u128;
    let scaled = usize::try_from(scaled).unwrap_or(usize::MAX);
    scaled.max(capacity.saturating_add(1))
  }
}

impl Default for GrowthFactor {
  fn default() -> Self {
    Self::ONE_AND_A_HALF
  }
}

/// When a [`reserve`](crate::DynArray::reserve) request takes effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReservePolicy {
  /// Reallocate during the `reserve` call.
  #[default]
  Immediate,
  /// Record the request and apply it at the next growth event.
  Deferred,
}

/// What `resize(0, ..)` does with the buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ZeroResize {
  /// Free the buffer; capacity becomes 0.
  #[default]
  Release,
  /// Keep the buffer, like `clear()`.
  Retain,
}

/// Configuration for a dynamic array.
///
/// Fixed at construction. All fields have defaults matching
/// [`DynArray::new`](crate::DynArray::new).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArrayConfig {
  /// Growth ratio on a full append. Default: 3/2.
  pub growth: GrowthFactor,

  /// Slots allocated at construction, and the floor for the first growth.
  ///
  /// Default: 0 (allocate lazily on first insertion).
  pub initial_capacity: usize,

  /// Default: [`ReservePolicy::Immediate`].
  pub reserve: ReservePolicy,

  /// Default: [`ZeroResize::Release`].
  pub zero_resize: ZeroResize,
}

impl ArrayConfig {
  /// Default initial capacity: allocate lazily.
  pub const DEFAULT_INITIAL_CAPACITY: usize = 0;

  /// The default configuration.
  pub const fn new() -> Self {
    Self {
      growth: GrowthFactor::ONE_AND_A_HALF,
      initial_capacity: Self::DEFAULT_INITIAL_CAPACITY,
      reserve: ReservePolicy::Immediate,
      zero_resize: ZeroResize::Release,
    }
  }

  /// Replaces the growth factor.
  pub const fn with_growth(
    mut self,
    growth: GrowthFactor,
  ) -> Self {
    self.growth = growth;
    self
  }

  /// Replaces the initial capacity hint.
  pub const fn with_initial_capacity(
    mut self,
    initial_capacity: usize,
  ) -> Self {
    self.initial_capacity = initial_capacity;
    self
  }

  /// Replaces the reserve policy.
  pub const fn with_reserve(
    mut self,
    reserve: ReservePolicy,
  ) -> Self {
    self.reserve = reserve;
    self
  }

  /// Replaces the resize-to-zero policy.
  pub const fn with_zero_resize(
    mut self,
    zero_resize: ZeroResize,
  ) -> Self {
    self.zero_resize = zero_resize;
    self
  }

  /// Checks every field that has constraints.
  pub fn validate(&self) -> Result<(), ConfigError> {
    self.growth.validate()
  }
}

impl Default for ArrayConfig {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_config_is_valid_and_lazy() {
    let config = ArrayConfig::default();

    assert_eq!(config.validate(), Ok(()));
    assert_eq!(config.initial_capacity, 0);
    assert_eq!(config.growth, GrowthFactor::ONE_AND_A_HALF);
    assert_eq!(config.reserve, ReservePolicy::Immediate);
    assert_eq!(config.zero_resize, ZeroResize::Release);
  }

  #[test]
  fn growth_must_exceed_one() {
    assert_eq!(
      GrowthFactor::new(2, 2).validate(),
      Err(ConfigError::GrowthFactorTooSmall { num: 2, den: 2 })
    );
    assert_eq!(GrowthFactor::new(1, 0).validate(), Err(ConfigError::ZeroDenominator));
    assert_eq!(GrowthFactor::new(5, 4).validate(), Ok(()));
  }

  #[test]
  fn growth_always_adds_a_slot() {
    let growth = GrowthFactor::ONE_AND_A_HALF;

    assert_eq!(growth.apply(0), 1);
    assert_eq!(growth.apply(1), 2);
    assert_eq!(growth.apply(2), 3);
    assert_eq!(growth.apply(8), 12);
    assert_eq!(GrowthFactor::TRIPLE.apply(3), 9);
  }

  #[test]
  fn growth_saturates() {
    assert_eq!(GrowthFactor::DOUBLE.apply(usize::MAX - 1), usize::MAX);
    assert_eq!(GrowthFactor::DOUBLE.apply(usize::MAX), usize::MAX);
  }

  #[test]
  fn builders_replace_single_fields() {
    let config = ArrayConfig::new()
      .with_growth(GrowthFactor::TRIPLE)
      .with_initial_capacity(8)
      .with_reserve(ReservePolicy::Deferred)
      .with_zero_resize(ZeroResize::Retain);

    assert_eq!(config.growth, GrowthFactor::TRIPLE);
    assert_eq!(config.initial_capacity, 8);
    assert_eq!(config.reserve, ReservePolicy::Deferred);
    assert_eq!(config.zero_resize, ZeroResize::Retain);
  }
}
