/// Native width of a register as transmitted on the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Width {
  U8 = 1,
  U16 = 2,
  U24 = 3,
}

impl Width {
  /// Number of bytes on the wire.
  pub const fn bytes(self) -> usize {
    self as usize
  }

  /// Mask covering every bit the register can hold.
  pub const fn mask(self) -> u32 {
    match self {
      Self::U8 => 0xFF,
      Self::U16 => 0xFFFF,
      Self::U24 => 0xFF_FFFF,
    }
  }
}

/// Location of a bit-field inside a register.
///
/// Fields are fixed device metadata: they are declared once as constants next to
/// the register map and shared by every decode and encode step, so shift and mask
/// values only ever live in one place.
///
/// Register banks that repeat per channel (setup, filter, offset) are described
/// once for index 0 and relocated with [`Field::nth`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Field {
  pub reg: u8,
  pub width: Width,
  pub offset: u8,
  pub bits: u8,
  pub signed: bool,
}

impl Field {
  pub const fn new(reg: u8, width: Width, offset: u8, bits: u8) -> Self {
    Self { reg, width, offset, bits, signed: false }
  }

  /// Mark the field as two's complement.
  pub const fn signed(mut self) -> Self {
    self.signed = true;
    self
  }

  /// Same field in a register at another address with the identical layout.
  pub const fn at(mut self, reg: u8) -> Self {
    self.reg = reg;
    self
  }

  /// Same field in the `index`-th copy of a repeated register bank.
  pub const fn nth(mut self, index: u8) -> Self {
    self.reg += index;
    self
  }

  /// Largest unsigned value the field can hold.
  pub const fn max(self) -> u32 {
    if self.bits >= 32 {
      u32::MAX
    } else {
      (1 << self.bits) - 1
    }
  }

  /// In-register mask of the field.
  pub const fn mask(self) -> u32 {
    (self.max() << self.offset) & self.width.mask()
  }

  /// Extract the raw (unsigned) field value from a register value.
  pub const fn get(self, reg: u32) -> u32 {
    (reg & self.mask()) >> self.offset
  }

  /// Extract the field, sign-extending it when the field is signed.
  pub const fn get_signed(self, reg: u32) -> i32 {
    let raw = self.get(reg);
    if !self.signed || self.bits == 0 || self.bits >= 32 {
      return raw as i32;
    }
    let shift = 32 - self.bits as u32;
    ((raw << shift) as i32) >> shift
  }

  pub const fn is_set(self, reg: u32) -> bool {
    self.get(reg) != 0
  }

  /// Replace the field inside `reg`. Bits of `value` beyond the field width are dropped.
  pub const fn set(self, reg: u32, value: u32) -> u32 {
    (reg & !self.mask()) | ((value << self.offset) & self.mask())
  }

  pub const fn set_flag(self, reg: u32, on: bool) -> u32 {
    self.set(reg, on as u32)
  }
}

/// Result of encoding a physical quantity into a register code.
///
/// Requests outside the representable range are not failures: the hardware
/// saturates and so does the encoder. `Clamped` carries the saturated code so the
/// caller can still write it while being able to tell that the target was not met.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Encoded<T> {
  Exact(T),
  Clamped(T),
}

impl<T: Copy> Encoded<T> {
  pub fn value(&self) -> T {
    match *self {
      Self::Exact(v) | Self::Clamped(v) => v,
    }
  }

  pub const fn is_clamped(&self) -> bool {
    matches!(self, Self::Clamped(_))
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Encoded<U> {
    match self {
      Self::Exact(v) => Encoded::Exact(f(v)),
      Self::Clamped(v) => Encoded::Clamped(f(v)),
    }
  }
}

/// Round `value` to the nearest integer code and saturate it into `min..=max`.
///
/// NaN saturates to `min`.
pub(crate) fn saturate(value: f32, min: u32, max: u32) -> Encoded<u32> {
  let code = libm::roundf(value);
  if !(code >= min as f32) {
    Encoded::Clamped(min)
  } else if code > max as f32 {
    Encoded::Clamped(max)
  } else {
    Encoded::Exact(code as u32)
  }
}
