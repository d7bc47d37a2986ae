/******************************************************************************
 * Refer to the AD7124-4/AD7124-8 datasheet for more information:             *
 * - https://www.analog.com/en/products/ad7124-8.html                         *
 * ========================================================================== *
 *                        AD7124 - Registers & Memory Map                     *
*******************************************************************************/

use crate::{Field, Width};

/// Channel slots addressable through the attribute layer. Channel `n` is bound
/// to configuration, filter and offset setup `n`.
pub const CHANNELS: u8 = 8;

#[allow(dead_code)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Reg {
  Status = 0x00,
  AdcControl = 0x01,
  Data = 0x02,
  IoControl1 = 0x03,
  IoControl2 = 0x04,
  Id = 0x05,
  Error = 0x06,
  ErrorEnable = 0x07,
  MclkCount = 0x08,

  // Channel map (0x09..0x18)
  Channel0 = 0x09,
  // Setup banks, eight copies each
  Config0 = 0x19,
  Filter0 = 0x21,
  Offset0 = 0x29,
  Gain0 = 0x31,
}

impl From<Reg> for u8 {
  #[inline]
  fn from(r: Reg) -> Self {
    r as u8
  }
}

// Status register, RDY is active low
pub(crate) const RDY: Field = Field::new(Reg::Status as u8, Width::U8, 7, 1);

// ADC control register
pub(crate) const POWER_MODE: Field = Field::new(Reg::AdcControl as u8, Width::U16, 6, 2);

// Conversion result
pub(crate) const DATA: Field = Field::new(Reg::Data as u8, Width::U24, 0, 24);

// Channel map register (per channel)
pub(crate) const CH_ENABLE: Field = Field::new(Reg::Channel0 as u8, Width::U16, 15, 1);

// Configuration register (per setup)
pub(crate) const PGA: Field = Field::new(Reg::Config0 as u8, Width::U16, 0, 3);
pub(crate) const BIPOLAR: Field = Field::new(Reg::Config0 as u8, Width::U16, 11, 1);

// Filter register (per setup)
pub(crate) const FS: Field = Field::new(Reg::Filter0 as u8, Width::U24, 0, 11);
pub(crate) const SINGLE_CYCLE: Field = Field::new(Reg::Filter0 as u8, Width::U24, 16, 1);
pub(crate) const POST_FILTER: Field = Field::new(Reg::Filter0 as u8, Width::U24, 17, 3);
pub(crate) const FILTER: Field = Field::new(Reg::Filter0 as u8, Width::U24, 21, 3);

// Offset register (per setup)
pub(crate) const OFFSET: Field = Field::new(Reg::Offset0 as u8, Width::U24, 0, 24);

/// Raw `FILTER` field values.
pub mod filter {
  pub const SINC4: u8 = 0b000;
  pub const SINC3: u8 = 0b010;
  /// Fast settling sinc4 (sinc4 followed by an averaging stage).
  pub const FAST_SINC4: u8 = 0b100;
  /// Fast settling sinc3 (sinc3 followed by an averaging stage).
  pub const FAST_SINC3: u8 = 0b101;
  /// Sinc3 with one of the fixed-rate post filters.
  pub const POST: u8 = 0b111;
}

/// Master clock selection through `POWER_MODE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerMode {
  Low = 0b00,
  Mid = 0b01,
  Full = 0b10,
}

impl PowerMode {
  /// Codes `0b10` and `0b11` both select full power.
  pub const fn from_bits(bits: u8) -> Self {
    match bits & 0b11 {
      0b00 => Self::Low,
      0b01 => Self::Mid,
      _ => Self::Full,
    }
  }

  pub const fn into_bits(self) -> u8 {
    self as u8
  }
}
