//! Picofarad <-> register code conversions.
//!
//! The converter reports a 16-bit code whose documented conversion window is
//! `0x3000..=0xD000`. The window spans the channel's full input range, so a code
//! maps to picofarads through the range currently selected for that channel.

use super::defs::SENSITIVITY;
use crate::field::saturate;
use crate::Encoded;

/// Lowest code of the conversion window (0 pF).
pub const CODE_MIN: u16 = 0x3000;
/// Highest code of the conversion window (full range).
pub const CODE_MAX: u16 = 0xD000;
const CODE_SPAN: f32 = 0xA000 as f32;
const SENSITIVITY_SPAN: f32 = 0xA00 as f32;
const SENSITIVITY_MAX: u32 = SENSITIVITY.max();

/// Selectable capacitive input range.
///
/// The discriminants are the raw `RANGE` field values. The ordering is not
/// monotonic in picofarads; it is the datasheet encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Range {
  #[default]
  Pf2 = 0b00,
  Pf0_5 = 0b01,
  Pf1 = 0b10,
  Pf4 = 0b11,
}

impl Range {
  pub const fn from_bits(bits: u8) -> Self {
    match bits & 0b11 {
      0b00 => Self::Pf2,
      0b01 => Self::Pf0_5,
      0b10 => Self::Pf1,
      _ => Self::Pf4,
    }
  }

  pub const fn into_bits(self) -> u8 {
    self as u8
  }

  pub const fn picofarads(self) -> f32 {
    match self {
      Self::Pf2 => 2.0,
      Self::Pf0_5 => 0.5,
      Self::Pf1 => 1.0,
      Self::Pf4 => 4.0,
    }
  }
}

/// Full-scale range in pF for a raw `RANGE` field value. Only the low two bits are used.
pub const fn decode_range_selector(field_value: u8) -> f32 {
  Range::from_bits(field_value).picofarads()
}

/// Convert a conversion result to picofarads.
///
/// Codes outside the conversion window saturate at the range endpoints, the same
/// way the sensor output does.
pub fn decode_capacitance(raw: u16, range_pf: f32) -> f32 {
  let raw = raw.clamp(CODE_MIN, CODE_MAX);
  (f32::from(raw - CODE_MIN) * range_pf) / CODE_SPAN
}

/// Fixed-threshold register code for a capacitance target.
///
/// Targets outside `0..=range_pf` saturate at the window edges.
pub fn encode_threshold(target_pf: f32, range_pf: f32) -> Encoded<u16> {
  let offset = target_pf * CODE_SPAN / range_pf;
  let min = u32::from(CODE_MIN);
  saturate(offset + min as f32, min, u32::from(CODE_MAX)).map(|code| code as u16)
}

/// Adaptive-sensitivity register value for a capacitance target.
///
/// The sensitivity is relative to the running average rather than an absolute
/// level, so it is not checked against the conversion window. The 8-bit code is
/// saturated and placed in bits 4..=11.
pub fn encode_sensitivity(target_pf: f32, range_pf: f32) -> Encoded<u16> {
  saturate(target_pf * SENSITIVITY_SPAN / range_pf, 0, SENSITIVITY_MAX).map(|code| SENSITIVITY.set(0, code) as u16)
}
