//! Output data rate and filter cutoff conversions.
//!
//! For the sinc-based filters the data rate follows
//! `ODR = f_clk / (coefficient * FS)`, where the coefficient depends on the filter
//! type, the power mode and single-cycle settling. The post-filter type bypasses
//! this relation and runs at one of four fixed rates.

use super::defs::{filter, PowerMode, FS};
use crate::field::saturate;
use crate::Encoded;

/// A register combination for which the requested quantity is undefined.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidFilterConfig;

const BASE_COEFFICIENT: u32 = 32;
const FS_MIN: u32 = 1;
const FS_MAX: u32 = FS.max();

/// -3 dB cutoff as a fraction of the output data rate.
const SINC4_CUTOFF_RATIO: f32 = 0.262;
const SINC3_CUTOFF_RATIO: f32 = 0.230;

impl PowerMode {
  pub const fn clock_hz(self) -> u32 {
    match self {
      Self::Low => 76_800,
      Self::Mid => 153_600,
      Self::Full => 614_400,
    }
  }
}

/// Master clock in Hz for a raw `POWER_MODE` value; full power answers for both
/// `0b10` and `0b11`.
pub const fn clock_for_power_mode(power_mode: u8) -> u32 {
  PowerMode::from_bits(power_mode).clock_hz()
}

/// Rate divider coefficient for a filter configuration.
///
/// Single-cycle settling applies to the plain sinc filters, the averaging stage
/// to the fast-settling ones. Every other filter keeps the base coefficient.
pub const fn filter_coefficient(filter_select: u8, power_mode: u8, single_cycle: bool) -> u32 {
  let select = filter_select & 0b111;
  let low_power = matches!(PowerMode::from_bits(power_mode), PowerMode::Low);

  let mut coefficient = BASE_COEFFICIENT;
  if single_cycle {
    coefficient *= match select {
      filter::SINC4 => 4,
      filter::SINC3 => 3,
      _ => 1,
    };
  }
  coefficient *= match select {
    filter::FAST_SINC4 if low_power => 11,
    filter::FAST_SINC4 => 19,
    filter::FAST_SINC3 if low_power => 10,
    filter::FAST_SINC3 => 18,
    _ => 1,
  };
  coefficient
}

/// Fixed output rate of a post-filter selection.
pub const fn post_filter_odr(post_filter: u8) -> Option<f32> {
  match post_filter & 0b111 {
    0b010 => Some(27.27),
    0b011 => Some(25.0),
    0b101 => Some(20.0),
    0b110 => Some(16.7),
    _ => None,
  }
}

/// Output data rate in Hz.
///
/// `post_filter` is only consulted for the post-filter type. A zero rate divider
/// has no defined rate and is rejected like any other invalid combination.
pub fn decode_odr(
  filter_select: u8,
  post_filter: u8,
  fs_value: u16,
  power_mode: u8,
  single_cycle: bool,
) -> Result<f32, InvalidFilterConfig> {
  if filter_select & 0b111 == filter::POST {
    return post_filter_odr(post_filter).ok_or(InvalidFilterConfig);
  }

  let fs = u32::from(fs_value) & FS_MAX;
  if fs == 0 {
    return Err(InvalidFilterConfig);
  }
  let divider = filter_coefficient(filter_select, power_mode, single_cycle) * fs;
  Ok(clock_for_power_mode(power_mode) as f32 / divider as f32)
}

/// Rate divider (`FS`) reaching `target_odr` as closely as the field allows.
///
/// The divider is clamped to `1..=2047`; zero is never produced.
pub fn encode_odr_to_fs(target_odr: f32, filter_select: u8, power_mode: u8, single_cycle: bool) -> Encoded<u16> {
  let coefficient = filter_coefficient(filter_select, power_mode, single_cycle) as f32;
  let ideal = clock_for_power_mode(power_mode) as f32 / (coefficient * target_odr);
  saturate(ideal, FS_MIN, FS_MAX).map(|fs| fs as u16)
}

/// -3 dB cutoff in Hz of a sinc filter running at `odr_hz`.
pub fn decode_filter_cutoff_3db(filter_select: u8, odr_hz: f32) -> Result<f32, InvalidFilterConfig> {
  match filter_select & 0b111 {
    filter::SINC4 | filter::FAST_SINC4 => Ok(odr_hz * SINC4_CUTOFF_RATIO),
    filter::SINC3 | filter::FAST_SINC3 => Ok(odr_hz * SINC3_CUTOFF_RATIO),
    _ => Err(InvalidFilterConfig),
  }
}

/// Filter type and output data rate to program for a requested cutoff.
///
/// Both candidate rates are computed; sinc3 is chosen with the lower of the two
/// whenever the sinc4 candidate is the larger one, otherwise sinc4 keeps its own
/// candidate.
pub fn encode_cutoff_to_filter_and_odr(target_hz: f32) -> (u8, f32) {
  let sinc4_odr = target_hz * 1000.0 / 230.0;
  let sinc3_odr = target_hz * 1000.0 / 262.0;

  if sinc4_odr > sinc3_odr {
    (filter::SINC3, sinc3_odr)
  } else {
    (filter::SINC4, sinc4_odr)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const MID: u8 = PowerMode::Mid as u8;
  const LOW: u8 = PowerMode::Low as u8;

  #[test]
  fn clock_table_aliases_full_power() {
    assert_eq!(clock_for_power_mode(0), 76_800);
    assert_eq!(clock_for_power_mode(1), 153_600);
    assert_eq!(clock_for_power_mode(2), 614_400);
    assert_eq!(clock_for_power_mode(3), 614_400);
  }

  #[test]
  fn coefficient_table() {
    assert_eq!(filter_coefficient(filter::SINC4, MID, false), 32);
    assert_eq!(filter_coefficient(filter::SINC4, MID, true), 128);
    assert_eq!(filter_coefficient(filter::SINC3, MID, true), 96);
    assert_eq!(filter_coefficient(filter::FAST_SINC4, LOW, false), 352);
    assert_eq!(filter_coefficient(filter::FAST_SINC4, MID, false), 608);
    assert_eq!(filter_coefficient(filter::FAST_SINC3, LOW, false), 320);
    assert_eq!(filter_coefficient(filter::FAST_SINC3, 3, false), 576);
    // Single-cycle does not compound with the averaging stage.
    assert_eq!(filter_coefficient(filter::FAST_SINC4, MID, true), 608);
    for reserved in [1, 3, 6, 7] {
      assert_eq!(filter_coefficient(reserved, MID, true), 32);
    }
  }

  #[test]
  fn odr_round_trips_through_fs() {
    let fs = encode_odr_to_fs(10.0, filter::SINC4, MID, false);
    assert_eq!(fs, Encoded::Exact(480));
    let odr = decode_odr(filter::SINC4, 0, fs.value(), MID, false).expect("odr");
    assert!(libm::fabsf(odr - 10.0) < 0.1);
  }

  #[test]
  fn fs_is_clamped_to_field() {
    assert_eq!(encode_odr_to_fs(1e9, filter::SINC4, MID, false), Encoded::Clamped(1));
    assert_eq!(encode_odr_to_fs(0.001, filter::SINC4, MID, false), Encoded::Clamped(2047));
  }

  #[test]
  fn post_filter_rates_are_looked_up() {
    assert_eq!(decode_odr(filter::POST, 3, 0, MID, false), Ok(25.0));
    assert_eq!(decode_odr(filter::POST, 2, 0, MID, false), Ok(27.27));
    assert_eq!(decode_odr(filter::POST, 6, 0, MID, false), Ok(16.7));
    assert_eq!(decode_odr(filter::POST, 1, 0, MID, false), Err(InvalidFilterConfig));
  }

  #[test]
  fn zero_divider_has_no_rate() {
    assert_eq!(decode_odr(filter::SINC3, 0, 0, MID, false), Err(InvalidFilterConfig));
  }

  #[test]
  fn cutoff_depends_on_filter_family() {
    let cutoff = |select| decode_filter_cutoff_3db(select, 100.0).expect("cutoff");
    assert!(libm::fabsf(cutoff(filter::SINC4) - 26.2) < 1e-4);
    assert!(libm::fabsf(cutoff(filter::FAST_SINC4) - 26.2) < 1e-4);
    assert!(libm::fabsf(cutoff(filter::SINC3) - 23.0) < 1e-4);
    assert!(libm::fabsf(cutoff(filter::FAST_SINC3) - 23.0) < 1e-4);
    for other in [1, 3, 6, 7] {
      assert_eq!(decode_filter_cutoff_3db(other, 100.0), Err(InvalidFilterConfig));
    }
  }

  #[test]
  fn cutoff_selection_prefers_sinc3_for_positive_targets() {
    let (select, odr) = encode_cutoff_to_filter_and_odr(50.0);
    assert_eq!(select, filter::SINC3);
    assert!(libm::fabsf(odr - 50_000.0 / 262.0) < 1e-3);

    let (select, odr) = encode_cutoff_to_filter_and_odr(0.0);
    assert_eq!(select, filter::SINC4);
    assert_eq!(odr, 0.0);
  }
}
