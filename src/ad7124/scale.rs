//! Input scale and programmable gain conversions.
//!
//! The PGA gain is `2^pga_select` for `pga_select` in `0..=7`. One LSB of the
//! conversion result corresponds to `Vref / 2^(bit_depth + pga - bipolar)` volts.

/// Largest `PGA` field value (gain 128).
pub const PGA_MAX: u8 = 7;

/// Amplifier gain selected by a `PGA` field value.
pub const fn gain(pga_select: u8) -> u32 {
  1 << (pga_select & PGA_MAX)
}

/// Volts per LSB for a gain setting.
///
/// Bipolar coding spends one bit on the sign, which doubles the weight of an LSB.
pub fn decode_scale(pga_select: u8, bipolar: bool, vref_mv: f32, bit_depth: u8) -> f32 {
  let exponent = i32::from(bit_depth) + i32::from(pga_select & PGA_MAX) - i32::from(bipolar);
  libm::ldexpf(vref_mv / 1000.0, -exponent)
}

/// `PGA` field value whose gain lies nearest to `requested_gain`.
///
/// On equal distance the smaller gain wins.
pub fn find_nearest_gain(requested_gain: f32) -> u8 {
  let mut best = 0;
  let mut best_distance = f32::INFINITY;
  for pga in 0..=PGA_MAX {
    let distance = libm::fabsf(gain(pga) as f32 - requested_gain);
    if distance < best_distance {
      best = pga;
      best_distance = distance;
    }
  }
  best
}

/// `PGA` field value giving the scale nearest to `target_scale` volts per LSB.
pub fn encode_scale_to_gain(target_scale: f32, bipolar: bool, vref_mv: f32, bit_depth: u8) -> u8 {
  find_nearest_gain(decode_scale(0, bipolar, vref_mv, bit_depth) / target_scale)
}

/// Differential input span in volts reachable at a gain setting.
pub fn full_scale_voltage(pga_select: u8, vref_mv: f32) -> f32 {
  vref_mv / 1000.0 / gain(pga_select) as f32
}
