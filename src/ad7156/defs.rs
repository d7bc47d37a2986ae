/******************************************************************************
 * Refer to the AD7156 datasheet for more information, available here:        *
 * - https://www.analog.com/en/products/ad7156.html                           *
 * ========================================================================== *
 *                        AD7156 - Registers & Memory Map                     *
*******************************************************************************/

use bitfield_struct::bitfield;

use crate::{Field, Width};

/// Fixed 7-bit I²C address.
pub const I2C_ADDR: u8 = 0x48;
pub(crate) const CHIP_ID: u8 = 0x88;
pub(crate) const RESET_CMD: u8 = 0xBF;

#[allow(dead_code)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Reg {
  Status = 0x00,

  // Conversion results, MSB first (0x01..0x04)
  Ch1Data = 0x01,
  Ch2Data = 0x03,

  // Adaptive averages (0x05..0x08)
  Ch1Average = 0x05,
  Ch2Average = 0x07,

  // Sensitivity (adaptive) or threshold (fixed), 0x09..0x0E
  Ch1SensitivityThreshold = 0x09,
  Ch1Setup = 0x0B,
  Ch2SensitivityThreshold = 0x0C,
  Ch2Setup = 0x0E,

  Configuration = 0x0F,
  PowerDownTimer = 0x10,
  Ch1Capdac = 0x11,
  Ch2Capdac = 0x12,
  SerialNumber = 0x13,
  ChipId = 0x17,
}

impl From<Reg> for u8 {
  #[inline]
  fn from(r: Reg) -> Self {
    r as u8
  }
}

// Setup register
pub(crate) const RANGE: Field = Field::new(Reg::Ch1Setup as u8, Width::U8, 6, 2);

// Sensitivity occupies bits 4..=11 of the 16-bit sensitivity/timeout pair
pub(crate) const SENSITIVITY: Field = Field::new(Reg::Ch1SensitivityThreshold as u8, Width::U16, 4, 8);
pub(crate) const THRESHOLD: Field = Field::new(Reg::Ch1SensitivityThreshold as u8, Width::U16, 0, 16);

// Configuration register
pub(crate) const MODE: Field = Field::new(Reg::Configuration as u8, Width::U8, 0, 3);
pub(crate) const EN_CH2: Field = Field::new(Reg::Configuration as u8, Width::U8, 3, 1);
pub(crate) const EN_CH1: Field = Field::new(Reg::Configuration as u8, Width::U8, 4, 1);
pub(crate) const THR_MD: Field = Field::new(Reg::Configuration as u8, Width::U8, 5, 2);
pub(crate) const THR_FIXED: Field = Field::new(Reg::Configuration as u8, Width::U8, 7, 1);

/// One of the two capacitive input channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
  One,
  Two,
}

impl Channel {
  pub(crate) const fn index(self) -> usize {
    self as usize
  }

  pub(crate) const fn data(self) -> Reg {
    match self {
      Self::One => Reg::Ch1Data,
      Self::Two => Reg::Ch2Data,
    }
  }

  pub(crate) const fn setup(self) -> Reg {
    match self {
      Self::One => Reg::Ch1Setup,
      Self::Two => Reg::Ch2Setup,
    }
  }

  pub(crate) const fn sensitivity_threshold(self) -> Reg {
    match self {
      Self::One => Reg::Ch1SensitivityThreshold,
      Self::Two => Reg::Ch2SensitivityThreshold,
    }
  }

  pub(crate) const fn enable(self) -> Field {
    match self {
      Self::One => EN_CH1,
      Self::Two => EN_CH2,
    }
  }
}

impl TryFrom<u8> for Channel {
  type Error = u8;

  /// Channels are numbered 1 and 2 as in the datasheet.
  fn try_from(n: u8) -> Result<Self, Self::Error> {
    match n {
      1 => Ok(Self::One),
      2 => Ok(Self::Two),
      other => Err(other),
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConversionMode {
  Idle = 0b000,
  Continuous = 0b001,
  Single = 0b010,
  PowerDown = 0b011,
}

impl From<ConversionMode> for u8 {
  fn from(v: ConversionMode) -> Self {
    v as u8
  }
}

/// Comparator behaviour of the threshold outputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ThresholdMode {
  Negative = 0b00,
  Positive = 0b01,
  InWindow = 0b10,
  OutWindow = 0b11,
}

impl From<ThresholdMode> for u8 {
  fn from(v: ThresholdMode) -> Self {
    v as u8
  }
}

/// Status register. `RDY` bits are active low: a cleared bit means a fresh result.
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
  pub rdy1: bool,
  pub rdy2: bool,
  pub c1_c2: bool,
  pub out1: bool,
  pub dac_step1: bool,
  pub out2: bool,
  pub dac_step2: bool,
  pub power_down: bool,
}

impl Status {
  /// Whether a new conversion result is waiting for `channel`.
  pub const fn ready(self, channel: Channel) -> bool {
    match channel {
      Channel::One => !self.rdy1(),
      Channel::Two => !self.rdy2(),
    }
  }
}
