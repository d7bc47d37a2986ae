//! AD7156 two-channel capacitance converter.

mod convert;
mod defs;

pub use convert::*;
pub use defs::{Channel, ConversionMode, Status, ThresholdMode, I2C_ADDR};

use defs::*;

use embedded_hal::i2c::SevenBitAddress;
use embedded_hal_async::i2c::I2c;

use crate::{Encoded, Error, Field, I2cRegisters, RegisterIo, Width};

/// Upper bound on status polls while waiting for a conversion result.
const MAX_READY_POLLS: u32 = 1000;

/// Construction-time settings for [`Ad7156`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ad7156Config {
  /// Range already programmed on each channel, if known. Unknown ranges are
  /// read from the device on first use.
  pub ranges: [Option<Range>; 2],
}

impl Ad7156Config {
  pub const fn new() -> Self {
    Self { ranges: [None, None] }
  }

  pub const fn with_range(mut self, channel: Channel, range: Range) -> Self {
    self.ranges[channel.index()] = Some(range);
    self
  }
}

/// Device session for the AD7156.
///
/// Owns the register access and the per-channel range cache. Every picofarad
/// conversion uses the cached range of its channel; the cache is refreshed
/// whenever the range is read from or written to the device. Callers that share
/// a session across tasks must serialize access themselves.
pub struct Ad7156<R> {
  io: R,
  ranges: [Option<Range>; 2],
}

impl<I: I2c<SevenBitAddress>> Ad7156<I2cRegisters<I>> {
  /// Session over an I²C bus at the fixed device address.
  pub fn new_i2c(i2c: I, config: Ad7156Config) -> Self {
    Self::new(I2cRegisters::new(i2c, I2C_ADDR), config)
  }
}

impl<R: RegisterIo> Ad7156<R> {
  pub fn new(io: R, config: Ad7156Config) -> Self {
    Self { io, ranges: config.ranges }
  }

  pub fn release(self) -> R {
    self.io
  }

  /// Check the chip identifier and prime the range cache for both channels.
  pub async fn initialize(&mut self) -> Result<(), Error<R::Error>> {
    let id = self.chip_id().await?;
    if id != CHIP_ID {
      return Err(Error::InvalidChipId(id));
    }

    for channel in [Channel::One, Channel::Two] {
      if self.ranges[channel.index()].is_none() {
        self.range(channel).await?;
      }
    }
    Ok(())
  }

  pub async fn chip_id(&mut self) -> Result<u8, Error<R::Error>> {
    Ok(self.read(Reg::ChipId.into(), Width::U8).await? as u8)
  }

  /// Issue the reset command. The device returns to its power-on ranges, so the
  /// cache is cleared and refilled on next use.
  pub async fn reset(&mut self) -> Result<(), Error<R::Error>> {
    self.io.write_command(RESET_CMD).await.map_err(Error::Bus)?;
    self.ranges = [None, None];
    Ok(())
  }

  pub async fn set_conversion_mode(&mut self, mode: ConversionMode) -> Result<(), Error<R::Error>> {
    self.modify(MODE, u8::from(mode).into()).await
  }

  pub async fn set_channel_enabled(&mut self, channel: Channel, enable: bool) -> Result<(), Error<R::Error>> {
    self.modify(channel.enable(), enable.into()).await
  }

  /// Select the comparator mode and whether the threshold is fixed or adaptive.
  pub async fn set_threshold_mode(&mut self, mode: ThresholdMode, fixed: bool) -> Result<(), Error<R::Error>> {
    let reg = self.read(Reg::Configuration.into(), Width::U8).await?;
    let reg = THR_FIXED.set_flag(THR_MD.set(reg, u8::from(mode).into()), fixed);
    self.write(Reg::Configuration.into(), Width::U8, reg).await
  }

  pub async fn status(&mut self) -> Result<Status, Error<R::Error>> {
    Ok(Status::from_bits(self.read(Reg::Status.into(), Width::U8).await? as u8))
  }

  /// Latest raw conversion result of `channel`.
  pub async fn read_raw(&mut self, channel: Channel) -> Result<u16, Error<R::Error>> {
    Ok(self.read(channel.data().into(), Width::U16).await? as u16)
  }

  /// Read the input range from the device and refresh the cache.
  pub async fn range(&mut self, channel: Channel) -> Result<Range, Error<R::Error>> {
    let field = RANGE.at(channel.setup().into());
    let reg = self.read(field.reg, field.width).await?;
    let range = Range::from_bits(field.get(reg) as u8);
    self.ranges[channel.index()] = Some(range);
    Ok(range)
  }

  /// Program a new input range. The range is read back so the cache holds what
  /// the device actually accepted. The cache stays unset until that read-back
  /// succeeds.
  pub async fn set_range(&mut self, channel: Channel, range: Range) -> Result<Range, Error<R::Error>> {
    self.ranges[channel.index()] = None;
    self.modify(RANGE.at(channel.setup().into()), range.into_bits().into()).await?;
    #[cfg(feature = "defmt")]
    defmt::debug!("AD7156 {}: range -> {} pF", channel, range.picofarads());
    self.range(channel).await
  }

  /// Cached range of `channel`, without touching the bus.
  pub fn cached_range(&self, channel: Channel) -> Option<Range> {
    self.ranges[channel.index()]
  }

  async fn active_range(&mut self, channel: Channel) -> Result<Range, Error<R::Error>> {
    match self.ranges[channel.index()] {
      Some(range) => Ok(range),
      None => self.range(channel).await,
    }
  }

  /// Latest conversion result of `channel` in picofarads.
  pub async fn capacitance(&mut self, channel: Channel) -> Result<f32, Error<R::Error>> {
    let range = self.active_range(channel).await?;
    let raw = self.read_raw(channel).await?;
    Ok(decode_capacitance(raw, range.picofarads()))
  }

  /// Wait for a fresh conversion on `channel`, then read it in picofarads.
  pub async fn wait_capacitance(&mut self, channel: Channel) -> Result<f32, Error<R::Error>> {
    let mut polls = 0;
    while !self.status().await?.ready(channel) {
      polls += 1;
      if polls >= MAX_READY_POLLS {
        return Err(Error::NotReady);
      }
    }
    self.capacitance(channel).await
  }

  /// Program the fixed threshold of `channel` in picofarads.
  ///
  /// The range is re-read from the device first. Targets outside the range,
  /// infinities included, are written saturated and reported as
  /// [`Encoded::Clamped`]. NaN is rejected.
  pub async fn set_threshold(&mut self, channel: Channel, pf: f32) -> Result<Encoded<u16>, Error<R::Error>> {
    if pf.is_nan() {
      return Err(Error::InvalidValue);
    }
    let range = self.range(channel).await?;
    let code = encode_threshold(pf, range.picofarads());
    if code.is_clamped() {
      #[cfg(feature = "defmt")]
      defmt::warn!("AD7156 {}: threshold {} pF saturated to {=u16:#x}", channel, pf, code.value());
    }
    let field = THRESHOLD.at(channel.sensitivity_threshold().into());
    self.write(field.reg, field.width, code.value().into()).await?;
    Ok(code)
  }

  /// Program the adaptive sensitivity of `channel` in picofarads, using the
  /// cached range. The timeout bits sharing the register are preserved.
  pub async fn set_sensitivity(&mut self, channel: Channel, pf: f32) -> Result<Encoded<u16>, Error<R::Error>> {
    if pf.is_nan() {
      return Err(Error::InvalidValue);
    }
    let range = self.active_range(channel).await?;
    let code = encode_sensitivity(pf, range.picofarads());
    if code.is_clamped() {
      #[cfg(feature = "defmt")]
      defmt::warn!("AD7156 {}: sensitivity {} pF saturated", channel, pf);
    }
    let field = SENSITIVITY.at(channel.sensitivity_threshold().into());
    let reg = self.read(field.reg, field.width).await?;
    let reg = (reg & !field.mask()) | u32::from(code.value());
    self.write(field.reg, field.width, reg).await?;
    Ok(code)
  }

  async fn read(&mut self, reg: u8, width: Width) -> Result<u32, Error<R::Error>> {
    self.io.read_register(reg, width).await.map(|v| v & width.mask()).map_err(Error::Bus)
  }

  async fn write(&mut self, reg: u8, width: Width, value: u32) -> Result<(), Error<R::Error>> {
    self.io.write_register(reg, width, value & width.mask()).await.map_err(Error::Bus)
  }

  async fn modify(&mut self, field: Field, value: u32) -> Result<(), Error<R::Error>> {
    let reg = self.read(field.reg, field.width).await?;
    self.write(field.reg, field.width, field.set(reg, value)).await
  }
}
