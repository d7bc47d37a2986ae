//! AD7124 eight-setup sigma-delta ADC.

mod defs;
mod rate;
mod scale;

pub use defs::{filter, PowerMode, CHANNELS};
pub use rate::*;
pub use scale::*;

use defs::*;

use embedded_hal_async::spi::SpiDevice;

use crate::{Encoded, Error, Field, RegisterIo, SpiRegisters};

/// Upper bound on status polls while waiting for a conversion result.
const MAX_READY_POLLS: u32 = 10_000;

/// Construction-time settings for [`Ad7124`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ad7124Config {
  /// Reference voltage in millivolts.
  pub vref_mv: f32,
  /// Resolution of the conversion result.
  pub bit_depth: u8,
}

impl Ad7124Config {
  pub const fn new() -> Self {
    Self { vref_mv: 2500.0, bit_depth: 24 }
  }

  pub const fn with_vref_mv(mut self, vref_mv: f32) -> Self {
    self.vref_mv = vref_mv;
    self
  }

  pub const fn with_bit_depth(mut self, bit_depth: u8) -> Self {
    self.bit_depth = bit_depth;
    self
  }
}

impl Default for Ad7124Config {
  fn default() -> Self {
    Self::new()
  }
}

/// Device session for the AD7124.
///
/// Every channel reads and writes the setup with the same index, so channel `n`
/// owns configuration, filter and offset register `n`. All attributes are read
/// from the device on every call; nothing is cached.
pub struct Ad7124<R> {
  io: R,
  config: Ad7124Config,
}

impl<S: SpiDevice> Ad7124<SpiRegisters<S>> {
  pub fn new_spi(spi: S, config: Ad7124Config) -> Self {
    Self::new(SpiRegisters::new(spi), config)
  }
}

impl<R: RegisterIo> Ad7124<R> {
  pub fn new(io: R, config: Ad7124Config) -> Self {
    Self { io, config }
  }

  pub fn release(self) -> R {
    self.io
  }

  pub fn config(&self) -> &Ad7124Config {
    &self.config
  }

  pub async fn power_mode(&mut self) -> Result<PowerMode, Error<R::Error>> {
    let reg = self.read(POWER_MODE).await?;
    Ok(PowerMode::from_bits(POWER_MODE.get(reg) as u8))
  }

  /// Convert once on `channel` and return the raw 24-bit result.
  ///
  /// The channel is enabled for the conversion and its map register is written
  /// back as it was found afterwards, also when the wait gives up.
  pub async fn read_raw(&mut self, channel: u8) -> Result<u32, Error<R::Error>> {
    let map = CH_ENABLE.nth(setup(channel)?);
    let reg = self.read(map).await?;
    self.write(map, CH_ENABLE.set_flag(reg, true)).await?;

    let data = self.wait_data().await;
    let restored = self.write(map, reg).await;
    let data = data?;
    restored?;
    Ok(data)
  }

  async fn wait_data(&mut self) -> Result<u32, Error<R::Error>> {
    let mut polls = 0;
    while RDY.is_set(self.read(RDY).await?) {
      polls += 1;
      if polls >= MAX_READY_POLLS {
        #[cfg(feature = "defmt")]
        defmt::warn!("AD7124: no conversion after {} polls", polls);
        return Err(Error::NotReady);
      }
    }
    Ok(DATA.get(self.read(DATA).await?))
  }

  /// Output data rate of `channel` in Hz.
  pub async fn odr(&mut self, channel: u8) -> Result<f32, Error<R::Error>> {
    let setup = setup(channel)?;
    let power = self.power_mode().await?.into_bits();
    let reg = self.read(FILTER.nth(setup)).await?;
    Ok(decode_odr(
      FILTER.get(reg) as u8,
      POST_FILTER.get(reg) as u8,
      FS.get(reg) as u16,
      power,
      SINGLE_CYCLE.is_set(reg),
    )?)
  }

  /// Program the rate divider of `channel` for `hz`, keeping the filter type.
  pub async fn set_odr(&mut self, channel: u8, hz: f32) -> Result<Encoded<u16>, Error<R::Error>> {
    let setup = setup(channel)?;
    if !(hz.is_finite() && hz > 0.0) {
      return Err(Error::InvalidValue);
    }
    let power = self.power_mode().await?.into_bits();
    let field = FS.nth(setup);
    let reg = self.read(field).await?;
    let fs = encode_odr_to_fs(hz, FILTER.get(reg) as u8, power, SINGLE_CYCLE.is_set(reg));
    if fs.is_clamped() {
      #[cfg(feature = "defmt")]
      defmt::warn!("AD7124 ch{}: {} Hz out of reach, FS saturated to {}", channel, hz, fs.value());
    }
    self.write(field, field.set(reg, fs.value().into())).await?;
    Ok(fs)
  }

  /// -3 dB cutoff of `channel` in Hz. Only defined for the sinc filter types.
  pub async fn filter_cutoff(&mut self, channel: u8) -> Result<f32, Error<R::Error>> {
    let setup = setup(channel)?;
    let odr = self.odr(channel).await?;
    let reg = self.read(FILTER.nth(setup)).await?;
    Ok(decode_filter_cutoff_3db(FILTER.get(reg) as u8, odr)?)
  }

  /// Select the filter type and data rate of `channel` for a -3 dB cutoff.
  ///
  /// Returns the programmed filter type and rate divider.
  pub async fn set_filter_cutoff(&mut self, channel: u8, hz: f32) -> Result<(u8, Encoded<u16>), Error<R::Error>> {
    let setup = setup(channel)?;
    if !(hz.is_finite() && hz > 0.0) {
      return Err(Error::InvalidValue);
    }
    let (select, odr) = encode_cutoff_to_filter_and_odr(hz);
    self.modify(FILTER.nth(setup), select.into()).await?;
    #[cfg(feature = "defmt")]
    defmt::debug!("AD7124 ch{}: filter {} for {} Hz cutoff", channel, select, hz);
    let fs = self.set_odr(channel, odr).await?;
    Ok((select, fs))
  }

  /// Volts per LSB of `channel`.
  pub async fn scale(&mut self, channel: u8) -> Result<f32, Error<R::Error>> {
    let setup = setup(channel)?;
    let reg = self.read(PGA.nth(setup)).await?;
    Ok(decode_scale(PGA.get(reg) as u8, BIPOLAR.is_set(reg), self.config.vref_mv, self.config.bit_depth))
  }

  /// Select the gain whose scale is nearest to `volts_per_lsb`. Returns the new
  /// `PGA` field value.
  pub async fn set_scale(&mut self, channel: u8, volts_per_lsb: f32) -> Result<u8, Error<R::Error>> {
    let setup = setup(channel)?;
    if !(volts_per_lsb.is_finite() && volts_per_lsb > 0.0) {
      return Err(Error::InvalidValue);
    }
    let field = PGA.nth(setup);
    let reg = self.read(field).await?;
    let pga = encode_scale_to_gain(volts_per_lsb, BIPOLAR.is_set(reg), self.config.vref_mv, self.config.bit_depth);
    self.write(field, field.set(reg, pga.into())).await?;
    #[cfg(feature = "defmt")]
    defmt::debug!("AD7124 ch{}: gain -> {}", channel, gain(pga));
    Ok(pga)
  }

  /// Differential input span of `channel` in volts at its current gain.
  pub async fn full_scale_voltage(&mut self, channel: u8) -> Result<f32, Error<R::Error>> {
    let setup = setup(channel)?;
    let reg = self.read(PGA.nth(setup)).await?;
    Ok(full_scale_voltage(PGA.get(reg) as u8, self.config.vref_mv))
  }

  /// Raw offset calibration coefficient of `channel`.
  pub async fn offset(&mut self, channel: u8) -> Result<u32, Error<R::Error>> {
    let field = OFFSET.nth(setup(channel)?);
    Ok(field.get(self.read(field).await?))
  }

  /// Write the offset calibration coefficient of `channel`. Values wider than
  /// the register saturate.
  pub async fn set_offset(&mut self, channel: u8, value: u32) -> Result<Encoded<u32>, Error<R::Error>> {
    let field = OFFSET.nth(setup(channel)?);
    let code = if value > field.max() { Encoded::Clamped(field.max()) } else { Encoded::Exact(value) };
    self.write(field, code.value()).await?;
    Ok(code)
  }

  async fn read(&mut self, field: Field) -> Result<u32, Error<R::Error>> {
    let width = field.width;
    self.io.read_register(field.reg, width).await.map(|v| v & width.mask()).map_err(Error::Bus)
  }

  async fn write(&mut self, field: Field, reg: u32) -> Result<(), Error<R::Error>> {
    let width = field.width;
    self.io.write_register(field.reg, width, reg & width.mask()).await.map_err(Error::Bus)
  }

  async fn modify(&mut self, field: Field, value: u32) -> Result<(), Error<R::Error>> {
    let reg = self.read(field).await?;
    self.write(field, field.set(reg, value)).await
  }
}

/// Setup index bound to `channel`.
fn setup<E>(channel: u8) -> Result<u8, Error<E>> {
  if channel < CHANNELS {
    Ok(channel)
  } else {
    Err(Error::InvalidChannel(channel))
  }
}

#[cfg(test)]
mod tests {
  use futures::executor::block_on;

  use super::*;
  use crate::testing::MockRegisters;

  const STATUS: u8 = 0x00;
  const ADC_CONTROL: u8 = 0x01;
  const DATA_REG: u8 = 0x02;
  const CHANNEL_2: u8 = 0x0B;
  const CONFIG_2: u8 = 0x1B;
  const FILTER_0: u8 = 0x21;
  const FILTER_3: u8 = 0x24;
  const OFFSET_5: u8 = 0x2E;

  const MID_POWER: u32 = 0b01 << 6;

  fn session(io: MockRegisters) -> Ad7124<MockRegisters> {
    Ad7124::new(io, Ad7124Config::new())
  }

  #[test]
  fn read_raw_enables_channel_for_one_conversion() {
    let io = MockRegisters::default().with_reg(CHANNEL_2, 0x0043).with_reg(DATA_REG, 0x12_3456);
    let mut dev = session(io);
    assert_eq!(block_on(dev.read_raw(2)).expect("raw"), 0x12_3456);
    assert_eq!(dev.io.writes(), &[(CHANNEL_2, 0x8043), (CHANNEL_2, 0x0043)]);
  }

  #[test]
  fn read_raw_restores_channel_when_never_ready() {
    let io = MockRegisters::default().with_reg(STATUS, 0x80).with_reg(CHANNEL_2, 0x0043);
    let mut dev = session(io);
    assert!(matches!(block_on(dev.read_raw(2)), Err(Error::NotReady)));
    assert_eq!(dev.io.reg(CHANNEL_2), 0x0043);
    assert!(matches!(block_on(dev.read_raw(8)), Err(Error::InvalidChannel(8))));
  }

  #[test]
  fn odr_reads_filter_and_power_mode() {
    let io = MockRegisters::default().with_reg(ADC_CONTROL, MID_POWER).with_reg(FILTER_3, 480);
    let mut dev = session(io);
    let odr = block_on(dev.odr(3)).expect("odr");
    assert!(libm::fabsf(odr - 10.0) < 1e-3);
  }

  #[test]
  fn set_odr_only_touches_fs() {
    // sinc3, single cycle, post filter 0b011, FS = 0x7FF
    let io = MockRegisters::default().with_reg(ADC_CONTROL, MID_POWER).with_reg(FILTER_0, 0x0047_07FF);
    let mut dev = session(io);
    // 153600 / (96 * 100) = 16
    let fs = block_on(dev.set_odr(0, 100.0)).expect("set odr");
    assert_eq!(fs, Encoded::Exact(16));
    assert_eq!(dev.io.writes(), &[(FILTER_0, 0x0047_0010)]);
  }

  #[test]
  fn set_odr_saturates_and_rejects_non_positive() {
    let mut dev = session(MockRegisters::default().with_reg(ADC_CONTROL, MID_POWER));
    assert_eq!(block_on(dev.set_odr(1, 1e9)).expect("set odr"), Encoded::Clamped(1));
    assert!(matches!(block_on(dev.set_odr(1, 0.0)), Err(Error::InvalidValue)));
    assert!(matches!(block_on(dev.set_odr(1, f32::INFINITY)), Err(Error::InvalidValue)));
    assert_eq!(dev.io.writes().len(), 1);
  }

  #[test]
  fn zero_divider_is_an_invalid_filter() {
    let mut dev = session(MockRegisters::default());
    assert!(matches!(block_on(dev.odr(0)), Err(Error::InvalidFilterConfig)));
  }

  #[test]
  fn post_filter_has_rate_but_no_cutoff() {
    let reg = (u32::from(filter::POST) << 21) | (0b101 << 17);
    let mut dev = session(MockRegisters::default().with_reg(FILTER_0, reg));
    assert_eq!(block_on(dev.odr(0)).expect("odr"), 20.0);
    assert!(matches!(block_on(dev.filter_cutoff(0)), Err(Error::InvalidFilterConfig)));
  }

  #[test]
  fn set_filter_cutoff_programs_filter_then_rate() {
    let io = MockRegisters::default().with_reg(ADC_CONTROL, MID_POWER).with_reg(FILTER_0, 0x0000_0180);
    let mut dev = session(io);
    let (select, fs) = block_on(dev.set_filter_cutoff(0, 50.0)).expect("cutoff");
    assert_eq!(select, filter::SINC3);
    // 153600 / (32 * 50000 / 262) = 25.15
    assert_eq!(fs, Encoded::Exact(25));
    assert_eq!(dev.io.reg(FILTER_0), (u32::from(filter::SINC3) << 21) | 25);

    // The divider rounds, so the achieved cutoff is 192 Hz * 0.230.
    let cutoff = block_on(dev.filter_cutoff(0)).expect("cutoff");
    assert!(libm::fabsf(cutoff - 44.16) < 1e-3);
  }

  #[test]
  fn scale_follows_gain_and_polarity() {
    let io = MockRegisters::default().with_reg(CONFIG_2, (1 << 11) | 3);
    let mut dev = session(io);
    assert_eq!(block_on(dev.scale(2)).expect("scale"), 2.5 / 67_108_864.0);
    assert_eq!(block_on(dev.full_scale_voltage(2)).expect("fs"), 0.3125);
  }

  #[test]
  fn set_scale_picks_nearest_gain() {
    let io = MockRegisters::default().with_reg(CONFIG_2, 1 << 11);
    let mut dev = session(io);
    let target = decode_scale(5, true, 2500.0, 24);
    assert_eq!(block_on(dev.set_scale(2, target)).expect("set scale"), 5);
    assert_eq!(dev.io.reg(CONFIG_2), (1 << 11) | 5);
    assert!(matches!(block_on(dev.set_scale(2, -1.0)), Err(Error::InvalidValue)));
  }

  #[test]
  fn vref_comes_from_config() {
    let mut dev = Ad7124::new(MockRegisters::default(), Ad7124Config::new().with_vref_mv(1250.0));
    assert_eq!(block_on(dev.full_scale_voltage(0)).expect("fs"), 1.25);
  }

  #[test]
  fn offset_saturates_at_24_bits() {
    let mut dev = session(MockRegisters::default());
    assert_eq!(block_on(dev.set_offset(5, 0x80_0000)).expect("offset"), Encoded::Exact(0x80_0000));
    assert_eq!(block_on(dev.offset(5)).expect("offset"), 0x80_0000);
    assert_eq!(block_on(dev.set_offset(5, 0x1FF_FFFF)).expect("offset"), Encoded::Clamped(0xFF_FFFF));
    assert_eq!(dev.io.reg(OFFSET_5), 0xFF_FFFF);
  }

  #[test]
  fn channels_beyond_the_setups_are_rejected() {
    let mut dev = session(MockRegisters::default());
    assert!(matches!(block_on(dev.odr(8)), Err(Error::InvalidChannel(8))));
    assert!(matches!(block_on(dev.filter_cutoff(8)), Err(Error::InvalidChannel(8))));
    assert!(matches!(block_on(dev.set_scale(9, 1e-6)), Err(Error::InvalidChannel(9))));
    assert!(matches!(block_on(dev.offset(255)), Err(Error::InvalidChannel(255))));
    assert!(dev.io.writes().is_empty());
  }
}
