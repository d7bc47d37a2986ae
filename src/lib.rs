#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Async, `no_std` register transcoding for two Analog Devices converters:
//!
//! - the AD7156 two-channel capacitance-to-digital converter (I²C), and
//! - the AD7124 eight-setup 24-bit sigma-delta ADC (SPI).
//!
//! Both devices expose physical quantities (picofarads, hertz, volts per LSB)
//! through packed register fields. This crate converts between the two
//! representations, saturating requests the hardware cannot meet and reporting
//! when it did so, and wraps each device in a small session that owns the bus
//! and reads, modifies and writes the right fields.
//!
//! - Pure conversions ([`ad7156::decode_capacitance`], [`ad7124::decode_odr`],
//!   [`ad7124::encode_scale_to_gain`], ...) are usable without a bus.
//! - Sessions are generic over [`RegisterIo`]; [`I2cRegisters`] and
//!   [`SpiRegisters`] adapt the `embedded-hal-async` 1.0 bus traits.
//!
//! ```no_run
//! use embedded_hal_async::i2c::{I2c, SevenBitAddress};
//! use ad71xx::ad7156::{Ad7156, Ad7156Config, Channel, Range};
//!
//! async fn example<I2C, E>(i2c: I2C) -> Result<f32, ad71xx::Error<E>>
//! where
//!   I2C: I2c<SevenBitAddress, Error = E>,
//! {
//!   let mut cdc = Ad7156::new_i2c(i2c, Ad7156Config::new());
//!   cdc.initialize().await?;
//!   cdc.set_range(Channel::One, Range::Pf4).await?;
//!   cdc.set_threshold(Channel::One, 1.5).await?;
//!   cdc.wait_capacitance(Channel::One).await
//! }
//! ```
pub mod ad7124;
pub mod ad7156;
mod field;
mod rw;
#[cfg(test)]
mod testing;

pub use ad7124::{Ad7124, Ad7124Config, InvalidFilterConfig};
pub use ad7156::{Ad7156, Ad7156Config};
pub use field::{Encoded, Field, Width};
pub use rw::{I2cRegisters, RegisterIo, SpiRegisters};

/// Errors returned by the device sessions.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
  /// Register transfer failed with the underlying transport error.
  Bus(E),
  /// The filter configuration read from the device has no defined rate or cutoff.
  InvalidFilterConfig,
  /// Channel index outside the device's channel range.
  InvalidChannel(u8),
  /// Requested quantity is not a finite value the device can aim for.
  InvalidValue,
  /// The device reported an unexpected chip identifier during bring-up.
  InvalidChipId(u8),
  /// No conversion result became ready within the polling bound.
  NotReady,
}

impl<E> From<InvalidFilterConfig> for Error<E> {
  fn from(_: InvalidFilterConfig) -> Self {
    Self::InvalidFilterConfig
  }
}
