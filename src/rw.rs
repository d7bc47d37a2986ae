use embedded_hal::i2c::SevenBitAddress;
use embedded_hal::spi::Operation;
use embedded_hal_async::i2c::I2c;
use embedded_hal_async::spi::SpiDevice;

use crate::Width;

/// Raw register access supplied by the bus layer.
///
/// The transcoders never talk to a bus directly. Device sessions are generic over
/// this trait, so any transport (or a plain in-memory register file) can back
/// them. Errors are handed back untouched and are never retried here.
#[allow(async_fn_in_trait)]
pub trait RegisterIo {
  type Error;

  /// Read a register of the given width. The value is right-aligned.
  async fn read_register(&mut self, addr: u8, width: Width) -> Result<u32, Self::Error>;

  /// Write a register of the given width. Bits above the width are ignored.
  async fn write_register(&mut self, addr: u8, width: Width, value: u32) -> Result<(), Self::Error>;

  /// Send a bare command byte (reset and similar single-byte commands).
  async fn write_command(&mut self, cmd: u8) -> Result<(), Self::Error>;
}

fn from_be(bytes: &[u8]) -> u32 {
  bytes.iter().fold(0, |acc, b| (acc << 8) | u32::from(*b))
}

fn to_be(value: u32, width: Width) -> ([u8; 4], usize) {
  let n = width.bytes();
  let bytes = (value & width.mask()).to_be_bytes();
  let mut out = [0u8; 4];
  out[..n].copy_from_slice(&bytes[4 - n..]);
  (out, n)
}

/// Register access over I²C: address pointer byte followed by big-endian data.
pub struct I2cRegisters<I> {
  i2c: I,
  address: SevenBitAddress,
}

impl<I> I2cRegisters<I> {
  pub const fn new(i2c: I, address: SevenBitAddress) -> Self {
    Self { i2c, address }
  }

  pub fn release(self) -> I {
    self.i2c
  }
}

impl<I: I2c<SevenBitAddress>> RegisterIo for I2cRegisters<I> {
  type Error = I::Error;

  async fn read_register(&mut self, addr: u8, width: Width) -> Result<u32, Self::Error> {
    let mut buf = [0u8; 4];
    let n = width.bytes();
    self.i2c.write_read(self.address, &[addr], &mut buf[..n]).await?;
    Ok(from_be(&buf[..n]))
  }

  async fn write_register(&mut self, addr: u8, width: Width, value: u32) -> Result<(), Self::Error> {
    let (data, n) = to_be(value, width);
    let mut buf = [0u8; 5];
    buf[0] = addr;
    buf[1..=n].copy_from_slice(&data[..n]);
    self.i2c.write(self.address, &buf[..=n]).await
  }

  async fn write_command(&mut self, cmd: u8) -> Result<(), Self::Error> {
    self.i2c.write(self.address, &[cmd]).await
  }
}

const SPI_READ: u8 = 0x40;
const SPI_ADDR_MASK: u8 = 0x3F;

/// Register access over SPI: a communications byte selects the register and the
/// direction, data follows MSB first within the same transaction.
pub struct SpiRegisters<S> {
  spi: S,
}

impl<S> SpiRegisters<S> {
  pub const fn new(spi: S) -> Self {
    Self { spi }
  }

  pub fn release(self) -> S {
    self.spi
  }
}

impl<S: SpiDevice> RegisterIo for SpiRegisters<S> {
  type Error = S::Error;

  async fn read_register(&mut self, addr: u8, width: Width) -> Result<u32, Self::Error> {
    let cmd = [SPI_READ | (addr & SPI_ADDR_MASK)];
    let mut buf = [0u8; 4];
    let n = width.bytes();
    let mut ops = [Operation::Write(&cmd), Operation::Read(&mut buf[..n])];
    self.spi.transaction(&mut ops).await?;
    Ok(from_be(&buf[..n]))
  }

  async fn write_register(&mut self, addr: u8, width: Width, value: u32) -> Result<(), Self::Error> {
    let (data, n) = to_be(value, width);
    let mut buf = [0u8; 5];
    buf[0] = addr & SPI_ADDR_MASK;
    buf[1..=n].copy_from_slice(&data[..n]);
    self.spi.write(&buf[..=n]).await
  }

  async fn write_command(&mut self, cmd: u8) -> Result<(), Self::Error> {
    self.spi.write(&[cmd]).await
  }
}
