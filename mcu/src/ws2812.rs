// Note: based on https://github.com/smart-leds-rs/ws2812-spi-rs

use esp_hal::DriverMode;
use smart_leds::RGB8;
use smart_leds_trait::SmartLedsWrite;

pub const WS2812_RESET_BYTES: usize = 140;

/// SPI bytes per pixel: 3 color bytes, 4 SPI bytes each.
pub const BYTES_PER_PIXEL: usize = 12;

pub const fn buffer_size(pixels: usize) -> usize {
    BYTES_PER_PIXEL * pixels + WS2812_RESET_BYTES
}

/// WS2811/WS2812 strip driven from the MOSI line of a DMA SPI bus.
///
/// Pixels past the capacity of the encode buffer are dropped.
#[allow(non_camel_case_types)]
pub struct WS2812_Spi<'spi, 'buffer, Mode: DriverMode, const B: usize> {
    pub spi: esp_hal::spi::master::SpiDmaBus<'spi, Mode>,
    pub buffer: &'buffer mut [u8; B],
}

impl<'spi, 'buffer, Mode: DriverMode, const B: usize> SmartLedsWrite
    for WS2812_Spi<'spi, 'buffer, Mode, B>
{
    type Error = esp_hal::spi::Error;
    type Color = RGB8;

    fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        let len = encode_sequence(self.buffer, iterator.into_iter().map(Into::into));
        self.spi.write(&self.buffer[..len])?;
        Ok(())
    }
}

// ----------------------------------------------------------------

fn encode_byte(buffer: &mut [u8], mut data: u8) {
    // Send two bits in one spi byte. High time first, then the low time
    // The maximum for T0H is 500ns, the minimum for one bit 1063 ns.
    // These result in the upper and lower spi frequency limits
    let patterns = [0b1000_1000, 0b1000_1110, 0b1110_1000, 0b1110_1110];
    for out in buffer.iter_mut().take(4) {
        let bits = (data & 0b1100_0000) >> 6;
        *out = patterns[bits as usize];
        data <<= 2;
    }
}

/// GRB on the wire.
fn encode_pixel(buffer: &mut [u8], pixel: RGB8) {
    encode_byte(&mut buffer[..4], pixel.g);
    encode_byte(&mut buffer[4..8], pixel.r);
    encode_byte(&mut buffer[8..12], pixel.b);
}

/// Encodes as many pixels as fit, followed by the reset tail. Returns the
/// number of bytes to send.
pub fn encode_sequence<const B: usize>(
    buffer: &mut [u8; B],
    pixels: impl Iterator<Item = RGB8>,
) -> usize {
    let capacity = B.saturating_sub(WS2812_RESET_BYTES) / BYTES_PER_PIXEL;
    let mut index = 0;

    for pixel in pixels.take(capacity) {
        encode_pixel(&mut buffer[index..index + BYTES_PER_PIXEL], pixel);
        index += BYTES_PER_PIXEL;
    }
    buffer[index..index + WS2812_RESET_BYTES].fill(0);
    index + WS2812_RESET_BYTES
}
