//! Moving frames to and from the sensor.
//!
//! The driver itself only frames and decodes. Getting bytes onto the bus is done by a [Transport].
//! On real hardware that is [I2cTransport], which works with any embedded-hal 1.0 I2C bus. In tests
//! it can be anything that hands back seven bytes.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

/// The sensor needs a pause between the end of the write and the start of the read.
pub const TURNAROUND_DELAY_MS: u32 = 2;

/// One request/response exchange with the sensor.
pub trait Transport {
    type Error;

    /// Send `request` to the sensor at `address`, then fill all of `response` from it.
    ///
    /// The length of `response` is the number of bytes expected back. Blocks until the exchange is
    /// done.
    fn exchange(&mut self, address: u8, request: &[u8], response: &mut [u8]) -> Result<(), Self::Error>;
}

/// A [Transport] over an I2C bus `I`, using `D` to wait out the turnaround time.
pub struct I2cTransport<I, D> {
    i2c: I,
    delay: D,
}

impl<I, D> I2cTransport<I, D>
where
    I: I2c,
    D: DelayNs,
{
    /// This consumes the I2C bus `I` and the delay `D`.
    pub fn new(i2c: I, delay: D) -> Self {
        I2cTransport { i2c, delay }
    }

    /// Destroys this transport and releases the I2C bus `I` and delay `D`.
    pub fn destroy(self) -> (I, D) {
        (self.i2c, self.delay)
    }
}

impl<I, D> Transport for I2cTransport<I, D>
where
    I: I2c,
    D: DelayNs,
{
    type Error = I::Error;

    fn exchange(&mut self, address: u8, request: &[u8], response: &mut [u8]) -> Result<(), Self::Error> {
        // Not a write_read: the sensor wants a stop and the turnaround delay between the two.
        self.i2c.write(address, request)?;
        self.delay.delay_ms(TURNAROUND_DELAY_MS);
        self.i2c.read(address, response)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{I2cTransport, Transport};
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};

    const ADDRESS: u8 = 0x70;

    /// A write of the request followed by a separate read of the response.
    #[test]
    fn exchange_writes_then_reads() {
        let expectations = vec![
            Transaction::write(ADDRESS, vec![0x0C, 0x00, 0x00, 0x00, 0x00, 0xF3]),
            Transaction::read(ADDRESS, vec![0x89, 0x64, 0x01, 0x02, 0x03, 0x00, 0x0C]),
        ];
        let mock_i2c = I2cMock::new(&expectations);

        let mut transport = I2cTransport::new(mock_i2c, NoopDelay::new());
        let mut response = [0u8; 7];
        transport
            .exchange(ADDRESS, &[0x0C, 0x00, 0x00, 0x00, 0x00, 0xF3], &mut response)
            .unwrap();
        assert_eq!(response, [0x89, 0x64, 0x01, 0x02, 0x03, 0x00, 0x0C]);

        let (mut mock, _delay) = transport.destroy();
        mock.done(); // verify expectations
    }

    /// A failed write stops the exchange, nothing is read.
    #[test]
    fn exchange_write_error() {
        let expectations = vec![
            Transaction::write(ADDRESS, vec![0x0D, 0x00, 0x00, 0x00, 0x00, 0xF2]).with_error(ErrorKind::Other),
        ];
        let mock_i2c = I2cMock::new(&expectations);

        let mut transport = I2cTransport::new(mock_i2c, NoopDelay::new());
        let mut response = [0u8; 7];
        let result = transport.exchange(ADDRESS, &[0x0D, 0x00, 0x00, 0x00, 0x00, 0xF2], &mut response);
        assert_eq!(result, Err(ErrorKind::Other));
        assert_eq!(response, [0u8; 7]);

        let (mut mock, _delay) = transport.destroy();
        mock.done(); // verify expectations
    }
}
