#![cfg_attr(not(test), no_std)]
//! MiCS-VZ-89TE driver.
//!
//! Example:
//!
//! ```
//! # use embedded_hal_mock::eh1::delay::NoopDelay;
//! # use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};
//! # use vz89te_driver::{I2cTransport, OutputMode, VZ89TE, DEFAULT_ADDRESS};
//! # let expectations = vec![
//! #     // GetStatus request: command, four zeroes, checksum.
//! #     Transaction::write(DEFAULT_ADDRESS, vec![0x0C, 0x00, 0x00, 0x00, 0x00, 0xF3]),
//! #     // VOC, CO2, raw MSB, raw MID, raw LSB, status, checksum.
//! #     Transaction::read(DEFAULT_ADDRESS, vec![0x89, 0x64, 0x01, 0x02, 0x03, 0x00, 0x0C]),
//! # ];
//! # let mock_i2c = I2cMock::new(&expectations);
//! # let mock_delay = NoopDelay::new();
//! let transport = I2cTransport::new(mock_i2c, mock_delay);
//! let mut vz89te = VZ89TE::new(OutputMode::I2c, DEFAULT_ADDRESS, transport).unwrap();
//! let measurement = vz89te.poll().unwrap();
//!
//! println!("VOC (vz89te): {:.0} ppb", measurement.voc);
//! println!("CO2 (vz89te): {:.0} ppm", measurement.co2);
//! # let (mut mock_i2c, _delay) = vz89te.destroy().unwrap().destroy();
//! # mock_i2c.done();
//! ```
//!
//! Every operation is one exchange with the sensor. A six byte request goes out, and after a 2ms
//! pause, seven bytes come back:
//!
//! ```text
//!        poll / request_revision / request_calibration
//!                         │
//!                         ▼
//!     request_frame(Command) ─► [cmd, 0, 0, 0, 0, checksum]
//!                         │
//!                         ▼
//!          Transport::exchange (write, wait 2 ms, read 7 bytes)
//!                         │
//!                         ▼
//!            Response stored in the handle's buffer
//!                         │
//!                         ▼
//!        poll only: checksum good ─► No ─► Error::ChecksumMismatch
//!                         │                (stored VOC/CO2 untouched)
//!                         ▼
//!                        Yes
//!                         │
//!                         ▼
//!           Calc VOC, CO2 and store them
//! ```
//!
//! Only `poll` gates on the checksum. The revision and calibration requests hand back whatever the
//! sensor sent, use `is_valid()` on the returned frame if you care.
//!
//! The handle is not safe to share: it reuses its buffer for every exchange. Give each task its own
//! handle, or put it behind a mutex.

pub mod checksum;
pub mod frame;
pub mod transport;

pub use checksum::{compute_checksum, verify_checksum};
pub use frame::{
    decode, request_frame, CalibrationFrame, Command, FrameKind, Response, RevisionFrame, StatusFrame,
    REQUEST_SIZE, RESPONSE_SIZE,
};
pub use transport::{I2cTransport, Transport, TURNAROUND_DELAY_MS};

/// Lowest I2C address the VZ-89TE can be configured to.
pub const MIN_ADDRESS: u8 = 0x70;
/// Highest I2C address the VZ-89TE can be configured to.
pub const MAX_ADDRESS: u8 = 0x77;
/// The VZ-89TE's factory I2C address. Also the address used in PWM mode.
pub const DEFAULT_ADDRESS: u8 = MIN_ADDRESS;

/// How the sensor is wired up.
///
/// In PWM mode the sensor is not addressed, so the address is always `DEFAULT_ADDRESS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub enum OutputMode {
    I2c = 0,
    Pwm = 1,
}

impl OutputMode {
    /// Turn a raw mode code into an `OutputMode`: 0 is I2C, 1 is PWM. Anything else is
    /// `Error::InvalidOutputMode`.
    pub fn from_code<E>(code: u8) -> Result<Self, Error<E>> {
        match code {
            0 => Ok(OutputMode::I2c),
            1 => Ok(OutputMode::Pwm),
            _ => Err(Error::InvalidOutputMode),
        }
    }
}

/// SensorStatus is the error/status byte from a status frame.
///
/// Zero means the sensor is happy. The meaning of the individual bits is not documented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub struct SensorStatus(pub u8);

impl SensorStatus {
    /// Create a new SensorStatus from a VZ-89TE status byte.
    pub fn new(status: u8) -> Self {
        SensorStatus(status)
    }

    /// Check if the sensor reported no error.
    pub fn is_ok(self) -> bool {
        self.0 == 0
    }
}

/// Measurement is one checksum-verified reading from the VZ-89TE sensor.
///
/// This is returned from the `poll` method. You get:
/// * VOC level in ppb
/// * CO2 equivalent level in ppm
/// * the raw sensor resistance, both as existing drivers compute it and properly scaled to Ohms
/// * the sensor's status byte
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub struct Measurement {
    pub voc: f64,
    pub co2: f64,
    pub raw_resistance: u32,
    pub raw_resistance_ohms: u32,
    pub status: SensorStatus,
}

impl Measurement {
    fn from_frame(frame: &StatusFrame) -> Self {
        Measurement {
            voc: frame.voc_ppb(),
            co2: frame.co2_ppm(),
            raw_resistance: frame.raw_resistance(),
            raw_resistance_ohms: frame.raw_resistance_ohms(),
            status: frame.status(),
        }
    }
}

/// Driver errors.
///
/// There is no error for a missing device handle: every method borrows the handle, so there is
/// always one.
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The transport failed to complete the exchange
    Transport(E),
    /// The transport has been released, see `release_transport`
    MissingTransport,
    /// I2C address outside of `MIN_ADDRESS..=MAX_ADDRESS`
    InvalidAddress,
    /// Output mode code that is neither I2C nor PWM
    InvalidOutputMode,
    /// Checksum of a status frame did not match its contents
    ChecksumMismatch { received: u8, computed: u8 },
}

fn check_address<E>(address: u8) -> Result<u8, Error<E>> {
    if (MIN_ADDRESS..=MAX_ADDRESS).contains(&address) {
        Ok(address)
    } else {
        Err(Error::InvalidAddress)
    }
}

/// A VZ-89TE sensor reached through the transport `T`.
///
/// The handle keeps the last measurement that passed its checksum, plus the raw bytes of the last
/// response whatever it was.
pub struct VZ89TE<T>
where
    T: Transport,
{
    transport: Option<T>,
    output: OutputMode,
    address: u8,
    status: SensorStatus,
    voc: f64,
    co2: f64,
    buffer: [u8; RESPONSE_SIZE],
}

impl<T> VZ89TE<T>
where
    T: Transport,
{
    /// Initializes the VZ-89TE driver.
    ///
    /// This consumes the transport `T`. In I2C mode `address` must be within
    /// `MIN_ADDRESS..=MAX_ADDRESS`, it will almost always be `DEFAULT_ADDRESS`. In PWM mode
    /// `address` is ignored and `DEFAULT_ADDRESS` is used.
    ///
    /// Nothing is sent to the sensor.
    pub fn new(output: OutputMode, address: u8, transport: T) -> Result<Self, Error<T::Error>> {
        let address = match output {
            OutputMode::I2c => check_address(address)?,
            OutputMode::Pwm => DEFAULT_ADDRESS,
        };

        Ok(VZ89TE {
            transport: Some(transport),
            output,
            address,
            status: SensorStatus::default(),
            voc: 0.0,
            co2: 0.0,
            buffer: [0u8; RESPONSE_SIZE],
        })
    }

    /// Switch output mode. Switching to PWM resets the address to `DEFAULT_ADDRESS`.
    pub fn set_output_mode(&mut self, output: OutputMode) {
        self.output = output;
        if output == OutputMode::Pwm {
            self.address = DEFAULT_ADDRESS;
        }
    }

    /// Change the I2C address used to reach the sensor.
    ///
    /// In PWM mode the address is still checked, but stays at `DEFAULT_ADDRESS`.
    pub fn set_address(&mut self, address: u8) -> Result<(), Error<T::Error>> {
        let address = check_address(address)?;
        if self.output == OutputMode::I2c {
            self.address = address;
        }

        Ok(())
    }

    /// Install a new transport, returning the old one if there was one.
    pub fn set_transport(&mut self, transport: T) -> Option<T> {
        self.transport.replace(transport)
    }

    /// Take the transport out of the handle. Until `set_transport` is called, every request fails
    /// with `Error::MissingTransport`.
    pub fn release_transport(&mut self) -> Option<T> {
        self.transport.take()
    }

    /// Ask the sensor for VOC and CO2 levels.
    ///
    /// The response's checksum is checked before anything is stored. On a mismatch you get
    /// `Error::ChecksumMismatch` and the previously stored VOC, CO2 and status stay as they were.
    /// The raw buffer does hold the bad frame though. No retries are made, call `poll` again on
    /// your next cycle.
    pub fn poll(&mut self) -> Result<Measurement, Error<T::Error>> {
        self.exchange(Command::GetStatus)?;

        let frame = StatusFrame(self.buffer);
        let computed = compute_checksum(&self.buffer[..RESPONSE_SIZE - 1]);
        let received = frame.checksum();
        if received != computed {
            #[cfg(feature = "use-defmt")]
            defmt::warn!("vz89te: status checksum mismatch, received {=u8:#x}, computed {=u8:#x}", received, computed);
            return Err(Error::ChecksumMismatch { received, computed });
        }

        let measurement = Measurement::from_frame(&frame);
        self.status = measurement.status;
        self.voc = measurement.voc;
        self.co2 = measurement.co2;

        Ok(measurement)
    }

    /// Ask the sensor for its production date and revision.
    ///
    /// The checksum is not checked, call `is_valid` on the returned frame for that. The response
    /// also stays in the handle, so `year`, `month`, `day` and `revision` read from it until the
    /// next request.
    pub fn request_revision(&mut self) -> Result<RevisionFrame, Error<T::Error>> {
        self.exchange(Command::GetRevision)?;

        Ok(RevisionFrame(self.buffer))
    }

    /// Ask the sensor for its R0 calibration value.
    ///
    /// Like `request_revision`, there is no checksum gate here. `r0_calibration` reads from the
    /// stored response until the next request.
    pub fn request_calibration(&mut self) -> Result<CalibrationFrame, Error<T::Error>> {
        self.exchange(Command::GetR0)?;

        Ok(CalibrationFrame(self.buffer))
    }

    /// Send `command` and put the response in the buffer.
    fn exchange(&mut self, command: Command) -> Result<(), Error<T::Error>> {
        let transport = self.transport.as_mut().ok_or(Error::MissingTransport)?;
        let request = request_frame(command);

        #[cfg(feature = "use-defmt")]
        defmt::trace!("vz89te: {} to {=u8:#x}", command, self.address);

        transport
            .exchange(self.address, &request, &mut self.buffer)
            .map_err(Error::Transport)
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// VOC in ppb from the last good `poll`. 0.0 before the first one.
    pub fn voc(&self) -> f64 {
        self.voc
    }

    /// CO2 equivalent in ppm from the last good `poll`. 0.0 before the first one.
    pub fn co2(&self) -> f64 {
        self.co2
    }

    /// Status byte from the last good `poll`.
    pub fn status(&self) -> SensorStatus {
        self.status
    }

    // The accessors below read straight from the last response. They only make sense after the
    // matching request: after `request_revision`, `r0_calibration` is meaningless, and so on.

    /// Raw resistance from the last response, see `StatusFrame::raw_resistance`.
    pub fn raw_resistance(&self) -> u32 {
        StatusFrame(self.buffer).raw_resistance()
    }

    /// Raw resistance in Ohms from the last response, see `StatusFrame::raw_resistance_ohms`.
    pub fn raw_resistance_ohms(&self) -> u32 {
        StatusFrame(self.buffer).raw_resistance_ohms()
    }

    pub fn r0_calibration(&self) -> u16 {
        CalibrationFrame(self.buffer).r0()
    }

    pub fn year(&self) -> u8 {
        RevisionFrame(self.buffer).year()
    }

    pub fn month(&self) -> u8 {
        RevisionFrame(self.buffer).month()
    }

    pub fn day(&self) -> u8 {
        RevisionFrame(self.buffer).day()
    }

    pub fn revision(&self) -> char {
        RevisionFrame(self.buffer).revision()
    }

    /// Checksum byte of the last response, as received.
    pub fn checksum(&self) -> u8 {
        self.buffer[RESPONSE_SIZE - 1]
    }

    /// The last response, all seven bytes.
    pub fn buffer(&self) -> &[u8; RESPONSE_SIZE] {
        &self.buffer
    }

    /// Destroys this driver and releases the transport `T`, if it still has one.
    pub fn destroy(self) -> Option<T> {
        self.transport
    }
}
