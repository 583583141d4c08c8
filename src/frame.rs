//! Request framing and response decoding.
//!
//! All requests to the VZ-89TE are six bytes, all responses seven. A request is
//!
//! ```text
//!     [command, 0x00, 0x00, 0x00, 0x00, checksum]
//! ```
//!
//! The response does not say what it is. How to read it depends on which command was sent:
//!
//! | Command      | Byte 0 | Byte 1       | Byte 2  | Byte 3   | Byte 4  | Byte 5 | Byte 6   |
//! |--------------|--------|--------------|---------|----------|---------|--------|----------|
//! | GetStatus    | VOC    | CO2          | Raw MSB | Raw MID  | Raw LSB | Status | Checksum |
//! | GetRevision  | Year   | Month        | Day     | Rev char | 0       | 0      | Checksum |
//! | GetR0        | R0 LSB | R0 MSB & 0x3F| 0       | 0        | 0       | 0      | Checksum |

use crate::checksum::{compute_checksum, verify_checksum};
use crate::SensorStatus;

/// Size of a request frame, including the checksum byte.
pub const REQUEST_SIZE: usize = 6;

/// Size of a response frame, including the checksum byte.
pub const RESPONSE_SIZE: usize = 7;

// Status frame layout.
const VOC_LEVEL: usize = 0;
const CO2_LEVEL: usize = 1;
const RAW_MSB: usize = 2;
const RAW_MID: usize = 3;
const RAW_LSB: usize = 4;
const STATUS: usize = 5;

// Revision frame layout.
const YEAR: usize = 0;
const MONTH: usize = 1;
const DAY: usize = 2;
const REVISION_CHAR: usize = 3;

// Calibration frame layout.
const R0_LSB: usize = 0;
const R0_MSB: usize = 1;
// The top two bits of the R0 MSB are reserved.
const R0_MSB_MASK: u8 = 0b0011_1111;

const CHECKSUM: usize = RESPONSE_SIZE - 1;

// The sensor reports VOC and CO2 as one byte each. 13 is subtracted from the raw byte before
// scaling, and both channels share the 229 divisor.
const INCOMING_OFFSET: f64 = 13.0;
const DIVISOR: f64 = 229.0;
const VOC_CONSTANT: f64 = 1000.0;
const VOC_OFFSET: f64 = 0.0;
const CO2_CONSTANT: f64 = 1600.0;
const CO2_OFFSET: f64 = 400.0;
const VOC_SCALE: f64 = (VOC_CONSTANT / DIVISOR) + VOC_OFFSET;
const CO2_SCALE: f64 = (CO2_CONSTANT / DIVISOR) + CO2_OFFSET;

/// Commands that can be sent to the VZ-89TE sensor.
///
/// Only `GetStatus`, `GetRevision` and `GetR0` are ever sent by this driver. The remaining codes
/// are listed so that they can be recognised, but they must not be sent: `SetPpmCo2` recalibrates
/// the sensor, and the reserved codes overwrite its factory calibration with no way back. Nothing
/// stops you from framing them with [request_frame], keeping them off the bus is up to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    SetPpmCo2 = 0x08, // Send a ppm CO2 value for recalibration.
    Reserved09 = 0x09,
    Reserved0A = 0x0A,
    Reserved0B = 0x0B,
    GetStatus = 0x0C, // VOC, CO2, raw resistance and status. 6 bytes + checksum.
    GetRevision = 0x0D, // Production date and revision character. 6 bytes + checksum.
    Reserved0E = 0x0E, // Overwrites calibration.
    Reserved0F = 0x0F, // Overwrites calibration.
    GetR0 = 0x10, // R0 calibration value. 6 bytes + checksum.
}

impl Command {
    /// True for the commands that change the state of the sensor and must not be sent.
    pub fn is_reserved(self) -> bool {
        self.response_kind().is_none()
    }

    /// The kind of response frame this command produces. `None` for reserved commands.
    pub fn response_kind(self) -> Option<FrameKind> {
        match self {
            Command::GetStatus => Some(FrameKind::Status),
            Command::GetRevision => Some(FrameKind::Revision),
            Command::GetR0 => Some(FrameKind::Calibration),
            _ => None,
        }
    }
}

/// Build the six byte request frame for `command`.
///
/// A fresh frame is returned on every call.
pub fn request_frame(command: Command) -> [u8; REQUEST_SIZE] {
    let mut frame = [0u8; REQUEST_SIZE];
    frame[0] = command as u8;
    frame[REQUEST_SIZE - 1] = compute_checksum(&frame[..REQUEST_SIZE - 1]);
    frame
}

/// The three ways a response frame can be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub enum FrameKind {
    Status,
    Revision,
    Calibration,
}

/// A response frame, interpreted according to the command that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub enum Response {
    Status(StatusFrame),
    Revision(RevisionFrame),
    Calibration(CalibrationFrame),
}

impl Response {
    /// The raw bytes, checksum included.
    pub fn bytes(&self) -> &[u8; RESPONSE_SIZE] {
        match self {
            Response::Status(frame) => &frame.0,
            Response::Revision(frame) => &frame.0,
            Response::Calibration(frame) => &frame.0,
        }
    }

    /// Does the checksum byte match the rest of the frame?
    pub fn is_valid(&self) -> bool {
        verify_checksum(self.bytes())
    }
}

/// Interpret `bytes` as a response frame of the given kind.
///
/// The checksum is not checked here: a frame with a bad checksum decodes to garbage values. Call
/// `is_valid` before trusting what comes out.
pub fn decode(kind: FrameKind, bytes: [u8; RESPONSE_SIZE]) -> Response {
    match kind {
        FrameKind::Status => Response::Status(StatusFrame(bytes)),
        FrameKind::Revision => Response::Revision(RevisionFrame(bytes)),
        FrameKind::Calibration => Response::Calibration(CalibrationFrame(bytes)),
    }
}

/// Response to `Command::GetStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub struct StatusFrame(pub [u8; RESPONSE_SIZE]);

impl StatusFrame {
    /// VOC level in ppb.
    pub fn voc_ppb(&self) -> f64 {
        (self.0[VOC_LEVEL] as f64 - INCOMING_OFFSET) * VOC_SCALE
    }

    /// CO2 equivalent level in ppm.
    pub fn co2_ppm(&self) -> f64 {
        (self.0[CO2_LEVEL] as f64 - INCOMING_OFFSET) * CO2_SCALE
    }

    /// Raw sensor resistance, combined the way existing VZ-89TE drivers do it.
    ///
    /// Note that the x10 scale only applies to the LSB, and the scaled LSB is OR-ed over the MID
    /// byte rather than added. The datasheet describes the whole value as scaled by 10, which is
    /// what [raw_resistance_ohms](StatusFrame::raw_resistance_ohms) gives you. This one is kept so
    /// that readings can be compared with other drivers.
    pub fn raw_resistance(&self) -> u32 {
        ((self.0[RAW_MSB] as u32) << 16)
            | ((self.0[RAW_MID] as u32) << 8)
            | ((self.0[RAW_LSB] as u32) * 10)
    }

    /// Raw sensor resistance in Ohms: the 24 bit value scaled by 10.
    pub fn raw_resistance_ohms(&self) -> u32 {
        let raw: u32 = ((self.0[RAW_MSB] as u32) << 16)
            | ((self.0[RAW_MID] as u32) << 8)
            | (self.0[RAW_LSB] as u32);
        raw * 10
    }

    /// The sensor's error/status byte.
    pub fn status(&self) -> SensorStatus {
        SensorStatus::new(self.0[STATUS])
    }

    /// The checksum byte as received.
    pub fn checksum(&self) -> u8 {
        self.0[CHECKSUM]
    }

    /// Does the checksum byte match the rest of the frame?
    pub fn is_valid(&self) -> bool {
        verify_checksum(&self.0)
    }
}

/// Response to `Command::GetRevision`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub struct RevisionFrame(pub [u8; RESPONSE_SIZE]);

impl RevisionFrame {
    /// Production year, two digits.
    pub fn year(&self) -> u8 {
        self.0[YEAR]
    }

    pub fn month(&self) -> u8 {
        self.0[MONTH]
    }

    pub fn day(&self) -> u8 {
        self.0[DAY]
    }

    /// Revision, sent as a single ASCII character.
    pub fn revision(&self) -> char {
        self.0[REVISION_CHAR] as char
    }

    pub fn checksum(&self) -> u8 {
        self.0[CHECKSUM]
    }

    pub fn is_valid(&self) -> bool {
        verify_checksum(&self.0)
    }
}

/// Response to `Command::GetR0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub struct CalibrationFrame(pub [u8; RESPONSE_SIZE]);

impl CalibrationFrame {
    /// The R0 baseline resistance the sensor calibrated itself to, in kOhms.
    ///
    /// 14 bits: the two high bits of the MSB are reserved and masked off.
    pub fn r0(&self) -> u16 {
        (((self.0[R0_MSB] & R0_MSB_MASK) as u16) << 8) | (self.0[R0_LSB] as u16)
    }

    pub fn checksum(&self) -> u8 {
        self.0[CHECKSUM]
    }

    pub fn is_valid(&self) -> bool {
        verify_checksum(&self.0)
    }
}
