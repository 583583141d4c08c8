//! The VZ-89TE frame checksum.
//!
//! Every frame going to or coming from the sensor ends in one checksum byte. It is not a CRC,
//! there is no polynomial involved. It is the one's complement of the byte sum, with the high byte
//! of the sum folded back in as a carry first:
//!
//! ```text
//!     sum   = b[0] + b[1] + ... + b[n-1]        (16 bits)
//!     fold  = low_byte(sum) + high_byte(sum)    (8 bits, wrapping)
//!     check = 0xFF - fold
//! ```
//!
//! The order matters: fold, then complement. This is fixed by the sensor firmware.

/// Compute the checksum byte for `bytes`.
///
/// For a request this is run over the first five bytes of the frame, for a response over the first
/// six.
pub fn compute_checksum(bytes: &[u8]) -> u8 {
    let sum: u16 = bytes
        .iter()
        .fold(0u16, |sum, &byte| sum.wrapping_add(byte as u16));

    // Low 8 bits, then add the high byte back in as the carry.
    let folded: u8 = (sum as u8).wrapping_add((sum >> 8) as u8);

    // One's complement.
    0xFF - folded
}

/// Check a complete frame: the last byte must equal the checksum of all the bytes before it.
///
/// An empty frame has no checksum byte and never verifies.
pub fn verify_checksum(frame: &[u8]) -> bool {
    match frame.split_last() {
        Some((&received, data)) => compute_checksum(data) == received,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{compute_checksum, verify_checksum};

    /// The GET_STATUS request as sent on the wire: 0x0C, four zeroes, 0xF3.
    #[test]
    fn checksum_of_status_request() {
        assert_eq!(compute_checksum(&[0x0C, 0x00, 0x00, 0x00, 0x00]), 0xF3);
    }

    /// A sum that overflows one byte, so the carry fold is exercised.
    #[test]
    fn checksum_folds_carry() {
        // 0x34 + 0xD2 = 0x106. 0x06 + 0x01 = 0x07. 0xFF - 0x07 = 0xF8.
        assert_eq!(compute_checksum(&[0x34, 0xD2, 0x00, 0x00, 0x00, 0x00]), 0xF8);
    }

    /// Six 0xFF bytes sum to 0x5FA. Fold is 0xFA + 0x05 = 0xFF, so the checksum is zero.
    #[test]
    fn checksum_of_all_ones() {
        assert_eq!(compute_checksum(&[0xFF; 6]), 0x00);
    }

    #[test]
    fn checksum_of_nothing() {
        assert_eq!(compute_checksum(&[]), 0xFF);
    }

    /// Appending the checksum to any sequence gives a frame that verifies.
    #[test]
    fn appended_checksum_verifies() {
        let sequences: [&[u8]; 5] = [
            &[0x00],
            &[0x0D, 0x00, 0x00, 0x00, 0x00],
            &[0x89, 0x64, 0x01, 0x02, 0x03, 0x00],
            &[0xFF, 0xFE, 0xFD, 0xFC, 0xFB, 0xFA],
            &[0x19, 0x03, 0x0E, b'A', 0x00, 0x00],
        ];

        for sequence in sequences {
            let mut frame = [0u8; 8];
            let len = sequence.len();
            frame[..len].copy_from_slice(sequence);
            frame[len] = compute_checksum(sequence);

            assert!(verify_checksum(&frame[..=len]));
        }
    }

    #[test]
    fn wrong_checksum_is_rejected() {
        assert!(!verify_checksum(&[0x0C, 0x00, 0x00, 0x00, 0x00, 0xF2]));
    }

    #[test]
    fn empty_frame_is_rejected() {
        assert!(!verify_checksum(&[]));
    }
}
