// Copyright (C) 2025 Paul Hampson
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License version 3 as  published by the
// Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.

/// Wire resolution of the Weight Measurement characteristic when reporting
/// in SI units: one count is 5 g.
pub const WEIGHT_RESOLUTION_GRAMS: f32 = 5.0;

/// Flags byte of the measurement:
/// - bit 0 = 0: SI units (kg / m)
/// - bit 1 = 0: no timestamp
/// - bit 2 = 0: no user ID
/// - bit 3 = 0: no BMI / height
/// - bits 4..7 reserved, zero
const FLAGS: u8 = 0x00;

/// One encoded Weight Measurement value: flags byte followed by the weight
/// in 5 g counts as a little-endian u16. Built fresh for every notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WeightPayload([u8; 3]);

impl WeightPayload {
    /// Encode a weight in grams. The caller is responsible for handing in a
    /// non-negative value; weights are never reported with a sign.
    ///
    /// Counts round half-up. Weights past the 16-bit count range saturate at
    /// `u16::MAX` (the float-to-int cast saturates) rather than wrapping.
    pub fn encode(weight_grams: f32) -> Self {
        let counts = (weight_grams / WEIGHT_RESOLUTION_GRAMS + 0.5) as u16;
        let le = counts.to_le_bytes();
        Self([FLAGS, le[0], le[1]])
    }

    pub fn as_bytes(&self) -> &[u8; 3] {
        &self.0
    }

    pub fn into_bytes(self) -> [u8; 3] {
        self.0
    }

    /// Weight carried by this payload, in grams. Lossy only to the 5 g
    /// resolution of the wire format.
    pub fn weight_grams(&self) -> f32 {
        let counts = u16::from_le_bytes([self.0[1], self.0[2]]);
        counts as f32 * WEIGHT_RESOLUTION_GRAMS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use micromath::F32Ext;

    #[test]
    fn zero_weight_encodes_all_zero() {
        assert_eq!(WeightPayload::encode(0.0).into_bytes(), [0x00, 0x00, 0x00]);
    }

    #[test]
    fn known_vectors() {
        assert_eq!(WeightPayload::encode(25.0).into_bytes(), [0x00, 0x05, 0x00]);
        // 1000 g / 5 = 200 counts = 0x00C8, least significant byte first
        assert_eq!(
            WeightPayload::encode(1000.0).into_bytes(),
            [0x00, 0xC8, 0x00]
        );
    }

    #[test]
    fn counts_round_half_up() {
        assert_eq!(WeightPayload::encode(12.4).weight_grams(), 10.0);
        assert_eq!(WeightPayload::encode(12.5).weight_grams(), 15.0);
        assert_eq!(WeightPayload::encode(7.4).weight_grams(), 5.0);
    }

    #[test]
    fn flags_byte_always_zero() {
        for grams in [0.0, 3.0, 77.7, 65_000.0, 400_000.0] {
            assert_eq!(WeightPayload::encode(grams).into_bytes()[0], 0x00);
        }
    }

    #[test]
    fn round_trips_within_resolution() {
        for grams in [0.0, 5.0, 12.0, 437.5, 1000.0, 99_995.0] {
            let decoded = WeightPayload::encode(grams).weight_grams();
            assert!((decoded - grams).abs() <= WEIGHT_RESOLUTION_GRAMS / 2.0);
        }
    }

    #[test]
    fn oversized_weights_saturate() {
        // ~327 kg is the largest representable weight at 5 g per count
        let payload = WeightPayload::encode(1_000_000.0);
        assert_eq!(payload.into_bytes(), [0x00, 0xFF, 0xFF]);
    }
}
