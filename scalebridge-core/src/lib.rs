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

//! Board-agnostic logic for the Scalebridge firmware.
//!
//! Everything in here is pure state-and-arithmetic so it can be exercised
//! with the host test harness:
//!
//! - Noise-gated weight filtering
//! - Peer connection level/edge tracking
//! - Weight Measurement characteristic encoding

#![no_std]

pub mod filter;
pub mod link;
pub mod measurement;

#[cfg(test)]
mod tests {
    use crate::filter::WeightFilter;
    use crate::link::{ConnectionMonitor, LinkEdge};
    use crate::measurement::WeightPayload;

    // Full pipeline pass: a subscriber attaches, four conversions arrive,
    // then the subscriber goes away again.
    #[test]
    fn attach_sample_notify_detach() {
        let mut filter = WeightFilter::new();
        let mut monitor = ConnectionMonitor::new();

        assert_eq!(monitor.observe(true), Some(LinkEdge::Attached));

        let raw_readings = [5.0, 8.0, 50.0, 52.0];
        let expected_filtered = [0.0, 0.0, 50.0, 52.0];
        let expected_units = [0u16, 0, 10, 10]; // 52 g rounds down to 10 units

        for i in 0..raw_readings.len() {
            let filtered = filter.ingest(raw_readings[i]);
            assert_eq!(filtered, expected_filtered[i]);

            assert_eq!(monitor.observe(true), None);
            let payload = WeightPayload::encode(filtered);
            let bytes = payload.into_bytes();
            assert_eq!(bytes[0], 0x00);
            assert_eq!(
                u16::from_le_bytes([bytes[1], bytes[2]]),
                expected_units[i]
            );
        }

        // One detach edge only, no matter how long the link stays down.
        assert_eq!(monitor.observe(false), Some(LinkEdge::Detached));
        assert_eq!(monitor.observe(false), None);
        assert_eq!(monitor.observe(false), None);
    }
}
