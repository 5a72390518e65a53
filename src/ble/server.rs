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

use trouble_host::prelude::*;

/// Name used for advertising, GAP and the characteristic user description.
pub const DEVICE_NAME: &str = "WEIGHT-SCALE";

#[gatt_server]
pub struct Server {
    pub weight_scale: WeightScaleService,
}

/// Standard Weight Scale service (0x181D) with the single Weight
/// Measurement characteristic (0x2A9D).
#[gatt_service(uuid = "0000181d-0000-1000-8000-00805f9b34fb")]
pub struct WeightScaleService {
    /// Flags byte plus the weight in 5 g counts, least significant byte
    /// first. See `scalebridge_core::measurement`.
    #[descriptor(uuid = descriptors::CHARACTERISTIC_USER_DESCRIPTION, read, value = "WEIGHT-SCALE")]
    #[characteristic(uuid = "00002a9d-0000-1000-8000-00805f9b34fb", read, notify)]
    pub measurement: [u8; 3],
}
