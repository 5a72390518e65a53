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

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use portable_atomic::{AtomicBool, Ordering};
use scalebridge_core::measurement::WeightPayload;

/// Latest payload to push to the subscriber. Latest-value semantics are
/// fine here: the driver refreshes it every tick while a peer is attached.
pub type WeightNotifySignal = Signal<CriticalSectionRawMutex, WeightPayload>;

/// Raised by the notification driver once per detach edge, after the settle
/// delay, to make the peripheral discoverable again.
pub type ResumeAdvertisingSignal = Signal<CriticalSectionRawMutex, ()>;

/// Attach/detach notifications from the connection context. Both calls are
/// idempotent; signalling the same state twice is a no-op.
pub trait ConnectionEvents {
    fn on_attach(&self);
    fn on_detach(&self);
}

/// Subscriber-present level, written from the BLE connection context and
/// read from the driver tick context. Single writer, monotone toggles; a
/// bool load never tears.
pub struct LinkStateFlag {
    attached: AtomicBool,
}

impl LinkStateFlag {
    pub const fn new() -> Self {
        Self {
            attached: AtomicBool::new(false),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Relaxed)
    }
}

impl ConnectionEvents for LinkStateFlag {
    fn on_attach(&self) {
        self.attached.store(true, Ordering::Relaxed);
    }

    fn on_detach(&self) {
        self.attached.store(false, Ordering::Relaxed);
    }
}
