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

use crate::ble::messaging::{LinkStateFlag, ResumeAdvertisingSignal, WeightNotifySignal};
use crate::weight::interface::AsyncStrainGaugeInterface;
use crate::weight::scale::WeightScale;
use defmt::{info, warn};
use embassy_time::{Duration, Ticker, Timer};
use micromath::F32Ext;
use scalebridge_core::link::{ConnectionMonitor, LinkEdge};
use scalebridge_core::measurement::WeightPayload;

const TICK_PERIOD: Duration = Duration::from_millis(10);

/// Breathing room for the radio stack between a peer detaching and the
/// peripheral going discoverable again.
const ADVERTISE_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Ties the pipeline together: samples the scale every tick, streams the
/// encoded weight while a subscriber is attached and re-arms advertising
/// once per detach.
pub struct NotificationDriver<SG> {
    scale: WeightScale<SG>,
    monitor: ConnectionMonitor,
    link_state: &'static LinkStateFlag,
    notifications: &'static WeightNotifySignal,
    resume_advertising: &'static ResumeAdvertisingSignal,
}

impl<SG> NotificationDriver<SG>
where
    SG: AsyncStrainGaugeInterface,
{
    pub fn new(
        scale: WeightScale<SG>,
        link_state: &'static LinkStateFlag,
        notifications: &'static WeightNotifySignal,
        resume_advertising: &'static ResumeAdvertisingSignal,
    ) -> Self {
        Self {
            scale,
            monitor: ConnectionMonitor::new(),
            link_state,
            notifications,
            resume_advertising,
        }
    }

    pub async fn run(&mut self) -> ! {
        let mut tick = Ticker::every(TICK_PERIOD);
        loop {
            tick.next().await;

            let grams = match self.scale.sample().await {
                // Drift can take the tared zero slightly negative; weight is
                // never reported with a sign.
                Ok(grams) => grams.abs(),
                Err(_) => {
                    warn!("Weight sample failed, skipping this tick");
                    continue;
                }
            };

            let attached = self.link_state.is_attached();
            if attached {
                // Published every tick while attached, even when unchanged.
                self.notifications.signal(WeightPayload::encode(grams));
            }

            // Ordered after the publish check so a peer that detached this
            // tick is not spuriously published to.
            match self.monitor.observe(attached) {
                Some(LinkEdge::Detached) => {
                    Timer::after(ADVERTISE_SETTLE_DELAY).await;
                    self.resume_advertising.signal(());
                    info!("Peer detached, re-arming advertising");
                }
                Some(LinkEdge::Attached) => {
                    info!("Peer attached, streaming weight");
                }
                None => {}
            }
        }
    }
}
