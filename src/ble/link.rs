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

use crate::ble::messaging::{
    ConnectionEvents, LinkStateFlag, ResumeAdvertisingSignal, WeightNotifySignal,
};
use crate::ble::server::{Server, DEVICE_NAME};
use defmt::{debug, info, warn};
use embassy_futures::join::join;
use embassy_futures::select::select;
use embassy_time::Timer;
use trouble_host::prelude::*;

/// One subscriber at a time; the stack could take more but the pipeline
/// assumes a single peer.
const CONNECTIONS_MAX: usize = 1;
/// Signalling channel plus one attribute channel.
const L2CAP_CHANNELS_MAX: usize = 2;
const L2CAP_MTU: usize = 128;

/// Brings up the BLE host and services one subscriber at a time.
///
/// Advertising starts immediately. After a peer detaches, the peripheral
/// stays dark until the notification driver raises `resume_advertising`
/// (once per detach edge, after its settle delay).
pub async fn run<C: Controller>(
    controller: C,
    link_state: &'static LinkStateFlag,
    notifications: &'static WeightNotifySignal,
    resume_advertising: &'static ResumeAdvertisingSignal,
) -> ! {
    let address = Address::random([0x1e, 0xad, 0x5c, 0xa1, 0xe0, 0x01]);
    info!("BLE address = {:?}", address);

    let mut resources: HostResources<CONNECTIONS_MAX, L2CAP_CHANNELS_MAX, L2CAP_MTU> =
        HostResources::new();
    let stack = trouble_host::new(controller, &mut resources).set_random_address(address);
    let Host {
        mut peripheral,
        mut runner,
        ..
    } = stack.build();

    let server = Server::new_with_config(GapConfig::Peripheral(PeripheralConfig {
        name: DEVICE_NAME,
        appearance: &appearance::weight_scale::GENERIC_WEIGHT_SCALE,
    }))
    .unwrap();

    info!("Waiting for a BLE client to notify");

    let _ = join(host_runner(&mut runner), async {
        loop {
            match advertise(&mut peripheral, &server).await {
                Ok(conn) => {
                    link_state.on_attach();
                    // Drop any payload signalled before the peer arrived.
                    notifications.reset();

                    let events = gatt_events_until_disconnect(&conn);
                    let notify = forward_notifications(&server, &conn, notifications);
                    select(events, notify).await;

                    link_state.on_detach();
                    // The notification driver re-arms discoverability after
                    // its settle delay, exactly once per detach.
                    resume_advertising.wait().await;
                    info!("Start advertising again");
                }
                Err(_) => {
                    warn!("Advertise error, retrying");
                    Timer::after_secs(1).await;
                }
            }
        }
    })
    .await;
    unreachable!()
}

async fn host_runner<C: Controller>(runner: &mut Runner<'_, C>) -> ! {
    loop {
        if runner.run().await.is_err() {
            defmt::panic!("BLE host runner error");
        }
    }
}

/// Advertise the Weight Scale service and wait for a subscriber. The device
/// name travels in the scan response.
async fn advertise<'a, 'b, C: Controller>(
    peripheral: &mut Peripheral<'a, C>,
    server: &'b Server<'_>,
) -> Result<GattConnection<'a, 'b>, BleHostError<C::Error>> {
    let mut adv_data = [0; 31];
    let adv_len = AdStructure::encode_slice(
        &[
            AdStructure::Flags(LE_GENERAL_DISCOVERABLE | BR_EDR_NOT_SUPPORTED),
            AdStructure::ServiceUuids16(&[[0x1d, 0x18]]),
        ],
        &mut adv_data[..],
    )?;

    let mut scan_data = [0; 31];
    let scan_len = AdStructure::encode_slice(
        &[AdStructure::CompleteLocalName(DEVICE_NAME.as_bytes())],
        &mut scan_data[..],
    )?;

    let advertiser = peripheral
        .advertise(
            &Default::default(),
            Advertisement::ConnectableScannableUndirected {
                adv_data: &adv_data[..adv_len],
                scan_data: &scan_data[..scan_len],
            },
        )
        .await?;
    info!("Advertising, waiting for connection");

    let conn = advertiser.accept().await?.with_attribute_server(server)?;
    info!("Peer connected");
    Ok(conn)
}

/// Answer GATT requests until the peer goes away.
async fn gatt_events_until_disconnect(conn: &GattConnection<'_, '_>) {
    loop {
        match conn.next().await {
            GattConnectionEvent::Disconnected { reason } => {
                info!("Peer disconnected: {:?}", reason);
                break;
            }
            GattConnectionEvent::Gatt { event } => {
                match &event {
                    GattEvent::Read(event) => {
                        debug!("Read of handle {:?}", event.handle());
                    }
                    GattEvent::Write(event) => {
                        debug!("Write to handle {:?}", event.handle());
                    }
                }
                match event.accept() {
                    Ok(reply) => reply.send().await,
                    Err(e) => warn!("Error sending response: {:?}", e),
                }
            }
            _ => {}
        }
    }
}

/// Push every payload the driver publishes out to the subscriber.
async fn forward_notifications(
    server: &Server<'_>,
    conn: &GattConnection<'_, '_>,
    notifications: &WeightNotifySignal,
) -> ! {
    loop {
        let payload = notifications.wait().await;
        if let Err(e) = server
            .weight_scale
            .measurement
            .notify(conn, payload.as_bytes())
            .await
        {
            warn!("Notify failed: {:?}", e);
        }
    }
}
