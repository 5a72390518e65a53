#![no_std]
#![no_main]

mod application;
mod ble;
mod weight;

#[allow(unused_imports)]
use {defmt_rtt as _, panic_probe as _};

use crate::application::notifier::NotificationDriver;
use crate::ble::messaging::{LinkStateFlag, ResumeAdvertisingSignal, WeightNotifySignal};
use crate::weight::interface::hx711async::{Hx711Async, Hx711Gain};
use crate::weight::scale::WeightScale;
use assign_resources::assign_resources;
use cyw43_pio::{PioSpi, DEFAULT_CLOCK_DIVIDER};
use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::{DMA_CH0, PIO0};
use embassy_rp::pio::Pio;
use embassy_rp::{bind_interrupts, peripherals, pio};
use embassy_sync::signal::Signal;
use embassy_time::Duration;
use static_cell::StaticCell;
use trouble_host::prelude::ExternalController;

/// Board-specific one-time calibration constant, grams per ADC count.
const PRESET_CALIBRATION_GRADIENT: f32 = 1.0;
/// Sensor warm-up window before the startup tare.
const STABILISATION_TIME: Duration = Duration::from_millis(2000);

static LINK_STATE: LinkStateFlag = LinkStateFlag::new();
static WEIGHT_NOTIFICATIONS: WeightNotifySignal = Signal::new();
static RESUME_ADVERTISING: ResumeAdvertisingSignal = Signal::new();

static CYW43_STATE: StaticCell<cyw43::State> = StaticCell::new();

assign_resources! {
    load_cell: LoadCellResources {
        clk_pin: PIN_14,
        data_pin: PIN_15,
    }
    radio: RadioResources {
        pwr_pin: PIN_23,
        cs_pin: PIN_25,
        dio_pin: PIN_24,
        clk_pin: PIN_29,
        pio: PIO0,
        dma_channel: DMA_CH0,
    }
}

bind_interrupts!(struct PioIrqs {
    PIO0_IRQ_0 => pio::InterruptHandler<PIO0>;
});

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    let resources = split_resources! {p};

    info!("Scalebridge starting");

    spawner.spawn(weighing_task(resources.load_cell)).unwrap();

    // The cyw43 firmware blobs are flashed out-of-band to keep them out of
    // the application image:
    //   probe-rs download 43439A0.bin --binary-format bin --chip RP2040 --base-address 0x10100000
    //   probe-rs download 43439A0_clm.bin --binary-format bin --chip RP2040 --base-address 0x10140000
    //   probe-rs download 43439A0_btfw.bin --binary-format bin --chip RP2040 --base-address 0x10141400
    let fw = unsafe { core::slice::from_raw_parts(0x10100000 as *const u8, 230321) };
    let clm = unsafe { core::slice::from_raw_parts(0x10140000 as *const u8, 4752) };
    let btfw = unsafe { core::slice::from_raw_parts(0x10141400 as *const u8, 6164) };

    let pwr = Output::new(resources.radio.pwr_pin, Level::Low);
    let cs = Output::new(resources.radio.cs_pin, Level::High);
    let mut pio = Pio::new(resources.radio.pio, PioIrqs);
    let spi = PioSpi::new(
        &mut pio.common,
        pio.sm0,
        DEFAULT_CLOCK_DIVIDER,
        pio.irq0,
        cs,
        resources.radio.dio_pin,
        resources.radio.clk_pin,
        resources.radio.dma_channel,
    );

    let state = CYW43_STATE.init(cyw43::State::new());
    let (_net_device, bt_device, mut control, runner) =
        cyw43::new_with_bluetooth(state, pwr, spi, fw, btfw).await;
    spawner.spawn(cyw43_task(runner)).unwrap();
    control.init(clm).await;

    info!("-- READY --");

    let controller: ExternalController<_, 10> = ExternalController::new(bt_device);
    ble::link::run(
        controller,
        &LINK_STATE,
        &WEIGHT_NOTIFICATIONS,
        &RESUME_ADVERTISING,
    )
    .await
}

#[embassy_executor::task]
async fn cyw43_task(
    runner: cyw43::Runner<'static, Output<'static>, PioSpi<'static, PIO0, 0, DMA_CH0>>,
) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn weighing_task(load_cell: LoadCellResources) {
    let clk_pin = Output::new(load_cell.clk_pin, Level::Low);
    let data_pin = Input::new(load_cell.data_pin, Pull::Up);
    let strain_gauge = Hx711Async::new(clk_pin, data_pin, Hx711Gain::Gain128);

    let mut scale = match WeightScale::new(strain_gauge).await {
        Ok(scale) => scale,
        Err(_) => {
            defmt::panic!("Load cell failed to power up");
        }
    };
    scale.set_cal_factor(PRESET_CALIBRATION_GRADIENT);

    if scale.start(STABILISATION_TIME, true).await.is_err() {
        warn!("Load cell timeout, check wiring for MCU <> HX711 - continuing uncalibrated");
    }

    let mut driver = NotificationDriver::new(
        scale,
        &LINK_STATE,
        &WEIGHT_NOTIFICATIONS,
        &RESUME_ADVERTISING,
    );
    driver.run().await
}
