#![no_std]
#![no_main]
#![feature(never_type)]

extern crate alloc;
use embassy_executor::Spawner;
use embassy_time::{Instant, Timer};
use log::{LevelFilter, info};

use core::panic::PanicInfo;

use esp_hal::{
    analog::adc::{Adc, AdcConfig, Attenuation},
    delay::Delay,
    dma::{DmaRxBuf, DmaTxBuf},
    dma_buffers,
    gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull},
    time::Rate,
    timer::{AnyTimer, timg::TimerGroup},
};

use anyhow::Result;

use esp_hal::peripherals::Peripherals;
use esp_storage::FlashStorage;

use static_cell::StaticCell;

use rtt_target::{ChannelMode, rprintln, rtt_init_print};

use common::{
    config::StorageConfigStore,
    error_with_location,
    frame::NUM_LEDS,
    input::ActiveHighButton,
    scheduler::{FrameScheduler, SchedulerOptions, frame_delay_us},
    sink::{LedStrip, TYPICAL_LED_STRIP},
    spectrum::SpectrumSampler,
    time::Millis,
};

mod hardware;
pub mod util;
mod ws2812;

use hardware::SpectrumAdc;
use util::*;
use ws2812::WS2812_Spi;

esp_bootloader_esp_idf::esp_app_desc!();

use esp_alloc as _;

/// Flash offset of the persisted config, inside the NVS partition.
const CONFIG_OFFSET: u32 = 0x9000;

#[inline(never)]
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    rprintln!("{}", info);
    log::error!("{info}");

    loop {
        // prevent optimization
        core::sync::atomic::compiler_fence(core::sync::atomic::Ordering::SeqCst);
    }
}

fn now_millis() -> Millis {
    Millis::from_ticks(Instant::now().as_millis())
}

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) -> ! {
    log::info!("Hello, world!");

    match _main(spawner).await {
        Err(e) => {
            log::error!("Error!");
            log::error!("{e:?}");
            loop {}
        }
    }
}

async fn _main(_spawner: Spawner) -> Result<!> {
    esp_alloc::heap_allocator!(size: 16 * 1024);

    // ---------------------------------------------------------------------------

    rtt_init_print!(ChannelMode::NoBlockTrim, 4 * 1024);

    static LOGGER: StaticCell<MultiLogger> = StaticCell::new();
    let logger = LOGGER.init(MultiLogger);

    log::set_logger(logger).map_err(|_| error_with_location!("Failed to set logger"))?;
    log::set_max_level(LevelFilter::Info);

    // ---------------------------------------------------------------------------

    let peripherals: Peripherals = esp_hal::init(esp_hal::Config::default()); // Note: 'default()' runs at 80 MHz (for the esp32-s3)

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let timer0: AnyTimer = timg0.timer0.into();
    let timer1: AnyTimer = timg0.timer1.into();
    esp_hal_embassy::init([timer0, timer1]);

    // LED strip:
    //  96 LEDs * 3 bytes (r g b) * 4 (4 SPI bytes are used for one ws2811 byte) + one reset sequence of 140 bytes
    //  96 * 3 * 4 + 140 = 1292
    //  ==> round DMA up to 2 kB
    let (rx_buffer, rx_descriptors, tx_buffer, tx_descriptors) = dma_buffers!(1, 2 * 1024);
    let dma_rx_buf = DmaRxBuf::new(rx_descriptors, rx_buffer)
        .map_err(|err| error_with_location!("Failed to create DMA RX buffer: {:?}", err))?;
    let dma_tx_buf = DmaTxBuf::new(tx_descriptors, tx_buffer)
        .map_err(|err| error_with_location!("Failed to create DMA TX buffer: {:?}", err))?;

    let spi: esp_hal::spi::master::SpiDmaBus<'_, esp_hal::Blocking> =
        esp_hal::spi::master::Spi::new(
            peripherals.SPI2,
            esp_hal::spi::master::Config::default().with_frequency(Rate::from_khz(4_500)),
        )
        .map_err(|err| error_with_location!("Failed to configure LED SPI: {:?}", err))?
        .with_mosi(peripherals.GPIO21)
        .with_dma(peripherals.DMA_CH1)
        .with_buffers(dma_rx_buf, dma_tx_buf);

    const ENCODE_BUFFER_SIZE: usize = ws2812::buffer_size(NUM_LEDS);
    let ws = WS2812_Spi {
        spi,
        buffer: static_buf!(u8, ENCODE_BUFFER_SIZE),
    };
    let strip = LedStrip::new(ws).with_correction(TYPICAL_LED_STRIP);

    // MSGEQ7: analog out on GPIO1, strobe on GPIO7, reset on GPIO8
    let mut adc_config = AdcConfig::new();
    let adc_pin = adc_config.enable_pin(peripherals.GPIO1, Attenuation::_11dB);
    let adc = Adc::new(peripherals.ADC1, adc_config);
    let strobe = Output::new(peripherals.GPIO7, Level::High, OutputConfig::default());
    let reset = Output::new(peripherals.GPIO8, Level::Low, OutputConfig::default());
    let audio = SpectrumSampler::new(
        reset,
        strobe,
        Delay::new(),
        SpectrumAdc { adc, pin: adc_pin },
    )?;

    let button = ActiveHighButton(Input::new(
        peripherals.GPIO5,
        InputConfig::default().with_pull(Pull::Down),
    ));

    let store = StorageConfigStore::new(FlashStorage::new(peripherals.FLASH), CONFIG_OFFSET);

    let mut scheduler = FrameScheduler::start(
        button,
        audio,
        strip,
        store,
        SchedulerOptions::default(),
        now_millis(),
    )?;
    info!("[main] running at {} frames per second", common::patterns::UPDATES_PER_SECOND);

    loop {
        let frame_start = Instant::now();
        if let Err(e) = scheduler.tick(now_millis()) {
            log::error!("[main] frame failed: {e:?}");
        }
        let work_us = frame_start.elapsed().as_micros();
        Timer::after_micros(frame_delay_us(work_us)).await;
    }
}
