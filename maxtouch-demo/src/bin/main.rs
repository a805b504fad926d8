#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those     holding buffers for the duration of a data transfer."
)]

use embassy_executor::Spawner;
use embassy_time::{Duration, Ticker, Timer};
use esp_hal::i2c::master::I2c;
use esp_hal::Async;
use esp_hal::{clock::CpuClock, time::Rate, timer::systimer::SystemTimer};
use esp_println::println;
use log::{debug, info, warn};
use maxtouch_async::bus::{I2cBus, DEFAULT_I2C_ADDRESS};
use maxtouch_async::{Config, Digitizer, MaxTouch};

// Touchpad sensor area.
const SENSOR_WIDTH_MM: u16 = 96;
const SENSOR_HEIGHT_MM: u16 = 56;
const FINGERS: usize = 5;

type Touchpad = MaxTouch<I2cBus<I2c<'static, Async>>, FINGERS>;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    println!("{}", info);
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    esp_println::logger::init_logger(log::LevelFilter::Debug);
    info!("Logger initialized");

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    let timer0 = SystemTimer::new(peripherals.SYSTIMER);
    esp_hal_embassy::init(timer0.alarm0);

    let i2c_config = esp_hal::i2c::master::Config::default().with_frequency(Rate::from_khz(400));
    let i2c = I2c::new(peripherals.I2C0, i2c_config)
        .unwrap()
        .with_sda(peripherals.GPIO13)
        .with_scl(peripherals.GPIO14)
        .into_async();

    let mut touchpad: Touchpad = MaxTouch::new(
        I2cBus::new(i2c, DEFAULT_I2C_ADDRESS),
        Config::new(SENSOR_WIDTH_MM, SENSOR_HEIGHT_MM),
    );
    match touchpad.init().await {
        Ok(summary) => debug!("Touchpad initialized: {summary:?}"),
        Err(err) => warn!("Error initializing touchpad: {err:?}"),
    };

    spawner.spawn(poll_touchpad(touchpad)).unwrap();

    loop {
        Timer::after(Duration::from_secs(1)).await;
    }
}

/// Polls the message processor and logs the active fingers.
#[embassy_executor::task]
async fn poll_touchpad(mut touchpad: Touchpad) {
    let mut digitizer = Digitizer::<FINGERS>::new();
    let mut ticker = Ticker::every(Duration::from_millis(10));
    loop {
        match touchpad.read_messages(&mut digitizer).await {
            Ok(summary) if summary.contacts > 0 => {
                for (id, finger) in digitizer.active() {
                    info!(
                        "finger {id}: ({}, {}) confident: {}",
                        finger.x, finger.y, finger.confidence
                    );
                }
            }
            Ok(_) => {}
            Err(err) => warn!("Error reading messages: {err:?}"),
        }
        ticker.next().await;
    }
}
