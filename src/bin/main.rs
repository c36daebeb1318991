#![no_std]
#![no_main]

use defmt::{error, info, warn, Display2Format};
use embassy_executor::Spawner;
use embassy_net::Runner;
use esp_alloc as _;
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::timer::systimer::SystemTimer;
use esp_wifi::wifi::WifiDevice;

use meteo_panel::config;
use meteo_panel::lcd::{self, LinkInfo};
use meteo_panel::sensor::SensorReader;
use meteo_panel::service::{self, Shutdown, Station};
use meteo_panel::wifi::{self, EspLink};

#[panic_handler]
fn panic(_: &core::panic::PanicInfo) -> ! {
    loop {}
}

extern crate alloc;

static SHUTDOWN: Shutdown = Shutdown::new();

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await
}

/// The boot button doubles as the shutdown switch.
#[embassy_executor::task]
async fn interrupt_watcher(mut button: Input<'static>) {
    button.wait_for_falling_edge().await;
    info!("interrupt: shutting down");
    SHUTDOWN.signal(());
}

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    rtt_target::rtt_init_defmt!();

    let peripherals = esp_hal::init(esp_hal::Config::default().with_cpu_clock(CpuClock::max()));

    esp_alloc::heap_allocator!(size: 72 * 1024);

    let timer0 = SystemTimer::new(peripherals.SYSTIMER);
    esp_hal_embassy::init(timer0.alarm0);

    // Power light, on right away.
    let mut led = Output::new(peripherals.GPIO21, Level::High, OutputConfig::default());

    info!("initializing display...");
    let mut panel = lcd::initialize_display(
        peripherals.SPI2,
        peripherals.GPIO6,
        peripherals.GPIO7,
        peripherals.GPIO8,
        peripherals.GPIO9,
        peripherals.GPIO10,
    )
    .unwrap();
    lcd::draw_title(&mut panel).unwrap();
    lcd::draw_splash(&mut panel).unwrap();

    let i2c = I2c::new(peripherals.I2C0, I2cConfig::default())
        .unwrap()
        .with_sda(peripherals.GPIO4)
        .with_scl(peripherals.GPIO5);
    let sensor = SensorReader::new(i2c);

    let button = Input::new(peripherals.GPIO0, InputConfig::default().with_pull(Pull::Up));
    spawner.spawn(interrupt_watcher(button)).ok();

    let (mut controller, stack, runner) =
        wifi::setup_wifi(peripherals.WIFI, peripherals.RNG, peripherals.TIMG0)
            .await
            .unwrap();
    spawner.spawn(net_task(runner)).ok();

    let candidates = config::known_networks();
    let joined = {
        let mut link = EspLink {
            controller: &mut controller,
            stack,
        };
        wifi::join_any(&mut link, &candidates).await
    };

    let link_info = joined.and_then(|candidate| {
        stack.config_v4().map(|cfg| LinkInfo {
            ssid: candidate.ssid,
            address: cfg.address.address(),
        })
    });
    match &link_info {
        Some(info) => info!("serving at http://{}", Display2Format(&info.address)),
        None => warn!("no network joined, web page disabled"),
    }

    lcd::draw_layout(&mut panel, link_info.as_ref()).unwrap();

    let mut station = Station::new(sensor, panel);
    station.refresh().unwrap();

    let outcome = match &link_info {
        Some(_) => service::run(stack, &mut station, &SHUTDOWN).await,
        None => service::run_display_only(&mut station, &SHUTDOWN).await,
    };
    if let Err(e) = outcome {
        error!("service stopped: {}", e);
    }

    if joined.is_some() {
        wifi::shutdown(&mut controller).await;
    }

    info!("clearing display...");
    if lcd::clear(&mut station.panel).is_err() {
        warn!("display clear failed");
    }
    led.set_low();
    info!("done.");

    loop {
        core::future::pending::<()>().await;
    }
}
