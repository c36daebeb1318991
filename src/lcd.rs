use core::cell::RefCell;
use core::fmt::Write;
use core::net::Ipv4Addr;

use embassy_embedded_hal::shared_bus::blocking::spi::SpiDevice;
use embassy_sync::blocking_mutex::{raw::NoopRawMutex, Mutex};
use embassy_time::Delay;
use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::mono_font::{ascii::FONT_6X10, MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::peripherals::{GPIO10, GPIO6, GPIO7, GPIO8, GPIO9, SPI2};
use esp_hal::spi::master::Config as SpiConfig;
use esp_hal::{
    spi::{master::Spi, Mode},
    time::Rate,
    Blocking,
};
use heapless::String;
use st7735_lcd::{Orientation, ST7735};
use static_cell::StaticCell;

use crate::error::StationError;
use crate::ReadingSet;

pub type Panel = ST7735<
    SpiDevice<'static, NoopRawMutex, Spi<'static, Blocking>, Output<'static>>,
    Output<'static>,
    Output<'static>,
>;

/// What the footer banner advertises once the network is up.
pub struct LinkInfo<'a> {
    pub ssid: &'a str,
    pub address: Ipv4Addr,
}

const WIDTH: u32 = 128;
const HEIGHT: u32 = 160;
const HEADER_H: u32 = 16;
const FOOTER_H: u32 = 22;

const LABEL_X: i32 = 4;
const COLON_X: i32 = 40;
const VALUE_X: i32 = 48;
const ROW_Y: [i32; 3] = [40, 62, 84];

/// Fixed value-cell width in characters. Values are padded to this width
/// so a shorter replacement fully overwrites its predecessor.
const VALUE_WIDTH: usize = 13;

const FOOTER_COLS: usize = 20;

const HEADER_BG: Rgb565 = Rgb565::WHITE;
const HEADER_FG: Rgb565 = Rgb565::RED;
const BODY_BG: Rgb565 = Rgb565::BLUE;
const BODY_FG: Rgb565 = Rgb565::YELLOW;
const FOOTER_BG: Rgb565 = Rgb565::new(0, 0, 22);
const FOOTER_FG: Rgb565 = Rgb565::CYAN;
const SHADOW: Rgb565 = Rgb565::BLACK;

static SPI_BUS: StaticCell<Mutex<NoopRawMutex, RefCell<Spi<'static, Blocking>>>> =
    StaticCell::new();

pub fn initialize_display(
    spi: SPI2<'static>,
    mosi: GPIO6<'static>,
    sclk: GPIO7<'static>,
    cs: GPIO8<'static>,
    dc: GPIO9<'static>,
    rst: GPIO10<'static>,
) -> Result<Panel, StationError> {
    let cs = Output::new(cs, Level::High, OutputConfig::default());
    let dc = Output::new(dc, Level::Low, OutputConfig::default());
    let rst = Output::new(rst, Level::Low, OutputConfig::default());
    let spi = Spi::new(
        spi,
        SpiConfig::default()
            .with_frequency(Rate::from_mhz(1))
            .with_mode(Mode::_0),
    )
    .unwrap()
    .with_sck(sclk)
    .with_mosi(mosi);

    let spi_bus = SPI_BUS.init(Mutex::new(RefCell::new(spi)));
    let spi_device = SpiDevice::new(spi_bus, cs);
    let mut panel = ST7735::new(spi_device, dc, rst, true, false, WIDTH, HEIGHT);
    panel
        .init(&mut Delay)
        .map_err(|_| StationError::Display)?;
    panel
        .set_orientation(&Orientation::Portrait)
        .map_err(|_| StationError::Display)?;
    panel.clear(BODY_BG).map_err(|_| StationError::Display)?;
    Ok(panel)
}

/// Header bar with the title and a shadow line under it. Drawn once.
pub fn draw_title(panel: &mut Panel) -> Result<(), StationError> {
    fill(panel, 0, 0, WIDTH, HEADER_H, HEADER_BG)?;
    fill(panel, 0, HEADER_H as i32, WIDTH, 1, SHADOW)?;
    let style = MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(HEADER_FG)
        .background_color(HEADER_BG)
        .build();
    text(panel, "Weather Station", 19, 3, style)
}

/// Boot message shown while the join is in progress.
pub fn draw_splash(panel: &mut Panel) -> Result<(), StationError> {
    let style = body_style();
    text(panel, "Connecting to WIFI", 10, 66, style)?;
    text(panel, "please wait...", 22, 80, style)
}

/// Static layout: row labels, aligned colons, footer banner. Overwrites
/// the splash.
pub fn draw_layout(panel: &mut Panel, link: Option<&LinkInfo<'_>>) -> Result<(), StationError> {
    fill(
        panel,
        0,
        HEADER_H as i32 + 1,
        WIDTH,
        HEIGHT - HEADER_H - 1 - FOOTER_H,
        BODY_BG,
    )?;

    let style = body_style();
    for (label, y) in [("Temp", ROW_Y[0]), ("Press", ROW_Y[1]), ("Humid", ROW_Y[2])] {
        text(panel, label, LABEL_X, y, style)?;
        // Colons drawn separately so they line up.
        text(panel, ":", COLON_X, y, style)?;
    }

    draw_footer(panel, link)
}

/// Value cells only; everything around them stays untouched.
pub fn draw_values(panel: &mut Panel, readings: &ReadingSet) -> Result<(), StationError> {
    let style = body_style();
    for (value, y) in [
        (readings.temperature.as_str(), ROW_Y[0]),
        (readings.pressure.as_str(), ROW_Y[1]),
        (readings.humidity.as_str(), ROW_Y[2]),
    ] {
        let cell = padded(value);
        text(panel, cell.as_str(), VALUE_X, y, style)?;
    }
    Ok(())
}

pub fn clear(panel: &mut Panel) -> Result<(), StationError> {
    panel.clear(Rgb565::BLACK).map_err(|_| StationError::Display)
}

fn draw_footer(panel: &mut Panel, link: Option<&LinkInfo<'_>>) -> Result<(), StationError> {
    let footer_y = (HEIGHT - FOOTER_H) as i32;
    fill(panel, 0, footer_y - 1, WIDTH, 1, SHADOW)?;
    fill(panel, 0, footer_y, WIDTH, FOOTER_H, FOOTER_BG)?;

    let style = MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(FOOTER_FG)
        .background_color(FOOTER_BG)
        .build();

    match link {
        Some(info) => {
            let mut ssid_line: String<40> = String::new();
            let _ = write!(&mut ssid_line, "WIFI: {}", info.ssid);
            let mut url_line: String<40> = String::new();
            let _ = write!(&mut url_line, "http://{}", info.address);
            text(panel, clipped::<FOOTER_COLS>(&ssid_line).as_str(), 2, footer_y + 1, style)?;
            text(panel, clipped::<FOOTER_COLS>(&url_line).as_str(), 2, footer_y + 11, style)
        }
        None => text(panel, "WIFI not available", 10, footer_y + 6, style),
    }
}

fn body_style() -> MonoTextStyle<'static, Rgb565> {
    MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(BODY_FG)
        .background_color(BODY_BG)
        .build()
}

fn fill(
    panel: &mut Panel,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    color: Rgb565,
) -> Result<(), StationError> {
    Rectangle::new(Point::new(x, y), Size::new(width, height))
        .into_styled(PrimitiveStyle::with_fill(color))
        .draw(panel)
        .map_err(|_| StationError::Display)
}

fn text(
    panel: &mut Panel,
    content: &str,
    x: i32,
    y: i32,
    style: MonoTextStyle<'static, Rgb565>,
) -> Result<(), StationError> {
    Text::with_baseline(content, Point::new(x, y), style, Baseline::Top)
        .draw(panel)
        .map_err(|_| StationError::Display)?;
    Ok(())
}

/// Pads (or truncates) to the fixed cell width so stale characters from a
/// longer previous value never survive a redraw.
fn padded(value: &str) -> String<VALUE_WIDTH> {
    let mut cell: String<VALUE_WIDTH> = String::new();
    for c in value.chars().take(VALUE_WIDTH) {
        let _ = cell.push(c);
    }
    while cell.push(' ').is_ok() {}
    cell
}

fn clipped<const N: usize>(line: &str) -> String<N> {
    let mut out: String<N> = String::new();
    for c in line.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_short_values_to_cell_width() {
        let cell = padded("n/a");
        assert_eq!(cell.len(), VALUE_WIDTH);
        assert_eq!(cell.as_str(), "n/a          ");
    }

    #[test]
    fn truncates_oversized_values() {
        let cell = padded("0123456789abcdef");
        assert_eq!(cell.as_str(), "0123456789abc");
    }

    #[test]
    fn clips_footer_lines() {
        assert_eq!(
            clipped::<FOOTER_COLS>("http://192.168.100.200").as_str(),
            "http://192.168.100.2"
        );
        assert_eq!(clipped::<FOOTER_COLS>("short").as_str(), "short");
    }
}
