//! The orchestrator: alternates timed display refresh with inbound
//! connection handling, one client at a time.

use core::fmt::Write;

use defmt::{debug, info, warn};
use embassy_futures::select::{select, Either};
use embassy_net::tcp::TcpSocket;
use embassy_net::Stack;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Timer};
use embedded_hal::i2c::I2c;
use embedded_io_async::Write as _;
use heapless::String;

use crate::config::{HTTP_PORT, IDLE_TIMEOUT, REFRESH_INTERVAL, REQUEST_TIMEOUT};
use crate::error::StationError;
use crate::lcd::{self, Panel};
use crate::page;
use crate::sensor::SensorReader;
use crate::ReadingSet;

/// Latched, so an interrupt raised mid-connection is still observed at
/// the next suspension point.
pub type Shutdown = Signal<CriticalSectionRawMutex, ()>;

/// Everything the service loop owns: the sensor, the panel, and the
/// current readings.
pub struct Station<I2C> {
    pub sensor: SensorReader<I2C>,
    pub panel: Panel,
    pub readings: ReadingSet,
}

impl<I2C> Station<I2C>
where
    I2C: I2c,
{
    pub fn new(sensor: SensorReader<I2C>, panel: Panel) -> Self {
        Self {
            sensor,
            panel,
            readings: ReadingSet::default(),
        }
    }

    /// One sensor poll plus a value-cell redraw.
    pub fn refresh(&mut self) -> Result<(), StationError> {
        self.readings = self.sensor.refresh();
        lcd::draw_values(&mut self.panel, &self.readings)
    }
}

/// Waits for connections on port 80, refreshing the display whenever the
/// bounded accept runs out. A single bad client never stops the loop;
/// only display failures and the shutdown signal do.
pub async fn run<I2C>(
    stack: Stack<'_>,
    station: &mut Station<I2C>,
    shutdown: &Shutdown,
) -> Result<(), StationError>
where
    I2C: I2c,
{
    let mut rx_buffer = [0u8; 1024];
    let mut tx_buffer = [0u8; 2048];
    info!("listening on port {}", HTTP_PORT);

    loop {
        let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);

        match select(
            shutdown.wait(),
            with_timeout(IDLE_TIMEOUT, socket.accept(HTTP_PORT)),
        )
        .await
        {
            Either::First(()) => {
                info!("shutdown requested, closing server socket");
                socket.abort();
                return Ok(());
            }
            // The idle timeout is the expected cue for the periodic
            // refresh, not an error.
            Either::Second(Err(_)) => station.refresh()?,
            Either::Second(Ok(Err(e))) => warn!("accept failed: {:?}", e),
            Either::Second(Ok(Ok(()))) => {
                if let Err(e) = serve(&mut socket, &station.readings).await {
                    match e {
                        StationError::Display => return Err(e),
                        e => {
                            warn!("dropping client: {}", e);
                            socket.abort();
                        }
                    }
                }
            }
        }
    }
}

/// Fallback when no network join succeeded: pure timed refresh until the
/// shutdown signal.
pub async fn run_display_only<I2C>(
    station: &mut Station<I2C>,
    shutdown: &Shutdown,
) -> Result<(), StationError>
where
    I2C: I2c,
{
    info!("no network, running display-only");
    loop {
        station.refresh()?;
        match select(shutdown.wait(), Timer::after(REFRESH_INTERVAL)).await {
            Either::First(()) => return Ok(()),
            Either::Second(()) => {}
        }
    }
}

/// Answers one accepted connection with the current readings. The request
/// read is best-effort: a client that stalls past the bound still gets a
/// response.
async fn serve(socket: &mut TcpSocket<'_>, readings: &ReadingSet) -> Result<(), StationError> {
    info!("client connected: {}", socket.remote_endpoint());

    let mut request = [0u8; 1024];
    match with_timeout(REQUEST_TIMEOUT, socket.read(&mut request)).await {
        Ok(Ok(len)) => debug!("request: {} bytes", len),
        Ok(Err(_)) | Err(_) => warn!("request not fully read, answering anyway"),
    }

    let body = page::render(readings);
    let response = http_response(&body)?;
    socket
        .write_all(response.as_bytes())
        .await
        .map_err(|_| StationError::Request)?;
    socket.flush().await.map_err(|_| StationError::Request)?;
    socket.close();
    info!("response sent, connection closed");
    Ok(())
}

const RESPONSE_CAP: usize = page::PAGE_CAP + 64;

/// Every request gets the same shape back: 200, text/html, the page.
fn http_response(body: &str) -> Result<String<RESPONSE_CAP>, StationError> {
    let mut response: String<RESPONSE_CAP> = String::new();
    write!(
        &mut response,
        "HTTP/1.1 200 OK\r\nContent-type: text/html\r\n\r\n{body}"
    )
    .map_err(|_| StationError::Request)?;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_is_status_headers_blank_line_body() {
        let response = http_response("<html>ok</html>").unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Content-type: text/html\r\n\r\n"));
        assert!(response.ends_with("<html>ok</html>"));
    }

    #[test]
    fn full_page_fits_the_response_buffer() {
        let body = page::render(&ReadingSet::unavailable());
        let response = http_response(&body).unwrap();
        assert!(response.len() <= RESPONSE_CAP);
    }
}
