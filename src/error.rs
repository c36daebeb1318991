#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum StationError {
    /// The sensor transaction failed; readings fall back to placeholders.
    SensorUnavailable,
    /// A join try ran out of its bounded wait without an address.
    NetworkTimeout,
    /// A single client connection failed mid-request or mid-response.
    Request,
    /// A draw primitive failed. The display is the primary output, so
    /// there is no fallback.
    Display,
}
