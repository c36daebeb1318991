//! Startup configuration. Credentials come from the build environment
//! (see `build.rs`), never from source.

use embassy_time::Duration;
use heapless::Vec;

pub const HTTP_PORT: u16 = 80;

/// How long the service loop waits for a connection before performing a
/// display refresh instead.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Bound on reading a client request. Short on purpose; a request that
/// does not arrive in time is answered anyway.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Refresh cadence of the no-network fallback loop.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Connection tries per candidate network. First-try joins are flaky on
/// constrained radios.
pub const JOIN_TRIES: usize = 2;

/// Ceiling on address-assignment polls within one join try.
pub const STATUS_POLLS: usize = 10;
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub const MAX_NETWORKS: usize = 4;

/// One known network, attempted during join. An empty key means an open
/// network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub ssid: &'a str,
    pub key: &'a str,
}

/// The ordered list of networks to try, from the `WIFI_NETWORKS` build
/// environment variable. Empty when none were configured.
pub fn known_networks() -> Vec<Candidate<'static>, MAX_NETWORKS> {
    parse_networks(option_env!("WIFI_NETWORKS").unwrap_or(""))
}

/// Parses `ssid:key[,ssid:key...]`, keeping order. Entries without a
/// separator or with an empty ssid are skipped; entries beyond the slot
/// count are ignored.
pub fn parse_networks(raw: &str) -> Vec<Candidate<'_>, MAX_NETWORKS> {
    let mut networks = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((ssid, key)) = entry.split_once(':') else {
            continue;
        };
        if ssid.is_empty() {
            continue;
        }
        if networks.push(Candidate { ssid, key }).is_err() {
            break;
        }
    }
    networks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ordered_list() {
        let networks = parse_networks("home-net:hunter2,lab-net:");
        assert_eq!(networks.len(), 2);
        assert_eq!(
            networks[0],
            Candidate {
                ssid: "home-net",
                key: "hunter2"
            }
        );
        assert_eq!(
            networks[1],
            Candidate {
                ssid: "lab-net",
                key: ""
            }
        );
    }

    #[test]
    fn skips_malformed_entries() {
        let networks = parse_networks("no-separator, :key-only ,ok:secret");
        assert_eq!(networks.len(), 1);
        assert_eq!(networks[0].ssid, "ok");
    }

    #[test]
    fn empty_input_yields_no_candidates() {
        assert!(parse_networks("").is_empty());
        assert!(parse_networks(" , ,").is_empty());
    }

    #[test]
    fn overflow_keeps_the_first_slots() {
        let networks = parse_networks("a:1,b:2,c:3,d:4,e:5,f:6");
        assert_eq!(networks.len(), MAX_NETWORKS);
        assert_eq!(networks[0].ssid, "a");
        assert_eq!(networks[MAX_NETWORKS - 1].ssid, "d");
    }
}
