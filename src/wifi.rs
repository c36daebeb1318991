use defmt::{error, info, warn};
use embassy_net::{Runner, Stack, StackResources};
use embassy_time::Timer;
use esp_hal::{
    peripherals::{RNG, TIMG0, WIFI},
    rng::Rng,
    timer::timg::TimerGroup,
};
use esp_wifi::{
    wifi::{
        AuthMethod, ClientConfiguration, Configuration, WifiController, WifiDevice, WifiError,
    },
    EspWifiController,
};

use crate::config::{Candidate, JOIN_TRIES, STATUS_POLLS, STATUS_POLL_INTERVAL};
use crate::error::StationError;

macro_rules! mk_static {
    ($t:ty,$val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        #[deny(unused_attributes)]
        let x = STATIC_CELL.uninit().write(($val));
        x
    }};
}

pub async fn setup_wifi<'a>(
    wifi: WIFI<'static>,
    rng: RNG<'_>,
    timg0: TIMG0<'static>,
) -> Result<(WifiController<'a>, Stack<'a>, Runner<'a, WifiDevice<'a>>), ()> {
    let mut rng = Rng::new(rng);
    let timer1 = TimerGroup::new(timg0);
    let esp_wifi_ctrl = mk_static!(
        EspWifiController<'static>,
        esp_wifi::init(timer1.timer0, rng).unwrap()
    );
    let (controller, interfaces) = esp_wifi::wifi::new(esp_wifi_ctrl, wifi).unwrap();
    let config = embassy_net::Config::dhcpv4(Default::default());
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    // Init network stack
    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        config,
        mk_static!(StackResources<3>, StackResources::<3>::new()),
        seed,
    );
    Ok((controller, stack, runner))
}

/// One join transaction against the radio. Behind a trait so the retry
/// policy can be exercised without hardware.
pub trait WifiLink {
    async fn try_join(&mut self, candidate: &Candidate<'_>) -> Result<(), StationError>;
}

pub struct EspLink<'a, 'd> {
    pub controller: &'a mut WifiController<'d>,
    pub stack: Stack<'a>,
}

impl WifiLink for EspLink<'_, '_> {
    async fn try_join(&mut self, candidate: &Candidate<'_>) -> Result<(), StationError> {
        let auth_method = if candidate.key.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let client_config = Configuration::Client(ClientConfiguration {
            ssid: candidate.ssid.into(),
            password: candidate.key.into(),
            auth_method,
            ..Default::default()
        });
        self.controller
            .set_configuration(&client_config)
            .map_err(|_| StationError::NetworkTimeout)?;
        if !matches!(self.controller.is_started(), Ok(true)) {
            self.controller
                .start_async()
                .await
                .map_err(|_| StationError::NetworkTimeout)?;
        }
        if let Err(e) = self.controller.connect_async().await {
            log_join_failure(e);
            return Err(StationError::NetworkTimeout);
        }
        // Associated; now wait, bounded, for an address.
        for _ in 0..STATUS_POLLS {
            if self.stack.config_v4().is_some() {
                return Ok(());
            }
            Timer::after(STATUS_POLL_INTERVAL).await;
        }
        warn!("no address assigned on {}, leaving", candidate.ssid);
        let _ = self.controller.disconnect_async().await;
        Err(StationError::NetworkTimeout)
    }
}

/// Tries every candidate in order, at most `JOIN_TRIES` times each, and
/// stops as soon as one join lands, handing back the winning candidate.
/// Candidates after a success are never touched; exhausting the list
/// yields `None`.
pub async fn join_any<'c, L>(
    link: &mut L,
    candidates: &'c [Candidate<'c>],
) -> Option<Candidate<'c>>
where
    L: WifiLink,
{
    for candidate in candidates {
        for attempt in 1..=JOIN_TRIES {
            info!(
                "joining {} (attempt {}/{})",
                candidate.ssid, attempt, JOIN_TRIES
            );
            match link.try_join(candidate).await {
                Ok(()) => {
                    info!("joined {}", candidate.ssid);
                    return Some(*candidate);
                }
                Err(e) => warn!("join failed: {}", e),
            }
        }
    }
    None
}

/// Best-effort teardown: disconnect, then power the radio down.
pub async fn shutdown(controller: &mut WifiController<'_>) {
    info!("disconnecting wifi...");
    if let Err(e) = controller.disconnect_async().await {
        warn!("wifi disconnect failed: {:?}", e);
    }
    info!("powering radio down...");
    if let Err(e) = controller.stop_async().await {
        warn!("radio stop failed: {:?}", e);
    }
}

fn log_join_failure(e: WifiError) {
    match e {
        WifiError::Unsupported => error!("unsupported mode"),
        WifiError::Disconnected => error!("disconnected"),
        WifiError::NotInitialized => error!("not initialized"),
        WifiError::UnknownWifiMode => error!("unknown wifi mode"),
        WifiError::InternalError(_) => error!("internal error"),
        _ => error!("unknown error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::future::Future;
    use core::pin::pin;
    use core::task::{Context, Poll, Waker};

    struct ScriptedLink<'a> {
        plan: &'a [bool],
        tries: usize,
    }

    impl WifiLink for ScriptedLink<'_> {
        async fn try_join(&mut self, _candidate: &Candidate<'_>) -> Result<(), StationError> {
            let up = self.plan.get(self.tries).copied().unwrap_or(false);
            self.tries += 1;
            if up {
                Ok(())
            } else {
                Err(StationError::NetworkTimeout)
            }
        }
    }

    /// The scripted link never suspends, so a single poll completes.
    fn resolve<F: Future>(fut: F) -> F::Output {
        let mut fut = pin!(fut);
        let mut cx = Context::from_waker(Waker::noop());
        match fut.as_mut().poll(&mut cx) {
            Poll::Ready(out) => out,
            Poll::Pending => panic!("join future stalled"),
        }
    }

    const NETWORKS: [Candidate<'static>; 2] = [
        Candidate {
            ssid: "first",
            key: "aaa",
        },
        Candidate {
            ssid: "second",
            key: "bbb",
        },
    ];

    #[test]
    fn moves_on_after_a_candidate_is_exhausted() {
        let mut link = ScriptedLink {
            plan: &[false, false, true],
            tries: 0,
        };
        assert_eq!(resolve(join_any(&mut link, &NETWORKS)), Some(NETWORKS[1]));
        // Two tries on the first candidate, one on the second.
        assert_eq!(link.tries, 3);
    }

    #[test]
    fn immediate_success_short_circuits() {
        let mut link = ScriptedLink {
            plan: &[true],
            tries: 0,
        };
        assert_eq!(resolve(join_any(&mut link, &NETWORKS)), Some(NETWORKS[0]));
        assert_eq!(link.tries, 1);
    }

    #[test]
    fn gives_up_after_every_candidate_is_tried() {
        let mut link = ScriptedLink { plan: &[], tries: 0 };
        assert_eq!(resolve(join_any(&mut link, &NETWORKS)), None);
        assert_eq!(link.tries, NETWORKS.len() * JOIN_TRIES);
    }

    #[test]
    fn empty_candidate_list_never_touches_the_radio() {
        let mut link = ScriptedLink {
            plan: &[true],
            tries: 0,
        };
        assert_eq!(resolve(join_any(&mut link, &[])), None);
        assert_eq!(link.tries, 0);
    }
}
