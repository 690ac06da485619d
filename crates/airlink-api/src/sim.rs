// ── In-memory simulator backend ──
//
// `SimNet` implements both capabilities over a scripted world: a canned
// AP list, a power flag, and optional fault injection. It drives the
// same submit-then-confirm event flow a real daemon would, with a
// configurable latency between acceptance and completion, so the full
// client stack can be exercised without radio hardware. Used by the
// airlink CLI and by the airlink-core test suites; deterministic under
// paused `tokio::time`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::daemon::{
    ApInfo, DaemonEvent, DaemonFault, LinkState, ProfileTarget, WifiDaemon, WpsMode,
};
use crate::error::Error;
use crate::properties::{keys, PropertyStore};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Scripted state behind the simulator.
#[derive(Debug)]
struct World {
    powered: bool,
    aps: Vec<ApInfo>,
    connected: Option<ApInfo>,
    scan_fault: Option<DaemonFault>,
    connect_fault: Option<DaemonFault>,
    wps_pin: Option<String>,
    interface: String,
}

struct SimInner {
    world: Mutex<World>,
    events: broadcast::Sender<DaemonEvent>,
    power_prop: watch::Sender<i64>,
    rssi_prop: watch::Sender<i64>,
    latency: Duration,
}

/// Simulated daemon + property store.
///
/// Cheaply cloneable; all clones share one world.
#[derive(Clone)]
pub struct SimNet {
    inner: Arc<SimInner>,
}

impl SimNet {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (power_prop, _) = watch::channel(0);
        let (rssi_prop, _) = watch::channel(0);

        Self {
            inner: Arc::new(SimInner {
                world: Mutex::new(World {
                    powered: false,
                    aps: Vec::new(),
                    connected: None,
                    scan_fault: None,
                    connect_fault: None,
                    wps_pin: None,
                    interface: "wlan0".into(),
                }),
                events,
                power_prop,
                rssi_prop,
                latency: Duration::from_millis(50),
            }),
        }
    }

    /// Replace the scripted AP list the next scan will report.
    pub fn with_aps(self, aps: Vec<ApInfo>) -> Self {
        self.lock_world().aps = aps;
        self
    }

    /// Delay between request acceptance and the completion event.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        // Only reachable before the first clone is handed out.
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.latency = latency;
        }
        self
    }

    /// Make the next scan complete with `fault`.
    pub fn script_scan_fault(&self, fault: DaemonFault) {
        self.lock_world().scan_fault = Some(fault);
    }

    /// Make the next connect complete with `fault`.
    pub fn script_connect_fault(&self, fault: DaemonFault) {
        self.lock_world().connect_fault = Some(fault);
    }

    /// PIN the simulated registrar expects for WPS-PIN pairing.
    pub fn set_wps_pin(&self, pin: impl Into<String>) {
        self.lock_world().wps_pin = Some(pin.into());
    }

    // ── External-world controls (unsolicited events) ────────────────

    /// Toggle power as if from the settings UI: `requested` = false.
    pub fn toggle_power_externally(&self, powered: bool) {
        {
            let mut world = self.lock_world();
            world.powered = powered;
            if !powered {
                world.connected = None;
            }
        }
        let _ = self.inner.power_prop.send(i64::from(powered));
        self.emit(DaemonEvent::PowerChanged {
            powered,
            fault: None,
            requested: false,
        });
    }

    /// Drop the active link as if the AP vanished: `requested` = false.
    pub fn drop_link_externally(&self) {
        let ap = self.lock_world().connected.take();
        if let Some(ap) = ap {
            let _ = self.inner.rssi_prop.send(0);
            self.emit(DaemonEvent::LinkChanged {
                state: LinkState::Disconnected,
                ap: Some(Box::new(ap)),
                fault: None,
                requested: false,
            });
        }
    }

    /// Deliver a background (daemon-initiated) scan result.
    pub fn background_scan(&self) {
        let aps = self.lock_world().aps.clone();
        self.emit(DaemonEvent::ScanFinished {
            aps,
            fault: None,
            requested: false,
        });
    }

    /// Publish a new bucketed signal level on the property store.
    pub fn set_signal_level(&self, level: i64) {
        let _ = self.inner.rssi_prop.send(level.clamp(0, 4));
    }

    // ── Internals ───────────────────────────────────────────────────

    fn lock_world(&self) -> std::sync::MutexGuard<'_, World> {
        self.inner
            .world
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn emit(&self, event: DaemonEvent) {
        debug!(?event, "sim: emit");
        let _ = self.inner.events.send(event);
    }

    fn find_ap(&self, target: &ProfileTarget) -> Option<ApInfo> {
        self.lock_world()
            .aps
            .iter()
            .find(|ap| {
                ap.essid == target.essid
                    && target.bssid.as_ref().is_none_or(|b| *b == ap.bssid)
            })
            .cloned()
    }

    fn require_power(&self) -> Result<(), Error> {
        if self.lock_world().powered {
            Ok(())
        } else {
            Err(Error::Rejected {
                reason: "radio is powered off".into(),
            })
        }
    }

    /// Complete a connect attempt after the scripted latency.
    fn finish_connect(&self, target: ProfileTarget, scripted_fault: Option<DaemonFault>) {
        let sim = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(sim.inner.latency).await;

            match (sim.find_ap(&target), scripted_fault) {
                (Some(ap), None) => {
                    sim.lock_world().connected = Some(ap.clone());
                    let _ = sim.inner.rssi_prop.send(level_from_dbm(ap.rssi_dbm));
                    sim.emit(DaemonEvent::LinkChanged {
                        state: LinkState::Connected,
                        ap: Some(Box::new(ap)),
                        fault: None,
                        requested: true,
                    });
                }
                (ap, fault) => {
                    sim.emit(DaemonEvent::LinkChanged {
                        state: LinkState::Disconnected,
                        ap: ap.map(Box::new),
                        fault: Some(fault.unwrap_or(DaemonFault::ConnectFailed)),
                        requested: true,
                    });
                }
            }
        });
    }
}

impl Default for SimNet {
    fn default() -> Self {
        Self::new()
    }
}

/// Map dBm to the 0..=4 bucketed level the property store publishes.
fn level_from_dbm(dbm: i32) -> i64 {
    match dbm {
        d if d >= -55 => 4,
        d if d >= -65 => 3,
        d if d >= -75 => 2,
        d if d >= -85 => 1,
        _ => 0,
    }
}

impl WifiDaemon for SimNet {
    async fn attach(&self) -> Result<broadcast::Receiver<DaemonEvent>, Error> {
        Ok(self.inner.events.subscribe())
    }

    async fn power_on(&self) -> Result<(), Error> {
        let sim = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(sim.inner.latency).await;
            sim.lock_world().powered = true;
            let _ = sim.inner.power_prop.send(1);
            sim.emit(DaemonEvent::PowerChanged {
                powered: true,
                fault: None,
                requested: true,
            });
        });
        Ok(())
    }

    async fn power_off(&self) -> Result<(), Error> {
        let sim = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(sim.inner.latency).await;
            let dropped = {
                let mut world = sim.lock_world();
                world.powered = false;
                world.connected.take()
            };
            // The radio going down tears the link out from under the
            // client; that part is not something it asked for.
            if let Some(ap) = dropped {
                let _ = sim.inner.rssi_prop.send(0);
                sim.emit(DaemonEvent::LinkChanged {
                    state: LinkState::Disconnected,
                    ap: Some(Box::new(ap)),
                    fault: Some(DaemonFault::OperationAborted),
                    requested: false,
                });
            }
            let _ = sim.inner.power_prop.send(0);
            sim.emit(DaemonEvent::PowerChanged {
                powered: false,
                fault: None,
                requested: true,
            });
        });
        Ok(())
    }

    async fn request_scan(&self) -> Result<(), Error> {
        self.require_power()?;
        let sim = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(sim.inner.latency).await;
            let (aps, fault) = {
                let mut world = sim.lock_world();
                match world.scan_fault.take() {
                    Some(fault) => (Vec::new(), Some(fault)),
                    None => (world.aps.clone(), None),
                }
            };
            sim.emit(DaemonEvent::ScanFinished {
                aps,
                fault,
                requested: true,
            });
        });
        Ok(())
    }

    async fn open_profile(&self, target: &ProfileTarget) -> Result<(), Error> {
        self.require_power()?;
        self.emit(DaemonEvent::LinkChanged {
            state: LinkState::Connecting,
            ap: self.find_ap(target).map(Box::new),
            fault: None,
            requested: true,
        });
        let scripted = self.lock_world().connect_fault.take();
        self.finish_connect(target.clone(), scripted);
        Ok(())
    }

    async fn close_profile(&self, target: &ProfileTarget) -> Result<(), Error> {
        self.require_power()?;
        let connected = self.lock_world().connected.clone();
        let Some(ap) = connected.filter(|ap| ap.essid == target.essid) else {
            return Err(Error::Rejected {
                reason: "no active link for profile".into(),
            });
        };

        self.emit(DaemonEvent::LinkChanged {
            state: LinkState::Disconnecting,
            ap: Some(Box::new(ap.clone())),
            fault: None,
            requested: true,
        });

        let sim = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(sim.inner.latency).await;
            sim.lock_world().connected = None;
            let _ = sim.inner.rssi_prop.send(0);
            sim.emit(DaemonEvent::LinkChanged {
                state: LinkState::Disconnected,
                ap: Some(Box::new(ap)),
                fault: None,
                requested: true,
            });
        });
        Ok(())
    }

    async fn connect_wps(
        &self,
        target: &ProfileTarget,
        mode: WpsMode,
        pin: Option<&str>,
    ) -> Result<(), Error> {
        self.require_power()?;

        let pin_fault = match mode {
            WpsMode::Pbc => None,
            WpsMode::Pin => {
                let expected = self.lock_world().wps_pin.clone();
                match (expected, pin) {
                    (Some(expected), Some(pin)) if expected == pin => None,
                    _ => Some(DaemonFault::InvalidKey),
                }
            }
        };

        self.emit(DaemonEvent::LinkChanged {
            state: LinkState::Connecting,
            ap: self.find_ap(target).map(Box::new),
            fault: None,
            requested: true,
        });
        self.finish_connect(target.clone(), pin_fault);
        Ok(())
    }

    async fn forget_profile(&self, target: &ProfileTarget) -> Result<(), Error> {
        let mut world = self.lock_world();
        for ap in world
            .aps
            .iter_mut()
            .filter(|ap| ap.essid == target.essid)
        {
            ap.favorite = false;
        }
        Ok(())
    }

    async fn interface_name(&self) -> Result<String, Error> {
        Ok(self.lock_world().interface.clone())
    }
}

impl PropertyStore for SimNet {
    async fn get_int(&self, key: &str) -> Result<i64, Error> {
        match key {
            keys::POWER_STATE => Ok(i64::from(self.lock_world().powered)),
            keys::RSSI_LEVEL => Ok(*self.inner.rssi_prop.borrow()),
            _ => Err(Error::PropertyNotFound { key: key.into() }),
        }
    }

    async fn get_string(&self, key: &str) -> Result<String, Error> {
        match key {
            keys::BSSID => self
                .lock_world()
                .connected
                .as_ref()
                .map(|ap| ap.bssid.clone())
                .ok_or_else(|| Error::PropertyNotFound { key: key.into() }),
            _ => Err(Error::PropertyNotFound { key: key.into() }),
        }
    }

    fn watch_int(&self, key: &str) -> Result<watch::Receiver<i64>, Error> {
        match key {
            keys::POWER_STATE => Ok(self.inner.power_prop.subscribe()),
            keys::RSSI_LEVEL => Ok(self.inner.rssi_prop.subscribe()),
            _ => Err(Error::PropertyNotFound { key: key.into() }),
        }
    }
}

/// Canned AP records for demos and tests.
pub fn demo_aps() -> Vec<ApInfo> {
    fn ap(essid: &str, bssid: &str, rssi: i32, freq: u32, sec: &str, enc: &str) -> ApInfo {
        ApInfo {
            essid: essid.into(),
            bssid: bssid.into(),
            rssi_dbm: rssi,
            frequency_mhz: freq,
            max_rate_mbit: if freq > 5000 { 866 } else { 144 },
            favorite: false,
            security: sec.into(),
            encryption: enc.into(),
            wps_supported: sec == "psk2",
            ipv4: Some(crate::daemon::IpSummary {
                method: "dhcp".into(),
                ..Default::default()
            }),
            ipv6: None,
        }
    }

    vec![
        ap("corp-main", "3c:22:fb:10:aa:01", -48, 5180, "psk2", "aes"),
        ap("corp-guest", "3c:22:fb:10:aa:02", -52, 5180, "none", "none"),
        ap("lab-2g", "90:4d:4a:77:03:1c", -71, 2437, "psk", "tkip"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn scan_reports_scripted_aps() {
        let sim = SimNet::new().with_aps(demo_aps());
        let mut rx = sim.attach().await.expect("attach");

        sim.toggle_power_externally(true);
        // Drain the power event before asserting on the scan.
        let _ = rx.recv().await;

        sim.request_scan().await.expect("scan accepted");
        match rx.recv().await {
            Ok(DaemonEvent::ScanFinished { aps, fault, requested }) => {
                assert_eq!(aps.len(), 3);
                assert!(fault.is_none());
                assert!(requested);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn scan_rejected_while_powered_off() {
        let sim = SimNet::new();
        let err = sim.request_scan().await.expect_err("must reject");
        assert!(err.is_rejection());
    }

    #[tokio::test(start_paused = true)]
    async fn connect_unknown_profile_fails_async() {
        let sim = SimNet::new().with_aps(demo_aps());
        let mut rx = sim.attach().await.expect("attach");
        sim.toggle_power_externally(true);
        let _ = rx.recv().await;

        let target = ProfileTarget::new("no-such-network", None);
        sim.open_profile(&target).await.expect("accepted");

        // Connecting, then the failure completion.
        let _ = rx.recv().await;
        match rx.recv().await {
            Ok(DaemonEvent::LinkChanged { state, fault, .. }) => {
                assert_eq!(state, LinkState::Disconnected);
                assert_eq!(fault, Some(DaemonFault::ConnectFailed));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn signal_level_buckets() {
        assert_eq!(level_from_dbm(-40), 4);
        assert_eq!(level_from_dbm(-60), 3);
        assert_eq!(level_from_dbm(-70), 2);
        assert_eq!(level_from_dbm(-80), 1);
        assert_eq!(level_from_dbm(-92), 0);
    }
}
