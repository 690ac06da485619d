// ── Client facade ──
//
// The public face of the access layer. Owns the initialization
// lifecycle: `initialize` attaches a Session, `deinitialize` tears it
// down and force-clears the RSSI registration. Arguments are validated
// here (or in the session guards) before anything reaches the daemon --
// an invalid input never turns into a daemon request.
//
// The RSSI machinery deliberately lives on the facade rather than the
// session: it is bound to the platform property store, not the daemon,
// and its registration lifecycle is independent of the daemon
// attachment -- except that deinitialization sweeps it too.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use airlink_api::{PropertyStore, WifiDaemon, WpsMode};

use crate::config::SessionConfig;
use crate::error::WifiError;
use crate::events::{ConnectionEvent, DeviceStateEvent, ScanEvent};
use crate::model::{AccessPoint, ConnectionState, DeviceState, Essid, RssiLevel};
use crate::registry::ApHandle;
use crate::session::Session;
use crate::slots::{lock, rssi_cell, RssiCell};

/// Wi-Fi management client.
///
/// Multiple independent clients can coexist (each carries its own
/// lifecycle flag, registry, and callback slots); nothing here is
/// process-global.
pub struct WifiClient<D, P> {
    daemon: D,
    properties: P,
    config: SessionConfig,
    /// `Some` between `initialize` and `deinitialize` -- this Option
    /// *is* the initialization flag.
    session: tokio::sync::Mutex<Option<Session<D, P>>>,
    rssi_slot: Arc<RssiCell>,
    rssi_watch: Mutex<Option<CancellationToken>>,
}

impl<D, P> WifiClient<D, P>
where
    D: WifiDaemon + Clone + Send + Sync + 'static,
    P: PropertyStore + Clone + Send + Sync + 'static,
{
    pub fn new(daemon: D, properties: P, config: SessionConfig) -> Self {
        Self {
            daemon,
            properties,
            config,
            session: tokio::sync::Mutex::new(None),
            rssi_slot: Arc::new(rssi_cell()),
            rssi_watch: Mutex::new(None),
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Attach to the daemon and start the event loop.
    pub async fn initialize(&self) -> Result<(), WifiError> {
        let mut guard = self.session.lock().await;
        if guard.is_some() {
            return Err(WifiError::invalid_operation("already initialized"));
        }

        let session = Session::start(
            self.daemon.clone(),
            self.properties.clone(),
            self.config.clone(),
        )
        .await?;
        *guard = Some(session);
        debug!("client initialized");
        Ok(())
    }

    /// Tear the session down. In-flight requests are abandoned (the
    /// daemon is not guaranteed to abort them), every callback slot is
    /// cleared -- the RSSI registration included -- and all AP handles
    /// go stale.
    pub async fn deinitialize(&self) -> Result<(), WifiError> {
        let session = self
            .session
            .lock()
            .await
            .take()
            .ok_or_else(|| WifiError::invalid_operation("not initialized"))?;

        session.shutdown().await;

        if self.rssi_slot.force_clear() {
            if let Some(cancel) = lock(&self.rssi_watch).take() {
                cancel.cancel();
            }
            debug!("RSSI registration cleared by deinitialize");
        }

        debug!("client deinitialized");
        Ok(())
    }

    pub async fn is_initialized(&self) -> bool {
        self.session.lock().await.is_some()
    }

    // ── Power ───────────────────────────────────────────────────────

    pub async fn activate(&self) -> Result<(), WifiError> {
        self.session().await?.activate().await
    }

    pub async fn deactivate(&self) -> Result<(), WifiError> {
        self.session().await?.deactivate().await
    }

    /// Power state as the property store reports it. Works without
    /// initialization -- the property store is always there.
    pub async fn is_activated(&self) -> Result<bool, WifiError> {
        let value = self
            .properties
            .get_int(&self.config.power_state_key)
            .await?;
        Ok(value != 0)
    }

    // ── State queries ───────────────────────────────────────────────

    pub async fn connection_state(&self) -> Result<ConnectionState, WifiError> {
        Ok(self.session().await?.connection_state())
    }

    pub async fn device_state(&self) -> Result<DeviceState, WifiError> {
        Ok(self.session().await?.device_state())
    }

    /// Subscribe to device state changes.
    pub async fn watch_device_state(&self) -> Result<watch::Receiver<DeviceState>, WifiError> {
        Ok(self.session().await?.watch_device_state())
    }

    /// Subscribe to connection state changes.
    pub async fn watch_connection_state(
        &self,
    ) -> Result<watch::Receiver<ConnectionState>, WifiError> {
        Ok(self.session().await?.watch_connection_state())
    }

    /// BSSID of the active link, from the property store. Works without
    /// initialization.
    pub async fn mac_address(&self) -> Result<String, WifiError> {
        Ok(self.properties.get_string(&self.config.bssid_key).await?)
    }

    pub async fn interface_name(&self) -> Result<String, WifiError> {
        self.session().await?.interface_name().await
    }

    // ── Scan ────────────────────────────────────────────────────────

    /// Request a scan. `on_done` fires exactly once when the daemon
    /// confirms; iterate the found list from inside it (or any time
    /// after) for the results.
    pub async fn scan<F>(&self, on_done: F) -> Result<(), WifiError>
    where
        F: FnOnce(Option<WifiError>) + Send + 'static,
    {
        self.session().await?.scan(on_done).await
    }

    /// Visit the found-AP list in scan order. The record reference is
    /// valid only for the duration of the visit; the handle stays
    /// usable until the next scan replaces the list. Clone what must
    /// outlive that.
    pub async fn foreach_found_ap<F>(&self, visitor: F) -> Result<(), WifiError>
    where
        F: FnMut(ApHandle, &AccessPoint) -> ControlFlow<()>,
    {
        self.session().await?.for_each_found(visitor);
        Ok(())
    }

    // ── Connection ──────────────────────────────────────────────────

    pub async fn connect(&self, handle: ApHandle) -> Result<(), WifiError> {
        // An uninitialized client tracks no handles, so the handle
        // cannot be valid -- same answer the validity check would give.
        let Some(session) = self.session_opt().await else {
            return Err(WifiError::invalid_parameter("stale access point handle"));
        };
        session.connect(handle).await
    }

    pub async fn connect_wps(
        &self,
        handle: ApHandle,
        mode: WpsMode,
        pin: Option<&str>,
    ) -> Result<(), WifiError> {
        let Some(session) = self.session_opt().await else {
            return Err(WifiError::invalid_parameter("stale access point handle"));
        };
        session.connect_wps(handle, mode, pin).await
    }

    pub async fn disconnect(&self, handle: ApHandle) -> Result<(), WifiError> {
        let Some(session) = self.session_opt().await else {
            return Err(WifiError::invalid_parameter("stale access point handle"));
        };
        session.disconnect(handle).await
    }

    /// Drop the daemon's stored credentials for the AP.
    pub async fn forget_ap(&self, handle: ApHandle) -> Result<(), WifiError> {
        let Some(session) = self.session_opt().await else {
            return Err(WifiError::invalid_parameter("stale access point handle"));
        };
        session.forget(handle).await
    }

    /// Caller-owned clone of the connected AP. The caller destroys it;
    /// mutating or destroying it never touches the live record.
    pub async fn connected_ap(&self) -> Result<ApHandle, WifiError> {
        self.session().await?.connected_ap()
    }

    // ── AP records ──────────────────────────────────────────────────

    /// New caller-owned record from a bare ESSID (for hidden-network
    /// connects). Every other field starts unset.
    pub async fn create_ap(&self, essid: &str) -> Result<ApHandle, WifiError> {
        if essid.is_empty() {
            return Err(WifiError::invalid_parameter("ESSID must not be empty"));
        }
        Ok(self.session().await?.create_ap(Essid::new(essid)))
    }

    /// Independent deep copy of the record behind `handle`.
    pub async fn clone_ap(&self, handle: ApHandle) -> Result<ApHandle, WifiError> {
        self.session().await?.clone_ap(handle)
    }

    /// Release a caller-owned record.
    pub async fn destroy_ap(&self, handle: ApHandle) -> Result<(), WifiError> {
        self.session().await?.destroy_ap(handle)
    }

    /// True iff `handle` names a live record of this client.
    pub async fn is_valid_ap(&self, handle: ApHandle) -> bool {
        match self.session_opt().await {
            Some(session) => session.is_valid(handle),
            None => false,
        }
    }

    /// Snapshot of the record behind `handle`.
    pub async fn ap(&self, handle: ApHandle) -> Result<AccessPoint, WifiError> {
        self.session().await?.ap(handle)
    }

    /// Mutate the record behind `handle` (passphrase, static IP
    /// settings, EAP descriptor, ...) before connecting.
    pub async fn update_ap<F>(&self, handle: ApHandle, update: F) -> Result<(), WifiError>
    where
        F: FnOnce(&mut AccessPoint),
    {
        self.session().await?.update_ap(handle, update)
    }

    // ── Callback registration ───────────────────────────────────────

    /// Register the device state callback (replaces any previous one).
    pub async fn set_device_state_cb<F>(&self, callback: F) -> Result<(), WifiError>
    where
        F: FnMut(DeviceStateEvent) + Send + 'static,
    {
        self.session().await?.set_device_state_cb(callback);
        Ok(())
    }

    pub async fn unset_device_state_cb(&self) -> Result<(), WifiError> {
        self.session().await?.unset_device_state_cb()
    }

    /// Register the scan callback (replaces any previous one). Fires
    /// for every completed scan, background scans included.
    pub async fn set_scan_cb<F>(&self, callback: F) -> Result<(), WifiError>
    where
        F: FnMut(ScanEvent) + Send + 'static,
    {
        self.session().await?.set_scan_cb(callback);
        Ok(())
    }

    pub async fn unset_scan_cb(&self) -> Result<(), WifiError> {
        self.session().await?.unset_scan_cb()
    }

    /// Register the connection state callback (replaces any previous
    /// one).
    pub async fn set_connection_state_cb<F>(&self, callback: F) -> Result<(), WifiError>
    where
        F: FnMut(ConnectionEvent) + Send + 'static,
    {
        self.session().await?.set_connection_state_cb(callback);
        Ok(())
    }

    pub async fn unset_connection_state_cb(&self) -> Result<(), WifiError> {
        self.session().await?.unset_connection_state_cb()
    }

    /// Register the RSSI level callback.
    ///
    /// Exclusive: a second registration without an intervening unset is
    /// an error, because the slot is bound to the single external
    /// property watch and rebinding it silently would leak the watch.
    /// Independent of initialization -- the property store outlives the
    /// daemon attachment. Must be called from within the runtime (the
    /// forwarding task is spawned here).
    pub fn set_rssi_level_cb<F>(&self, callback: F) -> Result<(), WifiError>
    where
        F: FnMut(RssiLevel) + Send + 'static,
    {
        self.rssi_slot.set_exclusive(callback)?;

        let receiver = match self.properties.watch_int(&self.config.rssi_level_key) {
            Ok(receiver) => receiver,
            Err(e) => {
                // Roll the registration back; the slot must not claim a
                // watch that was never established.
                self.rssi_slot.force_clear();
                return Err(e.into());
            }
        };

        let cancel = CancellationToken::new();
        *lock(&self.rssi_watch) = Some(cancel.clone());
        tokio::spawn(rssi_watch_task(receiver, Arc::clone(&self.rssi_slot), cancel));
        Ok(())
    }

    pub fn unset_rssi_level_cb(&self) -> Result<(), WifiError> {
        self.rssi_slot.unset()?;
        if let Some(cancel) = lock(&self.rssi_watch).take() {
            cancel.cancel();
        }
        Ok(())
    }

    // ── Internals ───────────────────────────────────────────────────

    async fn session(&self) -> Result<Session<D, P>, WifiError> {
        self.session_opt()
            .await
            .ok_or_else(|| WifiError::invalid_operation("not initialized"))
    }

    async fn session_opt(&self) -> Option<Session<D, P>> {
        self.session.lock().await.clone()
    }
}

/// Forward property-store RSSI changes into the registered callback.
async fn rssi_watch_task(
    mut receiver: watch::Receiver<i64>,
    slot: Arc<RssiCell>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            changed = receiver.changed() => {
                if changed.is_err() {
                    warn!("RSSI property watch closed");
                    break;
                }
                let level = RssiLevel::from_raw(*receiver.borrow_and_update());
                slot.dispatch(level);
            }
        }
    }
}
