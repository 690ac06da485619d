// ── Session: connection state machine + event loop ──
//
// A session owns everything one attached client knows about the radio:
// the AP registry, the three daemon-event callback slots, the
// device/connection state pair, and the table of in-flight requests.
// All requests follow the same discipline: validate, reserve the
// pending entry, submit to the daemon, and let the event loop confirm
// the transition later. State is never advanced at submission time --
// only a daemon event moves it, which is also how externally-initiated
// changes (settings UI, another client) stay indistinguishable in
// mechanism and distinguishable by the `is_requested` flag.

use std::future::Future;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use airlink_api::{ApInfo, DaemonEvent, DaemonFault, PropertyStore, WifiDaemon, WpsMode};

use crate::config::SessionConfig;
use crate::convert::profile_target;
use crate::error::WifiError;
use crate::events::{ConnectionEvent, DeviceStateEvent, ScanEvent};
use crate::model::{AccessPoint, ConnectionState, DeviceState, Essid};
use crate::registry::{ApHandle, ApRegistry};
use crate::slots::{lock, CallbackSlots};

type ScanCompletion = Box<dyn FnOnce(Option<WifiError>) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkRequestKind {
    Connect,
    Disconnect,
}

/// In-flight request bookkeeping: at most one of each class.
#[derive(Default)]
struct Pending {
    /// Target of the outstanding power request.
    power: Option<DeviceState>,
    /// One-shot completion for the outstanding scan.
    scan: Option<ScanCompletion>,
    /// Outstanding connect/disconnect and the identity it targets.
    link: Option<LinkRequestKind>,
}

struct SessionInner<D, P> {
    daemon: D,
    properties: P,
    config: SessionConfig,
    registry: Mutex<ApRegistry>,
    slots: CallbackSlots,
    device_state: watch::Sender<DeviceState>,
    connection_state: watch::Sender<ConnectionState>,
    pending: Mutex<Pending>,
    cancel: CancellationToken,
    event_task: Mutex<Option<JoinHandle<()>>>,
}

/// One attached client's view of the radio.
///
/// Cheaply cloneable. Created by `WifiClient::initialize` and torn
/// down by `WifiClient::deinitialize`; usable directly when the
/// lifecycle guard of the facade is not wanted.
pub struct Session<D, P> {
    inner: Arc<SessionInner<D, P>>,
}

impl<D, P> Clone for Session<D, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D, P> Session<D, P>
where
    D: WifiDaemon + Send + Sync + 'static,
    P: PropertyStore + Send + Sync + 'static,
{
    /// Attach to the daemon and spawn the event loop.
    pub async fn start(daemon: D, properties: P, config: SessionConfig) -> Result<Self, WifiError> {
        let events = daemon.attach().await?;

        // Seed the device state from the property store; events keep it
        // synchronized from here on.
        let initial = match properties.get_int(&config.power_state_key).await {
            Ok(value) => {
                if value == 0 {
                    DeviceState::Deactivated
                } else {
                    DeviceState::Activated
                }
            }
            Err(e) => {
                debug!(error = %e, "power state unavailable, assuming deactivated");
                DeviceState::Deactivated
            }
        };

        let (device_state, _) = watch::channel(initial);
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);

        let inner = Arc::new(SessionInner {
            daemon,
            properties,
            config,
            registry: Mutex::new(ApRegistry::new()),
            slots: CallbackSlots::new(),
            device_state,
            connection_state,
            pending: Mutex::new(Pending::default()),
            cancel: CancellationToken::new(),
            event_task: Mutex::new(None),
        });

        let task = tokio::spawn(event_loop_task(Arc::clone(&inner), events));
        *lock(&inner.event_task) = Some(task);

        info!(device = ?initial, "session started");
        Ok(Self { inner })
    }

    /// Cancel the event loop, abandon in-flight requests, and drop all
    /// registrations and records. The daemon is not told to abort
    /// anything it is still working on -- a known limitation of the
    /// underlying service.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let task = lock(&self.inner.event_task).take();
        if let Some(task) = task {
            let _ = task.await;
        }

        {
            let mut pending = lock(&self.inner.pending);
            pending.power = None;
            pending.scan = None;
            pending.link = None;
        }
        self.inner.slots.clear_all();
        lock(&self.inner.registry).clear();
        debug!("session shut down");
    }

    // ── State observation ───────────────────────────────────────────

    pub fn device_state(&self) -> DeviceState {
        *self.inner.device_state.borrow()
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.inner.connection_state.borrow()
    }

    /// Subscribe to device state changes.
    pub fn watch_device_state(&self) -> watch::Receiver<DeviceState> {
        self.inner.device_state.subscribe()
    }

    /// Subscribe to connection state changes.
    pub fn watch_connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    // ── Polled getters ──────────────────────────────────────────────

    /// Radio power state as the property store reports it.
    pub async fn is_activated(&self) -> Result<bool, WifiError> {
        let value = self
            .inner
            .properties
            .get_int(&self.inner.config.power_state_key)
            .await?;
        Ok(value != 0)
    }

    /// BSSID of the active link.
    pub async fn mac_address(&self) -> Result<String, WifiError> {
        Ok(self
            .inner
            .properties
            .get_string(&self.inner.config.bssid_key)
            .await?)
    }

    /// Name of the wireless interface (e.g. `wlan0`).
    pub async fn interface_name(&self) -> Result<String, WifiError> {
        self.submit(self.inner.daemon.interface_name()).await
    }

    // ── Power ───────────────────────────────────────────────────────

    /// Request radio activation. Completion arrives on the device state
    /// slot with `is_requested = true`.
    pub async fn activate(&self) -> Result<(), WifiError> {
        {
            let mut pending = lock(&self.inner.pending);
            if self.device_state() == DeviceState::Activated {
                return Err(WifiError::invalid_operation("already activated"));
            }
            if pending.power.is_some() {
                return Err(WifiError::invalid_operation(
                    "power request already in flight",
                ));
            }
            pending.power = Some(DeviceState::Activated);
        }

        let result = self.submit(self.inner.daemon.power_on()).await;
        if result.is_err() {
            lock(&self.inner.pending).power = None;
        }
        result
    }

    /// Request radio deactivation.
    pub async fn deactivate(&self) -> Result<(), WifiError> {
        {
            let mut pending = lock(&self.inner.pending);
            if self.device_state() == DeviceState::Deactivated {
                return Err(WifiError::invalid_operation("already deactivated"));
            }
            if pending.power.is_some() {
                return Err(WifiError::invalid_operation(
                    "power request already in flight",
                ));
            }
            pending.power = Some(DeviceState::Deactivated);
        }

        let result = self.submit(self.inner.daemon.power_off()).await;
        if result.is_err() {
            lock(&self.inner.pending).power = None;
        }
        result
    }

    // ── Scan ────────────────────────────────────────────────────────

    /// Request a scan. `on_done` fires exactly once, from the event
    /// loop, when the daemon confirms; the found-AP list has been
    /// replaced by then. A scan already in flight is an error -- the
    /// earlier caller's completion is never silently dropped.
    pub async fn scan<F>(&self, on_done: F) -> Result<(), WifiError>
    where
        F: FnOnce(Option<WifiError>) + Send + 'static,
    {
        {
            let mut pending = lock(&self.inner.pending);
            if pending.scan.is_some() {
                return Err(WifiError::invalid_operation("scan already in flight"));
            }
            pending.scan = Some(Box::new(on_done));
        }

        let result = self.submit(self.inner.daemon.request_scan()).await;
        if result.is_err() {
            lock(&self.inner.pending).scan = None;
        }
        result
    }

    // ── Link ────────────────────────────────────────────────────────

    /// Request a connection to the AP behind `handle`.
    pub async fn connect(&self, handle: ApHandle) -> Result<(), WifiError> {
        let ap = self.guarded_link_target(handle)?;
        self.reserve_link(LinkRequestKind::Connect)?;

        let result = self
            .submit(self.inner.daemon.open_profile(&profile_target(&ap)))
            .await;
        if result.is_err() {
            lock(&self.inner.pending).link = None;
        }
        result
    }

    /// Request a WPS connection. `pin` is required in PIN mode.
    pub async fn connect_wps(
        &self,
        handle: ApHandle,
        mode: WpsMode,
        pin: Option<&str>,
    ) -> Result<(), WifiError> {
        if mode == WpsMode::Pin && pin.is_none() {
            return Err(WifiError::invalid_parameter("WPS PIN mode requires a PIN"));
        }

        let ap = self.guarded_link_target(handle)?;
        self.reserve_link(LinkRequestKind::Connect)?;

        let result = self
            .submit(
                self.inner
                    .daemon
                    .connect_wps(&profile_target(&ap), mode, pin),
            )
            .await;
        if result.is_err() {
            lock(&self.inner.pending).link = None;
        }
        result
    }

    /// Request disconnection. `handle` must name the currently
    /// connected AP -- identity, not mere validity.
    pub async fn disconnect(&self, handle: ApHandle) -> Result<(), WifiError> {
        let ap = {
            let registry = lock(&self.inner.registry);
            let ap = registry.get(handle)?.clone();
            if !registry.is_connected_identity(handle) {
                return Err(WifiError::invalid_parameter(
                    "not the currently connected access point",
                ));
            }
            ap
        };

        let state = self.connection_state();
        if state.is_transitional() {
            return Err(WifiError::invalid_operation(format!("link is {state}")));
        }
        self.reserve_link(LinkRequestKind::Disconnect)?;

        let result = self
            .submit(self.inner.daemon.close_profile(&profile_target(&ap)))
            .await;
        if result.is_err() {
            lock(&self.inner.pending).link = None;
        }
        result
    }

    /// Drop the daemon's stored credentials for the AP.
    pub async fn forget(&self, handle: ApHandle) -> Result<(), WifiError> {
        let ap = {
            let registry = lock(&self.inner.registry);
            registry.get(handle)?.clone()
        };

        self.submit(self.inner.daemon.forget_profile(&profile_target(&ap)))
            .await?;

        if let Ok(entry) = lock(&self.inner.registry).get_mut(handle) {
            entry.favorite = false;
        }
        Ok(())
    }

    /// Caller-owned clone of the connected AP.
    pub fn connected_ap(&self) -> Result<ApHandle, WifiError> {
        if self.connection_state() != ConnectionState::Connected {
            return Err(WifiError::NoConnection);
        }
        lock(&self.inner.registry)
            .clone_connected()
            .ok_or(WifiError::NoConnection)
    }

    // ── Registry access ─────────────────────────────────────────────

    pub fn create_ap(&self, essid: Essid) -> ApHandle {
        lock(&self.inner.registry).create(essid)
    }

    pub fn clone_ap(&self, handle: ApHandle) -> Result<ApHandle, WifiError> {
        lock(&self.inner.registry).clone_ap(handle)
    }

    pub fn destroy_ap(&self, handle: ApHandle) -> Result<(), WifiError> {
        lock(&self.inner.registry).destroy(handle)
    }

    pub fn is_valid(&self, handle: ApHandle) -> bool {
        lock(&self.inner.registry).is_valid(handle)
    }

    /// Snapshot of the record behind `handle`.
    pub fn ap(&self, handle: ApHandle) -> Result<AccessPoint, WifiError> {
        lock(&self.inner.registry).get(handle).cloned()
    }

    /// Mutate the record behind `handle` in place.
    pub fn update_ap<F>(&self, handle: ApHandle, update: F) -> Result<(), WifiError>
    where
        F: FnOnce(&mut AccessPoint),
    {
        let mut registry = lock(&self.inner.registry);
        update(registry.get_mut(handle)?);
        Ok(())
    }

    pub fn found_count(&self) -> usize {
        lock(&self.inner.registry).found_count()
    }

    /// Visit the found list in scan order. The visitor runs on a
    /// snapshot taken outside the registry lock, so a completing scan
    /// can never mutate the list mid-iteration and the visitor is free
    /// to call back into the session.
    pub fn for_each_found<F>(&self, mut visitor: F)
    where
        F: FnMut(ApHandle, &AccessPoint) -> ControlFlow<()>,
    {
        let snapshot = lock(&self.inner.registry).found_snapshot();
        for (handle, ap) in &snapshot {
            if visitor(*handle, ap).is_break() {
                break;
            }
        }
    }

    // ── Callback slots ──────────────────────────────────────────────

    /// Register the device state callback (last writer wins).
    pub fn set_device_state_cb<F>(&self, callback: F)
    where
        F: FnMut(DeviceStateEvent) + Send + 'static,
    {
        self.inner.slots.device_state.set_overwrite(callback);
    }

    pub fn unset_device_state_cb(&self) -> Result<(), WifiError> {
        self.inner.slots.device_state.unset()
    }

    /// Register the scan callback (last writer wins). Fires for every
    /// completed scan, including daemon-initiated background scans.
    pub fn set_scan_cb<F>(&self, callback: F)
    where
        F: FnMut(ScanEvent) + Send + 'static,
    {
        self.inner.slots.scan.set_overwrite(callback);
    }

    pub fn unset_scan_cb(&self) -> Result<(), WifiError> {
        self.inner.slots.scan.unset()
    }

    /// Register the connection state callback (last writer wins).
    pub fn set_connection_state_cb<F>(&self, callback: F)
    where
        F: FnMut(ConnectionEvent) + Send + 'static,
    {
        self.inner.slots.connection.set_overwrite(callback);
    }

    pub fn unset_connection_state_cb(&self) -> Result<(), WifiError> {
        self.inner.slots.connection.unset()
    }

    // ── Internals ───────────────────────────────────────────────────

    /// Common validation for connect-class requests: live handle,
    /// activated device, settled link, not already connected there.
    fn guarded_link_target(&self, handle: ApHandle) -> Result<AccessPoint, WifiError> {
        let ap = {
            let registry = lock(&self.inner.registry);
            let ap = registry.get(handle)?.clone();
            if registry.is_connected_identity(handle) {
                return Err(WifiError::invalid_operation(
                    "already connected to this access point",
                ));
            }
            ap
        };

        if self.device_state() != DeviceState::Activated {
            return Err(WifiError::invalid_operation("device is not activated"));
        }
        let state = self.connection_state();
        if state.is_transitional() {
            return Err(WifiError::invalid_operation(format!("link is {state}")));
        }
        Ok(ap)
    }

    fn reserve_link(&self, kind: LinkRequestKind) -> Result<(), WifiError> {
        let mut pending = lock(&self.inner.pending);
        if pending.link.is_some() {
            return Err(WifiError::invalid_operation(
                "link request already in flight",
            ));
        }
        pending.link = Some(kind);
        Ok(())
    }

    /// Bound request submission; completions are unbounded by design.
    async fn submit<T, F>(&self, request: F) -> Result<T, WifiError>
    where
        F: Future<Output = Result<T, airlink_api::Error>>,
    {
        match tokio::time::timeout(self.inner.config.request_timeout, request).await {
            Ok(result) => result.map_err(WifiError::from),
            Err(_) => Err(WifiError::operation_failed("request submission timed out")),
        }
    }
}

// ── Event loop ───────────────────────────────────────────────────────

async fn event_loop_task<D, P>(
    inner: Arc<SessionInner<D, P>>,
    mut events: broadcast::Receiver<DaemonEvent>,
) {
    loop {
        tokio::select! {
            biased;
            _ = inner.cancel.cancelled() => break,
            event = events.recv() => match event {
                Ok(event) => handle_event(&inner, event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "daemon event stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    warn!("daemon event stream closed");
                    break;
                }
            }
        }
    }
}

fn handle_event<D, P>(inner: &SessionInner<D, P>, event: DaemonEvent) {
    match event {
        DaemonEvent::PowerChanged {
            powered,
            fault,
            requested,
        } => on_power_changed(inner, powered, fault, requested),
        DaemonEvent::LinkChanged {
            state,
            ap,
            fault,
            requested,
        } => on_link_changed(inner, state, ap, fault, requested),
        DaemonEvent::ScanFinished {
            aps,
            fault,
            requested,
        } => on_scan_finished(inner, aps, fault, requested),
    }
}

fn on_power_changed<D, P>(
    inner: &SessionInner<D, P>,
    powered: bool,
    fault: Option<DaemonFault>,
    requested: bool,
) {
    let error = fault.map(WifiError::from_fault);
    let state = if powered {
        DeviceState::Activated
    } else {
        DeviceState::Deactivated
    };

    if requested {
        lock(&inner.pending).power = None;
    }

    inner.device_state.send_replace(state);

    if state == DeviceState::Deactivated {
        // The radio took the link and the scan results with it.
        inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        {
            let mut registry = lock(&inner.registry);
            registry.clear_found();
            registry.clear_connected();
        }
        // Requests still waiting on the daemon will never hear back.
        let abandoned_scan = {
            let mut pending = lock(&inner.pending);
            pending.link = None;
            pending.scan.take()
        };
        if let Some(completion) = abandoned_scan {
            completion(Some(WifiError::operation_failed("operation aborted")));
        }
    }

    debug!(?state, requested, "device state changed");
    inner.slots.device_state.dispatch(DeviceStateEvent {
        state,
        error,
        is_requested: requested,
    });
}

fn on_link_changed<D, P>(
    inner: &SessionInner<D, P>,
    state: airlink_api::LinkState,
    ap: Option<Box<ApInfo>>,
    fault: Option<DaemonFault>,
    requested: bool,
) {
    let error = fault.map(WifiError::from_fault);
    let new_state = ConnectionState::from(state);
    let mut domain_ap: Option<AccessPoint> = ap.as_deref().map(AccessPoint::from);

    {
        let mut registry = lock(&inner.registry);
        match new_state {
            ConnectionState::Connected => {
                if let Some(ap) = &domain_ap {
                    registry.set_connected(ap.clone());
                    registry.mark_found_state(ap, ConnectionState::Connected);
                }
            }
            ConnectionState::Disconnected => {
                if let Some(ap) = &domain_ap {
                    registry.mark_found_state(ap, ConnectionState::Disconnected);
                }
                registry.clear_connected();
            }
            transitional => {
                if let Some(ap) = &domain_ap {
                    registry.mark_found_state(ap, transitional);
                }
            }
        }
    }

    inner.connection_state.send_replace(new_state);

    // Terminal states resolve the in-flight request; transitional ones
    // (Connecting, Disconnecting) are progress, not completion.
    if requested && !new_state.is_transitional() {
        lock(&inner.pending).link = None;
    }

    debug!(state = %new_state, requested, "connection state changed");
    if let Some(ap) = domain_ap.as_mut() {
        ap.state = new_state;
    }
    inner.slots.connection.dispatch(ConnectionEvent {
        state: new_state,
        ap: domain_ap,
        error,
        is_requested: requested,
    });
}

fn on_scan_finished<D, P>(
    inner: &SessionInner<D, P>,
    aps: Vec<ApInfo>,
    fault: Option<DaemonFault>,
    requested: bool,
) {
    let error = fault.map(WifiError::from_fault);

    // A failed scan leaves the previous result set in place; only a
    // successful one replaces the list, and always wholesale.
    if error.is_none() {
        let converted: Vec<AccessPoint> = aps.iter().map(AccessPoint::from).collect();
        debug!(count = converted.len(), requested, "scan results ingested");
        lock(&inner.registry).replace_found(converted);
    }

    // The one-shot completion belongs to this client's own request; a
    // background scan never resolves it.
    let completion = if requested {
        lock(&inner.pending).scan.take()
    } else {
        None
    };
    if let Some(completion) = completion {
        completion(error.clone());
    }

    inner.slots.scan.dispatch(ScanEvent {
        error,
        is_requested: requested,
    });
}
