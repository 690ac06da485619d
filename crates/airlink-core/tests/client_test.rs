// End-to-end tests for `WifiClient` against the simulator backend.
//
// Paused tokio time makes the simulator's request latency free: the
// clock auto-advances whenever every task is idle, so completions
// arrive deterministically without real sleeping.

use std::ops::ControlFlow;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::sync::mpsc;

use airlink_api::sim::{demo_aps, SimNet};
use airlink_api::{DaemonFault, WpsMode};
use airlink_core::{
    ConnectionState, DeviceState, SecurityType, SessionConfig, WifiClient, WifiError,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn client_for(sim: &SimNet) -> WifiClient<SimNet, SimNet> {
    WifiClient::new(sim.clone(), sim.clone(), SessionConfig::default())
}

async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(Duration::from_secs(30), rx.recv())
        .await
        .expect("timed out waiting for callback")
        .expect("callback channel closed")
}

async fn wait_connection(client: &WifiClient<SimNet, SimNet>, want: ConnectionState) {
    let mut rx = client.watch_connection_state().await.expect("watch");
    tokio::time::timeout(Duration::from_secs(30), rx.wait_for(|s| *s == want))
        .await
        .expect("timed out waiting for connection state")
        .expect("state watch closed");
}

/// initialize + activate, waiting for the confirmation.
async fn activated(sim: &SimNet) -> WifiClient<SimNet, SimNet> {
    let client = client_for(sim);
    client.initialize().await.expect("initialize");
    client.activate().await.expect("activate");

    let mut rx = client.watch_device_state().await.expect("watch");
    tokio::time::timeout(
        Duration::from_secs(30),
        rx.wait_for(|s| *s == DeviceState::Activated),
    )
    .await
    .expect("timed out waiting for activation")
    .expect("state watch closed");
    client
}

/// Scan and wait for the one-shot completion.
async fn scanned(client: &WifiClient<SimNet, SimNet>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    client
        .scan(move |err| {
            let _ = tx.send(err);
        })
        .await
        .expect("scan submit");
    assert!(recv(&mut rx).await.is_none(), "scan must succeed");
}

// ── The full lifecycle scenario ─────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn full_lifecycle_scenario() {
    let sim = SimNet::new().with_aps(demo_aps());
    let client = client_for(&sim);

    client.initialize().await.expect("initialize");

    let (dev_tx, mut dev_rx) = mpsc::unbounded_channel();
    client
        .set_device_state_cb(move |ev| {
            let _ = dev_tx.send(ev);
        })
        .await
        .expect("set device cb");

    // Activation confirms asynchronously with is_requested = true.
    client.activate().await.expect("activate");
    let ev = recv(&mut dev_rx).await;
    assert_eq!(ev.state, DeviceState::Activated);
    assert!(ev.is_requested);
    assert!(ev.error.is_none());

    // Scan: one-shot completion, then the found list holds exactly the
    // delivered records in delivery order.
    scanned(&client).await;
    let mut found = Vec::new();
    client
        .foreach_found_ap(|handle, ap| {
            found.push((handle, ap.essid.as_str().to_owned()));
            ControlFlow::Continue(())
        })
        .await
        .expect("foreach");
    let names: Vec<&str> = found.iter().map(|(_, name)| name.as_str()).collect();
    assert_eq!(names, ["corp-main", "corp-guest", "lab-2g"]);

    // Connect to the second entry.
    let guest = found[1].0;
    client.connect(guest).await.expect("connect");
    wait_connection(&client, ConnectionState::Connected).await;

    // The connected-AP query returns an independent clone: destroying
    // it does not disturb the live record.
    let taken = client.connected_ap().await.expect("connected ap");
    let snapshot = client.ap(taken).await.expect("snapshot");
    assert_eq!(snapshot.essid.as_str(), "corp-guest");
    assert_eq!(snapshot.state, ConnectionState::Connected);
    client.destroy_ap(taken).await.expect("destroy clone");
    assert!(client.connected_ap().await.is_ok());

    // Deinitialize: init flag drops, the RSSI slot is swept, and
    // further operations are guarded.
    client.set_rssi_level_cb(|_| {}).expect("rssi cb");
    client.deinitialize().await.expect("deinitialize");
    assert!(!client.is_initialized().await);
    assert!(matches!(
        client.scan(|_| {}).await,
        Err(WifiError::InvalidOperation { .. })
    ));
    // The forced clear freed the exclusive slot.
    client
        .set_rssi_level_cb(|_| {})
        .expect("rssi slot free after deinit");
}

// ── Lifecycle guards ────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn initialization_guards() {
    let sim = SimNet::new();
    let client = client_for(&sim);

    assert!(matches!(
        client.activate().await,
        Err(WifiError::InvalidOperation { .. })
    ));
    assert!(matches!(
        client.scan(|_| {}).await,
        Err(WifiError::InvalidOperation { .. })
    ));
    assert!(matches!(
        client.deinitialize().await,
        Err(WifiError::InvalidOperation { .. })
    ));

    client.initialize().await.expect("initialize");
    assert!(matches!(
        client.initialize().await,
        Err(WifiError::InvalidOperation { .. })
    ));

    client.deinitialize().await.expect("deinitialize");
    client.initialize().await.expect("re-initialize");
}

#[tokio::test(start_paused = true)]
async fn polled_getters_work_without_initialization() {
    let sim = SimNet::new();
    let client = client_for(&sim);

    assert!(!client.is_activated().await.expect("is_activated"));
    sim.toggle_power_externally(true);
    assert!(client.is_activated().await.expect("is_activated"));

    // No link, no BSSID property.
    assert!(client.mac_address().await.is_err());
}

// ── Callback slot policies ──────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn overwrite_slots_replace_silently_but_rssi_is_exclusive() {
    let sim = SimNet::new();
    let client = client_for(&sim);
    client.initialize().await.expect("initialize");

    client.set_device_state_cb(|_| {}).await.expect("first");
    client.set_device_state_cb(|_| {}).await.expect("second overwrites");

    client.set_rssi_level_cb(|_| {}).expect("first rssi");
    assert!(matches!(
        client.set_rssi_level_cb(|_| {}),
        Err(WifiError::InvalidOperation { .. })
    ));

    client.unset_rssi_level_cb().expect("unset");
    client.set_rssi_level_cb(|_| {}).expect("free again");

    client.unset_rssi_level_cb().expect("unset");
    assert!(matches!(
        client.unset_rssi_level_cb(),
        Err(WifiError::InvalidOperation { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn rssi_levels_flow_from_the_property_watch() {
    let sim = SimNet::new();
    let client = client_for(&sim);

    // Registration is independent of the daemon lifecycle.
    let (tx, mut rx) = mpsc::unbounded_channel();
    client
        .set_rssi_level_cb(move |level| {
            let _ = tx.send(level);
        })
        .expect("set rssi cb");

    sim.set_signal_level(3);
    assert_eq!(recv(&mut rx).await.value(), 3);

    sim.set_signal_level(1);
    assert_eq!(recv(&mut rx).await.value(), 1);

    client.unset_rssi_level_cb().expect("unset");
}

// ── Request guards ──────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn connect_rejects_stale_handles_synchronously() {
    let sim = SimNet::new().with_aps(demo_aps());
    let client = activated(&sim).await;

    let handle = client.create_ap("corp-main").await.expect("create");
    client.destroy_ap(handle).await.expect("destroy");

    assert!(matches!(
        client.connect(handle).await,
        Err(WifiError::InvalidParameter { .. })
    ));
    // Nothing was submitted: the link state never leaves Disconnected.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(
        client.connection_state().await.expect("state"),
        ConnectionState::Disconnected
    );
}

#[tokio::test(start_paused = true)]
async fn connect_requires_an_activated_device() {
    let sim = SimNet::new().with_aps(demo_aps());
    let client = client_for(&sim);
    client.initialize().await.expect("initialize");

    let handle = client.create_ap("corp-main").await.expect("create");
    assert!(matches!(
        client.connect(handle).await,
        Err(WifiError::InvalidOperation { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn overlapping_requests_are_rejected() {
    let sim = SimNet::new().with_aps(demo_aps());
    let client = activated(&sim).await;

    // Second scan while one is outstanding.
    let (tx, mut rx) = mpsc::unbounded_channel();
    client
        .scan(move |err| {
            let _ = tx.send(err);
        })
        .await
        .expect("first scan");
    assert!(matches!(
        client.scan(|_| {}).await,
        Err(WifiError::InvalidOperation { .. })
    ));
    // The first caller still gets its completion.
    assert!(recv(&mut rx).await.is_none());

    // Second connect while one is outstanding.
    let mut handles = Vec::new();
    client
        .foreach_found_ap(|h, _| {
            handles.push(h);
            ControlFlow::Continue(())
        })
        .await
        .expect("foreach");
    client.connect(handles[0]).await.expect("first connect");
    assert!(matches!(
        client.connect(handles[1]).await,
        Err(WifiError::InvalidOperation { .. })
    ));
    wait_connection(&client, ConnectionState::Connected).await;
}

#[tokio::test(start_paused = true)]
async fn connect_on_the_connected_ap_is_rejected() {
    let sim = SimNet::new().with_aps(demo_aps());
    let client = activated(&sim).await;
    scanned(&client).await;

    let mut first = None;
    client
        .foreach_found_ap(|h, _| {
            first = Some(h);
            ControlFlow::Break(())
        })
        .await
        .expect("foreach");
    let first = first.expect("one found AP");

    client.connect(first).await.expect("connect");
    wait_connection(&client, ConnectionState::Connected).await;

    assert!(matches!(
        client.connect(first).await,
        Err(WifiError::InvalidOperation { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn disconnect_requires_the_connected_identity() {
    let sim = SimNet::new().with_aps(demo_aps());
    let client = activated(&sim).await;
    scanned(&client).await;

    let mut handles = Vec::new();
    client
        .foreach_found_ap(|h, _| {
            handles.push(h);
            ControlFlow::Continue(())
        })
        .await
        .expect("foreach");

    client.connect(handles[0]).await.expect("connect");
    wait_connection(&client, ConnectionState::Connected).await;

    // A valid handle that is not the connected AP is a parameter error,
    // not an operation error.
    assert!(matches!(
        client.disconnect(handles[1]).await,
        Err(WifiError::InvalidParameter { .. })
    ));

    client.disconnect(handles[0]).await.expect("disconnect");
    wait_connection(&client, ConnectionState::Disconnected).await;
    assert!(matches!(
        client.connected_ap().await,
        Err(WifiError::NoConnection)
    ));
}

// ── Asynchronous failures surface in callbacks only ─────────────────

#[tokio::test(start_paused = true)]
async fn failed_scan_keeps_previous_results() {
    let sim = SimNet::new().with_aps(demo_aps());
    let client = activated(&sim).await;
    scanned(&client).await;

    sim.script_scan_fault(DaemonFault::Unknown);
    let (tx, mut rx) = mpsc::unbounded_channel();
    client
        .scan(move |err| {
            let _ = tx.send(err);
        })
        .await
        .expect("submit succeeds despite the scripted fault");
    assert!(matches!(
        recv(&mut rx).await,
        Some(WifiError::OperationFailed { .. })
    ));

    // The stale-but-successful result set is still there.
    let mut count = 0;
    client
        .foreach_found_ap(|_, _| {
            count += 1;
            ControlFlow::Continue(())
        })
        .await
        .expect("foreach");
    assert_eq!(count, 3);
}

#[tokio::test(start_paused = true)]
async fn connect_failure_reports_through_the_connection_callback() {
    let sim = SimNet::new().with_aps(demo_aps());
    let client = activated(&sim).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    client
        .set_connection_state_cb(move |ev| {
            let _ = tx.send(ev);
        })
        .await
        .expect("set connection cb");

    // A record the daemon has never heard of: submission succeeds, the
    // failure arrives asynchronously.
    let ghost = client.create_ap("ghost-network").await.expect("create");
    client.connect(ghost).await.expect("submit");

    let connecting = recv(&mut rx).await;
    assert_eq!(connecting.state, ConnectionState::Connecting);

    let failed = recv(&mut rx).await;
    assert_eq!(failed.state, ConnectionState::Disconnected);
    assert!(failed.is_requested);
    assert!(matches!(
        failed.error,
        Some(WifiError::OperationFailed { .. })
    ));
}

// ── Unsolicited daemon events ───────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn external_transitions_carry_is_requested_false() {
    let sim = SimNet::new().with_aps(demo_aps());
    let client = client_for(&sim);
    client.initialize().await.expect("initialize");

    let (dev_tx, mut dev_rx) = mpsc::unbounded_channel();
    client
        .set_device_state_cb(move |ev| {
            let _ = dev_tx.send(ev);
        })
        .await
        .expect("set device cb");

    sim.toggle_power_externally(true);
    let ev = recv(&mut dev_rx).await;
    assert_eq!(ev.state, DeviceState::Activated);
    assert!(!ev.is_requested);

    // Connect, then lose the link without asking.
    scanned(&client).await;
    let mut first = None;
    client
        .foreach_found_ap(|h, _| {
            first = Some(h);
            ControlFlow::Break(())
        })
        .await
        .expect("foreach");
    client.connect(first.expect("found")).await.expect("connect");
    wait_connection(&client, ConnectionState::Connected).await;

    let (conn_tx, mut conn_rx) = mpsc::unbounded_channel();
    client
        .set_connection_state_cb(move |ev| {
            let _ = conn_tx.send(ev);
        })
        .await
        .expect("set connection cb");

    sim.drop_link_externally();
    let ev = recv(&mut conn_rx).await;
    assert_eq!(ev.state, ConnectionState::Disconnected);
    assert!(!ev.is_requested);
    assert!(matches!(
        client.connected_ap().await,
        Err(WifiError::NoConnection)
    ));
}

#[tokio::test(start_paused = true)]
async fn deactivation_clears_link_and_found_list() {
    let sim = SimNet::new().with_aps(demo_aps());
    let client = activated(&sim).await;
    scanned(&client).await;

    let mut first = None;
    client
        .foreach_found_ap(|h, _| {
            first = Some(h);
            ControlFlow::Break(())
        })
        .await
        .expect("foreach");
    client.connect(first.expect("found")).await.expect("connect");
    wait_connection(&client, ConnectionState::Connected).await;

    client.deactivate().await.expect("deactivate");
    let mut rx = client.watch_device_state().await.expect("watch");
    tokio::time::timeout(
        Duration::from_secs(30),
        rx.wait_for(|s| *s == DeviceState::Deactivated),
    )
    .await
    .expect("timed out")
    .expect("watch closed");

    assert_eq!(
        client.connection_state().await.expect("state"),
        ConnectionState::Disconnected
    );
    let mut count = 0;
    client
        .foreach_found_ap(|_, _| {
            count += 1;
            ControlFlow::Continue(())
        })
        .await
        .expect("foreach");
    assert_eq!(count, 0, "scan results go down with the radio");
}

// ── Background scans ────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn background_scan_fires_the_persistent_slot_only() {
    let sim = SimNet::new().with_aps(demo_aps());
    let client = activated(&sim).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    client
        .set_scan_cb(move |ev| {
            let _ = tx.send(ev);
        })
        .await
        .expect("set scan cb");

    sim.background_scan();
    let ev = recv(&mut rx).await;
    assert!(!ev.is_requested);
    assert!(ev.error.is_none());

    // The list was replaced even though nobody asked.
    let mut count = 0;
    client
        .foreach_found_ap(|_, _| {
            count += 1;
            ControlFlow::Continue(())
        })
        .await
        .expect("foreach");
    assert_eq!(count, 3);
}

// ── WPS ─────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn wps_pin_mode_requires_a_pin() {
    let sim = SimNet::new().with_aps(demo_aps());
    let client = activated(&sim).await;
    scanned(&client).await;

    let mut first = None;
    client
        .foreach_found_ap(|h, _| {
            first = Some(h);
            ControlFlow::Break(())
        })
        .await
        .expect("foreach");
    let first = first.expect("found");

    assert!(matches!(
        client.connect_wps(first, WpsMode::Pin, None).await,
        Err(WifiError::InvalidParameter { .. })
    ));

    // Push-button needs no PIN.
    client
        .connect_wps(first, WpsMode::Pbc, None)
        .await
        .expect("pbc");
    wait_connection(&client, ConnectionState::Connected).await;
}

#[tokio::test(start_paused = true)]
async fn wps_wrong_pin_fails_asynchronously() {
    let sim = SimNet::new().with_aps(demo_aps());
    sim.set_wps_pin("12345670");
    let client = activated(&sim).await;
    scanned(&client).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    client
        .set_connection_state_cb(move |ev| {
            let _ = tx.send(ev);
        })
        .await
        .expect("set connection cb");

    let mut first = None;
    client
        .foreach_found_ap(|h, _| {
            first = Some(h);
            ControlFlow::Break(())
        })
        .await
        .expect("foreach");

    client
        .connect_wps(first.expect("found"), WpsMode::Pin, Some("00000000"))
        .await
        .expect("submit");

    let connecting = recv(&mut rx).await;
    assert_eq!(connecting.state, ConnectionState::Connecting);
    let failed = recv(&mut rx).await;
    assert_eq!(failed.state, ConnectionState::Disconnected);
    assert_eq!(
        failed.error,
        Some(WifiError::OperationFailed {
            reason: "invalid passphrase or PIN".into()
        })
    );
}

// ── Record management through the facade ────────────────────────────

#[tokio::test(start_paused = true)]
async fn created_records_validate_and_clone_deeply() {
    let sim = SimNet::new();
    let client = client_for(&sim);
    client.initialize().await.expect("initialize");

    assert!(matches!(
        client.create_ap("").await,
        Err(WifiError::InvalidParameter { .. })
    ));

    let source = client.create_ap("corp-main").await.expect("create");
    let copy = client.clone_ap(source).await.expect("clone");

    client
        .update_ap(source, |ap| {
            ap.security.security_type = SecurityType::Wpa2Psk;
        })
        .await
        .expect("update source");

    // The clone kept the pre-mutation value.
    let copied = client.ap(copy).await.expect("snapshot");
    assert_eq!(copied.security.security_type, SecurityType::None);

    client.destroy_ap(source).await.expect("destroy");
    assert!(!client.is_valid_ap(source).await);
    assert!(client.is_valid_ap(copy).await);
}

#[tokio::test(start_paused = true)]
async fn forget_clears_the_favorite_flag() {
    let mut aps = demo_aps();
    aps[0].favorite = true;
    let sim = SimNet::new().with_aps(aps);
    let client = activated(&sim).await;
    scanned(&client).await;

    let mut first = None;
    client
        .foreach_found_ap(|h, ap| {
            assert!(ap.favorite);
            first = Some(h);
            ControlFlow::Break(())
        })
        .await
        .expect("foreach");
    let first = first.expect("found");

    client.forget_ap(first).await.expect("forget");
    assert!(!client.ap(first).await.expect("snapshot").favorite);
}
