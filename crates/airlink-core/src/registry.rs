// ── Access point registry ──
//
// Arena of AccessPoint records addressed by generation-checked index.
// A handle is a (index, generation) pair: freeing a slot bumps its
// generation, so every handle to the old occupant goes stale and
// validity has a precise answer. Records are owned either by the caller
// (create/clone) or by the registry itself (found list, connected-AP
// slot); registry-owned records are replaced wholesale when a scan
// completes and cannot be destroyed through a handle.

use std::ops::ControlFlow;

use crate::error::WifiError;
use crate::model::{AccessPoint, Bssid, ConnectionState, Essid};

/// Opaque, copyable reference to a registry record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ApHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Caller,
    Registry,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    record: Option<(AccessPoint, Owner)>,
}

/// In-memory store for every live AccessPoint record of one session.
#[derive(Debug, Default)]
pub struct ApRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Scan-result handles in delivery order.
    found: Vec<ApHandle>,
    connected: Option<ApHandle>,
}

impl ApRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Caller-owned records ────────────────────────────────────────

    /// Allocate a caller-owned record with default (unset) fields.
    pub fn create(&mut self, essid: Essid) -> ApHandle {
        self.alloc(AccessPoint::new(essid), Owner::Caller)
    }

    /// Deep-copy `handle` into a new caller-owned record. The copy
    /// shares nothing with the source; either side can change or be
    /// destroyed without the other noticing.
    pub fn clone_ap(&mut self, handle: ApHandle) -> Result<ApHandle, WifiError> {
        let ap = self.get(handle)?.clone();
        Ok(self.alloc(ap, Owner::Caller))
    }

    /// Release a caller-owned record. The handle (and every copy of it)
    /// is stale afterwards.
    pub fn destroy(&mut self, handle: ApHandle) -> Result<(), WifiError> {
        let owner = self
            .slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.record.as_ref())
            .map(|&(_, owner)| owner)
            .ok_or_else(|| WifiError::invalid_parameter("stale access point handle"))?;

        match owner {
            Owner::Caller => {
                self.release(handle.index);
                Ok(())
            }
            Owner::Registry => Err(WifiError::invalid_operation(
                "access point is owned by the registry",
            )),
        }
    }

    /// True iff `handle` names a live record: a found-list entry, the
    /// connected-AP slot, or a created/cloned record not yet destroyed.
    pub fn is_valid(&self, handle: ApHandle) -> bool {
        self.get(handle).is_ok()
    }

    pub fn get(&self, handle: ApHandle) -> Result<&AccessPoint, WifiError> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.record.as_ref())
            .map(|(ap, _)| ap)
            .ok_or_else(|| WifiError::invalid_parameter("stale access point handle"))
    }

    pub fn get_mut(&mut self, handle: ApHandle) -> Result<&mut AccessPoint, WifiError> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.record.as_mut())
            .map(|(ap, _)| ap)
            .ok_or_else(|| WifiError::invalid_parameter("stale access point handle"))
    }

    // ── Found list ──────────────────────────────────────────────────

    /// Replace the scan-result list wholesale. Every handle from the
    /// previous scan goes stale; insertion order is delivery order.
    pub fn replace_found(&mut self, aps: Vec<AccessPoint>) {
        self.clear_found();
        let handles: Vec<ApHandle> = aps
            .into_iter()
            .map(|ap| self.alloc(ap, Owner::Registry))
            .collect();
        self.found = handles;
    }

    pub fn clear_found(&mut self) {
        let old = std::mem::take(&mut self.found);
        for handle in old {
            self.release(handle.index);
        }
    }

    pub fn found_count(&self) -> usize {
        self.found.len()
    }

    /// Clone of the found list in scan order, with the handle of each
    /// entry, for iteration outside the registry lock.
    pub fn found_snapshot(&self) -> Vec<(ApHandle, AccessPoint)> {
        self.found
            .iter()
            .filter_map(|&h| self.get(h).ok().cloned().map(|ap| (h, ap)))
            .collect()
    }

    /// Membership test by identity pair, not handle.
    pub fn contains_found(&self, essid: &Essid, bssid: Option<&Bssid>) -> bool {
        self.found.iter().any(|&h| {
            self.get(h).is_ok_and(|ap| {
                ap.essid == *essid
                    && match (bssid, &ap.bssid) {
                        (Some(want), Some(have)) => want == have,
                        _ => true,
                    }
            })
        })
    }

    /// Visit every found record in order; `Break` stops early. An empty
    /// list visits nothing and is not an error. The handle stays usable
    /// after the visit (until the next scan replaces the list), but
    /// callers that need the record beyond that must clone it.
    pub fn for_each_found<F>(&self, mut visitor: F)
    where
        F: FnMut(ApHandle, &AccessPoint) -> ControlFlow<()>,
    {
        for &handle in &self.found {
            if let Ok(ap) = self.get(handle) {
                if visitor(handle, ap).is_break() {
                    break;
                }
            }
        }
    }

    /// Propagate a link-state change onto the found entries that share
    /// the given identity.
    pub fn mark_found_state(&mut self, ap: &AccessPoint, state: ConnectionState) {
        let matching: Vec<ApHandle> = self
            .found
            .iter()
            .copied()
            .filter(|&h| self.get(h).is_ok_and(|entry| entry.same_identity(ap)))
            .collect();
        for handle in matching {
            if let Ok(entry) = self.get_mut(handle) {
                entry.state = state;
            }
        }
    }

    // ── Connected-AP slot ───────────────────────────────────────────

    /// Install `ap` as the connected record, replacing any previous one.
    pub fn set_connected(&mut self, mut ap: AccessPoint) -> ApHandle {
        self.clear_connected();
        ap.state = ConnectionState::Connected;
        let handle = self.alloc(ap, Owner::Registry);
        self.connected = Some(handle);
        handle
    }

    pub fn clear_connected(&mut self) {
        if let Some(handle) = self.connected.take() {
            self.release(handle.index);
        }
    }

    pub fn connected(&self) -> Option<&AccessPoint> {
        self.connected.and_then(|h| self.get(h).ok())
    }

    /// Clone the connected record into a caller-owned handle, so the
    /// caller's later mutation or destruction cannot touch live state.
    pub fn clone_connected(&mut self) -> Option<ApHandle> {
        let ap = self.connected()?.clone();
        Some(self.alloc(ap, Owner::Caller))
    }

    /// True iff `handle` names (by identity) the currently connected AP.
    pub fn is_connected_identity(&self, handle: ApHandle) -> bool {
        let Ok(candidate) = self.get(handle) else {
            return false;
        };
        self.connected()
            .is_some_and(|connected| connected.same_identity(candidate))
    }

    // ── Teardown ────────────────────────────────────────────────────

    /// Drop everything, registry-owned and caller-owned alike. All
    /// outstanding handles go stale.
    pub fn clear(&mut self) {
        self.clear_found();
        self.clear_connected();
        let live: Vec<u32> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.record.is_some())
            .map(|(index, _)| index as u32)
            .collect();
        for index in live {
            self.release(index);
        }
    }

    // ── Arena internals ─────────────────────────────────────────────

    fn alloc(&mut self, ap: AccessPoint, owner: Owner) -> ApHandle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.record = Some((ap, owner));
            ApHandle {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                record: Some((ap, owner)),
            });
            ApHandle {
                index,
                generation: 0,
            }
        }
    }

    fn release(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        if slot.record.take().is_some() {
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SecurityType;

    fn ap(essid: &str, bssid: &str) -> AccessPoint {
        let mut ap = AccessPoint::new(Essid::new(essid));
        ap.bssid = Some(Bssid::new(bssid));
        ap
    }

    #[test]
    fn create_then_destroy_goes_stale() {
        let mut reg = ApRegistry::new();
        let h = reg.create(Essid::new("corp-main"));

        assert!(reg.is_valid(h));
        reg.destroy(h).expect("destroy");
        assert!(!reg.is_valid(h));
        assert!(matches!(
            reg.destroy(h),
            Err(WifiError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn clone_is_independent_of_source() {
        let mut reg = ApRegistry::new();
        let source = reg.create(Essid::new("corp-main"));
        let copy = reg.clone_ap(source).expect("clone");

        // Mutating the source never shows through the clone.
        reg.get_mut(source).expect("source").security.security_type = SecurityType::Wpa2Psk;
        assert_eq!(
            reg.get(copy).expect("copy").security.security_type,
            SecurityType::None
        );

        // Destroying the source leaves the clone alive.
        reg.destroy(source).expect("destroy source");
        assert!(reg.is_valid(copy));
    }

    #[test]
    fn reused_slot_rejects_old_generation() {
        let mut reg = ApRegistry::new();
        let first = reg.create(Essid::new("one"));
        reg.destroy(first).expect("destroy");

        // Slot gets reused; the old handle must stay stale.
        let second = reg.create(Essid::new("two"));
        assert!(reg.is_valid(second));
        assert!(!reg.is_valid(first));
    }

    #[test]
    fn replace_found_invalidates_previous_scan() {
        let mut reg = ApRegistry::new();
        reg.replace_found(vec![ap("a", "00:00:00:00:00:01"), ap("b", "00:00:00:00:00:02")]);
        let stale: Vec<ApHandle> = reg.found.clone();

        reg.replace_found(vec![ap("c", "00:00:00:00:00:03")]);
        assert_eq!(reg.found_count(), 1);
        for handle in stale {
            assert!(!reg.is_valid(handle));
        }
    }

    #[test]
    fn found_records_cannot_be_destroyed_by_callers() {
        let mut reg = ApRegistry::new();
        reg.replace_found(vec![ap("a", "00:00:00:00:00:01")]);
        let handle = reg.found[0];

        assert!(matches!(
            reg.destroy(handle),
            Err(WifiError::InvalidOperation { .. })
        ));
        assert!(reg.is_valid(handle));
    }

    #[test]
    fn iteration_preserves_delivery_order_and_stops_early() {
        let mut reg = ApRegistry::new();
        reg.replace_found(vec![
            ap("a", "00:00:00:00:00:01"),
            ap("b", "00:00:00:00:00:02"),
            ap("c", "00:00:00:00:00:03"),
        ]);

        let mut seen = Vec::new();
        reg.for_each_found(|handle, entry| {
            assert!(reg.is_valid(handle));
            seen.push(entry.essid.as_str().to_owned());
            ControlFlow::Continue(())
        });
        assert_eq!(seen, ["a", "b", "c"]);

        let mut visits = 0;
        reg.for_each_found(|_, _| {
            visits += 1;
            ControlFlow::Break(())
        });
        assert_eq!(visits, 1);
    }

    #[test]
    fn empty_iteration_visits_nothing() {
        let reg = ApRegistry::new();
        let mut visits = 0;
        reg.for_each_found(|_, _| {
            visits += 1;
            ControlFlow::Continue(())
        });
        assert_eq!(visits, 0);
    }

    #[test]
    fn membership_is_by_identity_not_handle() {
        let mut reg = ApRegistry::new();
        reg.replace_found(vec![ap("corp-main", "3c:22:fb:10:aa:01")]);

        assert!(reg.contains_found(&Essid::new("corp-main"), Some(&Bssid::new("3c:22:fb:10:aa:01"))));
        assert!(reg.contains_found(&Essid::new("corp-main"), None));
        assert!(!reg.contains_found(&Essid::new("corp-main"), Some(&Bssid::new("ff:ff:ff:ff:ff:ff"))));
        assert!(!reg.contains_found(&Essid::new("corp-guest"), None));
    }

    #[test]
    fn connected_clone_outlives_clear() {
        let mut reg = ApRegistry::new();
        reg.set_connected(ap("corp-main", "3c:22:fb:10:aa:01"));

        let clone = reg.clone_connected().expect("clone");
        reg.clear_connected();

        assert!(reg.connected().is_none());
        assert!(reg.is_valid(clone));
        assert_eq!(
            reg.get(clone).expect("clone").essid.as_str(),
            "corp-main"
        );
    }

    #[test]
    fn connected_identity_check() {
        let mut reg = ApRegistry::new();
        reg.replace_found(vec![
            ap("corp-main", "3c:22:fb:10:aa:01"),
            ap("corp-guest", "3c:22:fb:10:aa:02"),
        ]);
        reg.set_connected(ap("corp-main", "3c:22:fb:10:aa:01"));

        let main = reg.found[0];
        let guest = reg.found[1];
        assert!(reg.is_connected_identity(main));
        assert!(!reg.is_connected_identity(guest));
    }

    #[test]
    fn clear_stales_everything() {
        let mut reg = ApRegistry::new();
        let created = reg.create(Essid::new("mine"));
        reg.replace_found(vec![ap("a", "00:00:00:00:00:01")]);
        let found = reg.found[0];

        reg.clear();
        assert!(!reg.is_valid(created));
        assert!(!reg.is_valid(found));
        assert_eq!(reg.found_count(), 0);
    }
}
