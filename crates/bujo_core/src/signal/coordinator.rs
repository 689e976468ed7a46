//! Selective computation of the tracked collections' signals.

use crate::signal::{
    ChangeSignal, NamedCollection, SignalComputer, SignalError, SignalResult, UpdateTarget,
};
use crate::source::{CollectionProvider, SourceError, SourceResult};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Signals for the requested targets; unrequested targets are absent from
/// the serialized form, not null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSignals {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owned_projects_etag: Option<ChangeSignal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_projects_etag: Option<ChangeSignal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications_etag: Option<ChangeSignal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups_etag: Option<ChangeSignal>,
}

impl UpdateSignals {
    pub fn get(&self, target: UpdateTarget) -> Option<&ChangeSignal> {
        match target {
            UpdateTarget::OwnedProjects => self.owned_projects_etag.as_ref(),
            UpdateTarget::SharedProjects => self.shared_projects_etag.as_ref(),
            UpdateTarget::Notifications => self.notifications_etag.as_ref(),
            UpdateTarget::Groups => self.groups_etag.as_ref(),
        }
    }

    fn set(&mut self, target: UpdateTarget, signal: ChangeSignal) {
        let slot = match target {
            UpdateTarget::OwnedProjects => &mut self.owned_projects_etag,
            UpdateTarget::SharedProjects => &mut self.shared_projects_etag,
            UpdateTarget::Notifications => &mut self.notifications_etag,
            UpdateTarget::Groups => &mut self.groups_etag,
        };
        *slot = Some(signal);
    }

    /// Targets present in this result.
    pub fn targets(&self) -> Vec<UpdateTarget> {
        UpdateTarget::ALL
            .into_iter()
            .filter(|target| self.get(*target).is_some())
            .collect()
    }
}

/// Fetches and fingerprints tracked collections for one requester.
pub struct UpdateSignalCoordinator {
    provider: Arc<dyn CollectionProvider>,
    computer: SignalComputer,
}

impl UpdateSignalCoordinator {
    pub fn new(provider: Arc<dyn CollectionProvider>) -> Self {
        Self::with_computer(provider, SignalComputer::default())
    }

    pub fn with_computer(provider: Arc<dyn CollectionProvider>, computer: SignalComputer) -> Self {
        Self { provider, computer }
    }

    pub fn computer(&self) -> &SignalComputer {
        &self.computer
    }

    /// Computes the signals of `targets` (every target when empty).
    ///
    /// Only the selected collections are fetched. Each runs to completion
    /// independently; if any fetch failed the call fails naming every
    /// failed target.
    pub fn compute_updates(
        &self,
        requester: &str,
        targets: &BTreeSet<UpdateTarget>,
    ) -> SignalResult<UpdateSignals> {
        let selected: Vec<UpdateTarget> = if targets.is_empty() {
            UpdateTarget::ALL.to_vec()
        } else {
            targets.iter().copied().collect()
        };

        let outcomes: Vec<(UpdateTarget, SignalResult<ChangeSignal>)> = thread::scope(|scope| {
            let handles: Vec<_> = selected
                .iter()
                .map(|target| {
                    let target = *target;
                    (target, scope.spawn(move || self.compute_one(requester, target)))
                })
                .collect();
            handles
                .into_iter()
                .map(|(target, handle)| {
                    let outcome = handle.join().unwrap_or_else(|_| {
                        Err(SignalError::SourceUnavailable(vec![(
                            target,
                            SourceError::Unavailable("signal worker panicked".to_string()),
                        )]))
                    });
                    (target, outcome)
                })
                .collect()
        });

        let mut signals = UpdateSignals::default();
        let mut failures = Vec::new();
        let mut other_error = None;
        for (target, outcome) in outcomes {
            match outcome {
                Ok(signal) => signals.set(target, signal),
                Err(SignalError::SourceUnavailable(mut causes)) => failures.append(&mut causes),
                Err(err) => {
                    other_error.get_or_insert(err);
                }
            }
        }

        if let Some(err) = other_error {
            return Err(err);
        }
        if !failures.is_empty() {
            return Err(SignalError::SourceUnavailable(failures));
        }
        Ok(signals)
    }

    fn compute_one(&self, requester: &str, target: UpdateTarget) -> SignalResult<ChangeSignal> {
        let started_at = Instant::now();
        let collection = match target {
            UpdateTarget::OwnedProjects => capture(target, self.provider.owned_projects(requester)),
            UpdateTarget::SharedProjects => capture(target, self.provider.shared_projects(requester)),
            UpdateTarget::Notifications => capture(target, self.provider.notifications(requester)),
            UpdateTarget::Groups => capture(target, self.provider.groups(requester)),
        };

        let result = collection.and_then(|collection| {
            let signal = self.computer.compute_signal(&collection)?;
            debug!(
                "event=signal_compute module=signal status=ok target={target} records={} duration_ms={}",
                collection.len(),
                started_at.elapsed().as_millis()
            );
            Ok(signal)
        });
        if let Err(err) = &result {
            warn!(
                "event=signal_compute module=signal status=error target={target} duration_ms={} error_code={} error={}",
                started_at.elapsed().as_millis(),
                err.code(),
                err
            );
        }
        result
    }
}

fn capture<T: Serialize>(
    target: UpdateTarget,
    fetched: SourceResult<Vec<T>>,
) -> SignalResult<NamedCollection> {
    let records = fetched.map_err(|err| SignalError::SourceUnavailable(vec![(target, err)]))?;
    NamedCollection::from_records(target, &records)
}

#[cfg(test)]
mod tests {
    use super::{UpdateSignalCoordinator, UpdateSignals};
    use crate::model::presentation::{GroupRecord, NotificationRecord, ProjectRecord};
    use crate::signal::{ChangeSignal, UpdateTarget};
    use crate::source::{CollectionProvider, SourceError, SourceResult};
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingProvider {
        owned: AtomicUsize,
        shared: AtomicUsize,
        notifications: AtomicUsize,
        groups: AtomicUsize,
        failing: Vec<UpdateTarget>,
    }

    impl CountingProvider {
        fn outcome<T>(&self, target: UpdateTarget, counter: &AtomicUsize) -> SourceResult<Vec<T>> {
            counter.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(&target) {
                return Err(SourceError::Unavailable(format!("{target} offline")));
            }
            Ok(Vec::new())
        }
    }

    impl CollectionProvider for CountingProvider {
        fn owned_projects(&self, _requester: &str) -> SourceResult<Vec<ProjectRecord>> {
            self.outcome(UpdateTarget::OwnedProjects, &self.owned)
        }

        fn shared_projects(&self, _requester: &str) -> SourceResult<Vec<ProjectRecord>> {
            self.outcome(UpdateTarget::SharedProjects, &self.shared)
        }

        fn notifications(&self, _requester: &str) -> SourceResult<Vec<NotificationRecord>> {
            self.outcome(UpdateTarget::Notifications, &self.notifications)
        }

        fn groups(&self, _requester: &str) -> SourceResult<Vec<GroupRecord>> {
            self.outcome(UpdateTarget::Groups, &self.groups)
        }
    }

    #[test]
    fn unset_targets_are_absent_from_json() {
        let mut signals = UpdateSignals::default();
        signals.set(
            UpdateTarget::Groups,
            serde_json::from_str::<ChangeSignal>("\"abc\"").expect("signal should parse"),
        );
        let json = serde_json::to_value(&signals).expect("signals should serialize");
        let object = json.as_object().expect("signals should be an object");
        assert_eq!(object.len(), 1);
        assert_eq!(object["groupsEtag"], "abc");
        assert_eq!(signals.targets(), vec![UpdateTarget::Groups]);
    }

    #[test]
    fn serialized_field_names_are_the_target_wire_names() {
        let mut signals = UpdateSignals::default();
        for target in UpdateTarget::ALL {
            signals.set(
                target,
                serde_json::from_str::<ChangeSignal>("\"00\"").expect("signal should parse"),
            );
        }
        let json = serde_json::to_value(&signals).expect("signals should serialize");
        let mut keys: Vec<&str> = json
            .as_object()
            .expect("signals should be an object")
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        let mut wire = UpdateTarget::wire_names();
        wire.sort_unstable();
        assert_eq!(keys, wire);
    }

    #[test]
    fn only_selected_collections_are_fetched() {
        let provider = Arc::new(CountingProvider::default());
        let coordinator = UpdateSignalCoordinator::new(provider.clone());
        let targets = BTreeSet::from([UpdateTarget::Notifications]);

        let signals = coordinator
            .compute_updates("alice", &targets)
            .expect("notifications signal should compute");

        assert!(signals.notifications_etag.is_some());
        assert!(signals.owned_projects_etag.is_none());
        assert_eq!(provider.notifications.load(Ordering::SeqCst), 1);
        assert_eq!(provider.owned.load(Ordering::SeqCst), 0);
        assert_eq!(provider.shared.load(Ordering::SeqCst), 0);
        assert_eq!(provider.groups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_selection_computes_every_target() {
        let provider = Arc::new(CountingProvider::default());
        let coordinator = UpdateSignalCoordinator::new(provider);

        let signals = coordinator
            .compute_updates("alice", &BTreeSet::new())
            .expect("all signals should compute");

        assert_eq!(signals.targets(), UpdateTarget::ALL.to_vec());
    }

    #[test]
    fn every_failed_target_is_reported_after_all_ran() {
        let provider = Arc::new(CountingProvider {
            failing: vec![UpdateTarget::SharedProjects, UpdateTarget::Groups],
            ..CountingProvider::default()
        });
        let coordinator = UpdateSignalCoordinator::new(provider.clone());
        let targets = BTreeSet::from(UpdateTarget::ALL);

        let err = coordinator
            .compute_updates("alice", &targets)
            .expect_err("failing collections should fail the call");

        assert_eq!(err.code(), "source_unavailable");
        assert_eq!(
            err.failed_targets(),
            vec![UpdateTarget::SharedProjects, UpdateTarget::Groups]
        );
        assert_eq!(provider.owned.load(Ordering::SeqCst), 1);
        assert_eq!(provider.notifications.load(Ordering::SeqCst), 1);
    }
}
