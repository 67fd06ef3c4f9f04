// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! ConfigMap watcher - derives created/updated/deleted bundle events from the
//! kube watch stream and hands them to the reconciler one at a time.

use crate::reconcilers::BundleReconciler;
use crate::types::ConfigBundle;
use futures::{pin_mut, StreamExt};
use k8s_openapi::api::core::v1::ConfigMap;
use kube::runtime::watcher::{self, watcher};
use kube::runtime::WatchStreamExt;
use kube::{Api, Client};
use kube_runtime::watcher::Config as WatcherConfig;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

type BundleKey = (String, String);

#[derive(Debug, Clone, PartialEq)]
pub enum BundleEvent {
    Created(ConfigBundle),
    Updated { old: ConfigBundle, new: ConfigBundle },
    Deleted(ConfigBundle),
}

/// Last seen state of every `grafana.net/` annotated ConfigMap, used to pair
/// updates with their previous version and to detect deletions missed while
/// disconnected. Other ConfigMaps are never stored.
#[derive(Debug, Default)]
pub struct BundleCache {
    bundles: HashMap<BundleKey, ConfigBundle>,
    /// Keys seen since the current relist started
    relist: Option<HashSet<BundleKey>>,
}

impl BundleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    pub fn apply(&mut self, event: watcher::Event<ConfigMap>) -> Vec<BundleEvent> {
        match event {
            watcher::Event::Init => {
                debug!("ConfigMap relist started");
                self.relist = Some(HashSet::new());
                Vec::new()
            }
            watcher::Event::InitApply(cm) => {
                let bundle = ConfigBundle::from(&cm);
                if let Some(seen) = self.relist.as_mut() {
                    seen.insert(bundle.key());
                }
                self.upsert(bundle).into_iter().collect()
            }
            watcher::Event::Apply(cm) => {
                self.upsert(ConfigBundle::from(&cm)).into_iter().collect()
            }
            watcher::Event::Delete(cm) => {
                let bundle = ConfigBundle::from(&cm);
                match self.bundles.remove(&bundle.key()) {
                    Some(last_seen) => vec![BundleEvent::Deleted(last_seen)],
                    None if bundle.is_annotated() => vec![BundleEvent::Deleted(bundle)],
                    None => Vec::new(),
                }
            }
            watcher::Event::InitDone => {
                let Some(seen) = self.relist.take() else {
                    return Vec::new();
                };
                let mut gone: Vec<BundleKey> = self
                    .bundles
                    .keys()
                    .filter(|key| !seen.contains(*key))
                    .cloned()
                    .collect();
                gone.sort();
                debug!(
                    "ConfigMap relist done: {} present, {} gone",
                    seen.len(),
                    gone.len()
                );
                gone.into_iter()
                    .filter_map(|key| self.bundles.remove(&key))
                    .map(BundleEvent::Deleted)
                    .collect()
            }
        }
    }

    /// Losing the last annotation still reports an update so the
    /// reconciler sees the transition, then the bundle leaves the cache.
    fn upsert(&mut self, bundle: ConfigBundle) -> Option<BundleEvent> {
        if !bundle.is_annotated() {
            return self
                .bundles
                .remove(&bundle.key())
                .map(|old| BundleEvent::Updated { old, new: bundle });
        }
        match self.bundles.insert(bundle.key(), bundle.clone()) {
            None => Some(BundleEvent::Created(bundle)),
            Some(old) => Some(BundleEvent::Updated { old, new: bundle }),
        }
    }
}

pub struct ConfigMapWatcher {
    client: Client,
    namespace: Option<String>,
    reconciler: BundleReconciler,
}

impl ConfigMapWatcher {
    pub fn new(client: Client, namespace: Option<String>, reconciler: BundleReconciler) -> Self {
        Self {
            client,
            namespace,
            reconciler,
        }
    }

    /// Watch ConfigMaps until the stream ends. Watch errors are retried with backoff.
    pub async fn run(self) -> anyhow::Result<()> {
        let api: Api<ConfigMap> = match &self.namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };
        info!(
            "Watching ConfigMaps in {}",
            self.namespace.as_deref().unwrap_or("all namespaces")
        );

        let stream = watcher(api, WatcherConfig::default()).default_backoff();
        pin_mut!(stream);

        let mut cache = BundleCache::new();
        while let Some(event) = stream.next().await {
            match event {
                Ok(event) => {
                    for bundle_event in cache.apply(event) {
                        self.dispatch(bundle_event).await;
                    }
                }
                Err(e) => warn!("ConfigMap watch error: {}", e),
            }
        }

        warn!("ConfigMap watch stream ended");
        Ok(())
    }

    async fn dispatch(&self, event: BundleEvent) {
        match event {
            BundleEvent::Created(bundle) => self.reconciler.on_create(&bundle).await,
            BundleEvent::Updated { old, new } => self.reconciler.on_update(&old, &new).await,
            BundleEvent::Deleted(bundle) => self.reconciler.on_delete(&bundle).await,
        }
    }
}
