use kube::ResourceExt;
use kube::api::DynamicObject;
use kube::runtime::watcher::Event;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{LabelSet, RegisteredFamily};

#[cfg(test)]
#[path = "./store.tests.rs"]
mod store_tests;

/// Keeps metrics generated for Kubernetes objects of one type observed in one scope.
pub struct MetricsStore {
    families: Arc<[RegisteredFamily]>,
    objects: HashMap<String, Vec<Vec<LabelSet>>>,
    relisted: Option<HashSet<String>>,
    ready: Arc<AtomicBool>,
}

impl MetricsStore {
    /// Creates new [`MetricsStore`] instance writing to the provided metric `families`.
    pub fn new(families: Arc<[RegisteredFamily]>) -> Self {
        Self {
            families,
            objects: HashMap::new(),
            relisted: None,
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Applies watcher event to the store.
    pub fn apply_event(&mut self, event: Event<DynamicObject>) {
        match event {
            Event::Init => self.relisted = Some(HashSet::new()),
            Event::InitApply(object) => {
                let key = self.apply(&object);
                if let Some(relisted) = self.relisted.as_mut() {
                    relisted.insert(key);
                }
            },
            Event::InitDone => {
                if let Some(relisted) = self.relisted.take() {
                    let stale = self
                        .objects
                        .keys()
                        .filter(|key| !relisted.contains(*key))
                        .cloned()
                        .collect::<Vec<_>>();
                    for key in stale {
                        self.remove(&key);
                    }
                }

                self.ready.store(true, Ordering::Relaxed);
            },
            Event::Apply(object) => {
                self.apply(&object);
            },
            Event::Delete(object) => self.remove(&object_key(&object)),
        }
    }

    /// Removes metrics of all objects kept in the store.
    pub fn clear(&mut self) {
        let keys = self.objects.keys().cloned().collect::<Vec<_>>();
        for key in keys {
            self.remove(&key);
        }
    }

    /// Returns number of objects kept in the store.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if the store keeps no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Returns `true` if the store received the initial list of objects.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    /// Returns shared readiness flag of the store.
    pub fn readiness(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.ready)
    }

    fn apply(&mut self, object: &DynamicObject) -> String {
        let key = object_key(object);
        let previous = self.objects.remove(&key).unwrap_or_default();

        let mut current = Vec::with_capacity(self.families.len());
        for (index, family) in self.families.iter().enumerate() {
            let generated = family.generate(object);
            let previous = previous.get(index).map(Vec::as_slice).unwrap_or_default();
            for labels in previous.iter().filter(|l| !generated.iter().any(|(g, _)| g == *l)) {
                family.release(labels);
            }

            for (labels, value) in &generated {
                if previous.contains(labels) {
                    family.set(labels, *value);
                } else {
                    family.acquire(labels, *value);
                }
            }

            current.push(generated.into_iter().map(|(labels, _)| labels).collect());
        }

        self.objects.insert(key.clone(), current);
        key
    }

    fn remove(&mut self, key: &str) {
        if let Some(label_sets) = self.objects.remove(key) {
            for (family, label_sets) in self.families.iter().zip(label_sets) {
                for labels in &label_sets {
                    family.release(labels);
                }
            }
        }
    }
}

fn object_key(object: &DynamicObject) -> String {
    format!("{}/{}", object.namespace().unwrap_or_default(), object.name_any())
}
