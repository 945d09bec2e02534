use core::cell::RefCell;
use std::rc::Rc;

use hashbrown::{HashMap, HashSet};

use crate::value::{Codable, Handle};

// -----------------------------------------------------------------------------
// ObjectIdentity

/// Identity key for one object instance: the address of its shared cell.
///
/// Identity, never structural equality: two distinct instances that
/// compare equal are different entries.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct ObjectIdentity(*const ());

impl ObjectIdentity {
    pub(crate) fn of(cell: &Rc<RefCell<dyn Codable>>) -> Self {
        Self(Rc::as_ptr(cell) as *const ())
    }
}

// -----------------------------------------------------------------------------
// ReferenceTracker

/// Marker returned by [`ReferenceTracker::begin_visit`] when an instance
/// is re-entered while its own expansion is still in progress.
#[derive(Debug)]
pub(crate) struct CycleDetected;

/// Session-scoped identity registry.
///
/// Assigns wire ids to instances, detects in-progress cycles, and (for
/// decoding) resolves ids back to instances. A session spans exactly one
/// top-level encode or decode call; the owning codec calls
/// [`reset`](ReferenceTracker::reset) at the start of every call and
/// never shares a tracker between calls.
pub(crate) struct ReferenceTracker {
    /// Instance identity to assigned wire id.
    ids: HashMap<ObjectIdentity, String>,
    /// Wire id to the instance registered under it (decoding).
    instances: HashMap<String, Handle>,
    /// Instances whose expansion has begun but not yet completed.
    in_progress: HashSet<ObjectIdentity>,
    next_id: u64,
}

impl ReferenceTracker {
    pub(crate) fn new() -> Self {
        Self {
            ids: HashMap::new(),
            instances: HashMap::new(),
            in_progress: HashSet::new(),
            next_id: 0,
        }
    }

    /// Clears all session state. Called once per top-level call, never
    /// mid-traversal.
    pub(crate) fn reset(&mut self) {
        self.ids.clear();
        self.instances.clear();
        self.in_progress.clear();
        self.next_id = 0;
    }

    /// Whether the instance already has an id in this session.
    pub(crate) fn has_id(&self, identity: ObjectIdentity) -> bool {
        self.ids.contains_key(&identity)
    }

    /// Returns the instance's id, allocating and recording a new one on
    /// first encounter.
    pub(crate) fn id_for(&mut self, identity: ObjectIdentity) -> String {
        if let Some(id) = self.ids.get(&identity) {
            return id.clone();
        }
        self.next_id += 1;
        let id = format!("ref_{}", self.next_id);
        self.ids.insert(identity, id.clone());
        id
    }

    /// Marks the instance as in progress, or reports a cycle if it
    /// already is.
    pub(crate) fn begin_visit(&mut self, identity: ObjectIdentity) -> Result<(), CycleDetected> {
        if self.in_progress.insert(identity) {
            Ok(())
        } else {
            Err(CycleDetected)
        }
    }

    /// Removes the instance from the in-progress set.
    ///
    /// Callers must run this on every exit path, error paths included, so
    /// a failure deeper in the graph cannot leave an unrelated later
    /// encounter wrongly flagged as a cycle.
    pub(crate) fn end_visit(&mut self, identity: ObjectIdentity) {
        self.in_progress.remove(&identity);
    }

    /// Binds a caller-chosen id to an instance (decoding defines the
    /// canonical instance for an id here).
    pub(crate) fn register(&mut self, id: String, handle: Handle) {
        self.instances.insert(id, handle);
    }

    /// Resolves an id to its registered instance, if any.
    pub(crate) fn resolve(&self, id: &str) -> Option<Handle> {
        self.instances.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValueError;
    use crate::info::{DescriptorCell, TypeDescriptor};
    use crate::value::Value;
    use core::any::TypeId;

    struct Probe {
        tag: i32,
    }

    impl Codable for Probe {
        fn type_name(&self) -> &'static str {
            "TrackProbe"
        }

        fn ty_id(&self) -> TypeId {
            TypeId::of::<Probe>()
        }

        fn descriptor(&self) -> &'static TypeDescriptor {
            static CELL: DescriptorCell = DescriptorCell::new();
            CELL.get_or_init(|| TypeDescriptor::new::<Probe>("TrackProbe", Vec::new()))
        }

        fn get_field(&self, _name: &str) -> Option<Value> {
            None
        }

        fn set_field(&mut self, name: &str, _value: Value) -> Result<(), ValueError> {
            Err(ValueError::NoSuchField { name: name.into() })
        }
    }

    #[test]
    fn ids_are_monotonic_and_stable() {
        let mut tracker = ReferenceTracker::new();
        let a = Handle::new(Probe { tag: 1 });
        let b = Handle::new(Probe { tag: 1 });

        assert!(!tracker.has_id(a.identity()));
        assert_eq!(tracker.id_for(a.identity()), "ref_1");
        // Equal content, distinct instance, distinct id.
        assert_eq!(tracker.id_for(b.identity()), "ref_2");
        // Repeat lookups return the recorded id.
        assert_eq!(tracker.id_for(a.identity()), "ref_1");
        assert!(tracker.has_id(b.identity()));
    }

    #[test]
    fn begin_visit_flags_reentry() {
        let mut tracker = ReferenceTracker::new();
        let a = Handle::new(Probe { tag: 1 });

        tracker.begin_visit(a.identity()).unwrap();
        assert!(tracker.begin_visit(a.identity()).is_err());

        tracker.end_visit(a.identity());
        // A completed visit can begin again.
        tracker.begin_visit(a.identity()).unwrap();
    }

    #[test]
    fn register_and_resolve() {
        let mut tracker = ReferenceTracker::new();
        let a = Handle::new(Probe { tag: 1 });

        assert!(tracker.resolve("ref_1").is_none());
        tracker.register("ref_1".into(), a.clone());
        let resolved = tracker.resolve("ref_1").unwrap();
        assert!(Handle::same_instance(&a, &resolved));
    }

    #[test]
    fn reset_clears_everything() {
        let mut tracker = ReferenceTracker::new();
        let a = Handle::new(Probe { tag: 1 });

        tracker.id_for(a.identity());
        tracker.begin_visit(a.identity()).unwrap();
        tracker.register("ref_1".into(), a.clone());

        tracker.reset();

        assert!(!tracker.has_id(a.identity()));
        assert!(tracker.resolve("ref_1").is_none());
        // The counter restarts with the session.
        assert_eq!(tracker.id_for(a.identity()), "ref_1");
        tracker.begin_visit(a.identity()).unwrap();
    }
}
