use std::sync::atomic::{AtomicUsize, Ordering};

use barge_control_plane::resources::ResourceKind;

use super::handle::CredentialedHandle;

/// An ordered set of interchangeable endpoint handles of one kind, selected
/// round-robin.
///
/// The cursor advances before reading, so the first selection on a pool of
/// two or more handles returns index 1 and index 0 is only reached after a
/// wrap. Consumers rely on that observable order; don't "fix" it.
pub struct EndpointPool<C: ?Sized> {
    kind: ResourceKind,
    handles: Vec<CredentialedHandle<C>>,
    cursor: AtomicUsize,
}

impl<C: ?Sized> EndpointPool<C> {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            handles: Vec::new(),
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Append a handle, preserving insertion order.
    pub fn add(&mut self, handle: CredentialedHandle<C>) {
        self.handles.push(handle);
    }

    /// The next handle in rotation, or `None` when the pool is empty.
    ///
    /// The cursor update is a single atomic step, so concurrent callers on
    /// the same pool generation each observe a distinct rotation slot.
    pub fn next(&self) -> Option<CredentialedHandle<C>> {
        if self.handles.is_empty() {
            return None;
        }

        let size = self.handles.len();
        let previous = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cursor| {
                Some((cursor + 1) % size)
            })
            .expect("cursor update never aborts");

        Some(self.handles[(previous + 1) % size].clone())
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }
}
