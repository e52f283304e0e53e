use core::fmt;

/// A non-owning reference to a node in a [`List`].
///
/// Handles pair a slot index with the generation the slot had when the node
/// was created. Once the node is removed (or taken) the slot's generation
/// moves on, so a stale handle never resolves to a different node even if
/// the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: usize,
    generation: u64,
}

/// Equality and teardown behavior bound to a [`List`] at construction.
///
/// `same` backs [`List::find`]. `teardown` receives every payload the list
/// discards through [`List::remove`] or [`List::clear`]; it is not called for
/// payloads handed back to the caller by [`List::take`].
pub trait EntryPolicy<T> {
    /// Returns true if `a` and `b` denote the same logical entry.
    fn same(&self, a: &T, b: &T) -> bool;

    /// Releases a payload the list is discarding.
    fn teardown(&self, value: T) {
        drop(value);
    }
}

/// Policy that compares payloads with `PartialEq` and simply drops them.
#[derive(Debug, Default, Clone, Copy)]
pub struct PartialEqPolicy;

impl<T: PartialEq> EntryPolicy<T> for PartialEqPolicy {
    #[inline]
    fn same(&self, a: &T, b: &T) -> bool {
        a == b
    }
}

/// A node in the list arena.
struct Node<T> {
    /// `None` while the slot is on the free list.
    val: Option<T>,
    prev: Option<usize>,
    next: Option<usize>,
    generation: u64,
    /// False for nodes that are allocated but detached from the chain.
    linked: bool,
}

/// An arena-backed doubly linked list with stable handles.
///
/// The list owns every node. Callers hold [`Handle`]s, which stay valid
/// until the node is removed or taken, including while the node is detached
/// for an identity-preserving move. All positional operations are O(1);
/// only [`find`](List::find) scans.
///
/// By convention the head is the most recently inserted or touched node, so
/// [`tail`](List::tail) is the natural eviction victim.
///
/// # Examples
///
/// ```
/// use lruk_cache::list::List;
///
/// let mut list: List<u32> = List::new();
/// let a = list.insert(None, 10);
/// let b = list.insert(None, 20);
///
/// assert_eq!(list.head(), Some(b));
/// assert_eq!(list.tail(), Some(a));
///
/// list.move_to_front(a);
/// assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![10, 20]);
/// ```
pub struct List<T, P = PartialEqPolicy> {
    nodes: Vec<Node<T>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    policy: P,
}

impl<T, P: Default> List<T, P> {
    /// Creates an empty list with the policy's default value.
    pub fn new() -> Self {
        Self::with_policy(P::default())
    }
}

impl<T, P: Default> Default for List<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, P> List<T, P> {
    /// Creates an empty list bound to `policy`.
    pub fn with_policy(policy: P) -> Self {
        List {
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
            policy,
        }
    }

    /// Returns the number of linked nodes.
    ///
    /// Detached nodes are not counted.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no node is linked.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the most recently inserted or moved node.
    #[inline]
    pub fn head(&self) -> Option<Handle> {
        self.head.map(|index| self.handle_at(index))
    }

    /// Returns the least recently active node.
    #[inline]
    pub fn tail(&self) -> Option<Handle> {
        self.tail.map(|index| self.handle_at(index))
    }

    /// Returns true if `handle` refers to a live node, linked or detached.
    #[inline]
    pub fn contains(&self, handle: Handle) -> bool {
        self.resolve(handle).is_some()
    }

    /// Returns true if `handle` refers to a node currently in the chain.
    #[inline]
    pub fn is_linked(&self, handle: Handle) -> bool {
        self.resolve(handle)
            .map(|index| self.nodes[index].linked)
            .unwrap_or(false)
    }

    /// Returns the payload of a live node.
    #[inline]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        let index = self.resolve(handle)?;
        self.nodes[index].val.as_ref()
    }

    /// Returns the payload of a live node mutably.
    #[inline]
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let index = self.resolve(handle)?;
        self.nodes[index].val.as_mut()
    }

    /// Inserts `value` immediately after `after`, or at the head for `None`.
    ///
    /// A stale or detached `after` is treated like `None`.
    pub fn insert(&mut self, after: Option<Handle>, value: T) -> Handle {
        let after = after.and_then(|h| self.linked_index(h));
        let index = self.allocate(value);
        self.link_after(after, index);
        self.handle_at(index)
    }

    /// Unlinks a node but keeps it allocated so it can be reattached.
    ///
    /// Returns false if the handle is stale or the node is already detached.
    pub fn detach(&mut self, handle: Handle) -> bool {
        match self.linked_index(handle) {
            Some(index) => {
                self.unlink(index);
                true
            }
            None => false,
        }
    }

    /// Relinks a detached node after `after`, or at the head for `None`.
    ///
    /// Returns false if the handle is stale or the node is already linked.
    pub fn attach(&mut self, after: Option<Handle>, handle: Handle) -> bool {
        let index = match self.resolve(handle) {
            Some(index) if !self.nodes[index].linked => index,
            _ => return false,
        };
        let after = after.and_then(|h| self.linked_index(h));
        self.link_after(after, index);
        true
    }

    /// Moves a node to the head, keeping its identity.
    ///
    /// Detached nodes are reattached at the head. Returns false for a stale
    /// handle.
    pub fn move_to_front(&mut self, handle: Handle) -> bool {
        let index = match self.resolve(handle) {
            Some(index) => index,
            None => return false,
        };
        if self.head == Some(index) {
            return true;
        }
        if self.nodes[index].linked {
            self.unlink(index);
        }
        self.link_after(None, index);
        true
    }

    /// Unlinks a node, frees its slot and returns the payload without
    /// running the teardown hook.
    pub fn take(&mut self, handle: Handle) -> Option<T> {
        let index = self.resolve(handle)?;
        if self.nodes[index].linked {
            self.unlink(index);
        }
        self.release(index)
    }

    /// Returns an iterator over payloads from head to tail.
    pub fn iter(&self) -> Iter<'_, T, P> {
        Iter {
            list: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    fn handle_at(&self, index: usize) -> Handle {
        Handle {
            index,
            generation: self.nodes[index].generation,
        }
    }

    fn resolve(&self, handle: Handle) -> Option<usize> {
        let node = self.nodes.get(handle.index)?;
        (node.generation == handle.generation && node.val.is_some()).then_some(handle.index)
    }

    fn linked_index(&self, handle: Handle) -> Option<usize> {
        self.resolve(handle).filter(|&index| self.nodes[index].linked)
    }

    fn allocate(&mut self, value: T) -> usize {
        match self.free.pop() {
            Some(index) => {
                self.nodes[index].val = Some(value);
                index
            }
            None => {
                self.nodes.push(Node {
                    val: Some(value),
                    prev: None,
                    next: None,
                    generation: 0,
                    linked: false,
                });
                self.nodes.len() - 1
            }
        }
    }

    /// Frees an unlinked slot and bumps its generation.
    fn release(&mut self, index: usize) -> Option<T> {
        let node = &mut self.nodes[index];
        let value = node.val.take();
        node.generation = node.generation.wrapping_add(1);
        self.free.push(index);
        value
    }

    fn link_after(&mut self, after: Option<usize>, index: usize) {
        let next = match after {
            Some(prev) => self.nodes[prev].next,
            None => self.head,
        };

        {
            let node = &mut self.nodes[index];
            node.prev = after;
            node.next = next;
            node.linked = true;
        }

        match after {
            Some(prev) => self.nodes[prev].next = Some(index),
            None => self.head = Some(index),
        }
        match next {
            Some(next) => self.nodes[next].prev = Some(index),
            None => self.tail = Some(index),
        }
        self.len += 1;
    }

    fn unlink(&mut self, index: usize) {
        let (prev, next) = {
            let node = &mut self.nodes[index];
            let links = (node.prev, node.next);
            node.prev = None;
            node.next = None;
            node.linked = false;
            links
        };

        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.tail = prev,
        }
        self.len -= 1;
    }
}

impl<T, P: EntryPolicy<T>> List<T, P> {
    /// Removes a node and hands its payload to the policy's teardown hook.
    ///
    /// Removing a stale handle, or removing from an empty list, is a silent
    /// no-op that returns false. Detached nodes can be removed too.
    pub fn remove(&mut self, handle: Handle) -> bool {
        match self.take(handle) {
            Some(value) => {
                self.policy.teardown(value);
                true
            }
            None => false,
        }
    }

    /// Removes the tail node, returning the result of `inspect` on its
    /// payload before teardown.
    pub fn remove_last_with<R>(&mut self, inspect: impl FnOnce(&T) -> R) -> Option<R> {
        let tail = self.tail()?;
        let result = self.get(tail).map(inspect);
        self.remove(tail);
        result
    }

    /// Linear scan for the first node the policy considers the same as
    /// `value`.
    pub fn find(&self, value: &T) -> Option<Handle> {
        let mut cursor = self.head;
        while let Some(index) = cursor {
            let node = &self.nodes[index];
            if let Some(candidate) = node.val.as_ref() {
                if self.policy.same(candidate, value) {
                    return Some(self.handle_at(index));
                }
            }
            cursor = node.next;
        }
        None
    }

    /// Tears down every node, linked or detached.
    ///
    /// All outstanding handles become stale.
    pub fn clear(&mut self) {
        for index in 0..self.nodes.len() {
            if self.nodes[index].val.is_some() {
                let node = &mut self.nodes[index];
                node.prev = None;
                node.next = None;
                node.linked = false;
                if let Some(value) = self.release(index) {
                    self.policy.teardown(value);
                }
            }
        }
        self.head = None;
        self.tail = None;
        self.len = 0;
    }
}

/// Iterator over a [`List`] from head to tail.
pub struct Iter<'a, T, P> {
    list: &'a List<T, P>,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, T, P> Iterator for Iter<'a, T, P> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let node = &self.list.nodes[index];
        self.cursor = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        node.val.as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, P> fmt::Debug for Iter<'_, T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("remaining", &self.remaining)
            .finish()
    }
}

impl<T, P: fmt::Debug> fmt::Debug for List<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List")
            .field("length", &self.len)
            .field("slots", &self.nodes.len())
            .field("policy", &self.policy)
            .finish()
    }
}
