//! Coalescing of concurrent identical async operations.
//!
//! A [`Coalescer`] keeps one in-flight slot per key. The first caller for a key registers a
//! slot and runs its operation; callers arriving while the slot is pending await the same
//! outcome instead of starting their own. The slot is removed as soon as the operation
//! resolves, so results are never cached beyond the in-flight window. Session refresh uses
//! a unit key (single-flight) and deduplicated reads use the normalized request key.

// self
use crate::_prelude::*;

type Registry<K, V> = Arc<Mutex<HashMap<K, Slot<V>>>>;

struct Slot<V> {
	cell: Arc<AsyncOnceCell<V>>,
	// Callers currently holding the cell.
	holders: usize,
}

/// Outcome of [`Coalescer::run`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Coalesced<V> {
	/// Value produced by whichever caller ran the operation.
	pub value: V,
	/// `true` if this caller ran the operation, `false` if it joined another caller's run.
	pub leader: bool,
}
impl<V> Coalesced<V> {
	/// Discards the leadership flag.
	pub fn into_inner(self) -> V {
		self.value
	}
}

/// Registry of in-flight operations keyed by `K`, sharing outcomes of type `V`.
///
/// Clones share the same registry. Cancellation is tolerated: if the caller running an
/// operation is dropped, the next waiter runs its own operation in the same slot, and a slot
/// nobody waits on any more is removed.
pub struct Coalescer<K, V> {
	inflight: Registry<K, V>,
}
impl<K, V> Coalescer<K, V>
where
	K: Clone + Eq + Hash,
	V: Clone,
{
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self { inflight: Default::default() }
	}

	/// Runs `operation` for `key`, or joins the run already in flight for it.
	///
	/// The slot is released before the running caller returns, so a call that starts after
	/// this one resolved always runs a fresh operation.
	pub async fn run<F, Fut>(&self, key: K, operation: F) -> Coalesced<V>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = V>,
	{
		let guard = SlotGuard { inflight: &self.inflight, key: &key, cell: self.slot(&key) };
		let mut leader = false;
		let value = guard
			.cell
			.get_or_init(|| {
				leader = true;

				operation()
			})
			.await
			.clone();

		drop(guard);

		Coalesced { value, leader }
	}

	/// Returns the number of keys currently in flight.
	pub fn in_flight(&self) -> usize {
		self.inflight.lock().len()
	}

	/// Returns `true` if an operation for `key` is in flight.
	pub fn is_in_flight(&self, key: &K) -> bool {
		self.inflight.lock().contains_key(key)
	}

	fn slot(&self, key: &K) -> Arc<AsyncOnceCell<V>> {
		let mut inflight = self.inflight.lock();
		let slot = inflight
			.entry(key.clone())
			.or_insert_with(|| Slot { cell: Arc::new(AsyncOnceCell::new()), holders: 0 });

		slot.holders += 1;

		slot.cell.clone()
	}
}

/// Releases a caller's hold on a slot, whether its call resolved or was dropped mid-flight.
struct SlotGuard<'a, K, V>
where
	K: Eq + Hash,
{
	inflight: &'a Mutex<HashMap<K, Slot<V>>>,
	key: &'a K,
	cell: Arc<AsyncOnceCell<V>>,
}
impl<K, V> Drop for SlotGuard<'_, K, V>
where
	K: Eq + Hash,
{
	fn drop(&mut self) {
		let mut inflight = self.inflight.lock();

		// Only touch our own slot; a newer run may already own the key.
		let Some(slot) =
			inflight.get_mut(self.key).filter(|slot| Arc::ptr_eq(&slot.cell, &self.cell))
		else {
			return;
		};

		slot.holders -= 1;

		if slot.holders == 0 || self.cell.is_initialized() {
			inflight.remove(self.key);
		}
	}
}

impl<K, V> Clone for Coalescer<K, V> {
	fn clone(&self) -> Self {
		Self { inflight: self.inflight.clone() }
	}
}
impl<K, V> Default for Coalescer<K, V>
where
	K: Clone + Eq + Hash,
	V: Clone,
{
	fn default() -> Self {
		Self::new()
	}
}
impl<K, V> Debug for Coalescer<K, V> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Coalescer").field("in_flight", &self.inflight.lock().len()).finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{
		sync::atomic::{AtomicUsize, Ordering},
		time::Duration as StdDuration,
	};
	// crates.io
	use tokio::sync::Notify;
	// self
	use super::*;

	#[tokio::test]
	async fn concurrent_callers_share_one_run() {
		let coalescer = Coalescer::<&str, u32>::new();
		let (runs, gate) = (&AtomicUsize::new(0), &Notify::new());
		let op = move || async move {
			runs.fetch_add(1, Ordering::SeqCst);
			gate.notified().await;

			7
		};
		let first = coalescer.run("tasks", op);
		let second = coalescer.run("tasks", op);
		let release = async {
			tokio::task::yield_now().await;

			assert!(coalescer.is_in_flight(&"tasks"));

			gate.notify_one();
		};
		let (first, second, ()) = tokio::join!(first, second, release);

		assert_eq!(runs.load(Ordering::SeqCst), 1);
		assert_eq!(first.value, 7);
		assert_eq!(second.value, 7);
		assert!(first.leader ^ second.leader);
		assert_eq!(coalescer.in_flight(), 0);
	}

	#[tokio::test]
	async fn resolved_slot_is_not_reused() {
		let coalescer = Coalescer::<u8, usize>::new();
		let runs = &AtomicUsize::new(0);
		let op = move || async move { runs.fetch_add(1, Ordering::SeqCst) + 1 };
		let first = coalescer.run(1, op).await;
		let second = coalescer.run(1, op).await;

		assert!(first.leader && second.leader);
		assert_eq!((first.value, second.value), (1, 2));
		assert_eq!(coalescer.in_flight(), 0);
	}

	#[tokio::test]
	async fn distinct_keys_run_independently() {
		let coalescer = Coalescer::<u8, u8>::new();
		let (a, b) =
			tokio::join!(coalescer.run(1, || async { 10 }), coalescer.run(2, || async { 20 }));

		assert_eq!((a.into_inner(), b.into_inner()), (10, 20));
	}

	#[tokio::test]
	async fn dropped_leader_releases_its_slot() {
		let coalescer = Coalescer::<u8, u8>::new();
		let gate = &Notify::new();

		for key in 0..5 {
			let run = coalescer.run(key, move || async move {
				gate.notified().await;

				1
			});

			assert!(tokio::time::timeout(StdDuration::from_millis(10), run).await.is_err());
		}

		assert_eq!(coalescer.in_flight(), 0);
	}

	#[tokio::test]
	async fn waiter_takes_over_from_a_dropped_leader() {
		let coalescer = Coalescer::<&str, u8>::new();
		let gate = &Notify::new();
		let stalled = move || async move {
			gate.notified().await;

			1
		};
		let leader = coalescer.run("tasks", stalled);
		let waiter = coalescer.run("tasks", || async { 2 });
		let (timed_out, joined) = tokio::join!(
			tokio::time::timeout(StdDuration::from_millis(10), leader),
			async {
				tokio::task::yield_now().await;

				waiter.await
			},
		);

		assert!(timed_out.is_err());
		assert_eq!(joined.value, 2);
		assert!(joined.leader);
		assert_eq!(coalescer.in_flight(), 0);
	}

	#[tokio::test]
	async fn failures_are_shared_then_released() {
		let coalescer = Coalescer::<(), Result<u8, String>>::new();
		let gate = &Notify::new();
		let op = move || async move {
			gate.notified().await;

			Err::<u8, _>("boom".to_string())
		};
		let (first, second, ()) =
			tokio::join!(coalescer.run((), op), coalescer.run((), op), async {
				tokio::task::yield_now().await;
				gate.notify_one();
			});

		assert_eq!(first.value, Err("boom".into()));
		assert_eq!(second.value, Err("boom".into()));
		assert_eq!(coalescer.in_flight(), 0);
	}
}
