use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, Instant};
use tracing::debug;

/// A single-use delivery slot for a blocked pop. The store hands the slot one
/// `(key, value)` pair at most once; a slot whose receiver is gone is
/// detected at delivery time and skipped without losing the value.
pub type Waiter = mpsc::Sender<(String, Bytes)>;

/// The Store holds all key spaces: plain string values, hashes, lists, the
/// per-key expiry deadlines for string keys, and the queues of pending
/// blocked pops. It is designed to be shared across connection tasks and
/// cloned cheaply using reference counting.
///
/// Each namespace sits behind its own reader-writer lock, so reads of
/// different keys never block each other while writes stay exclusive. The
/// waiter registry shares the list namespace's lock: a push can therefore
/// never miss a waiter that registered concurrently.
#[derive(Clone)]
pub struct Store {
    inner: Arc<InnerStore>,
}

struct InnerStore {
    strings: RwLock<Strings>,
    hashes: RwLock<HashMap<String, HashMap<String, Bytes>>>,
    lists: RwLock<Lists>,
}

/// String values and their expiry deadlines form one exclusion domain, since
/// the lazy-expiry path in `get` reads both together.
#[derive(Default)]
struct Strings {
    data: HashMap<String, Bytes>,
    expiries: HashMap<String, Instant>,
}

#[derive(Default)]
struct Lists {
    entries: HashMap<String, VecDeque<Bytes>>,
    waiters: HashMap<String, VecDeque<Waiter>>,
}

impl Store {
    pub fn new() -> Store {
        Store {
            inner: Arc::new(InnerStore {
                strings: RwLock::new(Strings::default()),
                hashes: RwLock::new(HashMap::new()),
                lists: RwLock::new(Lists::default()),
            }),
        }
    }

    /// Spawns the background sweep that deletes expired string keys on a
    /// fixed interval. The lazy check in `get` keeps reads correct even if
    /// the interval is coarse.
    pub fn start_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let store = self.clone();

        tokio::spawn(async move {
            let mut ticker = interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = store.remove_expired_keys();
                if removed > 0 {
                    debug!("expiry sweep removed {} keys", removed);
                }
            }
        })
    }

    /// Unconditionally overwrites the string value of `key`. A deadline
    /// previously attached by `expire` stays pinned to the key.
    pub fn set(&self, key: String, value: Bytes) {
        let mut strings = self.inner.strings.write().unwrap();
        strings.data.insert(key, value);
    }

    /// Returns the string value of `key`, or `None` if the key was never set
    /// or its expiry deadline has passed. A passed deadline deletes the key
    /// on the spot, making it indistinguishable from one that was never set.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        {
            let strings = self.inner.strings.read().unwrap();
            match strings.expiries.get(key) {
                Some(deadline) if *deadline <= Instant::now() => {
                    // Expired: fall through to delete under the write lock.
                }
                _ => return strings.data.get(key).cloned(),
            }
        }

        let mut strings = self.inner.strings.write().unwrap();
        // Re-check the deadline: the key may have been refreshed between
        // dropping the read lock and acquiring the write lock.
        match strings.expiries.get(key) {
            Some(deadline) if *deadline <= Instant::now() => {
                strings.data.remove(key);
                strings.expiries.remove(key);
                None
            }
            _ => strings.data.get(key).cloned(),
        }
    }

    /// Removes the string value of `key`, reporting whether it existed.
    pub fn del(&self, key: &str) -> bool {
        let mut strings = self.inner.strings.write().unwrap();
        strings.data.remove(key).is_some()
    }

    /// Checks the string namespace only.
    pub fn exists(&self, key: &str) -> bool {
        let strings = self.inner.strings.read().unwrap();
        strings.data.contains_key(key)
    }

    /// Attaches an expiry deadline of now + `ttl` to an existing string key,
    /// overwriting any previous deadline. Returns false if the key does not
    /// exist.
    pub fn expire(&self, key: &str, ttl: Duration) -> bool {
        let mut strings = self.inner.strings.write().unwrap();

        if !strings.data.contains_key(key) {
            return false;
        }
        strings.expiries.insert(key.to_string(), Instant::now() + ttl);
        true
    }

    /// Deletes every string key whose deadline is at or before now. Returns
    /// the number of keys removed. This is the eager half of expiration; the
    /// lazy half lives in `get`.
    pub fn remove_expired_keys(&self) -> usize {
        let mut strings = self.inner.strings.write().unwrap();
        let now = Instant::now();

        let expired: Vec<String> = strings
            .expiries
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            strings.data.remove(key);
            strings.expiries.remove(key);
            debug!("removed expired key: {}", key);
        }

        expired.len()
    }

    /// Upserts every given field into the hash at `key`, creating the hash if
    /// absent. Last write wins per field.
    pub fn hset(&self, key: String, fields: Vec<(String, Bytes)>) {
        let mut hashes = self.inner.hashes.write().unwrap();
        let hash = hashes.entry(key).or_default();
        for (field, value) in fields {
            hash.insert(field, value);
        }
    }

    pub fn hget(&self, key: &str, field: &str) -> Option<Bytes> {
        let hashes = self.inner.hashes.read().unwrap();
        hashes.get(key).and_then(|hash| hash.get(field).cloned())
    }

    /// Returns a copy of the whole hash at `key`, or `None` if the key holds
    /// no fields. Mutating the returned map does not affect the store.
    pub fn hgetall(&self, key: &str) -> Option<HashMap<String, Bytes>> {
        let hashes = self.inner.hashes.read().unwrap();
        hashes.get(key).filter(|hash| !hash.is_empty()).cloned()
    }

    /// Prepends `values` to the list at `key` so that the last value given
    /// ends up frontmost (repeated single-value pushes behave as a stack),
    /// then hands elements to pending waiters in FIFO registration order.
    /// Returns the length of the list after any deliveries.
    pub fn lpush(&self, key: &str, values: Vec<Bytes>) -> usize {
        let mut guard = self.inner.lists.write().unwrap();
        let Lists { entries, waiters } = &mut *guard;

        let list = entries.entry(key.to_string()).or_default();
        for value in values {
            list.push_front(value);
        }

        // Serve blocked pops before anyone else can observe the new
        // elements. A slot whose receiver has been dropped (the waiter timed
        // out) or is already full (the slot was consumed through another
        // key) fails `try_send`; the element goes back to the front and the
        // dead slot is discarded.
        if let Some(queue) = waiters.get_mut(key) {
            while let Some(value) = list.pop_front() {
                match queue.pop_front() {
                    Some(waiter) => {
                        if let Err(err) = waiter.try_send((key.to_string(), value)) {
                            let (_, value) = err.into_inner();
                            list.push_front(value);
                        }
                    }
                    None => {
                        list.push_front(value);
                        break;
                    }
                }
            }
            if queue.is_empty() {
                waiters.remove(key);
            }
        }

        let length = list.len();
        if length == 0 {
            entries.remove(key);
        }
        length
    }

    /// Appends `values` to the tail of the list at `key` in the order given.
    /// Unlike `lpush`, pending waiters are not served.
    pub fn rpush(&self, key: &str, values: Vec<Bytes>) -> usize {
        let mut guard = self.inner.lists.write().unwrap();
        let list = guard.entries.entry(key.to_string()).or_default();
        list.extend(values);
        list.len()
    }

    /// Removes and returns the front element of the list at `key`.
    pub fn lpop(&self, key: &str) -> Option<Bytes> {
        let mut guard = self.inner.lists.write().unwrap();
        let list = guard.entries.get_mut(key)?;
        let value = list.pop_front();
        if list.is_empty() {
            guard.entries.remove(key);
        }
        value
    }

    /// Removes and returns the tail element of the list at `key`.
    pub fn rpop(&self, key: &str) -> Option<Bytes> {
        let mut guard = self.inner.lists.write().unwrap();
        let list = guard.entries.get_mut(key)?;
        let value = list.pop_back();
        if list.is_empty() {
            guard.entries.remove(key);
        }
        value
    }

    /// Appends a delivery slot to the waiter queue of `key`. Waiters on the
    /// same key are served strictly in registration order.
    pub fn register_waiter(&self, key: &str, waiter: Waiter) {
        let mut guard = self.inner.lists.write().unwrap();
        guard
            .waiters
            .entry(key.to_string())
            .or_default()
            .push_back(waiter);
    }

    /// The entry point of a blocking pop: tries an immediate pop across
    /// `keys` in the order given, and if none has data, registers `waiter`
    /// under every key before releasing the list lock. Holding the lock
    /// across both steps guarantees a concurrent push cannot slip between
    /// the check and the registration.
    pub fn lpop_any_or_register(&self, keys: &[String], waiter: Waiter) -> Option<(String, Bytes)> {
        let mut guard = self.inner.lists.write().unwrap();

        for key in keys {
            if let Some(list) = guard.entries.get_mut(key) {
                if let Some(value) = list.pop_front() {
                    if list.is_empty() {
                        guard.entries.remove(key);
                    }
                    return Some((key.clone(), value));
                }
            }
        }

        for key in keys {
            guard
                .waiters
                .entry(key.clone())
                .or_default()
                .push_back(waiter.clone());
        }

        None
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time;

    #[test]
    fn set_get_del() {
        let store = Store::new();

        store.set("key1".to_string(), Bytes::from("value1"));
        assert_eq!(store.get("key1"), Some(Bytes::from("value1")));
        assert!(store.exists("key1"));

        store.set("key1".to_string(), Bytes::from("value2"));
        assert_eq!(store.get("key1"), Some(Bytes::from("value2")));

        assert!(store.del("key1"));
        assert!(!store.del("key1"));
        assert_eq!(store.get("key1"), None);
        assert!(!store.exists("key1"));
    }

    #[tokio::test]
    async fn lazy_expiry() {
        time::pause();

        let store = Store::new();
        store.set("key1".to_string(), Bytes::from("value1"));

        assert!(store.expire("key1", Duration::from_secs(10)));
        assert_eq!(store.get("key1"), Some(Bytes::from("value1")));

        time::advance(Duration::from_secs(11)).await;

        // No sweep has run; the read itself deletes the expired key.
        assert_eq!(store.get("key1"), None);
        assert!(!store.exists("key1"));
        assert_eq!(store.get("key1"), None);
    }

    #[tokio::test]
    async fn eager_expiry_sweep() {
        time::pause();

        let store = Store::new();
        store.set("key1".to_string(), Bytes::from("value1"));
        store.set("key2".to_string(), Bytes::from("value2"));
        store.expire("key1", Duration::from_secs(5));

        assert_eq!(store.remove_expired_keys(), 0);

        time::advance(Duration::from_secs(6)).await;

        assert_eq!(store.remove_expired_keys(), 1);
        assert!(!store.exists("key1"));
        assert!(store.exists("key2"));
    }

    #[test]
    fn expire_missing_key() {
        let store = Store::new();
        assert!(!store.expire("nope", Duration::from_secs(10)));
        assert_eq!(store.remove_expired_keys(), 0);
    }

    #[tokio::test]
    async fn set_retains_prior_expiry() {
        time::pause();

        let store = Store::new();
        store.set("key1".to_string(), Bytes::from("old"));
        store.expire("key1", Duration::from_secs(5));

        // Overwriting does not clear the deadline.
        store.set("key1".to_string(), Bytes::from("new"));
        time::advance(Duration::from_secs(6)).await;

        assert_eq!(store.get("key1"), None);
    }

    #[test]
    fn hash_operations() {
        let store = Store::new();

        assert_eq!(store.hgetall("h"), None);

        store.hset(
            "h".to_string(),
            vec![
                ("f1".to_string(), Bytes::from("v1")),
                ("f2".to_string(), Bytes::from("v2")),
            ],
        );
        store.hset("h".to_string(), vec![("f2".to_string(), Bytes::from("v3"))]);

        assert_eq!(store.hget("h", "f1"), Some(Bytes::from("v1")));
        assert_eq!(store.hget("h", "f2"), Some(Bytes::from("v3")));
        assert_eq!(store.hget("h", "f9"), None);

        let mut all = store.hgetall("h").unwrap();
        assert_eq!(all.len(), 2);

        // The returned map is a copy; mutating it must not affect the store.
        all.insert("f9".to_string(), Bytes::from("oops"));
        assert_eq!(store.hget("h", "f9"), None);
    }

    #[test]
    fn lpush_batch_order() {
        let store = Store::new();

        let length = store.lpush(
            "l",
            vec![Bytes::from("a"), Bytes::from("b"), Bytes::from("c")],
        );

        assert_eq!(length, 3);
        assert_eq!(store.lpop("l"), Some(Bytes::from("c")));
        assert_eq!(store.lpop("l"), Some(Bytes::from("b")));
        assert_eq!(store.lpop("l"), Some(Bytes::from("a")));
        assert_eq!(store.lpop("l"), None);
    }

    #[test]
    fn rpush_then_pop_both_ends() {
        let store = Store::new();

        assert_eq!(store.rpush("l", vec![Bytes::from("a"), Bytes::from("b")]), 2);
        assert_eq!(store.lpop("l"), Some(Bytes::from("a")));
        assert_eq!(store.rpop("l"), Some(Bytes::from("b")));
        assert_eq!(store.rpop("l"), None);
    }

    #[tokio::test]
    async fn lpush_delivers_to_waiter() {
        let store = Store::new();
        let (tx, mut rx) = mpsc::channel(1);

        store.register_waiter("l", tx);

        let length = store.lpush("l", vec![Bytes::from("x")]);

        // The element went to the waiter, not the list.
        assert_eq!(length, 0);
        assert_eq!(rx.recv().await, Some(("l".to_string(), Bytes::from("x"))));
        assert_eq!(store.lpop("l"), None);
    }

    #[tokio::test]
    async fn lpush_serves_waiters_fifo() {
        let store = Store::new();
        let (tx1, mut rx1) = mpsc::channel(1);
        let (tx2, mut rx2) = mpsc::channel(1);

        store.register_waiter("l", tx1);
        store.register_waiter("l", tx2);

        store.lpush("l", vec![Bytes::from("first")]);
        store.lpush("l", vec![Bytes::from("second")]);

        assert_eq!(
            rx1.recv().await,
            Some(("l".to_string(), Bytes::from("first")))
        );
        assert_eq!(
            rx2.recv().await,
            Some(("l".to_string(), Bytes::from("second")))
        );
    }

    #[tokio::test]
    async fn lpush_skips_abandoned_waiter() {
        let store = Store::new();
        let (tx, rx) = mpsc::channel(1);

        store.register_waiter("l", tx);
        // The waiter gave up (timed out) before anything was pushed.
        drop(rx);

        let length = store.lpush("l", vec![Bytes::from("x")]);

        // The element stays in the list instead of vanishing into the dead
        // slot.
        assert_eq!(length, 1);
        assert_eq!(store.lpop("l"), Some(Bytes::from("x")));
    }

    #[tokio::test]
    async fn lpop_any_or_register_prefers_earlier_keys() {
        let store = Store::new();
        store.rpush("b", vec![Bytes::from("vb")]);

        let (tx, _rx) = mpsc::channel(1);
        let keys = vec!["a".to_string(), "b".to_string()];

        assert_eq!(
            store.lpop_any_or_register(&keys, tx),
            Some(("b".to_string(), Bytes::from("vb")))
        );
    }

    #[tokio::test]
    async fn lpop_any_or_register_registers_under_every_key() {
        let store = Store::new();
        let (tx, mut rx) = mpsc::channel(1);
        let keys = vec!["a".to_string(), "b".to_string()];

        assert_eq!(store.lpop_any_or_register(&keys, tx), None);

        store.lpush("b", vec![Bytes::from("vb")]);

        assert_eq!(rx.recv().await, Some(("b".to_string(), Bytes::from("vb"))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_push_pop_loses_nothing() {
        const PUSHERS: usize = 4;
        const POPPERS: usize = 4;
        const PER_PUSHER: usize = 250;
        const TOTAL: usize = PUSHERS * PER_PUSHER;

        let store = Store::new();
        let mut pushers = Vec::new();
        let mut poppers = Vec::new();

        for p in 0..PUSHERS {
            let store = store.clone();
            pushers.push(tokio::spawn(async move {
                for i in 0..PER_PUSHER {
                    store.lpush("l", vec![Bytes::from(format!("{}-{}", p, i))]);
                    tokio::task::yield_now().await;
                }
            }));
        }

        // Poppers race the pushers; they keep draining until the list has
        // been observed empty after every pusher finished.
        let pushed_done = Arc::new(std::sync::atomic::AtomicBool::new(false));
        for _ in 0..POPPERS {
            let store = store.clone();
            let pushed_done = pushed_done.clone();
            poppers.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                loop {
                    match store.lpop("l") {
                        Some(value) => seen.push(value),
                        None if pushed_done.load(std::sync::atomic::Ordering::Acquire) => break,
                        None => tokio::task::yield_now().await,
                    }
                }
                seen
            }));
        }

        for handle in pushers {
            handle.await.unwrap();
        }
        pushed_done.store(true, std::sync::atomic::Ordering::Release);

        let mut popped = std::collections::HashSet::new();
        for handle in poppers {
            for value in handle.await.unwrap() {
                assert!(popped.insert(value), "duplicate element observed");
            }
        }

        assert_eq!(popped.len(), TOTAL);
    }
}
