#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use mortar::{Error, Handler, Method, Session, SessionProvider};

/// Counts session acquisitions and releases.
#[derive(Clone, Default)]
pub struct Ledger {
    acquired: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl Ledger {
    /// `(acquired, released)`.
    pub fn counts(&self) -> (usize, usize) {
        (self.acquired.load(Ordering::SeqCst), self.released.load(Ordering::SeqCst))
    }
}

impl SessionProvider for Ledger {
    type Session = Db;

    fn acquire(&self) -> Result<Db, Error> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Db { released: Arc::clone(&self.released) })
    }
}

/// Session over a fixed table of items.
pub struct Db {
    released: Arc<AtomicUsize>,
}

impl Db {
    pub fn find_item(&self, id: u64) -> Option<&'static str> {
        match id {
            1 => Some("lamp"),
            2 => Some("desk"),
            _ => None,
        }
    }
}

impl Session for Db {
    fn close(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

pub type Events = Arc<Mutex<Vec<String>>>;

pub fn push(events: &Events, event: impl Into<String>) {
    events.lock().unwrap().push(event.into());
}

pub fn snapshot(events: &Events) -> Vec<String> {
    events.lock().unwrap().clone()
}

/// Middleware recording `"{name} in"` before and `"{name} out"` after the
/// rest of the chain.
pub fn recorder(events: Events, name: &'static str) -> impl Fn(Handler<Db>) -> Handler<Db> + Send + Sync + 'static {
    move |next: Handler<Db>| -> Handler<Db> {
        let events = Arc::clone(&events);
        Handler::new(move |ctx| {
            let next = next.clone();
            let events = Arc::clone(&events);
            Box::pin(async move {
                push(&events, format!("{name} in"));
                let result = next.call(ctx).await;
                push(&events, format!("{name} out"));
                result
            })
        })
    }
}

pub fn request(method: Method, path: &str) -> http::Request<Bytes> {
    http::Request::builder().method(method).uri(path).body(Bytes::new()).unwrap()
}
