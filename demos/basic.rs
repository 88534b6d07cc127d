//! Minimal mortar example: an in-memory item store behind JSON endpoints.
//!
//! Run with:
//!   MORTAR_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:3000/items/1
//!   curl -i -X POST http://localhost:3000/items -d '{"name":"desk"}'
//!   curl -i -X POST http://localhost:3000/items -d '{"name":""}'
//!   curl -i -X DELETE http://localhost:3000/items/1
//!   curl -i http://localhost:3000/healthz

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use mortar::{
    App, BoxFuture, Config, Context, Error, Invalid, Method, Server, Session, SessionProvider,
    StatusCode, health, middleware,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Serialize)]
struct Item {
    id: u64,
    name: String,
}

#[derive(Deserialize)]
struct NewItem {
    name: String,
}

type Table = Arc<RwLock<BTreeMap<u64, Item>>>;

/// Hands every request a handle onto the shared table.
#[derive(Clone, Default)]
struct Store {
    items: Table,
}

impl SessionProvider for Store {
    type Session = StoreSession;

    fn acquire(&self) -> Result<StoreSession, Error> {
        Ok(StoreSession { items: Arc::clone(&self.items) })
    }
}

struct StoreSession {
    items: Table,
}

impl StoreSession {
    fn get(&self, id: u64) -> Option<Item> {
        self.items.read().unwrap_or_else(PoisonError::into_inner).get(&id).cloned()
    }

    fn list(&self) -> Vec<Item> {
        self.items.read().unwrap_or_else(PoisonError::into_inner).values().cloned().collect()
    }

    fn insert(&self, name: String) -> Item {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let id = items.keys().next_back().map_or(1, |last| last + 1);
        let item = Item { id, name };
        items.insert(id, item.clone());
        item
    }

    fn remove(&self, id: u64) -> Option<Item> {
        self.items.write().unwrap_or_else(PoisonError::into_inner).remove(&id)
    }
}

impl Session for StoreSession {
    fn close(&mut self) {
        debug!("store session closed");
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::default().with_env("MORTAR")?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log))
        .init();

    let store = Store::default();
    store.acquire()?.insert("lamp".to_owned());

    let mut app = App::new(store);
    app.with(middleware::trace());
    app.handle(Method::GET, "/items", list_items)?
        .handle(Method::GET, "/items/:id", get_item)?
        .handle(Method::POST, "/items", create_item)?
        .handle(Method::DELETE, "/items/:id", delete_item)?
        .handle(Method::GET, "/healthz", health::liveness)?
        .handle(Method::GET, "/readyz", health::readiness)?;

    Server::from_config(&config).serve(app).await
}

fn item_id(ctx: &Context<StoreSession>) -> Result<u64, Error> {
    ctx.param("id").and_then(|id| id.parse().ok()).ok_or(Error::InvalidId)
}

// GET /items
fn list_items(ctx: &mut Context<StoreSession>) -> BoxFuture<'_, Result<(), Error>> {
    Box::pin(async move {
        let items = ctx.session().list();
        ctx.respond_json(StatusCode::OK, &items)
    })
}

// GET /items/:id
fn get_item(ctx: &mut Context<StoreSession>) -> BoxFuture<'_, Result<(), Error>> {
    Box::pin(async move {
        let item = ctx.session().get(item_id(ctx)?).ok_or(Error::NotFound)?;
        ctx.respond_json(StatusCode::OK, &item)
    })
}

// POST /items
fn create_item(ctx: &mut Context<StoreSession>) -> BoxFuture<'_, Result<(), Error>> {
    Box::pin(async move {
        let new: NewItem = ctx.decode_json()?;
        if new.name.trim().is_empty() {
            return Err(Error::Validation(vec![Invalid::new("name", "must not be empty")]));
        }
        let item = ctx.session().insert(new.name);
        ctx.respond_json(StatusCode::CREATED, &item)
    })
}

// DELETE /items/:id → 204 No Content
fn delete_item(ctx: &mut Context<StoreSession>) -> BoxFuture<'_, Result<(), Error>> {
    Box::pin(async move {
        ctx.session().remove(item_id(ctx)?).ok_or(Error::NotFound)?;
        ctx.respond(StatusCode::NO_CONTENT);
        Ok(())
    })
}
