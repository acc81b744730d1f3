//! Photo store domain — the remote collection backing the gallery.
//!
//! Two independent surfaces, per the store contract:
//!   - a one-time snapshot query at startup (`PhotoStore::load_snapshot`)
//!   - a long-lived change feed of insert/delete events
//!     (`PhotoStore::subscribe` → `FeedSubscription`)
//!
//! The snapshot is never re-fetched on a feed reconnect because there is
//! no reconnect: a dropped feed is reported and stays dropped.
//! `delete_photo` is the destructive path, gated client-side by the admin
//! module and for real by the server.

mod client;
mod feed;
mod sse;

pub use client::{PhotoStore, StoreError};
pub use feed::{FeedEvent, FeedSubscription};
