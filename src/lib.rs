//! # Lightbox
//!
//! Background derivative generation for uploaded photos and avatars.
//! An upload handler stores the original, records the item as `pending`, and
//! hands it to the pipeline; a worker renders every configured size and flips
//! the status to `ready` or `failed`.
//!
//! # Architecture: One Queue, One Worker, Per Class
//!
//! ```text
//! upload ──▶ intake::store_original ──▶ Pipeline::submit
//!                                            │
//!                      ┌─────────────────────┴────────────────────┐
//!                      ▼                                          ▼
//!               [photo queue]                              [avatar queue]
//!                      │                                          │
//!               photo worker                               avatar worker
//!       decode once → render → write, per size       (same, avatar table)
//!                      │                                          │
//!                      └───────────▶ Commit::finalize ◀───────────┘
//!                               pending → ready | failed
//! ```
//!
//! Each queue is bounded, so a burst of uploads makes producers wait rather
//! than growing memory. Each class has exactly one consumer, so an item is
//! never processed twice and `ready` is only published after every
//! derivative for that item is on disk.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Bounded queues, per-class workers, admission and shutdown |
//! | [`imaging`] | Decode, thumbnail/fit resizing, and JPEG encoding via the `image` crate |
//! | [`sizes`] | Derivative size tables (`t50`, `f300`, ...) and their validation |
//! | [`paths`] | The on-disk layout shared with whatever serves the files |
//! | [`commit`] | Writing derivatives in place or via staged renames, then publishing status |
//! | [`store`] | Status persistence: in-memory and JSON file stores |
//! | [`intake`] | Storing originals and the default-avatar fast path |
//! | [`config`] | `lightbox.toml` loading, stock defaults, and validation |
//! | [`types`] | Identity, class, token, and status types shared by every module |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Decode Once
//!
//! A worker decodes the original a single time and renders every size from
//! that in-memory image. Decoding is by far the most expensive step for
//! large photos; the size table has eight entries.
//!
//! ## Fail Fast, No Retry
//!
//! The first error for an item aborts its remaining sizes and marks it
//! `failed`. The worker moves on to the next item. Re-processing is an
//! explicit operator action (`lightbox reprocess`).
//!
//! ## Blocking Work Off the Runtime
//!
//! Resizing is CPU-bound, so each item runs under
//! `tokio::task::spawn_blocking`. Request handlers sharing the runtime keep
//! getting scheduled while a 2000px derivative encodes.
//!
//! ## Durability
//!
//! Queues live in memory only. An item that is queued or mid-processing when
//! the process dies stays `pending` until someone resubmits it.

pub mod commit;
pub mod config;
pub mod imaging;
pub mod intake;
pub mod output;
pub mod paths;
pub mod pipeline;
pub mod sizes;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
