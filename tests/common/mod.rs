//! Shared test harness: tracing, a local executor and patch helpers.

#![allow(dead_code)]

use std::future::Future;

use spark_rdom::{DomId, Patch, PatchStream, Session, SessionConfig};
use tokio::task::LocalSet;
use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the test harness (`RUST_LOG=debug`).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Run `f` inside a `LocalSet`, as a session requires.
pub async fn local<F: Future>(f: F) -> F::Output {
    LocalSet::new().run_until(f).await
}

/// A session with predictable ids (`n1`, `n2`, ... and `h1`, ...).
pub fn session() -> (Session, PatchStream) {
    init_tracing();
    Session::new(SessionConfig::default().with_sequential_ids())
}

pub fn id(id: &str) -> DomId {
    DomId::new(id)
}

pub fn names(patches: &[Patch]) -> Vec<&'static str> {
    patches.iter().map(Patch::name).collect()
}

/// Ids of elements created with `tag`, in creation order.
pub fn created(patches: &[Patch], tag: &str) -> Vec<DomId> {
    patches
        .iter()
        .filter_map(|patch| match patch {
            Patch::CreateElement { id, tag: t } if t == tag => Some(id.clone()),
            _ => None,
        })
        .collect()
}

/// Ids of created text nodes with their initial content.
pub fn texts(patches: &[Patch]) -> Vec<(DomId, String)> {
    patches
        .iter()
        .filter_map(|patch| match patch {
            Patch::CreateTextNode { id, content } => Some((id.clone(), content.clone())),
            _ => None,
        })
        .collect()
}

/// The last `AssignSlot` sent for `parent`.
pub fn last_order(patches: &[Patch], parent: Option<&DomId>) -> Option<Vec<DomId>> {
    patches.iter().rev().find_map(|patch| match patch {
        Patch::AssignSlot { parent_id, ids, .. } if parent_id.as_ref() == parent => {
            Some(ids.clone())
        }
        _ => None,
    })
}

/// Position of the first patch matching `pred`.
pub fn position(patches: &[Patch], pred: impl Fn(&Patch) -> bool) -> usize {
    patches
        .iter()
        .position(pred)
        .unwrap_or_else(|| panic!("no matching patch in {patches:#?}"))
}

/// Handler id bound for `event`, last one wins.
pub fn handler_for(patches: &[Patch], event: &str) -> String {
    patches
        .iter()
        .rev()
        .find_map(|patch| match patch {
            Patch::SetHandler {
                event: e,
                handler_id,
                ..
            } if e == event => Some(handler_id.as_str().to_string()),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no handler for {event} in {patches:#?}"))
}
