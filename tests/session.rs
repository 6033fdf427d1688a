//! Components, slots, custom elements and the client message loop.
//!
//! Run with: cargo test --test session -- --nocapture

mod common;

use std::rc::Rc;
use std::time::Duration;

use common::*;
use serde_json::json;
use spark_rdom::{
    Children, Component, ComponentContext, CustomElement, Handler, Inbound, Patch, PropValue,
    Reactive, RenderError, Signal, component, custom, default_slot, h, slot,
};
use tokio::sync::mpsc;

// =============================================================================
// COMPONENTS
// =============================================================================

struct Counter {
    count: Signal<i64>,
}

impl Component for Counter {
    fn create(cx: &ComponentContext) -> Self {
        Self {
            count: cx.signal(0),
        }
    }

    fn render(&self, _cx: &ComponentContext) -> Result<Children, RenderError> {
        let count = self.count.clone();
        Ok(h("button")
            .on("click", Handler::new(move || count.update(|n| n + 1)))
            .child(self.count.get())
            .into())
    }
}

struct Greeting;

impl Component for Greeting {
    fn create(_cx: &ComponentContext) -> Self {
        Greeting
    }

    fn render(&self, cx: &ComponentContext) -> Result<Children, RenderError> {
        let name = cx.prop("name").map(|p| p.to_text()).unwrap_or_default();
        Ok(format!("Hello, {name}").into())
    }
}

struct Echo {
    value: Signal<String>,
}

impl Component for Echo {
    fn create(cx: &ComponentContext) -> Self {
        Self {
            value: cx.signal(String::new()),
        }
    }

    fn render(&self, _cx: &ComponentContext) -> Result<Children, RenderError> {
        let value = self.value.clone();
        Ok(h("p")
            .child(
                h("input").on(
                    "input",
                    Handler::with_args(&["value"], move |args| {
                        let typed = args.str("value").unwrap_or_default();
                        value.set(format!("{}:{typed}", args.len()))
                    }),
                ),
            )
            .child(h("span").child(self.value.get()))
            .into())
    }
}

#[tokio::test]
async fn test_click_rerenders_component() {
    local(async {
        let (session, mut patches) = session();
        session.mount(component::<Counter>());
        session.settle().await;
        let initial = patches.drain();
        assert!(initial.contains(&Patch::SetHandler {
            parent_id: id("n1"),
            ref_id: None,
            event: "onclick".into(),
            handler_id: spark_rdom::HandlerId::new("h1"),
        }));
        assert_eq!(texts(&initial), vec![(id("n2"), "0".to_string())]);

        session
            .dispatch(Inbound::Callback {
                id: "h1".into(),
                payload: json!({}),
            })
            .unwrap();
        session.settle().await;
        assert_eq!(
            patches.drain(),
            vec![Patch::ReplaceData {
                id: id("n2"),
                offset: 0,
                count: 1,
                data: "1".into()
            }],
            "new handler closure is re-registered without a patch"
        );
        assert_eq!(session.handler_count(), 1);
    })
    .await;
}

#[tokio::test]
async fn test_handler_payload_is_filtered() {
    local(async {
        let (session, mut patches) = session();
        session.mount(component::<Echo>());
        session.settle().await;
        let handler = handler_for(&patches.drain(), "oninput");

        session
            .dispatch(Inbound::Callback {
                id: handler,
                payload: json!({"value": "typed", "secret": "not for you"}),
            })
            .unwrap();
        session.settle().await;
        let after = patches.drain();
        assert!(
            after
                .iter()
                .any(|p| matches!(p, Patch::InsertData { data, .. } if data == "1:typed")),
            "{after:#?}"
        );
    })
    .await;
}

#[tokio::test]
async fn test_new_props_rerender() {
    local(async {
        let (session, mut patches) = session();
        session.mount(component::<Greeting>().prop("name", "Ada"));
        session.settle().await;
        let initial = patches.drain();
        assert_eq!(texts(&initial), vec![(id("n1"), "Hello, Ada".to_string())]);

        session.mount(component::<Greeting>().prop("name", "Ada"));
        session.settle().await;
        assert!(patches.drain().is_empty(), "equal props do not re-render");

        session.mount(component::<Greeting>().prop("name", "Grace"));
        session.settle().await;
        let after = patches.drain();
        assert!(!after.is_empty());
        assert!(after.iter().all(|p| matches!(
            p,
            Patch::InsertData { .. } | Patch::DeleteData { .. } | Patch::ReplaceData { .. }
        )));
    })
    .await;
}

#[tokio::test]
async fn test_unmount_unbinds_handlers() {
    local(async {
        let (session, mut patches) = session();
        session.mount(component::<Counter>());
        session.settle().await;
        patches.drain();
        assert_eq!(session.handler_count(), 1);

        session.mount(Children::new());
        session.settle().await;
        let after = patches.drain();
        assert!(after.iter().any(|p| matches!(p, Patch::RemoveHandler { .. })));
        assert_eq!(session.handler_count(), 0);
        assert!(
            session
                .dispatch(Inbound::Callback {
                    id: "h1".into(),
                    payload: json!({}),
                })
                .is_err()
        );
    })
    .await;
}

#[tokio::test]
async fn test_reactive_content_changing_type_restarts_node() {
    local(async {
        let (session, mut patches) = session();
        let plain = session.root().signal(true);
        let content = Reactive::computed(session.root(), {
            let plain = plain.clone();
            move || {
                if plain.get() {
                    PropValue::from("plain")
                } else {
                    PropValue::from(h("p"))
                }
            }
        });
        session.mount(h("div").child(content));
        session.settle().await;
        let initial = patches.drain();
        assert_eq!(texts(&initial), vec![(id("n2"), "plain".to_string())]);

        plain.set(false).unwrap();
        session.settle().await;
        assert_eq!(
            patches.drain(),
            vec![
                Patch::RemoveChild {
                    parent_id: Some(id("n1")),
                    id: id("n2"),
                },
                Patch::RemoveNode { id: id("n2") },
                Patch::CreateElement {
                    id: id("n3"),
                    tag: "p".into(),
                },
                Patch::InsertBefore {
                    parent_id: Some(id("n1")),
                    id: id("n3"),
                    ref_id: None,
                },
                Patch::AssignSlot {
                    parent_id: Some(id("n1")),
                    slot: None,
                    ids: vec![id("n3")],
                },
            ],
            "old node is torn down before its replacement starts"
        );
    })
    .await;
}

// =============================================================================
// SLOTS
// =============================================================================

struct Card;

impl Component for Card {
    fn create(_cx: &ComponentContext) -> Self {
        Card
    }

    fn render(&self, _cx: &ComponentContext) -> Result<Children, RenderError> {
        Ok(h("article")
            .child(h("header").child(slot("title")))
            .child(h("section").child(default_slot()))
            .child(h("footer").child(slot("missing")))
            .into())
    }
}

#[tokio::test]
async fn test_slotted_children_render_in_outlets() {
    local(async {
        let (session, mut patches) = session();
        session.mount(
            component::<Card>()
                .child(h("h1").slot("title").child("Hi"))
                .child("body text"),
        );
        session.settle().await;
        let initial = patches.drain();

        let header = created(&initial, "header")[0].clone();
        let section = created(&initial, "section")[0].clone();
        let footer = created(&initial, "footer")[0].clone();
        let h1 = created(&initial, "h1")[0].clone();
        let body = texts(&initial)
            .into_iter()
            .find(|(_, text)| text == "body text")
            .map(|(id, _)| id)
            .unwrap();
        let empty = texts(&initial)
            .into_iter()
            .find(|(_, text)| text.is_empty())
            .map(|(id, _)| id)
            .unwrap();

        assert_eq!(last_order(&initial, Some(&header)), Some(vec![h1.clone()]));
        assert_eq!(last_order(&initial, Some(&section)), Some(vec![body]));
        assert_eq!(
            last_order(&initial, Some(&footer)),
            Some(vec![empty]),
            "a missing slot renders empty text"
        );

        session.mount(
            component::<Card>()
                .child(h("h1").slot("title").child("Hello"))
                .child("body text"),
        );
        session.settle().await;
        let after = patches.drain();
        assert!(created(&after, "h1").is_empty(), "slot content updated in place");
        assert!(
            after
                .iter()
                .any(|p| matches!(p, Patch::InsertData { data, .. } if data == "llo")),
            "{after:#?}"
        );
    })
    .await;
}

struct Pair;

impl Component for Pair {
    fn create(_cx: &ComponentContext) -> Self {
        Pair
    }

    fn render(&self, _cx: &ComponentContext) -> Result<Children, RenderError> {
        Ok(vec![h("dt").child("term"), h("dd").child("definition")].into())
    }
}

#[tokio::test]
async fn test_fragment_children_join_parent_order() {
    local(async {
        let (session, mut patches) = session();
        session.mount(h("dl").child(component::<Pair>()).child(h("hr")));
        session.settle().await;
        let initial = patches.drain();
        let dl = created(&initial, "dl")[0].clone();
        let dt = created(&initial, "dt")[0].clone();
        let dd = created(&initial, "dd")[0].clone();
        let hr = created(&initial, "hr")[0].clone();

        assert!(initial.contains(&Patch::InsertBefore {
            parent_id: Some(dl.clone()),
            id: dt.clone(),
            ref_id: None,
        }));
        assert_eq!(last_order(&initial, Some(&dl)), Some(vec![dt, dd, hr]));
    })
    .await;
}

// =============================================================================
// CUSTOM ELEMENTS
// =============================================================================

#[tokio::test]
async fn test_custom_element_defined_once() {
    local(async {
        let (session, mut patches) = session();
        let card = Rc::new(CustomElement::new(
            "x_card",
            r#"<h2 ref="title"></h2><slot id="body"></slot>"#,
        ));
        session.mount(vec![
            card.instance()
                .fill("body", "one")
                .ref_prop("title", "class", "big")
                .attr("role", "note"),
            custom(&card).key(2).fill("body", "two"),
        ]);
        session.settle().await;
        let initial = patches.drain();

        let definitions = initial
            .iter()
            .filter(|p| matches!(p, Patch::DefineCustomElement { name, .. } if name == "x-card"))
            .count();
        assert_eq!(definitions, 1);

        let cards = created(&initial, "x-card");
        assert_eq!(cards.len(), 2);
        let one = texts(&initial)
            .into_iter()
            .find(|(_, text)| text == "one")
            .map(|(id, _)| id)
            .unwrap();
        assert!(initial.contains(&Patch::AssignSlot {
            parent_id: Some(cards[0].clone()),
            slot: Some("body".into()),
            ids: vec![one],
        }));
        assert!(initial.contains(&Patch::SetAttribute {
            parent_id: cards[0].clone(),
            ref_id: Some("title".into()),
            name: "class".into(),
            value: "big".into(),
        }));
        assert!(initial.contains(&Patch::SetAttribute {
            parent_id: cards[0].clone(),
            ref_id: None,
            name: "role".into(),
            value: "note".into(),
        }));
    })
    .await;
}

// =============================================================================
// WIRE
// =============================================================================

#[tokio::test]
async fn test_patches_serialize_as_lines() {
    local(async {
        let (session, mut patches) = session();
        session.mount("hi");
        let first = patches.try_next_line().unwrap().unwrap();
        assert_eq!(
            first,
            "[\"DefineCustomElement\",\"rdom-root\",\"<slot id=\\\"children\\\"></slot>\",null]\n"
        );
        assert_eq!(patches.try_next_line().unwrap().unwrap(), "[\"CreateRoot\"]\n");
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_run_pings_and_stops_on_close() {
    local(async {
        let (session, mut patches) = session();
        let (tx, rx) = mpsc::unbounded_channel();
        let client = async move {
            tokio::time::sleep(Duration::from_millis(5_100)).await;
            tx.send(Inbound::from_json("[\"pong\", 5000.0]").unwrap())
                .unwrap();
        };
        tokio::join!(session.run(rx), client);

        let pings: Vec<f64> = patches
            .drain()
            .into_iter()
            .filter_map(|p| match p {
                Patch::Ping { time } => Some(time),
                _ => None,
            })
            .collect();
        assert_eq!(pings.len(), 1);
        assert!(pings[0] >= 5_000.0);
    })
    .await;
}
