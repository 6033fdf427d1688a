//! Counter Example - a component, a handler and the patch stream
//!
//! Mounts a counter, simulates three clicks from the client and prints
//! every patch as the JSON line a client would receive.
//!
//! Run with: cargo run --example counter

use serde_json::json;
use spark_rdom::{
    Children, Component, ComponentContext, Handler, Inbound, PatchStream, RenderError, Session,
    SessionConfig, Signal, component, h,
};
use tokio::task::LocalSet;

struct Counter {
    count: Signal<i64>,
}

impl Component for Counter {
    fn create(cx: &ComponentContext) -> Self {
        Self {
            count: cx.signal(0),
        }
    }

    fn render(&self, cx: &ComponentContext) -> Result<Children, RenderError> {
        let label = cx
            .prop("label")
            .map(|label| label.to_text())
            .unwrap_or_default();
        let count = self.count.clone();
        Ok(h("div")
            .attr("class", "counter")
            .child(h("span").child(label))
            .child(
                h("button")
                    .style("font_weight", "bold")
                    .on("click", Handler::new(move || count.update(|n| n + 1)))
                    .child(self.count.get()),
            )
            .into())
    }
}

fn flush(patches: &mut PatchStream) {
    while let Ok(Some(line)) = patches.try_next_line() {
        print!("{line}");
    }
}

fn main() {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            return;
        }
    };

    LocalSet::new().block_on(&runtime, async {
        let (session, mut patches) = Session::new(SessionConfig::default().with_sequential_ids());

        println!("=== spark-rdom Counter Example ===\n");
        session.mount(component::<Counter>().prop("label", "Clicks: "));
        session.settle().await;
        flush(&mut patches);

        // The button's handler is the only one registered.
        for _ in 0..3 {
            println!();
            let click = Inbound::Callback {
                id: "h1".into(),
                payload: json!({}),
            };
            if let Err(err) = session.dispatch(click) {
                eprintln!("dispatch failed: {err}");
            }
            session.settle().await;
            flush(&mut patches);
        }

        println!();
        session.stop();
        flush(&mut patches);
    });
}
