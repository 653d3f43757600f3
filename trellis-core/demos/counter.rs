//! A button that counts its clicks.
//!
//! Run with `RUST_LOG=trellis_core=debug cargo run --example counter` to see
//! the runtime's mount and render events.

use std::cell::RefCell;
use std::rc::Rc;

use tracing_subscriber::EnvFilter;
use trellis_core::{Component, Frame, HookError, Hooks, Host, RenderResult, Runtime, Setter, View};

struct Console;

impl Host for Console {
    fn commit(&mut self, frame: &Frame) {
        println!("{frame}\n");
    }
}

struct Counter {
    on_click: Rc<RefCell<Option<Setter<u32>>>>,
}

impl Component for Counter {
    fn render(&self, hooks: &mut Hooks<'_>) -> RenderResult {
        let (count, set_count) = hooks.use_state(0u32)?;
        *self.on_click.borrow_mut() = Some(set_count);
        Ok(View::fragment([
            View::text(format!("You clicked {count} times")),
            View::text("[ Click me ]"),
        ]))
    }
}

fn main() -> Result<(), HookError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let on_click: Rc<RefCell<Option<Setter<u32>>>> = Rc::default();

    let mut runtime = Runtime::new(Counter {
        on_click: Rc::clone(&on_click),
    });
    runtime.set_host(Console);
    runtime.run_until_idle()?;

    for _ in 0..3 {
        if let Some(set_count) = on_click.borrow().as_ref() {
            set_count.update(|count| count + 1);
        }
        runtime.run_until_idle()?;
    }

    Ok(())
}
