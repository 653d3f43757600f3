//! A text input that a button can focus through a ref.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing_subscriber::EnvFilter;
use trellis_core::{Cleanup, Component, HookError, Hooks, RenderResult, Runtime, View};

/// Stand-in for a widget owned by the host.
#[derive(Clone, Default)]
struct InputWidget {
    focused: Rc<Cell<bool>>,
}

impl InputWidget {
    fn focus(&self) {
        println!("input focused");
        self.focused.set(true);
    }
}

type ClickHandler = Rc<RefCell<Option<Rc<dyn Fn()>>>>;

struct TextInputWithFocusButton {
    widget: InputWidget,
    on_click: ClickHandler,
}

impl Component for TextInputWithFocusButton {
    fn render(&self, hooks: &mut Hooks<'_>) -> RenderResult {
        let input_el = hooks.use_ref(None::<InputWidget>)?;

        let bound = input_el.clone();
        let widget = self.widget.clone();
        hooks.use_effect((), move || {
            bound.set(Some(widget));
            Cleanup::new(move || bound.set(None))
        })?;

        *self.on_click.borrow_mut() = Some(Rc::new(move || {
            if let Some(input) = input_el.get() {
                input.focus();
            }
        }));

        Ok(View::fragment([
            View::text("[____________]"),
            View::text("[ Focus the input ]"),
        ]))
    }

    fn name(&self) -> &'static str {
        "TextInputWithFocusButton"
    }
}

fn main() -> Result<(), HookError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let widget = InputWidget::default();
    let on_click = ClickHandler::default();

    let mut runtime = Runtime::new(TextInputWithFocusButton {
        widget: widget.clone(),
        on_click: Rc::clone(&on_click),
    });
    println!("{}", runtime.run_until_idle()?);

    let click = on_click.borrow().clone();
    if let Some(click) = click {
        click();
    }
    println!("focused: {}", widget.focused.get());
    println!("render pending: {}", runtime.has_pending_work());

    Ok(())
}
