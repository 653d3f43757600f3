//! A button that picks up its theme from the nearest provider.

use tracing_subscriber::EnvFilter;
use trellis_core::{
    create_context, Component, ContextScope, HookError, Hooks, RenderResult, Runtime, View,
};

struct ThemeButton {
    theme: ContextScope<&'static str>,
}

impl Component for ThemeButton {
    fn render(&self, hooks: &mut Hooks<'_>) -> RenderResult {
        let value = hooks.use_context(&self.theme);
        Ok(View::text(format!(
            "<button class=\"{value}\">I am styled by theme context!</button>"
        )))
    }
}

struct App {
    theme: ContextScope<&'static str>,
}

impl Component for App {
    fn render(&self, _: &mut Hooks<'_>) -> RenderResult {
        let button = || ThemeButton {
            theme: self.theme.clone(),
        };
        Ok(View::fragment([
            self.theme.provide("dark", View::component(button())),
            View::component(button()),
        ]))
    }
}

fn main() -> Result<(), HookError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut runtime = Runtime::new(App {
        theme: create_context("light"),
    });
    let frame = runtime.run_until_idle()?;
    println!("{frame}");

    Ok(())
}
