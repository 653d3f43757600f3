//! Render benchmarks for trellis-core
//!
//! Measures a full mount and a re-render of a keyed list with per-row state
//! and effects.

use std::cell::RefCell;
use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trellis_core::{Cleanup, Component, Hooks, RenderResult, Runtime, Setter, View};

struct Row {
    index: usize,
}

impl Component for Row {
    fn render(&self, hooks: &mut Hooks<'_>) -> RenderResult {
        let (hovered, _) = hooks.use_state(false)?;
        let cell = hooks.use_ref(0usize)?;
        hooks.use_effect(self.index, move || {
            cell.set(cell.get() + 1);
            Cleanup::none()
        })?;
        Ok(View::text(format!("row {} hovered={hovered}", self.index)))
    }
}

struct List {
    rows: usize,
    setter: Rc<RefCell<Option<Setter<u64>>>>,
}

impl Component for List {
    fn render(&self, hooks: &mut Hooks<'_>) -> RenderResult {
        let (generation, set_generation) = hooks.use_state(0u64)?;
        *self.setter.borrow_mut() = Some(set_generation);
        let rows = (0..self.rows).map(|index| View::keyed(index.to_string(), Row { index }));
        Ok(View::fragment(
            std::iter::once(View::text(format!("generation {generation}"))).chain(rows),
        ))
    }
}

fn list(rows: usize) -> (Runtime, Rc<RefCell<Option<Setter<u64>>>>) {
    let setter = Rc::new(RefCell::new(None));
    let runtime = Runtime::new(List {
        rows,
        setter: Rc::clone(&setter),
    });
    (runtime, setter)
}

fn bench_mount(c: &mut Criterion) {
    let mut group = c.benchmark_group("mount");

    for rows in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &rows| {
            b.iter(|| {
                let (mut runtime, _) = list(rows);
                black_box(runtime.flush().unwrap())
            })
        });
    }

    group.finish();
}

fn bench_rerender(c: &mut Criterion) {
    let mut group = c.benchmark_group("rerender");

    for rows in [10, 100, 1000] {
        let (mut runtime, setter) = list(rows);
        runtime.flush().unwrap();
        let set_generation = setter.borrow().clone().unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, _| {
            b.iter(|| {
                set_generation.update(|n| n + 1);
                black_box(runtime.flush().unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_mount, bench_rerender);
criterion_main!(benches);
