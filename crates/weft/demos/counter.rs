#![forbid(unsafe_code)]

//! Counter demo: `+`/`-` change the count, Tab moves focus, `q` quits.
//!
//! Run with `cargo run -p weft --example counter`.

use weft::prelude::*;
use weft::{Constraints, MountContext, RenderContext, WidgetCore};

/// Invisible widget that maps keys to signal updates.
struct Keys {
    core: WidgetCore,
    count: Signal<i64>,
}

impl Widget for Keys {
    fn measure(&self, constraints: Constraints) -> Size {
        constraints.constrain(Size::ZERO)
    }

    fn layout(&mut self, bounds: Rect) {
        self.core.set_bounds(bounds);
    }

    fn render(&self, _ctx: &mut RenderContext<'_>) {}

    fn handle_message(&mut self, msg: &Message) -> HandleResult {
        let Message::Key(key) = msg else {
            return HandleResult::unhandled();
        };
        if key.is_char('+') {
            self.count.update(|n| n + 1);
        } else if key.is_char('-') {
            self.count.update(|n| n - 1);
        } else if key.is_char('q') || key.code == KeyCode::Escape {
            return HandleResult::with_command(Command::Quit);
        } else {
            return HandleResult::unhandled();
        }
        HandleResult::handled()
    }

    fn bounds(&self) -> Rect {
        self.core.bounds()
    }

    fn mount(&mut self, ctx: &MountContext) {
        self.core.attach(ctx);
    }

    fn unmount(&mut self) {
        self.core.detach();
    }
}

fn main() -> weft::Result<()> {
    let count = Signal::new(0i64);
    let root = Stack::vertical()
        .with_gap(1)
        .child(Label::new("weft counter  (+/- to change, Tab to move focus, q to quit)"))
        .child(SignalLabel::new(&count, |n| format!("Count: {n}")))
        .child(
            Stack::horizontal()
                .with_gap(2)
                .child(Label::new("[ one ]").focusable(true))
                .child(Label::new("[ two ]").focusable(true)),
        )
        .child(Keys {
            core: WidgetCore::new(),
            count: count.clone(),
        });

    let summary = weft::run(root)?;
    println!(
        "final count {} after {} messages, {} frames",
        count.get(),
        summary.messages,
        summary.frames
    );
    Ok(())
}
