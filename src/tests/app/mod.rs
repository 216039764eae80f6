use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::runtime::Handle;

use crate::{
    app::{App, UiOptions},
    form::{SlotId, TextKind},
    testing::Fixtures,
};

mod navigation_tests;
mod overlay_tests;
mod submission_tests;

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn ch(c: char) -> KeyEvent {
    key(KeyCode::Char(c))
}

fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

fn press_all(app: &mut App, keys: impl IntoIterator<Item = KeyEvent>) {
    for key in keys {
        app.handle_key_for_test(key);
    }
}

fn type_text(app: &mut App, text: &str) {
    press_all(app, text.chars().map(ch));
}

fn build_app(fixtures: &Fixtures, options: UiOptions) -> App {
    App::new(fixtures.services(), options, Handle::current())
}

/// Fill the fields a valid submission needs. The source branch is set so the
/// pipeline never consults the VCS context.
fn fill_valid_form(app: &mut App) {
    let registry = app.registry_mut_for_test();
    registry.set(SlotId::Text(TextKind::Repository), "acme/app");
    registry.set(SlotId::Text(TextKind::Source), "main");
    registry.set(SlotId::Prompt, "add structured logging");
}
