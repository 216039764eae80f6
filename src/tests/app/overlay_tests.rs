use crossterm::event::KeyCode;

use super::{build_app, ch, ctrl, key, type_text};
use crate::{
    app::{SessionOutcome, UiOptions},
    form::{Focus, SlotId, TextKind},
    testing::Fixtures,
};

fn finder_options() -> UiOptions {
    UiOptions::default()
        .with_detected_repository("acme/app")
        .with_repository_history(["acme/web", "other/tool", "acme/app"])
}

#[tokio::test]
async fn fuzzy_pick_fills_repository_and_focuses_it() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, finder_options());

    app.handle_key_for_test(ch('f'));
    assert!(app.overlay_active_for_test());

    // Keys go to the overlay query, not the form bindings.
    type_text(&mut app, "web");
    assert_eq!(app.focus_for_test(), Focus::Slot(SlotId::ConfigLoader));

    app.handle_key_for_test(key(KeyCode::Enter));
    assert!(!app.overlay_active_for_test());
    assert_eq!(
        app.registry_for_test().get(SlotId::Text(TextKind::Repository)),
        "acme/web"
    );
    assert_eq!(
        app.focus_for_test(),
        Focus::Slot(SlotId::Text(TextKind::Repository))
    );
}

#[tokio::test]
async fn fuzzy_enter_without_match_uses_typed_text() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, finder_options());
    app.handle_key_for_test(ch('f'));
    type_text(&mut app, "zzz/new");
    app.handle_key_for_test(key(KeyCode::Enter));
    assert_eq!(
        app.registry_for_test().get(SlotId::Text(TextKind::Repository)),
        "zzz/new"
    );
}

#[tokio::test]
async fn cancelled_overlay_leaves_form_untouched() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, finder_options());
    app.handle_key_for_test(ch('f'));
    type_text(&mut app, "acme");
    app.handle_key_for_test(key(KeyCode::Esc));
    assert!(!app.overlay_active_for_test());
    assert_eq!(
        app.registry_for_test().get(SlotId::Text(TextKind::Repository)),
        ""
    );
    assert!(!app.registry_for_test().is_dirty());
    assert_eq!(app.status_for_test(), crate::app::READY_STATUS);
}

#[tokio::test]
async fn enter_on_config_slot_opens_file_browser() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, UiOptions::default());
    app.handle_key_for_test(key(KeyCode::Enter));
    assert!(app.overlay_active_for_test());

    // 'q' cancels the browser instead of leaving the form.
    app.handle_key_for_test(ch('q'));
    assert!(!app.overlay_active_for_test());
    assert!(app.outcome_for_test().is_none());
}

#[tokio::test]
async fn force_quit_reaches_through_overlay() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, finder_options());
    app.handle_key_for_test(ch('f'));
    app.handle_key_for_test(ctrl('c'));
    assert_eq!(app.outcome_for_test(), Some(&SessionOutcome::Quit));
}
