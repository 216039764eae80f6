use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use super::{build_app, ch, ctrl, fill_valid_form, key, press_all, type_text};
use crate::{
    app::{Mode, SessionOutcome, SubmissionState, UiOptions},
    form::{Focus, FocusCursor, SlotId, TextKind},
    services::ServiceError,
    testing::Fixtures,
};

#[tokio::test]
async fn focus_ring_wraps_through_both_buttons() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, UiOptions::default());
    assert_eq!(app.focus_for_test(), Focus::Slot(SlotId::ConfigLoader));

    app.handle_key_for_test(ch('k'));
    assert_eq!(app.focus_for_test(), Focus::Back);
    app.handle_key_for_test(ch('k'));
    assert_eq!(app.focus_for_test(), Focus::Submit);
    app.handle_key_for_test(ch('k'));
    assert_eq!(app.focus_for_test(), Focus::Slot(SlotId::Prompt));

    press_all(&mut app, [ch('j'), ch('j'), ch('j')]);
    assert_eq!(app.focus_for_test(), Focus::Slot(SlotId::ConfigLoader));
}

#[tokio::test]
async fn full_cycle_returns_to_start() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, UiOptions::default());
    let slots = app.registry_for_test().visible_slots().len();
    for _ in 0..slots + 2 {
        app.handle_key_for_test(key(KeyCode::Tab));
    }
    assert_eq!(app.cursor_for_test(), FocusCursor::default());
}

#[tokio::test]
async fn double_g_jumps_to_first_slot() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, UiOptions::default());
    app.handle_key_for_test(ch('G'));
    assert_eq!(app.focus_for_test(), Focus::Submit);

    app.handle_key_for_test(ch('g'));
    assert_eq!(app.focus_for_test(), Focus::Submit);
    app.handle_key_for_test(ch('g'));
    assert_eq!(app.focus_for_test(), Focus::Slot(SlotId::ConfigLoader));
}

#[tokio::test]
async fn other_keys_disarm_pending_g() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, UiOptions::default());
    press_all(&mut app, [ch('G'), ch('g'), ch('k'), ch('g')]);
    assert_eq!(app.focus_for_test(), Focus::Slot(SlotId::Prompt));
}

#[tokio::test]
async fn insert_mode_edits_focused_slot() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, UiOptions::default());
    app.set_cursor_for_test(FocusCursor {
        index: 2,
        ..FocusCursor::default()
    });
    app.handle_key_for_test(ch('i'));
    assert_eq!(app.mode_for_test(), Mode::Insert);

    type_text(&mut app, "acme/jk");
    assert_eq!(
        app.registry_for_test().get(SlotId::Text(TextKind::Repository)),
        "acme/jk"
    );
    assert_eq!(app.status_for_test(), "Editing Repository");

    app.handle_key_for_test(key(KeyCode::Esc));
    assert_eq!(app.mode_for_test(), Mode::Normal);
    assert_eq!(app.focus_for_test(), Focus::Slot(SlotId::Text(TextKind::Repository)));
    assert_eq!(fixtures.form_store.current().map(|s| s.repository), Some("acme/jk".into()));
}

#[tokio::test]
async fn enter_adds_newline_only_in_multiline_slots() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, UiOptions::default());
    let prompt = app
        .registry_for_test()
        .visible_slots()
        .iter()
        .position(|slot| *slot == SlotId::Prompt)
        .expect("prompt slot");
    app.set_cursor_for_test(FocusCursor {
        index: prompt,
        ..FocusCursor::default()
    });
    app.handle_key_for_test(ch('i'));
    type_text(&mut app, "one");
    app.handle_key_for_test(key(KeyCode::Enter));
    type_text(&mut app, "two");
    assert_eq!(app.registry_for_test().get(SlotId::Prompt), "one\ntwo");
    assert_eq!(app.mode_for_test(), Mode::Insert);

    app.set_cursor_for_test(FocusCursor {
        index: 5,
        ..FocusCursor::default()
    });
    app.handle_key_for_test(key(KeyCode::Enter));
    assert_eq!(app.mode_for_test(), Mode::Normal);
}

#[tokio::test]
async fn insert_is_refused_on_non_text_slots() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, UiOptions::default());
    app.handle_key_for_test(ch('i'));
    assert_eq!(app.mode_for_test(), Mode::Normal);

    app.handle_key_for_test(ch('j'));
    app.handle_key_for_test(key(KeyCode::Enter));
    assert_eq!(app.mode_for_test(), Mode::Normal);
    assert_eq!(app.registry_for_test().get(SlotId::RunTypeToggle), "plan");
}

#[tokio::test]
async fn hiding_focused_context_moves_focus_to_prompt() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, UiOptions::default());
    app.handle_key_for_test(ch('c'));
    assert!(app.registry_for_test().context_visible());

    let slots = app.registry_for_test().visible_slots();
    assert_eq!(slots.last(), Some(&SlotId::Context));
    app.set_cursor_for_test(FocusCursor {
        index: slots.len() - 1,
        ..FocusCursor::default()
    });
    assert_eq!(app.focus_for_test(), Focus::Slot(SlotId::Context));

    app.handle_key_for_test(ch('c'));
    assert!(!app.registry_for_test().context_visible());
    assert_eq!(app.focus_for_test(), Focus::Slot(SlotId::Prompt));
}

#[tokio::test]
async fn back_needs_confirmation_when_dirty() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, UiOptions::default());
    app.registry_mut_for_test().set(SlotId::Prompt, "draft");

    app.handle_key_for_test(ch('q'));
    assert!(app.outcome_for_test().is_none());
    assert!(app.status_for_test().contains("Press q again"));

    app.handle_key_for_test(ch('q'));
    assert_eq!(app.outcome_for_test(), Some(&SessionOutcome::Back));
}

#[tokio::test]
async fn back_confirmation_is_reset_by_other_keys() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, UiOptions::default());
    app.registry_mut_for_test().set(SlotId::Prompt, "draft");
    press_all(&mut app, [ch('q'), ch('j'), ch('q')]);
    assert!(app.outcome_for_test().is_none());
}

#[tokio::test]
async fn clean_form_leaves_immediately() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, UiOptions::default());
    app.handle_key_for_test(ch('q'));
    assert_eq!(app.outcome_for_test(), Some(&SessionOutcome::Back));
}

#[tokio::test]
async fn force_quit_works_in_insert_mode() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, UiOptions::default());
    app.set_cursor_for_test(FocusCursor {
        index: 2,
        ..FocusCursor::default()
    });
    app.handle_key_for_test(ch('i'));
    app.handle_key_for_test(ctrl('c'));
    assert_eq!(app.outcome_for_test(), Some(&SessionOutcome::Quit));
}

#[tokio::test]
async fn clear_form_resets_values_and_store() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, UiOptions::default());
    app.registry_mut_for_test().set(SlotId::Prompt, "draft");
    assert!(fixtures.form_store.current().is_some());

    app.handle_key_for_test(ctrl('x'));
    assert_eq!(app.registry_for_test().get(SlotId::Prompt), "");
    assert!(fixtures.form_store.current().is_none());
    assert_eq!(app.status_for_test(), "Form cleared");
}

#[tokio::test]
async fn custom_keymap_replaces_default_bindings() {
    let keymap = r#"[
        { "id": "next", "description": "next", "contexts": ["normal"], "action": { "kind": "focusNext" }, "combos": ["n"] }
    ]"#;
    let options = UiOptions::default()
        .with_keymap_json(keymap)
        .expect("keymap parses");
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, options);

    app.handle_key_for_test(ch('j'));
    assert_eq!(app.focus_for_test(), Focus::Slot(SlotId::ConfigLoader));
    app.handle_key_for_test(ch('n'));
    assert_eq!(app.focus_for_test(), Focus::Slot(SlotId::RunTypeToggle));
}

#[tokio::test]
async fn next_then_prev_returns_from_every_position() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, UiOptions::default());
    for context_visible in [false, true] {
        if app.registry_for_test().context_visible() != context_visible {
            app.handle_key_for_test(ch('c'));
        }
        app.set_cursor_for_test(FocusCursor::default());
        let positions = app.registry_for_test().visible_slots().len() + 2;
        for _ in 0..positions {
            let start = app.focus_for_test();
            app.handle_key_for_test(ch('j'));
            assert_ne!(app.focus_for_test(), start);
            app.handle_key_for_test(ch('k'));
            assert_eq!(app.focus_for_test(), start, "context visible: {context_visible}");
            app.handle_key_for_test(key(KeyCode::Tab));
        }
        assert_eq!(app.focus_for_test(), Focus::Slot(SlotId::ConfigLoader));
    }
}

#[tokio::test]
async fn context_toggle_keeps_focus_off_the_context_slot() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, UiOptions::default());
    app.set_cursor_for_test(FocusCursor {
        index: 2,
        ..FocusCursor::default()
    });
    let repository = Focus::Slot(SlotId::Text(TextKind::Repository));
    assert_eq!(app.focus_for_test(), repository);
    app.handle_key_for_test(ch('c'));
    assert_eq!(app.focus_for_test(), repository);
    app.handle_key_for_test(ch('c'));
    assert_eq!(app.focus_for_test(), repository);

    for button in [Focus::Submit, Focus::Back] {
        app.handle_key_for_test(ch('G'));
        if button == Focus::Back {
            app.handle_key_for_test(ch('j'));
        }
        assert_eq!(app.focus_for_test(), button);
        app.handle_key_for_test(ch('c'));
        assert_eq!(app.focus_for_test(), button);
        app.handle_key_for_test(ch('c'));
        assert_eq!(app.focus_for_test(), button);
    }
}

#[tokio::test]
async fn idle_tick_disarms_pending_g() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, UiOptions::default());
    let start = Instant::now();
    app.handle_key_at(ch('G'), start);
    app.handle_key_at(ch('g'), start);
    assert!(app.pending_g_for_test());

    app.tick(start + Duration::from_millis(500));
    assert!(app.pending_g_for_test());
    app.tick(start + Duration::from_millis(1001));
    assert!(!app.pending_g_for_test());

    // The next g only arms again.
    app.handle_key_at(ch('g'), start + Duration::from_millis(1002));
    assert_eq!(app.focus_for_test(), Focus::Submit);
    assert!(app.pending_g_for_test());
}

#[tokio::test]
async fn error_dismissal_restores_back_button_focus() {
    let fixtures = Fixtures::default();
    fixtures.runs.push(Err(ServiceError::remote("boom")));
    let mut app = build_app(&fixtures, UiOptions::default());
    fill_valid_form(&mut app);
    app.handle_key_for_test(ch('k'));
    assert_eq!(app.focus_for_test(), Focus::Back);
    let before = app.cursor_for_test();

    app.handle_key_for_test(ctrl('s'));
    app.settle_for_test().await;
    assert!(matches!(app.submission_for_test(), SubmissionState::Error(_)));

    app.handle_key_for_test(key(KeyCode::Enter));
    assert_eq!(app.submission_for_test(), &SubmissionState::Idle);
    assert_eq!(app.cursor_for_test(), before);
    assert_eq!(app.focus_for_test(), Focus::Back);
    assert!(app.outcome_for_test().is_none());
}
