use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use crossterm::event::KeyCode;
use tokio::runtime::Handle;

use super::{build_app, ch, ctrl, fill_valid_form, key};
use crate::{
    app::{App, AppEvent, ErrorRow, Mode, SessionOutcome, SubmissionState, UiOptions},
    domain::{Run, Task},
    form::{Focus, SlotId},
    io::FileConfigLoader,
    services::ServiceError,
    testing::{Fixtures, StaticVcs},
};

const DUPLICATE_955: &str = "Duplicate run detected for this task (ID: 955). Use force to override.";

#[tokio::test]
async fn validation_blocks_remote_call() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, UiOptions::default());
    app.registry_mut_for_test()
        .set(SlotId::Text(crate::form::TextKind::Repository), "acme/app");

    app.handle_key_for_test(ctrl('s'));
    assert_eq!(app.validation_hint_for_test(), Some("Prompt is required"));
    assert_eq!(app.submission_for_test(), &SubmissionState::Idle);
    assert_eq!(fixtures.runs.call_count(), 0);

    app.handle_key_for_test(key(KeyCode::Esc));
    assert_eq!(app.validation_hint_for_test(), None);
}

#[tokio::test]
async fn successful_submission_clears_form_and_store() {
    let fixtures = Fixtures::default();
    fixtures.runs.push(Ok(Run::new("42")));
    let mut app = build_app(&fixtures, UiOptions::default());
    fill_valid_form(&mut app);

    app.handle_key_for_test(ctrl('s'));
    assert!(matches!(
        app.submission_for_test(),
        SubmissionState::Submitting { token: 1 }
    ));

    app.settle_for_test().await;
    match app.submission_for_test() {
        SubmissionState::Success { run } => assert_eq!(run.id, "42"),
        other => panic!("expected success, got {other:?}"),
    }
    assert_eq!(app.status_for_test(), "Run 42 created");
    assert_eq!(app.registry_for_test().get(SlotId::Prompt), "");
    assert!(fixtures.form_store.current().is_none());
    assert!(app.outcome_for_test().is_none());

    let calls = fixtures.runs.calls();
    assert_eq!(calls.len(), 1);
    let (task, force) = &calls[0];
    assert!(!force);
    assert_eq!(task.repository, "acme/app");
    assert!(task.target.starts_with("repobird/"));
    assert!(task.content_hash.is_some());

    // Any key dismisses the success banner and is handled normally.
    app.handle_key_for_test(ch('j'));
    assert_eq!(app.submission_for_test(), &SubmissionState::Idle);
    assert_eq!(app.focus_for_test(), Focus::Slot(SlotId::RunTypeToggle));
}

#[tokio::test]
async fn exit_on_success_ends_the_session() {
    let fixtures = Fixtures::default();
    fixtures.runs.push(Ok(Run::new("7")));
    let mut app = build_app(&fixtures, UiOptions::default().with_exit_on_success(true));
    fill_valid_form(&mut app);
    app.handle_key_for_test(ctrl('s'));
    app.settle_for_test().await;
    assert_eq!(
        app.outcome_for_test(),
        Some(&SessionOutcome::Submitted(Run::new("7")))
    );
}

#[tokio::test]
async fn submit_is_ignored_while_in_flight() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, UiOptions::default());
    fill_valid_form(&mut app);
    app.handle_key_for_test(ctrl('s'));
    app.handle_key_for_test(ctrl('s'));
    assert!(matches!(
        app.submission_for_test(),
        SubmissionState::Submitting { token: 1 }
    ));
    app.settle_for_test().await;
    assert_eq!(fixtures.runs.call_count(), 1);
}

#[tokio::test]
async fn duplicate_confirm_resubmits_same_task_with_force() {
    let fixtures = Fixtures::default();
    fixtures.runs.push(Err(ServiceError::remote(DUPLICATE_955)));
    fixtures.runs.push(Ok(Run::new("956")));
    let mut app = build_app(&fixtures, UiOptions::default());
    fill_valid_form(&mut app);

    app.handle_key_for_test(ctrl('s'));
    app.settle_for_test().await;
    match app.submission_for_test() {
        SubmissionState::DuplicateConfirm { run_id, .. } => assert_eq!(run_id, "955"),
        other => panic!("expected duplicate prompt, got {other:?}"),
    }

    app.handle_key_for_test(ch('y'));
    assert!(matches!(
        app.submission_for_test(),
        SubmissionState::Submitting { token: 2 }
    ));
    app.settle_for_test().await;
    assert!(matches!(
        app.submission_for_test(),
        SubmissionState::Success { run } if run.id == "956"
    ));

    let calls = fixtures.runs.calls();
    assert_eq!(calls.len(), 2);
    assert!(!calls[0].1);
    assert!(calls[1].1);
    let strip_force = |task: &Task| Task {
        force: false,
        ..task.clone()
    };
    assert_eq!(strip_force(&calls[0].0), strip_force(&calls[1].0));
}

#[tokio::test]
async fn declining_duplicate_keeps_form_and_hash() {
    let fixtures = Fixtures::default();
    fixtures.runs.push(Err(ServiceError::remote(DUPLICATE_955)));
    let mut app = build_app(&fixtures, UiOptions::default());
    fill_valid_form(&mut app);

    app.handle_key_for_test(ctrl('s'));
    app.settle_for_test().await;
    let hash = app.registry_for_test().content_hash().map(str::to_string);
    assert!(hash.is_some());

    app.handle_key_for_test(ch('n'));
    assert_eq!(app.submission_for_test(), &SubmissionState::Idle);
    assert_eq!(app.registry_for_test().content_hash().map(str::to_string), hash);
    assert_eq!(app.registry_for_test().get(SlotId::Prompt), "add structured logging");
    assert_eq!(fixtures.runs.call_count(), 1);
}

#[tokio::test]
async fn cancelled_result_is_discarded() {
    let fixtures = Fixtures::default();
    fixtures.runs.push(Ok(Run::new("1")));
    fixtures.runs.push(Ok(Run::new("2")));
    let mut app = build_app(&fixtures, UiOptions::default());
    fill_valid_form(&mut app);

    app.handle_key_for_test(ctrl('s'));
    app.handle_key_for_test(key(KeyCode::Esc));
    assert_eq!(app.submission_for_test(), &SubmissionState::Idle);
    assert_eq!(app.status_for_test(), "Submission cancelled");

    app.handle_key_for_test(ctrl('s'));
    assert!(matches!(
        app.submission_for_test(),
        SubmissionState::Submitting { token: 2 }
    ));

    app.settle_for_test().await;
    assert!(matches!(
        app.submission_for_test(),
        SubmissionState::Submitting { token: 2 }
    ));
    assert_eq!(app.registry_for_test().get(SlotId::Prompt), "add structured logging");

    app.settle_for_test().await;
    assert!(matches!(
        app.submission_for_test(),
        SubmissionState::Success { run } if run.id == "2"
    ));
}

#[tokio::test]
async fn late_result_after_cancel_changes_nothing() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, UiOptions::default());
    fill_valid_form(&mut app);
    app.handle_key_for_test(ctrl('s'));
    app.handle_key_for_test(key(KeyCode::Esc));

    app.settle_for_test().await;
    assert_eq!(app.submission_for_test(), &SubmissionState::Idle);
    assert_eq!(app.status_for_test(), "Submission cancelled");
    assert!(fixtures.hash_history.entries().is_empty());
}

#[tokio::test]
async fn error_panel_restores_button_focus() {
    let fixtures = Fixtures::default();
    fixtures
        .runs
        .push(Err(ServiceError::Network("connection refused".into())));
    let mut app = build_app(&fixtures, UiOptions::default());
    fill_valid_form(&mut app);
    app.handle_key_for_test(ch('G'));
    assert_eq!(app.focus_for_test(), Focus::Submit);
    let before = app.cursor_for_test();

    app.handle_key_for_test(key(KeyCode::Enter));
    app.settle_for_test().await;
    let SubmissionState::Error(panel) = app.submission_for_test() else {
        panic!("expected error panel");
    };
    assert_eq!(panel.message(), "network error: connection refused");
    assert_eq!(panel.row(), ErrorRow::Message);

    // Navigation keys move inside the panel, not the form.
    app.handle_key_for_test(ch('j'));
    let SubmissionState::Error(panel) = app.submission_for_test() else {
        panic!("expected error panel");
    };
    assert_eq!(panel.row(), ErrorRow::BackToForm);
    assert_eq!(app.cursor_for_test(), before);

    app.handle_key_for_test(ch('r'));
    assert_eq!(app.submission_for_test(), &SubmissionState::Idle);
    assert_eq!(app.cursor_for_test(), before);
    assert_eq!(app.focus_for_test(), Focus::Submit);
    assert_eq!(fixtures.runs.call_count(), 1);
}

#[tokio::test]
async fn error_text_copies_only_from_message_row() {
    let fixtures = Fixtures::default();
    fixtures.runs.push(Err(ServiceError::remote("quota exceeded")));
    let mut app = build_app(&fixtures, UiOptions::default());
    fill_valid_form(&mut app);
    app.handle_key_for_test(ctrl('s'));
    app.settle_for_test().await;

    app.handle_key_for_test(ch('j'));
    app.handle_key_for_test(ch('y'));
    app.handle_key_for_test(ch('k'));
    app.handle_key_for_test(ch('y'));
    app.settle_for_test().await;

    assert_eq!(fixtures.clipboard.writes(), vec!["quota exceeded".to_string()]);
    assert!(app.flash_active_for_test());
    assert!(matches!(app.submission_for_test(), SubmissionState::Error(_)));
}

#[tokio::test]
async fn blank_run_id_is_an_error() {
    let fixtures = Fixtures::default();
    fixtures.runs.push(Ok(Run::new("  ")));
    let mut app = build_app(&fixtures, UiOptions::default());
    fill_valid_form(&mut app);
    app.handle_key_for_test(ctrl('s'));
    app.settle_for_test().await;
    let SubmissionState::Error(panel) = app.submission_for_test() else {
        panic!("expected error panel");
    };
    assert_eq!(panel.message(), crate::submit::INVALID_RUN_ID);
}

#[tokio::test]
async fn force_quit_while_submitting() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, UiOptions::default());
    fill_valid_form(&mut app);
    app.handle_key_for_test(ctrl('s'));
    app.handle_key_for_test(ctrl('q'));
    assert_eq!(app.outcome_for_test(), Some(&SessionOutcome::Quit));
}

#[tokio::test]
async fn loaded_config_is_submitted_and_hash_recorded() {
    let fixtures = Fixtures::default();
    let task = Task {
        repository: "acme/app".into(),
        source: "main".into(),
        prompt: "from file".into(),
        ..Task::default()
    };
    fixtures
        .config_loader
        .insert("task.json", task, Some("cafebabe"));
    fixtures.runs.push(Ok(Run::new("42")));
    let mut app = build_app(&fixtures, UiOptions::default());

    app.load_config(PathBuf::from("task.json"));
    app.settle_for_test().await;
    assert_eq!(app.registry_for_test().get(SlotId::Prompt), "from file");
    assert_eq!(app.registry_for_test().get(SlotId::ConfigLoader), "task.json");
    assert_eq!(app.status_for_test(), "Loaded task.json");

    app.handle_key_for_test(ctrl('s'));
    app.settle_for_test().await;
    assert_eq!(
        fixtures.runs.calls()[0].0.content_hash.as_deref(),
        Some("cafebabe")
    );
    assert_eq!(
        fixtures.hash_history.entries().get("task.json").map(String::as_str),
        Some("cafebabe")
    );

    app.load_config(PathBuf::from("task.json"));
    app.settle_for_test().await;
    assert_eq!(app.status_for_test(), "Loaded task.json (submitted before)");
}

#[tokio::test]
async fn failed_config_load_opens_error_panel() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, UiOptions::default());
    app.load_config(PathBuf::from("missing.json"));
    app.settle_for_test().await;
    let SubmissionState::Error(panel) = app.submission_for_test() else {
        panic!("expected error panel");
    };
    assert!(panel.message().starts_with("Failed to load missing.json"));

    app.handle_key_for_test(key(KeyCode::Esc));
    assert_eq!(app.submission_for_test(), &SubmissionState::Idle);
    assert_eq!(app.mode_for_test(), Mode::Normal);
}

#[tokio::test]
async fn clipboard_flash_expires_on_tick() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, UiOptions::default());
    let now = Instant::now();
    app.events_sender_for_test()
        .send(AppEvent::ClipboardWritten { result: Ok(()) })
        .expect("receiver alive");
    app.settle_for_test().await;
    assert!(app.flash_active_for_test());
    assert_eq!(app.status_for_test(), "Copied to clipboard");

    app.tick(now + Duration::from_secs(1));
    assert!(app.flash_active_for_test());
    app.tick(now + Duration::from_secs(5));
    assert!(!app.flash_active_for_test());
    assert_eq!(app.status_for_test(), crate::app::READY_STATUS);
}

#[tokio::test]
async fn yank_copies_focused_value() {
    let fixtures = Fixtures::default();
    let mut app = build_app(&fixtures, UiOptions::default());
    fill_valid_form(&mut app);
    app.handle_key_for_test(ch('k'));
    app.handle_key_for_test(ch('k'));
    app.handle_key_for_test(ch('k'));
    assert_eq!(app.focus_for_test(), Focus::Slot(SlotId::Prompt));
    app.handle_key_for_test(ch('y'));
    app.settle_for_test().await;
    assert_eq!(
        fixtures.clipboard.writes(),
        vec!["add structured logging".to_string()]
    );
}

#[tokio::test]
async fn acme_example_autofills_branches_and_succeeds() {
    let fixtures = Fixtures::default();
    fixtures.runs.push(Ok(Run::new("42")));
    let mut app = build_app(&fixtures, UiOptions::default());
    let registry = app.registry_mut_for_test();
    registry.set(SlotId::Text(crate::form::TextKind::Repository), "acme/app");
    registry.set(SlotId::Prompt, "add logging");

    app.handle_key_for_test(ctrl('s'));
    app.settle_for_test().await;

    assert!(matches!(
        app.submission_for_test(),
        SubmissionState::Success { run } if run.id == "42"
    ));
    let (task, _) = &fixtures.runs.calls()[0];
    assert_eq!(task.source, "main");
    assert!(task.target.starts_with("repobird/"));
    assert!(fixtures.form_store.current().is_none());
    assert!(fixtures.hash_history.entries().is_empty());
}

#[tokio::test]
async fn q_on_error_restores_data_slot_focus() {
    let fixtures = Fixtures::default();
    fixtures.runs.push(Err(ServiceError::remote("boom")));
    let mut app = build_app(&fixtures, UiOptions::default());
    fill_valid_form(&mut app);
    app.handle_key_for_test(ch('j'));
    app.handle_key_for_test(ch('j'));
    let before = app.cursor_for_test();

    app.handle_key_for_test(ctrl('s'));
    app.settle_for_test().await;
    assert!(matches!(app.submission_for_test(), SubmissionState::Error(_)));

    app.handle_key_for_test(ch('q'));
    assert_eq!(app.submission_for_test(), &SubmissionState::Idle);
    assert_eq!(app.cursor_for_test(), before);
    assert!(app.outcome_for_test().is_none());
}

#[tokio::test]
async fn prompt_only_task_file_takes_repository_from_working_copy() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("task.json");
    std::fs::write(&path, r#"{"prompt":"add logging"}"#).expect("write task file");

    let fixtures = Fixtures::default().with_vcs(StaticVcs::new("acme/app", "develop"));
    fixtures.runs.push(Ok(Run::new("42")));
    let mut services = fixtures.services();
    services.config_loader = Arc::new(FileConfigLoader::new());
    let mut app = App::new(services, UiOptions::default(), Handle::current());

    app.load_config(path.clone());
    app.settle_for_test().await;
    assert_eq!(app.registry_for_test().get(SlotId::Prompt), "add logging");
    assert_eq!(app.submission_for_test(), &SubmissionState::Idle);

    app.handle_key_for_test(ctrl('s'));
    app.settle_for_test().await;
    assert!(matches!(
        app.submission_for_test(),
        SubmissionState::Success { run } if run.id == "42"
    ));
    let (task, _) = &fixtures.runs.calls()[0];
    assert_eq!(task.repository, "acme/app");
    assert_eq!(task.source, "develop");
    assert!(
        fixtures
            .hash_history
            .entries()
            .contains_key(&path.display().to_string())
    );
}

#[tokio::test]
async fn created_run_adds_repository_to_history_and_finder() {
    let fixtures = Fixtures::default();
    fixtures.runs.push(Ok(Run::new("42")));
    let mut app = build_app(&fixtures, UiOptions::default());
    fill_valid_form(&mut app);

    app.handle_key_for_test(ctrl('s'));
    app.settle_for_test().await;
    assert_eq!(
        fixtures.repository_history.repositories(),
        vec!["acme/app".to_string()]
    );

    // The cleared form offers the repository again from history.
    app.handle_key_for_test(ch('f'));
    app.handle_key_for_test(key(KeyCode::Enter));
    assert_eq!(
        app.registry_for_test()
            .get(SlotId::Text(crate::form::TextKind::Repository)),
        "acme/app"
    );
}

#[tokio::test]
async fn failed_run_leaves_repository_history_alone() {
    let fixtures = Fixtures::default();
    fixtures.runs.push(Err(ServiceError::remote("boom")));
    let mut app = build_app(&fixtures, UiOptions::default());
    fill_valid_form(&mut app);
    app.handle_key_for_test(ctrl('s'));
    app.settle_for_test().await;
    assert!(fixtures.repository_history.repositories().is_empty());
}

#[tokio::test]
async fn task_file_landing_mid_submission_waits_for_the_result() {
    let fixtures = Fixtures::default();
    fixtures.runs.push(Ok(Run::new("42")));
    let mut app = build_app(&fixtures, UiOptions::default());
    fill_valid_form(&mut app);

    app.handle_key_for_test(ctrl('s'));
    let file_task = Task {
        repository: "acme/web".into(),
        prompt: "from file".into(),
        ..Task::default()
    };
    app.events_sender_for_test()
        .send(AppEvent::ConfigLoaded {
            path: PathBuf::from("a.json"),
            result: Ok((file_task, "aaaa".into())),
        })
        .expect("receiver alive");

    // Queued ahead of the submission result.
    app.settle_for_test().await;
    assert!(matches!(
        app.submission_for_test(),
        SubmissionState::Submitting { token: 1 }
    ));
    assert!(app.registry_for_test().loaded_config().is_none());
    assert_eq!(
        app.registry_for_test().get(SlotId::Prompt),
        "add structured logging"
    );

    app.settle_for_test().await;
    assert!(matches!(
        app.submission_for_test(),
        SubmissionState::Success { run } if run.id == "42"
    ));
    assert!(fixtures.hash_history.entries().is_empty());
    let loaded = app
        .registry_for_test()
        .loaded_config()
        .expect("file applied after the run was created");
    assert_eq!(loaded.file_identity(), "a.json");
    assert_eq!(app.registry_for_test().get(SlotId::Prompt), "from file");
}

#[tokio::test]
async fn task_file_deferred_through_error_panel_applies_on_dismiss() {
    let fixtures = Fixtures::default();
    fixtures.runs.push(Err(ServiceError::remote("boom")));
    let mut app = build_app(&fixtures, UiOptions::default());
    fill_valid_form(&mut app);

    app.handle_key_for_test(ctrl('s'));
    app.settle_for_test().await;
    assert!(matches!(app.submission_for_test(), SubmissionState::Error(_)));

    app.events_sender_for_test()
        .send(AppEvent::ConfigLoaded {
            path: PathBuf::from("b.json"),
            result: Ok((
                Task {
                    prompt: "later".into(),
                    ..Task::default()
                },
                String::new(),
            )),
        })
        .expect("receiver alive");
    app.settle_for_test().await;
    assert!(app.registry_for_test().loaded_config().is_none());

    app.handle_key_for_test(key(KeyCode::Esc));
    assert_eq!(app.submission_for_test(), &SubmissionState::Idle);
    assert_eq!(app.registry_for_test().get(SlotId::Prompt), "later");
    assert_eq!(app.status_for_test(), "Loaded b.json");
}
