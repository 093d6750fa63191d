use editor_bridge::{
    BridgeConfig, BridgeContext, BridgeError, HostEvent, HostEventLog, MarkerData, MarkerSeverity,
    ModelUri, Position, SingleEdit, TextRange,
};
use pretty_assertions::assert_eq;
use std::rc::Rc;

fn setup() -> (Rc<HostEventLog>, BridgeContext) {
    let log = Rc::new(HostEventLog::new());
    let ctx = BridgeContext::new(BridgeConfig::default(), log.clone());
    log.take();
    (log, ctx)
}

fn content_events(log: &HostEventLog) -> Vec<HostEvent> {
    log.events()
        .into_iter()
        .filter(|event| matches!(event, HostEvent::ContentChanged { .. }))
        .collect()
}

fn marker(line: usize) -> MarkerData {
    MarkerData {
        severity: MarkerSeverity::Warning,
        message: "unused".to_string(),
        source: Some("lint".to_string()),
        code: None,
        start_line_number: line,
        start_column: 1,
        end_line_number: line,
        end_column: 2,
    }
}

#[test]
fn test_create_or_update_is_idempotent() {
    let (_log, mut ctx) = setup();
    let uri = ModelUri::parse("file:///src/lib.rs");

    ctx.create_or_update_model(&uri, "x");
    ctx.create_or_update_model(&ModelUri::parse("/src/lib.rs"), "x");
    assert_eq!(ctx.registry().len(), 1);
    assert_eq!(ctx.registry().get(&uri).unwrap().version(), 1);
    assert_eq!(ctx.registry().get(&uri).unwrap().language_id(), "rust");

    ctx.create_or_update_model(&uri, "y");
    assert_eq!(ctx.registry().len(), 1);
    assert_eq!(ctx.registry().get(&uri).unwrap().value(), "y");
    assert_eq!(ctx.registry().get(&uri).unwrap().version(), 2);
}

#[test]
fn test_rename_carries_undo_history() {
    let (_log, mut ctx) = setup();
    let old = ModelUri::parse("/notes/a.txt");
    let new = ModelUri::parse("/notes/b.md");

    ctx.create_or_update_model(&old, "one");
    ctx.apply_edits(&old, &[SingleEdit::new(TextRange::new(1, 4, 1, 4), " two")])
        .unwrap();
    ctx.rename_model(&old, &new).unwrap();

    assert!(!ctx.registry().contains(&old));
    assert_eq!(ctx.registry().get(&new).unwrap().value(), "one two");
    assert_eq!(ctx.registry().get(&new).unwrap().language_id(), "markdown");
    assert_eq!(ctx.active_model(), Some(&new));

    assert!(ctx.undo(&new));
    assert_eq!(ctx.registry().get(&new).unwrap().value(), "one");
}

#[test]
fn test_rename_edge_cases() {
    let (_log, mut ctx) = setup();
    let a = ModelUri::parse("/a.txt");
    let b = ModelUri::parse("/b.txt");

    ctx.rename_model(&a, &b).unwrap();
    assert!(ctx.registry().is_empty());

    ctx.create_or_update_model(&a, "a");
    ctx.create_or_update_model(&b, "b");
    assert!(matches!(
        ctx.rename_model(&a, &b),
        Err(BridgeError::ModelAlreadyExists(_))
    ));
    assert_eq!(ctx.registry().get(&a).unwrap().value(), "a");
}

#[test]
fn test_set_content_on_active_model_is_an_undoable_edit() {
    let (log, mut ctx) = setup();
    let uri = ModelUri::parse("/a.txt");
    ctx.create_or_update_model(&uri, "before");
    log.take();

    ctx.set_model_content(&uri, "after").unwrap();
    assert_eq!(content_events(&log).len(), 1);
    assert!(ctx.undo(&uri));
    assert_eq!(ctx.registry().get(&uri).unwrap().value(), "before");
}

#[test]
fn test_set_content_on_background_model_is_a_silent_flush() {
    let (log, mut ctx) = setup();
    let background = ModelUri::parse("/bg.txt");
    let active = ModelUri::parse("/fg.txt");
    ctx.create_or_update_model(&background, "old");
    ctx.create_or_update_model(&active, "fg");
    log.take();

    ctx.set_model_content(&background, "new").unwrap();
    assert_eq!(ctx.registry().get(&background).unwrap().value(), "new");
    assert!(!ctx.undo(&background));
    assert!(log.events().is_empty());

    ctx.set_model_content(&ModelUri::parse("/missing.txt"), "x")
        .unwrap();
    assert_eq!(ctx.registry().len(), 2);
}

#[test]
fn test_content_changed_uses_intersection_span() {
    let (log, mut ctx) = setup();
    let uri = ModelUri::parse("file:///span.txt");
    ctx.create_or_update_model(&uri, "aaa\nbbb\nccc");
    log.take();

    ctx.apply_edits(
        &uri,
        &[
            SingleEdit::new(TextRange::new(1, 1, 1, 2), "X"),
            SingleEdit::new(TextRange::new(3, 1, 3, 2), "Y"),
        ],
    )
    .unwrap();

    // Start is the largest start line (3) and end the smallest end line (1).
    assert_eq!(
        content_events(&log),
        vec![HostEvent::ContentChanged {
            version_id: 2,
            uri: "file:///span.txt".to_string(),
            current_content: "Xaa\nbbb\nYcc".to_string(),
            start_offset: 8,
            end_offset: 2,
        }]
    );
}

#[test]
fn test_content_changed_single_line_span() {
    let (log, mut ctx) = setup();
    let uri = ModelUri::parse("/span.txt");
    ctx.create_or_update_model(&uri, "aaa\nbbb\nccc");
    log.take();

    ctx.apply_edits(&uri, &[SingleEdit::new(TextRange::new(2, 2, 2, 3), "Z")])
        .unwrap();
    let events = content_events(&log);
    let HostEvent::ContentChanged {
        start_offset,
        end_offset,
        ..
    } = &events[0]
    else {
        panic!("expected a content notification");
    };
    assert_eq!((*start_offset, *end_offset), (4, 6));
}

#[test]
fn test_view_state_is_restored_on_switch_back() {
    let (log, mut ctx) = setup();
    let a = ModelUri::parse("/a.txt");
    let b = ModelUri::parse("/b.txt");

    ctx.create_or_update_model(&a, "a\nbb\nccc");
    ctx.set_cursor(Position::new(2, 2));
    ctx.create_or_update_model(&b, "b");
    assert_eq!(ctx.normal_surface().unwrap().position(), Position::new(1, 1));
    log.take();

    ctx.set_model(&a);
    assert_eq!(ctx.normal_surface().unwrap().position(), Position::new(2, 2));
    assert_eq!(
        log.take(),
        vec![
            HostEvent::DiffUpdateRequested {
                uri: a.to_string()
            },
            HostEvent::CursorPositionChanged {
                column: 2,
                line_number: 2
            },
        ]
    );
}

#[test]
fn test_set_model_for_missing_uri_is_noop() {
    let (log, mut ctx) = setup();
    ctx.set_model(&ModelUri::parse("/ghost.txt"));
    assert!(ctx.active_model().is_none());
    assert!(log.events().is_empty());
}

#[test]
fn test_cursor_is_clamped() {
    let (log, mut ctx) = setup();
    let uri = ModelUri::parse("/a.txt");
    ctx.create_or_update_model(&uri, "abc");
    log.take();

    ctx.set_cursor(Position::new(9, 9));
    assert_eq!(
        log.take(),
        vec![HostEvent::CursorPositionChanged {
            column: 4,
            line_number: 1
        }]
    );
}

#[test]
fn test_dispose_clears_only_bridge_markers() {
    let (log, mut ctx) = setup();
    let a = ModelUri::parse("/a.rs");
    let b = ModelUri::parse("/b.rs");
    ctx.create_or_update_model(&b, "b");
    ctx.create_or_update_model(&a, "a");
    ctx.set_model_markers("code.app.native", &a, vec![marker(1)]);
    ctx.set_model_markers("rust", &a, vec![marker(1)]);
    ctx.set_model_markers("code.app.native", &b, vec![marker(1)]);
    log.take();

    ctx.dispose_model(&a);
    assert!(!ctx.registry().contains(&a));
    assert!(ctx.active_model().is_none());

    let remaining = ctx.markers().all();
    assert_eq!(remaining.len(), 2);
    assert!(
        remaining
            .iter()
            .all(|m| m.resource == b || m.owner == "rust")
    );

    let updates: Vec<HostEvent> = log
        .take()
        .into_iter()
        .filter(|event| matches!(event, HostEvent::MarkersUpdated { .. }))
        .collect();
    assert_eq!(updates.len(), 1);

    ctx.dispose_model(&a);
    assert!(log.events().is_empty());
}

#[test]
fn test_focus_and_links() {
    let (log, mut ctx) = setup();
    ctx.input_focused();
    assert!(log.events().is_empty());

    ctx.create_or_update_model(&ModelUri::parse("/a.txt"), "a");
    log.take();
    ctx.input_focused();
    ctx.open_link("https://example.com");
    assert_eq!(
        log.take(),
        vec![
            HostEvent::Focus,
            HostEvent::OpenExternalUrl {
                url: "https://example.com".to_string()
            },
        ]
    );
}

#[test]
fn test_reported_uri_names_the_same_model() {
    let (log, mut ctx) = setup();
    ctx.create_or_update_model(&ModelUri::parse("file:///a%2541.txt"), "a");

    let reported = log
        .take()
        .into_iter()
        .find_map(|event| match event {
            HostEvent::DiffUpdateRequested { uri } => Some(uri),
            _ => None,
        })
        .unwrap();
    assert_eq!(reported, "file:///a%2541.txt");

    let uri = ModelUri::parse(&reported);
    assert!(ctx.registry().contains(&uri));
    assert_eq!(ctx.active_model(), Some(&uri));

    ctx.provide_baseline(&uri, "a\nb");
    assert_eq!(ctx.decorations().map(|set| set.len()), Some(1));
}

#[test]
fn test_folded_lines_follow_the_model() {
    let (_log, mut ctx) = setup();
    let a = ModelUri::parse("/a.txt");
    let b = ModelUri::parse("/b.txt");

    ctx.create_or_update_model(&a, "1\n2\n3\n4");
    ctx.set_folded_lines(vec![3, 1, 1, 99, 0]);
    assert_eq!(ctx.normal_surface().unwrap().folded_lines(), &[1, 3]);

    ctx.create_or_update_model(&b, "x");
    assert!(ctx.normal_surface().unwrap().folded_lines().is_empty());
    assert_eq!(ctx.view_state(&a).unwrap().folded_lines, vec![1, 3]);

    ctx.set_model(&a);
    assert_eq!(ctx.normal_surface().unwrap().folded_lines(), &[1, 3]);
}
