use editor_bridge::{
    BridgeConfig, BridgeContext, ColorScheme, HostEvent, HostEventLog, ModelUri, Position,
    SingleEdit, TextRange, Theme, ViewMode,
};
use pretty_assertions::assert_eq;
use std::rc::Rc;

fn setup() -> (Rc<HostEventLog>, BridgeContext) {
    let log = Rc::new(HostEventLog::new());
    let ctx = BridgeContext::new(BridgeConfig::default(), log.clone());
    log.take();
    (log, ctx)
}

fn diff_sides(ctx: &BridgeContext) -> (editor_bridge::SurfaceId, editor_bridge::SurfaceId) {
    match ctx.view() {
        ViewMode::Diff { original, modified } => (original, modified),
        other => panic!("expected diff view, got {other:?}"),
    }
}

fn decoration_ranges(ctx: &BridgeContext) -> Vec<TextRange> {
    ctx.decorations()
        .map(|set| set.iter().map(|(_, decoration)| decoration.range).collect())
        .unwrap_or_default()
}

fn count(events: &[HostEvent], pred: impl Fn(&HostEvent) -> bool) -> usize {
    events.iter().filter(|event| pred(event)).count()
}

#[test]
fn test_new_context_mounts_normal_view() {
    let log = Rc::new(HostEventLog::new());
    let ctx = BridgeContext::new(BridgeConfig::default(), log.clone());

    assert!(matches!(ctx.view(), ViewMode::Normal { .. }));
    assert_eq!(ctx.listener_count(), 1);
    assert_eq!(log.take(), vec![HostEvent::EditorInitialising]);
    assert!(!ctx.normal_surface().unwrap().has_soft_keyboard());
}

#[test]
fn test_view_round_trips_do_not_leak_listeners() {
    let (log, mut ctx) = setup();
    let original = ModelUri::parse("original:///a.txt");
    let modified = ModelUri::parse("/a.txt");
    let edited = ModelUri::parse("/b.txt");

    ctx.create_or_update_model(&edited, "a\nb\nc");
    ctx.provide_baseline(&edited, "a\nb\nc");
    ctx.apply_edits(&edited, &[SingleEdit::new(TextRange::new(2, 1, 2, 2), "B")])
        .unwrap();
    assert_eq!(decoration_ranges(&ctx), vec![TextRange::new(2, 1, 2, 1)]);
    assert_eq!(ctx.decoration_handles().len(), 1);
    log.take();

    let mut retired = Vec::new();
    for _ in 0..2 {
        ctx.enter_diff_view("a\nb", "a\nc", &original, &modified);
        let (left, right) = diff_sides(&ctx);
        assert_eq!(ctx.listener_count(), 2);
        assert_eq!(ctx.surface(left).unwrap().model(), Some(&original));
        assert_eq!(ctx.surface(right).unwrap().model(), Some(&modified));
        assert!(ctx.decoration_handles().is_empty());
        retired.extend([left, right]);

        ctx.exit_diff_view();
        assert!(matches!(ctx.view(), ViewMode::Normal { .. }));
        assert_eq!(ctx.listener_count(), 1);
    }

    assert!(retired.iter().all(|id| ctx.surface(*id).is_none()));
    assert_eq!(ctx.decorations().map(|set| set.len()), Some(0));
    assert!(ctx.decoration_handles().is_empty());
    let events = log.take();
    // Two diff surfaces plus one fresh normal editor per round.
    assert_eq!(
        count(&events, |event| *event == HostEvent::EditorInitialising),
        6
    );

    // The fresh editor renders exactly the current diff, nothing left over from before.
    ctx.set_model(&edited);
    ctx.apply_edits(&edited, &[SingleEdit::new(TextRange::new(3, 1, 3, 2), "C")])
        .unwrap();
    assert_eq!(decoration_ranges(&ctx), vec![TextRange::new(2, 1, 3, 1)]);
    assert_eq!(ctx.decoration_handles().len(), 1);
}

#[test]
fn test_reentering_diff_view_reuses_surfaces() {
    let (log, mut ctx) = setup();
    let original = ModelUri::parse("original:///a.txt");
    let modified = ModelUri::parse("/a.txt");

    ctx.enter_diff_view("a", "b", &original, &modified);
    let sides = diff_sides(&ctx);
    log.take();

    ctx.enter_diff_view("x", "y", &original, &modified);
    assert_eq!(diff_sides(&ctx), sides);
    assert_eq!(ctx.listener_count(), 2);
    assert_eq!(ctx.registry().get(&original).unwrap().value(), "x");
    assert_eq!(ctx.registry().get(&modified).unwrap().value(), "y");
    assert_eq!(
        count(&log.take(), |event| *event == HostEvent::EditorInitialising),
        0
    );
}

#[test]
fn test_normal_view_operations_are_ignored_in_diff_mode() {
    let (log, mut ctx) = setup();
    let original = ModelUri::parse("original:///a.txt");
    let modified = ModelUri::parse("/a.txt");
    ctx.enter_diff_view("a", "b", &original, &modified);
    let runs = ctx.diff_computations();
    log.take();

    ctx.create_or_update_model(&ModelUri::parse("/other.txt"), "x");
    ctx.set_model_content(&modified, "zzz").unwrap();
    ctx.provide_baseline(&modified, "a");

    assert!(!ctx.registry().contains(&ModelUri::parse("/other.txt")));
    assert_eq!(ctx.registry().get(&modified).unwrap().value(), "b");
    assert_eq!(ctx.diff_computations(), runs);
    assert!(ctx.decorations().is_none());
}

#[test]
fn test_cursor_in_diff_view_targets_modified_side() {
    let (log, mut ctx) = setup();
    let original = ModelUri::parse("original:///a.txt");
    let modified = ModelUri::parse("/a.txt");
    ctx.enter_diff_view("a\nb", "a\nb\nc", &original, &modified);
    let (left, right) = diff_sides(&ctx);
    log.take();

    ctx.set_cursor(Position::new(3, 1));
    assert_eq!(ctx.surface(right).unwrap().position(), Position::new(3, 1));
    assert_eq!(ctx.surface(left).unwrap().position(), Position::new(1, 1));
    assert_eq!(
        log.take(),
        vec![HostEvent::CursorPositionChanged {
            column: 1,
            line_number: 3
        }]
    );
}

#[test]
fn test_diff_navigation_wraps() {
    let (_log, mut ctx) = setup();
    let original = ModelUri::parse("original:///nav.txt");
    let modified = ModelUri::parse("/nav.txt");
    ctx.enter_diff_view("a\nb\nc\nd\ne", "a\nB\nc\nd\nE", &original, &modified);
    let (_, right) = diff_sides(&ctx);
    let line = |ctx: &BridgeContext| ctx.surface(right).unwrap().position().line_number;

    assert!(ctx.go_to_next_diff());
    assert_eq!(line(&ctx), 2);
    assert!(ctx.go_to_next_diff());
    assert_eq!(line(&ctx), 5);
    assert!(ctx.go_to_next_diff());
    assert_eq!(line(&ctx), 2);
    assert!(ctx.go_to_previous_diff());
    assert_eq!(line(&ctx), 5);

    ctx.exit_diff_view();
    assert!(!ctx.go_to_next_diff());
}

#[test]
fn test_theme_applies_once_both_slots_are_filled() {
    let (log, mut ctx) = setup();
    let dark = Theme::from_json_str(r##"{"type":"dark","colors":{"editor.background":"#000000"}}"##)
        .unwrap();
    let light = Theme::from_json_str(r##"{"type":"light","colors":{"editor.background":"#ffffff"}}"##)
        .unwrap();

    ctx.apply_theme(dark);
    assert!(log.take().is_empty());

    ctx.apply_theme(light);
    let applied = log.take();
    assert_eq!(applied.len(), 1);
    let HostEvent::ThemeApplied { base, configuration } = &applied[0] else {
        panic!("expected theme application");
    };
    assert_eq!(base, "vs-dark");
    assert_eq!(
        configuration["workbench.colorCustomizations"]["editor.background"],
        "#000000"
    );

    ctx.set_color_scheme(ColorScheme::Dark);
    assert!(log.take().is_empty());
    ctx.set_color_scheme(ColorScheme::Light);
    assert!(matches!(
        log.take().as_slice(),
        [HostEvent::ThemeApplied { base, .. }] if base == "vs"
    ));

    // Every new surface re-applies the theme.
    ctx.enter_diff_view("a", "b", &ModelUri::parse("original:///t"), &ModelUri::parse("/t"));
    let events = log.take();
    assert_eq!(
        count(&events, |event| matches!(event, HostEvent::ThemeApplied { .. })),
        2
    );
}

#[test]
fn test_modal_session_follows_normal_editor() {
    let (log, mut ctx) = setup();
    ctx.toggle_modal_editing(true);
    assert_eq!(
        log.take(),
        vec![HostEvent::ModalModeChanged {
            new_mode: "--NORMAL--".to_string()
        }]
    );
    ctx.toggle_modal_editing(true);
    assert!(log.take().is_empty());

    ctx.modal_mode_changed("visual", Some("linewise"));
    ctx.modal_key_buffer("d");
    assert_eq!(log.take().len(), 2);

    ctx.enter_diff_view("a", "b", &ModelUri::parse("original:///m"), &ModelUri::parse("/m"));
    assert!(ctx.modal().session().is_none());
    log.take();
    ctx.modal_key_buffer("d");
    assert!(log.take().is_empty());

    ctx.exit_diff_view();
    assert!(
        log.take()
            .contains(&HostEvent::ModalModeChanged {
                new_mode: "--NORMAL--".to_string()
            })
    );

    ctx.toggle_modal_editing(false);
    assert!(log.take().is_empty());
    assert!(ctx.modal().session().is_none());
}
