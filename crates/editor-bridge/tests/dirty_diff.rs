use editor_bridge::{
    BridgeConfig, BridgeContext, HostEvent, HostEventLog, MAX_COLUMN, ModelDecoration, ModelUri,
    SingleEdit, TextRange,
};
use pretty_assertions::assert_eq;
use std::rc::Rc;

fn setup() -> (Rc<HostEventLog>, BridgeContext) {
    let log = Rc::new(HostEventLog::new());
    let ctx = BridgeContext::new(BridgeConfig::default(), log.clone());
    log.take();
    (log, ctx)
}

fn decorations(ctx: &BridgeContext) -> Vec<ModelDecoration> {
    ctx.decorations()
        .map(|set| set.iter().map(|(_, decoration)| decoration.clone()).collect())
        .unwrap_or_default()
}

fn summary(ctx: &BridgeContext) -> Vec<(String, TextRange)> {
    decorations(ctx)
        .into_iter()
        .map(|decoration| {
            (
                decoration.options.lines_decorations_class_name,
                decoration.range,
            )
        })
        .collect()
}

#[test]
fn test_inserted_line_is_marked_added() {
    let (_log, mut ctx) = setup();
    let uri = ModelUri::parse("/a.txt");
    ctx.create_or_update_model(&uri, "a\nx\nb");
    ctx.provide_baseline(&uri, "a\nb");

    assert_eq!(
        summary(&ctx),
        vec![("addedBackground".to_string(), TextRange::new(2, 1, 2, 1))]
    );
    let decoration = &decorations(&ctx)[0];
    assert!(decoration.options.is_whole_line);
    assert_eq!(decoration.options.minimap.as_ref().unwrap().color, "#81b88b");
}

#[test]
fn test_removed_line_is_marked_after_previous_line() {
    let (_log, mut ctx) = setup();
    let uri = ModelUri::parse("/a.txt");
    ctx.create_or_update_model(&uri, "a\nc");
    ctx.provide_baseline(&uri, "a\nb\nc");

    assert_eq!(
        summary(&ctx),
        vec![(
            "deletedBackground".to_string(),
            TextRange::new(1, MAX_COLUMN, 1, MAX_COLUMN)
        )]
    );
    assert!(!decorations(&ctx)[0].options.is_whole_line);
}

#[test]
fn test_changed_lines_are_marked_modified() {
    let (_log, mut ctx) = setup();
    let uri = ModelUri::parse("/a.txt");
    ctx.create_or_update_model(&uri, "a\nB\nC\nd");
    ctx.provide_baseline(&uri, "a\nb\nc\nd");

    assert_eq!(
        summary(&ctx),
        vec![("modifiedBackground".to_string(), TextRange::new(2, 1, 3, 1))]
    );
}

#[test]
fn test_identical_baseline_renders_nothing() {
    let (_log, mut ctx) = setup();
    let uri = ModelUri::parse("/a.txt");
    ctx.create_or_update_model(&uri, "same\ntext");
    ctx.provide_baseline(&uri, "same\ntext");

    assert_eq!(ctx.diff_computations(), 1);
    assert!(summary(&ctx).is_empty());
}

#[test]
fn test_edits_replace_previous_render() {
    let (_log, mut ctx) = setup();
    let uri = ModelUri::parse("/a.txt");
    ctx.create_or_update_model(&uri, "a\nb\nc");
    ctx.provide_baseline(&uri, "a\nb\nc");

    ctx.apply_edits(&uri, &[SingleEdit::new(TextRange::new(2, 1, 2, 2), "B")])
        .unwrap();
    assert_eq!(
        summary(&ctx),
        vec![("modifiedBackground".to_string(), TextRange::new(2, 1, 2, 1))]
    );

    assert!(ctx.undo(&uri));
    assert!(summary(&ctx).is_empty());
    assert_eq!(ctx.diff_computations(), 3);
}

#[test]
fn test_invalidate_then_rerender() {
    let (_log, mut ctx) = setup();
    let uri = ModelUri::parse("/a.txt");
    ctx.create_or_update_model(&uri, "a\nx\nb\nc");
    ctx.provide_baseline(&uri, "a\nb\nc");
    assert_eq!(summary(&ctx).len(), 1);

    ctx.invalidate_decorations();
    assert!(summary(&ctx).is_empty());

    ctx.apply_edits(&uri, &[SingleEdit::new(TextRange::new(4, 2, 4, 2), "!")])
        .unwrap();
    assert_eq!(
        summary(&ctx),
        vec![
            ("addedBackground".to_string(), TextRange::new(2, 1, 2, 1)),
            ("modifiedBackground".to_string(), TextRange::new(4, 1, 4, 1)),
        ]
    );
    assert_eq!(ctx.diff_computations(), 2);
}

#[test]
fn test_flush_rerenders_without_content_notification() {
    let (log, mut ctx) = setup();
    let uri = ModelUri::parse("/a.txt");
    ctx.create_or_update_model(&uri, "a\nb");
    ctx.provide_baseline(&uri, "a\nb");
    log.take();

    ctx.create_or_update_model(&uri, "a\nb\nc");
    assert_eq!(ctx.diff_computations(), 2);
    assert_eq!(
        summary(&ctx),
        vec![("addedBackground".to_string(), TextRange::new(3, 1, 3, 1))]
    );
    assert!(
        !log.take()
            .iter()
            .any(|event| matches!(event, HostEvent::ContentChanged { .. }))
    );
}

#[test]
fn test_baseline_for_background_model_is_not_rendered() {
    let (_log, mut ctx) = setup();
    let background = ModelUri::parse("/bg.txt");
    let active = ModelUri::parse("/fg.txt");
    ctx.create_or_update_model(&background, "x\ny");
    ctx.create_or_update_model(&active, "fg");

    ctx.provide_baseline(&background, "x");
    assert_eq!(ctx.diff_computations(), 0);
    assert!(summary(&ctx).is_empty());

    // Baselines live in their own plaintext models.
    let baseline = background.baseline(&ctx.config().baseline_prefix);
    assert_eq!(ctx.registry().get(&baseline).unwrap().value(), "x");
    assert_eq!(ctx.registry().get(&baseline).unwrap().language_id(), "plaintext");
}

#[test]
fn test_switching_models_clears_decorations() {
    let (_log, mut ctx) = setup();
    let a = ModelUri::parse("/a.txt");
    let b = ModelUri::parse("/b.txt");
    ctx.create_or_update_model(&a, "a\nx");
    ctx.provide_baseline(&a, "a");
    assert_eq!(summary(&ctx).len(), 1);

    ctx.create_or_update_model(&b, "b");
    assert!(summary(&ctx).is_empty());

    // Editing the now-hidden model does not paint over the visible one.
    ctx.apply_edits(&a, &[SingleEdit::new(TextRange::new(1, 1, 1, 1), "z")])
        .unwrap();
    assert!(summary(&ctx).is_empty());
}

#[test]
fn test_whitespace_only_changes_are_ignored_by_default() {
    let (_log, mut ctx) = setup();
    let uri = ModelUri::parse("/a.txt");
    ctx.create_or_update_model(&uri, "  a\nb\t");
    ctx.provide_baseline(&uri, "a\nb");
    assert!(summary(&ctx).is_empty());

    let log = Rc::new(HostEventLog::new());
    let config = BridgeConfig {
        ignore_trim_whitespace: false,
        ..BridgeConfig::default()
    };
    let mut strict = BridgeContext::new(config, log);
    strict.create_or_update_model(&uri, "  a\nb\t");
    strict.provide_baseline(&uri, "a\nb");
    assert_eq!(
        summary(&strict),
        vec![("modifiedBackground".to_string(), TextRange::new(1, 1, 2, 1))]
    );
}
