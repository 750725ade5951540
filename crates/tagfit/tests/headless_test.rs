#![cfg(feature = "render")]

use std::rc::Rc;
use tagfit::render::{HeadlessError, RenderOptions, RenderState, render_headless};
use tagfit::{RecordingHost, StageOptions, TracingHost};

const TAGS: &str = include_str!("../../../fixtures/countdown/tags.json");

#[test]
fn headless_render_of_the_countdown() {
    let host = Rc::new(RecordingHost::with_params([
        ("seconds", "43"),
        ("hours", "9"),
        ("minutes", "05"),
    ]));
    let (doc, session) = render_headless(
        TAGS,
        None,
        host.clone(),
        &StageOptions::default(),
        RenderOptions::default(),
    )
    .unwrap();

    assert_eq!(session.state(), RenderState::Rendered);
    let minutes = session.find_tag("t-minutes").unwrap();
    let el = session.tree().element(minutes, &doc).unwrap();
    assert_eq!(doc.inner_html(el), "05");
    assert!(host.logs().is_empty());
    assert_eq!(host.awaited_assets().len(), 2);
}

#[test]
fn bad_options_are_a_core_error() {
    let err = render_headless(
        TAGS,
        Some("{"),
        Rc::new(RecordingHost::new()),
        &StageOptions::default(),
        RenderOptions::default(),
    )
    .err()
    .unwrap();
    assert!(matches!(err, HeadlessError::Core(_)));
}

#[test]
fn headless_render_with_the_tracing_host() {
    let params = tagfit::host::params_from_query("seconds=7&hours=8&minutes=9");
    let (doc, session) = render_headless(
        TAGS,
        None,
        Rc::new(TracingHost::new(params)),
        &StageOptions::default(),
        RenderOptions::default(),
    )
    .unwrap();

    assert_eq!(session.state(), RenderState::Rendered);
    let seconds = session.find_tag("t-seconds").unwrap();
    let el = session.tree().element(seconds, &doc).unwrap();
    assert_eq!(doc.inner_html(el), "7");
    assert_eq!(session.assets().len(), 2);
}
