//! Save-then-load round trips.
//!
//! A tree written by the saver and read back by the loader must have the
//! same node variants, values, text tokens and whitespace flags in the same
//! order.

#![allow(clippy::unwrap_used)]

use std::iter;

use minixml::parser::{load_str_with_options, ParseOptions, TypeAttributeClassifier};
use minixml::serial::{save, save_to_string, SaveOptions};
use minixml::{Document, NodeId, NodeKind};
use pretty_assertions::assert_eq;

const FIXTURE: &str = include_str!("fixtures/test.xml");

/// One line per node in document order.
fn signature(doc: &Document, top: NodeId) -> Vec<String> {
    iter::once(top)
        .chain(doc.descendants(top))
        .map(|id| match doc.kind(id) {
            NodeKind::Element { name, attributes } => {
                let attrs: Vec<String> = attributes
                    .iter()
                    .map(|a| format!("{}={:?}", a.name, a.value))
                    .collect();
                format!("element {name} [{}]", attrs.join(" "))
            }
            NodeKind::Integer { value } => format!("integer {value}"),
            NodeKind::Real { value } => format!("real {value}"),
            NodeKind::Opaque { content } => format!("opaque {content:?}"),
            NodeKind::Text {
                whitespace,
                content,
            } => format!("text {whitespace} {content:?}"),
        })
        .collect()
}

fn typed() -> ParseOptions {
    ParseOptions::default().classifier(TypeAttributeClassifier)
}

fn reload(doc: &Document, root: NodeId, save_opts: &SaveOptions) -> Document {
    let saved = save_to_string(doc, root, save_opts).unwrap();
    load_str_with_options(&saved, &typed()).unwrap()
}

#[test]
fn test_constructed_tree_survives_save_and_load() {
    let mut doc = Document::new();
    let root = doc.new_element(None, "record").unwrap();
    doc.set_attribute(root, "title", "Fish & \"Chips\" <2>").unwrap();

    let count = doc.new_element(Some(root), "integer").unwrap();
    doc.new_integer(Some(count), -42).unwrap();

    let price = doc.new_element(Some(root), "value").unwrap();
    doc.set_attribute(price, "type", "real").unwrap();
    doc.new_real(Some(price), 3.25).unwrap();

    let code = doc.new_element(Some(root), "pre").unwrap();
    doc.new_opaque(Some(code), "  keep   this\n  as is").unwrap();

    let para = doc.new_element(Some(root), "para").unwrap();
    doc.new_text(Some(para), true, "Hello,").unwrap();
    doc.new_text(Some(para), true, "a&b").unwrap();
    let em = doc.new_element(Some(para), "em").unwrap();
    doc.new_text(Some(em), false, "big").unwrap();
    doc.new_text(Some(para), false, "!").unwrap();
    doc.new_text(Some(para), true, "<end>").unwrap();
    doc.new_element(Some(para), "br").unwrap();

    let before = signature(&doc, root);
    let loaded = reload(&doc, root, &SaveOptions::default());
    assert_eq!(signature(&loaded, loaded.root().unwrap()), before);
}

#[test]
fn test_round_trip_without_self_close_and_wrapping() {
    let mut doc = Document::new();
    let root = doc.new_element(None, "p").unwrap();
    for (i, word) in "the quick brown fox jumps over the lazy dog again and again and again"
        .split(' ')
        .enumerate()
    {
        doc.new_text(Some(root), i > 0, word).unwrap();
    }
    doc.new_element(Some(root), "empty").unwrap();

    let opts = SaveOptions::default().self_close(false).wrap(Some(20));
    let saved = save_to_string(&doc, root, &opts).unwrap();
    assert!(saved.contains("<empty></empty>"));
    assert!(saved.lines().count() > 1, "{saved}");

    let loaded = load_str_with_options(&saved, &typed()).unwrap();
    assert_eq!(
        signature(&loaded, loaded.root().unwrap()),
        signature(&doc, root)
    );
}

#[test]
fn test_fixture_round_trip_is_stable() {
    let doc = load_str_with_options(FIXTURE, &typed()).unwrap();
    let root = doc.root().unwrap();

    let once = reload(&doc, root, &SaveOptions::default());
    assert_eq!(signature(&once, once.root().unwrap()), signature(&doc, root));

    let first = save_to_string(&once, once.root().unwrap(), &SaveOptions::default()).unwrap();
    let twice = reload(&once, once.root().unwrap(), &SaveOptions::default());
    let second = save_to_string(&twice, twice.root().unwrap(), &SaveOptions::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_fixture_typed_leaves() {
    let doc = load_str_with_options(FIXTURE, &typed()).unwrap();
    let sig = signature(&doc, doc.root().unwrap());
    assert!(sig.contains(&"real 10".to_string()), "{sig:#?}");
    assert!(sig.contains(&"integer 123".to_string()), "{sig:#?}");
    assert!(
        sig.contains(&"opaque \"&lt;&lt;/MediaPosition 0&gt;&gt;setpagedevice\"".to_string()),
        "{sig:#?}"
    );
    assert!(sig.contains(&"text true \"country.\"".to_string()), "{sig:#?}");
}

#[test]
fn test_save_streams_same_bytes_as_string() {
    let doc = load_str_with_options(FIXTURE, &typed()).unwrap();
    let root = doc.root().unwrap();
    let opts = SaveOptions::default();

    let mut bytes = Vec::new();
    save(&doc, root, &mut bytes, &opts).unwrap();
    assert_eq!(
        String::from_utf8(bytes).unwrap(),
        save_to_string(&doc, root, &opts).unwrap()
    );
}

#[test]
fn test_append_order_preserved() {
    let mut doc = Document::new();
    let root = doc.new_element(None, "mixed").unwrap();
    let expected = vec![
        doc.new_text(Some(root), false, "one").unwrap(),
        doc.new_integer(Some(root), 2).unwrap(),
        doc.new_element(Some(root), "three").unwrap(),
        doc.new_real(Some(root), 4.5).unwrap(),
        doc.new_opaque(Some(root), "five").unwrap(),
        doc.new_text(Some(root), true, "six").unwrap(),
    ];
    assert_eq!(doc.children(root).collect::<Vec<_>>(), expected);
    assert_eq!(doc.first_child(root), expected.first().copied());
    assert_eq!(doc.last_child(root), expected.last().copied());
}

#[test]
fn test_adjacent_tokens_without_whitespace_stay_separate() {
    let mut doc = Document::new();
    let root = doc.new_element(None, "group").unwrap();
    let p = doc.new_element(Some(root), "p").unwrap();
    doc.new_text(Some(p), false, "a").unwrap();
    doc.new_text(Some(p), false, "b").unwrap();
    let pre = doc.new_element(Some(root), "pre").unwrap();
    doc.new_opaque(Some(pre), "one ").unwrap();
    doc.new_opaque(Some(pre), " two").unwrap();

    let loaded = reload(&doc, root, &SaveOptions::default());
    let loaded_p = loaded.first_child(loaded.root().unwrap()).unwrap();
    assert_eq!(loaded.children(loaded_p).count(), 2);
    assert_eq!(signature(&loaded, loaded.root().unwrap()), signature(&doc, root));
}

#[test]
fn test_tokens_split_by_deleted_element_stay_separate() {
    let mut doc = load_str_with_options("<p>a<tag/>b</p>", &typed()).unwrap();
    let p = doc.root().unwrap();
    let tag = doc.find_element(p, p, Some("tag"), None, None, true.into()).unwrap();
    doc.delete(tag);
    assert_eq!(doc.children(p).count(), 2);

    let loaded = reload(&doc, p, &SaveOptions::default());
    assert_eq!(signature(&loaded, loaded.root().unwrap()), signature(&doc, p));
}

#[test]
fn test_several_numbers_in_one_element_do_not_reload() {
    let mut doc = Document::new();
    let root = doc.new_element(None, "integer").unwrap();
    doc.new_integer(Some(root), 1).unwrap();
    doc.new_integer(Some(root), 2).unwrap();

    let saved = save_to_string(&doc, root, &SaveOptions::default()).unwrap();
    assert_eq!(saved, "<integer>1 2</integer>\n");
    let err = load_str_with_options(&saved, &typed()).unwrap_err();
    assert!(err.message.contains("invalid integer value '1 2'"), "{}", err.message);
}
