//! Rendering of builder output against known query strings.

// Integration tests live outside cfg(test) by design
#![allow(clippy::tests_outside_test_module)]

use sift::{Defaults, QueryBuilder};

fn builder() -> QueryBuilder {
    QueryBuilder::with_defaults(&Defaults::standard())
}

fn expect(builder: &QueryBuilder, expected: &str) {
    assert_eq!(builder.to_string(), expected);
}

#[test]
fn terms_under_must() {
    let mut b = builder();
    b.match_term("foo", "bar").match_term("baz", "boo");
    expect(&b, "+foo:bar +baz:boo");
}

#[test]
fn mode_switch_affects_later_clauses_only() {
    let mut b = builder();
    b.match_term("foo", "bar")
        .optionally_match()
        .match_term("baz", "boo");
    expect(&b, "+foo:bar baz:boo");

    let mut b = builder();
    b.match_term("foo", "bar").exclude().match_term("baz", "boo");
    expect(&b, "+foo:bar -baz:boo");

    let mut b = builder();
    b.match_term("foo", "bar")
        .exclude()
        .match_term("baz", "boo")
        .match_term("fee", "fum");
    expect(&b, "+foo:bar -baz:boo -fee:fum");
}

#[test]
fn single_term() {
    let mut b = builder();
    b.match_term("foo", "bar");
    expect(&b, "+foo:bar");
}

#[test]
fn all_terms() {
    let mut b = builder();
    b.match_all_terms("foo", "bar,baz".split(','));
    expect(&b, "+(+foo:bar +foo:baz)");

    let mut b = builder();
    b.match_all_terms("foo", "bar,baz,boo".split(','));
    expect(&b, "+(+foo:bar +foo:baz +foo:boo)");
}

#[test]
fn any_term() {
    let mut b = builder();
    b.match_any_term("foo", ["bar", "baz"]);
    expect(&b, "+(foo:bar foo:baz)");

    let mut b = builder();
    b.match_any_term("foo", ["bar", "baz", "boo"]);
    expect(&b, "+(foo:bar foo:baz foo:boo)");
}

#[test]
fn none_of_terms() {
    let mut b = builder();
    b.match_none_of_terms("foo", ["bar", "baz"]);
    expect(&b, "+(-foo:bar -foo:baz)");

    let mut b = builder();
    b.match_none_of_terms("foo", ["bar", "baz", "boo"]);
    expect(&b, "+(-foo:bar -foo:baz -foo:boo)");
}

#[test]
fn empty_collections_are_noops() {
    let mut b = builder();
    b.match_all_terms("foo", Vec::<&str>::new())
        .match_all_terms("foo", None::<&str>)
        .match_any_term("foo", Vec::<String>::new())
        .match_none_of_terms("foo", None::<String>);
    assert!(b.is_empty());
    expect(&b, "");
}

#[test]
fn sub_query() {
    let mut b = builder();
    b.match_term("foo", "bar").match_sub_query(|s| {
        s.optionally_match()
            .match_term("fee", "fum")
            .match_term("lee", "da")
    });
    expect(&b, "+foo:bar +(fee:fum lee:da)");
}

#[test]
fn for_each_preserves_order() {
    let mut b = builder();
    b.for_each(["bar", "baz", "blip"], |v, b| b.match_term("foo", v));
    expect(&b, "+foo:bar +foo:baz +foo:blip");
}

#[test]
fn parsed_input_plain_term() {
    let mut b = builder();
    b.match_parsed_input("foo", "bar", None).unwrap();
    expect(&b, "+foo:bar");
}

#[test]
fn parsed_input_explicit_field() {
    let mut b = builder();
    b.match_parsed_input("foo", "bar:bap", None).unwrap();
    expect(&b, "+bar:bap");
}

#[test]
fn parsed_input_operator_word_falls_back() {
    let mut b = builder();
    b.match_parsed_input("foo", "AND what", None).unwrap();
    expect(&b, "+(foo:what)");
}

#[test]
fn parsed_input_metacharacters_fall_back() {
    let mut b = builder();
    b.match_parsed_input("foo", "wh^addaya(mean", None).unwrap();
    expect(&b, "+foo:\"wh addaya mean\"");
}

#[test]
fn build_is_idempotent() {
    let mut b = builder();
    b.match_term("foo", "bar")
        .optionally_match()
        .match_sub_query(|s| s.match_term("a", "b"));
    let first = b.build();
    let second = b.build();
    assert_eq!(first, second);
    assert_eq!(first.to_string(), second.to_string());
}
