use rstest::rstest;

use super::*;

fn name(s: &str) -> Segment {
    Segment::Name(s.into())
}

#[test]
fn parse_mixed_tokens() {
    let p = AccessPath::parse(r#"devices.device_proxies["Laser A"].power"#);
    assert_eq!(
        p.segments(),
        [
            name("devices"),
            name("device_proxies"),
            name("Laser A"),
            name("power")
        ]
    );
}

#[test]
fn parse_indices_and_single_quotes() {
    let p = AccessPath::parse("scans[2].points[0.5]['x.y']");
    assert_eq!(
        p.segments(),
        [
            name("scans"),
            Segment::Number(2.0),
            name("points"),
            Segment::Number(0.5),
            name("x.y"),
        ]
    );
}

#[rstest]
#[case("")]
#[case("...")]
#[case("[]")]
fn parse_without_tokens(#[case] input: &str) {
    assert!(AccessPath::parse(input).is_empty());
}

#[rstest]
#[case(Segment::Number(3.0), Some(3))]
#[case(Segment::Number(1.5), None)]
#[case(name("4"), Some(4))]
#[case(name("04"), None)]
#[case(name("x"), None)]
fn index_of_segment(#[case] seg: Segment, #[case] expected: Option<usize>) {
    assert_eq!(seg.as_index(), expected);
}

#[rstest]
#[case(Segment::Number(3.0), "3")]
#[case(Segment::Number(1.5), "1.5")]
#[case(name("a b"), "a b")]
fn key_of_segment(#[case] seg: Segment, #[case] expected: &str) {
    assert_eq!(seg.as_key(), expected);
}

#[test]
fn display_is_canonical() {
    let p: AccessPath = r#"a.b['c d'][1].e"#.parse().unwrap();
    assert_eq!(p.to_string(), r#"a.b["c d"][1].e"#);
    assert_eq!(p.len(), 5);
}
