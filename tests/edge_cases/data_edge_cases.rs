//! Edge case tests for data-related scenarios

use crate::common::assertions::flag_pairs;
use crate::common::{plan, CliTestRunner, TestFixture};
use tabmerge::{TabmergeError, Value};

#[test]
fn test_csv_with_duplicate_headers() {
    let fixture = TestFixture::new().unwrap();
    let a = fixture.create_raw("a.csv", "id,name,name\n1,x,y\n").unwrap();
    let b = fixture.create_raw("b.csv", "id,name\n1,x\n").unwrap();

    let err = fixture.session(&[a, b]).unwrap_err();
    assert!(matches!(err, TabmergeError::ColumnCollision { ref column, .. } if column == "name"));
}

#[test]
fn test_empty_file_has_no_header() {
    let fixture = TestFixture::new().unwrap();
    let a = fixture.create_raw("a.csv", "").unwrap();
    let b = fixture.create_raw("b.csv", "id\n1\n").unwrap();

    let err = fixture.session(&[a, b]).unwrap_err();
    assert!(matches!(err, TabmergeError::Decode { .. }));
}

#[test]
fn test_header_only_reference() {
    let fixture = TestFixture::new().unwrap();
    let a = fixture.create_raw("a.csv", "id,price\n").unwrap();
    let b = fixture.create_raw("b.csv", "id,price\n1,5\n2,\n").unwrap();

    let outcome = fixture
        .session(&[a, b])
        .unwrap()
        .compare(&plan(&["a:id"], &["price"], &[]))
        .unwrap();

    assert_eq!(outcome.summary.reference_rows, 0);
    assert_eq!(outcome.summary.introduced_rows, 2);
    assert_eq!(flag_pairs(&outcome.flags), vec![(0, "price_b".to_string())]);
}

#[test]
fn test_crlf_line_endings() {
    let fixture = TestFixture::new().unwrap();
    let a = fixture.create_raw("a.csv", "id,price\r\n1,5\r\n").unwrap();
    let b = fixture.create_raw("b.csv", "id,price\n1,6\n").unwrap();

    let outcome = fixture
        .session(&[a, b])
        .unwrap()
        .compare(&plan(&["a:id"], &["price"], &[]))
        .unwrap();
    assert_eq!(outcome.merged.table().column_names(), vec!["id", "price", "price_b"]);
    assert!(outcome.flags.is_flagged(0, "price_b"));
}

#[test]
fn test_duplicate_key_within_dataset() {
    let fixture = TestFixture::new().unwrap();
    let a = fixture.create_raw("a.csv", "id,price\n1,5\n2,6\n").unwrap();
    let b = fixture.create_raw("b.csv", "id,price\n1,5\n1,7\n").unwrap();

    let err = fixture
        .session(&[a, b])
        .unwrap()
        .compare(&plan(&["a:id"], &["price"], &[]))
        .unwrap_err();
    assert!(matches!(err, TabmergeError::DuplicateKey { ref dataset, ref key }
        if dataset == "b" && key == "id=1"));
}

#[test]
fn test_absent_keys_join_each_other() {
    let fixture = TestFixture::new().unwrap();
    let a = fixture.create_raw("a.csv", "id,price\n,5\n1,6\n").unwrap();
    let b = fixture.create_raw("b.csv", "id,price\nNA,9\n").unwrap();

    let outcome = fixture
        .session(&[a, b])
        .unwrap()
        .compare(&plan(&["a:id"], &["price"], &[]))
        .unwrap();
    assert_eq!(outcome.merged.row_count(), 2);
    assert_eq!(outcome.merged.get(0, "price_b"), Some(&Some(Value::Int(9))));
    assert!(outcome.flags.is_flagged(0, "price_b"));
}

#[test]
fn test_generated_name_collides_with_reference_column() {
    let fixture = TestFixture::new().unwrap();
    let a = fixture.create_raw("a.csv", "id,price,price_b\n1,5,5\n").unwrap();
    let b = fixture.create_raw("b.csv", "id,price,price_b\n1,5,5\n").unwrap();

    let err = fixture
        .session(&[a, b])
        .unwrap()
        .compare(&plan(&["a:id"], &["price", "price_b"], &[]))
        .unwrap_err();
    assert!(matches!(err, TabmergeError::ColumnCollision { ref column, .. } if column == "price_b"));
}

#[test]
fn test_two_native_columns_onto_one_canonical() {
    let fixture = TestFixture::new().unwrap();
    let a = fixture.create_raw("a.csv", "ID,price\n1,5\n").unwrap();
    let b = fixture.create_raw("b.csv", "id,ident,price\n1,1,5\n").unwrap();

    let err = fixture
        .session(&[a, b])
        .unwrap()
        .compare(&plan(&["a:ID,b:id,b:ident"], &["price"], &[]))
        .unwrap_err();
    assert!(matches!(err, TabmergeError::ColumnCollision { .. }));
}

#[test]
fn test_overlapping_key_groups() {
    let fixture = TestFixture::new().unwrap();
    let a = fixture.create_raw("a.csv", "ID,other\n1,5\n").unwrap();
    let b = fixture.create_raw("b.csv", "id,other\n1,5\n").unwrap();

    let err = fixture
        .session(&[a, b])
        .unwrap()
        .compare(&plan(&["a:ID,b:id", "a:other,b:id"], &[], &[]))
        .unwrap_err();
    assert!(matches!(err, TabmergeError::AmbiguousKeyMapping { .. }));
}

#[test]
fn test_compare_column_missing_in_one_dataset() {
    let fixture = TestFixture::new().unwrap();
    let a = fixture.create_raw("a.csv", "id,price,qty\n1,5,1\n").unwrap();
    let b = fixture.create_raw("b.csv", "id,price\n1,5\n").unwrap();

    let err = fixture
        .session(&[a, b])
        .unwrap()
        .compare(&plan(&["a:id"], &["price", "qty"], &[]))
        .unwrap_err();
    assert!(matches!(err, TabmergeError::UnknownColumn { ref dataset, ref column }
        if dataset == "b" && column == "qty"));
}

#[test]
fn test_invalid_column_reference_on_cli() {
    let runner = CliTestRunner::new().unwrap();
    let a = runner.fixture().create_raw("a.csv", "id\n1\n").unwrap();
    let b = runner.fixture().create_raw("b.csv", "id\n1\n").unwrap();

    let err = runner.expect_failure(&[
        "compare", a.to_str().unwrap(), b.to_str().unwrap(), "--key", "id", "--no-xlsx",
    ]);
    assert!(matches!(err, TabmergeError::InvalidColumnRef { ref value } if value == "id"));
}

#[test]
fn test_large_integers_compare_exactly() {
    let fixture = TestFixture::new().unwrap();
    let a = fixture
        .create_raw("a.csv", "id,account\n1,9007199254740993\n")
        .unwrap();
    let b = fixture
        .create_raw("b.csv", "id,account\n1,9007199254740992\n")
        .unwrap();

    let outcome = fixture
        .session(&[a, b])
        .unwrap()
        .compare(&plan(&["a:id"], &["account"], &[]))
        .unwrap();
    assert!(outcome.flags.is_flagged(0, "account_b"));

    let out = fixture.path("big.xlsx");
    tabmerge::xlsx::XlsxExporter::write_to(&outcome, &out).unwrap();
    let rows = crate::common::read_sheet(&out, "Comparison");
    assert_eq!(rows[1][1], calamine::Data::String("9007199254740993".to_string()));
}

#[test]
fn test_special_characters_survive_html() {
    let fixture = TestFixture::new().unwrap();
    let a = fixture
        .create_raw("a.csv", "id,note\n1,\"<script>alert('x')</script>\"\n")
        .unwrap();
    let b = fixture.create_raw("b.csv", "id,note\n1,\"a & b\"\n").unwrap();

    let outcome = fixture
        .session(&[a, b])
        .unwrap()
        .compare(&plan(&["a:id"], &["note"], &[]))
        .unwrap();
    let html = tabmerge::html::HtmlRenderer::render(&outcome);
    assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
    assert!(html.contains(">a &amp; b</td>"));
    assert!(!html.contains("<script>"));
}

#[test]
fn test_non_utf8_file() {
    let fixture = TestFixture::new().unwrap();
    let a = fixture.path("binary.csv");
    std::fs::write(&a, b"\x00\x01\x02\x03invalid_data\xff\xfe").unwrap();
    let b = fixture.create_raw("b.csv", "id\n1\n").unwrap();

    let err = fixture.session(&[a, b]).unwrap_err();
    assert!(matches!(err, TabmergeError::Decode { .. }));
}
