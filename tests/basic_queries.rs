use qbind::configuration::Configuration;
use qbind::database::Database;
use qbind::error::QbindError;
use qbind::values;
use qbind::valuetype::ValueType;

fn setup() -> Database {
    let db = Database::connect(Configuration::default()).expect("db");
    db.query("CREATE TABLE foo (foo TEXT, bar INTEGER)", values![])
        .expect("create");
    db.query(
        "INSERT INTO foo (foo, bar) VALUES ({0:s}, {1:ud})",
        values!["asdf", 0],
    )
    .expect("seed");
    db.query(
        "INSERT INTO foo (foo, bar) VALUES ({0:s}, {1:ud})",
        values!["middle", 1],
    )
    .expect("seed");
    db.query(
        "INSERT INTO foo (foo, bar) VALUES ({0:s}, {1:ud})",
        values!["Testing", 2],
    )
    .expect("seed");
    db
}

#[test]
fn location_bound_query_executes() {
    let db = setup();
    let result = db
        .query("SELECT * FROM foo WHERE bar={0:ud}", values![0])
        .expect("query");
    assert!(result.success());
    assert_eq!(result.query(), "SELECT * FROM foo WHERE bar=?");
    assert_eq!(result.original_query(), "SELECT * FROM foo WHERE bar={0:ud}");
    assert_eq!(result.row_count(), 1);
    assert_eq!(result.parameters().len(), 1);
    assert_eq!(
        result.parameters()[0].value_type(),
        ValueType::UnsignedInteger
    );
}

#[test]
fn blank_template_is_rejected_before_the_driver() {
    let db = setup();
    let err = db.query("", values![]).unwrap_err();
    assert!(matches!(err, QbindError::InvalidArgument(_)));
    let err = db.query("   ;", values![]).unwrap_err();
    assert!(matches!(err, QbindError::InvalidArgument(_)));
}

#[test]
fn missing_argument_is_out_of_bounds() {
    let db = setup();
    let err = db
        .query("SELECT * FROM foo WHERE bar={0:ud}", values![])
        .unwrap_err();
    assert!(matches!(err, QbindError::OutOfBounds(0)));
}

#[test]
fn missing_location_argument_is_out_of_bounds() {
    let db = setup();
    let err = db
        .query(
            "SELECT * FROM foo WHERE bar={1:ud} AND foo={0:s}",
            values!["hi"],
        )
        .unwrap_err();
    assert!(matches!(err, QbindError::OutOfBounds(1)));
}

#[test]
fn mixing_inferred_and_location_binding_fails() {
    let db = setup();
    let err = db
        .query("SELECT * FROM foo WHERE bar={0:ud} AND foo={s}", values![1])
        .unwrap_err();
    assert!(matches!(err, QbindError::InvalidArgument(_)));
}

#[test]
fn shape_violations_fail_validation() {
    let db = setup();
    let err = db
        .query("SELECT * FROM foo WHERE bar={0:ud}", values!["hi"])
        .unwrap_err();
    assert!(matches!(err, QbindError::InvalidArgument(_)));
}

#[test]
fn list_placeholders_expand_and_filter() {
    let db = setup();
    let mut result = db
        .query(
            "SELECT * FROM foo WHERE bar IN {0:ld} AND bar IN {1:lud}",
            values!["0,-1,2", vec![0, 1, 2]],
        )
        .expect("query");
    assert!(result.success());
    assert_eq!(
        result.query(),
        "SELECT * FROM foo WHERE bar IN (?,?,?) AND bar IN (?,?,?)"
    );
    assert_eq!(result.parameters().len(), 6);
    // rows with bar = 0 and bar = 2 satisfy both lists
    assert_eq!(result.row_count(), 2);
    let rows = result.rows().expect("rows");
    assert_eq!(rows.len(), 2);
}

#[test]
fn no_placeholders_round_trips_unmodified() {
    let db = setup();
    let result = db
        .query("SELECT * FROM foo ORDER BY bar ASC", values![])
        .expect("query");
    assert_eq!(result.query(), "SELECT * FROM foo ORDER BY bar ASC");
    assert!(result.parameters().is_empty());
    assert_eq!(result.row_count(), 3);
}

#[test]
fn string_match_without_rows() {
    let db = setup();
    let result = db
        .query("SELECT foo FROM foo WHERE foo = {0:s}", values!["hello"])
        .expect("query");
    assert!(result.success());
    assert_eq!(result.row_count(), 0);
}

#[test]
fn rows_are_accessible_by_cursor_and_position() {
    let db = setup();
    let mut result = db
        .query("SELECT * FROM foo ORDER BY bar ASC", values![])
        .expect("query");
    assert_eq!(result.row_count(), 3);

    // positional access past the cursor scans forward
    let third = result.row(2).expect("row").expect("present");
    assert_eq!(third.get("foo").expect("column").lexical(), "Testing");

    // the forward cursor is unaffected by positional reads
    let first = result.fetch_row().expect("fetch").expect("present");
    assert_eq!(first.get("foo").expect("column").lexical(), "asdf");

    // out-of-range positions are None
    assert!(result.row(7).expect("row").is_none());

    result.free();
}

#[test]
fn repeated_location_placeholders_bind_one_argument_twice() {
    let db = setup();
    let result = db
        .query(
            "SELECT * FROM foo WHERE bar={0:ud} OR bar={0:ud}",
            values![1],
        )
        .expect("query");
    assert_eq!(result.query(), "SELECT * FROM foo WHERE bar=? OR bar=?");
    assert_eq!(result.row_count(), 1);
}

#[test]
fn insert_reports_insert_id_and_row_count() {
    let db = setup();
    let result = db
        .query(
            "INSERT INTO foo (foo, bar) VALUES ({0:s}, {1:ud})",
            values!["again", 9],
        )
        .expect("insert");
    assert!(result.success());
    assert_eq!(result.row_count(), 1);
    assert_eq!(result.insert_id(), Some(4));
}

#[test]
fn escaped_strings_are_entity_encoded_before_binding() {
    let db = setup();
    db.query(
        "INSERT INTO foo (foo, bar) VALUES ({0:es}, {1:ud})",
        values!["<b>&'bold'</b>", 5],
    )
    .expect("insert");
    let mut result = db
        .query("SELECT foo FROM foo WHERE bar={0:ud}", values![5])
        .expect("select");
    let row = result.fetch_row().expect("fetch").expect("present");
    assert_eq!(
        row.get("foo").expect("column").lexical(),
        "&lt;b&gt;&amp;&#039;bold&#039;&lt;/b&gt;"
    );
}
