use trellis_core::{Row, SQL, SQLiteValue};

#[test]
fn fragments_compose_in_placeholder_order() {
    let filter = SQL::join(
        [
            SQL::raw("a =").append(SQL::parameter(1)),
            SQL::raw("b in").append(SQL::parameters(["x", "y"])),
        ],
        " or ",
    )
    .parens();
    let sql = SQL::raw("select * from t where")
        .append(filter)
        .append_raw("limit")
        .append(SQL::parameter(10));

    assert_eq!(sql.sql(), "select * from t where (a = ? or b in (?, ?)) limit ?");
    let (_, params) = sql.into_parts();
    assert_eq!(
        params,
        vec![
            SQLiteValue::Integer(1),
            SQLiteValue::from("x"),
            SQLiteValue::from("y"),
            SQLiteValue::Integer(10)
        ]
    );
}

#[test]
fn rows_look_up_by_column_name() {
    let row = Row::from_pairs([("id", SQLiteValue::Integer(3)), ("name", SQLiteValue::Null)]);

    assert_eq!(row.columns(), ["id", "name"]);
    assert_eq!(row.get("id"), Some(&SQLiteValue::Integer(3)));
    assert!(row.get("name").is_some_and(SQLiteValue::is_null));
    assert_eq!(row.get("missing"), None);
}

#[cfg(feature = "rusqlite")]
#[test]
fn values_bind_and_read_back_through_rusqlite() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    let values = [
        SQLiteValue::Integer(-7),
        SQLiteValue::Real(2.5),
        SQLiteValue::from("it's"),
        SQLiteValue::Blob(vec![0, 255]),
        SQLiteValue::Null,
    ];

    let read: Vec<SQLiteValue> = conn
        .query_row(
            "select ?, ?, ?, ?, ?",
            rusqlite::params_from_iter(values.iter()),
            |row| (0..values.len()).map(|i| row.get(i)).collect(),
        )
        .unwrap();
    assert_eq!(read, values);
}
