//! Tests for the binary wire format: per-column bodies, the file header,
//! and the freeze/thaw builder path.

use colonnade::{
    encoding, Characteristics, Column, ColumnBuilder, FixedColumn, ScalarType, Value, VarLenColumn,
};
use std::io::Write;

fn round_trip(column: &Column) -> Column {
    let mut buf = Vec::new();
    encoding::write_column(&mut buf, column).unwrap();
    encoding::read_column(
        &mut buf.as_slice(),
        column.scalar_type(),
        column.characteristics(),
    )
    .unwrap()
}

fn assert_round_trips(column: Column) {
    let restored = round_trip(&column);
    assert_eq!(restored, column, "content must survive the round trip");
    assert_eq!(
        restored.characteristics(),
        column.characteristics(),
        "characteristics must survive the round trip"
    );
}

#[test]
fn fixed_width_bodies_round_trip() {
    assert_round_trips(Column::Int8(
        FixedColumn::from_values(&[-1i8, 0, 7], Characteristics::NONNULL).unwrap(),
    ));
    assert_round_trips(Column::Int16(
        FixedColumn::from_values(&[-300i16, 4], Characteristics::NONNULL).unwrap(),
    ));
    assert_round_trips(Column::Int32(
        FixedColumn::from_values(&[1, 5, 9], Characteristics::DISTINCT).unwrap(),
    ));
    assert_round_trips(Column::Int64(
        FixedColumn::from_values(&[i64::MIN, 0, i64::MAX], Characteristics::SORTED).unwrap(),
    ));
    assert_round_trips(Column::Float32(
        FixedColumn::from_values(&[-2.5f32, 0.25], Characteristics::NONNULL).unwrap(),
    ));
    assert_round_trips(Column::Float64(
        FixedColumn::from_values(&[1.5f64, 2.5, 3.5], Characteristics::DISTINCT).unwrap(),
    ));
}

#[test]
fn temporal_and_identifier_bodies_round_trip() {
    assert_round_trips(Column::Date(
        FixedColumn::from_values(&[18000, 19000], Characteristics::DISTINCT).unwrap(),
    ));
    assert_round_trips(Column::Time(
        FixedColumn::from_values(&[0i64, 86_399_999_999], Characteristics::DISTINCT).unwrap(),
    ));
    assert_round_trips(Column::Timestamp(
        FixedColumn::from_values(&[1_600_000_000_000_000i64], Characteristics::NONNULL).unwrap(),
    ));
    assert_round_trips(Column::Uuid(
        FixedColumn::from_values(&[[0x11u8; 16], [0xAB; 16]], Characteristics::DISTINCT).unwrap(),
    ));
}

#[test]
fn decimal_body_carries_its_scale() {
    let mut builder = ColumnBuilder::decimal(3, Characteristics::SORTED).unwrap();
    builder.push_decimal(-1500).unwrap();
    builder.push_decimal(2750).unwrap();
    let column = builder.build().unwrap();
    let restored = round_trip(&column);
    assert_eq!(restored, column);
    assert_eq!(restored.decimal_scale().unwrap(), 3);
}

#[test]
fn boolean_body_packs_bits() {
    let values: Vec<bool> = (0..21).map(|i| i % 4 == 1).collect();
    let column = Column::Bool(colonnade::BoolColumn::from_bools(&values));
    let mut buf = Vec::new();
    encoding::write_column(&mut buf, &column).unwrap();
    // order + count + ceil(21 / 8) packed bytes
    assert_eq!(buf.len(), 1 + 4 + 3);
    assert_round_trips(column);
}

#[test]
fn varlen_body_round_trips_pointers_and_bytes() {
    assert_round_trips(Column::Str(
        VarLenColumn::from_strs(&["", "alpha", "bet", "z"], Characteristics::NONNULL).unwrap(),
    ));
    assert_round_trips(Column::Bytes(
        VarLenColumn::from_slices(
            &[b"\x00\x01".as_slice(), b"", b"\xFF"],
            ScalarType::Blob,
            Characteristics::NONNULL,
        )
        .unwrap(),
    ));
}

#[test]
fn varlen_view_serializes_renormalized() {
    let column = Column::Str(
        VarLenColumn::from_strs(&["aa", "bb", "cc", "dd"], Characteristics::DISTINCT).unwrap(),
    );
    let view = column.sub_column(1, 3).unwrap();
    let restored = round_trip(&view);
    assert_eq!(restored, view);
    assert_eq!(restored.get_str(0).unwrap(), "bb");
}

#[test]
fn nullable_body_round_trips_presence_and_values() {
    let mut builder = ColumnBuilder::new(ScalarType::Int32, Characteristics::NULLABLE).unwrap();
    for v in [None, Some(5), None, Some(7), Some(9)] {
        match v {
            Some(v) => builder.push_i32(v).unwrap(),
            None => builder.push_null().unwrap(),
        }
    }
    let column = builder.build().unwrap();
    let restored = round_trip(&column);
    assert_eq!(restored, column);
    assert_eq!(restored.value(0).unwrap(), Value::Null);
    assert_eq!(restored.value(3).unwrap(), Value::Int32(7));
}

#[test]
fn big_endian_marker_is_rejected() {
    let column = Column::Int32(FixedColumn::from_values(&[1], Characteristics::NONNULL).unwrap());
    let mut buf = Vec::new();
    encoding::write_column(&mut buf, &column).unwrap();
    buf[0] = encoding::ORDER_BIG_ENDIAN;
    let err = encoding::read_column(
        &mut buf.as_slice(),
        ScalarType::Int32,
        Characteristics::NONNULL,
    )
    .unwrap_err();
    assert!(err.to_string().contains("big-endian"));
}

#[test]
fn truncated_body_is_an_error() {
    let column = Column::Int64(
        FixedColumn::from_values(&[1, 2, 3], Characteristics::NONNULL).unwrap(),
    );
    let mut buf = Vec::new();
    encoding::write_column(&mut buf, &column).unwrap();
    buf.truncate(buf.len() - 4);
    assert!(encoding::read_column(
        &mut buf.as_slice(),
        ScalarType::Int64,
        Characteristics::NONNULL,
    )
    .is_err());
}

#[test]
fn read_verifies_claimed_order_against_bytes() {
    let column = Column::Int32(
        FixedColumn::from_values(&[3, 1, 2], Characteristics::NONNULL).unwrap(),
    );
    let mut buf = Vec::new();
    encoding::write_column(&mut buf, &column).unwrap();
    // The same bytes cannot be thawed under a stronger claim.
    let err = encoding::read_column(
        &mut buf.as_slice(),
        ScalarType::Int32,
        Characteristics::SORTED,
    )
    .unwrap_err();
    assert!(err.to_string().contains("SORTED"));
}

#[test]
fn thaw_populates_a_fresh_builder_only() {
    let column = Column::Int32(
        FixedColumn::from_values(&[1, 2, 3], Characteristics::SORTED).unwrap(),
    );
    let mut buf = Vec::new();
    encoding::write_column(&mut buf, &column).unwrap();

    let mut builder = ColumnBuilder::new(ScalarType::Int32, Characteristics::SORTED).unwrap();
    builder.thaw(&mut buf.as_slice()).unwrap();
    assert_eq!(builder.build().unwrap(), column);

    let mut dirty = ColumnBuilder::new(ScalarType::Int32, Characteristics::SORTED).unwrap();
    dirty.push_i32(9).unwrap();
    let err = dirty.thaw(&mut buf.as_slice()).unwrap_err();
    assert!(err.to_string().contains("already holds rows"));
}

#[test]
fn file_round_trip_preserves_names_key_and_columns() {
    let id = Column::Int64(
        FixedColumn::from_values(&[1, 2, 3], Characteristics::DISTINCT).unwrap(),
    );
    let name = Column::Str(
        VarLenColumn::from_strs(&["ada", "bob", "cyd"], Characteristics::NONNULL).unwrap(),
    );
    let mut builder = ColumnBuilder::new(ScalarType::Float64, Characteristics::NULLABLE).unwrap();
    builder.push_f64(1.5).unwrap();
    builder.push_null().unwrap();
    builder.push_f64(2.5).unwrap();
    let score = builder.build().unwrap();

    let mut file = tempfile::tempfile().unwrap();
    encoding::write_columns(
        &mut file,
        &[("id", &id), ("name", &name), ("score", &score)],
        Some(0),
    )
    .unwrap();
    file.flush().unwrap();

    use std::io::{Seek, SeekFrom};
    file.seek(SeekFrom::Start(0)).unwrap();
    let (columns, key) = encoding::read_columns(&mut file).unwrap();
    assert_eq!(key, Some(0));
    assert_eq!(columns.len(), 3);
    assert_eq!(columns[0].0, "id");
    assert_eq!(columns[0].1, id);
    assert_eq!(columns[1].1, name);
    assert_eq!(columns[2].1, score);
    assert!(columns[0].1.is_distinct());
}

#[test]
fn key_column_must_be_distinct() {
    let heap = Column::Int64(
        FixedColumn::from_values(&[2, 1], Characteristics::NONNULL).unwrap(),
    );
    let mut buf = Vec::new();
    let err = encoding::write_columns(&mut buf, &[("k", &heap)], Some(0)).unwrap_err();
    assert!(err.to_string().contains("must be distinct"));
}
