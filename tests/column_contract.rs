//! Tests for the public column contract: views, the characteristics
//! lattice, search, and the set-algebra identities.

use colonnade::{
    algebra, bitmap, Characteristics, Column, ColumnBuilder, FixedColumn, ScalarType,
    SearchOutcome, Value,
};

fn int64_column(values: &[i64], chars: Characteristics) -> Column {
    Column::Int64(FixedColumn::from_values(values, chars).unwrap())
}

mod views {
    use super::*;

    #[test]
    fn sub_column_is_transparent_for_every_offset() {
        let values: Vec<i64> = (0..40).map(|i| i * 3).collect();
        let column = int64_column(&values, Characteristics::DISTINCT);
        for (i, j) in [(0, 0), (0, 40), (7, 23), (39, 40)] {
            let view = column.sub_column(i, j).unwrap();
            assert_eq!(view.len(), j - i);
            for k in 0..view.len() {
                assert_eq!(view.value(k).unwrap(), column.value(i + k).unwrap());
            }
        }
    }

    #[test]
    fn whole_range_sub_column_equals_self() {
        let column = int64_column(&[1, 2, 3], Characteristics::SORTED);
        let view = column.sub_column(0, 3).unwrap();
        assert_eq!(view, column);
        assert_eq!(view.characteristics(), column.characteristics());
    }

    #[test]
    fn empty_sub_column_keeps_the_type() {
        let column = int64_column(&[1, 2, 3], Characteristics::SORTED);
        let empty = column.sub_column(1, 1).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.scalar_type(), ScalarType::Int64);
    }
}

mod lattice {
    use super::*;

    #[test]
    fn to_distinct_implies_sorted_and_nonnull() {
        let column = int64_column(&[9, 2, 9, 4], Characteristics::NONNULL);
        let distinct = column.to_distinct().unwrap();
        assert!(distinct.is_distinct());
        assert!(distinct.is_sorted());
        assert!(distinct.is_nonnull());
    }

    #[test]
    fn sorted_then_distinct_twice_is_idempotent() {
        let column = int64_column(&[5, 5, 1, 8, 1], Characteristics::NONNULL);
        let once = column.to_sorted().unwrap().to_distinct().unwrap();
        let twice = once.to_sorted().unwrap().to_distinct().unwrap();
        assert_eq!(once, twice);
    }
}

mod searching {
    use super::*;

    #[test]
    fn search_encodes_hits_and_insertion_points() {
        let column = int64_column(&[1, 3, 5, 7], Characteristics::DISTINCT);
        assert_eq!(
            column.search(&Value::Int64(5), true).unwrap(),
            SearchOutcome::Found(2)
        );
        let miss = column.search(&Value::Int64(4), true).unwrap();
        assert_eq!(miss, SearchOutcome::Insertion(2));
        assert!(!miss.is_found());
        assert_eq!(column.ceiling(&Value::Int64(4)).unwrap(), Some(Value::Int64(5)));
        assert_eq!(column.floor(&Value::Int64(4)).unwrap(), Some(Value::Int64(3)));
        assert_eq!(column.lower(&Value::Int64(5)).unwrap(), Some(Value::Int64(3)));
        assert_eq!(column.higher(&Value::Int64(5)).unwrap(), Some(Value::Int64(7)));
    }

    #[test]
    fn first_and_last_read_the_boundary_values() {
        let column = int64_column(&[2, 4, 6], Characteristics::DISTINCT);
        assert_eq!(column.first().unwrap(), Some(Value::Int64(2)));
        assert_eq!(column.last().unwrap(), Some(Value::Int64(6)));
        let empty = column.sub_column(0, 0).unwrap();
        assert_eq!(empty.first().unwrap(), None);
    }
}

mod filtering {
    use super::*;

    #[test]
    fn all_ones_mask_returns_self() {
        let column = int64_column(&[1, 2, 3, 4], Characteristics::SORTED);
        let kept = column.filter(&bitmap::mask_ones(4), 4).unwrap();
        assert_eq!(kept, column);
    }

    #[test]
    fn all_zeros_mask_returns_empty() {
        let column = int64_column(&[1, 2, 3, 4], Characteristics::SORTED);
        let kept = column.filter(&bitmap::mask_zeros(4), 0).unwrap();
        assert!(kept.is_empty());
        assert_eq!(kept.scalar_type(), ScalarType::Int64);
    }

    #[test]
    fn partial_mask_keeps_positions_in_order() {
        let column = int64_column(&[10, 20, 30, 40, 50], Characteristics::DISTINCT);
        let mask = bitmap::mask_from_positions(5, &[0, 2, 4]);
        let kept = column.filter(&mask, 3).unwrap();
        assert_eq!(kept, int64_column(&[10, 30, 50], Characteristics::NONNULL));
    }

    #[test]
    fn filter_validates_mask_shape_and_cardinality() {
        let column = int64_column(&[1, 2, 3], Characteristics::NONNULL);
        let err = column.filter(&bitmap::mask_ones(2), 2).unwrap_err();
        assert!(err.to_string().contains("does not cover"));
        let err = column.filter(&bitmap::mask_ones(3), 2).unwrap_err();
        assert!(err.to_string().contains("cardinality"));
    }

    #[test]
    fn filter_keeps_nulls_of_nullable_columns() {
        let mut builder = ColumnBuilder::new(ScalarType::Int64, Characteristics::NULLABLE).unwrap();
        for v in [Some(1i64), None, Some(3), None, Some(5)] {
            match v {
                Some(v) => builder.push_i64(v).unwrap(),
                None => builder.push_null().unwrap(),
            }
        }
        let column = builder.build().unwrap();
        let mask = bitmap::mask_from_positions(5, &[1, 2, 3]);
        let kept = column.filter(&mask, 3).unwrap();
        assert_eq!(kept.len(), 3);
        assert_eq!(kept.value(0).unwrap(), Value::Null);
        assert_eq!(kept.value(1).unwrap(), Value::Int64(3));
        assert_eq!(kept.value(2).unwrap(), Value::Null);
    }
}

mod selecting {
    use super::*;

    #[test]
    fn select_gathers_in_index_order() {
        let column = int64_column(&[10, 20, 30], Characteristics::DISTINCT);
        let picked = column.select(&[2, 0, 0, 1]).unwrap();
        assert_eq!(picked.len(), 4);
        assert_eq!(picked, int64_column(&[30, 10, 10, 20], Characteristics::NONNULL));
        assert!(!picked.is_sorted());
        assert!(picked.is_nonnull());
    }

    #[test]
    fn select_rejects_out_of_range_indices() {
        let column = int64_column(&[10, 20, 30], Characteristics::NONNULL);
        let err = column.select(&[0, 3]).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn select_size_identity_holds() {
        let column = int64_column(&[5, 6, 7, 8], Characteristics::NONNULL);
        let indices = [3, 3, 1];
        assert_eq!(column.select(&indices).unwrap().len(), indices.len());
    }
}

mod appending {
    use super::*;

    #[test]
    fn distinct_append_guards_the_boundary() {
        let left = int64_column(&[1, 2, 3], Characteristics::DISTINCT);
        let ok = algebra::append(&left, &int64_column(&[4, 5], Characteristics::DISTINCT)).unwrap();
        assert_eq!(ok, int64_column(&[1, 2, 3, 4, 5], Characteristics::NONNULL));
        assert!(ok.is_distinct());

        let err =
            algebra::append(&left, &int64_column(&[2, 5], Characteristics::DISTINCT)).unwrap_err();
        assert!(err.to_string().contains("append would break"));
    }

    #[test]
    fn appending_empty_tail_preserves_content() {
        let left = int64_column(&[1, 2], Characteristics::DISTINCT);
        let empty = left.sub_column(0, 0).unwrap();
        assert_eq!(left.append(&empty).unwrap(), left);
    }
}
