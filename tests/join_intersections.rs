//! Tests for the two join primitives and their null-aware behavior.

use colonnade::{
    bitmap, Characteristics, Column, ColumnBuilder, FixedColumn, ScalarType, VarLenColumn,
};

fn int64_column(values: &[i64], chars: Characteristics) -> Column {
    Column::Int64(FixedColumn::from_values(values, chars).unwrap())
}

fn nullable_i64(values: &[Option<i64>]) -> Column {
    let mut builder = ColumnBuilder::new(ScalarType::Int64, Characteristics::NULLABLE).unwrap();
    for v in values {
        match v {
            Some(v) => builder.push_i64(*v).unwrap(),
            None => builder.push_null().unwrap(),
        }
    }
    builder.build().unwrap()
}

mod sorted_merge {
    use super::*;

    #[test]
    fn matches_mark_both_sides() {
        let left = int64_column(&[1, 2, 4, 6], Characteristics::DISTINCT);
        let right = int64_column(&[2, 3, 4, 5], Characteristics::DISTINCT);
        let result = left.intersect_sorted(&right).unwrap();
        assert_eq!(result.matched, 2);
        assert_eq!(result.left_keep, bitmap::mask_from_positions(4, &[1, 2]));
        assert_eq!(result.right_keep, bitmap::mask_from_positions(4, &[0, 2]));
    }

    #[test]
    fn masks_feed_the_filter_primitive() {
        let left = int64_column(&[1, 2, 4, 6], Characteristics::DISTINCT);
        let right = int64_column(&[2, 3, 4, 5], Characteristics::DISTINCT);
        let result = left.intersect_sorted(&right).unwrap();
        let joined_left = left.filter(&result.left_keep, result.matched).unwrap();
        let joined_right = right.filter(&result.right_keep, result.matched).unwrap();
        assert_eq!(joined_left, joined_right);
        assert_eq!(joined_left, int64_column(&[2, 4], Characteristics::NONNULL));
    }

    #[test]
    fn equal_runs_match_up_to_the_shorter_multiplicity() {
        let left = int64_column(&[1, 2, 2, 2], Characteristics::SORTED);
        let right = int64_column(&[2, 2, 3], Characteristics::SORTED);
        let result = left.intersect_sorted(&right).unwrap();
        assert_eq!(result.matched, 2);
        assert_eq!(result.left_keep.count_ones(), 2);
        assert_eq!(result.right_keep, bitmap::mask_from_positions(3, &[0, 1]));
    }

    #[test]
    fn disjoint_inputs_yield_empty_masks() {
        let left = int64_column(&[1, 3], Characteristics::DISTINCT);
        let right = int64_column(&[2, 4], Characteristics::DISTINCT);
        let result = left.intersect_sorted(&right).unwrap();
        assert_eq!(result.matched, 0);
        assert_eq!(result.left_keep.count_ones(), 0);
        assert_eq!(result.right_keep.count_ones(), 0);
    }

    #[test]
    fn unsorted_inputs_are_rejected() {
        let sorted = int64_column(&[1, 2], Characteristics::SORTED);
        let heap = int64_column(&[2, 1], Characteristics::NONNULL);
        let err = sorted.intersect_sorted(&heap).unwrap_err();
        assert!(err.to_string().contains("requires sorted"));
    }

    #[test]
    fn boolean_columns_are_not_supported() {
        let bools = Column::Bool(colonnade::BoolColumn::from_bools(&[true, false]));
        let ints = int64_column(&[1], Characteristics::SORTED);
        let err = bools.intersect_sorted(&ints).unwrap_err();
        assert!(err.to_string().contains("not supported for boolean columns"));
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let a = int64_column(&[1], Characteristics::SORTED);
        let b = Column::Int32(FixedColumn::from_values(&[1i32], Characteristics::SORTED).unwrap());
        let err = a.intersect_sorted(&b).unwrap_err();
        assert!(err.to_string().contains("cannot intersect"));
    }

    #[test]
    fn text_columns_intersect_lexicographically() {
        let left = Column::Str(
            VarLenColumn::from_strs(&["ant", "bee", "cat"], Characteristics::DISTINCT).unwrap(),
        );
        let right = Column::Str(
            VarLenColumn::from_strs(&["bee", "cow"], Characteristics::DISTINCT).unwrap(),
        );
        let result = left.intersect_sorted(&right).unwrap();
        assert_eq!(result.matched, 1);
        assert_eq!(result.left_keep, bitmap::mask_from_positions(3, &[1]));
    }

    #[test]
    fn null_aware_walk_skips_absent_positions() {
        // Present values [1, 4, 6] at logical positions 0, 2, 4.
        let left = nullable_i64(&[Some(1), None, Some(4), None, Some(6)]);
        let right = int64_column(&[4, 5, 6], Characteristics::DISTINCT);
        let result = left.intersect_sorted(&right).unwrap();
        assert_eq!(result.matched, 2);
        assert_eq!(result.left_keep, bitmap::mask_from_positions(5, &[2, 4]));
        assert_eq!(result.right_keep, bitmap::mask_from_positions(3, &[0, 2]));
    }

    #[test]
    fn null_aware_walk_requires_sorted_present_values() {
        let left = nullable_i64(&[Some(4), None, Some(1)]);
        let right = int64_column(&[1], Characteristics::DISTINCT);
        let err = left.intersect_sorted(&right).unwrap_err();
        assert!(err.to_string().contains("present values"));
    }
}

mod index_probe {
    use super::*;

    #[test]
    fn records_index_positions_per_probe_hit() {
        let index = int64_column(&[10, 20, 30], Characteristics::DISTINCT);
        let probe = int64_column(&[30, 10, 10, 99], Characteristics::NONNULL);
        let result = index.intersect_with_index(&probe).unwrap();
        assert_eq!(result.index_positions, vec![2, 0, 0]);
        assert_eq!(result.probe_keep, bitmap::mask_from_positions(4, &[0, 1, 2]));
        assert_eq!(result.matched, 3);
    }

    #[test]
    fn non_distinct_index_is_rejected() {
        let index = int64_column(&[10, 20], Characteristics::SORTED);
        let probe = int64_column(&[10], Characteristics::NONNULL);
        let err = index.intersect_with_index(&probe).unwrap_err();
        assert!(err.to_string().contains("distinct"));
    }

    #[test]
    fn null_probe_positions_are_skipped() {
        let index = int64_column(&[10, 20, 30], Characteristics::DISTINCT);
        let probe = nullable_i64(&[Some(20), None, Some(99), Some(10)]);
        let result = index.intersect_with_index(&probe).unwrap();
        assert_eq!(result.index_positions, vec![1, 0]);
        assert_eq!(result.probe_keep, bitmap::mask_from_positions(4, &[0, 3]));
        assert_eq!(result.matched, 2);
    }

    #[test]
    fn probe_results_select_matching_index_rows() {
        // The recorded index positions gather the joined left side.
        let index = int64_column(&[10, 20, 30], Characteristics::DISTINCT);
        let probe = int64_column(&[30, 10, 10, 99], Characteristics::NONNULL);
        let result = index.intersect_with_index(&probe).unwrap();
        let joined = index.select(&result.index_positions).unwrap();
        assert_eq!(joined, int64_column(&[30, 10, 10], Characteristics::NONNULL));
        let kept_probe = probe.filter(&result.probe_keep, result.matched).unwrap();
        assert_eq!(kept_probe, joined);
    }

    #[test]
    fn decimal_probe_requires_matching_scale() {
        let mut b = ColumnBuilder::decimal(2, Characteristics::DISTINCT).unwrap();
        b.push_decimal(100).unwrap();
        b.push_decimal(200).unwrap();
        let index = b.build().unwrap();

        let mut b = ColumnBuilder::decimal(1, Characteristics::NONNULL).unwrap();
        b.push_decimal(10).unwrap();
        let probe = b.build().unwrap();

        let err = index.intersect_with_index(&probe).unwrap_err();
        assert!(err.to_string().contains("scales"));
    }
}
