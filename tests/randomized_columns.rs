//! Randomized agreement tests: the engine against naive models.

use colonnade::{bitmap, Characteristics, Column, ColumnBuilder, FixedColumn, ScalarType, Value};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_values(rng: &mut StdRng, len: usize, spread: i64) -> Vec<i64> {
    (0..len).map(|_| rng.gen_range(-spread..=spread)).collect()
}

#[test]
fn to_sorted_agrees_with_model_sort() {
    let mut rng = StdRng::seed_from_u64(7);
    for len in [0, 1, 2, 17, 256] {
        let values = random_values(&mut rng, len, 50);
        let column = Column::Int64(
            FixedColumn::from_values(&values, Characteristics::NONNULL).unwrap(),
        );
        let sorted = column.to_sorted().unwrap();

        let mut model = values.clone();
        model.sort_unstable();
        let expected = Column::Int64(
            FixedColumn::from_values(&model, Characteristics::NONNULL).unwrap(),
        );
        assert_eq!(sorted, expected);
        assert!(sorted.is_sorted());
    }
}

#[test]
fn to_distinct_agrees_with_model_dedup() {
    let mut rng = StdRng::seed_from_u64(11);
    let values = random_values(&mut rng, 300, 40);
    let column = Column::Int64(
        FixedColumn::from_values(&values, Characteristics::NONNULL).unwrap(),
    );
    let distinct = column.to_distinct().unwrap();

    let mut model = values.clone();
    model.sort_unstable();
    model.dedup();
    let expected = Column::Int64(
        FixedColumn::from_values(&model, Characteristics::NONNULL).unwrap(),
    );
    assert_eq!(distinct, expected);
}

#[test]
fn sorted_search_agrees_with_model_scan() {
    let mut rng = StdRng::seed_from_u64(13);
    let mut values = random_values(&mut rng, 200, 60);
    values.sort_unstable();
    let column = Column::Int64(
        FixedColumn::from_values(&values, Characteristics::SORTED).unwrap(),
    );
    for _ in 0..200 {
        let target = rng.gen_range(-70i64..=70);
        let first = column.index_of(&Value::Int64(target)).unwrap();
        let last = column.last_index_of(&Value::Int64(target)).unwrap();
        assert_eq!(first, values.iter().position(|&v| v == target));
        assert_eq!(last, values.iter().rposition(|&v| v == target));
    }
}

#[test]
fn filter_agrees_with_model_retain() {
    let mut rng = StdRng::seed_from_u64(17);
    let values = random_values(&mut rng, 150, 30);
    let column = Column::Int64(
        FixedColumn::from_values(&values, Characteristics::NONNULL).unwrap(),
    );
    let mut mask = bitmap::mask_zeros(values.len());
    for i in 0..values.len() {
        if rng.gen_bool(0.4) {
            mask.set(i, true);
        }
    }
    let kept = column.filter(&mask, mask.count_ones()).unwrap();

    let model: Vec<i64> = values
        .iter()
        .enumerate()
        .filter(|(i, _)| mask[*i])
        .map(|(_, v)| *v)
        .collect();
    let expected = Column::Int64(
        FixedColumn::from_values(&model, Characteristics::NONNULL).unwrap(),
    );
    assert_eq!(kept, expected);
}

#[test]
fn nullable_rank_agrees_with_model_count() {
    let mut rng = StdRng::seed_from_u64(19);
    let mut builder = ColumnBuilder::new(ScalarType::Int64, Characteristics::NULLABLE).unwrap();
    let mut model: Vec<Option<i64>> = Vec::new();
    for _ in 0..500 {
        if rng.gen_bool(0.3) {
            builder.push_null().unwrap();
            model.push(None);
        } else {
            let v = rng.gen_range(-90i64..=90);
            builder.push_i64(v).unwrap();
            model.push(Some(v));
        }
    }
    let column = builder.build().unwrap();
    let Column::Nullable(n) = &column else {
        panic!("expected a nullable column");
    };
    for (i, slot) in model.iter().enumerate() {
        let absent_below = model[..i].iter().filter(|v| v.is_none()).count();
        assert_eq!(n.non_null_index(i).unwrap(), i - absent_below);
        match slot {
            Some(v) => assert_eq!(column.value(i).unwrap(), Value::Int64(*v)),
            None => assert_eq!(column.value(i).unwrap(), Value::Null),
        }
    }
}

#[test]
fn merge_intersection_agrees_with_model_sets() {
    let mut rng = StdRng::seed_from_u64(23);
    let mut left: Vec<i64> = random_values(&mut rng, 80, 100);
    let mut right: Vec<i64> = random_values(&mut rng, 60, 100);
    left.sort_unstable();
    left.dedup();
    right.sort_unstable();
    right.dedup();

    let left_col = Column::Int64(
        FixedColumn::from_values(&left, Characteristics::DISTINCT).unwrap(),
    );
    let right_col = Column::Int64(
        FixedColumn::from_values(&right, Characteristics::DISTINCT).unwrap(),
    );
    let result = left_col.intersect_sorted(&right_col).unwrap();

    let expected: Vec<i64> = left
        .iter()
        .copied()
        .filter(|v| right.binary_search(v).is_ok())
        .collect();
    assert_eq!(result.matched, expected.len());
    let joined = left_col.filter(&result.left_keep, result.matched).unwrap();
    let expected_col = Column::Int64(
        FixedColumn::from_values(&expected, Characteristics::NONNULL).unwrap(),
    );
    assert_eq!(joined, expected_col);
}
