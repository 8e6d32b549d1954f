mod test_utils;

use small_rel::index::{BpTreeIndex, LinearHashIndex, TreeIndex};
use small_rel::{row, Cell, IndexBackend, IndexKind, Key, Table, Tuple};

const BACKENDS: [IndexKind; 3] = [IndexKind::Tree, IndexKind::LinearHash, IndexKind::BpTree];

fn filled_table(kind: IndexKind, rows: usize) -> Table {
    let mut table = Table::with_index("nums", "id payload", "Integer String", "id", kind).unwrap();
    for i in 0..rows {
        assert!(table.insert(row![i as i32, format!("payload-{}", i)]));
    }
    table
}

fn int_key(i: i32) -> Key {
    Key::new(vec![Cell::from(i)])
}

#[test]
fn backends_answer_point_lookups_identically() {
    test_utils::setup();
    let tables: Vec<Table> = BACKENDS.iter().map(|&k| filled_table(k, 200)).collect();

    // probe present and absent keys alike
    for i in -20..220 {
        let key = int_key(i);
        let answers: Vec<Vec<Tuple>> = tables
            .iter()
            .map(|t| t.select_key(&key).tuples().to_vec())
            .collect();
        assert_eq!(answers[0], answers[1], "tree vs linear hash at {}", i);
        assert_eq!(answers[0], answers[2], "tree vs b+tree at {}", i);
    }
}

#[test]
fn backends_agree_after_key_collisions() {
    test_utils::setup();
    let mut tables: Vec<Table> = BACKENDS.iter().map(|&k| filled_table(k, 50)).collect();
    for table in tables.iter_mut() {
        assert!(table.insert(row![17, "superseded".to_string()]));
    }

    for table in &tables {
        let hit = table.select_key(&int_key(17));
        assert_eq!(hit.tuples(), &[row![17, "superseded"]]);
        // the store keeps both rows regardless of the backend
        assert_eq!(table.rows_count(), 51);
    }
}

#[test]
fn backend_choice_is_invisible_in_operator_output() {
    test_utils::setup();

    let results: Vec<(Vec<Tuple>, Vec<Tuple>)> = BACKENDS
        .iter()
        .map(|&k| {
            let movie = test_utils::movie_table(k);
            let studio = test_utils::studio_table(k);
            let projected = movie.project("title year studioName").unwrap();
            let joined = movie.equi_join("studioName", "name", &studio).unwrap();
            (projected.tuples().to_vec(), joined.tuples().to_vec())
        })
        .collect();

    assert_eq!(results[0], results[1]);
    assert_eq!(results[0], results[2]);
}

#[test]
fn linear_hash_tables_survive_many_splits() {
    test_utils::setup();
    let table = filled_table(IndexKind::LinearHash, 1000);

    for i in 0..1000 {
        let hit = table.select_key(&int_key(i));
        assert_eq!(hit.tuples(), &[row![i, format!("payload-{}", i)]]);
    }
}

// ------------------------------------------------- direct backend contract

#[test]
fn tree_backend_iterates_in_ascending_key_order() {
    let mut index = TreeIndex::new();
    for i in [5, 1, 4, 2, 3].iter() {
        index.put(int_key(*i), row![*i]);
    }

    let keys: Vec<Key> = index.iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(
        keys,
        vec![int_key(1), int_key(2), int_key(3), int_key(4), int_key(5)]
    );
}

#[test]
fn all_backends_honor_the_put_get_contract() {
    let mut backends: Vec<Box<dyn IndexBackend>> = vec![
        Box::new(TreeIndex::new()),
        Box::new(LinearHashIndex::new()),
        Box::new(BpTreeIndex::new()),
    ];

    for index in backends.iter_mut() {
        for i in 0..300 {
            index.put(int_key(i), row![i, i * 10]);
        }
        // overwrite must not drop or duplicate
        index.put(int_key(123), row![123, -1]);

        assert_eq!(index.len(), 300);
        for i in 0..300 {
            let expected = if i == 123 { row![123, -1] } else { row![i, i * 10] };
            assert_eq!(index.get(&int_key(i)), Some(&expected));
        }
        assert_eq!(index.get(&int_key(300)), None);
        assert_eq!(index.iter().count(), 300);
    }
}
