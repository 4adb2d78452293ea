//! Load test: concurrent sets and deletes, then verify state and introspection.

use safemap::SafeMap;
use std::sync::Arc;
use std::thread;

#[test]
fn test_under_load_then_introspect() {
    let map: Arc<SafeMap<String, usize>> = Arc::new(SafeMap::with_string_keys());
    let mut handles = vec![];

    for t in 0..4 {
        let map = Arc::clone(&map);
        handles.push(thread::spawn(move || {
            for i in 0..2000 {
                map.set(format!("t{}_k{}", t, i), i);
            }
            for i in 0..2000 {
                map.delete(&format!("t{}_k{}", t, i));
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(map.is_empty());
    assert_eq!(map.len(), 0);
    let loads = map.bucket_loads();
    assert_eq!(loads.iter().sum::<usize>(), 0);
}

#[test]
fn test_mixed_operations_keep_counter_exact() {
    let map: Arc<SafeMap<u64, u64>> = Arc::new(SafeMap::with_integer_keys());
    let mut handles = vec![];

    for t in 0..8u64 {
        let map = Arc::clone(&map);
        handles.push(thread::spawn(move || {
            for i in 0..5_000u64 {
                let key = (i * 31 + t) % 512;
                match i % 5 {
                    0 => map.set(key, i),
                    1 => {
                        map.get_or_set(key, i);
                    }
                    2 => map.delete(&key),
                    3 => {
                        map.get_and_delete(&key);
                    }
                    _ => {
                        map.swap(key, i);
                    }
                }
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let mut counted = 0;
    map.range(|_, _| {
        counted += 1;
        true
    });
    assert_eq!(map.len(), counted);
    assert_eq!(map.bucket_loads().iter().sum::<usize>(), counted);
}
