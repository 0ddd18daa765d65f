use rankos::list::List;

#[test]
fn push_and_pop_front_back() {
    let mut l: List<i32> = List::new();
    assert!(l.is_empty());
    l.push_back(1);
    l.push_back(2);
    l.push_front(0);
    assert_eq!(l.len(), 3);
    assert_eq!(*l.front().unwrap(), 0);
    assert_eq!(*l.back().unwrap(), 2);
    assert_eq!(l.pop_front(), Some(0));
    assert_eq!(l.pop_back(), Some(2));
    assert_eq!(l.pop_front(), Some(1));
    assert_eq!(l.pop_front(), None);
    assert!(l.is_empty());
}

#[test]
fn insert_before_after() {
    let mut l: List<&str> = List::new();
    let b = l.push_back("b");
    let a = l.insert_before(b, "a");
    let c = l.insert_after(b, "c");
    let collected: Vec<&str> = l.iter().map(|(_, v)| *v).collect();
    assert_eq!(collected, vec!["a", "b", "c"]);
    assert_eq!(l.prev_id(b), Some(a));
    assert_eq!(l.next_id(b), Some(c));
}

#[test]
fn erase_arbitrary_and_reuse_slot() {
    let mut l: List<i32> = List::new();
    let x = l.push_back(10);
    l.push_back(20);
    l.push_back(30);
    assert_eq!(l.erase(x), 10);
    assert_eq!(l.len(), 2);
    let collected: Vec<i32> = l.iter().map(|(_, v)| *v).collect();
    assert_eq!(collected, vec![20, 30]);

    // Slot from the erased node should be recycled rather than growing the
    // backing Vec unboundedly.
    let before = l.iter().count();
    l.push_back(40);
    assert_eq!(l.len(), before + 1);
}

#[test]
fn clear_resets_to_empty() {
    let mut l: List<i32> = List::new();
    l.push_back(1);
    l.push_back(2);
    l.clear();
    assert!(l.is_empty());
    assert_eq!(l.front(), None);
    l.push_back(42);
    assert_eq!(*l.front().unwrap(), 42);
}

#[test]
#[should_panic(expected = "cannot erase a sentinel")]
fn erase_sentinel_panics() {
    let mut l: List<i32> = List::new();
    let head = l.head_id();
    l.erase(head);
}
