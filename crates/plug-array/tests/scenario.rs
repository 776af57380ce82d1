//! End-to-end walk through both array types.

use plug_array::{PooledPtrArray, SmallArray};
use plug_test_utils::{init_logging, Widget};

#[test]
fn small_array_then_pooled_widgets() {
    init_logging();

    let mut numbers: SmallArray<i32, 2> = SmallArray::new();
    numbers.push(0);
    numbers.push(1);
    assert!(numbers.is_inline());
    numbers.push(2);
    assert!(!numbers.is_inline());
    assert!(numbers.capacity() >= 3);

    numbers.remove(0);
    assert_eq!(numbers, [1, 2]);
    assert_eq!(numbers.len(), 2);
    assert!(numbers.capacity() >= 3);

    let mut widgets: PooledPtrArray<Widget, 4> = PooledPtrArray::new();
    let ptrs: Vec<*const Widget> = (0..5)
        .map(|id| widgets.add(Widget::new(id)) as *const Widget)
        .collect();
    assert_eq!(widgets.chunk_count(), 2);
    for (i, a) in ptrs.iter().enumerate() {
        for b in &ptrs[i + 1..] {
            assert_ne!(a, b);
        }
    }
    for (index, &ptr) in ptrs.iter().enumerate() {
        assert_eq!(widgets.as_ptr(index), ptr);
    }

    widgets.erase(2);
    let replacement: *const Widget = widgets.add(Widget::new(99));
    assert_eq!(replacement, ptrs[2]);
    assert_eq!(
        widgets.iter().map(|w| w.id).collect::<Vec<_>>(),
        vec![0, 1, 3, 4, 99]
    );
}

#[test]
fn moving_arrays_between_owners() {
    let mut heap: SmallArray<String, 2> = (0..6).map(|i| i.to_string()).collect();
    let block = heap.as_ptr();
    let mut owner: SmallArray<String, 2> = SmallArray::new();
    owner.take_from(&mut heap);
    assert_eq!(owner.as_ptr(), block);
    assert!(heap.is_empty() && heap.is_inline());

    let mut small: SmallArray<String, 4> = ["a", "b"].map(String::from).into();
    let mut receiver: SmallArray<String, 4> = SmallArray::new();
    receiver.take_from(&mut small);
    assert_eq!(receiver, ["a", "b"].map(String::from));
    assert!(small.is_empty() && small.is_inline());
}
