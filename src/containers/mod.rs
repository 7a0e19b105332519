mod key_value_heap;

pub(crate) use key_value_heap::KeyValueHeap;
