/// Value type for key-only usage, like ``Llrb<K, Empty>``, turning the
/// map into an ordered set of keys.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, PartialOrd, Ord)]
pub struct Empty;
