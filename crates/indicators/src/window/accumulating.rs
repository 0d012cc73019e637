/// Partitions a series into contiguous groups and reduces each group.
///
/// A new group starts at every index where `accumulate_till` returns true.
/// Records before the first boundary form the leading partial group; the
/// records after the last boundary form the trailing partial group. Either
/// can be dropped. Output is one value per retained group and is not
/// index-aligned with the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccumulatingWindow {
    discard_till_start: bool,
    discard_till_end: bool,
}

impl AccumulatingWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop records seen before the first group boundary.
    pub fn discard_till_start(mut self, discard: bool) -> Self {
        self.discard_till_start = discard;
        self
    }

    /// Drop the final group, which has no closing boundary.
    pub fn discard_till_end(mut self, discard: bool) -> Self {
        self.discard_till_end = discard;
        self
    }

    pub fn apply<D, T, R, S, P, A>(
        &self,
        data: &[D],
        mut source: S,
        mut accumulate_till: P,
        mut accumulator: A,
    ) -> Vec<R>
    where
        S: FnMut(&D) -> T,
        P: FnMut(&D, usize) -> bool,
        A: FnMut(&[T]) -> R,
    {
        let mut groups = Vec::new();
        let mut current: Vec<T> = Vec::new();
        let mut started = !self.discard_till_start;

        for (i, record) in data.iter().enumerate() {
            if accumulate_till(record, i) {
                if !current.is_empty() {
                    groups.push(accumulator(&current));
                    current.clear();
                }
                started = true;
            }
            if started {
                current.push(source(record));
            }
        }

        if !self.discard_till_end && !current.is_empty() {
            groups.push(accumulator(&current));
        }
        groups
    }
}
