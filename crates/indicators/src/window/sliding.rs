use std::collections::VecDeque;

/// Fixed-size trailing window over a series.
///
/// For input index `i`:
/// - `i < skip_initial`: `None`, the padding function is not called.
/// - fewer than `window_size` values available since `skip_initial`:
///   `undefined_value(record)`.
/// - otherwise `accumulator` over the last `window_size` source values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlidingWindow {
    window_size: usize,
    skip_initial: usize,
}

impl SlidingWindow {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            skip_initial: 0,
        }
    }

    pub fn skip_initial(mut self, skip: usize) -> Self {
        self.skip_initial = skip;
        self
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Number of leading positions that never reach the accumulator.
    pub fn undefined_length(&self) -> usize {
        self.skip_initial + self.window_size.saturating_sub(1)
    }

    pub fn apply<D, T, R, S, U, A>(
        &self,
        data: &[D],
        mut source: S,
        mut undefined_value: U,
        mut accumulator: A,
    ) -> Vec<Option<R>>
    where
        S: FnMut(&D) -> T,
        U: FnMut(&D) -> Option<R>,
        A: FnMut(&[T]) -> Option<R>,
    {
        let mut output = Vec::with_capacity(data.len());
        if self.window_size == 0 {
            output.resize_with(data.len(), || None);
            return output;
        }

        let mut window: VecDeque<T> = VecDeque::with_capacity(self.window_size);
        for (i, record) in data.iter().enumerate() {
            if i < self.skip_initial {
                output.push(None);
                continue;
            }

            window.push_back(source(record));
            if window.len() > self.window_size {
                window.pop_front();
            }

            if window.len() < self.window_size {
                output.push(undefined_value(record));
            } else {
                output.push(accumulator(window.make_contiguous()));
            }
        }
        output
    }
}
