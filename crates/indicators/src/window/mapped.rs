use std::collections::VecDeque;

/// Sliding window whose reducer sees the previous *outputs* rather than the
/// previous raw records.
///
/// The accumulator receives the last `window_size - 1` mapped values together
/// with the current source value, which lets step `i` depend on the state
/// computed at `i - 1`. Every index before `skip_initial + window_size - 1`
/// is filled by `undefined_value`, which supplies the initial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedSlidingWindow {
    window_size: usize,
    skip_initial: usize,
}

impl MappedSlidingWindow {
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

    pub fn undefined_length(&self) -> usize {
        self.skip_initial + self.window_size.saturating_sub(1)
    }

    pub fn apply<D, T, M, S, U, A>(
        &self,
        data: &[D],
        mut source: S,
        mut undefined_value: U,
        mut accumulator: A,
    ) -> Vec<M>
    where
        M: Clone,
        S: FnMut(&D) -> T,
        U: FnMut(&T) -> M,
        A: FnMut(&[M], &T) -> M,
    {
        let history = self.window_size.saturating_sub(1);
        let warm_up = self.undefined_length();
        let mut previous: VecDeque<M> = VecDeque::with_capacity(history + 1);
        let mut output = Vec::with_capacity(data.len());

        for (i, record) in data.iter().enumerate() {
            let current = source(record);
            let mapped = if self.window_size == 0 || i < warm_up {
                undefined_value(&current)
            } else {
                accumulator(previous.make_contiguous(), &current)
            };

            if history > 0 {
                previous.push_back(mapped.clone());
                if previous.len() > history {
                    previous.pop_front();
                }
            }
            output.push(mapped);
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulator_sees_previous_output() {
        // Running total: each step adds the current value to the previous output.
        let data = [1, 2, 3, 4];
        let out = MappedSlidingWindow::new(2).apply(&data, |d| *d, |d| *d, |prev, d| prev[0] + d);
        assert_eq!(out, vec![1, 3, 6, 10]);
    }

    #[test]
    fn test_initial_state_struct() {
        #[derive(Debug, Clone, PartialEq)]
        struct State {
            seen: usize,
            last: i32,
        }

        let data = [10, 20, 30];
        let out = MappedSlidingWindow::new(2).apply(
            &data,
            |d| *d,
            |d| State { seen: 1, last: *d },
            |prev, d| State {
                seen: prev[0].seen + 1,
                last: *d,
            },
        );
        assert_eq!(out[0], State { seen: 1, last: 10 });
        assert_eq!(out[2], State { seen: 3, last: 30 });
    }

    #[test]
    fn test_wider_window_and_skip() {
        let data = [1, 1, 1, 1, 1, 1];
        // Fibonacci-like: sum of the two previous outputs.
        let out = MappedSlidingWindow::new(3)
            .skip_initial(1)
            .apply(&data, |d| *d, |d| *d, |prev, _| prev[0] + prev[1]);
        assert_eq!(out, vec![1, 1, 1, 2, 3, 5]);
    }

    #[test]
    fn test_empty_input() {
        let data: [i32; 0] = [];
        let out = MappedSlidingWindow::new(2).apply(&data, |d| *d, |d| *d, |prev, d| prev[0] + d);
        assert!(out.is_empty());
    }

    #[test]
    fn test_zero_window_pads_everything() {
        let data = [1, 2, 3];
        let window = MappedSlidingWindow::new(0);
        let out = window.apply(&data, |d| *d, |d| -d, |prev, d| prev[0] + d);
        assert_eq!(out, vec![-1, -2, -3]);
        assert_eq!(window.undefined_length(), 0);
    }
}
