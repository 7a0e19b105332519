use std::collections::VecDeque;

/// Average over everything ever pushed.
#[derive(Default, Debug, Copy, Clone)]
pub(crate) struct CumulativeMovingAverage {
    sum: u64,
    num_terms: u64,
}

impl CumulativeMovingAverage {
    pub(crate) fn add_term(&mut self, new_term: u64) {
        self.sum += new_term;
        self.num_terms += 1
    }

    pub(crate) fn value(&self) -> f64 {
        if self.num_terms > 0 {
            (self.sum as f64) / (self.num_terms as f64)
        } else {
            0.0
        }
    }
}

/// Average over the last `capacity` pushed terms. Used by the LBD restart policy for its
/// recent-LBD and recent-trail-size windows.
#[derive(Debug, Clone)]
pub(crate) struct WindowedAverage {
    window: VecDeque<u64>,
    capacity: usize,
    sum: u64,
}

impl WindowedAverage {
    pub(crate) fn new(capacity: usize) -> WindowedAverage {
        WindowedAverage {
            window: VecDeque::with_capacity(capacity),
            capacity,
            sum: 0,
        }
    }

    pub(crate) fn push(&mut self, term: u64) {
        if self.window.len() == self.capacity {
            self.sum -= self.window.pop_front().expect("window is non-empty");
        }
        self.window.push_back(term);
        self.sum += term;
    }

    pub(crate) fn at_capacity(&self) -> bool {
        self.window.len() == self.capacity
    }

    pub(crate) fn value(&self) -> f64 {
        if self.window.is_empty() {
            0.0
        } else {
            (self.sum as f64) / (self.window.len() as f64)
        }
    }

    pub(crate) fn clear(&mut self) {
        self.window.clear();
        self.sum = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::CumulativeMovingAverage;
    use super::WindowedAverage;

    #[test]
    fn cumulative_average() {
        let mut average = CumulativeMovingAverage::default();
        assert_eq!(average.value(), 0.0);
        average.add_term(2);
        average.add_term(4);
        assert_eq!(average.value(), 3.0);
    }

    #[test]
    fn windowed_average_evicts_oldest() {
        let mut average = WindowedAverage::new(2);
        average.push(10);
        assert!(!average.at_capacity());
        average.push(20);
        assert!(average.at_capacity());
        average.push(30);
        assert_eq!(average.value(), 25.0);

        average.clear();
        assert!(!average.at_capacity());
        assert_eq!(average.value(), 0.0);
    }
}
