/// produces: [ lerp(start, end, i / steps) | i <- 0..n ]
///
/// with n == steps the end is excluded (half-open ramp, e.g. colorbar
/// stripes), with n == steps + 1 it is included (numpy-like linspace).
///
/// lerp(a, b, p) = (1 - p) * a + p * b
#[derive(Clone, Debug)]
pub struct Linspace {
    current: u64,
    current_back: u64,
    steps: u64,
    start: f64,
    end: f64,
}

impl Linspace {
    /// `steps` values from start, end excluded
    pub fn half_open(start: f64, end: f64, steps: u64) -> Self {
        Linspace {
            current: 0,
            current_back: steps,
            steps,
            start,
            end,
        }
    }

    /// `n` evenly spaced values, both start and end included
    pub fn inclusive(start: f64, end: f64, n: u64) -> Self {
        match n {
            0 => Self::half_open(start, end, 0),
            1 => Self::half_open(start, end, 1),
            _ => Linspace {
                current: 0,
                current_back: n,
                steps: n - 1,
                start,
                end,
            },
        }
    }

    /// multiples of step inside [start, end], e.g. axis ticks
    pub fn multiples(start: f64, end: f64, step: f64) -> Self {
        if !(step > 0.) || !(end >= start) {
            return Self::half_open(start, end, 0);
        }
        let first = (start / step).ceil();
        let last = (end / step + 1e-9).floor();
        if last < first {
            return Self::half_open(start, end, 0);
        }
        let n = (last - first) as u64 + 1;
        Self::inclusive(first * step, last * step, n)
    }

    pub fn length(&self) -> u64 {
        self.current_back - self.current
    }

    fn at(&self, pos: u64) -> f64 {
        if self.steps == 0 {
            return self.start;
        }
        let f_pos = pos as f64 / self.steps as f64;
        (1. - f_pos) * self.start + f_pos * self.end
    }

    /// panics (in debug) when len doesn't fit in usize
    fn usize_len(&self) -> usize {
        let l = self.length();
        debug_assert!(l <= usize::MAX as u64);
        l as usize
    }
}

impl Iterator for Linspace {
    type Item = f64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.current_back {
            return None;
        }
        let result = self.at(self.current);
        self.current += 1;
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let l = self.usize_len();
        (l, Some(l))
    }
}

impl DoubleEndedIterator for Linspace {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.current >= self.current_back {
            return None;
        }
        self.current_back -= 1;
        Some(self.at(self.current_back))
    }
}

impl ExactSizeIterator for Linspace {}
