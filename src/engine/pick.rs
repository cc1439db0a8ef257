use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Chooses an index in `0..n` for a non-empty candidate list.
pub trait RandomPick {
    fn pick(&mut self, n: usize) -> usize;
}

impl<F> RandomPick for F
where
    F: FnMut(usize) -> usize,
{
    fn pick(&mut self, n: usize) -> usize {
        self(n)
    }
}

#[derive(Debug, Default)]
pub struct ThreadRngPicker;

impl RandomPick for ThreadRngPicker {
    fn pick(&mut self, n: usize) -> usize {
        rand::rng().random_range(0..n)
    }
}

#[derive(Debug)]
pub struct SeededPicker {
    rng: StdRng,
}

impl SeededPicker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomPick for SeededPicker {
    fn pick(&mut self, n: usize) -> usize {
        self.rng.random_range(0..n)
    }
}

/// Picks one item, clamping out-of-range indices to the last item.
pub fn pick_one<'a, T, P>(items: &[&'a T], picker: &mut P) -> Option<&'a T>
where
    P: RandomPick + ?Sized,
{
    if items.is_empty() {
        return None;
    }
    let index = picker.pick(items.len()).min(items.len() - 1);
    Some(items[index])
}
