//! Array traverser
//!
//! Visits every index tuple of a rank-N array exactly once. The first
//! dimension varies fastest: each step increments dimension 0 and, on
//! overflow, resets it and carries into the next dimension, like an
//! odometer read right to left.
//!
//! ```text
//! dims [2, 3]:  [0,0] [1,0] [0,1] [1,1] [0,2] [1,2]
//! ```

/// Odometer cursor over the index space of an array shape
#[derive(Debug, Clone)]
pub struct Odometer {
    position: Vec<usize>,
    dims: Vec<usize>,
}

impl Odometer {
    /// Create a cursor at the first index tuple
    ///
    /// Returns `None` when the shape has no cells (rank 0 or any
    /// zero-length dimension).
    pub fn new(dims: &[usize]) -> Option<Self> {
        if dims.is_empty() || dims.contains(&0) {
            return None;
        }
        Some(Self {
            position: vec![0; dims.len()],
            dims: dims.to_vec(),
        })
    }

    /// Current index tuple
    pub fn position(&self) -> &[usize] {
        &self.position
    }

    /// Advance to the next index tuple
    ///
    /// Returns false once every tuple has been visited; the position is
    /// left on the last tuple.
    pub fn step(&mut self) -> bool {
        for i in 0..self.position.len() {
            if self.position[i] + 1 < self.dims[i] {
                self.position[i] += 1;
                for j in 0..i {
                    self.position[j] = 0;
                }
                return true;
            }
        }
        false
    }
}

/// Visit every index tuple of `dims`, first dimension fastest
pub fn for_each_index<F>(dims: &[usize], mut visit: F)
where
    F: FnMut(&[usize]),
{
    let Some(mut cursor) = Odometer::new(dims) else {
        return;
    };
    loop {
        visit(cursor.position());
        if !cursor.step() {
            break;
        }
    }
}

/// Visit every index tuple of `dims`, stopping at the first error
pub fn try_for_each_index<F, E>(dims: &[usize], mut visit: F) -> Result<(), E>
where
    F: FnMut(&[usize]) -> Result<(), E>,
{
    let Some(mut cursor) = Odometer::new(dims) else {
        return Ok(());
    };
    loop {
        visit(cursor.position())?;
        if !cursor.step() {
            return Ok(());
        }
    }
}
