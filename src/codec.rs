//! Mixed-radix encoding between structured tuples and flat table indices.
//!
//! The learner's tables are dense and indexed by a single integer, while
//! observations and actions are small-integer tuples with known per-position
//! bounds. [`Codec`] maps between the two: encoding folds most-significant
//! component first, decoding extracts least-significant first and reverses.

use thiserror::Error;

/// Encode/decode failures. All of these indicate caller bugs and fail fast.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("tuple has {got} components, codec expects {expected}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("component {position} is {value}, must be < {dim}")]
    ValueOutOfRange {
        position: usize,
        value: usize,
        dim: usize,
    },

    #[error("code {code} is out of range for capacity {capacity}")]
    CodeOutOfRange { code: usize, capacity: usize },
}

/// Bidirectional mapping between bounded tuples and flat indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Codec {
    dims: Vec<usize>,
}

impl Codec {
    /// Creates a codec over the given per-position dimensions.
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Codec for environment observations: one binary idle flag per robot
    /// followed by one pending count per task type.
    ///
    /// A per-type count can reach `max_tasks` on the terminal step (done
    /// triggers at `>= max_tasks`), so the count radix is `max_tasks + 1`.
    pub fn observation(n_robots: usize, n_types: usize, max_tasks: usize) -> Self {
        let mut dims = vec![2; n_robots];
        dims.extend(std::iter::repeat(max_tasks + 1).take(n_types));
        Self::new(dims)
    }

    /// Codec for environment actions: `(robot index, task type or wait)`,
    /// where the value equal to `n_types` is the explicit wait.
    pub fn action(n_robots: usize, n_types: usize) -> Self {
        Self::new(vec![n_robots, n_types + 1])
    }

    /// Per-position dimensions.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Total number of encodable tuples (product of dimensions).
    pub fn capacity(&self) -> usize {
        self.dims.iter().product()
    }

    /// Encodes a tuple into its flat index.
    ///
    /// Folds most-significant-first: `acc = acc * dim[i] + value[i]`.
    pub fn encode(&self, values: &[usize]) -> Result<usize, CodecError> {
        if values.len() != self.dims.len() {
            return Err(CodecError::LengthMismatch {
                expected: self.dims.len(),
                got: values.len(),
            });
        }
        let mut code = 0usize;
        for (position, (&value, &dim)) in values.iter().zip(&self.dims).enumerate() {
            if value >= dim {
                return Err(CodecError::ValueOutOfRange {
                    position,
                    value,
                    dim,
                });
            }
            code = code * dim + value;
        }
        Ok(code)
    }

    /// Decodes a flat index back into its tuple.
    ///
    /// Extracts the least-significant component first by divmod against the
    /// reversed dimension list, then reverses into positional order.
    pub fn decode(&self, code: usize) -> Result<Vec<usize>, CodecError> {
        let capacity = self.capacity();
        if code >= capacity {
            return Err(CodecError::CodeOutOfRange { code, capacity });
        }
        let mut rest = code;
        let mut values = Vec::with_capacity(self.dims.len());
        for &dim in self.dims.iter().rev() {
            values.push(rest % dim);
            rest /= dim;
        }
        values.reverse();
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_folds_most_significant_first() {
        let codec = Codec::new(vec![2, 3]);
        assert_eq!(codec.encode(&[1, 2]).unwrap(), 5);
        assert_eq!(codec.encode(&[0, 0]).unwrap(), 0);
    }

    #[test]
    fn round_trip_is_exhaustive() {
        let codec = Codec::new(vec![2, 3, 4]);
        for a in 0..2 {
            for b in 0..3 {
                for c in 0..4 {
                    let tuple = vec![a, b, c];
                    let code = codec.encode(&tuple).unwrap();
                    assert_eq!(codec.decode(code).unwrap(), tuple);
                }
            }
        }
    }

    #[test]
    fn every_code_decodes_uniquely() {
        let codec = Codec::new(vec![3, 2, 5]);
        let mut seen = vec![false; codec.capacity()];
        for code in 0..codec.capacity() {
            let tuple = codec.decode(code).unwrap();
            let back = codec.encode(&tuple).unwrap();
            assert_eq!(back, code);
            assert!(!seen[code]);
            seen[code] = true;
        }
    }

    #[test]
    fn out_of_range_component_fails() {
        let codec = Codec::new(vec![2, 3]);
        assert_eq!(
            codec.encode(&[0, 3]),
            Err(CodecError::ValueOutOfRange {
                position: 1,
                value: 3,
                dim: 3
            })
        );
    }

    #[test]
    fn arity_mismatch_fails() {
        let codec = Codec::new(vec![2, 3]);
        assert_eq!(
            codec.encode(&[1]),
            Err(CodecError::LengthMismatch {
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn out_of_range_code_fails() {
        let codec = Codec::new(vec![2, 3]);
        assert_eq!(
            codec.decode(6),
            Err(CodecError::CodeOutOfRange {
                code: 6,
                capacity: 6
            })
        );
    }

    #[test]
    fn observation_codec_dims() {
        let codec = Codec::observation(2, 3, 10);
        assert_eq!(codec.dims(), &[2, 2, 11, 11, 11]);
    }

    #[test]
    fn action_codec_includes_wait() {
        let codec = Codec::action(2, 2);
        assert_eq!(codec.dims(), &[2, 3]);
        assert_eq!(codec.capacity(), 6);
        // Wait for robot 1 is the last action index.
        assert_eq!(codec.encode(&[1, 2]).unwrap(), 5);
    }
}
