/*!
 * Strict Priority
 * Lower-numbered queues are always preferred; no aging
 */

use super::PriorityPattern;
use crate::core::errors::KernelError;
use crate::core::limits::{DEFAULT_PRIORITY_LEVELS, MAX_PRIORITY_LEVELS};
use crate::core::types::{KernelResult, Priority};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrictPriority {
    levels: usize,
}

impl StrictPriority {
    pub fn new(levels: usize) -> KernelResult<Self> {
        if levels == 0 || levels > MAX_PRIORITY_LEVELS {
            return Err(KernelError::Configuration(format!(
                "priority levels must be in 1..={}",
                MAX_PRIORITY_LEVELS
            )));
        }
        Ok(Self { levels })
    }
}

impl Default for StrictPriority {
    fn default() -> Self {
        Self {
            levels: DEFAULT_PRIORITY_LEVELS,
        }
    }
}

impl PriorityPattern for StrictPriority {
    fn levels(&self) -> usize {
        self.levels
    }

    fn queue_index(&self, priority: Priority, _age: u32) -> usize {
        (priority as usize).min(self.levels - 1)
    }

    fn name(&self) -> &'static str {
        "strict"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_priority() {
        let pattern = StrictPriority::new(4).unwrap();
        assert_eq!(pattern.max_priority(), 3);
        assert_eq!(pattern.queue_index(0, 100), 0);
        assert_eq!(pattern.queue_index(3, 0), 3);
        assert!(pattern.accepts(3));
        assert!(!pattern.accepts(4));
    }

    #[test]
    fn test_level_bounds() {
        assert!(StrictPriority::new(0).is_err());
        assert!(StrictPriority::new(MAX_PRIORITY_LEVELS + 1).is_err());
        assert_eq!(
            StrictPriority::new(MAX_PRIORITY_LEVELS)
                .unwrap()
                .max_priority(),
            Priority::MAX
        );
    }
}
