use super::{InstructionHandle, Opcode};
use crate::jvm::{Error, Serialize};
use std::convert::TryFrom;

/// Multi-way branch, encoded as either a `tableswitch` or a `lookupswitch`
///
/// Both forms jump to `default` when no match value is equal to the scrutinee. A `tableswitch` is
/// more compact when match values are dense, while a `lookupswitch` is better for sparse ones.
#[derive(Clone, Debug)]
pub enum Select {
    /// Targets for every value in `low..low + targets.len()`
    Table {
        default: InstructionHandle,
        low: i32,
        targets: Vec<InstructionHandle>,
    },

    /// Targets for individual values, sorted by value
    Lookup {
        default: InstructionHandle,
        pairs: Vec<(i32, InstructionHandle)>,
    },
}

/// Largest `tableswitch` that `Select::new` will build
///
/// Each entry takes 4 bytes, so a longer table could never fit in a method body.
pub const MAX_TABLE_TARGETS: i64 = 16_383;

impl Select {
    /// Pick the best switch form for the given match values
    ///
    /// Match values get sorted first. When every gap between consecutive values is at most
    /// `max_gap` and the table spans at most `MAX_TABLE_TARGETS` values, the result is a
    /// `tableswitch` with the holes pointing at `default`. Otherwise, it is a `lookupswitch`.
    /// Duplicate match values are rejected.
    pub fn new(
        matches: Vec<(i32, InstructionHandle)>,
        default: InstructionHandle,
        max_gap: i32,
    ) -> Result<Select, Error> {
        let pairs = Select::sorted_pairs(matches)?;

        if pairs.is_empty() {
            return Ok(Select::Lookup { default, pairs });
        }

        let dense = pairs
            .windows(2)
            .all(|window| window[1].0 as i64 - window[0].0 as i64 <= max_gap as i64);
        let low = pairs[0].0;
        let span = pairs[pairs.len() - 1].0 as i64 - low as i64 + 1;
        if !dense || span > MAX_TABLE_TARGETS {
            return Ok(Select::Lookup { default, pairs });
        }

        let mut targets = vec![];
        for (value, target) in pairs {
            while low as i64 + (targets.len() as i64) < value as i64 {
                targets.push(default);
            }
            targets.push(target);
        }
        Ok(Select::Table {
            default,
            low,
            targets,
        })
    }

    /// Explicitly construct a `lookupswitch`
    pub fn lookup(
        matches: Vec<(i32, InstructionHandle)>,
        default: InstructionHandle,
    ) -> Result<Select, Error> {
        let pairs = Select::sorted_pairs(matches)?;
        Ok(Select::Lookup { default, pairs })
    }

    /// Explicitly construct a `tableswitch`
    pub fn table(
        low: i32,
        targets: Vec<InstructionHandle>,
        default: InstructionHandle,
    ) -> Result<Select, Error> {
        if targets.is_empty() || low as i64 + targets.len() as i64 - 1 > i32::MAX as i64 {
            let msg = format!("tableswitch from {} with {} targets", low, targets.len());
            return Err(Error::InvalidInstruction(msg));
        }
        Ok(Select::Table {
            default,
            low,
            targets,
        })
    }

    fn sorted_pairs(
        mut matches: Vec<(i32, InstructionHandle)>,
    ) -> Result<Vec<(i32, InstructionHandle)>, Error> {
        matches.sort_by_key(|(value, _)| *value);
        if let Some(window) = matches.windows(2).find(|window| window[0].0 == window[1].0) {
            let msg = format!("duplicate switch match value {}", window[0].0);
            return Err(Error::InvalidInstruction(msg));
        }
        Ok(matches)
    }

    pub fn opcode(&self) -> Opcode {
        match self {
            Select::Table { .. } => Opcode::TABLESWITCH,
            Select::Lookup { .. } => Opcode::LOOKUPSWITCH,
        }
    }

    pub fn default_target(&self) -> InstructionHandle {
        match self {
            Select::Table { default, .. } | Select::Lookup { default, .. } => *default,
        }
    }

    /// Every target, starting with the default (may contain repeats)
    pub fn targets(&self) -> Vec<InstructionHandle> {
        let mut all = vec![self.default_target()];
        match self {
            Select::Table { targets, .. } => all.extend(targets.iter().copied()),
            Select::Lookup { pairs, .. } => all.extend(pairs.iter().map(|(_, target)| *target)),
        }
        all
    }

    /// Match values and their targets, sorted by value
    pub fn matches(&self) -> Vec<(i32, InstructionHandle)> {
        match self {
            Select::Table { low, targets, .. } => targets
                .iter()
                .enumerate()
                .map(|(offset, target)| (low.wrapping_add(offset as i32), *target))
                .collect(),
            Select::Lookup { pairs, .. } => pairs.clone(),
        }
    }

    /// Rewrite every target (including the default) through `map`
    pub fn map_targets(&mut self, mut map: impl FnMut(InstructionHandle) -> InstructionHandle) {
        match self {
            Select::Table {
                default, targets, ..
            } => {
                *default = map(*default);
                for target in targets.iter_mut() {
                    *target = map(*target);
                }
            }
            Select::Lookup { default, pairs } => {
                *default = map(*default);
                for (_, target) in pairs.iter_mut() {
                    *target = map(*target);
                }
            }
        }
    }

    /// Zero bytes after the opcode so that the operands are 4-byte aligned
    pub fn padding(position: u32) -> usize {
        3 - (position as usize % 4)
    }

    /// Encoded length when the opcode sits at `position`
    pub fn length(&self, position: u32) -> usize {
        let padding = Select::padding(position);
        match self {
            Select::Table { targets, .. } => 1 + padding + 4 * (3 + targets.len()),
            Select::Lookup { pairs, .. } => 1 + padding + 8 * (1 + pairs.len()),
        }
    }

    /// Encode the padding and operands (everything but the opcode)
    pub fn encode_operands(
        &self,
        position: u32,
        position_of: &dyn Fn(InstructionHandle) -> Result<u32, Error>,
        operands: &mut Vec<u8>,
    ) -> Result<(), Error> {
        let offset = |target: InstructionHandle| -> Result<i32, Error> {
            let displacement = position_of(target)? as i64 - position as i64;
            i32::try_from(displacement).map_err(|_| Error::JumpOverflow {
                branch: target,
                displacement: displacement as isize,
            })
        };
        let put = |operands: &mut Vec<u8>, value: i32| {
            value.serialize(operands).map_err(Error::IoError)
        };

        operands.extend(std::iter::repeat(0u8).take(Select::padding(position)));
        put(operands, offset(self.default_target())?)?;
        match self {
            Select::Table { low, targets, .. } => {
                put(operands, *low)?;
                put(operands, low + targets.len() as i32 - 1)?;
                for target in targets {
                    put(operands, offset(*target)?)?;
                }
            }
            Select::Lookup { pairs, .. } => {
                put(operands, pairs.len() as i32)?;
                for (value, target) in pairs {
                    put(operands, *value)?;
                    put(operands, offset(*target)?)?;
                }
            }
        }
        Ok(())
    }

    pub(super) fn render_with(&self, label: &dyn Fn(InstructionHandle) -> String) -> String {
        let mut rendered = format!("{} {{", self.opcode());
        for (value, target) in self.matches() {
            rendered.push_str(&format!(" {}: {},", value, label(target)));
        }
        rendered.push_str(&format!(" default: {} }}", label(self.default_target())));
        rendered
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn h(n: u32) -> InstructionHandle {
        InstructionHandle(n)
    }

    #[test]
    fn dense_matches_make_a_table() {
        let select = Select::new(vec![(2, h(3)), (0, h(1)), (3, h(4)), (1, h(2))], h(9), 1).unwrap();
        match select {
            Select::Table {
                default,
                low,
                targets,
            } => {
                assert_eq!(default, h(9));
                assert_eq!(low, 0);
                assert_eq!(targets, vec![h(1), h(2), h(3), h(4)]);
            }
            other => panic!("expected tableswitch, got {:?}", other),
        }
    }

    #[test]
    fn sparse_matches_make_a_lookup() {
        let select = Select::new(vec![(500, h(3)), (0, h(1)), (100, h(2))], h(9), 1).unwrap();
        assert_eq!(select.opcode(), Opcode::LOOKUPSWITCH);
        assert_eq!(select.matches(), vec![(0, h(1)), (100, h(2)), (500, h(3))]);
    }

    #[test]
    fn gaps_within_max_gap_are_filled_with_default() {
        let select = Select::new(vec![(0, h(1)), (1, h(2)), (3, h(3))], h(9), 2).unwrap();
        match select {
            Select::Table { low, targets, .. } => {
                assert_eq!(low, 0);
                assert_eq!(targets, vec![h(1), h(2), h(9), h(3)]);
            }
            other => panic!("expected tableswitch, got {:?}", other),
        }
    }

    #[test]
    fn huge_tables_fall_back_to_lookup() {
        let matches = vec![(i32::MIN, h(1)), (i32::MAX, h(2))];
        let select = Select::new(matches, h(9), i32::MAX).unwrap();
        assert_eq!(select.opcode(), Opcode::LOOKUPSWITCH);

        let select = Select::new(vec![(0, h(1)), (MAX_TABLE_TARGETS as i32, h(2))], h(9), i32::MAX)
            .unwrap();
        assert_eq!(select.opcode(), Opcode::LOOKUPSWITCH);

        let select = Select::new(
            vec![(0, h(1)), (MAX_TABLE_TARGETS as i32 - 1, h(2))],
            h(9),
            i32::MAX,
        )
        .unwrap();
        assert_eq!(select.opcode(), Opcode::TABLESWITCH);
    }

    #[test]
    fn degenerate_switches() {
        let single = Select::new(vec![(7, h(1))], h(2), 1).unwrap();
        assert_eq!(single.opcode(), Opcode::TABLESWITCH);
        assert_eq!(single.matches(), vec![(7, h(1))]);

        let empty = Select::new(vec![], h(2), 1).unwrap();
        assert_eq!(empty.opcode(), Opcode::LOOKUPSWITCH);
        assert_eq!(empty.targets(), vec![h(2)]);

        let extremes = Select::new(vec![(i32::MIN, h(1)), (i32::MAX, h(2))], h(3), 1).unwrap();
        assert_eq!(extremes.opcode(), Opcode::LOOKUPSWITCH);
    }

    #[test]
    fn duplicate_match_values() {
        let result = Select::new(vec![(1, h(1)), (1, h(2))], h(3), 1);
        assert!(matches!(result, Err(Error::InvalidInstruction(_))));
    }

    #[test]
    fn padding_aligns_operands() {
        let select = Select::new(vec![(0, h(1)), (1, h(2))], h(3), 1).unwrap();
        assert_eq!(Select::padding(0), 3);
        assert_eq!(Select::padding(3), 0);
        assert_eq!(Select::padding(6), 1);
        assert_eq!(select.length(0), 1 + 3 + 4 * 5);
        assert_eq!(select.length(3), 1 + 4 * 5);
    }

    #[test]
    fn encoded_operands() {
        let select = Select::new(vec![(10, h(1)), (20, h(2))], h(3), 1).unwrap();
        let positions = |handle: InstructionHandle| Ok(handle.0 * 100);
        let mut operands = vec![];
        select.encode_operands(1, &positions, &mut operands).unwrap();
        assert_eq!(
            operands,
            vec![
                0, 0, // padding
                0, 0, 1, 43, // default: 300 - 1
                0, 0, 0, 2, // npairs
                0, 0, 0, 10, 0, 0, 0, 99, // 10 => 100 - 1
                0, 0, 0, 20, 0, 0, 0, 199, // 20 => 200 - 1
            ]
        );
        assert_eq!(operands.len() + 1, select.length(1));
    }

    #[test]
    fn mapping_targets() {
        let mut select = Select::new(vec![(0, h(1)), (1, h(2))], h(1), 1).unwrap();
        select.map_targets(|target| InstructionHandle(target.0 + 10));
        assert_eq!(select.targets(), vec![h(11), h(11), h(12)]);
    }
}
