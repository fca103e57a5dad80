//! Filesystem change events

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::path::{Path, PathBuf};

/// Set of operations reported for a single path
///
/// One notification may carry several operations at once, so this is a
/// bitset rather than an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Op(u8);

impl Op {
    /// File or directory created
    pub const CREATE: Op = Op(1 << 0);
    /// File contents written
    pub const WRITE: Op = Op(1 << 1);
    /// File or directory removed
    pub const REMOVE: Op = Op(1 << 2);
    /// File or directory renamed
    pub const RENAME: Op = Op(1 << 3);
    /// Attributes (permissions, timestamps, ownership) changed
    pub const CHMOD: Op = Op(1 << 4);

    const NAMES: [(Op, &'static str); 5] = [
        (Op::CREATE, "CREATE"),
        (Op::WRITE, "WRITE"),
        (Op::REMOVE, "REMOVE"),
        (Op::RENAME, "RENAME"),
        (Op::CHMOD, "CHMOD"),
    ];

    /// The empty set
    pub const fn empty() -> Self {
        Op(0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every operation in `other` is also in `self`
    pub const fn contains(self, other: Op) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if `self` and `other` share at least one operation
    pub const fn intersects(self, other: Op) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for Op {
    type Output = Op;

    fn bitor(self, rhs: Op) -> Op {
        Op(self.0 | rhs.0)
    }
}

impl BitOrAssign for Op {
    fn bitor_assign(&mut self, rhs: Op) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }

        let mut first = true;
        for (op, name) in Op::NAMES {
            if self.contains(op) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A single filesystem notification for one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Path that changed
    pub path: PathBuf,
    /// Operations observed on the path
    pub op: Op,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, op: Op) -> Self {
        Self {
            path: path.into(),
            op,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path.display(), self.op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_set_operations() {
        let op = Op::WRITE | Op::CHMOD;

        assert!(op.contains(Op::WRITE));
        assert!(op.contains(Op::CHMOD));
        assert!(!op.contains(Op::CREATE));
        assert!(op.intersects(Op::WRITE | Op::CREATE));
        assert!(!op.intersects(Op::REMOVE | Op::RENAME));
    }

    #[test]
    fn test_empty_op() {
        let op = Op::empty();
        assert!(op.is_empty());
        assert!(!op.intersects(Op::WRITE));
        assert_eq!(op.to_string(), "NONE");
    }

    #[test]
    fn test_op_display_joins_names_in_fixed_order() {
        let mut op = Op::CHMOD;
        op |= Op::CREATE;
        assert_eq!(op.to_string(), "CREATE|CHMOD");
        assert_eq!(Op::WRITE.to_string(), "WRITE");
    }

    #[test]
    fn test_change_event_display() {
        let event = ChangeEvent::new("/etc/agent/conf.d/a.conf", Op::WRITE);
        assert_eq!(event.to_string(), "/etc/agent/conf.d/a.conf (WRITE)");
        assert_eq!(event.path(), Path::new("/etc/agent/conf.d/a.conf"));
    }
}
