use core::fmt;
use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign};
use core::str::FromStr;

use crate::errors::AuthzError;

/// Access rights on a path: a small bitset over read and write.
///
/// Recursion is a query modifier, not a right, so it has no flag here; it
/// travels as a separate argument wherever queries are made.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Access(u8);

impl Access {
    pub const NONE: Access = Access(0);
    pub const READ: Access = Access(1);
    pub const WRITE: Access = Access(1 << 1);
    pub const READ_WRITE: Access = Access(1 | 1 << 1);

    /// True if every right in `required` is also in `self`.
    pub fn contains(self, required: Access) -> bool {
        self.0 & required.0 == required.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Rights granted by a rule value: any `r` grants read, any `w` grants
    /// write.  Other non-whitespace characters are rejected by validation
    /// before this is ever reached.
    pub fn from_rule_value(value: &str) -> Access {
        let mut rights = Access::NONE;
        if value.contains('r') {
            rights |= Access::READ;
        }
        if value.contains('w') {
            rights |= Access::WRITE;
        }
        rights
    }
}

impl BitOr for Access {
    type Output = Access;

    fn bitor(self, rhs: Access) -> Access {
        Access(self.0 | rhs.0)
    }
}

impl BitOrAssign for Access {
    fn bitor_assign(&mut self, rhs: Access) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Access {
    type Output = Access;

    fn bitand(self, rhs: Access) -> Access {
        Access(self.0 & rhs.0)
    }
}

impl BitAndAssign for Access {
    fn bitand_assign(&mut self, rhs: Access) {
        self.0 &= rhs.0;
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.contains(Access::READ), self.contains(Access::WRITE)) {
            (true, true) => write!(f, "rw"),
            (true, false) => write!(f, "r"),
            (false, true) => write!(f, "w"),
            (false, false) => write!(f, "no"),
        }
    }
}

impl FromStr for Access {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r" => Ok(Access::READ),
            "w" => Ok(Access::WRITE),
            "rw" | "wr" => Ok(Access::READ_WRITE),
            "no" => Ok(Access::NONE),
            other => Err(AuthzError::InvalidConfig(format!(
                "Unknown access string '{other}' (expected r, w, or rw)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_operations() {
        assert_eq!(Access::READ | Access::WRITE, Access::READ_WRITE);
        assert_eq!(Access::READ_WRITE & Access::READ, Access::READ);
        assert!(Access::READ_WRITE.contains(Access::READ));
        assert!(Access::READ_WRITE.contains(Access::NONE));
        assert!(!Access::READ.contains(Access::WRITE));
        assert!(Access::NONE.is_empty());

        let mut rights = Access::NONE;
        rights |= Access::WRITE;
        rights &= Access::READ_WRITE;
        assert_eq!(rights, Access::WRITE);
    }

    #[test]
    fn test_from_rule_value() {
        assert_eq!(Access::from_rule_value("rw"), Access::READ_WRITE);
        assert_eq!(Access::from_rule_value(" r "), Access::READ);
        assert_eq!(Access::from_rule_value("w r"), Access::READ_WRITE);
        assert_eq!(Access::from_rule_value(""), Access::NONE);
        assert_eq!(Access::from_rule_value("   "), Access::NONE);
    }

    #[test]
    fn test_display() {
        assert_eq!(Access::READ_WRITE.to_string(), "rw");
        assert_eq!(Access::READ.to_string(), "r");
        assert_eq!(Access::WRITE.to_string(), "w");
        assert_eq!(Access::NONE.to_string(), "no");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("r".parse::<Access>().unwrap(), Access::READ);
        assert_eq!("rw".parse::<Access>().unwrap(), Access::READ_WRITE);
        assert!("rwx".parse::<Access>().is_err());
    }
}
