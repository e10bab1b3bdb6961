//! Operation codes carried in every request header.

use std::fmt;

/// The kind of cache operation a request performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum OpCode {
    /// Store a value, overwriting any previous mapping.
    Put = 1000,
    /// Read the value mapped to a key.
    Get = 1001,
    /// Check whether a key is mapped.
    ContainsKey = 1002,
    /// Remove a key's mapping.
    Remove = 1003,
    /// Remove every mapping cluster-wide.
    RemoveAll = 1004,
    /// Clear a single key's local copy.
    ClearKey = 1005,
    /// Clear the whole cache without transactional semantics.
    ClearAll = 1006,
    /// Read already-resident data only.
    LocalPeek = 1007,
    /// Count entries on one node.
    GetSize = 1008,
    /// Ask for the current partition table.
    RefreshAffinity = 1009,
}

impl OpCode {
    /// Returns the wire value of this opcode.
    pub fn value(self) -> i16 {
        self as i16
    }

    /// Creates an opcode from its wire value.
    ///
    /// Returns `None` if the value doesn't correspond to a known operation.
    pub fn from_value(value: i16) -> Option<Self> {
        match value {
            1000 => Some(Self::Put),
            1001 => Some(Self::Get),
            1002 => Some(Self::ContainsKey),
            1003 => Some(Self::Remove),
            1004 => Some(Self::RemoveAll),
            1005 => Some(Self::ClearKey),
            1006 => Some(Self::ClearAll),
            1007 => Some(Self::LocalPeek),
            1008 => Some(Self::GetSize),
            1009 => Some(Self::RefreshAffinity),
            _ => None,
        }
    }

    /// Returns `true` for operations that enlist in an active transaction.
    pub fn is_transactional(self) -> bool {
        matches!(self, Self::Put | Self::Remove | Self::RemoveAll)
    }

    /// Returns `true` for operations routed by a key.
    pub fn is_keyed(self) -> bool {
        matches!(
            self,
            Self::Put
                | Self::Get
                | Self::ContainsKey
                | Self::Remove
                | Self::ClearKey
                | Self::LocalPeek
        )
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Put => "PUT",
            Self::Get => "GET",
            Self::ContainsKey => "CONTAINS_KEY",
            Self::Remove => "REMOVE",
            Self::RemoveAll => "REMOVE_ALL",
            Self::ClearKey => "CLEAR_KEY",
            Self::ClearAll => "CLEAR_ALL",
            Self::LocalPeek => "LOCAL_PEEK",
            Self::GetSize => "GET_SIZE",
            Self::RefreshAffinity => "REFRESH_AFFINITY",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OpCode; 10] = [
        OpCode::Put,
        OpCode::Get,
        OpCode::ContainsKey,
        OpCode::Remove,
        OpCode::RemoveAll,
        OpCode::ClearKey,
        OpCode::ClearAll,
        OpCode::LocalPeek,
        OpCode::GetSize,
        OpCode::RefreshAffinity,
    ];

    #[test]
    fn test_from_value_matches_value() {
        for op in ALL {
            assert_eq!(OpCode::from_value(op.value()), Some(op));
        }
    }

    #[test]
    fn test_from_value_unknown() {
        assert_eq!(OpCode::from_value(0), None);
        assert_eq!(OpCode::from_value(-1), None);
    }

    #[test]
    fn test_transactional_operations() {
        let transactional: Vec<_> = ALL.iter().filter(|op| op.is_transactional()).collect();
        assert_eq!(
            transactional,
            vec![&OpCode::Put, &OpCode::Remove, &OpCode::RemoveAll]
        );
    }

    #[test]
    fn test_keyed_operations() {
        assert!(OpCode::LocalPeek.is_keyed());
        assert!(!OpCode::GetSize.is_keyed());
        assert!(!OpCode::ClearAll.is_keyed());
    }

    #[test]
    fn test_display() {
        assert_eq!(OpCode::ContainsKey.to_string(), "CONTAINS_KEY");
        assert_eq!(OpCode::RefreshAffinity.to_string(), "REFRESH_AFFINITY");
    }
}
