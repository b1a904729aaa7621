//! Class-file format versions.

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// A class-file major version, named after the Java release that introduced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum ClassVersion {
    Java1 = 45,
    Java2 = 46,
    Java3 = 47,
    Java4 = 48,
    Java5 = 49,
    Java6 = 50,
    Java7 = 51,
    Java8 = 52,
    Java9 = 53,
    Java10 = 54,
    Java11 = 55,
    Java12 = 56,
    Java13 = 57,
    Java14 = 58,
    Java15 = 59,
    Java16 = 60,
    Java17 = 61,
    Java18 = 62,
}

impl Default for ClassVersion {
    fn default() -> Self {
        ClassVersion::Java8
    }
}

impl ClassVersion {
    /// The class-file major version number.
    pub fn major(self) -> u16 {
        self.into()
    }

    /// The class-file minor version number. Always 0 for the versions listed here.
    pub fn minor(self) -> u16 {
        0
    }
}

impl fmt::Display for ClassVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major(), self.minor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_major_number() {
        assert_eq!(ClassVersion::try_from(61u16).ok(), Some(ClassVersion::Java17));
        assert!(ClassVersion::try_from(44u16).is_err());
        assert!(ClassVersion::try_from(63u16).is_err());
    }

    #[test]
    fn default_is_java8() {
        assert_eq!(ClassVersion::default().major(), 52);
        assert_eq!(ClassVersion::default().to_string(), "52.0");
    }
}
