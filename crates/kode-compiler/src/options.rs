//! Options controlling class emission.

use kode_core::ClassVersion;

/// Options for a [`ClassBuilder`](crate::emit::ClassBuilder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Class-file version written to the output.
    pub class_version: ClassVersion,
    /// Whether finished methods carry local-variable debug records.
    pub emit_local_variable_table: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            class_version: ClassVersion::default(),
            emit_local_variable_table: true,
        }
    }
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class_version(mut self, version: ClassVersion) -> Self {
        self.class_version = version;
        self
    }

    pub fn with_local_variable_table(mut self, enabled: bool) -> Self {
        self.emit_local_variable_table = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = BuildOptions::default();
        assert_eq!(options.class_version, ClassVersion::Java8);
        assert!(options.emit_local_variable_table);
    }

    #[test]
    fn setters() {
        let options = BuildOptions::new()
            .with_class_version(ClassVersion::Java17)
            .with_local_variable_table(false);
        assert_eq!(options.class_version.major(), 61);
        assert!(!options.emit_local_variable_table);
    }
}
