//! Program reflection data

use std::collections::HashMap;

/// Uniform and attribute name-to-location mapping of a linked program
///
/// Computed once at link time; immutable afterwards. Lookups against a
/// name the program does not expose return `None` rather than a sentinel
/// location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramReflection {
    uniforms: HashMap<String, i32>,
    attributes: HashMap<String, i32>,
}

impl ProgramReflection {
    pub(crate) fn add_uniform(&mut self, name: impl Into<String>, location: i32) {
        self.uniforms.insert(name.into(), location);
    }

    pub(crate) fn add_attribute(&mut self, name: impl Into<String>, location: i32) {
        self.attributes.insert(name.into(), location);
    }

    /// Location of a uniform by name
    pub fn uniform_location(&self, name: &str) -> Option<i32> {
        self.uniforms.get(name).copied()
    }

    /// Location of a vertex attribute by name
    pub fn attribute_location(&self, name: &str) -> Option<i32> {
        self.attributes.get(name).copied()
    }

    /// Number of active uniforms
    pub fn uniform_count(&self) -> usize {
        self.uniforms.len()
    }

    /// Iterate over uniform names and locations
    pub fn uniforms(&self) -> impl Iterator<Item = (&str, i32)> {
        self.uniforms.iter().map(|(name, loc)| (name.as_str(), *loc))
    }
}
