//! Instance paths
//!
//! A borrowed linked list from the current value back to the root of the
//! instance. Nothing is allocated while validation descends; the path is
//! rendered to a JSON pointer only when a mismatch is reported.

use crate::graph::pointer::escape;

#[derive(Debug, Clone, Copy)]
pub enum InstancePath<'a> {
    Root,
    Key(&'a InstancePath<'a>, &'a str),
    Index(&'a InstancePath<'a>, usize),
}

impl<'a> InstancePath<'a> {
    pub fn key(&'a self, key: &'a str) -> InstancePath<'a> {
        InstancePath::Key(self, key)
    }

    pub fn index(&'a self, index: usize) -> InstancePath<'a> {
        InstancePath::Index(self, index)
    }

    /// Render as a JSON pointer (`""` for the root)
    pub fn to_pointer(&self) -> String {
        let mut segments = Vec::new();
        let mut current = self;
        loop {
            match current {
                InstancePath::Root => break,
                InstancePath::Key(parent, key) => {
                    segments.push(escape(key));
                    current = parent;
                }
                InstancePath::Index(parent, index) => {
                    segments.push(index.to_string());
                    current = parent;
                }
            }
        }

        segments.iter().rev().fold(String::new(), |mut acc, s| {
            acc.push('/');
            acc.push_str(s);
            acc
        })
    }
}
