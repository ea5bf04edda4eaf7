//! Parser for the indented text emitted by `ddcutil detect` and friends.
//!
//! Every non-blank line is indented by a multiple of three whitespace
//! characters and holds either `key: value` or a bare `key`. The parser
//! turns the lines into a rooted tree of [`Node`]s.
//!
//! ```text
//! Display 1
//!    I2C bus:  /dev/i2c-4
//!    EDID synopsis:
//!       Model:  DELL S2721DGF
//! ```

use std::collections::HashMap;

use serde_json::{Value, json};
use tracing::trace;

use crate::error::{BackendError, Result};

/// Number of whitespace characters per indentation level.
const INDENT_WIDTH: usize = 3;

/// One line of indented tool output.
///
/// Children are kept twice: in order of appearance, and in a lookup map by
/// key. Sibling keys are not unique in real tool output; the ordered list
/// keeps every child while the lookup map only remembers the last child
/// registered under a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    key: String,
    value: String,
    indentation: i32,
    children: Vec<Node>,
    child_by_key: HashMap<String, usize>,
}

impl Node {
    /// Create a detached node.
    pub fn new(indentation: i32, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            indentation,
            children: Vec::new(),
            child_by_key: HashMap::new(),
        }
    }

    /// Create the synthetic root: indentation `-1`, empty key and value.
    pub fn root() -> Self {
        Self::new(-1, "", "")
    }

    /// Register `child` in both the ordered list and the key lookup.
    pub fn push_child(&mut self, child: Self) {
        self.child_by_key
            .insert(child.key.clone(), self.children.len());
        self.children.push(child);
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub const fn indentation(&self) -> i32 {
        self.indentation
    }

    /// All children in order of appearance, duplicates included.
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// The last child registered under `key`.
    pub fn child(&self, key: &str) -> Option<&Self> {
        self.child_by_key.get(key).map(|&index| &self.children[index])
    }

    /// Descend through `path` one key at a time.
    ///
    /// Fails with [`BackendError::PathNotFound`] naming the first segment
    /// that has no matching child.
    pub fn descend(&self, path: &[&str]) -> Result<&Self> {
        let mut current = self;
        for segment in path {
            current = current
                .child(segment)
                .ok_or_else(|| BackendError::PathNotFound {
                    segment: (*segment).to_string(),
                    path: path.iter().map(|s| (*s).to_string()).collect(),
                })?;
        }
        Ok(current)
    }

    /// Value of the node at the end of `path`.
    pub fn walk(&self, path: &[&str]) -> Result<&str> {
        self.descend(path).map(Self::value)
    }

    /// Recursive JSON representation, used for debugging and tests.
    pub fn to_json(&self) -> Value {
        json!({
            "key": self.key,
            "value": self.value,
            "indentation": self.indentation,
            "children": self.children.iter().map(Self::to_json).collect::<Vec<_>>(),
        })
    }

    /// Parse a full block of text, splitting it on newlines.
    pub fn parse_text(text: &str) -> Result<Self> {
        Self::parse(text.split('\n'))
    }

    /// Parse a sequence of lines into a tree and return its root.
    pub fn parse<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut slots = vec![Slot::new(None, -1, "", "")];
        let mut previous = 0;

        for line in lines {
            let line = line.as_ref();
            let content = line.trim_start();
            if content.trim().is_empty() {
                continue;
            }

            let whitespace = line.chars().take_while(|c| c.is_whitespace()).count();
            if whitespace % INDENT_WIDTH != 0 {
                return Err(BackendError::Format {
                    line: line.trim().to_string(),
                });
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let indentation = (whitespace / INDENT_WIDTH) as i32;

            let (key, value) = match content.split_once(':') {
                Some((key, value)) => (key.trim(), value.trim()),
                None => (content.trim(), ""),
            };

            let parent = match indentation.cmp(&slots[previous].indentation) {
                std::cmp::Ordering::Equal => slots[previous].parent,
                std::cmp::Ordering::Greater => Some(previous),
                std::cmp::Ordering::Less => {
                    let mut candidate = slots[previous].parent;
                    while let Some(index) = candidate {
                        if slots[index].indentation < indentation {
                            break;
                        }
                        candidate = slots[index].parent;
                    }
                    candidate
                }
            }
            // Only the root has no parent and its indentation is never matched.
            .unwrap_or(0);

            trace!(indentation, key, value, parent, "Parsed line");
            let index = slots.len();
            slots.push(Slot::new(Some(parent), indentation, key, value));
            slots[parent].children.push(index);
            previous = index;
        }

        Ok(Slot::build(&mut slots, 0))
    }
}

/// Flat arena entry used while the tree is being assembled.
struct Slot {
    parent: Option<usize>,
    indentation: i32,
    key: String,
    value: String,
    children: Vec<usize>,
}

impl Slot {
    fn new(parent: Option<usize>, indentation: i32, key: &str, value: &str) -> Self {
        Self {
            parent,
            indentation,
            key: key.to_string(),
            value: value.to_string(),
            children: Vec::new(),
        }
    }

    fn build(slots: &mut [Self], index: usize) -> Node {
        let children = std::mem::take(&mut slots[index].children);
        let mut node = Node::new(
            slots[index].indentation,
            std::mem::take(&mut slots[index].key),
            std::mem::take(&mut slots[index].value),
        );
        for child in children {
            node.push_child(Self::build(slots, child));
        }
        node
    }
}
