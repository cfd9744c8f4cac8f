//! Non-destructive text editing over an immutable original.
//!
//! Every edit is addressed by a byte offset into the original text, so edits
//! can be registered in any order without recomputing positions. The final
//! text is produced on demand by [`EditBuffer::to_string`].
//!
//! Each offset owns two ordered lists of text: left-anchored text sticks to
//! whatever precedes the offset and right-anchored text to what follows it.
//! At a given offset all left text is emitted before all right text, and
//! within one list text appears in registration order. Range replacements
//! anchor their replacement text the same way and suppress the original
//! characters of the range.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct Anchors {
    left: Vec<String>,
    right: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Edit list over an immutable source string.
#[derive(Debug)]
pub struct EditBuffer<'a> {
    input: &'a str,
    anchors: BTreeMap<usize, Anchors>,
    /// Removed ranges, keyed by start; never overlapping.
    removals: BTreeMap<usize, usize>,
}

impl<'a> EditBuffer<'a> {
    /// Create an edit buffer with no edits.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            anchors: BTreeMap::new(),
            removals: BTreeMap::new(),
        }
    }

    /// The original text.
    pub fn original(&self) -> &'a str {
        self.input
    }

    /// Whether no edit has been registered.
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty() && self.removals.is_empty()
    }

    /// Insert `text` at `pos`, attached to the text before it.
    pub fn insert_left(&mut self, pos: usize, text: impl Into<String>) -> Result<()> {
        self.replace(pos, pos, text.into(), Side::Left)
    }

    /// Insert `text` at `pos`, attached to the text after it.
    pub fn insert_right(&mut self, pos: usize, text: impl Into<String>) -> Result<()> {
        self.replace(pos, pos, text.into(), Side::Right)
    }

    /// Remove the original text in `start..end`.
    pub fn delete(&mut self, start: usize, end: usize) -> Result<()> {
        self.replace(start, end, String::new(), Side::Right)
    }

    /// Replace `start..end` with left-anchored `text`.
    pub fn replace_left(
        &mut self,
        start: usize,
        end: usize,
        text: impl Into<String>,
    ) -> Result<()> {
        self.replace(start, end, text.into(), Side::Left)
    }

    /// Replace `start..end` with right-anchored `text`.
    pub fn replace_right(
        &mut self,
        start: usize,
        end: usize,
        text: impl Into<String>,
    ) -> Result<()> {
        self.replace(start, end, text.into(), Side::Right)
    }

    /// Remove leading and trailing whitespace of the original.
    ///
    /// Offsets are unaffected: edits at the original positions still apply.
    pub fn trim(&mut self) -> Result<()> {
        let len = self.input.len();
        let start = len - self.input.trim_start().len();
        if start == len {
            return if len > 0 { self.delete(0, len) } else { Ok(()) };
        }
        let end = self.input.trim_end().len();
        if start > 0 {
            self.delete(0, start)?;
        }
        if end < len {
            self.delete(end, len)?;
        }
        Ok(())
    }

    fn replace(&mut self, start: usize, end: usize, text: String, side: Side) -> Result<()> {
        self.check_offset(start)?;
        self.check_offset(end)?;
        if start > end {
            return Err(Error::Structural(format!(
                "edit range {start}..{end} is reversed"
            )));
        }

        if start < end {
            if let Some((&s, &e)) = self.removals.range(..end).next_back() {
                if s >= start || e > start {
                    return Err(Error::Structural(format!(
                        "edit range {start}..{end} overlaps edit range {s}..{e}"
                    )));
                }
            }
            self.removals.insert(start, end);
        }

        if !text.is_empty() || start == end {
            let anchors = self.anchors.entry(start).or_default();
            match side {
                Side::Left => anchors.left.push(text),
                Side::Right => anchors.right.push(text),
            }
        }
        Ok(())
    }

    fn check_offset(&self, pos: usize) -> Result<()> {
        if pos > self.input.len() {
            return Err(Error::Structural(format!(
                "edit offset {pos} is past the end of the input ({})",
                self.input.len()
            )));
        }
        if !self.input.is_char_boundary(pos) {
            return Err(Error::Structural(format!(
                "edit offset {pos} is not on a character boundary"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for EditBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut points: Vec<usize> = self
            .anchors
            .keys()
            .chain(self.removals.keys())
            .copied()
            .collect();
        points.sort_unstable();
        points.dedup();

        let mut cursor = 0;
        for pos in points {
            if pos > cursor {
                f.write_str(&self.input[cursor..pos])?;
                cursor = pos;
            }
            if let Some(anchors) = self.anchors.get(&pos) {
                for text in anchors.left.iter().chain(&anchors.right) {
                    f.write_str(text)?;
                }
            }
            if let Some(&end) = self.removals.get(&pos) {
                cursor = cursor.max(end);
            }
        }
        f.write_str(&self.input[cursor..])
    }
}
