//! Command Stack - Bounded Undo/Redo History
//!
//! Every document edit is an explicit `DocumentCommand` carrying the minimal
//! data needed to invert it, not a closure over ambient state. The stack is a
//! linear history with a cursor; pushing past capacity silently evicts the
//! oldest entry.

use std::collections::VecDeque;

use crate::document::{DocumentError, ImageHandle, MasterDocument, PlacedObject};

pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// A reversible edit against a `MasterDocument`.
#[derive(Debug, Clone)]
pub enum DocumentCommand {
    AddObject {
        index: usize,
        object: PlacedObject,
    },
    RemoveObject {
        index: usize,
        /// The removed object, recorded so the command can be inverted.
        object: PlacedObject,
    },
    MoveObject {
        index: usize,
        from: (f32, f32),
        to: (f32, f32),
    },
    ReplaceObject {
        index: usize,
        before: PlacedObject,
        after: PlacedObject,
    },
    SetHero {
        before: Option<ImageHandle>,
        after: Option<ImageHandle>,
    },
}

impl DocumentCommand {
    /// Apply the edit (also used for redo).
    pub fn apply(&self, doc: &mut MasterDocument) -> Result<(), DocumentError> {
        match self {
            DocumentCommand::AddObject { index, object } => {
                doc.insert_object_raw(*index, object.clone())
            }
            DocumentCommand::RemoveObject { index, .. } => {
                doc.remove_object_raw(*index).map(|_| ())
            }
            DocumentCommand::MoveObject { index, to, .. } => {
                doc.object_mut_raw(*index)?.set_position(to.0, to.1);
                Ok(())
            }
            DocumentCommand::ReplaceObject { index, after, .. } => {
                *doc.object_mut_raw(*index)? = after.clone();
                Ok(())
            }
            DocumentCommand::SetHero { after, .. } => {
                doc.set_hero_raw(after.clone());
                Ok(())
            }
        }
    }

    /// Invert the edit.
    pub fn revert(&self, doc: &mut MasterDocument) -> Result<(), DocumentError> {
        match self {
            DocumentCommand::AddObject { index, .. } => doc.remove_object_raw(*index).map(|_| ()),
            DocumentCommand::RemoveObject { index, object } => {
                doc.insert_object_raw(*index, object.clone())
            }
            DocumentCommand::MoveObject { index, from, .. } => {
                doc.object_mut_raw(*index)?.set_position(from.0, from.1);
                Ok(())
            }
            DocumentCommand::ReplaceObject { index, before, .. } => {
                *doc.object_mut_raw(*index)? = before.clone();
                Ok(())
            }
            DocumentCommand::SetHero { before, .. } => {
                doc.set_hero_raw(before.clone());
                Ok(())
            }
        }
    }
}

/// Bounded linear undo/redo history.
///
/// `cursor` counts the applied entries; entries past the cursor are the redo
/// tail and are discarded by the next push.
#[derive(Debug)]
pub struct CommandStack {
    entries: VecDeque<DocumentCommand>,
    cursor: usize,
    capacity: usize,
}

impl Default for CommandStack {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandStack {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    /// Apply `command` to the document once, then take ownership of it.
    pub fn apply_and_push(
        &mut self,
        doc: &mut MasterDocument,
        command: DocumentCommand,
    ) -> Result<(), DocumentError> {
        command.apply(doc)?;
        self.push(command);
        Ok(())
    }

    /// Record an already-applied command. Discards any redo tail and evicts
    /// the oldest entry when capacity is exceeded.
    pub fn push(&mut self, command: DocumentCommand) {
        self.entries.truncate(self.cursor);
        self.entries.push_back(command);
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len();
    }

    /// Undo the most recent applied command. Returns false when there is
    /// nothing left to undo.
    pub fn undo(&mut self, doc: &mut MasterDocument) -> Result<bool, DocumentError> {
        if self.cursor == 0 {
            return Ok(false);
        }
        self.entries[self.cursor - 1].revert(doc)?;
        self.cursor -= 1;
        Ok(true)
    }

    /// Re-apply the next undone command. Returns false when there is nothing
    /// to redo.
    pub fn redo(&mut self, doc: &mut MasterDocument) -> Result<bool, DocumentError> {
        if self.cursor == self.entries.len() {
            return Ok(false);
        }
        self.entries[self.cursor].apply(doc)?;
        self.cursor += 1;
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
