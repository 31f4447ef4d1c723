// crates/reeldeck-core/src/modules/history.rs
//
// §4.3 Command / History Module. No directly retrievable teacher
// implementation existed in the source pack for this module (only the
// naming — `PushUndoSnapshot`, `undo_len`/`redo_len` — survives as a
// convention reference in `velocut-ui`); the execute/undo/dispose/batch
// machinery below is built from the spec's own description, in the
// dispatch idiom `app.rs::process_command` shows for routing a command
// through a single authoritative entry point.

use super::notifications::{NotificationLevel, NotificationsModule};
use crate::error::{CoreError, CoreResult};
use crate::ids::CommandId;
use std::fmt;

/// An undoable operation. Implementations must be transactional: `execute`
/// either fully succeeds or restores pre-call state before returning `Err`
/// (§4.3).
pub trait Command: fmt::Debug {
    fn description(&self) -> String;
    fn execute(&mut self) -> CoreResult<()>;
    fn undo(&mut self) -> CoreResult<()>;
    /// Release any retained resources (sprites, cloned blobs, detached
    /// items). Must be idempotent; the default no-op is correct for
    /// commands holding no such resources.
    fn dispose(&mut self) {}
}

/// Aggregates children, executing in order and undoing in reverse (§4.3).
#[derive(Debug)]
pub struct BatchCommand {
    description: String,
    children: Vec<Box<dyn Command>>,
}

impl BatchCommand {
    pub fn new(description: impl Into<String>, children: Vec<Box<dyn Command>>) -> Self {
        Self { description: description.into(), children }
    }
}

impl Command for BatchCommand {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn execute(&mut self) -> CoreResult<()> {
        for (i, child) in self.children.iter_mut().enumerate() {
            if let Err(err) = child.execute() {
                for already_run in self.children[..i].iter_mut().rev() {
                    let _ = already_run.undo();
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn undo(&mut self) -> CoreResult<()> {
        for child in self.children.iter_mut().rev() {
            child.undo()?;
        }
        Ok(())
    }

    fn dispose(&mut self) {
        for child in self.children.iter_mut() {
            child.dispose();
        }
    }
}

/// A batch under construction via [`HistoryModule::start_batch`] (§4.3).
pub struct BatchBuilder {
    description: String,
    children: Vec<Box<dyn Command>>,
}

impl BatchBuilder {
    pub fn add_command(mut self, command: Box<dyn Command>) -> Self {
        self.children.push(command);
        self
    }

    pub fn build(self) -> BatchCommand {
        BatchCommand::new(self.description, self.children)
    }
}

struct Entry {
    id: CommandId,
    command: Box<dyn Command>,
    disposed: bool,
}

impl Entry {
    fn dispose(&mut self) {
        if !self.disposed {
            self.command.dispose();
            self.disposed = true;
        }
    }
}

pub struct HistoryModule {
    commands: Vec<Entry>,
    current_index: i64,
}

impl HistoryModule {
    pub fn new() -> Self {
        Self { commands: Vec::new(), current_index: -1 }
    }

    pub fn can_undo(&self) -> bool {
        self.current_index >= 0
    }

    pub fn can_redo(&self) -> bool {
        self.current_index < self.commands.len() as i64 - 1
    }

    pub fn undo_len(&self) -> usize {
        (self.current_index + 1).max(0) as usize
    }

    pub fn redo_len(&self) -> usize {
        self.commands.len() - self.undo_len()
    }

    pub fn start_batch(&self, description: impl Into<String>) -> BatchBuilder {
        BatchBuilder { description: description.into(), children: Vec::new() }
    }

    /// `execute(cmd)`: splice off any redo tail (disposing it), run, append,
    /// advance on success; on failure no state mutation is retained (§4.3).
    pub fn execute(&mut self, mut command: Box<dyn Command>, notifications: &mut NotificationsModule) -> CoreResult<CommandId> {
        if self.can_redo() {
            let tail_start = self.undo_len();
            for mut entry in self.commands.drain(tail_start..) {
                entry.dispose();
            }
        }
        let description = command.description();
        match command.execute() {
            Ok(()) => {
                let id = CommandId::new();
                self.commands.push(Entry { id, command, disposed: false });
                self.current_index += 1;
                Ok(id)
            }
            Err(err) => {
                notifications.push(NotificationLevel::Error, format!("{description}: {err}"));
                Err(CoreError::CommandExecution { description, message: err.to_string() })
            }
        }
    }

    pub fn undo(&mut self, notifications: &mut NotificationsModule) -> CoreResult<()> {
        if !self.can_undo() {
            return Ok(());
        }
        let idx = self.current_index as usize;
        match self.commands[idx].command.undo() {
            Ok(()) => {
                self.current_index -= 1;
                Ok(())
            }
            Err(err) => {
                notifications.push(NotificationLevel::Error, format!("undo failed: {err}"));
                Err(CoreError::Undo { message: err.to_string() })
            }
        }
    }

    pub fn redo(&mut self, notifications: &mut NotificationsModule) -> CoreResult<()> {
        if !self.can_redo() {
            return Ok(());
        }
        let idx = (self.current_index + 1) as usize;
        match self.commands[idx].command.execute() {
            Ok(()) => {
                self.current_index += 1;
                Ok(())
            }
            Err(err) => {
                notifications.push(NotificationLevel::Error, format!("redo failed: {err}"));
                Err(CoreError::Redo { message: err.to_string() })
            }
        }
    }

    pub fn clear(&mut self) {
        for entry in self.commands.iter_mut() {
            entry.dispose();
        }
        self.commands.clear();
        self.current_index = -1;
    }

    pub fn ids(&self) -> Vec<CommandId> {
        self.commands.iter().map(|e| e.id).collect()
    }
}

impl Default for HistoryModule {
    fn default() -> Self {
        Self::new()
    }
}
