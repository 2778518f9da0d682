use super::command::Command;

/*
Command Streams
===============

A stream is an ordered list of commands plus a playhead:

    commands:  [ N 60 ][ N 64 ][ N 67 ][ W 0.5 ]
    cursor:                ▲

The commands are owned and immutable once playback starts; everything that
moves lives in the `Playhead`. That split lets a processor reposition the
playhead while it holds a reference to the command being dispatched.

Stepping:

    cursor < last          cursor += 1
    cursor == last, loop   cursor = 0
    cursor == last, once   stay; the stream is exhausted

`finished()` reports the non-looping stream sitting on its last index. A
sequencer pauses as soon as a step lands there, so the last command of a
one-shot stream marks the end and is never dispatched.
*/

/// Cursor state of a [`CommandStream`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playhead {
    cursor: usize,
    len: usize,
    looping: bool,
    instrument: Option<usize>,
    jump: Option<usize>,
}

impl Playhead {
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Instrument index commands fall back to when they name none.
    pub fn bound_instrument(&self) -> Option<usize> {
        self.instrument
    }

    /// Move the playhead now. Out-of-range positions are ignored.
    pub fn seek(&mut self, cursor: usize) {
        if cursor < self.len {
            self.cursor = cursor;
            self.jump = None;
        }
    }

    /// Make the next advance land on `cursor` instead of the following
    /// command. Out-of-range targets are ignored.
    pub fn jump(&mut self, cursor: usize) {
        if cursor < self.len {
            self.jump = Some(cursor);
        }
    }

    pub fn finished(&self) -> bool {
        !self.looping && self.cursor >= self.len.saturating_sub(1)
    }

    /// Advance one command. A pending jump wins over the natural order.
    fn advance(&mut self) {
        if let Some(target) = self.jump.take() {
            self.cursor = target;
        } else if self.cursor + 1 < self.len {
            self.cursor += 1;
        } else if self.looping {
            self.cursor = 0;
        }
    }
}

/// An ordered, optionally looping sequence of commands with a playhead.
#[derive(Debug, Clone)]
pub struct CommandStream<C> {
    commands: Vec<C>,
    playhead: Playhead,
}

impl<C: Command> CommandStream<C> {
    pub fn new(looping: bool) -> Self {
        Self::with_commands(Vec::new(), looping)
    }

    pub fn with_commands(commands: Vec<C>, looping: bool) -> Self {
        let playhead = Playhead {
            len: commands.len(),
            looping,
            ..Playhead::default()
        };
        Self { commands, playhead }
    }

    /// Bind the stream to one instrument index.
    pub fn bound_to(mut self, instrument: usize) -> Self {
        self.playhead.instrument = Some(instrument);
        self
    }

    pub fn add(&mut self, command: C) {
        self.commands.push(command);
        self.playhead.len = self.commands.len();
    }

    /// The command under the playhead.
    pub fn current(&self) -> Option<&C> {
        self.commands.get(self.playhead.cursor)
    }

    /// Advance the playhead and return the new cursor.
    pub fn step(&mut self) -> usize {
        self.playhead.advance();
        self.playhead.cursor
    }

    /// Set the playhead if `cursor` is in range; ignored otherwise.
    pub fn set_cursor(&mut self, cursor: usize) {
        self.playhead.seek(cursor);
    }

    pub fn cursor_position(&self) -> usize {
        self.playhead.cursor
    }

    pub fn reset(&mut self) {
        self.playhead.cursor = 0;
        self.playhead.jump = None;
    }

    pub fn finished(&self) -> bool {
        self.playhead.finished()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn is_looping(&self) -> bool {
        self.playhead.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.playhead.looping = looping;
    }

    pub fn bound_instrument(&self) -> Option<usize> {
        self.playhead.instrument
    }

    pub fn set_bound_instrument(&mut self, instrument: Option<usize>) {
        self.playhead.instrument = instrument;
    }

    pub fn playhead(&self) -> &Playhead {
        &self.playhead
    }

    pub fn commands(&self) -> &[C] {
        &self.commands
    }

    /// The current command alongside the playhead, borrowed disjointly so a
    /// processor can move the playhead while reading the command.
    pub(crate) fn split_current(&mut self) -> (Option<&C>, &mut Playhead) {
        (self.commands.get(self.playhead.cursor), &mut self.playhead)
    }
}

impl<C: Command> Default for CommandStream<C> {
    fn default() -> Self {
        Self::new(false)
    }
}
