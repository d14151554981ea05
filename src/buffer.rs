use crate::{CharBuffer, ParseError, Position};
use std::fmt::{Debug, Formatter};
use std::io::{Cursor, Read};

const CHUNK_SIZE: usize = 4096;

impl CharBuffer {
    /// Create a new buffer reading lazily from the given source.
    pub fn new(source: Box<dyn Read>) -> Self {
        Self {
            source: Some(source),
            chars: std::collections::VecDeque::new(),
            pending: Vec::new(),
            eof: false,
            failed: false,
            line: 1,
            column: 1,
        }
    }

    /// The position of the next unconsumed character.
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Look at the character `offset` positions ahead without consuming anything.
    ///
    /// Returns `None` when the input ends before the requested offset. Read failures and
    /// invalid UTF-8 surface as [Io](crate::ParseErrorKind::Io) parse errors.
    pub fn peek(&mut self, offset: usize) -> Result<Option<char>, ParseError> {
        self.fill(offset)?;
        Ok(self.chars.get(offset).copied())
    }

    /// Whether the input is exhausted at the current position.
    pub fn at_end(&mut self) -> Result<bool, ParseError> {
        Ok(self.peek(0)?.is_none())
    }

    /// Consume `count` already peeked characters and return them, advancing the tracked
    /// line and column. Only `\n` advances the line, so `\r\n` counts as a single break.
    pub fn consume(&mut self, count: usize) -> String {
        let mut consumed = String::new();
        for _ in 0..count {
            match self.chars.pop_front() {
                Some(c) => {
                    if c == '\n' {
                        self.line += 1;
                        self.column = 1;
                    } else {
                        self.column += 1;
                    }
                    consumed.push(c);
                }
                None => break,
            }
        }
        consumed
    }

    fn fill(&mut self, offset: usize) -> Result<(), ParseError> {
        while self.chars.len() <= offset && !self.eof {
            if self.failed {
                return Err(ParseError::io(
                    "input source is not readable".into(),
                    self.position(),
                ));
            }
            let mut chunk = [0u8; CHUNK_SIZE];
            let read = match &mut self.source {
                Some(source) => source.read(&mut chunk),
                None => Ok(0),
            };
            let read = match read {
                Ok(read) => read,
                Err(err) => {
                    self.failed = true;
                    return Err(ParseError::io(
                        format!("failed to read input: {}", err),
                        self.position(),
                    ));
                }
            };
            if read == 0 {
                self.eof = true;
                if !self.pending.is_empty() {
                    self.failed = true;
                    return Err(ParseError::io(
                        "input ends with an incomplete UTF-8 sequence".into(),
                        self.position(),
                    ));
                }
                break;
            }
            self.pending.extend_from_slice(&chunk[..read]);
            self.decode_pending()?;
        }
        Ok(())
    }

    fn decode_pending(&mut self) -> Result<(), ParseError> {
        let pending = std::mem::take(&mut self.pending);
        match std::str::from_utf8(&pending) {
            Ok(s) => {
                self.chars.extend(s.chars());
                Ok(())
            }
            Err(err) => {
                let valid = err.valid_up_to();
                let s = unsafe { std::str::from_utf8_unchecked(&pending[..valid]) };
                self.chars.extend(s.chars());
                match err.error_len() {
                    // An incomplete sequence at the end of the chunk; keep the tail bytes.
                    None => {
                        self.pending = pending[valid..].to_vec();
                        Ok(())
                    }
                    Some(_) => {
                        self.failed = true;
                        Err(ParseError::io(
                            "input is not valid UTF-8".into(),
                            self.position(),
                        ))
                    }
                }
            }
        }
    }
}

impl Debug for CharBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CharBuffer")
            .field("line", &self.line)
            .field("column", &self.column)
            .field("buffered", &self.chars.len())
            .field("eof", &self.eof)
            .finish()
    }
}

impl From<&str> for CharBuffer {
    fn from(value: &str) -> Self {
        CharBuffer::new(Box::new(Cursor::new(value.as_bytes().to_vec())))
    }
}

impl From<String> for CharBuffer {
    fn from(value: String) -> Self {
        CharBuffer::new(Box::new(Cursor::new(value.into_bytes())))
    }
}

impl From<Box<dyn Read>> for CharBuffer {
    fn from(source: Box<dyn Read>) -> Self {
        CharBuffer::new(source)
    }
}
