use super::{ParseError, Result, Value};

/// Deepest list nesting accepted from the wire.
///
/// Every other operation on [`Value`] (drop, dump, comparison) recurses, so
/// the bound applies where untrusted trees are built.
pub const MAX_DEPTH: usize = 128;

/// Parse one complete wire message into a [`Value`].
///
/// The first character decides what the message is: `"` starts a string
/// atom, `(` starts a list, and a digit or `.` starts a number. Anything else
/// (including empty input, or a lone `"` or `(`) yields an empty list rather
/// than an error; callers have historically treated that as "no data".
///
/// Parsing stops as soon as the top-level value is complete, so trailing
/// input such as an unmatched `)` is ignored. Inside a list, elements need no
/// separator and any character that cannot start an element is skipped.
/// There is no sign handling: `-` is not part of a number and is skipped like
/// any other separator. Lists nested deeper than [`MAX_DEPTH`] are rejected
/// with [`ParseError::TooDeep`].
pub fn parse(input: &str) -> Result<Value> {
    let mut chars = input.chars();
    let Some(first) = chars.next() else {
        return Ok(Value::empty());
    };
    let rest = chars.as_str();

    let mut machine = match first {
        '"' if !rest.is_empty() => Machine::new(State::InString),
        '(' if !rest.is_empty() => Machine::open_list(),
        ch if is_number_char(ch) => Machine::number(ch),
        _ => return Ok(Value::empty()),
    };

    for ch in rest.chars() {
        if machine.state == State::Done {
            break;
        }
        machine.step(ch)?;
    }

    machine.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Between elements of the innermost open list.
    InList,
    /// Collecting string characters.
    InString,
    /// The previous character was a backslash inside a string.
    InEscape,
    /// Collecting a run of digits and dots.
    InNumber,
    /// The top-level value is complete.
    Done,
}

struct Machine {
    state: State,
    /// Open lists, innermost last. Its length is the current nesting depth.
    lists: Vec<Vec<Value>>,
    buf: String,
    output: Option<Value>,
}

impl Machine {
    fn new(state: State) -> Self {
        Self {
            state,
            lists: Vec::new(),
            buf: String::new(),
            output: None,
        }
    }

    fn open_list() -> Self {
        let mut machine = Self::new(State::InList);
        machine.lists.push(Vec::new());
        machine
    }

    fn number(first: char) -> Self {
        let mut machine = Self::new(State::InNumber);
        machine.buf.push(first);
        machine
    }

    fn step(&mut self, ch: char) -> Result<()> {
        match self.state {
            State::InString => self.string_char(ch),
            State::InEscape => {
                self.buf.push(ch);
                self.state = State::InString;
            }
            State::InNumber => {
                if is_number_char(ch) {
                    self.buf.push(ch);
                } else {
                    let number = self.take_number()?;
                    self.emit(number);
                    // The terminating character still has to be handled by
                    // the enclosing list.
                    if self.state == State::InList {
                        self.list_char(ch)?;
                    }
                }
            }
            State::InList => self.list_char(ch)?,
            State::Done => {}
        }
        Ok(())
    }

    fn string_char(&mut self, ch: char) {
        match ch {
            '"' => {
                let text = std::mem::take(&mut self.buf);
                self.emit(Value::String(text));
            }
            '\\' => self.state = State::InEscape,
            _ => self.buf.push(ch),
        }
    }

    fn list_char(&mut self, ch: char) -> Result<()> {
        match ch {
            '"' => self.state = State::InString,
            '(' => {
                if self.lists.len() >= MAX_DEPTH {
                    return Err(ParseError::TooDeep { limit: MAX_DEPTH });
                }
                self.lists.push(Vec::new());
            }
            ')' => {
                if let Some(items) = self.lists.pop() {
                    self.emit(Value::List(items));
                }
            }
            ch if is_number_char(ch) => {
                self.buf.push(ch);
                self.state = State::InNumber;
            }
            _ => {}
        }
        Ok(())
    }

    /// Attach a finished value to the innermost open list, or make it the
    /// result when no list is open.
    fn emit(&mut self, value: Value) {
        if let Some(parent) = self.lists.last_mut() {
            parent.push(value);
            self.state = State::InList;
        } else {
            self.output = Some(value);
            self.state = State::Done;
        }
    }

    fn take_number(&mut self) -> Result<Value> {
        let text = std::mem::take(&mut self.buf);
        parse_number(&text)
    }

    fn finish(mut self) -> Result<Value> {
        match self.state {
            State::Done => Ok(self.output.unwrap_or_else(Value::empty)),
            // Number atoms have no terminator, so a top-level number is still
            // buffered here.
            State::InNumber if self.lists.is_empty() => self.take_number(),
            State::InString | State::InEscape if self.lists.is_empty() => {
                Err(ParseError::UnterminatedString)
            }
            _ => Err(ParseError::UnclosedList {
                depth: self.lists.len(),
            }),
        }
    }
}

fn is_number_char(ch: char) -> bool {
    ch.is_ascii_digit() || ch == '.'
}

fn parse_number(text: &str) -> Result<Value> {
    if !text.contains('.') {
        if let Ok(num) = text.parse::<i64>() {
            return Ok(Value::Integer(num));
        }
    }
    // Digit runs too large for i64 fall back to a float.
    text.parse::<f64>()
        .map(Value::Float)
        .map_err(|_| ParseError::InvalidNumber(text.to_string()))
}
