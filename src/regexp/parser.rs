use super::{ClassItem, Expr};

/// Parse a pattern of the regular expression dialect into an [Expr] tree.
pub(crate) fn parse(pattern: &str) -> Result<Expr, String> {
    let mut parser = PatternParser {
        chars: pattern.chars().collect(),
        pos: 0,
    };
    let expr = parser.parse_alternation()?;
    match parser.peek() {
        None => Ok(expr),
        Some(c) => Err(format!("unexpected '{}' in pattern", c)),
    }
}

struct PatternParser {
    chars: Vec<char>,
    pos: usize,
}

impl PatternParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn expect(&mut self, c: char) -> Result<(), String> {
        match self.bump() {
            Some(found) if found == c => Ok(()),
            Some(found) => Err(format!("expected '{}', found '{}'", c, found)),
            None => Err(format!("expected '{}', found end of pattern", c)),
        }
    }

    fn parse_alternation(&mut self) -> Result<Expr, String> {
        let mut branches = vec![self.parse_sequence()?];
        while self.peek() == Some('|') {
            self.bump();
            branches.push(self.parse_sequence()?);
        }
        if branches.len() == 1 {
            Ok(branches.remove(0))
        } else {
            Ok(Expr::Alternation(branches))
        }
    }

    fn parse_sequence(&mut self) -> Result<Expr, String> {
        let mut items = Vec::new();
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            items.push(self.parse_quantified()?);
        }
        if items.len() == 1 {
            Ok(items.remove(0))
        } else {
            Ok(Expr::Sequence(items))
        }
    }

    fn parse_quantified(&mut self) -> Result<Expr, String> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.peek() {
                Some('?') => {
                    self.bump();
                    expr = Expr::Repeat(Box::new(expr), 0, 1);
                }
                Some('*') => {
                    self.bump();
                    expr = Expr::Repeat(Box::new(expr), 0, usize::MAX);
                }
                Some('+') => {
                    self.bump();
                    expr = Expr::Repeat(Box::new(expr), 1, usize::MAX);
                }
                Some('{') => {
                    self.bump();
                    let (min, max) = self.parse_bounds()?;
                    expr = Expr::Repeat(Box::new(expr), min, max);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_atom(&mut self) -> Result<Expr, String> {
        match self.bump() {
            None => Err("unexpected end of pattern".into()),
            Some('(') => {
                let expr = self.parse_alternation()?;
                self.expect(')')?;
                Ok(expr)
            }
            Some('[') => self.parse_class(),
            Some('.') => Ok(Expr::Any),
            Some('\\') => self.parse_escape(),
            Some(c @ ('?' | '*' | '+' | '{')) => Err(format!("dangling quantifier '{}'", c)),
            Some(c) => Ok(Expr::Literal(c)),
        }
    }

    fn parse_escape(&mut self) -> Result<Expr, String> {
        match self.escape_item()? {
            EscapeItem::Char(c) => Ok(Expr::Literal(c)),
            EscapeItem::Meta(item) => Ok(Expr::Class {
                items: vec![item],
                negated: false,
            }),
        }
    }

    fn escape_item(&mut self) -> Result<EscapeItem, String> {
        match self.bump() {
            None => Err("trailing backslash in pattern".into()),
            Some('d') => Ok(EscapeItem::Meta(ClassItem::Digit)),
            Some('D') => Ok(EscapeItem::Meta(ClassItem::NotDigit)),
            Some('s') => Ok(EscapeItem::Meta(ClassItem::Space)),
            Some('S') => Ok(EscapeItem::Meta(ClassItem::NotSpace)),
            Some('w') => Ok(EscapeItem::Meta(ClassItem::Word)),
            Some('W') => Ok(EscapeItem::Meta(ClassItem::NotWord)),
            Some('n') => Ok(EscapeItem::Char('\n')),
            Some('r') => Ok(EscapeItem::Char('\r')),
            Some('t') => Ok(EscapeItem::Char('\t')),
            Some(c) => Ok(EscapeItem::Char(c)),
        }
    }

    fn parse_class(&mut self) -> Result<Expr, String> {
        let negated = self.peek() == Some('^');
        if negated {
            self.bump();
        }
        let mut items = Vec::new();
        loop {
            match self.peek() {
                None => return Err("unterminated character class".into()),
                Some(']') => {
                    self.bump();
                    break;
                }
                Some(_) => items.push(self.parse_class_item()?),
            }
        }
        if items.is_empty() {
            return Err("empty character class".into());
        }
        Ok(Expr::Class { items, negated })
    }

    fn parse_class_item(&mut self) -> Result<ClassItem, String> {
        let low = match self.bump() {
            Some('\\') => match self.escape_item()? {
                EscapeItem::Meta(item) => return Ok(item),
                EscapeItem::Char(c) => c,
            },
            Some(c) => c,
            None => return Err("unterminated character class".into()),
        };
        // A '-' forms a range unless it closes the class.
        if self.peek() == Some('-') && self.peek_at(1).is_some() && self.peek_at(1) != Some(']') {
            self.bump();
            let high = match self.bump() {
                Some('\\') => match self.escape_item()? {
                    EscapeItem::Meta(_) => {
                        return Err("character class escape cannot end a range".into())
                    }
                    EscapeItem::Char(c) => c,
                },
                Some(c) => c,
                None => return Err("unterminated character class".into()),
            };
            if low > high {
                return Err(format!("invalid character range '{}-{}'", low, high));
            }
            Ok(ClassItem::Range(low, high))
        } else {
            Ok(ClassItem::Char(low))
        }
    }

    fn parse_bounds(&mut self) -> Result<(usize, usize), String> {
        let min = self.parse_number()?;
        match self.bump() {
            Some('}') => Ok((min, min)),
            Some(',') => match self.peek() {
                Some('}') => {
                    self.bump();
                    Ok((min, usize::MAX))
                }
                _ => {
                    let max = self.parse_number()?;
                    self.expect('}')?;
                    if min > max {
                        return Err(format!("invalid repetition bounds {{{},{}}}", min, max));
                    }
                    Ok((min, max))
                }
            },
            Some(c) => Err(format!("invalid repetition bounds, found '{}'", c)),
            None => Err("unterminated repetition bounds".into()),
        }
    }

    fn parse_number(&mut self) -> Result<usize, String> {
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if digits.is_empty() {
            return Err("expected a number in repetition bounds".into());
        }
        digits
            .parse::<usize>()
            .map_err(|_| format!("repetition bound '{}' is out of range", digits))
    }
}

enum EscapeItem {
    Char(char),
    Meta(ClassItem),
}
