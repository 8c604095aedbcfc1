//! Recursive-descent parser for JavaScript-style regex literals.
//!
//! Produces the tagged node tree the SMT translator consumes. Constructs the
//! translator has no encoding for are rewritten at parse time into the
//! supported tags: character classes become a union of single characters,
//! `r+` becomes `r r*`, `r?` becomes `r | empty`. Anchors are the caller's
//! concern: the translator strips boundary `^`/`$` before parsing, so a
//! bare anchor seen here is an error.

use thiserror::Error;

/// Lowest and highest character considered by `.` and by negated classes.
pub const PRINTABLE_LO: char = ' '; // 0x20
pub const PRINTABLE_HI: char = '~'; // 0x7E

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid regex at position {pos}: {message}")]
pub struct RegexError {
    pub pos: usize,
    pub message: String,
}

/// A parsed pattern, rooted per the translator contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTree {
    pub root: RegexNode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegexNode {
    /// Matches only the empty string.
    Empty,
    Char(char),
    Dot,
    Star(Box<RegexNode>),
    Bar(Vec<RegexNode>),
    Concat(Vec<RegexNode>),
    Group(Box<RegexNode>),
}

pub fn parse(pattern: &str) -> Result<ParseTree, RegexError> {
    let mut parser = Parser {
        chars: pattern.chars().collect(),
        pos: 0,
    };
    let root = parser.alternation()?;
    if parser.pos < parser.chars.len() {
        // only an unmatched ')' can stop the descent early
        return Err(parser.error("unmatched ')'"));
    }
    Ok(ParseTree { root })
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn error(&self, message: &str) -> RegexError {
        RegexError {
            pos: self.pos,
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn alternation(&mut self) -> Result<RegexNode, RegexError> {
        let mut branches = vec![self.concat()?];
        while self.peek() == Some('|') {
            self.bump();
            branches.push(self.concat()?);
        }
        Ok(if branches.len() == 1 {
            branches.remove(0)
        } else {
            RegexNode::Bar(branches)
        })
    }

    fn concat(&mut self) -> Result<RegexNode, RegexError> {
        let mut parts = Vec::new();
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            let atom = self.atom()?;
            parts.push(self.postfix(atom)?);
        }
        Ok(match parts.len() {
            0 => RegexNode::Empty,
            1 => parts.remove(0),
            _ => RegexNode::Concat(parts),
        })
    }

    fn postfix(&mut self, mut node: RegexNode) -> Result<RegexNode, RegexError> {
        loop {
            match self.peek() {
                Some('*') => {
                    self.bump();
                    node = RegexNode::Star(Box::new(node));
                }
                Some('+') => {
                    self.bump();
                    let star = RegexNode::Star(Box::new(node.clone()));
                    node = RegexNode::Concat(vec![node, star]);
                }
                Some('?') => {
                    self.bump();
                    node = RegexNode::Bar(vec![node, RegexNode::Empty]);
                }
                _ => return Ok(node),
            }
        }
    }

    fn atom(&mut self) -> Result<RegexNode, RegexError> {
        match self.peek() {
            Some('(') => self.group(),
            Some('[') => self.charset(),
            Some('.') => {
                self.bump();
                Ok(RegexNode::Dot)
            }
            Some('\\') => {
                self.bump();
                let c = self
                    .bump()
                    .ok_or_else(|| self.error("trailing backslash"))?;
                Ok(escape_node(c))
            }
            Some('*') | Some('+') | Some('?') => Err(self.error("dangling repetition operator")),
            Some('^') | Some('$') => Err(self.error("anchor inside pattern")),
            Some(c) => {
                self.bump();
                Ok(RegexNode::Char(c))
            }
            None => Err(self.error("unexpected end of pattern")),
        }
    }

    fn group(&mut self) -> Result<RegexNode, RegexError> {
        self.bump(); // '('
        if self.peek() == Some('?') {
            // only the non-capturing form is supported
            self.bump();
            match self.bump() {
                Some(':') => {}
                _ => return Err(self.error("unsupported group modifier")),
            }
        }
        let inner = self.alternation()?;
        match self.bump() {
            Some(')') => Ok(RegexNode::Group(Box::new(inner))),
            _ => Err(self.error("unterminated group")),
        }
    }

    fn charset(&mut self) -> Result<RegexNode, RegexError> {
        self.bump(); // '['
        let negated = if self.peek() == Some('^') {
            self.bump();
            true
        } else {
            false
        };
        let mut members = std::collections::BTreeSet::new();
        loop {
            let c = match self.bump() {
                None => return Err(self.error("unterminated character class")),
                Some(']') => break,
                Some('\\') => {
                    let e = self
                        .bump()
                        .ok_or_else(|| self.error("trailing backslash"))?;
                    if let Some(class) = class_members(e) {
                        members.extend(class);
                        continue;
                    }
                    escape_char(e)
                }
                Some(c) => c,
            };
            // range, unless the '-' is the last member before ']'
            if self.peek() == Some('-') && self.chars.get(self.pos + 1) != Some(&']') {
                self.bump();
                let hi = match self.bump() {
                    None => return Err(self.error("unterminated character class")),
                    Some('\\') => {
                        let e = self
                            .bump()
                            .ok_or_else(|| self.error("trailing backslash"))?;
                        escape_char(e)
                    }
                    Some(h) => h,
                };
                if c > hi {
                    return Err(self.error("inverted character range"));
                }
                members.extend(c..=hi);
            } else {
                members.insert(c);
            }
        }
        let members: Vec<char> = if negated {
            (PRINTABLE_LO..=PRINTABLE_HI)
                .filter(|c| !members.contains(c))
                .collect()
        } else {
            members.into_iter().collect()
        };
        if members.is_empty() {
            return Err(self.error("empty character class"));
        }
        Ok(if members.len() == 1 {
            RegexNode::Char(members[0])
        } else {
            RegexNode::Bar(members.into_iter().map(RegexNode::Char).collect())
        })
    }
}

/// Escape at atom position: class shorthands expand to a union, everything
/// else resolves to a literal character.
fn escape_node(c: char) -> RegexNode {
    if let Some(members) = class_members(c) {
        return RegexNode::Bar(members.into_iter().map(RegexNode::Char).collect());
    }
    RegexNode::Char(escape_char(c))
}

fn escape_char(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other,
    }
}

fn class_members(c: char) -> Option<Vec<char>> {
    let word = || -> Vec<char> {
        ('a'..='z')
            .chain('A'..='Z')
            .chain('0'..='9')
            .chain(std::iter::once('_'))
            .collect()
    };
    match c {
        'd' => Some(('0'..='9').collect()),
        'w' => Some(word()),
        'W' => {
            let w: std::collections::BTreeSet<char> = word().into_iter().collect();
            Some(
                (PRINTABLE_LO..=PRINTABLE_HI)
                    .filter(|c| !w.contains(c))
                    .collect(),
            )
        }
        's' => Some(vec![' ', '\t', '\n', '\r', '\u{b}', '\u{c}']),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_concat() {
        let tree = parse("abc").unwrap();
        assert_eq!(
            tree.root,
            RegexNode::Concat(vec![
                RegexNode::Char('a'),
                RegexNode::Char('b'),
                RegexNode::Char('c')
            ])
        );
    }

    #[test]
    fn star_and_dot() {
        let tree = parse("a.*").unwrap();
        assert_eq!(
            tree.root,
            RegexNode::Concat(vec![
                RegexNode::Char('a'),
                RegexNode::Star(Box::new(RegexNode::Dot))
            ])
        );
    }

    #[test]
    fn alternation_with_group() {
        let tree = parse("(a|b)c").unwrap();
        assert_eq!(
            tree.root,
            RegexNode::Concat(vec![
                RegexNode::Group(Box::new(RegexNode::Bar(vec![
                    RegexNode::Char('a'),
                    RegexNode::Char('b')
                ]))),
                RegexNode::Char('c')
            ])
        );
    }

    #[test]
    fn plus_desugars_to_star() {
        let tree = parse("a+").unwrap();
        assert_eq!(
            tree.root,
            RegexNode::Concat(vec![
                RegexNode::Char('a'),
                RegexNode::Star(Box::new(RegexNode::Char('a')))
            ])
        );
    }

    #[test]
    fn question_mark_desugars_to_empty_branch() {
        let tree = parse("a?").unwrap();
        assert_eq!(
            tree.root,
            RegexNode::Bar(vec![RegexNode::Char('a'), RegexNode::Empty])
        );
    }

    #[test]
    fn charset_expands_to_union() {
        let tree = parse("[a-c]").unwrap();
        assert_eq!(
            tree.root,
            RegexNode::Bar(vec![
                RegexNode::Char('a'),
                RegexNode::Char('b'),
                RegexNode::Char('c')
            ])
        );
    }

    #[test]
    fn negated_charset_excludes_members() {
        let tree = parse("[^a]").unwrap();
        match tree.root {
            RegexNode::Bar(members) => {
                assert!(!members.contains(&RegexNode::Char('a')));
                assert!(members.contains(&RegexNode::Char('b')));
                assert!(members.contains(&RegexNode::Char(' ')));
            }
            other => panic!("expected union, got {:?}", other),
        }
    }

    #[test]
    fn empty_pattern_and_empty_branch() {
        assert_eq!(parse("").unwrap().root, RegexNode::Empty);
        assert_eq!(
            parse("a|").unwrap().root,
            RegexNode::Bar(vec![RegexNode::Char('a'), RegexNode::Empty])
        );
    }

    #[test]
    fn escaped_metacharacters_are_literal() {
        let tree = parse(r"\.\*").unwrap();
        assert_eq!(
            tree.root,
            RegexNode::Concat(vec![RegexNode::Char('.'), RegexNode::Char('*')])
        );
    }

    #[test]
    fn errors() {
        assert!(parse("(a").is_err());
        assert!(parse("a)").is_err());
        assert!(parse("[ab").is_err());
        assert!(parse("*a").is_err());
        assert!(parse("a^b").is_err());
    }
}
