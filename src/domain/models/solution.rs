//! Candidate partitions produced by the solver.

use std::fmt;
use std::str::FromStr;

use crate::domain::errors::SolutionParseError;

/// A partition of an instance's vertices into classes, as reported by the
/// solver. Ids are 0-based and kept in the order the solver printed them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Solution {
    classes: Vec<Vec<usize>>,
}

impl Solution {
    pub fn new(classes: Vec<Vec<usize>>) -> Self {
        Self { classes }
    }

    pub fn classes(&self) -> &[Vec<usize>] {
        &self.classes
    }

    /// Number of classes (colors) used.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl FromStr for Solution {
    type Err = SolutionParseError;

    /// Parse `{0,1} {2} {3, 4, 5}`. Groups may be separated by whitespace;
    /// members by commas and/or whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut classes = Vec::new();
        let mut chars = s.char_indices();

        while let Some((pos, c)) = chars.next() {
            match c {
                c if c.is_whitespace() => {}
                '{' => {
                    let start = pos + 1;
                    let end = loop {
                        match chars.next() {
                            Some((end, '}')) => break end,
                            Some((nested, '{')) => {
                                return Err(SolutionParseError::UnbalancedBraces {
                                    position: nested,
                                })
                            }
                            Some(_) => {}
                            None => return Err(SolutionParseError::UnbalancedBraces { position: pos }),
                        }
                    };
                    classes.push(parse_class(&s[start..end], classes.len())?);
                }
                '}' => return Err(SolutionParseError::UnbalancedBraces { position: pos }),
                found => {
                    return Err(SolutionParseError::UnexpectedText {
                        position: pos,
                        found,
                    })
                }
            }
        }

        Ok(Self { classes })
    }
}

fn parse_class(body: &str, class: usize) -> Result<Vec<usize>, SolutionParseError> {
    let members = body
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<usize>()
                .map_err(|_| SolutionParseError::InvalidVertex {
                    class,
                    token: token.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if members.is_empty() {
        return Err(SolutionParseError::EmptyClass { class });
    }
    Ok(members)
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, class) in self.classes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str("{")?;
            for (j, v) in class.iter().enumerate() {
                if j > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{v}")?;
            }
            f.write_str("}")?;
        }
        Ok(())
    }
}
