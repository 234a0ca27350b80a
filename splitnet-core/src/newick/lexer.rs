use memchr::memchr;

use crate::error::{SplitError, SplitResult};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Tok {
    Open,
    Close,
    Comma,
    Colon,
    Semi,
    Word {
        text: String,
        quoted: bool,
    },
    /// `<id|`
    MarkerOpen {
        id: u64,
    },
    /// `|id:weight:confidence:probability>`, numbers optional.
    MarkerClose {
        id: u64,
        weight: f64,
        confidence: Option<f64>,
        probability: Option<f64>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Token {
    pub tok: Tok,
    /// Byte offset in the input, for error positions.
    pub pos: usize,
}

fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace()
        || matches!(
            b,
            b'(' | b')'
                | b'['
                | b']'
                | b'{'
                | b'}'
                | b':'
                | b';'
                | b','
                | b'\''
                | b'<'
                | b'>'
                | b'|'
        )
}

pub(crate) fn tokenize(input: &str) -> SplitResult<Vec<Token>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let pos = i;
        match bytes[i] {
            b if b.is_ascii_whitespace() => i += 1,
            b'[' => match memchr(b']', &bytes[i..]) {
                Some(off) => i += off + 1,
                None => {
                    return Err(SplitError::Parse {
                        msg: "unterminated comment".to_owned(),
                        pos,
                    })
                }
            },
            b'(' => {
                tokens.push(Token { tok: Tok::Open, pos });
                i += 1;
            }
            b')' => {
                tokens.push(Token {
                    tok: Tok::Close,
                    pos,
                });
                i += 1;
            }
            b',' => {
                tokens.push(Token {
                    tok: Tok::Comma,
                    pos,
                });
                i += 1;
            }
            b':' => {
                tokens.push(Token {
                    tok: Tok::Colon,
                    pos,
                });
                i += 1;
            }
            b';' => {
                tokens.push(Token { tok: Tok::Semi, pos });
                i += 1;
            }
            b'\'' => {
                i += 1;
                let mut text = String::new();
                loop {
                    let Some(off) = memchr(b'\'', &bytes[i..]) else {
                        return Err(SplitError::Parse {
                            msg: "unterminated quoted label".to_owned(),
                            pos,
                        });
                    };
                    text.push_str(&input[i..i + off]);
                    i += off + 1;
                    // a doubled quote inside the label stands for itself
                    if bytes.get(i) == Some(&b'\'') {
                        text.push('\'');
                        i += 1;
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    tok: Tok::Word { text, quoted: true },
                    pos,
                });
            }
            b'<' => {
                i += 1;
                let id = scan_id(input, &mut i)?;
                if bytes.get(i) != Some(&b'|') {
                    return Err(SplitError::Parse {
                        msg: "expected '|' after the split marker id".to_owned(),
                        pos: i,
                    });
                }
                i += 1;
                tokens.push(Token {
                    tok: Tok::MarkerOpen { id },
                    pos,
                });
            }
            b'|' => {
                i += 1;
                let Some(off) = memchr(b'>', &bytes[i..]) else {
                    return Err(SplitError::Parse {
                        msg: "unterminated split marker".to_owned(),
                        pos,
                    });
                };
                let body = &input[i..i + off];
                i += off + 1;
                tokens.push(Token {
                    tok: close_marker(body, pos)?,
                    pos,
                });
            }
            _ => {
                let start = i;
                while i < bytes.len() && !is_delimiter(bytes[i]) {
                    i += 1;
                }
                if i == start {
                    return Err(SplitError::Parse {
                        msg: format!("unexpected character '{}'", bytes[i] as char),
                        pos,
                    });
                }
                tokens.push(Token {
                    tok: Tok::Word {
                        text: input[start..i].to_owned(),
                        quoted: false,
                    },
                    pos,
                });
            }
        }
    }
    Ok(tokens)
}

fn scan_id(input: &str, i: &mut usize) -> SplitResult<u64> {
    let bytes = input.as_bytes();
    let start = *i;
    while *i < bytes.len() && bytes[*i].is_ascii_digit() {
        *i += 1;
    }
    if *i == start {
        return Err(SplitError::Parse {
            msg: "expected a split marker id".to_owned(),
            pos: start,
        });
    }
    input[start..*i].parse().map_err(|_| SplitError::Parse {
        msg: "split marker id out of range".to_owned(),
        pos: start,
    })
}

fn close_marker(body: &str, pos: usize) -> SplitResult<Tok> {
    let number = |field: &str| -> SplitResult<f64> {
        field.parse().map_err(|_| SplitError::Parse {
            msg: format!("bad number '{}' in split marker", field),
            pos,
        })
    };
    let mut fields = body.split(':');
    let id = match fields.next() {
        Some(field) if !field.is_empty() && field.bytes().all(|b| b.is_ascii_digit()) => {
            field.parse().map_err(|_| SplitError::Parse {
                msg: "split marker id out of range".to_owned(),
                pos,
            })?
        }
        _ => {
            return Err(SplitError::Parse {
                msg: "expected a split marker id".to_owned(),
                pos,
            })
        }
    };
    let weight = match fields.next() {
        Some(field) => number(field)?,
        None => 1.0,
    };
    let confidence = fields.next().map(number).transpose()?;
    let probability = fields.next().map(number).transpose()?;
    if fields.next().is_some() {
        return Err(SplitError::Parse {
            msg: "too many fields in split marker".to_owned(),
            pos,
        });
    }
    Ok(Tok::MarkerClose {
        id,
        weight,
        confidence,
        probability,
    })
}
