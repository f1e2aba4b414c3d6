//! Byte cursor for formats that mix text headers with binary blocks.

use std::str::FromStr;

use crate::error::{MeshError, Result};

pub(crate) struct Source<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> Source<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0, line: 1 }
    }

    /// 1-based line number of the cursor, for error messages
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn error(&self, message: impl Into<String>) -> MeshError {
        MeshError::parse(self.line, message)
    }

    fn as_str(&self, bytes: &'a [u8]) -> Result<&'a str> {
        std::str::from_utf8(bytes).map_err(|_| self.error("header text is not valid UTF-8"))
    }

    /// Next line without its terminator (`\n` or `\r\n`), `None` at end of input
    pub fn read_line(&mut self) -> Result<Option<&'a str>> {
        if self.pos >= self.bytes.len() {
            return Ok(None);
        }
        let bytes: &'a [u8] = self.bytes;
        let rest = &bytes[self.pos..];
        let (content, consumed) = match rest.iter().position(|&b| b == b'\n') {
            Some(end) => (&rest[..end], end + 1),
            None => (rest, rest.len()),
        };
        let content = content.strip_suffix(b"\r").unwrap_or(content);
        let text = self.as_str(content)?;
        self.pos += consumed;
        self.line += 1;
        Ok(Some(text))
    }

    /// Consume the remainder of the current line, including its newline
    pub fn skip_line(&mut self) {
        let rest = &self.bytes[self.pos..];
        match rest.iter().position(|&b| b == b'\n') {
            Some(end) => {
                self.pos += end + 1;
                self.line += 1;
            }
            None => self.pos = self.bytes.len(),
        }
    }

    pub fn skip_whitespace(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            if !b.is_ascii_whitespace() {
                break;
            }
            if b == b'\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
    }

    fn token_end(&self) -> usize {
        self.bytes[self.pos..]
            .iter()
            .position(|b| b.is_ascii_whitespace())
            .map_or(self.bytes.len(), |n| self.pos + n)
    }

    /// Next whitespace-delimited token, `None` at end of input
    pub fn next_token(&mut self) -> Result<Option<&'a str>> {
        self.skip_whitespace();
        if self.pos >= self.bytes.len() {
            return Ok(None);
        }
        let bytes: &'a [u8] = self.bytes;
        let end = self.token_end();
        let token = self.as_str(&bytes[self.pos..end])?;
        self.pos = end;
        Ok(Some(token))
    }

    /// Next token without consuming it
    pub fn peek_token(&mut self) -> Result<Option<&'a str>> {
        self.skip_whitespace();
        if self.pos >= self.bytes.len() {
            return Ok(None);
        }
        let bytes: &'a [u8] = self.bytes;
        let end = self.token_end();
        self.as_str(&bytes[self.pos..end]).map(Some)
    }

    pub fn expect_token(&mut self, what: &str) -> Result<&'a str> {
        self.next_token()?
            .ok_or_else(|| self.error(format!("unexpected end of file, expected {}", what)))
    }

    /// Next token, which must equal `keyword` ignoring ASCII case
    pub fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        let token = self.expect_token(keyword)?;
        if token.eq_ignore_ascii_case(keyword) {
            Ok(())
        } else {
            Err(self.error(format!("expected {}, found '{}'", keyword, token)))
        }
    }

    pub fn parse_token<T: FromStr>(&mut self, what: &str) -> Result<T> {
        let token = self.expect_token(what)?;
        token
            .parse()
            .map_err(|_| self.error(format!("invalid {}: '{}'", what, token)))
    }

    /// Take `len` raw bytes
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| {
                self.error(format!(
                    "binary block of {} bytes runs past end of file ({} bytes left)",
                    len,
                    self.bytes.len() - self.pos
                ))
            })?;
        let bytes: &'a [u8] = self.bytes;
        let block = &bytes[self.pos..end];
        self.line += block.iter().filter(|&&b| b == b'\n').count();
        self.pos = end;
        Ok(block)
    }

    pub fn remaining(&self) -> &'a [u8] {
        let bytes: &'a [u8] = self.bytes;
        &bytes[self.pos..]
    }
}
