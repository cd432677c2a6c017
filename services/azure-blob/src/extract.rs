// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Streaming extraction of element values from blob service XML responses.
//!
//! Listing responses can be arbitrarily large, so they are never turned into
//! a tree. A push-down state machine walks the bytes once, keeps the stack of
//! open element names and only buffers the text of the elements it reports:
//!
//! - `Name` directly under `Blob` or `Container` is a result entry.
//! - `Message` directly under the `Error` root is the server's error message
//!   and ends the extraction with [`ErrorKind::ServerRejected`](blobsign_core::ErrorKind::ServerRejected).
//!
//! ## Reference
//!
//! - [List Blobs](https://learn.microsoft.com/en-us/rest/api/storageservices/list-blobs)
//! - [Status and error codes](https://learn.microsoft.com/en-us/rest/api/storageservices/status-and-error-codes2)

use std::io::{ErrorKind as IoErrorKind, Read};

use blobsign_core::{Error, Result};
use log::debug;

const RESULT_ELEMENT: &str = "Name";
const RESULT_PARENTS: [&str; 2] = ["Blob", "Container"];
const ERROR_ROOT: &str = "Error";
const ERROR_MESSAGE: &str = "Message";
const ERROR_CODE: &str = "Code";

const MAX_TAG_LEN: usize = 16 * 1024;
const MAX_TEXT_LEN: usize = 64 * 1024;
const MAX_DEPTH: usize = 256;
const READ_BUFFER_SIZE: usize = 8 * 1024;
const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Element is one value reported by the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Element name, for example `Name`.
    pub name: String,
    /// Text content with entities decoded.
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Between tags, reading character data.
    Text,
    /// After `<`, reading a tag up to its closing `>`.
    Tag,
    /// A terminal event was reported, further input is ignored.
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    ResultName,
    ErrorMessage,
    ErrorCode,
}

#[derive(Debug)]
struct Capture {
    target: Target,
    /// Stack depth of the captured element.
    depth: usize,
    text: String,
    raw: Vec<u8>,
}

impl Capture {
    fn new(target: Target, depth: usize) -> Self {
        Self {
            target,
            depth,
            text: String::new(),
            raw: Vec::new(),
        }
    }

    fn ensure_room(&self, extra: usize) -> Result<()> {
        if self.text.len() + self.raw.len() + extra > MAX_TEXT_LEN {
            return Err(Error::parse_error(format!(
                "element text is longer than {MAX_TEXT_LEN} bytes"
            )));
        }
        Ok(())
    }

    fn push(&mut self, b: u8) -> Result<()> {
        self.ensure_room(1)?;
        self.raw.push(b);
        Ok(())
    }

    fn push_cdata(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_room(data.len())?;
        self.flush()?;
        self.text.push_str(
            std::str::from_utf8(data)
                .map_err(|e| Error::parse_error("CDATA is not valid utf-8").with_source(e))?,
        );
        Ok(())
    }

    /// Decode pending character data into `text`.
    fn flush(&mut self) -> Result<()> {
        if !self.raw.is_empty() {
            let raw = std::mem::take(&mut self.raw);
            self.text.push_str(&decode_text(raw)?);
        }
        Ok(())
    }

    fn finish(mut self) -> Result<String> {
        self.flush()?;
        Ok(self.text)
    }
}

/// Scanner is the push based state machine behind [`Extractor`].
///
/// Feed it bytes in order with [`Scanner::push`] (or whole chunks with
/// [`Scanner::feed`]) and call [`Scanner::finish`] at end of input.
#[derive(Debug)]
pub struct Scanner {
    state: State,
    offset: usize,
    tag: Vec<u8>,
    quote: Option<u8>,
    stack: Vec<String>,
    capture: Option<Capture>,
    code: Option<String>,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    /// Create a scanner at the start of a document.
    pub fn new() -> Self {
        Self {
            state: State::Text,
            offset: 0,
            tag: Vec::new(),
            quote: None,
            stack: Vec::new(),
            capture: None,
            code: None,
        }
    }

    /// Whether a terminal event has been reported.
    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// Push one byte.
    ///
    /// Returns `Ok(Some(_))` when the byte completes a result element. An
    /// error is terminal: once returned, the scanner ignores further input.
    pub fn push(&mut self, b: u8) -> Result<Option<Element>> {
        let offset = self.offset;
        self.offset += 1;

        let res = match self.state {
            State::Done => return Ok(None),
            State::Text => self.push_text(b, offset),
            State::Tag => self.push_tag(b),
        };

        if res.is_err() {
            self.state = State::Done;
        }
        res
    }

    /// Push a chunk and collect the result elements it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Element>> {
        let mut out = Vec::new();
        for &b in chunk {
            if let Some(element) = self.push(b)? {
                out.push(element);
            }
        }
        Ok(out)
    }

    /// Stop scanning without checking that the document was complete.
    ///
    /// Used when the input source itself failed; the scanner ignores any
    /// further input afterwards.
    pub fn abort(&mut self) {
        self.state = State::Done;
    }

    /// Signal end of input.
    ///
    /// Fails with `ParseError` when the document was cut inside a tag or
    /// with elements still open, and with `ServerRejected` when an error
    /// document carried a code but no message.
    pub fn finish(&mut self) -> Result<()> {
        let state = std::mem::replace(&mut self.state, State::Done);
        match state {
            State::Done => Ok(()),
            State::Tag => Err(Error::parse_error(format!(
                "unterminated tag at end of document: <{}",
                String::from_utf8_lossy(&self.tag)
            ))),
            State::Text => match self.stack.last() {
                Some(open) => Err(Error::parse_error(format!(
                    "unexpected end of document inside <{open}>"
                ))),
                None => Ok(()),
            },
        }
    }

    fn push_text(&mut self, b: u8, offset: usize) -> Result<Option<Element>> {
        if b == b'<' {
            self.state = State::Tag;
            self.tag.clear();
            self.quote = None;
            return Ok(None);
        }

        if let Some(capture) = self.capture.as_mut() {
            capture.push(b)?;
        } else if self.stack.is_empty()
            && !b.is_ascii_whitespace()
            && !(offset < BOM.len() && b == BOM[offset])
        {
            return Err(Error::parse_error(format!(
                "unexpected character data outside the root element at byte {offset}"
            )));
        }

        Ok(None)
    }

    fn push_tag(&mut self, b: u8) -> Result<Option<Element>> {
        if b == b'>' && self.quote.is_none() && self.tag_complete() {
            self.state = State::Text;
            let tag = std::mem::take(&mut self.tag);
            return self.handle_tag(&tag);
        }

        if self.tag.len() >= MAX_TAG_LEN {
            return Err(Error::parse_error(format!(
                "tag is longer than {MAX_TAG_LEN} bytes"
            )));
        }

        if !self.tag.starts_with(b"!") {
            match (self.quote, b) {
                (None, b'"' | b'\'') => self.quote = Some(b),
                (Some(q), _) if q == b => self.quote = None,
                _ => {}
            }
        }
        self.tag.push(b);

        Ok(None)
    }

    /// Comments and CDATA sections may contain `>`; they only end at
    /// `-->` and `]]>`.
    fn tag_complete(&self) -> bool {
        if self.tag.starts_with(b"!--") {
            self.tag.len() >= 5 && self.tag.ends_with(b"--")
        } else if self.tag.starts_with(b"![CDATA[") {
            self.tag.len() >= 10 && self.tag.ends_with(b"]]")
        } else {
            true
        }
    }

    fn handle_tag(&mut self, tag: &[u8]) -> Result<Option<Element>> {
        if let Some(data) = tag
            .strip_prefix(b"![CDATA[")
            .and_then(|v| v.strip_suffix(b"]]"))
        {
            if let Some(capture) = self.capture.as_mut() {
                capture.push_cdata(data)?;
            }
            return Ok(None);
        }
        // Declarations, comments and processing instructions.
        if tag.starts_with(b"?") || tag.starts_with(b"!") {
            return Ok(None);
        }

        let tag = std::str::from_utf8(tag)
            .map_err(|e| Error::parse_error("tag is not valid utf-8").with_source(e))?;

        if let Some(name) = tag.strip_prefix('/') {
            return self.close(name.trim());
        }

        let self_closing = tag.ends_with('/');
        let body = tag.strip_suffix('/').unwrap_or(tag);
        let name = body
            .split(|c: char| c.is_ascii_whitespace())
            .next()
            .unwrap_or_default();
        if name.is_empty() {
            return Err(Error::parse_error(format!("tag without a name: <{tag}>")));
        }

        self.open(name)?;
        if self_closing {
            return self.close(name);
        }
        Ok(None)
    }

    fn open(&mut self, name: &str) -> Result<()> {
        if self.stack.len() >= MAX_DEPTH {
            return Err(Error::parse_error(format!(
                "elements nested deeper than {MAX_DEPTH}"
            )));
        }

        let parent = self.stack.last().map(String::as_str);
        let target = match (name, parent, self.stack.len()) {
            (RESULT_ELEMENT, Some(p), _) if RESULT_PARENTS.contains(&p) => {
                Some(Target::ResultName)
            }
            (ERROR_MESSAGE, Some(ERROR_ROOT), 1) => Some(Target::ErrorMessage),
            (ERROR_CODE, Some(ERROR_ROOT), 1) => Some(Target::ErrorCode),
            _ => None,
        };

        self.stack.push(name.to_string());
        if self.capture.is_none() {
            if let Some(target) = target {
                self.capture = Some(Capture::new(target, self.stack.len()));
            }
        }

        Ok(())
    }

    fn close(&mut self, name: &str) -> Result<Option<Element>> {
        match self.stack.last() {
            Some(open) if open == name => {}
            Some(open) => {
                return Err(Error::parse_error(format!(
                    "mismatched closing tag </{name}>, expected </{open}>"
                )))
            }
            None => {
                return Err(Error::parse_error(format!(
                    "closing tag </{name}> without an open element"
                )))
            }
        }

        let depth = self.stack.len();
        self.stack.pop();

        if depth == 1 && name == ERROR_ROOT {
            // An error document without a message still must not pass as success.
            if let Some(code) = self.code.take() {
                return Err(Error::server_rejected(code));
            }
        }

        let capture = match self.capture.take() {
            Some(capture) if capture.depth == depth => capture,
            other => {
                self.capture = other;
                return Ok(None);
            }
        };
        let target = capture.target;
        let text = capture.finish()?;

        match target {
            Target::ResultName => Ok(Some(Element {
                name: name.to_string(),
                text,
            })),
            Target::ErrorCode => {
                self.code = Some(text);
                Ok(None)
            }
            Target::ErrorMessage => {
                debug!(
                    "server returned error {:?}: {text}",
                    self.code.as_deref().unwrap_or_default()
                );
                Err(Error::server_rejected(text))
            }
        }
    }
}

/// Decode character data, resolving the predefined and numeric entities.
fn decode_text(raw: Vec<u8>) -> Result<String> {
    let s = String::from_utf8(raw)?;
    if !s.contains('&') {
        return Ok(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s.as_str();
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        rest = &rest[idx + 1..];

        let end = rest
            .find(';')
            .ok_or_else(|| Error::parse_error("unterminated entity reference"))?;
        let entity = &rest[..end];
        rest = &rest[end + 1..];

        let c = match entity {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hex) = entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32).ok_or_else(|| {
                    Error::parse_error(format!("unknown entity reference &{entity};"))
                })?
            }
        };
        out.push(c);
    }
    out.push_str(rest);

    Ok(out)
}

/// Extractor reads an XML body and yields the result elements it contains.
///
/// It is a lazy, single pass iterator. After the first `Err` the iterator is
/// exhausted; an error document never yields `Ok` items after its message.
///
/// ```
/// use blobsign_azure_blob::Extractor;
///
/// let body = b"<EnumerationResults><Blobs><Blob><Name>a.txt</Name></Blob></Blobs></EnumerationResults>";
/// let names: Vec<String> = Extractor::new(&body[..])
///     .map(|v| v.map(|e| e.text))
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(names, vec!["a.txt"]);
/// ```
#[derive(Debug)]
pub struct Extractor<R> {
    reader: R,
    scanner: Scanner,
    buf: Box<[u8]>,
    pos: usize,
    len: usize,
}

impl<R: Read> Extractor<R> {
    /// Create an extractor over `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            scanner: Scanner::new(),
            buf: vec![0; READ_BUFFER_SIZE].into_boxed_slice(),
            pos: 0,
            len: 0,
        }
    }

    fn fill(&mut self) -> Result<usize> {
        loop {
            match self.reader.read(&mut self.buf) {
                Ok(n) => {
                    self.pos = 0;
                    self.len = n;
                    return Ok(n);
                }
                Err(e) if e.kind() == IoErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(
                        Error::transport_failure("failed to read response body").with_source(e)
                    )
                }
            }
        }
    }
}

impl<R: Read> Iterator for Extractor<R> {
    type Item = Result<Element>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.scanner.is_done() {
                return None;
            }

            if self.pos == self.len {
                match self.fill() {
                    Ok(0) => {
                        return match self.scanner.finish() {
                            Ok(()) => None,
                            Err(e) => Some(Err(e)),
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        self.scanner.abort();
                        return Some(Err(e));
                    }
                }
            }

            let b = self.buf[self.pos];
            self.pos += 1;
            match self.scanner.push(b) {
                Ok(Some(element)) => return Some(Ok(element)),
                Ok(None) => {}
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Collect the result names of a whole body.
///
/// Any error element fails the call even when results were found before it.
pub fn extract_names(body: &[u8]) -> Result<Vec<String>> {
    Extractor::new(body).map(|v| v.map(|e| e.text)).collect()
}
