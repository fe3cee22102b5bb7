use crate::error::{BinSplitError, Result};
use crate::manifest::FragmentDescriptor;
use crate::ui::Log;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const BIN_TAG: &[u8] = b"bin";
const OFFSET_TAG: &[u8] = b"offset";
const LENGTH_TAG: &[u8] = b"length";
const NAME_ATTR: &str = "name";

/// Which text field, if any, character data is currently appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    None,
    Offset,
    Length,
}

#[derive(Debug, Default)]
struct PendingBin {
    name: Option<String>,
    offset: Option<String>,
    length: Option<String>,
}

impl PendingBin {
    fn finish(self) -> std::result::Result<FragmentDescriptor, String> {
        let name = self.name.ok_or("<bin> element without a 'name' attribute")?;
        let offset = self
            .offset
            .ok_or_else(|| format!("<bin name=\"{}\"> has no <offset>", name))?;
        let length = self
            .length
            .ok_or_else(|| format!("<bin name=\"{}\"> has no <length>", name))?;

        FragmentDescriptor::from_hex(&name, &offset, &length).map_err(|e| e.to_string())
    }
}

#[derive(Debug)]
struct ManifestState {
    depth: usize,
    saw_root: bool,
    capture: Capture,
    pending: Option<PendingBin>,
    fragments: Vec<FragmentDescriptor>,
}

impl ManifestState {
    fn new() -> Self {
        Self {
            depth: 0,
            saw_root: false,
            capture: Capture::None,
            pending: None,
            fragments: Vec::new(),
        }
    }

    fn start(&mut self, element: &BytesStart<'_>) -> std::result::Result<(), String> {
        if self.depth == 0 {
            if self.saw_root {
                return Err("junk after document element".to_string());
            }
            self.saw_root = true;
        }
        self.depth += 1;

        match element.name().as_ref() {
            BIN_TAG => {
                if self.pending.is_some() {
                    return Err("nested <bin> element".to_string());
                }
                let name = element
                    .try_get_attribute(NAME_ATTR)
                    .map_err(|e| e.to_string())?
                    .map(|attr| attr.unescape_value().map(|v| v.into_owned()))
                    .transpose()
                    .map_err(|e| e.to_string())?;
                self.pending = Some(PendingBin {
                    name,
                    ..PendingBin::default()
                });
                self.capture = Capture::None;
            }
            OFFSET_TAG => self.begin_field(Capture::Offset),
            LENGTH_TAG => self.begin_field(Capture::Length),
            _ => self.capture = Capture::None,
        }

        Ok(())
    }

    /// A repeated `<offset>`/`<length>` restarts the field; chunks inside one
    /// element accumulate.
    fn begin_field(&mut self, capture: Capture) {
        let Some(pending) = self.pending.as_mut() else {
            self.capture = Capture::None;
            return;
        };

        match capture {
            Capture::Offset => pending.offset = Some(String::new()),
            Capture::Length => pending.length = Some(String::new()),
            Capture::None => {}
        }
        self.capture = capture;
    }

    fn text(&mut self, chunk: &str) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };

        let field = match self.capture {
            Capture::Offset => pending.offset.as_mut(),
            Capture::Length => pending.length.as_mut(),
            Capture::None => None,
        };

        if let Some(field) = field {
            field.push_str(chunk);
        }
    }

    fn end(&mut self, name: &[u8]) -> std::result::Result<(), String> {
        self.depth = self.depth.saturating_sub(1);
        self.capture = Capture::None;

        if name == BIN_TAG {
            if let Some(pending) = self.pending.take() {
                self.fragments.push(pending.finish()?);
            }
        }

        Ok(())
    }

    fn capturing(&self) -> bool {
        self.capture != Capture::None
    }

    fn finish(self) -> std::result::Result<Vec<FragmentDescriptor>, String> {
        if !self.saw_root {
            return Err("no element found".to_string());
        }
        if self.depth != 0 {
            return Err("unexpected end of document, unclosed element".to_string());
        }
        Ok(self.fragments)
    }
}

/// Streaming reader for `<bin name=".."><offset/><length/></bin>` manifests.
pub struct ManifestParser {
    source: String,
}

impl ManifestParser {
    /// `source` labels error messages, normally the manifest path.
    pub fn new<S: Into<String>>(source: S) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn parse_str(&self, xml: &str) -> Result<Vec<FragmentDescriptor>> {
        self.parse_reader(xml.as_bytes())
    }

    pub fn parse_reader<R: BufRead>(&self, input: R) -> Result<Vec<FragmentDescriptor>> {
        let mut reader = Reader::from_reader(input);
        let mut state = ManifestState::new();
        let mut buf = Vec::new();

        loop {
            let position = reader.buffer_position();
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| self.malformed(position, e.to_string()))?;

            let step = match event {
                Event::Start(ref element) => state.start(element),
                Event::Empty(ref element) => state
                    .start(element)
                    .and_then(|_| state.end(element.name().as_ref())),
                Event::End(ref element) => state.end(element.name().as_ref()),
                Event::Text(ref text) if state.capturing() => text
                    .unescape()
                    .map(|chunk| state.text(&chunk))
                    .map_err(|e| e.to_string()),
                Event::CData(ref data) if state.capturing() => std::str::from_utf8(data)
                    .map(|chunk| state.text(chunk))
                    .map_err(|e| e.to_string()),
                Event::Eof => break,
                _ => Ok(()),
            };

            step.map_err(|message| self.malformed(reader.buffer_position(), message))?;
            buf.clear();
        }

        state
            .finish()
            .map_err(|message| self.malformed(reader.buffer_position(), message))
    }

    fn malformed<P: std::fmt::Display>(&self, position: P, message: String) -> BinSplitError {
        BinSplitError::ManifestParse {
            path: self.source.clone(),
            message: format!("{} (at byte {})", message, position),
        }
    }
}

/// Strict parse: any missing, unreadable or malformed manifest is an error.
pub fn try_parse(path: &Path) -> Result<Vec<FragmentDescriptor>> {
    let label = path.display().to_string();

    if !path.exists() {
        return Err(BinSplitError::ConfigMissing { path: label });
    }

    let file = File::open(path).map_err(|e| BinSplitError::ManifestParse {
        path: label.clone(),
        message: format!("cannot open file: {}", e),
    })?;

    ManifestParser::new(label).parse_reader(BufReader::new(file))
}

/// Parse a manifest, degrading every failure to an empty fragment list.
///
/// A missing file is reported as a warning, anything else as an error with
/// the full diagnostic; the caller then simply has nothing to extract.
pub fn parse(path: &Path, log: &dyn Log) -> Vec<FragmentDescriptor> {
    match try_parse(path) {
        Ok(fragments) => {
            log.debug(&format!(
                "binary config {} lists {} fragment(s)",
                path.display(),
                fragments.len()
            ));
            fragments
        }
        Err(BinSplitError::ConfigMissing { path }) => {
            log.warning(&format!("des : binary config file {} does not exist.", path));
            Vec::new()
        }
        Err(e) => {
            log.error(&e.to_string());
            log.error(&format!("{:?}", e));
            log.error(&format!(
                "des : binary config file {} is parse error.",
                path.display()
            ));
            Vec::new()
        }
    }
}
