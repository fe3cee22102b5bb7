use crate::error::{BinSplitError, Result};
use crate::extractor::output_manager::{ExtractedFragment, ExtractionReport, OutputManager};
use crate::extractor::size::binary_unit;
use crate::manifest::FragmentDescriptor;
use crate::ui::Log;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Instant;

const SEPARATOR: &str = "====================================================";

/// What to do when the input ends before a fragment's length is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortReadPolicy {
    /// Fail the run; no file is written for the fragment.
    #[default]
    Strict,
    /// Write whatever was available and log a warning.
    Truncate,
}

/// The source image, opened once and shared by every fragment.
struct InputImage {
    path: PathBuf,
    file: File,
    size: u64,
}

impl InputImage {
    fn open(path: &Path) -> Result<Self> {
        let label = path.display().to_string();

        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(BinSplitError::InputMissing { path: label })
            }
            Err(source) => return Err(BinSplitError::InputUnreadable { path: label, source }),
        };

        if !metadata.is_file() {
            return Err(BinSplitError::InputUnreadable {
                path: label,
                source: io::Error::new(ErrorKind::InvalidInput, "not a regular file"),
            });
        }

        let file = File::open(path)
            .map_err(|source| BinSplitError::InputUnreadable { path: label, source })?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            size: metadata.len(),
        })
    }

    /// Bytes actually available for `fragment`, ignoring bounds policy.
    fn available(&self, fragment: &FragmentDescriptor) -> u64 {
        fragment
            .length
            .min(self.size.saturating_sub(fragment.offset))
    }

    fn read_range(&mut self, fragment: &FragmentDescriptor) -> Result<Vec<u8>> {
        let capacity = usize::try_from(self.available(fragment)).unwrap_or(0);
        let mut data = Vec::with_capacity(capacity);

        self.file
            .seek(SeekFrom::Start(fragment.offset))
            .and_then(|_| self.file.by_ref().take(fragment.length).read_to_end(&mut data))
            .map_err(|source| BinSplitError::InputUnreadable {
                path: self.path.display().to_string(),
                source,
            })?;

        Ok(data)
    }
}

pub struct FragmentExtractor<'a> {
    log: &'a dyn Log,
    short_read: ShortReadPolicy,
    bounds_check: bool,
}

impl<'a> FragmentExtractor<'a> {
    pub fn new(log: &'a dyn Log) -> Self {
        Self {
            log,
            short_read: ShortReadPolicy::Strict,
            bounds_check: true,
        }
    }

    pub fn with_short_read_policy(mut self, policy: ShortReadPolicy) -> Self {
        self.short_read = policy;
        self
    }

    pub fn with_bounds_check(mut self, enabled: bool) -> Self {
        self.bounds_check = enabled;
        self
    }

    /// Copy every fragment of `input` into its own file, in manifest order.
    ///
    /// The first failing fragment aborts the run; files already written for
    /// earlier fragments are left in place.
    pub fn extract(
        &self,
        input: &Path,
        output: &Path,
        fragments: &[FragmentDescriptor],
    ) -> Result<ExtractionReport> {
        let started_at = Utc::now();
        let start = Instant::now();

        let mut image = InputImage::open(input)?;
        let output_manager = OutputManager::new(output);
        self.log.debug(&format!(
            "input {} is {} bytes, writing into {}",
            image.path.display(),
            image.size,
            output_manager.get_output_directory().display()
        ));

        let mut extracted = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            extracted.push(self.extract_fragment(&mut image, &output_manager, fragment)?);
        }

        Ok(ExtractionReport {
            input: image.path,
            input_size: image.size,
            output_directory: output_manager.get_output_directory().to_path_buf(),
            fragments: extracted,
            started_at,
            duration: start.elapsed(),
            dry_run: false,
        })
    }

    /// Validate the input and every fragment without writing anything.
    pub fn plan(
        &self,
        input: &Path,
        output: &Path,
        fragments: &[FragmentDescriptor],
    ) -> Result<ExtractionReport> {
        let started_at = Utc::now();
        let start = Instant::now();

        let image = InputImage::open(input)?;
        let output_manager = OutputManager::new(output);

        let mut planned = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            self.check_bounds(fragment, image.size)?;
            let bytes = image.available(fragment);
            let truncated = self.check_length(fragment, bytes)?;
            let path = output_manager.fragment_path(&fragment.name);

            self.log.info(&format!(
                "would write {} ({}) from offset {:#x}",
                path.display(),
                binary_unit(bytes),
                fragment.offset
            ));

            planned.push(ExtractedFragment {
                name: fragment.name.clone(),
                path,
                offset: fragment.offset,
                length: fragment.length,
                bytes,
                truncated,
            });
        }

        Ok(ExtractionReport {
            input: image.path,
            input_size: image.size,
            output_directory: output_manager.get_output_directory().to_path_buf(),
            fragments: planned,
            started_at,
            duration: start.elapsed(),
            dry_run: true,
        })
    }

    fn extract_fragment(
        &self,
        image: &mut InputImage,
        output: &OutputManager,
        fragment: &FragmentDescriptor,
    ) -> Result<ExtractedFragment> {
        self.check_bounds(fragment, image.size)?;

        output.ensure_directory()?;

        let path = output.fragment_path(&fragment.name);
        if output.remove_existing(&path)? {
            self.log
                .debug(&format!("removed previous {}", path.display()));
        }

        self.log.debug(&format!(
            "{}: seek {:#x}, read {:#x} bytes",
            fragment.name, fragment.offset, fragment.length
        ));
        let data = image.read_range(fragment)?;
        let bytes = data.len() as u64;
        let truncated = self.check_length(fragment, bytes)?;

        output.write_fragment(&path, &data)?;

        self.log.info(SEPARATOR);
        self.log.info(&format!("binary output = {}", path.display()));
        self.log
            .info(&format!("binary length = {}", binary_unit(fragment.length)));
        self.log.info(SEPARATOR);

        Ok(ExtractedFragment {
            name: fragment.name.clone(),
            path,
            offset: fragment.offset,
            length: fragment.length,
            bytes,
            truncated,
        })
    }

    fn check_bounds(&self, fragment: &FragmentDescriptor, input_size: u64) -> Result<()> {
        if !self.bounds_check {
            return Ok(());
        }

        match fragment.end() {
            Some(end) if end <= input_size => Ok(()),
            _ => {
                let error = BinSplitError::OutOfBounds {
                    name: fragment.name.clone(),
                    offset: fragment.offset,
                    length: fragment.length,
                    input_size,
                };
                self.log.error(&error.to_string());
                Err(error)
            }
        }
    }

    /// Returns whether the fragment ends up truncated.
    fn check_length(&self, fragment: &FragmentDescriptor, actual: u64) -> Result<bool> {
        if actual == fragment.length {
            return Ok(false);
        }

        match self.short_read {
            ShortReadPolicy::Strict => {
                let error = BinSplitError::ShortRead {
                    name: fragment.name.clone(),
                    expected: fragment.length,
                    actual,
                };
                self.log.error(&error.to_string());
                Err(error)
            }
            ShortReadPolicy::Truncate => {
                self.log.warning(&format!(
                    "{} truncated: {} of {} bytes available",
                    fragment.name, actual, fragment.length
                ));
                Ok(true)
            }
        }
    }
}
