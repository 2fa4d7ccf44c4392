//! Intermediate count files.
//!
//! Aggregated counts are written as `key<TAB>count` lines, one record per
//! line, sorted by key, into `part-r-00000` under a per-class directory of
//! the output root. Reading is tolerant: a line that does not parse is logged
//! and skipped.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{BufWriter, Write};

use log::{debug, warn};

use crate::error::{CorpusBayesError, Result};
use crate::storage::{Storage, join_path, read_lines};

/// Name of the file written for each aggregated key space.
pub const PART_FILE_NAME: &str = "part-r-00000";

/// Every file whose name starts with this prefix is read back.
pub const PART_FILE_PREFIX: &str = "part-r";

/// Output sub-directory holding the per-class document counts.
pub const DOC_COUNTS_DIR: &str = "_doc_counts";

/// One `key<TAB>count` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountRecord {
    pub key: String,
    pub count: u64,
}

impl CountRecord {
    pub fn new(key: impl Into<String>, count: u64) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }

    /// Parse a line, splitting on the last tab so keys may contain spaces and tabs.
    pub fn parse(line: &str) -> Option<Self> {
        let (key, count) = line.rsplit_once('\t')?;
        let count = count.trim().parse::<u64>().ok()?;
        Some(Self::new(key, count))
    }
}

impl fmt::Display for CountRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.key, self.count)
    }
}

/// Counts read back from a directory of part files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartFileContents {
    /// Key → count, summed over all part files.
    pub counts: BTreeMap<String, u64>,

    /// Number of lines skipped because they did not parse.
    pub malformed_lines: u64,
}

/// Write `records` to `<dir>/part-r-00000`, replacing any previous content.
pub fn write_part_file<'a, I>(storage: &dyn Storage, dir: &str, records: I) -> Result<u64>
where
    I: IntoIterator<Item = (&'a str, u64)>,
{
    let path = join_path(dir, PART_FILE_NAME);
    let mut output = storage.create_output(&path)?;
    let mut written = 0;
    {
        let mut writer = BufWriter::new(&mut output);
        for (key, count) in records {
            writeln!(writer, "{key}\t{count}")?;
            written += 1;
        }
        writer.flush()?;
    }
    output.close()?;

    debug!("Wrote {written} records to {path}");
    Ok(written)
}

/// Read every `part-r*` file directly under `dir`.
///
/// A missing directory reads as empty. Duplicate keys across files are summed.
pub fn read_part_files(storage: &dyn Storage, dir: &str) -> Result<PartFileContents> {
    let mut contents = PartFileContents::default();
    if !storage.exists(dir) {
        return Ok(contents);
    }
    if !storage.is_dir(dir) {
        return Err(CorpusBayesError::storage(format!(
            "Expected a directory of part files: {dir}"
        )));
    }

    for name in storage.list(dir)? {
        if !name.starts_with(PART_FILE_PREFIX) {
            continue;
        }
        let path = join_path(dir, &name);
        for (line_no, line) in read_lines(storage, &path)?.enumerate() {
            let line = line?;
            match CountRecord::parse(&line) {
                Some(record) => *contents.counts.entry(record.key).or_insert(0) += record.count,
                None => {
                    warn!("Skipping malformed line {} in {path}: {line:?}", line_no + 1);
                    contents.malformed_lines += 1;
                }
            }
        }
    }

    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_parse_record() {
        assert_eq!(CountRecord::parse("trade\t3"), Some(CountRecord::new("trade", 3)));
        assert_eq!(
            CountRecord::parse("New York\t12"),
            Some(CountRecord::new("New York", 12))
        );
        assert_eq!(CountRecord::parse("a\tb\t2"), Some(CountRecord::new("a\tb", 2)));
        assert_eq!(CountRecord::parse("\t1"), Some(CountRecord::new("", 1)));
    }

    #[test]
    fn test_parse_malformed_record() {
        assert_eq!(CountRecord::parse("no tab here"), None);
        assert_eq!(CountRecord::parse("token\tmany"), None);
        assert_eq!(CountRecord::parse("token\t-1"), None);
        assert_eq!(CountRecord::parse("token\t"), None);
    }

    #[test]
    fn test_write_and_read_back() {
        let storage = MemoryStorage::new_default();
        let written = write_part_file(
            &storage,
            "out/USA",
            vec![("New York", 2u64), ("tariff", 1), ("trade", 3)],
        )
        .unwrap();
        assert_eq!(written, 3);

        let contents = read_part_files(&storage, "out/USA").unwrap();
        assert_eq!(contents.malformed_lines, 0);
        assert_eq!(contents.counts.len(), 3);
        assert_eq!(contents.counts["New York"], 2);
        assert_eq!(contents.counts["trade"], 3);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let storage = MemoryStorage::new_default();
        storage
            .put("out/USA/part-r-00000", "trade\t3\ngarbage\ntariff\tx\nduty\t1\n")
            .unwrap();
        storage.put("out/USA/part-r-00001", "trade\t2\n").unwrap();
        storage.put("out/USA/_SUCCESS", "ignored\n").unwrap();

        let contents = read_part_files(&storage, "out/USA").unwrap();
        assert_eq!(contents.malformed_lines, 2);
        assert_eq!(contents.counts["trade"], 5);
        assert_eq!(contents.counts["duty"], 1);
        assert_eq!(contents.counts.len(), 2);
    }

    #[test]
    fn test_missing_directory_reads_empty() {
        let storage = MemoryStorage::new_default();
        let contents = read_part_files(&storage, "out/NONE").unwrap();
        assert!(contents.counts.is_empty());
    }
}
