//! Re-readable sources of deferred section bodies.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use abq_inp::{Extent, LineReader, RawLine};

/// Something the mesh writer can re-open at a section [`Extent`], once per
/// traversal.
pub trait GeometrySource {
    fn open(&self, extent: &Extent) -> io::Result<Box<dyn BufRead + '_>>;
}

/// Deck text already in memory.
pub struct StrSource<'a> {
    text: &'a str,
}

impl<'a> StrSource<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }
}

impl GeometrySource for StrSource<'_> {
    fn open(&self, extent: &Extent) -> io::Result<Box<dyn BufRead + '_>> {
        let bytes = self
            .text
            .as_bytes()
            .get(extent.start as usize..extent.end as usize)
            .unwrap_or_default();
        Ok(Box::new(bytes))
    }
}

/// Deck on disk; each open seeks to the extent and reads no further than its end.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GeometrySource for FileSource {
    fn open(&self, extent: &Extent) -> io::Result<Box<dyn BufRead + '_>> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(extent.start))?;
        let len = extent.end.saturating_sub(extent.start);
        Ok(Box::new(BufReader::new(file.take(len))))
    }
}

/// Visit every data line of one extent, one line at a time. Returns the
/// number of data lines seen.
pub(crate) fn scan_extent<F>(
    source: &dyn GeometrySource,
    extent: &Extent,
    mut visit: F,
) -> crate::Result<usize>
where
    F: FnMut(&RawLine) -> crate::Result<()>,
{
    let mut lines = LineReader::starting_at(source.open(extent)?, extent.start, extent.header_line);
    let mut seen = 0usize;
    while let Some(line) = lines.next_data_line()? {
        seen += 1;
        visit(&line)?;
    }
    Ok(seen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use abq_inp::SectionReader;

    const DECK: &str = "*HEADING\nx\n*NODE\n1,0,0,0\n** note\n2,1,0,0\n*STEP\n";

    fn node_extent() -> Extent {
        SectionReader::with_defer(DECK.as_bytes(), |k: &str| k == "NODE")
            .filter_map(|s| s.ok())
            .find_map(|s| s.extent().copied())
            .expect("node extent")
    }

    #[test]
    fn str_source_rescans_the_same_lines() {
        let source = StrSource::new(DECK);
        let extent = node_extent();
        for _ in 0..2 {
            let mut texts = Vec::new();
            let seen = scan_extent(&source, &extent, |line| {
                texts.push((line.number, line.text.clone()));
                Ok(())
            })
            .expect("scan");
            assert_eq!(seen, 2);
            assert_eq!(
                texts,
                vec![(4, "1,0,0,0".to_string()), (6, "2,1,0,0".to_string())]
            );
        }
    }

    #[test]
    fn file_source_reads_only_the_extent() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("deck.inp");
        std::fs::write(&path, DECK).expect("write deck");

        let source = FileSource::new(&path);
        let extent = node_extent();
        let mut texts = Vec::new();
        let seen = scan_extent(&source, &extent, |line| {
            texts.push(line.text.clone());
            Ok(())
        })
        .expect("scan");
        assert_eq!(seen, 2);
        assert_eq!(texts, vec!["1,0,0,0", "2,1,0,0"]);
    }

    #[test]
    fn out_of_range_extent_reads_nothing() {
        let source = StrSource::new("short");
        let extent = Extent {
            start: 100,
            end: 200,
            header_line: 1,
            data_lines: 3,
        };
        let seen = scan_extent(&source, &extent, |_| Ok(())).expect("scan");
        assert_eq!(seen, 0);
    }
}
