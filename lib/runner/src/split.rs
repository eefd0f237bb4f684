//! Splitting one editor buffer into several named files.
//!
//! A line of the form `#--- <name>` starts a new file called `<name>`. Lines
//! before the first marker belong to the unnamed main buffer. Each file
//! remembers the 0-indexed line of its marker so diagnostics produced for it
//! can be mapped back onto the original buffer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const MARKER: &str = "#--- ";

/// One named section of a split buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub name: String,
    pub content: String,
    /// Line of the `#---` marker in the original buffer, 0-indexed.
    pub source_line: usize,
}

impl SourceFile {
    /// The content padded with blank lines so that 1-indexed line numbers
    /// reported for it match the original buffer.
    pub fn aligned_content(&self) -> String {
        let mut aligned = "\n".repeat(self.source_line + 1);
        aligned.push_str(&self.content);
        aligned
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSource {
    pub files: BTreeMap<String, SourceFile>,
    /// Everything before the first marker.
    pub remaining: String,
}

impl SplitSource {
    /// Marker line of every named file.
    pub fn line_map(&self) -> BTreeMap<&str, usize> {
        self.files
            .values()
            .map(|file| (file.name.as_str(), file.source_line))
            .collect()
    }
}

fn marker_name(line: &str) -> Option<&str> {
    line.strip_prefix(MARKER).filter(|name| !name.is_empty())
}

/// Split `text` on `#--- <name>` marker lines.
///
/// Every line that ends up in a section is terminated with `\n`. When a name
/// is used more than once the last section wins.
pub fn split(text: &str) -> SplitSource {
    let mut result = SplitSource::default();
    let mut current: Option<SourceFile> = None;

    for (line_number, line) in text.split('\n').enumerate() {
        if let Some(name) = marker_name(line) {
            if let Some(done) = current.take() {
                result.files.insert(done.name.clone(), done);
            }
            current = Some(SourceFile {
                name: name.to_string(),
                content: String::new(),
                source_line: line_number,
            });
            continue;
        }

        let buffer = match current.as_mut() {
            Some(file) => &mut file.content,
            None => &mut result.remaining,
        };
        buffer.push_str(line);
        buffer.push('\n');
    }

    if let Some(done) = current {
        result.files.insert(done.name.clone(), done);
    }

    result
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn file(name: &str, content: &str, source_line: usize) -> (String, SourceFile) {
        (
            name.to_string(),
            SourceFile {
                name: name.to_string(),
                content: content.to_string(),
                source_line,
            },
        )
    }

    #[test]
    fn no_markers() {
        for text in ["", "puts 1", "puts 1\nputs 2\n", "#---\n#---x\n #--- indented"] {
            let result = split(text);

            assert_eq!(result.remaining, format!("{text}\n"));
            assert!(result.files.is_empty());
        }
    }

    #[test]
    fn every_section_becomes_a_file() {
        let result = split("#--- foo\nfoo\n#--- bar\nbar\n#--- baz\nbaz");

        assert_eq!(result.remaining, "");
        assert_eq!(
            result.files,
            BTreeMap::from([
                file("foo", "foo\n", 0),
                file("bar", "bar\n", 2),
                file("baz", "baz\n", 4),
            ])
        );
    }

    #[test]
    fn leading_content_is_the_main_buffer() {
        let result = split("main\n#--- foo\nfoo");

        assert_eq!(result.remaining, "main\n");
        assert_eq!(result.files, BTreeMap::from([file("foo", "foo\n", 1)]));
    }

    #[test]
    fn last_section_with_a_name_wins() {
        let result = split("#--- x\nfirst\n#--- y\ny\n#--- x\nsecond\nthird");

        assert_eq!(result.files["x"], file("x", "second\nthird\n", 4).1);
        assert_eq!(result.files.len(), 2);
    }

    #[test]
    fn empty_sections() {
        let result = split("#--- a\n#--- b");

        assert_eq!(
            result.files,
            BTreeMap::from([file("a", "", 0), file("b", "", 1)])
        );
    }

    #[test]
    fn names_keep_everything_after_the_marker() {
        let result = split("#--- lib/has spaces.rb\nx");

        assert_eq!(result.files["lib/has spaces.rb"].content, "x\n");
    }

    #[test]
    fn aligned_content_matches_original_line_numbers() {
        let text = "main\n#--- foo.rb\nline one\nline two";
        let result = split(text);
        let foo = &result.files["foo.rb"];

        let aligned = foo.aligned_content();
        let original_lines: Vec<_> = text.split('\n').collect();

        // 1-indexed line 3 of the aligned file is 1-indexed line 3 of the buffer.
        assert_eq!(aligned.split('\n').nth(2), Some("line one"));
        assert_eq!(original_lines[2], "line one");
        assert_eq!(aligned, "\n\nline one\nline two\n");
    }

    #[test]
    fn line_map_lists_marker_lines() {
        let result = split("#--- a\n1\n2\n#--- b\n3");

        assert_eq!(result.line_map(), BTreeMap::from([("a", 0), ("b", 3)]));
    }
}
