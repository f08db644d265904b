use context_protocol::{
    Chunk, ProgrammingLanguage, RelevantDocument, MAX_RELATIVE_FILE_PATH_CHARS,
    RECOGNIZED_LANGUAGES,
};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Folds retrieved chunks into one document per file.
///
/// Files appear in the order their first chunk was seen. Inside a file,
/// chunks are ordered by start line; chunks without one keep their input
/// order and come after every chunk that has one.
#[derive(Debug, Clone)]
pub struct ChunkAggregator {
    languages: HashSet<String>,
}

impl Default for ChunkAggregator {
    fn default() -> Self {
        Self::with_languages(RECOGNIZED_LANGUAGES.iter().copied())
    }
}

impl ChunkAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregator that only reports languages from `languages`.
    pub fn with_languages<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            languages: languages.into_iter().map(Into::into).collect(),
        }
    }

    pub fn aggregate(&self, chunks: &[Chunk]) -> Vec<RelevantDocument> {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<Vec<&Chunk>> = Vec::new();

        for chunk in chunks {
            let key = chunk.file_key();
            match positions.get(key) {
                Some(&pos) => groups[pos].push(chunk),
                None => {
                    positions.insert(key, groups.len());
                    groups.push(vec![chunk]);
                }
            }
        }

        log::debug!(
            "Aggregated {} chunks into {} documents",
            chunks.len(),
            groups.len()
        );
        groups
            .into_iter()
            .map(|group| self.document(group))
            .collect()
    }

    fn document(&self, mut group: Vec<&Chunk>) -> RelevantDocument {
        let first = group[0];

        // `sort_by` is stable, so ties keep input order.
        group.sort_by(|a, b| compare_start_lines(a.start_line, b.start_line));

        let text = if group.iter().all(|chunk| chunk.content.is_empty()) {
            None
        } else {
            Some(
                group
                    .iter()
                    .map(|chunk| chunk.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
        };

        let relative_file_path = first
            .relative_path
            .as_deref()
            .filter(|path| !path.is_empty())
            .map(|path| truncate_chars(path, MAX_RELATIVE_FILE_PATH_CHARS));

        let programming_language = first
            .programming_language
            .as_deref()
            .filter(|language| self.languages.contains(*language))
            .map(|language| ProgrammingLanguage {
                language_name: language.to_string(),
            });

        RelevantDocument {
            relative_file_path,
            programming_language,
            text,
        }
    }
}

/// Aggregate with the default language whitelist.
pub fn chunks_to_relevant_documents(chunks: &[Chunk]) -> Vec<RelevantDocument> {
    ChunkAggregator::default().aggregate(chunks)
}

fn compare_start_lines(a: Option<usize>, b: Option<usize>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => value[..byte_idx].to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn js_chunk(relative_path: Option<&str>, content: &str, start_line: Option<usize>) -> Chunk {
        Chunk {
            file_path: "test.js".to_string(),
            relative_path: relative_path.map(str::to_string),
            content: content.to_string(),
            programming_language: Some("javascript".to_string()),
            start_line,
            id: "1".to_string(),
            index: 0,
            vector: vec![0.25, 0.5],
            ..Chunk::default()
        }
    }

    fn javascript() -> Option<ProgrammingLanguage> {
        Some(ProgrammingLanguage {
            language_name: "javascript".to_string(),
        })
    }

    #[test]
    fn converts_single_chunk() {
        let chunk = js_chunk(Some("src/test.js"), "console.log(\"hello\")", Some(1));

        let result = chunks_to_relevant_documents(&[chunk]);

        assert_eq!(
            result,
            vec![RelevantDocument {
                relative_file_path: Some("src/test.js".to_string()),
                programming_language: javascript(),
                text: Some("console.log(\"hello\")".to_string()),
            }]
        );
    }

    #[test]
    fn combines_chunks_of_one_file_by_start_line() {
        let chunks = vec![
            js_chunk(Some("src/test.js"), "const a = 1;", Some(2)),
            js_chunk(Some("src/test.js"), "console.log(a);", Some(1)),
        ];

        let result = chunks_to_relevant_documents(&chunks);

        assert_eq!(result.len(), 1);
        assert_eq!(
            result[0].text.as_deref(),
            Some("console.log(a);\nconst a = 1;")
        );
        assert_eq!(result[0].programming_language, javascript());
    }

    #[test]
    fn all_empty_content_omits_text() {
        let chunks = vec![
            js_chunk(Some("src/test.js"), "", Some(1)),
            js_chunk(Some("src/test.js"), "", Some(2)),
        ];

        let result = chunks_to_relevant_documents(&chunks);

        assert_eq!(
            result,
            vec![RelevantDocument {
                relative_file_path: Some("src/test.js".to_string()),
                programming_language: javascript(),
                text: None,
            }]
        );
    }

    #[test]
    fn empty_content_keeps_its_slot_next_to_real_content() {
        let chunks = vec![
            js_chunk(Some("src/test.js"), "", Some(1)),
            js_chunk(Some("src/test.js"), "tail", Some(2)),
        ];

        let result = chunks_to_relevant_documents(&chunks);

        assert_eq!(result[0].text.as_deref(), Some("\ntail"));
    }

    #[test]
    fn unsupported_language_is_omitted() {
        let mut chunk = js_chunk(Some("src/test.xyz"), "some content", Some(1));
        chunk.programming_language = Some("unsupported".to_string());

        let result = chunks_to_relevant_documents(&[chunk]);

        assert_eq!(
            result,
            vec![RelevantDocument {
                relative_file_path: Some("src/test.xyz".to_string()),
                programming_language: None,
                text: Some("some content".to_string()),
            }]
        );
    }

    #[test]
    fn custom_language_whitelist() {
        let chunk = js_chunk(Some("src/test.js"), "x", Some(1));
        let aggregator = ChunkAggregator::with_languages(["typescript"]);

        let result = aggregator.aggregate(&[chunk]);

        assert_eq!(result[0].programming_language, None);
    }

    #[test]
    fn truncates_long_relative_path() {
        let long_path = "a".repeat(5000);
        let chunk = js_chunk(Some(&long_path), "console.log(\"hello\")", Some(1));

        let result = chunks_to_relevant_documents(&[chunk]);

        assert_eq!(result.len(), 1);
        assert_eq!(
            result[0]
                .relative_file_path
                .as_ref()
                .map(|p| p.chars().count()),
            Some(4000)
        );
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long_path = "é".repeat(4001);
        let chunk = js_chunk(Some(&long_path), "x", Some(1));

        let result = chunks_to_relevant_documents(&[chunk]);

        assert_eq!(result[0].relative_file_path, Some("é".repeat(4000)));
    }

    #[test]
    fn keeps_files_apart_in_input_order() {
        let mut first = js_chunk(Some("src/test1.js"), "file1 content", Some(1));
        first.file_path = "test1.js".to_string();
        let mut second = js_chunk(Some("src/test2.js"), "file2 content", Some(1));
        second.file_path = "test2.js".to_string();

        let result = chunks_to_relevant_documents(&[first, second]);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].text.as_deref(), Some("file1 content"));
        assert_eq!(result[1].text.as_deref(), Some("file2 content"));
    }

    #[test]
    fn missing_relative_path_groups_by_file_path_and_omits_field() {
        let mut first = js_chunk(None, "one", Some(1));
        first.file_path = "test1.js".to_string();
        let mut second = js_chunk(None, "two", Some(1));
        second.file_path = "test2.js".to_string();

        let result = chunks_to_relevant_documents(&[first, second]);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].relative_file_path, None);
        assert_eq!(result[0].text.as_deref(), Some("one"));
        assert_eq!(result[1].relative_file_path, None);
        assert_eq!(result[1].text.as_deref(), Some("two"));
    }

    #[test]
    fn empty_relative_path_is_omitted() {
        let mut chunk = js_chunk(Some(""), "x", Some(1));
        chunk.file_path = "/repo/x.js".to_string();

        let result = chunks_to_relevant_documents(&[chunk]);

        assert_eq!(result[0].relative_file_path, None);
    }

    #[test]
    fn missing_start_lines_keep_input_order() {
        let chunks = vec![
            js_chunk(Some("src/test.js"), "const a = 1;", None),
            js_chunk(Some("src/test.js"), "console.log(a);", None),
        ];

        let result = chunks_to_relevant_documents(&chunks);

        assert_eq!(result.len(), 1);
        assert_eq!(
            result[0].text.as_deref(),
            Some("const a = 1;\nconsole.log(a);")
        );
    }

    #[test]
    fn missing_start_lines_sort_after_known_ones() {
        let chunks = vec![
            js_chunk(Some("src/test.js"), "unknown-1", None),
            js_chunk(Some("src/test.js"), "line-9", Some(9)),
            js_chunk(Some("src/test.js"), "unknown-2", None),
            js_chunk(Some("src/test.js"), "line-3", Some(3)),
        ];

        let result = chunks_to_relevant_documents(&chunks);

        assert_eq!(
            result[0].text.as_deref(),
            Some("line-3\nline-9\nunknown-1\nunknown-2")
        );
    }

    #[test]
    fn interleaved_files_follow_first_seen_order() {
        let chunks = vec![
            js_chunk(Some("b.js"), "b1", Some(1)),
            js_chunk(Some("a.js"), "a1", Some(1)),
            js_chunk(Some("b.js"), "b0", Some(0)),
        ];

        let result = chunks_to_relevant_documents(&chunks);

        let paths: Vec<_> = result
            .iter()
            .map(|doc| doc.relative_file_path.as_deref())
            .collect();
        assert_eq!(paths, vec![Some("b.js"), Some("a.js")]);
        assert_eq!(result[0].text.as_deref(), Some("b0\nb1"));
    }

    #[test]
    fn serialized_document_carries_only_document_fields() {
        let chunk = js_chunk(Some("src/test.js"), "console.log(\"hello\")", Some(1));

        let result = chunks_to_relevant_documents(&[chunk]);
        let value = serde_json::to_value(&result[0]).unwrap();

        let mut keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["programmingLanguage", "relativeFilePath", "text"]);
        assert!(value.get("documentSymbols").is_none());
    }

    #[test]
    fn empty_input_yields_no_documents() {
        assert!(chunks_to_relevant_documents(&[]).is_empty());
    }
}
