//! Fixed-size character splitter without overlap.

use serde_json::Value;

use super::loader::SourceRecord;
use super::store::TextChunk;

pub const DEFAULT_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone)]
pub struct CharacterSplitter {
    chunk_size: usize,
    separator: String,
}

impl CharacterSplitter {
    /// `chunk_size` is counted in chars and must be non-zero.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }

    /// Splits on the separator, then greedily packs pieces back together
    /// while they fit. Pieces that are too long on their own are cut into
    /// `chunk_size` windows.
    pub fn split(&self, text: &str) -> Vec<String> {
        let pieces: Vec<&str> = if self.separator.is_empty() {
            vec![text]
        } else {
            text.split(self.separator.as_str()).collect()
        };
        let separator_len = self.separator.chars().count();

        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_len = 0;

        for piece in pieces.into_iter().map(str::trim).filter(|p| !p.is_empty()) {
            let piece_len = piece.chars().count();

            if piece_len > self.chunk_size {
                self.flush(&mut current, &mut chunks);
                current_len = 0;
                chunks.extend(hard_split(piece, self.chunk_size));
                continue;
            }

            let joined_len = if current.is_empty() {
                piece_len
            } else {
                current_len + separator_len + piece_len
            };

            if joined_len > self.chunk_size {
                self.flush(&mut current, &mut chunks);
                current_len = piece_len;
            } else {
                current_len = joined_len;
            }
            current.push(piece);
        }
        self.flush(&mut current, &mut chunks);

        chunks
    }

    /// Chunks every record, tagging each chunk with the record's metadata.
    pub fn split_documents(&self, records: &[SourceRecord]) -> Vec<TextChunk> {
        records
            .iter()
            .flat_map(|record| {
                let metadata = serde_json::to_value(&record.metadata).unwrap_or(Value::Null);
                self.split(&record.page_content)
                    .into_iter()
                    .map(move |content| TextChunk {
                        content,
                        metadata: metadata.clone(),
                    })
            })
            .collect()
    }

    fn flush(&self, current: &mut Vec<&str>, chunks: &mut Vec<String>) {
        if current.is_empty() {
            return;
        }
        let joined = current.join(&self.separator);
        let trimmed = joined.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
        current.clear();
    }
}

impl Default for CharacterSplitter {
    fn default() -> Self {
        Self::new(crate::core::config::defaults::CHUNK_SIZE)
    }
}

fn hard_split(text: &str, chunk_size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(chunk_size)
        .map(|window| window.iter().collect::<String>())
        .map(|window| window.trim().to_string())
        .filter(|window| !window.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::loader::RecordMetadata;

    fn record(row: usize, text: &str) -> SourceRecord {
        SourceRecord {
            page_content: text.to_string(),
            metadata: RecordMetadata {
                source: "wine-ratings.csv".to_string(),
                row,
            },
        }
    }

    #[test]
    fn short_text_is_one_chunk() {
        let splitter = CharacterSplitter::new(800);
        let chunks = splitter.split("name: Malbec\nrating: 90");
        assert_eq!(chunks, vec!["name: Malbec\nrating: 90"]);
    }

    #[test]
    fn paragraphs_are_packed_until_full() {
        let splitter = CharacterSplitter::new(11);
        let chunks = splitter.split("aaaa\n\nbbbb\n\ncccc");
        // "aaaa\n\nbbbb" is 10 chars; adding "\n\ncccc" would reach 16.
        assert_eq!(chunks, vec!["aaaa\n\nbbbb", "cccc"]);
    }

    #[test]
    fn long_piece_is_cut_into_windows() {
        let splitter = CharacterSplitter::new(800);
        let text = "x".repeat(2_000);

        let chunks = splitter.split(&text);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 800);
        assert_eq!(chunks[2].len(), 400);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn no_chunk_exceeds_limit_for_multibyte_text() {
        let splitter = CharacterSplitter::new(800);
        let paragraph = "Château Cheval Blanc, Saint-Émilion — très élégant. ".repeat(40);
        let text = format!("{}\n\n{}\n\nshort", paragraph, paragraph);

        let chunks = splitter.split(&text);

        assert!(chunks.len() > 2);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 800);
            assert!(!chunk.is_empty());
        }
    }

    #[test]
    fn whitespace_only_text_yields_nothing() {
        let splitter = CharacterSplitter::new(800);
        assert!(splitter.split("  \n\n \n\n").is_empty());
        assert!(splitter.split("").is_empty());
    }

    #[test]
    fn split_documents_carries_metadata() {
        let splitter = CharacterSplitter::new(800);
        let records = vec![record(0, "name: Rioja"), record(1, &"y".repeat(900))];

        let chunks = splitter.split_documents(&records);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].metadata["row"], 0);
        assert_eq!(chunks[1].metadata["row"], 1);
        assert_eq!(chunks[2].metadata["row"], 1);
        assert_eq!(chunks[2].metadata["source"], "wine-ratings.csv");
    }
}
