//! Property tests for chunk coverage and reconstruction.

use docqa_rag::chunking::{ChunkingStrategy, split};
use docqa_rag::document::{Chunk, Document};
use proptest::prelude::*;

/// Drop each chunk's overlap with its predecessor and concatenate.
fn reconstruct(chunks: &[Chunk]) -> String {
    let mut out = String::new();
    let mut previous_end = 0;
    for chunk in chunks {
        assert!(chunk.start <= previous_end, "gap before chunk {}", chunk.index);
        out.extend(chunk.text.chars().skip(previous_end - chunk.start));
        previous_end = chunk.end;
    }
    out
}

fn arb_params() -> impl Strategy<Value = (usize, usize)> {
    (1usize..60).prop_flat_map(|size| (Just(size), 0..size))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn fixed_split_reconstructs_text(
        text in "[a-zé .\n]{1,400}",
        (chunk_size, overlap) in arb_params(),
    ) {
        let chunks = split(&text, chunk_size, overlap).unwrap();
        let chars: Vec<char> = text.chars().collect();

        prop_assert!(!chunks.is_empty());
        prop_assert_eq!(reconstruct(&chunks), text.clone());
        for (i, chunk) in chunks.iter().enumerate() {
            prop_assert_eq!(chunk.index, i);
            prop_assert!(chunk.char_len() <= chunk_size);
            prop_assert_eq!(chunk.start, i * (chunk_size - overlap));
            let expected: String = chars[chunk.start..chunk.end].iter().collect();
            prop_assert_eq!(&chunk.text, &expected);
        }
        prop_assert_eq!(chunks.last().unwrap().end, chars.len());
    }

    #[test]
    fn recursive_chunks_reconstruct_text(
        text in "[a-z]{0,8}([ .\n]{1,3}[a-z]{1,12}){0,40}",
        (chunk_size, overlap) in arb_params(),
    ) {
        let document = Document::new("doc", text.clone());
        let chunker = ChunkingStrategy::Recursive.chunker(chunk_size, overlap).unwrap();
        let chunks = chunker.chunk(&document);

        if text.is_empty() {
            prop_assert!(chunks.is_empty());
        } else {
            prop_assert_eq!(reconstruct(&chunks), text.clone());
            for pair in chunks.windows(2) {
                prop_assert!(pair[1].start > pair[0].start);
                prop_assert!(pair[0].end - pair[1].start <= overlap);
            }
            for chunk in &chunks {
                prop_assert!(chunk.char_len() <= chunk_size);
                prop_assert!(chunk.char_len() > 0);
            }
        }
    }

    #[test]
    fn splitting_is_deterministic(
        text in "[a-z .]{0,200}",
        (chunk_size, overlap) in arb_params(),
    ) {
        prop_assert_eq!(
            split(&text, chunk_size, overlap).unwrap(),
            split(&text, chunk_size, overlap).unwrap()
        );
    }
}

#[test]
fn scenario_1200_chars_500_50() {
    let text = "lorem ipsum ".repeat(100);
    assert_eq!(text.chars().count(), 1200);

    let chunks = split(&text, 500, 50).unwrap();
    let ranges: Vec<(usize, usize)> = chunks.iter().map(|c| (c.start, c.end)).collect();
    assert_eq!(ranges, vec![(0, 500), (450, 950), (900, 1200)]);
    assert_eq!(chunks[2].text.chars().count(), 300);
}
