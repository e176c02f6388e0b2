use log::warn;
use tokenizers::pre_tokenizers::whitespace::Whitespace;
use tokenizers::{OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer};

/// Splits normalized text into lowercase word tokens.
///
/// Pieces come from the `\w+|[^\w\s]+` whitespace pre-tokenizer. Digits,
/// underscores and punctuation are dropped, so `"Order #42 shipped!"` yields
/// `["order", "shipped"]`. The same function runs at training and at request
/// time, which keeps both sides in one vocabulary.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut pretokenized = PreTokenizedString::from(text);
    if let Err(e) = Whitespace::default().pre_tokenize(&mut pretokenized) {
        warn!("Pre-tokenizer failed, falling back to whitespace split: {}", e);
        return text.split_whitespace().filter_map(clean_piece).collect();
    }

    pretokenized
        .get_splits(OffsetReferential::Original, OffsetType::Byte)
        .into_iter()
        .filter_map(|(piece, _, _)| clean_piece(piece))
        .collect()
}

fn clean_piece(piece: &str) -> Option<String> {
    let token: String = piece
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect();
    (!token.is_empty()).then_some(token)
}
