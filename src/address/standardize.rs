//! # Name Standardization
//!
//! Address names arrive in many spellings: full-width and half-width
//! characters, old and new kanji forms, small and large kana (`霞ヶ関`,
//! `霞ケ関`, `霞が関`). A [`Standardizer`] folds them into one key used for
//! sorting, deduplication and trie labels.
//!
//! The build treats the standardizer as a black box. [`NfkcStandardizer`]
//! covers the common cases:
//!
//! 1. NFKC normalization (full-width ASCII, half-width kana, compatibility
//!    ideographs)
//! 2. Whitespace and control characters removed
//! 3. A small fold table of variant kanji and kana
//!
//! A full itaiji converter can be plugged in by implementing the trait.

use unicode_normalization::UnicodeNormalization;

pub trait Standardizer {
    fn standardize(&self, text: &str) -> String;

    /// Alternative standardized spellings of `text`, excluding the canonical
    /// one. Each is registered as an extra trie label.
    fn variants(&self, _text: &str) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NfkcStandardizer;

impl Standardizer for NfkcStandardizer {
    fn standardize(&self, text: &str) -> String {
        text.nfkc()
            .filter(|c| !c.is_whitespace() && !c.is_control())
            .map(fold)
            .collect()
    }

    fn variants(&self, text: &str) -> Vec<String> {
        let canonical = self.standardize(text);
        let mut variants = Vec::new();

        if canonical.contains('ケ') {
            variants.push(canonical.replace('ケ', "ガ"));
        }
        if canonical.contains('ガ') {
            variants.push(canonical.replace('ガ', "ケ"));
        }

        variants.retain(|v| v != &canonical);
        variants.sort();
        variants.dedup();
        variants
    }
}

fn fold(c: char) -> char {
    match c {
        'ヶ' | 'ゖ' => 'ケ',
        'ヵ' | 'ゕ' => 'カ',
        'の' | '之' => 'ノ',
        'が' => 'ガ',
        '舘' => '館',
        '﨑' => '崎',
        '髙' => '高',
        '嶋' => '島',
        '澤' => '沢',
        '邊' | '邉' => '辺',
        '齋' => '斎',
        '齊' => '斉',
        '檜' => '桧',
        '槇' => '槙',
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_and_spaces_are_normalized() {
        let s = NfkcStandardizer;
        assert_eq!(s.standardize("１丁目 ２番"), "1丁目2番");
        assert_eq!(s.standardize("ｼﾌﾞﾔ"), "シブヤ");
    }

    #[test]
    fn variant_characters_fold_together() {
        let s = NfkcStandardizer;
        assert_eq!(s.standardize("霞ヶ関"), s.standardize("霞ケ関"));
        assert_eq!(s.standardize("髙島屋"), "高島屋");
        assert_eq!(s.standardize("自由が丘"), "自由ガ丘");
    }

    #[test]
    fn ke_ga_variants() {
        let s = NfkcStandardizer;
        assert_eq!(s.variants("霞ヶ関"), vec!["霞ガ関".to_string()]);
        assert_eq!(s.variants("霞が関"), vec!["霞ケ関".to_string()]);
        assert!(s.variants("渋谷区").is_empty());
    }
}
