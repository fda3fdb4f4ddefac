//! 文本辅助函数

/// 按空白切分统计单词数，忽略空片段
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// 单词数是否在上限之内（空文本视为未超限）
pub fn within_word_limit(text: &str, max_words: usize) -> bool {
    word_count(text) <= max_words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_words_across_mixed_whitespace() {
        assert_eq!(word_count("  the  old\tlibrary\n"), 3);
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   "), 0);
    }

    #[test]
    fn word_limit_is_inclusive() {
        assert!(within_word_limit("fast food", 2));
        assert!(!within_word_limit("very fast food", 2));
        assert!(within_word_limit("", 1));
    }
}
