//! 推文文本清洗

use regex::Regex;
use std::sync::LazyLock;

static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)http\S+|www\S+|https\S+").unwrap());
static MENTION_HASHTAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\w+|#\w+").unwrap());

/// 清洗文本：去掉 URL，去掉 @提及 和 #话题，再压缩空白
///
/// `http\S+` 吃掉到空白为止的全部内容，`@\w+` 吃掉到非单词字符为止，
/// 所以删除后两侧拼不出新的匹配，清洗一次即为不动点。
pub fn clean_text(text: &str) -> String {
    let without_urls = URL_REGEX.replace_all(text, "");
    let stripped = MENTION_HASHTAG_REGEX.replace_all(&without_urls, "");

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_url_mention_hashtag() {
        let cleaned = clean_text("Check out this link: https://example.com @user #hashtag");
        assert!(!cleaned.contains("https://"));
        assert!(!cleaned.contains("@user"));
        assert!(!cleaned.contains("#hashtag"));
        assert_eq!(cleaned, "Check out this link:");
    }

    #[test]
    fn test_removes_patterns_anywhere() {
        assert_eq!(clean_text("www.site.org is down"), "is down");
        assert_eq!(clean_text("see http://a.b/c?d=1 now"), "see now");
        assert_eq!(clean_text("#first middle @last"), "middle");
        assert_eq!(clean_text("line one\nhttps://x.y\nline two"), "line one line two");
        assert_eq!(clean_text("mail me@home please"), "mail me please");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(clean_text("  lots   of \t\n space  "), "lots of space");
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("   "), "");
    }

    #[test]
    fn test_keeps_unicode_words() {
        assert_eq!(clean_text("héllo wörld #über"), "héllo wörld");
        assert_eq!(clean_text("东京 @東京 today"), "东京 today");
    }

    #[test]
    fn test_bare_markers_survive() {
        // 单独的 @ 或 # 后面没有单词字符，不匹配
        assert_eq!(clean_text("a @ b # c"), "a @ b # c");
        assert_eq!(clean_text("http alone"), "http alone");
    }

    #[test]
    fn test_removal_does_not_splice_new_matches() {
        assert_eq!(clean_text("ww@xw.example.com ok"), "ww.example.com ok");
        assert_eq!(clean_text("xhttp@y z"), "x z");
        assert_eq!(clean_text("@abchttp://x rest"), "rest");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "Check out this link: https://example.com @user #hashtag",
            "ww@xw.example.com ok",
            "xhttp@y z",
            "@abchttp://x rest",
            "  @a@b##c  www  x  ",
            "I love this amazing product! It's fantastic!",
            "",
            "東京 #tokyo\u{00a0}nbsp",
        ];

        for input in inputs {
            let once = clean_text(input);
            assert_eq!(clean_text(&once), once, "input: {:?}", input);
        }
    }
}
