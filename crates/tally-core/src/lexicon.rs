//! Category keyword lexicon
//!
//! Static, ordered table of category keywords used by the fallback parser.
//! Keywords are lowercase; matching is a case-insensitive substring test.
//! A category's position in the table decides ties, so the table follows
//! the declaration order of [`Category`].

use crate::models::Category;

/// Keyword table in category declaration order
pub const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Food,
        &[
            "午餐", "晚餐", "早餐", "餐", "吃", "喝", "咖啡", "飲料", "食", "lunch", "dinner",
            "breakfast", "coffee", "meal", "snack", "drink",
        ],
    ),
    (
        Category::Transport,
        &[
            "捷運", "公車", "計程車", "uber", "taxi", "交通", "油錢", "停車", "metro", "parking",
            "fuel", "gasoline",
        ],
    ),
    (
        Category::Entertainment,
        &[
            "電影", "遊戲", "娛樂", "ktv", "唱歌", "演唱會", "movie", "cinema", "concert",
            "game",
        ],
    ),
    (
        Category::Shopping,
        &[
            "買", "購物", "衣服", "鞋子", "包包", "購", "shopping", "clothes", "shoes",
        ],
    ),
    (
        Category::Housing,
        &[
            "房租", "水電", "瓦斯", "網路", "租金", "管理費", "rent", "utilities", "electricity",
        ],
    ),
    (
        Category::Medical,
        &[
            "醫療", "看病", "藥", "診所", "醫院", "健保", "doctor", "clinic", "hospital",
            "pharmacy", "medicine",
        ],
    ),
    (
        Category::Education,
        &[
            "課程", "書", "學費", "補習", "教育", "course", "tuition", "textbook",
        ],
    ),
    (
        Category::Subscription,
        &[
            "訂閱", "netflix", "spotify", "youtube", "會員", "subscription", "membership",
        ],
    ),
    (Category::Other, &[]),
    (
        Category::Income,
        &["收入", "薪水", "獎金", "紅包", "進帳", "salary", "bonus", "paycheck"],
    ),
];

/// Keywords registered for a category
pub fn keywords_for(category: Category) -> &'static [&'static str] {
    CATEGORY_KEYWORDS
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, words)| *words)
        .unwrap_or(&[])
}

/// Guess a category from free text; first category with a matching keyword wins
pub fn guess_category(text: &str) -> Category {
    let lowered = text.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lowered.contains(w)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_follows_declaration_order() {
        let order: Vec<Category> = CATEGORY_KEYWORDS.iter().map(|(c, _)| *c).collect();
        assert_eq!(order, Category::all());
    }

    #[test]
    fn test_keywords_are_lowercase() {
        for (_, words) in CATEGORY_KEYWORDS {
            for word in *words {
                assert_eq!(*word, word.to_lowercase(), "keyword {} must be lowercase", word);
            }
        }
    }

    #[test]
    fn test_every_keyword_resolves_to_its_own_category() {
        for (category, words) in CATEGORY_KEYWORDS {
            for word in *words {
                assert_eq!(guess_category(word), *category, "keyword {}", word);
            }
        }
    }

    #[test]
    fn test_guess_is_case_insensitive() {
        assert_eq!(guess_category("NETFLIX premium"), Category::Subscription);
        assert_eq!(guess_category("Uber home"), Category::Transport);
    }

    #[test]
    fn test_first_category_wins_ties() {
        // "買午餐" hits SHOPPING ("買") and FOOD ("午餐"); FOOD is declared first
        assert_eq!(guess_category("買午餐"), Category::Food);
    }

    #[test]
    fn test_no_match_is_other() {
        assert_eq!(guess_category(""), Category::Other);
        assert_eq!(guess_category("misc thing"), Category::Other);
        assert!(keywords_for(Category::Other).is_empty());
    }
}
