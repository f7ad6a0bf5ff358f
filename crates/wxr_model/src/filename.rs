use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const UNTITLED: &str = "untitled";

/// Filesystem-safe slug derived from a title: lower-cased, diacritics
/// stripped, every run of non-alphanumeric characters collapsed to a single
/// hyphen, no leading or trailing hyphen. Falls back to `untitled`.
///
/// The result is not unique; writers append `-1`, `-2`, ... on collision.
pub fn filename_from_title(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for c in title.nfd().filter(|c| !is_combining_mark(*c)) {
        let folded = fold_letter(c);
        if folded.is_some() || c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            match folded {
                Some(ascii) => slug.push_str(ascii),
                None => slug.extend(c.to_lowercase()),
            }
        } else {
            pending_hyphen = true;
        }
    }
    if slug.is_empty() {
        slug.push_str(UNTITLED);
    }
    slug
}

/// Latin letters with no combining mark under NFD, spelled out in ASCII.
fn fold_letter(c: char) -> Option<&'static str> {
    let ascii = match c {
        'æ' | 'Æ' => "ae",
        'œ' | 'Œ' => "oe",
        'ø' | 'Ø' => "o",
        'ß' => "ss",
        'đ' | 'Đ' | 'ð' | 'Ð' => "d",
        'ł' | 'Ł' => "l",
        'þ' | 'Þ' => "th",
        'ı' => "i",
        _ => return None,
    };
    Some(ascii)
}

/// Category and tag names are compared in this form everywhere: lower-cased
/// with spaces replaced by hyphens.
pub fn normalize_term(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_runs_collapse_to_one_hyphen() {
        assert_eq!(filename_from_title("Hello,   World!!"), "hello-world");
        assert_eq!(filename_from_title("--Leading and trailing--"), "leading-and-trailing");
    }

    #[test]
    fn diacritics_and_ligatures_fold_to_ascii() {
        let title = "Iñtërnâtiônàlizætiøn Test!";
        assert_eq!(filename_from_title(title), "internationalizaetion-test");
        assert_eq!(filename_from_title(title), filename_from_title(title));
        assert_eq!(filename_from_title("Straße in Łódź"), "strasse-in-lodz");
    }

    #[test]
    fn empty_titles_fall_back() {
        assert_eq!(filename_from_title(""), "untitled");
        assert_eq!(filename_from_title("?!"), "untitled");
    }

    #[test]
    fn terms_are_lowercased_and_hyphenated() {
        assert_eq!(normalize_term("Open Source"), "open-source");
        assert_eq!(normalize_term("rust"), "rust");
    }
}
