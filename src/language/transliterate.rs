use crate::language::detect::{detect_language, Language};

const NAME_MAX_CHARS: usize = 40;
const NAME_MAX_WORDS: usize = 6;
const SENTENCE_MARKS: [char; 9] = ['.', '؟', '?', '!', '؛', ';', ':', '،', ','];

/// Short, punctuation-free text is treated as a beneficiary, village or district name.
pub fn looks_like_name_or_place(text: &str) -> bool {
    let s = text.trim();
    if s.is_empty() {
        return false;
    }
    if s.chars().count() > NAME_MAX_CHARS {
        return false;
    }
    if s.chars().any(|c| SENTENCE_MARKS.contains(&c)) {
        return false;
    }
    s.split_whitespace().count() < NAME_MAX_WORDS
}

fn latin_for(c: char) -> Option<&'static str> {
    let latin = match c {
        'ا' | 'آ' | 'أ' => "a",
        'إ' => "e",
        'ء' => "",
        'ب' => "b",
        'پ' => "p",
        'ت' => "t",
        'ث' => "s",
        'ج' => "j",
        'چ' => "ch",
        'ح' => "h",
        'خ' => "kh",
        'د' => "d",
        'ذ' => "z",
        'ر' => "r",
        'ز' => "z",
        'ژ' => "zh",
        'س' => "s",
        'ش' => "sh",
        'ص' => "s",
        'ض' => "z",
        'ط' => "t",
        'ظ' => "z",
        'ع' => "",
        'غ' => "gh",
        'ف' => "f",
        'ق' => "q",
        'ک' => "k",
        'گ' => "g",
        'ل' => "l",
        'م' => "m",
        'ن' => "n",
        'ه' => "h",
        'ۀ' | 'ة' => "a",
        'و' => "w",
        'ؤ' => "o",
        'ی' => "y",
        'ئ' => "e",
        'ى' => "a",
        // Pashto letters
        'ځ' => "dz",
        'څ' => "ts",
        'ښ' => "kh",
        'ڼ' => "n",
        'ږ' => "gh",
        'ډ' => "d",
        'ټ' => "t",
        'ړ' => "r",
        // harakat and tatweel
        '\u{064E}' | '\u{064F}' | '\u{0650}' | '\u{0651}' | '\u{0652}' | '\u{064B}'
        | '\u{064C}' | '\u{064D}' | 'ـ' => "",
        '\u{200C}' => " ",
        _ => return None,
    };
    Some(latin)
}

/// Romanizes Arabic-script text character by character; English input is returned as is.
pub fn transliterate(text: &str) -> String {
    let s = text.trim();
    if s.is_empty() {
        return String::new();
    }
    if detect_language(s) == Language::English {
        return s.to_string();
    }

    let mut roman = String::with_capacity(s.len());
    for c in s.chars() {
        match latin_for(c) {
            Some(latin) => roman.push_str(latin),
            None => roman.push(c),
        }
    }

    roman.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_places() {
        assert!(looks_like_name_or_place("کابل"));
        assert!(looks_like_name_or_place("Mohammad Nabi Khan"));
        assert!(!looks_like_name_or_place(""));
        assert!(!looks_like_name_or_place("آب نیست، مردم مشکل دارند"));
        assert!(!looks_like_name_or_place("one two three four five six"));
        assert!(!looks_like_name_or_place(&"a".repeat(41)));
    }

    #[test]
    fn romanizes_dari_and_pashto() {
        assert_eq!(transliterate("کابل"), "kabl");
        assert_eq!(transliterate("  هرات  "), "hrat");
        assert_eq!(transliterate("ځدران"), "dzdran");
        assert_eq!(transliterate("شاه\u{200C}ولی"), "shah wly");
    }

    #[test]
    fn leaves_english_and_digits_alone() {
        assert_eq!(transliterate("Kandahar"), "Kandahar");
        assert_eq!(transliterate("ولسوالی ۳"), "wlswaly ۳");
        assert_eq!(transliterate(""), "");
    }
}
