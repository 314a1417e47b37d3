pub mod detect;
pub mod protect;
pub mod transliterate;

pub use detect::{
    columns_with_dari_pashto, contains_perso_arabic, detect_language, is_dari_pashto_text,
    needs_attention, Language, DEFAULT_SCAN_LIMIT,
};
pub use protect::{protect_phrases, ProtectedText};
pub use transliterate::{looks_like_name_or_place, transliterate};
