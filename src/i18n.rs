/// Lookup used wherever user-facing text is produced.
pub trait Translate {
    fn translate<'a>(&'a self, text: &'a str) -> &'a str;
}

/// Passes every string through as-is.
#[derive(Debug, Default, Clone, Copy)]
pub struct Untranslated;

impl Translate for Untranslated {
    fn translate<'a>(&'a self, text: &'a str) -> &'a str {
        text
    }
}

const RUSSIAN_TABLE: &[(&str, &str)] = &[
    ("All Day", "Весь день"),
    ("No Title", "Без названия"),
    (
        "Failed to read calendar data from file. Check if fetcher service is running.",
        "Не удалось прочитать данные календаря из файла. Проверьте работу службы загрузки.",
    ),
    (
        "Failed to read calendar data from file",
        "Не удалось прочитать данные календаря из файла",
    ),
    ("healthy", "исправно"),
];

#[derive(Debug, Default, Clone, Copy)]
pub struct Russian;

impl Translate for Russian {
    fn translate<'a>(&'a self, text: &'a str) -> &'a str {
        RUSSIAN_TABLE
            .iter()
            .find(|(source, _)| *source == text)
            .map(|(_, translated)| *translated)
            .unwrap_or(text)
    }
}
