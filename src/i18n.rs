use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Display language. Arabic is the only localized variant, everything else
/// falls back to the default (English) fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Ar,
    #[default]
    En,
}

impl Lang {
    /// Map a language code to a `Lang`; unknown codes resolve to the default.
    pub fn from_code(code: &str) -> Self {
        if code.trim().eq_ignore_ascii_case("ar") {
            Lang::Ar
        } else {
            Lang::En
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Lang::Ar => "ar",
            Lang::En => "en",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Pick the language-appropriate value of a bilingual field.
///
/// Returns `localized` when `lang` is Arabic and the localized value is
/// present and non-empty, otherwise `base`. Either side may be absent.
pub fn resolve<'a>(base: Option<&'a str>, localized: Option<&'a str>, lang: Lang) -> Option<&'a str> {
    match (lang, localized) {
        (Lang::Ar, Some(value)) if !value.is_empty() => Some(value),
        _ => base,
    }
}

/// Same as [`resolve`], reading both fields from a raw JSON object.
///
/// Numbers are rendered as strings; any other value type counts as absent.
pub fn resolve_field(entity: &Value, base_key: &str, ar_key: &str, lang: Lang) -> Option<String> {
    let base = scalar_string(entity.get(base_key));
    let localized = scalar_string(entity.get(ar_key));
    resolve(base.as_deref(), localized.as_deref(), lang).map(str::to_string)
}

fn scalar_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A bilingual text pair held on domain objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub base: Option<String>,
    pub ar: Option<String>,
}

impl LocalizedText {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: Some(base.into()),
            ar: None,
        }
    }

    pub fn with_ar(mut self, ar: impl Into<String>) -> Self {
        self.ar = Some(ar.into());
        self
    }

    pub fn get(&self, lang: Lang) -> Option<&str> {
        resolve(self.base.as_deref(), self.ar.as_deref(), lang)
    }

    /// Resolved value, or an empty string when neither variant exists.
    pub fn get_or_empty(&self, lang: Lang) -> &str {
        self.get(lang).unwrap_or("")
    }

    /// Every non-empty variant, used for language-independent search.
    pub fn variants(&self) -> impl Iterator<Item = &str> {
        self.base
            .as_deref()
            .into_iter()
            .chain(self.ar.as_deref())
            .filter(|v| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.variants().next().is_none()
    }
}

/// Messages the client surfaces on its own (errors and placeholders).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    LoadFailed,
    ConnectionFailed,
    TookTooLong,
    SomethingWentWrong,
    Untitled,
    NoResults,
    ShowMore,
    ShowLess,
    EstimatedNutrition,
}

pub fn message(key: Message, lang: Lang) -> &'static str {
    match (key, lang) {
        (Message::LoadFailed, Lang::En) => "Could not load content. Please try again.",
        (Message::LoadFailed, Lang::Ar) => "تعذر تحميل المحتوى. يرجى المحاولة مرة أخرى.",
        (Message::ConnectionFailed, Lang::En) => {
            "Could not reach the server. Check your connection and try again."
        }
        (Message::ConnectionFailed, Lang::Ar) => {
            "تعذر الاتصال بالخادم. تحقق من اتصالك وحاول مرة أخرى."
        }
        (Message::TookTooLong, Lang::En) => "The request took too long, please try again.",
        (Message::TookTooLong, Lang::Ar) => "استغرق الطلب وقتاً طويلاً، يرجى المحاولة مرة أخرى.",
        (Message::SomethingWentWrong, Lang::En) => "Something went wrong.",
        (Message::SomethingWentWrong, Lang::Ar) => "حدث خطأ ما.",
        (Message::Untitled, Lang::En) => "Untitled",
        (Message::Untitled, Lang::Ar) => "بدون عنوان",
        (Message::NoResults, Lang::En) => "No results found.",
        (Message::NoResults, Lang::Ar) => "لا توجد نتائج.",
        (Message::ShowMore, Lang::En) => "Show more",
        (Message::ShowMore, Lang::Ar) => "عرض المزيد",
        (Message::ShowLess, Lang::En) => "Show less",
        (Message::ShowLess, Lang::Ar) => "عرض أقل",
        (Message::EstimatedNutrition, Lang::En) => "Estimated values",
        (Message::EstimatedNutrition, Lang::Ar) => "قيم تقديرية",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_prefers_arabic_when_present() {
        assert_eq!(resolve(Some("Pasta"), Some("باستا"), Lang::Ar), Some("باستا"));
        assert_eq!(resolve(Some("Pasta"), Some(""), Lang::Ar), Some("Pasta"));
        assert_eq!(resolve(Some("Pasta"), None, Lang::Ar), Some("Pasta"));
    }

    #[test]
    fn test_resolve_english_always_uses_base() {
        assert_eq!(resolve(Some("Pasta"), Some("باستا"), Lang::En), Some("Pasta"));
        assert_eq!(resolve(None, Some("باستا"), Lang::En), None);
    }

    #[test]
    fn test_resolve_field_reads_json() {
        let entity = json!({"title": "Soup", "titleAr": "شوربة", "servings": 4});
        assert_eq!(
            resolve_field(&entity, "title", "titleAr", Lang::Ar).as_deref(),
            Some("شوربة")
        );
        assert_eq!(
            resolve_field(&entity, "title", "titleAr", Lang::En).as_deref(),
            Some("Soup")
        );
        assert_eq!(
            resolve_field(&entity, "servings", "servingsAr", Lang::Ar).as_deref(),
            Some("4")
        );
        assert_eq!(resolve_field(&entity, "missing", "missingAr", Lang::Ar), None);
    }

    #[test]
    fn test_unknown_language_code_is_default() {
        assert_eq!(Lang::from_code("fr"), Lang::En);
        assert_eq!(Lang::from_code("AR"), Lang::Ar);
        assert_eq!(Lang::from_code(""), Lang::En);
    }

    #[test]
    fn test_localized_text_variants() {
        let text = LocalizedText::new("Cake").with_ar("كعكة");
        assert_eq!(text.variants().collect::<Vec<_>>(), vec!["Cake", "كعكة"]);
        assert!(LocalizedText::default().is_empty());
        assert_eq!(LocalizedText::default().get_or_empty(Lang::Ar), "");
    }
}
