//! Localized UI strings for the nine languages the directory ships.
//! Content itself is not translated; only the surrounding chrome is.

pub struct UiStrings {
    pub search_placeholder: &'static str,
    pub ad_free: &'static str,
    pub privacy: &'static str,
    pub contact: &'static str,
}

/// Language selector options, in display order.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Español"),
    ("fr", "Français"),
    ("de", "Deutsch"),
    ("pt", "Português"),
    ("ar", "العربية"),
    ("hi", "हिन्दी"),
    ("zh", "中文"),
    ("ja", "日本語"),
];

const EN: UiStrings = UiStrings {
    search_placeholder: "Search links…",
    ad_free: "Ad-free",
    privacy: "Privacy",
    contact: "Contact",
};

const ES: UiStrings = UiStrings {
    search_placeholder: "Buscar enlaces…",
    ad_free: "Sin anuncios",
    privacy: "Privacidad",
    contact: "Contacto",
};

const FR: UiStrings = UiStrings {
    search_placeholder: "Rechercher des liens…",
    ad_free: "Sans pub",
    privacy: "Confidentialité",
    contact: "Contact",
};

const DE: UiStrings = UiStrings {
    search_placeholder: "Links suchen…",
    ad_free: "Werbefrei",
    privacy: "Datenschutz",
    contact: "Kontakt",
};

const PT: UiStrings = UiStrings {
    search_placeholder: "Pesquisar links…",
    ad_free: "Sem anúncios",
    privacy: "Privacidade",
    contact: "Contato",
};

const AR: UiStrings = UiStrings {
    search_placeholder: "ابحث عن الروابط…",
    ad_free: "بدون إعلانات",
    privacy: "الخصوصية",
    contact: "اتصال",
};

const HI: UiStrings = UiStrings {
    search_placeholder: "लिंक खोजें…",
    ad_free: "विज्ञापन-रहित",
    privacy: "गोपनीयता",
    contact: "संपर्क",
};

const ZH: UiStrings = UiStrings {
    search_placeholder: "搜索链接…",
    ad_free: "无广告",
    privacy: "隐私",
    contact: "联系",
};

const JA: UiStrings = UiStrings {
    search_placeholder: "リンクを検索…",
    ad_free: "広告なし",
    privacy: "プライバシー",
    contact: "連絡先",
};

/// Resolves a lowercase language code to its string set; unknown codes fall
/// back to English.
pub fn for_language(lang: &str) -> &'static UiStrings {
    match lang {
        "es" => &ES,
        "fr" => &FR,
        "de" => &DE,
        "pt" => &PT,
        "ar" => &AR,
        "hi" => &HI,
        "zh" => &ZH,
        "ja" => &JA,
        _ => &EN,
    }
}
