use serde::Deserialize;

/// Page language. Arabic is the default; `?lang=en` switches to English.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Lang {
    #[default]
    Ar,
    En,
}

#[derive(Debug, Default, Deserialize)]
pub struct LangQuery {
    pub lang: Option<String>,
}

impl Lang {
    pub fn from_query(raw: Option<&str>) -> Self {
        match raw.map(|l| l.trim().to_ascii_lowercase()).as_deref() {
            Some("en") | Some("english") => Lang::En,
            _ => Lang::Ar,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Lang::Ar => "ar",
            Lang::En => "en",
        }
    }

    pub fn dir(self) -> &'static str {
        match self {
            Lang::Ar => "rtl",
            Lang::En => "ltr",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Lang::Ar => Lang::En,
            Lang::En => Lang::Ar,
        }
    }

    pub fn strings(self) -> &'static Strings {
        match self {
            Lang::Ar => &AR,
            Lang::En => &EN,
        }
    }

    /// Link to `path` in this language.
    pub fn href(self, path: &str) -> String {
        match self {
            Lang::Ar => path.to_string(),
            Lang::En => format!("{path}?lang=en"),
        }
    }
}

pub struct Strings {
    pub nav_home: &'static str,
    pub nav_blog: &'static str,
    pub nav_services: &'static str,
    pub switch_lang: &'static str,
    pub hero_title: &'static str,
    pub hero_body: &'static str,
    pub latest_posts: &'static str,
    pub our_services: &'static str,
    pub read_more: &'static str,
    pub published_on: &'static str,
    pub no_posts: &'static str,
    pub no_services: &'static str,
    pub back_to_blog: &'static str,
    pub not_found_title: &'static str,
    pub not_found_body: &'static str,
    pub rights: &'static str,
}

static AR: Strings = Strings {
    nav_home: "الرئيسية",
    nav_blog: "المدونة",
    nav_services: "خدماتنا",
    switch_lang: "English",
    hero_title: "نحمي أعمالك في العالم الرقمي",
    hero_body: "اختبار الاختراق، تقييم الثغرات، والاستجابة للحوادث بخبرة محلية ومعايير عالمية.",
    latest_posts: "أحدث المقالات",
    our_services: "خدماتنا",
    read_more: "اقرأ المزيد",
    published_on: "نُشر في",
    no_posts: "لا توجد مقالات منشورة بعد.",
    no_services: "لا توجد خدمات متاحة حالياً.",
    back_to_blog: "العودة إلى المدونة",
    not_found_title: "الصفحة غير موجودة",
    not_found_body: "عذراً، لم نتمكن من العثور على الصفحة المطلوبة.",
    rights: "جميع الحقوق محفوظة",
};

static EN: Strings = Strings {
    nav_home: "Home",
    nav_blog: "Blog",
    nav_services: "Services",
    switch_lang: "العربية",
    hero_title: "Protecting your business in the digital world",
    hero_body: "Penetration testing, vulnerability assessment and incident response with local expertise and global standards.",
    latest_posts: "Latest articles",
    our_services: "Our services",
    read_more: "Read more",
    published_on: "Published on",
    no_posts: "No articles published yet.",
    no_services: "No services available right now.",
    back_to_blog: "Back to the blog",
    not_found_title: "Page not found",
    not_found_body: "Sorry, we could not find the page you were looking for.",
    rights: "All rights reserved",
};
