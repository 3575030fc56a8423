use std::collections::HashMap;
use std::fmt;

/// Coarse content bucket a URL falls into, derived from path keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageType {
    Product,
    Faq,
    Legal,
    Contact,
    Blog,
    Other,
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PageType::Product => "Product",
            PageType::Faq => "FAQ",
            PageType::Legal => "Legal",
            PageType::Contact => "Contact",
            PageType::Blog => "Blog",
            PageType::Other => "Other",
        };
        f.write_str(s)
    }
}

impl PageType {
    pub fn parse(s: &str) -> PageType {
        match s {
            "Product" => PageType::Product,
            "FAQ" => PageType::Faq,
            "Legal" => PageType::Legal,
            "Contact" => PageType::Contact,
            "Blog" => PageType::Blog,
            _ => PageType::Other,
        }
    }

    pub const ALL: [PageType; 6] = [
        PageType::Product,
        PageType::Faq,
        PageType::Legal,
        PageType::Contact,
        PageType::Blog,
        PageType::Other,
    ];
}

// NL/FR/EN keyword sets, tested in this order; first match wins.
const PRODUCT_TERMS: &[&str] = &[
    "product", "producten", "produits", "sparen", "saving", "epargne",
    "lenen", "loan", "pret", "credit", "rekening", "account", "compte",
    "beleggen", "investment", "investir", "hypotheek", "mortgage",
    "verzekering", "insurance", "assurance", "kaart", "card", "carte",
    "bankieren", "banking", "banque", "easy-banking", "business-banking",
];

const FAQ_TERMS: &[&str] = &[
    "faq", "support", "help", "hulp", "ondersteuning", "aide",
    "questions", "klantenservice", "clientservice", "assistance",
];

const LEGAL_TERMS: &[&str] = &[
    "legal", "juridisch", "juridique", "voorwaarden", "terms",
    "conditions", "privacy", "beleid", "policy", "cookie", "gdpr",
];

const CONTACT_TERMS: &[&str] = &[
    "contact", "locatie", "location", "agences", "branches",
    "kantoren", "afspraak", "appointment",
];

const BLOG_TERMS: &[&str] = &["blog", "nieuws", "news", "actualites"];

/// Classify a URL by substring matching on its lowercased form.
/// Pure: the same URL always yields the same bucket.
pub fn classify(url: &str) -> PageType {
    let url = url.to_lowercase();
    let hit = |terms: &[&str]| terms.iter().any(|t| url.contains(t));

    if hit(PRODUCT_TERMS) {
        PageType::Product
    } else if hit(FAQ_TERMS) {
        PageType::Faq
    } else if hit(LEGAL_TERMS) {
        PageType::Legal
    } else if hit(CONTACT_TERMS) {
        PageType::Contact
    } else if hit(BLOG_TERMS) {
        PageType::Blog
    } else {
        PageType::Other
    }
}

const CACHE_CAP: usize = 1000;

/// Memo cache over [`classify`]. Purely an optimization: once full it stops
/// inserting and falls through to the (cheap) classifier.
#[derive(Default)]
pub struct ClassifierCache {
    map: HashMap<String, PageType>,
}

impl ClassifierCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(&mut self, url: &str) -> PageType {
        if let Some(&pt) = self.map.get(url) {
            return pt;
        }
        let pt = classify(url);
        if self.map.len() < CACHE_CAP {
            self.map.insert(url.to_string(), pt);
        }
        pt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_dutch() {
        assert_eq!(classify("https://bank.be/nl/sparen/rekening"), PageType::Product);
    }

    #[test]
    fn contact_french() {
        assert_eq!(classify("https://bank.be/fr/contact"), PageType::Contact);
    }

    #[test]
    fn fallback_other() {
        assert_eq!(classify("https://bank.be/about"), PageType::Other);
    }

    #[test]
    fn first_match_wins() {
        // Contains both a Product term ("credit") and a FAQ term ("faq");
        // Product is tested first.
        assert_eq!(classify("https://bank.be/credit/faq"), PageType::Product);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(classify("https://bank.be/FR/CONTACT"), PageType::Contact);
    }

    #[test]
    fn deterministic() {
        let url = "https://bank.be/nl/hypotheek/simulatie";
        assert_eq!(classify(url), classify(url));
    }

    #[test]
    fn cache_agrees_with_classify() {
        let mut cache = ClassifierCache::new();
        for url in ["https://bank.be/faq", "https://bank.be/blog/post", "https://bank.be/x"] {
            assert_eq!(cache.classify(url), classify(url));
            // Second call hits the memo.
            assert_eq!(cache.classify(url), classify(url));
        }
    }

    #[test]
    fn display_parse_round_trip() {
        for pt in PageType::ALL {
            assert_eq!(PageType::parse(&pt.to_string()), pt);
        }
    }
}
