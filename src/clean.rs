use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

/// Inputs shorter than this are unusable and clean to empty.
const MIN_INPUT_LEN: usize = 20;

// Boilerplate removal rules, applied in order over the whole text,
// case-insensitive with `.` matching newlines. Belgian banking sites mix
// NL/FR/EN on a single page, so every family of patterns comes in three
// languages. Later normalization passes assume these already ran.

const NAVIGATION_PATTERNS: &[&str] = &[
    // Skip-to-content links
    r"Skip to .*?Log in",
    r"Retour au .*?Se connecter",
    r"Terug naar de inhoud",
    r"Overslaan en naar de inhoud gaan",
    r"Aller au contenu principal",
    r"Skip to main content",
    // Language switchers
    r"FR\s+NL\s+EN",
    r"Nederlands\s+Français\s+English",
    r"NL\s+FR\s+DE",
    r"\bFR\s+NL\b",
    r"\bFrançais\b\s*\bNederlands\b",
    // Main navigation menus
    r"Home.*?Contact.*?Login",
    r"Accueil.*?Contact.*?Connexion",
    r"Thuis.*?Contact.*?Inloggen",
    r"Menu\s+Sluiten",
    r"Menu\s+Fermer",
    r"Close\s+Menu",
    // Search widgets
    r"Zoeken \(Optioneel\).*?Contact",
    r"Rechercher \(En option\).*?Contact",
    r"Search \(Optional\).*?Contact",
    r"Zoeken.*?Zoek",
    r"Rechercher.*?Recherche",
    r"Search.*?Search",
    // Bank-specific navigation
    r"KBC.*?Inloggen",
    r"KBC.*?Se connecter",
    r"Online Banking.*?KBC",
    r"BNP Paribas Fortis.*?Inloggen",
    r"BNP Paribas Fortis.*?Se connecter",
    r"Word klant.*?Beobank Online",
    r"Devenir client.*?Beobank Online",
    r"Belfius.*?Inloggen",
    r"Belfius.*?Se connecter",
    r"Belfius Direct Net",
    r"ING.*?Inloggen",
    r"ING.*?Se connecter",
    r"Mijn ING.*?Inloggen",
];

const COOKIE_PATTERNS: &[&str] = &[
    r"Accept all cookies.*?Manage cookies",
    r"Accepter tous les cookies.*?Gérer les cookies",
    r"Alle cookies accepteren.*?Cookies beheren",
    r"Deze website gebruikt cookies.*?Alles accepteren",
    r"Ce site utilise des cookies.*?Tout accepter",
    r"This website uses cookies.*?Accept all",
    r"Cookie settings.*?Save preferences",
    r"Paramètres des cookies.*?Sauvegarder",
    r"Cookie-instellingen.*?Voorkeuren opslaan",
    r"Mijn cookies beheren.*?Alles accepteren",
    r"Gérer mes cookies.*?Tout accepter",
    r"Manage my cookies.*?Accept all",
    r"Functionele cookies.*?verbeteren\.",
    r"Les cookies fonctionnels.*?par des tiers\.",
    r"Functional cookies.*?third parties\.",
    r"Analytische cookies.*?voorkeuren zijn\.",
    r"Les cookies de mesure.*?leurs préférences\.",
    r"Analytics cookies.*?their preferences\.",
    r"Marketing cookies.*?te tonen\.",
    r"Les cookies publicitaires.*?pertinentes\.",
    r"Marketing cookies.*?relevant\.",
    r"Privacy policy.*?Terms",
    r"Politique de confidentialité.*?Conditions",
    r"Privacybeleid.*?Voorwaarden",
];

const TECHNICAL_PATTERNS: &[&str] = &[
    r"Voor een betere surfervaring.*?Chrome",
    r"Pour une meilleure expérience.*?Chrome\.",
    r"For a better browsing experience.*?Chrome",
    r"Adblock detection:.*?Sluiten",
    r"Adblock detection:.*?Fermer",
    r"Adblock detection:.*?Close",
    r"You have not yet given permission.*?Load video",
    r"JavaScript is disabled.*?Enable JavaScript",
    r"Loading\.\.\.",
    r"Laden\.\.\.",
    r"Chargement\.\.\.",
];

const FOOTER_PATTERNS: &[&str] = &[
    r"Other articles that might interest you.*",
    r"Autres articles qui pourraient vous intéresser.*",
    r"Andere artikels die u kunnen interesseren.*",
    r"Gerelateerde concepten.*?Lees meer",
    r"Termes liés.*?Lire la suite",
    r"Related terms.*?Read more",
    r"Ontdek de.*?blog.*?Français",
    r"Découvrir le blog.*?Nederlands",
    r"Discover the.*?blog.*?Dutch",
    r"Schrijf u in op onze nieuwsbrief.*?Inschrijven",
    r"Inscrivez-vous à notre newsletter.*?S'inscrire",
    r"Subscribe to our newsletter.*?Subscribe",
    r"Terms and conditions.*?Privacy",
    r"Termes et conditions.*?Confidentialité",
    r"Algemene voorwaarden.*?Privacy",
    r"Disclaimer.*?Copyright",
    r"Avertissement.*?Droits d'auteur",
    r"Vrijwaring.*?Auteursrecht",
    r"©.*?\d{4}.*?(KBC|BNP|Belfius|ING)",
    r"Alle rechten voorbehouden",
    r"Tous droits réservés",
    r"All rights reserved",
];

const BANKING_CTA_PATTERNS: &[&str] = &[
    r"Maak een afspraak!.*?",
    r"Prenez rendez-vous.*?",
    r"Make an appointment.*?",
    r"Boek een gesprek.*?",
    r"Réservez un entretien.*?",
    r"Ontdek ons advies.*?",
    r"Laissez-vous conseiller.*?",
    r"Discover our advice.*?",
    r"Klaar om te beleggen\?.*?Maak een afspraak!",
    r"Prêt\(e\) à investir\?.*?Prenez rendez-vous",
    r"Ready to invest\?.*?Make an appointment",
    r"Ontdek onze.*?producten",
    r"Découvrez nos.*?produits",
    r"Discover our.*?products",
    r"Meer informatie.*?aanvragen",
    r"Plus d'informations.*?demander",
    r"More information.*?request",
];

const SOCIAL_PATTERNS: &[&str] = &[
    r"Share on.*?Facebook",
    r"Partager sur.*?Facebook",
    r"Delen op.*?Facebook",
    r"Tweet.*?Twitter",
    r"Tweeter.*?Twitter",
    r"LinkedIn.*?delen",
    r"LinkedIn.*?partager",
    r"LinkedIn.*?share",
    r"WhatsApp.*?delen",
    r"WhatsApp.*?partager",
    r"WhatsApp.*?share",
    r"E-mail.*?versturen",
    r"E-mail.*?envoyer",
    r"E-mail.*?send",
    r"Print this page",
    r"Imprimez cette page",
    r"Print deze pagina",
    r"Download PDF",
    r"Télécharger PDF",
    r"PDF downloaden",
];

const METADATA_PATTERNS: &[&str] = &[
    r"Home\s*›.*?›",
    r"Accueil\s*›.*?›",
    r"Thuis\s*›.*?›",
    r"Last updated:.*?\d{4}",
    r"Dernière mise à jour:.*?\d{4}",
    r"Laatst bijgewerkt:.*?\d{4}",
    r"Posted on.*?\d{4}",
    r"Publié le.*?\d{4}",
    r"Geplaatst op.*?\d{4}",
    // Until end of line or sentence (the regex crate has no lookahead)
    r"Tags:[^\n.]*",
    r"Étiquettes:[^\n.]*",
    r"Labels:[^\n.]*",
    r"\d+\s+min read",
    r"\d+\s+min de lecture",
    r"\d+\s+min lezen",
];

const READ_MORE_PATTERNS: &[&str] = &[
    r"Lees meer\s*",
    r"Lire la suite\s*",
    r"Read more\s*",
    r"Meer lezen\s*",
    r"En savoir plus\s*",
    r"Learn more\s*",
];

// Investment sidebar teasers; case-sensitive since the `[A-Z]` anchor is
// what keeps these from eating body text.
const SIDEBAR_PATTERNS: &[&str] = &[
    r"Beleggen in \w+\s+[A-Z].*?\.{3}",
    r"Investir dans \w+\s+[A-Z].*?\.{3}",
    r"Investing in \w+\s+[A-Z].*?\.{3}",
];

// Navigation and form words that survive as orphans after the block
// removals above.
const STANDALONE_WORDS: &[&str] = &[
    "Contact", "Zoeken", "Rechercher", "Search",
    "Email adres", "Adresse email", "Email address",
    "Inschrijven", "S'inscrire", "Subscribe",
    "Versturen", "Envoyer", "Send",
    "Annuleren", "Annuler", "Cancel",
    "Bevestigen", "Confirmer", "Confirm",
];

fn build(pattern: &str, case_insensitive: bool) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .dot_matches_new_line(true)
        .build()
        .unwrap_or_else(|e| panic!("bad cleaning rule {pattern:?}: {e}"))
}

static REMOVAL_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let groups: [&[&str]; 8] = [
        NAVIGATION_PATTERNS,
        COOKIE_PATTERNS,
        TECHNICAL_PATTERNS,
        FOOTER_PATTERNS,
        BANKING_CTA_PATTERNS,
        SOCIAL_PATTERNS,
        METADATA_PATTERNS,
        READ_MORE_PATTERNS,
    ];
    let mut rules: Vec<Regex> = groups
        .iter()
        .flat_map(|g| g.iter().map(|p| build(p, true)))
        .collect();
    rules.extend(SIDEBAR_PATTERNS.iter().map(|p| build(p, false)));
    rules.extend(
        STANDALONE_WORDS
            .iter()
            .map(|w| build(&format!(r"\b{}\b", regex::escape(w)), true)),
    );
    rules
});

static DOT_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.]{2,}").unwrap());
static DASH_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-]{3,}").unwrap());
static UNDERSCORE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[_]{3,}").unwrap());
static SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([.,!?;:])").unwrap());
static ADJACENT_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.,!?;:])\s*([.,!?;:])").unwrap());
static EMPTY_PARENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(\s*\)").unwrap());
static EMPTY_BRACKETS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\s*\]").unwrap());
static EMPTY_BRACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\s*\}").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Strip multilingual banking-site boilerplate and normalize the remainder.
/// Applying `clean` to its own output is a no-op.
pub fn clean(raw: &str) -> String {
    if raw.trim().len() < MIN_INPUT_LEN {
        return String::new();
    }

    let mut text = raw.to_string();
    for rule in REMOVAL_RULES.iter() {
        text = rule.replace_all(&text, "").into_owned();
    }

    let text = DOT_RUNS.replace_all(&text, ".");
    let text = DASH_RUNS.replace_all(&text, "");
    let text = UNDERSCORE_RUNS.replace_all(&text, "");
    let text = collapse_word_repeats(&text);
    let text = SPACE_BEFORE_PUNCT.replace_all(&text, "$1");
    let text = ADJACENT_PUNCT.replace_all(&text, "$1 $2");
    let text = EMPTY_PARENS.replace_all(&text, "");
    let text = EMPTY_BRACKETS.replace_all(&text, "");
    let text = EMPTY_BRACES.replace_all(&text, "");
    let text = WHITESPACE.replace_all(&text, " ");

    text.trim().to_string()
}

/// Collapse a word repeated 3+ times in a row down to a single occurrence
/// (menu artifacts render like "Sparen Sparen Sparen").
fn collapse_word_repeats(text: &str) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut out: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let mut j = i + 1;
        while j < tokens.len() && tokens[j] == tokens[i] {
            j += 1;
        }
        // Runs of 3+ collapse to one copy; a double stays a double.
        let keep = if j - i >= 3 { 1 } else { j - i };
        for _ in 0..keep {
            out.push(tokens[i]);
        }
        i = j;
    }
    out.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_input_is_unusable() {
        assert_eq!(clean("too short"), "");
        assert_eq!(clean("   "), "");
    }

    #[test]
    fn strips_cookie_banner() {
        let input = "Deze website gebruikt cookies om uw ervaring te verbeteren. \
                     Alles accepteren Uw spaarrekening opent u online in vijf minuten.";
        let out = clean(input);
        assert!(!out.contains("cookies"));
        assert!(out.contains("spaarrekening"));
    }

    #[test]
    fn strips_language_switcher() {
        let out = clean("FR NL EN Votre épargne mérite un taux avantageux et durable.");
        assert!(!out.contains("FR NL EN"));
        assert!(out.contains("épargne"));
    }

    #[test]
    fn strips_read_more_links() {
        let out = clean("Een zichtrekening openen is gratis. Lees meer Lire la suite Read more");
        assert!(!out.to_lowercase().contains("lees meer"));
        assert!(!out.to_lowercase().contains("read more"));
    }

    #[test]
    fn strips_standalone_form_words() {
        let out = clean("Uw aanvraag werd goed ontvangen door onze diensten. Versturen Annuleren");
        assert!(!out.contains("Versturen"));
        assert!(!out.contains("Annuleren"));
    }

    #[test]
    fn collapses_repeated_punctuation() {
        let out = clean("Wij helpen u graag verder bij elke stap...... van uw aanvraag.");
        assert!(out.contains("stap. van"));
    }

    #[test]
    fn collapses_triple_word_repeats() {
        let out = clean("Sparen Sparen Sparen bij onze bank is een verstandige keuze.");
        assert!(out.starts_with("Sparen bij"));
    }

    #[test]
    fn keeps_double_word_repeats() {
        let out = clean("Dat is heel heel belangrijk voor uw financiële toekomst.");
        assert!(out.contains("heel heel belangrijk"));
    }

    #[test]
    fn fixes_spacing_before_punctuation() {
        let out = clean("Uw lening wordt binnen de week goedgekeurd , zonder extra kosten .");
        assert!(out.contains("goedgekeurd, zonder"));
        assert!(out.ends_with("kosten."));
    }

    #[test]
    fn strips_empty_brackets() {
        let out = clean("Uw persoonlijke adviseur ( ) staat altijd [ ] voor u klaar vandaag.");
        assert!(!out.contains("( )"));
        assert!(!out.contains("[ ]"));
    }

    #[test]
    fn strips_copyright_footer() {
        let out = clean(
            "Een hypotheek op maat van uw gezin en uw budget. © 2024 BNP Alle rechten voorbehouden",
        );
        assert!(out.contains("hypotheek"));
        assert!(!out.contains("2024"));
        assert!(!out.contains("rechten"));
    }

    #[test]
    fn idempotent_on_boilerplate_laden_input() {
        let input = "Skip to main content FR NL EN Deze website gebruikt cookies en wij \
                     vragen u die te aanvaarden. Alles accepteren Uw spaarrekening opent u \
                     online...... in vijf minuten , zonder kosten . Lees meer Download PDF \
                     © 2024 Belfius Alle rechten voorbehouden";
        let once = clean(input);
        let twice = clean(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn idempotent_on_clean_text() {
        let input = "Uw spaarrekening opent u online in vijf minuten, zonder kosten.";
        assert_eq!(clean(input), input);
        assert_eq!(clean(&clean(input)), clean(input));
    }
}
