//! Regex heuristics for estimating English syllable counts.
//!
//! Single-syllable affixes are peeled off and counted first, the remainder
//! is split on consonant runs to find vowel nuclei, then known spelling
//! patterns adjust the estimate up or down.

use regex::Regex;
use std::sync::OnceLock;

const IRREGULAR_WORDS: [(&str, usize); 3] = [("simile", 3), ("forever", 3), ("shoreline", 2)];

const AFFIXES: [&str; 7] = ["^un", "^fore", "ly$", "less$", "ful$", "ers?$", "ings?$"];

/// Patterns where the vowel-group split over-counts.
const SUBTRACTIVE: &[&str] = &[
    "cial", "tia", "cius", "cious", "uiet", "gious", "geous", "priest", "giu", "dge", "ion",
    "iou", "sia$", ".che$", ".ched$", ".abe$", ".ace$", ".ade$", ".age$", ".aged$", ".ake$",
    ".ale$", ".aled$", ".ales$", ".ane$", ".ame$", ".ape$", ".are$", ".ase$", ".ashed$",
    ".asque$", ".ate$", ".ave$", ".azed$", ".awe$", ".aze$", ".aped$", ".athe$", ".athes$",
    ".ece$", ".ese$", ".esque$", ".esques$", ".eze$", ".gue$", ".ibe$", ".ice$", ".ide$",
    ".ife$", ".ike$", ".ile$", ".ime$", ".ine$", ".ipe$", ".iped$", ".ire$", ".ise$",
    ".ished$", ".ite$", ".ive$", ".ize$", ".obe$", ".ode$", ".oke$", ".ole$", ".ome$",
    ".one$", ".ope$", ".oque$", ".ore$", ".ose$", ".osque$", ".osques$", ".ote$", ".ove$",
    ".pped$", ".sse$", ".ssed$", ".ste$", ".ube$", ".uce$", ".ude$", ".uge$", ".uke$",
    ".ule$", ".ules$", ".uled$", ".ume$", ".une$", ".upe$", ".ure$", ".use$", ".ushed$",
    ".ute$", ".ved$", ".we$", ".wes$", ".wed$", ".yse$", ".yze$", ".rse$", ".red$", ".rce$",
    ".rde$", ".ily$", ".ely$", ".des$", ".gged$", ".kes$", ".ced$", ".ked$", ".med$", ".mes$",
    ".ned$", ".[sz]ed$", ".nce$", ".rles$", ".nes$", ".pes$", ".tes$", ".res$", ".ves$",
    "ere$",
];

/// Patterns where the vowel-group split under-counts.
const ADDITIVE: &[&str] = &[
    "ia", "riet", "dien", "ien", "iet", "iu", "iest", "io", "ii", "ily", ".oala$", ".iara$",
    ".ying$", ".earest", ".arer", ".aress", ".eate$", ".eation$", "[aeiouym]bl$", "[aeiou]{3}",
    "^mc", "ism", "asm", "[^l]lien", "^coa[dglx].", "[^gq]ua[^auieo]", "dnt$",
];

struct SyllablePatterns {
    affixes: Vec<Regex>,
    subtractive: Vec<Regex>,
    additive: Vec<Regex>,
    consonant_run: Regex,
}

fn patterns() -> &'static SyllablePatterns {
    static PATTERNS: OnceLock<SyllablePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |sources: &[&str]| -> Vec<Regex> {
            sources
                .iter()
                .map(|p| Regex::new(p).expect("valid regex"))
                .collect()
        };
        SyllablePatterns {
            affixes: compile(&AFFIXES),
            subtractive: compile(SUBTRACTIVE),
            additive: compile(ADDITIVE),
            consonant_run: Regex::new("[^aeiouy]+").expect("valid regex"),
        }
    })
}

/// Estimated syllables in one token. Never returns 0.
pub fn count_syllables(token: &str) -> usize {
    let mut word: String = token
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect();

    if let Some((_, n)) = IRREGULAR_WORDS.iter().find(|(w, _)| *w == word) {
        return *n;
    }

    let patterns = patterns();
    let mut affix_count = 0i64;
    for affix in &patterns.affixes {
        if affix.is_match(&word) {
            word = affix.replace(&word, "").into_owned();
            affix_count += 1;
        }
    }

    let nuclei = patterns
        .consonant_run
        .split(&word)
        .filter(|part| !part.is_empty())
        .count() as i64;

    let mut count = nuclei + affix_count;
    count -= patterns.subtractive.iter().filter(|p| p.is_match(&word)).count() as i64;
    count += patterns.additive.iter().filter(|p| p.is_match(&word)).count() as i64;
    if ends_with_doubled_consonant_l(&word) {
        count += 1;
    }

    if count <= 0 {
        1
    } else {
        count as usize
    }
}

/// "-ttl", "-ddl" and friends: the `l` forms its own syllable.
fn ends_with_doubled_consonant_l(word: &str) -> bool {
    let tail: Vec<char> = word.chars().rev().take(3).collect();
    matches!(tail.as_slice(), ['l', a, b] if a == b && !"aeiouy".contains(*a))
}
