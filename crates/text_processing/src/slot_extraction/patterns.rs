//! Static rule tables for eligibility slot extraction
//!
//! Every table is an ordered list of `(pattern, value)` pairs evaluated against
//! lowercased text. Order matters: the first non-negated match wins, so more
//! specific rules sit above broader ones (SC/ST before SC, loan before
//! business support, higher education before school).

use once_cell::sync::Lazy;
use regex::Regex;

/// Canonical state and union territory names, matched as whole words
const STATES: &[(&str, &str)] = &[
    ("andhra pradesh", "Andhra Pradesh"),
    ("arunachal pradesh", "Arunachal Pradesh"),
    ("assam", "Assam"),
    ("bihar", "Bihar"),
    ("chhattisgarh", "Chhattisgarh"),
    ("goa", "Goa"),
    ("gujarat", "Gujarat"),
    ("haryana", "Haryana"),
    ("himachal pradesh", "Himachal Pradesh"),
    ("jharkhand", "Jharkhand"),
    ("karnataka", "Karnataka"),
    ("kerala", "Kerala"),
    ("madhya pradesh", "Madhya Pradesh"),
    ("maharashtra", "Maharashtra"),
    ("manipur", "Manipur"),
    ("meghalaya", "Meghalaya"),
    ("mizoram", "Mizoram"),
    ("nagaland", "Nagaland"),
    ("odisha", "Odisha"),
    ("punjab", "Punjab"),
    ("rajasthan", "Rajasthan"),
    ("sikkim", "Sikkim"),
    ("tamil nadu", "Tamil Nadu"),
    ("telangana", "Telangana"),
    ("tripura", "Tripura"),
    ("uttar pradesh", "Uttar Pradesh"),
    ("uttarakhand", "Uttarakhand"),
    ("west bengal", "West Bengal"),
    ("delhi", "Delhi"),
    ("jammu and kashmir", "Jammu and Kashmir"),
    ("ladakh", "Ladakh"),
    ("chandigarh", "Chandigarh"),
    ("puducherry", "Puducherry"),
    ("andaman and nicobar", "Andaman and Nicobar"),
    ("lakshadweep", "Lakshadweep"),
    ("dadra and nagar haveli", "Dadra and Nagar Haveli and Daman and Diu"),
];

/// Legacy names, common misspellings and major cities
const STATE_ALIASES: &[(&str, &str)] = &[
    ("orissa", "Odisha"),
    ("pondicherry", "Puducherry"),
    ("uttaranchal", "Uttarakhand"),
    ("chattisgarh", "Chhattisgarh"),
    ("j&k", "Jammu and Kashmir"),
    ("kashmir", "Jammu and Kashmir"),
    ("bangalore", "Karnataka"),
    ("bengaluru", "Karnataka"),
    ("mysore", "Karnataka"),
    ("mysuru", "Karnataka"),
    ("mumbai", "Maharashtra"),
    ("pune", "Maharashtra"),
    ("nagpur", "Maharashtra"),
    ("chennai", "Tamil Nadu"),
    ("madras", "Tamil Nadu"),
    ("coimbatore", "Tamil Nadu"),
    ("kolkata", "West Bengal"),
    ("calcutta", "West Bengal"),
    ("hyderabad", "Telangana"),
    ("lucknow", "Uttar Pradesh"),
    ("kanpur", "Uttar Pradesh"),
    ("varanasi", "Uttar Pradesh"),
    ("patna", "Bihar"),
    ("jaipur", "Rajasthan"),
    ("ahmedabad", "Gujarat"),
    ("surat", "Gujarat"),
    ("bhopal", "Madhya Pradesh"),
    ("indore", "Madhya Pradesh"),
    ("kochi", "Kerala"),
    ("thiruvananthapuram", "Kerala"),
    ("trivandrum", "Kerala"),
    ("bhubaneswar", "Odisha"),
    ("ranchi", "Jharkhand"),
    ("raipur", "Chhattisgarh"),
    ("guwahati", "Assam"),
    ("dehradun", "Uttarakhand"),
    ("shimla", "Himachal Pradesh"),
    ("visakhapatnam", "Andhra Pradesh"),
    ("vijayawada", "Andhra Pradesh"),
    ("ludhiana", "Punjab"),
    ("amritsar", "Punjab"),
];

fn word_rule(phrase: &str, value: &'static str) -> (Regex, &'static str) {
    let pattern = format!(r"\b{}\b", regex::escape(phrase).replace(' ', r"\s+"));
    (Regex::new(&pattern).unwrap(), value)
}

fn rules(table: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    table
        .iter()
        .map(|(pattern, value)| (Regex::new(pattern).unwrap(), *value))
        .collect()
}

/// States first, then aliases
pub(super) static STATE_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    STATES
        .iter()
        .chain(STATE_ALIASES.iter())
        .map(|(phrase, value)| word_rule(phrase, value))
        .collect()
});

pub(super) static OCCUPATION_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| rules(&[
    (r"\bfarmers?\b|\bkisan\b|\bfarming\b|\bagriculture\b|\bcrops?\b|\bkhet\b|\bkheti\b", "farmer"),
    (r"\bstudents?\b|\bstudying\b|\bcollege\b|\buniversity\b|\bengineering\b|\bbtech\b|\bmba\b|\bschool\b|\bscholarships?\b|\bclass\s*\d|\bmatric\b|\bdegree\b|\bpost.?graduate\b|\bgraduate\b|\bdiploma\b|\bvidyarthi\b", "student"),
    (r"\bsenior\s*citizens?\b|\bretired\b|\bold\s*age\b|\bpensioners?\b|\belderly\b|\bvridh\w*\b|\bpension\b", "senior citizen"),
    (r"\bbusiness\b|\bentrepreneurs?\b|\bself.?employed\b|\bshop\b|\bstartup\b|\bmsme\b|\btrader\b|\budyami\b|\bvyapari\b", "entrepreneur"),
    (r"\bworkers?\b|\blabou?rers?\b|\blabou?r\b|\bemployee\b|\bdaily\s*wage\b|\bsalaried\b|\bjob\b|\bmazdoor\b", "worker"),
    (r"\bfisherm[ae]n\b|\bfishing\b|\bfisherfolk\b|\bmachhuara\b", "fisherman"),
    (r"\bartisans?\b|\bhandicrafts?\b|\bweavers?\b|\bpotters?\b|\bcarpenters?\b|\bvishwakarma\b", "artisan"),
]));

/// Both-genders phrasing is checked first and maps to a sentinel
pub(super) static GENDER_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| rules(&[
    (r"\bmale\s*(?:and|or|/|&)\s*female\b|\bfemale\s*(?:and|or|/|&)\s*male\b|\bany\s+gender\b", "any"),
    (r"\bfemale\b|\bwoman\b|\bwomen\b|\bgirls?\b|\bmahila\b|\bmother\b|\bpregnant\b|\bwidow\b|\blady\b|\bdaughter\b|\bsister\b|\bladki\b", "female"),
    (r"\bmale\b|\bman\b|\bboy\b|\bladka\b|\bpurush\b", "male"),
]));

pub(super) static CASTE_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| rules(&[
    (r"\bsc\s*/\s*st\b|\bsc\s+st\b|\bsc\s*&\s*st\b|\bsc\s+and\s+st\b", "SC/ST"),
    (r"\bsc\b|\bschedul\w+\s*castes?\b|\bdalit\b", "SC"),
    (r"\bst\b|\bschedul\w+\s*tribes?\b|\btribal\b|\badivasi\b", "ST"),
    (r"\bobc\b|\bother\s*backward\b", "OBC"),
    (r"\bgeneral\s*category\b|\bunreserved\b", "General"),
    (r"\bminority\b|\bmuslim\b|\bchristian\b|\bsikh\b|\bbuddhist\b|\bjain\b|\bparsi\b", "Minority"),
]));

/// Requested kind of help, English plus common Hindi/Hinglish words
pub(super) static HELP_TYPE_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| rules(&[
    (r"\bscholarships?\b|\bstipend\b|\bfellowships?\b|\bchhatravritti\b|\bchatravriti\b|\bvazifa\b|\bwazifa\b|\btuition\s+fees?\b|\bfee\s+reimbursement\b|\beducation(?:al)?\s+(?:help|support|assistance|aid)\b|\bpadhai\b", "scholarship"),
    (r"\bloans?\b|\bcredit\b|\bkarz\b|\bkarza\b|\bkarja\b|\budhaa?r\b|\bmudra\b|\bborrow\w*\b", "loan"),
    (r"\bpensions?\b|\bold\s+age\s+(?:support|allowance)\b|\bwidow\s+allowance\b|\bvridh\w*\s+pension\b|\bmonthly\s+allowance\b", "pension"),
    (r"\bhealth\b|\bmedical\b|\bhospital\w*\b|\btreatment\b|\bayushman\b|\bilaa?j\b|\bsurgery\b|\bmedicines?\b|\bswasthya\b", "health_insurance"),
    (r"\bhousing\b|\bhouse\b|\bhome\s+(?:construction|repair)\b|\bawaa?s\b|\bghar\b|\bmakaan\b|\bshelter\b|\bpucca\b", "housing"),
    (r"\bmarriage\b|\bwedding\b|\bshaa?di\b|\bvivah\b|\bkanyadan\b", "marriage"),
    (r"\bskills?\b|\btraining\b|\bvocational\b|\bapprentice\w*\b|\bkaushal\b|\bcoaching\b|\binternships?\b", "skill_training"),
    (r"\bjobs?\b|\bemployment\b|\bnaukri\b|\brozgar\b|\brojgar\b|\bunemploy\w*\b|\bplacement\b", "employment"),
    (r"\bstart(?:ing)?\s+(?:a\s+|an\s+|my\s+|own\s+|my\s+own\s+)?(?:business|venture|enterprise|shop)\b|\bstartups?\b|\bbusiness\b|\bentrepreneur\w*\b|\budyam\w*\b|\bvyapar\w*\b|\bmsme\b", "business_support"),
    (r"\bcrops?\b|\bseeds?\b|\bfertili[sz]ers?\b|\birrigation\b|\btractors?\b|\bfasal\b|\blivestock\b|\bcattle\b|\bdairy\b|\bagricultur\w*\s+(?:support|subsidy|equipment|inputs?)\b|\bfarm\s+(?:equipment|machinery|inputs?)\b", "agriculture_support"),
    (r"\bfinancial\s+(?:help|assistance|aid|support)\b|\bmoney\b|\bcash\b|\bpaisa\b|\bpaise\b|\bfunds?\b|\bmonetary\b|\bsubsid(?:y|ies)\b|\bgrants?\b|\barthik\s+sahayata\b", "financial_assistance"),
]));

/// `higher` is checked before `school` so "class 12" never reads as school
pub(super) static EDUCATION_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| rules(&[
    (r"\bengineering\b|\bb\.?tech\b|\bm\.?tech\b|\bmba\b|\bbba\b|\bm\.?sc\b|\bb\.?sc\b|\bm\.?com\b|\bb\.?com\b|\bph\.?d\b|\bpost.?graduate\b|\bunder.?graduate\b|\bgraduate\b|\bdiploma\b|\bcollege\b|\buniversity\b|\bdegree\b|\bprofessional\s+course\b|\bmedical\s+student\b|\bmbbs\b|\bllb\b|\bnursing\b|\bpolytechnic\b|\biti\b|\bpost.?matric\b|\bclass\s*1[12](?:th)?\b|\b1[12]th\b|\bhigher\s+secondary\b|\bhigher\s+education\b", "higher"),
    (r"\bpre.?matric\b|\bclass\s*(?:[1-9]|10)(?:st|nd|rd|th)?\b|\b(?:[4-9]|10)th\s+(?:class|standard|std)\b|\bprimary\s+school\b|\bmiddle\s+school\b|\bhigh\s+school\b", "school"),
]));

pub(super) static DISABILITY_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| rules(&[
    (r"\bdisabled\b|\bdisabilit(?:y|ies)\b|\bdivyang\w*\b|\bhandicapp?ed\b|\bpwd\b|\bdifferently[- ]abled\b|\bviklang\b|\bblind\b|\bdeaf\b|\bwheelchair\b", "yes"),
]));

pub(super) static BPL_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| rules(&[
    (r"\bbpl\b|\bbelow\s+(?:the\s+)?poverty\s+line\b|\bantyodaya\b|\bgaribi\s+rekha\b|\bpoor\s+family\b", "yes"),
]));

/// Age statements, tried in order
pub(super) static AGE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b(\d{1,3})\s*(?:years?|yrs?)?\s*old\b",
        r"\bage[d]?\s*(?:is\s*)?(?:of\s*)?(\d{1,3})\b",
        r"\bi(?:'m|m| am)\s*(\d{1,3})\b",
        r"\b(\d{1,3})\s*(?:saal|sal|varsh)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// A negation cue directly before a match (allowing a couple of filler words)
pub(super) static NEGATION_CUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:\bnot|\bno|\bnever|\bneither|\bnor|\bdon't|\bdont|\bisn't|\bisnt|\baren't|\bwithout)\s+(?:(?:a|an|the|from|in|of|part\s+of)\s+){0,2}$",
    )
    .unwrap()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_compile() {
        assert!(STATE_RULES.len() > 36);
        assert_eq!(OCCUPATION_RULES.len(), 7);
        assert_eq!(HELP_TYPE_RULES.len(), 11);
        assert_eq!(EDUCATION_RULES.len(), 2);
        assert_eq!(AGE_PATTERNS.len(), 4);
    }

    #[test]
    fn test_negation_cue() {
        assert!(NEGATION_CUE.is_match("i'm not "));
        assert!(NEGATION_CUE.is_match("i am not from the "));
        assert!(NEGATION_CUE.is_match("no "));
        assert!(!NEGATION_CUE.is_match("i am a "));
        assert!(!NEGATION_CUE.is_match("i know "));
    }
}
