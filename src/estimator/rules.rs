/// Keyword tables behind the duration estimator
///
/// Each table is an ordered list of rules. A rule matches when any of its
/// keywords appears in the habit text. Plain words match whole tokens only,
/// a trailing `*` marks a stem ("meditat*" matches "meditation"), and
/// multi-word keywords match as whole-word phrases.

/// Habit text normalized for keyword matching
#[derive(Debug, Clone)]
pub struct HabitText {
    tokens: Vec<String>,
    joined: String,
}

impl HabitText {
    pub fn new(raw: &str) -> Self {
        let tokens: Vec<String> = raw
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        let joined = format!(" {} ", tokens.join(" "));
        Self { tokens, joined }
    }

    /// Whether `keyword` occurs in the text
    pub fn contains(&self, keyword: &str) -> bool {
        if let Some(stem) = keyword.strip_suffix('*') {
            self.tokens.iter().any(|t| t.starts_with(stem))
        } else if keyword.contains(|c: char| c == ' ' || c == '-') {
            let phrase = keyword.replace('-', " ");
            self.joined.contains(&format!(" {} ", phrase))
        } else {
            self.tokens.iter().any(|t| t == keyword)
        }
    }
}

/// One (predicate, value) row of a multiplier table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub value: f64,
}

impl Rule {
    pub fn matches(&self, text: &HabitText) -> bool {
        self.keywords.iter().any(|k| text.contains(k))
    }
}

/// First matching row of an ordered table
pub fn first_match<'a>(table: &'a [Rule], text: &HabitText) -> Option<&'a Rule> {
    table.iter().find(|rule| rule.matches(text))
}

pub const COMPLEXITY_BASE: f64 = 1.0;
pub const COMPLEXITY_MIN: f64 = 0.85;
pub const COMPLEXITY_MAX: f64 = 1.35;

/// Trivially easy actions; overrides every bonus below
pub const COMPLEXITY_EASY: Rule = Rule {
    name: "trivially_easy",
    keywords: &[
        "water", "vitamin*", "stretch*", "journal*", "gratitude", "grateful", "floss*",
    ],
    value: 0.9,
};

/// Additive bonuses, cumulative across families
pub const COMPLEXITY_BONUSES: &[Rule] = &[
    Rule {
        name: "exercise",
        keywords: &[
            "exercis*", "workout*", "work out", "training", "run", "runs", "running", "jog*",
            "gym", "lifting", "weights", "cardio", "hiit", "swim*", "cycl*", "pushup*",
            "push-up", "push-ups", "squat*",
        ],
        value: 0.18,
    },
    Rule {
        name: "household_setup",
        keywords: &[
            "meal prep", "cook", "cooking", "clean", "cleaning", "declutter*", "tidy",
            "tidying", "laundry", "dishes", "vacuum*",
        ],
        value: 0.16,
    },
    Rule {
        name: "deliberate_practice",
        keywords: &[
            "study", "studying", "code", "coding", "program*", "practic*", "learn*",
            "homework", "piano", "guitar", "languag*",
        ],
        value: 0.14,
    },
];

pub const VALENCE_DEFAULT: f64 = 1.02;

pub const VALENCE: &[Rule] = &[
    Rule {
        name: "high_resistance",
        keywords: &[
            "cold shower", "cold plunge", "ice bath", "plunge*", "chore*", "laundry", "dishes",
            "clean", "cleaning", "vacuum*", "budget*", "financ*", "taxes", "bills", "expense*",
            "debt*",
        ],
        value: 1.18,
    },
    Rule {
        name: "moderate_resistance",
        keywords: &[
            "gym", "workout*", "exercis*", "study", "studying", "code", "coding", "program*",
            "homework", "practic*",
        ],
        value: 1.08,
    },
    Rule {
        name: "enjoyable",
        keywords: &[
            "walk", "walks", "walking", "read", "reading", "journal*", "music", "water",
            "meditat*", "gratitude", "podcast*",
        ],
        value: 0.95,
    },
];

pub const FRICTION_DEFAULT: f64 = 1.05;

pub const FRICTION: &[Rule] = &[
    Rule {
        name: "requires_travel",
        keywords: &[
            "gym", "commute*", "drive", "driving", "class", "classes", "studio", "pool",
            "trail*", "park", "plunge*", "sauna", "outdoor*", "outside",
        ],
        value: 1.22,
    },
    Rule {
        name: "requires_setup",
        keywords: &[
            "meal prep", "cook", "cooking", "bake", "baking", "clean", "cleaning", "laundry",
            "declutter*", "ice bath", "cold shower",
        ],
        value: 1.15,
    },
    Rule {
        name: "zero_setup",
        keywords: &[
            "journal*", "meditat*", "stretch*", "water", "read", "reading", "breath*",
            "gratitude", "floss*", "vitamin*",
        ],
        value: 0.95,
    },
];
