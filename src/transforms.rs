//! The case-conversion catalog: pure string transforms applied to captured text.
//!
//! Every transform is total and deterministic over arbitrary input (empty input
//! yields empty output) and never touches external state. The catalog order is
//! the order the presentation layer shows the conversion buttons in, so it is
//! stable. Case folding uses the standard library's default Unicode folding;
//! the separator/stripping character classes are deliberately ASCII, matching
//! the persisted output users have accumulated.

/// A named entry in the conversion catalog.
pub struct Conversion {
    pub name: &'static str,
    pub transform: fn(&str) -> String,
}

/// The catalog, in presentation order. "Capital Case" and "Title Case" are
/// distinct entries with identical behavior; both labels are part of the
/// persisted format (they end up in `cn` fields) and must stay exposed.
pub const CATALOG: &[Conversion] = &[
    Conversion {
        name: "Lowercase",
        transform: to_lowercase,
    },
    Conversion {
        name: "Uppercase",
        transform: to_uppercase,
    },
    Conversion {
        name: "Camel Case",
        transform: to_camel_case,
    },
    Conversion {
        name: "Snake Case",
        transform: to_snake_case,
    },
    Conversion {
        name: "Sentence Case",
        transform: to_sentence_case,
    },
    Conversion {
        name: "Capital Case",
        transform: to_capital_case,
    },
    Conversion {
        name: "Pascal Case",
        transform: to_pascal_case,
    },
    Conversion {
        name: "Kebab Case",
        transform: to_kebab_case,
    },
    Conversion {
        name: "Title Case",
        transform: to_title_case,
    },
    Conversion {
        name: "Constant Case",
        transform: to_constant_case,
    },
];

/// Finds a catalog entry by its display name.
pub fn lookup(name: &str) -> Option<&'static Conversion> {
    CATALOG.iter().find(|c| c.name == name)
}

fn to_lowercase(input: &str) -> String {
    input.to_lowercase()
}

fn to_uppercase(input: &str) -> String {
    input.to_uppercase()
}

/// camelCase: lowercase everything, then delete each run of non-alphanumeric
/// characters and uppercase the character that follows it. A leading separator
/// run therefore capitalizes the first kept character. A trailing run has no
/// following character to capitalize, so one separator survives it: the
/// character itself when the run is a single separator, the uppercased last
/// character when the run is longer. The result is trimmed of surrounding
/// whitespace, so a surviving trailing space still disappears.
fn to_camel_case(input: &str) -> String {
    let lowered = input.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut run_len = 0usize;
    let mut last_separator = ' ';
    for ch in lowered.chars() {
        if ch.is_ascii_alphanumeric() {
            if run_len > 0 {
                out.extend(ch.to_uppercase());
                run_len = 0;
            } else {
                out.push(ch);
            }
        } else {
            run_len += 1;
            last_separator = ch;
        }
    }
    if run_len == 1 {
        out.push(last_separator);
    } else if run_len > 1 {
        out.extend(last_separator.to_uppercase());
    }
    out.trim().to_string()
}

/// snake_case: lowercase, collapse each whitespace run to a single underscore,
/// strip anything that is not an ASCII alphanumeric or underscore.
fn to_snake_case(input: &str) -> String {
    separate_and_strip(&input.to_lowercase(), '_', |ch| {
        ch.is_ascii_alphanumeric() || ch == '_'
    })
}

/// kebab-case: lowercase, collapse whitespace runs to single hyphens, strip
/// anything outside lowercase ASCII letters, digits, and hyphens.
fn to_kebab_case(input: &str) -> String {
    separate_and_strip(&input.to_lowercase(), '-', |ch| {
        ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-'
    })
}

/// CONSTANT_CASE: uppercase, collapse whitespace runs to single underscores,
/// strip anything outside uppercase ASCII letters, digits, and underscores.
fn to_constant_case(input: &str) -> String {
    separate_and_strip(&input.to_uppercase(), '_', |ch| {
        ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '_'
    })
}

/// Sentence case: lowercase, then uppercase the first word character at the
/// start of the string and the first word character after each of `.`, `!`,
/// `?` (optionally separated by whitespace). Any other intervening character
/// cancels the pending capitalization.
fn to_sentence_case(input: &str) -> String {
    let lowered = input.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut pending = true;
    for ch in lowered.chars() {
        if pending && !ch.is_whitespace() {
            if is_word_char(ch) {
                out.extend(ch.to_uppercase());
                pending = false;
                continue;
            }
            pending = matches!(ch, '.' | '!' | '?');
        } else if matches!(ch, '.' | '!' | '?') {
            pending = true;
        }
        out.push(ch);
    }
    out
}

/// Capital Case: lowercase, split on single spaces, capitalize each token,
/// rejoin with single spaces. Consecutive spaces produce empty tokens and thus
/// survive in the output, which is the established behavior.
fn to_capital_case(input: &str) -> String {
    join_capitalized(input, " ")
}

/// Title Case: same behavior as Capital Case under a second catalog label.
fn to_title_case(input: &str) -> String {
    join_capitalized(input, " ")
}

/// PascalCase: lowercase, split on spaces, capitalize each token, concatenate.
fn to_pascal_case(input: &str) -> String {
    join_capitalized(input, "")
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn join_capitalized(input: &str, sep: &str) -> String {
    input
        .to_lowercase()
        .split(' ')
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(sep)
}

/// Collapses whitespace runs to a single `sep`, then drops characters `keep`
/// rejects. Collapsing happens first so interior punctuation disappears
/// without leaving doubled separators behind.
fn separate_and_strip(input: &str, sep: char, keep: impl Fn(char) -> bool) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_whitespace = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push(sep);
            }
            in_whitespace = true;
        } else {
            in_whitespace = false;
            if keep(ch) {
                out.push(ch);
            }
        }
    }
    out
}
