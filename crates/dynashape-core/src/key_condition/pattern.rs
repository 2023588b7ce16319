//! String pattern matching for key narrowing.
//!
//! Prefix matching is greedy: `${number}` swallows the longest run of
//! number characters and never gives any back. That can reject a variant a
//! backtracking matcher would accept (`${number}-x` against `1-x`), which is
//! accepted as a known imprecision. Full matching backtracks.

use dynashape_model::{Schema, TemplatePart};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Prefix,
    Full,
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || c == '-' || c == '.'
}

fn match_template(parts: &[TemplatePart], input: &[char], mode: Mode) -> bool {
    let Some((part, rest)) = parts.split_first() else {
        return input.is_empty();
    };
    if mode == Mode::Prefix && input.is_empty() {
        return true;
    }
    match part {
        TemplatePart::Literal(literal) => {
            let mut consumed = 0;
            for c in literal.chars() {
                match input.get(consumed) {
                    None => return mode == Mode::Prefix,
                    Some(&i) if i == c => consumed += 1,
                    Some(_) => return false,
                }
            }
            match_template(rest, &input[consumed..], mode)
        }
        TemplatePart::String => match mode {
            Mode::Prefix => true,
            Mode::Full => (0..=input.len()).any(|k| match_template(rest, &input[k..], mode)),
        },
        TemplatePart::Number => {
            let run = input.iter().take_while(|c| is_number_char(**c)).count();
            match mode {
                _ if run == 0 => false,
                Mode::Prefix => run == input.len() || match_template(rest, &input[run..], mode),
                Mode::Full => (1..=run)
                    .rev()
                    .any(|k| match_template(rest, &input[k..], mode)),
            }
        }
    }
}

/// Returns `true` if some string described by `schema` could start with
/// `prefix`.
#[must_use]
pub fn can_begin_with(schema: &Schema, prefix: &str) -> bool {
    schema.members().iter().any(|member| match member {
        Schema::String => true,
        Schema::StringLiteral { value } => value.starts_with(prefix),
        Schema::Template { parts } => {
            let chars: Vec<char> = prefix.chars().collect();
            match_template(parts, &chars, Mode::Prefix)
        }
        _ => false,
    })
}

/// Returns `true` if the literal `value` is one of the strings `parts` describes.
#[must_use]
pub fn template_matches(parts: &[TemplatePart], value: &str) -> bool {
    let chars: Vec<char> = value.chars().collect();
    match_template(parts, &chars, Mode::Full)
}

/// Returns `true` if every value of `value` is also a value of `target`.
#[must_use]
pub fn is_assignable(value: &Schema, target: &Schema) -> bool {
    let members = value.members();
    let targets = target.members();
    !members.is_empty()
        && members
            .iter()
            .all(|v| targets.iter().any(|t| member_assignable(v, t)))
}

fn member_assignable(value: &Schema, target: &Schema) -> bool {
    match (value, target) {
        (
            Schema::String | Schema::StringLiteral { .. } | Schema::Template { .. },
            Schema::String,
        )
        | (Schema::Number | Schema::NumberLiteral { .. }, Schema::Number)
        | (Schema::Boolean | Schema::BooleanLiteral { .. }, Schema::Boolean) => true,
        (Schema::StringLiteral { value }, Schema::Template { parts }) => {
            template_matches(parts, value)
        }
        _ => value.structurally_eq(target),
    }
}
