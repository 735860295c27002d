//! Interpolation of `{expression}` spans against layered data.
//!
//! Two expression forms are understood:
//!
//! - `{name}` / `{user.name}`: a path lookup, rendered with
//!   [`value::display`](crate::value::display).
//! - `{cond?'a':'b'}`: a two-branch ternary whose condition is either a bare
//!   truthiness check (`{flag?'on':'off'}`) or a string comparison
//!   (`{status=='active'?'On':'Off'}`, `!=` likewise).
//!
//! Evaluation is fail-soft: an unresolved identifier or a malformed
//! expression leaves the original `{...}` text in place.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use super::tokenizer::{tokenize, Token};
use crate::path;
use crate::value::{display, is_truthy, loose_eq};

static SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^}]+)\}").expect("span pattern is valid"));

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Ordered lookup layers. The first layer that defines a path wins.
#[derive(Debug, Clone, Default)]
pub struct Context<'a> {
    layers: Vec<&'a Value>,
}

impl<'a> Context<'a> {
    /// Create an empty context. Every lookup is unresolved.
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Form-scope data shadowing global-scope data.
    pub fn scoped(form: &'a Value, global: &'a Value) -> Self {
        Self::new().with_layer(form).with_layer(global)
    }

    /// Append a lower-priority layer (builder).
    pub fn with_layer(mut self, layer: &'a Value) -> Self {
        self.layers.push(layer);
        self
    }

    /// Resolve `path` against the layers in order.
    pub fn lookup(&self, path: &str) -> Option<&'a Value> {
        self.layers.iter().find_map(|layer| path::get(layer, path))
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Replace every `{expression}` span in `text`.
///
/// Spans run from `{` to the next `}`; there is no nesting.
pub fn interpolate(text: &str, context: &Context<'_>) -> String {
    if !text.contains('{') {
        return text.to_owned();
    }
    SPAN.replace_all(text, |caps: &Captures<'_>| {
        evaluate(&caps[1], context).unwrap_or_else(|| caps[0].to_owned())
    })
    .into_owned()
}

/// Evaluate the inside of one `{...}` span.
///
/// Returns `None` when the expression is unresolved or malformed, in which
/// case callers keep the original text.
pub fn evaluate(expression: &str, context: &Context<'_>) -> Option<String> {
    let expression = expression.trim();
    let tokens = tokenize(expression);
    let question = tokens
        .iter()
        .position(|(token, _)| *token == Some(Token::Question));

    match question {
        Some(q) => evaluate_ternary(expression, &tokens, q, context),
        None => match tokens.as_slice() {
            [(Some(Token::Ident | Token::Number), span)] => {
                context.lookup(&expression[span.clone()]).map(display)
            }
            _ => None,
        },
    }
}

// ---------------------------------------------------------------------------
// Ternaries
// ---------------------------------------------------------------------------

type Spanned = (Option<Token>, std::ops::Range<usize>);

fn evaluate_ternary(
    expression: &str,
    tokens: &[Spanned],
    q: usize,
    context: &Context<'_>,
) -> Option<String> {
    let rest = &tokens[q + 1..];
    if rest.iter().any(|(t, _)| *t == Some(Token::Question)) {
        return None;
    }
    let mut colons = rest
        .iter()
        .filter(|(t, _)| *t == Some(Token::Colon))
        .map(|(_, span)| span.clone());
    let colon = colons.next()?;
    if colons.next().is_some() {
        return None;
    }

    let truthy = evaluate_condition(expression, &tokens[..q], context)?;
    let question_end = tokens[q].1.end;
    let branch = if truthy {
        &expression[question_end..colon.start]
    } else {
        &expression[colon.end..]
    };
    Some(unquote(branch.trim()))
}

fn evaluate_condition(expression: &str, tokens: &[Spanned], context: &Context<'_>) -> Option<bool> {
    match tokens {
        [(Some(Token::Ident | Token::Number), span)] => Some(
            context
                .lookup(&expression[span.clone()])
                .is_some_and(is_truthy),
        ),
        [(Some(Token::Ident | Token::Number), left), (Some(op @ (Token::Eq | Token::NotEq)), _), (Some(lit), right)]
            if lit.is_literal() =>
        {
            let literal = unquote(&expression[right.clone()]);
            let equal = context
                .lookup(&expression[left.clone()])
                .is_some_and(|value| loose_eq(value, &literal));
            Some(if *op == Token::Eq { equal } else { !equal })
        }
        _ => None,
    }
}

/// Strip single quotes anywhere and one pair of surrounding double quotes.
fn unquote(text: &str) -> String {
    let text = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text);
    text.replace('\'', "")
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval_with(text: &str, data: &Value) -> String {
        interpolate(text, &Context::new().with_layer(data))
    }

    // ── Plain lookups ────────────────────────────────────────────────

    #[test]
    fn plain_identifier() {
        assert_eq!(eval_with("Hello {name}", &json!({"name": "Ann"})), "Hello Ann");
    }

    #[test]
    fn dotted_identifier() {
        let data = json!({"user": {"city": "Oslo"}});
        assert_eq!(eval_with("From {user.city}", &data), "From Oslo");
    }

    #[test]
    fn whitespace_inside_braces() {
        assert_eq!(eval_with("{ name }", &json!({"name": "Ann"})), "Ann");
    }

    #[test]
    fn unresolved_is_left_untouched() {
        assert_eq!(eval_with("Hello {name}", &json!({})), "Hello {name}");
        assert_eq!(eval_with("Hello { name }", &json!({})), "Hello { name }");
    }

    #[test]
    fn numbers_and_null_render() {
        let data = json!({"count": 3, "ratio": 0.5, "nothing": null});
        assert_eq!(eval_with("{count}/{ratio}/{nothing}", &data), "3/0.5/null");
    }

    #[test]
    fn multiple_spans() {
        let data = json!({"a": "x", "b": "y"});
        assert_eq!(eval_with("{a}-{b}-{c}", &data), "x-y-{c}");
    }

    #[test]
    fn no_braces_fast_path() {
        assert_eq!(eval_with("plain text", &json!({})), "plain text");
    }

    #[test]
    fn comparison_without_ternary_untouched() {
        let data = json!({"status": "active"});
        assert_eq!(eval_with("{status=='active'}", &data), "{status=='active'}");
    }

    // ── Layering ─────────────────────────────────────────────────────

    #[test]
    fn form_layer_shadows_global() {
        let form = json!({"name": "Form"});
        let global = json!({"name": "Global", "other": "G"});
        let cx = Context::scoped(&form, &global);
        assert_eq!(interpolate("{name} {other}", &cx), "Form G");
    }

    #[test]
    fn explicit_null_in_form_still_shadows() {
        let form = json!({"name": null});
        let global = json!({"name": "Global"});
        let cx = Context::scoped(&form, &global);
        assert_eq!(interpolate("{name}", &cx), "null");
    }

    // ── Ternaries ────────────────────────────────────────────────────

    #[test]
    fn ternary_equality() {
        let text = "{status=='active'?'On':'Off'}";
        assert_eq!(eval_with(text, &json!({"status": "active"})), "On");
        assert_eq!(eval_with(text, &json!({"status": "idle"})), "Off");
        assert_eq!(eval_with(text, &json!({})), "Off");
    }

    #[test]
    fn ternary_inequality() {
        let text = "{role != 'admin' ? 'user' : 'admin'}";
        assert_eq!(eval_with(text, &json!({"role": "guest"})), "user");
        assert_eq!(eval_with(text, &json!({"role": "admin"})), "admin");
        assert_eq!(eval_with(text, &json!({})), "user");
    }

    #[test]
    fn ternary_truthiness() {
        let text = "{paid?'Paid':'Due'}";
        assert_eq!(eval_with(text, &json!({"paid": true})), "Paid");
        assert_eq!(eval_with(text, &json!({"paid": 0})), "Due");
        assert_eq!(eval_with(text, &json!({})), "Due");
    }

    #[test]
    fn ternary_numeric_comparison() {
        let text = "{count==5?'five':'other'}";
        assert_eq!(eval_with(text, &json!({"count": 5})), "five");
        assert_eq!(eval_with(text, &json!({"count": "5"})), "five");
    }

    #[test]
    fn ternary_unquoted_branches() {
        assert_eq!(eval_with("{on?yes:no}", &json!({"on": true})), "yes");
    }

    #[test]
    fn ternary_branch_with_spaces_and_colon_inside_quotes() {
        let text = "{ok?'time: now':'later on'}";
        assert_eq!(eval_with(text, &json!({"ok": true})), "time: now");
        assert_eq!(eval_with(text, &json!({"ok": false})), "later on");
    }

    #[test]
    fn ternary_missing_else_branch_untouched() {
        let text = "{ok?'yes'}";
        assert_eq!(eval_with(text, &json!({"ok": true})), text);
    }

    #[test]
    fn nested_ternary_untouched() {
        let text = "{a?b?'x':'y':'z'}";
        assert_eq!(eval_with(text, &json!({"a": true, "b": true})), text);
    }

    #[test]
    fn arithmetic_condition_untouched() {
        let text = "{a+b?'x':'y'}";
        assert_eq!(eval_with(text, &json!({"a": 1, "b": 2})), text);
    }
}
