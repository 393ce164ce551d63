//! Page-side runtime and the JSON messages exchanged with it.
//!
//! Elements found on the page are registered in a per-document map and
//! referred to by `(id, doc)` pairs. `doc` is a random token minted when the
//! runtime is injected, so a handle from a previous document is recognised as
//! stale even when the numeric id is reused.

use railprobe_core::locator::LocatorCandidate;
use serde::{Deserialize, Serialize};

pub const RUNTIME_JS: &str = r#"
(() => {
  if (window.__railprobe) return true;
  const doc = Math.random().toString(36).slice(2) + Date.now().toString(36);
  const els = new Map();
  const ids = new WeakMap();
  let next = 1;

  const norm = (s) => (s || '').replace(/\s+/g, ' ').trim();
  const visible = (el) => {
    if (!el.isConnected) return false;
    const style = getComputedStyle(el);
    if (style.display === 'none' || style.visibility === 'hidden' || style.opacity === '0') return false;
    const r = el.getBoundingClientRect();
    return r.width > 0 && r.height > 0;
  };
  const register = (el) => {
    if (!el) return { status: 'missing' };
    let id = ids.get(el);
    if (id === undefined) {
      id = next++;
      ids.set(el, id);
      els.set(id, el);
    }
    return { status: 'found', id, doc };
  };
  const byText = (q) => {
    const needle = q.exact ? norm(q.text) : norm(q.text).toLowerCase();
    const test = (el) => {
      const t = norm(el.innerText || el.textContent);
      return q.exact ? t === needle : t.toLowerCase().includes(needle);
    };
    const pool = Array.from(document.querySelectorAll(q.scope || 'body *')).filter(test);
    if (q.scope) return pool[0];
    return pool.find((el) => !Array.from(el.children).some(test));
  };

  const ops = {
    visible: (el) => visible(el),
    scroll: (el) => { el.scrollIntoView({ block: 'center', inline: 'center' }); return null; },
    box: (el) => {
      const r = el.getBoundingClientRect();
      if (!el.isConnected || r.width === 0 || r.height === 0) return null;
      return { x: r.x, y: r.y, width: r.width, height: r.height };
    },
    click: (el) => { el.click(); return null; },
    focus: (el) => { el.focus(); return null; },
    fill: (el, value) => {
      el.focus();
      const proto = Object.getPrototypeOf(el);
      const desc = Object.getOwnPropertyDescriptor(proto, 'value');
      if (desc && desc.set) desc.set.call(el, value); else el.value = value;
      el.dispatchEvent(new Event('input', { bubbles: true }));
      el.dispatchEvent(new Event('change', { bubbles: true }));
      return null;
    },
    value: (el) => (el.value === undefined || el.value === null ? '' : String(el.value)),
    attr: (el, name) => el.getAttribute(name),
  };

  window.__railprobe = {
    doc,
    query(q) {
      try {
        switch (q.kind) {
          case 'css': return register(document.querySelector(q.selector));
          case 'text': return register(byText(q));
          case 'positional':
            return register(Array.from(document.querySelectorAll(q.selector)).filter(visible)[q.index]);
        }
        return { status: 'error', message: 'unknown query kind ' + q.kind };
      } catch (e) {
        return { status: 'error', message: String(e) };
      }
    },
    call(ref, op, arg) {
      const el = ref.doc === doc ? els.get(ref.id) : undefined;
      if (!el || !el.isConnected) return { status: 'stale' };
      try {
        return { status: 'ok', value: ops[op](el, arg) };
      } catch (e) {
        return { status: 'error', message: String(e) };
      }
    },
  };
  return true;
})()
"#;

pub const RUNTIME_LOADED_JS: &str = "typeof window.__railprobe !== 'undefined'";

/// Wire form of a [`LocatorCandidate`]. Attribute matches travel as CSS.
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuerySpec {
    Css {
        selector: String,
    },
    Text {
        text: String,
        scope: Option<String>,
        exact: bool,
    },
    Positional {
        selector: String,
        index: usize,
    },
}

impl From<&LocatorCandidate> for QuerySpec {
    fn from(candidate: &LocatorCandidate) -> Self {
        match candidate {
            LocatorCandidate::Text { text, scope, exact } => QuerySpec::Text {
                text: text.clone(),
                scope: scope.clone(),
                exact: *exact,
            },
            LocatorCandidate::Positional { selector, index } => QuerySpec::Positional {
                selector: selector.clone(),
                index: *index,
            },
            LocatorCandidate::Css(_) | LocatorCandidate::Attribute { .. } => QuerySpec::Css {
                selector: candidate.to_css().unwrap_or_default(),
            },
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryReply {
    Found { id: u64, doc: String },
    Missing,
    Error { message: String },
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallReply {
    Ok {
        #[serde(default)]
        value: serde_json::Value,
    },
    Stale,
    Error {
        message: String,
    },
}

#[derive(Serialize)]
struct ElementRef<'a> {
    id: u64,
    doc: &'a str,
}

pub fn query_expression(candidate: &LocatorCandidate) -> Result<String, serde_json::Error> {
    let query = serde_json::to_string(&QuerySpec::from(candidate))?;
    Ok(format!("window.__railprobe.query({})", query))
}

pub fn call_expression(
    id: u64,
    doc: &str,
    op: &str,
    arg: &serde_json::Value,
) -> Result<String, serde_json::Error> {
    Ok(format!(
        "window.__railprobe.call({}, {}, {})",
        serde_json::to_string(&ElementRef { id, doc })?,
        serde_json::to_string(op)?,
        serde_json::to_string(arg)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use railprobe_core::locator::AttrMatch;
    use serde_json::json;

    #[test]
    fn attribute_travels_as_css() {
        let candidate =
            LocatorCandidate::attr(Some("input"), "placeholder", AttrMatch::Contains, "odkud");
        assert_eq!(
            QuerySpec::from(&candidate),
            QuerySpec::Css {
                selector: "input[placeholder*='odkud']".into()
            }
        );
    }

    #[test]
    fn query_expression_is_json() {
        let expr = query_expression(&LocatorCandidate::text_in("button", "Hledat")).unwrap();
        assert_eq!(
            expr,
            r#"window.__railprobe.query({"kind":"text","text":"Hledat","scope":"button","exact":false})"#
        );
    }

    #[test]
    fn call_expression_escapes_arguments() {
        let expr = call_expression(3, "abc", "fill", &json!("it's \"quoted\"")).unwrap();
        assert_eq!(
            expr,
            r#"window.__railprobe.call({"id":3,"doc":"abc"}, "fill", "it's \"quoted\"")"#
        );
    }

    #[test]
    fn replies_parse() {
        let found: QueryReply = serde_json::from_value(json!({"status": "found", "id": 4, "doc": "x"})).unwrap();
        assert_eq!(found, QueryReply::Found { id: 4, doc: "x".into() });

        let stale: CallReply = serde_json::from_value(json!({"status": "stale"})).unwrap();
        assert_eq!(stale, CallReply::Stale);

        let null_value: CallReply = serde_json::from_value(json!({"status": "ok", "value": null})).unwrap();
        assert_eq!(null_value, CallReply::Ok { value: serde_json::Value::Null });
    }
}
