//! JavaScript snippets evaluated inside the page.
//!
//! User-supplied strings are embedded as JSON string literals so quotes in a
//! selector or label cannot break out of the expression.

use super::Locator;

/// Outcome strings returned by [`click_if_ready`].
pub const CLICKED: &str = "clicked";
pub const NOT_CLICKABLE: &str = "not_clickable";
pub const MISSING: &str = "missing";

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

pub fn scroll_by(pixels: u32) -> String {
    format!("window.scrollBy(0, {});", pixels)
}

pub fn count_matches(selector: &str) -> String {
    format!("document.querySelectorAll({}).length", js_string(selector))
}

pub fn ready_state() -> &'static str {
    "document.readyState"
}

/// Hide the first element matching `selector`, returning whether it existed.
pub fn hide_element(selector: &str) -> String {
    format!(
        r#"(() => {{
    const el = document.querySelector({});
    if (el) {{
        el.style.display = 'none';
        return true;
    }}
    return false;
}})()"#,
        js_string(selector)
    )
}

/// Text content of the first `<pre>` element, or null.
pub fn pre_text() -> &'static str {
    r#"(() => {
    const pre = document.querySelector('pre');
    return pre ? pre.textContent : null;
})()"#
}

fn find_expression(locator: &Locator) -> String {
    match locator {
        Locator::Css(selector) => format!("document.querySelector({})", js_string(selector)),
        Locator::ButtonText(label) => format!(
            r#"Array.from(document.querySelectorAll('button')).find((button) =>
        Array.from(button.querySelectorAll('span')).some((span) =>
            Array.from(span.childNodes).some((node) =>
                node.nodeType === Node.TEXT_NODE && node.textContent.includes({})
            )
        )
    )"#,
            js_string(label)
        ),
    }
}

/// Click the located element if it is visible and enabled.
///
/// Evaluates to one of [`CLICKED`], [`NOT_CLICKABLE`] or [`MISSING`].
pub fn click_if_ready(locator: &Locator) -> String {
    format!(
        r#"(() => {{
    const el = {};
    if (!el) {{
        return '{missing}';
    }}
    const rect = el.getBoundingClientRect();
    const style = window.getComputedStyle(el);
    const visible = rect.width > 0 && rect.height > 0
        && style.visibility !== 'hidden' && style.display !== 'none';
    if (!visible || el.disabled) {{
        return '{not_clickable}';
    }}
    el.scrollIntoView({{ block: 'center' }});
    el.click();
    return '{clicked}';
}})()"#,
        find_expression(locator),
        missing = MISSING,
        not_clickable = NOT_CLICKABLE,
        clicked = CLICKED,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_by() {
        assert_eq!(scroll_by(300), "window.scrollBy(0, 300);");
    }

    #[test]
    fn test_selector_is_escaped() {
        let script = count_matches(r#"img[alt="look"]"#);
        assert_eq!(
            script,
            r#"document.querySelectorAll("img[alt=\"look\"]").length"#
        );
    }

    #[test]
    fn test_button_text_locator() {
        let script = click_if_ready(&Locator::ButtonText("Load More".to_string()));
        assert!(script.contains(r#"includes("Load More")"#));
        assert!(script.contains("querySelectorAll('button')"));
        assert!(script.contains("'clicked'"));
    }

    #[test]
    fn test_css_locator() {
        let script = click_if_ready(&Locator::Css("#more".to_string()));
        assert!(script.contains(r##"document.querySelector("#more")"##));
    }
}
