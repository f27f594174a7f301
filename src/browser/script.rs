use serde::Deserialize;

use super::{BrowserError, PageContext};

// Everything the engine reads off a page goes through these small scripts so
// the DOM work happens inside the browser, not over the wire element by element.

/// Serialize a selector into a JS string literal
pub(crate) fn js_str(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| String::from("\"\""))
}

/// Serialize a selector list into a JS array literal
fn js_array(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| String::from("[]"))
}

/// Trimmed text content of every element matching `selector`
pub async fn query_texts(
    page: &dyn PageContext,
    selector: &str,
) -> Result<Vec<String>, BrowserError> {
    let script = format!(
        "return Array.from(document.querySelectorAll({})).map((el) => (el.textContent || '').trim());",
        js_str(selector)
    );
    let value = page.evaluate(&script).await?;
    Ok(serde_json::from_value(value)?)
}

/// An attribute of every element matching `selector`
pub async fn query_attrs(
    page: &dyn PageContext,
    selector: &str,
    attr: &str,
) -> Result<Vec<String>, BrowserError> {
    let script = format!(
        "return Array.from(document.querySelectorAll({})).map((el) => el.getAttribute({}) || '');",
        js_str(selector),
        js_str(attr)
    );
    let value = page.evaluate(&script).await?;
    Ok(serde_json::from_value(value)?)
}

/// Number of elements matching `selector`
pub async fn count(page: &dyn PageContext, selector: &str) -> Result<u64, BrowserError> {
    let script = format!(
        "return document.querySelectorAll({}).length;",
        js_str(selector)
    );
    let value = page.evaluate(&script).await?;
    Ok(serde_json::from_value(value)?)
}

/// Visible text of the whole page body
pub async fn body_text(page: &dyn PageContext) -> Result<String, BrowserError> {
    let value = page
        .evaluate("return document.body ? (document.body.innerText || '') : '';")
        .await?;
    Ok(serde_json::from_value(value)?)
}

/// Per-card preview lookups, each an ordered list of alternatives
#[derive(Debug, Clone)]
pub struct CardProbe {
    pub link: Vec<String>,
    pub title: Vec<String>,
    pub price: Vec<String>,
    pub mileage: Vec<String>,
    pub year: Vec<String>,
}

/// Raw preview fields scraped off one listing card
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawCard {
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub mileage: String,
    #[serde(default)]
    pub year: String,
}

/// Scan every card under `container` and pull preview fields in one round trip
pub async fn query_cards(
    page: &dyn PageContext,
    container: &str,
    probe: &CardProbe,
) -> Result<Vec<RawCard>, BrowserError> {
    let script = format!(
        r#"const pickText = (root, selectors) => {{
    for (const sel of selectors) {{
        const el = root.querySelector(sel);
        if (el) {{
            const text = (el.textContent || '').trim();
            if (text) return text;
        }}
    }}
    return '';
}};
const pickHref = (root, selectors) => {{
    for (const sel of selectors) {{
        const el = root.querySelector(sel);
        if (el) {{
            const href = el.getAttribute('href');
            if (href) return href;
        }}
    }}
    return '';
}};
return Array.from(document.querySelectorAll({container})).map((card) => ({{
    href: pickHref(card, {links}),
    title: pickText(card, {titles}),
    price: pickText(card, {prices}),
    mileage: pickText(card, {mileages}),
    year: pickText(card, {years}),
}}));"#,
        container = js_str(container),
        links = js_array(&probe.link),
        titles = js_array(&probe.title),
        prices = js_array(&probe.price),
        mileages = js_array(&probe.mileage),
        years = js_array(&probe.year),
    );
    let value = page.evaluate(&script).await?;
    Ok(serde_json::from_value(value)?)
}
