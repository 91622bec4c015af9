//! Crossing status extraction from the public status page
//!
//! The page has no stable schema, so every lookup falls back to a sentinel
//! string describing what was missing. Extraction itself never fails.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

use crate::models::StatusSnapshot;

pub const STATUS_NOT_FOUND: &str = "Estado no encontrado";
pub const FRESHNESS_NOT_VISIBLE: &str = "Tiempo no visible en el nodo adyacente";
pub const HOURS_PATTERN_NOT_FOUND: &str = "Patrón de hora no encontrado";
pub const HOURS_NO_ADJACENT_TEXT: &str = "No se encontró texto adyacente";
pub const HOURS_LABEL_NOT_FOUND: &str = "Etiqueta 'Horarios de atención:' no encontrada";
pub const STATUS_CONNECTION_ERROR: &str = "Error de conexión/parsing";
pub const HOURS_CONNECTION_ERROR: &str = "No disponible debido a error de conexión";

static STATUS_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)label-(success|warning|danger)").unwrap());

static HOURS_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Horarios de atención:").unwrap());

static HOURS_WINDOW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d{4}\s*HS\s*A\s*\d{4}\s*HS").unwrap());

static CLASSED: LazyLock<Selector> = LazyLock::new(|| Selector::parse("[class]").unwrap());

static EMPHASIS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("strong, b, em").unwrap());

impl StatusSnapshot {
    /// Snapshot persisted when the page could not be fetched or read
    pub fn connection_error(reason: impl ToString) -> Self {
        Self {
            status: STATUS_CONNECTION_ERROR.to_string(),
            freshness: reason.to_string(),
            hours: HOURS_CONNECTION_ERROR.to_string(),
        }
    }

    /// True when no field had to fall back to a sentinel
    pub fn is_complete(&self) -> bool {
        self.status != STATUS_NOT_FOUND
            && self.status != STATUS_CONNECTION_ERROR
            && self.freshness != FRESHNESS_NOT_VISIBLE
            && HOURS_WINDOW.is_match(&self.hours)
    }
}

/// Extract status, freshness and opening hours from the raw page.
pub fn extract_status(html: &str) -> StatusSnapshot {
    let document = Html::parse_document(html);

    let (status, freshness) = match find_status_element(&document) {
        Some(element) => {
            let status = stripped_text(element);
            let freshness = adjacent_text(element)
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| FRESHNESS_NOT_VISIBLE.to_string());
            (status, freshness)
        }
        None => (STATUS_NOT_FOUND.to_string(), FRESHNESS_NOT_VISIBLE.to_string()),
    };

    StatusSnapshot {
        status,
        freshness,
        hours: extract_hours(&document),
    }
}

/// First element, in document order, carrying a severity label class
fn find_status_element(document: &Html) -> Option<ElementRef<'_>> {
    document
        .select(&CLASSED)
        .find(|element| element.value().classes().any(|c| STATUS_CLASS.is_match(c)))
}

fn extract_hours(document: &Html) -> String {
    let label = document
        .select(&EMPHASIS)
        .find(|element| HOURS_LABEL.is_match(&element.text().collect::<String>()));

    let Some(label) = label else {
        return HOURS_LABEL_NOT_FOUND.to_string();
    };

    match adjacent_text(label) {
        Some(text) if !text.is_empty() => match HOURS_WINDOW.find(&text) {
            Some(window) => window.as_str().trim().to_string(),
            None => HOURS_PATTERN_NOT_FOUND.to_string(),
        },
        _ => HOURS_NO_ADJACENT_TEXT.to_string(),
    }
}

/// Text pieces of `element`, each trimmed, joined without separator
fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect()
}

/// Text of the node immediately following `element` among its siblings
fn adjacent_text(element: ElementRef<'_>) -> Option<String> {
    let sibling = element.next_sibling()?;
    match sibling.value() {
        Node::Text(text) => Some(text.text.to_string()),
        Node::Element(_) => ElementRef::wrap(sibling).map(|e| e.text().collect()),
        _ => None,
    }
}
