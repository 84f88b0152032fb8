//! Field lookup strategies
//!
//! Each field of a product page is read through an ordered list of probes.
//! A probe yields zero or more candidate strings; the caller accepts the
//! first candidate that passes its field check (non-empty text, a parseable
//! price, a resolvable URL), so the list order is the priority order.

use scraper::{ElementRef, Html, Selector};

use super::error::ExtractError;
use crate::catalog::fold;

/// Serializable description of a probe, as held in configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeSpec {
    /// Text of elements matching a CSS selector
    Text(String),

    /// First non-empty attribute, in the listed order, of elements matching a selector
    Attr(String, Vec<String>),

    /// Text of the element holding a label, then of its ancestors up to `levels` up
    Labelled { label: String, levels: usize },

    /// Items under the section introduced by a label, joined with a separator
    Section {
        label: String,
        items: String,
        max_items: usize,
        separator: String,
    },

    /// Text of the whole `<body>`
    Body,
}

impl ProbeSpec {
    pub fn text(selector: &str) -> Self {
        Self::Text(selector.to_string())
    }

    pub fn attr(selector: &str, attrs: &[&str]) -> Self {
        Self::Attr(
            selector.to_string(),
            attrs.iter().map(|a| a.to_string()).collect(),
        )
    }

    /// Compile the selectors this probe needs
    pub fn compile(&self) -> Result<Probe, ExtractError> {
        Ok(match self {
            ProbeSpec::Text(selector) => Probe::Text(parse_selector(selector)?),
            ProbeSpec::Attr(selector, attrs) => Probe::Attr(parse_selector(selector)?, attrs.clone()),
            ProbeSpec::Labelled { label, levels } => Probe::Labelled {
                label: fold(label),
                levels: *levels,
            },
            ProbeSpec::Section {
                label,
                items,
                max_items,
                separator,
            } => Probe::Section {
                label: fold(label),
                items: parse_selector(items)?,
                max_items: *max_items,
                separator: separator.clone(),
            },
            ProbeSpec::Body => Probe::Body(parse_selector("body")?),
        })
    }
}

/// Parse a CSS selector, keeping the failure message
pub fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Compiled probe
#[derive(Debug, Clone)]
pub enum Probe {
    Text(Selector),
    Attr(Selector, Vec<String>),
    Labelled {
        label: String,
        levels: usize,
    },
    Section {
        label: String,
        items: Selector,
        max_items: usize,
        separator: String,
    },
    Body(Selector),
}

impl Probe {
    /// Whether this probe reads loosely scoped text (page body or a label's
    /// surroundings) rather than a dedicated element
    pub fn is_broad(&self) -> bool {
        matches!(self, Probe::Labelled { .. } | Probe::Body(_))
    }

    /// Candidate values in priority order; empty strings are never yielded
    pub fn candidates(&self, doc: &Html) -> Vec<String> {
        let values: Vec<String> = match self {
            Probe::Text(selector) | Probe::Body(selector) => {
                doc.select(selector).map(collapsed_text).collect()
            }
            Probe::Attr(selector, attrs) => doc
                .select(selector)
                .filter_map(|el| {
                    attrs
                        .iter()
                        .filter_map(|attr| el.value().attr(attr))
                        .map(str::trim)
                        .find(|value| !value.is_empty())
                        .map(str::to_string)
                })
                .collect(),
            Probe::Labelled { label, levels } => labelled(doc, label)
                .flat_map(|holder| holder_and_ancestors(holder, *levels))
                .map(collapsed_text)
                .collect(),
            Probe::Section {
                label,
                items,
                max_items,
                separator,
            } => labelled(doc, label)
                .filter_map(|holder| {
                    holder_and_ancestors(holder, 3).into_iter().find_map(|section| {
                        let bullets: Vec<String> = section
                            .select(items)
                            .map(collapsed_text)
                            .filter(|t| !t.is_empty())
                            .take(*max_items)
                            .collect();
                        (!bullets.is_empty()).then(|| bullets.join(separator.as_str()))
                    })
                })
                .collect(),
        };
        values.into_iter().filter(|v| !v.is_empty()).collect()
    }

    /// First candidate accepted by `accept`
    pub fn first<T>(&self, doc: &Html, accept: impl Fn(&str) -> Option<T>) -> Option<T> {
        self.candidates(doc).iter().find_map(|c| accept(c))
    }
}

/// Try probes in order; the first accepted candidate wins
pub fn first_match<T>(
    probes: &[Probe],
    doc: &Html,
    accept: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    probes.iter().find_map(|probe| probe.first(doc, &accept))
}

/// Elements whose text is never rendered
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

fn is_hidden(el: ElementRef<'_>) -> bool {
    HIDDEN_ELEMENTS.contains(&el.value().name())
}

/// Rendered text nodes under `el`, skipping script and style bodies
fn visible_text<'a>(el: ElementRef<'a>) -> impl Iterator<Item = &'a str> + 'a {
    el.descendants()
        .filter(|node| !node.ancestors().filter_map(ElementRef::wrap).any(is_hidden))
        .filter_map(|node| node.value().as_text().map(|text| &**text))
}

/// Visible element text with runs of whitespace collapsed to single spaces
pub fn collapsed_text(el: ElementRef<'_>) -> String {
    visible_text(el)
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Elements whose own visible text node contains the folded `label`
fn labelled<'a>(doc: &'a Html, label: &'a str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    doc.root_element()
        .descendants()
        .filter(move |node| {
            node.value()
                .as_text()
                .is_some_and(|text| fold(text).contains(label))
                && !node.ancestors().filter_map(ElementRef::wrap).any(is_hidden)
        })
        .filter_map(|node| node.parent().and_then(ElementRef::wrap))
}

/// The element itself followed by up to `levels` element ancestors
fn holder_and_ancestors(holder: ElementRef<'_>, levels: usize) -> Vec<ElementRef<'_>> {
    std::iter::once(holder)
        .chain(holder.ancestors().filter_map(ElementRef::wrap).take(levels))
        .collect()
}
