//! Section selection.
//!
//! Picks the section the driver should click, scanning in document order.
//! First match wins: there is no price optimisation across candidates.

use tracing::debug;

use crate::types::{SelectionPolicy, TicketSection};

/// The chosen section and its position in the scanned list.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection<'a> {
    pub index: usize,
    pub section: &'a TicketSection,
    /// True when no preferred term matched and the fallback was used.
    pub fallback: bool,
}

pub fn select_section<'a>(
    sections: &'a [TicketSection],
    policy: &SelectionPolicy,
) -> Option<Selection<'a>> {
    let terms = policy.normalized_terms();

    if terms.is_empty() {
        return sections
            .iter()
            .enumerate()
            .find(|(_, s)| s.available && s.within_budget(policy.max_price))
            .map(|(index, section)| Selection {
                index,
                section,
                fallback: false,
            });
    }

    let mut fallback: Option<(usize, &TicketSection)> = None;

    for (index, section) in sections.iter().enumerate() {
        let price_ok = section.within_budget(policy.max_price);
        let preferred = section.matches_any(&terms);

        debug!(
            section = %section.name,
            price = ?section.price,
            preferred,
            price_ok,
            available = section.available,
            "section scanned"
        );

        if preferred && price_ok && section.available {
            return Some(Selection {
                index,
                section,
                fallback: false,
            });
        }

        if price_ok && section.available && fallback.is_none() {
            fallback = Some((index, section));
        }
    }

    if !policy.fallback_to_any_section {
        return None;
    }

    fallback.map(|(index, section)| Selection {
        index,
        section,
        fallback: true,
    })
}
