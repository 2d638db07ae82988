//! Property checks for the section selector.

use proptest::prelude::*;
use rust_decimal::Decimal;

use listing::{SelectionPolicy, TicketSection, select_section};

fn arb_section() -> impl Strategy<Value = TicketSection> {
    (
        prop::sample::select(vec!["Floor", "Upper", "Lower", "Palco", "Grada", "Pista"]),
        prop::option::of(0i64..1_000),
        any::<bool>(),
    )
        .prop_map(|(name, price, available)| {
            TicketSection::new(name, price.map(Decimal::from), available)
        })
}

fn no_preference(max_price: i64, fallback: bool) -> SelectionPolicy {
    SelectionPolicy {
        max_price: Decimal::from(max_price),
        preferred_sections: Vec::new(),
        fallback_to_any_section: fallback,
    }
}

proptest! {
    #[test]
    fn without_preferences_first_eligible_section_is_chosen(
        sections in prop::collection::vec(arb_section(), 0..12),
        max_price in 0i64..1_000,
        fallback in any::<bool>(),
    ) {
        let policy = no_preference(max_price, fallback);
        let expected = sections.iter().position(|s| {
            s.available && s.price.is_none_or(|p| p <= Decimal::from(max_price))
        });

        let picked = select_section(&sections, &policy).map(|s| s.index);
        prop_assert_eq!(picked, expected);
    }

    #[test]
    fn unknown_price_never_fails_the_budget(
        name in "[A-Za-z ]{1,12}",
        max_price in 0i64..1_000,
    ) {
        let sections = vec![TicketSection::new(name, None, true)];
        let picked = select_section(&sections, &no_preference(max_price, false));
        prop_assert!(picked.is_some());
    }

    #[test]
    fn chosen_section_is_always_available_and_in_budget(
        sections in prop::collection::vec(arb_section(), 0..12),
        max_price in 0i64..1_000,
        preferred in prop::collection::vec("[a-z]{1,5}", 0..3),
        fallback in any::<bool>(),
    ) {
        let policy = SelectionPolicy {
            max_price: Decimal::from(max_price),
            preferred_sections: preferred,
            fallback_to_any_section: fallback,
        };

        if let Some(sel) = select_section(&sections, &policy) {
            prop_assert!(sel.section.available);
            prop_assert!(sel.section.within_budget(policy.max_price));
            prop_assert_eq!(&sections[sel.index], sel.section);
        }
    }
}
