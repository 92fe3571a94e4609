//! Plain-text rendering of page states.

use crate::forms::FormErrors;
use crate::pages::dashboard::DashboardState;
use crate::pages::events::EventsState;
use crate::pages::home::HomeState;
use crate::pages::purchase::PurchaseState;
use crate::pages::tickets::TicketsState;
use crate::pages::venues::VenuesState;
use crate::pages::Loadable;
use casaroja_client::types::{Event, Location, Money, Ticket, TicketStatus};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;

/// Landing page headline.
pub const HERO_TITLE: &str = "Casa Roja";

/// Landing page tagline.
pub const HERO_SUBTITLE: &str =
    "Cultural experiences in Valparaíso: concerts, workshops, exhibitions and festivals.";

/// `Free` for anything that rounds to zero pesos, otherwise whole pesos
/// with `.` thousands separators, e.g. `$15.000`.
#[must_use]
pub fn format_price(price: Money) -> String {
    #[allow(clippy::cast_possible_truncation)] // peso amounts fit in i64
    let pesos = price.amount().round() as i64;
    if pesos == 0 {
        return "Free".to_string();
    }
    let digits = pesos.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    if pesos < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// `1 March 2025, 18:00`
#[must_use]
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%-d %B %Y, %H:%M").to_string()
}

/// The venue name, or a placeholder when none is set.
#[must_use]
pub fn venue_label(event: &Event) -> &str {
    event
        .location
        .as_ref()
        .map_or("Venue to be confirmed", |location| location.name.as_str())
}

/// `12 spots available`, or nothing when unknown.
#[must_use]
pub fn spots_label(event: &Event) -> Option<String> {
    event.available_spots.map(|spots| match spots {
        1 => "1 spot available".to_string(),
        n => format!("{n} spots available"),
    })
}

/// Human label for a ticket status.
#[must_use]
pub const fn ticket_status_label(status: TicketStatus) -> &'static str {
    match status {
        TicketStatus::Pending => "Pending",
        TicketStatus::Confirmed => "Confirmed",
        TicketStatus::Used => "Used",
        TicketStatus::Cancelled => "Cancelled",
        TicketStatus::Refunded => "Refunded",
    }
}

fn loadable<T>(
    out: &mut String,
    data: &Loadable<T>,
    loading: &str,
    empty: &str,
    populated: impl FnOnce(&mut String, &T),
) {
    match data {
        Loadable::Idle => {},
        Loadable::Loading => {
            let _ = writeln!(out, "{loading}");
        },
        Loadable::Error(message) => {
            let _ = writeln!(out, "Something went wrong: {message}");
        },
        Loadable::Empty => {
            let _ = writeln!(out, "{empty}");
        },
        Loadable::Populated(value) => populated(out, value),
    }
}

fn event_card(out: &mut String, event: &Event) {
    let _ = writeln!(out, "[{}] {}", event.id, event.title);
    let _ = writeln!(out, "    When:  {}", format_date(event.start_datetime));
    let _ = writeln!(out, "    Where: {}", venue_label(event));
    if let Some(spots) = spots_label(event) {
        let _ = writeln!(out, "    {spots}");
    }
    if event.featured {
        let _ = writeln!(out, "    * Featured event");
    }
    if !event.short_description.is_empty() {
        let _ = writeln!(out, "    {}", event.short_description);
    }
    let _ = writeln!(out, "    Price: {}", format_price(event.base_price));
}

fn ticket_card(out: &mut String, ticket: &Ticket) {
    let _ = writeln!(
        out,
        "[{}] {} ({})",
        ticket.id,
        ticket.event.title,
        ticket_status_label(ticket.status)
    );
    let _ = writeln!(out, "    Ticket: {}", ticket.ticket_number);
    let _ = writeln!(out, "    When:   {}", format_date(ticket.event.start_datetime));
    let _ = writeln!(out, "    Where:  {}", venue_label(&ticket.event));
    let _ = writeln!(out, "    Guests: {}", ticket.participants_count);
    if !ticket.participant_names.is_empty() {
        let _ = writeln!(out, "    Names:  {}", ticket.participant_names.join(", "));
    }
    let _ = writeln!(out, "    Total:  {}", format_price(ticket.total_price));
}

fn venue_card(out: &mut String, venue: &Location) {
    let _ = writeln!(out, "[{}] {}", venue.id, venue.name);
    if !venue.city.is_empty() {
        let _ = writeln!(out, "    City:     {}", venue.city);
    }
    if !venue.address.is_empty() {
        let _ = writeln!(out, "    Address:  {}", venue.address);
    }
    let _ = writeln!(out, "    Capacity: {}", venue.capacity);
    let amenities = venue.amenities();
    if !amenities.is_empty() {
        let _ = writeln!(out, "    Amenities: {}", amenities.join(", "));
    }
}

/// Validation errors, page-level first.
#[must_use]
pub fn form_errors(errors: &FormErrors) -> String {
    let mut out = String::new();
    if let Some(general) = &errors.general {
        let _ = writeln!(out, "{general}");
    }
    for (field, message) in errors.iter() {
        let _ = writeln!(out, "  {field}: {message}");
    }
    out
}

/// Landing page.
#[must_use]
pub fn home(state: &HomeState) -> String {
    let mut out = format!("{HERO_TITLE}\n{HERO_SUBTITLE}\n\nFeatured events\n");
    loadable(
        &mut out,
        &state.featured,
        "Loading events...",
        "No events available yet. New ones are coming soon.",
        |out, events| events.iter().for_each(|event| event_card(out, event)),
    );
    out
}

/// Event catalog.
#[must_use]
pub fn events(state: &EventsState) -> String {
    let mut out = format!("All events (page {})\n", state.page());
    if state.refreshing {
        out.push_str("Refreshing...\n");
    }
    loadable(
        &mut out,
        &state.events,
        "Loading events...",
        "No events available. Check back soon.",
        |out, events| events.iter().for_each(|event| event_card(out, event)),
    );
    if state.events.populated().is_some() {
        let _ = writeln!(out, "{} events in total", state.total);
        if state.has_next {
            let _ = writeln!(out, "More on page {}", state.page() + 1);
        }
    }
    out
}

/// Dashboard.
#[must_use]
pub fn dashboard(state: &DashboardState) -> String {
    let mut out = String::new();
    loadable(
        &mut out,
        &state.data,
        "Loading your information...",
        "",
        |out, data| {
            let user = &data.user;
            let _ = writeln!(out, "Welcome, {}!", user.display_name());
            let _ = writeln!(out, "  Email: {}", user.email);
            if !user.phone_number.is_empty() {
                let _ = writeln!(out, "  Phone: {}", user.phone_number);
            }
            let _ = writeln!(out, "\nRecommended events");
            if data.featured.is_empty() {
                let _ = writeln!(out, "No events available.");
            }
            data.featured.iter().for_each(|event| event_card(out, event));
        },
    );
    out
}

/// The customer's tickets.
#[must_use]
pub fn tickets(state: &TicketsState) -> String {
    let mut out = String::from("My tickets\n");
    if let Some(notice) = &state.notice {
        let _ = writeln!(out, "{notice}");
    }
    loadable(
        &mut out,
        &state.tickets,
        "Loading tickets...",
        "You have no tickets yet. Browse events to get started.",
        |out, tickets| tickets.iter().for_each(|ticket| ticket_card(out, ticket)),
    );
    out
}

/// Venue list.
#[must_use]
pub fn venues(state: &VenuesState) -> String {
    let mut out = String::from("Venues\n");
    loadable(
        &mut out,
        &state.venues,
        "Loading venues...",
        "No venues available.",
        |out, venues| venues.iter().for_each(|venue| venue_card(out, venue)),
    );
    out
}

/// Purchase outcome.
#[must_use]
pub fn purchase(state: &PurchaseState) -> String {
    let mut out = String::new();
    match &state.ticket {
        Some(ticket) => {
            out.push_str("Purchase complete\n");
            ticket_card(&mut out, ticket);
        },
        None => out.push_str(&form_errors(&state.errors)),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{sample_event, sample_ticket, sample_venue};
    use crate::pages::dashboard::DashboardData;
    use casaroja_session::mocks::sample_user;

    #[test]
    fn prices_use_clp_grouping() {
        assert_eq!(format_price(Money(0.0)), "Free");
        assert_eq!(format_price(Money(500.0)), "$500");
        assert_eq!(format_price(Money(15_000.0)), "$15.000");
        assert_eq!(format_price(Money(1_234_567.4)), "$1.234.567");
        assert_eq!(format_price(Money(999.6)), "$1.000");
    }

    #[test]
    fn amounts_below_half_a_peso_are_free() {
        assert_eq!(format_price(Money(0.4)), "Free");
        assert_eq!(format_price(Money(-0.3)), "Free");
        assert_eq!(format_price(Money(0.5)), "$1");
    }

    #[test]
    fn dates_are_spelled_out() {
        assert_eq!(format_date(sample_event(1).start_datetime), "1 March 2025, 18:00");
    }

    #[test]
    fn missing_venue_has_placeholder() {
        let mut event = sample_event(1);
        assert_eq!(venue_label(&event), "Venue to be confirmed");
        event.location = Some(sample_venue(2));
        assert_eq!(venue_label(&event), "Venue 2");
    }

    #[test]
    fn event_card_shows_badge_spots_and_price() {
        let mut event = sample_event(4);
        event.featured = true;
        let state = HomeState {
            featured: Loadable::Populated(vec![event]),
            ..HomeState::default()
        };

        let text = home(&state);
        assert!(text.contains("12 spots available"));
        assert!(text.contains("* Featured event"));
        assert!(text.contains("$15.000"));
    }

    #[test]
    fn dashboard_lists_each_event_once() {
        let state = DashboardState {
            data: Loadable::Populated(DashboardData {
                user: sample_user(),
                featured: vec![sample_event(1), sample_event(2), sample_event(3)],
            }),
            ..DashboardState::default()
        };

        let text = dashboard(&state);
        assert!(text.starts_with("Welcome, Ana Rojas!"));
        assert_eq!(text.matches("Price:").count(), 3);
    }

    #[test]
    fn ticket_status_is_labelled() {
        let state = TicketsState {
            tickets: Loadable::Populated(vec![sample_ticket(3)]),
            ..TicketsState::default()
        };
        let text = tickets(&state);
        assert!(text.contains("(Confirmed)"));
        assert!(text.contains("Ana, Luis"));
        assert!(text.contains("$30.000"));
    }

    #[test]
    fn venue_amenities_are_listed() {
        let state = VenuesState {
            venues: Loadable::Populated(vec![sample_venue(1)]),
            ..VenuesState::default()
        };
        assert!(venues(&state).contains("Amenities: Parking"));
    }

    #[test]
    fn empty_and_error_states_render() {
        let empty = VenuesState {
            venues: Loadable::Empty,
            ..VenuesState::default()
        };
        assert!(venues(&empty).contains("No venues available."));

        let failed = TicketsState {
            tickets: Loadable::Error("Could not load your tickets.".into()),
            ..TicketsState::default()
        };
        assert!(tickets(&failed).contains("Something went wrong: Could not load your tickets."));
    }
}
