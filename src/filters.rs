// src/filters.rs
//! Filter and sort engines over normalized reviews.
//!
//! Both are pure: they never mutate their input and return fresh vectors.
//! Filtering preserves the original relative order; sorting is stable, so
//! ties keep their incoming order.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::review::{
    FilterOptions, NormalizedReview, SortDirection, SortField, SortOptions,
};

/// Apply every populated criterion with AND semantics: a review survives
/// only if it passes each present predicate independently.
pub fn filter_reviews(reviews: &[NormalizedReview], filters: &FilterOptions) -> Vec<NormalizedReview> {
    reviews
        .iter()
        .filter(|review| passes(review, filters))
        .cloned()
        .collect()
}

fn passes(review: &NormalizedReview, filters: &FilterOptions) -> bool {
    // Rating range only constrains numeric ratings; absent ratings pass.
    if let (Some(range), Some(rating)) = (&filters.rating, review.rating) {
        if rating < range.min || rating > range.max {
            return false;
        }
    }

    // At least one of the review's category names must be requested.
    if let Some(wanted) = &filters.category {
        if !wanted.is_empty()
            && !review
                .categories
                .iter()
                .any(|c| wanted.iter().any(|w| w == &c.category))
        {
            return false;
        }
    }

    if let Some(channels) = &filters.channel {
        if !channels.is_empty() && !channels.iter().any(|c| c == &review.channel) {
            return false;
        }
    }

    // Malformed review timestamps never satisfy a bound, so they are
    // silently excluded; a malformed bound constrains nothing.
    if let Some(range) = &filters.date_range {
        let instant = review.instant();
        if !within(instant, crate::review::parse_instant(&range.start), crate::review::parse_instant(&range.end)) {
            return false;
        }
    }

    if let Some(listing_id) = &filters.listing_id {
        if &review.property_id != listing_id {
            return false;
        }
    }

    if let Some(approved) = filters.approved {
        if review.manager_approved != approved {
            return false;
        }
    }

    true
}

fn within(
    instant: Option<DateTime<Utc>>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> bool {
    let Some(t) = instant else {
        return false;
    };
    if let Some(s) = start {
        if t < s {
            return false;
        }
    }
    if let Some(e) = end {
        if t > e {
            return false;
        }
    }
    true
}

/// Return a new, stably sorted sequence. Absent ratings compare as 0,
/// absent guest names as the empty string, unparsable dates as equal to
/// everything (so their relative order is preserved).
pub fn sort_reviews(reviews: &[NormalizedReview], sort: &SortOptions) -> Vec<NormalizedReview> {
    let mut out = reviews.to_vec();
    out.sort_by(|a, b| {
        let ord = match sort.field {
            SortField::Rating => cmp_f64(a.rating.unwrap_or(0.0), b.rating.unwrap_or(0.0)),
            SortField::Date => cmp_instant(a.instant(), b.instant()),
            SortField::GuestName => a
                .guest_name
                .as_deref()
                .unwrap_or("")
                .cmp(b.guest_name.as_deref().unwrap_or("")),
            SortField::ListingName => a.listing_name.cmp(&b.listing_name),
        };
        match sort.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    out
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn cmp_instant(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        // An invalid instant compares equal to anything; stability keeps
        // the incoming order.
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::{CategoryRating, RatingRange};

    fn review(id: &str, rating: Option<f64>, channel: &str, ts: &str) -> NormalizedReview {
        NormalizedReview {
            id: id.into(),
            property_id: "prop-1".into(),
            listing_name: "Shoreditch Loft".into(),
            channel: channel.into(),
            rating,
            categories: Vec::new(),
            text: None,
            submitted_at: ts.into(),
            guest_name: None,
            manager_approved: false,
        }
    }

    #[test]
    fn rating_range_lets_null_ratings_through() {
        let reviews = vec![
            review("a", Some(2.0), "hostaway", "2024-01-01T00:00:00Z"),
            review("b", None, "hostaway", "2024-01-02T00:00:00Z"),
            review("c", Some(4.5), "hostaway", "2024-01-03T00:00:00Z"),
        ];
        let filters = FilterOptions {
            rating: Some(RatingRange { min: 4.0, max: 5.0 }),
            ..Default::default()
        };
        let out = filter_reviews(&reviews, &filters);
        let ids: Vec<&str> = out.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn empty_category_set_is_no_constraint() {
        let mut r = review("a", Some(4.0), "hostaway", "2024-01-01T00:00:00Z");
        r.categories = vec![CategoryRating {
            category: "cleanliness".into(),
            rating: 5.0,
        }];
        let filters = FilterOptions {
            category: Some(Vec::new()),
            ..Default::default()
        };
        assert_eq!(filter_reviews(&[r], &filters).len(), 1);
    }

    #[test]
    fn category_filter_matches_any_entry() {
        let mut a = review("a", Some(4.0), "hostaway", "2024-01-01T00:00:00Z");
        a.categories = vec![
            CategoryRating { category: "cleanliness".into(), rating: 5.0 },
            CategoryRating { category: "location".into(), rating: 4.0 },
        ];
        let b = review("b", Some(4.0), "hostaway", "2024-01-02T00:00:00Z");
        let filters = FilterOptions {
            category: Some(vec!["location".into()]),
            ..Default::default()
        };
        let out = filter_reviews(&[a, b], &filters);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "a");
    }

    #[test]
    fn date_range_excludes_malformed_timestamps() {
        let reviews = vec![
            review("a", Some(4.0), "hostaway", "2024-01-15T00:00:00Z"),
            review("b", Some(4.0), "hostaway", "not-a-date"),
        ];
        let filters = FilterOptions {
            date_range: Some(crate::review::DateRange {
                start: "2024-01-01T00:00:00Z".into(),
                end: "2024-12-31T23:59:59Z".into(),
            }),
            ..Default::default()
        };
        let out = filter_reviews(&reviews, &filters);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "a");
    }

    #[test]
    fn malformed_bound_constrains_nothing() {
        let reviews = vec![review("a", Some(4.0), "hostaway", "2024-01-15T00:00:00Z")];
        let filters = FilterOptions {
            date_range: Some(crate::review::DateRange {
                start: "whenever".into(),
                end: "2024-12-31T23:59:59Z".into(),
            }),
            ..Default::default()
        };
        assert_eq!(filter_reviews(&reviews, &filters).len(), 1);
    }

    #[test]
    fn filter_by_listing_id() {
        let mut c = review("c", Some(5.0), "google", "2024-01-20T00:00:00Z");
        c.property_id = "prop-2".into();
        let reviews = vec![
            review("a", Some(4.5), "hostaway", "2024-01-15T00:00:00Z"),
            review("b", Some(3.0), "airbnb", "2024-01-10T00:00:00Z"),
            c,
        ];
        let filters = FilterOptions {
            listing_id: Some("prop-1".into()),
            ..Default::default()
        };
        let out = filter_reviews(&reviews, &filters);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.property_id == "prop-1"));
    }

    #[test]
    fn conjunction_of_channel_and_approval() {
        let mut a = review("a", Some(4.0), "airbnb", "2024-01-01T00:00:00Z");
        a.manager_approved = true;
        let b = review("b", Some(4.0), "airbnb", "2024-01-02T00:00:00Z");
        let mut c = review("c", Some(4.0), "google", "2024-01-03T00:00:00Z");
        c.manager_approved = true;
        let filters = FilterOptions {
            channel: Some(vec!["airbnb".into()]),
            approved: Some(true),
            ..Default::default()
        };
        let out = filter_reviews(&[a, b, c], &filters);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "a");
    }

    #[test]
    fn filter_preserves_relative_order() {
        let reviews = vec![
            review("a", Some(5.0), "hostaway", "2024-01-03T00:00:00Z"),
            review("b", Some(4.0), "hostaway", "2024-01-01T00:00:00Z"),
            review("c", Some(3.0), "hostaway", "2024-01-02T00:00:00Z"),
        ];
        let out = filter_reviews(&reviews, &FilterOptions::default());
        let ids: Vec<&str> = out.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn sort_by_rating_asc_then_desc() {
        let reviews = vec![
            review("a", Some(4.5), "hostaway", "2024-01-01T00:00:00Z"),
            review("b", Some(3.0), "hostaway", "2024-01-02T00:00:00Z"),
            review("c", Some(5.0), "hostaway", "2024-01-03T00:00:00Z"),
        ];
        let asc = sort_reviews(
            &reviews,
            &SortOptions { field: SortField::Rating, direction: SortDirection::Asc },
        );
        let ratings: Vec<f64> = asc.iter().filter_map(|r| r.rating).collect();
        assert_eq!(ratings, vec![3.0, 4.5, 5.0]);

        let desc = sort_reviews(
            &reviews,
            &SortOptions { field: SortField::Rating, direction: SortDirection::Desc },
        );
        let ratings: Vec<f64> = desc.iter().filter_map(|r| r.rating).collect();
        assert_eq!(ratings, vec![5.0, 4.5, 3.0]);
    }

    #[test]
    fn sort_treats_missing_rating_as_zero() {
        let reviews = vec![
            review("a", Some(2.0), "hostaway", "2024-01-01T00:00:00Z"),
            review("b", None, "hostaway", "2024-01-02T00:00:00Z"),
        ];
        let asc = sort_reviews(
            &reviews,
            &SortOptions { field: SortField::Rating, direction: SortDirection::Asc },
        );
        assert_eq!(asc[0].id, "b");
    }

    #[test]
    fn sort_does_not_mutate_input() {
        let reviews = vec![
            review("a", Some(5.0), "hostaway", "2024-01-01T00:00:00Z"),
            review("b", Some(1.0), "hostaway", "2024-01-02T00:00:00Z"),
        ];
        let _ = sort_reviews(
            &reviews,
            &SortOptions { field: SortField::Rating, direction: SortDirection::Asc },
        );
        assert_eq!(reviews[0].id, "a");
    }

    #[test]
    fn sort_by_date_is_chronological() {
        let reviews = vec![
            review("a", Some(4.0), "hostaway", "2024-03-01T00:00:00Z"),
            review("b", Some(4.0), "hostaway", "2024-01-01T00:00:00Z"),
            review("c", Some(4.0), "hostaway", "2024-02-01T00:00:00Z"),
        ];
        let asc = sort_reviews(
            &reviews,
            &SortOptions { field: SortField::Date, direction: SortDirection::Asc },
        );
        let ids: Vec<&str> = asc.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn sort_by_date_keeps_order_when_all_invalid() {
        let reviews = vec![
            review("a", Some(4.0), "hostaway", "bogus"),
            review("b", Some(4.0), "hostaway", "also bogus"),
        ];
        let asc = sort_reviews(
            &reviews,
            &SortOptions { field: SortField::Date, direction: SortDirection::Asc },
        );
        let ids: Vec<&str> = asc.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
