// src/dimensions.rs
//! Dimension projections used by the dashboard filter controls:
//! distinct channels, distinct listings, and the 1–5 rating histogram.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::review::NormalizedReview;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingRef {
    pub id: String,
    pub name: String,
}

/// Alphabetically sorted distinct channel tags.
pub fn unique_channels(reviews: &[NormalizedReview]) -> Vec<String> {
    let mut channels: Vec<String> = Vec::new();
    for review in reviews {
        if !channels.iter().any(|c| c == &review.channel) {
            channels.push(review.channel.clone());
        }
    }
    channels.sort();
    channels
}

/// Alphabetically sorted distinct category names across all reviews.
pub fn unique_categories(reviews: &[NormalizedReview]) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for review in reviews {
        for cat in &review.categories {
            if !categories.iter().any(|c| c == &cat.category) {
                categories.push(cat.category.clone());
            }
        }
    }
    categories.sort();
    categories
}

/// One entry per distinct `property_id`, in first-insertion order.
/// When duplicates carry diverging names, the last-seen name wins —
/// deterministic, and documented rather than enforced (the schema assumes
/// a 1:1 id↔name mapping per snapshot).
pub fn unique_listings(reviews: &[NormalizedReview]) -> Vec<ListingRef> {
    let mut order: Vec<ListingRef> = Vec::new();
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for review in reviews {
        match seen.get(review.property_id.as_str()) {
            Some(&idx) => order[idx].name = review.listing_name.clone(),
            None => {
                seen.insert(review.property_id.as_str(), order.len());
                order.push(ListingRef {
                    id: review.property_id.clone(),
                    name: review.listing_name.clone(),
                });
            }
        }
    }
    order
}

/// Histogram of ratings rounded to the nearest integer star. All five
/// buckets are always present; ratings rounding outside 1..=5 and absent
/// ratings are dropped.
pub fn rating_distribution(reviews: &[NormalizedReview]) -> BTreeMap<u8, usize> {
    let mut distribution: BTreeMap<u8, usize> = (1..=5).map(|star| (star, 0)).collect();
    for review in reviews {
        let Some(rating) = review.rating else { continue };
        let rounded = rating.round();
        if (1.0..=5.0).contains(&rounded) {
            *distribution.entry(rounded as u8).or_insert(0) += 1;
        }
    }
    distribution
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(id: &str, property_id: &str, name: &str, channel: &str, rating: Option<f64>) -> NormalizedReview {
        NormalizedReview {
            id: id.into(),
            property_id: property_id.into(),
            listing_name: name.into(),
            channel: channel.into(),
            rating,
            categories: Vec::new(),
            text: None,
            submitted_at: "2024-01-01T00:00:00Z".into(),
            guest_name: None,
            manager_approved: false,
        }
    }

    #[test]
    fn channels_are_sorted_and_distinct() {
        let reviews = vec![
            review("1", "p1", "A", "hostaway", None),
            review("2", "p1", "A", "airbnb", None),
            review("3", "p2", "B", "hostaway", None),
        ];
        assert_eq!(unique_channels(&reviews), vec!["airbnb", "hostaway"]);
    }

    #[test]
    fn listings_keep_first_insertion_order_and_last_name() {
        let reviews = vec![
            review("1", "p2", "Beta", "hostaway", None),
            review("2", "p1", "Alpha", "hostaway", None),
            review("3", "p2", "Beta Renamed", "hostaway", None),
        ];
        let listings = unique_listings(&reviews);
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].id, "p2");
        assert_eq!(listings[0].name, "Beta Renamed");
        assert_eq!(listings[1].id, "p1");
    }

    #[test]
    fn distribution_has_all_buckets_and_rounds() {
        let reviews = vec![
            review("1", "p1", "A", "hostaway", Some(4.5)), // rounds to 5
            review("2", "p1", "A", "hostaway", Some(4.4)), // rounds to 4
            review("3", "p1", "A", "hostaway", Some(0.3)), // rounds to 0, dropped
            review("4", "p1", "A", "hostaway", None),      // dropped
        ];
        let dist = rating_distribution(&reviews);
        assert_eq!(dist.len(), 5);
        assert_eq!(dist[&5], 1);
        assert_eq!(dist[&4], 1);
        assert_eq!(dist[&1] + dist[&2] + dist[&3], 0);
    }

    #[test]
    fn empty_input_yields_zeroed_buckets() {
        let dist = rating_distribution(&[]);
        assert_eq!(dist.values().sum::<usize>(), 0);
        assert_eq!(dist.len(), 5);
    }
}
