//! Sample items for a fresh catalog.

use super::{ItemRequest, ItemStatus};

/// Two sample items, one owned and one wished for.
pub fn sample_items() -> Vec<ItemRequest> {
    let mut spider_man = ItemRequest::new("Spider-Man: The Definitive Collection", "1", "Marvel");
    spider_man.series = Some("Spider-Man".to_string());
    spider_man.language = Some("Portuguese".to_string());
    spider_man.condition = Some("Excellent".to_string());
    spider_man.location = Some("Shelf A".to_string());
    spider_man.description = Some("Hardcover collector's edition with extras.".to_string());
    spider_man.status = ItemStatus::Owned;
    spider_man.tags = vec![
        "marvel".to_string(),
        "spider-man".to_string(),
        "collection".to_string(),
    ];

    let mut year_one = ItemRequest::new("Batman: Year One", "1", "DC Comics");
    year_one.series = Some("Batman".to_string());
    year_one.language = Some("Portuguese".to_string());
    year_one.condition = Some("Good".to_string());
    year_one.location = Some("Shelf B".to_string());
    year_one.description =
        Some("The classic that redefined the Dark Knight's origin.".to_string());
    year_one.status = ItemStatus::Wishlist;
    year_one.tags = vec!["dc".to_string(), "frank miller".to_string()];

    vec![spider_man, year_one]
}
