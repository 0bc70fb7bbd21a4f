mod common;

use chrono::Local;
use common::MockNode;
use grev::extract::{extract_dialog, extract_full_screen, selectors, ExtractContext, Extracted};
use grev::params::StopCriterion;

fn ctx() -> ExtractContext<'static> {
    ExtractContext {
        stop_criterion: None,
        window_idx: 1,
        offset: 1,
        now: Local::now(),
    }
}

fn text_block(lines: &[&str]) -> MockNode {
    MockNode {
        texts: lines.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

fn google_review_node() -> MockNode {
    MockNode::default()
        .child(
            selectors::FS_GOOGLE_AUTHOR,
            MockNode::with_text("Jane Roe").attr("href", "https://maps.google.com/contrib/42"),
        )
        .child(selectors::FS_RATING_OF_5, MockNode::with_text("4/5"))
        .child(
            selectors::FS_TEXT_BLOCK,
            text_block(&["Great stay!", "Rooms", "4.0", "Service", "5.0"]),
        )
        .child(
            selectors::POSTED_ON_SITE,
            MockNode::with_text("2 weeks ago on Google"),
        )
}

#[test]
fn test_google_review_assembly() {
    let node = google_review_node();

    let Extracted::Record(record) = extract_full_screen(&node, &ctx()).unwrap() else {
        panic!("expected a record");
    };

    assert_eq!(record.username, "Jane Roe");
    assert_eq!(
        record.user_profile_url.as_deref(),
        Some("https://maps.google.com/contrib/42")
    );
    assert_eq!(record.rating_score, 4.0);
    assert_eq!(record.rating_scale, 5.0);
    assert_eq!(record.review_text_original.as_deref(), Some("Great stay!"));
    assert_eq!(record.review_text_localized, None);
    assert_eq!(record.rating_tags.as_deref(), Some("Rooms 4.0, Service 5.0,"));
    assert_eq!(record.posted_at_humanized, "2 weeks");
    assert!(record.posted_at_absolute.is_some());
    assert_eq!(record.source_site.as_deref(), Some("Google"));
    assert!(record.is_google_review());
    assert!(record.image_urls.is_empty());
}

#[test]
fn test_gallery_thumbnails_are_upscaled() {
    let gallery_probe = MockNode {
        visible: true,
        ..Default::default()
    };
    let node = google_review_node()
        .child(selectors::FS_IMAGES, gallery_probe)
        .child_list(
            selectors::FS_IMAGES,
            vec![
                MockNode::default()
                    .attr("src", "https://lh5.googleusercontent.com/p/a=w100-h100-k-no-p"),
                MockNode::default()
                    .attr("data-src", "https://lh5.googleusercontent.com/p/b=w120-h90-k-no-p"),
            ],
        );

    let Extracted::Record(record) = extract_full_screen(&node, &ctx()).unwrap() else {
        panic!("expected a record");
    };

    assert_eq!(
        record.image_urls,
        vec![
            "https://lh5.googleusercontent.com/p/a=w800-h800",
            "https://lh5.googleusercontent.com/p/b=w800-h800",
        ]
    );
}

#[test]
fn test_other_site_review_uses_ten_point_scale() {
    let node = MockNode::default()
        .child(selectors::FS_OTHER_AUTHOR, MockNode::with_text("John Smith"))
        .child(selectors::FS_RATING_OF_10, MockNode::with_text("9/10"))
        .child(
            selectors::FS_TEXT_BLOCK,
            text_block(&["Comfortable and clean."]),
        )
        .child(selectors::POSTED_PLAIN, MockNode::with_text("3 months ago"));

    let Extracted::Record(record) = extract_full_screen(&node, &ctx()).unwrap() else {
        panic!("expected a record");
    };

    assert_eq!(record.username, "John Smith");
    assert_eq!(record.user_profile_url, None);
    assert_eq!(record.rating_scale, 10.0);
    assert_eq!(record.posted_at_humanized, "3 months ago");
    assert_eq!(record.source_site, None);
    assert!(!record.is_google_review());
}

#[test]
fn test_stop_criterion_signals_instead_of_extracting() {
    let mut node = google_review_node();
    node.text = Some("Jane Roe\n4/5\nWhat a great pool this place has".to_string());

    let criterion = StopCriterion {
        username: "jane roe".to_string(),
        review_text: "great pool".to_string(),
    };
    let ctx = ExtractContext {
        stop_criterion: Some(&criterion),
        window_idx: 1,
        offset: 1,
        now: Local::now(),
    };

    assert!(matches!(
        extract_full_screen(&node, &ctx).unwrap(),
        Extracted::StopCriterionMet
    ));
}

fn visible() -> MockNode {
    MockNode {
        visible: true,
        attached: true,
        ..Default::default()
    }
}

/// A google-path dialog review: three-section review region with a stay-type
/// line, prose glued to its rating tags, and a posted-date node.
fn dialog_google_node() -> MockNode {
    MockNode::default()
        .child(selectors::DLG_GOOGLE_BLOCK, visible())
        .child(
            selectors::DLG_AUTHOR,
            MockNode::with_text("Jane Roe").attr("href", "https://www.google.com/maps/contrib/42"),
        )
        .child(selectors::DLG_RATING, MockNode::with_text("4/5"))
        .child_list(
            "div[1]/div[3]/div/div[1]/div",
            vec![MockNode::default(), MockNode::default(), MockNode::default()],
        )
        .child_list(
            "div[1]/div[3]/div/div[1]/div[2]/span/span/span",
            vec![MockNode::default()],
        )
        .child(
            "div[1]/div[3]/div/div[1]/div[1]",
            MockNode::with_text("Vacation ❘ Family"),
        )
        .child(
            "div[1]/div[3]/div/div[1]/div[2]/span/span/span",
            MockNode::with_text("Lovely pool areaRooms: 4/5"),
        )
        .child(
            selectors::POSTED_ON_SITE,
            MockNode::with_text("a month ago on Google"),
        )
}

#[test]
fn test_dialog_review_with_carousel_shifts_the_owner_response() {
    let node = dialog_google_node()
        .child(selectors::DLG_CAROUSEL, visible())
        .child_list(
            selectors::DLG_CAROUSEL_PHOTOS,
            vec![MockNode::default().attr(
                "style",
                "background-image:url(https://lh5.googleusercontent.com/p/x=w150-h150-p-n-k-no)",
            )],
        )
        .child("div[4]/div/div/div[1]", visible())
        .child(
            "div[4]/div/div/div[1]/div[1]",
            MockNode::with_text("Response from the owner 2 days ago"),
        )
        .child(
            "div[4]/div/div/div[1]/div[2]",
            MockNode::with_text("Thank you!"),
        );

    let Extracted::Record(record) = extract_dialog(&node, &ctx()).unwrap() else {
        panic!("expected a record");
    };

    assert_eq!(record.username, "Jane Roe");
    assert_eq!(
        record.user_profile_url.as_deref(),
        Some("https://www.google.com/maps/contrib/42")
    );
    assert_eq!(record.rating_score, 4.0);
    assert_eq!(record.rating_scale, 5.0);
    assert_eq!(record.stay_type.as_deref(), Some("Vacation ❘ Family"));
    assert_eq!(record.review_text_original.as_deref(), Some("Lovely pool area"));
    assert_eq!(record.review_text_localized, None);
    assert_eq!(record.rating_tags.as_deref(), Some("Rooms: 4/5"));
    assert_eq!(record.posted_at_humanized, "a month");
    assert_eq!(record.source_site.as_deref(), Some("Google"));
    assert!(record.is_google_review());
    assert_eq!(
        record.image_urls,
        vec!["https://lh5.googleusercontent.com/p/x=w800-h800"]
    );
    assert_eq!(record.owner_response_text.as_deref(), Some("Thank you!"));
    assert!(record.owner_response_time.is_some());
}

#[test]
fn test_dialog_review_without_carousel_keeps_the_owner_response_in_place() {
    let node = dialog_google_node()
        .child("div[3]/div/div/div[1]", visible())
        .child(
            "div[3]/div/div/div[1]/div[1]",
            MockNode::with_text("Response from the owner a week ago"),
        )
        .child(
            "div[3]/div/div/div[1]/div[2]",
            MockNode::with_text("We appreciate it."),
        );

    let Extracted::Record(record) = extract_dialog(&node, &ctx()).unwrap() else {
        panic!("expected a record");
    };

    assert!(record.image_urls.is_empty());
    assert_eq!(
        record.owner_response_text.as_deref(),
        Some("We appreciate it.")
    );
    assert!(record.owner_response_time.is_some());
}

#[test]
fn test_dialog_translated_review_splits_localized_and_original() {
    let node = dialog_google_node()
        .child_list(
            "div[1]/div[3]/div/div[2]/div",
            vec![MockNode::default(), MockNode::default()],
        )
        .child_list(
            "div[1]/div[3]/div/div[2]/div[1]/span/span",
            vec![MockNode::default()],
        )
        .child(
            "div[1]/div[3]/div/div[2]/div[1]/span/span",
            MockNode::with_text("Bonjour à tous"),
        );

    let Extracted::Record(record) = extract_dialog(&node, &ctx()).unwrap() else {
        panic!("expected a record");
    };

    assert_eq!(
        record.review_text_localized.as_deref(),
        Some("Lovely pool area")
    );
    assert_eq!(record.review_text_original.as_deref(), Some("Bonjour à tous"));
}

#[test]
fn test_dialog_other_site_review() {
    let node = MockNode::default()
        .child(selectors::DLG_OTHER_AUTHOR, MockNode::with_text("John Smith"))
        .child(
            selectors::DLG_OTHER_DATE,
            MockNode::with_text("3 weeks ago on Agoda"),
        )
        .child(selectors::DLG_OTHER_RATING, MockNode::with_text("8/10"))
        .child(selectors::DLG_OTHER_TEXT, MockNode::with_text("Clean rooms."));

    let Extracted::Record(record) = extract_dialog(&node, &ctx()).unwrap() else {
        panic!("expected a record");
    };

    assert_eq!(record.username, "John Smith");
    assert_eq!(record.posted_at_humanized, "3 weeks");
    assert_eq!(record.rating_score, 8.0);
    assert_eq!(record.rating_scale, 10.0);
    assert_eq!(record.review_text_original.as_deref(), Some("Clean rooms."));
    assert_eq!(record.source_site.as_deref(), Some("other"));
    assert!(!record.is_google_review());
}
