//! Site knowledge, kept as data: every selector the engine tries and the
//! order it tries them in. Markup drift means adding an alternative here,
//! not touching extraction logic.

use crate::browser::script::CardProbe;
use crate::extract::cascade::SelectorGroup;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Phrases the site uses to announce an empty result set, one per locale.
/// These seed the config default and can be overridden there.
pub fn zero_result_markers() -> Vec<String> {
    strings(&[
        "0 Offers for your search",
        "0 Aanbiedingen voor je zoekopdracht",
        "0 Offres pour votre recherche",
    ])
}

/// Cookie-consent accept buttons, most specific first
pub fn consent_buttons() -> Vec<SelectorGroup> {
    vec![
        SelectorGroup::new(
            "site",
            &[
                "button._consent-accept-all",
                "button[data-testid='as24-cmp-accept-all']",
            ],
        ),
        SelectorGroup::new(
            "generic",
            &[
                "#onetrust-accept-btn-handler",
                "button[data-testid='uc-accept-all-button']",
            ],
        ),
    ]
}

/// Listing-card containers on a search-results page
pub fn listing_cards() -> Vec<SelectorGroup> {
    vec![
        SelectorGroup::new("precise", &["article.cldt-summary-full-item"]),
        SelectorGroup::new(
            "redesign",
            &[
                "article[class*='ListItem_article']",
                "div[class*='ListItem_wrapper']",
            ],
        ),
    ]
}

/// Preview lookups inside one listing card
pub fn card_probe() -> CardProbe {
    CardProbe {
        link: strings(&[
            "a[class*='ListItem_title']",
            "a[href*='/aanbod/']",
            "a[href*='/offres/']",
            "a[href*='/angebote/']",
            "a[href*='/offers/']",
        ]),
        title: strings(&[
            "h2",
            "span.cldt-summary-makemodel",
            "[class*='ListItem_version']",
        ]),
        price: strings(&[
            "[class*='Price_price']",
            "p[data-testid='regular-price']",
            "span.cldt-price",
        ]),
        mileage: strings(&[
            "span[data-testid='VehicleDetails-mileage']",
            "li[class*='VehicleDetails_itemMileage']",
            ".cldt-summary-vehicle-data li:nth-child(1)",
        ]),
        year: strings(&[
            "span[data-testid='VehicleDetails-calendar']",
            "li[class*='VehicleDetails_itemYear']",
            ".cldt-summary-vehicle-data li:nth-child(3)",
        ]),
    }
}

pub fn detail_title() -> Vec<SelectorGroup> {
    vec![
        SelectorGroup::new("precise", &["h1[class*='StageTitle_title']"]),
        SelectorGroup::new(
            "alternate",
            &["h1.cldt-detail-title", "div.stage-headline h1"],
        ),
    ]
}

pub fn detail_price() -> Vec<SelectorGroup> {
    vec![
        SelectorGroup::new("precise", &["span[class*='PriceInfo_price']"]),
        SelectorGroup::new(
            "alternate",
            &["[data-testid='price-section'] span", "div.cldt-price h2"],
        ),
    ]
}

pub fn detail_mileage() -> Vec<SelectorGroup> {
    vec![
        SelectorGroup::new(
            "precise",
            &["[data-testid='mileage-road'] [class*='VehicleOverview_itemText']"],
        ),
        SelectorGroup::new(
            "alternate",
            &[
                "span[data-testid='overview-mileage']",
                "div.cldt-stage-basic-data > div:nth-of-type(1)",
            ],
        ),
    ]
}

pub fn detail_transmission() -> Vec<SelectorGroup> {
    vec![
        SelectorGroup::new(
            "precise",
            &["[data-testid='transmission'] [class*='VehicleOverview_itemText']"],
        ),
        SelectorGroup::new(
            "alternate",
            &[
                "span[data-testid='overview-transmission']",
                "dl.cldt-data-section dd.transmission",
            ],
        ),
    ]
}

pub fn detail_year() -> Vec<SelectorGroup> {
    vec![
        SelectorGroup::new(
            "precise",
            &["[data-testid='first-registration'] [class*='VehicleOverview_itemText']"],
        ),
        SelectorGroup::new(
            "alternate",
            &[
                "span[data-testid='overview-registration']",
                "div.cldt-stage-basic-data > div:nth-of-type(2)",
            ],
        ),
    ]
}

pub fn detail_fuel() -> Vec<SelectorGroup> {
    vec![
        SelectorGroup::new(
            "precise",
            &["[data-testid='fuel-type'] [class*='VehicleOverview_itemText']"],
        ),
        SelectorGroup::new(
            "alternate",
            &["span[data-testid='overview-fuel']", "dd.cldt-fuel-type"],
        ),
    ]
}

pub fn detail_power() -> Vec<SelectorGroup> {
    vec![
        SelectorGroup::new(
            "precise",
            &["[data-testid='power'] [class*='VehicleOverview_itemText']"],
        ),
        SelectorGroup::new(
            "alternate",
            &["span[data-testid='overview-power']", "dd.cldt-power"],
        ),
    ]
}

pub fn detail_location() -> Vec<SelectorGroup> {
    vec![
        SelectorGroup::new("precise", &["[data-testid='seller-address']"]),
        SelectorGroup::new(
            "alternate",
            &[
                "a[class*='LocationWithPin_link']",
                "div.cldt-vendor-contact-box address",
            ],
        ),
    ]
}

pub fn detail_seller() -> Vec<SelectorGroup> {
    vec![
        SelectorGroup::new("precise", &["[data-testid='seller-name']"]),
        SelectorGroup::new(
            "alternate",
            &[
                "div[class*='RatingsAndCompanyName_dealer']",
                "div.cldt-vendor-name",
            ],
        ),
    ]
}

pub fn detail_image() -> Vec<SelectorGroup> {
    vec![
        SelectorGroup::new("precise", &["img[class*='ImageGallery_image']"]),
        SelectorGroup::new(
            "alternate",
            &["div.image-gallery-slides img", "img.gallery-picture-image"],
        ),
    ]
}

/// Controls that reveal the seller's phone number when clicked
pub fn phone_reveal() -> Vec<SelectorGroup> {
    vec![
        SelectorGroup::new("precise", &["button[data-testid='call-seller-button']"]),
        SelectorGroup::new(
            "alternate",
            &["a[class*='CallButton_button']", "button.call-now-button"],
        ),
    ]
}

/// Where the revealed number ends up
pub fn phone_text() -> Vec<SelectorGroup> {
    vec![
        SelectorGroup::new("precise", &["[data-testid='revealed-phone-number']"]),
        SelectorGroup::new(
            "alternate",
            &["a[href^='tel:']", "div[class*='PhoneNumber_wrapper']"],
        ),
    ]
}

// Keyword table for the fuel-type URL heuristic; checked in order, so the
// hybrid entries must come before the plain fuel names they may accompany
const FUEL_URL_KEYWORDS: &[(&str, &str)] = &[
    ("hybride", "Hybride"),
    ("hybrid", "Hybride"),
    ("elektr", "Elektrisch"),
    ("electr", "Elektrisch"),
    ("diesel", "Diesel"),
    ("benzine", "Benzine"),
    ("essence", "Benzine"),
    ("petrol", "Benzine"),
    ("gasoline", "Benzine"),
    ("lpg", "LPG"),
    ("cng", "CNG"),
];

/// Guess the fuel type from keywords in the listing URL; empty when nothing matches
pub fn fuel_type_from_url(url: &str) -> String {
    let url = url.to_lowercase();
    for (keyword, label) in FUEL_URL_KEYWORDS {
        if url.contains(keyword) {
            return label.to_string();
        }
    }
    String::new()
}
