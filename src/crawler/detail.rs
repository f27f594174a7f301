//! Field extraction on a single listing's own page.

use std::time::Duration;

use tracing::debug;

use crate::browser::{script, PageContext};
use crate::config::ExtractionSettings;
use crate::extract::cascade::{self, first_value};
use crate::extract::catalog;

/// Everything a listing page can contribute to a record. Fields the page
/// does not expose stay empty.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DetailFields {
    pub title: String,
    pub price: String,
    pub mileage: String,
    pub transmission: String,
    pub year: String,
    pub fuel_type: String,
    pub power: String,
    pub location: String,
    pub seller: String,
    pub image_url: String,
    pub phone: String,
}

#[derive(Clone)]
pub struct DetailExtractor {
    content_wait: Duration,
    phone_reveal_settle: Duration,
}

impl DetailExtractor {
    pub fn new(settings: &ExtractionSettings) -> Self {
        Self {
            content_wait: Duration::from_millis(settings.content_wait),
            phone_reveal_settle: Duration::from_millis(settings.phone_reveal_settle),
        }
    }

    /// Read every field the page offers. Individual misses are normal and
    /// never fail the listing.
    pub async fn extract(&self, page: &dyn PageContext, listing_url: &str) -> DetailFields {
        // Late hydration: give the title a moment, then read whatever is there
        if let Some(first) = catalog::detail_title().first() {
            let _ = page
                .wait_for_selector(&first.css_union(), self.content_wait)
                .await;
        }

        let mut fields = DetailFields {
            title: first_value(
                cascade::resolve_texts(page, "title", &catalog::detail_title()).await,
            ),
            price: first_value(
                cascade::resolve_texts(page, "price", &catalog::detail_price()).await,
            ),
            mileage: first_value(
                cascade::resolve_texts(page, "mileage", &catalog::detail_mileage()).await,
            ),
            transmission: first_value(
                cascade::resolve_texts(page, "transmission", &catalog::detail_transmission()).await,
            ),
            year: first_value(cascade::resolve_texts(page, "year", &catalog::detail_year()).await),
            fuel_type: first_value(
                cascade::resolve_texts(page, "fuel_type", &catalog::detail_fuel()).await,
            ),
            power: first_value(
                cascade::resolve_texts(page, "power", &catalog::detail_power()).await,
            ),
            location: first_value(
                cascade::resolve_texts(page, "location", &catalog::detail_location()).await,
            ),
            seller: first_value(
                cascade::resolve_texts(page, "seller", &catalog::detail_seller()).await,
            ),
            image_url: first_value(
                cascade::resolve_attrs(page, "image_url", &catalog::detail_image(), "src").await,
            ),
            phone: String::new(),
        };

        if fields.fuel_type.is_empty() {
            fields.fuel_type = catalog::fuel_type_from_url(listing_url);
            if !fields.fuel_type.is_empty() {
                debug!("fuel type '{}' guessed from the listing URL", fields.fuel_type);
            }
        }

        fields.phone = self.reveal_phone(page).await;
        fields
    }

    /// The number is behind a reveal control: find it, click it, wait for
    /// the widget to swap in the digits, then read them. No control on the
    /// page means no number.
    async fn reveal_phone(&self, page: &dyn PageContext) -> String {
        for group in &catalog::phone_reveal() {
            for selector in &group.selectors {
                match script::count(page, selector).await {
                    Ok(0) => continue,
                    Ok(_) => {
                        match page.click(selector).await {
                            Ok(()) => tokio::time::sleep(self.phone_reveal_settle).await,
                            Err(err) => debug!("clicking the phone reveal failed: {}", err),
                        }
                        return first_value(
                            cascade::resolve_texts(page, "phone", &catalog::phone_text()).await,
                        );
                    }
                    Err(err) => debug!("probing for a phone reveal failed: {}", err),
                }
            }
        }
        debug!("no phone reveal control on this listing");
        String::new()
    }
}
