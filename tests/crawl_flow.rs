mod common;

use std::sync::Arc;

use serde_json::json;

use common::{card, drain, fast_config, FakeBrowser, PageScript};
use lotcrawler::browser::{Browser, WaitUntil};
use lotcrawler::config::Config;
use lotcrawler::crawler::{
    CrawlEvent, CrawlJob, CrawlOrchestrator, CrawlRequest, EventSink, VehicleRecord,
};

const SEARCH: &str = "https://cars.example/lst?make=bmw";
const PAGE1: &str = "https://cars.example/lst?make=bmw&page=1";
const PAGE2: &str = "https://cars.example/lst?make=bmw&page=2";

fn orchestrator(config: Config, browser: &FakeBrowser) -> CrawlOrchestrator {
    let browser: Arc<dyn Browser> = Arc::new(browser.clone());
    CrawlOrchestrator::new(config, browser).unwrap()
}

fn request(url: &str, multi_page: bool) -> CrawlRequest {
    CrawlRequest {
        search_url: url.to_string(),
        multi_page,
    }
}

fn snapshots(events: &[CrawlEvent]) -> Vec<Vec<VehicleRecord>> {
    events
        .iter()
        .filter_map(|e| match e {
            CrawlEvent::Snapshot { vehicles } => Some(vehicles.clone()),
            _ => None,
        })
        .collect()
}

fn progress_values(events: &[CrawlEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            CrawlEvent::Progress { value } => Some(*value),
            _ => None,
        })
        .collect()
}

fn has_log(events: &[CrawlEvent], needle: &str) -> bool {
    events
        .iter()
        .any(|e| matches!(e, CrawlEvent::Log { message } if message.contains(needle)))
}

fn search_navigations(browser: &FakeBrowser) -> Vec<(String, WaitUntil)> {
    browser
        .navigations()
        .into_iter()
        .filter(|(url, _)| url.contains("page="))
        .collect()
}

/// Three listings on page one, a zero-offer page two. The first listing has
/// a fully furnished detail page including the phone-reveal flow, the
/// second a sparse one, the third none at all.
fn seed_two_page_site(browser: &FakeBrowser) {
    browser.page(
        PAGE1,
        PageScript::new().respond(
            "cldt-summary-full-item",
            json!([
                card("/aanbod/bmw-318d-1", "BMW 318d", "€ 18.500,-", "120.000 km", "06/2019"),
                card("/aanbod/audi-a4-2", "Audi A4", "€ 21.000,-", "80.000 km", "03/2020"),
                card("/aanbod/vw-golf-diesel-3", "VW Golf", "€ 15.000,-", "95.000 km", "01/2018"),
            ]),
        ),
    );
    browser.page(
        "https://cars.example/aanbod/bmw-318d-1",
        PageScript::new()
            .respond("StageTitle_title", json!(["BMW 318d Touring"]))
            .respond("PriceInfo_price", json!(["€ 18.500,-"]))
            .respond("mileage-road", json!(["120.000 km"]))
            .respond("data-testid='transmission'", json!(["Automaat"]))
            .respond("first-registration", json!(["06/2019"]))
            .respond("fuel-type", json!(["Diesel"]))
            .respond("data-testid='power'", json!(["110 kW (150 PK)"]))
            .respond("seller-address", json!(["2000 Antwerpen"]))
            .respond("seller-name", json!(["Garage Janssens"]))
            .respond("ImageGallery_image", json!(["https://img.example/bmw.jpg"]))
            .respond("call-seller-button", json!(1))
            .respond("revealed-phone-number", json!(["0498 12 34 56"])),
    );
    browser.page(
        "https://cars.example/aanbod/audi-a4-2",
        PageScript::new().respond("StageTitle_title", json!(["Audi A4 Avant"])),
    );
    browser.page(
        PAGE2,
        PageScript::new().with_body_text("0 Offers for your search"),
    );
}

#[tokio::test]
async fn a_two_page_crawl_collects_streams_and_completes() {
    let browser = FakeBrowser::new();
    seed_two_page_site(&browser);

    let mut config = fast_config();
    config.crawl.max_pages = 2;
    let mut handle = orchestrator(config, &browser)
        .spawn(request(SEARCH, true))
        .unwrap();
    let events = drain(&mut handle).await;

    // Exactly one terminal event, and it closes the stream
    assert_eq!(events.last(), Some(&CrawlEvent::Complete));
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);

    // One snapshot per listing, each extending the previous one
    let snapshots = snapshots(&events);
    assert_eq!(snapshots.len(), 3);
    for (i, snapshot) in snapshots.iter().enumerate() {
        assert_eq!(snapshot.len(), i + 1);
    }
    let last = snapshots.last().unwrap();
    for snapshot in &snapshots {
        for (j, vehicle) in snapshot.iter().enumerate() {
            assert_eq!(vehicle.url, last[j].url);
        }
    }

    let bmw = &last[0];
    assert_eq!(bmw.url, "https://cars.example/aanbod/bmw-318d-1");
    assert_eq!(bmw.title, "BMW 318d Touring");
    assert_eq!(bmw.brand, "BMW");
    assert_eq!(bmw.model, "318d");
    assert_eq!(bmw.price, "18 500");
    assert_eq!(bmw.mileage, "120.000 km");
    assert_eq!(bmw.transmission, "Automaat");
    assert_eq!(bmw.year, "06/2019");
    assert_eq!(bmw.fuel_type, "Diesel");
    assert_eq!(bmw.power, "110 kW (150 PK)");
    assert_eq!(bmw.location, "2000 Antwerpen");
    assert_eq!(bmw.seller, "Garage Janssens");
    assert_eq!(bmw.image_url, "https://img.example/bmw.jpg");
    assert_eq!(bmw.phone, "32498123456");
    assert_eq!(bmw.page, 1);
    assert!(bmw.note.is_empty());

    // A sparse detail page keeps the preview data underneath
    let audi = &last[1];
    assert_eq!(audi.title, "Audi A4 Avant");
    assert_eq!(audi.brand, "Audi");
    assert_eq!(audi.model, "A4");
    assert_eq!(audi.price, "21 000");
    assert_eq!(audi.mileage, "80.000 km");
    assert_eq!(audi.phone, "");

    // No detail page at all still yields a record; fuel comes from the URL
    let golf = &last[2];
    assert_eq!(golf.title, "VW Golf");
    assert_eq!(golf.price, "15 000");
    assert_eq!(golf.fuel_type, "Diesel");

    // Progress tracked the two-page budget and the zero page ended the walk
    assert_eq!(progress_values(&events), vec![50, 100]);
    assert!(has_log(&events, "zero offers"));
    assert_eq!(search_navigations(&browser).len(), 2);
    assert!(browser.closed());
}

#[tokio::test]
async fn pagination_stops_at_the_page_budget() {
    let browser = FakeBrowser::new();
    browser.page(
        PAGE1,
        PageScript::new().respond(
            "cldt-summary-full-item",
            json!([card("/aanbod/bmw-318d-1", "BMW 318d", "€ 18.500,-", "120.000 km", "06/2019")]),
        ),
    );
    browser.page(
        PAGE2,
        PageScript::new().respond(
            "cldt-summary-full-item",
            json!([card("/aanbod/audi-a4-2", "Audi A4", "€ 21.000,-", "80.000 km", "03/2020")]),
        ),
    );

    let mut config = fast_config();
    config.crawl.max_pages = 2;
    let mut handle = orchestrator(config, &browser)
        .spawn(request(SEARCH, true))
        .unwrap();
    let events = drain(&mut handle).await;

    assert_eq!(events.last(), Some(&CrawlEvent::Complete));

    // Both budgeted pages and not one more
    let pages: Vec<String> = search_navigations(&browser)
        .into_iter()
        .map(|(url, _)| url)
        .collect();
    assert_eq!(pages, vec![PAGE1.to_string(), PAGE2.to_string()]);

    let last = snapshots(&events).pop().unwrap();
    assert_eq!(last.len(), 2);
    assert_eq!(last[0].page, 1);
    assert_eq!(last[1].page, 2);
    assert_eq!(progress_values(&events), vec![50, 100]);
}

#[tokio::test]
async fn single_page_mode_never_paginates() {
    let browser = FakeBrowser::new();
    browser.page(
        PAGE1,
        PageScript::new().respond(
            "cldt-summary-full-item",
            json!([card("/aanbod/bmw-318d-1", "BMW 318d", "€ 18.500,-", "120.000 km", "06/2019")]),
        ),
    );

    // Budget of 20 pages, but the request says one
    let mut handle = orchestrator(fast_config(), &browser)
        .spawn(request(SEARCH, false))
        .unwrap();
    let events = drain(&mut handle).await;

    assert_eq!(events.last(), Some(&CrawlEvent::Complete));
    assert_eq!(search_navigations(&browser).len(), 1);
    assert_eq!(progress_values(&events), vec![100]);
}

#[tokio::test]
async fn cancellation_mid_run_keeps_what_was_collected() {
    let browser = FakeBrowser::new();
    browser.page(
        PAGE1,
        PageScript::new().respond(
            "cldt-summary-full-item",
            json!([
                card("/aanbod/bmw-318d-1", "BMW 318d", "€ 18.500,-", "120.000 km", "06/2019"),
                card("/aanbod/audi-a4-2", "Audi A4", "€ 21.000,-", "80.000 km", "03/2020"),
                card("/aanbod/vw-golf-3", "VW Golf", "€ 15.000,-", "95.000 km", "01/2018"),
            ]),
        ),
    );

    let mut config = fast_config();
    config.crawl.event_buffer = 1;
    // Long enough for the cancel to land during the pause after listing one
    config.pacing.listing_delay = (50, 60);
    let mut handle = orchestrator(config, &browser)
        .spawn(request(SEARCH, false))
        .unwrap();

    let mut events = Vec::new();
    while let Some(event) = handle.next_event().await {
        let terminal = event.is_terminal();
        let is_snapshot = matches!(event, CrawlEvent::Snapshot { .. });
        events.push(event);
        if is_snapshot {
            handle.cancel();
        }
        if terminal {
            break;
        }
    }

    let snapshots = snapshots(&events);
    assert_eq!(snapshots.len(), 1, "no further listings after the cancel");
    assert_eq!(snapshots[0].len(), 1);
    assert_eq!(events.last(), Some(&CrawlEvent::Complete));
    assert!(has_log(&events, "cancelled"));
    assert!(browser.closed());
}

#[tokio::test]
async fn a_job_cancelled_before_start_navigates_nowhere() {
    let browser = FakeBrowser::new();
    let config = fast_config();
    let orchestrator = orchestrator(config.clone(), &browser);

    let job = CrawlJob::new(&request(SEARCH, true), &config.crawl).unwrap();
    job.cancel_token().cancel();
    let (tx, mut rx) = tokio::sync::mpsc::channel(config.crawl.event_buffer);
    let sink = EventSink::new(tx, job.cancel_token());

    let collect = async {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    };
    let ((), events) = tokio::join!(orchestrator.run(job, sink), collect);

    assert_eq!(events.last(), Some(&CrawlEvent::Complete));
    assert!(browser.navigations().is_empty());
    assert!(browser.closed());
}

#[tokio::test]
async fn link_shape_fallback_collects_when_cards_are_missing() {
    let browser = FakeBrowser::new();
    browser.page(
        PAGE1,
        PageScript::new().respond(
            "a[href]",
            json!([
                "/aanbod/bmw-318d-1",
                "/aanbod/bmw-318d-1",
                "https://cars.example/aanbod/audi-a4-2",
                "/help/contact",
                "  ",
            ]),
        ),
    );

    let mut handle = orchestrator(fast_config(), &browser)
        .spawn(request(SEARCH, false))
        .unwrap();
    let events = drain(&mut handle).await;

    assert_eq!(events.last(), Some(&CrawlEvent::Complete));
    let last = snapshots(&events).pop().unwrap();
    let urls: Vec<&str> = last.iter().map(|v| v.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://cars.example/aanbod/bmw-318d-1",
            "https://cars.example/aanbod/audi-a4-2",
        ]
    );
    assert!(last.iter().all(|v| v.title.is_empty()));
}

#[tokio::test]
async fn the_cookie_banner_is_dismissed_once_per_session() {
    let browser = FakeBrowser::new();
    browser.page(
        PAGE1,
        PageScript::new()
            .respond("_consent-accept-all", json!(1))
            .respond(
                "cldt-summary-full-item",
                json!([
                    card("/aanbod/bmw-318d-1", "BMW 318d", "€ 18.500,-", "120.000 km", "06/2019"),
                ]),
            ),
    );
    browser.page(
        PAGE2,
        PageScript::new()
            .respond("_consent-accept-all", json!(1))
            .respond(
                "cldt-summary-full-item",
                json!([
                    card("/aanbod/audi-a4-2", "Audi A4", "€ 21.000,-", "80.000 km", "03/2020"),
                ]),
            ),
    );

    let mut config = fast_config();
    config.crawl.max_pages = 2;
    let mut handle = orchestrator(config, &browser)
        .spawn(request(SEARCH, true))
        .unwrap();
    let events = drain(&mut handle).await;

    assert_eq!(events.last(), Some(&CrawlEvent::Complete));
    let consent_clicks = browser
        .clicks()
        .into_iter()
        .filter(|c| c.contains("_consent-accept-all"))
        .count();
    assert_eq!(consent_clicks, 1);
}

#[tokio::test]
async fn a_timed_out_first_load_retries_with_a_relaxed_wait() {
    let browser = FakeBrowser::new();
    browser.page(
        PAGE1,
        PageScript::new().respond(
            "cldt-summary-full-item",
            json!([card("/aanbod/bmw-318d-1", "BMW 318d", "€ 18.500,-", "120.000 km", "06/2019")]),
        ),
    );
    browser.fail_navigation("page=1", Some(WaitUntil::NetworkSettled), 1);

    let mut handle = orchestrator(fast_config(), &browser)
        .spawn(request(SEARCH, false))
        .unwrap();
    let events = drain(&mut handle).await;

    assert_eq!(events.last(), Some(&CrawlEvent::Complete));
    let navs = browser.navigations();
    assert_eq!(navs[0], (PAGE1.to_string(), WaitUntil::NetworkSettled));
    assert_eq!(navs[1], (PAGE1.to_string(), WaitUntil::DomContentLoaded));
    assert_eq!(snapshots(&events).pop().unwrap().len(), 1);
}
