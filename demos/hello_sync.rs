use cookie_sync::{
    cookies::{Cookie, InMemoryCookieJar},
    rules::RuleField,
    storage::JsonFileStore,
    CookieSync, CookieSyncError, SyncConfig, SyncEvent,
};

use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), CookieSyncError> {
    env_logger::init();

    // Build the sync configuration. Everything has a default; here we only shorten the
    // settle delay so the demo finishes quickly.
    let cfg = SyncConfig::builder()
        .settle_delay(Duration::from_millis(100))
        .build()?;

    // The host provides the cookie database. The in-memory jar stands in for a browser
    // profile; we seed it with a session cookie for a production app.
    let jar = Arc::new(InMemoryCookieJar::new());
    jar.insert("https://app.example.com", Cookie::new("session", "s3cr3t"))
        .expect("seed cookie");
    jar.insert("https://app.example.com", Cookie::new("theme", "dark"))
        .expect("seed cookie");

    // Rules and the selection are stored in a JSON file in the temp directory, so
    // running the demo twice shows state being restored.
    let store = Arc::new(JsonFileStore::new(std::env::temp_dir().join("cookie-sync-demo.json")));

    let mut sync = CookieSync::new(Some(cfg), Some(store), Some(jar.clone()))?;
    let mut event_rx = sync.subscribe();

    sync.load_initial_state().await;
    println!("Restored {} rule(s)", sync.rules().len());

    // Start from a clean slate, then map production onto a local dev server.
    sync.clear_all().await;
    let rule = sync.add_rule().await;
    sync.update_rule(rule.id, RuleField::Origin, "https://app.example.com").await?;
    sync.update_rule(rule.id, RuleField::Target, "http://localhost:3000").await?;

    // Invalid targets are rejected and the previous value stays in place.
    if let Err(e) = sync.update_rule(rule.id, RuleField::Target, "localhost:3000").await {
        println!("Rejected target: {}", e.user_message());
    }

    sync.set_selection([rule.id]).await;

    let outcome = sync.run_sync().await;
    println!("Sync outcome: {:?}", outcome);

    // Copies run in the background; give them a moment before looking at the target.
    tokio::time::sleep(Duration::from_millis(50)).await;
    for cookie in jar.cookies_for("http://localhost:3000").expect("valid url") {
        println!("localhost:3000 has {}={}", cookie.name, cookie.value);
    }

    while let Ok(event) = event_rx.try_recv() {
        if let SyncEvent::SyncStarted { rules } = event {
            println!("Sync run started for {} rule(s)", rules);
        }
    }

    Ok(())
}
