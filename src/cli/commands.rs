use std::time::Duration;

use crate::app::{AppContext, FreshetError, Result};
use crate::domain::{FeedSnapshot, LayoutType};
use crate::exposure::{ViewportSnapshot, VisibleItem};

/// Upper bound on waiting for one load/refresh cycle to settle.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Issue one load and wait for its outcome: new items, an error, or
/// feed exhaustion.
async fn load_once(ctx: &AppContext) -> Result<FeedSnapshot> {
    let before = ctx.sync.snapshot().feeds.len();
    ctx.sync.load_feeds().await;
    settle(ctx, before).await
}

async fn settle(ctx: &AppContext, before: usize) -> Result<FeedSnapshot> {
    tokio::time::timeout(
        SETTLE_TIMEOUT,
        ctx.sync.wait_until(|s| {
            !s.is_loading && (s.feeds.len() > before || s.has_error || !s.can_load_more)
        }),
    )
    .await
    .map_err(|_| FreshetError::Other("timed out waiting for the feed to settle".into()))
}

/// Load pages, retrying failed ones, until `pages` loads completed or
/// the feed is exhausted.
async fn load_pages(ctx: &AppContext, pages: u32) -> Result<FeedSnapshot> {
    let mut snapshot = ctx.sync.snapshot();
    for _ in 0..pages {
        snapshot = load_once(ctx).await?;
        if snapshot.has_error {
            println!("Load failed: {} (retrying)", snapshot.error_message);
            let before = snapshot.feeds.len();
            ctx.sync.retry().await;
            snapshot = settle(ctx, before).await?;
        }
        if !snapshot.can_load_more {
            println!("End of feed reached");
            break;
        }
    }
    Ok(snapshot)
}

pub async fn run(ctx: &AppContext, pages: u32, refresh: bool, json: bool) -> Result<()> {
    let mut snapshot = load_pages(ctx, pages).await?;

    if refresh {
        let before = snapshot.feeds.len();
        ctx.sync.refresh_feeds().await;
        snapshot = tokio::time::timeout(
            SETTLE_TIMEOUT,
            ctx.sync
                .wait_until(|s| !s.is_refreshing && (s.feeds.len() > before || s.has_error)),
        )
        .await
        .map_err(|_| FreshetError::Other("timed out waiting for the refresh".into()))?;
        if snapshot.has_error {
            println!("Refresh failed: {}", snapshot.error_message);
        }
    }

    if json {
        let rendered = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| FreshetError::Other(e.to_string()))?;
        println!("{}", rendered);
        return Ok(());
    }

    print_feed(ctx, &snapshot);
    Ok(())
}

fn print_feed(ctx: &AppContext, snapshot: &FeedSnapshot) {
    if snapshot.feeds.is_empty() {
        println!("No feeds");
        return;
    }

    for item in &snapshot.feeds {
        let renderer = ctx
            .renderers
            .resolve(item.card_type)
            .map(|r| r.name.as_str())
            .unwrap_or("unrendered");
        let layout = match item.layout_type {
            LayoutType::SingleColumn => "single",
            LayoutType::DoubleColumn => "double",
        };
        println!("{:<12} [{}] ({}) {}", item.title, renderer, layout, item.id);
    }

    println!(
        "\n{} items | can_load_more: {} | errors: {}",
        snapshot.feeds.len(),
        snapshot.can_load_more,
        if snapshot.has_error {
            snapshot.error_message.as_str()
        } else {
            "none"
        }
    );
}

pub async fn track(ctx: &AppContext, pages: u32, viewport: i32, item_height: i32) -> Result<()> {
    let snapshot = load_pages(ctx, pages).await?;
    if snapshot.feeds.is_empty() {
        println!("No feeds to track");
        return Ok(());
    }

    let ids: Vec<String> = snapshot.feeds.iter().map(|i| i.id.clone()).collect();
    ctx.tracker.track_ids(ids.clone()).await;

    // Sweep the viewport down the list, pausing past the debounce window
    // so every snapshot is processed rather than coalesced.
    let pause = ctx.config.tracker.debounce() + Duration::from_millis(50);
    let total_height = ids.len() as i32 * item_height;
    let step = (item_height / 2).max(1);

    let mut scroll = 0;
    while scroll <= total_height {
        let visible: Vec<VisibleItem> = ids
            .iter()
            .enumerate()
            .filter_map(|(index, id)| {
                let top = index as i32 * item_height - scroll;
                let bottom = top + item_height;
                if bottom > 0 && top < viewport {
                    Some(VisibleItem {
                        id: id.clone(),
                        top,
                        height: item_height,
                    })
                } else {
                    None
                }
            })
            .collect();

        ctx.tracker
            .submit(ViewportSnapshot {
                viewport_start: 0,
                viewport_end: viewport,
                visible,
            })
            .await;
        tokio::time::sleep(pause).await;
        scroll += step;
    }

    // Close the session: everything scrolled away.
    ctx.tracker.submit(ViewportSnapshot::default()).await;
    tokio::time::sleep(pause * 2).await;

    let snapshot = ctx.sync.snapshot();
    println!("Exposure log ({} events):", snapshot.exposure_logs.len());
    for record in &snapshot.exposure_logs {
        println!(
            "{} {:<24} {:?}",
            record.timestamp.format("%H:%M:%S%.3f"),
            record.item_id,
            record.event
        );
    }

    Ok(())
}
