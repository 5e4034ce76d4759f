//! Example walking an upload through processing against the mock service.
//!
//! Run with: cargo run -p visrag-core --example mock_gallery

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};
use visrag_core::{
    DetailSurface, GalleryConfig, ImageId, ListSurface, MockImageStore, SurfaceEvent, UploadFile,
};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::new("visrag_core=debug,info"))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    println!("=== Mock Gallery Demo ===\n");

    let config = GalleryConfig {
        list_poll_interval: Duration::from_millis(500),
        ..GalleryConfig::default()
    };
    let store = Arc::new(MockImageStore::new());

    let (surface, mut events, outcome) = ListSurface::open_list(store.clone(), &config).await;
    println!("Initial load: {:?}\n", outcome);

    store.queue_upload_id("7");
    let report = surface
        .upload(vec![UploadFile::new("bicycle.jpg", vec![0xFF, 0xD8, 0xFF])])
        .await;
    println!("Uploaded {} file(s)", report.uploaded.len());
    if let Some(banner) = surface.snapshot().pending_banner() {
        println!("   {}\n", banner);
    }

    // A detail view of the new upload polls on its own
    let (detail, mut detail_events) =
        DetailSurface::open_detail(store.clone(), report.uploaded[0].clone(), &config);

    // The "service" finishes annotating a little later
    let worker = store.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        worker.complete(&ImageId::new("7"), "a red bicycle leaning on a wall");
    });

    while let Some(event) = events.next().await {
        match event {
            SurfaceEvent::Completed(record) => {
                println!("\n✅ {} is ready", record.filename);
                println!("   {}", record.description);
            }
            SurfaceEvent::Notice(notice) => println!("{}", notice),
        }
        if !surface.is_processing() {
            break;
        }
    }

    if let Some(SurfaceEvent::Completed(record)) = detail_events.next().await {
        println!("Detail view caught up: {}", record.description);
    }

    println!("\nList polling:   {:?}", surface.scheduler_state());
    println!("Detail polling: {:?}", detail.scheduler_state());
    println!("Service list calls: {}", store.list_calls());
}
